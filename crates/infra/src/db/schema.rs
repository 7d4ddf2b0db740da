//! Schema bootstrap statements.
//!
//! Every statement is idempotent, so running the bootstrap against an
//! existing database is a no-op.

/// Tables the service needs; reported by the startup log and `/healthz/db`.
pub const EXPECTED_TABLES: [&str; 3] = ["users", "children_parents", "refresh_tokens"];

/// Executed in order, inside one transaction.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            BIGSERIAL PRIMARY KEY,
        name          TEXT NOT NULL,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role          VARCHAR(16) NOT NULL CHECK (role IN ('child', 'parent', 'admin')),
        created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS children_parents (
        id            BIGSERIAL PRIMARY KEY,
        child_id      BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        parent_id     BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        relation_type TEXT,
        CONSTRAINT uq_child_parent UNIQUE (child_id, parent_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_children_parents_child_id ON children_parents (child_id)",
    "CREATE INDEX IF NOT EXISTS ix_children_parents_parent_id ON children_parents (parent_id)",
    r#"
    CREATE TABLE IF NOT EXISTS refresh_tokens (
        id         BIGSERIAL PRIMARY KEY,
        user_id    BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        token_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        expires_at TIMESTAMPTZ NOT NULL,
        revoked    BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_refresh_tokens_user_id ON refresh_tokens (user_id)",
    "CREATE INDEX IF NOT EXISTS ix_refresh_tokens_token_hash ON refresh_tokens (token_hash)",
];
