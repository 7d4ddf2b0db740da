//! `schelper-auth`: credentials, tokens and role checks.
//!
//! This crate is decoupled from HTTP and storage: callers hand it plain values
//! (passwords, token strings, roles) and get decisions back.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod principal;
pub mod refresh;
pub mod roles;

pub use authorize::{authorize_link, check_link_roles, require_role, AuthzError};
pub use claims::{validate_claims, AccessClaims, TokenError};
pub use jwt::{HmacJwt, JwtAlgorithm, JwtIssuer, JwtValidator};
pub use password::{PasswordError, PasswordHasher};
pub use principal::Principal;
pub use refresh::{IssuedRefreshToken, RefreshTokenError};
pub use roles::{Role, UnknownRole, ALLOWED_ROLES};
