//! HTTP application wiring (Axum router + shared services).
//!
//! - `services.rs`: store, token codec and hasher shared by handlers
//! - `routes/`: one file per route group (auth, users, health)
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::AuthState;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

pub use routes::{route_groups, RouteGroup};
pub use services::AppServices;

pub const APP_TITLE: &str = "Schelper Server - Auth";

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// Every call returns an independent router over the given services.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = AuthState {
        jwt: services.jwt.clone(),
        db: services.db.clone(),
    };

    let mut router = Router::new();
    for group in route_groups(auth_state) {
        tracing::debug!(group = group.name, prefix = group.prefix, "registering route group");
        router = router.merge(group.router);
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(Extension(services)),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use schelper_auth::{HmacJwt, JwtAlgorithm};
    use schelper_infra::InMemoryStore;

    use super::*;

    fn auth_state() -> AuthState {
        AuthState {
            jwt: Arc::new(HmacJwt::new(b"test-secret", JwtAlgorithm::Hs256, Duration::minutes(30))),
            db: Arc::new(InMemoryStore::new()),
        }
    }

    #[test]
    fn exactly_three_route_groups_on_every_call() {
        for _ in 0..2 {
            let groups = route_groups(auth_state());
            let names: Vec<_> = groups.iter().map(|g| g.name).collect();
            assert_eq!(names, ["auth", "users", "health"]);

            let prefixes: Vec<_> = groups.iter().map(|g| g.prefix).collect();
            assert_eq!(prefixes, ["/auth", "/users", "/healthz"]);
        }
    }
}
