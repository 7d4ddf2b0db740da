use axum::Router;

use crate::middleware::{self, AuthState};

pub mod auth;
pub mod health;
pub mod users;

/// A named group of routes sharing a path prefix.
pub struct RouteGroup {
    pub name: &'static str,
    pub prefix: &'static str,
    pub router: Router,
}

/// The application's route groups: auth, users, health.
///
/// Only `users` sits behind bearer authentication.
pub fn route_groups(auth_state: AuthState) -> Vec<RouteGroup> {
    vec![
        RouteGroup {
            name: "auth",
            prefix: auth::PREFIX,
            router: auth::router(),
        },
        RouteGroup {
            name: "users",
            prefix: users::PREFIX,
            router: users::router().route_layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            )),
        },
        RouteGroup {
            name: "health",
            prefix: health::PREFIX,
            router: health::router(),
        },
    ]
}
