//! Route group mounting.
//!
//! # Data Flow
//! ```text
//! /auth/*        → authentication route group
//! /api/sheets/*  → sheet-resource route group
//! ```
//!
//! Both groups are supplied by their owning modules as fully-stated
//! `Router`s; the gateway only decides where they live and wraps them with
//! the shared middleware stack.

use axum::Router;

pub const AUTH_PREFIX: &str = "/auth";
pub const SHEETS_PREFIX: &str = "/api/sheets";

/// The collaborator route groups mounted behind the gateway.
#[derive(Clone, Default)]
pub struct RouteGroups {
    pub auth: Router,
    pub sheets: Router,
}

impl RouteGroups {
    pub fn new(auth: Router, sheets: Router) -> Self {
        Self { auth, sheets }
    }

    /// Nest both groups under their prefixes.
    pub fn mount(self, router: Router) -> Router {
        router
            .nest(AUTH_PREFIX, self.auth)
            .nest(SHEETS_PREFIX, self.sheets)
    }
}
