/// API routes and handlers
pub mod accounts;
pub mod buttons;
pub mod locations;
pub mod middleware;
pub mod notify;
pub mod session;
pub mod templates;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(session::routes())
        .merge(accounts::routes())
        .merge(locations::routes())
        .merge(buttons::routes())
        .merge(templates::routes())
        .merge(notify::routes())
}
