use axum::{extract::Extension, response::Redirect};
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::{debug, instrument};

use crate::registrar::session::SessionGate;

#[instrument(skip_all)]
pub async fn logout(gate: Extension<Arc<SessionGate>>, cookies: Cookies) -> Redirect {
    gate.clear(&cookies).await;
    debug!("session cleared");
    Redirect::to("/login")
}
