use axum::{
    extract::Extension,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::{debug, instrument};

use crate::registrar::{session::SessionGate, views};

/// Landing page for signed-in users; everyone else goes to the login form.
#[instrument(skip_all)]
pub async fn home(gate: Extension<Arc<SessionGate>>, cookies: Cookies) -> Response {
    match gate.current_identity(&cookies).await {
        Some(identity) => Html(views::home(identity.username())).into_response(),
        None => {
            debug!("no session, redirecting to login");
            Redirect::to("/login").into_response()
        }
    }
}
