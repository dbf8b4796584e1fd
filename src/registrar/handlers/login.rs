use axum::{
    extract::{Extension, Form},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::{error, instrument};

use crate::{
    accounts::{store::RequestStore, AccountError, AccountService, AccountSettings},
    registrar::{session::SessionGate, views},
};

pub const INVALID_MESSAGE: &str = "Invalid username or password";
pub const FAILURE_MESSAGE: &str = "Login failed. Please try again.";

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

pub async fn form() -> Html<String> {
    Html(views::login(None))
}

#[instrument(skip_all)]
pub async fn login(
    store: Extension<RequestStore>,
    settings: Extension<AccountSettings>,
    gate: Extension<Arc<SessionGate>>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Response {
    let accounts = AccountService::new(&*store.0, *settings);

    let identity = match accounts.authenticate(&form.username, &form.password).await {
        Ok(identity) => identity,
        Err(AccountError::InvalidCredentials) => {
            return rerender(StatusCode::UNAUTHORIZED, INVALID_MESSAGE);
        }
        Err(e) => {
            error!("Login error: {e:#}");
            return rerender(StatusCode::INTERNAL_SERVER_ERROR, FAILURE_MESSAGE);
        }
    };

    if let Err(e) = gate.adopt(&cookies, identity).await {
        error!("Failed to create session: {e:#}");
        return rerender(StatusCode::INTERNAL_SERVER_ERROR, FAILURE_MESSAGE);
    }

    Redirect::to("/").into_response()
}

fn rerender(status: StatusCode, message: &str) -> Response {
    (status, Html(views::login(Some(message)))).into_response()
}
