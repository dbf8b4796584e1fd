use axum::{
    extract::{Extension, Form},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{error, instrument};

use crate::{
    accounts::{store::RequestStore, AccountError, AccountService, AccountSettings},
    registrar::views,
};

pub const CONFLICT_MESSAGE: &str = "Registration failed. Username or email may already exist.";
pub const FAILURE_MESSAGE: &str = "Registration failed. Please try again.";

#[derive(Deserialize)]
pub struct RegisterForm {
    username: String,
    email: String,
    password: String,
}

pub async fn form() -> Html<String> {
    Html(views::register(None))
}

#[instrument(skip_all)]
pub async fn register(
    store: Extension<RequestStore>,
    settings: Extension<AccountSettings>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let accounts = AccountService::new(&*store.0, *settings);

    match accounts
        .register(&form.username, &form.email, &form.password)
        .await
    {
        Ok(()) => Redirect::to("/login").into_response(),
        Err(AccountError::Conflict) => rerender(StatusCode::CONFLICT, CONFLICT_MESSAGE),
        Err(AccountError::Invalid(message)) => rerender(StatusCode::BAD_REQUEST, message),
        Err(e) => {
            error!("Registration error: {e:#}");
            rerender(StatusCode::INTERNAL_SERVER_ERROR, FAILURE_MESSAGE)
        }
    }
}

fn rerender(status: StatusCode, message: &str) -> Response {
    (status, Html(views::register(Some(message)))).into_response()
}
