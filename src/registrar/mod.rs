use crate::{
    accounts::{store::StoreProvider, AccountSettings},
    cli::{globals::GlobalArgs, telemetry},
    db::{request::scope_store, schema, Database},
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::get,
    Extension, Router,
};
use secrecy::ExposeSecret;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;

pub mod handlers;
pub mod session;
pub mod views;

use self::{
    handlers::{health, home, login, logout, register},
    session::{SessionGate, DEFAULT_SESSION_SECRET},
};

/// Build the application router.
///
/// Every request gets its own store from `provider`, released once the response is
/// ready.
pub fn router(
    provider: Arc<dyn StoreProvider>,
    gate: Arc<SessionGate>,
    settings: AccountSettings,
) -> Router {
    Router::new()
        .route("/", get(home::home))
        .route("/register", get(register::form).post(register::register))
        .route("/login", get(login::form).post(login::login))
        .route("/logout", get(logout::logout))
        .route("/health", get(health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CookieManagerLayer::new())
                .layer(Extension(gate))
                .layer(Extension(settings))
                .layer(middleware::from_fn_with_state(provider, scope_store)),
        )
}

/// Start the server
/// # Errors
/// Return error if the database cannot be initialized or the listener fails
pub async fn new(port: u16, globals: &GlobalArgs) -> Result<()> {
    let database = Database::new(&globals.database);

    // The users table must exist before the first request is served.
    schema::initialize(&database, globals.retry)
        .await
        .context("Failed to initialize database")?;

    if globals.session_secret.expose_secret() == DEFAULT_SESSION_SECRET {
        warn!("using the default session secret, set REGISTRAR_SESSION_SECRET in production");
    }

    let gate = Arc::new(
        SessionGate::new(
            &globals.session_secret,
            Duration::from_secs(globals.session_ttl_seconds),
        )
        .with_secure_cookie(globals.session_cookie_secure),
    );

    let settings = AccountSettings {
        provision_user_databases: globals.provision_user_databases,
    };

    let app = router(Arc::new(database), gate, settings);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry::shutdown_tracer();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
