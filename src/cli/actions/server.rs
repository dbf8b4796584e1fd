use crate::{
    cli::globals::GlobalArgs,
    db::{schema::RetryPolicy, DatabaseConfig},
    registrar,
};
use anyhow::Result;
use secrecy::SecretString;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub database: DatabaseConfig,
    pub retry: RetryPolicy,
    pub session_secret: SecretString,
    pub session_ttl_seconds: u64,
    pub session_cookie_secure: bool,
    pub provision_user_databases: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database never becomes ready or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let mut globals = GlobalArgs::new(args.database);
    globals.retry = args.retry;
    globals.set_session_secret(args.session_secret);
    globals.session_ttl_seconds = args.session_ttl_seconds;
    globals.session_cookie_secure = args.session_cookie_secure;
    globals.provision_user_databases = args.provision_user_databases;

    debug!("Global args: {:?}", globals);

    registrar::new(args.port, &globals).await
}
