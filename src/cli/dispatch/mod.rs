//! Map parsed arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{database, session, ARG_PORT};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(5000);

    let database_opts = database::Options::parse(matches)?;
    let session_opts = session::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        database: database_opts.config,
        retry: database_opts.retry,
        session_secret: session_opts.secret,
        session_ttl_seconds: session_opts.ttl_seconds,
        session_cookie_secure: session_opts.cookie_secure,
        provision_user_databases: session_opts.provision_user_databases,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn server_action_carries_options() {
        temp_env::with_vars(
            [
                ("REGISTRAR_PORT", Some("5050")),
                ("MYSQL_HOST", Some("mysql")),
                ("REGISTRAR_SESSION_SECRET", Some("session-secret")),
                ("REGISTRAR_PROVISION_USER_DATABASES", Some("false")),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["registrar"]);
                let Ok(Action::Server(args)) = handler(&matches) else {
                    panic!("expected a server action");
                };
                assert_eq!(args.port, 5050);
                assert_eq!(args.database.host, "mysql");
                assert_eq!(args.session_secret.expose_secret(), "session-secret");
                assert!(!args.provision_user_databases);
            },
        );
    }
}
