use clap::{builder::ValueParser, Arg, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in verbosity order; the index is the `-v` count they match.
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts a level name or its index (`0` = error .. `4` = trace).
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        let level = level.trim().to_lowercase();
        let index = match level.parse::<usize>() {
            Ok(index) if index < LEVELS.len() => Some(index),
            Ok(_) => None,
            Err(_) => LEVELS.iter().position(|name| *name == level),
        };

        index
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(|| format!("invalid log level, expected one of {} or 0-4", LEVELS.join(", ")))
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: error, warn, info, debug, trace or 0-4 (default: error)")
            .env("REGISTRAR_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(level: &str) -> Option<u8> {
        let command = with_args(Command::new("registrar"));
        temp_env::with_var("REGISTRAR_LOG_LEVEL", Some(level), || {
            command
                .try_get_matches_from(vec!["registrar"])
                .ok()
                .and_then(|matches| matches.get_one::<u8>(ARG_VERBOSITY).copied())
        })
    }

    #[test]
    fn accepts_names_and_indexes() {
        assert_eq!(parse("error"), Some(0));
        assert_eq!(parse("DEBUG"), Some(3));
        assert_eq!(parse("trace"), Some(4));
        assert_eq!(parse("2"), Some(2));
    }

    #[test]
    fn rejects_unknown_levels() {
        assert_eq!(parse("5"), None);
        assert_eq!(parse("verbose"), None);
    }
}
