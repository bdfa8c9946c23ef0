//! Command-line interface for cogbot.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line arguments.
///
/// Options left unset fall through to the environment, then the config
/// file, then built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Args {
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Relay key; turns relay authentication on.
    pub relay_key: Option<String>,
    /// Directory for per-guild settings files.
    pub data_dir: Option<PathBuf>,
    pub no_auth: bool,
    pub no_cooldown: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Print a fresh relay key and exit.
    pub generate_key: bool,
    pub version: bool,
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('k') | Long("relay-key") => {
                result.relay_key = Some(parser.value()?.parse()?);
            }
            Short('d') | Long("data-dir") => {
                result.data_dir = Some(parser.value()?.parse()?);
            }
            Long("no-auth") => {
                result.no_auth = true;
            }
            Long("no-cooldown") => {
                result.no_cooldown = true;
            }
            Long("generate-key") => {
                result.generate_key = true;
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"cogbot {version}
Interactive session server for a cog-based Discord bot

USAGE:
    cogbot [OPTIONS]

OPTIONS:
    -H, --host <ADDR>       Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>       Port to listen on [default: 3000]
    -c, --config <FILE>     Path to configuration file (JSON)
    -k, --relay-key <KEY>   Key the gateway relay must present
    -d, --data-dir <DIR>    Directory for guild settings [default: data/guilds]
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
        --no-auth           Disable relay authentication
        --no-cooldown       Disable per-user command cooldowns
        --generate-key      Print a new relay key and exit
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    COGBOT_HOST             Host address (overrides config)
    COGBOT_PORT             Port number (overrides config)
    COGBOT_RELAY_KEY        Relay key (overrides config)
    COGBOT_DATA_DIR         Guild settings directory (overrides config)
    COGBOT_LOG_LEVEL        Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXAMPLES:
    # Start with defaults (localhost:3000, no relay auth)
    cogbot

    # Listen on all interfaces behind a relay key
    cogbot -H 0.0.0.0 -p 8080 -k "$(cogbot --generate-key)"

    # Start with config file
    cogbot -c /etc/cogbot/config.json

    # Local testing without cooldowns
    cogbot --no-auth --no-cooldown
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("cogbot {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    #[error("{0}")]
    Lexopt(#[from] lexopt::Error),

    #[error("invalid value for --{0}: '{1}'")]
    InvalidValue(&'static str, String),

    #[error("unexpected argument: '{0}'")]
    UnexpectedArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("cogbot")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.host.is_none());
        assert!(result.port.is_none());
        assert!(!result.no_auth);
        assert!(!result.no_cooldown);
        assert!(!result.generate_key);
    }

    #[test]
    fn test_host_port() {
        let result = parse_args_from(args(&["-H", "0.0.0.0", "-p", "8080"])).unwrap();
        assert_eq!(result.host.unwrap().to_string(), "0.0.0.0");
        assert_eq!(result.port, Some(8080));
    }

    #[test]
    fn test_long_options() {
        let result =
            parse_args_from(args(&["--host", "192.168.1.1", "--port", "9000"])).unwrap();
        assert_eq!(result.host.unwrap().to_string(), "192.168.1.1");
        assert_eq!(result.port, Some(9000));
    }

    #[test]
    fn test_relay_key() {
        let result = parse_args_from(args(&["-k", "cb_secret"])).unwrap();
        assert_eq!(result.relay_key, Some("cb_secret".to_string()));

        let result = parse_args_from(args(&["--relay-key", "cb_other"])).unwrap();
        assert_eq!(result.relay_key, Some("cb_other".to_string()));
    }

    #[test]
    fn test_config_and_data_dir() {
        let result =
            parse_args_from(args(&["-c", "/etc/config.json", "-d", "/srv/guilds"])).unwrap();
        assert_eq!(result.config, Some(PathBuf::from("/etc/config.json")));
        assert_eq!(result.data_dir, Some(PathBuf::from("/srv/guilds")));
    }

    #[test]
    fn test_switches() {
        let result =
            parse_args_from(args(&["--no-auth", "--no-cooldown", "--generate-key"])).unwrap();
        assert!(result.no_auth);
        assert!(result.no_cooldown);
        assert!(result.generate_key);
    }

    #[test]
    fn test_help_and_version_flags() {
        assert!(parse_args_from(args(&["-h"])).unwrap().help);
        assert!(parse_args_from(args(&["--help"])).unwrap().help);
        assert!(parse_args_from(args(&["-V"])).unwrap().version);
        assert!(parse_args_from(args(&["--version"])).unwrap().version);
    }

    #[test]
    fn test_log_level() {
        let result = parse_args_from(args(&["-l", "debug"])).unwrap();
        assert_eq!(result.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_invalid_values() {
        let err = parse_args_from(args(&["-p", "invalid"])).unwrap_err();
        assert!(err.to_string().contains("--port"));

        assert!(parse_args_from(args(&["-H", "not-an-ip"])).is_err());
        assert!(parse_args_from(args(&["stray"])).is_err());
        assert!(parse_args_from(args(&["--rate-limit"])).is_err());
    }
}
