//! Configuration loading from the command line and the environment.
//!
//! Flags are parsed first; `WEBRUN_*` environment variables are applied
//! afterwards and win over the flags. Unparsable or empty environment values
//! are ignored and the flag value stays in effect.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::{
    normalize_menu_path, ServerConfig, DEFAULT_CONFIG_FILE, DEFAULT_MENU_PATH, DEFAULT_PORT,
};
use crate::routing::{EnvSource, ProcessEnv};

/// Serve local commands over HTTP.
#[derive(Debug, Parser)]
#[command(name = "webrun", version)]
#[command(about = "Run local commands from HTTP requests and stream their output", long_about = None)]
pub struct Cli {
    /// Path to the route file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Execute any unmatched request path as a command
    #[arg(long)]
    pub god: bool,

    /// Append log output to this file
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Path serving the help menu
    #[arg(long, default_value = DEFAULT_MENU_PATH)]
    pub menu: String,

    /// Port number
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Do not log to stderr
    #[arg(long)]
    pub silent: bool,

    /// Stream the command's stderr after its stdout
    #[arg(long, alias = "showErrors")]
    pub show_errors: bool,

    /// Reload routes when the route file changes
    #[arg(long)]
    pub watch: bool,

    /// Expose Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long)]
    pub metrics_address: Option<std::net::SocketAddr>,

    /// Kill dispatched commands after this many seconds (0 = never)
    #[arg(long, default_value_t = 0)]
    pub timeout_secs: u64,

    /// Command served at `/`, overriding any configured `/` route
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Convert parsed flags into a configuration, before environment overrides.
    pub fn into_config(self) -> ServerConfig {
        let pinned_command = if self.command.is_empty() {
            None
        } else {
            Some(self.command.join(" "))
        };

        ServerConfig {
            config_file: self.config,
            god_mode: self.god,
            log_file: self.log,
            menu_path: normalize_menu_path(&self.menu),
            port: self.port,
            silent: self.silent,
            show_errors: self.show_errors,
            watch: self.watch,
            metrics_address: self.metrics_address,
            timeout_secs: self.timeout_secs,
            pinned_command,
        }
    }
}

/// Parse the process arguments and environment into a configuration.
///
/// Environment entries that are not valid UTF-8 are skipped.
pub fn load_config() -> ServerConfig {
    load_config_from(Cli::parse(), &ProcessEnv)
}

/// Build a configuration from parsed flags and an environment.
pub fn load_config_from(cli: Cli, env: &dyn EnvSource) -> ServerConfig {
    let mut config = cli.into_config();
    apply_env_overrides(&mut config, env.vars());
    config
}

/// Apply `WEBRUN_*` overrides from the given key/value pairs.
pub fn apply_env_overrides<I>(config: &mut ServerConfig, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        if value.is_empty() {
            continue;
        }
        match key.as_str() {
            "WEBRUN_CONFIG" => config.config_file = PathBuf::from(value),
            "WEBRUN_GOD" => override_bool(&mut config.god_mode, &value),
            "WEBRUN_LOGFILE" => config.log_file = Some(PathBuf::from(value)),
            "WEBRUN_MENUPATH" => config.menu_path = normalize_menu_path(&value),
            "WEBRUN_PORT" => {
                if let Ok(port) = value.trim().parse() {
                    config.port = port;
                }
            }
            "WEBRUN_SILENT" => override_bool(&mut config.silent, &value),
            "WEBRUN_SHOWERRORS" => override_bool(&mut config.show_errors, &value),
            "WEBRUN_WATCH" => override_bool(&mut config.watch, &value),
            "WEBRUN_METRICS_ADDRESS" => {
                if let Ok(addr) = value.trim().parse() {
                    config.metrics_address = Some(addr);
                }
            }
            "WEBRUN_TIMEOUT_SECS" => {
                if let Ok(secs) = value.trim().parse() {
                    config.timeout_secs = secs;
                }
            }
            _ => {}
        }
    }
}

fn override_bool(target: &mut bool, value: &str) {
    if let Some(parsed) = parse_bool(value) {
        *target = parsed;
    }
}

/// Parse the boolean spellings accepted by the environment overrides.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{utf8_vars, StaticEnv};

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_cli_defaults() {
        let config = Cli::parse_from(["webrun"]).into_config();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_cli_flags() {
        let config = Cli::parse_from([
            "webrun",
            "--config",
            "routes.txt",
            "--god",
            "--menu",
            "help",
            "--port",
            "9000",
            "--showErrors",
            "--timeout-secs",
            "30",
        ])
        .into_config();

        assert_eq!(config.config_file, PathBuf::from("routes.txt"));
        assert!(config.god_mode);
        assert_eq!(config.menu_path, "/help");
        assert_eq!(config.port, 9000);
        assert!(config.show_errors);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.pinned_command.is_none());
    }

    #[test]
    fn test_trailing_words_become_pinned_command() {
        let config = Cli::parse_from(["webrun", "--port", "9000", "ls", "-la", "/tmp"]).into_config();
        assert_eq!(config.pinned_command.as_deref(), Some("ls -la /tmp"));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_env_overrides_win_over_flags() {
        let mut config = Cli::parse_from(["webrun", "--port", "9000", "--god"]).into_config();
        apply_env_overrides(
            &mut config,
            vars(&[
                ("WEBRUN_PORT", "9100"),
                ("WEBRUN_GOD", "false"),
                ("WEBRUN_CONFIG", "/etc/webrun.config"),
                ("WEBRUN_MENUPATH", "/routes"),
                ("WEBRUN_LOGFILE", "/var/log/webrun.log"),
                ("WEBRUN_SHOWERRORS", "T"),
            ]),
        );

        assert_eq!(config.port, 9100);
        assert!(!config.god_mode);
        assert_eq!(config.config_file, PathBuf::from("/etc/webrun.config"));
        assert_eq!(config.menu_path, "/routes");
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/webrun.log")));
        assert!(config.show_errors);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = ServerConfig {
            port: 9000,
            silent: true,
            ..Default::default()
        };
        apply_env_overrides(
            &mut config,
            vars(&[
                ("WEBRUN_PORT", "not-a-port"),
                ("WEBRUN_SILENT", "yes"),
                ("WEBRUN_CONFIG", ""),
                ("UNRELATED", "1"),
            ]),
        );

        assert_eq!(config.port, 9000);
        assert!(config.silent);
        assert_eq!(config.config_file, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_load_config_from_static_env() {
        let env = StaticEnv(vars(&[("WEBRUN_PORT", "9100"), ("WEBRUN_WATCH", "1")]));
        let config = load_config_from(Cli::parse_from(["webrun", "--port", "9000"]), &env);
        assert_eq!(config.port, 9100);
        assert!(config.watch);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_env_entries_are_skipped() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let mut config = ServerConfig::default();
        apply_env_overrides(
            &mut config,
            utf8_vars(vec![
                (OsString::from("UNRELATED"), OsString::from_vec(vec![0xff])),
                (OsString::from("WEBRUN_PORT"), OsString::from("9100")),
                (OsString::from("WEBRUN_CONFIG"), OsString::from_vec(vec![b'/', 0xfe])),
            ]),
        );

        assert_eq!(config.port, 9100);
        assert_eq!(config.config_file, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_load_config_tolerates_process_env() {
        // Whatever the test process environment holds, reading it must not panic.
        let config = load_config_from(Cli::parse_from(["webrun"]), &ProcessEnv);
        assert!(!config.menu_path.is_empty());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("F"), Some(false));
        assert_eq!(parse_bool("no"), None);
        assert_eq!(parse_bool(" true"), None);
    }
}
