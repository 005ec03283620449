//! `certrelayd` — background service entry point.
//!
//! Not an interactive tool: the only input is the config path, taken from
//! the first argument, then `$CERTRELAY_CONFIG`, then the default.

use std::path::PathBuf;
use std::process::ExitCode;

use certrelay_daemon::start_blocking;

const DEFAULT_CONFIG_PATH: &str = "/etc/certrelay/config.yaml";

fn config_path() -> PathBuf {
    if let Some(arg) = std::env::args().nth(1) {
        return PathBuf::from(arg);
    }
    if let Ok(env) = std::env::var("CERTRELAY_CONFIG") {
        return PathBuf::from(env);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

fn main() -> ExitCode {
    match start_blocking(&config_path()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("certrelayd: {err}");
            ExitCode::FAILURE
        }
    }
}
