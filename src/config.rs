//! Server configuration, parsed from the positional CLI arguments `server
//! <listen-address> <port> <num-threads> <db-config-path>`.
//!
//! Environment variables are not consulted by the core, so this module only
//! reads `std::env::args`; `db-config-path` is carried forward as a
//! `PathBuf` and never opened here — DB connection setup stays an external
//! collaborator.

use std::fmt;
use std::path::PathBuf;

/// The four positional arguments a `mpp-server` invocation requires.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen_address: String,
    pub port: u16,
    pub num_threads: usize,
    pub db_config_path: PathBuf,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseArgsError(String);

impl fmt::Display for ParseArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseArgsError {}

const USAGE: &str = "USAGE: mpp-server <listen-address> <port> <num-threads> <db-config-path>";

impl ServerConfig {
    /// Parses `server <listen-address> <port> <num-threads> <db-config-path>`
    /// from an argument iterator that has already had argv[0] skipped.
    pub fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self, ParseArgsError> {
        let listen_address = args.next().ok_or_else(|| ParseArgsError(USAGE.into()))?;
        let port = args
            .next()
            .ok_or_else(|| ParseArgsError(USAGE.into()))?
            .parse::<u16>()
            .map_err(|e| ParseArgsError(format!("invalid port: {e}")))?;
        let num_threads = args
            .next()
            .ok_or_else(|| ParseArgsError(USAGE.into()))?
            .parse::<usize>()
            .map_err(|e| ParseArgsError(format!("invalid num-threads: {e}")))?;
        let db_config_path: PathBuf = args
            .next()
            .ok_or_else(|| ParseArgsError(USAGE.into()))?
            .into();

        if num_threads == 0 {
            return Err(ParseArgsError("num-threads must be at least 1".into()));
        }

        Ok(Self {
            listen_address,
            port,
            num_threads,
            db_config_path,
        })
    }
}
