use std::net::SocketAddr;

use clap::Parser;

use crate::loader::{Source, DEFAULT_SOURCE_URL};

/// Serve the airline route fare dashboard.
#[derive(Debug, Clone, Parser)]
#[command(name = "airfare-dash", version, about)]
pub struct Config {
    /// CSV URL, or a local .csv / .parquet path
    #[arg(long, env = "AIRFARE_SOURCE", default_value = DEFAULT_SOURCE_URL)]
    pub source: String,

    /// Address the HTTP server binds to
    #[arg(long, env = "AIRFARE_BIND", default_value = "127.0.0.1:8050")]
    pub bind: SocketAddr,

    /// Verbose logging
    #[arg(long, env = "AIRFARE_DEBUG")]
    pub debug: bool,
}

impl Config {
    pub fn source(&self) -> Source {
        Source::parse(&self.source)
    }

    /// Default tracing filter when RUST_LOG is unset.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["airfare-dash"]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8050".parse::<SocketAddr>().unwrap());
        assert!(matches!(config.source(), Source::Url(_)));
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "airfare-dash",
            "--source",
            "data/routes.parquet",
            "--bind",
            "0.0.0.0:9000",
            "--debug",
        ])
        .unwrap();
        assert!(matches!(config.source(), Source::Path(_)));
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.log_level(), "debug");
    }
}
