use std::time::Duration;

use clap::Parser;

use crate::network::{NetworkConfig, DEFAULT_BODY_LIMIT};

/// Command-line and environment configuration for a `crudmux` server process.
#[derive(Debug, Clone, Parser)]
#[command(version, about = "Serve typed stores and operations over HTTP")]
pub struct ServerArgs {
    /// Bind address.
    #[arg(long, env = "CRUDMUX_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port. 0 picks a free port.
    #[arg(long, env = "CRUDMUX_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Allowed CORS origins, comma separated. `*` allows any.
    #[arg(long, env = "CRUDMUX_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "CRUDMUX_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    #[arg(long, env = "CRUDMUX_BODY_LIMIT_BYTES", default_value_t = DEFAULT_BODY_LIMIT)]
    pub body_limit_bytes: usize,

    /// Emit logs as JSON lines.
    #[arg(long, env = "CRUDMUX_LOG_JSON")]
    pub log_json: bool,
}

impl ServerArgs {
    /// Network settings derived from these arguments.
    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            body_limit: self.body_limit_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_map_onto_network_config() {
        let args = ServerArgs::try_parse_from(["crudmux"]).unwrap();
        let config = args.network_config();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
        assert!(!args.log_json);
    }

    #[test]
    fn flags_override_defaults() {
        let args = ServerArgs::try_parse_from([
            "crudmux",
            "--host",
            "127.0.0.1",
            "--port",
            "0",
            "--cors-origins",
            "http://a.test,http://b.test",
            "--request-timeout-secs",
            "5",
            "--log-json",
        ])
        .unwrap();
        let config = args.network_config();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 0);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(args.log_json);
    }
}
