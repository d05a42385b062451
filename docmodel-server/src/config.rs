//! Server configuration.
//!
//! Every option can be given as a flag or through a `DOCMODEL_*` environment
//! variable.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use clap::{Parser, ValueEnum};

/// Which storage backend the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Process-local store; data is lost on exit.
    Memory,
    /// A MongoDB server reached through `--mongo-uri`.
    Mongodb,
}

/// HTTP endpoints exercising raw and schema-checked document access
#[derive(Parser, Debug, Clone)]
#[command(name = "docmodel-server")]
#[command(version, about, long_about = None)]
pub struct ServerConfig {
    /// IP address to bind to (IPv4 or IPv6)
    #[arg(long, env = "DOCMODEL_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to bind to
    #[arg(long, env = "DOCMODEL_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Storage backend
    #[arg(long, env = "DOCMODEL_BACKEND", value_enum, default_value_t = BackendKind::Memory)]
    pub backend: BackendKind,

    /// MongoDB connection string
    #[arg(long, env = "DOCMODEL_MONGO_URI", default_value = "mongodb://localhost:27017")]
    pub mongo_uri: String,

    /// Database name
    #[arg(long, env = "DOCMODEL_DATABASE", default_value = "test")]
    pub database: String,

    /// Upper bound for each request, and for connecting to the store
    #[arg(long, env = "DOCMODEL_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            backend: BackendKind::Memory,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            database: "test".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_parsed_defaults() {
        let parsed = ServerConfig::try_parse_from(["docmodel-server"]).unwrap();
        let default = ServerConfig::default();

        assert_eq!(parsed.socket_addr(), default.socket_addr());
        assert_eq!(parsed.backend, BackendKind::Memory);
        assert_eq!(parsed.database, "test");
        assert_eq!(parsed.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "docmodel-server",
            "--port",
            "8080",
            "--backend",
            "mongodb",
            "--request-timeout-secs",
            "5",
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.backend, BackendKind::Mongodb);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_ipv6_hosts_bind() {
        let config = ServerConfig::try_parse_from(["docmodel-server", "--host", "::", "--port", "3001"]).unwrap();

        assert_eq!(config.socket_addr(), "[::]:3001".parse::<SocketAddr>().unwrap());
        assert!(config.socket_addr().is_ipv6());

        let loopback = ServerConfig::try_parse_from(["docmodel-server", "--host", "::1"]).unwrap();
        assert_eq!(loopback.socket_addr().to_string(), "[::1]:3000");
    }

    #[test]
    fn test_host_must_be_an_ip_address() {
        assert!(ServerConfig::try_parse_from(["docmodel-server", "--host", "not an address"]).is_err());
    }
}
