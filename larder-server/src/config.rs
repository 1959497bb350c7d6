//! Server configuration from command-line flags and environment variables.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "larder-server", about = "REST API for recipe records")]
pub struct ServerConfig {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "BIND_HOST")]
    pub bind_host: String,

    /// HTTP port to listen on
    #[arg(long, default_value = "8000", env = "PORT")]
    pub port: u16,

    /// PostgreSQL connection URL; recipes are kept in memory when unset
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections
    #[arg(long, default_value = "5", env = "DB_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// Path prefix for the recipe API
    #[arg(long, default_value = "/api/v1", env = "API_PREFIX")]
    pub api_prefix: String,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// API prefix with a leading slash and no trailing slash; empty for root.
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid races.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "BIND_HOST",
            "PORT",
            "DATABASE_URL",
            "DB_MAX_CONNECTIONS",
            "API_PREFIX",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = ServerConfig::try_parse_from(["larder-server"]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.database_url, None);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.normalized_prefix(), "/api/v1");
    }

    #[test]
    fn from_env_vars() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("BIND_HOST", "127.0.0.1");
        std::env::set_var("PORT", "9000");
        std::env::set_var("DATABASE_URL", "postgres://localhost/larder");
        std::env::set_var("DB_MAX_CONNECTIONS", "12");
        std::env::set_var("API_PREFIX", "/v2/");

        let config = ServerConfig::try_parse_from(["larder-server"]).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(
            config.database_url,
            Some("postgres://localhost/larder".to_string())
        );
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.normalized_prefix(), "/v2");

        clear_env();
    }

    #[test]
    fn flags_override_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("PORT", "9000");
        let config =
            ServerConfig::try_parse_from(["larder-server", "--port", "7000", "--api-prefix", "/"])
                .unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.normalized_prefix(), "");

        clear_env();
    }

    #[test]
    fn invalid_port() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("PORT", "not-a-number");
        assert!(ServerConfig::try_parse_from(["larder-server"]).is_err());

        clear_env();
    }
}
