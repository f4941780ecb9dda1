//! Export server configuration.

use serde::{Deserialize, Serialize};

/// Export server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Address to bind.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of most recent dates offered for export.
    #[serde(default = "default_max_dates")]
    pub max_dates: usize,
    /// Deflate level for zip exports (0-9). Checked by `validate`.
    #[serde(default = "default_compression_level")]
    pub compression_level: i64,
    /// Basic auth username (empty = disabled).
    #[serde(default)]
    pub username: String,
    /// Basic auth password (empty = disabled).
    #[serde(default)]
    pub password: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_dates() -> usize {
    14
}

fn default_compression_level() -> i64 {
    9
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            max_dates: default_max_dates(),
            compression_level: default_compression_level(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl ExportConfig {
    /// Validate configuration values.
    ///
    /// Returns Err if values are invalid:
    /// - compression_level outside 0..=9
    /// - max_dates == 0
    pub fn validate(&self) -> Result<(), String> {
        if !(0..=9).contains(&self.compression_level) {
            return Err(format!(
                "export.compression_level ({}) must be between 0 and 9",
                self.compression_level
            ));
        }

        if self.max_dates == 0 {
            return Err("export.max_dates must be at least 1".to_string());
        }

        Ok(())
    }

    /// Check if basic auth is enabled.
    pub fn auth_enabled(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// `host:port` to bind.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
