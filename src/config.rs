use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::SessionDbError;

const DEFAULT_PORT: u16 = 3306;
const DEFAULT_CHARSET: &str = "utf8mb4";
const DEFAULT_MAX_ALLOWED_PACKET: usize = 16 * 1024 * 1024;
const DEFAULT_SETTLE_DELAY_MS: u64 = 10;

/// How a session reaches its backend. Fixed for the lifetime of the session.
///
/// Deserializable so the surrounding configuration layer can load it from
/// whatever format it reads; missing fields take the documented defaults.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Schema to fall back to when the session has none bound.
    pub default_schema: String,
    pub default_charset: String,
    pub max_allowed_packet: usize,
    /// Server-side idle timeout in seconds; 0 leaves the server default.
    pub wait_timeout: u64,
    /// Pause after opening a connection before it is handed out.
    pub settle_delay_ms: u64,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            user: String::new(),
            password: String::new(),
            default_schema: String::new(),
            default_charset: DEFAULT_CHARSET.to_string(),
            max_allowed_packet: DEFAULT_MAX_ALLOWED_PACKET,
            wait_timeout: 0,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

// Hand-written so passwords never reach logs.
impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("default_schema", &self.default_schema)
            .field("default_charset", &self.default_charset)
            .field("max_allowed_packet", &self.max_allowed_packet)
            .field("wait_timeout", &self.wait_timeout)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .finish()
    }
}

impl ConnectionOptions {
    #[must_use]
    pub fn new(host: String, port: u16, user: String, password: String) -> Self {
        Self {
            host,
            port,
            user,
            password,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn builder(host: String, port: u16, user: String, password: String) -> ConnectionOptionsBuilder {
        ConnectionOptionsBuilder::new(host, port, user, password)
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Check the fields a connection cannot be opened without.
    ///
    /// # Errors
    /// Returns `SessionDbError::ConfigError` naming the first bad field.
    pub fn validate(&self) -> Result<(), SessionDbError> {
        if self.host.is_empty() {
            return Err(SessionDbError::ConfigError("host is required".to_string()));
        }
        if self.port == 0 {
            return Err(SessionDbError::ConfigError("port is required".to_string()));
        }
        if self.user.is_empty() {
            return Err(SessionDbError::ConfigError("user is required".to_string()));
        }
        if self.default_charset.is_empty()
            || !self
                .default_charset
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SessionDbError::ConfigError(format!(
                "invalid charset '{}'",
                self.default_charset
            )));
        }
        Ok(())
    }

    /// `user@host:port/schema` for log lines.
    #[must_use]
    pub fn display_target(&self, schema: &str) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, schema)
    }
}

/// Fluent builder for connection options.
#[derive(Debug, Clone)]
pub struct ConnectionOptionsBuilder {
    opts: ConnectionOptions,
}

impl ConnectionOptionsBuilder {
    #[must_use]
    pub fn new(host: String, port: u16, user: String, password: String) -> Self {
        Self {
            opts: ConnectionOptions::new(host, port, user, password),
        }
    }

    #[must_use]
    pub fn default_schema(mut self, schema: String) -> Self {
        self.opts.default_schema = schema;
        self
    }

    #[must_use]
    pub fn default_charset(mut self, charset: String) -> Self {
        self.opts.default_charset = charset;
        self
    }

    #[must_use]
    pub fn max_allowed_packet(mut self, bytes: usize) -> Self {
        self.opts.max_allowed_packet = bytes;
        self
    }

    #[must_use]
    pub fn wait_timeout(mut self, seconds: u64) -> Self {
        self.opts.wait_timeout = seconds;
        self
    }

    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.opts.settle_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionOptions {
        self.opts
    }

    /// Finish and validate in one step.
    ///
    /// # Errors
    /// Returns `SessionDbError::ConfigError` if a required field is missing.
    pub fn build(self) -> Result<ConnectionOptions, SessionDbError> {
        self.opts.validate()?;
        Ok(self.opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let opts: ConnectionOptions =
            serde_json::from_str(r#"{"host":"db1","user":"audit","wait_timeout":900}"#)
                .expect("options should parse");
        assert_eq!(opts.port, 3306);
        assert_eq!(opts.default_charset, "utf8mb4");
        assert_eq!(opts.wait_timeout, 900);
        assert_eq!(opts.settle_delay(), Duration::from_millis(10));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn debug_hides_password() {
        let opts = ConnectionOptions::new("h".into(), 3306, "u".into(), "hunter2".into());
        let shown = format!("{opts:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn builder_validates() {
        let err = ConnectionOptions::builder(String::new(), 3306, "u".into(), "p".into())
            .build()
            .unwrap_err();
        assert_eq!(err, SessionDbError::ConfigError("host is required".into()));

        let opts = ConnectionOptions::builder("h".into(), 3307, "u".into(), "p".into())
            .default_schema("orders".into())
            .default_charset("utf8; DROP".into())
            .finish();
        assert!(opts.validate().is_err());
        assert_eq!(opts.default_schema, "orders");
    }
}
