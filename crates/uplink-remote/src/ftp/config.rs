use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for an FTP server.
#[derive(Clone, Serialize, Deserialize)]
pub struct FtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Timeout for establishing the control and data connections.
    #[serde(with = "secs")]
    pub connect_timeout: Duration,
}

impl FtpConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 21,
            username: "anonymous".into(),
            password: String::new(),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for FtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = FtpConfig::default();
        assert_eq!(c.port, 21);
        assert_eq!(c.connect_timeout, Duration::from_secs(30));
        assert_eq!(c.username, "anonymous");
    }

    #[test]
    fn builder_overrides() {
        let c = FtpConfig::new("ftp.example.com", "deploy", "hunter2")
            .with_port(2121)
            .with_connect_timeout(Duration::from_secs(5));
        assert_eq!(c.host, "ftp.example.com");
        assert_eq!(c.port, 2121);
        assert_eq!(c.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn debug_hides_password() {
        let c = FtpConfig::new("h", "u", "hunter2");
        let shown = format!("{c:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
    }
}
