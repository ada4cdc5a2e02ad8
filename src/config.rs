use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use std::env;
use std::fmt;
use std::time::Duration;
use url::Url;

/// API version used when none is configured
pub const DEFAULT_VERSION: &str = "3.10";

/// Configuration for a [`Client`](crate::Client)
#[derive(Clone)]
pub struct Config {
    /// Server URL, optionally with a path prefix (e.g. `https://tableau.example.com/`)
    pub host: String,
    /// REST API version segment
    pub version: String,
    pub username: String,
    pub password: String,
    /// Content URL of the site to sign in to. Empty means the default site.
    pub content_url: String,
    /// Whole-request timeout, used when a call does not carry its own
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Retry policy for transport failures
    pub retry: RetryPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("version", &self.version)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("content_url", &self.content_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Config {
    /// Create a new configuration for the given host and credentials
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Config {
            host: host.into(),
            version: DEFAULT_VERSION.to_string(),
            username: username.into(),
            password: password.into(),
            content_url: String::new(),
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    /// Read the configuration from `TABLEAU_HOST`, `TABLEAU_API_VERSION`,
    /// `TABLEAU_USERNAME`, `TABLEAU_PASSWORD` and `TABLEAU_SITE`.
    ///
    /// Missing variables are left empty; [`Config::validate`] reports them.
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).unwrap_or_default();

        let mut config = Config::new(
            var("TABLEAU_HOST"),
            var("TABLEAU_USERNAME"),
            var("TABLEAU_PASSWORD"),
        );
        if let Ok(version) = env::var("TABLEAU_API_VERSION") {
            config.version = version;
        }
        config.content_url = var("TABLEAU_SITE");
        config
    }

    /// Set the API version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the site content URL to sign in to
    pub fn with_site(mut self, content_url: impl Into<String>) -> Self {
        self.content_url = content_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Check the configuration and normalize it in place.
    ///
    /// The host must be a non-empty URL, the username and password must be
    /// non-empty. An empty version falls back to [`DEFAULT_VERSION`].
    pub fn validate(&mut self) -> Result<()> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(Error::InvalidHost);
        }
        let url = Url::parse(host).map_err(|_| Error::InvalidHost)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidHost);
        }
        self.host = url.to_string();

        if self.version.trim().is_empty() {
            self.version = DEFAULT_VERSION.to_string();
        }

        if self.username.is_empty() || self.password.is_empty() {
            return Err(Error::InvalidUsernamePassword);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_normalizes_host_and_version() {
        let mut config = Config::new("  https://tableau.example.com  ", "user", "secret")
            .with_version("");
        config.validate().unwrap();
        assert_eq!(config.host, "https://tableau.example.com/");
        assert_eq!(config.version, DEFAULT_VERSION);
    }

    #[test]
    fn test_validate_rejects_bad_host() {
        let mut config = Config::new("", "user", "secret");
        assert!(matches!(config.validate(), Err(Error::InvalidHost)));

        let mut config = Config::new("not a url", "user", "secret");
        assert!(matches!(config.validate(), Err(Error::InvalidHost)));

        let mut config = Config::new("mailto:someone@example.com", "user", "secret");
        assert!(matches!(config.validate(), Err(Error::InvalidHost)));
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        let mut config = Config::new("https://tableau.example.com", "", "secret");
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidUsernamePassword)
        ));

        let mut config = Config::new("https://tableau.example.com", "user", "");
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidUsernamePassword)
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = Config::new("https://tableau.example.com", "user", "hunter2");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("user"));
    }

    #[test]
    fn test_builder_setters() {
        let config = Config::new("https://tableau.example.com", "user", "secret")
            .with_version("3.12")
            .with_site("marketing")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.version, "3.12");
        assert_eq!(config.content_url, "marketing");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
