//! Configuration of the REST backend.
//!
//! ```rust
//! use mlflow_experiments::backend::config::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig {
//!     address: "https://mlflow.example.com".to_string(),
//!     timeout: Some(Duration::from_secs(30)),
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use crate::api::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Base address of the tracking server, without the `/api` suffix.
    ///
    /// Default: `http://localhost:5000`
    pub address: String,
    /// Overall timeout per request. Default: none.
    pub timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: "http://localhost:5000".to_string(),
            timeout: None,
        }
    }
}

impl ServerConfig {
    pub fn new(address: impl Into<String>) -> Self {
        ServerConfig {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Checks the address and returns it without trailing slashes.
    pub fn validate(&self) -> Result<&str> {
        let invalid = |reason: &str| Error::InvalidAddress {
            address: self.address.clone(),
            reason: reason.to_string(),
        };
        let address = self.address.trim_end_matches('/');
        let host = address
            .strip_prefix("http://")
            .or_else(|| address.strip_prefix("https://"))
            .ok_or_else(|| invalid("expected an http:// or https:// url"))?;
        if host.is_empty() || host.starts_with('/') {
            return Err(invalid("missing host"));
        }
        if address.contains(|c: char| c == '?' || c == '#' || c.is_whitespace()) {
            return Err(invalid("must not contain a query, fragment or whitespace"));
        }
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_dropped() {
        let config = ServerConfig::new("http://mlflow.test:5000/prefix//");
        assert_eq!(config.validate().unwrap(), "http://mlflow.test:5000/prefix");
    }

    #[test]
    fn bad_addresses_are_recoverable_errors() {
        for address in &["", "mlflow.test", "ftp://mlflow.test", "http://", "http://a b", "http://x/?q=1"] {
            let error = ServerConfig::new(*address).validate().unwrap_err();
            assert!(matches!(error, Error::InvalidAddress { .. }), "{}", address);
        }
    }
}
