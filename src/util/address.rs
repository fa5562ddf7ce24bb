//! `Address` value type (§3 DATA MODEL).

use serde::{Deserialize, Serialize};

/// `{host, port, path?}` — the listen/target address of a transport.
///
/// A plain value type, analogous in spirit to `airssys_rt::util::ActorAddress`
/// but addressing a network endpoint rather than an in-process actor mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub host: String,
    pub port: u16,
    pub path: Option<String>,
}

impl Address {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// `localhost:<port>` shorthand used throughout the end-to-end scenarios.
    pub fn local(port: u16) -> Self {
        Self::new("localhost", port)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}:{}{}", self.host, self.port, path),
            None => write!(f, "{}:{}", self.host, self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_and_without_path() {
        assert_eq!(Address::local(3000).to_string(), "localhost:3000");
        assert_eq!(
            Address::local(3000).with_path("/users").to_string(),
            "localhost:3000/users"
        );
    }
}
