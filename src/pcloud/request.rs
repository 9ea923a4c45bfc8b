//! pCloud request construction
//!
//! A request is an action name plus an ordered list of query parameters.
//! Parameters that carry credentials are marked sensitive so that any URL
//! rendered for humans (logs, error messages) has their values elided.

use url::Url;

/// Client identifier sent as the user agent
pub const CLIENT_NAME: &str = concat!("pcsync/", env!("CARGO_PKG_VERSION"));

/// Placeholder shown instead of a sensitive parameter value
const ELIDED: &str = "*elided*";

/// A single query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub value: String,
    pub sensitive: bool,
}

/// A named remote operation with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub action: &'static str,
    pub params: Vec<Param>,
}

impl Request {
    pub fn new(action: &'static str) -> Self {
        Self {
            action,
            params: Vec::new(),
        }
    }

    /// Add a plain parameter
    pub fn param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.push(Param {
            name,
            value: value.to_string(),
            sensitive: false,
        });
        self
    }

    /// Add a parameter whose value must never be displayed
    pub fn secret(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.push(Param {
            name,
            value: value.to_string(),
            sensitive: true,
        });
        self
    }

    /// Look up a parameter value by name
    pub fn value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Build the URL actually sent over the wire
    pub fn url(&self, endpoint: &Url) -> Url {
        self.build(endpoint, false)
    }

    /// Build a URL safe for logs and error messages
    pub fn display_url(&self, endpoint: &Url) -> String {
        self.build(endpoint, true).to_string()
    }

    fn build(&self, endpoint: &Url, redact: bool) -> Url {
        let mut url = endpoint.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}", base, self.action));
        url.set_query(None);

        if !self.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for param in &self.params {
                let value = if redact && param.sensitive {
                    ELIDED
                } else {
                    param.value.as_str()
                };
                pairs.append_pair(param.name, value);
            }
        }

        url
    }
}

/// Join file identifiers the way the collection operations expect them
pub fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
