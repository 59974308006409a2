// Data model: a saved API call. Every field is a plain string so the
// on-disk JSON stays exactly `{name, url, method, token, body}`.

use serde::{Deserialize, Serialize};

/// Methods offered by the interactive save flow. The store itself accepts
/// any method string.
pub const METHOD_CHOICES: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];

/// One saved HTTP request template. `token` and `body` are optional in
/// practice: an empty string means "not set".
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub body: String,
}

impl ApiConfig {
    pub fn new(name: impl Into<String>, method: impl Into<String>, url: impl Into<String>) -> Self {
        ApiConfig {
            name: name.into(),
            url: url.into(),
            method: method.into(),
            ..Default::default()
        }
    }

    /// Label shown in the selection list: `name (METHOD url)`.
    pub fn label(&self) -> String {
        format!("{} ({} {})", self.name, self.method, self.url)
    }
}
