//! VCS root attachment domain types

use serde::{Deserialize, Serialize};

/// A VCS root attached to a build configuration, with its checkout rules
///
/// The VCS root itself is a separate resource; this only names the relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VcsRootEntry {
    pub id: String,
    #[serde(default)]
    pub checkout_rules: Vec<String>,
}

impl VcsRootEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            checkout_rules: Vec::new(),
        }
    }

    pub fn with_rules(id: impl Into<String>, rules: Vec<String>) -> Self {
        Self {
            id: id.into(),
            checkout_rules: rules,
        }
    }

    /// Checkout rules in the server's newline-separated text form
    pub fn rules_text(&self) -> String {
        self.checkout_rules.join("\n")
    }

    /// Splits the server's rule text back into a list; empty text is no rules
    pub fn parse_rules(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}
