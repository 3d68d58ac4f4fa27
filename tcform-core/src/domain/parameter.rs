//! Parameter domain types
//!
//! Operators author three flat maps (one per namespace); the server stores a
//! single namespace-tagged list. `ParameterCollection` converts between the two.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{DomainError, Result};

const ENV_PREFIX: &str = "env.";
const SYSTEM_PREFIX: &str = "system.";

/// Where a parameter is exposed to a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParameterNamespace {
    /// Plain configuration parameter
    Configuration,
    /// Exported as an environment variable (`env.` prefix on the server)
    Environment,
    /// Passed as a system property (`system.` prefix on the server)
    System,
}

impl ParameterNamespace {
    /// All namespaces, in the order observed maps are presented
    pub const ALL: [ParameterNamespace; 3] = [
        ParameterNamespace::Configuration,
        ParameterNamespace::Environment,
        ParameterNamespace::System,
    ];

    fn prefix(self) -> &'static str {
        match self {
            ParameterNamespace::Configuration => "",
            ParameterNamespace::Environment => ENV_PREFIX,
            ParameterNamespace::System => SYSTEM_PREFIX,
        }
    }
}

impl std::fmt::Display for ParameterNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterNamespace::Configuration => write!(f, "config"),
            ParameterNamespace::Environment => write!(f, "env"),
            ParameterNamespace::System => write!(f, "system"),
        }
    }
}

/// A single namespaced parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    pub namespace: ParameterNamespace,
}

impl Parameter {
    /// Creates a parameter after checking the name against the server's rules
    pub fn new(
        namespace: ParameterNamespace,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(namespace, &name)?;
        Ok(Self {
            name,
            value: value.into(),
            namespace,
        })
    }

    /// Name as stored by the server, with the namespace prefix applied
    pub fn remote_name(&self) -> String {
        format!("{}{}", self.namespace.prefix(), self.name)
    }

    /// Rebuilds a parameter from a server-side name, deriving the namespace
    /// from its prefix
    pub fn from_remote(remote_name: &str, value: impl Into<String>) -> Self {
        let (namespace, name) = if let Some(rest) = remote_name.strip_prefix(ENV_PREFIX) {
            (ParameterNamespace::Environment, rest)
        } else if let Some(rest) = remote_name.strip_prefix(SYSTEM_PREFIX) {
            (ParameterNamespace::System, rest)
        } else {
            (ParameterNamespace::Configuration, remote_name)
        };

        Self {
            name: name.to_string(),
            value: value.into(),
            namespace,
        }
    }

    fn key(&self) -> (ParameterNamespace, &str) {
        (self.namespace, self.name.as_str())
    }
}

fn validate_name(namespace: ParameterNamespace, name: &str) -> Result<()> {
    let field = format!("{}_params", namespace);

    if name.trim().is_empty() {
        return Err(DomainError::invalid_value(field, "parameter name cannot be empty"));
    }

    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(DomainError::invalid_value(
            field,
            format!("parameter name '{}' contains whitespace", name),
        ));
    }

    // A prefixed name would be read back into a different namespace
    if name.starts_with(ENV_PREFIX) || name.starts_with(SYSTEM_PREFIX) {
        return Err(DomainError::invalid_value(
            field,
            format!(
                "parameter name '{}' must not carry a namespace prefix; use the matching map",
                name
            ),
        ));
    }

    Ok(())
}

/// Ordered parameters, unique by `(namespace, name)`
///
/// Serialized as a plain list; deserialized input goes through
/// `add_or_replace` like any other source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Parameter>", into = "Vec<Parameter>")]
pub struct ParameterCollection {
    items: Vec<Parameter>,
}

impl ParameterCollection {
    /// Creates an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from one namespace's flat map
    pub fn from_map(namespace: ParameterNamespace, map: &BTreeMap<String, String>) -> Result<Self> {
        let mut out = Self::new();
        for (name, value) in map {
            out.add_or_replace(Parameter::new(namespace, name.clone(), value.clone())?);
        }
        Ok(out)
    }

    /// Builds a collection from all three operator maps
    ///
    /// Namespaces never collide, so merge order only affects list order:
    /// configuration, then system, then environment.
    pub fn from_maps(
        config: &BTreeMap<String, String>,
        env: &BTreeMap<String, String>,
        system: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let config = Self::from_map(ParameterNamespace::Configuration, config)?;
        let system = Self::from_map(ParameterNamespace::System, system)?;
        let env = Self::from_map(ParameterNamespace::Environment, env)?;

        Ok(Self::new().concat(&config).concat(&system).concat(&env))
    }

    /// Inserts `param`, replacing any entry with the same namespace and name
    /// in place
    pub fn add_or_replace(&mut self, param: Parameter) {
        match self.items.iter_mut().find(|p| p.key() == param.key()) {
            Some(existing) => *existing = param,
            None => self.items.push(param),
        }
    }

    /// Last-writer-wins merge: entries of `overlay` replace same-keyed entries
    /// of `self` and the rest are appended. Entries of `self` not mentioned in
    /// `overlay` are kept.
    pub fn concat(mut self, overlay: &ParameterCollection) -> Self {
        for param in &overlay.items {
            self.add_or_replace(param.clone());
        }
        self
    }

    /// Projects one namespace back into a flat map
    pub fn filter(&self, namespace: ParameterNamespace) -> BTreeMap<String, String> {
        self.items
            .iter()
            .filter(|p| p.namespace == namespace)
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect()
    }

    /// Returns the parameter with the given namespace and name
    pub fn get(&self, namespace: ParameterNamespace, name: &str) -> Option<&Parameter> {
        self.items.iter().find(|p| p.key() == (namespace, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Compares contents ignoring list order
    pub fn same_entries(&self, other: &ParameterCollection) -> bool {
        ParameterNamespace::ALL
            .iter()
            .all(|ns| self.filter(*ns) == other.filter(*ns))
    }
}

impl FromIterator<Parameter> for ParameterCollection {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        let mut out = Self::new();
        for param in iter {
            out.add_or_replace(param);
        }
        out
    }
}

impl From<Vec<Parameter>> for ParameterCollection {
    fn from(items: Vec<Parameter>) -> Self {
        items.into_iter().collect()
    }
}

impl From<ParameterCollection> for Vec<Parameter> {
    fn from(collection: ParameterCollection) -> Self {
        collection.items
    }
}
