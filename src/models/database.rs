//! Database identifiers and the allow-list of selectable databases.
//!
//! A [`DatabaseAlias`] names one configured physical connection. The
//! [`DatabaseCatalog`] is the allow-list: every alias a request may select,
//! together with its human-readable name.

use serde::{Deserialize, Serialize};

/// Connection used for framework-owned tables (auth, sessions, admin log).
pub const DEFAULT_CONNECTION: &str = "default";

/// Selected database used when nothing (or nothing valid) was chosen.
pub const FALLBACK_DATABASE: &str = "cdg";

/// Opaque key naming one configured database connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseAlias(String);

impl DatabaseAlias {
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    /// The connection holding framework-owned tables.
    pub fn default_connection() -> Self {
        Self(DEFAULT_CONNECTION.to_string())
    }

    /// The selection used when a request carries no valid choice.
    pub fn fallback() -> Self {
        Self(FALLBACK_DATABASE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default_connection(&self) -> bool {
        self.0 == DEFAULT_CONNECTION
    }
}

impl std::fmt::Display for DatabaseAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DatabaseAlias {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DatabaseAlias {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DatabaseAlias {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for DatabaseAlias {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DatabaseAlias {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One selectable database and its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseChoice {
    pub alias: DatabaseAlias,
    pub name: String,
}

/// Allow-list of selectable databases, in configuration order.
#[derive(Debug, Clone)]
pub struct DatabaseCatalog {
    choices: Vec<DatabaseChoice>,
    selection_default: DatabaseAlias,
}

impl DatabaseCatalog {
    /// Create an empty catalog that falls back to `selection_default`.
    pub fn new(selection_default: impl Into<DatabaseAlias>) -> Self {
        Self {
            choices: Vec::new(),
            selection_default: selection_default.into(),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_database(mut self, alias: impl Into<DatabaseAlias>, name: impl Into<String>) -> Self {
        self.insert(alias, name);
        self
    }

    /// Register a database. Re-registering an alias replaces its name.
    pub fn insert(&mut self, alias: impl Into<DatabaseAlias>, name: impl Into<String>) {
        let alias = alias.into();
        let name = name.into();
        match self.choices.iter_mut().find(|c| c.alias == alias) {
            Some(existing) => existing.name = name,
            None => self.choices.push(DatabaseChoice { alias, name }),
        }
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.choices.iter().any(|c| c.alias == alias)
    }

    pub fn label(&self, alias: &str) -> Option<&str> {
        self.choices
            .iter()
            .find(|c| c.alias == alias)
            .map(|c| c.name.as_str())
    }

    /// Display name for an alias, or the alias itself when unlisted.
    pub fn display_name(&self, alias: &str) -> String {
        self.label(alias).unwrap_or(alias).to_string()
    }

    pub fn selection_default(&self) -> &DatabaseAlias {
        &self.selection_default
    }

    /// Return `candidate` when it is selectable, otherwise the selection default.
    pub fn validate(&self, candidate: &str) -> DatabaseAlias {
        if self.contains(candidate) {
            DatabaseAlias::new(candidate)
        } else {
            self.selection_default.clone()
        }
    }

    /// Like [`validate`](Self::validate), treating an absent value as the default.
    pub fn resolve(&self, candidate: Option<&str>) -> DatabaseAlias {
        match candidate {
            Some(value) => self.validate(value),
            None => self.selection_default.clone(),
        }
    }

    pub fn choices(&self) -> &[DatabaseChoice] {
        &self.choices
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

impl Default for DatabaseCatalog {
    fn default() -> Self {
        Self::new(FALLBACK_DATABASE)
    }
}
