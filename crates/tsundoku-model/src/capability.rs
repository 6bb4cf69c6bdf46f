//! Source capabilities.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An optional operation a source may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Free-form search with provider-defined filters.
    Search,
    /// Paged listing of recently updated manga.
    LatestUpdates,
    /// Authenticated sessions.
    Login,
}

impl Capability {
    /// All known capabilities.
    pub const ALL: [Self; 3] = [Self::Search, Self::LatestUpdates, Self::Login];

    /// Returns the stable string form used in catalogs and output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::LatestUpdates => "latest-updates",
            Self::Login => "login",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown capability: {s}"))
    }
}

/// The set of capabilities a source declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a capability, returning the set.
    #[must_use]
    pub fn with(mut self, capability: Capability) -> Self {
        self.0.insert(capability);
        self
    }

    /// Adds a capability.
    pub fn insert(&mut self, capability: Capability) {
        self.0.insert(capability);
    }

    /// Returns true if the capability is declared.
    #[must_use]
    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    /// Returns true if every capability of `other` is also in `self`.
    #[must_use]
    pub fn is_superset(&self, other: &Self) -> bool {
        self.0.is_superset(&other.0)
    }

    /// Returns the capabilities of `other` missing from `self`.
    #[must_use]
    pub fn missing_from(&self, other: &Self) -> Vec<Capability> {
        other.0.difference(&self.0).copied().collect()
    }

    /// Iterates capabilities in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    /// Returns true if no capability is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<_> = self.iter().map(|c| c.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capability() {
        assert_eq!("search".parse::<Capability>(), Ok(Capability::Search));
        assert_eq!(
            "latest-updates".parse::<Capability>(),
            Ok(Capability::LatestUpdates)
        );
        assert!("download".parse::<Capability>().is_err());
    }

    #[test]
    fn test_superset() {
        let full: CapabilitySet = Capability::ALL.into_iter().collect();
        let search = CapabilitySet::new().with(Capability::Search);

        assert!(full.is_superset(&search));
        assert!(!search.is_superset(&full));
        assert_eq!(
            search.missing_from(&full),
            vec![Capability::LatestUpdates, Capability::Login]
        );
    }

    #[test]
    fn test_display() {
        let set = CapabilitySet::new()
            .with(Capability::Login)
            .with(Capability::Search);
        assert_eq!(set.to_string(), "search, login");
        assert_eq!(CapabilitySet::new().to_string(), "none");
    }

    #[test]
    fn test_serialized_as_list() {
        let set = CapabilitySet::new()
            .with(Capability::LatestUpdates)
            .with(Capability::Search);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["search","latest-updates"]"#);
    }
}
