//! Scope sets.
//!
//! Scopes are opaque permission tokens carried on the wire as a single
//! space-delimited string (RFC 6749 section 3.3). [`ScopeSet`] normalizes
//! that representation into an order-insensitive, duplicate-free set.
//!
//! An absent `scope` request parameter means "not specified" and is distinct
//! from an explicitly empty value; callers preserve that distinction with
//! [`ScopeSet::parse_opt`].

use std::collections::BTreeSet;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A set of scope tokens.
///
/// Two scope sets are identical iff they are equal as sets, regardless of
/// the order or duplication of the original wire strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Parses a space-delimited scope string.
    ///
    /// Empty input yields the empty set, never an error: there are no
    /// failure modes at this layer.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self(raw.split_whitespace().map(str::to_string).collect())
    }

    /// Parses an optional scope parameter, preserving the distinction
    /// between an absent parameter (`None`) and an explicit value.
    #[must_use]
    pub fn parse_opt(raw: Option<&str>) -> Option<Self> {
        raw.map(Self::parse)
    }

    /// Serializes the set as a space-delimited string.
    ///
    /// The output round-trips through [`ScopeSet::parse`].
    #[must_use]
    pub fn as_string(&self) -> String {
        self.0.iter().cloned().collect::<Vec<_>>().join(" ")
    }

    /// Returns `true` if both sets contain exactly the same tokens.
    #[must_use]
    pub fn is_identical(&self, other: &ScopeSet) -> bool {
        self.0 == other.0
    }

    /// Returns `true` if every token of `self` is contained in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &ScopeSet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Returns `true` if the set contains the given token.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    /// Inserts a token, returning `true` if it was not already present.
    pub fn insert(&mut self, scope: impl Into<String>) -> bool {
        self.0.insert(scope.into())
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of tokens in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the tokens in the set.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Serialize for ScopeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for ScopeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl de::Visitor<'_> for Visitor {
            type Value = ScopeSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a space-delimited scope string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(ScopeSet::parse(value))
            }
        }

        deserializer.deserialize_str(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_whitespace() {
        let scopes = ScopeSet::parse("read  write\tadmin");
        assert_eq!(scopes.len(), 3);
        assert!(scopes.contains("read"));
        assert!(scopes.contains("write"));
        assert!(scopes.contains("admin"));
    }

    #[test]
    fn parse_empty_yields_empty_set() {
        assert!(ScopeSet::parse("").is_empty());
        assert!(ScopeSet::parse("   ").is_empty());
    }

    #[test]
    fn parse_opt_preserves_absence() {
        assert!(ScopeSet::parse_opt(None).is_none());
        let explicit = ScopeSet::parse_opt(Some("")).unwrap();
        assert!(explicit.is_empty());
    }

    #[test]
    fn serialize_round_trips() {
        for raw in ["read write", "b a c", "solo", "dup dup dup"] {
            let parsed = ScopeSet::parse(raw);
            let reparsed = ScopeSet::parse(&parsed.as_string());
            assert!(parsed.is_identical(&reparsed), "round trip failed for {raw:?}");
        }
    }

    #[test]
    fn is_identical_ignores_order_and_duplicates() {
        let a: ScopeSet = ["a", "b"].into_iter().collect();
        let b = ScopeSet::parse("b a b");
        assert!(a.is_identical(&b));
        assert!(b.is_identical(&a));
        assert_eq!(a, b);
    }

    #[test]
    fn is_identical_detects_difference() {
        let a = ScopeSet::parse("read write");
        let b = ScopeSet::parse("read");
        assert!(!a.is_identical(&b));
    }

    #[test]
    fn subset() {
        let narrow = ScopeSet::parse("read");
        let wide = ScopeSet::parse("read write");
        assert!(narrow.is_subset(&wide));
        assert!(!wide.is_subset(&narrow));
        assert!(ScopeSet::new().is_subset(&narrow));
    }

    #[test]
    fn serde_as_wire_string() {
        let scopes = ScopeSet::parse("write read");
        let json = serde_json::to_string(&scopes).unwrap();
        assert_eq!(json, r#""read write""#);

        let parsed: ScopeSet = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_identical(&scopes));
    }
}
