//! Field visibility toggles
//!
//! A list screen shows a fixed set of optional fields, each switched on or
//! off. The states are stored in one preference value:
//! `name%=true%0name2%=false`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Separates one `name%=state` pair from the next
pub const MULTI_SEPARATOR: &str = "%0";
/// Separates a field name from its state
pub const VALUE_SEPARATOR: &str = "%=";

/// Optional fields of the recipe list, with their default state
pub const RECIPE_FIELDS: &[(&str, bool)] = &[
    ("due_score", true),
    ("fulfillment", true),
    ("calories", false),
    ("desired_servings", false),
    ("picture", true),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldState {
    pub name: String,
    pub enabled: bool,
}

/// States of a known field list, in definition order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldStates(Vec<FieldState>);

impl FieldStates {
    /// Every field at its default
    pub fn defaults(fields: &[(&str, bool)]) -> Self {
        Self(
            fields
                .iter()
                .map(|(name, enabled)| FieldState {
                    name: name.to_string(),
                    enabled: *enabled,
                })
                .collect(),
        )
    }

    /// Read a stored value. Pairs without exactly one separator are skipped,
    /// stored names outside `fields` are ignored and fields missing from the
    /// value keep their default. Any state other than `true` is off.
    pub fn parse(stored: Option<&str>, fields: &[(&str, bool)]) -> Self {
        let mut saved: BTreeMap<&str, bool> = BTreeMap::new();

        for pair in stored.unwrap_or("").split(MULTI_SEPARATOR) {
            if pair.trim().is_empty() {
                continue;
            }
            let mut parts: Vec<&str> = pair.split(VALUE_SEPARATOR).collect();
            while parts.last() == Some(&"") {
                parts.pop();
            }
            match parts.as_slice() {
                [name, state] => {
                    saved.insert(*name, state.eq_ignore_ascii_case("true"));
                }
                _ => tracing::debug!("Skipping malformed field state '{}'", pair),
            }
        }

        let mut states = Self::defaults(fields);
        for field in &mut states.0 {
            if let Some(enabled) = saved.get(field.name.as_str()) {
                field.enabled = *enabled;
            }
        }
        states
    }

    /// Stored form, fields in definition order
    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|f| format!("{}{}{}", f.name, VALUE_SEPARATOR, f.enabled))
            .collect::<Vec<_>>()
            .join(MULTI_SEPARATOR)
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.0.iter().find(|f| f.name == name).map(|f| f.enabled)
    }

    /// Names of the switched-on fields
    pub fn active(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|f| f.enabled)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Switch a field; false when `name` is not one of the fields
    pub fn set(&mut self, name: &str, enabled: bool) -> bool {
        match self.0.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.enabled = enabled;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[(&str, bool)] = &[("name", true), ("amount", false), ("price", true)];

    #[test]
    fn test_encode_and_parse() {
        let mut states = FieldStates::defaults(FIELDS);
        states.set("amount", true);
        states.set("price", false);

        let stored = states.encode();
        assert_eq!(stored, "name%=true%0amount%=true%0price%=false");
        assert_eq!(FieldStates::parse(Some(&stored), FIELDS), states);
        assert_eq!(FieldStates::parse(Some(&stored), FIELDS).active(), vec!["name", "amount"]);
    }

    #[test]
    fn test_malformed_pairs_skipped() {
        let states = FieldStates::parse(
            Some("name%=false%0amount%0price%=false%=true%0amount%="),
            FIELDS,
        );
        assert_eq!(states.is_enabled("name"), Some(false));
        // "amount" and "amount%=" have no state, "price" has two
        assert_eq!(states.is_enabled("amount"), Some(false));
        assert_eq!(states.is_enabled("price"), Some(true));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        assert_eq!(FieldStates::parse(None, FIELDS), FieldStates::defaults(FIELDS));
        assert_eq!(FieldStates::parse(Some("  "), FIELDS), FieldStates::defaults(FIELDS));

        let states = FieldStates::parse(Some("amount%=TRUE%0color%=true"), FIELDS);
        assert_eq!(states.is_enabled("name"), Some(true));
        assert_eq!(states.is_enabled("amount"), Some(true));
        assert_eq!(states.is_enabled("price"), Some(true));
        assert_eq!(states.is_enabled("color"), None);
    }

    #[test]
    fn test_non_true_state_is_off() {
        let states = FieldStates::parse(Some("name%=yes"), FIELDS);
        assert_eq!(states.is_enabled("name"), Some(false));
    }

    #[test]
    fn test_set_unknown_field() {
        let mut states = FieldStates::defaults(FIELDS);
        assert!(!states.set("color", true));
        assert_eq!(states, FieldStates::defaults(FIELDS));
    }
}
