//! In-memory, bidirectional singular/plural noun table: a [`NounLookup`]
//! implementation that keeps the crate runnable and testable end-to-end
//! without a real DB-backed lookup.

use std::collections::HashMap;

use super::NounLookup;

/// A small bidirectional table mapping a singular noun to its plural and
/// back.
#[derive(Clone, Debug, Default)]
pub struct Dictionary {
    singular_to_plural: HashMap<String, String>,
    plural_to_singular: HashMap<String, String>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a singular/plural pair in both directions.
    pub fn insert(&mut self, singular: impl Into<String>, plural: impl Into<String>) {
        let singular = singular.into();
        let plural = plural.into();
        self.plural_to_singular
            .insert(plural.clone(), singular.clone());
        self.singular_to_plural.insert(singular, plural);
    }

    /// A dictionary seeded with a handful of common Malayalam noun pairs
    /// (`പൂച്ച` "cat", `കുട്ടി`/`കുട്ടികള്‍` "child"/"children", and others).
    pub fn seeded() -> Self {
        let mut dict = Self::new();
        dict.insert("പൂച്ച", "പൂച്ചകള്‍");
        dict.insert("കുട്ടി", "കുട്ടികള്‍");
        dict.insert("പുസ്തകം", "പുസ്തകങ്ങള്‍");
        dict.insert("വീട്", "വീടുകള്‍");
        dict.insert("മരം", "മരങ്ങള്‍");
        dict
    }
}

impl NounLookup for Dictionary {
    fn is_singular(&self, noun: &str) -> bool {
        self.singular_to_plural.contains_key(noun)
    }

    fn opposite_form(&self, noun: &str) -> Option<String> {
        self.singular_to_plural
            .get(noun)
            .or_else(|| self.plural_to_singular.get(noun))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_dictionary_recognises_its_singular_nouns() {
        let dict = Dictionary::seeded();
        assert!(dict.is_singular("പൂച്ച"));
        assert!(!dict.is_singular("പൂച്ചകള്‍"));
    }

    #[test]
    fn opposite_form_works_in_both_directions() {
        let dict = Dictionary::seeded();
        assert_eq!(dict.opposite_form("കുട്ടി").as_deref(), Some("കുട്ടികള്‍"));
        assert_eq!(dict.opposite_form("കുട്ടികള്‍").as_deref(), Some("കുട്ടി"));
    }

    #[test]
    fn unknown_noun_has_no_opposite_form() {
        let dict = Dictionary::seeded();
        assert_eq!(dict.opposite_form("ആന"), None);
    }
}
