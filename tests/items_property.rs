use proptest::prelude::*;
use rustc_hash::FxHashSet;

use vetflow::item::{Item, normalized_key};
use vetflow::reducers::union_by_key;

proptest! {
    /// Keys are case- and whitespace-insensitive for ASCII titles.
    #[test]
    fn prop_normalized_key_case_insensitive(title in "[a-zA-Z ]{0,40}") {
        prop_assert_eq!(
            normalized_key(&title),
            normalized_key(&title.to_uppercase())
        );
        prop_assert_eq!(
            normalized_key(&title),
            normalized_key(&format!("  {title} "))
        );
    }

    /// Union never produces duplicate keys and never loses existing entries.
    #[test]
    fn prop_union_keys_stay_unique(titles in prop::collection::vec("[a-zA-Z ]{1,20}", 0..20)) {
        let incoming: Vec<Item> = titles.iter().map(|t| Item::new(t)).collect();
        let mut accepted: Vec<Item> = Vec::new();
        union_by_key(&mut accepted, &incoming);

        let keys: FxHashSet<&str> = accepted.iter().map(|i| i.key.as_str()).collect();
        prop_assert_eq!(keys.len(), accepted.len());
        prop_assert!(accepted.len() <= incoming.len());
    }

    /// Applying the same batch twice changes nothing (resume idempotence).
    #[test]
    fn prop_union_idempotent(titles in prop::collection::vec("[a-zA-Z ]{1,20}", 0..20)) {
        let incoming: Vec<Item> = titles.iter().map(|t| Item::new(t)).collect();
        let mut once: Vec<Item> = Vec::new();
        union_by_key(&mut once, &incoming);
        let mut twice = once.clone();
        union_by_key(&mut twice, &incoming);
        prop_assert_eq!(once, twice);
    }
}
