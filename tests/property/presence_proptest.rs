//! Property-based tests for the presence store

use portal_realtime::backend::presence::PresenceStore;
use portal_realtime::shared::{ConnectionIdentity, Locale, Role};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_one_entry_per_identity(keys in prop::collection::vec("[a-z]{1,4}", 1..20)) {
        let mut store = PresenceStore::new();
        for key in &keys {
            store.upsert(ConnectionIdentity::new(key.clone(), Role::User, key.clone(), Locale::En));
        }
        let mut distinct = keys.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(store.len(), distinct.len());
    }

    #[test]
    fn test_latest_upsert_wins(key in "[a-z0-9-]{1,12}") {
        let mut store = PresenceStore::new();
        let first = ConnectionIdentity::new(key.clone(), Role::Guest, "first", Locale::En);
        let second = ConnectionIdentity::new(key.clone(), Role::Guest, "second", Locale::Is);
        store.upsert(first);
        store.upsert(second.clone());
        prop_assert_eq!(store.len(), 1);
        prop_assert_eq!(store.get(&key), Some(&second));
    }
}
