//! Property tests over the caches, the session store and the allocator.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use fieldstore_server::SessionTokenBin;
use fieldstore_storage::{ShardedDirectoryAllocator, StringIdCache, ValueCache};
use fieldstore_test_utils::generators::*;
use fieldstore_test_utils::*;
use proptest::prelude::*;

const REFRESH: Duration = Duration::from_secs(60);

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_reverse_lookup_inverts_lookup(table in arb_string_id_table()) {
        let clock = Arc::new(ManualClock::starting_now());
        let source = Arc::new(MockStringIdSource::new(table.clone()));
        let cache = StringIdCache::new("states", source, clock, REFRESH).unwrap();

        for (label, id) in &table {
            let found = cache.lookup_id(label).unwrap();
            prop_assert_eq!(found, *id);
            prop_assert_eq!(&cache.reverse_lookup(found).unwrap(), label);
        }
        prop_assert_eq!(cache.keys().len(), table.len());
    }

    #[test]
    fn prop_issued_token_returns_equal_user(user in arb_user_snapshot()) {
        let clock = Arc::new(ManualClock::starting_now());
        let sessions = SessionTokenBin::new(clock.clone(), Duration::from_secs(15 * 60));

        let token = sessions.issue_token(user.clone()).unwrap();
        clock.advance(Duration::from_secs(14 * 60));
        prop_assert_eq!(sessions.get_user(&token), Some(user.clone()));
        prop_assert_eq!(sessions.revoke_all_tokens_for(&user.username), 1);
        prop_assert_eq!(sessions.get_user(&token), None);
    }

    #[test]
    fn prop_value_cache_is_stable_until_interval(table in arb_preference_table()) {
        let clock = Arc::new(ManualClock::starting_now());
        let source = Arc::new(MockKeyValueSource::new(table.clone()));
        let cache =
            ValueCache::new("preferences", source.clone(), clock.clone(), REFRESH).unwrap();

        prop_assert_eq!(cache.keys().len(), table.len());
        for (key, value) in &table {
            prop_assert_eq!(&cache.lookup(key).unwrap(), value);
        }
        for (key, value) in &table {
            source.set(key.clone(), format!("{}-changed", value));
        }

        clock.advance(Duration::from_secs(59));
        for (key, value) in &table {
            prop_assert_eq!(&cache.lookup(key).unwrap(), value);
        }
        prop_assert_eq!(source.calls(), 1);

        clock.advance(Duration::from_secs(1));
        for (key, value) in &table {
            prop_assert_eq!(cache.lookup(key).unwrap(), format!("{}-changed", value));
        }
        prop_assert_eq!(
            cache.keys(),
            table.iter().map(|(k, _)| k.clone()).collect::<BTreeSet<_>>()
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_leaf_lies_at_kind_depth(
        kind in arb_media_kind(),
        file_depth in 0u32..4,
        document_depth in 0u32..4,
    ) {
        let base = fixtures::shard_root();
        let preferences =
            fixtures::media_preferences(base.path(), 10, file_depth, document_depth);
        let allocator = ShardedDirectoryAllocator::new(Arc::new(preferences));

        let leaf = allocator.directory_for(kind).unwrap();
        let root = base.path().join(kind.as_str());
        let depth = match kind {
            MediaKind::Document => document_depth,
            _ => file_depth,
        };

        prop_assert!(leaf.is_dir());
        let below = leaf.strip_prefix(&root).unwrap();
        prop_assert_eq!(below.components().count(), depth as usize);
        prop_assert!(below.components().all(|c| c.as_os_str() == "0"));
    }
}
