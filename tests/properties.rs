use std::collections::BTreeSet;

use emberwood::{Color, Emberwood, Mutation, Order, TreeConfig, TreeError};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

const MAP_SIZE: usize = 300;

fn debug_tree() -> Emberwood<i64, i64> {
    Emberwood::with_config(TreeConfig::new().debug(true))
}

fn height_bound(len: usize) -> f64 {
    2.0 * ((len + 1) as f64).log2()
}

/// For each seed and each size below 42, insert a shuffled range and delete it again in the same
/// order, validating after every step.
#[test]
fn seeded_insert_delete_sweep() {
    let test_count = 42;

    for seed in 0..test_count {
        let mut rng = StdRng::seed_from_u64(seed);

        for count in 1..test_count as i64 {
            let mut keys: Vec<i64> = (0..count).collect();
            keys.shuffle(&mut rng);

            let mut tree = debug_tree();
            for &key in &keys {
                tree.insert(key, Some(key)).unwrap();
                tree.validate(Some(Mutation::Insert)).unwrap();
            }
            for &key in &keys {
                tree.delete(&key).unwrap();
                tree.validate(Some(Mutation::Delete)).unwrap();
            }

            assert!(tree.is_empty());
        }
    }
}

#[test]
fn ascending_inserts_stay_balanced() {
    let mut tree = debug_tree();
    for key in 0..1024 {
        tree.insert(key, None).unwrap();
        tree.validate(Some(Mutation::Insert)).unwrap();
    }

    assert!((tree.height() as f64) <= height_bound(tree.len()));
}

#[test]
fn empty_tree_lookups() {
    let tree = debug_tree();
    assert!(matches!(tree.find(&5), Err(TreeError::NotFound(_))));
    assert!(matches!(
        emberwood::console::parse_key("x"),
        Err(TreeError::InvalidArgument(_))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn inserts_keep_invariants_and_height(
        keys in prop::collection::hash_set(-10_000i64..10_000, 0..MAP_SIZE)
    ) {
        let mut tree = debug_tree();
        for &key in &keys {
            tree.insert(key, None).unwrap();
            prop_assert_eq!(tree.validate(Some(Mutation::Insert)), Ok(()));
        }

        prop_assert_eq!(tree.len(), keys.len());
        prop_assert!((tree.height() as f64) <= height_bound(keys.len()));
    }

    #[test]
    fn in_order_is_strictly_ascending(
        keys in prop::collection::vec(-1_000i64..1_000, 0..MAP_SIZE)
    ) {
        let mut tree = Emberwood::<i64>::new();
        for &key in &keys {
            let _ = tree.insert(key, None);
        }

        let walked: Vec<i64> = tree.iter().copied().collect();
        let expected: Vec<i64> = keys.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        prop_assert_eq!(walked, expected);
    }

    #[test]
    fn insert_then_delete_restores_key_set(
        keys in prop::collection::hash_set(0i64..5_000, 0..MAP_SIZE),
        extra in 5_000i64..6_000,
    ) {
        let mut tree = debug_tree();
        for &key in &keys {
            tree.insert(key, None).unwrap();
            tree.validate(Some(Mutation::Insert)).unwrap();
        }
        let before: Vec<i64> = tree.iter().copied().collect();

        tree.insert(extra, None).unwrap();
        tree.validate(Some(Mutation::Insert)).unwrap();
        tree.delete(&extra).unwrap();
        prop_assert_eq!(tree.validate(Some(Mutation::Delete)), Ok(()));

        let after: Vec<i64> = tree.iter().copied().collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn find_matches_reference_set(
        inserts in prop::collection::vec(0i64..500, 0..MAP_SIZE),
        deletes in prop::collection::vec(0i64..500, 0..MAP_SIZE),
    ) {
        let mut tree = debug_tree();
        let mut reference = BTreeSet::new();

        for &key in &inserts {
            let outcome = tree.insert(key, Some(key * 2));
            if reference.insert(key) {
                prop_assert_eq!(outcome, Ok(()));
                tree.validate(Some(Mutation::Insert)).unwrap();
            } else {
                prop_assert_eq!(outcome, Err(TreeError::DuplicateKey(key.to_string())));
            }
        }
        for &key in &deletes {
            let outcome = tree.delete(&key);
            if reference.remove(&key) {
                prop_assert_eq!(outcome, Ok(()));
                tree.validate(Some(Mutation::Delete)).unwrap();
            } else {
                prop_assert_eq!(outcome, Err(TreeError::NotFound(key.to_string())));
            }
        }

        for key in 0..500 {
            match tree.find(&key) {
                Ok(view) => {
                    prop_assert!(reference.contains(&key));
                    prop_assert_eq!(view.payload, Some(&(key * 2)));
                }
                Err(err) => {
                    prop_assert!(!reference.contains(&key));
                    prop_assert_eq!(err, TreeError::NotFound(key.to_string()));
                }
            }
        }
    }

    #[test]
    fn delete_everything_in_random_order(
        keys in prop::collection::hash_set(any::<i64>(), 1..MAP_SIZE),
        seed in any::<u64>(),
    ) {
        let mut tree = debug_tree();
        for &key in &keys {
            tree.insert(key, None).unwrap();
            tree.validate(Some(Mutation::Insert)).unwrap();
        }

        let mut order: Vec<i64> = keys.into_iter().collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        for key in order {
            tree.delete(&key).unwrap();
            prop_assert_eq!(tree.validate(Some(Mutation::Delete)), Ok(()));
        }

        prop_assert!(tree.is_empty());
    }

    #[test]
    fn pre_order_root_is_black_and_first(
        keys in prop::collection::hash_set(0i64..1_000, 1..MAP_SIZE)
    ) {
        let mut tree = Emberwood::<i64>::new();
        for &key in &keys {
            tree.insert(key, None).unwrap();
        }

        let first = tree.traversal(Order::PreOrder).next().unwrap();
        prop_assert_eq!(first.depth, 1);
        prop_assert_eq!(first.color, Color::Black);
        prop_assert_eq!(tree.traversal(Order::PostOrder).last().map(|v| *v.key), Some(*first.key));
    }
}
