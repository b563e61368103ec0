/// Property-based list tests
///
/// Checks the array contract of managed lists against a plain Vec model.
/// Run with: cargo test --test list_proptest_tests

use memolist::{DataType, ElementSchema, ManagedList, MemoryStore, StoreConfig, Value};
use proptest::prelude::*;
use std::sync::Arc;

fn int_list(values: &[i64]) -> (Arc<MemoryStore>, ManagedList) {
    let store = MemoryStore::open(StoreConfig::default());
    let tx = store.begin_write().unwrap();
    let list = store
        .create_list(tx.token(), ElementSchema::primitive(DataType::Integer))
        .unwrap();
    if !values.is_empty() {
        list.push(tx.token(), &ints(values)).unwrap();
    }
    tx.commit().unwrap();
    (store, list)
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| Value::Integer(*v)).collect()
}

/// Reference splice over a Vec
fn model_splice(model: &mut Vec<i64>, start: i64, delete_count: Option<i64>, items: &[i64]) -> Vec<i64> {
    let len = model.len() as i64;
    let mut start = start.min(len);
    if start < 0 {
        start = (len + start).max(0);
    }
    let count = delete_count.map_or(len - start, |c| c.clamp(0, len - start));
    let start = start as usize;
    let removed: Vec<i64> = model.drain(start..start + count as usize).collect();
    for (offset, item) in items.iter().enumerate() {
        model.insert(start + offset, *item);
    }
    removed
}

proptest! {
    #[test]
    fn test_push_appends(
        initial in prop::collection::vec(any::<i64>(), 0..8),
        pushed in prop::collection::vec(any::<i64>(), 1..8),
    ) {
        let (store, list) = int_list(&initial);
        let tx = store.begin_write().unwrap();

        let size = list.push(tx.token(), &ints(&pushed)).unwrap();
        prop_assert_eq!(size, initial.len() + pushed.len());
        for (i, value) in pushed.iter().enumerate() {
            prop_assert_eq!(list.get(initial.len() + i).unwrap(), Value::Integer(*value));
        }
    }

    #[test]
    fn test_splice_matches_model(
        initial in prop::collection::vec(-100i64..100, 0..10),
        start in -15i64..15,
        delete_count in prop::option::of(-3i64..12),
        items in prop::collection::vec(-100i64..100, 0..4),
    ) {
        let (store, list) = int_list(&initial);
        let mut model = initial.clone();
        let expected = model_splice(&mut model, start, delete_count, &items);

        let tx = store.begin_write().unwrap();
        let removed = list.splice(tx.token(), start, delete_count, &ints(&items)).unwrap();
        tx.commit().unwrap();

        prop_assert_eq!(removed, ints(&expected));
        prop_assert_eq!(list.to_vec().unwrap(), ints(&model));
    }

    #[test]
    fn test_keys_match_length(initial in prop::collection::vec(any::<i64>(), 0..12)) {
        let (_store, list) = int_list(&initial);

        let keys = list.keys().unwrap();
        let expected: Vec<String> = (0..initial.len()).map(|i| i.to_string()).collect();
        prop_assert_eq!(&keys, &expected);
        prop_assert_eq!(
            list.get_property("length").unwrap().into_value(),
            Some(Value::Integer(keys.len() as i64))
        );
        prop_assert_eq!(list.keys().unwrap(), keys);
    }

    #[test]
    fn test_out_of_range_reads_never_fail(
        initial in prop::collection::vec(any::<i64>(), 0..6),
        offset in 0usize..100,
    ) {
        let (store, list) = int_list(&initial);
        let key = (initial.len() + offset).to_string();

        prop_assert_eq!(
            list.get_property(&key).unwrap(),
            memolist::PropertyValue::Undefined
        );

        let tx = store.begin_write().unwrap();
        let err = list
            .set_property(&key, Value::Integer(0), Some(tx.token()))
            .unwrap_err();
        prop_assert_eq!(err.kind(), memolist::ErrorKind::OutOfRangeWrite);
    }

    #[test]
    fn test_rollback_restores_contents(
        initial in prop::collection::vec(any::<i64>(), 0..8),
        start in -10i64..10,
        pushed in prop::collection::vec(any::<i64>(), 1..4),
    ) {
        let (store, list) = int_list(&initial);

        let tx = store.begin_write().unwrap();
        list.splice(tx.token(), start, Some(2), &ints(&pushed)).unwrap();
        list.unshift(tx.token(), &ints(&pushed)).unwrap();
        list.shift(tx.token()).unwrap();
        tx.rollback().unwrap();

        prop_assert_eq!(list.to_vec().unwrap(), ints(&initial));
    }

    #[test]
    fn test_snapshot_is_stable(
        initial in prop::collection::vec(any::<i64>(), 1..8),
        pushed in prop::collection::vec(any::<i64>(), 1..4),
    ) {
        let (store, list) = int_list(&initial);
        let snapshot = list.snapshot().unwrap();

        let tx = store.begin_write().unwrap();
        list.pop(tx.token()).unwrap();
        list.push(tx.token(), &ints(&pushed)).unwrap();
        tx.commit().unwrap();

        prop_assert_eq!(snapshot.to_vec().unwrap(), ints(&initial));
    }
}
