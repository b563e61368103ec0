/// Derived view tests
///
/// snapshot, filtered and sorted views over object and primitive lists.
/// Run with: cargo test --test list_view_tests

use memolist::{
    Column, DataType, ElementSchema, ErrorKind, ListError, ManagedList, MemoryStore,
    ObjectSchema, StoreBackend, StoreConfig, Value,
};
use std::sync::Arc;

fn dog_store(config: StoreConfig) -> (Arc<MemoryStore>, ManagedList) {
    let store = MemoryStore::open(config);
    store
        .register_class(ObjectSchema::new(
            "Person",
            vec![Column::new("name", DataType::Text).not_null()],
        ))
        .unwrap();
    store
        .register_class(ObjectSchema::new(
            "Dog",
            vec![
                Column::new("name", DataType::Text).not_null(),
                Column::new("age", DataType::Integer),
                Column::new("owner", DataType::Object("Person".into())),
            ],
        ))
        .unwrap();

    let tx = store.begin_write().unwrap();
    let token = tx.token();
    let alice = store
        .create_object(token, "Person", vec!["Alice".into()])
        .unwrap();
    let bob = store
        .create_object(token, "Person", vec!["Bob".into()])
        .unwrap();

    let dogs = store
        .create_list(token, ElementSchema::object("Dog"))
        .unwrap();
    let rows = [
        ("Rex", Value::Integer(5), Value::from(alice.clone())),
        ("Fido", Value::Integer(2), Value::from(bob)),
        ("Ace", Value::Null, Value::Null),
        ("Max", Value::Integer(9), Value::from(alice)),
    ];
    for (name, age, owner) in rows {
        let dog = store
            .create_object(token, "Dog", vec![name.into(), age, owner])
            .unwrap();
        dogs.push(token, &[dog.into()]).unwrap();
    }
    tx.commit().unwrap();
    (store, dogs)
}

fn names(store: &MemoryStore, values: Vec<Value>) -> Vec<String> {
    values
        .iter()
        .map(|dog| {
            store
                .object_property(dog.as_object().unwrap(), "name")
                .unwrap()
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect()
}

#[test]
fn test_filtered_by_property() {
    let (store, dogs) = dog_store(StoreConfig::default());

    let old = dogs.filtered("age > $0", &[Value::Integer(3)]).unwrap();
    assert!(old.is_live());
    assert_eq!(names(&store, old.to_vec().unwrap()), vec!["Rex", "Max"]);

    let unknown_age = dogs.filtered("age IS NULL", &[]).unwrap();
    assert_eq!(names(&store, unknown_age.to_vec().unwrap()), vec!["Ace"]);
}

#[test]
fn test_filtered_through_link() {
    let (store, dogs) = dog_store(StoreConfig::default());

    let alices = dogs.filtered("owner.name = 'Alice'", &[]).unwrap();
    assert_eq!(names(&store, alices.to_vec().unwrap()), vec!["Rex", "Max"]);

    let like = dogs.filtered("name LIKE $0", &["_ax".into()]).unwrap();
    assert_eq!(names(&store, like.to_vec().unwrap()), vec!["Max"]);
}

#[test]
fn test_sorted_views() {
    let (store, dogs) = dog_store(StoreConfig::default());

    let ascending = dogs.sorted("age", true).unwrap();
    assert_eq!(
        names(&store, ascending.to_vec().unwrap()),
        vec!["Fido", "Rex", "Max", "Ace"]
    );

    let descending = dogs.sorted("name", false).unwrap();
    assert_eq!(
        names(&store, descending.to_vec().unwrap()),
        vec!["Rex", "Max", "Fido", "Ace"]
    );
}

#[test]
fn test_chained_views() {
    let (store, dogs) = dog_store(StoreConfig::default());

    let view = dogs
        .filtered("age IS NOT NULL", &[])
        .unwrap()
        .sorted("age", false)
        .unwrap();
    assert_eq!(names(&store, view.to_vec().unwrap()), vec!["Max", "Rex", "Fido"]);
    assert_eq!(view.query().filters().len(), 1);
    assert!(view.get(3).unwrap().is_none());
}

#[test]
fn test_invalid_queries() {
    let (_store, dogs) = dog_store(StoreConfig::default());

    let err = dogs.sorted("weight", true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidQuery);

    let err = dogs.filtered("age >", &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidQuery);

    let err = dogs.filtered("age > $1", &[Value::Integer(1)]).unwrap_err();
    assert!(matches!(err, ListError::Query(_)));
}

#[test]
fn test_snapshot_ignores_later_mutations() {
    let (store, dogs) = dog_store(StoreConfig::default());
    let snapshot = dogs.snapshot().unwrap();
    let live = dogs.filtered("age >= 0", &[]).unwrap();
    assert_eq!(live.len().unwrap(), 3);

    let tx = store.begin_write().unwrap();
    dogs.shift(tx.token()).unwrap();
    let pup = store
        .create_object(tx.token(), "Dog", vec!["Pup".into(), Value::Integer(0), Value::Null])
        .unwrap();
    dogs.push(tx.token(), &[pup.into()]).unwrap();
    tx.commit().unwrap();

    assert!(!snapshot.is_live());
    assert_eq!(
        names(&store, snapshot.to_vec().unwrap()),
        vec!["Rex", "Fido", "Ace", "Max"]
    );
    assert_eq!(
        names(&store, live.to_vec().unwrap()),
        vec!["Fido", "Max", "Pup"]
    );
}

#[test]
fn test_static_views_by_configuration() {
    let (store, dogs) = dog_store(StoreConfig::default().live_views(false));
    let view = dogs.sorted("name", true).unwrap();
    assert!(!view.is_live());

    let tx = store.begin_write().unwrap();
    dogs.pop(tx.token()).unwrap();
    tx.commit().unwrap();

    assert_eq!(view.len().unwrap(), 4);
    assert_eq!(dogs.len().unwrap(), 3);
}

#[test]
fn test_primitive_views() {
    let store = MemoryStore::open(StoreConfig::default());
    let tx = store.begin_write().unwrap();
    let words = store
        .create_list(tx.token(), ElementSchema::primitive(DataType::Text))
        .unwrap();
    words
        .push(tx.token(), &["pear".into(), "apple".into(), "plum".into()])
        .unwrap();
    tx.commit().unwrap();

    let view = words.filtered("self LIKE 'p%'", &[]).unwrap();
    assert_eq!(view.to_vec().unwrap(), vec![Value::from("pear"), "plum".into()]);

    let sorted = words.sorted("self", true).unwrap();
    assert_eq!(sorted.get(0).unwrap(), Some(Value::from("apple")));

    assert!(matches!(
        words.sorted("length", true),
        Err(ListError::Query(_))
    ));
}

#[test]
fn test_views_invalidated_on_close() {
    let (store, dogs) = dog_store(StoreConfig::default());
    let live = dogs.filtered("age > 1", &[]).unwrap();
    let snapshot = dogs.snapshot().unwrap();

    store.close().unwrap();

    assert!(!dogs.is_valid());
    assert!(!live.is_valid());
    assert_eq!(live.len(), Err(ListError::Invalidated));
    assert_eq!(snapshot.to_vec(), Err(ListError::Invalidated));
    assert_eq!(dogs.snapshot().unwrap_err(), ListError::Invalidated);
    assert_eq!(dogs.get_property("0").unwrap_err().kind(), ErrorKind::Invalidated);
}

#[test]
fn test_views_derived_from_snapshot_stay_static() {
    let store = MemoryStore::open(StoreConfig::default());
    let tx = store.begin_write().unwrap();
    let numbers = store
        .create_list(tx.token(), ElementSchema::primitive(DataType::Integer))
        .unwrap();
    numbers
        .push(tx.token(), &[Value::Integer(2), Value::Integer(1)])
        .unwrap();
    tx.commit().unwrap();

    let snapshot = numbers.snapshot().unwrap();

    let tx = store.begin_write().unwrap();
    numbers.push(tx.token(), &[Value::Integer(3)]).unwrap();
    tx.commit().unwrap();

    let positive = snapshot.filtered("self > 0", &[]).unwrap();
    assert!(!positive.is_live());
    assert_eq!(
        positive.to_vec().unwrap(),
        vec![Value::Integer(2), Value::Integer(1)]
    );

    let ordered = snapshot.sorted("self", true).unwrap();
    assert!(!ordered.is_live());
    assert_eq!(
        ordered.to_vec().unwrap(),
        vec![Value::Integer(1), Value::Integer(2)]
    );

    let chained = ordered.filtered("self < $0", &[Value::Integer(2)]).unwrap();
    assert_eq!(chained.to_vec().unwrap(), vec![Value::Integer(1)]);

    assert!(matches!(
        snapshot.sorted("weight", true),
        Err(ListError::Query(_))
    ));
}

#[test]
fn test_views_derived_from_live_view_stay_live() {
    let (store, dogs) = dog_store(StoreConfig::default());
    let named = dogs.filtered("age IS NOT NULL", &[]).unwrap();
    let by_age = named.sorted("age", true).unwrap();
    assert!(by_age.is_live());

    let tx = store.begin_write().unwrap();
    let pup = store
        .create_object(tx.token(), "Dog", vec!["Pup".into(), Value::Integer(0), Value::Null])
        .unwrap();
    dogs.push(tx.token(), &[pup.into()]).unwrap();
    tx.commit().unwrap();

    assert_eq!(
        names(&store, by_age.to_vec().unwrap()),
        vec!["Pup", "Fido", "Rex", "Max"]
    );
}
