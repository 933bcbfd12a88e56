//! Integration tests for Tincan Global

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tincan_global::{
    use_global_selector, use_global_state, use_global_state_shared, GlobalStore, StoreContext, Subscription,
    Value, Values,
};

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    (count, move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn keyed_notification_counts() {
    let store = GlobalStore::new();
    let (a_calls, a) = counter();
    let (b_calls, b) = counter();
    let _a = store.subscribe("k", a);
    let _b = store.subscribe("k", b);

    store.publish("k", Value::new("v1"));
    store.publish("k", Value::new("v2"));
    assert_eq!(a_calls.load(Ordering::SeqCst), 2);
    assert_eq!(b_calls.load(Ordering::SeqCst), 2);

    let shared = Value::shared(Arc::new(vec![1, 2, 3]));
    store.publish("k", shared.clone());
    store.publish("k", shared);
    assert_eq!(a_calls.load(Ordering::SeqCst), 3);
}

#[test]
fn same_primitive_twice() {
    let store = GlobalStore::new();
    let (calls, callback) = counter();
    let _sub = store.subscribe("count", callback);

    store.publish("count", Value::new(1));
    store.publish("count", Value::new(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn mutated_object_is_not_a_change() {
    struct Obj {
        a: i32,
    }

    let store = GlobalStore::new();
    let obj = Arc::new(Mutex::new(Obj { a: 1 }));
    let snapshot = store.get_snapshot("obj", Value::shared(obj.clone()));
    let held = snapshot();

    let (calls, callback) = counter();
    let _sub = store.subscribe("obj", callback);

    obj.lock().unwrap().a = 2;
    store.publish("obj", held);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let stored = snapshot().downcast::<Mutex<Obj>>().unwrap();
    assert_eq!(stored.lock().unwrap().a, 2);
}

#[test]
fn one_of_two_listeners_unsubscribes() {
    let store = GlobalStore::new();
    let (first_calls, first) = counter();
    let (second_calls, second) = counter();
    let first = store.subscribe("x", first);
    let _second = store.subscribe("x", second);

    first.unsubscribe();
    store.publish("x", Value::new(5));

    assert_eq!(first_calls.load(Ordering::SeqCst), 0);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn selector_ignores_unread_keys() {
    let store = GlobalStore::new();
    store.publish("count", Value::new(0));
    store.publish("flag", Value::new(true));

    let (calls, callback) = counter();
    let _sub = store.subscribe_with_selector(
        |values: &Values| Value::new(values.get_as::<bool>("flag").map(|flag| *flag)),
        callback,
    );

    for n in 1..5 {
        store.publish("count", Value::new(n));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn snapshot_initial_then_latest() {
    let store = GlobalStore::new();
    let snapshot = store.get_snapshot("theme", Value::new("light"));

    assert_eq!(snapshot().downcast_ref::<&str>(), Some(&"light"));
    assert_eq!(snapshot().downcast_ref::<&str>(), Some(&"light"));

    store.publish("theme", Value::new("dark"));
    for _ in 0..3 {
        assert_eq!(snapshot().downcast_ref::<&str>(), Some(&"dark"));
    }
}

#[test]
fn shared_counter_between_components() {
    let store = GlobalStore::new();
    let (header_renders, header_rerender) = counter();
    let (footer_renders, footer_rerender) = counter();

    let (header, set_header) = use_global_state(&store, "count", 0u32, header_rerender).unwrap();
    let (footer, _) = use_global_state(&store, "count", 0u32, footer_rerender).unwrap();
    let parity = use_global_selector(
        &store,
        |values: &Values| values.get_as::<u32>("count").map_or(0, |n| *n % 2),
        || {},
    );

    for _ in 0..3 {
        header.get().unwrap();
        set_header.set_with(|n| n + 1);
    }

    assert_eq!(*footer.get().unwrap(), 3);
    assert_eq!(parity.get(), 1);
    assert_eq!(header_renders.load(Ordering::SeqCst), 3);
    assert_eq!(footer_renders.load(Ordering::SeqCst), 3);
}

#[test]
fn setter_from_inside_callback() {
    let store = GlobalStore::new();
    let (_source, set_source) = use_global_state(&store, "source", 0, || {}).unwrap();
    let (mirror, set_mirror) = use_global_state(&store, "mirror", 0, || {}).unwrap();

    let _relay: Subscription = store.subscribe("source", {
        let store = store.clone();
        move || {
            let value = store.values().get_as::<i32>("source").map_or(0, |v| *v);
            set_mirror.set(value * 2);
        }
    });

    set_source.set(21);
    assert_eq!(*mirror.get().unwrap(), 42);
}

#[test]
fn scoped_stores_do_not_leak() {
    StoreContext::scope(|| {
        let store = StoreContext::current();
        let (_, set) = use_global_state(&store, "scoped", 1, || {}).unwrap();
        set.set(2);
    });

    StoreContext::scope(|| {
        assert!(!StoreContext::current().values().contains_key("scoped"));
    });
}

#[test]
fn shared_state_rerenders_on_new_handle_only() {
    let store = GlobalStore::new();
    let (renders, rerender) = counter();
    let (list, set_list) =
        use_global_state_shared(&store, "list", Arc::new(Mutex::new(vec![1])), rerender).unwrap();
    let (other, _) = use_global_state_shared(&store, "list", Arc::new(Mutex::new(Vec::new())), || {}).unwrap();

    let held = list.get().unwrap();
    assert!(Arc::ptr_eq(&held, &other.get().unwrap()));

    held.lock().unwrap().push(2);
    set_list.set(held.clone());
    assert_eq!(renders.load(Ordering::SeqCst), 0);

    set_list.set(Arc::new(Mutex::new(vec![1, 2])));
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert!(!Arc::ptr_eq(&held, &other.get().unwrap()));
    assert_eq!(*other.get().unwrap().lock().unwrap(), vec![1, 2]);
}
