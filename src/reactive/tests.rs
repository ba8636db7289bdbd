use super::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

#[test]
fn signal_notifies_only_on_change() {
    let signal = Signal::new(1);
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = seen.clone();
        signal.subscribe(move |value| seen.lock().expect("seen lock").push(*value));
    }

    assert!(signal.set(2));
    assert!(!signal.set(2));
    assert!(signal.update(|value| *value += 1));
    assert!(!signal.update(|_| {}));

    assert_eq!(signal.get(), 3);
    assert_eq!(*seen.lock().expect("seen lock"), vec![2, 3]);
}

#[test]
fn compare_and_set_only_replaces_the_expected_value() {
    let signal = Signal::new(false);
    let notified = Arc::new(AtomicUsize::new(0));
    {
        let notified = notified.clone();
        signal.subscribe(move |_| {
            notified.fetch_add(1, Ordering::SeqCst);
        });
    }

    assert!(signal.compare_and_set(&false, true));
    assert!(!signal.compare_and_set(&false, true));
    assert!(signal.compare_and_set(&true, true));
    assert!(signal.get());
    assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[test]
fn compare_and_set_has_one_winner_across_threads() {
    let signal = Signal::new(false);
    let start = Arc::new(Barrier::new(8));
    let winners = (0..8)
        .map(|_| {
            let signal = signal.clone();
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                signal.compare_and_set(&false, true)
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|contender| contender.join().expect("contender thread"))
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
}

#[test]
fn signal_subscriber_can_read_the_signal() {
    let signal = Signal::new(String::from("a"));
    let observed = Arc::new(Mutex::new(String::new()));
    {
        let reader = signal.clone();
        let observed = observed.clone();
        signal.subscribe(move |_| {
            *observed.lock().expect("observed lock") = reader.get();
        });
    }

    signal.set("b".to_string());
    assert_eq!(*observed.lock().expect("observed lock"), "b");
}

#[test]
fn unsubscribed_listener_stops_receiving() {
    let signal = Signal::new(false);
    let calls = Arc::new(AtomicUsize::new(0));
    let id = {
        let calls = calls.clone();
        signal.subscribe(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    };

    signal.set(true);
    assert!(signal.unsubscribe(id));
    assert!(!signal.unsubscribe(id));
    signal.set(false);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn store_set_skips_equal_values() {
    let store = Store::<&'static str, i64>::default();
    let notifications = Arc::new(Mutex::new(Vec::new()));
    {
        let notifications = notifications.clone();
        store.subscribe(move |keys| {
            notifications
                .lock()
                .expect("notifications lock")
                .push(keys.to_vec())
        });
    }

    assert!(store.set("age", 42));
    assert!(!store.set("age", 42));
    assert_eq!(store.get(&"age"), Some(42));
    assert_eq!(store.remove(&"age"), Some(42));
    assert_eq!(store.remove(&"age"), None);
    assert!(store.is_empty());
    assert_eq!(
        *notifications.lock().expect("notifications lock"),
        vec![vec!["age"], vec!["age"]]
    );
}

#[test]
fn reconcile_preserves_identity_of_unchanged_entries() {
    let store = Store::new(BTreeMap::from([
        ("name", "ada".to_string()),
        ("city", "london".to_string()),
        ("role", "admin".to_string()),
    ]));
    let name_before = store.get_shared(&"name").expect("name entry");
    let city_before = store.get_shared(&"city").expect("city entry");

    let changed = store.reconcile(BTreeMap::from([
        ("name", "ada".to_string()),
        ("city", "paris".to_string()),
        ("lang", "en".to_string()),
    ]));

    assert_eq!(changed, vec!["city", "lang", "role"]);
    let name_after = store.get_shared(&"name").expect("name entry");
    let city_after = store.get_shared(&"city").expect("city entry");
    assert!(Arc::ptr_eq(&name_before, &name_after));
    assert!(!Arc::ptr_eq(&city_before, &city_after));
    assert!(!store.contains_key(&"role"));
    assert_eq!(store.len(), 3);
}

#[test]
fn reconcile_with_identical_state_is_silent() {
    let store = Store::new(BTreeMap::from([(1_u8, true)]));
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = calls.clone();
        store.subscribe(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
    }

    assert!(store.reconcile(store.snapshot()).is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
