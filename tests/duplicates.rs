use ferrous_wire::{location, DiError, Location, Provider, Registrations, TypeKey};
use std::sync::Arc;

#[test]
fn test_duplicate_supply_reports_both_sites() {
    let mut regs = Registrations::new();
    regs.supply(1u32, Location::new("first", "config.rs:10"));
    regs.supply(2u32, Location::new("second", "config.rs:20"));

    let err = regs.build().unwrap_err();
    assert_eq!(err.errors().len(), 1);
    match &err.errors()[0] {
        DiError::DuplicateBinding { key, existing, duplicate } => {
            assert_eq!(*key, TypeKey::of::<u32>());
            assert_eq!(existing.name(), "first");
            assert_eq!(duplicate.name(), "second");
        }
        other => panic!("unexpected error: {}", other),
    }

    let message = err.to_string();
    assert!(message.contains("config.rs:10"));
    assert!(message.contains("config.rs:20"));
}

#[test]
fn test_supply_then_provide_is_duplicate() {
    let mut regs = Registrations::new();
    regs.supply("fixed".to_string(), location!("supply"));
    regs.provide(Provider::from_fn(location!("provide"), || "computed".to_string()));

    let err = regs.build().unwrap_err();
    assert_eq!(err.duplicates().count(), 1);
}

#[test]
fn test_provide_then_supply_is_duplicate() {
    let mut regs = Registrations::new();
    regs.provide(Provider::from_fn(location!("provide"), || 5u64));
    regs.supply(6u64, location!("supply"));

    let err = regs.build().unwrap_err();
    match &err.errors()[..] {
        [DiError::DuplicateBinding { existing, duplicate, .. }] => {
            assert_eq!(existing.name(), "provide");
            assert_eq!(duplicate.name(), "supply");
        }
        other => panic!("unexpected errors: {:?}", other),
    }
}

#[test]
fn test_scoped_and_unscoped_same_key_is_duplicate() {
    struct Session;

    let mut regs = Registrations::new();
    regs.provide(Provider::from_fn(location!("global"), || Session));
    regs.provide(Provider::from_fn(location!("per_request"), || Session).scoped("request"));

    let err = regs.build().unwrap_err();
    assert_eq!(err.duplicates().count(), 1);
}

#[test]
fn test_group_and_exclusive_conflict() {
    struct Plugin;

    let mut regs = Registrations::new();
    regs.group_supply(Plugin, location!("member"));
    regs.supply(Plugin, location!("exclusive"));
    assert_eq!(regs.build().unwrap_err().duplicates().count(), 1);

    let mut regs = Registrations::new();
    regs.supply(Plugin, location!("exclusive"));
    regs.group_supply(Plugin, location!("member"));
    assert_eq!(regs.build().unwrap_err().duplicates().count(), 1);
}

#[test]
fn test_all_problems_reported_together() {
    struct Needs;

    let mut regs = Registrations::new();
    regs.supply(1u8, location!("a"));
    regs.supply(2u8, location!("b"));
    regs.supply(3u8, location!("c"));
    regs.supply(1i8, location!("d"));
    regs.supply(2i8, location!("e"));
    regs.provide(Provider::from_fn(location!("needs"), |_n: Arc<u8>| Needs));

    let err = regs.build().unwrap_err();
    // The first registration stays the binding; each later one is reported.
    assert_eq!(err.duplicates().count(), 3);
    let keys: Vec<_> = err.errors().iter().filter_map(|e| e.key().copied()).collect();
    assert_eq!(
        keys,
        vec![TypeKey::of::<u8>(), TypeKey::of::<u8>(), TypeKey::of::<i8>()]
    );
}

#[test]
fn test_same_type_different_names_is_not_duplicate() {
    let mut regs = Registrations::new();
    regs.supply_named("a", 1u8, location!());
    regs.supply_named("b", 2u8, location!());
    regs.supply(3u8, location!());

    let container = regs.build().unwrap();
    assert_eq!(container.len(), 3);
}
