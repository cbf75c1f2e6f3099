use ferrous_wire::{location, DiError, Provider, Registrations, TypeKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct A;
#[derive(Debug)]
struct B;
#[derive(Debug)]
struct C;

#[test]
fn test_two_node_cycle_reports_path() {
    let mut regs = Registrations::new();
    regs.provide(Provider::from_fn(location!("provide_a"), |_b: Arc<B>| A));
    regs.provide(Provider::from_fn(location!("provide_b"), |_a: Arc<A>| B));
    let container = regs.build().unwrap();

    let err = container.get_root::<A>(&location!()).unwrap_err();
    assert_eq!(
        err.cycle_keys().unwrap(),
        vec![TypeKey::of::<A>(), TypeKey::of::<B>(), TypeKey::of::<A>()]
    );

    match &err {
        DiError::CyclicDependency { cycle } => {
            let sites: Vec<_> = cycle.iter().map(|step| step.location.name().to_string()).collect();
            assert_eq!(sites, ["provide_a", "provide_b", "provide_a"]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.to_string().contains(" -> "));
}

#[test]
fn test_self_dependency() {
    let mut regs = Registrations::new();
    regs.provide(Provider::from_fn(location!(), |_a: Arc<A>| A));
    let container = regs.build().unwrap();

    let err = container.get_root::<A>(&location!()).unwrap_err();
    assert_eq!(err.cycle_keys().unwrap(), vec![TypeKey::of::<A>(), TypeKey::of::<A>()]);
}

#[test]
fn test_cycle_entered_midway_excludes_prefix() {
    // C -> A -> B -> A: the reported cycle starts at the first repeat.
    let mut regs = Registrations::new();
    regs.provide(Provider::from_fn(location!(), |_a: Arc<A>| C));
    regs.provide(Provider::from_fn(location!(), |_b: Arc<B>| A));
    regs.provide(Provider::from_fn(location!(), |_a: Arc<A>| B));
    let container = regs.build().unwrap();

    let err = container.get_root::<C>(&location!()).unwrap_err();
    assert_eq!(
        err.cycle_keys().unwrap(),
        vec![TypeKey::of::<A>(), TypeKey::of::<B>(), TypeKey::of::<A>()]
    );
}

#[test]
fn test_cycle_does_not_run_constructors() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (ca, cb) = (calls.clone(), calls.clone());

    let mut regs = Registrations::new();
    regs.provide(Provider::from_fn(location!(), move |_b: Arc<B>| {
        ca.fetch_add(1, Ordering::SeqCst);
        A
    }));
    regs.provide(Provider::from_fn(location!(), move |_a: Arc<A>| {
        cb.fetch_add(1, Ordering::SeqCst);
        B
    }));
    let container = regs.build().unwrap();

    assert!(container.get_root::<A>(&location!()).is_err());
    assert!(container.get_root::<B>(&location!()).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_optional_edge_still_cycles() {
    let mut regs = Registrations::new();
    regs.provide(Provider::from_fn(location!(), |_b: Option<Arc<B>>| A));
    regs.provide(Provider::from_fn(location!(), |_a: Arc<A>| B));
    let container = regs.build().unwrap();

    let err = container.get_root::<B>(&location!()).unwrap_err();
    assert_eq!(
        err.cycle_keys().unwrap(),
        vec![TypeKey::of::<B>(), TypeKey::of::<A>(), TypeKey::of::<B>()]
    );
}

#[test]
fn test_cycles_are_flagged_in_descriptors() {
    let mut regs = Registrations::new();
    regs.provide(Provider::from_fn(location!(), |_b: Arc<B>| A));
    regs.provide(Provider::from_fn(location!(), |_a: Arc<A>| B));
    regs.provide(Provider::from_fn(location!(), |_a: Arc<A>| C));
    let container = regs.build().unwrap();

    let on_cycle: Vec<_> = container
        .descriptors()
        .into_iter()
        .map(|d| (d.type_name().rsplit("::").next().unwrap_or_default().to_string(), d.on_cycle))
        .collect();
    assert_eq!(
        on_cycle,
        vec![("A".to_string(), true), ("B".to_string(), true), ("C".to_string(), false)]
    );
    assert!(container.dependency_graph().metadata.has_cycles);
}
