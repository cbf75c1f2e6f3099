use ferrous_wire::{
    location, AnyValue, Container, DiError, Input, Location, Provider, Registration, Registrations, Supply, TypeKey,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_supply_and_provide_runs_constructor_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut regs = Registrations::new();
    regs.supply(42i64, location!("answer"));
    regs.provide(Provider::from_fn(location!("render"), move |n: Arc<i64>| {
        counter.fetch_add(1, Ordering::SeqCst);
        format!("{}", n)
    }));
    let container = regs.build().unwrap();

    let caller = Location::named("main");
    // The supplied value is handed out as is; the constructor is not involved.
    assert_eq!(*container.get_root::<i64>(&caller).unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let first = container.get_root::<String>(&caller).unwrap();
    let second = container.get_root::<String>(&caller).unwrap();

    assert_eq!(first.as_str(), "42");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(*container.get_root::<i64>(&caller).unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dependencies_resolved_transitively() {
    struct Config {
        port: u16,
    }

    struct Listener {
        port: u16,
    }

    struct Server {
        listener: Arc<Listener>,
        name: String,
    }

    let mut regs = Registrations::new();
    regs.supply(Config { port: 8080 }, location!("config"));
    regs.provide(Provider::from_fn(location!("listener"), |cfg: Arc<Config>| Listener {
        port: cfg.port,
    }));
    regs.provide(Provider::from_fn(location!("server"), |listener: Arc<Listener>| Server {
        listener,
        name: "MyServer".to_string(),
    }));
    let container = regs.build().unwrap();

    let server = container.get_root::<Server>(&location!()).unwrap();
    assert_eq!(server.listener.port, 8080);
    assert_eq!(server.name, "MyServer");

    // The listener instance is shared with direct requests.
    let listener = container.get_root::<Listener>(&location!()).unwrap();
    assert!(Arc::ptr_eq(&listener, &server.listener));
}

#[test]
fn test_unresolved_type_names_requester() {
    struct Missing;
    #[derive(Debug)]
    struct NeedsMissing;

    let mut regs = Registrations::new();
    regs.provide(Provider::from_fn(location!("needs_missing"), |_m: Arc<Missing>| NeedsMissing));
    let container = regs.build().unwrap();

    let err = container.get_root::<NeedsMissing>(&location!("main")).unwrap_err();
    match err {
        DiError::UnresolvedType { key, requested_by } => {
            assert_eq!(key, TypeKey::of::<Missing>());
            assert_eq!(requested_by.name(), "needs_missing");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_unbound_root_request() {
    let container = Registrations::new().build().unwrap();
    let caller = Location::named("main");

    let err = container.get_root::<u32>(&caller).unwrap_err();
    assert!(matches!(err, DiError::UnresolvedType { ref requested_by, .. } if *requested_by == caller));
    assert!(container.is_empty());
}

#[test]
fn test_optional_inputs() {
    struct Cache;
    struct Service {
        cached: bool,
    }

    let mut regs = Registrations::new();
    regs.provide(Provider::from_fn(location!(), |cache: Option<Arc<Cache>>| Service {
        cached: cache.is_some(),
    }));
    let container = regs.build().unwrap();
    assert!(!container.get_root::<Service>(&location!()).unwrap().cached);

    let mut regs = Registrations::new();
    regs.supply(Cache, location!());
    regs.provide(Provider::from_fn(location!(), |cache: Option<Arc<Cache>>| Service {
        cached: cache.is_some(),
    }));
    let container = regs.build().unwrap();
    assert!(container.get_root::<Service>(&location!()).unwrap().cached);

    assert!(container
        .get_optional::<u8>(container.root_scope(), &location!())
        .unwrap()
        .is_none());
}

#[test]
fn test_constructor_error_is_memoized() {
    #[derive(Debug)]
    struct Flaky;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut regs = Registrations::new();
    regs.provide(Provider::new(location!("flaky"), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Err::<Flaky, _>("connection refused")
    }));
    let container = regs.build().unwrap();

    for _ in 0..3 {
        match container.get_root::<Flaky>(&location!()).unwrap_err() {
            DiError::Constructor { key, location, source } => {
                assert_eq!(key, TypeKey::of::<Flaky>());
                assert_eq!(location.name(), "flaky");
                assert_eq!(source.to_string(), "connection refused");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dependency_error_propagates_unwrapped() {
    struct Leaf;
    struct Mid;
    #[derive(Debug)]
    struct Top;

    let mut regs = Registrations::new();
    regs.provide(Provider::new(location!("leaf"), || Err::<Leaf, _>("boom")));
    regs.provide(Provider::from_fn(location!("mid"), |_l: Arc<Leaf>| Mid));
    regs.provide(Provider::from_fn(location!("top"), |_m: Arc<Mid>| Top));
    let container = regs.build().unwrap();

    let err = container.get_root::<Top>(&location!()).unwrap_err();
    assert_eq!(err.key(), Some(&TypeKey::of::<Leaf>()));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn test_named_keys_are_distinct() {
    let mut regs = Registrations::new();
    regs.supply_named("primary", "postgres://primary".to_string(), location!());
    regs.supply_named("replica", "postgres://replica".to_string(), location!());
    regs.provide(
        Provider::from_raw(
            location!("pair"),
            vec![
                Input::required(TypeKey::named::<String>("primary")),
                Input::required(TypeKey::named::<String>("replica")),
            ],
            TypeKey::of::<(String, String)>(),
            |args| {
                let primary = args.get::<String>(0)?;
                let replica = args.get::<String>(1)?;
                let pair: AnyValue = Arc::new(((*primary).clone(), (*replica).clone()));
                Ok(pair)
            },
        ),
    );
    let container = regs.build().unwrap();

    let pair = container.get_root::<(String, String)>(&location!()).unwrap();
    assert_eq!(pair.0, "postgres://primary");
    assert_eq!(pair.1, "postgres://replica");
}

#[test]
fn test_build_from_registration_list() {
    let container = Container::build([
        Registration::from(Supply::new(7u8, location!())),
        Registration::from(Provider::from_fn(location!(), |n: Arc<u8>| u16::from(*n) * 2)),
    ])
    .unwrap();

    assert_eq!(*container.get_root::<u16>(&location!()).unwrap(), 14);
    assert!(container.contains(&TypeKey::of::<u8>()));
    assert_eq!(container.len(), 2);
    assert_eq!(
        container.keys().collect::<Vec<_>>(),
        vec![TypeKey::of::<u8>(), TypeKey::of::<u16>()]
    );
}

#[test]
fn test_clones_share_values() {
    let mut regs = Registrations::new();
    regs.provide(Provider::from_fn(location!(), || vec![1, 2, 3]));
    let container = regs.build().unwrap();
    let clone = container.clone();

    let a = container.get_root::<Vec<i32>>(&location!()).unwrap();
    let b = clone.get_root::<Vec<i32>>(&location!()).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}
