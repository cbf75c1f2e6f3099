#![no_main]

use ferrous_wire::{location, AnyValue, DiError, Input, Provider, Registrations, TypeKey};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

const NAMES: [&str; 8] = ["n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7"];

fn key(i: usize) -> TypeKey {
    TypeKey::named::<u32>(NAMES[i % NAMES.len()])
}

// Each byte pair declares one edge; any shape is allowed, cycles included.
// Resolution must terminate with a value or an error, never hang or panic.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let mut edges: Vec<Vec<Input>> = vec![Vec::new(); NAMES.len()];
    for pair in data[1..].chunks_exact(2) {
        let from = pair[0] as usize % NAMES.len();
        let input = match pair[1] % 3 {
            0 => Input::required(key(pair[1] as usize >> 2)),
            1 => Input::optional(key(pair[1] as usize >> 2)),
            _ => Input::group(key(pair[1] as usize >> 2)),
        };
        edges[from].push(input);
    }

    let bound = (data[0] as usize % NAMES.len()) + 1;
    let mut regs = Registrations::new();
    for (i, inputs) in edges.into_iter().enumerate().take(bound) {
        regs.provide(Provider::from_raw(location!(NAMES[i]), inputs, key(i), move |args| {
            let mut total = i as u32;
            for index in 0..args.len() {
                if let Some(value) = args.raw(index).and_then(|v| v.clone().downcast::<u32>().ok()) {
                    total = total.wrapping_add(*value);
                }
            }
            let value: AnyValue = Arc::new(total);
            Ok(value)
        }));
    }

    let container = match regs.build() {
        Ok(container) => container,
        Err(_) => return,
    };

    for i in 0..NAMES.len() {
        let result = container.resolve(&key(i), container.root_scope(), &location!());
        if let Err(DiError::CyclicDependency { cycle }) = &result {
            assert!(cycle.len() >= 2);
            assert_eq!(cycle.first().map(|s| s.key), cycle.last().map(|s| s.key));
        }
        // Memoized: a second request must agree with the first.
        let again = container.resolve(&key(i), container.root_scope(), &location!());
        assert_eq!(result.is_ok(), again.is_ok());
    }

    let graph = container.dependency_graph();
    assert_eq!(graph.nodes.len(), bound);
    assert_eq!(graph.metadata.has_cycles, graph.nodes.iter().any(|n| n.on_cycle));
});
