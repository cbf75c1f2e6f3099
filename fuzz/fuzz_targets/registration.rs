#![no_main]

use ferrous_wire::{location, DiError, Provider, Registrations};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

#[derive(Debug)]
struct Value(u8);

#[derive(Debug)]
struct Consumer;

// Every byte adds one registration. The build must either succeed or report
// exactly the duplicate and captive problems the sequence contains.
fuzz_target!(|data: &[u8]| {
    let mut regs = Registrations::new();
    let mut exclusive = 0usize;
    let mut grouped = 0usize;
    let mut scoped_value = false;
    let mut consumers = 0usize;

    for &byte in data.iter().take(64) {
        match byte % 5 {
            0 => {
                regs.supply(Value(byte), location!("supply"));
                exclusive += 1;
            }
            1 => {
                regs.provide(Provider::from_fn(location!("provide"), move || Value(byte)));
                exclusive += 1;
            }
            2 => {
                regs.provide(Provider::from_fn(location!("scoped"), move || Value(byte)).scoped("request"));
                exclusive += 1;
                if exclusive == 1 && grouped == 0 {
                    scoped_value = true;
                }
            }
            3 => {
                regs.group_supply(Value(byte), location!("member"));
                grouped += 1;
            }
            _ => {
                regs.provide(Provider::from_fn(location!("consumer"), |_v: Option<Arc<Value>>| Consumer));
                consumers += 1;
            }
        }
    }

    match regs.build() {
        Ok(container) => {
            assert!(exclusive <= 1 && consumers <= 1);
            assert!(exclusive == 0 || grouped == 0);
            if grouped > 0 {
                let members = container.get_group_root::<Value>(&location!()).unwrap();
                assert_eq!(members.len(), grouped);
            }
        }
        Err(err) => {
            let duplicates = err.duplicates().count();
            let captives = err
                .errors()
                .iter()
                .filter(|e| matches!(e, DiError::CaptiveDependency { .. }))
                .count();
            assert_eq!(duplicates + captives, err.errors().len());
            assert!(duplicates > 0 || (scoped_value && consumers > 0));
        }
    }
});
