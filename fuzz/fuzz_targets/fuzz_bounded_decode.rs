//! Fuzz target: `deserialize_bounded`
//!
//! Feeds arbitrary bytes to the bounded JSON decoder with every field
//! budget from 0 to 15 and checks that an accepted document never uses
//! more slots than allowed.
//!
//! cargo fuzz run fuzz_bounded_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use tbclient::json::decode::{deserialize_bounded, slot_count};

fuzz_target!(|data: &[u8]| {
    let Some((&budget, json)) = data.split_first() else {
        return;
    };
    let budget = usize::from(budget & 0x0F);

    if let Ok(value) = deserialize_bounded(json, budget) {
        assert!(
            slot_count(&value) <= budget,
            "decoder exceeded field budget"
        );
    }
});
