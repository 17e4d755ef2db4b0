//! Fuzz testing for the interning string pool.
//!
//! Drives an arbitrary sequence of stage/save/clear operations and checks
//! that interning stays consistent: equal content always resolves to the
//! reference it was first committed under.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

use packdb::{Distinct, StringPool};

#[derive(Debug, Arbitrary)]
enum Op {
    Push(u8),
    PushStr(String),
    Save,
    Clear,
    Flatten,
}

fuzz_target!(|ops: Vec<Op>| {
    let mut pool = Distinct::new(StringPool::with_capacity(32));
    let mut seen: HashMap<Vec<u8>, packdb::StrRef> = HashMap::new();

    for op in ops {
        match op {
            Op::Push(byte) => pool.push(byte),
            Op::PushStr(s) => pool.push_str(&s),
            Op::Save => {
                let content = pool.pending().as_bytes().to_vec();
                let at = pool.save();
                match seen.get(&content) {
                    Some(&expected) => assert_eq!(at, expected),
                    None => {
                        seen.insert(content, at);
                    }
                }
            }
            Op::Clear => pool.clear(),
            Op::Flatten => pool.flatten(),
        }
    }
});
