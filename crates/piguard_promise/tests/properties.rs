//! Property tests for promise chains.

use piguard_promise::{Error, ErrorKind, Promise};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A chain of additions resolves to the sum, applied in order.
    #[test]
    fn chained_transforms_apply_in_order(start in -1000i64..1000, steps in prop::collection::vec(-50i64..50, 0..12)) {
        let mut promise = Promise::resolved(start);
        let mut trace = vec![start];
        for step in &steps {
            let step = *step;
            promise = promise.then(move |v| v * 2 + step);
            let last = *trace.last().unwrap();
            trace.push(last * 2 + step);
        }

        prop_assert_eq!(promise.join().unwrap(), *trace.last().unwrap());
    }

    /// A failure at any point short-circuits every later transform.
    #[test]
    fn failure_short_circuits_any_chain(len in 1usize..10, fail_at in 0usize..10) {
        let fail_at = fail_at % len;
        let mut promise = Promise::resolved(0u32);
        for i in 0..len {
            promise = promise.try_then(move |v| {
                if i == fail_at {
                    Err(Error::transform(format!("step {i}")))
                } else {
                    Ok(v + 1)
                }
            });
        }

        let error = promise.join().unwrap_err();
        prop_assert_eq!(error.kind(), ErrorKind::Transform);
        prop_assert_eq!(error.to_string(), format!("transform failed: step {fail_at}"));
    }
}
