//! Integration tests for promise chains.
//!
//! Tests covering single resolution, continuation ordering, failure
//! short-circuiting, transform failures, taps and delays.

mod common;

use common::{EventLog, SensorOffline, TIMEOUT, delayed, delayed_failure};
use core::time::Duration;
use piguard_promise::{Error, ErrorKind, Outcome, Promise, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Instant;

// ═══════════════════════════════════════════════════════════════════════════════
// SINGLE RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that racing `succeed` and `fail` from two threads stores exactly one outcome.
#[test]
fn racing_resolutions_store_exactly_one_outcome() {
    for _ in 0..50 {
        let (tx, rx) = mpsc::channel();
        let promise: Promise<u32> = Promise::new(move |resolver: Resolver<u32>| {
            let barrier = Arc::new(Barrier::new(2));
            let handles: Vec<_> = [true, false]
                .into_iter()
                .map(|succeed| {
                    let resolver = resolver.clone();
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        if succeed {
                            resolver.succeed(7)
                        } else {
                            resolver.fail(SensorOffline("co2"))
                        }
                    })
                })
                .collect();
            let accepted: Vec<bool> = handles
                .into_iter()
                .map(|handle| handle.join().expect("resolver thread panicked"))
                .collect();
            tx.send(accepted).unwrap();
        });

        let accepted = rx.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(accepted.iter().filter(|won| **won).count(), 1);

        let outcome = promise.join();
        if accepted[0] {
            assert_eq!(outcome.unwrap(), 7);
        } else {
            assert_eq!(outcome.unwrap_err().kind(), ErrorKind::Rejected);
        }
    }
}

/// Verifies that a failure resolved first wins over a later success.
#[test]
fn first_failure_wins_over_later_success() {
    let promise: Promise<i32> = Promise::new(|resolver| {
        resolver.fail(SensorOffline("humidity"));
        resolver.succeed(1);
    });

    let error = promise.join().unwrap_err();
    assert_eq!(error.downcast_ref::<SensorOffline>(), Some(&SensorOffline("humidity")));
}

/// Verifies that continuations attached after resolution observe the outcome exactly once.
#[test]
fn continuation_attached_after_resolution_runs_once() {
    let promise = Promise::resolved(5);
    assert_eq!(promise.join().unwrap(), 5);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let derived = promise.then(move |v| {
        counter.fetch_add(1, Ordering::SeqCst);
        v * 3
    });

    assert_eq!(derived.join().unwrap(), 15);
    assert_eq!(derived.join().unwrap(), 15);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORDERING
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies the delayed-success scenario `42 -> +1 -> *2`.
#[test]
fn delayed_value_chains_to_86() {
    let result = delayed(42, Duration::from_millis(30))
        .then(|x| x + 1)
        .then(|x| x * 2);

    assert!(matches!(result.join(), Ok(86)));
}

/// Verifies that `a` runs before `b` in `f.then(a).then(b)` regardless of `f`'s delay.
#[test]
fn chained_continuations_run_after_parent() {
    for delay in [0, 5, 25] {
        let log = EventLog::new();
        let (a_log, b_log, f_log) = (log.clone(), log.clone(), log.clone());

        let f = Promise::new(move |resolver| {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(delay));
                f_log.push("f");
                resolver.succeed(1);
            });
        });
        let done = f
            .then(move |v| {
                a_log.push("a");
                v + 1
            })
            .then(move |v| {
                b_log.push("b");
                v + 1
            });

        assert_eq!(done.join().unwrap(), 3);
        assert_eq!(log.events(), ["f", "a", "b"]);
    }
}

/// Verifies that taps on one promise run in attachment order.
#[test]
fn taps_run_in_attachment_order() {
    let log = EventLog::new();
    let promise = delayed("reading", Duration::from_millis(10));

    for i in 0..5 {
        let log = log.clone();
        let _ = promise.on_success(move |_| log.push(format!("tap{i}")));
    }

    promise.join().unwrap();
    assert_eq!(log.events(), ["tap0", "tap1", "tap2", "tap3", "tap4"]);
}

/// Verifies that a tap attached after a derived promise waits for that derived promise.
#[test]
fn gate_is_shared_with_derived_promises() {
    let log = EventLog::new();
    let (step_log, tap_log) = (log.clone(), log.clone());

    let parent = Promise::resolved(1);
    let step = parent.and_then(move |v, resolver: Resolver<i32>| {
        let value = *v;
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            step_log.push("step");
            resolver.succeed(value + 1);
        });
    });
    let tapped = parent.on_success(move |_| tap_log.push("tap"));

    tapped.join().unwrap();
    assert_eq!(step.join().unwrap(), 2);
    assert_eq!(log.events(), ["step", "tap"]);
}

/// Verifies that independent chains do not wait for each other.
#[test]
fn independent_chains_run_in_parallel() {
    let slow = delayed(1, Duration::from_millis(300));
    let fast = delayed(2, Duration::from_millis(5));

    let started = Instant::now();
    assert_eq!(fast.join().unwrap(), 2);
    assert!(started.elapsed() < Duration::from_millis(300));
    assert!(!slow.is_resolved());
    assert_eq!(slow.join().unwrap(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// FAILURES
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that a failed parent short-circuits `then` without calling the transform.
#[test]
fn failure_short_circuits_transform() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let derived = delayed_failure::<i32>(SensorOffline("pressure"), Duration::from_millis(5))
        .then(move |v| {
            counter.fetch_add(1, Ordering::SeqCst);
            v + 1
        });

    let error = derived.join().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Rejected);
    assert_eq!(error.downcast_ref::<SensorOffline>(), Some(&SensorOffline("pressure")));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Verifies that an error raised by a transform becomes the derived promise's failure.
#[test]
fn transform_failure_is_captured() {
    let derived = Promise::resolved(String::from("21.x")).try_then(|raw| raw.parse::<f64>());

    let error = derived.join().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Transform);
    assert!(error.downcast_ref::<core::num::ParseFloatError>().is_some());
}

/// Verifies that a transform failure propagates unchanged down the rest of the chain.
#[test]
fn transform_failure_propagates_down_chain() {
    let handled = EventLog::new();
    let handler_log = handled.clone();

    let tail = Promise::resolved(1)
        .try_then(|_| Err::<i32, _>(SensorOffline("motion")))
        .then(|v| v + 1)
        .and_then(|v, resolver: Resolver<i32>| {
            resolver.succeed(*v);
        })
        .on_error(move |error| handler_log.push(error.to_string()));

    let error = tail.join().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Transform);
    assert_eq!(handled.events(), ["transform failed: sensor motion offline"]);
}

/// Verifies that `on_error` only runs for failures and `on_success` only for successes.
#[test]
fn taps_are_selective() {
    let log = EventLog::new();
    let (ok_log, err_log) = (log.clone(), log.clone());
    let _ = Promise::resolved(1)
        .on_error(move |_| err_log.push("error on success"))
        .on_success(move |_| ok_log.push("success"))
        .join();

    let (ok_log, err_log) = (log.clone(), log.clone());
    let _ = Promise::<i32>::rejected(Error::rejected("offline"))
        .on_success(move |_| ok_log.push("success on failure"))
        .on_error(move |_| err_log.push("error"))
        .join();

    assert_eq!(log.events(), ["success", "error"]);
}

/// Verifies that an asynchronous step can fail the derived promise.
#[test]
fn async_step_failure() {
    let derived = Promise::resolved(3).and_then(|_, resolver: Resolver<u8>| {
        thread::spawn(move || resolver.fail(SensorOffline("camera")));
    });
    assert_eq!(derived.join().unwrap_err().kind(), ErrorKind::Rejected);
}

/// Verifies that a step dropping its resolver fails the derived promise instead of stalling the gate.
#[test]
fn async_step_dropping_resolver_abandons() {
    let parent = Promise::resolved(3);
    let derived = parent.and_then(|_, _resolver: Resolver<u8>| {});
    let after = parent.then(|v| v + 1);

    assert_eq!(derived.join().unwrap_err().kind(), ErrorKind::Abandoned);
    assert_eq!(after.join().unwrap(), 4);
}

/// Verifies that a panicking tap does not break later continuations.
#[test]
fn panicking_tap_is_contained() {
    let promise = Promise::resolved(2);
    let _ = promise.on_success(|_| panic!("tap exploded"));
    assert_eq!(promise.then(|v| v * 2).join().unwrap(), 4);
}

// ═══════════════════════════════════════════════════════════════════════════════
// WAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that `wait` does not resolve before the delay elapses, even on a resolved parent.
#[test]
fn wait_holds_for_delay() {
    let parent = Promise::resolved(9);
    parent.join().unwrap();

    let started = Instant::now();
    let delayed = parent.wait(Duration::from_millis(60));
    assert_eq!(delayed.join().unwrap(), 9);
    assert!(started.elapsed() >= Duration::from_millis(60));
}

/// Verifies that `wait` delays continuations attached later on the same gate.
#[test]
fn wait_blocks_the_gate() {
    let parent = Promise::resolved(1);
    let started = Instant::now();
    let _delayed = parent.wait(Duration::from_millis(50));
    let after = parent.then(|v| v + 1);

    assert_eq!(after.join().unwrap(), 2);
    assert!(started.elapsed() >= Duration::from_millis(50));
}

/// Verifies that `wait` passes a failure through after the delay.
#[test]
fn wait_passes_failure_through() {
    let delayed = Promise::<i32>::rejected(Error::rejected("offline")).wait(Duration::from_millis(5));
    assert!(matches!(
        delayed.join(),
        Err(error) if error.kind() == ErrorKind::Rejected
    ));
}

/// Verifies that `outcome` reports the stored result once resolved.
#[test]
fn outcome_peek_after_join() {
    let promise = Promise::resolved(vec![1, 2, 3]);
    promise.join().unwrap();
    match promise.outcome() {
        Some(Outcome::Success(values)) => assert_eq!(values, &[1, 2, 3]),
        other => panic!("unexpected outcome: {other:?}"),
    }
}
