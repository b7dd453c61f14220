//! Counter visibility and ordering as seen from outside the dispatcher.

use std::sync::Arc;

use gauntlet_probe::{AssertionProbe, CounterRegistry, ProbeConfig};
use proptest::prelude::*;

fn probe() -> AssertionProbe {
    AssertionProbe::new(ProbeConfig {
        checks_enabled: false,
    })
    .unwrap()
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

#[test]
fn probe_returns_before_counter_is_updated() {
    let probe = probe();
    let guard = probe.suspend().unwrap();

    probe.probe(true);
    probe.probe_named("hot.path", true);

    // Worker is parked: nothing is visible yet.
    assert_eq!(probe.global_count(), 0);
    assert_eq!(probe.anonymous_count(), 0);
    assert_eq!(probe.named_count("hot.path"), 0);
    assert_eq!(probe.pending(), 4);

    drop(guard);
    probe.flush_blocking().unwrap();

    assert_eq!(probe.global_count(), 2);
    assert_eq!(probe.anonymous_count(), 1);
    assert_eq!(probe.named_count("hot.path"), 1);
}

#[test]
fn reset_does_not_drain_in_flight_increments() {
    let probe = probe();
    let guard = probe.suspend().unwrap();

    probe.probe(true);
    probe.reset();
    drop(guard);
    probe.flush_blocking().unwrap();

    // Increment queued before the reset lands after it.
    assert_eq!(probe.global_count(), 1);
    assert_eq!(probe.anonymous_count(), 1);
}

#[test]
fn shared_registry_between_probes() {
    let registry = Arc::new(CounterRegistry::new());
    let a = AssertionProbe::with_registry(Arc::clone(&registry), ProbeConfig::default()).unwrap();
    let b = AssertionProbe::with_registry(Arc::clone(&registry), ProbeConfig::default()).unwrap();

    a.probe_named("shared", true);
    b.probe_named("shared", true);
    a.flush_blocking().unwrap();
    b.flush_blocking().unwrap();

    assert_eq!(registry.named_count("shared"), 2);
    assert_eq!(registry.global().get(), 2);
}

#[test]
fn many_threads_probing_converge_after_flush() {
    let probe = probe();
    let threads: Vec<_> = (0..8)
        .map(|i| {
            let probe = probe.clone();
            std::thread::spawn(move || {
                for _ in 0..250 {
                    if i % 2 == 0 {
                        probe.probe(true);
                    } else {
                        probe.probe_named("odd", true);
                    }
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    probe.flush_blocking().unwrap();

    assert_eq!(probe.global_count(), 2000);
    assert_eq!(probe.anonymous_count(), 1000);
    assert_eq!(probe.named_count("odd"), 1000);
    assert_eq!(probe.pending(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn async_flush_from_runtime() {
    let probe = probe();
    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let probe = probe.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    probe.probe(true);
                }
            })
        })
        .collect();
    for t in tasks {
        t.await.unwrap();
    }

    probe.flush().await.unwrap();
    assert_eq!(probe.global_count(), 400);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn anonymous_probes_count_exactly(n in 1usize..500) {
        let probe = probe();
        for _ in 0..n {
            probe.probe(true);
        }
        probe.flush_blocking().unwrap();

        prop_assert_eq!(probe.global_count(), n as u64);
        prop_assert_eq!(probe.anonymous_count(), n as u64);
    }

    #[test]
    fn unseen_name_ends_at_call_count(name in "[a-z]{1,12}", n in 1usize..300) {
        let probe = probe();
        prop_assert!(!probe.registry().names().contains(&name));

        for _ in 0..n {
            probe.probe_named(&name, true);
        }
        probe.flush_blocking().unwrap();

        prop_assert_eq!(probe.named_count(&name), n as u64);
        prop_assert_eq!(probe.global_count(), n as u64);

        probe.reset();
        prop_assert_eq!(probe.named_count(&name), 0);
        prop_assert_eq!(probe.global_count(), 0);
        prop_assert_eq!(probe.anonymous_count(), 0);
    }
}
