use memorder::{capability, compiler_fence, process_fence, AtomicCell, MemoryOrder};
use std::sync::Barrier;
use std::thread;

#[test]
fn capability_is_detected_once() {
    let barrier = Barrier::new(8);
    let seen: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    capability() as *const _ as usize
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(seen.windows(2).all(|w| w[0] == w[1]));

    let first = capability();
    assert_eq!(first.membarrier_local(), capability().membarrier_local());
    assert_eq!(first.membarrier_global(), capability().membarrier_global());
}

#[cfg(any(windows, target_family = "wasm"))]
#[test]
fn platform_fence_is_always_accelerated() {
    assert!(capability().is_accelerated());
}

#[test]
fn concurrent_process_fences_complete() {
    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..100 {
                    process_fence();
                }
            });
        }
    });
}

#[test]
fn asymmetric_dekker_never_misses_both_flags() {
    // The fast side pairs its store and load with a compiler fence only; the
    // slow side issues a process-wide fence. At least one side must observe
    // the other's flag in every round.
    const ROUNDS: u32 = 200;

    let fast_flag = AtomicCell::new(0u32);
    let slow_flag = AtomicCell::new(0u32);
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        let fast = s.spawn(|| {
            let mut seen = Vec::with_capacity(ROUNDS as usize);
            for round in 1..=ROUNDS {
                barrier.wait();
                fast_flag.store(round, MemoryOrder::Relax);
                compiler_fence(MemoryOrder::SeqCst);
                seen.push(slow_flag.load(MemoryOrder::Relax));
                barrier.wait();
            }
            seen
        });
        let slow = s.spawn(|| {
            let mut seen = Vec::with_capacity(ROUNDS as usize);
            for round in 1..=ROUNDS {
                barrier.wait();
                slow_flag.store(round, MemoryOrder::Relax);
                process_fence();
                seen.push(fast_flag.load(MemoryOrder::Relax));
                barrier.wait();
            }
            seen
        });

        let fast_seen = fast.join().unwrap();
        let slow_seen = slow.join().unwrap();
        for (i, (saw_slow, saw_fast)) in fast_seen.into_iter().zip(slow_seen).enumerate() {
            let round = i as u32 + 1;
            assert!(
                saw_slow == round || saw_fast == round,
                "round {round}: both sides missed the other's flag"
            );
        }
    });
}
