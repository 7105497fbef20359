// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The Cashbook Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Deadlock detection tests using parking_lot's built-in deadlock detector.
//!
//! These tests drive a real cashbook from many threads and verify that
//! the write gate, the store lock, and the actor registry maps never
//! form a cycle.
//!
//! The tests rely on the `deadlock_detection` feature of parking_lot to
//! automatically detect cycles in the lock graph.

use cashbook::{
    Actor, ActorId, ActorKind, ActorProfile, ActorRegistry, Cashbook, EntryDraft, EntryId,
    EntryKind,
};
use parking_lot::deadlock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

// === Test Fixtures ===

fn seeded_registry() -> Arc<ActorRegistry> {
    let registry = ActorRegistry::new();
    registry
        .insert(Actor::new(ActorId(1), ActorKind::Personnel, "Kwame Driver"))
        .unwrap();
    registry
        .insert(Actor::new(ActorId(2), ActorKind::Contractee, "Quarry Ltd"))
        .unwrap();
    registry
        .insert(Actor::new(ActorId(3), ActorKind::Third, "Fuel depot"))
        .unwrap();
    Arc::new(registry)
}

fn input(amount: Decimal, description: &str, actor: i64) -> EntryDraft {
    EntryDraft::new(EntryKind::Input, amount, description, ActorId(actor))
}

fn output(amount: Decimal, description: &str, actor: i64) -> EntryDraft {
    EntryDraft::new(EntryKind::Output, amount, description, ActorId(actor))
}

// === Deadlock Detection Infrastructure ===

/// Starts a background thread that checks for deadlocks.
/// Returns a handle to stop the detector.
fn start_deadlock_detector() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    thread::spawn(move || {
        while running_clone.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(100));
            let deadlocks = deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                eprintln!("\n=== DEADLOCK DETECTED ===");
                for (i, threads) in deadlocks.iter().enumerate() {
                    eprintln!("\nDeadlock #{}", i + 1);
                    for t in threads {
                        eprintln!("Thread ID: {:?}", t.thread_id());
                        eprintln!("Backtrace:\n{:#?}", t.backtrace());
                    }
                }
                panic!("Deadlock detected! See output above for details.");
            }
        }
    });

    running
}

/// Stops the deadlock detector.
fn stop_deadlock_detector(running: Arc<AtomicBool>) {
    running.store(false, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(150)); // Let detector thread exit
}

// === Tests ===

/// Test high contention on a single book with many threads.
#[test]
fn no_deadlock_high_contention_posting() {
    let detector = start_deadlock_detector();
    let book = Arc::new(Cashbook::in_memory(seeded_registry()));

    const NUM_THREADS: usize = 50;
    const OPS_PER_THREAD: usize = 100;

    let mut handles = Vec::with_capacity(NUM_THREADS);

    for _ in 0..NUM_THREADS {
        let book = book.clone();

        let handle = thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                if i % 3 == 0 {
                    let _ = book.post(input(dec!(10.00), "haul", 2));
                } else if i % 3 == 1 {
                    // May bounce on an empty book; that is fine.
                    let _ = book.post(output(dec!(1.00), "payout", 1));
                } else {
                    // Read operations
                    let _ = book.balance();
                    let _ = book.last_posted_id();
                    let _ = book.posted();
                }
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    // Verify final state is consistent
    let entries = book.posted().unwrap();
    let mut running = Decimal::ZERO;
    for entry in &entries {
        running += entry.kind.signed(entry.amount);
        assert!(entry.balance >= Decimal::ZERO);
        assert_eq!(entry.balance, running);
    }
    println!(
        "High contention test passed: {} threads × {} ops, {} rows",
        NUM_THREADS,
        OPS_PER_THREAD,
        entries.len()
    );
}

/// Test posted and pending operations interleaved across threads.
#[test]
fn no_deadlock_posted_and_pending_interleaving() {
    let detector = start_deadlock_detector();
    let book = Arc::new(Cashbook::in_memory(seeded_registry()));

    // Give the tray rows to collide on.
    for n in 0..6 {
        book.stage(output(dec!(1.00) + Decimal::from(n), "planned", 1))
            .unwrap();
    }

    const NUM_THREADS: usize = 20;
    const OPS_PER_THREAD: usize = 50;

    let mut handles = Vec::with_capacity(NUM_THREADS);

    for thread_id in 0..NUM_THREADS {
        let book = book.clone();

        let handle = thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let pending_id = EntryId(((thread_id + i) % 5 + 2) as i64);

                match i % 5 {
                    0 => {
                        let _ = book.post(input(dec!(5.00), "haul", 2));
                    }
                    1 => {
                        let _ = book.stage(output(dec!(2.50), "planned", 1));
                    }
                    2 => {
                        // Updates race with deletes and may miss.
                        let _ = book.update_pending(
                            pending_id,
                            output(dec!(3.00), "replanned", 3),
                        );
                    }
                    3 => {
                        let _ = book.delete_pending(pending_id);
                    }
                    _ => {
                        let _ = book.pending();
                        let _ = book.totals();
                    }
                }
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    println!(
        "Posted and pending interleaving test passed: {} threads × {} ops",
        NUM_THREADS, OPS_PER_THREAD
    );
}

/// Test reversal racing against posting on the same book.
#[test]
fn no_deadlock_reverse_and_post_cycling() {
    let detector = start_deadlock_detector();
    let book = Arc::new(Cashbook::in_memory(seeded_registry()));

    book.post(input(dec!(1000.00), "seed", 2)).unwrap();
    for n in 0..10 {
        book.post(input(dec!(10.00) + Decimal::from(n), "haul", 2))
            .unwrap();
    }

    const NUM_THREADS: usize = 16;
    const OPS_PER_THREAD: usize = 200;

    let mut handles = Vec::with_capacity(NUM_THREADS);

    for thread_id in 0..NUM_THREADS {
        let book = book.clone();

        let handle = thread::spawn(move || {
            for _ in 0..OPS_PER_THREAD {
                if thread_id % 2 == 0 {
                    // Reversals may drain down to the anchor and bounce.
                    let _ = book.reverse_last();
                } else {
                    let _ = book.post(input(dec!(7.00), "haul", 2));
                }
                thread::yield_now();
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    let entries = book.posted().unwrap();
    let mut running = Decimal::ZERO;
    for entry in &entries {
        running += entry.kind.signed(entry.amount);
        assert_eq!(entry.balance, running);
    }
    println!(
        "Reverse and post cycling test passed: {} posted rows, {} pending rows",
        entries.len(),
        book.pending().unwrap().len()
    );
}

/// Test actor registration racing against posting.
#[test]
fn no_deadlock_registry_and_book_interleaving() {
    let detector = start_deadlock_detector();
    let registry = seeded_registry();
    let book = Arc::new(Cashbook::in_memory(registry.clone()));
    let registered = Arc::new(AtomicU32::new(0));

    const NUM_WRITERS: usize = 8;
    const NUM_POSTERS: usize = 8;
    const OPS_PER_THREAD: usize = 50;

    let mut handles = Vec::with_capacity(NUM_WRITERS + NUM_POSTERS);

    for writer_id in 0..NUM_WRITERS {
        let registry = registry.clone();
        let registered = registered.clone();

        let handle = thread::spawn(move || {
            for n in 0..OPS_PER_THREAD {
                let name = format!("Depot {}-{}", writer_id, n);
                let profile = ActorProfile::new(ActorKind::Third, name);
                if registry.register(profile).is_ok() {
                    registered.fetch_add(1, Ordering::SeqCst);
                }
                thread::yield_now();
            }
        });

        handles.push(handle);
    }

    for _ in 0..NUM_POSTERS {
        let book = book.clone();
        let registry = registry.clone();

        let handle = thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                if i % 2 == 0 {
                    let _ = book.post(input(dec!(3.00), "haul", 2));
                } else {
                    // Scan the registry while it grows.
                    let _ = registry.actors();
                }
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    let expected = 3 + registered.load(Ordering::SeqCst) as usize;
    assert_eq!(registry.len(), expected);
    println!(
        "Registry interleaving test passed: {} actors, {} posted rows",
        registry.len(),
        book.posted().unwrap().len()
    );
}

/// Stress test with rapid gate acquire/release cycles.
#[test]
fn no_deadlock_rapid_gate_cycling() {
    let detector = start_deadlock_detector();
    let book = Arc::new(Cashbook::in_memory(seeded_registry()));

    const NUM_THREADS: usize = 20;
    const CYCLES_PER_THREAD: usize = 1000;

    let mut handles = Vec::with_capacity(NUM_THREADS);

    for _ in 0..NUM_THREADS {
        let book = book.clone();

        let handle = thread::spawn(move || {
            for _ in 0..CYCLES_PER_THREAD {
                // Rapid post
                book.post(input(dec!(0.01), "drip", 2)).unwrap();

                // Immediate read
                let _ = book.balance();
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    let expected = Decimal::new((NUM_THREADS * CYCLES_PER_THREAD) as i64, 2);
    assert_eq!(book.balance().unwrap(), expected);
    println!(
        "Rapid gate cycling test passed: {} threads × {} cycles",
        NUM_THREADS, CYCLES_PER_THREAD
    );
}

/// Test gate contention fairness - all threads should eventually complete.
#[test]
fn no_deadlock_gate_contention_fairness() {
    let detector = start_deadlock_detector();
    let book = Arc::new(Cashbook::in_memory(seeded_registry()));

    const NUM_THREADS: usize = 100;
    const OPS_PER_THREAD: usize = 10;

    let completed = Arc::new(AtomicU32::new(0));
    let mut handles = Vec::with_capacity(NUM_THREADS);

    for _ in 0..NUM_THREADS {
        let book = book.clone();
        let completed = completed.clone();

        let handle = thread::spawn(move || {
            for _ in 0..OPS_PER_THREAD {
                book.post(input(dec!(0.01), "drip", 2)).unwrap();
                thread::yield_now();
            }
            completed.fetch_add(1, Ordering::SeqCst);
        });

        handles.push(handle);
    }

    // Wait with timeout
    let start = std::time::Instant::now();
    let timeout = Duration::from_secs(30);

    for handle in handles {
        let remaining = timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            panic!("Timeout: threads did not complete in time (possible starvation)");
        }
        // Join should complete quickly if no deadlock
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    assert_eq!(
        completed.load(Ordering::SeqCst),
        NUM_THREADS as u32,
        "All threads should complete"
    );
    assert_eq!(
        book.balance().unwrap(),
        Decimal::new((NUM_THREADS * OPS_PER_THREAD) as i64, 2)
    );

    println!(
        "Gate fairness test passed: all {} threads completed",
        NUM_THREADS
    );
}

/// Test that verifies the deadlock detector itself runs clean on a
/// normal sequence.
#[test]
fn deadlock_detector_runs_clean() {
    let detector = start_deadlock_detector();

    let book = Cashbook::in_memory(seeded_registry());
    book.post(input(dec!(100.00), "seed", 2)).unwrap();
    book.post(output(dec!(50.00), "payout", 1)).unwrap();

    assert_eq!(book.balance().unwrap(), dec!(50.00));

    stop_deadlock_detector(detector);

    println!("Deadlock detector infrastructure verified");
}
