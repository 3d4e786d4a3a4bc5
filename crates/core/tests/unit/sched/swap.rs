//! Swap protocol tests: overflowed processes run and memory state survives
//! the round trip through disk.

use pretty_assertions::assert_eq;

use crate::common::harness::TestContext;
use crate::common::programs;
use osim_core::proc::ProcessState;

#[test]
fn test_overflowed_process_swaps_in_and_completes() {
    let mut ctx = TestContext::new();
    ctx.kernel.format(false).unwrap();
    ctx.kernel.set_quantum(1).unwrap();
    let pids: Vec<u32> = (0..4).map(|_| ctx.load(programs::PRINT_42)).collect();
    let _ = ctx.kernel.run_all();
    let _ = ctx.run_to_idle();

    for pid in pids {
        assert_eq!(ctx.state_of(pid), ProcessState::Terminated);
    }
    assert_eq!(ctx.output(), "42424242");

    // Every swap file was consumed or deleted along the way.
    assert_eq!(ctx.kernel.list_files(true).unwrap(), Vec::<String>::new());
    assert!(ctx.kernel.stats().swaps_in >= 1);
    assert!(ctx.kernel.stats().swaps_out >= 1);
}

#[test]
fn test_memory_state_survives_the_swap_round_trip() {
    // Store 42 early, idle a few pulses (guaranteeing preemption and
    // eviction under quantum 1), then print what memory still holds.
    const STORE_SPIN_PRINT: &str = "A9 2A 8D 10 00 EA EA EA AC 10 00 A2 01 FF 00";

    let mut ctx = TestContext::new();
    ctx.kernel.format(false).unwrap();
    ctx.kernel.set_quantum(1).unwrap();
    for _ in 0..4 {
        let _ = ctx.load(STORE_SPIN_PRINT);
    }
    let _ = ctx.kernel.run_all();
    let _ = ctx.run_to_idle();

    assert_eq!(ctx.output(), "42424242");
}

#[test]
fn test_swap_victim_is_least_recently_dispatched() {
    let mut ctx = TestContext::new();
    for _ in 0..3 {
        let _ = ctx.load(programs::PRINT_42);
    }
    // Run pid 0 to completion; pids 1 and 2 have never been dispatched and
    // therefore rank oldest, in registry order.
    ctx.run_pid(0);
    let _ = ctx.run_to_idle();
    assert_eq!(ctx.kernel.manager().swap_victim(None), Some(1));
}

#[test]
fn test_disk_resident_process_can_be_killed() {
    let mut ctx = TestContext::new();
    ctx.kernel.format(false).unwrap();
    let pids: Vec<u32> = (0..4).map(|_| ctx.load(programs::PRINT_42)).collect();
    ctx.kernel.kill(pids[3]).unwrap();

    assert_eq!(ctx.state_of(pids[3]), ProcessState::Terminated);
    // Its swap file is gone with it.
    assert_eq!(ctx.kernel.list_files(true).unwrap(), Vec::<String>::new());
}
