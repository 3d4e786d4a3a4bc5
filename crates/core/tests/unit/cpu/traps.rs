//! Trap tests: invalid opcodes, bounds violations, increment overflow.
//!
//! A trap terminates only the offending process; the machine keeps serving
//! everything else.

use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::TestContext;
use crate::common::programs;
use osim_core::proc::ProcessState;

#[test]
fn test_invalid_opcode_prints_exact_message_and_halts() {
    let mut ctx = TestContext::new();
    let pid = ctx.run_program(programs::INVALID_OPCODE);
    assert!(
        ctx.output()
            .contains("ERR: C3 is not a valid instruction. Halting program...")
    );
    assert_eq!(ctx.state_of(pid), ProcessState::Terminated);
    // Partition 0 scrubbed on deallocation.
    assert_eq!(ctx.byte_at(0x00), 0);
    assert_eq!(ctx.byte_at(0x01), 0);
}

#[rstest]
#[case::load_past_partition("AD 00 02 00")]
#[case::store_past_partition("A9 01 8D 00 01 00")]
#[case::compare_past_partition("A2 01 EC 00 01 00")]
#[case::increment_past_partition("EE 00 01 00")]
fn test_access_outside_partition_traps(#[case] program: &str) {
    let mut ctx = TestContext::new();
    let pid = ctx.run_program(program);
    assert_eq!(ctx.state_of(pid), ProcessState::Terminated);
    assert!(ctx.output().contains("Halting program"));
}

#[test]
fn test_increment_past_ff_traps() {
    let mut ctx = TestContext::new();
    let pid = ctx.run_program("A9 FF 8D 10 00 EE 10 00 00");
    assert_eq!(ctx.state_of(pid), ProcessState::Terminated);
    assert!(ctx.output().contains("increment past 0xFF"));
}

#[test]
fn test_trap_does_not_disturb_other_processes() {
    let mut ctx = TestContext::new();
    let bad = ctx.load(programs::INVALID_OPCODE);
    let good = ctx.load(programs::PRINT_42);
    ctx.run_pid(bad);
    ctx.run_pid(good);
    let _ = ctx.run_to_idle();
    assert_eq!(ctx.state_of(bad), ProcessState::Terminated);
    assert_eq!(ctx.state_of(good), ProcessState::Terminated);
    assert!(ctx.output().contains("42"));
}
