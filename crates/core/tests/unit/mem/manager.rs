//! Partition allocation and swap-overflow tests.

use pretty_assertions::assert_eq;

use crate::common::harness::TestContext;
use crate::common::programs;
use osim_core::common::addr::PhysAddr;
use osim_core::common::error::{KernelError, MemoryError};
use osim_core::proc::{ProcessLocation, ProcessState};

#[test]
fn test_allocation_fills_partitions_in_order() {
    let mut ctx = TestContext::new();
    let pids: Vec<u32> = (0..3).map(|_| ctx.load(programs::PRINT_42)).collect();
    assert_eq!(pids, vec![0, 1, 2]);

    let bases: Vec<Option<PhysAddr>> = pids
        .iter()
        .map(|pid| ctx.kernel.manager().pcb(*pid).unwrap().base)
        .collect();
    assert_eq!(
        bases,
        vec![
            Some(PhysAddr::new(0x0000)),
            Some(PhysAddr::new(0x0100)),
            Some(PhysAddr::new(0x0200)),
        ]
    );
}

#[test]
fn test_oversized_program_is_rejected_without_a_pcb() {
    let mut ctx = TestContext::new();
    let image = vec![0xEAu8; 257]
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ");
    let err = ctx.kernel.load(&image, None).unwrap_err();
    assert_eq!(
        err,
        KernelError::Memory(MemoryError::ProgramTooLarge {
            len: 257,
            limit: 256
        })
    );
    assert!(ctx.kernel.manager().processes().is_empty());
}

#[test]
fn test_fourth_load_overflows_to_disk() {
    let mut ctx = TestContext::new();
    ctx.kernel.format(false).unwrap();
    let pids: Vec<u32> = (0..4).map(|_| ctx.load(programs::PRINT_42)).collect();

    for pid in &pids[..3] {
        let pcb = ctx.kernel.manager().pcb(*pid).unwrap();
        assert_eq!(pcb.location, ProcessLocation::Ram);
        assert_eq!(pcb.state, ProcessState::Resident);
    }
    let overflow = ctx.kernel.manager().pcb(pids[3]).unwrap();
    assert_eq!(overflow.location, ProcessLocation::Disk);
    assert_eq!(overflow.base, None);

    // The swap file is a hidden directory entry.
    assert!(
        ctx.kernel
            .list_files(true)
            .unwrap()
            .contains(&".process3.swp".to_string())
    );
    assert!(
        !ctx.kernel
            .list_files(false)
            .unwrap()
            .contains(&".process3.swp".to_string())
    );
}

#[test]
fn test_overflow_needs_a_formatted_disk() {
    let mut ctx = TestContext::new();
    for _ in 0..3 {
        let _ = ctx.load(programs::PRINT_42);
    }
    let err = ctx.kernel.load(programs::PRINT_42, None).unwrap_err();
    assert!(matches!(err, KernelError::Disk(_)));
    assert_eq!(ctx.kernel.manager().processes().len(), 3);
}

#[test]
fn test_deallocation_scrubs_the_partition() {
    let mut ctx = TestContext::new();
    for _ in 0..3 {
        let _ = ctx.load(programs::STORE_AND_RELOAD);
    }
    assert!(
        !ctx.kernel
            .manager()
            .has_free_partition(ctx.kernel.memory())
    );

    ctx.kernel.kill(0).unwrap();
    assert!(
        ctx.kernel
            .manager()
            .has_free_partition(ctx.kernel.memory())
    );
    for offset in 0..0x100 {
        assert_eq!(ctx.byte_at(offset), 0);
    }
}

#[test]
fn test_deallocation_is_idempotent() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(programs::PRINT_42);
    ctx.kernel.kill(pid).unwrap();
    ctx.kernel.kill(pid).unwrap();
    assert_eq!(ctx.state_of(pid), ProcessState::Terminated);
}

#[test]
fn test_priority_defaults_and_overrides() {
    let mut ctx = TestContext::new();
    let a = ctx.load(programs::PRINT_42);
    let b = ctx.load_with_priority(programs::PRINT_42, 5);
    assert_eq!(ctx.kernel.manager().pcb(a).unwrap().priority, 32);
    assert_eq!(ctx.kernel.manager().pcb(b).unwrap().priority, 5);
}

#[test]
fn test_freed_partition_is_reused() {
    let mut ctx = TestContext::new();
    for _ in 0..3 {
        let _ = ctx.load(programs::PRINT_42);
    }
    ctx.kernel.kill(1).unwrap();
    let pid = ctx.load(programs::PRINT_42);
    assert_eq!(
        ctx.kernel.manager().pcb(pid).unwrap().base,
        Some(PhysAddr::new(0x0100))
    );
}
