//! Physical memory: the byte array and the partition base table.
//!
//! [`MainMemory`] is the machine's entire physical store: `partition_size ×
//! partition_count` bytes, carved into contiguous, non-overlapping partitions
//! of one `partition_size` each. Bounds here are host-level invariants
//! (violations are simulator bugs and assert); program-visible bounds
//! enforcement lives in the accessor.

use crate::common::addr::PhysAddr;
use crate::config::MemoryConfig;

/// The machine's physical memory.
#[derive(Debug, Clone)]
pub struct MainMemory {
    bytes: Vec<u8>,
    partition_size: u16,
    bases: Vec<PhysAddr>,
}

impl MainMemory {
    /// Creates zeroed memory with the partition geometry from `config`.
    pub fn new(config: &MemoryConfig) -> Self {
        let bases = (0..config.partition_count)
            .map(|i| PhysAddr::new(i as u16 * config.partition_size))
            .collect();
        Self {
            bytes: vec![0; config.total_bytes()],
            partition_size: config.partition_size,
            bases,
        }
    }

    /// Total bytes of physical memory.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the machine has no memory at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The partition limit register: bytes per partition.
    pub const fn partition_size(&self) -> u16 {
        self.partition_size
    }

    /// Base addresses of every partition, in address order.
    pub fn partition_bases(&self) -> &[PhysAddr] {
        &self.bases
    }

    /// Reads one byte at a physical address.
    pub fn read_u8(&self, addr: PhysAddr) -> u8 {
        let i = addr.val() as usize;
        assert!(i < self.bytes.len(), "physical read out of memory");
        self.bytes[i]
    }

    /// Writes one byte at a physical address.
    pub fn write_u8(&mut self, addr: PhysAddr, val: u8) {
        let i = addr.val() as usize;
        assert!(i < self.bytes.len(), "physical write out of memory");
        self.bytes[i] = val;
    }

    /// Reads `len` contiguous bytes starting at a physical address.
    pub fn read_slice(&self, addr: PhysAddr, len: usize) -> &[u8] {
        let i = addr.val() as usize;
        assert!(i + len <= self.bytes.len(), "physical read out of memory");
        &self.bytes[i..i + len]
    }
}
