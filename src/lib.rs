//! Platform boot-configuration resolver.
//!
//! Early firmware has to answer a small set of questions before the generic
//! boot flow can start: which medium did we boot from, where should the
//! environment live, how much DRAM did the previous stage set up, and what
//! board identity do we hand the next stage. The answers differ per platform
//! but the logic does not, so this crate keeps the logic in one place and
//! pushes everything platform-specific into static descriptor data:
//!
//! - [`bootdev`] classifies a raw boot-strap code into a logical device and
//!   picks the environment-storage slot.
//! - [`regmap`] gives bounds-checked, named-field access to memory-mapped
//!   configuration registers, through a bus trait so host tests run against
//!   a RAM fake.
//! - [`seq`] runs the ordered, fallible bring-up steps; [`steps`] has the
//!   generic actions the descriptors compose.
//! - [`platform`] holds one descriptor record per supported platform.
//! - [`handoff`] freezes the result into a checksummed block for the next
//!   stage.
//!
//! Everything here runs single-threaded during board init, before any
//! secondary core or interrupt source is enabled; the crate neither needs
//! nor contains any locking, and the strict ordering of init steps is part
//! of the contract.

#![cfg_attr(not(test), no_std)]

pub mod bootdev;
pub mod handoff;
pub mod platform;
pub mod regmap;
pub mod seq;
pub mod steps;

use bootdev::BootDevice;
use platform::Platform;
use regmap::RegisterBus;
use seq::{SequenceError, SequenceReport, StepContext};

/// The state assembled during board init.
///
/// Constructed empty, populated by the init sequence, and then owned
/// immutably by the caller for the rest of the boot -- there is no global
/// carrying this, and nothing mutates it after [`resolve`] returns. Seal it
/// with [`handoff::Handoff::seal`] to pass it across a stage boundary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BootContext {
    pub boot_device: BootDevice,
    pub env_storage_index: u32,
    pub ram_size_bytes: u64,
    pub board_arch_id: u32,
    pub boot_params_address: u64,
}

impl BootContext {
    pub const fn new() -> Self {
        Self {
            boot_device: BootDevice::Unknown,
            env_storage_index: 0,
            ram_size_bytes: 0,
            board_arch_id: 0,
            boot_params_address: 0,
        }
    }
}

impl Default for BootContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `platform`'s init sequence and returns the populated context.
///
/// This is the once-per-boot entry point. The context comes back by value:
/// whoever called us holds the only copy, read-only from here on.
pub fn resolve(
    platform: &'static Platform,
    bus: &mut dyn RegisterBus,
) -> Result<(BootContext, SequenceReport), SequenceError> {
    let mut ctx = BootContext::new();
    let report = seq::run(
        platform.steps,
        &mut StepContext {
            platform,
            bus,
            ctx: &mut ctx,
        },
    )?;
    Ok((ctx, report))
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::regmap::{RegWidth, RegisterBus};
    use std::collections::BTreeMap;

    /// RAM-backed bus with access counters, standing in for the MMIO map in
    /// host tests. Unwritten addresses read as zero, like freshly-reset
    /// scratch registers.
    pub struct MemBus {
        mem: BTreeMap<u64, u64>,
        pub reads: usize,
        pub writes: usize,
    }

    impl MemBus {
        pub fn new() -> Self {
            Self {
                mem: BTreeMap::new(),
                reads: 0,
                writes: 0,
            }
        }

        /// Seeds a register without counting an access, as the hardware (or
        /// an earlier boot stage) would have.
        pub fn store(&mut self, addr: u64, value: u64) {
            self.mem.insert(addr, value);
        }

        pub fn load(&self, addr: u64) -> u64 {
            self.mem.get(&addr).copied().unwrap_or(0)
        }
    }

    impl RegisterBus for MemBus {
        fn read(&mut self, addr: u64, width: RegWidth) -> u64 {
            self.reads += 1;
            self.load(addr) & width.mask()
        }

        fn write(&mut self, addr: u64, width: RegWidth, value: u64) {
            self.writes += 1;
            self.mem.insert(addr, value & width.mask());
        }
    }
}
