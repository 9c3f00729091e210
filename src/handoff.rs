// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The sealed handoff block.
//!
//! Once the init sequence finishes, the resolved configuration is frozen
//! into a fixed-layout block the generic boot flow (and any later stage)
//! reads back. The block is self-describing -- magic, version, checksum --
//! because the consumer may be a different program entirely, picking the
//! bytes up out of a shared RAM region it has no other provenance for.

use num_traits::FromPrimitive;
use static_assertions::const_assert_eq;
use thiserror::Error;
use zerocopy::{AsBytes, FromBytes};

use crate::bootdev::BootDevice;
use crate::BootContext;

/// "boot", little-endian.
pub const HANDOFF_MAGIC: u32 = 0x626f_6f74;
pub const HANDOFF_VERSION: u8 = 1;

/// Fixed-layout resolved boot configuration.
///
/// Layout is `repr(C)` with explicit padding so the struct can be punned
/// to bytes directly. The checksum is CRC-32/MPEG-2 over everything before
/// the `crc` field; the trailing pad is excluded.
#[derive(Copy, Clone, Debug, AsBytes, FromBytes)]
#[repr(C)]
pub struct Handoff {
    pub magic: u32,
    pub version: u8,
    /// [`BootDevice`] wire discriminant.
    pub boot_device: u8,
    _pad: [u8; 2],
    pub env_storage_index: u32,
    pub board_arch_id: u32,
    pub ram_size_bytes: u64,
    pub boot_params_address: u64,
    pub crc: u32,
    _pad2: [u8; 4],
}

const_assert_eq!(core::mem::size_of::<Handoff>(), 40);

/// Offset of the `crc` field; the checksum covers everything before it.
const CRC_OFFSET: usize = 32;

const CKSUM: crc::Crc<u32> = crc::Crc::<u32>::new(&crc_catalog::CRC_32_MPEG_2);

#[derive(Debug, Error, Eq, PartialEq)]
pub enum HandoffError {
    #[error("buffer too small for a handoff block")]
    Truncated,
    #[error("bad handoff magic {found:#x}")]
    BadMagic { found: u32 },
    #[error("unsupported handoff version {found}")]
    UnsupportedVersion { found: u8 },
    #[error("handoff checksum mismatch (stored {stored:#x}, computed {computed:#x})")]
    Corrupt { stored: u32, computed: u32 },
}

impl Handoff {
    /// Freezes a populated context into a checksummed block.
    pub fn seal(ctx: &BootContext) -> Self {
        let mut block = Handoff {
            magic: HANDOFF_MAGIC,
            version: HANDOFF_VERSION,
            boot_device: ctx.boot_device as u8,
            _pad: [0; 2],
            env_storage_index: ctx.env_storage_index,
            board_arch_id: ctx.board_arch_id,
            ram_size_bytes: ctx.ram_size_bytes,
            boot_params_address: ctx.boot_params_address,
            crc: 0,
            _pad2: [0; 4],
        };
        block.crc = block.body_crc();
        block
    }

    fn body_crc(&self) -> u32 {
        CKSUM.checksum(&self.as_bytes()[..CRC_OFFSET])
    }

    /// Checks magic, version, and checksum.
    pub fn validate(&self) -> Result<(), HandoffError> {
        if self.magic != HANDOFF_MAGIC {
            return Err(HandoffError::BadMagic { found: self.magic });
        }
        if self.version != HANDOFF_VERSION {
            return Err(HandoffError::UnsupportedVersion {
                found: self.version,
            });
        }
        let computed = self.body_crc();
        if self.crc != computed {
            return Err(HandoffError::Corrupt {
                stored: self.crc,
                computed,
            });
        }
        Ok(())
    }

    /// Reads and validates a block from the front of `bytes`, as a later
    /// stage would from the shared region.
    pub fn read_from(bytes: &[u8]) -> Result<Self, HandoffError> {
        let block =
            <Handoff as FromBytes>::read_from_prefix(bytes).ok_or(HandoffError::Truncated)?;
        block.validate()?;
        Ok(block)
    }

    /// Writes the block to the front of `buf`.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<(), HandoffError> {
        AsBytes::write_to_prefix(self, buf).ok_or(HandoffError::Truncated)
    }

    /// Decodes the stored device code. Codes written by a newer stage with
    /// media we do not know about come out as `Unknown` rather than failing.
    pub fn device(&self) -> BootDevice {
        BootDevice::from_u8(self.boot_device).unwrap_or(BootDevice::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_context() -> BootContext {
        let mut ctx = BootContext::new();
        ctx.boot_device = BootDevice::Emmc;
        ctx.env_storage_index = 1;
        ctx.ram_size_bytes = 2 << 30;
        ctx.board_arch_id = 4906;
        ctx.boot_params_address = 0x100;
        ctx
    }

    #[test]
    fn seal_then_read_round_trips() {
        let sealed = Handoff::seal(&populated_context());

        let mut region = [0u8; 64];
        sealed.write_to(&mut region).unwrap();

        let read = Handoff::read_from(&region).unwrap();
        assert_eq!(read.device(), BootDevice::Emmc);
        assert_eq!(read.env_storage_index, 1);
        assert_eq!(read.ram_size_bytes, 2 << 30);
        assert_eq!(read.board_arch_id, 4906);
        assert_eq!(read.boot_params_address, 0x100);
    }

    #[test]
    fn corruption_is_detected() {
        let sealed = Handoff::seal(&populated_context());
        let mut region = [0u8; 40];
        sealed.write_to(&mut region).unwrap();

        // Flip one payload bit.
        region[16] ^= 1;
        assert!(matches!(
            Handoff::read_from(&region),
            Err(HandoffError::Corrupt { .. })
        ));
    }

    #[test]
    fn wrong_magic_version_and_size_are_rejected() {
        let sealed = Handoff::seal(&populated_context());
        let mut region = [0u8; 40];
        sealed.write_to(&mut region).unwrap();

        assert!(matches!(
            Handoff::read_from(&region[..39]),
            Err(HandoffError::Truncated)
        ));

        let mut bad_magic = region;
        bad_magic[0] ^= 0xff;
        assert!(matches!(
            Handoff::read_from(&bad_magic),
            Err(HandoffError::BadMagic { .. })
        ));

        let mut bad_version = region;
        bad_version[4] = 99;
        assert!(matches!(
            Handoff::read_from(&bad_version),
            Err(HandoffError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn unknown_wire_codes_decode_to_unknown() {
        let mut sealed = Handoff::seal(&populated_context());
        sealed.boot_device = 0x7e;
        sealed.crc = sealed.body_crc();

        let mut region = [0u8; 40];
        sealed.write_to(&mut region).unwrap();
        assert_eq!(Handoff::read_from(&region).unwrap().device(), BootDevice::Unknown);
    }
}
