// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boot-device classification.
//!
//! The boot ROM (or an earlier loader stage) records which medium it booted
//! from in a strap/status register. Each platform's encoding is different, so
//! the mapping from raw code to logical device is descriptor data -- a static
//! table audited against the hardware documentation, never probed.

use num_derive::FromPrimitive;

/// The physical storage medium the firmware booted from, or should use for
/// environment persistence.
///
/// The discriminants are wire values: they are what lands in the handoff
/// block for the next stage, so they must never be renumbered. `Unknown` sits
/// at the top of the range to leave room for new media.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
#[repr(u8)]
pub enum BootDevice {
    Emmc = 0,
    Sd = 1,
    Nand = 2,
    SpiFlash = 3,
    Usb = 4,
    Unknown = 0xff,
}

/// Maps a raw strap code to a logical device using the platform's table.
///
/// Total and pure: every input maps to a variant, with codes absent from the
/// table mapping to [`BootDevice::Unknown`] rather than failing. Boot can
/// still proceed from an unknown medium; only environment selection degrades.
pub fn classify(table: &[(u32, BootDevice)], raw: u32) -> BootDevice {
    table
        .iter()
        .find(|(code, _)| *code == raw)
        .map(|&(_, device)| device)
        .unwrap_or(BootDevice::Unknown)
}

/// Selects the environment-storage slot for a device.
///
/// eMMC keeps the environment on its own controller instance (slot 1);
/// everything else shares the default slot 0. Boards that boot from eMMC
/// expect the environment to live there too, rather than on whatever card
/// happens to be in the SD slot.
pub fn env_storage_index(device: BootDevice) -> u32 {
    match device {
        BootDevice::Emmc => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TABLE: &[(u32, BootDevice)] = &[
        (0x0, BootDevice::SpiFlash),
        (0x2, BootDevice::Emmc),
        (0xb, BootDevice::Sd),
    ];

    #[test]
    fn documented_codes_classify_to_their_variant() {
        assert_eq!(classify(TABLE, 0x0), BootDevice::SpiFlash);
        assert_eq!(classify(TABLE, 0x2), BootDevice::Emmc);
        assert_eq!(classify(TABLE, 0xb), BootDevice::Sd);
    }

    #[test]
    fn undocumented_codes_classify_to_unknown() {
        assert_eq!(classify(TABLE, 0x1), BootDevice::Unknown);
        assert_eq!(classify(TABLE, 0xffff_ffff), BootDevice::Unknown);
        assert_eq!(classify(&[], 0x0), BootDevice::Unknown);
    }

    #[test]
    fn emmc_selects_slot_one_and_everything_else_slot_zero() {
        assert_eq!(env_storage_index(BootDevice::Emmc), 1);
        for device in [
            BootDevice::Sd,
            BootDevice::Nand,
            BootDevice::SpiFlash,
            BootDevice::Usb,
            BootDevice::Unknown,
        ] {
            assert_eq!(env_storage_index(device), 0);
        }
    }

    proptest! {
        // classify is total and deterministic over the whole input space.
        #[test]
        fn classify_never_fails_and_is_pure(raw in any::<u32>()) {
            let first = classify(TABLE, raw);
            let second = classify(TABLE, raw);
            prop_assert_eq!(first, second);
            if !TABLE.iter().any(|(code, _)| *code == raw) {
                prop_assert_eq!(first, BootDevice::Unknown);
            }
        }
    }
}
