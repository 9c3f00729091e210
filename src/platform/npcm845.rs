// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Nuvoton NPCM845 (Arbel) BMC.
//!
//! The bootblock runs before us and leaves the active DRAM size in the
//! second scratchpad register of the global control block. Boot media is
//! taken from the power-on strap register; the eSPI controller gets its
//! I/O-mode and frequency caps set here so host-interface bring-up later
//! finds it configured.

use crate::bootdev::BootDevice;
use crate::platform::{DramSpec, FieldWrite, Platform, StrapSpec};
use crate::regmap::{FieldDef, RegWidth, RegisterDef};
use crate::seq::InitStep;
use crate::steps;

/// Global control registers (GCR) block.
const GCR_BA: u64 = 0xf080_0000;

/// Power-on setting register. Latches the strap pins at reset; read-only
/// thereafter.
pub const PWRON: RegisterDef = RegisterDef {
    name: "gcr.pwron",
    base: GCR_BA,
    offset: 0x04,
    width: RegWidth::W32,
    fields: &[
        // Boot source straps, STRAP3-1.
        FieldDef {
            name: "bootsel",
            shift: 0,
            width: 3,
        },
        // STRAP5: BSP alternate pins.
        FieldDef {
            name: "bspa",
            shift: 4,
            width: 1,
        },
        // STRAP8: security enabled.
        FieldDef {
            name: "secen",
            shift: 7,
            width: 1,
        },
    ],
};

/// Scratchpad B. The bootblock reports the active DRAM size here, in bytes.
pub const SCRPAD_B: RegisterDef = RegisterDef {
    name: "gcr.scrpad_b",
    base: GCR_BA,
    offset: 0x268,
    width: RegWidth::W32,
    fields: &[FieldDef {
        name: "value",
        shift: 0,
        width: 32,
    }],
};

/// eSPI controller block.
const ESPI_BA: u64 = 0xf009_f000;

/// eSPI configuration register.
pub const ESPICFG: RegisterDef = RegisterDef {
    name: "espi.espicfg",
    base: ESPI_BA,
    offset: 0x04,
    width: RegWidth::W32,
    fields: &[
        // Supported I/O modes.
        FieldDef {
            name: "iomode",
            shift: 8,
            width: 2,
        },
        // Maximum supported frequency.
        FieldDef {
            name: "maxfreq",
            shift: 10,
            width: 3,
        },
        // Supported channels.
        FieldDef {
            name: "chnsupp",
            shift: 24,
            width: 4,
        },
    ],
};

/// Single/dual/quad I/O.
const ESPI_IO_MODE_SINGLE_DUAL_QUAD: u64 = 3;
/// 33 MHz cap.
const ESPI_MAX_33_MHZ: u64 = 2;

static CONFIG_WRITES: [FieldWrite; 2] = [
    FieldWrite {
        register: ESPICFG,
        field: "iomode",
        value: ESPI_IO_MODE_SINGLE_DUAL_QUAD,
    },
    FieldWrite {
        register: ESPICFG,
        field: "maxfreq",
        value: ESPI_MAX_33_MHZ,
    },
];

static STEPS: [InitStep; 4] = [
    // eSPI caps are host-interface niceties; a BMC that cannot set them
    // still has to boot.
    InitStep {
        name: "espi-config",
        required: false,
        run: steps::apply_config_writes,
    },
    InitStep {
        name: "resolve-boot-device",
        required: true,
        run: steps::resolve_boot_device,
    },
    InitStep {
        name: "size-dram",
        required: true,
        run: steps::size_dram,
    },
    InitStep {
        name: "assign-boot-params",
        required: true,
        run: steps::assign_boot_params,
    },
];

pub static PLATFORM: Platform = Platform {
    name: "npcm845",
    board_arch_id: 4906,
    sdram_base: 0x0,
    boot_params_offset: 0x100,
    strap: StrapSpec {
        register: PWRON,
        field: "bootsel",
    },
    boot_codes: &[
        (0x0, BootDevice::SpiFlash),
        (0x2, BootDevice::Emmc),
        (0x4, BootDevice::Sd),
        (0x6, BootDevice::Usb),
    ],
    dram: DramSpec::Scratch {
        register: SCRPAD_B,
        field: "value",
        unit_bytes: 1,
    },
    regulator: None,
    indicator: None,
    config_writes: &CONFIG_WRITES,
    steps: &STEPS,
};
