// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SiFive FU740 (HiFive Unmatched).
//!
//! The boot medium comes from the MSEL mode-select pins, readable at a fixed
//! address low in the memory map. Memory is soldered down -- 16 GiB, no
//! discovery needed.

use crate::bootdev::BootDevice;
use crate::platform::{DramSpec, Platform, StrapSpec};
use crate::regmap::{FieldDef, RegWidth, RegisterDef};
use crate::seq::InitStep;
use crate::steps;

/// Mode-select pin sample register.
pub const MODE_SELECT: RegisterDef = RegisterDef {
    name: "mode_select",
    base: 0x0,
    offset: 0x1000,
    width: RegWidth::W32,
    fields: &[FieldDef {
        name: "msel",
        shift: 0,
        width: 4,
    }],
};

static STEPS: [InitStep; 3] = [
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
    name: "fu740",
    board_arch_id: 0,
    sdram_base: 0x8000_0000,
    boot_params_offset: 0x100,
    strap: StrapSpec {
        register: MODE_SELECT,
        field: "msel",
    },
    boot_codes: &[
        (0x6, BootDevice::SpiFlash),
        (0xb, BootDevice::Sd),
    ],
    dram: DramSpec::Fixed {
        bytes: 16 << 30,
    },
    regulator: None,
    indicator: None,
    config_writes: &[],
    steps: &STEPS,
};
