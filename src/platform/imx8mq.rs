// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! i.MX8MQ phone/SBC configuration (Librem 5 class).
//!
//! The ROM records the medium it booted from in the system reset controller's
//! boot mode register. The USB hub rail must be up before anything probes
//! what hangs off it, and it takes a moment to settle, so its step polls the
//! power-good bit with a bounded budget. SPL leaves the DRAM size (in MiB)
//! in a general-purpose scratch register for us.

use crate::bootdev::BootDevice;
use crate::platform::{
    DramSpec, IndicatorSpec, Platform, RegulatorSpec, StrapSpec,
};
use crate::regmap::{FieldDef, RegWidth, RegisterDef};
use crate::seq::InitStep;
use crate::steps;

/// System reset controller block.
const SRC_BA: u64 = 0x3039_0000;

/// Boot mode status register. The ROM copies the sampled boot configuration
/// here; `bmod` is the boot-device code.
pub const SRC_SBMR2: RegisterDef = RegisterDef {
    name: "src.sbmr2",
    base: SRC_BA,
    offset: 0x70,
    width: RegWidth::W32,
    fields: &[
        FieldDef {
            name: "bmod",
            shift: 24,
            width: 4,
        },
        // Boot fuse selection.
        FieldDef {
            name: "bt_fuse_sel",
            shift: 4,
            width: 1,
        },
    ],
};

/// General-purpose scratch register 9; SPL reports the DRAM size here in MiB.
pub const SRC_GPR9: RegisterDef = RegisterDef {
    name: "src.gpr9",
    base: SRC_BA,
    offset: 0x94,
    width: RegWidth::W32,
    fields: &[FieldDef {
        name: "value",
        shift: 0,
        width: 32,
    }],
};

/// USB hub rail control in the power gating controller.
pub const HUB_PWR: RegisterDef = RegisterDef {
    name: "gpc.hub_pwr",
    base: 0x303a_0000,
    offset: 0x6c,
    width: RegWidth::W32,
    fields: &[
        FieldDef {
            name: "enable",
            shift: 0,
            width: 1,
        },
        FieldDef {
            name: "pwrgood",
            shift: 31,
            width: 1,
        },
    ],
};

/// Status LED on GPIO1, data register bit 13.
pub const GPIO1_DR: RegisterDef = RegisterDef {
    name: "gpio1.dr",
    base: 0x3020_0000,
    offset: 0x0,
    width: RegWidth::W32,
    fields: &[FieldDef {
        name: "led",
        shift: 13,
        width: 1,
    }],
};

static STEPS: [InitStep; 5] = [
    // The hub rail powers the devices probed right after us, so it goes
    // first -- but the phone boots fine on battery with the hub down, so a
    // failure here is a warning, not an abort.
    InitStep {
        name: "enable-hub-rail",
        required: false,
        run: steps::enable_regulator,
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
    InitStep {
        name: "indicate-boot-choice",
        required: false,
        run: steps::indicate_boot_choice,
    },
];

pub static PLATFORM: Platform = Platform {
    name: "imx8mq",
    board_arch_id: 4821,
    sdram_base: 0x4000_0000,
    boot_params_offset: 0x100,
    strap: StrapSpec {
        register: SRC_SBMR2,
        field: "bmod",
    },
    boot_codes: &[
        (0x1, BootDevice::Sd),
        (0x2, BootDevice::Emmc),
        (0x4, BootDevice::Nand),
        (0x6, BootDevice::SpiFlash),
        (0xe, BootDevice::Usb),
    ],
    dram: DramSpec::Scratch {
        register: SRC_GPR9,
        field: "value",
        unit_bytes: 1 << 20,
    },
    regulator: Some(RegulatorSpec {
        name: "hub",
        register: HUB_PWR,
        enable_field: "enable",
        status_field: Some("pwrgood"),
        settle_polls: 100,
    }),
    indicator: Some(IndicatorSpec {
        register: GPIO1_DR,
        field: "led",
    }),
    config_writes: &[],
    steps: &STEPS,
};
