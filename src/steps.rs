// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generic step actions shared by every platform descriptor.
//!
//! Each action reads its parameters out of the [`Platform`] record it runs
//! against, so one implementation serves every board. A platform customizes
//! behavior purely by what it puts in its descriptor and which of these it
//! lists in its step table -- not by supplying its own code.
//!
//! [`Platform`]: crate::platform::Platform

use crate::bootdev::{self, BootDevice};
use crate::platform::DramSpec;
use crate::regmap::{read_field, write_field};
use crate::seq::{StepContext, StepError};

/// Applies the descriptor's static configuration writes, in order.
///
/// This covers the "set a handful of mode fields at boot" pattern: I/O modes,
/// bus frequency caps, pin mux selects. Boards list it early so later steps
/// see configured peripherals.
pub fn apply_config_writes(cx: &mut StepContext<'_>) -> Result<(), StepError> {
    for w in cx.platform.config_writes {
        write_field(cx.bus, &w.register, w.field, w.value)?;
    }
    Ok(())
}

/// Reads the boot strap field, classifies it, and records the boot device
/// and environment-storage slot in the context.
///
/// An unrecognized strap code is not an error -- the device comes out as
/// `Unknown` and environment selection falls back to slot 0.
pub fn resolve_boot_device(cx: &mut StepContext<'_>) -> Result<(), StepError> {
    let strap = &cx.platform.strap;
    let raw = read_field(cx.bus, &strap.register, strap.field)? as u32;
    let device = bootdev::classify(cx.platform.boot_codes, raw);
    if device == BootDevice::Unknown {
        log::warn!("unrecognized boot strap code {raw:#x}");
    }

    cx.ctx.boot_device = device;
    cx.ctx.env_storage_index = bootdev::env_storage_index(device);
    log::info!(
        "boot device {:?} (strap {:#x}), env slot {}",
        device,
        raw,
        cx.ctx.env_storage_index
    );
    Ok(())
}

/// Establishes the DRAM size, either from the scratch register the previous
/// boot stage filled in, or from the descriptor's fixed size on boards whose
/// memory is soldered down and never varies.
pub fn size_dram(cx: &mut StepContext<'_>) -> Result<(), StepError> {
    let bytes = match &cx.platform.dram {
        DramSpec::Scratch {
            register,
            field,
            unit_bytes,
        } => {
            let raw = read_field(cx.bus, register, *field)?;
            if raw == 0 {
                // A zero here means the earlier stage never ran its memory
                // setup; nothing downstream can work without DRAM.
                return Err(StepError::NoDramConfigured);
            }
            raw * *unit_bytes
        }
        DramSpec::Fixed { bytes } => *bytes,
    };

    cx.ctx.ram_size_bytes = bytes;
    log::info!("DRAM {} bytes", bytes);
    Ok(())
}

/// Records the board's machine id and the address where boot parameters for
/// the next stage are assembled, conventionally a small offset above the
/// DRAM base.
pub fn assign_boot_params(cx: &mut StepContext<'_>) -> Result<(), StepError> {
    let p = cx.platform;
    cx.ctx.board_arch_id = p.board_arch_id;
    cx.ctx.boot_params_address = p.sdram_base + p.boot_params_offset;
    Ok(())
}

/// Enables the descriptor's boot-critical rail, then polls its status field
/// until it reports up or the settle budget is exhausted.
///
/// The budget is descriptor data: there is no time source at this layer, so
/// "wait" means a bounded number of status reads. A rail with no status
/// field is fire-and-forget.
pub fn enable_regulator(cx: &mut StepContext<'_>) -> Result<(), StepError> {
    let Some(rail) = &cx.platform.regulator else {
        return Err(StepError::NotSupported { what: "regulator" });
    };

    write_field(cx.bus, &rail.register, rail.enable_field, 1)?;

    if let Some(status) = rail.status_field {
        for _ in 0..rail.settle_polls {
            if read_field(cx.bus, &rail.register, status)? != 0 {
                return Ok(());
            }
        }
        return Err(StepError::RegulatorTimeout {
            name: rail.name,
            polls: rail.settle_polls,
        });
    }
    Ok(())
}

/// Shows which environment slot was chosen on the board's indicator output.
/// Eval-board convenience; boards without the output simply omit the
/// indicator from their descriptor and this step from their list.
pub fn indicate_boot_choice(cx: &mut StepContext<'_>) -> Result<(), StepError> {
    let Some(ind) = &cx.platform.indicator else {
        return Err(StepError::NotSupported {
            what: "boot choice indicator",
        });
    };
    write_field(cx.bus, &ind.register, ind.field, cx.ctx.env_storage_index as u64)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{self, Platform, RegulatorSpec};
    use crate::regmap::{FieldDef, RegWidth, RegisterDef};
    use crate::testutil::MemBus;
    use crate::BootContext;

    const PMIC: RegisterDef = RegisterDef {
        name: "pmic_ctrl",
        base: 0x4000_0000,
        offset: 0x8,
        width: RegWidth::W32,
        fields: &[
            FieldDef {
                name: "enable",
                shift: 0,
                width: 1,
            },
            FieldDef {
                name: "good",
                shift: 1,
                width: 1,
            },
        ],
    };

    // A platform stub whose regulator never settles; everything else is
    // borrowed from the first real descriptor.
    fn stuck_rail_platform() -> Platform {
        Platform {
            regulator: Some(RegulatorSpec {
                name: "stuck",
                register: PMIC,
                enable_field: "enable",
                status_field: Some("good"),
                settle_polls: 4,
            }),
            ..*platform::all()[0]
        }
    }

    #[test]
    fn regulator_timeout_exhausts_its_poll_budget() {
        let platform = Box::leak(Box::new(stuck_rail_platform()));
        let mut bus = MemBus::new();
        let mut ctx = BootContext::new();
        let mut cx = StepContext {
            platform,
            bus: &mut bus,
            ctx: &mut ctx,
        };

        assert_eq!(
            enable_regulator(&mut cx),
            Err(StepError::RegulatorTimeout {
                name: "stuck",
                polls: 4,
            })
        );
        // One RMW pair for the enable, then one status read per poll.
        assert_eq!(bus.writes, 1);
        assert_eq!(bus.reads, 1 + 4);
    }

    #[test]
    fn regulator_enable_returns_once_status_sets() {
        let platform = Box::leak(Box::new(stuck_rail_platform()));
        let mut bus = MemBus::new();
        // Status already up: the write of the enable bit preserves it.
        bus.store(PMIC.address(), 0b10);
        let mut ctx = BootContext::new();
        let mut cx = StepContext {
            platform,
            bus: &mut bus,
            ctx: &mut ctx,
        };

        enable_regulator(&mut cx).unwrap();
        assert_eq!(bus.load(PMIC.address()), 0b11);
    }

    #[test]
    fn missing_descriptor_entries_are_not_supported() {
        let mut none_platform = stuck_rail_platform();
        none_platform.regulator = None;
        none_platform.indicator = None;
        let platform = Box::leak(Box::new(none_platform));

        let mut bus = MemBus::new();
        let mut ctx = BootContext::new();
        let mut cx = StepContext {
            platform,
            bus: &mut bus,
            ctx: &mut ctx,
        };

        assert!(matches!(
            enable_regulator(&mut cx),
            Err(StepError::NotSupported { .. })
        ));
        assert!(matches!(
            indicate_boot_choice(&mut cx),
            Err(StepError::NotSupported { .. })
        ));
    }
}
