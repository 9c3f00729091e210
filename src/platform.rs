// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-platform boot-configuration descriptors.
//!
//! A platform is one [`Platform`] record: register layouts, the strap-code
//! table, the DRAM discovery rule, optional rail/indicator hookups, and the
//! ordered init-step list. The resolver core takes whichever record it is
//! handed -- nothing about a specific SoC is hardcoded anywhere else -- so a
//! new board is one new module here, not a fork of the boot logic.
//!
//! To add a platform:
//!
//! 1. Create a module within `bootcfg::platform` named after your SoC/board.
//! 2. Build its register tables from the hardware documentation and export a
//!    single `pub static PLATFORM: Platform`.
//! 3. Register it in [`all`] below.
//! 4. Add a `target-platform-*` feature to `Cargo.toml` and a branch to the
//!    `cfg_if` below so it can be the build default.

// Note that these modules are not conditionally included. We always compile
// every platform descriptor because we can currently get away with that --
// they are pure data, none are mutually exclusive -- and this helps to ensure
// that everything actually builds (and lets the tests sweep all of them).
pub mod fu740;
pub mod imx8mq;
pub mod npcm845;

use crate::bootdev::BootDevice;
use crate::regmap::RegisterDef;
use crate::seq::InitStep;

/// Where the boot-device strap code lives.
#[derive(Copy, Clone, Debug)]
pub struct StrapSpec {
    pub register: RegisterDef,
    pub field: &'static str,
}

/// How the platform learns its DRAM size.
#[derive(Copy, Clone, Debug)]
pub enum DramSpec {
    /// An earlier boot stage leaves the size in a scratch register;
    /// `unit_bytes` scales the raw value (1 for a byte count, `1 << 20` when
    /// the stage reports MiB).
    Scratch {
        register: RegisterDef,
        field: &'static str,
        unit_bytes: u64,
    },
    /// Memory is soldered down and never varies.
    Fixed { bytes: u64 },
}

/// A power rail that must be up before later steps probe what it feeds.
#[derive(Copy, Clone, Debug)]
pub struct RegulatorSpec {
    pub name: &'static str,
    pub register: RegisterDef,
    pub enable_field: &'static str,
    /// Field that reads non-zero once the rail has settled, if the hardware
    /// reports one.
    pub status_field: Option<&'static str>,
    /// Settle budget: how many status reads to attempt before giving up.
    /// There is no time source this early, so waiting is counted in polls.
    pub settle_polls: u32,
}

/// An output that can show which environment slot was chosen. Eval-board
/// convenience; production boards usually have no spare outputs for this.
#[derive(Copy, Clone, Debug)]
pub struct IndicatorSpec {
    pub register: RegisterDef,
    pub field: &'static str,
}

/// One static configuration write applied during init.
#[derive(Copy, Clone, Debug)]
pub struct FieldWrite {
    pub register: RegisterDef,
    pub field: &'static str,
    pub value: u64,
}

/// Everything the resolver needs to know about one platform.
pub struct Platform {
    pub name: &'static str,
    /// Machine id handed to the next stage.
    pub board_arch_id: u32,
    pub sdram_base: u64,
    /// Boot parameters are assembled at `sdram_base + boot_params_offset`.
    pub boot_params_offset: u64,
    pub strap: StrapSpec,
    /// Strap code -> logical device, straight from the SoC documentation.
    pub boot_codes: &'static [(u32, BootDevice)],
    pub dram: DramSpec,
    pub regulator: Option<RegulatorSpec>,
    pub indicator: Option<IndicatorSpec>,
    /// Mode/mux fields set once during init.
    pub config_writes: &'static [FieldWrite],
    /// The bring-up sequence, in execution order.
    pub steps: &'static [InitStep],
}

impl Platform {
    /// Registers named by the descriptor's specs, for invariant sweeps.
    pub fn registers(&self) -> impl Iterator<Item = &RegisterDef> {
        let dram_reg = match &self.dram {
            DramSpec::Scratch { register, .. } => Some(register),
            DramSpec::Fixed { .. } => None,
        };
        core::iter::once(&self.strap.register)
            .chain(dram_reg)
            .chain(self.regulator.as_ref().map(|r| &r.register))
            .chain(self.indicator.as_ref().map(|i| &i.register))
            .chain(self.config_writes.iter().map(|w| &w.register))
    }
}

static ALL: [&Platform; 3] = [
    &npcm845::PLATFORM,
    &imx8mq::PLATFORM,
    &fu740::PLATFORM,
];

/// Every platform this build knows about.
pub fn all() -> &'static [&'static Platform] {
    &ALL
}

/// Runtime descriptor selection, for boot flows that identify the platform
/// from an id register or a device tree rather than at build time.
pub fn by_name(name: &str) -> Option<&'static Platform> {
    ALL.iter().copied().find(|p| p.name == name)
}

// Select the build-default platform from the target-platform-* feature.
// build.rs guarantees exactly one is enabled.
cfg_if::cfg_if! {
    if #[cfg(feature = "target-platform-npcm845")] {
        /// The platform selected by the enabled `target-platform-*` feature.
        pub fn target() -> &'static Platform {
            &npcm845::PLATFORM
        }
    } else if #[cfg(feature = "target-platform-imx8mq")] {
        /// The platform selected by the enabled `target-platform-*` feature.
        pub fn target() -> &'static Platform {
            &imx8mq::PLATFORM
        }
    } else if #[cfg(feature = "target-platform-fu740")] {
        /// The platform selected by the enabled `target-platform-*` feature.
        pub fn target() -> &'static Platform {
            &fu740::PLATFORM
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_descriptor_register_satisfies_the_field_invariants() {
        for p in all() {
            for reg in p.registers() {
                assert!(reg.check(), "{}: bad field layout in {}", p.name, reg.name);
            }
        }
    }

    #[test]
    fn descriptor_hookups_name_real_fields_of_their_registers() {
        for p in all() {
            let named = [
                Some((p.strap.register, p.strap.field)),
                match p.dram {
                    DramSpec::Scratch { register, field, .. } => Some((register, field)),
                    DramSpec::Fixed { .. } => None,
                },
                p.regulator.map(|r| (r.register, r.enable_field)),
                p.regulator.and_then(|r| r.status_field.map(|s| (r.register, s))),
                p.indicator.map(|i| (i.register, i.field)),
            ];
            for (reg, field) in named.iter().flatten() {
                assert!(
                    reg.fields.iter().any(|f| f.name == *field),
                    "{}: {} names missing field {}",
                    p.name,
                    reg.name,
                    field
                );
            }
            for w in p.config_writes {
                assert!(w.register.fields.iter().any(|f| f.name == w.field));
            }
        }
    }

    #[test]
    fn names_are_unique_and_resolvable() {
        for p in all() {
            assert!(core::ptr::eq(by_name(p.name).unwrap(), *all().iter().find(|q| q.name == p.name).unwrap()));
        }
        assert!(by_name("no-such-platform").is_none());
    }

    #[test]
    fn target_platform_is_registered() {
        let t = target();
        assert!(all().iter().any(|p| core::ptr::eq(*p, t)));
    }

    #[test]
    fn every_platform_has_a_nonempty_required_sequence() {
        for p in all() {
            assert!(!p.steps.is_empty(), "{} has no init steps", p.name);
            assert!(
                p.steps.iter().any(|s| s.required),
                "{} has no required steps",
                p.name
            );
        }
    }
}
