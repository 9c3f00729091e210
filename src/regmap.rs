// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named-bitfield access to memory-mapped configuration registers.
//!
//! Platform code traditionally does this with a struct overlaid onto a fixed
//! address and a pile of `SHIFT`/`MASK` constants. Here the layout is data:
//! a [`RegisterDef`] names the register, its address, its width, and its
//! fields, and [`read_field`]/[`write_field`] do the masking and shifting with
//! bounds checks. The physical access itself goes through the [`RegisterBus`]
//! trait so that the same descriptors drive real hardware (via [`Mmio`]) and
//! host tests (via a RAM-backed fake).
//!
//! There is no locking anywhere in this module. Board init runs on one core
//! with nothing else started yet, and the ordering of register writes is
//! load-bearing; callers that somehow have concurrency must serialize access
//! themselves.

use thiserror::Error;

/// Width of a memory-mapped register.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RegWidth {
    W32,
    W64,
}

impl RegWidth {
    pub const fn bits(self) -> u8 {
        match self {
            RegWidth::W32 => 32,
            RegWidth::W64 => 64,
        }
    }

    /// Mask covering every bit the register actually has.
    pub const fn mask(self) -> u64 {
        match self {
            RegWidth::W32 => u32::MAX as u64,
            RegWidth::W64 => u64::MAX,
        }
    }
}

/// One named bit-aligned subrange of a register.
#[derive(Copy, Clone, Debug)]
pub struct FieldDef {
    pub name: &'static str,
    /// Position of the field's least significant bit.
    pub shift: u8,
    /// Width in bits. Must satisfy `shift + width <= register width`.
    pub width: u8,
}

impl FieldDef {
    /// Largest value the field can hold.
    pub const fn max_value(&self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }

    const fn mask(&self) -> u64 {
        self.max_value() << self.shift
    }
}

/// A configuration register: an address plus its named fields.
///
/// These are built as `static` per-platform tables; nothing in here is
/// discovered at runtime. The `base`/`offset` split mirrors how the hardware
/// manuals describe register blocks, which keeps the tables easy to audit
/// against the documentation.
#[derive(Copy, Clone, Debug)]
pub struct RegisterDef {
    pub name: &'static str,
    /// Base address of the containing register block.
    pub base: u64,
    /// Byte offset of this register within the block.
    pub offset: u64,
    pub width: RegWidth,
    pub fields: &'static [FieldDef],
}

impl RegisterDef {
    pub const fn address(&self) -> u64 {
        self.base + self.offset
    }

    /// Checks the descriptor invariants: every field is non-empty, fits
    /// within the register, and no two fields share a name.
    ///
    /// Descriptor tables are static data, so a failure here is a programming
    /// error in a platform module; the per-platform tests call this for every
    /// register they define.
    pub fn check(&self) -> bool {
        for (i, f) in self.fields.iter().enumerate() {
            if f.width == 0 || f.shift as u32 + f.width as u32 > self.width.bits() as u32 {
                return false;
            }
            if self.fields[..i].iter().any(|g| g.name == f.name) {
                return false;
            }
        }
        true
    }

    fn field(&self, name: &'static str) -> Result<&FieldDef, FieldError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or(FieldError::UnknownField {
                register: self.name,
                field: name,
            })
    }
}

/// Errors surfaced by the field accessors. These always propagate to the
/// caller; nothing in this module clamps or silently drops a value.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum FieldError {
    /// The requested field is not defined for this register. This is a
    /// programmer error -- field names come from the same static tables as the
    /// registers themselves.
    #[error("register {register} has no field named {field}")]
    UnknownField {
        register: &'static str,
        field: &'static str,
    },
    /// The value to be written does not fit in the field.
    #[error("value {value:#x} does not fit in {width}-bit field {field}")]
    ValueOutOfRange {
        field: &'static str,
        value: u64,
        width: u8,
    },
}

/// The physical access primitive. The resolver never owns a register read or
/// write; it only describes which bits mean what.
///
/// Implementations return/accept the full register value; `W32` accesses use
/// only the low 32 bits.
pub trait RegisterBus {
    fn read(&mut self, addr: u64, width: RegWidth) -> u64;
    fn write(&mut self, addr: u64, width: RegWidth, value: u64);
}

/// [`RegisterBus`] implementation that performs volatile accesses against the
/// physical address map. This is the implementation real firmware uses.
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Creates the MMIO bus.
    ///
    /// Safety: by constructing this, the caller asserts that every address
    /// reachable through the platform's register tables is a device register
    /// that may be read and written at its declared width, and that nothing
    /// else is concurrently accessing those registers.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for Mmio {
    fn read(&mut self, addr: u64, width: RegWidth) -> u64 {
        // Safety: valid device addresses are guaranteed by the constructor's
        // contract; the descriptor tables are the authority on widths.
        match width {
            RegWidth::W32 => unsafe {
                core::ptr::read_volatile(addr as usize as *const u32) as u64
            },
            RegWidth::W64 => unsafe { core::ptr::read_volatile(addr as usize as *const u64) },
        }
    }

    fn write(&mut self, addr: u64, width: RegWidth, value: u64) {
        match width {
            RegWidth::W32 => unsafe {
                core::ptr::write_volatile(addr as usize as *mut u32, value as u32)
            },
            RegWidth::W64 => unsafe { core::ptr::write_volatile(addr as usize as *mut u64, value) },
        }
    }
}

/// Reads the named field: one register read, then mask and shift.
pub fn read_field(
    bus: &mut dyn RegisterBus,
    reg: &RegisterDef,
    name: &'static str,
) -> Result<u64, FieldError> {
    let f = reg.field(name)?;
    let raw = bus.read(reg.address(), reg.width);
    Ok((raw >> f.shift) & f.max_value())
}

/// Writes the named field: read-modify-write, preserving every other bit of
/// the register.
///
/// The read and write both happen exactly once per call, even when the new
/// value equals the old one -- some registers latch side effects on write, so
/// eliding the access would change hardware behavior. On error the register
/// is not touched at all.
pub fn write_field(
    bus: &mut dyn RegisterBus,
    reg: &RegisterDef,
    name: &'static str,
    value: u64,
) -> Result<(), FieldError> {
    let f = reg.field(name)?;
    if value > f.max_value() {
        return Err(FieldError::ValueOutOfRange {
            field: name,
            value,
            width: f.width,
        });
    }

    let raw = bus.read(reg.address(), reg.width);
    let merged = (raw & !f.mask()) | (value << f.shift);
    bus.write(reg.address(), reg.width, merged & reg.width.mask());
    log::debug!("{}.{} <= {:#x}", reg.name, name, value);
    Ok(())
}
