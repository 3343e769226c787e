//! Volatile access to the LUT RAM and the six control words the
//! peripheral exposes: the mode register (`AFMR`) and the five
//! section-address registers (`SFF_sa`, `SFF_GRP_sa`, `EFF_sa`,
//! `EFF_GRP_sa`, `ENDofTable`).
//!
//! This module has no other responsibility: no caching, no reordering
//! across mutation steps, no interpretation of the values it moves.

use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::{register_bitfields, register_structs};
use tock_registers::registers::ReadWrite;

use crate::mode::FilterMode;
use crate::LUT_WORDS;

register_bitfields! {
    u32,
    /// The acceptance filter mode register.
    AFMR [
        MODE OFFSET(0) NUMBITS(2)
    ]
}

register_structs! {
    #[allow(non_snake_case)]
    pub RegisterBlock {
        (0x00 => AFMR: ReadWrite<u32, AFMR::Register>),
        (0x04 => SFF_sa: ReadWrite<u32>),
        (0x08 => SFF_GRP_sa: ReadWrite<u32>),
        (0x0C => EFF_sa: ReadWrite<u32>),
        (0x10 => EFF_GRP_sa: ReadWrite<u32>),
        (0x14 => ENDofTable: ReadWrite<u32>),
        (0x18 => @END),
    }
}

/// Memory-mapped IO wrapper, deref'd to the register block it covers.
///
/// Mirrors the board-support `Mmio<T>` wrapper used for every other
/// peripheral in this codebase: a bare pointer with volatile-semantics
/// access through `tock_registers`' own `Readable`/`Writeable` traits, and
/// no caching of any kind.
pub struct Mmio<T> {
    start_addr: *mut T,
}

impl<T> Mmio<T> {
    /// Creates an MMIO wrapper at the given location.
    ///
    /// # Safety
    /// `start_addr` must be correctly aligned and sized for `T`, must
    /// point at memory that is valid for the lifetime of this wrapper,
    /// and must not be concurrently accessed by anything else.
    pub const unsafe fn new(start_addr: *mut T) -> Self {
        Self { start_addr }
    }
}

impl<T> core::ops::Deref for Mmio<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: by the contract of `new`, this dereference is sound.
        unsafe { &*self.start_addr }
    }
}

/// Abstraction over the LUT RAM and the control words, so the mutation
/// engine can run against either the real peripheral or an in-memory
/// double.
///
/// All accesses are expected to behave as volatile reads/writes: no
/// caching, no reordering of one access past another.
pub trait CanAfHal {
    /// Read-only view of the 512-word LUT RAM.
    fn lut(&self) -> &[u32; LUT_WORDS];

    /// Mutable view of the 512-word LUT RAM.
    fn lut_mut(&mut self) -> &mut [u32; LUT_WORDS];

    /// Current value of the mode register.
    fn mode(&self) -> FilterMode;

    /// Writes the mode register.
    fn set_mode(&mut self, mode: FilterMode);

    fn sff_sa(&self) -> u32;
    fn set_sff_sa(&mut self, value: u32);

    fn sff_grp_sa(&self) -> u32;
    fn set_sff_grp_sa(&mut self, value: u32);

    fn eff_sa(&self) -> u32;
    fn set_eff_sa(&mut self, value: u32);

    fn eff_grp_sa(&self) -> u32;
    fn set_eff_grp_sa(&mut self, value: u32);

    fn end_of_table(&self) -> u32;
    fn set_end_of_table(&mut self, value: u32);
}

/// The real MMIO-backed HAL: a register block for the six control words
/// plus a raw pointer to the LUT RAM region.
///
/// The LUT is exposed as a plain pointer rather than through [`Mmio`]
/// because the mutation engine needs mutable slice access to it (unlike
/// the control words, which are only ever touched one field at a time
/// through `tock_registers`' own volatile accessors).
pub struct MmioCanAfHal {
    registers: Mmio<RegisterBlock>,
    lut: *mut [u32; LUT_WORDS],
}

impl MmioCanAfHal {
    /// Creates a HAL bound to the given register block and LUT RAM
    /// addresses.
    ///
    /// # Safety
    /// Both addresses must be correct for the target part, point at
    /// memory valid for the lifetime of this value, and must not be used
    /// by anything else for as long as this `MmioCanAfHal` exists. This
    /// includes not constructing more than one `MmioCanAfHal` over the
    /// same peripheral instance.
    pub const unsafe fn new(registers: *mut RegisterBlock, lut: *mut [u32; LUT_WORDS]) -> Self {
        Self {
            // SAFETY: by assumption, the addresses are correct and exclusive.
            registers: unsafe { Mmio::new(registers) },
            lut,
        }
    }
}

impl CanAfHal for MmioCanAfHal {
    fn lut(&self) -> &[u32; LUT_WORDS] {
        // SAFETY: `self.lut` was constructed over a valid, exclusively-owned
        // region by the contract of `MmioCanAfHal::new`.
        unsafe { &*self.lut }
    }

    fn lut_mut(&mut self) -> &mut [u32; LUT_WORDS] {
        // SAFETY: `self.lut` was constructed over a valid, exclusively-owned
        // region by the contract of `MmioCanAfHal::new`.
        unsafe { &mut *self.lut }
    }

    fn mode(&self) -> FilterMode {
        FilterMode::from(self.registers.AFMR.read(AFMR::MODE))
    }

    fn set_mode(&mut self, mode: FilterMode) {
        self.registers.AFMR.write(AFMR::MODE.val(mode.into()));
    }

    fn sff_sa(&self) -> u32 {
        self.registers.SFF_sa.get()
    }

    fn set_sff_sa(&mut self, value: u32) {
        self.registers.SFF_sa.set(value);
    }

    fn sff_grp_sa(&self) -> u32 {
        self.registers.SFF_GRP_sa.get()
    }

    fn set_sff_grp_sa(&mut self, value: u32) {
        self.registers.SFF_GRP_sa.set(value);
    }

    fn eff_sa(&self) -> u32 {
        self.registers.EFF_sa.get()
    }

    fn set_eff_sa(&mut self, value: u32) {
        self.registers.EFF_sa.set(value);
    }

    fn eff_grp_sa(&self) -> u32 {
        self.registers.EFF_GRP_sa.get()
    }

    fn set_eff_grp_sa(&mut self, value: u32) {
        self.registers.EFF_GRP_sa.set(value);
    }

    fn end_of_table(&self) -> u32 {
        self.registers.ENDofTable.get()
    }

    fn set_end_of_table(&mut self, value: u32) {
        self.registers.ENDofTable.set(value);
    }
}

/// In-memory double for the HAL, used by unit/property tests and by
/// downstream crates that want to exercise the mutation engine without
/// hardware. Enabled unconditionally under `#[cfg(test)]`, and exposed
/// publicly behind the `fake-hal` feature.
#[cfg(any(test, feature = "fake-hal"))]
#[derive(Debug, Clone)]
pub struct FakeHal {
    lut: [u32; LUT_WORDS],
    mode: FilterMode,
    sff_sa: u32,
    sff_grp_sa: u32,
    eff_sa: u32,
    eff_grp_sa: u32,
    end_of_table: u32,
}

#[cfg(any(test, feature = "fake-hal"))]
impl FakeHal {
    /// Creates a fresh double with a zeroed LUT and all registers at
    /// their reset value (mode `Operating`, all addresses zero).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lut: [0; LUT_WORDS],
            mode: FilterMode::Operating,
            sff_sa: 0,
            sff_grp_sa: 0,
            eff_sa: 0,
            eff_grp_sa: 0,
            end_of_table: 0,
        }
    }
}

#[cfg(any(test, feature = "fake-hal"))]
impl Default for FakeHal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "fake-hal"))]
impl CanAfHal for FakeHal {
    fn lut(&self) -> &[u32; LUT_WORDS] {
        &self.lut
    }

    fn lut_mut(&mut self) -> &mut [u32; LUT_WORDS] {
        &mut self.lut
    }

    fn mode(&self) -> FilterMode {
        self.mode
    }

    fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
    }

    fn sff_sa(&self) -> u32 {
        self.sff_sa
    }

    fn set_sff_sa(&mut self, value: u32) {
        self.sff_sa = value;
    }

    fn sff_grp_sa(&self) -> u32 {
        self.sff_grp_sa
    }

    fn set_sff_grp_sa(&mut self, value: u32) {
        self.sff_grp_sa = value;
    }

    fn eff_sa(&self) -> u32 {
        self.eff_sa
    }

    fn set_eff_sa(&mut self, value: u32) {
        self.eff_sa = value;
    }

    fn eff_grp_sa(&self) -> u32 {
        self.eff_grp_sa
    }

    fn set_eff_grp_sa(&mut self, value: u32) {
        self.eff_grp_sa = value;
    }

    fn end_of_table(&self) -> u32 {
        self.end_of_table
    }

    fn set_end_of_table(&mut self, value: u32) {
        self.end_of_table = value;
    }
}
