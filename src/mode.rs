//! The peripheral's mode register: off / bypass / operating.

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};

/// Filtering mode of the CAN acceptance filter.
///
/// `Off` is typically used during initialization: it allows read/write
/// access to all registers and to the LUT RAM, but no messages are
/// accepted. `Bypass` accepts all messages regardless of the LUT content
/// (used while the table is being edited, and as the documented contract
/// of [`crate::engine::FilterTable::reset_filter`]). `Operating` filters
/// messages against the LUT.
#[derive(FromPrimitive, ToPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Operating = 0b00,
    Bypass = 0b01,
    Off = 0b10,
}

impl From<u32> for FilterMode {
    fn from(value: u32) -> Self {
        // The register only ever holds one of the three encoded values;
        // anything else indicates the register was never written by this
        // crate.
        FromPrimitive::from_u32(value).expect("mode register holds an undefined encoding")
    }
}

impl From<FilterMode> for u32 {
    fn from(value: FilterMode) -> Self {
        // SAFETY: `FilterMode` is a 2-bit enum and always fits in a `u32`.
        unsafe { ToPrimitive::to_u32(&value).unwrap_unchecked() }
    }
}
