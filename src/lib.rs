//! Mutation engine for the LPC176x-class CAN acceptance-filter Look-Up
//! Table (LUT).
//!
//! The on-chip CAN peripheral filters incoming frames by consulting a
//! single contiguous table in a dedicated RAM region, laid out as four
//! strictly-ascending sections (standard IDs, standard ID groups, extended
//! IDs, extended ID groups). This crate owns the table-mutation engine:
//! inserting, updating, and deleting entries while preserving the
//! four-section layout, the ascending-order invariant within each section,
//! the packed-pair encoding of standard IDs, and the mode-register
//! sequencing the peripheral requires around table edits.
//!
//! The CAN frame transmit/receive path, interrupt wiring, and the linker
//! placement of the LUT RAM itself are all external collaborators; this
//! crate only needs an implementor of [`hal::CanAfHal`].
#![no_std]

pub mod encoding;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod hal;
pub mod mode;
pub mod shift;

pub use encoding::Controller;
pub use engine::FilterTable;
pub use error::FilterError;
pub use hal::CanAfHal;
pub use mode::FilterMode;

/// Number of 32-bit words in the LUT RAM the peripheral exposes.
pub const LUT_WORDS: usize = 512;
