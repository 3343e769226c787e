//! The mutation engine's error taxonomy and its mapping to the documented
//! `i32` return codes.

use derive_more::Display;

/// Failure reasons for a mutation-engine call.
///
/// Every public operation is internally `Result`-based; the documented
/// `i32` codes (`0`/`-1`/`-2`) are only produced at the public boundary,
/// via [`FilterError::code`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    /// Inserting the requested entry would push `ENDofTable / 4` above the
    /// 512-word LUT capacity (511 for a two-word extended group).
    #[display(fmt = "CAN acceptance filter LUT is full")]
    CapacityExhausted,
    /// A delete or update was attempted on a section with zero entries.
    #[display(fmt = "CAN acceptance filter table is empty")]
    TableEmpty,
    /// A delete or update found no entry matching the given key.
    #[display(fmt = "no matching CAN acceptance filter entry")]
    NotFound,
}

impl FilterError {
    /// Maps this error onto the documented return code: `-1` for capacity
    /// and empty-table failures, `-2` for not-found.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::CapacityExhausted | Self::TableEmpty => -1,
            Self::NotFound => -2,
        }
    }
}

impl From<FilterError> for i32 {
    fn from(value: FilterError) -> Self {
        value.code()
    }
}

/// Shorthand for the engine's internal fallible results.
pub type FilterResult<T> = Result<T, FilterError>;
