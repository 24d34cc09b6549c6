//! Database rows and their queries
//!
//! Rows mirror the tables; conversion into the core domain types happens here
//! so the store never hands unparsed strings to the optimizer.

pub mod architecture;
pub mod threat;
pub mod implementation;

pub use architecture::*;
pub use threat::*;
pub use implementation::*;

use std::str::FromStr;

use secopt_core::models::UnknownVariant;
use secopt_core::StoreError;

/// Parse a text column holding an enum value
pub(crate) fn parse_column<T>(value: &str) -> Result<T, StoreError>
where
    T: FromStr<Err = UnknownVariant>,
{
    value.parse().map_err(|e: UnknownVariant| StoreError::Backend(e.to_string()))
}
