//! Database ID type definition.

/// Alias for the integer type used for sale row IDs.
pub type SaleId = i64;
