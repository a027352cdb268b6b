//! Shared types and models for the Kitchen Stock back office
//!
//! Holds the domain records, the derived-value arithmetic (yield, costing,
//! stock status, reorder dates) and the pure parts of the purchasing and
//! receiving workflows so they can be exercised without a database.

#[macro_use]
mod macros;

pub mod error;
pub mod models;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
