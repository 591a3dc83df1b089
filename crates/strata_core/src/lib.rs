//! Foundational types shared by every Strata crate.
//!
//! - [`errors`]: the engine-wide [`StrataError`] and [`Result`] alias
//! - [`interner`]: global string interning used by shader define sets

pub mod errors;
pub mod interner;

pub use errors::{Result, StrataError};
pub use interner::Symbol;
