//! Office Open XML (OOXML) format implementation.
//!
//! # Architecture
//!
//! - `error`: error taxonomy shared by all OOXML parts
//! - `xlsx`: SpreadsheetML parts (currently the comments part)

pub mod error;
pub mod xlsx;

pub use error::{OoxmlError, Result};
