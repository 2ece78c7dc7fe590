//! Excel (.xlsx) spreadsheet support.
//!
//! Only the comments part is implemented here; the ZIP container and the
//! workbook object graph are handled by the caller.

pub mod comments;

pub use comments::{CommentEntry, CommentPart, PublicComment};
