//! Litchi Comments - lossless cell comment parts for SpreadsheetML
//!
//! This library models the comments part of an `.xlsx` package (the
//! `xl/commentsN.xml` part that stores the notes of one worksheet), parses it
//! from raw bytes and writes it back without losing markup it does not
//! interpret.
//!
//! # Features
//!
//! - **Schema model**: authors, comments, rich text runs and phonetic hints
//! - **Lossless round trip**: unknown attributes and elements are preserved
//! - **Public view**: flattened author/reference/text records for callers
//! - **Batch processing**: many parts at once, in parallel with rayon
//!
//! # Example - Reading and editing comments
//!
//! ```
//! use litchi_comments::ooxml::xlsx::comments::{CommentPart, reproject, to_public_view};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let xml = br#"<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
//!   <authors><author>Alice</author></authors>
//!   <commentList>
//!     <comment ref="A1" authorId="0"><text><r><rPr><b/></rPr><t>Alice:</t></r><r><t xml:space="preserve"> check</t></r></text></comment>
//!   </commentList>
//! </comments>"#;
//!
//! let part = CommentPart::from_xml("xl/comments1.xml", xml)?;
//! let mut view = to_public_view(&part)?;
//! assert_eq!(view[0].text, "Alice: check");
//!
//! view[0].author = "Bob".to_string();
//! let updated = reproject(&part, &view);
//! assert_eq!(updated.authors, vec!["Alice", "Bob"]);
//!
//! let bytes = updated.to_bytes()?;
//! assert_eq!(CommentPart::from_xml("xl/comments1.xml", &bytes)?, updated);
//! # Ok(())
//! # }
//! ```

/// Common utilities shared across formats
pub mod common;

/// OOXML (Office Open XML) format support
///
/// Currently covers the SpreadsheetML comments part.
pub mod ooxml;

// Re-export commonly used types for convenience
pub use ooxml::error::{OoxmlError, Result};
pub use ooxml::xlsx::comments::{CommentEntry, CommentPart, PublicComment};
