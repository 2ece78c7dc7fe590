//! Cell comments (legacy notes) for XLSX worksheets.
//!
//! Each worksheet with comments owns one comments part (`xl/commentsN.xml`)
//! holding an author list and a comment list. This module maps that part to a
//! lossless in-memory model and back, and projects it to a flattened
//! [`PublicComment`] view for calling code.
//!
//! # Example
//!
//! ```rust
//! use litchi_comments::ooxml::xlsx::comments::{CommentPart, to_public_view};
//!
//! let xml = br#"<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
//!   <authors><author>Alice</author></authors>
//!   <commentList>
//!     <comment ref="B2" authorId="0"><text><t>Check totals</t></text></comment>
//!   </commentList>
//! </comments>"#;
//!
//! let part = CommentPart::from_xml("xl/comments1.xml", xml)?;
//! let view = to_public_view(&part)?;
//! assert_eq!(view[0].author, "Alice");
//! assert_eq!(view[0].text, "Check totals");
//! # Ok::<(), litchi_comments::OoxmlError>(())
//! ```

pub mod batch;
pub mod config;
pub mod preserve;
pub mod reader;
pub mod rich_text;
pub mod view;
pub mod writer;

pub use batch::{
    comments_part_name, extract_comment_parts, is_comments_part, parse_parts, project_parts,
};
pub use config::{BatchOptions, ErrorPolicy, ProjectionOptions};
pub use preserve::{ContainerExtras, ExtraAttribute, RawXml};
pub use rich_text::{
    FormattedRun, PhoneticProperties, PhoneticRun, RichText, RunProperties, TextContent,
};
pub use view::{
    Projection, PublicComment, from_public_view, reproject, to_public_view, to_public_view_with,
};

use std::collections::BTreeMap;

/// SpreadsheetML main namespace.
pub const SPREADSHEETML_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Content type of a comments part.
pub const COMMENTS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml";

/// Relationship type linking a worksheet to its comments part.
pub const COMMENTS_RELATIONSHIP_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";

/// One comment XML part: the author list and the comment list of a worksheet.
///
/// Authors are addressed by position; duplicates are legal. The part does not
/// check that every entry's `author_index` is in range, see
/// [`to_public_view`] for that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentPart {
    /// Ordered author names
    pub authors: Vec<String>,
    /// Comments in document order
    pub entries: Vec<CommentEntry>,
    /// Attributes of the root element other than the default SpreadsheetML
    /// namespace, which is always written
    pub root_attributes: Vec<ExtraAttribute>,
    /// Uninterpreted children of the root element, e.g. `extLst`
    pub extra_elements: Vec<RawXml>,
    /// Attributes and unknown children of `authors`
    pub authors_extras: ContainerExtras,
    /// Attributes of individual `author` elements, keyed by author position
    pub author_attributes: BTreeMap<u32, Vec<ExtraAttribute>>,
    /// Attributes and unknown children of `commentList`
    pub comment_list_extras: ContainerExtras,
}

/// A single comment bound to a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentEntry {
    /// Cell reference such as `A1`, not validated
    pub cell_reference: String,
    /// Zero-based index into [`CommentPart::authors`]
    pub author_index: u32,
    /// Comment body
    pub rich_text: RichText,
    /// Attributes other than `ref` and `authorId` (e.g. `shapeId`, `xr:uid`)
    pub extra_attributes: Vec<ExtraAttribute>,
    /// Uninterpreted children, e.g. `commentPr`
    pub extra_elements: Vec<RawXml>,
}

impl CommentEntry {
    /// Create a comment with the given rich text.
    pub fn new(cell_reference: impl Into<String>, author_index: u32, rich_text: RichText) -> Self {
        Self {
            cell_reference: cell_reference.into(),
            author_index,
            rich_text,
            extra_attributes: Vec::new(),
            extra_elements: Vec::new(),
        }
    }

    /// Logical text of the comment body.
    pub fn text(&self) -> String {
        self.rich_text.plain_text()
    }
}

impl CommentPart {
    /// Create an empty part.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comments part. `part_name` is only used to label errors.
    pub fn from_xml(part_name: &str, bytes: &[u8]) -> crate::ooxml::error::Result<Self> {
        reader::parse_comment_part(part_name, bytes)
    }

    /// Serialize the part to XML text.
    pub fn to_xml(&self) -> crate::ooxml::error::Result<String> {
        writer::write_comment_part(self)
    }

    /// Serialize the part to UTF-8 bytes.
    pub fn to_bytes(&self) -> crate::ooxml::error::Result<Vec<u8>> {
        self.to_xml().map(String::into_bytes)
    }

    /// Author name of an entry, if its index is in range.
    pub fn author_of(&self, entry: &CommentEntry) -> Option<&str> {
        self.authors
            .get(entry.author_index as usize)
            .map(String::as_str)
    }

    /// All entries attached to the given cell, in document order.
    pub fn comments_for<'a>(
        &'a self,
        cell_reference: &'a str,
    ) -> impl Iterator<Item = &'a CommentEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.cell_reference == cell_reference)
    }

    /// Number of comments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the part holds no comments. Authors may still be present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CommentPart {
        CommentPart {
            authors: vec!["Alice".into(), "Bob".into()],
            entries: vec![
                CommentEntry::new("A1", 1, RichText::plain("first")),
                CommentEntry::new("B2", 0, RichText::default()),
                CommentEntry::new("A1", 7, RichText::plain("second")),
            ],
            ..CommentPart::default()
        }
    }

    #[test]
    fn test_author_of() {
        let part = sample();
        assert_eq!(part.author_of(&part.entries[0]), Some("Bob"));
        assert_eq!(part.author_of(&part.entries[1]), Some("Alice"));
        assert_eq!(part.author_of(&part.entries[2]), None);
    }

    #[test]
    fn test_comments_for_cell() {
        let part = sample();
        let texts: Vec<String> = part.comments_for("A1").map(CommentEntry::text).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(part.comments_for("Z9").count(), 0);
    }

    #[test]
    fn test_authors_without_comments() {
        let part = CommentPart {
            authors: vec!["Alice".into()],
            ..CommentPart::default()
        };
        assert!(part.is_empty());
        assert_eq!(part.len(), 0);
        assert_eq!(part.authors.len(), 1);
    }
}
