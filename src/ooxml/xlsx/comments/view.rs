//! Flattened public view of a comments part.
//!
//! Calling code works with [`PublicComment`] records: author resolved to a
//! name, rich text collapsed to a plain string. The view is derived and never
//! persisted; edits are projected back into a [`CommentPart`] before writing.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ooxml::error::{OoxmlError, Result};

use super::config::{ErrorPolicy, ProjectionOptions};
use super::rich_text::RichText;
use super::{CommentEntry, CommentPart};

/// A comment as seen by calling code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicComment {
    /// Resolved author name
    pub author: String,
    /// Index of the author in the part's author list
    #[serde(rename = "author_id")]
    pub author_index: u32,
    /// Cell reference such as `A1`
    #[serde(rename = "ref")]
    pub cell_reference: String,
    /// Plain text of the comment
    pub text: String,
}

impl PublicComment {
    /// Create a comment for the given cell.
    pub fn new(
        author: impl Into<String>,
        cell_reference: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            author_index: 0,
            cell_reference: cell_reference.into(),
            text: text.into(),
        }
    }
}

/// Result of a forward projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    /// Successfully projected comments, in document order
    pub comments: Vec<PublicComment>,
    /// Errors for entries skipped under [`ErrorPolicy::ReportAndSkip`]
    pub skipped: Vec<OoxmlError>,
}

/// Project a part to its public view, failing on the first entry whose author
/// index has no matching author.
pub fn to_public_view(part: &CommentPart) -> Result<Vec<PublicComment>> {
    to_public_view_with(part, &ProjectionOptions::default()).map(|projection| projection.comments)
}

/// Project a part to its public view using the given error policy.
pub fn to_public_view_with(part: &CommentPart, options: &ProjectionOptions) -> Result<Projection> {
    let mut projection = Projection {
        comments: Vec::with_capacity(part.entries.len()),
        skipped: Vec::new(),
    };

    for entry in &part.entries {
        match project_entry(&part.authors, entry) {
            Ok(comment) => projection.comments.push(comment),
            Err(err) => match options.error_policy {
                ErrorPolicy::FailFast => return Err(err),
                ErrorPolicy::CollectAndFail => projection.skipped.push(err),
                ErrorPolicy::ReportAndSkip => {
                    warn!(
                        cell = %entry.cell_reference,
                        author_index = entry.author_index,
                        "skipping comment with unknown author"
                    );
                    projection.skipped.push(err);
                },
            },
        }
    }

    if options.error_policy == ErrorPolicy::CollectAndFail && !projection.skipped.is_empty() {
        return Err(OoxmlError::Projection(projection.skipped));
    }

    Ok(projection)
}

fn project_entry(authors: &[String], entry: &CommentEntry) -> Result<PublicComment> {
    let author = authors
        .get(entry.author_index as usize)
        .ok_or_else(|| OoxmlError::IndexOutOfRange {
            cell_reference: entry.cell_reference.clone(),
            author_index: entry.author_index,
            author_count: authors.len(),
        })?;

    Ok(PublicComment {
        author: author.clone(),
        author_index: entry.author_index,
        cell_reference: entry.cell_reference.clone(),
        text: entry.text(),
    })
}

/// Build a part from public comments and an existing author list.
///
/// Authors already in `authors` are reused, unknown names are appended. New
/// entries carry plain text; an empty string becomes an empty rich text.
pub fn from_public_view(comments: &[PublicComment], authors: Vec<String>) -> CommentPart {
    let mut authors = authors;
    let entries = comments
        .iter()
        .map(|comment| {
            let author_index = resolve_author(&mut authors, comment);
            CommentEntry::new(
                comment.cell_reference.clone(),
                author_index,
                rich_text_for(&comment.text),
            )
        })
        .collect();

    CommentPart {
        authors,
        entries,
        ..CommentPart::default()
    }
}

/// Project edited public comments back onto an existing part.
///
/// Everything outside the comment list entries is kept from `base`, and its
/// author list is only ever appended to. Each
/// comment is matched to the first unused base entry for the same cell; the
/// matched entry keeps its attributes and extra children, and keeps its rich
/// text structure when the text is unchanged.
pub fn reproject(base: &CommentPart, comments: &[PublicComment]) -> CommentPart {
    let mut authors = base.authors.clone();
    let mut used = vec![false; base.entries.len()];
    let mut entries = Vec::with_capacity(comments.len());

    for comment in comments {
        let author_index = resolve_author(&mut authors, comment);
        let matched = base
            .entries
            .iter()
            .enumerate()
            .find(|(i, entry)| !used[*i] && entry.cell_reference == comment.cell_reference);

        let entry = match matched {
            Some((i, original)) => {
                used[i] = true;
                let rich_text = if original.text() == comment.text {
                    original.rich_text.clone()
                } else {
                    rich_text_for(&comment.text)
                };
                CommentEntry {
                    author_index,
                    rich_text,
                    ..original.clone()
                }
            },
            None => CommentEntry::new(
                comment.cell_reference.clone(),
                author_index,
                rich_text_for(&comment.text),
            ),
        };
        entries.push(entry);
    }

    debug!(
        kept = used.iter().filter(|u| **u).count(),
        comments = entries.len(),
        "reprojected comments onto existing part"
    );

    CommentPart {
        authors,
        entries,
        root_attributes: base.root_attributes.clone(),
        extra_elements: base.extra_elements.clone(),
        authors_extras: base.authors_extras.clone(),
        author_attributes: base.author_attributes.clone(),
        comment_list_extras: base.comment_list_extras.clone(),
    }
}

/// Find the author index for a public comment, appending the name if needed.
///
/// The comment's own `author_index` wins when it already names this author,
/// so duplicate names keep their original positions.
fn resolve_author(authors: &mut Vec<String>, comment: &PublicComment) -> u32 {
    if authors.get(comment.author_index as usize) == Some(&comment.author) {
        return comment.author_index;
    }
    if let Some(index) = authors.iter().position(|name| *name == comment.author) {
        return index as u32;
    }
    authors.push(comment.author.clone());
    (authors.len() - 1) as u32
}

fn rich_text_for(text: &str) -> RichText {
    if text.is_empty() {
        RichText::default()
    } else {
        RichText::plain(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::comments::preserve::{ExtraAttribute, RawXml};
    use crate::ooxml::xlsx::comments::rich_text::{FormattedRun, PhoneticRun, TextContent};

    fn part() -> CommentPart {
        CommentPart {
            authors: vec!["Alice".into(), "Bob".into()],
            entries: vec![
                CommentEntry::new("A1", 0, RichText::plain("plain")),
                CommentEntry::new(
                    "B2",
                    1,
                    RichText::from_runs(vec![FormattedRun::new("Bob:"), FormattedRun::new(" ok")]),
                ),
                CommentEntry::new("C3", 0, RichText::default()),
            ],
            ..CommentPart::default()
        }
    }

    #[test]
    fn test_forward_projection() {
        let view = to_public_view(&part()).unwrap();
        assert_eq!(
            view,
            vec![
                PublicComment {
                    author: "Alice".into(),
                    author_index: 0,
                    cell_reference: "A1".into(),
                    text: "plain".into(),
                },
                PublicComment {
                    author: "Bob".into(),
                    author_index: 1,
                    cell_reference: "B2".into(),
                    text: "Bob: ok".into(),
                },
                PublicComment {
                    author: "Alice".into(),
                    author_index: 0,
                    cell_reference: "C3".into(),
                    text: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_out_of_range_fails_with_cell_reference() {
        let part = CommentPart {
            authors: vec!["Alice".into(), "Bob".into()],
            entries: vec![
                CommentEntry::new("A1", 0, RichText::plain("ok")),
                CommentEntry::new("E5", 5, RichText::plain("bad")),
            ],
            ..CommentPart::default()
        };
        let err = to_public_view(&part).unwrap_err();
        assert_eq!(
            err,
            OoxmlError::IndexOutOfRange {
                cell_reference: "E5".into(),
                author_index: 5,
                author_count: 2,
            }
        );
        assert_eq!(err.cell_reference(), Some("E5"));
    }

    #[test]
    fn test_error_policies() {
        let part = CommentPart {
            authors: vec!["Alice".into()],
            entries: vec![
                CommentEntry::new("A1", 3, RichText::plain("bad")),
                CommentEntry::new("A2", 0, RichText::plain("good")),
                CommentEntry::new("A3", 9, RichText::plain("bad")),
            ],
            ..CommentPart::default()
        };

        let skip = ProjectionOptions::new().with_error_policy(ErrorPolicy::ReportAndSkip);
        let projection = to_public_view_with(&part, &skip).unwrap();
        assert_eq!(projection.comments.len(), 1);
        assert_eq!(projection.comments[0].cell_reference, "A2");
        let skipped: Vec<_> = projection
            .skipped
            .iter()
            .filter_map(OoxmlError::cell_reference)
            .collect();
        assert_eq!(skipped, vec!["A1", "A3"]);

        let collect = ProjectionOptions::new().with_error_policy(ErrorPolicy::CollectAndFail);
        match to_public_view_with(&part, &collect) {
            Err(OoxmlError::Projection(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected collected errors, got {:?}", other),
        }

        let err = to_public_view_with(&part, &ProjectionOptions::default()).unwrap_err();
        assert_eq!(err.cell_reference(), Some("A1"));
    }

    #[test]
    fn test_plain_text_wins_when_both_present() {
        let part = CommentPart {
            authors: vec!["A".into()],
            entries: vec![CommentEntry::new(
                "A1",
                0,
                RichText {
                    content: TextContent::PlainWithRuns {
                        plain: "plain".into(),
                        runs: vec![FormattedRun::new("runs")],
                    },
                    ..RichText::default()
                },
            )],
            ..CommentPart::default()
        };
        assert_eq!(to_public_view(&part).unwrap()[0].text, "plain");
    }

    #[test]
    fn test_phonetic_run_removal_keeps_text() {
        let mut text = RichText::plain("漢字");
        text.phonetic_run = Some(PhoneticRun::new(0, 2, "かんじ"));
        let mut part = CommentPart {
            authors: vec!["A".into()],
            entries: vec![CommentEntry::new("A1", 0, text)],
            ..CommentPart::default()
        };
        let before = to_public_view(&part).unwrap();
        part.entries[0].rich_text.phonetic_run = None;
        assert_eq!(to_public_view(&part).unwrap(), before);
    }

    #[test]
    fn test_append_on_new_author() {
        let comments = vec![PublicComment::new("Bob", "A1", "hi")];
        let part = from_public_view(&comments, vec!["Alice".into()]);
        assert_eq!(part.authors, vec!["Alice", "Bob"]);
        assert_eq!(part.entries[0].author_index, 1);
    }

    #[test]
    fn test_existing_author_reused() {
        let comments = vec![
            PublicComment::new("Alice", "A1", "one"),
            PublicComment::new("Carol", "A2", "two"),
            PublicComment::new("Carol", "A3", ""),
        ];
        let part = from_public_view(&comments, vec!["Bob".into(), "Alice".into()]);
        assert_eq!(part.authors, vec!["Bob", "Alice", "Carol"]);
        let indices: Vec<u32> = part.entries.iter().map(|e| e.author_index).collect();
        assert_eq!(indices, vec![1, 2, 2]);
        assert!(part.entries[2].rich_text.is_empty());
        assert_eq!(part.entries[0].rich_text, RichText::plain("one"));
    }

    #[test]
    fn test_duplicate_author_names_keep_indices() {
        let part = CommentPart {
            authors: vec!["Sam".into(), "Kim".into(), "Sam".into()],
            entries: vec![
                CommentEntry::new("A1", 2, RichText::plain("x")),
                CommentEntry::new("A2", 0, RichText::plain("y")),
            ],
            ..CommentPart::default()
        };
        let view = to_public_view(&part).unwrap();
        let rebuilt = from_public_view(&view, part.authors.clone());
        assert_eq!(rebuilt.authors, part.authors);
        assert_eq!(rebuilt.entries[0].author_index, 2);
        assert_eq!(rebuilt.entries[1].author_index, 0);
    }

    #[test]
    fn test_reproject_keeps_unedited_structure() {
        let mut base = part();
        base.root_attributes
            .push(ExtraAttribute::new("xmlns:xr", "urn:xr"));
        base.extra_elements.push(RawXml::new("<extLst/>"));
        base.author_attributes
            .insert(1, vec![ExtraAttribute::new("x:id", "bob")]);
        base.comment_list_extras
            .elements
            .push(RawXml::new("<x:listExt/>"));
        base.entries[1]
            .extra_attributes
            .push(ExtraAttribute::new("xr:uid", "{B2}"));

        let mut view = to_public_view(&base).unwrap();
        view[0].text = "edited".into();
        view.push(PublicComment::new("Dana", "D4", "new"));

        let part = reproject(&base, &view);
        assert_eq!(part.root_attributes, base.root_attributes);
        assert_eq!(part.extra_elements, base.extra_elements);
        assert_eq!(part.author_attributes, base.author_attributes);
        assert_eq!(part.comment_list_extras, base.comment_list_extras);
        assert_eq!(part.authors, vec!["Alice", "Bob", "Dana"]);
        assert_eq!(part.entries[0].rich_text, RichText::plain("edited"));
        assert_eq!(part.entries[1], base.entries[1]);
        assert_eq!(part.entries[2], base.entries[2]);
        assert_eq!(part.entries[3].author_index, 2);
    }

    #[test]
    fn test_public_comment_json_shape() {
        let comment = PublicComment {
            author: "Alice".into(),
            author_index: 3,
            cell_reference: "B7".into(),
            text: "note".into(),
        };
        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "author": "Alice",
                "author_id": 3,
                "ref": "B7",
                "text": "note",
            })
        );
        let back: PublicComment = serde_json::from_value(json).unwrap();
        assert_eq!(back, comment);
    }
}
