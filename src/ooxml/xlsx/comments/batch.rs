//! Processing of many comment parts at once.
//!
//! A workbook carries one comments part per commented worksheet. Parts are
//! independent, so they are parsed and projected in parallel once a batch is
//! large enough; results always come back in input order.

use rayon::prelude::*;
use tracing::debug;

use crate::ooxml::error::Result;

use super::config::BatchOptions;
use super::view::{Projection, to_public_view_with};
use super::CommentPart;

/// Conventional part name of the `index`-th comments part.
///
/// # Examples
///
/// ```
/// use litchi_comments::ooxml::xlsx::comments::comments_part_name;
/// assert_eq!(comments_part_name(3), "xl/comments3.xml");
/// ```
pub fn comments_part_name(index: u32) -> String {
    format!("xl/comments{}.xml", index)
}

/// Whether a package path names a legacy comments part.
///
/// Accepts `xl/commentsN.xml` as written by Excel and the `xl/comments/commentN.xml`
/// layout used by some producers, where `N` is one or more digits. Threaded
/// comment parts are not matched.
///
/// # Examples
///
/// ```
/// use litchi_comments::ooxml::xlsx::comments::is_comments_part;
/// assert!(is_comments_part("xl/comments1.xml"));
/// assert!(is_comments_part("/xl/comments/comment2.xml"));
/// assert!(!is_comments_part("xl/threadedComments/threadedComment1.xml"));
/// assert!(!is_comments_part("xl/commentary.xml"));
/// assert!(!is_comments_part("xl/worksheets/sheet1.xml"));
/// ```
pub fn is_comments_part(path: &str) -> bool {
    let path = path.strip_prefix('/').unwrap_or(path);
    if !path.starts_with("xl/") || !path.ends_with(".xml") {
        return false;
    }

    let file_name = match memchr::memrchr(b'/', path.as_bytes()) {
        Some(slash) => &path[slash + 1..],
        None => path,
    };
    let stem = &file_name[..file_name.len() - ".xml".len()];
    let prefix = match &path[..path.len() - file_name.len()] {
        "xl/" => "comments",
        "xl/comments/" => "comment",
        _ => return false,
    };

    stem.strip_prefix(prefix)
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse several comments parts. Each part succeeds or fails on its own.
pub fn parse_parts<N, B>(parts: &[(N, B)], options: &BatchOptions) -> Vec<Result<CommentPart>>
where
    N: AsRef<str> + Sync,
    B: AsRef<[u8]> + Sync,
{
    let parse = |(name, bytes): &(N, B)| CommentPart::from_xml(name.as_ref(), bytes.as_ref());

    let parallel = options.parallel_for(parts.len());
    debug!(parts = parts.len(), parallel, "parsing comment parts");

    if parallel {
        parts.par_iter().map(parse).collect()
    } else {
        parts.iter().map(parse).collect()
    }
}

/// Project several parsed parts to their public view.
pub fn project_parts(parts: &[CommentPart], options: &BatchOptions) -> Vec<Result<Projection>> {
    let project = |part: &CommentPart| to_public_view_with(part, &options.projection);

    if options.parallel_for(parts.len()) {
        parts.par_iter().map(project).collect()
    } else {
        parts.iter().map(project).collect()
    }
}

/// Pick the comments parts out of a package listing and parse them.
///
/// Returns `(part name, result)` pairs for every path accepted by
/// [`is_comments_part`], in input order.
pub fn extract_comment_parts<N, B>(
    parts: &[(N, B)],
    options: &BatchOptions,
) -> Vec<(String, Result<CommentPart>)>
where
    N: AsRef<str> + Sync,
    B: AsRef<[u8]> + Sync,
{
    let selected: Vec<(&str, &[u8])> = parts
        .iter()
        .filter(|(name, _)| is_comments_part(name.as_ref()))
        .map(|(name, bytes)| (name.as_ref(), bytes.as_ref()))
        .collect();

    let results = parse_parts(&selected, options);
    selected
        .into_iter()
        .map(|(name, _)| name.to_string())
        .zip(results)
        .collect()
}
