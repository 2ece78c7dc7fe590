//! Rich text body of a comment.
//!
//! The `text` element of a comment is a `CT_Rst`: an optional plain `t`, a
//! sequence of formatted runs `r`, an optional phonetic run `rPh` and optional
//! phonetic properties `phoneticPr`. Formatting is kept structurally and never
//! interpreted here.

use super::preserve::{ExtraAttribute, RawXml};

/// The primary text payload of a [`RichText`].
///
/// The schema allows `t` and `r` to appear independently; both being present
/// is legal and kept as [`TextContent::PlainWithRuns`] so nothing is lost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TextContent {
    /// Neither `t` nor any `r`
    #[default]
    Empty,
    /// A single plain `t` element
    Plain(String),
    /// One or more formatted runs
    Runs(Vec<FormattedRun>),
    /// Both a plain `t` and formatted runs; the plain text takes precedence
    PlainWithRuns {
        plain: String,
        runs: Vec<FormattedRun>,
    },
}

impl TextContent {
    /// Build content from the optional pieces found in a `text` element.
    pub fn from_parts(plain: Option<String>, runs: Vec<FormattedRun>) -> Self {
        match (plain, runs.is_empty()) {
            (None, true) => TextContent::Empty,
            (Some(plain), true) => TextContent::Plain(plain),
            (None, false) => TextContent::Runs(runs),
            (Some(plain), false) => TextContent::PlainWithRuns { plain, runs },
        }
    }

    /// The plain `t` payload, if present.
    pub fn plain(&self) -> Option<&str> {
        match self {
            TextContent::Plain(plain) | TextContent::PlainWithRuns { plain, .. } => Some(plain.as_str()),
            _ => None,
        }
    }

    /// The formatted runs, empty when there are none.
    pub fn runs(&self) -> &[FormattedRun] {
        match self {
            TextContent::Runs(runs) | TextContent::PlainWithRuns { runs, .. } => runs.as_slice(),
            _ => &[],
        }
    }

    /// Logical text: the plain payload if present, otherwise the runs
    /// concatenated in order, otherwise an empty string.
    pub fn text(&self) -> String {
        match self {
            TextContent::Empty => String::new(),
            TextContent::Plain(plain) | TextContent::PlainWithRuns { plain, .. } => plain.clone(),
            TextContent::Runs(runs) => runs.iter().map(|run| run.text.as_str()).collect(),
        }
    }
}

/// Opaque `rPr` run properties, stored as the complete element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProperties(pub RawXml);

/// A run of text sharing one set of (uninterpreted) formatting properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedRun {
    /// Run properties, absent when the run has no `rPr`
    pub properties: Option<RunProperties>,
    /// Text content of the run's `t` element
    pub text: String,
    /// Attributes of the `r` element
    pub extra_attributes: Vec<ExtraAttribute>,
    /// Attributes of the run's `t` element other than `xml:space`
    pub text_attributes: Vec<ExtraAttribute>,
    /// Uninterpreted children, written after `t`
    pub extra_elements: Vec<RawXml>,
}

impl FormattedRun {
    /// Create an unformatted run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Create a run with the given `rPr` markup.
    pub fn with_properties(properties: RunProperties, text: impl Into<String>) -> Self {
        Self {
            properties: Some(properties),
            ..Self::new(text)
        }
    }
}

/// Phonetic hint over a range of the base text (`rPh`).
///
/// `start_offset <= end_offset` is expected but not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneticRun {
    /// Start of the base text range (`sb`)
    pub start_offset: u32,
    /// End of the base text range (`eb`)
    pub end_offset: u32,
    /// Phonetic text
    pub text: String,
    /// Attributes other than `sb` and `eb`
    pub extra_attributes: Vec<ExtraAttribute>,
    /// Attributes of the `t` element other than `xml:space`
    pub text_attributes: Vec<ExtraAttribute>,
    /// Uninterpreted children, written after `t`
    pub extra_elements: Vec<RawXml>,
}

impl PhoneticRun {
    /// Create a phonetic hint over `start_offset..end_offset`.
    pub fn new(start_offset: u32, end_offset: u32, text: impl Into<String>) -> Self {
        Self {
            start_offset,
            end_offset,
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Phonetic presentation preferences (`phoneticPr`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneticProperties {
    /// Font used for the phonetic text (`fontId`)
    pub font_id: Option<u32>,
    /// Character set of the phonetic text (`type`)
    pub kind: Option<String>,
    /// Alignment of the phonetic text (`alignment`)
    pub alignment: Option<String>,
    /// Any other attributes, in document order
    pub extra_attributes: Vec<ExtraAttribute>,
    /// Uninterpreted children
    pub extra_elements: Vec<RawXml>,
}

/// Body of one comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    /// Primary text, plain or run based
    pub content: TextContent,
    /// Optional pronunciation hint
    pub phonetic_run: Option<PhoneticRun>,
    /// Optional phonetic presentation preference
    pub phonetic_properties: Option<PhoneticProperties>,
    /// Attributes of the `text` element
    pub extra_attributes: Vec<ExtraAttribute>,
    /// Attributes of the plain `t` element other than `xml:space`
    pub plain_attributes: Vec<ExtraAttribute>,
    /// Uninterpreted child elements, including any `rPh` after the first
    pub extra_elements: Vec<RawXml>,
}

impl RichText {
    /// Rich text with a single plain `t` payload.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            content: TextContent::Plain(text.into()),
            ..Self::default()
        }
    }

    /// Rich text made of formatted runs.
    pub fn from_runs(runs: Vec<FormattedRun>) -> Self {
        Self {
            content: TextContent::from_parts(None, runs),
            ..Self::default()
        }
    }

    /// Logical text content. Phonetic data never contributes.
    pub fn plain_text(&self) -> String {
        self.content.text()
    }

    /// Whether there is neither a plain payload nor any run.
    pub fn is_empty(&self) -> bool {
        matches!(self.content, TextContent::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs() -> Vec<FormattedRun> {
        vec![
            FormattedRun::with_properties(RunProperties(RawXml::new("<rPr><b/></rPr>")), "Alice:"),
            FormattedRun::new("\nCheck totals"),
        ]
    }

    #[test]
    fn test_from_parts_variants() {
        assert_eq!(TextContent::from_parts(None, Vec::new()), TextContent::Empty);
        assert_eq!(
            TextContent::from_parts(Some("x".into()), Vec::new()),
            TextContent::Plain("x".into())
        );
        assert!(matches!(
            TextContent::from_parts(None, runs()),
            TextContent::Runs(_)
        ));
        assert!(matches!(
            TextContent::from_parts(Some("x".into()), runs()),
            TextContent::PlainWithRuns { .. }
        ));
    }

    #[test]
    fn test_runs_are_concatenated() {
        let text = RichText::from_runs(runs());
        assert_eq!(text.plain_text(), "Alice:\nCheck totals");
        assert_eq!(text.content.runs().len(), 2);
        assert_eq!(text.content.plain(), None);
    }

    #[test]
    fn test_plain_wins_over_runs() {
        let text = RichText {
            content: TextContent::from_parts(Some("plain".into()), runs()),
            ..RichText::default()
        };
        assert_eq!(text.plain_text(), "plain");
        assert_eq!(text.content.runs().len(), 2);
    }

    #[test]
    fn test_empty_rich_text() {
        let text = RichText::default();
        assert!(text.is_empty());
        assert_eq!(text.plain_text(), "");
    }

    #[test]
    fn test_phonetic_run_does_not_affect_text() {
        let mut text = RichText::plain("東京");
        text.phonetic_run = Some(PhoneticRun::new(0, 2, "トウキョウ"));
        let with_hint = text.plain_text();
        text.phonetic_run = None;
        assert_eq!(text.plain_text(), with_hint);
        assert!(!text.is_empty());
    }
}
