//! Writer module for comments part XML generation.

use std::fmt::Write as FmtWrite;

use tracing::debug;

use crate::common::xml::{escape_attr, escape_xml, needs_space_preserve};
use crate::ooxml::error::Result;

use super::preserve::{ExtraAttribute, write_attributes, write_raw};
use super::rich_text::{FormattedRun, PhoneticProperties, PhoneticRun, RichText, TextContent};
use super::{CommentEntry, CommentPart, SPREADSHEETML_NS};

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Write a comments part to XML.
///
/// Generates the `xl/commentsN.xml` part. The default SpreadsheetML namespace
/// is written first unless the root attributes declare another default
/// namespace; all other root attributes follow as parsed.
pub fn write_comment_part(part: &CommentPart) -> Result<String> {
    let mut xml = String::with_capacity(1024 + part.entries.len() * 128);

    xml.push_str(XML_HEADER);
    xml.push('\n');
    xml.push_str("<comments");
    if !part.root_attributes.iter().any(|attr| attr.name == "xmlns") {
        write!(xml, r#" xmlns="{}""#, SPREADSHEETML_NS)?;
    }
    write_attributes(&mut xml, &part.root_attributes)?;
    xml.push('>');

    write_authors(&mut xml, part)?;

    xml.push_str("<commentList");
    write_attributes(&mut xml, &part.comment_list_extras.attributes)?;
    xml.push('>');
    for entry in &part.entries {
        write_comment(&mut xml, entry)?;
    }
    write_raw(&mut xml, &part.comment_list_extras.elements);
    xml.push_str("</commentList>");

    write_raw(&mut xml, &part.extra_elements);
    xml.push_str("</comments>");

    debug!(
        authors = part.authors.len(),
        comments = part.entries.len(),
        bytes = xml.len(),
        "wrote comments part"
    );
    Ok(xml)
}

/// Write the author list, keeping authors that no comment references.
fn write_authors(xml: &mut String, part: &CommentPart) -> Result<()> {
    xml.push_str("<authors");
    write_attributes(xml, &part.authors_extras.attributes)?;
    xml.push('>');
    for (index, author) in part.authors.iter().enumerate() {
        xml.push_str("<author");
        if let Some(attributes) = part.author_attributes.get(&(index as u32)) {
            write_attributes(xml, attributes)?;
        }
        xml.push('>');
        xml.push_str(&escape_xml(author));
        xml.push_str("</author>");
    }
    write_raw(xml, &part.authors_extras.elements);
    xml.push_str("</authors>");
    Ok(())
}

/// Write a single comment to XML.
fn write_comment(xml: &mut String, entry: &CommentEntry) -> Result<()> {
    write!(
        xml,
        r#"<comment ref="{}" authorId="{}""#,
        escape_attr(&entry.cell_reference),
        entry.author_index
    )?;
    write_attributes(xml, &entry.extra_attributes)?;
    xml.push('>');

    write_rich_text(xml, &entry.rich_text)?;
    write_raw(xml, &entry.extra_elements);

    xml.push_str("</comment>");
    Ok(())
}

/// Write the `text` element in schema order: `t`, `r*`, `rPh`, `phoneticPr`.
fn write_rich_text(xml: &mut String, text: &RichText) -> Result<()> {
    xml.push_str("<text");
    write_attributes(xml, &text.extra_attributes)?;

    if text.is_empty()
        && text.phonetic_run.is_none()
        && text.phonetic_properties.is_none()
        && text.extra_elements.is_empty()
    {
        xml.push_str("/>");
        return Ok(());
    }
    xml.push('>');

    match &text.content {
        TextContent::Empty => {},
        TextContent::Plain(plain) => write_t(xml, plain, &text.plain_attributes)?,
        TextContent::Runs(runs) => write_runs(xml, runs)?,
        TextContent::PlainWithRuns { plain, runs } => {
            write_t(xml, plain, &text.plain_attributes)?;
            write_runs(xml, runs)?;
        },
    }

    if let Some(run) = &text.phonetic_run {
        write_phonetic_run(xml, run)?;
    }
    if let Some(props) = &text.phonetic_properties {
        write_phonetic_properties(xml, props)?;
    }
    write_raw(xml, &text.extra_elements);

    xml.push_str("</text>");
    Ok(())
}

fn write_runs(xml: &mut String, runs: &[FormattedRun]) -> Result<()> {
    for run in runs {
        xml.push_str("<r");
        write_attributes(xml, &run.extra_attributes)?;
        xml.push('>');
        if let Some(props) = &run.properties {
            xml.push_str(props.0.as_str());
        }
        write_t(xml, &run.text, &run.text_attributes)?;
        write_raw(xml, &run.extra_elements);
        xml.push_str("</r>");
    }
    Ok(())
}

/// Write a `t` element; use xml:space="preserve" to keep leading/trailing spaces
fn write_t(xml: &mut String, text: &str, attributes: &[ExtraAttribute]) -> Result<()> {
    xml.push_str("<t");
    if needs_space_preserve(text) {
        xml.push_str(r#" xml:space="preserve""#);
    }
    write_attributes(xml, attributes)?;
    xml.push('>');
    xml.push_str(&escape_xml(text));
    xml.push_str("</t>");
    Ok(())
}

fn write_phonetic_run(xml: &mut String, run: &PhoneticRun) -> Result<()> {
    write!(xml, r#"<rPh sb="{}" eb="{}""#, run.start_offset, run.end_offset)?;
    write_attributes(xml, &run.extra_attributes)?;
    xml.push('>');
    write_t(xml, &run.text, &run.text_attributes)?;
    write_raw(xml, &run.extra_elements);
    xml.push_str("</rPh>");
    Ok(())
}

fn write_phonetic_properties(xml: &mut String, props: &PhoneticProperties) -> Result<()> {
    xml.push_str("<phoneticPr");
    if let Some(font_id) = props.font_id {
        write!(xml, r#" fontId="{}""#, font_id)?;
    }
    if let Some(kind) = &props.kind {
        write!(xml, r#" type="{}""#, escape_attr(kind))?;
    }
    if let Some(alignment) = &props.alignment {
        write!(xml, r#" alignment="{}""#, escape_attr(alignment))?;
    }
    write_attributes(xml, &props.extra_attributes)?;

    if props.extra_elements.is_empty() {
        xml.push_str("/>");
    } else {
        xml.push('>');
        write_raw(xml, &props.extra_elements);
        xml.push_str("</phoneticPr>");
    }
    Ok(())
}
