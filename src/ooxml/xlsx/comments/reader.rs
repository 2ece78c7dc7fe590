//! Reader module for comments part XML parsing.
//!
//! Parsing is all-or-nothing: malformed XML, a missing `comments` root or a
//! non-conforming value for a modeled attribute fails the whole part with
//! [`OoxmlError::SchemaParse`]. No semantic checks (author index range, cell
//! reference syntax, phonetic offsets) happen here.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};
use tracing::debug;

use crate::common::xml::{resolve_entity, unescape_attr, unescape_xml};
use crate::ooxml::error::{OoxmlError, Result};

use super::preserve::{ContainerExtras, ExtraAttribute, RawXml};
use super::rich_text::{
    FormattedRun, PhoneticProperties, PhoneticRun, RichText, RunProperties, TextContent,
};
use super::{CommentEntry, CommentPart, SPREADSHEETML_NS};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Parse one comments part from raw bytes.
///
/// `part_name` identifies the part in error messages (e.g. `xl/comments1.xml`).
pub fn parse_comment_part(part_name: &str, bytes: &[u8]) -> Result<CommentPart> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let xml = std::str::from_utf8(bytes)
        .map_err(|e| OoxmlError::schema_parse(part_name, format!("Invalid UTF-8: {}", e)))?;

    let part = PartReader::new(part_name, xml).parse()?;
    debug!(
        part = part_name,
        authors = part.authors.len(),
        comments = part.entries.len(),
        "parsed comments part"
    );
    Ok(part)
}

/// Pull parser state for a single part.
struct PartReader<'a> {
    part: &'a str,
    xml: &'a str,
    reader: Reader<&'a [u8]>,
}

impl<'a> PartReader<'a> {
    fn new(part: &'a str, xml: &'a str) -> Self {
        Self {
            part,
            xml,
            reader: Reader::from_str(xml),
        }
    }

    fn error(&self, message: impl Into<String>) -> OoxmlError {
        OoxmlError::schema_parse(self.part, message)
    }

    fn position(&self) -> usize {
        self.reader.buffer_position() as usize
    }

    /// Read the next event together with the offset where it starts.
    fn next(&mut self) -> Result<(usize, Event<'a>)> {
        let start = self.position();
        match self.reader.read_event() {
            Ok(event) => Ok((start, event)),
            Err(e) => Err(self.error(format!(
                "XML parsing error at position {}: {}",
                self.position(),
                e
            ))),
        }
    }

    fn parse(mut self) -> Result<CommentPart> {
        let mut part = None;

        loop {
            match self.next()? {
                (_, Event::Start(e)) if part.is_none() => {
                    self.expect_root(&e)?;
                    part = Some(self.parse_root(&e, false)?);
                },
                (_, Event::Empty(e)) if part.is_none() => {
                    self.expect_root(&e)?;
                    part = Some(self.parse_root(&e, true)?);
                },
                (_, Event::Start(e)) | (_, Event::Empty(e)) => {
                    return Err(self.error(format!(
                        "Unexpected element <{}> after the root element",
                        qualified_name(&e)
                    )));
                },
                (_, Event::Text(t)) => self.expect_whitespace(&t, "document")?,
                (_, Event::Eof) => break,
                _ => {},
            }
        }

        part.ok_or_else(|| self.error("Missing root element <comments>"))
    }

    fn expect_root(&self, e: &BytesStart<'_>) -> Result<()> {
        if e.local_name().as_ref() == b"comments" {
            Ok(())
        } else {
            Err(self.error(format!(
                "Unexpected root element <{}>, expected <comments>",
                qualified_name(e)
            )))
        }
    }

    fn parse_root(&mut self, start: &BytesStart<'_>, self_closing: bool) -> Result<CommentPart> {
        let root_attributes = self
            .attributes(start)?
            .into_iter()
            .filter(|attr| !(attr.name == "xmlns" && attr.value == SPREADSHEETML_NS))
            .collect();
        let mut part = CommentPart {
            root_attributes,
            ..CommentPart::default()
        };
        if self_closing {
            return Ok(part);
        }

        loop {
            match self.next()? {
                (_, Event::Start(e)) if e.local_name().as_ref() == b"authors" => {
                    part.authors_extras.attributes = self.attributes(&e)?;
                    self.parse_authors(&mut part)?;
                },
                (_, Event::Empty(e)) if e.local_name().as_ref() == b"authors" => {
                    part.authors_extras.attributes = self.attributes(&e)?;
                },
                (_, Event::Start(e)) if e.local_name().as_ref() == b"commentList" => {
                    part.comment_list_extras.attributes = self.attributes(&e)?;
                    self.parse_comment_list(&mut part.entries, &mut part.comment_list_extras)?;
                },
                (_, Event::Empty(e)) if e.local_name().as_ref() == b"commentList" => {
                    part.comment_list_extras.attributes = self.attributes(&e)?;
                },
                (pos, Event::Start(e)) => part.extra_elements.push(self.capture(pos, &e)?),
                (pos, Event::Empty(_)) => part.extra_elements.push(self.capture_empty(pos)),
                (_, Event::Text(t)) => self.expect_whitespace(&t, "comments")?,
                (_, Event::End(_)) => return Ok(part),
                (_, Event::Eof) => return Err(self.unexpected_eof("comments")),
                (_, other) => self.reject_content(&other, "comments")?,
            }
        }
    }

    fn parse_authors(&mut self, part: &mut CommentPart) -> Result<()> {
        loop {
            match self.next()? {
                (_, Event::Start(e)) if e.local_name().as_ref() == b"author" => {
                    self.record_author_attributes(part, &e)?;
                    let name = self.read_text("author")?;
                    part.authors.push(name);
                },
                (_, Event::Empty(e)) if e.local_name().as_ref() == b"author" => {
                    self.record_author_attributes(part, &e)?;
                    part.authors.push(String::new());
                },
                (pos, Event::Start(e)) => part.authors_extras.elements.push(self.capture(pos, &e)?),
                (pos, Event::Empty(_)) => part.authors_extras.elements.push(self.capture_empty(pos)),
                (_, Event::Text(t)) => self.expect_whitespace(&t, "authors")?,
                (_, Event::End(_)) => return Ok(()),
                (_, Event::Eof) => return Err(self.unexpected_eof("authors")),
                (_, other) => self.reject_content(&other, "authors")?,
            }
        }
    }

    /// Remember attributes of the `author` about to be pushed.
    fn record_author_attributes(&self, part: &mut CommentPart, e: &BytesStart<'_>) -> Result<()> {
        let attributes = self.attributes(e)?;
        if !attributes.is_empty() {
            part.author_attributes
                .insert(part.authors.len() as u32, attributes);
        }
        Ok(())
    }

    fn parse_comment_list(
        &mut self,
        entries: &mut Vec<CommentEntry>,
        extras: &mut ContainerExtras,
    ) -> Result<()> {
        loop {
            match self.next()? {
                (_, Event::Start(e)) if e.local_name().as_ref() == b"comment" => {
                    entries.push(self.parse_comment(&e, false)?);
                },
                (_, Event::Empty(e)) if e.local_name().as_ref() == b"comment" => {
                    entries.push(self.parse_comment(&e, true)?);
                },
                (pos, Event::Start(e)) => extras.elements.push(self.capture(pos, &e)?),
                (pos, Event::Empty(_)) => extras.elements.push(self.capture_empty(pos)),
                (_, Event::Text(t)) => self.expect_whitespace(&t, "commentList")?,
                (_, Event::End(_)) => return Ok(()),
                (_, Event::Eof) => return Err(self.unexpected_eof("commentList")),
                (_, other) => self.reject_content(&other, "commentList")?,
            }
        }
    }

    fn parse_comment(&mut self, start: &BytesStart<'_>, self_closing: bool) -> Result<CommentEntry> {
        let mut cell_reference = None;
        let mut author_index = None;
        let mut extra_attributes = Vec::new();

        for attr in self.attributes(start)? {
            match attr.name.as_str() {
                "ref" => cell_reference = Some(attr.value),
                "authorId" => author_index = Some(self.parse_u32("authorId", &attr.value)?),
                _ => extra_attributes.push(attr),
            }
        }

        let cell_reference =
            cell_reference.ok_or_else(|| self.error("<comment> is missing the 'ref' attribute"))?;
        let author_index = author_index.ok_or_else(|| {
            self.error(format!(
                "<comment ref=\"{}\"> is missing the 'authorId' attribute",
                cell_reference
            ))
        })?;

        let mut entry = CommentEntry {
            cell_reference,
            author_index,
            rich_text: RichText::default(),
            extra_attributes,
            extra_elements: Vec::new(),
        };
        if self_closing {
            return Ok(entry);
        }

        let mut seen_text = false;
        loop {
            match self.next()? {
                (_, Event::Start(e)) if e.local_name().as_ref() == b"text" => {
                    self.reject_duplicate(&mut seen_text, "text")?;
                    entry.rich_text = self.parse_rich_text(&e, false)?;
                },
                (_, Event::Empty(e)) if e.local_name().as_ref() == b"text" => {
                    self.reject_duplicate(&mut seen_text, "text")?;
                    entry.rich_text = self.parse_rich_text(&e, true)?;
                },
                (pos, Event::Start(e)) => entry.extra_elements.push(self.capture(pos, &e)?),
                (pos, Event::Empty(_)) => entry.extra_elements.push(self.capture_empty(pos)),
                (_, Event::Text(t)) => self.expect_whitespace(&t, "comment")?,
                (_, Event::End(_)) => return Ok(entry),
                (_, Event::Eof) => return Err(self.unexpected_eof("comment")),
                (_, other) => self.reject_content(&other, "comment")?,
            }
        }
    }

    fn parse_rich_text(&mut self, start: &BytesStart<'_>, self_closing: bool) -> Result<RichText> {
        let mut text = RichText {
            extra_attributes: self.attributes(start)?,
            ..RichText::default()
        };
        if self_closing {
            return Ok(text);
        }

        let mut plain = None;
        let mut runs = Vec::new();

        loop {
            match self.next()? {
                (_, Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                    self.reject_duplicate_plain(&plain)?;
                    text.plain_attributes = self.text_attributes(&e)?;
                    plain = Some(self.read_text("t")?);
                },
                (_, Event::Empty(e)) if e.local_name().as_ref() == b"t" => {
                    self.reject_duplicate_plain(&plain)?;
                    text.plain_attributes = self.text_attributes(&e)?;
                    plain = Some(String::new());
                },
                (_, Event::Start(e)) if e.local_name().as_ref() == b"r" => {
                    runs.push(self.parse_run(&e)?);
                },
                (_, Event::Empty(e)) if e.local_name().as_ref() == b"r" => {
                    return Err(self.missing_text("r"));
                },
                (pos, Event::Start(e))
                    if e.local_name().as_ref() == b"rPh" && text.phonetic_run.is_some() =>
                {
                    text.extra_elements.push(self.capture(pos, &e)?);
                },
                (_, Event::Start(e)) if e.local_name().as_ref() == b"rPh" => {
                    text.phonetic_run = Some(self.parse_phonetic_run(&e, false)?);
                },
                (pos, Event::Empty(e))
                    if e.local_name().as_ref() == b"rPh" && text.phonetic_run.is_some() =>
                {
                    text.extra_elements.push(self.capture_empty(pos));
                },
                (_, Event::Empty(e)) if e.local_name().as_ref() == b"rPh" => {
                    text.phonetic_run = Some(self.parse_phonetic_run(&e, true)?);
                },
                (pos, Event::Start(e))
                    if e.local_name().as_ref() == b"phoneticPr"
                        && text.phonetic_properties.is_some() =>
                {
                    text.extra_elements.push(self.capture(pos, &e)?);
                },
                (_, Event::Start(e)) if e.local_name().as_ref() == b"phoneticPr" => {
                    text.phonetic_properties = Some(self.parse_phonetic_properties(&e, false)?);
                },
                (pos, Event::Empty(e))
                    if e.local_name().as_ref() == b"phoneticPr"
                        && text.phonetic_properties.is_some() =>
                {
                    text.extra_elements.push(self.capture_empty(pos));
                },
                (_, Event::Empty(e)) if e.local_name().as_ref() == b"phoneticPr" => {
                    text.phonetic_properties = Some(self.parse_phonetic_properties(&e, true)?);
                },
                (pos, Event::Start(e)) => text.extra_elements.push(self.capture(pos, &e)?),
                (pos, Event::Empty(_)) => text.extra_elements.push(self.capture_empty(pos)),
                (_, Event::Text(t)) => self.expect_whitespace(&t, "text")?,
                (_, Event::End(_)) => break,
                (_, Event::Eof) => return Err(self.unexpected_eof("text")),
                (_, other) => self.reject_content(&other, "text")?,
            }
        }

        text.content = TextContent::from_parts(plain, runs);
        Ok(text)
    }

    fn parse_run(&mut self, start: &BytesStart<'_>) -> Result<FormattedRun> {
        let mut run = FormattedRun {
            extra_attributes: self.attributes(start)?,
            ..FormattedRun::default()
        };
        let mut seen_properties = false;
        let mut seen_text = false;

        loop {
            match self.next()? {
                (pos, Event::Start(e)) if e.local_name().as_ref() == b"rPr" => {
                    self.reject_duplicate(&mut seen_properties, "rPr")?;
                    run.properties = Some(RunProperties(self.capture(pos, &e)?));
                },
                (pos, Event::Empty(e)) if e.local_name().as_ref() == b"rPr" => {
                    self.reject_duplicate(&mut seen_properties, "rPr")?;
                    run.properties = Some(RunProperties(self.capture_empty(pos)));
                },
                (_, Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                    self.reject_duplicate(&mut seen_text, "t")?;
                    run.text_attributes = self.text_attributes(&e)?;
                    run.text = self.read_text("t")?;
                },
                (_, Event::Empty(e)) if e.local_name().as_ref() == b"t" => {
                    self.reject_duplicate(&mut seen_text, "t")?;
                    run.text_attributes = self.text_attributes(&e)?;
                },
                (pos, Event::Start(e)) => run.extra_elements.push(self.capture(pos, &e)?),
                (pos, Event::Empty(_)) => run.extra_elements.push(self.capture_empty(pos)),
                (_, Event::Text(t)) => self.expect_whitespace(&t, "r")?,
                (_, Event::End(_)) => break,
                (_, Event::Eof) => return Err(self.unexpected_eof("r")),
                (_, other) => self.reject_content(&other, "r")?,
            }
        }

        if seen_text {
            Ok(run)
        } else {
            Err(self.missing_text("r"))
        }
    }

    fn parse_phonetic_run(&mut self, start: &BytesStart<'_>, self_closing: bool) -> Result<PhoneticRun> {
        let mut start_offset = None;
        let mut end_offset = None;
        let mut extra_attributes = Vec::new();

        for attr in self.attributes(start)? {
            match attr.name.as_str() {
                "sb" => start_offset = Some(self.parse_u32("sb", &attr.value)?),
                "eb" => end_offset = Some(self.parse_u32("eb", &attr.value)?),
                _ => extra_attributes.push(attr),
            }
        }

        let mut run = PhoneticRun {
            start_offset: start_offset
                .ok_or_else(|| self.error("<rPh> is missing the 'sb' attribute"))?,
            end_offset: end_offset.ok_or_else(|| self.error("<rPh> is missing the 'eb' attribute"))?,
            extra_attributes,
            ..PhoneticRun::default()
        };
        if self_closing {
            return Err(self.missing_text("rPh"));
        }

        let mut seen_text = false;
        loop {
            match self.next()? {
                (_, Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                    self.reject_duplicate(&mut seen_text, "t")?;
                    run.text_attributes = self.text_attributes(&e)?;
                    run.text = self.read_text("t")?;
                },
                (_, Event::Empty(e)) if e.local_name().as_ref() == b"t" => {
                    self.reject_duplicate(&mut seen_text, "t")?;
                    run.text_attributes = self.text_attributes(&e)?;
                },
                (pos, Event::Start(e)) => run.extra_elements.push(self.capture(pos, &e)?),
                (pos, Event::Empty(_)) => run.extra_elements.push(self.capture_empty(pos)),
                (_, Event::Text(t)) => self.expect_whitespace(&t, "rPh")?,
                (_, Event::End(_)) => break,
                (_, Event::Eof) => return Err(self.unexpected_eof("rPh")),
                (_, other) => self.reject_content(&other, "rPh")?,
            }
        }

        if seen_text {
            Ok(run)
        } else {
            Err(self.missing_text("rPh"))
        }
    }

    fn parse_phonetic_properties(
        &mut self,
        start: &BytesStart<'_>,
        self_closing: bool,
    ) -> Result<PhoneticProperties> {
        let mut props = PhoneticProperties::default();

        for attr in self.attributes(start)? {
            match attr.name.as_str() {
                "fontId" => props.font_id = Some(self.parse_u32("fontId", &attr.value)?),
                "type" => props.kind = Some(attr.value),
                "alignment" => props.alignment = Some(attr.value),
                _ => props.extra_attributes.push(attr),
            }
        }

        if !self_closing {
            props.extra_elements = self.collect_extras("phoneticPr")?;
        }
        Ok(props)
    }

    /// Capture every child of an element the model treats as opaque, up to
    /// its end tag.
    fn collect_extras(&mut self, parent: &str) -> Result<Vec<RawXml>> {
        let mut elements = Vec::new();

        loop {
            match self.next()? {
                (pos, Event::Start(e)) => elements.push(self.capture(pos, &e)?),
                (pos, Event::Empty(_)) => elements.push(self.capture_empty(pos)),
                (_, Event::Text(t)) => self.expect_whitespace(&t, parent)?,
                (_, Event::End(_)) => return Ok(elements),
                (_, Event::Eof) => return Err(self.unexpected_eof(parent)),
                (_, other) => self.reject_content(&other, parent)?,
            }
        }
    }

    /// Collect the character data of a text-only element up to its end tag.
    fn read_text(&mut self, element: &str) -> Result<String> {
        let mut text = String::new();

        loop {
            match self.next()? {
                (_, Event::Text(t)) => text.push_str(&unescape_xml(self.utf8(&t)?)),
                (_, Event::CData(c)) => text.push_str(self.utf8(&c)?),
                (_, Event::GeneralRef(r)) => {
                    let name = self.utf8(&r)?;
                    let ch = resolve_entity(name)
                        .ok_or_else(|| self.error(format!("Unknown entity '&{};'", name)))?;
                    text.push(ch);
                },
                (_, Event::Start(e)) | (_, Event::Empty(e)) => {
                    return Err(self.unexpected_child(&e, element));
                },
                (_, Event::End(_)) => return Ok(text),
                (_, Event::Eof) => return Err(self.unexpected_eof(element)),
                _ => {},
            }
        }
    }

    /// Capture a non-empty element verbatim, consuming it up to its end tag.
    fn capture(&mut self, start: usize, e: &BytesStart<'_>) -> Result<RawXml> {
        self.skip_to_end(e)?;
        Ok(RawXml::new(&self.xml[start..self.position()]))
    }

    /// Capture a self-closing element that has just been read.
    fn capture_empty(&self, start: usize) -> RawXml {
        RawXml::new(&self.xml[start..self.position()])
    }

    fn skip_to_end(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let end = e.to_end().into_owned();
        self.reader.read_to_end(end.name()).map_err(|err| {
            self.error(format!(
                "Unclosed element <{}>: {}",
                qualified_name(e),
                err
            ))
        })?;
        Ok(())
    }

    fn attributes(&self, e: &BytesStart<'_>) -> Result<Vec<ExtraAttribute>> {
        let mut out = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| {
                self.error(format!(
                    "Malformed attribute on <{}>: {}",
                    qualified_name(e),
                    err
                ))
            })?;
            let name = self.utf8(attr.key.as_ref())?;
            let value = self.utf8(&attr.value)?;
            out.push(ExtraAttribute::new(name, unescape_attr(value)));
        }
        Ok(out)
    }

    /// Attributes of a `t` element; `xml:space` is recomputed on write.
    fn text_attributes(&self, e: &BytesStart<'_>) -> Result<Vec<ExtraAttribute>> {
        let mut attributes = self.attributes(e)?;
        attributes.retain(|attr| attr.name != "xml:space");
        Ok(attributes)
    }

    fn parse_u32(&self, attribute: &str, value: &str) -> Result<u32> {
        value.trim().parse::<u32>().map_err(|_| {
            self.error(format!(
                "Attribute '{}' must be an unsigned integer, got '{}'",
                attribute, value
            ))
        })
    }

    fn utf8<'b>(&self, bytes: &'b [u8]) -> Result<&'b str> {
        std::str::from_utf8(bytes).map_err(|e| self.error(format!("Invalid UTF-8: {}", e)))
    }

    fn expect_whitespace(&self, t: &BytesText<'_>, parent: &str) -> Result<()> {
        if t.iter().all(u8::is_ascii_whitespace) {
            Ok(())
        } else {
            Err(self.error(format!("Unexpected character data inside <{}>", parent)))
        }
    }

    /// Comments, processing instructions and declarations are ignored; any
    /// other content in an element-only container is rejected.
    fn reject_content(&self, event: &Event<'_>, parent: &str) -> Result<()> {
        match event {
            Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => Ok(()),
            _ => Err(self.error(format!("Unexpected content inside <{}>", parent))),
        }
    }

    fn reject_duplicate(&self, seen: &mut bool, element: &str) -> Result<()> {
        if std::mem::replace(seen, true) {
            Err(self.error(format!("Duplicate <{}> element", element)))
        } else {
            Ok(())
        }
    }

    fn reject_duplicate_plain(&self, plain: &Option<String>) -> Result<()> {
        if plain.is_some() {
            Err(self.error("Duplicate <t> element inside <text>"))
        } else {
            Ok(())
        }
    }

    fn unexpected_child(&self, e: &BytesStart<'_>, parent: &str) -> OoxmlError {
        self.error(format!(
            "Unexpected element <{}> inside <{}>",
            qualified_name(e),
            parent
        ))
    }

    fn missing_text(&self, element: &str) -> OoxmlError {
        self.error(format!("<{}> is missing its <t> element", element))
    }

    fn unexpected_eof(&self, element: &str) -> OoxmlError {
        self.error(format!("Unexpected end of part inside <{}>", element))
    }
}

fn qualified_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}
