//! Opaque carriers for markup the comment schema does not interpret.
//!
//! Attributes and child elements that are not part of the modeled schema
//! (namespace declarations, `mc:Ignorable`, `xr:uid`, `extLst`, ...) are kept
//! here so that a parsed part can be written back without losing them.

use std::fmt::Write as FmtWrite;

use crate::common::xml::escape_attr;
use crate::ooxml::error::Result;

/// An attribute the schema layer does not interpret.
///
/// `value` holds the unescaped attribute text; it is escaped again on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraAttribute {
    /// Qualified attribute name as it appeared (e.g. `xmlns:mc`, `xr:uid`)
    pub name: String,
    /// Unescaped attribute value
    pub value: String,
}

impl ExtraAttribute {
    /// Create a new attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A complete XML element captured verbatim, start tag through end tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawXml(String);

impl RawXml {
    /// Wrap an already well-formed XML fragment.
    pub fn new(xml: impl Into<String>) -> Self {
        Self(xml.into())
    }

    /// The captured markup.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Attributes and uninterpreted children of a list container such as
/// `authors` or `commentList`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerExtras {
    /// Attributes of the container element
    pub attributes: Vec<ExtraAttribute>,
    /// Unknown children, written after the known items
    pub elements: Vec<RawXml>,
}

/// Write `name="value"` pairs, preceded by a space each.
pub(crate) fn write_attributes(xml: &mut String, attributes: &[ExtraAttribute]) -> Result<()> {
    for attr in attributes {
        write!(xml, r#" {}="{}""#, attr.name, escape_attr(&attr.value))?;
    }
    Ok(())
}

/// Write raw elements back in the order they were captured.
pub(crate) fn write_raw(xml: &mut String, elements: &[RawXml]) {
    for element in elements {
        xml.push_str(element.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_attributes_escapes_values() {
        let mut xml = String::new();
        write_attributes(
            &mut xml,
            &[
                ExtraAttribute::new("xr:uid", "{A&B}"),
                ExtraAttribute::new("mc:Ignorable", "xr"),
            ],
        )
        .unwrap();
        assert_eq!(xml, r#" xr:uid="{A&amp;B}" mc:Ignorable="xr""#);
    }

    #[test]
    fn test_write_attributes_keeps_whitespace() {
        let mut xml = String::new();
        write_attributes(&mut xml, &[ExtraAttribute::new("x:note", "a\nb\tc")]).unwrap();
        assert_eq!(xml, r#" x:note="a&#10;b&#9;c""#);
    }

    #[test]
    fn test_write_raw_keeps_order() {
        let mut xml = String::new();
        write_raw(
            &mut xml,
            &[RawXml::new("<a/>"), RawXml::new("<b>x</b>")],
        );
        assert_eq!(xml, "<a/><b>x</b>");
    }
}
