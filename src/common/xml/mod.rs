//! XML text helpers shared by the part readers and writers.

mod escape;

pub use escape::{escape_attr, escape_xml, needs_space_preserve, resolve_entity, unescape_attr, unescape_xml};
