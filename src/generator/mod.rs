//! Serializes an `Iflow` into the BPMN based `.iflw` document.

pub mod diagram;
pub mod iflow_xml;
pub mod properties;

use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::Result;

pub use iflow_xml::write_iflow;

pub(crate) type XmlWriter = Writer<Vec<u8>>;

pub(crate) fn start(writer: &mut XmlWriter, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
    let mut element = BytesStart::new(name);
    for attribute in attributes {
        element.push_attribute(*attribute);
    }
    writer.write_event(Event::Start(element))?;
    Ok(())
}

pub(crate) fn end(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub(crate) fn empty(writer: &mut XmlWriter, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
    let mut element = BytesStart::new(name);
    for attribute in attributes {
        element.push_attribute(*attribute);
    }
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

/// `<name>text</name>`, or `<name/>` for empty text. Only `<`, `>` and `&`
/// are escaped so quotes inside expressions stay readable.
pub(crate) fn text_element(writer: &mut XmlWriter, name: &str, text: &str, attributes: &[(&str, &str)]) -> Result<()> {
    if text.is_empty() {
        return empty(writer, name, attributes);
    }
    start(writer, name, attributes)?;
    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    end(writer, name)
}
