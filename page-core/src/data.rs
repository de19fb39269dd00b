//! JSON, CSV and XML helpers used to load data sources.
//!
//! These are the interpreted implementations behind the acceleration
//! dispatcher; a native module must produce the same values.

use std::io::Cursor;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::DataError;

/// Key under which element text is stored when the element also has
/// attributes or children.
pub const XML_TEXT_KEY: &str = "_text";

/// Check whether a string parses as JSON.
#[must_use]
pub fn validate_json(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// Re-indent a JSON document with `indent` spaces per level.
///
/// # Errors
///
/// Returns [`DataError::Json`] if the input is not JSON.
pub fn format_json(text: &str, indent: usize) -> Result<String, DataError> {
    let value: Value = serde_json::from_str(text)?;
    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|e| DataError::Mapping(e.to_string()))
}

/// Strip all insignificant whitespace from a JSON document.
///
/// # Errors
///
/// Returns [`DataError::Json`] if the input is not JSON.
pub fn minify_json(text: &str) -> Result<String, DataError> {
    let value: Value = serde_json::from_str(text)?;
    Ok(serde_json::to_string(&value)?)
}

/// Parse CSV with a header row into an array of objects keyed by header.
///
/// Rows may be shorter or longer than the header; extra fields are dropped
/// and missing ones are omitted.
///
/// # Errors
///
/// Returns [`DataError::Csv`] if the input cannot be read.
pub fn parse_csv(text: &str) -> Result<Value, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(text.as_bytes()));
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, field)| (header.clone(), Value::String(field.to_string())))
            .collect();
        rows.push(Value::Object(row));
    }
    tracing::debug!("Parsed CSV: {} columns, {} rows", headers.len(), rows.len());
    Ok(Value::Array(rows))
}

struct XmlFrame {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl XmlFrame {
    fn open(start: &BytesStart<'_>) -> Result<Self, DataError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| DataError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            fields.insert(key, Value::String(value));
        }
        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    fn close(mut self) -> (String, Value) {
        let text = self.text.trim();
        let value = if self.fields.is_empty() {
            Value::String(text.to_string())
        } else {
            if !text.is_empty() {
                self.fields
                    .insert(XML_TEXT_KEY.to_string(), Value::String(text.to_string()));
            }
            Value::Object(self.fields)
        };
        (self.name, value)
    }
}

fn insert_child(fields: &mut Map<String, Value>, name: String, value: Value) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            fields.insert(name, value);
        }
    }
}

/// Parse XML into nested JSON objects.
///
/// Attributes become string keys, element text becomes the bare string value
/// (or `_text` when the element also has attributes or children), and
/// repeated sibling tags collapse into arrays. The result is an object keyed
/// by the root element name.
///
/// # Errors
///
/// Returns [`DataError::Xml`] for malformed markup.
pub fn parse_xml(text: &str) -> Result<Value, DataError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut root = Map::new();
    let mut stack: Vec<XmlFrame> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(XmlFrame::open(&start)?),
            Event::Empty(start) => {
                let (name, value) = XmlFrame::open(&start)?.close();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.fields, name, value),
                    None => insert_child(&mut root, name, value),
                }
            }
            Event::Text(content) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&content.unescape()?);
                }
            }
            Event::CData(content) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&content.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| DataError::Xml("unexpected closing tag".to_string()))?;
                let (name, value) = frame.close();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.fields, name, value),
                    None => insert_child(&mut root, name, value),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DataError::Xml(format!("unclosed element <{}>", open.name)));
    }
    Ok(Value::Object(root))
}
