// 📄 XML Decoder
// Turns the TIPS XML document into a generic key/value tree (RawRecord).
//
// Conventions:
// - element with no content      → RawValue::Null
// - element with only text       → RawValue::Text
// - element with children        → RawValue::Node
// - repeated sibling elements    → RawValue::List (document order)
// - attributes                   → "@name" keys
// - text next to children/attrs  → "#text" key

use crate::error::NormalizeError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ============================================================================
// RAW TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Text(String),
    Node(RawRecord),
    List(Vec<RawValue>),
}

impl RawValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&RawRecord> {
        match self {
            RawValue::Node(record) => Some(record),
            _ => None,
        }
    }

    /// JSON view with keys left exactly as the upstream spelled them
    pub fn to_json(&self) -> Value {
        match self {
            RawValue::Null => Value::Null,
            RawValue::Text(s) => Value::String(s.clone()),
            RawValue::Node(record) => Value::Object(record.to_json_map()),
            RawValue::List(items) => Value::Array(items.iter().map(RawValue::to_json).collect()),
        }
    }
}

/// Fields of one decoded element, addressed by upstream name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    /// Insert a field; a second value under the same key turns it into a list
    pub fn insert(&mut self, key: String, value: RawValue) {
        match self.fields.remove(&key) {
            None => {
                self.fields.insert(key, value);
            }
            Some(RawValue::List(mut items)) => {
                items.push(value);
                self.fields.insert(key, RawValue::List(items));
            }
            Some(existing) => {
                self.fields.insert(key, RawValue::List(vec![existing, value]));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json_map(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

// ============================================================================
// DECODER
// ============================================================================

struct Frame {
    name: String,
    children: RawRecord,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart) -> Result<Self, NormalizeError> {
        let name = utf8(start.name().as_ref())?;
        let mut children = RawRecord::new();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| NormalizeError::MalformedXml(e.to_string()))?;
            let key = format!("@{}", utf8(attr.key.as_ref())?);
            let value = attr
                .unescape_value()
                .map_err(|e| NormalizeError::MalformedXml(e.to_string()))?;
            children.insert(key, RawValue::Text(value.into_owned()));
        }

        Ok(Frame {
            name,
            children,
            text: String::new(),
        })
    }

    fn close(self) -> (String, RawValue) {
        let text = self.text.trim().to_string();
        let value = if self.children.is_empty() {
            if text.is_empty() {
                RawValue::Null
            } else {
                RawValue::Text(text)
            }
        } else {
            let mut children = self.children;
            if !text.is_empty() {
                children.insert("#text".to_string(), RawValue::Text(text));
            }
            RawValue::Node(children)
        };
        (self.name, value)
    }
}

fn utf8(bytes: &[u8]) -> Result<String, NormalizeError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| NormalizeError::MalformedXml(e.to_string()))
}

/// Decode an XML document into a record holding its single root element
pub fn parse_document(xml: &str) -> Result<RawRecord, NormalizeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root = RawRecord::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| NormalizeError::MalformedXml(format!("at byte {}: {}", reader.buffer_position(), e)))?;

        match event {
            Event::Start(start) => {
                if stack.is_empty() && !root.is_empty() {
                    return Err(NormalizeError::MalformedXml("multiple root elements".to_string()));
                }
                stack.push(Frame::open(&start)?);
            }
            Event::Empty(start) => {
                if stack.is_empty() && !root.is_empty() {
                    return Err(NormalizeError::MalformedXml("multiple root elements".to_string()));
                }
                let (name, value) = Frame::open(&start)?.close();
                attach(&mut stack, &mut root, name, value);
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| NormalizeError::MalformedXml("unexpected closing tag".to_string()))?;
                let (name, value) = frame.close();
                attach(&mut stack, &mut root, name, value);
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| NormalizeError::MalformedXml(e.to_string()))?;
                match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(NormalizeError::MalformedXml(
                            "text outside of the root element".to_string(),
                        ))
                    }
                }
            }
            Event::CData(cdata) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(frame) = stack.last() {
        return Err(NormalizeError::MalformedXml(format!("unclosed element <{}>", frame.name)));
    }
    if root.is_empty() {
        return Err(NormalizeError::MalformedXml("document has no root element".to_string()));
    }

    Ok(root)
}

fn attach(stack: &mut [Frame], root: &mut RawRecord, name: String, value: RawValue) {
    match stack.last_mut() {
        Some(parent) => parent.children.insert(name, value),
        None => root.insert(name, value),
    }
}
