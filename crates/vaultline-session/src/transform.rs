// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decrypted transaction content to a flat JSON object.
//!
//! Plaintext is a 6-byte header followed by a raw DEFLATE stream of XML:
//!
//! ```xml
//! <root><KWAuthentifiant>
//!   <KWDataItem key="Login"><![CDATA[alice]]></KWDataItem>
//! </KWAuthentifiant></root>
//! ```

use std::io::Read;

use flate2::read::DeflateDecoder;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::{Map, Value};
use tracing::debug;

/// Bytes preceding the compressed stream.
pub const CONTENT_HEADER_LEN: usize = 6;

const ROOT: &[u8] = b"root";
const AUTHENTIFIANT: &[u8] = b"KWAuthentifiant";
const SECURE_NOTE: &[u8] = b"KWSecureNote";

/// Full pipeline for one decrypted transaction. Content that does not
/// inflate or parse yields an empty object.
pub fn transaction_to_json(plaintext: &[u8]) -> Map<String, Value> {
    let Some(compressed) = plaintext.get(CONTENT_HEADER_LEN..) else {
        debug!(len = plaintext.len(), "transaction shorter than its header");
        return Map::new();
    };
    match inflate_raw(compressed) {
        Ok(xml) => xml_to_json(&xml),
        Err(e) => {
            debug!(error = %e, "transaction content does not inflate");
            Map::new()
        }
    }
}

/// Inflates a raw (headerless) DEFLATE stream.
pub fn inflate_raw(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(compressed.len() * 4);
    DeflateDecoder::new(compressed).read_to_end(&mut out)?;
    Ok(out)
}

/// Maps the `key` attribute of each child of the first `KWAuthentifiant`
/// (or, failing that, `KWSecureNote`) under `root` to the child's text.
/// Later duplicates of a key win.
pub fn xml_to_json(xml: &[u8]) -> Map<String, Value> {
    match collect_items(xml) {
        Ok(items) => items.authentifiant.or(items.secure_note).unwrap_or_default(),
        Err(e) => {
            debug!(error = %e, "transaction XML does not parse");
            Map::new()
        }
    }
}

#[derive(Default)]
struct Items {
    authentifiant: Option<Map<String, Value>>,
    secure_note: Option<Map<String, Value>>,
}

impl Items {
    fn slot(&mut self, kind: ItemKind) -> &mut Option<Map<String, Value>> {
        match kind {
            ItemKind::Authentifiant => &mut self.authentifiant,
            ItemKind::SecureNote => &mut self.secure_note,
        }
    }
}

#[derive(Clone, Copy)]
enum ItemKind {
    Authentifiant,
    SecureNote,
}

impl ItemKind {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            AUTHENTIFIANT => Some(Self::Authentifiant),
            SECURE_NOTE => Some(Self::SecureNote),
            _ => None,
        }
    }
}

// Levels: 1 = root, 2 = item, 3 = field.
const ITEM_DEPTH: usize = 2;
const FIELD_DEPTH: usize = 3;

/// A field being read: its key and the first non-blank text inside it.
struct Field {
    key: Option<String>,
    value: Option<String>,
}

fn collect_items(xml: &[u8]) -> Result<Items, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut items = Items::default();
    let mut depth = 0usize;
    let mut in_root = false;
    let mut item: Option<(ItemKind, Map<String, Value>)> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                depth += 1;
                match depth {
                    1 => in_root = e.name().as_ref() == ROOT,
                    ITEM_DEPTH if in_root => {
                        item = ItemKind::from_name(e.name().as_ref())
                            .filter(|kind| items.slot(*kind).is_none())
                            .map(|kind| (kind, Map::new()));
                    }
                    FIELD_DEPTH if item.is_some() => {
                        field = Some(Field {
                            key: key_attribute(&e)?,
                            value: None,
                        });
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => match depth + 1 {
                ITEM_DEPTH if in_root => {
                    if let Some(kind) = ItemKind::from_name(e.name().as_ref()) {
                        items.slot(kind).get_or_insert_with(Map::new);
                    }
                }
                FIELD_DEPTH => {
                    if let Some((_, map)) = item.as_mut()
                        && let Some(key) = key_attribute(&e)?
                    {
                        map.insert(key, Value::String(String::new()));
                    }
                }
                _ => {}
            },
            Event::Text(text) if depth == FIELD_DEPTH => {
                if let Some(field) = field.as_mut()
                    && field.value.is_none()
                {
                    let text = text.unescape()?;
                    if !text.trim().is_empty() {
                        field.value = Some(text.into_owned());
                    }
                }
            }
            Event::CData(data) if depth == FIELD_DEPTH => {
                if let Some(field) = field.as_mut()
                    && field.value.is_none()
                {
                    field.value = Some(String::from_utf8_lossy(&data.into_inner()).into_owned());
                }
            }
            Event::End(_) => {
                match depth {
                    FIELD_DEPTH => {
                        if let Some(Field {
                            key: Some(key),
                            value,
                        }) = field.take()
                            && let Some((_, map)) = item.as_mut()
                        {
                            map.insert(key, Value::String(value.unwrap_or_default()));
                        }
                    }
                    ITEM_DEPTH => {
                        if let Some((kind, map)) = item.take() {
                            *items.slot(kind) = Some(map);
                        }
                    }
                    1 => in_root = false,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

fn key_attribute(
    element: &quick_xml::events::BytesStart<'_>,
) -> Result<Option<String>, quick_xml::Error> {
    let Some(attribute) = element.try_get_attribute("key")? else {
        return Ok(None);
    };
    Ok(Some(attribute.unescape_value()?.into_owned()))
}
