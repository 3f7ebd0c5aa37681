//! XML to tree conversion and back, built on `quick-xml` events.
//!
//! The reader is the well-formedness gate for the whole pipeline: any
//! syntax error or unbalanced document surfaces here, before the
//! normalizer ever sees a tree. `<!ENTITY>` declarations are never
//! expanded; unrecognized entity references degrade to their raw text.
//!
//! The writer is best-effort by contract — it exists to reconstruct
//! markup fragments the reader split apart, and degrades to an empty
//! string rather than failing the caller.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;
use thiserror::Error;

use super::{Node, ATTR_KEY, ATTR_PREFIX, TEXT_KEYS};
use crate::config::ParserConfig;

#[derive(Debug, Error)]
pub enum XmlTreeError {
    /// Source text is not syntactically valid XML.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// Element nesting exceeds the configured safety limit.
    #[error("element nesting exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    /// Open and close tags do not pair up across the document.
    #[error("unbalanced document structure")]
    Unbalanced,
}

struct OpenElement {
    name: String,
    attrs: Option<Node>,
    children: Vec<Node>,
}

/// Parses XML text into the generic tree shape.
///
/// Every element becomes a map from its tag name to a list of children;
/// attributes are collected under [`ATTR_KEY`] with [`ATTR_PREFIX`]-prefixed
/// names; text and CDATA become `#text`/`_cdata` maps. Comments, processing
/// instructions, and DOCTYPE are skipped. The root of the result is a list
/// so top-level navigation works the same way as everywhere else.
pub fn parse_xml(text: &str, options: &ParserConfig) -> Result<Node, XmlTreeError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut roots: Vec<Node> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if stack.len() + 1 > options.max_depth {
                    return Err(XmlTreeError::MaxDepthExceeded(options.max_depth));
                }
                let (name, attrs) = read_tag(&e, &reader, options)?;
                stack.push(OpenElement {
                    name,
                    attrs,
                    children: Vec::new(),
                });
            }
            Ok(Event::Empty(e)) => {
                let (name, attrs) = read_tag(&e, &reader, options)?;
                push_child(&mut stack, &mut roots, element_node(name, attrs, Vec::new()));
            }
            Ok(Event::End(_)) => {
                let open = stack.pop().ok_or(XmlTreeError::Unbalanced)?;
                push_child(
                    &mut stack,
                    &mut roots,
                    element_node(open.name, open.attrs, open.children),
                );
            }
            Ok(Event::Text(t)) => {
                let text = match t.unescape() {
                    Ok(s) => s.into_owned(),
                    // Unknown entity: keep the reference verbatim.
                    Err(_) => reader
                        .decoder()
                        .decode(&t)
                        .map(|s| s.into_owned())
                        .unwrap_or_default(),
                };
                if !text.is_empty() {
                    push_child(&mut stack, &mut roots, text_node("#text", text));
                }
            }
            Ok(Event::CData(t)) => {
                let text = reader
                    .decoder()
                    .decode(&t)
                    .map(|s| s.into_owned())
                    .unwrap_or_default();
                if !text.is_empty() {
                    push_child(&mut stack, &mut roots, text_node("_cdata", text));
                }
            }
            Ok(Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => return Err(XmlTreeError::Parse(e.to_string())),
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(XmlTreeError::Unbalanced);
    }
    Ok(Node::List(roots))
}

fn read_tag(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    options: &ParserConfig,
) -> Result<(String, Option<Node>), XmlTreeError> {
    let decoder = reader.decoder();
    let name_bytes = if options.strip_ns_prefix {
        e.local_name().as_ref().to_vec()
    } else {
        e.name().as_ref().to_vec()
    };
    let name = decoder
        .decode(&name_bytes)
        .map_err(|err| XmlTreeError::Parse(err.to_string()))?
        .into_owned();

    let mut attrs: Vec<(String, Node)> = Vec::new();
    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(err) => {
                tracing::warn!(tag = %name, error = %err, "Skipping malformed attribute");
                continue;
            }
        };
        let key = decoder
            .decode(attr.key.as_ref())
            .map_err(|err| XmlTreeError::Parse(err.to_string()))?
            .into_owned();
        let value = match attr.decode_and_unescape_value(decoder) {
            Ok(v) => v.into_owned(),
            Err(_) => decoder
                .decode(&attr.value)
                .map(|s| s.into_owned())
                .unwrap_or_default(),
        };
        attrs.push((format!("{ATTR_PREFIX}{key}"), Node::Text(value)));
    }

    let attrs = if attrs.is_empty() {
        None
    } else {
        Some(Node::Map(attrs))
    };
    Ok((name, attrs))
}

fn element_node(name: String, attrs: Option<Node>, children: Vec<Node>) -> Node {
    let mut pairs = vec![(name, Node::List(children))];
    if let Some(attrs) = attrs {
        pairs.push((ATTR_KEY.to_string(), attrs));
    }
    Node::Map(pairs)
}

fn text_node(key: &str, text: String) -> Node {
    Node::Map(vec![(key.to_string(), Node::Text(text))])
}

fn push_child(stack: &mut [OpenElement], roots: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(open) => open.children.push(node),
        None => roots.push(node),
    }
}

/// Serializes a tree back to XML text.
///
/// Best-effort: any serialization failure yields an empty string rather
/// than an error, since callers use this only to reconstruct fragments.
pub fn write_xml(node: &Node) -> String {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    match write_node(&mut writer, node) {
        Ok(()) => String::from_utf8(writer.into_inner().into_inner()).unwrap_or_default(),
        Err(_) => String::new(),
    }
}

fn write_node<W: std::io::Write>(
    writer: &mut Writer<W>,
    node: &Node,
) -> Result<(), quick_xml::Error> {
    match node {
        Node::Text(text) => {
            writer.write_event(Event::Text(BytesText::new(text)))?;
            Ok(())
        }
        Node::List(children) => {
            for child in children {
                write_node(writer, child)?;
            }
            Ok(())
        }
        Node::Map(pairs) => {
            let attrs = node.get(ATTR_KEY);
            for (key, value) in pairs {
                if key == ATTR_KEY {
                    continue;
                }
                if TEXT_KEYS.contains(&key.as_str()) {
                    write_node(writer, value)?;
                    continue;
                }
                let mut start = BytesStart::new(key.as_str());
                if let Some(Node::Map(attr_pairs)) = attrs {
                    for (attr_key, attr_value) in attr_pairs {
                        if let Node::Text(v) = attr_value {
                            let name =
                                attr_key.strip_prefix(ATTR_PREFIX).unwrap_or(attr_key.as_str());
                            start.push_attribute((name, v.as_str()));
                        }
                    }
                }
                if value.is_empty_list() {
                    writer.write_event(Event::Empty(start))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                    write_node(writer, value)?;
                    writer.write_event(Event::End(BytesEnd::new(key.as_str())))?;
                }
            }
            Ok(())
        }
    }
}
