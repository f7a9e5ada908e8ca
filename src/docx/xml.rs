use anyhow::{anyhow, Context};
use quick_xml::events::Event;
use quick_xml::Reader;
use sha2::{Digest, Sha256};

/// One parsed markup event.
///
/// Attribute values keep the raw, already-escaped source bytes. Unescaping
/// and re-escaping them would normalize character references (e.g. `&#xD;`
/// in VML `o:gfxdata` payloads) and corrupt the round-trip, so the writer
/// emits them verbatim.
#[derive(Clone, Debug)]
pub enum XmlEvent {
    Decl {
        version: String,
        encoding: Option<String>,
        standalone: Option<String>,
    },
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Empty {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
    CData {
        text: String,
    },
    Comment {
        text: String,
    },
    PI {
        content: String,
    },
    DocType {
        text: String,
    },
}

/// A parsed markup part plus a fingerprint of everything that must survive
/// rewriting: all events except the text inside `w:t` elements.
#[derive(Clone)]
pub struct XmlPart {
    pub name: String,
    pub events: Vec<XmlEvent>,
    baseline: String,
}

impl XmlPart {
    /// Checks that nothing outside `w:t` text content changed since parse.
    pub fn verify_structure_unchanged(&self) -> anyhow::Result<()> {
        let current = structure_fingerprint(&self.events);
        if current != self.baseline {
            return Err(anyhow!(
                "non-text structure changed in {} (baseline={} current={})",
                self.name,
                self.baseline,
                current
            ));
        }
        Ok(())
    }
}

/// The only element whose text content this system rewrites.
pub fn is_text_element(name: &str) -> bool {
    name == "w:t"
}

pub fn parse_part(name: &str, xml: &[u8]) -> anyhow::Result<XmlPart> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut events: Vec<XmlEvent> = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).context("read xml event")? {
            Event::Eof => break,
            Event::Decl(d) => events.push(XmlEvent::Decl {
                version: owned(d.version().context("xml decl version")?),
                encoding: d.encoding().map(|r| r.map(owned)).transpose().unwrap_or(None),
                standalone: d
                    .standalone()
                    .map(|r| r.map(owned))
                    .transpose()
                    .unwrap_or(None),
            }),
            Event::Start(s) => {
                let mut attrs = Vec::new();
                for a in s.attributes() {
                    let a = a.context("xml attribute")?;
                    attrs.push((owned(a.key.as_ref()), owned(a.value.as_ref())));
                }
                events.push(XmlEvent::Start {
                    name: owned(s.name().as_ref()),
                    attrs,
                });
            }
            Event::Empty(s) => {
                let mut attrs = Vec::new();
                for a in s.attributes() {
                    let a = a.context("xml attribute")?;
                    attrs.push((owned(a.key.as_ref()), owned(a.value.as_ref())));
                }
                events.push(XmlEvent::Empty {
                    name: owned(s.name().as_ref()),
                    attrs,
                });
            }
            Event::End(e) => events.push(XmlEvent::End {
                name: owned(e.name().as_ref()),
            }),
            Event::Text(t) => events.push(XmlEvent::Text {
                text: t.unescape().context("unescape text")?.into_owned(),
            }),
            Event::CData(t) => events.push(XmlEvent::CData {
                text: owned(t.into_inner()),
            }),
            Event::Comment(t) => events.push(XmlEvent::Comment {
                text: owned(t.into_inner()),
            }),
            Event::PI(t) => {
                let target = owned(t.target());
                let content = owned(t.content());
                events.push(XmlEvent::PI {
                    content: format!("{target}{content}"),
                });
            }
            Event::DocType(t) => events.push(XmlEvent::DocType {
                text: owned(t.into_inner()),
            }),
        }
    }

    let baseline = structure_fingerprint(&events);
    Ok(XmlPart {
        name: name.to_string(),
        events,
        baseline,
    })
}

pub fn serialize_part(part: &XmlPart) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    for ev in &part.events {
        write_event(&mut out, ev);
    }
    out
}

fn write_event(out: &mut Vec<u8>, ev: &XmlEvent) {
    match ev {
        XmlEvent::Decl {
            version,
            encoding,
            standalone,
        } => {
            out.extend_from_slice(b"<?xml version=\"");
            out.extend_from_slice(version.as_bytes());
            out.push(b'"');
            if let Some(enc) = encoding {
                out.extend_from_slice(b" encoding=\"");
                out.extend_from_slice(enc.as_bytes());
                out.push(b'"');
            }
            if let Some(sa) = standalone {
                out.extend_from_slice(b" standalone=\"");
                out.extend_from_slice(sa.as_bytes());
                out.push(b'"');
            }
            out.extend_from_slice(b"?>");
        }
        XmlEvent::Start { name, attrs } => write_tag(out, name, attrs, false),
        XmlEvent::Empty { name, attrs } => write_tag(out, name, attrs, true),
        XmlEvent::End { name } => {
            out.extend_from_slice(b"</");
            out.extend_from_slice(name.as_bytes());
            out.push(b'>');
        }
        XmlEvent::Text { text } => write_escaped(out, text),
        XmlEvent::CData { text } => {
            out.extend_from_slice(b"<![CDATA[");
            out.extend_from_slice(text.as_bytes());
            out.extend_from_slice(b"]]>");
        }
        XmlEvent::Comment { text } => {
            out.extend_from_slice(b"<!--");
            out.extend_from_slice(text.as_bytes());
            out.extend_from_slice(b"-->");
        }
        XmlEvent::PI { content } => {
            out.extend_from_slice(b"<?");
            out.extend_from_slice(content.as_bytes());
            out.extend_from_slice(b"?>");
        }
        XmlEvent::DocType { text } => {
            out.extend_from_slice(b"<!DOCTYPE");
            out.extend_from_slice(text.as_bytes());
            out.push(b'>');
        }
    }
}

fn write_tag(out: &mut Vec<u8>, name: &str, attrs: &[(String, String)], empty: bool) {
    out.push(b'<');
    out.extend_from_slice(name.as_bytes());
    // Attribute values are raw source bytes; do not escape again.
    for (k, v) in attrs {
        out.push(b' ');
        out.extend_from_slice(k.as_bytes());
        out.extend_from_slice(b"=\"");
        out.extend_from_slice(v.as_bytes());
        out.push(b'"');
    }
    if empty {
        out.extend_from_slice(b"/>");
    } else {
        out.push(b'>');
    }
}

fn write_escaped(out: &mut Vec<u8>, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.extend_from_slice(b"&amp;"),
            '<' => out.extend_from_slice(b"&lt;"),
            '>' => out.extend_from_slice(b"&gt;"),
            _ => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
}

fn owned(bytes: impl AsRef<[u8]>) -> String {
    String::from_utf8_lossy(bytes.as_ref()).into_owned()
}

fn structure_fingerprint(events: &[XmlEvent]) -> String {
    let mut hasher = Sha256::new();
    let mut open: Vec<&str> = Vec::new();

    for ev in events {
        match ev {
            XmlEvent::Start { name, attrs } => {
                hash_tag(&mut hasher, name, attrs);
                open.push(name);
            }
            XmlEvent::Empty { name, attrs } => {
                hash_tag(&mut hasher, name, attrs);
                hasher.update(b"E:");
                hasher.update(name.as_bytes());
                hasher.update(b"\n");
            }
            XmlEvent::End { name } => {
                hasher.update(b"E:");
                hasher.update(name.as_bytes());
                hasher.update(b"\n");
                open.pop();
            }
            XmlEvent::Text { text } => {
                // Text inside a text element is the one mutable payload.
                if open.last().is_some_and(|n| is_text_element(n)) {
                    continue;
                }
                hasher.update(b"T:");
                hasher.update(text.as_bytes());
                hasher.update(b"\n");
            }
            XmlEvent::Decl {
                version,
                encoding,
                standalone,
            } => {
                hasher.update(b"D:");
                hasher.update(version.as_bytes());
                hasher.update(b"|");
                hasher.update(encoding.as_deref().unwrap_or("").as_bytes());
                hasher.update(b"|");
                hasher.update(standalone.as_deref().unwrap_or("").as_bytes());
                hasher.update(b"\n");
            }
            XmlEvent::CData { text } => {
                hasher.update(b"C:");
                hasher.update(text.as_bytes());
                hasher.update(b"\n");
            }
            XmlEvent::Comment { text } => {
                hasher.update(b"M:");
                hasher.update(text.as_bytes());
                hasher.update(b"\n");
            }
            XmlEvent::PI { content } => {
                hasher.update(b"P:");
                hasher.update(content.as_bytes());
                hasher.update(b"\n");
            }
            XmlEvent::DocType { text } => {
                hasher.update(b"Y:");
                hasher.update(text.as_bytes());
                hasher.update(b"\n");
            }
        }
    }
    hex::encode(hasher.finalize())
}

fn hash_tag(hasher: &mut Sha256, name: &str, attrs: &[(String, String)]) {
    hasher.update(b"S:");
    hasher.update(name.as_bytes());
    hasher.update(b"|");
    for (k, v) in attrs {
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
        hasher.update(b";");
    }
    hasher.update(b"\n");
}
