use crate::error::PipelineError;
use crate::provider::TextTransform;
use crate::textutil::{split_words, word_count};

use super::xml::{is_text_element, parse_part, serialize_part, XmlEvent};

/// Rewrites the paragraph text of one markup part.
///
/// Each `w:p` paragraph is handled as one unit: its non-empty `w:t` texts
/// are joined, transformed once, and the replacement is redistributed
/// word-by-word across the original text nodes in document order. Every
/// run keeps its position and formatting markup; only text-node contents
/// change, and that is checked against a structure fingerprint before
/// serializing.
pub fn rewrite_part(
    xml: &[u8],
    part_name: &str,
    target_lang: &str,
    provider: &dyn TextTransform,
) -> anyhow::Result<Vec<u8>> {
    let mut part = parse_part(part_name, xml).map_err(|e| PipelineError::MalformedPart {
        part: part_name.to_string(),
        source: e.into(),
    })?;

    for paragraph in collect_paragraphs(&part.events) {
        rewrite_paragraph(&mut part.events, &paragraph, target_lang, provider)?;
    }

    part.verify_structure_unchanged()?;
    Ok(serialize_part(&part))
}

/// Event indices of the non-empty text nodes of one paragraph, in document
/// order. Text nodes at any depth count (table cells, nested runs).
fn collect_paragraphs(events: &[XmlEvent]) -> Vec<Vec<usize>> {
    let mut paragraphs: Vec<Vec<usize>> = Vec::new();
    let mut current: Option<Vec<usize>> = None;
    let mut in_text_element = false;

    for (idx, ev) in events.iter().enumerate() {
        match ev {
            XmlEvent::Start { name, .. } => {
                if name == "w:p" {
                    current = Some(Vec::new());
                    in_text_element = false;
                } else if is_text_element(name) && current.is_some() {
                    in_text_element = true;
                }
            }
            XmlEvent::End { name } => {
                if name == "w:p" {
                    if let Some(nodes) = current.take() {
                        paragraphs.push(nodes);
                    }
                } else if is_text_element(name) {
                    in_text_element = false;
                }
            }
            XmlEvent::Text { text } => {
                if in_text_element && !text.is_empty() {
                    if let Some(nodes) = current.as_mut() {
                        nodes.push(idx);
                    }
                }
            }
            _ => {}
        }
    }
    paragraphs
}

fn rewrite_paragraph(
    events: &mut [XmlEvent],
    text_nodes: &[usize],
    target_lang: &str,
    provider: &dyn TextTransform,
) -> anyhow::Result<()> {
    let mut joined = String::new();
    for &idx in text_nodes {
        if let XmlEvent::Text { text } = &events[idx] {
            joined.push_str(text);
            joined.push(' ');
        }
    }
    let source = joined.trim();
    if source.is_empty() {
        // Nothing visible to rewrite; leave the paragraph untouched and do
        // not spend a provider call on it.
        return Ok(());
    }

    let replacement = provider
        .transform(source, target_lang)
        .map_err(|e| PipelineError::TransformFailure(e.into()))?;
    let words = split_words(&replacement);

    // Each node takes as many replacement words as it originally held.
    // A short replacement leaves trailing nodes empty; a long one has its
    // tail dropped. Both are silent by contract.
    let mut next = 0usize;
    for &idx in text_nodes {
        let take = match &events[idx] {
            XmlEvent::Text { text } => word_count(text),
            _ => 0,
        };
        let slice = if next < words.len() {
            words[next..(next + take).min(words.len())].join(" ")
        } else {
            String::new()
        };
        if let XmlEvent::Text { text } = &mut events[idx] {
            *text = slice;
        }
        next += take;
    }
    Ok(())
}
