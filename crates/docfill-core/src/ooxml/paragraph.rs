//! Paragraph text as seen by readers of a `w:p` element
//!
//! Reading concatenates the runs of the paragraph (direct runs and runs inside
//! hyperlinks). Writing keeps `w:pPr` and replaces everything else with a
//! single unformatted run.

use super::xml::{XmlElement, XmlNode};

/// Text of a paragraph element
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut text = String::new();
    for child in paragraph.child_elements() {
        if child.is(b"r") {
            push_run_text(child, &mut text);
        } else if child.is(b"hyperlink") {
            for run in child.children_named(b"r") {
                push_run_text(run, &mut text);
            }
        }
    }
    text
}

fn push_run_text(run: &XmlElement, out: &mut String) {
    for item in run.child_elements() {
        match item.local_name() {
            b"t" => out.push_str(&item.text()),
            b"tab" | b"ptab" => out.push('\t'),
            b"cr" => out.push('\n'),
            b"br" => {
                // Page and column breaks carry no text
                let kind = item.attribute(b"type");
                if matches!(kind.as_deref(), None | Some("textWrapping")) {
                    out.push('\n');
                }
            }
            b"noBreakHyphen" => out.push('-'),
            _ => {}
        }
    }
}

/// Replace the content of a paragraph with `text`.
///
/// Paragraph properties survive, runs (and their formatting), bookmarks and
/// any other inline content do not.
pub fn set_paragraph_text(paragraph: &mut XmlElement, text: &str) {
    paragraph
        .children_mut()
        .retain(|node| matches!(node, XmlNode::Element(el) if el.is(b"pPr")));

    if text.is_empty() {
        return;
    }

    let mut run = XmlElement::new(paragraph.sibling_name("r"));
    let mut pending = String::new();

    for c in text.chars() {
        match c {
            '\t' => {
                flush_text(&mut run, &mut pending, paragraph);
                run.push_element(XmlElement::new(paragraph.sibling_name("tab")));
            }
            '\n' | '\r' => {
                flush_text(&mut run, &mut pending, paragraph);
                run.push_element(XmlElement::new(paragraph.sibling_name("br")));
            }
            _ => pending.push(c),
        }
    }
    flush_text(&mut run, &mut pending, paragraph);

    paragraph.push_element(run);
}

fn flush_text(run: &mut XmlElement, pending: &mut String, paragraph: &XmlElement) {
    if pending.is_empty() {
        return;
    }

    let mut t = XmlElement::new(paragraph.sibling_name("t"));
    if pending.starts_with(char::is_whitespace) || pending.ends_with(char::is_whitespace) {
        t.push_attribute("xml:space", "preserve");
    }
    t.push_text(pending);
    run.push_element(t);
    pending.clear();
}
