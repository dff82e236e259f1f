//! Minimal XML support for the Reg-RWS payloads and responses.
//!
//! Writing is done by hand so that escaping stays under our control;
//! reading sits on top of quick-xml events. Element names on the wire may
//! carry namespace prefixes (`ns5:asNumber`), so all matching here is done
//! on the local part only.

use std::fmt;

use quick_xml::events::Event;


//------------ Writer --------------------------------------------------------

/// Writes a single XML document into an in-memory string.
pub struct Writer {
    buf: String,
}

impl Writer {
    pub fn new() -> Self {
        Writer { buf: String::new() }
    }

    /// Opens an element.
    pub fn start(&mut self, tag: &str) {
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push('>');
    }

    /// Opens an element carrying an `xmlns` attribute.
    pub fn start_with_ns(&mut self, tag: &str, ns: &str) {
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push_str(" xmlns=\"");
        push_escaped(&mut self.buf, ns);
        self.buf.push_str("\">");
    }

    /// Closes an element.
    pub fn end(&mut self, tag: &str) {
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push('>');
    }

    /// Writes an element holding only character data.
    pub fn text_element(&mut self, tag: &str, text: &str) {
        self.start(tag);
        push_escaped(&mut self.buf, text);
        self.end(tag);
    }

    /// Finishes the document.
    pub fn into_string(self) -> String {
        self.buf
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

fn push_escaped(buf: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '"' => buf.push_str("&quot;"),
            _ => buf.push(ch),
        }
    }
}


//------------ Reading helpers ------------------------------------------------

/// Returns whether the body parses as an XML document with a root element.
pub fn is_well_formed(body: &str) -> bool {
    let mut reader = quick_xml::Reader::from_str(body);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut elements = 0usize;
    loop {
        match reader.read_event(&mut buf) {
            Ok(Event::Start(_)) | Ok(Event::Empty(_)) => elements += 1,
            Ok(Event::Eof) => return elements > 0,
            Ok(_) => {}
            Err(_) => return false,
        }
        buf.clear();
    }
}

/// Collects the character data of every element with the given local name.
///
/// Texts are returned in document order. Whitespace around the character
/// data is trimmed.
pub fn element_texts(body: &str, local: &[u8]) -> Result<Vec<String>, Error> {
    let mut reader = quick_xml::Reader::from_str(body);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut texts = Vec::new();
    let mut current: Option<String> = None;
    loop {
        match reader.read_event(&mut buf).map_err(Error::Parse)? {
            Event::Start(start) if local_part(start.name()) == local => {
                current = Some(String::new());
            }
            Event::Text(text) => {
                if let Some(value) = current.as_mut() {
                    value.push_str(
                        &text.unescape_and_decode(&reader)
                            .map_err(Error::Parse)?,
                    );
                }
            }
            Event::End(end) if local_part(end.name()) == local => {
                if let Some(value) = current.take() {
                    texts.push(value.trim().to_string());
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(texts)
}

/// Strips a namespace prefix off an element name.
pub fn local_part(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|&b| b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}


//------------ Error ----------------------------------------------------------

#[derive(Debug)]
pub enum Error {
    Parse(quick_xml::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "malformed XML: {}", err),
        }
    }
}


//------------ Tests ----------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_escapes_character_data() {
        let mut writer = Writer::new();
        writer.start_with_ns("outer", "http://example.net/v1");
        writer.text_element("inner", "a < b & c");
        writer.end("outer");
        assert_eq!(
            writer.into_string(),
            "<outer xmlns=\"http://example.net/v1\">\
             <inner>a &lt; b &amp; c</inner></outer>"
        );
    }

    #[test]
    fn well_formed_requires_a_root_element() {
        assert!(is_well_formed("<roa><signature>abc</signature></roa>"));
        assert!(is_well_formed("<ok/>"));
        assert!(!is_well_formed("everything is fine"));
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("<roa><signature></roa>"));
    }

    #[test]
    fn element_texts_matches_local_names() {
        let body = r#"<error xmlns:ns5="urn:x">
            <message>top level</message>
            <component><ns5:message>nested</ns5:message></component>
        </error>"#;
        assert_eq!(
            element_texts(body, b"message").unwrap(),
            vec!["top level".to_string(), "nested".to_string()]
        );
    }

    #[test]
    fn element_texts_unescapes() {
        let body = "<r><message>a &amp; b</message></r>";
        assert_eq!(
            element_texts(body, b"message").unwrap(),
            vec!["a & b".to_string()]
        );
    }
}
