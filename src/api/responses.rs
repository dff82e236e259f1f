//! Parsing the registry's XML responses.

use quick_xml::events::Event;
use serde::Serialize;

use crate::commons::xml::{self, local_part};


//------------ error_messages -------------------------------------------------

/// Collects the text of every `<message>` element in an error payload.
///
/// The registry puts one message at the top level of an error payload and
/// one per offending component; we report all of them, in document order.
/// A body that does not parse yields no messages, the caller then falls
/// back to the HTTP status.
pub fn error_messages(body: &str) -> Vec<String> {
    xml::element_texts(body, b"message")
        .unwrap_or_default()
        .into_iter()
        .filter(|msg| !msg.is_empty())
        .collect()
}


//------------ RoaSpecEntry --------------------------------------------------

/// One registered ROA as returned by the list call.
///
/// Values are kept as the registry sent them; this is display data, not
/// something we compute with.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RoaSpecEntry {
    #[serde(rename = "roaHandle")]
    pub handle: String,
    #[serde(rename = "asNumber")]
    pub origin_as: String,
    #[serde(rename = "startAddress")]
    pub start_address: String,
    #[serde(rename = "cidrLength")]
    pub cidr_length: String,
}

/// Parses the ROA list response into its entries.
///
/// Element names come back with varying namespace prefixes, so matching is
/// done on local names. Only the first resource of each `roaSpec` is
/// reported, which is what the registry returns in practice.
pub fn parse_roa_list(body: &str) -> Result<Vec<RoaSpecEntry>, xml::Error> {
    let mut reader = quick_xml::Reader::from_str(body);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut current: Option<Partial> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event(&mut buf).map_err(xml::Error::Parse)? {
            Event::Start(start) => match local_part(start.name()) {
                b"roaSpec" => current = Some(Partial::default()),
                b"roaHandle" => field = Some(Field::Handle),
                b"asNumber" => field = Some(Field::OriginAs),
                b"startAddress" => field = Some(Field::StartAddress),
                b"cidrLength" => field = Some(Field::CidrLength),
                _ => field = None,
            },
            Event::Text(text) => {
                if let (Some(partial), Some(field)) =
                    (current.as_mut(), field)
                {
                    let value = text
                        .unescape_and_decode(&reader)
                        .map_err(xml::Error::Parse)?;
                    partial.set(field, value.trim());
                }
            }
            Event::End(end) => {
                if local_part(end.name()) == b"roaSpec" {
                    if let Some(partial) = current.take() {
                        entries.push(partial.into_entry());
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(entries)
}

#[derive(Clone, Copy)]
enum Field {
    Handle,
    OriginAs,
    StartAddress,
    CidrLength,
}

#[derive(Default)]
struct Partial {
    handle: Option<String>,
    origin_as: Option<String>,
    start_address: Option<String>,
    cidr_length: Option<String>,
}

impl Partial {
    /// Stores a field value, keeping the first occurrence.
    fn set(&mut self, field: Field, value: &str) {
        let slot = match field {
            Field::Handle => &mut self.handle,
            Field::OriginAs => &mut self.origin_as,
            Field::StartAddress => &mut self.start_address,
            Field::CidrLength => &mut self.cidr_length,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    fn into_entry(self) -> RoaSpecEntry {
        RoaSpecEntry {
            handle: self.handle.unwrap_or_default(),
            origin_as: self.origin_as.unwrap_or_default(),
            start_address: self.start_address.unwrap_or_default(),
            cidr_length: self.cidr_length.unwrap_or_default(),
        }
    }
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_all_messages_in_document_order() {
        let body = "<error xmlns=\"urn:x\">\
            <message>Invalid resource</message>\
            <component><message>startAddress not held</message></component>\
            </error>";
        assert_eq!(
            error_messages(body),
            vec![
                "Invalid resource".to_string(),
                "startAddress not held".to_string()
            ]
        );
    }

    #[test]
    fn no_messages_in_non_xml_bodies() {
        assert!(error_messages("not xml at all").is_empty());
        assert!(error_messages("").is_empty());
    }

    #[test]
    fn parses_namespaced_roa_list() {
        let body = r#"<payload xmlns="http://www.arin.net/regrws/core/v1"
                xmlns:ns5="http://www.arin.net/regrws/rpki/v1">
            <roaSpec>
                <roaHandle>X15A-ROA-1</roaHandle>
                <ns5:asNumber>65000</ns5:asNumber>
                <resources>
                    <ns5:startAddress>192.0.2.0</ns5:startAddress>
                    <ns5:cidrLength>24</ns5:cidrLength>
                </resources>
            </roaSpec>
            <roaSpec>
                <roaHandle>X15A-ROA-2</roaHandle>
                <ns5:asNumber>65001</ns5:asNumber>
                <resources>
                    <ns5:startAddress>2001:db8::</ns5:startAddress>
                    <ns5:cidrLength>32</ns5:cidrLength>
                </resources>
            </roaSpec>
        </payload>"#;

        let entries = parse_roa_list(body).unwrap();
        assert_eq!(
            entries,
            vec![
                RoaSpecEntry {
                    handle: "X15A-ROA-1".to_string(),
                    origin_as: "65000".to_string(),
                    start_address: "192.0.2.0".to_string(),
                    cidr_length: "24".to_string(),
                },
                RoaSpecEntry {
                    handle: "X15A-ROA-2".to_string(),
                    origin_as: "65001".to_string(),
                    start_address: "2001:db8::".to_string(),
                    cidr_length: "32".to_string(),
                },
            ]
        );
    }

    #[test]
    fn first_resource_wins_per_roa_spec() {
        let body = "<list><roaSpec>\
            <roaHandle>H</roaHandle>\
            <asNumber>65000</asNumber>\
            <startAddress>192.0.2.0</startAddress>\
            <cidrLength>24</cidrLength>\
            <startAddress>198.51.100.0</startAddress>\
            <cidrLength>25</cidrLength>\
            </roaSpec></list>";
        let entries = parse_roa_list(body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].start_address, "192.0.2.0");
        assert_eq!(entries[0].cidr_length, "24");
    }

    #[test]
    fn empty_list_parses_to_no_entries() {
        assert!(parse_roa_list("<payload></payload>").unwrap().is_empty());
    }
}
