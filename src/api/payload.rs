//! Building the registry's request bodies.

use std::fmt;

use crate::api::roa::{NormalizedRoa, RoaRequest};
use crate::commons::xml;
use crate::constants::REGRWS_RPKI_NS;

/// The version prefix of the pipe-delimited signing payload.
const ROA_DATA_VERSION: &str = "1";


//------------ Protocol ------------------------------------------------------

/// The two generations of the registry's ROA API.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Protocol {
    /// The legacy protocol: the client signs a pipe-delimited payload.
    SignedRoa,

    /// The newer protocol: the client sends fields, the registry signs.
    RoaSpec,
}

impl Protocol {
    /// Returns whether submissions need an operator held signing key.
    pub fn requires_signer(self) -> bool {
        matches!(self, Protocol::SignedRoa)
    }

    /// Returns the REST path segment submissions go to.
    pub fn rest_path(self) -> &'static str {
        match self {
            Protocol::SignedRoa => "roa",
            Protocol::RoaSpec => "rpki",
        }
    }
}


//------------ SigningPayload ------------------------------------------------

/// The pipe-delimited string the operator key signs.
///
/// Field order and the trailing pipe are fixed by the registry; any
/// deviation is rejected server-side. The payload is a pure function of
/// the record and its normalization and is never reused across records.
pub struct SigningPayload(String);

impl SigningPayload {
    pub fn new(request: &RoaRequest, normalized: &NormalizedRoa) -> Self {
        SigningPayload(format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|",
            ROA_DATA_VERSION,
            normalized.epoch_seconds,
            normalized.name,
            request.origin_as,
            normalized.creation,
            normalized.expiration,
            request.prefix,
            request.cidr_length,
            request.max_length,
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SigningPayload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}


//------------ Request bodies -------------------------------------------------

/// Renders the signed protocol body wrapping signature and payload.
pub fn signed_roa(signature: &str, roa_data: &SigningPayload) -> String {
    let mut writer = xml::Writer::new();
    writer.start_with_ns("roa", REGRWS_RPKI_NS);
    writer.text_element("signature", signature);
    writer.text_element("roaData", roa_data.as_str());
    writer.end("roa");
    writer.into_string()
}

/// Renders the server-signed protocol body for one record.
pub fn rpki_transaction(
    request: &RoaRequest,
    name: &str,
    auto_renew: bool,
) -> String {
    let mut writer = xml::Writer::new();
    writer.start_with_ns("rpkiTransaction", REGRWS_RPKI_NS);
    writer.start("roaSpecAdd");
    writer.start("roaSpec");
    if auto_renew {
        writer.text_element("autoLink", "true");
    }
    writer.text_element("asNumber", &request.origin_as.to_string());
    writer.text_element("name", name);
    writer.start("resources");
    writer.start("roaSpecResource");
    writer.text_element("startAddress", &request.prefix.to_string());
    writer.text_element("cidrLength", &request.cidr_length.to_string());
    writer.text_element("maxLength", &request.max_length.to_string());
    writer.end("roaSpecResource");
    writer.end("resources");
    writer.end("roaSpec");
    writer.end("roaSpecAdd");
    writer.end("rpkiTransaction");
    writer.into_string()
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{Duration, Local, TimeZone};

    use super::*;
    use crate::api::roa::NormalizedRoa;

    fn record() -> RoaRequest {
        RoaRequest::from_line("65000,192.0.2.0,24,24", ',').unwrap()
    }

    fn normalized() -> NormalizedRoa {
        let now = Local.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        record().normalize(now, Duration::weeks(4))
    }

    #[test]
    fn signing_payload_has_fixed_field_order() {
        let normalized = normalized();
        let payload = SigningPayload::new(&record(), &normalized);
        assert_eq!(
            payload.to_string(),
            format!(
                "1|{}|AS65000-NET-192-0-2-0-24|65000\
                 |8-6-2026|9-3-2026|192.0.2.0|24|24|",
                normalized.epoch_seconds
            )
        );
    }

    #[test]
    fn signed_body_wraps_signature_and_payload() {
        let payload = SigningPayload::new(&record(), &normalized());
        let body = signed_roa("c2lnbmF0dXJl", &payload);
        assert!(body.starts_with(
            "<roa xmlns=\"http://www.arin.net/regrws/rpki/v1\">"
        ));
        assert!(body.contains("<signature>c2lnbmF0dXJl</signature>"));
        assert!(body.contains(
            &format!("<roaData>{}</roaData>", payload)
        ));
        assert!(body.ends_with("</roa>"));
    }

    #[test]
    fn spec_body_carries_the_record_fields() {
        let record = record();
        let name = record.spec_name(
            Local.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
        );
        let body = rpki_transaction(&record, &name, false);
        assert!(body.starts_with(
            "<rpkiTransaction \
             xmlns=\"http://www.arin.net/regrws/rpki/v1\">"
        ));
        assert!(body.contains("<asNumber>65000</asNumber>"));
        assert!(body.contains(
            "<name>AS65000-NET-192-0-2-0-24-24-20260806</name>"
        ));
        assert!(body.contains("<startAddress>192.0.2.0</startAddress>"));
        assert!(body.contains("<cidrLength>24</cidrLength>"));
        assert!(body.contains("<maxLength>24</maxLength>"));
        assert!(!body.contains("<autoLink>"));
    }

    #[test]
    fn auto_renew_adds_the_auto_link_element() {
        let record = record();
        let body = rpki_transaction(&record, "NAME", true);
        assert!(body.contains("<roaSpec><autoLink>true</autoLink>"));
    }

    #[test]
    fn only_the_legacy_protocol_needs_a_signer() {
        assert!(Protocol::SignedRoa.requires_signer());
        assert!(!Protocol::RoaSpec.requires_signer());
        assert_eq!(Protocol::SignedRoa.rest_path(), "roa");
        assert_eq!(Protocol::RoaSpec.rest_path(), "rpki");
    }
}
