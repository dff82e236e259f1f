//! ROA request records and their normalization.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::{error, fmt};

use chrono::{DateTime, Duration, Local};
use serde::Serialize;


//------------ AsNumber ------------------------------------------------------

/// An autonomous system number authorized to originate a route.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct AsNumber(u32);

impl AsNumber {
    pub fn into_u32(self) -> u32 {
        self.0
    }
}

impl FromStr for AsNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidAsn(s.trim().to_string()))?;
        if number == 0 {
            return Err(ValidationError::InvalidAsn(s.trim().to_string()));
        }
        Ok(AsNumber(number))
    }
}

impl fmt::Display for AsNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}


//------------ TypedPrefix ---------------------------------------------------

/// The network address of an authorized prefix.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum TypedPrefix {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

impl TypedPrefix {
    /// Returns the longest prefix length possible in the address family.
    pub fn family_max_length(self) -> u8 {
        match self {
            TypedPrefix::V4(_) => 32,
            TypedPrefix::V6(_) => 128,
        }
    }

    /// Returns the address with every `:` and `.` replaced by a dash.
    ///
    /// Registry object names may not contain address separators, so
    /// `192.0.2.0` becomes `192-0-2-0` and `2001:db8::` becomes
    /// `2001-db8-`.
    pub fn sanitized(self) -> String {
        sanitize_name(&self.to_string())
    }
}

impl FromStr for TypedPrefix {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match IpAddr::from_str(s.trim()) {
            Ok(IpAddr::V4(addr)) => Ok(TypedPrefix::V4(addr)),
            Ok(IpAddr::V6(addr)) => Ok(TypedPrefix::V6(addr)),
            Err(_) => {
                Err(ValidationError::InvalidPrefix(s.trim().to_string()))
            }
        }
    }
}

impl fmt::Display for TypedPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypedPrefix::V4(addr) => addr.fmt(f),
            TypedPrefix::V6(addr) => addr.fmt(f),
        }
    }
}

/// Replaces address separators so the result is name and URL safe.
pub fn sanitize_name(s: &str) -> String {
    s.replace("::", "-").replace(':', "-").replace('.', "-")
}


//------------ RoaRequest ----------------------------------------------------

/// One row of operator intent: authorize an AS to originate a prefix.
///
/// Constructed from one input record, immutable afterwards, and consumed
/// exactly once by payload construction. All field invariants are checked
/// on construction so nothing malformed ever reaches the wire.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoaRequest {
    pub origin_as: AsNumber,
    pub prefix: TypedPrefix,
    pub cidr_length: u8,
    pub max_length: u8,
    pub display_name: Option<String>,
}

impl RoaRequest {
    pub fn new(
        origin_as: AsNumber,
        prefix: TypedPrefix,
        cidr_length: u8,
        max_length: u8,
        display_name: Option<String>,
    ) -> Result<Self, ValidationError> {
        let family_max = prefix.family_max_length();
        if cidr_length > family_max {
            return Err(ValidationError::CidrLengthOutOfRange {
                cidr_length,
                family_max,
            });
        }
        if max_length > family_max {
            return Err(ValidationError::MaxLengthOutOfRange {
                max_length,
                family_max,
            });
        }
        if max_length < cidr_length {
            return Err(ValidationError::MaxLengthBelowCidrLength {
                max_length,
                cidr_length,
            });
        }
        Ok(RoaRequest {
            origin_as,
            prefix,
            cidr_length,
            max_length,
            display_name,
        })
    }

    /// Parses one line of the record file.
    ///
    /// Expects `asn,prefix,cidrLength,maxLength` with an optional trailing
    /// display name as a fifth field.
    pub fn from_line(
        line: &str,
        delimiter: char,
    ) -> Result<Self, ValidationError> {
        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.len() < 4 || fields.len() > 5 {
            return Err(ValidationError::FieldCount(fields.len()));
        }
        let origin_as = AsNumber::from_str(fields[0])?;
        let prefix = TypedPrefix::from_str(fields[1])?;
        let cidr_length = parse_length(fields[2])?;
        let max_length = parse_length(fields[3])?;
        let display_name = fields.get(4).map(|s| s.trim()).and_then(|s| {
            if s.is_empty() { None } else { Some(s.to_string()) }
        });
        Self::new(origin_as, prefix, cidr_length, max_length, display_name)
    }

    /// Derives the object name for a signed request.
    ///
    /// A sanitized operator supplied display name wins; otherwise the name
    /// is `AS<asn>-NET-<prefix>-<cidrLength>` with the prefix sanitized.
    pub fn roa_name(&self) -> String {
        match &self.display_name {
            Some(name) => sanitize_name(name),
            None => {
                format!(
                    "AS{}-NET-{}-{}",
                    self.origin_as,
                    self.prefix.sanitized(),
                    self.cidr_length
                )
            }
        }
    }

    /// Derives the object name for a server-signed spec.
    ///
    /// Same as [`roa_name`][Self::roa_name] but additionally carrying the
    /// max length and a date stamp, so spec submissions made on different
    /// days stay distinct.
    pub fn spec_name(&self, now: DateTime<Local>) -> String {
        match &self.display_name {
            Some(name) => sanitize_name(name),
            None => {
                format!(
                    "AS{}-NET-{}-{}-{}-{}",
                    self.origin_as,
                    self.prefix.sanitized(),
                    self.cidr_length,
                    self.max_length,
                    now.format("%Y%m%d")
                )
            }
        }
    }

    /// Normalizes the record for a signed submission.
    ///
    /// Pure: the same record, timestamp and validity window always produce
    /// the same result.
    pub fn normalize(
        &self,
        now: DateTime<Local>,
        validity: Duration,
    ) -> NormalizedRoa {
        let expires = now + validity;
        NormalizedRoa {
            name: self.roa_name(),
            epoch_seconds: now.timestamp(),
            creation: format_payload_date(now),
            expiration: format_payload_date(expires),
        }
    }
}

impl fmt::Display for RoaRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f, "AS{} {}/{}-{}",
            self.origin_as, self.prefix, self.cidr_length, self.max_length
        )
    }
}

fn parse_length(s: &str) -> Result<u8, ValidationError> {
    s.trim()
        .parse::<u8>()
        .map_err(|_| ValidationError::InvalidLength(s.trim().to_string()))
}

/// Formats a payload date as `month-day-year` without zero padding.
fn format_payload_date(when: DateTime<Local>) -> String {
    when.format("%-m-%-d-%Y").to_string()
}


//------------ NormalizedRoa -------------------------------------------------

/// The derived values a signed submission needs besides the record itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NormalizedRoa {
    /// The object name identifying the ROA to the registry.
    pub name: String,

    /// The creation time in seconds since the Unix epoch.
    pub epoch_seconds: i64,

    /// The creation date, `month-day-year`.
    pub creation: String,

    /// The expiration date, `month-day-year`.
    pub expiration: String,
}


//------------ ValidationError -----------------------------------------------

/// An input record that must not reach the wire.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValidationError {
    FieldCount(usize),
    InvalidAsn(String),
    InvalidPrefix(String),
    InvalidLength(String),
    CidrLengthOutOfRange { cidr_length: u8, family_max: u8 },
    MaxLengthOutOfRange { max_length: u8, family_max: u8 },
    MaxLengthBelowCidrLength { max_length: u8, cidr_length: u8 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationError::FieldCount(count) => {
                write!(
                    f,
                    "expected 4 or 5 fields \
                     (asn,prefix,cidrLength,maxLength[,name]), found {}",
                    count
                )
            }
            ValidationError::InvalidAsn(s) => {
                write!(f, "'{}' is not a valid origin AS number", s)
            }
            ValidationError::InvalidPrefix(s) => {
                write!(f, "'{}' is not a valid IPv4 or IPv6 address", s)
            }
            ValidationError::InvalidLength(s) => {
                write!(f, "'{}' is not a valid prefix length", s)
            }
            ValidationError::CidrLengthOutOfRange {
                cidr_length, family_max
            } => {
                write!(
                    f, "cidrLength {} exceeds the family maximum of {}",
                    cidr_length, family_max
                )
            }
            ValidationError::MaxLengthOutOfRange {
                max_length, family_max
            } => {
                write!(
                    f, "maxLength {} exceeds the family maximum of {}",
                    max_length, family_max
                )
            }
            ValidationError::MaxLengthBelowCidrLength {
                max_length, cidr_length
            } => {
                write!(
                    f, "maxLength {} is below cidrLength {}",
                    max_length, cidr_length
                )
            }
        }
    }
}

impl error::Error for ValidationError {}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn request(line: &str) -> RoaRequest {
        RoaRequest::from_line(line, ',').unwrap()
    }

    fn noon(year: i32, month: u32, day: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn derives_v4_name() {
        assert_eq!(
            request("65000,192.0.2.0,24,24").roa_name(),
            "AS65000-NET-192-0-2-0-24"
        );
    }

    #[test]
    fn derives_v6_name() {
        assert_eq!(
            request("65001,2001:db8::,48,48").roa_name(),
            "AS65001-NET-2001-db8--48"
        );
    }

    #[test]
    fn names_never_contain_address_separators() {
        for line in [
            "65000,192.0.2.0,24,24",
            "65001,2001:db8::,32,48",
            "65002,2001:db8:a:b::1,64,64",
        ] {
            let record = request(line);
            let name = record.spec_name(noon(2026, 8, 6));
            assert!(!name.contains(':'), "{}", name);
            assert!(!name.contains('.'), "{}", name);
        }
    }

    #[test]
    fn spec_name_carries_max_length_and_date_stamp() {
        assert_eq!(
            request("65000,192.0.2.0,24,28").spec_name(noon(2026, 8, 6)),
            "AS65000-NET-192-0-2-0-24-28-20260806"
        );
    }

    #[test]
    fn display_name_overrides_and_is_sanitized() {
        let record = request("65000,192.0.2.0,24,24,Florida.Market:South");
        assert_eq!(record.roa_name(), "Florida-Market-South");
        assert_eq!(
            record.spec_name(noon(2026, 8, 6)),
            "Florida-Market-South"
        );
    }

    #[test]
    fn normalization_is_deterministic() {
        let record = request("65000,192.0.2.0,24,24");
        let now = noon(2026, 8, 6);
        assert_eq!(
            record.normalize(now, Duration::weeks(4)),
            record.normalize(now, Duration::weeks(4))
        );
    }

    #[test]
    fn payload_dates_are_month_day_year_without_padding() {
        let normalized = request("65000,192.0.2.0,24,24")
            .normalize(noon(2026, 8, 6), Duration::weeks(4));
        assert_eq!(normalized.creation, "8-6-2026");
        assert_eq!(normalized.expiration, "9-3-2026");
        assert_eq!(normalized.epoch_seconds, noon(2026, 8, 6).timestamp());
    }

    #[test]
    fn max_length_below_cidr_length_is_rejected() {
        assert_eq!(
            RoaRequest::from_line("65000,192.0.2.0,24,23", ',').unwrap_err(),
            ValidationError::MaxLengthBelowCidrLength {
                max_length: 23,
                cidr_length: 24
            }
        );
    }

    #[test]
    fn lengths_are_bounded_by_the_address_family() {
        assert!(matches!(
            RoaRequest::from_line("65000,192.0.2.0,33,33", ',').unwrap_err(),
            ValidationError::CidrLengthOutOfRange { .. }
        ));
        assert!(matches!(
            RoaRequest::from_line("65000,192.0.2.0,24,40", ',').unwrap_err(),
            ValidationError::MaxLengthOutOfRange { .. }
        ));
        // 33 is fine for IPv6
        assert!(RoaRequest::from_line("65000,2001:db8::,33,48", ',').is_ok());
    }

    #[test]
    fn zero_and_garbage_asns_are_rejected() {
        assert!(matches!(
            RoaRequest::from_line("0,192.0.2.0,24,24", ',').unwrap_err(),
            ValidationError::InvalidAsn(_)
        ));
        assert!(matches!(
            RoaRequest::from_line("AS65000,192.0.2.0,24,24", ',')
                .unwrap_err(),
            ValidationError::InvalidAsn(_)
        ));
    }

    #[test]
    fn field_count_is_checked() {
        assert!(matches!(
            RoaRequest::from_line("65000,192.0.2.0,24", ',').unwrap_err(),
            ValidationError::FieldCount(3)
        ));
        assert!(matches!(
            RoaRequest::from_line("65000,192.0.2.0,24,24,x,y", ',')
                .unwrap_err(),
            ValidationError::FieldCount(6)
        ));
    }

    #[test]
    fn fields_may_carry_whitespace() {
        let record = request(" 65000 , 192.0.2.0 , 24 , 24 ");
        assert_eq!(record.cidr_length, 24);
        assert_eq!(record.max_length, 24);
    }

    #[test]
    fn alternate_delimiter_is_honored() {
        let record = RoaRequest::from_line("65000;192.0.2.0;24;24", ';')
            .unwrap();
        assert_eq!(record.prefix.to_string(), "192.0.2.0");
    }
}
