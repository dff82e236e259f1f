//! Various roactl-wide constants.

//------------ Registry Endpoints -------------------------------------------

/// The production Reg-RWS host.
pub const REGISTRY_HOST_PRODUCTION: &str = "reg.arin.net";

/// The Operational Test & Evaluation Reg-RWS host.
pub const REGISTRY_HOST_OTE: &str = "reg.ote.arin.net";

/// The XML namespace of all Reg-RWS RPKI payloads.
pub const REGRWS_RPKI_NS: &str = "http://www.arin.net/regrws/rpki/v1";

/// The resource classification for ARIN-issued resources.
pub const RESOURCE_CLASS_ARIN: &str = "AR";


//------------ HTTP ----------------------------------------------------------

/// The timeout for requests to the registry, in seconds.
///
/// A submission is one small POST. If the registry has not answered within
/// this window it is not going to, and the batch should move on.
pub const HTTP_CLIENT_TIMEOUT_SECS: u64 = 30;

/// The user agent announced to the registry.
pub const ROACTL_USER_AGENT: &str =
    concat!("roactl/", env!("CARGO_PKG_VERSION"));


//------------ Signed Request Validity ---------------------------------------

/// The default validity window for signed ROA requests on production.
pub const VALIDITY_WEEKS_PRODUCTION: i64 = 312;

/// The default and maximum validity window for signed ROA requests in OT&E.
///
/// The OT&E certificate authority rejects anything longer.
pub const VALIDITY_WEEKS_OTE_MAX: i64 = 4;


//------------ Files ----------------------------------------------------------

/// The file read from the working directory when no API key is given.
pub const API_KEY_FILE: &str = "apikey.txt";
