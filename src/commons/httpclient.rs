//! Some helper functions for the HTTPS calls to the registry.

use std::fmt;
use std::time::Duration;

use log::debug;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Response, StatusCode};

use crate::api::responses;
use crate::commons::xml;
use crate::constants::{HTTP_CLIENT_TIMEOUT_SECS, ROACTL_USER_AGENT};

const XML_CONTENT: &str = "application/xml";

/// Creates the client used for all calls in a run.
pub fn client() -> Result<reqwest::Client, Error> {
    reqwest::ClientBuilder::new()
        .timeout(Duration::from_secs(HTTP_CLIENT_TIMEOUT_SECS))
        .build()
        .map_err(|err| Error::request_build("-", err))
}

/// Performs a POST with an XML body and classifies the response.
///
/// On success the (well-formed) response body is returned for callers that
/// want to log or inspect it.
pub async fn post_xml(
    client: &reqwest::Client,
    uri: &str,
    body: String,
) -> Result<String, Error> {
    debug!("POST {}", redact_api_key(uri));
    debug!("request body:\n{}", body);
    let res = client
        .post(uri)
        .headers(headers(true))
        .body(body)
        .send()
        .await
        .map_err(|err| Error::transport(uri, err))?;
    xml_response(uri, res).await
}

/// Performs a GET and classifies the XML response.
pub async fn get_xml(
    client: &reqwest::Client,
    uri: &str,
) -> Result<String, Error> {
    debug!("GET {}", redact_api_key(uri));
    let res = client
        .get(uri)
        .headers(headers(false))
        .send()
        .await
        .map_err(|err| Error::transport(uri, err))?;
    xml_response(uri, res).await
}

/// Sends a DELETE request and classifies the XML response.
pub async fn delete(
    client: &reqwest::Client,
    uri: &str,
) -> Result<String, Error> {
    debug!("DELETE {}", redact_api_key(uri));
    let res = client
        .delete(uri)
        .headers(headers(false))
        .send()
        .await
        .map_err(|err| Error::transport(uri, err))?;
    xml_response(uri, res).await
}

/// Percent-encodes a query parameter value.
pub fn encode_query(value: &str) -> String {
    const QUERY: &AsciiSet = &CONTROLS
        .add(b' ')
        .add(b'"')
        .add(b'#')
        .add(b'%')
        .add(b'&')
        .add(b'+')
        .add(b'<')
        .add(b'>')
        .add(b'?');
    utf8_percent_encode(value, QUERY).to_string()
}

/// Replaces the API key in a URI with a placeholder for log output.
pub fn redact_api_key(uri: &str) -> String {
    let Some(start) = uri.find("apikey=") else {
        return uri.to_string();
    };
    let value_start = start + "apikey=".len();
    let value_end = uri[value_start..]
        .find('&')
        .map(|idx| value_start + idx)
        .unwrap_or(uri.len());
    format!("{}********{}", &uri[..value_start], &uri[value_end..])
}

fn headers(content: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(ROACTL_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(XML_CONTENT));
    if content {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT));
    }
    headers
}

async fn xml_response(uri: &str, res: Response) -> Result<String, Error> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|err| Error::transport(uri, err))?;
    debug!("response status {}, body:\n{}", status, body);
    classify(uri, status, body)
}

/// Classifies a registry response into a body or a failure.
///
/// A 200 with a well-formed XML body and no `<message>` element is the
/// only success. A 200 carrying something that is not XML is a failure in
/// its own right, never silently treated as success.
pub fn classify(
    uri: &str,
    status: StatusCode,
    body: String,
) -> Result<String, Error> {
    if status != StatusCode::OK {
        return Err(Error::rejected(uri, status, &body));
    }
    if !xml::is_well_formed(&body) {
        return Err(Error::malformed(uri, "response body is not XML"));
    }
    let messages = responses::error_messages(&body);
    if !messages.is_empty() {
        return Err(Error::Rejected(
            uri.to_string(), status, messages.join("; "),
        ));
    }
    Ok(body)
}


//------------ Error ---------------------------------------------------------

type ErrorUri = String;
type ErrorMessage = String;

#[derive(Debug)]
pub enum Error {
    RequestBuild(ErrorUri, ErrorMessage),
    Transport(ErrorUri, ErrorMessage),
    MalformedResponse(ErrorUri, ErrorMessage),
    Rejected(ErrorUri, StatusCode, ErrorMessage),
}

impl Error {
    pub fn request_build(uri: &str, msg: impl fmt::Display) -> Self {
        Error::RequestBuild(uri.to_string(), msg.to_string())
    }

    pub fn transport(uri: &str, msg: impl fmt::Display) -> Self {
        Error::Transport(uri.to_string(), msg.to_string())
    }

    pub fn malformed(uri: &str, msg: impl fmt::Display) -> Self {
        Error::MalformedResponse(uri.to_string(), msg.to_string())
    }

    /// Builds the rejection for a non-200 response.
    ///
    /// Uses every `<message>` element the body carries, in document order,
    /// and falls back to the status code when there are none.
    pub fn rejected(uri: &str, status: StatusCode, body: &str) -> Self {
        let messages = responses::error_messages(body);
        let reason = if messages.is_empty() {
            format!("unexpected status {}", status)
        } else {
            messages.join("; ")
        };
        Error::Rejected(uri.to_string(), status, reason)
    }

    /// The failure reason without the URI context.
    pub fn reason(&self) -> &str {
        match self {
            Error::RequestBuild(_, msg) => msg,
            Error::Transport(_, msg) => msg,
            Error::MalformedResponse(_, msg) => msg,
            Error::Rejected(_, _, msg) => msg,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::RequestBuild(uri, msg) => {
                write!(
                    f, "cannot create request for URI: {}, error: {}",
                    redact_api_key(uri), msg
                )
            }
            Error::Transport(uri, msg) => {
                write!(
                    f, "cannot reach URI: {}, error: {}",
                    redact_api_key(uri), msg
                )
            }
            Error::MalformedResponse(uri, msg) => {
                write!(
                    f, "unusable response from URI: {}, error: {}",
                    redact_api_key(uri), msg
                )
            }
            Error::Rejected(uri, status, msg) => {
                write!(
                    f, "request rejected by URI: {}, status: {}, reason: {}",
                    redact_api_key(uri), status, msg
                )
            }
        }
    }
}


//------------ Tests ---------------------------------------------------------
