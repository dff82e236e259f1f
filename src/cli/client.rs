//! The client driving a provisioning run.

use std::{fs, process};

use chrono::{Duration, Local};
use log::{debug, info, warn};

use crate::api::payload::{self, Protocol, SigningPayload};
use crate::api::responses::{self, RoaSpecEntry};
use crate::api::roa::{RoaRequest, ValidationError};
use crate::cli::env::{self, RegistryHost, StdinConfirmation};
use crate::cli::options::{GeneralOptions, Options};
use crate::cli::report::{BatchReport, FailureKind, Report};
use crate::commons::crypto::RoaSigner;
use crate::commons::error::Error;
use crate::commons::httpclient;
use crate::constants::{API_KEY_FILE, RESOURCE_CLASS_ARIN};


//------------ RecordRow -----------------------------------------------------

/// One line of the record file after parsing.
///
/// Invalid rows are carried along so the batch report shows them in input
/// order next to the rows that were submitted.
#[derive(Debug)]
pub enum RecordRow {
    Valid(RoaRequest),
    Invalid { line: usize, error: ValidationError },
}


//------------ RegistryClient ------------------------------------------------

/// Command line client for the registry's provisioning API.
pub struct RegistryClient {
    host: RegistryHost,
    org_id: Option<String>,
    api_key: String,
    api_dump: bool,
    http: reqwest::Client,
}

impl RegistryClient {
    /// Delegates the options to be processed and reports the outcome.
    ///
    /// Returns an error when the run as a whole failed, including when
    /// any record of a batch did not go through.
    pub async fn report(options: Options) -> Result<(), Error> {
        let format = options.general.format;
        let report = Self::process(options).await?;
        if let Some(text) = report.render(format)? {
            println!("{}", text);
        }
        match report.failures() {
            0 => Ok(()),
            failed => Err(Error::BatchIncomplete {
                failed,
                total: report.total(),
            }),
        }
    }

    /// Processes the options and returns the outcome for rendering.
    pub async fn process(options: Options) -> Result<Report, Error> {
        let Options { general, command } = options;
        let host = env::resolve(general.production, &mut StdinConfirmation)?;
        let client = Self::build(host, general)?;
        command.run(&client).await
    }

    /// Creates a client for the resolved environment.
    pub fn build(
        host: RegistryHost,
        general: GeneralOptions,
    ) -> Result<Self, Error> {
        let api_key = match general.apikey {
            Some(key) => key,
            None => fs::read_to_string(API_KEY_FILE)
                .map(|content| content.trim().to_string())
                .map_err(|_| {
                    Error::config(format!(
                        "no API key: use --apikey, ROACTL_API_KEY, \
                         or a {} file",
                        API_KEY_FILE
                    ))
                })?,
        };
        if api_key.is_empty() {
            return Err(Error::config("the API key is empty"));
        }
        Ok(RegistryClient {
            host,
            org_id: general.orgid,
            api_key,
            api_dump: general.api,
            http: httpclient::client()?,
        })
    }

    pub fn host(&self) -> RegistryHost {
        self.host
    }

    /// Submits one signed request per record, in input order.
    ///
    /// Each record gets its own timestamp and therefore its own payload
    /// and signature. A failing record is reported and the loop moves on.
    pub async fn submit_signed(
        &self,
        rows: Vec<RecordRow>,
        signer: &RoaSigner,
        validity: Duration,
    ) -> Result<BatchReport, Error> {
        let uri = self.submit_uri(Protocol::SignedRoa)?;
        let mut report = BatchReport::new();
        for row in rows {
            let request = match self.take_valid(row, &mut report) {
                Some(request) => request,
                None => continue,
            };
            let normalized = request.normalize(Local::now(), validity);
            let roa_data = SigningPayload::new(&request, &normalized);
            debug!("signing payload for {}: {}", normalized.name, roa_data);
            let signature = match signer.sign(roa_data.as_str()) {
                Ok(signature) => signature,
                Err(err) => {
                    warn!("cannot sign request for {}", normalized.name);
                    report.failure(
                        normalized.name,
                        FailureKind::Signing,
                        err.to_string(),
                    );
                    continue;
                }
            };
            let body = payload::signed_roa(&signature, &roa_data);
            self.submit_one(&uri, normalized.name, body, &mut report)
                .await;
        }
        Ok(report)
    }

    /// Submits one server-signed spec per record, in input order.
    pub async fn submit_specs(
        &self,
        rows: Vec<RecordRow>,
        auto_renew: bool,
    ) -> Result<BatchReport, Error> {
        let uri = self.submit_uri(Protocol::RoaSpec)?;
        let mut report = BatchReport::new();
        for row in rows {
            let request = match self.take_valid(row, &mut report) {
                Some(request) => request,
                None => continue,
            };
            let name = request.spec_name(Local::now());
            let body = payload::rpki_transaction(&request, &name, auto_renew);
            self.submit_one(&uri, name, body, &mut report).await;
        }
        Ok(report)
    }

    /// Fetches the ROAs currently registered under the ORG-ID.
    pub async fn list_roas(&self) -> Result<Vec<RoaSpecEntry>, Error> {
        let uri = self.list_uri()?;
        if self.api_dump {
            dump_call("GET", &uri, None);
        }
        let body = httpclient::get_xml(&self.http, &uri).await?;
        responses::parse_roa_list(&body).map_err(|err| {
            Error::HttpClient(httpclient::Error::malformed(&uri, err))
        })
    }

    /// Deletes the given ROA handles, one call per handle.
    pub async fn delete_roas(&self, handles: Vec<String>) -> BatchReport {
        let mut report = BatchReport::new();
        for handle in handles {
            let uri = self.delete_uri(&handle);
            if self.api_dump {
                dump_call("DELETE", &uri, None);
            }
            match httpclient::delete(&self.http, &uri).await {
                Ok(_) => {
                    info!("deleted ROA {}", handle);
                    report.success(handle);
                }
                Err(err) => {
                    warn!("deletion of ROA {} failed", handle);
                    report.failure_from_http(handle, &err);
                }
            }
        }
        report
    }

    fn take_valid(
        &self,
        row: RecordRow,
        report: &mut BatchReport,
    ) -> Option<RoaRequest> {
        match row {
            RecordRow::Valid(request) => Some(request),
            RecordRow::Invalid { line, error } => {
                report.failure(
                    format!("line {}", line),
                    FailureKind::Validation,
                    error.to_string(),
                );
                None
            }
        }
    }

    async fn submit_one(
        &self,
        uri: &str,
        id: String,
        body: String,
        report: &mut BatchReport,
    ) {
        if self.api_dump {
            dump_call("POST", uri, Some(&body));
        }
        match httpclient::post_xml(&self.http, uri, body).await {
            Ok(_) => {
                info!("ROA request accepted for {}", id);
                report.success(id);
            }
            Err(err) => {
                warn!("ROA request failed for {}", id);
                report.failure_from_http(id, &err);
            }
        }
    }

    fn org_id(&self) -> Result<&str, Error> {
        self.org_id.as_deref().ok_or_else(|| {
            Error::config(
                "an ORG-ID is required: use --orgid or ROACTL_ORG_ID",
            )
        })
    }

    fn encoded_key(&self) -> String {
        httpclient::encode_query(&self.api_key)
    }

    /// The submission URI for the given protocol generation.
    ///
    /// The legacy protocol additionally scopes the request to the ARIN
    /// resource classification.
    fn submit_uri(&self, protocol: Protocol) -> Result<String, Error> {
        let mut uri = format!(
            "https://{}/rest/{}/{}",
            self.host.hostname(),
            protocol.rest_path(),
            self.org_id()?
        );
        if protocol == Protocol::SignedRoa {
            uri.push_str(";resourceClass=");
            uri.push_str(RESOURCE_CLASS_ARIN);
        }
        uri.push_str("?apikey=");
        uri.push_str(&self.encoded_key());
        Ok(uri)
    }

    fn list_uri(&self) -> Result<String, Error> {
        Ok(format!(
            "https://{}/rest/roa/{}?apikey={}",
            self.host.hostname(),
            self.org_id()?,
            self.encoded_key()
        ))
    }

    fn delete_uri(&self, handle: &str) -> String {
        format!(
            "https://{}/rest/roa/spec/{}?apikey={}",
            self.host.hostname(),
            handle,
            self.encoded_key()
        )
    }
}

/// Prints the call that would be made and exits.
fn dump_call(method: &str, uri: &str, body: Option<&str>) {
    println!("{}:\n  {}", method, uri);
    if let Some(body) = body {
        println!("Body:\n{}", body);
    }
    process::exit(0);
}


//------------ Tests ---------------------------------------------------------
