//! Reporting per-record outcomes back to the operator.

use std::str::FromStr;
use std::{error, fmt};

use serde::Serialize;

use crate::api::responses::RoaSpecEntry;
use crate::commons::httpclient;


//------------ SubmissionOutcome ---------------------------------------------

/// What happened to a single record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success,
    Failure { kind: FailureKind, message: String },
}


//------------ FailureKind ---------------------------------------------------

/// Why a record did not go through.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// The input record is malformed; nothing was sent.
    Validation,

    /// The payload could not be signed.
    Signing,

    /// The registry could not be reached.
    Transport,

    /// The registry said no.
    Rejected,

    /// The registry answered 200 with something other than XML.
    MalformedResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Validation => "validation",
            FailureKind::Signing => "signing",
            FailureKind::Transport => "transport",
            FailureKind::Rejected => "rejected",
            FailureKind::MalformedResponse => "malformed-response",
        })
    }
}

impl From<&httpclient::Error> for FailureKind {
    fn from(err: &httpclient::Error) -> Self {
        match err {
            httpclient::Error::RequestBuild(..) => FailureKind::Transport,
            httpclient::Error::Transport(..) => FailureKind::Transport,
            httpclient::Error::MalformedResponse(..) => {
                FailureKind::MalformedResponse
            }
            httpclient::Error::Rejected(..) => FailureKind::Rejected,
        }
    }
}


//------------ BatchReport ---------------------------------------------------

/// The per-record outcome of one record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RecordOutcome {
    /// The object name, handle, or input line identifying the record.
    pub id: String,

    #[serde(flatten)]
    pub outcome: SubmissionOutcome,
}

/// The outcomes of a whole run, in input order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct BatchReport {
    outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, id: String) {
        self.outcomes.push(RecordOutcome {
            id,
            outcome: SubmissionOutcome::Success,
        });
    }

    pub fn failure(
        &mut self,
        id: String,
        kind: FailureKind,
        message: String,
    ) {
        self.outcomes.push(RecordOutcome {
            id,
            outcome: SubmissionOutcome::Failure { kind, message },
        });
    }

    pub fn failure_from_http(
        &mut self,
        id: String,
        err: &httpclient::Error,
    ) {
        self.failure(id, err.into(), err.reason().to_string());
    }

    pub fn outcomes(&self) -> &[RecordOutcome] {
        &self.outcomes
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome != SubmissionOutcome::Success)
            .count()
    }
}


//------------ Report --------------------------------------------------------

/// Everything a command can hand back for rendering.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Report {
    Batch(BatchReport),
    RoaList(Vec<RoaSpecEntry>),
    Empty,
}

impl Report {
    /// Renders the report in the requested format.
    pub fn render(
        &self,
        format: ReportFormat,
    ) -> Result<Option<String>, ReportError> {
        match format {
            ReportFormat::None => Ok(None),
            ReportFormat::Json => match self {
                Report::Batch(batch) => Ok(Some(
                    serde_json::to_string_pretty(batch.outcomes()).unwrap(),
                )),
                Report::RoaList(entries) => Ok(Some(
                    serde_json::to_string_pretty(entries).unwrap(),
                )),
                Report::Empty => Ok(None),
            },
            ReportFormat::Text => match self {
                Report::Batch(batch) => {
                    let lines: Vec<String> = batch
                        .outcomes()
                        .iter()
                        .map(|outcome| match &outcome.outcome {
                            SubmissionOutcome::Success => {
                                format!("{}: ok", outcome.id)
                            }
                            SubmissionOutcome::Failure { kind, message } => {
                                format!(
                                    "{}: FAILED ({}): {}",
                                    outcome.id, kind, message
                                )
                            }
                        })
                        .collect();
                    if lines.is_empty() {
                        Ok(None)
                    } else {
                        Ok(Some(lines.join("\n")))
                    }
                }
                Report::RoaList(entries) => {
                    let lines: Vec<String> = entries
                        .iter()
                        .map(|entry| {
                            format!(
                                "{},{},{},{}",
                                entry.handle,
                                entry.origin_as,
                                entry.start_address,
                                entry.cidr_length
                            )
                        })
                        .collect();
                    if lines.is_empty() {
                        Ok(None)
                    } else {
                        Ok(Some(lines.join("\n")))
                    }
                }
                Report::Empty => Ok(None),
            },
        }
    }

    /// The number of records that did not go through.
    pub fn failures(&self) -> usize {
        match self {
            Report::Batch(batch) => batch.failures(),
            _ => 0,
        }
    }

    /// The number of records processed.
    pub fn total(&self) -> usize {
        match self {
            Report::Batch(batch) => batch.total(),
            Report::RoaList(entries) => entries.len(),
            Report::Empty => 0,
        }
    }
}

impl From<BatchReport> for Report {
    fn from(batch: BatchReport) -> Self {
        Report::Batch(batch)
    }
}


//------------ ReportFormat --------------------------------------------------

/// The format to use when rendering the outcome of a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReportFormat {
    None,
    Json,
    Text,
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, ReportError> {
        match s {
            "none" => Ok(ReportFormat::None),
            "json" => Ok(ReportFormat::Json),
            "text" => Ok(ReportFormat::Text),
            _ => Err(ReportError::UnrecognizedFormat(s.to_string())),
        }
    }
}


//------------ ReportError ---------------------------------------------------

#[derive(Clone, Debug)]
pub enum ReportError {
    UnrecognizedFormat(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReportError::UnrecognizedFormat(s) => {
                write!(f, "report format '{}' is not recognized", s)
            }
        }
    }
}

impl error::Error for ReportError {}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> BatchReport {
        let mut batch = BatchReport::new();
        batch.success("AS65000-NET-192-0-2-0-24".to_string());
        batch.failure(
            "line 2".to_string(),
            FailureKind::Validation,
            "maxLength 23 is below cidrLength 24".to_string(),
        );
        batch.failure(
            "AS65002-NET-198-51-100-0-24".to_string(),
            FailureKind::Rejected,
            "Invalid resource".to_string(),
        );
        batch
    }

    #[test]
    fn text_report_has_one_line_per_record() {
        let report = Report::Batch(batch());
        assert_eq!(
            report.render(ReportFormat::Text).unwrap().unwrap(),
            "AS65000-NET-192-0-2-0-24: ok\n\
             line 2: FAILED (validation): \
             maxLength 23 is below cidrLength 24\n\
             AS65002-NET-198-51-100-0-24: FAILED (rejected): \
             Invalid resource"
        );
    }

    #[test]
    fn failure_counting() {
        let report = Report::Batch(batch());
        assert_eq!(report.failures(), 2);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn none_format_renders_nothing() {
        assert_eq!(
            Report::Batch(batch()).render(ReportFormat::None).unwrap(),
            None
        );
    }

    #[test]
    fn json_report_is_tagged() {
        let rendered = Report::Batch(batch())
            .render(ReportFormat::Json)
            .unwrap()
            .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&rendered).unwrap();
        assert_eq!(value[0]["status"], "success");
        assert_eq!(value[1]["status"], "failure");
        assert_eq!(value[1]["kind"], "validation");
        assert_eq!(value[2]["kind"], "rejected");
        assert_eq!(value[2]["message"], "Invalid resource");
    }

    #[test]
    fn roa_list_renders_as_csv_lines() {
        let report = Report::RoaList(vec![RoaSpecEntry {
            handle: "X15A-ROA-1".to_string(),
            origin_as: "65000".to_string(),
            start_address: "192.0.2.0".to_string(),
            cidr_length: "24".to_string(),
        }]);
        assert_eq!(
            report.render(ReportFormat::Text).unwrap().unwrap(),
            "X15A-ROA-1,65000,192.0.2.0,24"
        );
    }

    #[test]
    fn format_parsing() {
        assert_eq!(
            ReportFormat::from_str("json").unwrap(),
            ReportFormat::Json
        );
        assert!(ReportFormat::from_str("yaml").is_err());
    }
}
