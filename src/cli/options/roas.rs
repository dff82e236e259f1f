//! Submitting, listing and deleting ROAs.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{error, fmt, fs};

use crate::api::roa::RoaRequest;
use crate::cli::client::{RecordRow, RegistryClient};
use crate::cli::env;
use crate::cli::report::Report;
use crate::commons::crypto::RoaSigner;
use crate::commons::error::Error;


//------------ Request -------------------------------------------------------

/// Submit client-signed ROA requests, one per record.
#[derive(clap::Args)]
pub struct Request {
    /// Record file: asn,prefix,cidrLength,maxLength[,name] per line
    #[arg(short, long, value_name = "path")]
    pub csv: PathBuf,

    /// PEM private key used to sign each request
    #[arg(short, long, value_name = "path")]
    pub key: PathBuf,

    /// Validity window in weeks (default 312 production, 4 OT&E)
    #[arg(long, value_name = "weeks")]
    pub validity_weeks: Option<i64>,

    #[command(flatten)]
    pub input: InputOptions,
}

impl Request {
    pub async fn run(self, client: &RegistryClient) -> Result<Report, Error> {
        let signer = RoaSigner::from_pem_file(&self.key)?;
        let validity =
            env::resolve_validity(client.host(), self.validity_weeks)?;
        let rows = self.input.read_rows(&self.csv)?;
        client
            .submit_signed(rows, &signer, validity)
            .await
            .map(Report::Batch)
    }
}


//------------ Add -----------------------------------------------------------

/// Submit server-signed ROA specs, one per record.
#[derive(clap::Args)]
pub struct Add {
    /// Record file: asn,prefix,cidrLength,maxLength[,name] per line
    #[arg(short, long, value_name = "path")]
    pub csv: PathBuf,

    /// Ask the registry to renew the ROAs automatically
    #[arg(long)]
    pub auto_renew: bool,

    #[command(flatten)]
    pub input: InputOptions,
}

impl Add {
    pub async fn run(self, client: &RegistryClient) -> Result<Report, Error> {
        let rows = self.input.read_rows(&self.csv)?;
        client
            .submit_specs(rows, self.auto_renew)
            .await
            .map(Report::Batch)
    }
}


//------------ List ----------------------------------------------------------

/// List the registered ROAs.
#[derive(clap::Parser)]
pub struct List;

impl List {
    pub async fn run(self, client: &RegistryClient) -> Result<Report, Error> {
        client.list_roas().await.map(Report::RoaList)
    }
}


//------------ Delete --------------------------------------------------------

/// Delete ROAs by handle.
#[derive(clap::Args)]
pub struct Delete {
    /// File with one roaHandle per line
    #[arg(long, value_name = "path", conflicts_with = "handle")]
    pub handles: Option<PathBuf>,

    /// A single roaHandle
    #[arg(long, value_name = "handle")]
    pub handle: Option<String>,
}

impl Delete {
    pub async fn run(self, client: &RegistryClient) -> Result<Report, Error> {
        let handles = match (self.handles, self.handle) {
            (Some(path), _) => read_handles(&path)?,
            (None, Some(handle)) => vec![handle],
            (None, None) => {
                return Err(Error::config(
                    "nothing to delete: use --handles or --handle",
                ));
            }
        };
        if handles.is_empty() {
            return Err(Error::config("the handle file is empty"));
        }
        Ok(Report::Batch(client.delete_roas(handles).await))
    }
}

/// Reads the handles to delete, one per line, first field only.
fn read_handles(path: &Path) -> Result<Vec<String>, Error> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter_map(|line| {
            let handle = line.split(',').next().unwrap_or("").trim();
            if handle.is_empty() {
                None
            } else {
                Some(handle.to_string())
            }
        })
        .collect())
}


//------------ InputOptions --------------------------------------------------

/// How the record file is read.
#[derive(clap::Args)]
pub struct InputOptions {
    /// Field delimiter
    #[arg(long, default_value = ",", value_name = "char")]
    pub delimiter: char,

    /// What to do with rows that do not parse
    #[arg(long, default_value = "skip", value_name = "skip|abort")]
    pub on_invalid: InvalidRowPolicy,
}

impl InputOptions {
    /// Reads the record file, applying the invalid-row policy.
    ///
    /// Blank lines are ignored. With the skip policy an unparsable row is
    /// kept as an invalid entry so it still shows up in the batch report;
    /// with the abort policy the first one ends the run before anything
    /// is submitted.
    pub fn read_rows(&self, path: &Path) -> Result<Vec<RecordRow>, Error> {
        let content = fs::read_to_string(path)?;
        let mut rows = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            match RoaRequest::from_line(line, self.delimiter) {
                Ok(request) => rows.push(RecordRow::Valid(request)),
                Err(error) => match self.on_invalid {
                    InvalidRowPolicy::Abort => {
                        return Err(Error::InvalidRecord {
                            line: line_no,
                            error,
                        });
                    }
                    InvalidRowPolicy::Skip => {
                        rows.push(RecordRow::Invalid {
                            line: line_no,
                            error,
                        });
                    }
                },
            }
        }
        Ok(rows)
    }
}


//------------ InvalidRowPolicy ----------------------------------------------

/// What to do with input rows that do not parse.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvalidRowPolicy {
    /// Report the row as failed and keep going.
    Skip,

    /// End the run before anything is submitted.
    Abort,
}

impl FromStr for InvalidRowPolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(InvalidRowPolicy::Skip),
            "abort" => Ok(InvalidRowPolicy::Abort),
            _ => Err(PolicyError(s.to_string())),
        }
    }
}


//------------ PolicyError ---------------------------------------------------

#[derive(Clone, Debug)]
pub struct PolicyError(String);

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}' is neither 'skip' nor 'abort'", self.0)
    }
}

impl error::Error for PolicyError {}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn record_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn input(policy: InvalidRowPolicy) -> InputOptions {
        InputOptions { delimiter: ',', on_invalid: policy }
    }

    #[test]
    fn skip_policy_keeps_invalid_rows_in_order() {
        let file = record_file(
            "65000,192.0.2.0,24,24\n\
             \n\
             65001,192.0.2.0,24,23\n\
             65002,198.51.100.0,24,24\n",
        );
        let rows = input(InvalidRowPolicy::Skip)
            .read_rows(file.path())
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(matches!(rows[0], RecordRow::Valid(_)));
        assert!(matches!(rows[1], RecordRow::Invalid { line: 3, .. }));
        assert!(matches!(rows[2], RecordRow::Valid(_)));
    }

    #[test]
    fn abort_policy_ends_the_run_on_the_first_bad_row() {
        let file = record_file(
            "65000,192.0.2.0,24,24\n\
             bad line\n",
        );
        let err = input(InvalidRowPolicy::Abort)
            .read_rows(file.path())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { line: 2, .. }));
    }

    #[test]
    fn handle_files_use_the_first_field() {
        let file = record_file(
            "X15A-ROA-1,65000,192.0.2.0,24\n\
             X15A-ROA-2\n\
             \n",
        );
        assert_eq!(
            read_handles(file.path()).unwrap(),
            vec!["X15A-ROA-1".to_string(), "X15A-ROA-2".to_string()]
        );
    }

    #[test]
    fn policy_parsing() {
        assert_eq!(
            InvalidRowPolicy::from_str("skip").unwrap(),
            InvalidRowPolicy::Skip
        );
        assert_eq!(
            InvalidRowPolicy::from_str("abort").unwrap(),
            InvalidRowPolicy::Abort
        );
        assert!(InvalidRowPolicy::from_str("ignore").is_err());
    }
}
