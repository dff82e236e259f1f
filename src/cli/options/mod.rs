//! The command line options for roactl.

//------------ Sub-modules ---------------------------------------------------

pub mod roas;


//------------ Content -------------------------------------------------------

use std::path::PathBuf;

use clap::Parser;

use crate::cli::client::RegistryClient;
use crate::cli::report::{Report, ReportFormat};
use crate::commons::error::Error;


//------------ Options -------------------------------------------------------

/// The command line options for the roactl client.
#[derive(clap::Parser)]
#[command(
    version,
    about = "ARIN Reg-RWS client for RPKI Route Origin Authorizations.",
)]
pub struct Options {
    #[command(flatten)]
    pub general: GeneralOptions,

    #[command(subcommand)]
    pub command: Command,
}

impl Options {
    /// Creates the options from the process arguments.
    ///
    /// If the arguments won't result in usable options, exits the process.
    pub fn from_args() -> Self {
        Self::parse()
    }
}


//------------ GeneralOptions ------------------------------------------------

/// The options common between all commands.
#[derive(clap::Args)]
pub struct GeneralOptions {
    /// The ARIN ORG-ID holding the address resources
    #[arg(short, long, env = "ROACTL_ORG_ID", value_name = "org-id")]
    pub orgid: Option<String>,

    /// The Reg-RWS API key
    #[arg(
        short, long,
        env = "ROACTL_API_KEY",
        value_name = "key",
        hide_env_values = true,
    )]
    pub apikey: Option<String>,

    /// Talk to the production registry instead of OT&E
    #[arg(short, long)]
    pub production: bool,

    /// Report format
    #[arg(
        long,
        env = "ROACTL_FORMAT",
        default_value = "text",
        value_name = "none|text|json",
    )]
    pub format: ReportFormat,

    /// Only print the API call and exit
    #[arg(long)]
    pub api: bool,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,

    /// Also append log output to this file
    #[arg(long, value_name = "path")]
    pub log_file: Option<PathBuf>,
}


//------------ Command -------------------------------------------------------

#[derive(clap::Subcommand)]
pub enum Command {
    /// Submit client-signed ROA requests from a record file
    Request(roas::Request),

    /// Submit server-signed ROA specs from a record file
    Add(roas::Add),

    /// List the ROAs registered under the ORG-ID
    List(roas::List),

    /// Delete ROAs by their registry handle
    Delete(roas::Delete),
}

impl Command {
    pub async fn run(self, client: &RegistryClient) -> Result<Report, Error> {
        match self {
            Self::Request(cmd) => cmd.run(client).await,
            Self::Add(cmd) => cmd.run(client).await,
            Self::List(cmd) => cmd.run(client).await,
            Self::Delete(cmd) => cmd.run(client).await,
        }
    }
}
