//! The roactl binary.

use std::path::Path;
use std::{io, process};

use log::LevelFilter;

use roactl::cli::client::RegistryClient;
use roactl::cli::options::Options;

/// Creates and applies a fern logger for this run.
fn setup_logging(
    debug: bool,
    log_file: Option<&Path>,
) -> Result<(), String> {
    let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };

    // suppress overly noisy logging from the HTTP stack
    let framework_level = level.min(LevelFilter::Warn);

    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(level)
        .level_for("reqwest", framework_level)
        .level_for("hyper", framework_level)
        .level_for("hyper_util", framework_level)
        .level_for("mio", framework_level)
        .level_for("want", framework_level)
        .chain(io::stderr());

    if let Some(path) = log_file {
        let file = fern::log_file(path).map_err(|err| {
            format!("cannot open log file '{}': {}", path.display(), err)
        })?;
        dispatch = dispatch.chain(file);
    }

    dispatch
        .apply()
        .map_err(|err| format!("cannot initialize logging: {}", err))
}

#[tokio::main]
async fn main() {
    let options = Options::from_args();
    if let Err(err) = setup_logging(
        options.general.debug,
        options.general.log_file.as_deref(),
    ) {
        eprintln!("{}", err);
        process::exit(1);
    }
    if let Err(err) = RegistryClient::report(options).await {
        eprintln!("{}", err);
        process::exit(1);
    }
}
