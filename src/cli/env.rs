//! Choosing between the production and the test registry.

use std::io::{self, BufRead};

use chrono::Duration;

use crate::commons::error::Error;
use crate::constants::{
    REGISTRY_HOST_OTE, REGISTRY_HOST_PRODUCTION, VALIDITY_WEEKS_OTE_MAX,
    VALIDITY_WEEKS_PRODUCTION,
};


//------------ RegistryHost --------------------------------------------------

/// The registry environment every call in a run is directed at.
///
/// Resolved exactly once per invocation and then passed along explicitly;
/// nothing downstream second-guesses it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RegistryHost {
    Production,
    TestOte,
}

impl RegistryHost {
    pub fn hostname(self) -> &'static str {
        match self {
            RegistryHost::Production => REGISTRY_HOST_PRODUCTION,
            RegistryHost::TestOte => REGISTRY_HOST_OTE,
        }
    }

    /// The default validity window for signed requests, in weeks.
    pub fn default_validity_weeks(self) -> i64 {
        match self {
            RegistryHost::Production => VALIDITY_WEEKS_PRODUCTION,
            RegistryHost::TestOte => VALIDITY_WEEKS_OTE_MAX,
        }
    }
}


//------------ ConfirmationSource --------------------------------------------

/// Where the tokens for the production confirmation gate come from.
///
/// The binary reads standard input; tests inject scripted answers.
pub trait ConfirmationSource {
    fn read_token(&mut self, prompt: &str) -> io::Result<String>;
}

/// Reads confirmation tokens from standard input.
pub struct StdinConfirmation;

impl ConfirmationSource for StdinConfirmation {
    fn read_token(&mut self, prompt: &str) -> io::Result<String> {
        println!("{}", prompt);
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }
}


//------------ resolve -------------------------------------------------------

const FIRST_PROMPT: &str =
    "To execute this against the PRODUCTION registry, type 'production'. \
     Anything else aborts the run.";

const SECOND_PROMPT: &str =
    "Please confirm once more that you REALLY want to use the production \
     registry by typing 'yes'.";

/// Resolves the target environment for this run.
///
/// Without the production flag this is always OT&E and no questions are
/// asked. With the flag the operator has to type two matching tokens,
/// checked after trimming and lowercasing. Anything else aborts the run:
/// a typo must never quietly select a different registry than the one the
/// operator believes they are talking to.
pub fn resolve(
    production_requested: bool,
    confirm: &mut dyn ConfirmationSource,
) -> Result<RegistryHost, Error> {
    if !production_requested {
        return Ok(RegistryHost::TestOte);
    }
    let token = confirm
        .read_token(FIRST_PROMPT)
        .map_err(|_| Error::GateDeclined)?;
    if token.trim().to_ascii_lowercase() != "production" {
        return Err(Error::GateDeclined);
    }
    let token = confirm
        .read_token(SECOND_PROMPT)
        .map_err(|_| Error::GateDeclined)?;
    if token.trim().to_ascii_lowercase() != "yes" {
        return Err(Error::GateDeclined);
    }
    Ok(RegistryHost::Production)
}

/// Resolves the validity window for signed requests in this environment.
///
/// The OT&E certificate authority caps the window at four weeks. Asking
/// for more there is a configuration error raised before any network
/// call, not something to fix up silently.
pub fn resolve_validity(
    host: RegistryHost,
    override_weeks: Option<i64>,
) -> Result<Duration, Error> {
    let weeks = override_weeks.unwrap_or(host.default_validity_weeks());
    if weeks <= 0 {
        return Err(Error::config(format!(
            "validity of {} weeks is not usable", weeks
        )));
    }
    if host == RegistryHost::TestOte && weeks > VALIDITY_WEEKS_OTE_MAX {
        return Err(Error::config(format!(
            "validity of {} weeks exceeds the OT&E maximum of {} weeks",
            weeks, VALIDITY_WEEKS_OTE_MAX
        )));
    }
    Ok(Duration::weeks(weeks))
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Answers prompts from a fixed script.
    struct Scripted(Vec<&'static str>);

    impl ConfirmationSource for Scripted {
        fn read_token(&mut self, _prompt: &str) -> io::Result<String> {
            if self.0.is_empty() {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
            }
            Ok(self.0.remove(0).to_string())
        }
    }

    /// Fails the test when anything asks a question.
    struct NoPrompts;

    impl ConfirmationSource for NoPrompts {
        fn read_token(&mut self, _prompt: &str) -> io::Result<String> {
            panic!("resolver prompted without the production flag");
        }
    }

    #[test]
    fn default_is_ote_without_any_prompt() {
        assert_eq!(
            resolve(false, &mut NoPrompts).unwrap(),
            RegistryHost::TestOte
        );
    }

    #[test]
    fn production_needs_both_tokens() {
        assert_eq!(
            resolve(true, &mut Scripted(vec!["production\n", "yes\n"]))
                .unwrap(),
            RegistryHost::Production
        );
    }

    #[test]
    fn tokens_are_trimmed_and_lowercased() {
        assert_eq!(
            resolve(true, &mut Scripted(vec!["  Production  \n", "YES\n"]))
                .unwrap(),
            RegistryHost::Production
        );
    }

    #[test]
    fn wrong_first_token_aborts() {
        assert!(matches!(
            resolve(true, &mut Scripted(vec!["prod\n"])).unwrap_err(),
            Error::GateDeclined
        ));
    }

    #[test]
    fn wrong_second_token_aborts() {
        assert!(matches!(
            resolve(true, &mut Scripted(vec!["production\n", "no\n"]))
                .unwrap_err(),
            Error::GateDeclined
        ));
    }

    #[test]
    fn empty_input_aborts() {
        assert!(resolve(true, &mut Scripted(vec![""])).is_err());
        assert!(resolve(true, &mut Scripted(vec![])).is_err());
    }

    #[test]
    fn validity_defaults_differ_per_environment() {
        assert_eq!(
            resolve_validity(RegistryHost::Production, None).unwrap(),
            Duration::weeks(312)
        );
        assert_eq!(
            resolve_validity(RegistryHost::TestOte, None).unwrap(),
            Duration::weeks(4)
        );
    }

    #[test]
    fn ote_validity_is_capped() {
        assert!(
            resolve_validity(RegistryHost::TestOte, Some(5)).is_err()
        );
        assert_eq!(
            resolve_validity(RegistryHost::TestOte, Some(2)).unwrap(),
            Duration::weeks(2)
        );
    }

    #[test]
    fn production_validity_is_not_capped() {
        assert_eq!(
            resolve_validity(RegistryHost::Production, Some(520)).unwrap(),
            Duration::weeks(520)
        );
    }

    #[test]
    fn non_positive_validity_is_rejected() {
        assert!(
            resolve_validity(RegistryHost::Production, Some(0)).is_err()
        );
        assert!(
            resolve_validity(RegistryHost::Production, Some(-1)).is_err()
        );
    }
}
