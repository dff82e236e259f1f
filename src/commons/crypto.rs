//! Signing request payloads with the operator held private key.

use std::path::{Path, PathBuf};
use std::{fmt, fs, io};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::sign::Signer;


//------------ RoaSigner -----------------------------------------------------

/// Signs ROA request payloads with the operator's private key.
///
/// The PEM key file is read once when the signer is created and the parsed
/// key is held in memory, read-only, for the lifetime of the process. The
/// key material itself must never end up in any log output; errors carry
/// the path, never the content.
#[derive(Debug)]
pub struct RoaSigner {
    pkey: PKey<Private>,
}

impl RoaSigner {
    /// Creates a signer from a PEM encoded private key file.
    pub fn from_pem_file(path: &Path) -> Result<Self, KeyError> {
        let pem = fs::read(path)
            .map_err(|err| KeyError::Io(path.to_path_buf(), err))?;
        let pkey = PKey::private_key_from_pem(&pem)
            .map_err(|err| KeyError::Parse(path.to_path_buf(), err))?;
        Ok(RoaSigner { pkey })
    }

    /// Returns the base64 encoded SHA-256 signature over the payload bytes.
    pub fn sign(&self, payload: &str) -> Result<String, KeyError> {
        let mut signer = Signer::new(MessageDigest::sha256(), &self.pkey)
            .map_err(KeyError::Signing)?;
        signer.update(payload.as_bytes()).map_err(KeyError::Signing)?;
        let signature = signer.sign_to_vec().map_err(KeyError::Signing)?;
        Ok(BASE64.encode(signature))
    }
}


//------------ KeyError ------------------------------------------------------

/// The private key could not be loaded or used.
///
/// Any of these is fatal for the whole run: without a working key no
/// record can be submitted.
#[derive(Debug)]
pub enum KeyError {
    Io(PathBuf, io::Error),
    Parse(PathBuf, ErrorStack),
    Signing(ErrorStack),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyError::Io(path, err) => {
                write!(
                    f, "cannot read private key file '{}': {}",
                    path.display(), err
                )
            }
            KeyError::Parse(path, err) => {
                write!(
                    f,
                    "cannot parse '{}' as a PEM encoded private key: {}",
                    path.display(), err
                )
            }
            KeyError::Signing(err) => write!(f, "signing failed: {}", err),
        }
    }
}


//------------ Tests ---------------------------------------------------------
