//! Engine configuration, read from TOML.
//!
//! ```toml
//! [key]
//! algorithm = "RSA"
//! size = 3072
//!
//! [bundle]
//! macIterations = 2048
//! pbkdf2Iterations = 10000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::convert::BundleOptions;
use crate::error::{CertLifeError, Result};
use crate::key::KeySpec;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Key generated for a root CA when the request does not name one.
    pub key: KeySpec,
    pub bundle: BundleOptions,
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            CertLifeError::InvalidParameter(format!("cannot read {}: {err}", path.display()))
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded engine config from {}", path.display());
        Ok(config)
    }
}
