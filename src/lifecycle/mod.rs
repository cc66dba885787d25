//! Certificate issuance and renewal.
//!
//! Each operation takes a serde-friendly request carrying armored key and
//! certificate text, and returns an [`IssuedCertificate`]. Any failure
//! along the way surfaces as [`CertLifeError::Generation`] with the message
//! of the underlying cause; nothing partial is returned.

mod ca;
mod leaf;

pub use ca::{generate_ca, generate_ca_with_config, renew_ca};
pub use leaf::{generate_leaf, renew_leaf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::cert::CertificateWithPrivateKey;
use crate::cert::params::Validity;
use crate::cert::san::SanEntry;
use crate::cert::{Certificate, params::DistinguishedName};
use crate::error::{CertLifeError, Result};
use crate::key::{KeyPair, KeySpec};

/// Armored certificate and private key of a signing CA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentCa {
    pub certificate: String,
    pub private_key: String,
}

impl ParentCa {
    /// Loads the pair and checks that the certificate may sign others.
    pub fn load(&self) -> Result<CertificateWithPrivateKey> {
        let parent = CertificateWithPrivateKey::from_armored(&self.certificate, &self.private_key)?;
        if !parent.cert.is_ca()? {
            return Err(CertLifeError::InvalidParameter(
                "Parent certificate is not a CA".to_string(),
            ));
        }
        Ok(parent)
    }
}

/// Request for a new root or intermediate CA.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaRequest {
    #[serde(flatten)]
    pub subject: DistinguishedName,
    #[serde(alias = "expiry")]
    pub expiry_days: i64,
    /// Key to generate. For an intermediate only the size is used; the
    /// algorithm follows the parent's key.
    #[serde(default)]
    pub key: Option<KeySpec>,
    #[serde(default)]
    pub comment: Option<String>,
    /// When present the new CA is an intermediate signed by this CA.
    #[serde(default)]
    pub parent: Option<ParentCa>,
    /// Lets an intermediate issue one further level of CAs (`pathLen` 1 instead of 0).
    #[serde(default)]
    pub allow_sub_ca: bool,
}

/// Request to re-sign an existing CA with a new validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaRenewRequest {
    pub id: String,
    pub certificate: String,
    pub private_key: String,
    #[serde(alias = "newExpiry")]
    pub expiry_days: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub parent: Option<ParentCa>,
    #[serde(default)]
    pub allow_sub_ca: bool,
}

/// Request for a new leaf certificate signed by `ca`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafRequest {
    pub ca: ParentCa,
    #[serde(flatten)]
    pub subject: DistinguishedName,
    #[serde(default)]
    pub subject_alt_names: Vec<SanEntry>,
    #[serde(alias = "expiry")]
    pub expiry_days: i64,
    /// Key size in bits; defaults to the CA's key size. The algorithm always follows the CA.
    #[serde(default)]
    pub key_size: Option<u32>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Request to re-sign a leaf, keeping its key, under the CA's current key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafRenewRequest {
    pub id: String,
    pub certificate: String,
    pub private_key: String,
    pub ca: ParentCa,
    #[serde(alias = "newExpiry")]
    pub expiry_days: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Result of every issuance and renewal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCertificate {
    /// Fresh UUID on generation; echoed from the request on renewal.
    pub id: String,
    pub algorithm: String,
    pub key_size: u32,
    /// Armored PKCS#8 private key.
    pub private_key: String,
    /// Armored certificate.
    pub certificate: String,
    #[serde(with = "time::serde::rfc3339")]
    pub not_before: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub not_after: OffsetDateTime,
    pub comment: Option<String>,
}

impl IssuedCertificate {
    fn new(id: String, cert: &Certificate, key: &KeyPair, comment: Option<String>) -> Result<Self> {
        Ok(Self {
            id,
            algorithm: key.algorithm().name().to_string(),
            key_size: key.key_size(),
            private_key: key.to_armored()?,
            certificate: cert.to_armored()?,
            not_before: cert.not_before(),
            not_after: cert.not_after(),
            comment,
        })
    }

    /// Parses the issued certificate back.
    pub fn parsed_certificate(&self) -> Result<Certificate> {
        Certificate::from_armored(&self.certificate)
    }

    /// Parses the issued private key back.
    pub fn parsed_key(&self) -> Result<KeyPair> {
        KeyPair::from_armored(&self.private_key)
    }

    /// The certificate and key as a [`ParentCa`], for issuing below it.
    pub fn as_parent(&self) -> ParentCa {
        ParentCa {
            certificate: self.certificate.clone(),
            private_key: self.private_key.clone(),
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn check_expiry(validity: &Validity, parent: &Certificate, message: &str) -> Result<()> {
    if validity.not_after > parent.not_after() {
        return Err(CertLifeError::Generation(message.to_string()));
    }
    Ok(())
}
