//! Certificate and private key inspection.
//!
//! Decode failures surface as the raw error of the failing layer; this
//! module adds no translation of its own.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use const_oid::db::{DB, rfc5912};
use der::Encode;
use serde::Serialize;
use time::OffsetDateTime;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::Certificate;
use crate::cert::params::display_name;
use crate::codec;
use crate::error::{CertLifeError, Result};
use crate::key::{KeyParameters, KeyPair, PublicKey};
use crate::render::render_extension;
use crate::serial::serial_to_decimal;

/// Fixed message signed and verified by [`verify_key_pair`].
pub const VERIFICATION_PLAINTEXT: &[u8] = b"CertVaultVerification";

/// Decoded view of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDetails {
    pub subject: String,
    pub issuer: String,
    /// Serial number in decimal.
    pub serial_number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub not_before: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub not_after: OffsetDateTime,
    pub public_key: PublicKeyDetails,
    /// Rendered extension values keyed by dotted OID.
    pub extensions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyDetails {
    /// `RSA`, `EC` or `Ed25519`; other key types by their registered OID name.
    pub algorithm: String,
    /// Zero when the size cannot be told from the encoding.
    pub key_size: u32,
    /// Base64 of the DER `SubjectPublicKeyInfo`.
    pub encoded: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateKeyDetails {
    pub algorithm: String,
    pub key_size: u32,
    pub format: String,
    /// Base64 of the DER PKCS#8 `PrivateKeyInfo`.
    pub encoded: String,
    pub params: KeyParameters,
}

/// Decodes an armored certificate into its detail view.
///
/// Every extension is rendered independently; one that fails to parse shows
/// up as a `Parsing failed` string without affecting the others.
pub fn analyze(armored_cert: &str) -> Result<CertificateDetails> {
    let cert = Certificate::from_armored(armored_cert)?;
    analyze_certificate(&cert)
}

/// Like [`analyze`] for an already parsed certificate.
pub fn analyze_certificate(cert: &Certificate) -> Result<CertificateDetails> {
    let extensions = cert
        .extensions()
        .iter()
        .map(|ext| (ext.oid.to_string(), render_extension(&ext.oid, &ext.value)))
        .collect();

    Ok(CertificateDetails {
        subject: display_name(cert.subject()),
        issuer: display_name(cert.issuer()),
        serial_number: serial_to_decimal(cert.serial_number())?,
        not_before: cert.not_before(),
        not_after: cert.not_after(),
        public_key: public_key_details(cert.subject_public_key_info())?,
        extensions,
    })
}

/// Describes a public key, falling back to its identifiers for key types
/// the engine cannot load.
fn public_key_details(spki: &SubjectPublicKeyInfoOwned) -> Result<PublicKeyDetails> {
    let encoded = STANDARD.encode(spki.to_der()?);
    let (algorithm, key_size) = match PublicKey::from_x509spki(spki) {
        Ok(key) => (key.algorithm_name().to_string(), key.key_size()),
        Err(err) => {
            log::debug!("describing public key from its identifiers: {err}");
            describe_unloaded_key(spki)
        }
    };
    Ok(PublicKeyDetails {
        algorithm,
        key_size,
        encoded,
    })
}

fn describe_unloaded_key(spki: &SubjectPublicKeyInfoOwned) -> (String, u32) {
    let oid = spki.algorithm.oid;
    if oid != rfc5912::ID_EC_PUBLIC_KEY {
        let name = DB.by_oid(&oid).map_or_else(|| oid.to_string(), str::to_string);
        return (name, 0);
    }
    // SEC1 point: 0x04 || X || Y uncompressed, 0x02/0x03 || X compressed.
    let point = spki.subject_public_key.raw_bytes();
    let coordinate_len = match point.first() {
        Some(0x04) => point.len().saturating_sub(1) / 2,
        Some(0x02 | 0x03) => point.len().saturating_sub(1),
        _ => 0,
    };
    ("EC".to_string(), (coordinate_len * 8) as u32)
}

/// Checks that `armored_key` is the private half of the key in `armored_cert`.
///
/// Signs [`VERIFICATION_PLAINTEXT`] with the private key and verifies the
/// signature with the certificate's public key. Keys of a different
/// algorithm or curve simply do not verify.
pub fn verify_key_pair(armored_key: &str, armored_cert: &str) -> Result<bool> {
    let key = KeyPair::from_armored(armored_key)?;
    let cert = Certificate::from_armored(armored_cert)?;
    let public_key = cert.public_key()?;

    if key.algorithm() != public_key.algorithm() {
        log::debug!(
            "key pair check: key is {}, certificate is {}",
            key.algorithm().name(),
            public_key.algorithm_name()
        );
        return Ok(false);
    }
    log::debug!(
        "key pair check with {}",
        key.signature_algorithm().name()
    );
    let signature = key.sign_data(VERIFICATION_PLAINTEXT)?;
    // A signature from another curve may not even parse as this curve's signature.
    Ok(public_key
        .verify(VERIFICATION_PLAINTEXT, &signature)
        .unwrap_or(false))
}

/// Returns the CA flag of the certificate's basic constraints, `false` when absent.
pub fn verify_is_ca(armored_cert: &str) -> Result<bool> {
    if armored_cert.trim().is_empty() {
        return Err(CertLifeError::InvalidParameter(
            "Certificate content cannot be empty".to_string(),
        ));
    }
    Certificate::from_armored(armored_cert)?.is_ca()
}

/// Decodes an armored PKCS#8 private key into its detail view.
pub fn analyze_private_key(armored_key: &str) -> Result<PrivateKeyDetails> {
    let key = KeyPair::from_armored(armored_key)?;
    let der = codec::decode_armored(armored_key)?;
    Ok(PrivateKeyDetails {
        algorithm: key.algorithm().name().to_string(),
        key_size: key.key_size(),
        format: "PKCS#8".to_string(),
        encoded: STANDARD.encode(der),
        params: key.details()?,
    })
}
