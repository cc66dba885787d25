//! Conversion between armored text, raw binary and PKCS#12 bundles.
//!
//! Failures surface as [`CertLifeError::Conversion`], except missing input
//! which is a [`CertLifeError::InvalidParameter`].

use p12_keystore::{
    Certificate as BagCertificate, EncryptionAlgorithm, KeyStore, KeyStoreEntry, MacAlgorithm,
    PrivateKeyChain,
};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::cert::Certificate;
use crate::codec::{self, CERTIFICATE_LABEL, PRIVATE_KEY_LABEL};
use crate::config::EngineConfig;
use crate::error::{CertLifeError, Result};
use crate::key::KeyPair;

const KEY_ALIAS: &str = "certlife";

/// Iteration counts used when building bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleOptions {
    pub mac_iterations: u32,
    pub pbkdf2_iterations: u32,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            mac_iterations: 1000,
            pbkdf2_iterations: 2048,
        }
    }
}

/// A certificate (or chain) with its optional private key, both in one transport encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateAndKey {
    pub certificate: String,
    pub private_key: Option<String>,
}

/// Everything recovered from a bundle, including a key that failed to load.
#[derive(Debug, Clone, Default)]
pub struct BundleContents {
    /// Certificates in chain order, the key's certificate first.
    pub certificates: Vec<Certificate>,
    pub private_key: Option<KeyPair>,
    /// Why the key entry could not be turned into a key.
    pub key_error: Option<String>,
}

/// Builds a base64 PKCS#12 bundle from an armored certificate chain and optional key.
///
/// The first certificate is the one the key belongs to. Key and certificates
/// are encrypted with PBES2 (PBKDF2-SHA256, AES-256-CBC) and the bundle is
/// protected by an HMAC-SHA256 MAC, both keyed from the (possibly empty)
/// password.
pub fn to_bundle(
    certificate: &str,
    private_key: Option<&str>,
    password: Option<&str>,
) -> Result<String> {
    to_bundle_with_options(certificate, private_key, password, &BundleOptions::default())
}

/// [`to_bundle`] with the iteration counts from an [`EngineConfig`].
pub fn to_bundle_with_config(
    certificate: &str,
    private_key: Option<&str>,
    password: Option<&str>,
    config: &EngineConfig,
) -> Result<String> {
    to_bundle_with_options(certificate, private_key, password, &config.bundle)
}

pub fn to_bundle_with_options(
    certificate: &str,
    private_key: Option<&str>,
    password: Option<&str>,
    options: &BundleOptions,
) -> Result<String> {
    if certificate.trim().is_empty() {
        return Err(CertLifeError::InvalidParameter(
            "At least a certificate must be provided.".to_string(),
        ));
    }
    build_bundle(certificate, private_key, password.unwrap_or(""), options)
        .map_err(CertLifeError::into_conversion)
}

fn build_bundle(
    certificate: &str,
    private_key: Option<&str>,
    password: &str,
    options: &BundleOptions,
) -> Result<String> {
    let cert_ders = codec::decode_armored_all(certificate, CERTIFICATE_LABEL)?;
    let mut chain = Vec::with_capacity(cert_ders.len());
    for der in &cert_ders {
        Certificate::from_der(der)?;
        chain.push(BagCertificate::from_der(der).map_err(keystore_error)?);
    }

    let mut keystore = KeyStore::new();
    let key = private_key.filter(|key| !key.trim().is_empty());
    match key {
        Some(armored_key) => {
            let key_der = KeyPair::from_armored(armored_key)?.to_pkcs8_der()?;
            let local_key_id = Sha1::digest(&cert_ders[0]);
            let key_chain = PrivateKeyChain::new(key_der, local_key_id, chain);
            keystore.add_entry(KEY_ALIAS, KeyStoreEntry::PrivateKeyChain(key_chain));
        }
        None => {
            for (index, cert) in chain.into_iter().enumerate() {
                let alias = format!("{KEY_ALIAS}-{index}");
                keystore.add_entry(&alias, KeyStoreEntry::Certificate(cert));
            }
        }
    }

    let der = keystore
        .writer(password)
        .encryption_algorithm(EncryptionAlgorithm::PbeWithHmacSha256AndAes256)
        .encryption_iterations(options.pbkdf2_iterations.into())
        .mac_algorithm(MacAlgorithm::HmacSha256)
        .mac_iterations(options.mac_iterations.into())
        .write()
        .map_err(keystore_error)?;
    log::debug!(
        "built bundle with {} certificate(s), key={}",
        cert_ders.len(),
        key.is_some()
    );
    Ok(codec::encode_binary(&der))
}

fn keystore_error(err: impl std::fmt::Display) -> CertLifeError {
    CertLifeError::Conversion(err.to_string())
}

/// Extracts the certificates and key from a base64 PKCS#12 bundle.
///
/// All certificates come back as one armored text, the key's certificate
/// first. A key that cannot be loaded fails the whole call; use
/// [`parse_bundle`] to keep the certificates in that case.
pub fn from_bundle(bundle: &str, password: Option<&str>) -> Result<CertificateAndKey> {
    let contents = parse_bundle(bundle, password)?;
    if let Some(err) = contents.key_error {
        return Err(CertLifeError::Conversion(format!(
            "Failed to process private key: {err}"
        )));
    }
    let ders = contents
        .certificates
        .iter()
        .map(Certificate::to_der)
        .collect::<Result<Vec<_>>>()
        .map_err(CertLifeError::into_conversion)?;
    let private_key = contents
        .private_key
        .as_ref()
        .map(KeyPair::to_armored)
        .transpose()
        .map_err(CertLifeError::into_conversion)?;
    Ok(CertificateAndKey {
        certificate: codec::encode_armored_all(&ders, CERTIFICATE_LABEL),
        private_key,
    })
}

/// Parses a bundle, verifying its MAC, without failing on a key of an unsupported type.
///
/// Both PBES2 and the legacy PKCS#12 PBE schemes (3DES, RC2) are read.
pub fn parse_bundle(bundle: &str, password: Option<&str>) -> Result<BundleContents> {
    let der = codec::decode_binary(bundle).map_err(CertLifeError::into_conversion)?;
    read_bundle(&der, password.unwrap_or("")).map_err(CertLifeError::into_conversion)
}

fn read_bundle(der: &[u8], password: &str) -> Result<BundleContents> {
    let keystore = KeyStore::from_pkcs12(der, password).map_err(|err| {
        log::warn!("bundle could not be opened: {err}");
        CertLifeError::Conversion(format!(
            "Cannot open bundle (wrong password or corrupted bundle): {err}"
        ))
    })?;

    let mut contents = BundleContents::default();
    let mut key_chain = Vec::new();
    let mut trusted = Vec::new();
    for (_, entry) in keystore.entries() {
        match entry {
            KeyStoreEntry::PrivateKeyChain(chain) => {
                if contents.private_key.is_some() || contents.key_error.is_some() {
                    log::debug!("ignoring additional key entry");
                    trusted.extend(read_certificates(chain.chain())?);
                    continue;
                }
                match KeyPair::from_pkcs8_der(chain.key()) {
                    Ok(key) => contents.private_key = Some(key),
                    Err(err) => {
                        log::warn!("key entry could not be loaded");
                        contents.key_error = Some(err.to_string());
                    }
                }
                key_chain = read_certificates(chain.chain())?;
            }
            KeyStoreEntry::Certificate(cert) => {
                trusted.push(Certificate::from_der(cert.as_der())?);
            }
        }
    }

    let owner = key_owner(&key_chain, contents.private_key.as_ref());
    for cert in trusted {
        if !key_chain.contains(&cert) {
            key_chain.push(cert);
        }
    }
    contents.certificates = chain_order(key_chain, owner);
    if contents.certificates.is_empty() {
        return Err(CertLifeError::Conversion(
            "No certificate found in bundle".to_string(),
        ));
    }
    Ok(contents)
}

fn read_certificates(chain: &[BagCertificate]) -> Result<Vec<Certificate>> {
    chain
        .iter()
        .map(|cert| Certificate::from_der(cert.as_der()))
        .collect()
}

/// Index of the certificate carrying the key's public key.
fn key_owner(certificates: &[Certificate], key: Option<&KeyPair>) -> Option<usize> {
    let public_key = key?.public_key();
    certificates
        .iter()
        .position(|cert| cert.public_key().is_ok_and(|candidate| candidate == public_key))
}

/// Orders certificates leaf first, each followed by its issuer.
///
/// The leaf is the key's certificate when known, otherwise the first one
/// that issued nothing else in the set. Certificates off that path keep
/// their relative order at the end.
fn chain_order(mut certificates: Vec<Certificate>, leaf: Option<usize>) -> Vec<Certificate> {
    let leaf = leaf.or_else(|| {
        certificates.iter().position(|candidate| {
            !certificates.iter().any(|other| {
                other.issuer() == candidate.subject() && other.subject() != candidate.subject()
            })
        })
    });
    let Some(mut next) = leaf else {
        return certificates;
    };

    let mut ordered = Vec::with_capacity(certificates.len());
    loop {
        let cert = certificates.remove(next);
        let self_signed = cert.issuer() == cert.subject();
        let issuer = cert.issuer().clone();
        ordered.push(cert);
        if self_signed {
            break;
        }
        match certificates.iter().position(|cert| *cert.subject() == issuer) {
            Some(index) => next = index,
            None => break,
        }
    }
    ordered.extend(certificates);
    ordered
}

/// Strips the armor from a certificate and optional key, leaving base64 DER.
pub fn to_binary(certificate: &str, private_key: Option<&str>) -> Result<CertificateAndKey> {
    if certificate.trim().is_empty() {
        return Err(CertLifeError::InvalidParameter(
            "PEM Certificate data cannot be empty".to_string(),
        ));
    }
    let convert = || -> Result<CertificateAndKey> {
        let cert_der = codec::decode_armored(certificate)?;
        let private_key = private_key
            .filter(|key| !key.trim().is_empty())
            .map(|key| codec::decode_armored(key).map(|der| codec::encode_binary(&der)))
            .transpose()?;
        Ok(CertificateAndKey {
            certificate: codec::encode_binary(&cert_der),
            private_key,
        })
    };
    convert().map_err(CertLifeError::into_conversion)
}

/// Armors a base64 DER certificate and optional base64 DER PKCS#8 key.
pub fn from_binary(certificate: &str, private_key: Option<&str>) -> Result<CertificateAndKey> {
    if certificate.trim().is_empty() {
        return Err(CertLifeError::InvalidParameter(
            "DER Certificate data cannot be empty".to_string(),
        ));
    }
    let convert = || -> Result<CertificateAndKey> {
        let cert_der = codec::decode_binary(certificate)?;
        let private_key = private_key
            .filter(|key| !key.trim().is_empty())
            .map(|key| {
                codec::decode_binary(key)
                    .map(|der| codec::encode_armored(&der, PRIVATE_KEY_LABEL))
            })
            .transpose()?;
        Ok(CertificateAndKey {
            certificate: codec::encode_armored(&cert_der, CERTIFICATE_LABEL),
            private_key,
        })
    };
    convert().map_err(CertLifeError::into_conversion)
}
