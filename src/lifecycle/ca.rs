use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::extensions::{BasicConstraints, KeyUsage, SubjectKeyIdentifier};
use crate::cert::params::{CertificationRequestInfo, ExtensionParam, Validity};
use crate::cert::{Certificate, CertificateWithPrivateKey};
use crate::config::EngineConfig;
use crate::error::{CertLifeError, Result};
use crate::issuer::Issuer;
use crate::key::{KeyPair, KeySpec};
use crate::serial::serial_to_decimal;

use super::{CaRenewRequest, CaRequest, IssuedCertificate, check_expiry, new_id};

const SUB_CA_EXPIRY: &str = "Sub CA expiry cannot exceed parent CA expiry";

/// Generates a root CA, or an intermediate when the request names a parent.
///
/// Uses [`EngineConfig::default`] for the key when the request has none.
pub fn generate_ca(request: &CaRequest) -> Result<IssuedCertificate> {
    generate_ca_with_config(request, &EngineConfig::default())
}

/// Like [`generate_ca`], taking the default key from `config`.
pub fn generate_ca_with_config(
    request: &CaRequest,
    config: &EngineConfig,
) -> Result<IssuedCertificate> {
    build_ca(request, config).map_err(CertLifeError::into_generation)
}

fn build_ca(request: &CaRequest, config: &EngineConfig) -> Result<IssuedCertificate> {
    let parent = request.parent.as_ref().map(|p| p.load()).transpose()?;
    let key_spec = match &parent {
        Some(parent) => KeySpec::new(
            parent.key.algorithm(),
            request
                .key
                .map(|spec| spec.size)
                .unwrap_or_else(|| parent.key.key_size()),
        ),
        None => request.key.unwrap_or(config.key),
    };
    let validity = Validity::for_days(request.expiry_days)?;
    let key = KeyPair::generate(&key_spec)?;
    let subject = request.subject.as_x509_name()?;

    let path_len = match &parent {
        Some(parent) => {
            let path_len = sub_ca_path_len(request.allow_sub_ca);
            check_path_len(&parent.cert, path_len)?;
            check_expiry(&validity, &parent.cert, SUB_CA_EXPIRY)?;
            Some(path_len)
        }
        None => None,
    };

    let spki = key.as_spki()?;
    let cert_info = CertificationRequestInfo::builder()
        .subject(subject)
        .subject_public_key(spki.clone())
        .extensions(ca_extensions(path_len, &spki)?)
        .build();

    let cert = match &parent {
        Some(parent) => parent.issue(&cert_info, validity)?,
        None => Certificate::new_self_signed(&cert_info, &key, validity)?,
    };
    log::info!(
        "generated {} CA serial={} not_after={}",
        if parent.is_some() { "intermediate" } else { "root" },
        serial_to_decimal(cert.serial_number())?,
        cert.not_after()
    );
    IssuedCertificate::new(new_id(), &cert, &key, request.comment.clone())
}

/// Re-signs a CA certificate with a new serial and validity window.
///
/// The subject and key are kept. Without a parent the renewed certificate
/// is self-signed; with one it is signed by the parent, whose subject must
/// match the old certificate's issuer. Only basic constraints, key usage and
/// the key identifiers are carried on the renewed certificate.
pub fn renew_ca(request: &CaRenewRequest) -> Result<IssuedCertificate> {
    build_renewed_ca(request).map_err(CertLifeError::into_generation)
}

fn build_renewed_ca(request: &CaRenewRequest) -> Result<IssuedCertificate> {
    let old = CertificateWithPrivateKey::from_armored(&request.certificate, &request.private_key)?;
    let parent = request.parent.as_ref().map(|p| p.load()).transpose()?;
    let validity = Validity::for_days(request.expiry_days)?;

    let path_len = match &parent {
        Some(parent) => {
            if parent.cert.subject() != old.cert.issuer() {
                return Err(CertLifeError::Generation(
                    "Parent CA does not match the issuer of the old certificate".to_string(),
                ));
            }
            let path_len = sub_ca_path_len(request.allow_sub_ca);
            check_path_len(&parent.cert, path_len)?;
            check_expiry(&validity, &parent.cert, SUB_CA_EXPIRY)?;
            Some(path_len)
        }
        None => None,
    };

    let spki = old.cert.subject_public_key_info().clone();
    let cert_info = CertificationRequestInfo::builder()
        .subject(old.cert.subject().clone())
        .subject_public_key(spki.clone())
        .extensions(ca_extensions(path_len, &spki)?)
        .build();

    let cert = match &parent {
        Some(parent) => parent.issue(&cert_info, validity)?,
        None => old.issue(&cert_info, validity)?,
    };
    log::info!(
        "renewed CA serial={} not_after={}",
        serial_to_decimal(cert.serial_number())?,
        cert.not_after()
    );
    IssuedCertificate::new(request.id.clone(), &cert, &old.key, request.comment.clone())
}

fn sub_ca_path_len(allow_sub_ca: bool) -> u8 {
    if allow_sub_ca { 1 } else { 0 }
}

/// Rejects a sub CA whose path length is larger than the parent allows.
fn check_path_len(parent: &Certificate, path_len: u8) -> Result<()> {
    let limit = parent
        .basic_constraints()?
        .and_then(|bc| bc.max_path_length);
    match limit {
        Some(limit) if path_len > limit => Err(CertLifeError::Generation(
            "Parent CA does not allow issuing CA with this path length".to_string(),
        )),
        _ => Ok(()),
    }
}

fn ca_extensions(
    path_len: Option<u8>,
    spki: &SubjectPublicKeyInfoOwned,
) -> Result<Vec<ExtensionParam>> {
    let basic_constraints = BasicConstraints {
        is_ca: true,
        max_path_length: path_len,
    };
    Ok(vec![
        ExtensionParam::from_extension(&basic_constraints, true)?,
        ExtensionParam::from_extension(&KeyUsage::ca(), true)?,
        ExtensionParam::from_extension(&SubjectKeyIdentifier::for_public_key(spki), false)?,
    ])
}
