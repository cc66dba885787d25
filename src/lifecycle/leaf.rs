use crate::cert::CertificateWithPrivateKey;
use crate::cert::extensions::{
    ExtendedKeyUsage, KeyUsage, SubjectAltName, SubjectKeyIdentifier, ToAndFromX509Extension,
};
use crate::cert::params::{CertificationRequestInfo, ExtensionParam, Validity};
use crate::error::{CertLifeError, Result};
use crate::issuer::Issuer;
use crate::key::{KeyPair, KeySpec};
use crate::serial::serial_to_decimal;

use super::{IssuedCertificate, LeafRenewRequest, LeafRequest, check_expiry, new_id};

const LEAF_EXPIRY: &str = "Certificate expiry cannot exceed CA expiry";

/// Issues a TLS leaf certificate with a freshly generated key.
///
/// The key uses the CA's algorithm. The certificate carries key usage
/// (critical), server and client auth extended key usage, a subject key
/// identifier, and the subject alternative names when any are given.
pub fn generate_leaf(request: &LeafRequest) -> Result<IssuedCertificate> {
    build_leaf(request).map_err(CertLifeError::into_generation)
}

fn build_leaf(request: &LeafRequest) -> Result<IssuedCertificate> {
    let ca = request.ca.load()?;
    let key_spec = KeySpec::new(
        ca.key.algorithm(),
        request.key_size.unwrap_or_else(|| ca.key.key_size()),
    );
    let validity = Validity::for_days(request.expiry_days)?;
    check_expiry(&validity, &ca.cert, LEAF_EXPIRY)?;

    let key = KeyPair::generate(&key_spec)?;
    let spki = key.as_spki()?;

    let mut extensions = Vec::with_capacity(4);
    if !request.subject_alt_names.is_empty() {
        let san = SubjectAltName {
            names: request.subject_alt_names.clone(),
        };
        extensions.push(ExtensionParam::from_extension(&san, false)?);
    }
    extensions.push(ExtensionParam::from_extension(&KeyUsage::leaf(), true)?);
    extensions.push(ExtensionParam::from_extension(&ExtendedKeyUsage::tls(), false)?);
    extensions.push(ExtensionParam::from_extension(
        &SubjectKeyIdentifier::for_public_key(&spki),
        false,
    )?);

    let cert_info = CertificationRequestInfo::builder()
        .subject(request.subject.as_x509_name()?)
        .subject_public_key(spki)
        .extensions(extensions)
        .build();
    let cert = ca.issue(&cert_info, validity)?;
    log::info!(
        "issued leaf serial={} sans={} not_after={}",
        serial_to_decimal(cert.serial_number())?,
        request.subject_alt_names.len(),
        cert.not_after()
    );
    IssuedCertificate::new(new_id(), &cert, &key, request.comment.clone())
}

/// Re-signs a leaf certificate under the CA's current key.
///
/// Subject, key and every extension of the old certificate are carried
/// over. Key usage and extended key usage are added with the leaf defaults
/// when the old certificate lacks them, and the authority key identifier
/// is refreshed to name the signing CA.
pub fn renew_leaf(request: &LeafRenewRequest) -> Result<IssuedCertificate> {
    build_renewed_leaf(request).map_err(CertLifeError::into_generation)
}

fn build_renewed_leaf(request: &LeafRenewRequest) -> Result<IssuedCertificate> {
    let old = CertificateWithPrivateKey::from_armored(&request.certificate, &request.private_key)?;
    let ca = request.ca.load()?;
    let validity = Validity::for_days(request.expiry_days)?;
    check_expiry(&validity, &ca.cert, LEAF_EXPIRY)?;

    let mut extensions = old.cert.extensions();
    if !extensions.iter().any(|ext| ext.oid == KeyUsage::OID) {
        extensions.push(ExtensionParam::from_extension(&KeyUsage::leaf(), true)?);
    }
    if !extensions.iter().any(|ext| ext.oid == ExtendedKeyUsage::OID) {
        extensions.push(ExtensionParam::from_extension(&ExtendedKeyUsage::tls(), false)?);
    }

    let cert_info = CertificationRequestInfo::builder()
        .subject(old.cert.subject().clone())
        .subject_public_key(old.cert.subject_public_key_info().clone())
        .extensions(extensions)
        .build();
    let cert = ca.issue(&cert_info, validity)?;
    log::info!(
        "renewed leaf serial={} not_after={}",
        serial_to_decimal(cert.serial_number())?,
        cert.not_after()
    );
    IssuedCertificate::new(request.id.clone(), &cert, &old.key, request.comment.clone())
}
