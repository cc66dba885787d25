use der::Encode;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::extensions::AuthorityKeyIdentifier;
use crate::cert::params::{CertificationRequestInfo, ExtensionParam, Validity, display_name};
use crate::error::Result;
use crate::key::KeyPair;
use crate::serial;
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of issuing certificates.
///
/// Issuance runs in two steps: [`Issuer::prepare`] builds the unsigned
/// TBS certificate, [`Issuer::sign`] signs it.
pub trait Issuer {
    /// Returns the distinguished name placed in the issuer field.
    fn issuer_name(&self) -> Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Builds the unsigned certificate for `cert_request`.
    ///
    /// A fresh serial number is drawn and the request's extensions are kept
    /// in order, except that any authority key identifier is replaced with
    /// one naming this issuer's key.
    fn prepare(
        &self,
        cert_request: &CertificationRequestInfo,
        validity: Validity,
    ) -> Result<TbsCertificate> {
        let signing_key = self.signing_key();
        let authority_key_id = AuthorityKeyIdentifier::for_public_key(&signing_key.as_spki()?);

        let mut tbs_cert = TbsCertificate {
            serial_number: serial::generate_serial()?,
            signature_algorithm: signing_key.signature_algorithm(),
            issuer: self.issuer_name(),
            validity,
            subject: cert_request.subject.clone(),
            subject_public_key_info: cert_request.subject_public_key.clone(),
            extensions: cert_request.extensions.clone(),
        };
        tbs_cert.set_extension(ExtensionParam::from_extension(&authority_key_id, false)?);
        Ok(tbs_cert)
    }

    /// Signs a prepared TBS certificate with this issuer's key.
    fn sign(&self, tbs_cert: &TbsCertificate) -> Result<Certificate> {
        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let signature = self.signing_key().sign_data(&tbs_cert_inner.to_der()?)?;

        let cert_inner = CertificateInner {
            signature_algorithm: tbs_cert_inner.signature.clone(),
            tbs_certificate: tbs_cert_inner,
            signature: der::asn1::BitString::from_bytes(&signature)?,
        };

        let certificate = Certificate { inner: cert_inner };
        log::debug!(
            "issued certificate subject={} issuer={} serial={} not_after={}",
            display_name(&tbs_cert.subject),
            display_name(&tbs_cert.issuer),
            serial::serial_to_decimal(&tbs_cert.serial_number)?,
            tbs_cert.validity.not_after
        );
        Ok(certificate)
    }

    /// Issues a certificate based on the provided certification request information.
    ///
    /// # Arguments
    /// * `cert_request` - Subject, public key and extensions of the new certificate.
    /// * `validity` - The validity window.
    fn issue(
        &self,
        cert_request: &CertificationRequestInfo,
        validity: Validity,
    ) -> Result<Certificate> {
        let tbs_cert = self.prepare(cert_request, validity)?;
        self.sign(&tbs_cert)
    }
}
