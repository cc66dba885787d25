//! Transport encodings for certificates and keys.
//!
//! Two forms cross the engine boundary:
//!
//! - **armored**: a PEM block (`-----BEGIN <LABEL>-----`), base64-encoded once more for transport
//! - **binary**: raw DER, base64-encoded for transport
//!
//! Armored input is accepted either base64-wrapped or as bare PEM text.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{CertLifeError, Result};

/// PEM label for X.509 certificates.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
/// PEM label for PKCS#8 private keys.
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// Convert DER-encoded data into a PEM-encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM-encoded string to DER-encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str)?;
    Ok(pem.contents().to_vec())
}

/// Convert every PEM block carrying `label` to DER, in input order.
pub fn pem_to_der_all(pem_str: &str, label: &str) -> Result<Vec<Vec<u8>>> {
    let blocks = pem::parse_many(pem_str)?;
    Ok(blocks
        .into_iter()
        .filter(|block| block.tag() == label)
        .map(|block| block.contents().to_vec())
        .collect())
}

/// Wraps DER bytes as armored transport text.
pub fn encode_armored(der: &[u8], label: &str) -> String {
    STANDARD.encode(der_to_pem(der, label))
}

/// Wraps several DER objects as one armored text of concatenated PEM blocks.
pub fn encode_armored_all(ders: &[Vec<u8>], label: &str) -> String {
    let pem: String = ders.iter().map(|der| der_to_pem(der, label)).collect();
    STANDARD.encode(pem)
}

/// Unwraps armored transport text to the PEM text it carries.
pub fn armored_to_pem(armored: &str) -> Result<String> {
    let trimmed = armored.trim();
    if trimmed.is_empty() {
        return Err(CertLifeError::InvalidParameter(
            "Armored content cannot be empty".to_string(),
        ));
    }
    if trimmed.starts_with("-----BEGIN") {
        return Ok(trimmed.to_string());
    }
    let compact: String = trimmed.split_whitespace().collect();
    let text = String::from_utf8(STANDARD.decode(compact)?)?;
    Ok(text)
}

/// Decodes armored transport text down to the DER of its first PEM block.
pub fn decode_armored(armored: &str) -> Result<Vec<u8>> {
    pem_to_der(&armored_to_pem(armored)?)
}

/// Decodes armored transport text to the DER of every block labelled `label`.
pub fn decode_armored_all(armored: &str, label: &str) -> Result<Vec<Vec<u8>>> {
    let blocks = pem_to_der_all(&armored_to_pem(armored)?, label)?;
    if blocks.is_empty() {
        return Err(CertLifeError::DecodingError(format!(
            "no {label} block found"
        )));
    }
    Ok(blocks)
}

/// Wraps raw DER for transport.
pub fn encode_binary(der: &[u8]) -> String {
    STANDARD.encode(der)
}

/// Unwraps base64 transport text to raw DER.
pub fn decode_binary(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.split_whitespace().collect();
    if compact.is_empty() {
        return Err(CertLifeError::InvalidParameter(
            "Binary content cannot be empty".to_string(),
        ));
    }
    Ok(STANDARD.decode(compact)?)
}

/// Uppercase hex with a `0x` prefix, the form used in rendered extension values.
pub fn hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex_upper(bytes))
}

/// Uppercase hex without separators.
pub fn hex_upper(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}
