//! Human-readable rendering of X.509v3 extension values.
//!
//! Renderers are looked up by extension OID in a fixed table. An OID
//! missing from the table renders as a hex dump; a renderer that fails
//! renders as `Parsing failed [<oid>]: <message>`, so one bad extension
//! never hides the others.

use std::collections::BTreeMap;

use const_oid::{AssociatedOid, ObjectIdentifier};
use der::asn1::BitString;
use der::{Any, Decode, Encode, Tag, Tagged};
use once_cell::sync::Lazy;
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName};
use x509_cert::ext::pkix::{
    AuthorityInfoAccessSyntax, AuthorityKeyIdentifier, BasicConstraints, CertificatePolicies,
    CrlDistributionPoints, ExtendedKeyUsage, IssuerAltName, KeyUsage, SubjectAltName,
    SubjectKeyIdentifier,
};

use crate::cert::params::display_name;
use crate::cert::san::ip_address_text;
use crate::codec::hex_prefixed;
use crate::error::{CertLifeError, Result};

type Renderer = fn(&[u8]) -> Result<String>;

static RENDERERS: Lazy<BTreeMap<ObjectIdentifier, Renderer>> = Lazy::new(|| {
    let mut table: BTreeMap<ObjectIdentifier, Renderer> = BTreeMap::new();
    table.insert(SubjectAltName::OID, render_subject_alt_name);
    table.insert(IssuerAltName::OID, render_issuer_alt_name);
    table.insert(KeyUsage::OID, render_key_usage);
    table.insert(ExtendedKeyUsage::OID, render_extended_key_usage);
    table.insert(BasicConstraints::OID, render_basic_constraints);
    table.insert(AuthorityKeyIdentifier::OID, render_authority_key_identifier);
    table.insert(SubjectKeyIdentifier::OID, render_subject_key_identifier);
    table.insert(CrlDistributionPoints::OID, render_crl_distribution_points);
    table.insert(CertificatePolicies::OID, render_certificate_policies);
    table.insert(AuthorityInfoAccessSyntax::OID, render_authority_info_access);
    table
});

const KEY_USAGE_LABELS: [&str; 9] = [
    "Digital Signature",
    "Non Repudiation",
    "Key Encipherment",
    "Data Encipherment",
    "Key Agreement",
    "Certificate Sign",
    "CRL Sign",
    "Encipher Only",
    "Decipher Only",
];

/// Renders one extension value. Never fails.
pub fn render_extension(oid: &ObjectIdentifier, value: &[u8]) -> String {
    match RENDERERS.get(oid) {
        Some(render) => render(value).unwrap_or_else(|err| {
            log::debug!("extension {oid} failed to render: {err}");
            format!("Parsing failed [{oid}]: {err}")
        }),
        None => format!("Unknown: {}", hex_prefixed(value)),
    }
}

/// OIDs that have a dedicated renderer.
pub fn registered_oids() -> Vec<ObjectIdentifier> {
    RENDERERS.keys().copied().collect()
}

/// Builds the renderer table now instead of on first use.
pub(crate) fn warm_up() -> usize {
    RENDERERS.len()
}

fn render_subject_alt_name(value: &[u8]) -> Result<String> {
    Ok(format!("SAN: {}", general_names(value)?.join(", ")))
}

fn render_issuer_alt_name(value: &[u8]) -> Result<String> {
    Ok(format!("IAN: {}", general_names(value)?.join(", ")))
}

/// Walks a `GeneralNames` sequence element by element so that name kinds
/// without a dedicated rendering still show up as `Unknown type N`.
fn general_names(value: &[u8]) -> Result<Vec<String>> {
    let elements = Vec::<Any>::from_der(value)?;
    elements.iter().map(general_name_entry).collect()
}

fn general_name_entry(element: &Any) -> Result<String> {
    let number = match element.tag() {
        Tag::ContextSpecific { number, .. } => number.value(),
        other => {
            return Err(CertLifeError::DecodingError(format!(
                "unexpected tag {other} in GeneralNames"
            )));
        }
    };
    if !matches!(number, 1 | 2 | 4 | 5 | 6 | 7) {
        return Ok(format!(
            "Unknown type {number}: {}",
            hex_prefixed(element.value())
        ));
    }
    let entry = match GeneralName::from_der(&element.to_der()?)? {
        GeneralName::Rfc822Name(v) => format!("Email: {v}"),
        GeneralName::DnsName(v) => format!("DNS: {v}"),
        GeneralName::DirectoryName(name) => format!("DirectoryName: {}", display_name(&name)),
        name @ GeneralName::EdiPartyName(_) => {
            let text = crate::cert::san::SanEntry::from_general_name(&name)
                .map(|entry| entry.value().to_string())
                .unwrap_or_default();
            format!("EDIPartyName: {text}")
        }
        GeneralName::UniformResourceIdentifier(v) => format!("URI: {v}"),
        GeneralName::IpAddress(octets) => format!("IP: {}", ip_address_text(octets.as_bytes())),
        _ => format!("Unknown type {number}: {}", hex_prefixed(element.value())),
    };
    Ok(entry)
}

fn render_key_usage(value: &[u8]) -> Result<String> {
    let any = Any::from_der(value)?;
    if any.tag() != Tag::BitString {
        return Err(CertLifeError::DecodingError(
            "Invalid BIT STRING encoding".to_string(),
        ));
    }
    let bits = BitString::from_der(value)?;
    let usages: Vec<&str> = bits
        .bits()
        .enumerate()
        .filter(|(_, set)| *set)
        .filter_map(|(index, _)| KEY_USAGE_LABELS.get(index).copied())
        .collect();
    Ok(format!("KeyUsage: {}", usages.join(", ")))
}

fn render_extended_key_usage(value: &[u8]) -> Result<String> {
    if Any::from_der(value)?.tag() != Tag::Sequence {
        return Ok("EKU value type error".to_string());
    }
    let eku = ExtendedKeyUsage::from_der(value)?;
    let oids: Vec<String> = eku.0.iter().map(ToString::to_string).collect();
    Ok(format!("EKU: [{}]", oids.join(", ")))
}

fn render_basic_constraints(value: &[u8]) -> Result<String> {
    let bc = BasicConstraints::from_der(value)?;
    let ca = if bc.ca { "CA:TRUE" } else { "CA:FALSE" };
    let path_len = bc
        .path_len_constraint
        .map(|len| format!(", PathLen: {len}"))
        .unwrap_or_default();
    Ok(format!(
        "BasicConstraints: {ca}{path_len} (HEX: {})",
        hex_prefixed(value)
    ))
}

fn render_authority_key_identifier(value: &[u8]) -> Result<String> {
    let aki = AuthorityKeyIdentifier::from_der(value)?;
    Ok(match aki.key_identifier {
        Some(id) => format!("AuthorityKeyIdentifier: {}", hex_prefixed(id.as_bytes())),
        None => "AuthorityKeyIdentifier: No key identifier found".to_string(),
    })
}

fn render_subject_key_identifier(value: &[u8]) -> Result<String> {
    let ski = SubjectKeyIdentifier::from_der(value)?;
    Ok(format!(
        "SubjectKeyIdentifier: {}",
        hex_prefixed(ski.0.as_bytes())
    ))
}

fn render_crl_distribution_points(value: &[u8]) -> Result<String> {
    let points = CrlDistributionPoints::from_der(value)?;
    let uris: Vec<String> = points
        .0
        .iter()
        .filter_map(|point| match &point.distribution_point {
            Some(DistributionPointName::FullName(names)) => Some(names),
            _ => None,
        })
        .flatten()
        .filter_map(|name| match name {
            GeneralName::UniformResourceIdentifier(uri) => Some(format!("URI: {uri}")),
            _ => None,
        })
        .collect();
    Ok(format!("CRLDistributionPoints: {}", uris.join(", ")))
}

fn render_certificate_policies(value: &[u8]) -> Result<String> {
    let policies = CertificatePolicies::from_der(value)?;
    let rendered: Vec<String> = policies
        .0
        .iter()
        .map(|policy| match &policy.policy_qualifiers {
            Some(qualifiers) => {
                let qualifiers: Vec<String> = qualifiers
                    .iter()
                    .map(|q| match &q.qualifier {
                        Some(any) => format!("{}={}", q.policy_qualifier_id, qualifier_text(any)),
                        None => q.policy_qualifier_id.to_string(),
                    })
                    .collect();
                format!(
                    "{} (Qualifiers: {})",
                    policy.policy_identifier,
                    qualifiers.join(", ")
                )
            }
            None => policy.policy_identifier.to_string(),
        })
        .collect();
    Ok(format!("CertificatePolicies: {}", rendered.join(", ")))
}

fn qualifier_text(any: &Any) -> String {
    match any.tag() {
        Tag::Ia5String | Tag::Utf8String | Tag::VisibleString => {
            String::from_utf8_lossy(any.value()).into_owned()
        }
        _ => hex_prefixed(any.value()),
    }
}

fn render_authority_info_access(value: &[u8]) -> Result<String> {
    let aia = AuthorityInfoAccessSyntax::from_der(value)?;
    let descriptions: Vec<String> = aia
        .0
        .iter()
        .filter_map(|ad| match &ad.access_location {
            GeneralName::UniformResourceIdentifier(uri) => {
                Some(format!("{} -> {uri}", ad.access_method))
            }
            _ => None,
        })
        .collect();
    Ok(format!(
        "AuthorityInformationAccess: {}",
        descriptions.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::{
        BasicConstraints as BasicConstraintsParam, KeyUsage as KeyUsageParam,
        SubjectAltName as SubjectAltNameParam, ToAndFromX509Extension,
    };
    use crate::cert::san::SanEntry;
    use der::asn1::{Ia5String, OctetString};
    use x509_cert::ext::pkix::AccessDescription;

    #[test]
    fn test_subject_alt_name_rendering() {
        let value = SubjectAltNameParam {
            names: vec![
                SanEntry::Dns("example.com".into()),
                SanEntry::Ip("10.0.0.1".into()),
                SanEntry::Email("ops@example.com".into()),
            ],
        }
        .to_x509_extension_value()
        .unwrap();
        assert_eq!(
            render_extension(&SubjectAltName::OID, &value),
            "SAN: DNS: example.com, IP: 10.0.0.1, Email: ops@example.com"
        );
    }

    #[test]
    fn test_unknown_general_name_kind() {
        // [8] registeredID 1.2.3
        let value = [0x30, 0x04, 0x88, 0x02, 0x2A, 0x03];
        assert_eq!(
            render_extension(&SubjectAltName::OID, &value),
            "SAN: Unknown type 8: 0x2A03"
        );
    }

    #[test]
    fn test_odd_length_ip_falls_back_to_hex() {
        let value = [0x30, 0x04, 0x87, 0x02, 0x0A, 0x00];
        assert_eq!(
            render_extension(&SubjectAltName::OID, &value),
            "SAN: IP: 0x0A00"
        );
    }

    #[test]
    fn test_key_usage_labels() {
        let value = KeyUsageParam::ca().to_x509_extension_value().unwrap();
        assert_eq!(
            render_extension(&KeyUsage::OID, &value),
            "KeyUsage: Digital Signature, Certificate Sign, CRL Sign"
        );
    }

    #[test]
    fn test_malformed_key_usage() {
        let rendered = render_extension(&KeyUsage::OID, &[0x04, 0x01, 0xFF]);
        assert!(rendered.starts_with("Parsing failed [2.5.29.15]: "), "{rendered}");
    }

    #[test]
    fn test_extended_key_usage() {
        let value = crate::cert::extensions::ExtendedKeyUsage::tls()
            .to_x509_extension_value()
            .unwrap();
        assert_eq!(
            render_extension(&ExtendedKeyUsage::OID, &value),
            "EKU: [1.3.6.1.5.5.7.3.1, 1.3.6.1.5.5.7.3.2]"
        );
        assert_eq!(
            render_extension(&ExtendedKeyUsage::OID, &[0x05, 0x00]),
            "EKU value type error"
        );
    }

    #[test]
    fn test_basic_constraints() {
        let value = BasicConstraintsParam {
            is_ca: true,
            max_path_length: Some(1),
        }
        .to_x509_extension_value()
        .unwrap();
        assert_eq!(
            render_extension(&BasicConstraints::OID, &value),
            "BasicConstraints: CA:TRUE, PathLen: 1 (HEX: 0x30060101FF020101)"
        );
        assert_eq!(
            render_extension(&BasicConstraints::OID, &[0x30, 0x00]),
            "BasicConstraints: CA:FALSE (HEX: 0x3000)"
        );
    }

    #[test]
    fn test_key_identifiers() {
        assert_eq!(
            render_extension(&SubjectKeyIdentifier::OID, &[0x04, 0x02, 0xAB, 0xCD]),
            "SubjectKeyIdentifier: 0xABCD"
        );
        assert_eq!(
            render_extension(&AuthorityKeyIdentifier::OID, &[0x30, 0x04, 0x80, 0x02, 0x01, 0x02]),
            "AuthorityKeyIdentifier: 0x0102"
        );
        assert_eq!(
            render_extension(&AuthorityKeyIdentifier::OID, &[0x30, 0x00]),
            "AuthorityKeyIdentifier: No key identifier found"
        );
    }

    #[test]
    fn test_authority_info_access() {
        let aia = AuthorityInfoAccessSyntax(vec![AccessDescription {
            access_method: const_oid::db::rfc5912::ID_AD_OCSP,
            access_location: GeneralName::UniformResourceIdentifier(
                Ia5String::new("http://ocsp.example.com").unwrap(),
            ),
        }]);
        let value = aia.to_der().unwrap();
        assert_eq!(
            render_extension(&AuthorityInfoAccessSyntax::OID, &value),
            "AuthorityInformationAccess: 1.3.6.1.5.5.7.48.1 -> http://ocsp.example.com"
        );
    }

    #[test]
    fn test_unknown_extension_is_hex() {
        let oid = ObjectIdentifier::new_unwrap("1.2.3.4");
        let value = OctetString::new(vec![0x01]).unwrap().to_der().unwrap();
        assert_eq!(render_extension(&oid, &value), "Unknown: 0x040101");
    }

    #[test]
    fn test_registered_oids() {
        assert_eq!(registered_oids().len(), 10);
    }
}
