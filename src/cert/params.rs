use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{Ia5StringRef, OctetString, PrintableStringRef, SetOfVec, Utf8StringRef};
use der::{Any, Tag, Tagged};
use serde::{Deserialize, Serialize};
use time::Duration;
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::ext::Extension;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use super::extensions::ToAndFromX509Extension;
use crate::codec;
use crate::error::{CertLifeError, Result};

/// Attribute type OIDs used in subject and issuer names.
pub mod name_oids {
    use const_oid::ObjectIdentifier;

    pub const COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
    pub const STATE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
    pub const LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
    pub const ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
    pub const ORGANIZATION_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
    pub const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
    pub const EMAIL: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");
}

/// Parameters for issuing one certificate.
///
/// # Fields
/// * `subject` - The encoded subject name.
/// * `subject_public_key` - The subject's public key, as it will appear in the certificate.
/// * `extensions` - Extensions to attach, in order. The issuer adds its own authority key identifier.
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequestInfo {
    pub subject: Name,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

/// Distinguished name fields of an issuance request.
///
/// Country, organizational unit and common name are required; the
/// other attributes are left out of the encoded name when blank.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistinguishedName {
    #[builder(into)]
    pub country: String,
    #[serde(default, alias = "province")]
    #[builder(into)]
    pub state: Option<String>,
    #[serde(default, alias = "city")]
    #[builder(into)]
    pub locality: Option<String>,
    #[serde(default)]
    #[builder(into)]
    pub organization: Option<String>,
    #[builder(into)]
    pub organization_unit: String,
    #[builder(into)]
    pub common_name: String,
    #[serde(default)]
    #[builder(into)]
    pub email: Option<String>,
}

impl DistinguishedName {
    /// Encodes the name with attributes in the order
    /// C, ST, L, O, OU, CN, emailAddress, one attribute per RDN.
    pub fn as_x509_name(&self) -> Result<Name> {
        for (field, value) in [
            ("country", &self.country),
            ("organization unit", &self.organization_unit),
            ("common name", &self.common_name),
        ] {
            if value.trim().is_empty() {
                return Err(CertLifeError::InvalidParameter(format!(
                    "Subject {field} cannot be empty"
                )));
            }
        }

        let attributes = [
            (name_oids::COUNTRY, Some(&self.country)),
            (name_oids::STATE, self.state.as_ref()),
            (name_oids::LOCALITY, self.locality.as_ref()),
            (name_oids::ORGANIZATION, self.organization.as_ref()),
            (name_oids::ORGANIZATION_UNIT, Some(&self.organization_unit)),
            (name_oids::COMMON_NAME, Some(&self.common_name)),
            (name_oids::EMAIL, self.email.as_ref()),
        ];

        let mut rdns = Vec::with_capacity(attributes.len());
        for (oid, value) in attributes {
            let Some(value) = value.map(|v| v.trim()).filter(|v| !v.is_empty()) else {
                continue;
            };
            let atv = AttributeTypeAndValue {
                oid,
                value: attribute_value(oid, value)?,
            };
            rdns.push(RelativeDistinguishedName(SetOfVec::try_from(vec![atv])?));
        }
        Ok(RdnSequence(rdns))
    }

    /// Reads the recognised attributes back out of an encoded name.
    pub fn from_x509_name(x509dn: &Name) -> Self {
        let mut dn = DistinguishedName::default();
        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let text = attribute_text(&attr.value);
                match attr.oid {
                    name_oids::COUNTRY => dn.country = text,
                    name_oids::STATE => dn.state = Some(text),
                    name_oids::LOCALITY => dn.locality = Some(text),
                    name_oids::ORGANIZATION => dn.organization = Some(text),
                    name_oids::ORGANIZATION_UNIT => dn.organization_unit = text,
                    name_oids::COMMON_NAME => dn.common_name = text,
                    name_oids::EMAIL => dn.email = Some(text),
                    _ => {}
                }
            }
        }
        dn
    }
}

fn attribute_value(oid: ObjectIdentifier, value: &str) -> Result<Any> {
    let tag = match oid {
        name_oids::COUNTRY => PrintableStringRef::new(value)?.tag(),
        name_oids::EMAIL => Ia5StringRef::new(value)?.tag(),
        _ => Utf8StringRef::new(value)?.tag(),
    };
    Ok(Any::new(tag, value.as_bytes())?)
}

fn attribute_text(value: &Any) -> String {
    match value.tag() {
        Tag::Utf8String
        | Tag::PrintableString
        | Tag::Ia5String
        | Tag::TeletexString
        | Tag::VisibleString => String::from_utf8_lossy(value.value()).into_owned(),
        _ => codec::hex_prefixed(value.value()),
    }
}

fn attribute_label(oid: &ObjectIdentifier) -> String {
    match *oid {
        name_oids::COUNTRY => "C".to_string(),
        name_oids::STATE => "ST".to_string(),
        name_oids::LOCALITY => "L".to_string(),
        name_oids::ORGANIZATION => "O".to_string(),
        name_oids::ORGANIZATION_UNIT => "OU".to_string(),
        name_oids::COMMON_NAME => "CN".to_string(),
        name_oids::EMAIL => "E".to_string(),
        other => other.to_string(),
    }
}

/// Renders a name in encoded order, e.g. `C=US,ST=CA,O=Acme,OU=IT,CN=Acme Root`.
pub fn display_name(name: &Name) -> String {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .map(|attr| format!("{}={}", attribute_label(&attr.oid), attribute_text(&attr.value)))
        .collect::<Vec<_>>()
        .join(",")
}

const SECONDS_PER_DAY: i64 = 86_400;

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    ///
    /// The start is truncated to whole seconds, the resolution certificates store.
    pub fn for_days(days: i64) -> Result<Self> {
        let now = OffsetDateTime::now_utc();
        Self::starting_at(now.replace_nanosecond(0).unwrap_or(now), days)
    }

    /// Creates a validity period of `days` days starting at `not_before`.
    ///
    /// Fails when the end falls outside the representable date range.
    pub fn starting_at(not_before: OffsetDateTime, days: i64) -> Result<Self> {
        let not_after = days
            .checked_mul(SECONDS_PER_DAY)
            .map(Duration::seconds)
            .and_then(|length| not_before.checked_add(length))
            .ok_or_else(|| {
                CertLifeError::Generation(format!(
                    "validity of {days} days from {not_before} is out of range"
                ))
            })?;
        Ok(Self {
            not_before,
            not_after,
        })
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    ///
    /// # Arguments
    /// * `extension` - The extension to encode.
    /// * `critical` - Indicates if the extension is critical.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: &E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }

    pub fn to_x509_extension(&self) -> Result<Extension> {
        Ok(Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.clone())?,
        })
    }
}

impl From<&Extension> for ExtensionParam {
    fn from(ext: &Extension) -> Self {
        Self {
            oid: ext.extn_id,
            critical: ext.critical,
            value: ext.extn_value.as_bytes().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DistinguishedName {
        DistinguishedName::builder()
            .country("US")
            .state("California")
            .locality("San Francisco")
            .organization("Test Org")
            .organization_unit("Test Unit")
            .common_name("Test CA")
            .email("ca@example.com")
            .build()
    }

    #[test]
    fn test_attribute_order() {
        let name = sample().as_x509_name().unwrap();
        assert_eq!(
            display_name(&name),
            "C=US,ST=California,L=San Francisco,O=Test Org,OU=Test Unit,CN=Test CA,E=ca@example.com"
        );
    }

    #[test]
    fn test_blank_optional_attributes_are_skipped() {
        let mut dn = sample();
        dn.state = Some(String::new());
        dn.email = None;
        let name = dn.as_x509_name().unwrap();
        assert_eq!(
            display_name(&name),
            "C=US,L=San Francisco,O=Test Org,OU=Test Unit,CN=Test CA"
        );
    }

    #[test]
    fn test_required_attribute_missing() {
        let mut dn = sample();
        dn.common_name = " ".to_string();
        assert!(matches!(
            dn.as_x509_name(),
            Err(CertLifeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_name_round_trip() {
        let name = sample().as_x509_name().unwrap();
        assert_eq!(DistinguishedName::from_x509_name(&name), sample());
    }

    #[test]
    fn test_validity_for_days() {
        let validity = Validity::for_days(30).unwrap();
        assert_eq!(validity.not_after - validity.not_before, Duration::days(30));
        assert_eq!(validity.not_before.nanosecond(), 0);
    }

    #[test]
    fn test_validity_out_of_range() {
        for days in [4_000_000, i64::MAX / 2, i64::MAX, i64::MIN] {
            let err = Validity::for_days(days).unwrap_err();
            assert!(matches!(err, CertLifeError::Generation(_)), "{days}: {err}");
        }
    }
}
