//! Typed subject alternative name entries.

use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

use der::asn1::{Ia5String, OctetString};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use x509_cert::ext::pkix::name::{DirectoryString, EdiPartyName, GeneralName};
use x509_cert::name::Name;

use super::params::display_name;
use crate::codec;
use crate::error::{CertLifeError, Result};

static DNS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9.-]+$").expect("static regex"));
static IPV4_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").expect("static regex"));
static IPV6_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}$").expect("static regex"));
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+$").expect("static regex"));

/// One subject alternative name, tagged by its GeneralName kind.
///
/// Serialized as `{"type": "DNS", "value": "example.com"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum SanEntry {
    #[serde(rename = "DNS")]
    Dns(String),
    #[serde(rename = "IP")]
    Ip(String),
    #[serde(rename = "URI")]
    Uri(String),
    #[serde(rename = "EMAIL")]
    Email(String),
    /// An RFC 4514 name string, e.g. `CN=Service,O=Acme`.
    #[serde(rename = "DIRNAME")]
    DirectoryName(String),
    /// `nameAssigner=<a>,partyName=<p>`, or just the party name.
    #[serde(rename = "EDIPARTY")]
    EdiPartyName(String),
}

impl SanEntry {
    pub fn value(&self) -> &str {
        match self {
            SanEntry::Dns(v)
            | SanEntry::Ip(v)
            | SanEntry::Uri(v)
            | SanEntry::Email(v)
            | SanEntry::DirectoryName(v)
            | SanEntry::EdiPartyName(v) => v,
        }
    }

    /// Opt-in syntax check. Issuance does not call this.
    pub fn is_valid(&self) -> bool {
        match self {
            SanEntry::Dns(v) => DNS_PATTERN.is_match(v),
            SanEntry::Ip(v) => IPV4_PATTERN.is_match(v) || IPV6_PATTERN.is_match(v),
            SanEntry::Uri(v) => v.starts_with("http://") || v.starts_with("https://"),
            SanEntry::Email(v) => EMAIL_PATTERN.is_match(v),
            SanEntry::DirectoryName(v) => v.contains('='),
            SanEntry::EdiPartyName(v) => !v.trim().is_empty(),
        }
    }

    pub fn to_general_name(&self) -> Result<GeneralName> {
        let name = match self {
            SanEntry::Dns(v) => GeneralName::DnsName(Ia5String::new(v)?),
            SanEntry::Ip(v) => {
                let address = IpAddr::from_str(v.trim()).map_err(|e| {
                    CertLifeError::InvalidParameter(format!("invalid IP address {v}: {e}"))
                })?;
                let octets = match address {
                    IpAddr::V4(v4) => v4.octets().to_vec(),
                    IpAddr::V6(v6) => v6.octets().to_vec(),
                };
                GeneralName::IpAddress(OctetString::new(octets)?)
            }
            SanEntry::Uri(v) => GeneralName::UniformResourceIdentifier(Ia5String::new(v)?),
            SanEntry::Email(v) => GeneralName::Rfc822Name(Ia5String::new(v)?),
            SanEntry::DirectoryName(v) => GeneralName::DirectoryName(Name::from_str(v)?),
            SanEntry::EdiPartyName(v) => {
                let (assigner, party) = parse_edi_party(v);
                GeneralName::EdiPartyName(EdiPartyName {
                    name_assigner: assigner.map(DirectoryString::Utf8String),
                    party_name: DirectoryString::Utf8String(party),
                })
            }
        };
        Ok(name)
    }

    /// The reverse of [`SanEntry::to_general_name`]; `None` for kinds this type does not model.
    pub fn from_general_name(name: &GeneralName) -> Option<Self> {
        match name {
            GeneralName::DnsName(v) => Some(SanEntry::Dns(v.to_string())),
            GeneralName::IpAddress(octets) => Some(SanEntry::Ip(ip_address_text(octets.as_bytes()))),
            GeneralName::UniformResourceIdentifier(v) => Some(SanEntry::Uri(v.to_string())),
            GeneralName::Rfc822Name(v) => Some(SanEntry::Email(v.to_string())),
            GeneralName::DirectoryName(v) => Some(SanEntry::DirectoryName(display_name(v))),
            GeneralName::EdiPartyName(edi) => {
                let party = directory_string_text(&edi.party_name);
                Some(SanEntry::EdiPartyName(match &edi.name_assigner {
                    Some(assigner) => format!(
                        "nameAssigner={},partyName={party}",
                        directory_string_text(assigner)
                    ),
                    None => format!("partyName={party}"),
                }))
            }
            _ => None,
        }
    }
}

fn parse_edi_party(value: &str) -> (Option<String>, String) {
    let mut assigner = None;
    let mut party = None;
    for part in value.split(',') {
        match part.split_once('=') {
            Some((key, v)) if key.trim().eq_ignore_ascii_case("nameAssigner") => {
                assigner = Some(v.trim().to_string())
            }
            Some((key, v)) if key.trim().eq_ignore_ascii_case("partyName") => {
                party = Some(v.trim().to_string())
            }
            _ => {}
        }
    }
    match party {
        Some(party) => (assigner, party),
        None => (None, value.trim().to_string()),
    }
}

fn directory_string_text(value: &DirectoryString) -> String {
    match value {
        DirectoryString::PrintableString(s) => s.to_string(),
        DirectoryString::TeletexString(s) => s.to_string(),
        DirectoryString::Utf8String(s) => s.clone(),
    }
}

/// Dotted quad for 4 bytes, RFC 5952 text for 16 bytes, hex for anything else.
pub fn ip_address_text(bytes: &[u8]) -> String {
    match bytes.len() {
        4 => format!("{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3]),
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(bytes);
            Ipv6Addr::from(octets).to_string()
        }
        _ => codec::hex_prefixed(bytes),
    }
}
