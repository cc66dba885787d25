use certlife::cert::params::DistinguishedName;
use certlife::cert::san::SanEntry;
use certlife::lifecycle::{CaRequest, LeafRequest, generate_ca, generate_leaf};
use certlife::{analyzer, convert};

fn subject(unit: &str, common_name: &str) -> DistinguishedName {
    DistinguishedName::builder()
        .country("US")
        .organization("Example Corp")
        .organization_unit(unit)
        .common_name(common_name)
        .build()
}

fn main() -> certlife::Result<()> {
    env_logger::init();
    certlife::init();

    // Root CA with the default EC P-256 key
    let root = generate_ca(&CaRequest {
        subject: subject("PKI", "Example Root CA"),
        expiry_days: 3650,
        key: None,
        comment: Some("root".to_string()),
        parent: None,
        allow_sub_ca: true,
    })?;

    // Intermediate signed by the root
    let intermediate = generate_ca(&CaRequest {
        subject: subject("PKI", "Example Issuing CA"),
        expiry_days: 1825,
        key: None,
        comment: Some("issuing".to_string()),
        parent: Some(root.as_parent()),
        allow_sub_ca: false,
    })?;

    let server = generate_leaf(&LeafRequest {
        ca: intermediate.as_parent(),
        subject: subject("Web", "www.example.com"),
        subject_alt_names: vec![
            SanEntry::Dns("www.example.com".to_string()),
            SanEntry::Ip("192.0.2.10".to_string()),
        ],
        expiry_days: 365,
        key_size: None,
        comment: None,
    })?;

    let details = analyzer::analyze(&server.certificate)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&details).unwrap_or_default()
    );
    println!(
        "key pair matches: {}",
        analyzer::verify_key_pair(&server.private_key, &server.certificate)?
    );

    let bundle = convert::to_bundle(&server.certificate, Some(&server.private_key), Some("changeit"))?;
    println!("PKCS#12 bundle ({} base64 chars):\n{bundle}", bundle.len());
    Ok(())
}
