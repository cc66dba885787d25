#![allow(dead_code)]

use certlife::cert::params::DistinguishedName;
use certlife::cert::san::SanEntry;
use certlife::key::{KeyAlgorithm, KeySpec};
use certlife::lifecycle::{
    CaRequest, IssuedCertificate, LeafRequest, generate_ca, generate_leaf,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn subject(common_name: &str) -> DistinguishedName {
    DistinguishedName::builder()
        .country("US")
        .state("California")
        .locality("San Francisco")
        .organization("Test Org")
        .organization_unit("Test Unit")
        .common_name(common_name)
        .build()
}

pub fn ca_request(common_name: &str, expiry_days: i64) -> CaRequest {
    CaRequest {
        subject: subject(common_name),
        expiry_days,
        key: None,
        comment: Some(format!("{common_name} comment")),
        parent: None,
        allow_sub_ca: false,
    }
}

pub fn generate_root_ca() -> IssuedCertificate {
    generate_root_ca_with(KeySpec::new(KeyAlgorithm::Ec, 256))
}

pub fn generate_root_ca_with(key: KeySpec) -> IssuedCertificate {
    init_logging();
    let mut request = ca_request("myca.local", 3650);
    request.key = Some(key);
    generate_ca(&request).unwrap()
}

pub fn generate_intermediate_ca(
    parent: &IssuedCertificate,
    expiry_days: i64,
    allow_sub_ca: bool,
) -> IssuedCertificate {
    let mut request = ca_request("intermediate.myca.local", expiry_days);
    request.parent = Some(parent.as_parent());
    request.allow_sub_ca = allow_sub_ca;
    generate_ca(&request).unwrap()
}

pub fn leaf_request(ca: &IssuedCertificate, sans: Vec<SanEntry>, expiry_days: i64) -> LeafRequest {
    LeafRequest {
        ca: ca.as_parent(),
        subject: subject("server.myca.local"),
        subject_alt_names: sans,
        expiry_days,
        key_size: None,
        comment: Some("leaf".to_string()),
    }
}

pub fn generate_server_cert(ca: &IssuedCertificate) -> IssuedCertificate {
    let sans = vec![
        SanEntry::Dns("example.com".to_string()),
        SanEntry::Ip("10.0.0.1".to_string()),
    ];
    generate_leaf(&leaf_request(ca, sans, 365)).unwrap()
}
