mod util;

use certlife::cert::CertificateWithPrivateKey;
use certlife::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAltName,
    SubjectKeyIdentifier, ToAndFromX509Extension,
};
use certlife::cert::params::{CertificationRequestInfo, ExtensionParam, Validity};
use certlife::cert::san::SanEntry;
use certlife::error::{CertLifeError, ErrorKind};
use certlife::issuer::Issuer;
use certlife::key::{KeyAlgorithm, KeyPair, KeySpec};
use certlife::lifecycle::{
    CaRenewRequest, CaRequest, LeafRenewRequest, generate_ca, generate_leaf, renew_ca, renew_leaf,
};
use time::Duration;

fn generation_message(err: CertLifeError) -> String {
    assert_eq!(err.kind(), ErrorKind::Generation, "{err}");
    err.to_string()
}

#[test]
fn test_root_ca_is_self_signed() {
    let root = util::generate_root_ca();
    let cert = root.parsed_certificate().unwrap();

    assert_eq!(cert.issuer(), cert.subject());
    assert!(cert.is_ca().unwrap());
    assert!(cert.verify_signature(&cert.public_key().unwrap()).unwrap());
    assert_eq!(root.algorithm, "EC");
    assert_eq!(root.key_size, 256);
    assert_eq!(root.comment.as_deref(), Some("myca.local comment"));
    assert!(uuid::Uuid::parse_str(&root.id).is_ok());

    let bc = cert.extension(&BasicConstraints::OID).unwrap();
    assert!(bc.critical);
    assert_eq!(
        bc.to_extension::<BasicConstraints>().unwrap(),
        BasicConstraints {
            is_ca: true,
            max_path_length: None
        }
    );
    let ku = cert.extension(&KeyUsage::OID).unwrap();
    assert!(ku.critical);
    assert_eq!(ku.to_extension::<KeyUsage>().unwrap().0, KeyUsage::ca().0);

    let ski = cert
        .extension(&SubjectKeyIdentifier::OID)
        .unwrap()
        .to_extension::<SubjectKeyIdentifier>()
        .unwrap();
    let aki = cert
        .extension(&AuthorityKeyIdentifier::OID)
        .unwrap()
        .to_extension::<AuthorityKeyIdentifier>()
        .unwrap();
    assert_eq!(aki.key_identifier, ski.0);
}

#[test]
fn test_validity_window_matches_expiry_days() {
    let root = util::generate_root_ca();
    assert_eq!(root.not_after - root.not_before, Duration::days(3650));
    let cert = root.parsed_certificate().unwrap();
    assert_eq!(cert.not_before(), root.not_before);
    assert_eq!(cert.not_after(), root.not_after);
}

#[test]
fn test_root_ca_key_algorithms() {
    for (spec, algorithm, size) in [
        (KeySpec::new(KeyAlgorithm::Ec, 384), "EC", 384),
        (KeySpec::new(KeyAlgorithm::Ec, 600), "EC", 521),
        (KeySpec::new(KeyAlgorithm::Ed25519, 0), "Ed25519", 256),
        (KeySpec::new(KeyAlgorithm::Rsa, 2048), "RSA", 2048),
    ] {
        let root = util::generate_root_ca_with(spec);
        assert_eq!(root.algorithm, algorithm);
        assert_eq!(root.key_size, size);
        let cert = root.parsed_certificate().unwrap();
        assert!(cert.verify_signature(&cert.public_key().unwrap()).unwrap());
    }
}

#[test]
fn test_intermediate_ca_is_signed_by_parent() {
    let root = util::generate_root_ca();
    let intermediate = util::generate_intermediate_ca(&root, 365, false);

    let root_cert = root.parsed_certificate().unwrap();
    let cert = intermediate.parsed_certificate().unwrap();
    assert_eq!(cert.issuer(), root_cert.subject());
    assert_ne!(cert.subject(), root_cert.subject());
    assert!(cert.verify_signature(&root_cert.public_key().unwrap()).unwrap());
    assert_eq!(
        cert.basic_constraints().unwrap(),
        Some(BasicConstraints {
            is_ca: true,
            max_path_length: Some(0)
        })
    );

    let aki = cert
        .extension(&AuthorityKeyIdentifier::OID)
        .unwrap()
        .to_extension::<AuthorityKeyIdentifier>()
        .unwrap();
    let root_ski = root_cert
        .extension(&SubjectKeyIdentifier::OID)
        .unwrap()
        .to_extension::<SubjectKeyIdentifier>()
        .unwrap();
    assert_eq!(aki.key_identifier, root_ski.0);

    let sub = util::generate_intermediate_ca(&root, 365, true);
    assert_eq!(
        sub.parsed_certificate()
            .unwrap()
            .basic_constraints()
            .unwrap()
            .and_then(|bc| bc.max_path_length),
        Some(1)
    );
}

#[test]
fn test_intermediate_follows_parent_algorithm() {
    let root = util::generate_root_ca_with(KeySpec::new(KeyAlgorithm::Ed25519, 256));
    let mut request = util::ca_request("intermediate.myca.local", 365);
    request.parent = Some(root.as_parent());
    request.key = Some(KeySpec::new(KeyAlgorithm::Rsa, 4096));
    let intermediate = generate_ca(&request).unwrap();
    assert_eq!(intermediate.algorithm, "Ed25519");
    assert_eq!(intermediate.key_size, 256);
}

#[test]
fn test_intermediate_expiry_cannot_exceed_parent() {
    let root = util::generate_root_ca();
    let mut request = util::ca_request("intermediate.myca.local", 4000);
    request.parent = Some(root.as_parent());
    let message = generation_message(generate_ca(&request).unwrap_err());
    assert!(message.contains("Sub CA expiry cannot exceed parent CA expiry"));
}

#[test]
fn test_path_length_constraint() {
    let root = util::generate_root_ca();
    let intermediate = util::generate_intermediate_ca(&root, 365, false);

    let mut request = util::ca_request("sub.myca.local", 30);
    request.parent = Some(intermediate.as_parent());
    request.allow_sub_ca = true;
    let message = generation_message(generate_ca(&request).unwrap_err());
    assert!(message.contains("Parent CA does not allow issuing CA with this path length"));

    request.allow_sub_ca = false;
    assert!(generate_ca(&request).is_ok());
}

#[test]
fn test_leaf_cannot_act_as_parent() {
    let root = util::generate_root_ca();
    let leaf = util::generate_server_cert(&root);
    let mut request = util::ca_request("rogue.myca.local", 30);
    request.parent = Some(leaf.as_parent());
    let message = generation_message(generate_ca(&request).unwrap_err());
    assert!(message.contains("not a CA"));
}

#[test]
fn test_mismatched_parent_key_is_rejected() {
    let root = util::generate_root_ca();
    let other = util::generate_root_ca();
    let mut request = util::ca_request("intermediate.myca.local", 30);
    request.parent = Some(certlife::lifecycle::ParentCa {
        certificate: root.certificate.clone(),
        private_key: other.private_key.clone(),
    });
    let message = generation_message(generate_ca(&request).unwrap_err());
    assert!(message.contains("Private key does not match the certificate"));
}

#[test]
fn test_blank_subject_field_is_generation_error() {
    let mut request = util::ca_request("myca.local", 30);
    request.subject.common_name = String::new();
    generation_message(generate_ca(&request).unwrap_err());
}

#[test]
fn test_leaf_certificate_extensions() {
    let root = util::generate_root_ca();
    let leaf = util::generate_server_cert(&root);
    let root_cert = root.parsed_certificate().unwrap();
    let cert = leaf.parsed_certificate().unwrap();

    assert_eq!(cert.issuer(), root_cert.subject());
    assert!(!cert.is_ca().unwrap());
    assert!(cert.verify_signature(&root_cert.public_key().unwrap()).unwrap());

    let ku = cert.extension(&KeyUsage::OID).unwrap();
    assert!(ku.critical);
    assert_eq!(ku.to_extension::<KeyUsage>().unwrap().0, KeyUsage::leaf().0);

    let eku = cert.extension(&ExtendedKeyUsage::OID).unwrap();
    assert!(!eku.critical);
    assert_eq!(
        eku.to_extension::<ExtendedKeyUsage>().unwrap().usage,
        ExtendedKeyUsage::tls().usage
    );

    let san = cert.extension(&SubjectAltName::OID).unwrap();
    assert!(!san.critical);
    assert_eq!(
        san.to_extension::<SubjectAltName>().unwrap().names,
        vec![
            SanEntry::Dns("example.com".to_string()),
            SanEntry::Ip("10.0.0.1".to_string())
        ]
    );
}

#[test]
fn test_leaf_without_sans_has_no_san_extension() {
    let root = util::generate_root_ca();
    let leaf = generate_leaf(&util::leaf_request(&root, vec![], 30)).unwrap();
    let cert = leaf.parsed_certificate().unwrap();
    assert!(cert.extension(&SubjectAltName::OID).is_none());
    assert!(cert.extension(&KeyUsage::OID).is_some());
}

#[test]
fn test_leaf_key_follows_ca_algorithm() {
    let root = util::generate_root_ca_with(KeySpec::new(KeyAlgorithm::Ed25519, 256));
    let leaf = util::generate_server_cert(&root);
    assert_eq!(leaf.algorithm, "Ed25519");
    assert!(matches!(
        leaf.parsed_key().unwrap(),
        KeyPair::Ed25519 { .. }
    ));

    let root = util::generate_root_ca();
    let mut request = util::leaf_request(&root, vec![], 30);
    request.key_size = Some(384);
    let leaf = generate_leaf(&request).unwrap();
    assert_eq!(leaf.algorithm, "EC");
    assert_eq!(leaf.key_size, 384);
}

#[test]
fn test_huge_expiry_is_generation_error() {
    for days in [4_000_000, i64::MAX / 2] {
        let message =
            generation_message(generate_ca(&util::ca_request("huge.myca.local", days)).unwrap_err());
        assert!(message.contains("out of range"), "{message}");
    }

    let root = util::generate_root_ca();
    let err = generate_leaf(&util::leaf_request(&root, vec![], i64::MAX / 2)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Generation);
}

#[test]
fn test_leaf_expiry_cannot_exceed_ca() {
    let root = util::generate_root_ca();
    let message =
        generation_message(generate_leaf(&util::leaf_request(&root, vec![], 5000)).unwrap_err());
    assert!(message.contains("Certificate expiry cannot exceed CA expiry"));
}

#[test]
fn test_renew_ca_keeps_subject_and_key() {
    let root = util::generate_root_ca();
    let renewed = renew_ca(&CaRenewRequest {
        id: root.id.clone(),
        certificate: root.certificate.clone(),
        private_key: root.private_key.clone(),
        expiry_days: 7300,
        comment: Some("renewed".to_string()),
        parent: None,
        allow_sub_ca: false,
    })
    .unwrap();

    let old = root.parsed_certificate().unwrap();
    let new = renewed.parsed_certificate().unwrap();
    assert_eq!(renewed.id, root.id);
    assert_eq!(renewed.comment.as_deref(), Some("renewed"));
    assert_eq!(new.subject(), old.subject());
    assert_eq!(new.issuer(), old.subject());
    assert_eq!(new.subject_public_key_info(), old.subject_public_key_info());
    assert_ne!(new.serial_number(), old.serial_number());
    assert_eq!(renewed.not_after - renewed.not_before, Duration::days(7300));
    assert!(new.verify_signature(&old.public_key().unwrap()).unwrap());
    // Regenerated from the same key, so the identifier carries over.
    assert_eq!(
        new.extension(&SubjectKeyIdentifier::OID).unwrap().value,
        old.extension(&SubjectKeyIdentifier::OID).unwrap().value
    );

    let oids: Vec<_> = new.extensions().iter().map(|ext| ext.oid).collect();
    assert_eq!(
        oids,
        vec![
            BasicConstraints::OID,
            KeyUsage::OID,
            SubjectKeyIdentifier::OID,
            AuthorityKeyIdentifier::OID
        ]
    );
}

#[test]
fn test_renew_ca_requires_matching_key() {
    let root = util::generate_root_ca();
    let other = util::generate_root_ca();
    let err = renew_ca(&CaRenewRequest {
        id: root.id.clone(),
        certificate: root.certificate.clone(),
        private_key: other.private_key.clone(),
        expiry_days: 365,
        comment: None,
        parent: None,
        allow_sub_ca: false,
    })
    .unwrap_err();
    generation_message(err);
}

#[test]
fn test_renew_intermediate_ca_under_parent() {
    let root = util::generate_root_ca();
    let intermediate = util::generate_intermediate_ca(&root, 365, true);
    let request = CaRenewRequest {
        id: intermediate.id.clone(),
        certificate: intermediate.certificate.clone(),
        private_key: intermediate.private_key.clone(),
        expiry_days: 730,
        comment: None,
        parent: Some(root.as_parent()),
        allow_sub_ca: true,
    };
    let renewed = renew_ca(&request).unwrap();
    let root_cert = root.parsed_certificate().unwrap();
    let cert = renewed.parsed_certificate().unwrap();
    assert_eq!(cert.issuer(), root_cert.subject());
    assert!(cert.verify_signature(&root_cert.public_key().unwrap()).unwrap());
    assert_eq!(
        cert.basic_constraints().unwrap().and_then(|bc| bc.max_path_length),
        Some(1)
    );

    let other_root = generate_ca(&util::ca_request("other-root.local", 3650)).unwrap();
    let message = generation_message(
        renew_ca(&CaRenewRequest {
            parent: Some(other_root.as_parent()),
            ..request
        })
        .unwrap_err(),
    );
    assert!(message.contains("Parent CA does not match the issuer of the old certificate"));
}

#[test]
fn test_renew_leaf_keeps_key_and_extensions() {
    let root = util::generate_root_ca();
    let leaf = util::generate_server_cert(&root);
    let renewed = renew_leaf(&LeafRenewRequest {
        id: leaf.id.clone(),
        certificate: leaf.certificate.clone(),
        private_key: leaf.private_key.clone(),
        ca: root.as_parent(),
        expiry_days: 90,
        comment: None,
    })
    .unwrap();

    let old = leaf.parsed_certificate().unwrap();
    let new = renewed.parsed_certificate().unwrap();
    assert_eq!(renewed.id, leaf.id);
    assert_eq!(new.subject_public_key_info(), old.subject_public_key_info());
    assert_eq!(new.issuer(), root.parsed_certificate().unwrap().subject());
    assert_eq!(new.extensions(), old.extensions());
    assert_eq!(
        renewed.parsed_key().unwrap().public_key(),
        leaf.parsed_key().unwrap().public_key()
    );
}

#[test]
fn test_renew_leaf_under_rotated_ca_key() {
    let root = util::generate_root_ca();
    let leaf = util::generate_server_cert(&root);
    // A new CA with the same name but a fresh key.
    let rotated = util::generate_root_ca();

    let renewed = renew_leaf(&LeafRenewRequest {
        id: leaf.id.clone(),
        certificate: leaf.certificate.clone(),
        private_key: leaf.private_key.clone(),
        ca: rotated.as_parent(),
        expiry_days: 90,
        comment: None,
    })
    .unwrap();

    let rotated_cert = rotated.parsed_certificate().unwrap();
    let cert = renewed.parsed_certificate().unwrap();
    assert!(cert.verify_signature(&rotated_cert.public_key().unwrap()).unwrap());
    let aki = cert
        .extension(&AuthorityKeyIdentifier::OID)
        .unwrap()
        .to_extension::<AuthorityKeyIdentifier>()
        .unwrap();
    let ski = rotated_cert
        .extension(&SubjectKeyIdentifier::OID)
        .unwrap()
        .to_extension::<SubjectKeyIdentifier>()
        .unwrap();
    assert_eq!(aki.key_identifier, ski.0);
}

#[test]
fn test_renew_leaf_backfills_usages() {
    let root = util::generate_root_ca();
    let ca = CertificateWithPrivateKey::from_armored(&root.certificate, &root.private_key).unwrap();
    let key = KeyPair::generate(&KeySpec::default()).unwrap();
    let san = SubjectAltName {
        names: vec![SanEntry::Dns("bare.example.com".to_string())],
    };
    let cert_info = CertificationRequestInfo::builder()
        .subject(util::subject("bare.example.com").as_x509_name().unwrap())
        .subject_public_key(key.as_spki().unwrap())
        .extensions(vec![ExtensionParam::from_extension(&san, false).unwrap()])
        .build();
    let bare = ca.issue(&cert_info, Validity::for_days(30).unwrap()).unwrap();
    assert!(bare.extension(&KeyUsage::OID).is_none());

    let renewed = renew_leaf(&LeafRenewRequest {
        id: "bare".to_string(),
        certificate: bare.to_armored().unwrap(),
        private_key: key.to_armored().unwrap(),
        ca: root.as_parent(),
        expiry_days: 30,
        comment: None,
    })
    .unwrap();
    let cert = renewed.parsed_certificate().unwrap();
    assert!(cert.extension(&SubjectAltName::OID).is_some());
    assert!(cert.extension(&KeyUsage::OID).unwrap().critical);
    assert!(cert.extension(&ExtendedKeyUsage::OID).is_some());
}

#[test]
fn test_request_and_response_json_shapes() {
    let request: CaRequest = serde_json::from_value(serde_json::json!({
        "country": "US",
        "province": "California",
        "city": "San Francisco",
        "organization": "Test Org",
        "organizationUnit": "Test Unit",
        "commonName": "json.myca.local",
        "expiryDays": 30,
        "key": { "algorithm": "EC", "size": 384 },
        "comment": "from json"
    }))
    .unwrap();
    assert_eq!(request.subject.state.as_deref(), Some("California"));
    assert_eq!(request.subject.locality.as_deref(), Some("San Francisco"));
    assert!(request.parent.is_none());

    let issued = generate_ca(&request).unwrap();
    assert_eq!(issued.key_size, 384);
    let json = serde_json::to_value(&issued).unwrap();
    let not_before = json["notBefore"].as_str().unwrap();
    assert_eq!(
        time::OffsetDateTime::parse(not_before, &time::format_description::well_known::Rfc3339)
            .unwrap(),
        issued.not_before
    );
    assert_eq!(json["comment"], "from json");
}
