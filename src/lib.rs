//! # certlife - A Pure Rust Certificate Authority and Lifecycle Engine
//!
//! certlife builds and signs CA and leaf certificates, renews them, decodes
//! certificates and private keys into readable detail views, and converts
//! certificate material between armored text, raw binary and password
//! protected PKCS#12 bundles. It is built on the RustCrypto crates and keeps
//! no state between calls.
//!
//! ## Supported Key Types
//!
//! - **RSA**: any modulus size, signed with SHA-256
//! - **ECDSA**: P-256, P-384 and P-521, signed with SHA-256, SHA-384 and SHA-512
//! - **Ed25519**
//!
//! ## Transport Encodings
//!
//! Every operation takes and returns text:
//!
//! - **armored**: a PEM block, base64-encoded once more
//! - **binary**: raw DER, base64-encoded
//! - **bundle**: a PKCS#12 file, base64-encoded
//!
//! ## Quick Start
//!
//! ### Issuing a Root CA and a Server Certificate
//!
//! ```rust,no_run
//! use certlife::cert::params::DistinguishedName;
//! use certlife::cert::san::SanEntry;
//! use certlife::lifecycle::{CaRequest, LeafRequest, generate_ca, generate_leaf};
//!
//! # fn main() -> certlife::error::Result<()> {
//! certlife::init();
//!
//! let root = generate_ca(&CaRequest {
//!     subject: DistinguishedName::builder()
//!         .country("US")
//!         .organization("Example Corp")
//!         .organization_unit("PKI")
//!         .common_name("Example Root CA")
//!         .build(),
//!     expiry_days: 3650,
//!     key: None,
//!     comment: Some("root".to_string()),
//!     parent: None,
//!     allow_sub_ca: false,
//! })?;
//!
//! let server = generate_leaf(&LeafRequest {
//!     ca: root.as_parent(),
//!     subject: DistinguishedName::builder()
//!         .country("US")
//!         .organization_unit("Web")
//!         .common_name("www.example.com")
//!         .build(),
//!     subject_alt_names: vec![SanEntry::Dns("www.example.com".to_string())],
//!     expiry_days: 365,
//!     key_size: None,
//!     comment: None,
//! })?;
//! println!("{}", server.certificate);
//! # Ok(())
//! # }
//! ```
//!
//! ### Inspecting and Converting
//!
//! ```rust,no_run
//! # fn main() -> certlife::error::Result<()> {
//! # let (certificate, private_key) = (String::new(), String::new());
//! let details = certlife::analyzer::analyze(&certificate)?;
//! for (oid, value) in &details.extensions {
//!     println!("{oid}: {value}");
//! }
//!
//! assert!(certlife::analyzer::verify_key_pair(&private_key, &certificate)?);
//!
//! let bundle = certlife::convert::to_bundle(&certificate, Some(&private_key), Some("changeit"))?;
//! let restored = certlife::convert::from_bundle(&bundle, Some("changeit"))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Each error belongs to one of four categories, see [`error::ErrorKind`]:
//!
//! ```rust
//! use certlife::error::{CertLifeError, ErrorKind};
//!
//! match certlife::analyzer::verify_is_ca("") {
//!     Err(err) => assert_eq!(err.kind(), ErrorKind::Parameter),
//!     Ok(_) => unreachable!(),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`lifecycle`]: CA and leaf issuance and renewal
//! - [`analyzer`]: certificate and private key inspection, key pair and CA checks
//! - [`convert`]: PKCS#12 bundles and binary re-encoding
//! - [`render`]: human-readable extension values
//! - [`key`]: key generation, import and export
//! - [`cert`]: certificate parsing, names, extensions
//! - [`issuer`]: the signing step shared by every issuance path
//! - [`tbs_certificate`]: the unsigned certificate record
//! - [`codec`]: armored and binary transport encodings
//! - [`config`]: engine configuration
//! - [`error`]: error types

use std::sync::Once;

pub mod analyzer;
pub mod cert;
pub mod codec;
pub mod config;
pub mod convert;
pub mod error;
pub mod issuer;
pub mod key;
pub mod lifecycle;
pub mod render;
pub mod serial;
pub mod tbs_certificate;

pub use config::EngineConfig;
pub use error::{CertLifeError, ErrorKind, Result};

static INIT: Once = Once::new();

/// One-time process setup. Safe to call any number of times.
///
/// Builds the extension renderer table up front; every operation also
/// works without calling this.
pub fn init() {
    INIT.call_once(|| {
        let renderers = render::warm_up();
        let oids: Vec<String> = render::registered_oids()
            .iter()
            .map(ToString::to_string)
            .collect();
        log::info!(
            "certlife initialised with {renderers} extension renderers: {}",
            oids.join(", ")
        );
    });
}
