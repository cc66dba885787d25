use const_oid::db::{rfc5912, rfc8410};
use der::{Decode, Encode};
use ecdsa::signature::{SignatureEncoding, Signer, Verifier};
use ed25519_dalek::{SigningKey as Ed25519SigningKey, VerifyingKey as Ed25519VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::codec;
use crate::error::{CertLifeError, Result};

/// Key algorithm families the engine can generate and load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    #[serde(rename = "RSA", alias = "rsa")]
    Rsa,
    #[serde(rename = "EC", alias = "ec", alias = "ECDSA")]
    Ec,
    #[serde(rename = "Ed25519", alias = "ed25519", alias = "ED25519")]
    Ed25519,
}

impl KeyAlgorithm {
    /// The algorithm name reported in issuance responses.
    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::Ec => "EC",
            KeyAlgorithm::Ed25519 => "Ed25519",
        }
    }
}

/// Which key to generate: an algorithm and a size in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    pub algorithm: KeyAlgorithm,
    #[serde(default = "default_key_size")]
    pub size: u32,
}

fn default_key_size() -> u32 {
    256
}

impl Default for KeySpec {
    fn default() -> Self {
        Self {
            algorithm: KeyAlgorithm::Ec,
            size: default_key_size(),
        }
    }
}

impl KeySpec {
    pub fn new(algorithm: KeyAlgorithm, size: u32) -> Self {
        Self { algorithm, size }
    }

    /// The size actually used: EC sizes snap to a NIST curve, Ed25519 is always 256.
    pub fn normalized_size(&self) -> u32 {
        match self.algorithm {
            KeyAlgorithm::Rsa => self.size,
            KeyAlgorithm::Ec if self.size < 320 => 256,
            KeyAlgorithm::Ec if self.size <= 452 => 384,
            KeyAlgorithm::Ec => 521,
            KeyAlgorithm::Ed25519 => 256,
        }
    }
}

/// A private key together with what is needed to sign with it.
#[derive(Clone)]
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        secret: p256::SecretKey,
    },
    EcdsaP384 {
        secret: p384::SecretKey,
    },
    EcdsaP521 {
        secret: p521::SecretKey,
    },
    Ed25519 {
        signing_key: Ed25519SigningKey,
    },
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm())
            .field("size", &self.key_size())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate a key pair for the given key spec.
    pub fn generate(spec: &KeySpec) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        let key = match (spec.algorithm, spec.normalized_size()) {
            (KeyAlgorithm::Rsa, bits) => {
                let private = RsaPrivateKey::new(&mut rng, bits as usize)?;
                let public = RsaPublicKey::from(&private);
                KeyPair::Rsa {
                    private: Box::new(private),
                    public,
                }
            }
            (KeyAlgorithm::Ec, 256) => KeyPair::EcdsaP256 {
                secret: p256::SecretKey::random(&mut rng),
            },
            (KeyAlgorithm::Ec, 384) => KeyPair::EcdsaP384 {
                secret: p384::SecretKey::random(&mut rng),
            },
            (KeyAlgorithm::Ec, _) => KeyPair::EcdsaP521 {
                secret: p521::SecretKey::random(&mut rng),
            },
            (KeyAlgorithm::Ed25519, _) => KeyPair::Ed25519 {
                signing_key: Ed25519SigningKey::generate(&mut rng),
            },
        };
        log::debug!("generated {} {}-bit key", spec.algorithm.name(), key.key_size());
        Ok(key)
    }

    /// Load a key from an unencrypted PKCS#8 `PrivateKeyInfo`.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = pkcs8::PrivateKeyInfo::try_from(der)?;
        match info.algorithm.oid {
            rfc5912::RSA_ENCRYPTION => {
                let private = RsaPrivateKey::from_pkcs8_der(der)?;
                let public = RsaPublicKey::from(&private);
                Ok(KeyPair::Rsa {
                    private: Box::new(private),
                    public,
                })
            }
            rfc5912::ID_EC_PUBLIC_KEY => match info.algorithm.parameters_oid()? {
                rfc5912::SECP_256_R_1 => Ok(KeyPair::EcdsaP256 {
                    secret: p256::SecretKey::from_pkcs8_der(der)?,
                }),
                rfc5912::SECP_384_R_1 => Ok(KeyPair::EcdsaP384 {
                    secret: p384::SecretKey::from_pkcs8_der(der)?,
                }),
                rfc5912::SECP_521_R_1 => Ok(KeyPair::EcdsaP521 {
                    secret: p521::SecretKey::from_pkcs8_der(der)?,
                }),
                curve => Err(CertLifeError::UnsupportedAlgorithm(format!(
                    "elliptic curve {curve}"
                ))),
            },
            rfc8410::ID_ED_25519 => Ok(KeyPair::Ed25519 {
                signing_key: Ed25519SigningKey::from_pkcs8_der(der)?,
            }),
            other => Err(CertLifeError::UnsupportedAlgorithm(format!(
                "private key algorithm {other}"
            ))),
        }
    }

    /// Load a key from armored transport text.
    pub fn from_armored(armored: &str) -> Result<Self> {
        Self::from_pkcs8_der(&codec::decode_armored(armored)?)
    }

    /// Encode the key as an unencrypted PKCS#8 `PrivateKeyInfo`.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let document = match self {
            KeyPair::Rsa { private, .. } => private.to_pkcs8_der()?,
            KeyPair::EcdsaP256 { secret } => secret.to_pkcs8_der()?,
            KeyPair::EcdsaP384 { secret } => secret.to_pkcs8_der()?,
            KeyPair::EcdsaP521 { secret } => secret.to_pkcs8_der()?,
            KeyPair::Ed25519 { signing_key } => {
                // PKCS#8 v1: no embedded public key.
                ed25519_dalek::pkcs8::KeypairBytes {
                    secret_key: signing_key.to_bytes(),
                    public_key: None,
                }
                .to_pkcs8_der()?
            }
        };
        Ok(document.as_bytes().to_vec())
    }

    pub fn to_armored(&self) -> Result<String> {
        Ok(codec::encode_armored(
            &self.to_pkcs8_der()?,
            codec::PRIVATE_KEY_LABEL,
        ))
    }

    /// The public half of this key pair.
    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::EcdsaP256 { secret } => PublicKey::EcdsaP256(secret.public_key()),
            KeyPair::EcdsaP384 { secret } => PublicKey::EcdsaP384(secret.public_key()),
            KeyPair::EcdsaP521 { secret } => PublicKey::EcdsaP521(secret.public_key()),
            KeyPair::Ed25519 { signing_key } => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    /// Encode the public key as a `SubjectPublicKeyInfo`.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        self.public_key().to_spki()
    }

    /// The certificate signature algorithm this key signs with.
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        match self {
            KeyPair::Rsa { .. } => SignatureAlgorithm::Sha256WithRSA,
            KeyPair::EcdsaP256 { .. } => SignatureAlgorithm::Sha256WithECDSA,
            KeyPair::EcdsaP384 { .. } => SignatureAlgorithm::Sha384WithECDSA,
            KeyPair::EcdsaP521 { .. } => SignatureAlgorithm::Sha512WithECDSA,
            KeyPair::Ed25519 { .. } => SignatureAlgorithm::Ed25519,
        }
    }

    /// Sign `data` and return the signature in its X.509 encoding
    /// (PKCS#1 v1.5 for RSA, DER `Ecdsa-Sig-Value` for ECDSA, raw for Ed25519).
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            KeyPair::Rsa { private, .. } => {
                let signing_key = rsa::pkcs1v15::SigningKey::<Sha256>::new(private.as_ref().clone());
                Ok(signing_key.try_sign(data)?.to_vec())
            }
            KeyPair::EcdsaP256 { secret } => {
                let signing_key = p256::ecdsa::SigningKey::from(secret);
                let signature: p256::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP384 { secret } => {
                let signing_key = p384::ecdsa::SigningKey::from(secret);
                let signature: p384::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP521 { secret } => {
                let signing_key = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())?;
                let signature: p521::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::Ed25519 { signing_key } => Ok(signing_key.try_sign(data)?.to_bytes().to_vec()),
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyPair::Rsa { .. } => KeyAlgorithm::Rsa,
            KeyPair::EcdsaP256 { .. } | KeyPair::EcdsaP384 { .. } | KeyPair::EcdsaP521 { .. } => {
                KeyAlgorithm::Ec
            }
            KeyPair::Ed25519 { .. } => KeyAlgorithm::Ed25519,
        }
    }

    /// Key size in bits (modulus length for RSA, curve size otherwise).
    pub fn key_size(&self) -> u32 {
        self.public_key().key_size()
    }

    /// Parameter record for key inspection.
    pub fn details(&self) -> Result<KeyParameters> {
        match self {
            KeyPair::Rsa { private, .. } => {
                use rsa::pkcs1::EncodeRsaPrivateKey;
                let document = private.to_pkcs1_der()?;
                let fields = rsa::pkcs1::RsaPrivateKey::from_der(document.as_bytes())?;
                let decimal = |uint: der::asn1::UintRef<'_>| {
                    rsa::BigUint::from_bytes_be(uint.as_bytes()).to_str_radix(10)
                };
                Ok(KeyParameters::Rsa {
                    modulus: decimal(fields.modulus),
                    public_exponent: decimal(fields.public_exponent),
                    private_exponent: decimal(fields.private_exponent),
                    prime_p: decimal(fields.prime1),
                    prime_q: decimal(fields.prime2),
                    exponent_p: decimal(fields.exponent1),
                    exponent_q: decimal(fields.exponent2),
                    coefficient: decimal(fields.coefficient),
                })
            }
            KeyPair::EcdsaP256 { secret } => {
                let point = secret.public_key().to_encoded_point(false);
                Ok(ec_parameters(
                    "secp256r1",
                    &secret.to_bytes(),
                    point.x().map(|x| x.as_slice()),
                    point.y().map(|y| y.as_slice()),
                ))
            }
            KeyPair::EcdsaP384 { secret } => {
                let point = secret.public_key().to_encoded_point(false);
                Ok(ec_parameters(
                    "secp384r1",
                    &secret.to_bytes(),
                    point.x().map(|x| x.as_slice()),
                    point.y().map(|y| y.as_slice()),
                ))
            }
            KeyPair::EcdsaP521 { secret } => {
                let point = secret.public_key().to_encoded_point(false);
                Ok(ec_parameters(
                    "secp521r1",
                    &secret.to_bytes(),
                    point.x().map(|x| x.as_slice()),
                    point.y().map(|y| y.as_slice()),
                ))
            }
            KeyPair::Ed25519 { signing_key } => Ok(KeyParameters::Ed25519 {
                point: codec::hex_upper(signing_key.verifying_key().as_bytes()),
            }),
        }
    }
}

fn ec_parameters(curve: &str, d: &[u8], x: Option<&[u8]>, y: Option<&[u8]>) -> KeyParameters {
    KeyParameters::Ec {
        curve: curve.to_string(),
        d: codec::hex_upper(d),
        x: x.map(codec::hex_upper).unwrap_or_default(),
        y: y.map(codec::hex_upper).unwrap_or_default(),
    }
}

/// Algorithm-specific private key parameters.
///
/// RSA integers are decimal strings; curve values are uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeyParameters {
    #[serde(rename = "RSA", rename_all = "camelCase")]
    Rsa {
        modulus: String,
        public_exponent: String,
        private_exponent: String,
        prime_p: String,
        prime_q: String,
        exponent_p: String,
        exponent_q: String,
        coefficient: String,
    },
    #[serde(rename = "EC")]
    Ec {
        curve: String,
        d: String,
        x: String,
        y: String,
    },
    #[serde(rename = "Ed25519")]
    Ed25519 { point: String },
}

/// A public key taken from a key pair or a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(p256::PublicKey),
    EcdsaP384(p384::PublicKey),
    EcdsaP521(p521::PublicKey),
    Ed25519(Ed25519VerifyingKey),
}

impl PublicKey {
    /// Encode as a `SubjectPublicKeyInfo`.
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let document = match self {
            PublicKey::Rsa(key) => key.to_public_key_der()?,
            PublicKey::EcdsaP256(key) => key.to_public_key_der()?,
            PublicKey::EcdsaP384(key) => key.to_public_key_der()?,
            PublicKey::EcdsaP521(key) => key.to_public_key_der()?,
            PublicKey::Ed25519(key) => key.to_public_key_der()?,
        };
        Ok(SubjectPublicKeyInfoOwned::from_der(document.as_bytes())?)
    }

    /// Decode from a certificate's `SubjectPublicKeyInfo`.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        Self::from_spki_der(&spki.to_der()?)
    }

    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let info = x509_cert::spki::SubjectPublicKeyInfoRef::try_from(der)?;
        match info.algorithm.oid {
            rfc5912::RSA_ENCRYPTION => Ok(PublicKey::Rsa(RsaPublicKey::from_public_key_der(der)?)),
            rfc5912::ID_EC_PUBLIC_KEY => match info.algorithm.parameters_oid()? {
                rfc5912::SECP_256_R_1 => Ok(PublicKey::EcdsaP256(
                    p256::PublicKey::from_public_key_der(der)?,
                )),
                rfc5912::SECP_384_R_1 => Ok(PublicKey::EcdsaP384(
                    p384::PublicKey::from_public_key_der(der)?,
                )),
                rfc5912::SECP_521_R_1 => Ok(PublicKey::EcdsaP521(
                    p521::PublicKey::from_public_key_der(der)?,
                )),
                curve => Err(CertLifeError::UnsupportedAlgorithm(format!(
                    "elliptic curve {curve}"
                ))),
            },
            rfc8410::ID_ED_25519 => Ok(PublicKey::Ed25519(
                Ed25519VerifyingKey::from_public_key_der(der)?,
            )),
            other => Err(CertLifeError::UnsupportedAlgorithm(format!(
                "public key algorithm {other}"
            ))),
        }
    }

    /// Check `signature` over `data` as produced by [`KeyPair::sign_data`].
    ///
    /// Returns `Ok(false)` for a well-formed signature that does not verify.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool> {
        let verified = match self {
            PublicKey::Rsa(key) => {
                let verifying_key = rsa::pkcs1v15::VerifyingKey::<Sha256>::new(key.clone());
                let signature = rsa::pkcs1v15::Signature::try_from(signature)?;
                verifying_key.verify(data, &signature).is_ok()
            }
            PublicKey::EcdsaP256(key) => {
                let verifying_key = p256::ecdsa::VerifyingKey::from(key);
                let signature = p256::ecdsa::Signature::from_der(signature)?;
                verifying_key.verify(data, &signature).is_ok()
            }
            PublicKey::EcdsaP384(key) => {
                let verifying_key = p384::ecdsa::VerifyingKey::from(key);
                let signature = p384::ecdsa::Signature::from_der(signature)?;
                verifying_key.verify(data, &signature).is_ok()
            }
            PublicKey::EcdsaP521(key) => {
                let point = key.to_encoded_point(false);
                let verifying_key = p521::ecdsa::VerifyingKey::from_sec1_bytes(point.as_bytes())?;
                let signature = p521::ecdsa::Signature::from_der(signature)?;
                verifying_key.verify(data, &signature).is_ok()
            }
            PublicKey::Ed25519(key) => {
                let signature = ed25519_dalek::Signature::from_slice(signature)?;
                key.verify(data, &signature).is_ok()
            }
        };
        Ok(verified)
    }

    /// `RSA`, `EC` or `Ed25519`.
    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm().name()
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Rsa(_) => KeyAlgorithm::Rsa,
            PublicKey::EcdsaP256(_) | PublicKey::EcdsaP384(_) | PublicKey::EcdsaP521(_) => {
                KeyAlgorithm::Ec
            }
            PublicKey::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }

    pub fn key_size(&self) -> u32 {
        match self {
            PublicKey::Rsa(key) => key.n().bits() as u32,
            PublicKey::EcdsaP256(_) => 256,
            PublicKey::EcdsaP384(_) => 384,
            PublicKey::EcdsaP521(_) => 521,
            PublicKey::Ed25519(_) => 256,
        }
    }
}
