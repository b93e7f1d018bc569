//! Signing identities backed by a PKCS#12 keystore

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use p256::{
    ecdsa::{
        signature::{SignatureEncoding, Signer, Verifier},
        Signature, SigningKey, VerifyingKey,
    },
    pkcs8::DecodePrivateKey,
    SecretKey,
};
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::pkcs1v15;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};

use crate::cert::{self, CertificateInfo};
use crate::error::CryptoError;

/// Public key algorithm of a signing identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// ECDSA on P-256 with SHA-256
    EcdsaP256,
    /// RSASSA-PKCS1-v1_5 with SHA-256
    Rsa,
}

/// Trait for any identity that can sign documents
pub trait SigningIdentity: Send + Sync {
    /// DER-encoded signer certificate
    fn certificate_der(&self) -> &[u8];

    /// DER-encoded issuer Name of the signer certificate
    fn issuer_der(&self) -> &[u8];

    /// DER-encoded serial number of the signer certificate
    fn serial_der(&self) -> &[u8];

    /// Additional chain certificates to embed alongside the signer certificate
    fn chain_der(&self) -> &[Vec<u8>] {
        &[]
    }

    /// Signer common name
    fn signer_name(&self) -> &str;

    fn key_algorithm(&self) -> KeyAlgorithm;

    /// SHA-256 signature over `data` in the encoding CMS expects:
    /// DER `Ecdsa-Sig-Value` for P-256, raw PKCS#1 v1.5 bytes for RSA
    fn sign(&self, data: &[u8]) -> Vec<u8>;

    /// Verify a signature produced by [`SigningIdentity::sign`]
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool;
}

/// Private key plus its verifier
enum KeyPair {
    P256 {
        signing: SigningKey,
        verifying: VerifyingKey,
    },
    Rsa {
        signing: pkcs1v15::SigningKey<Sha256>,
        verifying: pkcs1v15::VerifyingKey<Sha256>,
    },
}

impl KeyPair {
    /// Decode a PKCS#8 PrivateKeyInfo holding a P-256 or RSA key
    fn from_pkcs8(der: &[u8]) -> Result<Self, CryptoError> {
        if let Ok(signing) = SigningKey::from_pkcs8_der(der) {
            let verifying = VerifyingKey::from(&signing);
            return Ok(KeyPair::P256 { signing, verifying });
        }
        let private = RsaPrivateKey::from_pkcs8_der(der).map_err(|e| {
            CryptoError::InvalidKey(format!("expected a P-256 or RSA private key: {}", e))
        })?;
        let verifying = pkcs1v15::VerifyingKey::new(private.to_public_key());
        Ok(KeyPair::Rsa {
            signing: pkcs1v15::SigningKey::new(private),
            verifying,
        })
    }

    /// The subjectPublicKey bytes a matching certificate carries
    fn public_key_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        match self {
            KeyPair::P256 { verifying, .. } => {
                Ok(verifying.to_encoded_point(false).as_bytes().to_vec())
            }
            KeyPair::Rsa { signing, .. } => {
                let private: &RsaPrivateKey = signing.as_ref();
                private
                    .to_public_key()
                    .to_pkcs1_der()
                    .map(|doc| doc.as_bytes().to_vec())
                    .map_err(|e| CryptoError::InvalidKey(e.to_string()))
            }
        }
    }

    fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyPair::P256 { .. } => KeyAlgorithm::EcdsaP256,
            KeyPair::Rsa { .. } => KeyAlgorithm::Rsa,
        }
    }
}

/// Identity decoded from a PKCS#12 (.p12/.pfx) bundle
pub struct KeystoreIdentity {
    key: KeyPair,
    certificate: CertificateInfo,
    chain: Vec<Vec<u8>>,
}

impl std::fmt::Debug for KeystoreIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoreIdentity")
            .field("subject", &self.certificate.subject)
            .field("algorithm", &self.key.algorithm())
            .field("chain_len", &self.chain.len())
            .finish_non_exhaustive()
    }
}

/// Only the legacy SHA-1 HMAC is understood; anything else must be rejected
/// before `verify_mac`, which asserts on the algorithm
fn check_mac_algorithm(pfx: &p12::PFX) -> Result<(), CryptoError> {
    match &pfx.mac_data {
        Some(mac) => match &mac.mac.digest_algorithm {
            p12::AlgorithmIdentifier::Sha1 => Ok(()),
            p12::AlgorithmIdentifier::OtherAlg(other) => Err(CryptoError::Keystore(format!(
                "unsupported MAC algorithm {}; re-export the keystore with `openssl pkcs12 -export -legacy`",
                other.algorithm_type
            ))),
            other => Err(CryptoError::Keystore(format!(
                "unsupported MAC algorithm {:?}",
                other
            ))),
        },
        None => Ok(()),
    }
}

impl KeystoreIdentity {
    /// Decode a password-protected PKCS#12 bundle holding a P-256 or RSA key
    ///
    /// Keystores must use the legacy SHA-1 MAC with PKCS#12 PBE encryption
    /// (3DES or RC2), as produced by `openssl pkcs12 -export -legacy`.
    pub fn from_pkcs12(der: &[u8], password: &str) -> Result<Self, CryptoError> {
        let pfx = p12::PFX::parse(der).map_err(|e| CryptoError::Keystore(format!("{:?}", e)))?;
        check_mac_algorithm(&pfx)?;

        if !pfx.verify_mac(password) {
            return Err(CryptoError::BadPassword);
        }

        let keys = pfx
            .key_bags(password)
            .map_err(|e| CryptoError::Keystore(format!("{:?}", e)))?;
        let key_der = keys
            .into_iter()
            .next()
            .ok_or(CryptoError::MissingEntry("private key"))?;

        let mut certs = pfx
            .cert_x509_bags(password)
            .map_err(|e| CryptoError::Keystore(format!("{:?}", e)))?;
        if certs.is_empty() {
            return Err(CryptoError::MissingEntry("certificate"));
        }

        let key = KeyPair::from_pkcs8(&key_der)?;
        let own_public_key = key.public_key_bytes()?;

        // The leaf is whichever certificate carries our public key
        let leaf_index = certs
            .iter()
            .position(|der| {
                CertificateInfo::parse(der)
                    .map(|info| info.public_key == own_public_key)
                    .unwrap_or(false)
            })
            .ok_or(CryptoError::KeyMismatch)?;
        let certificate = CertificateInfo::parse(&certs.remove(leaf_index))?;

        tracing::info!(
            subject = %certificate.subject,
            algorithm = ?key.algorithm(),
            chain = certs.len(),
            "Loaded signing identity from keystore"
        );

        Ok(Self {
            key,
            certificate,
            chain: certs,
        })
    }

    /// Decode a keystore delivered as base64 (e.g. from an environment variable)
    pub fn from_pkcs12_base64(encoded: &str, password: &str) -> Result<Self, CryptoError> {
        let der = BASE64
            .decode(encoded.trim())
            .map_err(|e| CryptoError::Keystore(format!("invalid base64: {}", e)))?;
        Self::from_pkcs12(&der, password)
    }

    /// Generate a random P-256 key with a self-signed certificate
    pub fn ephemeral(common_name: &str) -> Result<Self, CryptoError> {
        let secret_key = SecretKey::random(&mut rand_core::OsRng);
        let signing = SigningKey::from(&secret_key);
        let verifying = VerifyingKey::from(&signing);
        let cert_der = cert::self_signed(&signing, common_name, Utc::now());
        let certificate = CertificateInfo::parse(&cert_der)?;

        Ok(Self {
            key: KeyPair::P256 { signing, verifying },
            certificate,
            chain: Vec::new(),
        })
    }

    /// PKCS#8 DER of the private key, used to build keystores in tooling and tests
    pub fn private_key_pkcs8(&self) -> Result<Vec<u8>, CryptoError> {
        use p256::pkcs8::EncodePrivateKey;

        let document = match &self.key {
            KeyPair::P256 { signing, .. } => signing.to_pkcs8_der(),
            KeyPair::Rsa { signing, .. } => {
                let private: &RsaPrivateKey = signing.as_ref();
                private.to_pkcs8_der()
            }
        };
        document
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }
}

impl SigningIdentity for KeystoreIdentity {
    fn certificate_der(&self) -> &[u8] {
        &self.certificate.der
    }

    fn issuer_der(&self) -> &[u8] {
        &self.certificate.issuer_der
    }

    fn serial_der(&self) -> &[u8] {
        &self.certificate.serial_der
    }

    fn chain_der(&self) -> &[Vec<u8>] {
        &self.chain
    }

    fn signer_name(&self) -> &str {
        &self.certificate.subject
    }

    fn key_algorithm(&self) -> KeyAlgorithm {
        self.key.algorithm()
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        match &self.key {
            KeyPair::P256 { signing, .. } => {
                let signature: Signature = signing.sign(data);
                signature.to_der().as_bytes().to_vec()
            }
            KeyPair::Rsa { signing, .. } => {
                let signature: pkcs1v15::Signature = signing.sign(data);
                signature.to_vec()
            }
        }
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match &self.key {
            KeyPair::P256 { verifying, .. } => match Signature::from_der(signature) {
                Ok(sig) => verifying.verify(data, &sig).is_ok(),
                Err(_) => false,
            },
            KeyPair::Rsa { verifying, .. } => match pkcs1v15::Signature::try_from(signature) {
                Ok(sig) => verifying.verify(data, &sig).is_ok(),
                Err(_) => false,
            },
        }
    }
}

/// Hash data using SHA-256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &str = "correct horse";

    fn keystore_for(identity: &KeystoreIdentity) -> Vec<u8> {
        let key = identity.private_key_pkcs8().unwrap();
        p12::PFX::new(identity.certificate_der(), &key, None, PASSWORD, "signer")
            .expect("PFX should build")
            .to_der()
    }

    #[test]
    fn ephemeral_identity_signs_and_verifies() {
        let identity = KeystoreIdentity::ephemeral("Dev Signer").unwrap();
        let signature = identity.sign(b"hello");
        assert!(identity.verify(b"hello", &signature));
        assert!(!identity.verify(b"tampered", &signature));
        assert_eq!(identity.signer_name(), "Dev Signer");
    }

    #[test]
    fn pkcs12_round_trip_preserves_key_and_certificate() {
        let original = KeystoreIdentity::ephemeral("Keystore Signer").unwrap();
        let pfx = keystore_for(&original);

        let loaded = KeystoreIdentity::from_pkcs12(&pfx, PASSWORD).expect("keystore should load");
        assert_eq!(loaded.certificate_der(), original.certificate_der());
        assert_eq!(loaded.signer_name(), "Keystore Signer");

        let signature = loaded.sign(b"document bytes");
        assert!(original.verify(b"document bytes", &signature));
    }

    #[test]
    fn pkcs12_base64_wrapper_decodes() {
        let original = KeystoreIdentity::ephemeral("B64 Signer").unwrap();
        let encoded = BASE64.encode(keystore_for(&original));
        let loaded = KeystoreIdentity::from_pkcs12_base64(&encoded, PASSWORD).unwrap();
        assert_eq!(loaded.serial_der(), original.serial_der());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let pfx = keystore_for(&KeystoreIdentity::ephemeral("Signer").unwrap());
        let result = KeystoreIdentity::from_pkcs12(&pfx, "wrong");
        assert!(matches!(result, Err(CryptoError::BadPassword)));
    }

    #[test]
    fn garbage_keystore_is_rejected() {
        let result = KeystoreIdentity::from_pkcs12(b"not a keystore", PASSWORD);
        assert!(matches!(result, Err(CryptoError::Keystore(_))));
    }

    #[test]
    fn certificate_for_other_key_is_a_mismatch() {
        let a = KeystoreIdentity::ephemeral("A").unwrap();
        let b = KeystoreIdentity::ephemeral("B").unwrap();
        let key = a.private_key_pkcs8().unwrap();
        let pfx = p12::PFX::new(b.certificate_der(), &key, None, PASSWORD, "mixed")
            .unwrap()
            .to_der();

        let result = KeystoreIdentity::from_pkcs12(&pfx, PASSWORD);
        assert!(matches!(result, Err(CryptoError::KeyMismatch)));
    }

    // Keystores exported by `openssl pkcs12 -export`, password below
    const FIXTURE_PASSWORD: &str = "fixture-pass";
    const EC_LEGACY: &[u8] = include_bytes!("../testdata/ec_legacy.p12");
    const EC_MODERN: &[u8] = include_bytes!("../testdata/ec_modern.p12");
    const RSA_LEGACY: &[u8] = include_bytes!("../testdata/rsa_legacy.p12");

    #[test]
    fn openssl_legacy_ec_keystore_loads() {
        let identity = KeystoreIdentity::from_pkcs12(EC_LEGACY, FIXTURE_PASSWORD).unwrap();
        assert_eq!(identity.signer_name(), "Fixture EC Signer");
        assert_eq!(identity.key_algorithm(), KeyAlgorithm::EcdsaP256);

        let signature = identity.sign(b"payload");
        assert!(identity.verify(b"payload", &signature));
    }

    #[test]
    fn sha256_mac_keystore_is_an_error_not_a_panic() {
        let result = KeystoreIdentity::from_pkcs12(EC_MODERN, FIXTURE_PASSWORD);
        match result {
            Err(CryptoError::Keystore(message)) => {
                assert!(message.contains("2.16.840.1.101.3.4.2.1"), "{}", message);
                assert!(message.contains("-legacy"), "{}", message);
            }
            other => panic!("expected a keystore error, got {:?}", other),
        }
    }

    #[test]
    fn openssl_rsa_keystore_signs_with_pkcs1v15() {
        let identity = KeystoreIdentity::from_pkcs12(RSA_LEGACY, FIXTURE_PASSWORD).unwrap();
        assert_eq!(identity.signer_name(), "Fixture RSA Signer");
        assert_eq!(identity.key_algorithm(), KeyAlgorithm::Rsa);

        let signature = identity.sign(b"payload");
        assert_eq!(signature.len(), 256);
        assert!(identity.verify(b"payload", &signature));
        assert!(!identity.verify(b"other", &signature));
    }

    #[test]
    fn rsa_fixture_wrong_password_is_rejected() {
        let result = KeystoreIdentity::from_pkcs12(RSA_LEGACY, "nope");
        assert!(matches!(result, Err(CryptoError::BadPassword)));
    }
}
