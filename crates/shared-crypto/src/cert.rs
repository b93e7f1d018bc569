//! X.509 certificate support
//!
//! Parses the certificate bundled in a keystore to obtain the fields a
//! CMS SignerInfo needs, and builds self-signed certificates for
//! development identities.

use chrono::{DateTime, Duration, Utc};
use p256::ecdsa::{signature::Signer, Signature, SigningKey, VerifyingKey};
use x509_cert::der::{Decode, Encode};

use crate::der;
use crate::error::CryptoError;

/// OID for ECDSA with SHA-256: 1.2.840.10045.4.3.2
pub(crate) const OID_ECDSA_SHA256: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x02];

/// OID for EC public key: 1.2.840.10045.2.1
const OID_EC_PUBLIC_KEY: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01];

/// OID for P-256: 1.2.840.10045.3.1.7
const OID_PRIME256V1: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];

/// Validity window of generated development certificates
const SELF_SIGNED_VALIDITY_DAYS: i64 = 365;

/// Fields extracted from a DER certificate
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    pub der: Vec<u8>,
    /// Subject common name, or the full subject when no CN is present
    pub subject: String,
    /// DER-encoded issuer Name
    pub issuer_der: Vec<u8>,
    /// DER-encoded serial number INTEGER
    pub serial_der: Vec<u8>,
    /// SEC1 public key bytes from the SubjectPublicKeyInfo
    pub public_key: Vec<u8>,
}

impl CertificateInfo {
    pub fn parse(cert_der: &[u8]) -> Result<Self, CryptoError> {
        let cert = x509_cert::Certificate::from_der(cert_der)
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
        let tbs = &cert.tbs_certificate;

        let issuer_der = tbs
            .issuer
            .to_der()
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
        let serial_der = tbs
            .serial_number
            .to_der()
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;

        let subject_full = tbs.subject.to_string();
        let subject = common_name_of(&subject_full).unwrap_or(subject_full);

        Ok(Self {
            der: cert_der.to_vec(),
            subject,
            issuer_der,
            serial_der,
            public_key: tbs
                .subject_public_key_info
                .subject_public_key
                .raw_bytes()
                .to_vec(),
        })
    }
}

/// Pull `CN=...` out of an RFC 4514 style subject string
fn common_name_of(subject: &str) -> Option<String> {
    subject
        .split(',')
        .map(str::trim)
        .find_map(|rdn| rdn.strip_prefix("CN="))
        .map(|cn| cn.to_string())
}

/// Build a self-signed certificate for `signing_key` with subject `CN=common_name`
pub fn self_signed(signing_key: &SigningKey, common_name: &str, now: DateTime<Utc>) -> Vec<u8> {
    let verifying_key = VerifyingKey::from(signing_key);
    let public_key = verifying_key.to_encoded_point(false);

    let mut tbs = Vec::new();

    // Version (v3 = 2)
    tbs.extend(der::context_specific(0, &der::integer(&[2])));

    // Serial number derived from the signing time so reissued dev certs differ
    let serial = now.timestamp_millis().to_be_bytes();
    tbs.extend(der::integer(&serial));

    tbs.extend(der::algorithm_identifier(OID_ECDSA_SHA256));
    tbs.extend(der::common_name(common_name));

    let not_before = der::utc_time(&now);
    let not_after = der::utc_time(&(now + Duration::days(SELF_SIGNED_VALIDITY_DAYS)));
    tbs.extend(der::sequence(&[&not_before, &not_after]));

    tbs.extend(der::common_name(common_name));

    let alg = der::sequence(&[&der::oid(OID_EC_PUBLIC_KEY), &der::oid(OID_PRIME256V1)]);
    tbs.extend(der::sequence(&[&alg, &der::bit_string(public_key.as_bytes())]));

    let tbs_cert = der::sequence(&[&tbs]);
    let signature: Signature = signing_key.sign(&tbs_cert);

    der::sequence(&[
        &tbs_cert,
        &der::algorithm_identifier(OID_ECDSA_SHA256),
        &der::bit_string(signature.to_der().as_bytes()),
    ])
}
