//! CMS (Cryptographic Message Syntax) construction for PDF signatures
//!
//! Produces a detached PKCS#7 SignedData (`adbe.pkcs7.detached`) whose
//! signed attributes are:
//! - content-type
//! - signing-time
//! - message-digest
//! - signing-certificate-v2 (ESS)

use chrono::{DateTime, Utc};

use crate::cert::OID_ECDSA_SHA256;
use crate::der;
use crate::keys::{sha256, KeyAlgorithm, SigningIdentity};

/// OID for SHA-256: 2.16.840.1.101.3.4.2.1
const OID_SHA256: &[u8] = &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01];

/// OID for sha256WithRSAEncryption: 1.2.840.113549.1.1.11
const OID_SHA256_WITH_RSA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0B];

/// OID for id-data (PKCS#7): 1.2.840.113549.1.7.1
const OID_DATA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x01];

/// OID for id-signedData (PKCS#7): 1.2.840.113549.1.7.2
const OID_SIGNED_DATA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02];

/// OID for content-type attribute: 1.2.840.113549.1.9.3
const OID_CONTENT_TYPE: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x03];

/// OID for message-digest attribute: 1.2.840.113549.1.9.4
const OID_MESSAGE_DIGEST: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x04];

/// OID for signing-time attribute: 1.2.840.113549.1.9.5
const OID_SIGNING_TIME: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x05];

/// OID for id-aa-signingCertificateV2: 1.2.840.113549.1.9.16.2.47
const OID_SIGNING_CERTIFICATE_V2: &[u8] = &[
    0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x10, 0x02, 0x2F,
];

/// Build a detached CMS SignedData over a precomputed SHA-256 content digest
///
/// # Arguments
/// * `identity` - Keystore identity whose certificate and key sign the data
/// * `content_digest` - SHA-256 of the signed PDF byte ranges
/// * `signing_time` - Time recorded in the signing-time attribute
pub fn build_signed_data<I: SigningIdentity + ?Sized>(
    identity: &I,
    content_digest: &[u8; 32],
    signing_time: DateTime<Utc>,
) -> Vec<u8> {
    let attrs = build_signed_attributes(content_digest, &signing_time, identity.certificate_der());

    // The signature covers the DER of the attributes encoded as a SET
    let signature = identity.sign(&der::set(&attrs));

    let signer_info = build_signer_info(identity, &attrs, &signature);
    let signed_data = build_signed_data_content(identity, &signer_info);

    let content = der::context_specific(0, &signed_data);
    der::sequence(&[&der::oid(OID_SIGNED_DATA), &content])
}

/// Concatenated attribute SEQUENCEs (the caller wraps them in SET or `[0]`)
fn build_signed_attributes(
    content_digest: &[u8],
    signing_time: &DateTime<Utc>,
    certificate: &[u8],
) -> Vec<u8> {
    let mut attrs = Vec::new();
    attrs.extend(build_attribute(OID_CONTENT_TYPE, &der::oid(OID_DATA)));
    attrs.extend(build_attribute(OID_SIGNING_TIME, &der::utc_time(signing_time)));
    attrs.extend(build_attribute(
        OID_MESSAGE_DIGEST,
        &der::octet_string(content_digest),
    ));
    attrs.extend(build_signing_certificate_v2(certificate));
    attrs
}

/// SigningCertificateV2 ::= SEQUENCE { certs SEQUENCE OF ESSCertIDv2 }
/// ESSCertIDv2 ::= SEQUENCE { hashAlgorithm DEFAULT sha256, certHash OCTET STRING }
fn build_signing_certificate_v2(certificate: &[u8]) -> Vec<u8> {
    let cert_hash = sha256(certificate);
    let ess_cert_id = der::sequence(&[&der::octet_string(&cert_hash)]);
    let certs = der::sequence(&[&ess_cert_id]);
    let signing_cert = der::sequence(&[&certs]);
    build_attribute(OID_SIGNING_CERTIFICATE_V2, &signing_cert)
}

/// Attribute ::= SEQUENCE { attrType OID, attrValues SET OF ANY }
fn build_attribute(oid: &[u8], value: &[u8]) -> Vec<u8> {
    der::sequence(&[&der::oid(oid), &der::set(value)])
}

/// SignerInfo.signatureAlgorithm for the identity's key
fn signature_algorithm(algorithm: KeyAlgorithm) -> Vec<u8> {
    match algorithm {
        KeyAlgorithm::EcdsaP256 => der::algorithm_identifier(OID_ECDSA_SHA256),
        KeyAlgorithm::Rsa => der::algorithm_identifier_with_null(OID_SHA256_WITH_RSA),
    }
}

fn build_signer_info<I: SigningIdentity + ?Sized>(
    identity: &I,
    attrs: &[u8],
    signature: &[u8],
) -> Vec<u8> {
    let issuer_and_serial = der::sequence(&[identity.issuer_der(), identity.serial_der()]);

    der::sequence(&[
        &der::integer(&[1]),
        &issuer_and_serial,
        &der::algorithm_identifier(OID_SHA256),
        &der::context_specific(0, attrs),
        &signature_algorithm(identity.key_algorithm()),
        &der::octet_string(signature),
    ])
}

fn build_signed_data_content<I: SigningIdentity + ?Sized>(
    identity: &I,
    signer_info: &[u8],
) -> Vec<u8> {
    let mut certificates = identity.certificate_der().to_vec();
    for extra in identity.chain_der() {
        certificates.extend(extra);
    }

    der::sequence(&[
        &der::integer(&[1]),
        &der::set(&der::algorithm_identifier(OID_SHA256)),
        // Detached: encapContentInfo carries only the content type
        &der::sequence(&[&der::oid(OID_DATA)]),
        &der::context_specific(0, &certificates),
        &der::set(signer_info),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeystoreIdentity;

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn content_info_wraps_signed_data() {
        let identity = KeystoreIdentity::ephemeral("CMS Signer").unwrap();
        let cms = build_signed_data(&identity, &sha256(b"pdf"), Utc::now());

        assert_eq!(cms[0], der::TAG_SEQUENCE);
        assert!(find(&cms, OID_SIGNED_DATA).is_some());
    }

    #[test]
    fn embeds_digest_certificate_and_valid_signature() {
        let identity = KeystoreIdentity::ephemeral("CMS Signer").unwrap();
        let digest = sha256(b"byte ranges");
        let now = Utc::now();
        let cms = build_signed_data(&identity, &digest, now);

        assert!(find(&cms, &digest).is_some(), "message digest must be embedded");
        assert!(
            find(&cms, identity.certificate_der()).is_some(),
            "signer certificate must be embedded"
        );

        // Recompute the signed attributes and verify the embedded signature over them
        let attrs = build_signed_attributes(&digest, &now, identity.certificate_der());
        let signed_bytes = der::set(&attrs);
        let tagged = der::context_specific(0, &attrs);
        let attrs_at = find(&cms, &tagged).expect("signed attributes present");

        let after = &cms[attrs_at + tagged.len()..];
        let sig_alg = der::algorithm_identifier(OID_ECDSA_SHA256);
        assert_eq!(&after[..sig_alg.len()], &sig_alg[..]);

        let signature = octet_string_body(&after[sig_alg.len()..]);
        assert!(identity.verify(&signed_bytes, signature));
    }

    /// Body of a DER OCTET STRING, short or long form length
    fn octet_string_body(tlv: &[u8]) -> &[u8] {
        assert_eq!(tlv[0], der::TAG_OCTET_STRING);
        let (len, header) = match tlv[1] {
            n if n < 0x80 => (n as usize, 2),
            0x81 => (tlv[2] as usize, 3),
            0x82 => (((tlv[2] as usize) << 8) | tlv[3] as usize, 4),
            other => panic!("unexpected length byte {:#x}", other),
        };
        &tlv[header..header + len]
    }

    #[test]
    fn rsa_signer_uses_sha256_with_rsa_encryption() {
        let identity = KeystoreIdentity::from_pkcs12(
            include_bytes!("../testdata/rsa_legacy.p12"),
            "fixture-pass",
        )
        .unwrap();
        assert_eq!(identity.key_algorithm(), KeyAlgorithm::Rsa);

        let digest = sha256(b"rsa byte ranges");
        let now = Utc::now();
        let cms = build_signed_data(&identity, &digest, now);

        let attrs = build_signed_attributes(&digest, &now, identity.certificate_der());
        let tagged = der::context_specific(0, &attrs);
        let attrs_at = find(&cms, &tagged).expect("signed attributes present");
        let after = &cms[attrs_at + tagged.len()..];

        let sig_alg = der::algorithm_identifier_with_null(OID_SHA256_WITH_RSA);
        assert_eq!(&after[..sig_alg.len()], &sig_alg[..]);
        assert!(find(&cms, &der::algorithm_identifier(OID_ECDSA_SHA256)).is_none());

        let signature = octet_string_body(&after[sig_alg.len()..]);
        assert_eq!(signature.len(), 256);
        assert!(identity.verify(&der::set(&attrs), signature));
    }
}
