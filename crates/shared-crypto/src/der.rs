//! Minimal ASN.1 DER encoding helpers

pub(crate) const TAG_INTEGER: u8 = 0x02;
pub(crate) const TAG_BIT_STRING: u8 = 0x03;
pub(crate) const TAG_OCTET_STRING: u8 = 0x04;
pub(crate) const TAG_NULL: u8 = 0x05;
pub(crate) const TAG_OID: u8 = 0x06;
pub(crate) const TAG_UTF8_STRING: u8 = 0x0C;
pub(crate) const TAG_UTC_TIME: u8 = 0x17;
pub(crate) const TAG_SEQUENCE: u8 = 0x30;
pub(crate) const TAG_SET: u8 = 0x31;

pub(crate) fn sequence(items: &[&[u8]]) -> Vec<u8> {
    let content: Vec<u8> = items.iter().flat_map(|i| i.iter().copied()).collect();
    tlv(TAG_SEQUENCE, &content)
}

pub(crate) fn set(content: &[u8]) -> Vec<u8> {
    tlv(TAG_SET, content)
}

pub(crate) fn oid(oid_bytes: &[u8]) -> Vec<u8> {
    tlv(TAG_OID, oid_bytes)
}

/// Encode an unsigned big-endian integer
pub(crate) fn integer(value: &[u8]) -> Vec<u8> {
    // Strip redundant leading zeros, keep at least one byte
    let first = value.iter().position(|b| *b != 0).unwrap_or(value.len().saturating_sub(1));
    let value = if value.is_empty() { &[0u8][..] } else { &value[first..] };

    if value[0] & 0x80 != 0 {
        let mut padded = vec![0];
        padded.extend(value);
        tlv(TAG_INTEGER, &padded)
    } else {
        tlv(TAG_INTEGER, value)
    }
}

pub(crate) fn octet_string(content: &[u8]) -> Vec<u8> {
    tlv(TAG_OCTET_STRING, content)
}

pub(crate) fn bit_string(content: &[u8]) -> Vec<u8> {
    let mut bs = vec![0]; // No unused bits
    bs.extend(content);
    tlv(TAG_BIT_STRING, &bs)
}

pub(crate) fn utf8_string(s: &str) -> Vec<u8> {
    tlv(TAG_UTF8_STRING, s.as_bytes())
}

/// `YYMMDDHHMMSSZ`
pub(crate) fn utc_time(time: &chrono::DateTime<chrono::Utc>) -> Vec<u8> {
    tlv(TAG_UTC_TIME, time.format("%y%m%d%H%M%SZ").to_string().as_bytes())
}

/// Constructed context-specific tag `[n]`
pub(crate) fn context_specific(tag: u8, content: &[u8]) -> Vec<u8> {
    tlv(0xA0 | tag, content)
}

pub(crate) fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut result = vec![tag];
    let len = content.len();

    if len < 128 {
        result.push(len as u8);
    } else if len < 256 {
        result.push(0x81);
        result.push(len as u8);
    } else if len < 65536 {
        result.push(0x82);
        result.push((len >> 8) as u8);
        result.push(len as u8);
    } else {
        result.push(0x83);
        result.push((len >> 16) as u8);
        result.push((len >> 8) as u8);
        result.push(len as u8);
    }

    result.extend(content);
    result
}

/// AlgorithmIdentifier with absent parameters (ECDSA, SHA-2 family)
pub(crate) fn algorithm_identifier(oid_bytes: &[u8]) -> Vec<u8> {
    sequence(&[&oid(oid_bytes)])
}

/// AlgorithmIdentifier with explicit NULL parameters (RSA family)
pub(crate) fn algorithm_identifier_with_null(oid_bytes: &[u8]) -> Vec<u8> {
    sequence(&[&oid(oid_bytes), &[TAG_NULL, 0x00]])
}

/// Name with a single CN attribute
pub(crate) fn common_name(cn: &str) -> Vec<u8> {
    let cn_oid = oid(&[0x55, 0x04, 0x03]); // 2.5.4.3
    let attr = sequence(&[&cn_oid, &utf8_string(cn)]);
    sequence(&[&set(&attr)])
}
