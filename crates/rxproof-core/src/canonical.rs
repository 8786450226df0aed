//! Canonical CBOR encoding for notifications.
//!
//! Follows RFC 8949 Core Deterministic Encoding for the subset of CBOR a
//! notification needs:
//! - Map keys are small integers, written in ascending order
//! - Integers use the smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds)
//!
//! The same notification always yields the same bytes, so the stored audit
//! log can be hashed or compared byte-for-byte across machines.

use ciborium::value::Value;

use crate::crypto::CallerId;
use crate::digest::Digest;
use crate::error::CoreError;
use crate::notification::Notification;

/// Notification field keys.
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const SEQ: u64 = 0;
    pub const DIGEST: u64 = 1;
    pub const RECORDED_BY: u64 = 2;
    pub const RECORDED_AT: u64 = 3;
}

/// Encode a notification to canonical CBOR bytes.
pub fn canonical_notification_bytes(notification: &Notification) -> Vec<u8> {
    let mut buf = Vec::with_capacity(96);

    // Map of 4 entries, keys already ascending.
    encode_uint(&mut buf, 5, 4);

    encode_uint(&mut buf, 0, keys::SEQ);
    encode_uint(&mut buf, 0, notification.seq);

    encode_uint(&mut buf, 0, keys::DIGEST);
    encode_bytes(&mut buf, notification.digest.as_bytes());

    encode_uint(&mut buf, 0, keys::RECORDED_BY);
    encode_bytes(&mut buf, notification.recorded_by.as_bytes());

    encode_uint(&mut buf, 0, keys::RECORDED_AT);
    encode_int(&mut buf, notification.recorded_at);

    buf
}

/// Decode a notification from canonical bytes.
///
/// Rejects input that decodes but is not in canonical form.
pub fn decode_notification(bytes: &[u8]) -> Result<Notification, CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let map = match value {
        Value::Map(m) => m,
        _ => return Err(CoreError::DecodingError("expected map".into())),
    };

    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| match k {
                Value::Integer(i) => i128::from(*i) == key as i128,
                _ => false,
            })
            .map(|(_, v)| v)
    };

    let seq = match get(keys::SEQ) {
        Some(Value::Integer(i)) => u64::try_from(i128::from(*i))
            .map_err(|_| CoreError::DecodingError("seq out of range".into()))?,
        _ => return Err(CoreError::DecodingError("missing seq".into())),
    };

    let digest = match get(keys::DIGEST) {
        Some(Value::Bytes(b)) => Digest::try_from(b.as_slice())?,
        _ => return Err(CoreError::DecodingError("missing digest".into())),
    };

    let recorded_by = match get(keys::RECORDED_BY) {
        Some(Value::Bytes(b)) if b.len() == 32 => {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(b);
            CallerId(arr)
        }
        _ => return Err(CoreError::DecodingError("invalid recorded_by".into())),
    };

    let recorded_at = match get(keys::RECORDED_AT) {
        Some(Value::Integer(i)) => i64::try_from(i128::from(*i))
            .map_err(|_| CoreError::DecodingError("recorded_at out of range".into()))?,
        _ => return Err(CoreError::DecodingError("missing recorded_at".into())),
    };

    let notification = Notification::new(seq, digest, recorded_by, recorded_at);

    if canonical_notification_bytes(&notification) != bytes {
        return Err(CoreError::DecodingError("non-canonical encoding".into()));
    }

    Ok(notification)
}

/// Encode a signed integer (major types 0 and 1).
fn encode_int(buf: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Notification {
        Notification::new(
            7,
            Digest::sha256(b"rx"),
            CallerId::from_bytes([0x09; 32]),
            1_736_870_400_000,
        )
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let n = sample();
        assert_eq!(canonical_notification_bytes(&n), canonical_notification_bytes(&n));
    }

    #[test]
    fn test_decode_inverts_encode() {
        let n = sample();
        let bytes = canonical_notification_bytes(&n);
        assert_eq!(decode_notification(&bytes).unwrap(), n);
    }

    #[test]
    fn test_header_layout() {
        let bytes = canonical_notification_bytes(&sample());
        // map(4), key 0, seq 7, key 1, bytes(32)
        assert_eq!(&bytes[..5], &[0xa4, 0x00, 0x07, 0x01, 0x58]);
        assert_eq!(bytes[5], 32);
    }

    #[test]
    fn test_negative_timestamp() {
        let mut n = sample();
        n.recorded_at = -1;
        let bytes = canonical_notification_bytes(&n);
        assert_eq!(*bytes.last().unwrap(), 0x20);
        assert_eq!(decode_notification(&bytes).unwrap().recorded_at, -1);
    }

    #[test]
    fn test_non_canonical_rejected() {
        // Same fields, seq written with a needless 1-byte length prefix.
        let n = sample();
        let mut bytes = canonical_notification_bytes(&n);
        bytes.splice(2..3, [0x18, 0x07]);
        assert!(decode_notification(&bytes).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode_notification(&[0xff, 0x00]).is_err());
        assert!(decode_notification(&[0x01]).is_err());
    }
}
