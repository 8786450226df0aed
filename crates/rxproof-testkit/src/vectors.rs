//! Golden digest vectors.
//!
//! Published test vectors for both supported algorithms. A producer that
//! disagrees with any of these would assign different keys to the same
//! document and silently break verification.

use rxproof_core::{Digest, DigestAlgorithm};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub algorithm: DigestAlgorithm,
    pub input: &'static [u8],
    /// Expected digest (hex).
    pub expected: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "sha256 empty",
            algorithm: DigestAlgorithm::Sha256,
            input: b"",
            expected: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        GoldenVector {
            name: "sha256 abc",
            algorithm: DigestAlgorithm::Sha256,
            input: b"abc",
            expected: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        },
        GoldenVector {
            name: "sha256 two-block message",
            algorithm: DigestAlgorithm::Sha256,
            input: b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
            expected: "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1",
        },
        GoldenVector {
            name: "sha256 quick brown fox",
            algorithm: DigestAlgorithm::Sha256,
            input: b"The quick brown fox jumps over the lazy dog",
            expected: "d7a8fbb307d7809469ca9abcb0082e4f8d5651e46d3cdb762d02d0bf37c9e592",
        },
        GoldenVector {
            name: "blake3 empty",
            algorithm: DigestAlgorithm::Blake3,
            input: b"",
            expected: "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262",
        },
        GoldenVector {
            name: "blake3 abc",
            algorithm: DigestAlgorithm::Blake3,
            input: b"abc",
            expected: "6437b3ac38465133ffb63b75273a8db548c558465d79db03fd359c6cd5bd9d85",
        },
    ]
}

/// Compute a vector's digest.
pub fn compute(vector: &GoldenVector) -> Digest {
    Digest::compute(vector.algorithm, vector.input)
}

/// Check every vector, returning `(name, matches, computed_hex)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let hex = compute(v).to_hex();
            (v.name.to_string(), hex == v.expected, hex)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, ok, hex) in verify_all_vectors() {
            assert!(ok, "vector '{}' produced {}", name, hex);
        }
    }

    #[test]
    fn test_expected_values_decode() {
        for v in all_vectors() {
            let bytes = hex::decode(v.expected).unwrap();
            assert_eq!(bytes.len(), 32, "vector '{}'", v.name);
        }
    }

    #[test]
    fn test_algorithms_disagree() {
        let sha = Digest::compute(DigestAlgorithm::Sha256, b"abc");
        let b3 = Digest::compute(DigestAlgorithm::Blake3, b"abc");
        assert_ne!(sha, b3);
    }
}
