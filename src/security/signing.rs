//! HMAC-SHA256 payload signing
//!
//! Produces signatures in the `v1=<hex>` form and verifies them with a
//! constant-time comparison. Used to key-hash auth codes and session tokens
//! at rest so the database never holds a usable plaintext credential.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Version prefix carried by every signature.
pub const SIGNATURE_PREFIX: &str = "v1=";

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Sign a payload under the shared secret.
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    let digest = mac.finalize().into_bytes();
    format!("{SIGNATURE_PREFIX}{}", hex_encode(&digest))
}

/// Verify a `v1=<hex>` signature against a payload.
///
/// The comparison is constant-time over the full signature string; length
/// mismatches fail without inspecting content.
pub fn verify(payload: &[u8], secret: &str, signature: &str) -> bool {
    let expected = sign(payload, secret);
    bool::from(expected.as_bytes().ct_eq(signature.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-shared-secret";

    #[test]
    fn signature_round_trips() {
        let body = b"{\"username\":\"builderman\",\"reason\":\"griefing\"}";
        let sig = sign(body, SECRET);
        assert!(sig.starts_with(SIGNATURE_PREFIX));
        assert!(verify(body, SECRET, &sig));
    }

    #[test]
    fn any_single_byte_mutation_fails() {
        let body = b"payload under test".to_vec();
        let sig = sign(&body, SECRET);

        for i in 0..body.len() {
            let mut mutated = body.clone();
            mutated[i] ^= 0x01;
            assert!(
                !verify(&mutated, SECRET, &sig),
                "mutation at byte {i} still verified"
            );
        }
    }

    #[test]
    fn wrong_secret_fails() {
        let body = b"payload";
        let sig = sign(body, SECRET);
        assert!(!verify(body, "other-secret", &sig));
    }

    #[test]
    fn tampered_signature_fails() {
        let body = b"payload";
        let mut sig = sign(body, SECRET).into_bytes();
        let last = sig.len() - 1;
        sig[last] = if sig[last] == b'0' { b'1' } else { b'0' };
        let sig = String::from_utf8(sig).unwrap();
        assert!(!verify(body, SECRET, &sig));
    }

    #[test]
    fn length_mismatch_fails() {
        assert!(!verify(b"payload", SECRET, "v1=deadbeef"));
        assert!(!verify(b"payload", SECRET, ""));
    }

    // Structural guarantee: the comparison goes through subtle's
    // constant-time primitive, never a short-circuiting ==.
    #[test]
    fn comparison_is_constant_time_primitive() {
        let a = b"aaaaaaaa";
        let b = b"aaaaaaab";
        let choice = a.ct_eq(b);
        assert!(!bool::from(choice));
    }
}
