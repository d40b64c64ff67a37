//! PKCE (RFC 7636) challenge verification.
//!
//! Public clients bind their authorization request to a secret verifier; the
//! token exchange proves possession of it. Both the `S256` and `plain`
//! methods are supported, with `plain` as the default when a challenge is
//! sent without a method.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};

use crate::models::CodeChallengeMethod;
use crate::utils::secret::constant_time_eq;

/// Verify a code_verifier against the stored challenge.
///
/// An empty verifier never matches. Returns `false` on any mismatch;
/// callers surface a generic `invalid_grant` so failure classes stay
/// indistinguishable.
pub fn verify_challenge(verifier: &str, challenge: &str, method: CodeChallengeMethod) -> bool {
    if verifier.is_empty() {
        return false;
    }
    match method {
        CodeChallengeMethod::S256 => {
            constant_time_eq(&compute_s256_challenge(verifier), challenge)
        }
        CodeChallengeMethod::Plain => constant_time_eq(verifier, challenge),
    }
}

/// S256: code_challenge = BASE64URL(SHA-256(code_verifier)).
pub fn compute_s256_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test vector from RFC 7636 Appendix B.
    const RFC_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const RFC_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn s256_accepts_rfc_test_vector() {
        assert_eq!(compute_s256_challenge(RFC_VERIFIER), RFC_CHALLENGE);
        assert!(verify_challenge(
            RFC_VERIFIER,
            RFC_CHALLENGE,
            CodeChallengeMethod::S256
        ));
    }

    #[test]
    fn s256_rejects_wrong_verifier() {
        assert!(!verify_challenge(
            "not-the-right-verifier",
            RFC_CHALLENGE,
            CodeChallengeMethod::S256
        ));
    }

    #[test]
    fn s256_accepts_short_verifiers() {
        // Length policing is the authorize endpoint's business, not the
        // exchange's; a short verifier that hashes to the challenge passes.
        let challenge = compute_s256_challenge("verifier-xyz");
        assert!(verify_challenge(
            "verifier-xyz",
            &challenge,
            CodeChallengeMethod::S256
        ));
    }

    #[test]
    fn plain_compares_verifier_to_challenge() {
        assert!(verify_challenge(
            "plain-value",
            "plain-value",
            CodeChallengeMethod::Plain
        ));
        assert!(!verify_challenge(
            "plain-value",
            "different-value",
            CodeChallengeMethod::Plain
        ));
    }

    #[test]
    fn empty_verifier_is_rejected_even_with_matching_challenge() {
        assert!(!verify_challenge("", "", CodeChallengeMethod::Plain));
        let empty_challenge = compute_s256_challenge("");
        assert!(!verify_challenge(
            "",
            &empty_challenge,
            CodeChallengeMethod::S256
        ));
    }
}
