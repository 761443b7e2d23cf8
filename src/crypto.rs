//! Fingerprint and recovery-phrase hashing, and recovery phrase generation.
//!
//! Fingerprints and recovery phrases are both high-entropy client-supplied
//! secrets, so a plain one-way digest is sufficient — no salt or KDF work
//! factor is needed the way it would be for a user-chosen password.

use crate::types::RECOVERY_PHRASE_WORDS;
use crate::wordlist::WORDLIST;
use rand::seq::SliceRandom;
use sha3::{Digest, Sha3_256};

pub type Digest32 = [u8; 32];

pub fn hash_fingerprint(fingerprint: &str) -> Digest32 {
    sha3(fingerprint.as_bytes())
}

pub fn hash_recovery_phrase(phrase: &str) -> Digest32 {
    sha3(phrase.trim().to_lowercase().as_bytes())
}

fn sha3(data: &[u8]) -> Digest32 {
    Sha3_256::digest(data).into()
}

/// Draw a fresh recovery phrase: `RECOVERY_PHRASE_WORDS` words from the
/// dictionary, joined by `-`. Returned alongside its hash so callers never
/// have to hash it themselves at issuance time.
pub fn generate_recovery_phrase() -> (String, Digest32) {
    let mut rng = rand::thread_rng();
    let words: Vec<&str> = WORDLIST
        .choose_multiple(&mut rng, RECOVERY_PHRASE_WORDS)
        .copied()
        .collect();
    let phrase = words.join("-");
    let hash = hash_recovery_phrase(&phrase);
    (phrase, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_fingerprint_hashes_equal() {
        assert_eq!(hash_fingerprint("abc"), hash_fingerprint("abc"));
        assert_ne!(hash_fingerprint("abc"), hash_fingerprint("abd"));
    }

    #[test]
    fn recovery_phrase_has_expected_shape() {
        let (phrase, hash) = generate_recovery_phrase();
        let words: Vec<&str> = phrase.split('-').collect();
        assert_eq!(words.len(), RECOVERY_PHRASE_WORDS);
        assert_eq!(hash_recovery_phrase(&phrase), hash);
    }

    #[test]
    fn recovery_hash_is_case_and_whitespace_insensitive() {
        let (phrase, hash) = generate_recovery_phrase();
        let loud = format!("  {}  ", phrase.to_uppercase());
        assert_eq!(hash_recovery_phrase(&loud), hash);
    }
}
