/// Random secrets and constant-time comparison
///
/// Used for the unusable password given to auto-provisioned federated
/// accounts, the OAuth `state` value, username collision suffixes, and the
/// admin signup key check.
///
/// # Example
///
/// ```
/// use planora_shared::auth::secret::{constant_time_eq, random_alphanumeric};
///
/// let state = random_alphanumeric(32);
/// assert_eq!(state.len(), 32);
///
/// assert!(constant_time_eq("letmein", "letmein"));
/// assert!(!constant_time_eq("letmein", "letmeout"));
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const LOWER_ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the throwaway password for federated accounts
const UNUSABLE_PASSWORD_LENGTH: usize = 48;

fn random_from(charset: &[u8], length: usize) -> String {
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

/// Random `[A-Za-z0-9]` string from the thread-local CSPRNG
pub fn random_alphanumeric(length: usize) -> String {
    random_from(ALPHANUMERIC, length)
}

/// Random `[a-z0-9]` string, valid inside a username
pub fn random_username_suffix(length: usize) -> String {
    random_from(LOWER_ALPHANUMERIC, length)
}

/// Password that is hashed and stored but never handed to anyone
pub fn unusable_password() -> String {
    random_alphanumeric(UNUSABLE_PASSWORD_LENGTH)
}

/// Compares two secrets without leaking where they differ
///
/// Both sides are hashed first, so the loop always runs over 32 bytes and
/// the length of the configured secret is not observable either.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}

/// Hex SHA-256 fingerprint, safe to log in place of a secret value
pub fn fingerprint(value: &str) -> String {
    hex::encode(&Sha256::digest(value.as_bytes())[..6])
}
