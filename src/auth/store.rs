//! Flat-file credential store.
//!
//! One record per line: `username:salt:hash`. The file is append-only
//! from the application's point of view; records are never rewritten or
//! removed. Lookups scan front to back and return the first match, so a
//! duplicate append (possible when the sign-up validator is bypassed)
//! shadows rather than corrupts.

use parking_lot::Mutex;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Salt byte length for password hashing.
const SALT_BYTES: usize = 16;

/// Number of SHA-256 iterations for password stretching.
const HASH_ITERATIONS: u32 = 100_000;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential file error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored credential record.
#[derive(Debug, Clone)]
pub struct Credential {
    pub username: String,
    pub salt: String,
    pub password_hash: String,
}

/// Username → hashed-password store backed by a newline-delimited file.
pub struct CredentialStore {
    path: PathBuf,
    /// Serializes appends so two sign-ups cannot interleave a partial line.
    append_lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First record matching `username`, if any.
    pub fn lookup(&self, username: &str) -> Option<Credential> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        contents.lines().find_map(|line| {
            let mut fields = line.splitn(3, ':');
            let (name, salt, hash) = (fields.next()?, fields.next()?, fields.next()?);
            (name == username).then(|| Credential {
                username: name.to_string(),
                salt: salt.to_string(),
                password_hash: hash.to_string(),
            })
        })
    }

    /// Hash and append a new record.
    ///
    /// No uniqueness check at this layer; callers run
    /// `validate_new_account` first. Usernames containing `:` or newlines
    /// cannot be represented and are rejected upstream by the validator.
    pub fn add(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        let salt = generate_salt();
        let hash = hash_password(password, &salt);

        let _guard = self.append_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{username}:{salt}:{hash}")?;
        tracing::info!(username, "credential record appended");
        Ok(())
    }

    /// True iff `username` exists and the password matches.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.lookup(username) {
            Some(record) => {
                let attempt = hash_password(password, &record.salt);
                constant_time_eq(record.password_hash.as_bytes(), attempt.as_bytes())
            }
            None => {
                // Dummy hash to level the timing between unknown user and
                // wrong password.
                let _ = hash_password(password, "0000000000000000");
                false
            }
        }
    }
}

// ── Hashing helpers ─────────────────────────────────────────────────

/// Generate a random salt (hex-encoded).
fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a password with salt using iterated SHA-256.
fn hash_password(password: &str, salt: &str) -> String {
    let mut hash = Sha256::new();
    hash.update(salt.as_bytes());
    hash.update(password.as_bytes());
    let mut result = hash.finalize();

    // Iterated hashing for key stretching
    for _ in 1..HASH_ITERATIONS {
        let mut h = Sha256::new();
        h.update(result);
        h.update(salt.as_bytes());
        result = h.finalize();
    }

    hex::encode(result)
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, CredentialStore) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.conf");
        std::fs::write(&path, "").unwrap();
        (tmp, CredentialStore::new(path))
    }

    #[test]
    fn add_and_verify() {
        let (_tmp, store) = test_store();

        store.add("admin", "secretpass").unwrap();
        assert!(store.verify("admin", "secretpass"));
    }

    #[test]
    fn verify_wrong_password_fails() {
        let (_tmp, store) = test_store();

        store.add("admin", "correctpass").unwrap();
        assert!(!store.verify("admin", "wrong_pass"));
    }

    #[test]
    fn verify_unknown_user_fails() {
        let (_tmp, store) = test_store();

        assert!(!store.verify("ghost", "anypassword"));
    }

    #[test]
    fn lookup_returns_stored_record() {
        let (_tmp, store) = test_store();

        store.add("alice", "password1").unwrap();
        let record = store.lookup("alice").unwrap();
        assert_eq!(record.username, "alice");
        assert!(!record.salt.is_empty());
        assert_ne!(record.password_hash, "password1");
    }

    #[test]
    fn lookup_missing_is_none() {
        let (_tmp, store) = test_store();

        assert!(store.lookup("nobody").is_none());
    }

    #[test]
    fn records_are_newline_delimited() {
        let (_tmp, store) = test_store();

        store.add("alice", "password1").unwrap();
        store.add("bob", "password2").unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("alice:"));
        assert!(lines[1].starts_with("bob:"));
        assert_eq!(lines[0].split(':').count(), 3);
    }

    #[test]
    fn duplicate_append_is_possible_and_first_record_wins() {
        let (_tmp, store) = test_store();

        // The store itself does not enforce uniqueness; that lives in the
        // sign-up validator. Verify the defined shadowing behavior.
        store.add("alice", "firstpass1").unwrap();
        store.add("alice", "secondpass2").unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);

        assert!(store.verify("alice", "firstpass1"));
        assert!(!store.verify("alice", "secondpass2"));
    }

    #[test]
    fn missing_file_behaves_as_empty() {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::new(tmp.path().join("never_created.conf"));

        assert!(store.lookup("anyone").is_none());
        assert!(!store.verify("anyone", "password1"));
    }

    #[test]
    fn add_creates_missing_file() {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::new(tmp.path().join("fresh.conf"));

        store.add("alice", "password1").unwrap();
        assert!(store.verify("alice", "password1"));
    }

    #[test]
    fn password_hash_is_deterministic_with_same_salt() {
        let h1 = hash_password("test_password", "fixed_salt_value");
        let h2 = hash_password("test_password", "fixed_salt_value");
        assert_eq!(h1, h2);
    }

    #[test]
    fn password_hash_differs_with_different_salt() {
        let h1 = hash_password("test_password", "salt_a");
        let h2 = hash_password("test_password", "salt_b");
        assert_ne!(h1, h2);
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }
}
