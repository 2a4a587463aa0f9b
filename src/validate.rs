//! The validator: pure pass/fail rules for filenames, image uploads, and
//! new accounts.
//!
//! Every variant's `Display` is the exact inline message shown on a 422
//! form re-render, so handlers never compose user-facing text themselves.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::auth::CredentialStore;
use crate::corpus::content;
use crate::corpus::DocumentStore;

/// `name.ext` where both halves are word characters, whitespace, or hyphens.
static FILENAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\s-]+\.[\w\s-]+$").expect("valid filename pattern"));

pub const USERNAME_LENGTH: std::ops::RangeInclusive<usize> = 4..=16;
pub const PASSWORD_LENGTH: std::ops::RangeInclusive<usize> = 8..=16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A proper filename is required.")]
    MalformedName,

    #[error("{0} is not a supported file extension.")]
    DisallowedExtension(String),

    #[error("{0} already exists.")]
    DuplicateName(String),

    #[error("Only JPEG and PNG images can be uploaded.")]
    UnsupportedMimeType(String),

    #[error("Username must be between 4 and 16 characters.")]
    UsernameLength,

    #[error("Username may only contain letters and numbers.")]
    UsernameNotAlphanumeric,

    #[error("{0} is already taken.")]
    UsernameTaken(String),

    #[error("Password must be between 8 and 16 characters.")]
    PasswordLength,
}

/// A new document name must match the filename pattern, carry a
/// whitelisted extension, and not collide with an existing document.
pub fn validate_filename(name: &str, store: &DocumentStore) -> Result<(), ValidationError> {
    if !FILENAME_PATTERN.is_match(name) {
        return Err(ValidationError::MalformedName);
    }
    if !content::extension_allowed(name) {
        let ext = content::extension(name).unwrap_or_default();
        return Err(ValidationError::DisallowedExtension(format!(".{ext}")));
    }
    if store.contains(name) {
        return Err(ValidationError::DuplicateName(name.to_string()));
    }
    Ok(())
}

/// Uploads must be JPEG or PNG by declared MIME type, then pass the
/// ordinary filename rules.
pub fn validate_image_upload(
    name: &str,
    mime_type: &str,
    store: &DocumentStore,
) -> Result<(), ValidationError> {
    if !content::ALLOWED_IMAGE_MIMES.contains(&mime_type) {
        return Err(ValidationError::UnsupportedMimeType(mime_type.to_string()));
    }
    validate_filename(name, store)
}

/// Sign-up rules: username 4-16 alphanumeric characters and not yet
/// registered, password 8-16 characters.
pub fn validate_new_account(
    username: &str,
    password: &str,
    credentials: &CredentialStore,
) -> Result<(), ValidationError> {
    if !USERNAME_LENGTH.contains(&username.chars().count()) {
        return Err(ValidationError::UsernameLength);
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::UsernameNotAlphanumeric);
    }
    if credentials.lookup(username).is_some() {
        return Err(ValidationError::UsernameTaken(username.to_string()));
    }
    if !PASSWORD_LENGTH.contains(&password.chars().count()) {
        return Err(ValidationError::PasswordLength);
    }
    Ok(())
}
