//! User credentials.
//!
//! A flat file of `username:salt:hash` records backs the single-role
//! sign-in/sign-up flow. Password hashing is iterated SHA-256 with a
//! per-user salt and constant-time comparison; there is no password
//! change or account deletion, matching the product surface.

pub mod store;

pub use store::{Credential, CredentialError, CredentialStore};
