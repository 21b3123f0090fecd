//! Authentication primitives.
//!
//! Password hashing and verification with Argon2id. Token issuance lives in
//! `invoya-shared::jwt`; this module only covers the credential side.

mod password;

pub use password::{PasswordError, hash_password, verify_password};
