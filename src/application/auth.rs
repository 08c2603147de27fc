//! HTTP Basic credential verification.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::domain::identity::Identity;

const BASIC_SCHEME: &str = "Basic";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credentials")]
    Missing,
    #[error("malformed authorization header")]
    Malformed,
    #[error("invalid credentials")]
    Invalid,
}

/// A configured user: name plus the SHA-256 digest of the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredential {
    pub name: String,
    pub password_sha256: Vec<u8>,
}

impl UserCredential {
    pub fn from_password(name: impl Into<String>, password: &str) -> Self {
        Self {
            name: name.into(),
            password_sha256: digest_password(password),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Authenticator {
    realm: String,
    users: Vec<UserCredential>,
}

impl Authenticator {
    pub fn new(realm: impl Into<String>, users: Vec<UserCredential>) -> Self {
        Self {
            realm: realm.into(),
            users,
        }
    }

    /// With no configured users every request passes anonymously.
    pub fn is_enabled(&self) -> bool {
        !self.users.is_empty()
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Value for the `WWW-Authenticate` challenge header.
    pub fn challenge(&self) -> String {
        format!("{BASIC_SCHEME} realm=\"{}\"", self.realm())
    }

    pub fn authenticate_header(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let header = header.ok_or(AuthError::Missing)?;
        // Scheme names are case-insensitive.
        let (scheme, encoded) = header.trim().split_once(' ').ok_or(AuthError::Malformed)?;
        if !scheme.eq_ignore_ascii_case(BASIC_SCHEME) {
            return Err(AuthError::Malformed);
        }
        let encoded = encoded.trim();
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|_| AuthError::Malformed)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::Malformed)?;
        let (name, password) = decoded.split_once(':').ok_or(AuthError::Malformed)?;
        self.verify(name, password)
    }

    pub fn verify(&self, name: &str, password: &str) -> Result<Identity, AuthError> {
        let user = self
            .users
            .iter()
            .find(|user| user.name == name)
            .ok_or(AuthError::Invalid)?;

        let supplied = digest_password(password);
        if user
            .password_sha256
            .as_slice()
            .ct_eq(supplied.as_slice())
            .unwrap_u8()
            == 0
        {
            return Err(AuthError::Invalid);
        }

        Ok(Identity::new(user.name.clone()))
    }
}

fn digest_password(password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    let bytes: &[u8] = digest.as_ref();
    bytes.to_vec()
}

/// Hex-encoded SHA-256 of a password, the form stored in configuration.
pub fn hash_password_hex(password: &str) -> String {
    hex::encode(digest_password(password))
}
