//! Author identity: a signed `(id, public_key)` record embedded in every
//! [`crate::entry::Entry`], plus the [`IdentityProvider`] trait that signs and
//! verifies entries on the local identity's behalf.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::convert::TryInto;

/// Self-signatures binding `id` and `public_key` to the keypair that produced them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentitySignatures {
    pub id: Vec<u8>,
    pub public_key: Vec<u8>,
}

/// An author's identity record, as embedded verbatim in every entry it signs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub public_key: Vec<u8>,
    pub signatures: IdentitySignatures,
}

impl Identity {
    pub fn new(id: String, public_key: Vec<u8>, signatures: IdentitySignatures) -> Identity {
        Identity {
            id,
            public_key,
            signatures,
        }
    }
}

// Ordered by public key bytes, not `id`: this is the order the comparator's
// tie-break (`clock.id`, itself public-key bytes) relies on.
impl Ord for Identity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.public_key.cmp(&other.public_key)
    }
}

impl PartialOrd for Identity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid ed25519 signature: {0}")]
    InvalidSignature(#[from] ed25519_dalek::SignatureError),
    #[error("public key must be {} bytes", ed25519_dalek::PUBLIC_KEY_LENGTH)]
    InvalidPublicKey,
    #[error("signature must be {} bytes", ed25519_dalek::SIGNATURE_LENGTH)]
    InvalidSignatureLength,
}

/// Collaborator that signs on behalf of the local identity and verifies
/// signatures produced by any identity (verification needs no secret key,
/// hence the associated function rather than a method).
pub trait IdentityProvider {
    type Error: std::error::Error + 'static;

    fn identity(&self) -> &Identity;
    fn sign(&self, bytes: &[u8]) -> Result<Vec<u8>, Self::Error>;
    fn verify(public_key: &[u8], bytes: &[u8], sig: &[u8]) -> Result<(), Self::Error>
    where
        Self: Sized;
}

/// Reference [`IdentityProvider`] backed by an Ed25519 keypair.
pub struct Ed25519Identity {
    identity: Identity,
    signing_key: SigningKey,
}

impl Ed25519Identity {
    /// Generates a fresh random keypair and self-signs a new identity record for `id`.
    pub fn generate(id: &str) -> Ed25519Identity {
        Ed25519Identity::from_signing_key(id, SigningKey::generate(&mut OsRng))
    }

    /// Builds an identity from caller-supplied secret key bytes (e.g. for reproducible tests).
    pub fn from_secret_bytes(id: &str, secret: &[u8; 32]) -> Ed25519Identity {
        Ed25519Identity::from_signing_key(id, SigningKey::from_bytes(secret))
    }

    fn from_signing_key(id: &str, signing_key: SigningKey) -> Ed25519Identity {
        let public_key = signing_key.verifying_key().to_bytes().to_vec();
        let id_sig = signing_key.sign(id.as_bytes()).to_bytes().to_vec();
        let public_key_sig = signing_key.sign(&public_key).to_bytes().to_vec();
        Ed25519Identity {
            identity: Identity::new(
                id.to_owned(),
                public_key,
                IdentitySignatures {
                    id: id_sig,
                    public_key: public_key_sig,
                },
            ),
            signing_key,
        }
    }
}

impl IdentityProvider for Ed25519Identity {
    type Error = IdentityError;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn sign(&self, bytes: &[u8]) -> Result<Vec<u8>, IdentityError> {
        Ok(self.signing_key.sign(bytes).to_bytes().to_vec())
    }

    fn verify(public_key: &[u8], bytes: &[u8], sig: &[u8]) -> Result<(), IdentityError> {
        let key_bytes: [u8; 32] = public_key
            .try_into()
            .map_err(|_| IdentityError::InvalidPublicKey)?;
        let verifying_key = VerifyingKey::from_bytes(&key_bytes)?;

        let sig_bytes: [u8; 64] = sig
            .try_into()
            .map_err(|_| IdentityError::InvalidSignatureLength)?;
        let signature = Signature::from_bytes(&sig_bytes);

        verifying_key
            .verify(bytes, &signature)
            .map_err(IdentityError::InvalidSignature)
    }
}
