use rand::{RngCore, SeedableRng};

/// Ed25519 signing key pair (private).
pub struct KeyPair(ed25519_dalek::SigningKey);

/// Ed25519 public key identifying a peer or account controller.
///
/// Stored as raw bytes so that signed cells can be decoded without point
/// validation; the key is only checked when a signature is verified.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountKey([u8; 32]);

/// Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        Self(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Deterministic key pair from a numeric seed. Test use only: the seed
    /// space is far too small for production keys.
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut secret = [0u8; 32];
        rng.fill_bytes(&mut secret);
        Self(ed25519_dalek::SigningKey::from_bytes(&secret))
    }

    /// Create from a raw 32-byte secret.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    /// The corresponding public account key.
    pub fn account_key(&self) -> AccountKey {
        AccountKey(self.0.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message).to_bytes())
    }

    /// Raw secret key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl AccountKey {
    /// Wrap raw 32-byte public key material.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Verify a signature on a message.
    ///
    /// Fails with [`SignatureError::InvalidKey`] if the raw bytes are not a
    /// valid Ed25519 point.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        use ed25519_dalek::Verifier;
        let key = ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|_| SignatureError::InvalidKey)?;
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        key.verify(message, &sig)
            .map_err(|_| SignatureError::InvalidSignature)
    }
}

impl Signature {
    /// Wrap raw 64-byte signature material.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair(<redacted>)")
    }
}

impl std::fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountKey({})", hex::encode(self.0))
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0[..8]))
    }
}

/// Errors from signing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid key")]
    InvalidKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let kp = KeyPair::generate();
        let message = b"hello world";
        let sig = kp.sign(message);
        assert!(kp.account_key().verify(message, &sig).is_ok());
    }

    #[test]
    fn verify_fails_on_wrong_message() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"correct message");
        assert!(kp.account_key().verify(b"wrong message", &sig).is_err());
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let sig = kp1.sign(b"message");
        assert!(kp2.account_key().verify(b"message", &sig).is_err());
    }

    #[test]
    fn seeded_keys_are_deterministic() {
        let kp1 = KeyPair::from_seed(101);
        let kp2 = KeyPair::from_seed(101);
        assert_eq!(kp1.account_key(), kp2.account_key());
    }

    #[test]
    fn different_seeds_different_keys() {
        let kp1 = KeyPair::from_seed(101);
        let kp2 = KeyPair::from_seed(156757);
        assert_ne!(kp1.account_key(), kp2.account_key());
    }

    #[test]
    fn from_bytes_roundtrip() {
        let kp = KeyPair::generate();
        let bytes = *kp.as_bytes();
        let kp2 = KeyPair::from_bytes(bytes);
        assert_eq!(kp.account_key(), kp2.account_key());
    }

    #[test]
    fn verify_rejects_invalid_key_bytes() {
        // Not every 32-byte string is a valid curve point; all-0xFF is not.
        let key = AccountKey::from_bytes([0xFF; 32]);
        let sig = Signature::from_bytes([0u8; 64]);
        assert_eq!(
            key.verify(b"x", &sig).unwrap_err(),
            SignatureError::InvalidKey
        );
    }

    #[test]
    fn debug_redacts_signing_key() {
        let kp = KeyPair::generate();
        let debug = format!("{kp:?}");
        assert!(debug.contains("redacted"));
    }
}
