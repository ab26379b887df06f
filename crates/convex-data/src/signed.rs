//! Signed value cells.

use convex_crypto::{AccountKey, KeyPair, Signature, SignatureError};

use crate::cell::Cell;
use crate::value::{Value, ValueRef};

/// A value signed by an account key.
///
/// The signature covers the value's content hash, so it can be verified even
/// while the value itself is an unresolved ref. Signed cells are never
/// embedded; each one is an announceable unit of novelty.
#[derive(Clone, Debug)]
pub struct Signed {
    account_key: AccountKey,
    signature: Signature,
    value: ValueRef,
}

impl Signed {
    /// Sign a value with a key pair.
    pub fn sign(keypair: &KeyPair, value: Value) -> Signed {
        let signature = keypair.sign(value.hash().as_bytes());
        Signed {
            account_key: keypair.account_key(),
            signature,
            value: ValueRef::of(value),
        }
    }

    /// Verify the signature against the signed value's hash.
    pub fn verify(&self) -> Result<(), SignatureError> {
        self.account_key
            .verify(self.value.hash().as_bytes(), &self.signature)
    }

    pub fn account_key(&self) -> &AccountKey {
        &self.account_key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn value_ref(&self) -> &ValueRef {
        &self.value
    }

    pub(crate) fn from_parts(
        account_key: AccountKey,
        signature: Signature,
        value: ValueRef,
    ) -> Signed {
        Signed {
            account_key,
            signature,
            value,
        }
    }
}

impl Value {
    /// A signed cell over the given value.
    pub fn signed(keypair: &KeyPair, value: Value) -> Value {
        Value::new(Cell::Signed(Signed::sign(keypair, value)))
    }
}
