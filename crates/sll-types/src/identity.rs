use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Material used to derive a [`PartyId`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityMaterial {
    /// A registered organisation name (e.g. a school or branch library).
    OrgName(String),
    /// An ed25519 public key (32 bytes) registered with the network operator.
    PublicKey([u8; 32]),
}

/// Persistent cryptographic identity for a lending party.
///
/// A `PartyId` is derived deterministically from [`IdentityMaterial`] using
/// BLAKE3. The same material always produces the same identity, so two nodes
/// that know a party's registration material agree on its id without any
/// coordination. Parties are the signers of ledger transitions: owners,
/// entitled borrowers, and schools.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyId {
    hash: [u8; 32],
}

impl PartyId {
    /// Derive a `PartyId` from identity material.
    pub fn derive(material: &IdentityMaterial) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"sll-party-v1:");
        match material {
            IdentityMaterial::OrgName(name) => {
                hasher.update(b"org:");
                hasher.update(name.as_bytes());
            }
            IdentityMaterial::PublicKey(pk) => {
                hasher.update(b"pubkey:");
                hasher.update(pk);
            }
        }
        Self {
            hash: *hasher.finalize().as_bytes(),
        }
    }

    /// Derive from an organisation name. Shorthand for the common case.
    pub fn from_org_name(name: impl Into<String>) -> Self {
        Self::derive(&IdentityMaterial::OrgName(name.into()))
    }

    /// Create an ephemeral (random) PartyId for tests and demos.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self::derive(&IdentityMaterial::PublicKey(bytes))
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("party:{}", hex::encode(&self.hash[..4]))
    }

    /// Parse from a hex string (64 hex characters).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("party:").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self { hash: arr })
    }
}

impl fmt::Debug for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartyId({})", self.short_id())
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        let material = IdentityMaterial::OrgName("Maple High".into());
        let id1 = PartyId::derive(&material);
        let id2 = PartyId::derive(&material);
        assert_eq!(id1, id2);
    }

    #[test]
    fn different_material_produces_different_ids() {
        let id1 = PartyId::from_org_name("School A");
        let id2 = PartyId::from_org_name("School B");
        assert_ne!(id1, id2);
    }

    #[test]
    fn material_kinds_are_domain_separated() {
        let name = "x".repeat(32);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(name.as_bytes());
        let org = PartyId::derive(&IdentityMaterial::OrgName(name));
        let key = PartyId::derive(&IdentityMaterial::PublicKey(bytes));
        assert_ne!(org, key);
    }

    #[test]
    fn ephemeral_ids_are_unique() {
        let id1 = PartyId::ephemeral();
        let id2 = PartyId::ephemeral();
        assert_ne!(id1, id2);
    }

    #[test]
    fn short_id_format() {
        let id = PartyId::from_org_name("Library");
        let short = id.short_id();
        assert!(short.starts_with("party:"));
        assert_eq!(short.len(), 14); // "party:" + 8 hex chars
    }

    #[test]
    fn hex_roundtrip() {
        let id = PartyId::from_org_name("Branch 7");
        let parsed = PartyId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let error = PartyId::from_hex("abcd").unwrap_err();
        assert_eq!(
            error,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn serde_roundtrip() {
        let id = PartyId::from_org_name("Maple High");
        let json = serde_json::to_string(&id).unwrap();
        let parsed: PartyId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
