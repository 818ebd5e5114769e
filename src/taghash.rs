// SPDX-License-Identifier: CC0-1.0

//! Taproot tagged hashes.
//!
//! BIP340 tagged hashing: `SHA256(SHA256(tag) || SHA256(tag) || data)`. The
//! tag engines carry a precomputed midstate, so each hash costs a single
//! SHA256 compression over the data.

use hashes::{sha256t_hash_newtype, Hash, HashEngine};
use secp256k1::{Scalar, XOnlyPublicKey};

use crate::error::TaprootError;
use crate::leaf_version::LeafVersion;
use crate::script::ScriptBuf;

// Taproot test vectors from BIP-341 state the hashes without any reversing
sha256t_hash_newtype! {
    pub struct TapLeafTag = hash_str("TapLeaf");

    /// Taproot-tagged hash with tag "TapLeaf".
    ///
    /// This is used for computing tapscript script spend hash.
    #[hash_newtype(forward)]
    pub struct TapLeafHash(_);

    pub struct TapBranchTag = hash_str("TapBranch");

    /// Tagged hash used in Taproot trees; see BIP-340 for tagging rules.
    #[hash_newtype(forward)]
    pub struct TapNodeHash(_);

    pub struct TapTweakTag = hash_str("TapTweak");

    /// Taproot-tagged hash with tag "TapTweak".
    ///
    /// This hash type is used while computing the tweaked public key.
    #[hash_newtype(forward)]
    pub struct TapTweakHash(_);
}

impl TapLeafHash {
    /// Computes the leaf hash from components: the preimage is
    /// `leaf_version || compact_size(len(script)) || script`.
    pub fn from_script(script: &ScriptBuf, ver: LeafVersion) -> TapLeafHash {
        let mut eng = TapLeafHash::engine();
        eng.input(&[ver.to_consensus()]);
        write_compact_size(&mut eng, script.len() as u64);
        eng.input(script.as_bytes());
        TapLeafHash::from_engine(eng)
    }
}

impl From<TapLeafHash> for TapNodeHash {
    fn from(leaf: TapLeafHash) -> TapNodeHash { TapNodeHash::from_byte_array(leaf.to_byte_array()) }
}

impl TapNodeHash {
    /// Computes the branch hash given the hashes of the two nodes underneath it.
    ///
    /// The two children are sorted byte-lexicographically before hashing, so
    /// the result does not depend on argument order.
    pub fn from_node_hashes(a: TapNodeHash, b: TapNodeHash) -> TapNodeHash {
        Self::combine_node_hashes(a, b).0
    }

    /// Computes the branch hash and returns whether `a` was hashed first.
    pub(crate) fn combine_node_hashes(a: TapNodeHash, b: TapNodeHash) -> (TapNodeHash, bool) {
        let mut eng = TapNodeHash::engine();
        if a < b {
            eng.input(a.as_ref());
            eng.input(b.as_ref());
        } else {
            eng.input(b.as_ref());
            eng.input(a.as_ref());
        };
        (TapNodeHash::from_engine(eng), a < b)
    }

    /// Computes the [`TapNodeHash`] of a leaf directly from its script and version.
    pub fn from_script(script: &ScriptBuf, ver: LeafVersion) -> TapNodeHash {
        TapNodeHash::from(TapLeafHash::from_script(script, ver))
    }
}

impl TapTweakHash {
    /// Constructs a new BIP341 [`TapTweakHash`] from the internal key and the
    /// script tree Merkle root.
    ///
    /// Produces `H_taptweak(P || R)` where `P` is the x-only internal key and
    /// `R` is the Merkle root. A key-path-only output passes [`None`], which
    /// hashes a zero-length root - not 32 zero bytes.
    pub fn from_key_and_merkle_root(
        internal_key: XOnlyPublicKey,
        merkle_root: Option<TapNodeHash>,
    ) -> TapTweakHash {
        let mut eng = TapTweakHash::engine();
        // always hash the key
        eng.input(&internal_key.serialize());
        if let Some(h) = merkle_root {
            eng.input(h.as_ref());
        }
        TapTweakHash::from_engine(eng)
    }

    /// Converts this hash into a scalar ready for use with the key tweaking API.
    ///
    /// # Errors
    ///
    /// [`TaprootError::InvalidTweak`] if the hash value is not below the curve
    /// order (statistically near-impossible, but the caller must be able to
    /// tell, not panic).
    pub fn to_scalar(self) -> Result<Scalar, TaprootError> {
        Scalar::from_be_bytes(self.to_byte_array()).map_err(|_| TaprootError::InvalidTweak)
    }
}

/// Feeds the standard Bitcoin variable-length integer encoding of `value`
/// into a hash engine.
pub(crate) fn write_compact_size<E: HashEngine>(eng: &mut E, value: u64) {
    match value {
        0..=0xFC => eng.input(&[value as u8]),
        0xFD..=0xFFFF => {
            eng.input(&[0xFDu8]);
            eng.input(&(value as u16).to_le_bytes());
        }
        0x10000..=0xFFFF_FFFF => {
            eng.input(&[0xFEu8]);
            eng.input(&(value as u32).to_le_bytes());
        }
        _ => {
            eng.input(&[0xFFu8]);
            eng.input(&value.to_le_bytes());
        }
    }
}
