// SPDX-License-Identifier: CC0-1.0

//! BIP341 key tweaking.
//!
//! The output key is `Q = lift_x(P) + t*G` where `P` is the x-only internal
//! key and `t` the TapTweak scalar. `lift_x` resolves the x coordinate to the
//! even-y point, so even-y normalization happens on the *internal* key,
//! before the tweak. The output key keeps whatever parity the addition
//! produces; that parity is recorded in the control block, never forced.

use secp256k1::{Parity, Secp256k1, Verification};

use crate::error::TaprootError;
use crate::taghash::{TapNodeHash, TapTweakHash};

/// Untweaked BIP-0340 x-only public key (the internal key).
pub type UntweakedPublicKey = secp256k1::XOnlyPublicKey;

/// Untweaked BIP-0340 key pair (the internal key with its secret).
pub type UntweakedKeypair = secp256k1::Keypair;

/// A trait for tweaking BIP-0340 key types (x-only public keys and key pairs).
pub trait TapTweak {
    /// Tweaked key type with optional auxiliary information.
    type TweakedAux;
    /// Tweaked key type.
    type TweakedKey;

    /// Tweaks an untweaked key with the optional script tree Merkle root.
    ///
    /// `None` produces a key-path-only output: the tweak preimage then ends
    /// after the internal key (zero-length root, not 32 zero bytes). For the
    /// [`UntweakedKeypair`] type this also tweaks the private key in the pair.
    fn tap_tweak<C: Verification>(
        self,
        secp: &Secp256k1<C>,
        merkle_root: Option<TapNodeHash>,
    ) -> Result<Self::TweakedAux, TaprootError>;

    /// Directly converts the key to its tweaked counterpart without tweaking.
    ///
    /// This method is dangerous and can lead to loss of funds if used
    /// incorrectly: nothing guarantees the key actually commits to anything.
    fn dangerous_assume_tweaked(self) -> Self::TweakedKey;
}

impl TapTweak for UntweakedPublicKey {
    type TweakedAux = (TweakedPublicKey, Parity);
    type TweakedKey = TweakedPublicKey;

    /// Tweaks the public key: `Q = P + H_taptweak(P || merkle_root)*G`.
    ///
    /// # Returns
    ///
    /// The tweaked output key and its parity.
    fn tap_tweak<C: Verification>(
        self,
        secp: &Secp256k1<C>,
        merkle_root: Option<TapNodeHash>,
    ) -> Result<(TweakedPublicKey, Parity), TaprootError> {
        let tweak = TapTweakHash::from_key_and_merkle_root(self, merkle_root).to_scalar()?;
        let (output_key, parity) =
            self.add_tweak(secp, &tweak).map_err(|_| TaprootError::InvalidTweak)?;

        debug_assert!(self.tweak_add_check(secp, &output_key, parity, tweak));
        Ok((TweakedPublicKey(output_key), parity))
    }

    fn dangerous_assume_tweaked(self) -> TweakedPublicKey { TweakedPublicKey(self) }
}

impl TapTweak for UntweakedKeypair {
    type TweakedAux = TweakedKeypair;
    type TweakedKey = TweakedKeypair;

    /// Applies the Taproot tweak to both keys within the pair.
    ///
    /// The secret key is negated first if its public point has odd y, *then*
    /// the tweak is added, so the result signs for the output key whichever
    /// parity the output key itself ends up with.
    fn tap_tweak<C: Verification>(
        self,
        secp: &Secp256k1<C>,
        merkle_root: Option<TapNodeHash>,
    ) -> Result<TweakedKeypair, TaprootError> {
        let (pubkey, _parity) = UntweakedPublicKey::from_keypair(&self);
        let tweak = TapTweakHash::from_key_and_merkle_root(pubkey, merkle_root).to_scalar()?;
        let tweaked =
            self.add_xonly_tweak(secp, &tweak).map_err(|_| TaprootError::InvalidTweak)?;
        Ok(TweakedKeypair(tweaked))
    }

    fn dangerous_assume_tweaked(self) -> TweakedKeypair { TweakedKeypair(self) }
}

/// Tweaked BIP-0340 x-only public key: the output key appearing on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TweakedPublicKey(secp256k1::XOnlyPublicKey);

impl TweakedPublicKey {
    /// Constructs a new [`TweakedPublicKey`] from a key claimed to be tweaked.
    pub fn dangerous_assume_tweaked(key: secp256k1::XOnlyPublicKey) -> TweakedPublicKey {
        TweakedPublicKey(key)
    }

    /// Returns the underlying x-only public key.
    pub fn to_inner(self) -> secp256k1::XOnlyPublicKey { self.0 }

    /// Serializes the key as a 32-byte x coordinate.
    #[inline]
    pub fn serialize(&self) -> [u8; 32] { self.0.serialize() }
}

/// Tweaked BIP-0340 key pair, able to sign for the output key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TweakedKeypair(secp256k1::Keypair);

impl TweakedKeypair {
    /// Constructs a new [`TweakedKeypair`] from a pair claimed to be tweaked.
    pub fn dangerous_assume_tweaked(pair: secp256k1::Keypair) -> TweakedKeypair {
        TweakedKeypair(pair)
    }

    /// Returns the underlying key pair.
    pub fn to_inner(self) -> secp256k1::Keypair { self.0 }

    /// Returns the x-only public key of this pair with its parity.
    pub fn public_parts(&self) -> (TweakedPublicKey, Parity) {
        let (xonly, parity) = secp256k1::XOnlyPublicKey::from_keypair(&self.0);
        (TweakedPublicKey(xonly), parity)
    }
}
