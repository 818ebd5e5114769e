// SPDX-License-Identifier: CC0-1.0

//! Control blocks.
//!
//! The control block is the last witness element of a script-path spend: a
//! compact proof that the executed leaf script is committed to by the output
//! key. Wire layout: one byte packing the leaf version and the output-key
//! parity (parity in the low bit), the 32-byte x-only internal key, then the
//! Merkle path as concatenated 32-byte hashes. Total length 33 + 32k with
//! 0 <= k <= 128.

use secp256k1::Parity;

use crate::error::TaprootError;
use crate::key::UntweakedPublicKey;
use crate::leaf_version::LeafVersion;
use crate::tree::TaprootMerkleBranch;
use crate::{TAPROOT_CONTROL_BASE_SIZE, TAPROOT_CONTROL_NODE_SIZE, TAPROOT_LEAF_MASK};

/// Control block data structure used in Tapscript satisfaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlBlock {
    /// The tapleaf version of the script being spent.
    pub leaf_version: LeafVersion,
    /// The parity of the *output* key (the internal key is always x-only).
    pub output_key_parity: Parity,
    /// The x-only internal key.
    pub internal_key: UntweakedPublicKey,
    /// The Merkle proof of the script being spent, bottom to top.
    pub merkle_branch: TaprootMerkleBranch,
}

impl ControlBlock {
    /// Decodes bytes representing a [`ControlBlock`].
    ///
    /// # Errors
    ///
    /// - [`TaprootError::MalformedControlBlock`] if `sl` is not of size
    ///   33 + 32k for any k >= 0.
    /// - [`TaprootError::InvalidLeafVersion`] if the masked first byte is not
    ///   a valid leaf version.
    /// - [`TaprootError::LiftXFailed`] if the internal key bytes are not the
    ///   x coordinate of a curve point.
    /// - [`TaprootError::TreeTooDeep`] if the Merkle path has more than 128
    ///   hashes.
    pub fn decode(sl: &[u8]) -> Result<ControlBlock, TaprootError> {
        if sl.len() < TAPROOT_CONTROL_BASE_SIZE
            || (sl.len() - TAPROOT_CONTROL_BASE_SIZE) % TAPROOT_CONTROL_NODE_SIZE != 0
        {
            return Err(TaprootError::MalformedControlBlock(sl.len()));
        }
        let output_key_parity = if sl[0] & 1 == 0 { Parity::Even } else { Parity::Odd };
        let leaf_version = LeafVersion::from_consensus(sl[0] & TAPROOT_LEAF_MASK)?;
        let internal_key = UntweakedPublicKey::from_slice(&sl[1..TAPROOT_CONTROL_BASE_SIZE])
            .map_err(TaprootError::LiftXFailed)?;
        let merkle_branch = TaprootMerkleBranch::decode(&sl[TAPROOT_CONTROL_BASE_SIZE..])?;
        Ok(ControlBlock { leaf_version, output_key_parity, internal_key, merkle_branch })
    }

    /// Returns the size of the control block in its serialized form.
    pub fn size(&self) -> usize {
        TAPROOT_CONTROL_BASE_SIZE + TAPROOT_CONTROL_NODE_SIZE * self.merkle_branch.len()
    }

    /// Serializes the control block for use as a witness element.
    ///
    /// The output does not include any witness length prefix; that belongs to
    /// the transaction serializer.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        let first_byte: u8 =
            i32::from(self.output_key_parity) as u8 | self.leaf_version.to_consensus();
        buf.push(first_byte);
        buf.extend_from_slice(&self.internal_key.serialize());
        self.merkle_branch.encode_into(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use hashes::Hash;

    use super::*;
    use crate::taghash::TapNodeHash;

    const INTERNAL_X: &str = "93c7378d96518a75448821c4f7c8f4bae7ce60f804d03d1f0628dd5dd0f5de51";

    fn sample_block(path_len: usize, first_byte: u8) -> Vec<u8> {
        let mut bytes = vec![first_byte];
        bytes.extend_from_slice(&hex::decode(INTERNAL_X).unwrap());
        for i in 0..path_len {
            bytes.extend_from_slice(TapNodeHash::hash(&[i as u8]).as_ref());
        }
        bytes
    }

    #[test]
    fn decode_encode_roundtrip() {
        for path_len in [0usize, 1, 2, 5, 128] {
            for first_byte in [0xc0u8, 0xc1] {
                let bytes = sample_block(path_len, first_byte);
                let block = ControlBlock::decode(&bytes).unwrap();
                assert_eq!(block.merkle_branch.len(), path_len);
                assert_eq!(block.size(), bytes.len());
                assert_eq!(block.serialize(), bytes);
            }
        }
    }

    #[test]
    fn parity_is_low_bit() {
        let even = ControlBlock::decode(&sample_block(0, 0xc0)).unwrap();
        assert_eq!(even.output_key_parity, Parity::Even);
        assert_eq!(even.leaf_version, LeafVersion::TapScript);

        let odd = ControlBlock::decode(&sample_block(0, 0xc1)).unwrap();
        assert_eq!(odd.output_key_parity, Parity::Odd);
        assert_eq!(odd.leaf_version, LeafVersion::TapScript);
    }

    #[test]
    fn rejects_bad_lengths() {
        // One byte over the base size: not of the form 33 + 32k.
        let mut bytes = sample_block(0, 0xc0);
        bytes.push(0x00);
        assert_eq!(bytes.len(), 34);
        assert_eq!(
            ControlBlock::decode(&bytes),
            Err(TaprootError::MalformedControlBlock(34))
        );

        assert_eq!(
            ControlBlock::decode(&[]),
            Err(TaprootError::MalformedControlBlock(0))
        );
        assert_eq!(
            ControlBlock::decode(&sample_block(0, 0xc0)[..32]),
            Err(TaprootError::MalformedControlBlock(32))
        );

        // 129 path entries.
        let bytes = sample_block(129, 0xc0);
        assert_eq!(ControlBlock::decode(&bytes), Err(TaprootError::TreeTooDeep(129)));
    }

    #[test]
    fn rejects_annex_prefix_version() {
        // 0x50 and 0x51 both mask to the annex prefix.
        for first_byte in [0x50u8, 0x51] {
            assert_eq!(
                ControlBlock::decode(&sample_block(0, first_byte)),
                Err(TaprootError::InvalidLeafVersion(0x50))
            );
        }
    }

    #[test]
    fn rejects_internal_key_off_curve() {
        // x = p is not a valid field element.
        let mut bytes = sample_block(0, 0xc0);
        bytes[1..33].copy_from_slice(
            &hex::decode("fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f")
                .unwrap(),
        );
        assert!(matches!(
            ControlBlock::decode(&bytes),
            Err(TaprootError::LiftXFailed(_))
        ));
    }
}
