// SPDX-License-Identifier: CC0-1.0

//! Spend-side orchestration: witness assembly and verification.
//!
//! Script-path verification recomputes the output key from the leaf script
//! and the control block and compares it, x coordinate *and* parity bit,
//! against the key the output actually pays to. Key-path verification
//! re-derives the output key from the internal key and Merkle root and
//! delegates the Schnorr check to secp256k1. Everything here is a pure
//! function over immutable inputs.

use secp256k1::schnorr::Signature;
use secp256k1::{Message, Parity, Secp256k1, Signing, Verification};

use crate::control::ControlBlock;
use crate::error::TaprootError;
use crate::key::{TapTweak, TweakedPublicKey, UntweakedKeypair, UntweakedPublicKey};
use crate::script::ScriptBuf;
use crate::taghash::{TapNodeHash, TapTweakHash};
use crate::tree::ScriptTree;

/// Verifies that a control block is a correct proof that `script` is
/// committed to by `output_key`.
///
/// Only checks the commitment: full validation must also execute the script
/// with its witness data, which is outside this crate.
///
/// # Errors
///
/// - [`TaprootError::ScriptPathVerificationFailed`] if the recomputed output
///   key differs from `output_key` in its x coordinate or in its parity. A
///   parity mismatch alone is a failure: x agreement does not disambiguate
///   the lifted internal point.
/// - [`TaprootError::InvalidTweak`] if the recomputed tweak is out of range.
pub fn verify_script_path<C: Verification>(
    secp: &Secp256k1<C>,
    script: &ScriptBuf,
    control_block: &ControlBlock,
    output_key: TweakedPublicKey,
) -> Result<(), TaprootError> {
    // Initially the current hash is the leaf hash.
    let mut curr_hash = TapNodeHash::from_script(script, control_block.leaf_version);
    // Fold the proof, bottom to top. An empty path means the leaf is the root.
    for elem in control_block.merkle_branch.nodes() {
        curr_hash = TapNodeHash::from_node_hashes(curr_hash, *elem);
    }
    let tweak =
        TapTweakHash::from_key_and_merkle_root(control_block.internal_key, Some(curr_hash))
            .to_scalar()?;
    if control_block.internal_key.tweak_add_check(
        secp,
        &output_key.to_inner(),
        control_block.output_key_parity,
        tweak,
    ) {
        Ok(())
    } else {
        Err(TaprootError::ScriptPathVerificationFailed)
    }
}

/// Verifies a key-path spend signature.
///
/// Re-derives the output key from `internal_key` and `merkle_root` (pass
/// `None` for a key-path-only output), checks it against `output_key`, and
/// verifies the BIP340 signature over `message` against it.
///
/// # Errors
///
/// [`TaprootError::KeyPathVerificationFailed`] if the derived key does not
/// match `output_key` or the signature does not verify.
pub fn verify_key_path<C: Verification>(
    secp: &Secp256k1<C>,
    internal_key: UntweakedPublicKey,
    merkle_root: Option<TapNodeHash>,
    signature: &Signature,
    message: &Message,
    output_key: TweakedPublicKey,
) -> Result<(), TaprootError> {
    let (derived, _parity) = internal_key.tap_tweak(secp, merkle_root)?;
    if derived != output_key {
        return Err(TaprootError::KeyPathVerificationFailed);
    }
    secp.verify_schnorr(signature, message, &output_key.to_inner())
        .map_err(|_| TaprootError::KeyPathVerificationFailed)
}

/// Produces a BIP340 key-path signature for `message`.
///
/// Tweaks the keypair (negating first if its point has odd y) and signs with
/// the result, so the signature verifies against the output key derived from
/// the same internal key and Merkle root.
pub fn key_path_signature<C: Signing + Verification>(
    secp: &Secp256k1<C>,
    keypair: &UntweakedKeypair,
    merkle_root: Option<TapNodeHash>,
    message: &Message,
) -> Result<Signature, TaprootError> {
    let tweaked = keypair.tap_tweak(secp, merkle_root)?;
    Ok(secp.sign_schnorr_no_aux_rand(message, &tweaked.to_inner()))
}

/// Assembles script-path spending data for one script tree and internal key.
///
/// Binds a [`ScriptTree`] to an internal key, derives the output key once,
/// and hands out per-leaf control blocks and witness stacks.
#[derive(Debug, Clone)]
pub struct SpendBuilder<'tree> {
    tree: &'tree ScriptTree,
    internal_key: UntweakedPublicKey,
    output_key: TweakedPublicKey,
    output_key_parity: Parity,
}

impl<'tree> SpendBuilder<'tree> {
    /// Constructs a new [`SpendBuilder`], deriving the output key from the
    /// internal key and the tree's Merkle root.
    pub fn new<C: Verification>(
        secp: &Secp256k1<C>,
        tree: &'tree ScriptTree,
        internal_key: UntweakedPublicKey,
    ) -> Result<Self, TaprootError> {
        let (output_key, output_key_parity) =
            internal_key.tap_tweak(secp, Some(tree.merkle_root()))?;
        Ok(SpendBuilder { tree, internal_key, output_key, output_key_parity })
    }

    /// Returns the output key (the key used in the script pubkey).
    pub fn output_key(&self) -> TweakedPublicKey { self.output_key }

    /// Returns the parity of the output key.
    pub fn output_key_parity(&self) -> Parity { self.output_key_parity }

    /// Returns the internal key.
    pub fn internal_key(&self) -> UntweakedPublicKey { self.internal_key }

    /// Constructs the control block authorizing the leaf at `leaf_index`.
    pub fn control_block(&self, leaf_index: usize) -> Result<ControlBlock, TaprootError> {
        let (_script, leaf_version) = self.tree.leaf(leaf_index)?;
        Ok(ControlBlock {
            leaf_version,
            output_key_parity: self.output_key_parity,
            internal_key: self.internal_key,
            merkle_branch: self.tree.merkle_branch(leaf_index)?,
        })
    }

    /// Assembles the witness stack for spending the leaf at `leaf_index`:
    /// `[item_N, ..., item_1, leaf_script, control_block]`.
    ///
    /// `script_inputs` must be supplied in the order the target script
    /// consumes them off the stack (its own verification order); this method
    /// reverses them so the first-consumed item ends up on top. That ordering
    /// is a contract of each script template, not something inferred here -
    /// e.g. a two-signature CHECKSIGADD script that checks key A then key B
    /// takes `[sig_a, sig_b]`.
    pub fn witness(
        &self,
        leaf_index: usize,
        script_inputs: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, TaprootError> {
        let (script, _) = self.tree.leaf(leaf_index)?;
        let control_block = self.control_block(leaf_index)?;

        let mut stack = Vec::with_capacity(script_inputs.len() + 2);
        stack.extend(script_inputs.iter().rev().cloned());
        stack.push(script.to_bytes());
        stack.push(control_block.serialize());
        Ok(stack)
    }
}

#[cfg(test)]
mod tests {
    use hashes::Hash;
    use secp256k1::rand;

    use super::*;
    use crate::leaf_version::LeafVersion;
    use crate::script::{opcodes, Builder};
    use crate::tree::TreeShape;

    fn checksig_script(pubkey: &[u8; 32]) -> ScriptBuf {
        Builder::new().push_slice(pubkey).push_opcode(opcodes::OP_CHECKSIG).into_script()
    }

    fn three_leaf_tree(secp: &Secp256k1<secp256k1::All>) -> ScriptTree {
        let mut rng = rand::thread_rng();
        let leaves: Vec<_> = (0..3)
            .map(|_| {
                let pair = UntweakedKeypair::new(secp, &mut rng);
                let (xonly, _) = UntweakedPublicKey::from_keypair(&pair);
                (checksig_script(&xonly.serialize()), LeafVersion::TapScript)
            })
            .collect();
        // ((L0, L1), L2)
        let shape = TreeShape::branch(
            TreeShape::branch(TreeShape::leaf(0), TreeShape::leaf(1)),
            TreeShape::leaf(2),
        );
        ScriptTree::build(leaves, &shape).unwrap()
    }

    #[test]
    fn every_leaf_proof_verifies() {
        let secp = Secp256k1::new();
        let tree = three_leaf_tree(&secp);
        let pair = UntweakedKeypair::new(&secp, &mut rand::thread_rng());
        let (internal, _) = UntweakedPublicKey::from_keypair(&pair);
        let builder = SpendBuilder::new(&secp, &tree, internal).unwrap();

        for (i, (script, _)) in tree.leaves().iter().enumerate() {
            let block = builder.control_block(i).unwrap();
            verify_script_path(&secp, script, &block, builder.output_key()).unwrap();
        }
    }

    #[test]
    fn mutations_fail_verification() {
        let secp = Secp256k1::new();
        let tree = three_leaf_tree(&secp);
        let pair = UntweakedKeypair::new(&secp, &mut rand::thread_rng());
        let (internal, _) = UntweakedPublicKey::from_keypair(&pair);
        let builder = SpendBuilder::new(&secp, &tree, internal).unwrap();

        let (script, _) = tree.leaf(0).unwrap();
        let block = builder.control_block(0).unwrap();

        // Flip a script byte.
        let mut bad_script = script.to_bytes();
        bad_script[0] ^= 0x01;
        assert_eq!(
            verify_script_path(
                &secp,
                &ScriptBuf::from_bytes(bad_script),
                &block,
                builder.output_key()
            ),
            Err(TaprootError::ScriptPathVerificationFailed)
        );

        // Flip a byte of a sibling hash.
        let mut bad_bytes = block.serialize();
        let last = bad_bytes.len() - 1;
        bad_bytes[last] ^= 0x01;
        let bad_block = ControlBlock::decode(&bad_bytes).unwrap();
        assert_eq!(
            verify_script_path(&secp, script, &bad_block, builder.output_key()),
            Err(TaprootError::ScriptPathVerificationFailed)
        );

        // Flip only the parity bit: x still agrees, verification must fail.
        let mut bad_parity = block.serialize();
        bad_parity[0] ^= 0x01;
        let bad_block = ControlBlock::decode(&bad_parity).unwrap();
        assert_eq!(
            verify_script_path(&secp, script, &bad_block, builder.output_key()),
            Err(TaprootError::ScriptPathVerificationFailed)
        );
    }

    #[test]
    fn single_leaf_control_block_has_empty_path() {
        let secp = Secp256k1::new();
        let pair = UntweakedKeypair::new(&secp, &mut rand::thread_rng());
        let (internal, _) = UntweakedPublicKey::from_keypair(&pair);
        let script = checksig_script(&internal.serialize());

        let tree = ScriptTree::build(
            vec![(script.clone(), LeafVersion::TapScript)],
            &TreeShape::leaf(0),
        )
        .unwrap();
        let builder = SpendBuilder::new(&secp, &tree, internal).unwrap();

        let block = builder.control_block(0).unwrap();
        assert!(block.merkle_branch.is_empty());
        assert_eq!(block.size(), 33);
        verify_script_path(&secp, &script, &block, builder.output_key()).unwrap();
    }

    #[test]
    fn two_of_two_checksigadd_witness_ordering() {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();
        let pair_a = UntweakedKeypair::new(&secp, &mut rng);
        let pair_b = UntweakedKeypair::new(&secp, &mut rng);
        let (key_a, _) = UntweakedPublicKey::from_keypair(&pair_a);
        let (key_b, _) = UntweakedPublicKey::from_keypair(&pair_b);

        // <A> CHECKSIG <B> CHECKSIGADD 2 NUMEQUAL checks key A first, so
        // sig_a is consumed first and must end up on top of the stack.
        let script = Builder::new()
            .push_slice(&key_a.serialize())
            .push_opcode(opcodes::OP_CHECKSIG)
            .push_slice(&key_b.serialize())
            .push_opcode(opcodes::OP_CHECKSIGADD)
            .push_opcode(opcodes::OP_PUSHNUM_2)
            .push_opcode(opcodes::OP_NUMEQUAL)
            .into_script();

        let pair = UntweakedKeypair::new(&secp, &mut rng);
        let (internal, _) = UntweakedPublicKey::from_keypair(&pair);
        let tree = ScriptTree::build(
            vec![(script.clone(), LeafVersion::TapScript)],
            &TreeShape::leaf(0),
        )
        .unwrap();
        let builder = SpendBuilder::new(&secp, &tree, internal).unwrap();

        let msg = Message::from_digest([0x24; 32]);
        let sig_a = secp.sign_schnorr_no_aux_rand(&msg, &pair_a).serialize().to_vec();
        let sig_b = secp.sign_schnorr_no_aux_rand(&msg, &pair_b).serialize().to_vec();

        let witness = builder.witness(0, &[sig_a.clone(), sig_b.clone()]).unwrap();
        assert_eq!(witness.len(), 4);
        assert_eq!(witness[0], sig_b);
        assert_eq!(witness[1], sig_a);
        assert_eq!(witness[2], script.to_bytes());
        assert_eq!(witness[3], builder.control_block(0).unwrap().serialize());

        let block = builder.control_block(0).unwrap();
        verify_script_path(&secp, &script, &block, builder.output_key()).unwrap();
    }

    #[test]
    fn key_path_sign_and_verify() {
        let secp = Secp256k1::new();
        let pair = UntweakedKeypair::new(&secp, &mut rand::thread_rng());
        let (internal, _) = UntweakedPublicKey::from_keypair(&pair);

        let root = Some(TapNodeHash::hash(b"script commitment"));
        let (output_key, _) = internal.tap_tweak(&secp, root).unwrap();
        let msg = Message::from_digest([0x42; 32]);

        let sig = key_path_signature(&secp, &pair, root, &msg).unwrap();
        verify_key_path(&secp, internal, root, &sig, &msg, output_key).unwrap();

        // Same signature against the key-path-only derivation must fail.
        assert_eq!(
            verify_key_path(&secp, internal, None, &sig, &msg, output_key),
            Err(TaprootError::KeyPathVerificationFailed)
        );

        // Wrong message must fail.
        let other = Message::from_digest([0x43; 32]);
        assert_eq!(
            verify_key_path(&secp, internal, root, &sig, &other, output_key),
            Err(TaprootError::KeyPathVerificationFailed)
        );
    }

    #[test]
    fn key_path_only_output() {
        let secp = Secp256k1::new();
        let pair = UntweakedKeypair::new(&secp, &mut rand::thread_rng());
        let (internal, _) = UntweakedPublicKey::from_keypair(&pair);

        let (output_key, _) = internal.tap_tweak(&secp, None).unwrap();
        let msg = Message::from_digest([0x01; 32]);
        let sig = key_path_signature(&secp, &pair, None, &msg).unwrap();
        verify_key_path(&secp, internal, None, &sig, &msg, output_key).unwrap();
    }
}
