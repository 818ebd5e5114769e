// SPDX-License-Identifier: CC0-1.0

//! Script trees and Merkle proofs.
//!
//! A [`ScriptTree`] commits to a set of alternative spending scripts. The
//! caller supplies the pairing shape explicitly as a [`TreeShape`]; any
//! binary shape is allowed, balanced or not, up to 128 levels. The tree is
//! built once and never mutated - Merkle roots and per-leaf proofs are pure
//! traversals.
//!
//! Branch hashing sorts the two child hashes lexicographically (see
//! [`TapNodeHash::from_node_hashes`]), so the commitment is invariant under
//! swapping the children of any single branch. The emitted proofs are *not*
//! re-sorted: they are the sibling hashes in bottom-to-top order, exactly as
//! a control block carries them.

use hashes::Hash;

use crate::error::{TaprootError, TreeShapeError};
use crate::leaf_version::LeafVersion;
use crate::script::ScriptBuf;
use crate::taghash::TapNodeHash;
use crate::{TAPROOT_CONTROL_MAX_NODE_COUNT, TAPROOT_CONTROL_NODE_SIZE};

/// A caller-supplied pairing shape for a script tree.
///
/// Leaves carry indices into the leaf list passed to [`ScriptTree::build`].
/// Every index must appear exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeShape {
    /// A single leaf, by index into the leaf list.
    Leaf(usize),
    /// An internal node pairing two subtrees.
    Branch(Box<TreeShape>, Box<TreeShape>),
}

impl TreeShape {
    /// Shorthand for a leaf shape node.
    pub fn leaf(index: usize) -> Self { TreeShape::Leaf(index) }

    /// Shorthand for a branch shape node.
    pub fn branch(left: TreeShape, right: TreeShape) -> Self {
        TreeShape::Branch(Box::new(left), Box::new(right))
    }

    /// Returns the number of levels below this node (a lone leaf has depth 0).
    pub fn depth(&self) -> usize {
        match self {
            TreeShape::Leaf(_) => 0,
            TreeShape::Branch(l, r) => 1 + l.depth().max(r.depth()),
        }
    }
}

/// A node of a built script tree. Hashes are computed at build time and
/// never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TreeNode {
    Leaf { index: usize, hash: TapNodeHash },
    Branch { left: Box<TreeNode>, right: Box<TreeNode>, hash: TapNodeHash },
}

impl TreeNode {
    fn hash(&self) -> TapNodeHash {
        match self {
            TreeNode::Leaf { hash, .. } => *hash,
            TreeNode::Branch { hash, .. } => *hash,
        }
    }
}

/// An immutable Taproot script tree.
///
/// Built once from an ordered leaf list and a [`TreeShape`]; afterwards it
/// answers [`merkle_root`](Self::merkle_root) and per-leaf
/// [`merkle_branch`](Self::merkle_branch) queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTree {
    root: TreeNode,
    leaves: Vec<(ScriptBuf, LeafVersion)>,
}

impl ScriptTree {
    /// Builds a tree from an ordered leaf list and a pairing shape.
    ///
    /// # Errors
    ///
    /// - [`TaprootError::InvalidTreeShape`] if the leaf list is empty, or the
    ///   shape skips, repeats, or overruns the leaf list.
    /// - [`TaprootError::TreeTooDeep`] if the shape is deeper than 128 levels.
    pub fn build(
        leaves: Vec<(ScriptBuf, LeafVersion)>,
        shape: &TreeShape,
    ) -> Result<Self, TaprootError> {
        if leaves.is_empty() {
            return Err(TreeShapeError::EmptyTree.into());
        }
        let depth = shape.depth();
        if depth > TAPROOT_CONTROL_MAX_NODE_COUNT {
            return Err(TaprootError::TreeTooDeep(depth));
        }

        let mut used = vec![false; leaves.len()];
        let root = Self::build_node(&leaves, shape, &mut used)?;
        if let Some(unused) = used.iter().position(|u| !u) {
            return Err(TreeShapeError::UnusedLeaf(unused).into());
        }
        Ok(ScriptTree { root, leaves })
    }

    fn build_node(
        leaves: &[(ScriptBuf, LeafVersion)],
        shape: &TreeShape,
        used: &mut [bool],
    ) -> Result<TreeNode, TaprootError> {
        match shape {
            TreeShape::Leaf(index) => {
                let (script, ver) = leaves
                    .get(*index)
                    .ok_or(TreeShapeError::LeafIndexOutOfBounds(*index))?;
                if used[*index] {
                    return Err(TreeShapeError::DuplicateLeaf(*index).into());
                }
                used[*index] = true;
                Ok(TreeNode::Leaf { index: *index, hash: TapNodeHash::from_script(script, *ver) })
            }
            TreeShape::Branch(l, r) => {
                let left = Self::build_node(leaves, l, used)?;
                let right = Self::build_node(leaves, r, used)?;
                let hash = TapNodeHash::from_node_hashes(left.hash(), right.hash());
                Ok(TreeNode::Branch { left: Box::new(left), right: Box::new(right), hash })
            }
        }
    }

    /// Returns the Merkle root of the tree.
    ///
    /// A one-leaf tree has no branches; its root is the leaf hash itself.
    pub fn merkle_root(&self) -> TapNodeHash { self.root.hash() }

    /// Returns the leaf list in the order it was supplied to [`build`](Self::build).
    pub fn leaves(&self) -> &[(ScriptBuf, LeafVersion)] { &self.leaves }

    /// Returns the script and version of the leaf at `leaf_index`.
    pub fn leaf(&self, leaf_index: usize) -> Result<(&ScriptBuf, LeafVersion), TaprootError> {
        self.leaves
            .get(leaf_index)
            .map(|(script, ver)| (script, *ver))
            .ok_or_else(|| TreeShapeError::LeafIndexOutOfBounds(leaf_index).into())
    }

    /// Computes the Merkle proof for the leaf at `leaf_index`.
    ///
    /// The proof lists, for each branch on the path, the hash of the sibling
    /// *not* on the path, in bottom-to-top order. This is byte-for-byte the
    /// `merkle_path` a control block carries.
    pub fn merkle_branch(&self, leaf_index: usize) -> Result<TaprootMerkleBranch, TaprootError> {
        if leaf_index >= self.leaves.len() {
            return Err(TreeShapeError::LeafIndexOutOfBounds(leaf_index).into());
        }
        let mut siblings = Vec::new();
        let found = Self::collect_siblings(&self.root, leaf_index, &mut siblings);
        debug_assert!(found, "every leaf index is present in a built tree");
        TaprootMerkleBranch::try_from(siblings)
    }

    // Pushes sibling hashes on the way back up, so the result is already in
    // bottom-to-top order.
    fn collect_siblings(node: &TreeNode, leaf_index: usize, acc: &mut Vec<TapNodeHash>) -> bool {
        match node {
            TreeNode::Leaf { index, .. } => *index == leaf_index,
            TreeNode::Branch { left, right, .. } => {
                if Self::collect_siblings(left, leaf_index, acc) {
                    acc.push(right.hash());
                    true
                } else if Self::collect_siblings(right, leaf_index, acc) {
                    acc.push(left.hash());
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// The Merkle proof for inclusion of a leaf in a script tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TaprootMerkleBranch(Vec<TapNodeHash>);

impl TaprootMerkleBranch {
    /// Returns the sibling hashes in bottom-to-top order.
    pub fn nodes(&self) -> &[TapNodeHash] { &self.0 }

    /// Returns the number of nodes in this Merkle proof.
    pub fn len(&self) -> usize { self.0.len() }

    /// Checks if this Merkle proof is empty.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Decodes a Merkle proof as encoded in a control block: concatenated
    /// 32-byte chunks, one per hash.
    ///
    /// # Errors
    ///
    /// [`TaprootError::MalformedControlBlock`] if the length is not a
    /// multiple of 32, [`TaprootError::TreeTooDeep`] if there are more than
    /// 128 hashes.
    pub fn decode(sl: &[u8]) -> Result<Self, TaprootError> {
        if sl.len() % TAPROOT_CONTROL_NODE_SIZE != 0 {
            Err(TaprootError::MalformedControlBlock(sl.len()))
        } else if sl.len() > TAPROOT_CONTROL_NODE_SIZE * TAPROOT_CONTROL_MAX_NODE_COUNT {
            Err(TaprootError::TreeTooDeep(sl.len() / TAPROOT_CONTROL_NODE_SIZE))
        } else {
            let inner = sl
                .chunks_exact(TAPROOT_CONTROL_NODE_SIZE)
                .map(|chunk| {
                    let mut bytes = [0u8; TAPROOT_CONTROL_NODE_SIZE];
                    bytes.copy_from_slice(chunk);
                    TapNodeHash::from_byte_array(bytes)
                })
                .collect();
            Ok(TaprootMerkleBranch(inner))
        }
    }

    /// Appends the concatenated hashes to `buf`.
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        for hash in &self.0 {
            buf.extend_from_slice(hash.as_ref());
        }
    }

    /// Serializes `self` as the concatenation of its hashes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.0.len() * TAPROOT_CONTROL_NODE_SIZE);
        self.encode_into(&mut buf);
        buf
    }

    /// Returns the inner list of hashes.
    pub fn into_inner(self) -> Vec<TapNodeHash> { self.0 }
}

impl TryFrom<Vec<TapNodeHash>> for TaprootMerkleBranch {
    type Error = TaprootError;

    /// Creates a Merkle proof from a list of hashes.
    ///
    /// # Errors
    ///
    /// [`TaprootError::TreeTooDeep`] if there are more than 128 hashes.
    fn try_from(v: Vec<TapNodeHash>) -> Result<Self, Self::Error> {
        if v.len() > TAPROOT_CONTROL_MAX_NODE_COUNT {
            Err(TaprootError::TreeTooDeep(v.len()))
        } else {
            Ok(TaprootMerkleBranch(v))
        }
    }
}

impl From<TaprootMerkleBranch> for Vec<TapNodeHash> {
    fn from(branch: TaprootMerkleBranch) -> Self { branch.0 }
}
