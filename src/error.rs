// SPDX-License-Identifier: CC0-1.0

//! Error types for Taproot commitment construction and verification.

use core::fmt;

use crate::{TAPROOT_CONTROL_MAX_NODE_COUNT, TAPROOT_CONTROL_NODE_SIZE};

/// Detailed error type for Taproot utilities.
///
/// Malformed-input conditions and genuine verification failures are separate
/// variants so callers can tell a bad control block apart from a proof that
/// simply does not match the output key.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaprootError {
    /// The last bit of a tapleaf version must be zero.
    InvalidLeafVersion(u8),
    /// Merkle tree depth must not be more than 128.
    TreeTooDeep(usize),
    /// The leaf list and pairing shape do not describe a binary tree.
    InvalidTreeShape(TreeShapeError),
    /// Control block size must be of the form 33 + 32k, 0 <= k <= 128.
    MalformedControlBlock(usize),
    /// The tweak hash is not a valid scalar (greater than the curve order).
    InvalidTweak,
    /// The recomputed output key does not match the expected one, on the
    /// x coordinate or on the parity bit.
    ScriptPathVerificationFailed,
    /// The key-path signature does not verify against the derived output key.
    KeyPathVerificationFailed,
    /// The x coordinate has no corresponding curve point.
    LiftXFailed(secp256k1::Error),
}

impl fmt::Display for TaprootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TaprootError::*;

        match *self {
            InvalidLeafVersion(v) => {
                write!(f, "leaf version({}) must have the least significant bit 0", v)
            }
            TreeTooDeep(d) => write!(
                f,
                "merkle tree depth({}) must not exceed {}",
                d, TAPROOT_CONTROL_MAX_NODE_COUNT
            ),
            InvalidTreeShape(ref e) => write!(f, "invalid tree shape: {}", e),
            MalformedControlBlock(sz) => write!(
                f,
                "control block size({}) must be of the form {} + {}*k where 0 <= k <= {}",
                sz,
                crate::TAPROOT_CONTROL_BASE_SIZE,
                TAPROOT_CONTROL_NODE_SIZE,
                TAPROOT_CONTROL_MAX_NODE_COUNT
            ),
            InvalidTweak => write!(f, "tweak hash is not a valid scalar mod the curve order"),
            ScriptPathVerificationFailed => {
                write!(f, "script path proof does not match the output key")
            }
            KeyPathVerificationFailed => {
                write!(f, "signature does not verify against the derived output key")
            }
            LiftXFailed(ref e) => write!(f, "no curve point for x coordinate: {}", e),
        }
    }
}

impl std::error::Error for TaprootError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use TaprootError::*;

        match self {
            LiftXFailed(e) => Some(e),
            InvalidLeafVersion(_)
            | TreeTooDeep(_)
            | InvalidTreeShape(_)
            | MalformedControlBlock(_)
            | InvalidTweak
            | ScriptPathVerificationFailed
            | KeyPathVerificationFailed => None,
        }
    }
}

/// Ways in which a leaf list plus pairing shape can fail to describe a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TreeShapeError {
    /// The leaf list is empty.
    EmptyTree,
    /// The shape references a leaf index outside the leaf list.
    LeafIndexOutOfBounds(usize),
    /// The shape references the same leaf index more than once.
    DuplicateLeaf(usize),
    /// A leaf in the list is never referenced by the shape.
    UnusedLeaf(usize),
}

impl fmt::Display for TreeShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TreeShapeError::*;

        match *self {
            EmptyTree => write!(f, "tree must contain at least one script"),
            LeafIndexOutOfBounds(i) => write!(f, "leaf index({}) is out of bounds", i),
            DuplicateLeaf(i) => write!(f, "leaf index({}) appears more than once", i),
            UnusedLeaf(i) => write!(f, "leaf index({}) is never used by the shape", i),
        }
    }
}

impl std::error::Error for TreeShapeError {}

impl From<TreeShapeError> for TaprootError {
    fn from(e: TreeShapeError) -> Self { TaprootError::InvalidTreeShape(e) }
}
