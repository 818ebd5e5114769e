// SPDX-License-Identifier: CC0-1.0

//! Taproot script-tree commitments.
//!
//! This crate implements the BIP341 commitment scheme: tagged hashing of leaf
//! scripts, Merkle-tree aggregation with lexicographic branch ordering, key
//! tweaking with output-key parity tracking, control-block encoding, and
//! verification of script-path and key-path spends.
//!
//! Elliptic-curve arithmetic is delegated to the [`secp256k1`] crate and
//! hashing to [`hashes`]; this crate contains no curve or digest code of its
//! own. Transaction serialization, address encoding and script interpretation
//! are out of scope - the witness stacks produced here are plain byte vectors
//! for an external serializer.

// Coding conventions.
#![warn(missing_docs)]
// Exclude lints we don't think are valuable.
#![allow(clippy::manual_range_contains)] // More readable than clippy's format.
#![allow(clippy::uninlined_format_args)]

// Re-export dependencies we control the API of.
pub extern crate hashes;
pub extern crate secp256k1;

pub mod control;
pub mod error;
pub mod key;
pub mod leaf_version;
pub mod script;
pub mod spend;
pub mod taghash;
pub mod tree;

#[doc(inline)]
pub use crate::control::ControlBlock;
#[doc(inline)]
pub use crate::error::{TaprootError, TreeShapeError};
#[doc(inline)]
pub use crate::key::{
    TapTweak, TweakedKeypair, TweakedPublicKey, UntweakedKeypair, UntweakedPublicKey,
};
#[doc(inline)]
pub use crate::leaf_version::{FutureLeafVersion, LeafVersion};
#[doc(inline)]
pub use crate::script::ScriptBuf;
#[doc(inline)]
pub use crate::spend::{key_path_signature, verify_key_path, verify_script_path, SpendBuilder};
#[doc(inline)]
pub use crate::taghash::{TapLeafHash, TapNodeHash, TapTweakHash};
#[doc(inline)]
pub use crate::tree::{ScriptTree, TaprootMerkleBranch, TreeShape};

/// Maximum depth of a Taproot tree script spend path.
pub const TAPROOT_CONTROL_MAX_NODE_COUNT: usize = 128;
/// Size of a Taproot control node.
pub const TAPROOT_CONTROL_NODE_SIZE: usize = 32;
/// Tapleaf mask for getting the leaf version from first byte of control block.
pub const TAPROOT_LEAF_MASK: u8 = 0xfe;
/// Tapscript leaf version.
pub const TAPROOT_LEAF_TAPSCRIPT: u8 = 0xc0;
/// Taproot annex prefix.
pub const TAPROOT_ANNEX_PREFIX: u8 = 0x50;
/// Tapscript control base size.
pub const TAPROOT_CONTROL_BASE_SIZE: usize = 33;
/// Tapscript control max size.
pub const TAPROOT_CONTROL_MAX_SIZE: usize =
    TAPROOT_CONTROL_BASE_SIZE + TAPROOT_CONTROL_NODE_SIZE * TAPROOT_CONTROL_MAX_NODE_COUNT;
