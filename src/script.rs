// SPDX-License-Identifier: CC0-1.0

//! Opaque leaf scripts.
//!
//! This crate hashes and commits to scripts, it does not interpret them, so a
//! leaf script is just a byte buffer. A minimal [`Builder`] is provided for
//! assembling the common tapscript templates (pubkey pushes plus an opcode or
//! two); anything fancier belongs to a real script engine.

use core::fmt;

/// Opcode bytes used by the tapscript templates in this crate's tests and
/// documentation. Values are Bitcoin Script consensus bytes.
pub mod opcodes {
    /// Pops a signature and a pubkey, pushes the verification result.
    pub const OP_CHECKSIG: u8 = 0xac;
    /// Pops a signature, a counter and a pubkey, pushes counter + sig validity.
    pub const OP_CHECKSIGADD: u8 = 0xba;
    /// Numeric equality on the top two stack items.
    pub const OP_NUMEQUAL: u8 = 0x9c;
    /// Pushes the number 2.
    pub const OP_PUSHNUM_2: u8 = 0x52;
}

/// An owned leaf script: an opaque byte sequence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ScriptBuf(Vec<u8>);

impl ScriptBuf {
    /// Constructs an empty script.
    pub fn new() -> Self { ScriptBuf(Vec::new()) }

    /// Constructs a script from raw bytes, without any interpretation.
    pub fn from_bytes(bytes: Vec<u8>) -> Self { ScriptBuf(bytes) }

    /// Returns the script bytes.
    pub fn as_bytes(&self) -> &[u8] { &self.0 }

    /// Converts the script into its underlying byte vector.
    pub fn into_bytes(self) -> Vec<u8> { self.0 }

    /// Returns a copy of the script bytes.
    pub fn to_bytes(&self) -> Vec<u8> { self.0.clone() }

    /// Returns the length of the script in bytes.
    pub fn len(&self) -> usize { self.0.len() }

    /// Checks whether the script is empty.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl fmt::Display for ScriptBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl From<Vec<u8>> for ScriptBuf {
    fn from(bytes: Vec<u8>) -> Self { ScriptBuf(bytes) }
}

impl AsRef<[u8]> for ScriptBuf {
    fn as_ref(&self) -> &[u8] { &self.0 }
}

/// Incrementally assembles a leaf script.
#[derive(Debug, Clone, Default)]
pub struct Builder(Vec<u8>);

impl Builder {
    /// Constructs an empty builder.
    pub fn new() -> Self { Builder(Vec::new()) }

    /// Appends a raw opcode byte.
    pub fn push_opcode(mut self, opcode: u8) -> Self {
        self.0.push(opcode);
        self
    }

    /// Appends a data push of `data`, with the appropriate pushdata prefix.
    pub fn push_slice(mut self, data: &[u8]) -> Self {
        match data.len() {
            n if n < 0x4c => self.0.push(n as u8),
            n if n <= 0xff => {
                self.0.push(0x4c); // OP_PUSHDATA1
                self.0.push(n as u8);
            }
            n if n <= 0xffff => {
                self.0.push(0x4d); // OP_PUSHDATA2
                self.0.extend_from_slice(&(n as u16).to_le_bytes());
            }
            n => {
                self.0.push(0x4e); // OP_PUSHDATA4
                self.0.extend_from_slice(&(n as u32).to_le_bytes());
            }
        }
        self.0.extend_from_slice(data);
        self
    }

    /// Finishes the script.
    pub fn into_script(self) -> ScriptBuf { ScriptBuf(self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_small_push() {
        let script = Builder::new()
            .push_slice(&[0xab; 32])
            .push_opcode(opcodes::OP_CHECKSIG)
            .into_script();
        assert_eq!(script.len(), 34);
        assert_eq!(script.as_bytes()[0], 32);
        assert_eq!(script.as_bytes()[33], opcodes::OP_CHECKSIG);
    }

    #[test]
    fn builder_pushdata1() {
        let script = Builder::new().push_slice(&[0u8; 0x4c]).into_script();
        assert_eq!(script.as_bytes()[0], 0x4c);
        assert_eq!(script.as_bytes()[1], 0x4c);
        assert_eq!(script.len(), 2 + 0x4c);
    }

    #[test]
    fn display_is_hex() {
        let script = ScriptBuf::from_bytes(vec![0x6a, 0x50]);
        assert_eq!(script.to_string(), "6a50");
    }
}
