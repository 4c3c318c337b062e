//! Error types for the translation core.
//!
//! Decode misses are not errors: `DispatchTables::lookup` returns `None` and
//! every caller checks the sentinel before use. The variants here cover the
//! cases a caller can act on — an opcode that matched but declines to emit
//! correct IR, and a word that matched nothing at all. Construction-invariant
//! violations (operand type mismatches, malformed label splits) are
//! programming errors and panic with diagnostics instead, since continuing
//! would silently corrupt the in-progress graph.

use thiserror::Error;

/// Translation failure for a single guest instruction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// A matched opcode declined to emit IR for this encoding.
    ///
    /// The surrounding translator decides the fallback (trap or reject the
    /// whole function); it must never silently skip the instruction.
    #[error("unimplemented instruction {name} at 0x{address:08X} (0x{code:08X})")]
    Unimplemented {
        name: &'static str,
        address: u32,
        code: u32,
    },

    /// The word matched no dispatch entry.
    #[error("invalid instruction at 0x{address:08X} (0x{code:08X})")]
    InvalidInstruction { address: u32, code: u32 },
}

impl TranslateError {
    /// Guest address of the failing instruction.
    pub fn address(&self) -> u32 {
        match self {
            TranslateError::Unimplemented { address, .. } => *address,
            TranslateError::InvalidInstruction { address, .. } => *address,
        }
    }

    /// Raw instruction word of the failing instruction.
    pub fn code(&self) -> u32 {
        match self {
            TranslateError::Unimplemented { code, .. } => *code,
            TranslateError::InvalidInstruction { code, .. } => *code,
        }
    }
}
