//! Class-file format errors

use crate::reader::DecodeError;
use thiserror::Error;

/// Errors raised when bytes do not form a well-formed class file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassFormatError {
    /// Low-level read failure (truncation, bad UTF-8)
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Invalid magic number
    #[error("Invalid magic number: expected 0xCAFEBABE, got {0:#010x}")]
    InvalidMagic(u32),

    /// Unknown constant pool tag
    #[error("Unknown constant pool tag {tag} at offset {offset}")]
    UnknownConstantTag { tag: u8, offset: usize },

    /// Constant pool index out of range or pointing at an unusable slot
    #[error("Invalid constant pool index {0}")]
    BadConstantIndex(u16),

    /// Constant pool entry has the wrong kind
    #[error("Constant pool entry {index} is not a {expected}")]
    UnexpectedConstant { index: u16, expected: &'static str },

    /// Malformed field or method descriptor
    #[error("Invalid descriptor: {0:?}")]
    InvalidDescriptor(String),

    /// Malformed generic signature
    #[error("Invalid signature {signature:?} at position {position}")]
    InvalidSignature { signature: String, position: usize },

    /// Unknown annotation element-value tag, or nesting too deep to follow
    #[error("Invalid annotation element value {tag:?} at offset {offset}")]
    InvalidElementValue { tag: char, offset: usize },

    /// Unknown opcode in a method body
    #[error("Invalid opcode {opcode:#04x} at code offset {offset}")]
    InvalidOpcode { opcode: u8, offset: usize },

    /// Attribute body does not match its declared length
    #[error("Attribute {name} declares {declared} bytes but its contents span {consumed}")]
    AttributeLength {
        name: String,
        declared: usize,
        consumed: usize,
    },
}
