//! JVM instruction set, as far as the instruction walker needs it
//!
//! Only opcodes whose operands can name a type get a constant; everything
//! else is handled by [`instruction_length`], which knows the operand size of
//! every defined opcode so a method body can be stepped through.

#![allow(missing_docs)]

use crate::error::ClassFormatError;
use crate::reader::ClassReader;

pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;
pub const TABLESWITCH: u8 = 0xAA;
pub const LOOKUPSWITCH: u8 = 0xAB;
pub const GETSTATIC: u8 = 0xB2;
pub const PUTSTATIC: u8 = 0xB3;
pub const GETFIELD: u8 = 0xB4;
pub const PUTFIELD: u8 = 0xB5;
pub const INVOKEVIRTUAL: u8 = 0xB6;
pub const INVOKESPECIAL: u8 = 0xB7;
pub const INVOKESTATIC: u8 = 0xB8;
pub const INVOKEINTERFACE: u8 = 0xB9;
pub const INVOKEDYNAMIC: u8 = 0xBA;
pub const NEW: u8 = 0xBB;
pub const ANEWARRAY: u8 = 0xBD;
pub const CHECKCAST: u8 = 0xC0;
pub const INSTANCEOF: u8 = 0xC1;
pub const WIDE: u8 = 0xC4;
pub const MULTIANEWARRAY: u8 = 0xC5;
pub const IINC: u8 = 0x84;

pub const NOP: u8 = 0x00;
pub const ACONST_NULL: u8 = 0x01;
pub const ALOAD: u8 = 0x19;
pub const ALOAD_0: u8 = 0x2A;
pub const ASTORE: u8 = 0x3A;
pub const POP: u8 = 0x57;
pub const DUP: u8 = 0x59;
pub const GOTO: u8 = 0xA7;
pub const ARETURN: u8 = 0xB0;
pub const RETURN: u8 = 0xB1;
pub const ATHROW: u8 = 0xBF;
pub const BIPUSH: u8 = 0x10;
pub const ICONST_0: u8 = 0x03;
pub const ILOAD: u8 = 0x15;

/// Operand size in bytes for fixed-length opcodes, `None` for undefined ones
///
/// Switches and `wide` are variable-length and handled separately.
fn fixed_operand_size(opcode: u8) -> Option<usize> {
    let size = match opcode {
        0x00..=0x0F => 0,
        BIPUSH | LDC => 1,
        0x11 | LDC_W | 0x14 => 2,
        0x15..=0x19 => 1,
        0x1A..=0x35 => 0,
        0x36..=0x3A => 1,
        0x3B..=0x83 => 0,
        IINC => 2,
        0x85..=0x98 => 0,
        0x99..=0xA8 => 2,
        0xA9 => 1,
        0xAC..=0xB1 => 0,
        GETSTATIC..=INVOKESTATIC => 2,
        INVOKEINTERFACE | INVOKEDYNAMIC => 4,
        NEW => 2,
        0xBC => 1,
        ANEWARRAY => 2,
        0xBE | 0xBF => 0,
        CHECKCAST | INSTANCEOF => 2,
        0xC2 | 0xC3 => 0,
        MULTIANEWARRAY => 3,
        0xC6 | 0xC7 => 2,
        0xC8 | 0xC9 => 4,
        _ => return None,
    };
    Some(size)
}

/// Total length of the instruction starting at `offset` within `code`
///
/// `offset` is relative to the start of the method's code array, which is
/// what switch padding aligns against.
pub fn instruction_length(code: &[u8], offset: usize) -> Result<usize, ClassFormatError> {
    let opcode = *code
        .get(offset)
        .ok_or(crate::reader::DecodeError::UnexpectedEnd(offset))?;

    let length = match opcode {
        TABLESWITCH | LOOKUPSWITCH => {
            let padding = (4 - (offset + 1) % 4) % 4;
            let mut reader = ClassReader::new(code);
            reader.skip(offset + 1 + padding)?;
            let _default = reader.read_i32()?;
            if opcode == TABLESWITCH {
                let low = reader.read_i32()? as i64;
                let high = reader.read_i32()? as i64;
                if high < low {
                    return Err(ClassFormatError::InvalidOpcode { opcode, offset });
                }
                1 + padding + 12 + (high - low + 1) as usize * 4
            } else {
                let pairs = reader.read_i32()?;
                if pairs < 0 {
                    return Err(ClassFormatError::InvalidOpcode { opcode, offset });
                }
                1 + padding + 8 + pairs as usize * 8
            }
        }
        WIDE => match code.get(offset + 1) {
            Some(&IINC) => 6,
            Some(0x15..=0x19 | 0x36..=0x3A | 0xA9) => 4,
            _ => return Err(ClassFormatError::InvalidOpcode { opcode, offset }),
        },
        _ => {
            let operands = fixed_operand_size(opcode)
                .ok_or(ClassFormatError::InvalidOpcode { opcode, offset })?;
            1 + operands
        }
    };

    if offset.checked_add(length).map_or(true, |end| end > code.len()) {
        return Err(crate::reader::DecodeError::UnexpectedEnd(code.len()).into());
    }
    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_lengths() {
        assert_eq!(instruction_length(&[NOP], 0).unwrap(), 1);
        assert_eq!(instruction_length(&[BIPUSH, 5], 0).unwrap(), 2);
        assert_eq!(instruction_length(&[NEW, 0, 1], 0).unwrap(), 3);
        assert_eq!(instruction_length(&[INVOKEINTERFACE, 0, 1, 1, 0], 0).unwrap(), 5);
        assert_eq!(instruction_length(&[MULTIANEWARRAY, 0, 1, 2], 0).unwrap(), 4);
        assert_eq!(instruction_length(&[0xC8, 0, 0, 0, 0], 0).unwrap(), 5);
    }

    #[test]
    fn test_wide_forms() {
        assert_eq!(instruction_length(&[WIDE, ALOAD, 1, 0], 0).unwrap(), 4);
        assert_eq!(instruction_length(&[WIDE, IINC, 0, 1, 0, 1], 0).unwrap(), 6);
        assert!(instruction_length(&[WIDE, NOP, 0, 0], 0).is_err());
    }

    #[test]
    fn test_tableswitch_padding() {
        // At offset 1 the operands start at 4 with two padding bytes
        let mut code = vec![NOP, TABLESWITCH, 0, 0];
        code.extend_from_slice(&8i32.to_be_bytes()); // default
        code.extend_from_slice(&0i32.to_be_bytes()); // low
        code.extend_from_slice(&1i32.to_be_bytes()); // high
        code.extend_from_slice(&[0; 8]); // two offsets
        assert_eq!(instruction_length(&code, 1).unwrap(), 1 + 2 + 12 + 8);
    }

    #[test]
    fn test_lookupswitch() {
        let mut code = vec![LOOKUPSWITCH, 0, 0, 0];
        code.extend_from_slice(&8i32.to_be_bytes()); // default
        code.extend_from_slice(&2i32.to_be_bytes()); // npairs
        code.extend_from_slice(&[0; 16]);
        assert_eq!(instruction_length(&code, 0).unwrap(), 1 + 3 + 8 + 16);
    }

    #[test]
    fn test_undefined_opcode() {
        assert!(matches!(
            instruction_length(&[0xCB], 0),
            Err(ClassFormatError::InvalidOpcode { opcode: 0xCB, offset: 0 })
        ));
    }

    #[test]
    fn test_truncated_operands() {
        assert!(matches!(
            instruction_length(&[NEW, 0], 0),
            Err(ClassFormatError::Decode(_))
        ));
    }
}
