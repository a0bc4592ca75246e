//! Constant pool decoding
//!
//! Entries are indexed from 1. `Long` and `Double` entries occupy two slots;
//! the second slot, like slot 0, holds [`Constant::Unusable`].

use crate::error::ClassFormatError;
use crate::reader::ClassReader;

/// Constant pool tags
pub mod tags {
    #![allow(missing_docs)]
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELD_REF: u8 = 9;
    pub const METHOD_REF: u8 = 10;
    pub const INTERFACE_METHOD_REF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const DYNAMIC: u8 = 17;
    pub const INVOKE_DYNAMIC: u8 = 18;
    pub const MODULE: u8 = 19;
    pub const PACKAGE: u8 = 20;
}

/// A single constant pool entry
///
/// Numeric payloads are not needed for reference extraction and are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    /// Slot 0 and the upper half of a long or double
    Unusable,
    /// Modified UTF-8 text
    Utf8(String),
    /// Integer or float literal
    Numeric,
    /// Long or double literal (two slots)
    WideNumeric,
    /// Class reference; index of the internal name
    Class { name_index: u16 },
    /// String literal
    String { string_index: u16 },
    /// Field, method or interface-method reference
    MemberRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    /// Name and descriptor pair
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    /// Method handle
    MethodHandle { reference_index: u16 },
    /// Method type; index of a method descriptor
    MethodType { descriptor_index: u16 },
    /// Dynamically computed constant or call site
    Dynamic { name_and_type_index: u16 },
    /// Module or package name
    NamedEntity { name_index: u16 },
}

/// Decoded constant pool
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Decode a constant pool, starting at its u2 count
    pub fn decode(reader: &mut ClassReader<'_>) -> Result<Self, ClassFormatError> {
        let count = reader.read_u16()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let offset = reader.position();
            let tag = reader.read_u8()?;
            let constant = match tag {
                tags::UTF8 => Constant::Utf8(reader.read_modified_utf8()?),
                tags::INTEGER | tags::FLOAT => {
                    reader.skip(4)?;
                    Constant::Numeric
                }
                tags::LONG | tags::DOUBLE => {
                    reader.skip(8)?;
                    Constant::WideNumeric
                }
                tags::CLASS => Constant::Class {
                    name_index: reader.read_u16()?,
                },
                tags::STRING => Constant::String {
                    string_index: reader.read_u16()?,
                },
                tags::FIELD_REF | tags::METHOD_REF | tags::INTERFACE_METHOD_REF => {
                    Constant::MemberRef {
                        class_index: reader.read_u16()?,
                        name_and_type_index: reader.read_u16()?,
                    }
                }
                tags::NAME_AND_TYPE => Constant::NameAndType {
                    name_index: reader.read_u16()?,
                    descriptor_index: reader.read_u16()?,
                },
                tags::METHOD_HANDLE => {
                    reader.skip(1)?;
                    Constant::MethodHandle {
                        reference_index: reader.read_u16()?,
                    }
                }
                tags::METHOD_TYPE => Constant::MethodType {
                    descriptor_index: reader.read_u16()?,
                },
                tags::DYNAMIC | tags::INVOKE_DYNAMIC => {
                    reader.skip(2)?;
                    Constant::Dynamic {
                        name_and_type_index: reader.read_u16()?,
                    }
                }
                tags::MODULE | tags::PACKAGE => Constant::NamedEntity {
                    name_index: reader.read_u16()?,
                },
                tag => return Err(ClassFormatError::UnknownConstantTag { tag, offset }),
            };

            let wide = matches!(constant, Constant::WideNumeric);
            entries.push(constant);
            if wide {
                entries.push(Constant::Unusable);
            }
        }

        // A trailing wide constant may not spill past the declared count
        if entries.len() != count.max(1) {
            return Err(ClassFormatError::BadConstantIndex((count - 1) as u16));
        }

        Ok(Self { entries })
    }

    /// Number of slots, including slot 0
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool holds no usable entries
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Look up an entry
    pub fn get(&self, index: u16) -> Result<&Constant, ClassFormatError> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(ClassFormatError::BadConstantIndex(index)),
            Some(constant) => Ok(constant),
        }
    }

    /// Resolve a `CONSTANT_Utf8` entry
    pub fn utf8(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value),
            _ => Err(ClassFormatError::UnexpectedConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// Resolve a `CONSTANT_Class` entry to its internal name
    ///
    /// The name may be an array descriptor (`[Lcom/foo/Bar;`) when the class
    /// entry denotes an array type.
    pub fn class_name(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassFormatError::UnexpectedConstant {
                index,
                expected: "Class",
            }),
        }
    }

    /// Like [`class_name`](Self::class_name), with index 0 meaning "absent"
    pub fn optional_class_name(&self, index: u16) -> Result<Option<&str>, ClassFormatError> {
        if index == 0 {
            return Ok(None);
        }
        self.class_name(index).map(Some)
    }

    /// Resolve a field or method reference to `(owner, descriptor)`
    pub fn member_ref(&self, index: u16) -> Result<(&str, &str), ClassFormatError> {
        match self.get(index)? {
            Constant::MemberRef {
                class_index,
                name_and_type_index,
            } => {
                let owner = self.class_name(*class_index)?;
                match self.get(*name_and_type_index)? {
                    Constant::NameAndType {
                        descriptor_index, ..
                    } => Ok((owner, self.utf8(*descriptor_index)?)),
                    _ => Err(ClassFormatError::UnexpectedConstant {
                        index: *name_and_type_index,
                        expected: "NameAndType",
                    }),
                }
            }
            _ => Err(ClassFormatError::UnexpectedConstant {
                index,
                expected: "member reference",
            }),
        }
    }
}
