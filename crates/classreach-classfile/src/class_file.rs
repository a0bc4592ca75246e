//! Class-file structure
//!
//! Splits a class file into its header, constant pool, members and raw
//! attributes. Attribute bodies are kept as borrowed slices and interpreted
//! later, only when the extractor cares about them.
//!
//! Layout:
//! - magic (u4) + minor (u2) + major (u2)
//! - constant pool
//! - access flags, this class, super class (u2 each)
//! - interfaces, fields, methods, attributes (u2 counts)

use crate::constant_pool::ConstantPool;
use crate::error::ClassFormatError;
use crate::reader::ClassReader;

/// Magic number opening every class file
pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;

/// An attribute whose body has not been interpreted
#[derive(Debug, Clone, Copy)]
pub struct Attribute<'a> {
    /// Constant pool index of the attribute name
    pub name_index: u16,
    /// Raw attribute body
    pub info: &'a [u8],
}

impl<'a> Attribute<'a> {
    /// Resolve the attribute name
    pub fn name<'p>(&self, pool: &'p ConstantPool) -> Result<&'p str, ClassFormatError> {
        pool.utf8(self.name_index)
    }
}

/// A field or method declaration
#[derive(Debug, Clone)]
pub struct Member<'a> {
    /// Access flags
    pub access_flags: u16,
    /// Constant pool index of the member name
    pub name_index: u16,
    /// Constant pool index of the raw descriptor
    pub descriptor_index: u16,
    /// Member attributes
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> Member<'a> {
    fn decode(reader: &mut ClassReader<'a>) -> Result<Self, ClassFormatError> {
        Ok(Self {
            access_flags: reader.read_u16()?,
            name_index: reader.read_u16()?,
            descriptor_index: reader.read_u16()?,
            attributes: read_attributes(reader)?,
        })
    }
}

/// A decoded class file
#[derive(Debug, Clone)]
pub struct ClassFile<'a> {
    /// Minor version
    pub minor_version: u16,
    /// Major version
    pub major_version: u16,
    /// Constant pool
    pub constant_pool: ConstantPool,
    /// Class access flags
    pub access_flags: u16,
    /// Index of this class's `CONSTANT_Class`
    pub this_class: u16,
    /// Index of the superclass, 0 for the root of the hierarchy
    pub super_class: u16,
    /// Indexes of the directly implemented interfaces
    pub interfaces: Vec<u16>,
    /// Field declarations
    pub fields: Vec<Member<'a>>,
    /// Method declarations
    pub methods: Vec<Member<'a>>,
    /// Class-level attributes
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> ClassFile<'a> {
    /// Decode the structure of a class file
    ///
    /// Version numbers are recorded but not checked.
    pub fn parse(data: &'a [u8]) -> Result<Self, ClassFormatError> {
        let mut reader = ClassReader::new(data);

        let magic = reader.read_u32()?;
        if magic != CLASS_MAGIC {
            return Err(ClassFormatError::InvalidMagic(magic));
        }
        let minor_version = reader.read_u16()?;
        let major_version = reader.read_u16()?;

        let constant_pool = ConstantPool::decode(&mut reader)?;

        let access_flags = reader.read_u16()?;
        let this_class = reader.read_u16()?;
        let super_class = reader.read_u16()?;

        let interface_count = reader.read_u16()? as usize;
        let mut interfaces = Vec::with_capacity(interface_count);
        for _ in 0..interface_count {
            interfaces.push(reader.read_u16()?);
        }

        let fields = read_members(&mut reader)?;
        let methods = read_members(&mut reader)?;
        let attributes = read_attributes(&mut reader)?;

        Ok(Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Internal name of this class
    pub fn this_class_name(&self) -> Result<&str, ClassFormatError> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Find the first attribute called `name` among `attributes`
    pub fn find_attribute<'s>(
        &self,
        attributes: &'s [Attribute<'a>],
        name: &str,
    ) -> Result<Option<&'s Attribute<'a>>, ClassFormatError> {
        for attribute in attributes {
            if attribute.name(&self.constant_pool)? == name {
                return Ok(Some(attribute));
            }
        }
        Ok(None)
    }
}

fn read_members<'a>(reader: &mut ClassReader<'a>) -> Result<Vec<Member<'a>>, ClassFormatError> {
    let count = reader.read_u16()? as usize;
    let mut members = Vec::with_capacity(count);
    for _ in 0..count {
        members.push(Member::decode(reader)?);
    }
    Ok(members)
}

/// Read a u2-counted attribute table
pub fn read_attributes<'a>(
    reader: &mut ClassReader<'a>,
) -> Result<Vec<Attribute<'a>>, ClassFormatError> {
    let count = reader.read_u16()? as usize;
    let mut attributes = Vec::with_capacity(count);
    for _ in 0..count {
        let name_index = reader.read_u16()?;
        let length = reader.read_u32()? as usize;
        let info = reader.read_bytes(length)?;
        attributes.push(Attribute { name_index, info });
    }
    Ok(attributes)
}
