//! Class-file decoding for classreach
//!
//! This crate reads compiled JVM class files just far enough to answer one
//! question: which other classes does this one refer to? It provides the
//! byte cursor, the constant pool, the descriptor and generic-signature
//! grammars, an instruction walker, and the [`ReferenceExtractor`] that ties
//! them together. With the `test-util` feature, `ClassWriter` assembles class
//! files for test fixtures.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod class_file;
pub mod constant_pool;
pub mod descriptor;
pub mod error;
pub mod extract;
pub mod opcode;
pub mod reader;
pub mod signature;
#[cfg(any(test, feature = "test-util"))]
pub mod writer;

pub use class_file::{Attribute, ClassFile, Member, CLASS_MAGIC};
pub use constant_pool::{Constant, ConstantPool};
pub use error::ClassFormatError;
pub use extract::{ReferenceExtractor, References, DEFAULT_PLATFORM_PREFIX};
pub use reader::{ClassReader, DecodeError};
#[cfg(any(test, feature = "test-util"))]
pub use writer::{
    AnnotationSpec, ClassWriter, CodeBuilder, CodeSpec, ElementValue, FieldSpec, LocalVariable,
    MethodSpec,
};
