//! Reference extraction
//!
//! Walks a class file region by region (header, class attributes, fields,
//! methods, method bodies) and records every class name it meets into one
//! [`References`] sink. The emission order is fixed, so two runs over the
//! same bytes produce the same sequence:
//!
//! 1. this class, then the class signature or the raw superclass and interfaces
//! 2. the `EnclosingMethod` owner
//! 3. class annotations
//! 4. `InnerClasses` entries
//! 5. per field: signature or descriptor, then annotations
//! 6. per method: signature or descriptor, exceptions, annotations,
//!    parameter annotations, instruction operands, local variables

use crate::class_file::{Attribute, ClassFile, Member};
use crate::constant_pool::{Constant, ConstantPool};
use crate::descriptor;
use crate::error::ClassFormatError;
use crate::opcode;
use crate::reader::ClassReader;
use crate::signature;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Names under this prefix belong to the platform and are never collected
pub const DEFAULT_PLATFORM_PREFIX: &str = "java.";

/// Element values nested deeper than this are rejected
const MAX_ELEMENT_DEPTH: usize = 256;

/// Insertion-ordered set of dotted class names referenced by one class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    module: String,
    names: Vec<String>,
    seen: HashSet<String>,
}

impl References {
    fn new(module: String) -> Self {
        Self {
            module,
            names: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn insert(&mut self, name: String) {
        if self.seen.insert(name.clone()) {
            self.names.push(name);
        }
    }

    /// Dotted name of the class the references were extracted from
    pub fn this_module(&self) -> &str {
        &self.module
    }

    /// All collected names in emission order, including the class's own
    /// name unless it is a platform class
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Collected names other than the class's own
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(move |name| *name != self.module)
    }

    /// Whether `name` (dotted) was collected
    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    /// Number of collected names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing was collected
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<'r> IntoIterator for &'r References {
    type Item = &'r str;
    type IntoIter = std::iter::Map<std::slice::Iter<'r, String>, fn(&'r String) -> &'r str>;

    fn into_iter(self) -> Self::IntoIter {
        self.names
            .iter()
            .map(String::as_str as fn(&'r String) -> &'r str)
    }
}

/// Extracts referenced class names from compiled class bytes
///
/// Extraction is a pure function of the bytes and the configured platform
/// prefixes.
#[derive(Debug, Clone)]
pub struct ReferenceExtractor {
    /// Platform prefixes in internal (slash) form
    platform_prefixes: Vec<String>,
}

impl Default for ReferenceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceExtractor {
    /// Extractor that drops names under [`DEFAULT_PLATFORM_PREFIX`]
    pub fn new() -> Self {
        Self::with_platform_prefixes([DEFAULT_PLATFORM_PREFIX])
    }

    /// Extractor with custom platform prefixes, given in dotted form (`"javax."`)
    ///
    /// An empty list keeps every name.
    pub fn with_platform_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            platform_prefixes: prefixes
                .into_iter()
                .map(|prefix| prefix.as_ref().replace('.', "/"))
                .collect(),
        }
    }

    /// Whether an internal name falls under a platform prefix
    pub fn is_platform(&self, internal_name: &str) -> bool {
        self.platform_prefixes
            .iter()
            .any(|prefix| internal_name.starts_with(prefix.as_str()))
    }

    /// Extract the names referenced by one class file
    pub fn extract(&self, bytes: &[u8]) -> Result<References, ClassFormatError> {
        let class = ClassFile::parse(bytes)?;
        let pool = &class.constant_pool;
        let this_name = class.this_class_name()?;

        let mut sink = Sink {
            extractor: self,
            refs: References::new(this_name.replace('/', ".")),
        };
        sink.internal(this_name);

        header(&class, &mut sink)?;

        if let Some(attribute) = class.find_attribute(&class.attributes, "EnclosingMethod")? {
            let owner = parse_body(pool, attribute, |reader| {
                let class_index = reader.read_u16()?;
                let _method_index = reader.read_u16()?;
                Ok(class_index)
            })?;
            sink.object(pool.class_name(owner)?)?;
        }

        annotations(&class, &class.attributes, &mut sink)?;

        if let Some(attribute) = class.find_attribute(&class.attributes, "InnerClasses")? {
            let inner = parse_body(pool, attribute, |reader| {
                let count = reader.read_u16()? as usize;
                let mut inner = Vec::with_capacity(count);
                for _ in 0..count {
                    inner.push(reader.read_u16()?);
                    reader.skip(6)?;
                }
                Ok(inner)
            })?;
            for index in inner {
                sink.object(pool.class_name(index)?)?;
            }
        }

        for field in &class.fields {
            match signature_text(&class, &field.attributes)? {
                Some(sig) => sink.names(signature::type_signature_classes(sig)?),
                None => sink.field_descriptor(pool.utf8(field.descriptor_index)?)?,
            }
            annotations(&class, &field.attributes, &mut sink)?;
        }

        for method in &class.methods {
            self::method(&class, method, &mut sink)?;
        }

        trace!(
            class = %sink.refs.this_module(),
            names = sink.refs.len(),
            "extracted references"
        );
        Ok(sink.refs)
    }
}

/// Filtering collector shared by the region helpers
struct Sink<'e> {
    extractor: &'e ReferenceExtractor,
    refs: References,
}

impl Sink<'_> {
    /// Record an internal class name
    fn internal(&mut self, name: &str) {
        if self.extractor.is_platform(name) {
            return;
        }
        self.refs.insert(name.replace('/', "."));
    }

    /// Record the class behind a `CONSTANT_Class` name (array-aware)
    fn object(&mut self, name: &str) -> Result<(), ClassFormatError> {
        if let Some(class) = descriptor::object_type_class(name)? {
            self.internal(class);
        }
        Ok(())
    }

    fn field_descriptor(&mut self, desc: &str) -> Result<(), ClassFormatError> {
        if let Some(class) = descriptor::field_type_class(desc)? {
            self.internal(class);
        }
        Ok(())
    }

    fn method_descriptor(&mut self, desc: &str) -> Result<(), ClassFormatError> {
        for class in descriptor::method_type_classes(desc)? {
            self.internal(class);
        }
        Ok(())
    }

    fn names(&mut self, names: Vec<String>) {
        for name in names {
            self.internal(&name);
        }
    }
}

/// Interpret an attribute body, requiring the parser to consume all of it
fn parse_body<'a, T>(
    pool: &ConstantPool,
    attribute: &Attribute<'a>,
    parse: impl FnOnce(&mut ClassReader<'a>) -> Result<T, ClassFormatError>,
) -> Result<T, ClassFormatError> {
    let mut reader = ClassReader::new(attribute.info);
    let value = parse(&mut reader)?;
    if reader.has_more() {
        return Err(ClassFormatError::AttributeLength {
            name: attribute.name(pool)?.to_string(),
            declared: attribute.info.len(),
            consumed: reader.position(),
        });
    }
    Ok(value)
}

fn signature_text<'c, 'a>(
    class: &'c ClassFile<'a>,
    attributes: &[Attribute<'a>],
) -> Result<Option<&'c str>, ClassFormatError> {
    let pool = &class.constant_pool;
    match class.find_attribute(attributes, "Signature")? {
        Some(attribute) => {
            let index = parse_body(pool, attribute, |reader| Ok(reader.read_u16()?))?;
            Ok(Some(pool.utf8(index)?))
        }
        None => Ok(None),
    }
}

fn header(class: &ClassFile<'_>, sink: &mut Sink<'_>) -> Result<(), ClassFormatError> {
    let pool = &class.constant_pool;
    if let Some(sig) = signature_text(class, &class.attributes)? {
        sink.names(signature::class_signature_classes(sig)?);
        return Ok(());
    }
    if let Some(super_name) = pool.optional_class_name(class.super_class)? {
        sink.object(super_name)?;
    }
    for interface in &class.interfaces {
        sink.object(pool.class_name(*interface)?)?;
    }
    Ok(())
}

/// Record annotation types from the runtime (in)visible annotation attributes
fn annotations<'a>(
    class: &ClassFile<'a>,
    attributes: &[Attribute<'a>],
    sink: &mut Sink<'_>,
) -> Result<(), ClassFormatError> {
    let pool = &class.constant_pool;
    for name in ["RuntimeVisibleAnnotations", "RuntimeInvisibleAnnotations"] {
        if let Some(attribute) = class.find_attribute(attributes, name)? {
            let types = parse_body(pool, attribute, annotation_table)?;
            for index in types {
                sink.field_descriptor(pool.utf8(index)?)?;
            }
        }
    }
    Ok(())
}

/// Record annotation types from the parameter annotation attributes
fn parameter_annotations<'a>(
    class: &ClassFile<'a>,
    attributes: &[Attribute<'a>],
    sink: &mut Sink<'_>,
) -> Result<(), ClassFormatError> {
    let pool = &class.constant_pool;
    for name in [
        "RuntimeVisibleParameterAnnotations",
        "RuntimeInvisibleParameterAnnotations",
    ] {
        if let Some(attribute) = class.find_attribute(attributes, name)? {
            let types = parse_body(pool, attribute, |reader| {
                let parameters = reader.read_u8()?;
                let mut types = Vec::new();
                for _ in 0..parameters {
                    types.extend(annotation_table(reader)?);
                }
                Ok(types)
            })?;
            for index in types {
                sink.field_descriptor(pool.utf8(index)?)?;
            }
        }
    }
    Ok(())
}

/// Read a u2-counted annotation table, returning the type descriptor indexes
fn annotation_table(reader: &mut ClassReader<'_>) -> Result<Vec<u16>, ClassFormatError> {
    let count = reader.read_u16()? as usize;
    let mut types = Vec::with_capacity(count);
    for _ in 0..count {
        types.push(reader.read_u16()?);
        skip_element_pairs(reader, 0)?;
    }
    Ok(types)
}

fn skip_element_pairs(reader: &mut ClassReader<'_>, depth: usize) -> Result<(), ClassFormatError> {
    let pairs = reader.read_u16()?;
    for _ in 0..pairs {
        reader.skip(2)?;
        skip_element_value(reader, depth)?;
    }
    Ok(())
}

fn skip_element_value(reader: &mut ClassReader<'_>, depth: usize) -> Result<(), ClassFormatError> {
    let offset = reader.position();
    let tag = reader.read_u8()?;
    if depth > MAX_ELEMENT_DEPTH {
        return Err(ClassFormatError::InvalidElementValue {
            tag: tag as char,
            offset,
        });
    }
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => reader.skip(2)?,
        b'e' => reader.skip(4)?,
        b'@' => {
            reader.skip(2)?;
            skip_element_pairs(reader, depth + 1)?;
        }
        b'[' => {
            let values = reader.read_u16()?;
            for _ in 0..values {
                skip_element_value(reader, depth + 1)?;
            }
        }
        _ => {
            return Err(ClassFormatError::InvalidElementValue {
                tag: tag as char,
                offset,
            })
        }
    }
    Ok(())
}

fn method<'a>(
    class: &ClassFile<'a>,
    method: &Member<'a>,
    sink: &mut Sink<'_>,
) -> Result<(), ClassFormatError> {
    let pool = &class.constant_pool;

    match signature_text(class, &method.attributes)? {
        Some(sig) => sink.names(signature::method_signature_classes(sig)?),
        None => sink.method_descriptor(pool.utf8(method.descriptor_index)?)?,
    }

    if let Some(attribute) = class.find_attribute(&method.attributes, "Exceptions")? {
        let exceptions = parse_body(pool, attribute, |reader| {
            let count = reader.read_u16()? as usize;
            let mut exceptions = Vec::with_capacity(count);
            for _ in 0..count {
                exceptions.push(reader.read_u16()?);
            }
            Ok(exceptions)
        })?;
        for index in exceptions {
            sink.object(pool.class_name(index)?)?;
        }
    }

    annotations(class, &method.attributes, sink)?;
    parameter_annotations(class, &method.attributes, sink)?;

    if let Some(attribute) = class.find_attribute(&method.attributes, "Code")? {
        code(class, attribute, sink)?;
    }
    Ok(())
}

fn code<'a>(
    class: &ClassFile<'a>,
    attribute: &Attribute<'a>,
    sink: &mut Sink<'_>,
) -> Result<(), ClassFormatError> {
    let pool = &class.constant_pool;
    let (instructions, attributes) = parse_body(pool, attribute, |reader| {
        let _max_stack = reader.read_u16()?;
        let _max_locals = reader.read_u16()?;
        let length = reader.read_u32()? as usize;
        let instructions = reader.read_bytes(length)?;
        // catch types do not contribute names
        let handlers = reader.read_u16()? as usize;
        reader.skip(handlers * 8)?;
        let attributes = crate::class_file::read_attributes(reader)?;
        Ok((instructions, attributes))
    })?;

    let mut offset = 0;
    while offset < instructions.len() {
        let opcode = instructions[offset];
        let length = opcode::instruction_length(instructions, offset)?;
        let operand = || u16::from_be_bytes([instructions[offset + 1], instructions[offset + 2]]);

        match opcode {
            opcode::NEW
            | opcode::ANEWARRAY
            | opcode::CHECKCAST
            | opcode::INSTANCEOF
            | opcode::MULTIANEWARRAY => sink.object(pool.class_name(operand())?)?,
            opcode::GETSTATIC..=opcode::PUTFIELD => {
                let (owner, desc) = pool.member_ref(operand())?;
                sink.object(owner)?;
                sink.field_descriptor(desc)?;
            }
            opcode::INVOKEVIRTUAL..=opcode::INVOKEINTERFACE => {
                let (owner, desc) = pool.member_ref(operand())?;
                sink.object(owner)?;
                sink.method_descriptor(desc)?;
            }
            opcode::LDC => ldc(pool, instructions[offset + 1] as u16, sink)?,
            opcode::LDC_W => ldc(pool, operand(), sink)?,
            _ => {}
        }
        offset += length;
    }

    local_variables(class, &attributes, sink)
}

/// Only class constants name a type; strings, numbers, method types and
/// handles are ignored
fn ldc(pool: &ConstantPool, index: u16, sink: &mut Sink<'_>) -> Result<(), ClassFormatError> {
    if let Constant::Class { .. } = pool.get(index)? {
        sink.object(pool.class_name(index)?)?;
    }
    Ok(())
}

struct LocalEntry {
    start_pc: u16,
    type_index: u16,
    index: u16,
}

fn local_table(reader: &mut ClassReader<'_>) -> Result<Vec<LocalEntry>, ClassFormatError> {
    let count = reader.read_u16()? as usize;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let start_pc = reader.read_u16()?;
        let _length = reader.read_u16()?;
        let _name_index = reader.read_u16()?;
        let type_index = reader.read_u16()?;
        let index = reader.read_u16()?;
        entries.push(LocalEntry {
            start_pc,
            type_index,
            index,
        });
    }
    Ok(entries)
}

/// A `LocalVariableTypeTable` entry replaces the `LocalVariableTable` entry
/// with the same `(start_pc, index)`
fn local_variables<'a>(
    class: &ClassFile<'a>,
    attributes: &[Attribute<'a>],
    sink: &mut Sink<'_>,
) -> Result<(), ClassFormatError> {
    let pool = &class.constant_pool;
    let Some(table) = class.find_attribute(attributes, "LocalVariableTable")? else {
        return Ok(());
    };
    let locals = parse_body(pool, table, local_table)?;

    let mut signatures = HashMap::new();
    if let Some(attribute) = class.find_attribute(attributes, "LocalVariableTypeTable")? {
        for entry in parse_body(pool, attribute, local_table)? {
            signatures.insert((entry.start_pc, entry.index), entry.type_index);
        }
    }

    for local in locals {
        match signatures.get(&(local.start_pc, local.index)) {
            Some(signature_index) => {
                let sig = pool.utf8(*signature_index)?;
                sink.names(signature::type_signature_classes(sig)?);
            }
            None => sink.field_descriptor(pool.utf8(local.type_index)?)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{ClassWriter, CodeBuilder, CodeSpec, FieldSpec, LocalVariable, MethodSpec};

    fn names(refs: &References) -> Vec<&str> {
        refs.iter().collect()
    }

    #[test]
    fn test_header_order() {
        let mut writer = ClassWriter::new("com/foo/Bar");
        writer.set_super(Some("com/foo/Base"));
        writer.add_interface("com/foo/Api");
        writer.add_interface("java/io/Serializable");

        let refs = ReferenceExtractor::new()
            .extract(&writer.into_bytes())
            .unwrap();
        assert_eq!(names(&refs), vec!["com.foo.Bar", "com.foo.Base", "com.foo.Api"]);
        assert_eq!(refs.this_module(), "com.foo.Bar");
        assert_eq!(
            refs.dependencies().collect::<Vec<_>>(),
            vec!["com.foo.Base", "com.foo.Api"]
        );
    }

    #[test]
    fn test_instruction_operands() {
        let mut writer = ClassWriter::new("com/foo/Bar");
        let created = writer.class("com/foo/Created");
        let array = writer.class("[[Lcom/foo/Cell;");
        let field = writer.field_ref("com/foo/Holder", "value", "Lcom/foo/Value;");
        let call = writer.method_ref("[Lcom/foo/Elem;", "clone", "()Ljava/lang/Object;");
        let literal = writer.class("com/foo/Literal");
        let text = writer.string("com/foo/NotAClass");

        let mut code = CodeBuilder::new();
        code.emit_new(created);
        code.emit_op(opcode::POP);
        code.emit_multianewarray(array, 2);
        code.emit_op(opcode::POP);
        code.emit_field_insn(opcode::GETSTATIC, field);
        code.emit_op(opcode::POP);
        code.emit_invoke(opcode::INVOKEVIRTUAL, call);
        code.emit_op(opcode::POP);
        code.emit_ldc(literal);
        code.emit_ldc(text);
        code.emit_return();
        writer.add_method(
            MethodSpec::new("run", "()V").with_code(CodeSpec::new(code.into_bytes())),
        );

        let refs = ReferenceExtractor::new()
            .extract(&writer.into_bytes())
            .unwrap();
        assert_eq!(
            names(&refs),
            vec![
                "com.foo.Bar",
                "com.foo.Created",
                "com.foo.Cell",
                "com.foo.Holder",
                "com.foo.Value",
                "com.foo.Elem",
                "com.foo.Literal",
            ]
        );
    }

    #[test]
    fn test_local_variable_signature_supersedes_descriptor() {
        let mut writer = ClassWriter::new("com/foo/Bar");
        let mut code = CodeBuilder::new();
        code.emit_return();
        writer.add_method(
            MethodSpec::new("run", "()V").with_code(
                CodeSpec::new(code.into_bytes())
                    .with_local(LocalVariable::new(0, "plain", "Lcom/foo/Plain;"))
                    .with_local(
                        LocalVariable::new(1, "typed", "Lcom/foo/Raw;")
                            .with_signature("Lcom/foo/Box<Lcom/foo/Item;>;"),
                    ),
            ),
        );

        let refs = ReferenceExtractor::new()
            .extract(&writer.into_bytes())
            .unwrap();
        assert!(refs.contains("com.foo.Plain"));
        assert!(refs.contains("com.foo.Box"));
        assert!(refs.contains("com.foo.Item"));
        assert!(!refs.contains("com.foo.Raw"));
    }

    #[test]
    fn test_custom_platform_prefixes() {
        let mut writer = ClassWriter::new("com/foo/Bar");
        writer.add_field(FieldSpec::new("a", "Ljavax/inject/Provider;"));
        writer.add_field(FieldSpec::new("b", "Ljava/util/List;"));
        let bytes = writer.into_bytes();

        let default = ReferenceExtractor::new().extract(&bytes).unwrap();
        assert_eq!(names(&default), vec!["com.foo.Bar", "javax.inject.Provider"]);

        let custom = ReferenceExtractor::with_platform_prefixes(["java.", "javax."])
            .extract(&bytes)
            .unwrap();
        assert_eq!(names(&custom), vec!["com.foo.Bar"]);

        let none = ReferenceExtractor::with_platform_prefixes(Vec::<String>::new())
            .extract(&bytes)
            .unwrap();
        assert!(none.contains("java.lang.Object"));
        assert!(none.contains("java.util.List"));
    }

    #[test]
    fn test_bad_code_opcode() {
        let mut writer = ClassWriter::new("com/foo/Bar");
        writer.add_method(MethodSpec::new("run", "()V").with_code(CodeSpec::new(vec![0xCB])));
        assert!(matches!(
            ReferenceExtractor::new().extract(&writer.into_bytes()),
            Err(ClassFormatError::InvalidOpcode { opcode: 0xCB, .. })
        ));
    }

    #[test]
    fn test_unknown_element_tag() {
        let mut reader = ClassReader::new(&[b'Q', 0, 0]);
        assert!(matches!(
            skip_element_value(&mut reader, 0),
            Err(ClassFormatError::InvalidElementValue { tag: 'Q', offset: 0 })
        ));
    }
}
