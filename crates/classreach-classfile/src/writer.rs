//! Class-file assembly
//!
//! [`ClassWriter`] produces structurally valid class files from a small
//! declarative description. It is what the test suites use to build fixtures
//! without shipping compiled binaries; nothing here verifies that the
//! resulting bytecode would pass the JVM verifier.

use crate::class_file::CLASS_MAGIC;
use crate::constant_pool::tags;
use crate::opcode;
use std::collections::HashMap;

/// Class file version written by default (Java 8)
pub const DEFAULT_MAJOR_VERSION: u16 = 52;

const ACC_PUBLIC: u16 = 0x0001;
const ACC_SUPER: u16 = 0x0020;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Utf8(String),
    Integer(i32),
    Long(i64),
    Class(u16),
    String(u16),
    MemberRef(u8, u16, u16),
    NameAndType(u16, u16),
    MethodType(u16),
}

/// Interning constant pool builder
#[derive(Debug, Default)]
struct PoolWriter {
    buffer: Vec<u8>,
    next_index: u16,
    interned: HashMap<PoolKey, u16>,
}

impl PoolWriter {
    fn new() -> Self {
        Self {
            next_index: 1,
            ..Self::default()
        }
    }

    fn intern(&mut self, key: PoolKey) -> u16 {
        if let Some(index) = self.interned.get(&key) {
            return *index;
        }
        let index = self.next_index;
        let slots = match &key {
            PoolKey::Utf8(text) => {
                self.buffer.push(tags::UTF8);
                self.buffer
                    .extend_from_slice(&(text.len() as u16).to_be_bytes());
                self.buffer.extend_from_slice(text.as_bytes());
                1
            }
            PoolKey::Integer(value) => {
                self.buffer.push(tags::INTEGER);
                self.buffer.extend_from_slice(&value.to_be_bytes());
                1
            }
            PoolKey::Long(value) => {
                self.buffer.push(tags::LONG);
                self.buffer.extend_from_slice(&value.to_be_bytes());
                2
            }
            PoolKey::Class(name) => {
                self.buffer.push(tags::CLASS);
                self.buffer.extend_from_slice(&name.to_be_bytes());
                1
            }
            PoolKey::String(text) => {
                self.buffer.push(tags::STRING);
                self.buffer.extend_from_slice(&text.to_be_bytes());
                1
            }
            PoolKey::MemberRef(tag, class, name_and_type) => {
                self.buffer.push(*tag);
                self.buffer.extend_from_slice(&class.to_be_bytes());
                self.buffer.extend_from_slice(&name_and_type.to_be_bytes());
                1
            }
            PoolKey::NameAndType(name, descriptor) => {
                self.buffer.push(tags::NAME_AND_TYPE);
                self.buffer.extend_from_slice(&name.to_be_bytes());
                self.buffer.extend_from_slice(&descriptor.to_be_bytes());
                1
            }
            PoolKey::MethodType(descriptor) => {
                self.buffer.push(tags::METHOD_TYPE);
                self.buffer.extend_from_slice(&descriptor.to_be_bytes());
                1
            }
        };
        self.next_index += slots;
        self.interned.insert(key, index);
        index
    }
}

/// Element value of an annotation pair
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    /// `int` constant
    Int(i32),
    /// String constant
    String(String),
    /// Enum constant given by type descriptor and constant name
    Enum {
        /// Field descriptor of the enum type
        type_descriptor: String,
        /// Constant name
        constant: String,
    },
    /// Class literal, as a return descriptor (`Lcom/foo/Bar;`, `V`)
    Class(String),
    /// Nested annotation
    Annotation(AnnotationSpec),
    /// Array of values
    Array(Vec<ElementValue>),
}

/// An annotation to attach to a class, field, method or parameter
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSpec {
    /// Field descriptor of the annotation type
    pub descriptor: String,
    /// Retained at runtime (`RuntimeVisible*`) or class-only (`RuntimeInvisible*`)
    pub visible: bool,
    /// Element-value pairs
    pub values: Vec<(String, ElementValue)>,
}

impl AnnotationSpec {
    /// Runtime-visible annotation
    pub fn visible(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            visible: true,
            values: Vec::new(),
        }
    }

    /// Class-retention annotation
    pub fn invisible(descriptor: impl Into<String>) -> Self {
        Self {
            visible: false,
            ..Self::visible(descriptor)
        }
    }

    /// Add an element-value pair
    pub fn with_value(mut self, name: impl Into<String>, value: ElementValue) -> Self {
        self.values.push((name.into(), value));
        self
    }
}

/// Field declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Raw descriptor
    pub descriptor: String,
    /// Generic signature
    pub signature: Option<String>,
    /// Field annotations
    pub annotations: Vec<AnnotationSpec>,
}

impl FieldSpec {
    /// Field with a name and descriptor
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            annotations: Vec::new(),
        }
    }

    /// Attach a generic signature
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Attach an annotation
    pub fn with_annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Local variable table entry
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariable {
    /// First instruction offset where the variable is live
    pub start_pc: u16,
    /// Length of the live range; 0 means "to the end of the code"
    pub length: u16,
    /// Variable name
    pub name: String,
    /// Raw descriptor
    pub descriptor: String,
    /// Generic signature, written to `LocalVariableTypeTable`
    pub signature: Option<String>,
    /// Local slot
    pub index: u16,
}

impl LocalVariable {
    /// Variable live across the whole method body
    pub fn new(index: u16, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            start_pc: 0,
            length: 0,
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            index,
        }
    }

    /// Attach a generic signature
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

/// Method body
#[derive(Debug, Clone, PartialEq)]
pub struct CodeSpec {
    /// Operand stack size
    pub max_stack: u16,
    /// Local slot count
    pub max_locals: u16,
    /// Instruction bytes
    pub code: Vec<u8>,
    /// Local variable debug entries
    pub local_variables: Vec<LocalVariable>,
}

impl CodeSpec {
    /// Body from raw instruction bytes
    pub fn new(code: Vec<u8>) -> Self {
        Self {
            max_stack: 8,
            max_locals: 8,
            code,
            local_variables: Vec::new(),
        }
    }

    /// Add a local variable entry
    pub fn with_local(mut self, local: LocalVariable) -> Self {
        self.local_variables.push(local);
        self
    }
}

/// Method declaration
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSpec {
    /// Method name
    pub name: String,
    /// Raw descriptor
    pub descriptor: String,
    /// Generic signature
    pub signature: Option<String>,
    /// Declared exceptions, as internal names
    pub exceptions: Vec<String>,
    /// Method annotations
    pub annotations: Vec<AnnotationSpec>,
    /// Per-parameter annotations
    pub parameter_annotations: Vec<Vec<AnnotationSpec>>,
    /// Method body; `None` for abstract and native methods
    pub code: Option<CodeSpec>,
}

impl MethodSpec {
    /// Method with a name and descriptor
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            exceptions: Vec::new(),
            annotations: Vec::new(),
            parameter_annotations: Vec::new(),
            code: None,
        }
    }

    /// Attach a generic signature
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Declare a thrown exception
    pub fn with_exception(mut self, internal_name: impl Into<String>) -> Self {
        self.exceptions.push(internal_name.into());
        self
    }

    /// Attach an annotation
    pub fn with_annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Attach per-parameter annotations
    pub fn with_parameter_annotations(mut self, annotations: Vec<Vec<AnnotationSpec>>) -> Self {
        self.parameter_annotations = annotations;
        self
    }

    /// Attach a body
    pub fn with_code(mut self, code: CodeSpec) -> Self {
        self.code = Some(code);
        self
    }
}

struct InnerClassEntry {
    inner: u16,
    outer: u16,
    simple_name: u16,
}

/// Class-file writer
///
/// Constant pool entries are interned: asking for the same class, string or
/// member reference twice yields the same index. Indexes obtained from the
/// writer are what [`CodeBuilder`] instructions take as operands.
pub struct ClassWriter {
    pool: PoolWriter,
    major_version: u16,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    signature: Option<String>,
    annotations: Vec<AnnotationSpec>,
    inner_classes: Vec<InnerClassEntry>,
    enclosing_method: Option<(u16, u16)>,
}

impl ClassWriter {
    /// Public class `internal_name` extending `java/lang/Object`
    pub fn new(internal_name: &str) -> Self {
        let mut pool = PoolWriter::new();
        let name_index = pool.intern(PoolKey::Utf8(internal_name.to_string()));
        let this_class = pool.intern(PoolKey::Class(name_index));
        let object_index = pool.intern(PoolKey::Utf8("java/lang/Object".to_string()));
        let super_class = pool.intern(PoolKey::Class(object_index));

        Self {
            pool,
            major_version: DEFAULT_MAJOR_VERSION,
            access_flags: ACC_PUBLIC | ACC_SUPER,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            signature: None,
            annotations: Vec::new(),
            inner_classes: Vec::new(),
            enclosing_method: None,
        }
    }

    // ===== Constant pool =====

    /// Intern a `CONSTANT_Utf8`
    pub fn utf8(&mut self, text: &str) -> u16 {
        self.pool.intern(PoolKey::Utf8(text.to_string()))
    }

    /// Intern a `CONSTANT_Class` for an internal name or array descriptor
    pub fn class(&mut self, internal_name: &str) -> u16 {
        let name = self.utf8(internal_name);
        self.pool.intern(PoolKey::Class(name))
    }

    /// Intern a `CONSTANT_String`
    pub fn string(&mut self, text: &str) -> u16 {
        let text = self.utf8(text);
        self.pool.intern(PoolKey::String(text))
    }

    /// Intern a `CONSTANT_Integer`
    pub fn integer(&mut self, value: i32) -> u16 {
        self.pool.intern(PoolKey::Integer(value))
    }

    /// Intern a `CONSTANT_Long` (two slots)
    pub fn long(&mut self, value: i64) -> u16 {
        self.pool.intern(PoolKey::Long(value))
    }

    /// Intern a `CONSTANT_MethodType`
    pub fn method_type(&mut self, descriptor: &str) -> u16 {
        let descriptor = self.utf8(descriptor);
        self.pool.intern(PoolKey::MethodType(descriptor))
    }

    /// Intern a `CONSTANT_Fieldref`
    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(tags::FIELD_REF, owner, name, descriptor)
    }

    /// Intern a `CONSTANT_Methodref`
    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(tags::METHOD_REF, owner, name, descriptor)
    }

    /// Intern a `CONSTANT_InterfaceMethodref`
    pub fn interface_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(tags::INTERFACE_METHOD_REF, owner, name, descriptor)
    }

    fn member_ref(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(owner);
        let name_and_type = self.name_and_type(name, descriptor);
        self.pool.intern(PoolKey::MemberRef(tag, class, name_and_type))
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.pool.intern(PoolKey::NameAndType(name, descriptor))
    }

    // ===== Declarations =====

    /// Override the access flags
    pub fn set_access_flags(&mut self, flags: u16) {
        self.access_flags = flags;
    }

    /// Replace the superclass; `None` writes index 0 as `java/lang/Object` itself does
    pub fn set_super(&mut self, internal_name: Option<&str>) {
        self.super_class = match internal_name {
            Some(name) => self.class(name),
            None => 0,
        };
    }

    /// Add a directly implemented interface
    pub fn add_interface(&mut self, internal_name: &str) {
        let index = self.class(internal_name);
        self.interfaces.push(index);
    }

    /// Attach a class `Signature` attribute
    pub fn set_signature(&mut self, signature: &str) {
        self.signature = Some(signature.to_string());
    }

    /// Attach a class-level annotation
    pub fn add_annotation(&mut self, annotation: AnnotationSpec) {
        self.annotations.push(annotation);
    }

    /// Add an `InnerClasses` entry
    pub fn add_inner_class(&mut self, inner: &str, outer: Option<&str>, simple_name: Option<&str>) {
        let inner = self.class(inner);
        let outer = outer.map(|name| self.class(name)).unwrap_or(0);
        let simple_name = simple_name.map(|name| self.utf8(name)).unwrap_or(0);
        self.inner_classes.push(InnerClassEntry {
            inner,
            outer,
            simple_name,
        });
    }

    /// Add an `EnclosingMethod` attribute
    pub fn set_enclosing_method(&mut self, owner: &str, method: Option<(&str, &str)>) {
        let class = self.class(owner);
        let method = method
            .map(|(name, descriptor)| self.name_and_type(name, descriptor))
            .unwrap_or(0);
        self.enclosing_method = Some((class, method));
    }

    /// Add a field
    pub fn add_field(&mut self, field: FieldSpec) {
        self.fields.push(field);
    }

    /// Add a method
    pub fn add_method(&mut self, method: MethodSpec) {
        self.methods.push(method);
    }

    /// Encode the class file
    pub fn into_bytes(mut self) -> Vec<u8> {
        let mut body = Vec::new();
        push_u16(&mut body, self.access_flags);
        push_u16(&mut body, self.this_class);
        push_u16(&mut body, self.super_class);
        push_u16(&mut body, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            push_u16(&mut body, *interface);
        }

        let fields = std::mem::take(&mut self.fields);
        push_u16(&mut body, fields.len() as u16);
        for field in &fields {
            self.encode_field(&mut body, field);
        }

        let methods = std::mem::take(&mut self.methods);
        push_u16(&mut body, methods.len() as u16);
        for method in &methods {
            self.encode_method(&mut body, method);
        }

        self.encode_class_attributes(&mut body);

        let mut out = Vec::with_capacity(10 + self.pool.buffer.len() + body.len());
        out.extend_from_slice(&CLASS_MAGIC.to_be_bytes());
        push_u16(&mut out, 0);
        push_u16(&mut out, self.major_version);
        push_u16(&mut out, self.pool.next_index);
        out.extend_from_slice(&self.pool.buffer);
        out.extend_from_slice(&body);
        out
    }

    fn encode_field(&mut self, body: &mut Vec<u8>, field: &FieldSpec) {
        let mut attributes = Vec::new();
        if let Some(signature) = &field.signature {
            let index = self.utf8(signature);
            attributes.push(("Signature", index.to_be_bytes().to_vec()));
        }
        self.annotation_attributes(&mut attributes, &field.annotations);

        push_u16(body, ACC_PUBLIC);
        let name = self.utf8(&field.name);
        let descriptor = self.utf8(&field.descriptor);
        push_u16(body, name);
        push_u16(body, descriptor);
        self.write_attributes(body, attributes);
    }

    fn encode_method(&mut self, body: &mut Vec<u8>, method: &MethodSpec) {
        let mut attributes = Vec::new();

        if let Some(code) = &method.code {
            let info = self.encode_code(code);
            attributes.push(("Code", info));
        }
        if !method.exceptions.is_empty() {
            let mut info = Vec::new();
            push_u16(&mut info, method.exceptions.len() as u16);
            for exception in &method.exceptions {
                let index = self.class(exception);
                push_u16(&mut info, index);
            }
            attributes.push(("Exceptions", info));
        }
        if let Some(signature) = &method.signature {
            let index = self.utf8(signature);
            attributes.push(("Signature", index.to_be_bytes().to_vec()));
        }
        self.annotation_attributes(&mut attributes, &method.annotations);

        for (visible, name) in [
            (true, "RuntimeVisibleParameterAnnotations"),
            (false, "RuntimeInvisibleParameterAnnotations"),
        ] {
            let any = method
                .parameter_annotations
                .iter()
                .flatten()
                .any(|annotation| annotation.visible == visible);
            if !any {
                continue;
            }
            let mut info = vec![method.parameter_annotations.len() as u8];
            for parameter in &method.parameter_annotations {
                let selected: Vec<&AnnotationSpec> = parameter
                    .iter()
                    .filter(|annotation| annotation.visible == visible)
                    .collect();
                push_u16(&mut info, selected.len() as u16);
                for annotation in selected {
                    self.encode_annotation(&mut info, annotation);
                }
            }
            attributes.push((name, info));
        }

        push_u16(body, ACC_PUBLIC);
        let name = self.utf8(&method.name);
        let descriptor = self.utf8(&method.descriptor);
        push_u16(body, name);
        push_u16(body, descriptor);
        self.write_attributes(body, attributes);
    }

    fn encode_code(&mut self, code: &CodeSpec) -> Vec<u8> {
        let mut info = Vec::new();
        push_u16(&mut info, code.max_stack);
        push_u16(&mut info, code.max_locals);
        info.extend_from_slice(&(code.code.len() as u32).to_be_bytes());
        info.extend_from_slice(&code.code);
        push_u16(&mut info, 0); // exception table

        let mut attributes = Vec::new();
        if !code.local_variables.is_empty() {
            let full_length = code.code.len() as u16;
            let mut table = Vec::new();
            let mut type_table = Vec::new();
            let mut typed = 0u16;
            push_u16(&mut table, code.local_variables.len() as u16);
            for local in &code.local_variables {
                let length = if local.length == 0 {
                    full_length
                } else {
                    local.length
                };
                let name = self.utf8(&local.name);
                let descriptor = self.utf8(&local.descriptor);
                for value in [local.start_pc, length, name, descriptor, local.index] {
                    push_u16(&mut table, value);
                }
                if let Some(signature) = &local.signature {
                    let signature = self.utf8(signature);
                    for value in [local.start_pc, length, name, signature, local.index] {
                        push_u16(&mut type_table, value);
                    }
                    typed += 1;
                }
            }
            attributes.push(("LocalVariableTable", table));
            if typed > 0 {
                let mut info = typed.to_be_bytes().to_vec();
                info.extend_from_slice(&type_table);
                attributes.push(("LocalVariableTypeTable", info));
            }
        }
        self.write_attributes(&mut info, attributes);
        info
    }

    fn encode_class_attributes(&mut self, body: &mut Vec<u8>) {
        let mut attributes = Vec::new();
        if let Some(signature) = self.signature.take() {
            let index = self.utf8(&signature);
            attributes.push(("Signature", index.to_be_bytes().to_vec()));
        }
        let annotations = std::mem::take(&mut self.annotations);
        self.annotation_attributes(&mut attributes, &annotations);

        if !self.inner_classes.is_empty() {
            let mut info = Vec::new();
            push_u16(&mut info, self.inner_classes.len() as u16);
            for entry in &self.inner_classes {
                for value in [entry.inner, entry.outer, entry.simple_name, ACC_PUBLIC] {
                    push_u16(&mut info, value);
                }
            }
            attributes.push(("InnerClasses", info));
        }
        if let Some((class, method)) = self.enclosing_method {
            let mut info = Vec::new();
            push_u16(&mut info, class);
            push_u16(&mut info, method);
            attributes.push(("EnclosingMethod", info));
        }
        self.write_attributes(body, attributes);
    }

    fn annotation_attributes(
        &mut self,
        attributes: &mut Vec<(&'static str, Vec<u8>)>,
        annotations: &[AnnotationSpec],
    ) {
        for (visible, name) in [
            (true, "RuntimeVisibleAnnotations"),
            (false, "RuntimeInvisibleAnnotations"),
        ] {
            let selected: Vec<&AnnotationSpec> = annotations
                .iter()
                .filter(|annotation| annotation.visible == visible)
                .collect();
            if selected.is_empty() {
                continue;
            }
            let mut info = Vec::new();
            push_u16(&mut info, selected.len() as u16);
            for annotation in selected {
                self.encode_annotation(&mut info, annotation);
            }
            attributes.push((name, info));
        }
    }

    fn encode_annotation(&mut self, out: &mut Vec<u8>, annotation: &AnnotationSpec) {
        let type_index = self.utf8(&annotation.descriptor);
        push_u16(out, type_index);
        push_u16(out, annotation.values.len() as u16);
        for (name, value) in &annotation.values {
            let name = self.utf8(name);
            push_u16(out, name);
            self.encode_element_value(out, value);
        }
    }

    fn encode_element_value(&mut self, out: &mut Vec<u8>, value: &ElementValue) {
        match value {
            ElementValue::Int(value) => {
                out.push(b'I');
                let index = self.integer(*value);
                push_u16(out, index);
            }
            ElementValue::String(text) => {
                out.push(b's');
                let index = self.utf8(text);
                push_u16(out, index);
            }
            ElementValue::Enum {
                type_descriptor,
                constant,
            } => {
                out.push(b'e');
                let type_index = self.utf8(type_descriptor);
                let constant_index = self.utf8(constant);
                push_u16(out, type_index);
                push_u16(out, constant_index);
            }
            ElementValue::Class(descriptor) => {
                out.push(b'c');
                let index = self.utf8(descriptor);
                push_u16(out, index);
            }
            ElementValue::Annotation(annotation) => {
                out.push(b'@');
                self.encode_annotation(out, annotation);
            }
            ElementValue::Array(values) => {
                out.push(b'[');
                push_u16(out, values.len() as u16);
                for value in values {
                    self.encode_element_value(out, value);
                }
            }
        }
    }

    fn write_attributes(&mut self, out: &mut Vec<u8>, attributes: Vec<(&'static str, Vec<u8>)>) {
        push_u16(out, attributes.len() as u16);
        for (name, info) in attributes {
            let name = self.utf8(name);
            push_u16(out, name);
            out.extend_from_slice(&(info.len() as u32).to_be_bytes());
            out.extend_from_slice(&info);
        }
    }
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Instruction assembler for method bodies
///
/// Operands that refer to the constant pool are indexes obtained from the
/// owning [`ClassWriter`].
#[derive(Debug, Default)]
pub struct CodeBuilder {
    buffer: Vec<u8>,
}

impl CodeBuilder {
    /// Create an empty body
    pub fn new() -> Self {
        Self::default()
    }

    /// Current offset (length of the body so far)
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    /// Consume the builder and return the instruction bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    // ===== Basic Emission =====

    /// Emit a raw byte
    pub fn emit_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Emit a big-endian u16
    pub fn emit_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Emit a big-endian i32
    pub fn emit_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    // ===== Type Instructions =====

    /// Emit `new`
    pub fn emit_new(&mut self, class_index: u16) {
        self.emit_u8(opcode::NEW);
        self.emit_u16(class_index);
    }

    /// Emit `anewarray`
    pub fn emit_anewarray(&mut self, class_index: u16) {
        self.emit_u8(opcode::ANEWARRAY);
        self.emit_u16(class_index);
    }

    /// Emit `checkcast`
    pub fn emit_checkcast(&mut self, class_index: u16) {
        self.emit_u8(opcode::CHECKCAST);
        self.emit_u16(class_index);
    }

    /// Emit `instanceof`
    pub fn emit_instanceof(&mut self, class_index: u16) {
        self.emit_u8(opcode::INSTANCEOF);
        self.emit_u16(class_index);
    }

    /// Emit `multianewarray`
    pub fn emit_multianewarray(&mut self, class_index: u16, dimensions: u8) {
        self.emit_u8(opcode::MULTIANEWARRAY);
        self.emit_u16(class_index);
        self.emit_u8(dimensions);
    }

    // ===== Member Access =====

    /// Emit `getstatic`, `putstatic`, `getfield` or `putfield`
    pub fn emit_field_insn(&mut self, opcode: u8, field_ref: u16) {
        self.emit_u8(opcode);
        self.emit_u16(field_ref);
    }

    /// Emit `invokevirtual`, `invokespecial` or `invokestatic`
    pub fn emit_invoke(&mut self, opcode: u8, method_ref: u16) {
        self.emit_u8(opcode);
        self.emit_u16(method_ref);
    }

    /// Emit `invokeinterface`
    pub fn emit_invokeinterface(&mut self, method_ref: u16, arg_slots: u8) {
        self.emit_u8(opcode::INVOKEINTERFACE);
        self.emit_u16(method_ref);
        self.emit_u8(arg_slots);
        self.emit_u8(0);
    }

    /// Emit `invokedynamic`
    pub fn emit_invokedynamic(&mut self, call_site: u16) {
        self.emit_u8(opcode::INVOKEDYNAMIC);
        self.emit_u16(call_site);
        self.emit_u16(0);
    }

    // ===== Constants & Locals =====

    /// Emit `ldc`, or `ldc_w` when the index does not fit a byte
    pub fn emit_ldc(&mut self, index: u16) {
        if index <= u8::MAX as u16 {
            self.emit_u8(opcode::LDC);
            self.emit_u8(index as u8);
        } else {
            self.emit_u8(opcode::LDC_W);
            self.emit_u16(index);
        }
    }

    /// Emit `ldc_w` regardless of the index
    pub fn emit_ldc_w(&mut self, index: u16) {
        self.emit_u8(opcode::LDC_W);
        self.emit_u16(index);
    }

    /// Emit `aload`
    pub fn emit_aload(&mut self, slot: u8) {
        self.emit_u8(opcode::ALOAD);
        self.emit_u8(slot);
    }

    /// Emit `astore`
    pub fn emit_astore(&mut self, slot: u8) {
        self.emit_u8(opcode::ASTORE);
        self.emit_u8(slot);
    }

    /// Emit `wide iinc`
    pub fn emit_wide_iinc(&mut self, slot: u16, delta: i16) {
        self.emit_u8(opcode::WIDE);
        self.emit_u8(opcode::IINC);
        self.emit_u16(slot);
        self.buffer.extend_from_slice(&delta.to_be_bytes());
    }

    // ===== Control Flow =====

    /// Emit `tableswitch`, padding operands to a 4-byte boundary
    pub fn emit_tableswitch(&mut self, default: i32, low: i32, targets: &[i32]) {
        self.emit_u8(opcode::TABLESWITCH);
        self.pad_to_word();
        self.emit_i32(default);
        self.emit_i32(low);
        self.emit_i32(low + targets.len() as i32 - 1);
        for target in targets {
            self.emit_i32(*target);
        }
    }

    /// Emit `lookupswitch`, padding operands to a 4-byte boundary
    pub fn emit_lookupswitch(&mut self, default: i32, pairs: &[(i32, i32)]) {
        self.emit_u8(opcode::LOOKUPSWITCH);
        self.pad_to_word();
        self.emit_i32(default);
        self.emit_i32(pairs.len() as i32);
        for (key, target) in pairs {
            self.emit_i32(*key);
            self.emit_i32(*target);
        }
    }

    /// Emit an opcode without operands (`return`, `areturn`, `pop`, ...)
    pub fn emit_op(&mut self, opcode: u8) {
        self.emit_u8(opcode);
    }

    /// Emit `return`
    pub fn emit_return(&mut self) {
        self.emit_u8(opcode::RETURN);
    }

    fn pad_to_word(&mut self) {
        while self.buffer.len() % 4 != 0 {
            self.buffer.push(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_file::ClassFile;

    #[test]
    fn test_pool_interning() {
        let mut writer = ClassWriter::new("com/foo/Bar");
        let first = writer.class("com/foo/Baz");
        let second = writer.class("com/foo/Baz");
        assert_eq!(first, second);
        // this class and its super are interned at construction
        assert_eq!(writer.class("com/foo/Bar"), 2);
    }

    #[test]
    fn test_long_takes_two_slots() {
        let mut writer = ClassWriter::new("com/foo/Bar");
        let long = writer.long(7);
        let next = writer.utf8("after");
        assert_eq!(next, long + 2);

        let bytes = writer.into_bytes();
        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.constant_pool.utf8(next).unwrap(), "after");
    }

    #[test]
    fn test_switch_padding_is_relative_to_body_start() {
        let mut code = CodeBuilder::new();
        code.emit_u8(opcode::NOP);
        code.emit_tableswitch(0, 0, &[0, 0]);
        let bytes = code.into_bytes();
        // NOP, TABLESWITCH, two padding bytes, then default/low/high/targets
        assert_eq!(bytes.len(), 4 + 12 + 8);
        assert_eq!(opcode::instruction_length(&bytes, 1).unwrap(), 23);
    }

    #[test]
    fn test_ldc_picks_wide_form() {
        let mut code = CodeBuilder::new();
        code.emit_ldc(3);
        code.emit_ldc(300);
        assert_eq!(
            code.into_bytes(),
            vec![opcode::LDC, 3, opcode::LDC_W, 0x01, 0x2C]
        );
    }
}
