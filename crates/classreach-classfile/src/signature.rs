//! Generic signature grammar
//!
//! A recursive-descent parser over the `Signature` attribute grammar of the
//! class-file format. It yields every class name mentioned at any nesting
//! depth, in textual order, as internal names. Type variables and unbounded
//! wildcards name nothing.
//!
//! ```text
//! ClassSignature     := TypeParameters? ClassTypeSig ClassTypeSig*
//! MethodSignature    := TypeParameters? '(' JavaTypeSig* ')' (JavaTypeSig | 'V') Throws*
//! TypeParameters     := '<' (Ident ':' RefTypeSig? (':' RefTypeSig)*)+ '>'
//! RefTypeSig         := ClassTypeSig | 'T' Ident ';' | '[' JavaTypeSig
//! ClassTypeSig       := 'L' Name TypeArgs? ('.' Ident TypeArgs?)* ';'
//! TypeArgs           := '<' ('*' | ('+' | '-')? RefTypeSig)+ '>'
//! Throws             := '^' (ClassTypeSig | 'T' Ident ';')
//! ```
//!
//! A `.Inner` suffix names the nested class `Outer$Inner`; the enclosing
//! binary name is passed down so deeper suffixes chain correctly.

use crate::error::ClassFormatError;

/// Nesting beyond this is treated as malformed rather than risking the stack
const MAX_DEPTH: usize = 256;

/// Classes named by a class `Signature` attribute
pub fn class_signature_classes(signature: &str) -> Result<Vec<String>, ClassFormatError> {
    let mut parser = SignatureParser::new(signature);
    parser.class_signature()?;
    parser.finish()
}

/// Classes named by a method `Signature` attribute
pub fn method_signature_classes(signature: &str) -> Result<Vec<String>, ClassFormatError> {
    let mut parser = SignatureParser::new(signature);
    parser.method_signature()?;
    parser.finish()
}

/// Classes named by a field or local variable `Signature` attribute
pub fn type_signature_classes(signature: &str) -> Result<Vec<String>, ClassFormatError> {
    let mut parser = SignatureParser::new(signature);
    parser.java_type_signature(0)?;
    parser.finish()
}

struct SignatureParser<'a> {
    signature: &'a str,
    bytes: &'a [u8],
    position: usize,
    classes: Vec<String>,
}

impl<'a> SignatureParser<'a> {
    fn new(signature: &'a str) -> Self {
        Self {
            signature,
            bytes: signature.as_bytes(),
            position: 0,
            classes: Vec::new(),
        }
    }

    fn finish(self) -> Result<Vec<String>, ClassFormatError> {
        if self.position != self.bytes.len() {
            return Err(self.error());
        }
        Ok(self.classes)
    }

    fn error(&self) -> ClassFormatError {
        ClassFormatError::InvalidSignature {
            signature: self.signature.to_string(),
            position: self.position,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), ClassFormatError> {
        if self.peek() != Some(byte) {
            return Err(self.error());
        }
        self.position += 1;
        Ok(())
    }

    /// Read a non-empty run up to (not including) any of `stops`
    fn identifier(&mut self, stops: &[u8]) -> Result<&'a str, ClassFormatError> {
        let start = self.position;
        while let Some(byte) = self.peek() {
            if stops.contains(&byte) {
                break;
            }
            self.position += 1;
        }
        if self.position == start || self.peek().is_none() {
            return Err(self.error());
        }
        Ok(&self.signature[start..self.position])
    }

    fn class_signature(&mut self) -> Result<(), ClassFormatError> {
        if self.peek() == Some(b'<') {
            self.type_parameters()?;
        }
        self.class_type_signature(0)?;
        while self.peek().is_some() {
            self.class_type_signature(0)?;
        }
        Ok(())
    }

    fn method_signature(&mut self) -> Result<(), ClassFormatError> {
        if self.peek() == Some(b'<') {
            self.type_parameters()?;
        }
        self.expect(b'(')?;
        while self.peek() != Some(b')') {
            self.java_type_signature(0)?;
        }
        self.expect(b')')?;

        if self.peek() == Some(b'V') {
            self.position += 1;
        } else {
            self.java_type_signature(0)?;
        }

        while self.peek() == Some(b'^') {
            self.position += 1;
            match self.peek() {
                Some(b'L') => self.class_type_signature(0)?,
                Some(b'T') => self.type_variable()?,
                _ => return Err(self.error()),
            }
        }
        Ok(())
    }

    fn type_parameters(&mut self) -> Result<(), ClassFormatError> {
        self.expect(b'<')?;
        loop {
            self.identifier(b":>;")?;
            self.expect(b':')?;
            // The class bound may be empty when only interface bounds follow
            if matches!(self.peek(), Some(b'L' | b'T' | b'[')) {
                self.reference_type_signature(0)?;
            }
            while self.peek() == Some(b':') {
                self.position += 1;
                self.reference_type_signature(0)?;
            }
            if self.peek() == Some(b'>') {
                break;
            }
        }
        self.expect(b'>')
    }

    fn java_type_signature(&mut self, depth: usize) -> Result<(), ClassFormatError> {
        match self.peek() {
            Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => {
                self.position += 1;
                Ok(())
            }
            _ => self.reference_type_signature(depth),
        }
    }

    fn reference_type_signature(&mut self, depth: usize) -> Result<(), ClassFormatError> {
        if depth > MAX_DEPTH {
            return Err(self.error());
        }
        match self.peek() {
            Some(b'L') => self.class_type_signature(depth),
            Some(b'T') => self.type_variable(),
            Some(b'[') => {
                while self.peek() == Some(b'[') {
                    self.position += 1;
                }
                self.java_type_signature(depth + 1)
            }
            _ => Err(self.error()),
        }
    }

    fn type_variable(&mut self) -> Result<(), ClassFormatError> {
        self.expect(b'T')?;
        self.identifier(b";<>.:")?;
        self.expect(b';')
    }

    fn class_type_signature(&mut self, depth: usize) -> Result<(), ClassFormatError> {
        self.expect(b'L')?;
        let name = self.identifier(b"<.;")?.to_string();
        self.classes.push(name.clone());
        if self.peek() == Some(b'<') {
            self.type_arguments(depth)?;
        }
        self.inner_class_suffixes(&name, depth)?;
        self.expect(b';')
    }

    fn inner_class_suffixes(&mut self, enclosing: &str, depth: usize) -> Result<(), ClassFormatError> {
        if self.peek() != Some(b'.') {
            return Ok(());
        }
        self.position += 1;
        let simple = self.identifier(b"<.;")?;
        let nested = format!("{enclosing}${simple}");
        self.classes.push(nested.clone());
        if self.peek() == Some(b'<') {
            self.type_arguments(depth)?;
        }
        self.inner_class_suffixes(&nested, depth)
    }

    fn type_arguments(&mut self, depth: usize) -> Result<(), ClassFormatError> {
        self.expect(b'<')?;
        loop {
            match self.peek() {
                Some(b'*') => self.position += 1,
                Some(b'+' | b'-') => {
                    self.position += 1;
                    self.reference_type_signature(depth + 1)?;
                }
                _ => self.reference_type_signature(depth + 1)?,
            }
            if self.peek() == Some(b'>') {
                break;
            }
        }
        self.expect(b'>')
    }
}
