//! Field and method descriptors
//!
//! Only the class names embedded in a descriptor matter here. Array types
//! resolve to their element type; primitive types resolve to nothing. All
//! names are returned in internal (slash-separated) form.

use crate::error::ClassFormatError;

fn invalid(desc: &str) -> ClassFormatError {
    ClassFormatError::InvalidDescriptor(desc.to_string())
}

/// Parse one field type starting at byte `pos`
///
/// Returns the element class name, if any, and the position just past the type.
fn field_type_at(desc: &str, pos: usize) -> Result<(Option<&str>, usize), ClassFormatError> {
    let bytes = desc.as_bytes();
    let mut i = pos;
    while bytes.get(i) == Some(&b'[') {
        i += 1;
    }

    match bytes.get(i) {
        Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => Ok((None, i + 1)),
        Some(b'L') => {
            let start = i + 1;
            let end = desc[start..]
                .find(';')
                .map(|offset| start + offset)
                .filter(|end| *end > start)
                .ok_or_else(|| invalid(desc))?;
            Ok((Some(&desc[start..end]), end + 1))
        }
        _ => Err(invalid(desc)),
    }
}

/// Class referenced by a field descriptor such as `[[Lcom/foo/Bar;`
pub fn field_type_class(desc: &str) -> Result<Option<&str>, ClassFormatError> {
    let (class, end) = field_type_at(desc, 0)?;
    if end != desc.len() {
        return Err(invalid(desc));
    }
    Ok(class)
}

/// Class referenced by a `CONSTANT_Class` name
///
/// Class constants hold a plain internal name, except for array types where
/// they hold a field descriptor.
pub fn object_type_class(name: &str) -> Result<Option<&str>, ClassFormatError> {
    if name.starts_with('[') {
        return field_type_class(name);
    }
    if name.is_empty() {
        return Err(invalid(name));
    }
    Ok(Some(name))
}

/// Classes referenced by a method descriptor, return type first
pub fn method_type_classes(desc: &str) -> Result<Vec<&str>, ClassFormatError> {
    let bytes = desc.as_bytes();
    if bytes.first() != Some(&b'(') {
        return Err(invalid(desc));
    }

    let mut params = Vec::new();
    let mut pos = 1;
    loop {
        match bytes.get(pos) {
            Some(b')') => break,
            Some(_) => {
                let (class, next) = field_type_at(desc, pos)?;
                params.extend(class);
                pos = next;
            }
            None => return Err(invalid(desc)),
        }
    }

    pos += 1;
    let ret = if bytes.get(pos) == Some(&b'V') && pos + 1 == desc.len() {
        None
    } else {
        let (class, end) = field_type_at(desc, pos)?;
        if end != desc.len() {
            return Err(invalid(desc));
        }
        class
    };

    let mut classes = Vec::with_capacity(params.len() + 1);
    classes.extend(ret);
    classes.extend(params);
    Ok(classes)
}
