//! Attribute payload parsers: annotations, bootstrap methods, parameters.

use crate::descriptor::decode_type;
use crate::model::{AnnotationValue, RawAnnotation};

use super::constant_pool::ConstantPool;
use super::reader::ByteReader;
use super::{DecodeResult, MalformedClassError};

/// An entry of the `BootstrapMethods` class attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BootstrapMethod {
    pub(crate) method_handle: u16,
    pub(crate) arguments: Vec<u16>,
}

pub(crate) fn parse_annotations(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> DecodeResult<Vec<RawAnnotation>> {
    let count = reader.u16()?;
    (0..count).map(|_| parse_annotation(reader, pool)).collect()
}

pub(crate) fn parse_parameter_annotations(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> DecodeResult<Vec<Vec<RawAnnotation>>> {
    let count = reader.u8()?;
    (0..count).map(|_| parse_annotations(reader, pool)).collect()
}

fn parse_annotation(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> DecodeResult<RawAnnotation> {
    let type_name = decode_type(pool.utf8(reader.u16()?)?)?;
    let pairs = reader.u16()?;
    let mut annotation = RawAnnotation::new(type_name);
    for _ in 0..pairs {
        let name = pool.utf8(reader.u16()?)?.to_string();
        let value = parse_element_value(reader, pool)?;
        annotation.elements.insert(name, value);
    }
    Ok(annotation)
}

fn parse_element_value(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> DecodeResult<AnnotationValue> {
    let tag = reader.u8()? as char;
    let value = match tag {
        'B' | 'I' | 'S' => AnnotationValue::Int(i64::from(pool.integer(reader.u16()?)?)),
        'C' => {
            let code = pool.integer(reader.u16()?)?;
            AnnotationValue::Char(
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER),
            )
        }
        'Z' => AnnotationValue::Bool(pool.integer(reader.u16()?)? != 0),
        'J' => AnnotationValue::Int(pool.long(reader.u16()?)?),
        'D' | 'F' => AnnotationValue::Float(pool.float(reader.u16()?)?),
        's' => AnnotationValue::String(pool.utf8(reader.u16()?)?.to_string()),
        'e' => {
            let type_name = decode_type(pool.utf8(reader.u16()?)?)?;
            let constant = pool.utf8(reader.u16()?)?.to_string();
            AnnotationValue::EnumConstant {
                type_name,
                constant,
            }
        }
        'c' => AnnotationValue::TypeRef(decode_type(pool.utf8(reader.u16()?)?)?),
        '@' => AnnotationValue::Nested(parse_annotation(reader, pool)?),
        '[' => {
            let count = reader.u16()?;
            let items = (0..count)
                .map(|_| parse_element_value(reader, pool))
                .collect::<DecodeResult<Vec<_>>>()?;
            AnnotationValue::List(items)
        }
        other => return Err(MalformedClassError::UnknownElementTag(other)),
    };
    Ok(value)
}

pub(crate) fn parse_bootstrap_methods(
    reader: &mut ByteReader<'_>,
) -> DecodeResult<Vec<BootstrapMethod>> {
    let count = reader.u16()?;
    let mut methods = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let method_handle = reader.u16()?;
        let argc = reader.u16()?;
        let arguments = (0..argc)
            .map(|_| reader.u16())
            .collect::<DecodeResult<Vec<_>>>()?;
        methods.push(BootstrapMethod {
            method_handle,
            arguments,
        });
    }
    Ok(methods)
}

/// Names from a `MethodParameters` attribute; unnamed entries are `None`.
pub(crate) fn parse_method_parameters(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> DecodeResult<Vec<Option<String>>> {
    let count = reader.u8()?;
    let mut names = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = reader.u16()?;
        let _flags = reader.u16()?;
        names.push(match name_index {
            0 => None,
            idx => Some(pool.utf8(idx)?.to_string()),
        });
    }
    Ok(names)
}

/// Class names from an `Exceptions` attribute.
pub(crate) fn parse_exceptions(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> DecodeResult<Vec<String>> {
    let count = reader.u16()?;
    (0..count)
        .map(|_| pool.class_name(reader.u16()?))
        .collect()
}
