//! Compiled class-file decoding.
//!
//! [`ClassDecoder`] is the seam between raw class bytes and the descriptor
//! model. [`JvmClassDecoder`] reads the JVM class-file format directly: the
//! constant pool, member tables and the attributes the analysis cares about
//! (`Code`, `Exceptions`, `Signature`, `MethodParameters`, visible
//! annotations and `BootstrapMethods`). Unknown attributes are skipped.

mod attributes;
mod code;
mod constant_pool;
mod reader;

use thiserror::Error;

use crate::descriptor::{decode_method_signature, decode_type, DescriptorError};
use crate::model::{
    AnnotationMarker, ClassDescriptor, Classification, FieldDescriptor, MethodDescriptor,
    RawAnnotation,
};

use attributes::{
    parse_annotations, parse_bootstrap_methods, parse_exceptions, parse_method_parameters,
    parse_parameter_annotations, BootstrapMethod,
};
use constant_pool::ConstantPool;
use reader::ByteReader;

const MAGIC: u32 = 0xCAFE_BABE;
const ACC_STATIC: u16 = 0x0008;
const ACC_INTERFACE: u16 = 0x0200;
const ACC_ENUM: u16 = 0x4000;

/// Errors produced while decoding a class file.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedClassError {
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),

    #[error("unexpected end of class data at offset {offset} (wanted {wanted} bytes)")]
    UnexpectedEof { offset: usize, wanted: usize },

    #[error("constant pool index {0} is out of range or unusable")]
    BadConstantIndex(u16),

    #[error("constant pool entry {index} is not a {expected}")]
    ConstantKind { index: u16, expected: &'static str },

    #[error("unknown constant pool tag {0}")]
    UnknownConstantTag(u8),

    #[error("unknown opcode {opcode:#04x} at bytecode offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("malformed switch at bytecode offset {offset}")]
    BadSwitch { offset: usize },

    #[error("unknown annotation element tag `{0}`")]
    UnknownElementTag(char),

    #[error("bootstrap method index {0} is out of range")]
    BadBootstrapIndex(u16),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// Result type for class-file decoding
pub type DecodeResult<T> = Result<T, MalformedClassError>;

/// Turns one compiled class buffer into a [`ClassDescriptor`].
pub trait ClassDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> DecodeResult<ClassDescriptor>;
}

/// Decoder for the standard JVM class-file format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JvmClassDecoder;

impl ClassDecoder for JvmClassDecoder {
    fn decode(&self, bytes: &[u8]) -> DecodeResult<ClassDescriptor> {
        decode_class(bytes)
    }
}

/// A method whose `Code` attribute is decoded once the class-level
/// `BootstrapMethods` table is known.
struct PendingMethod<'a> {
    descriptor: MethodDescriptor,
    code: Option<&'a [u8]>,
}

/// Decodes a class file with [`JvmClassDecoder`] semantics.
pub fn decode_class(bytes: &[u8]) -> DecodeResult<ClassDescriptor> {
    let mut reader = ByteReader::new(bytes);
    let magic = reader.u32()?;
    if magic != MAGIC {
        return Err(MalformedClassError::BadMagic(magic));
    }
    let _minor = reader.u16()?;
    let _major = reader.u16()?;
    let pool = ConstantPool::parse(&mut reader)?;

    let access = reader.u16()?;
    let name = pool.class_name(reader.u16()?)?;
    let superclass = match reader.u16()? {
        0 => None,
        idx => Some(pool.class_name(idx)?),
    };
    let interface_count = reader.u16()?;
    let interfaces = (0..interface_count)
        .map(|_| pool.class_name(reader.u16()?))
        .collect::<DecodeResult<Vec<_>>>()?;

    let field_count = reader.u16()?;
    let fields = (0..field_count)
        .map(|_| parse_field(&mut reader, &pool))
        .collect::<DecodeResult<Vec<_>>>()?;

    let method_count = reader.u16()?;
    let pending = (0..method_count)
        .map(|_| parse_method(&mut reader, &pool, &name))
        .collect::<DecodeResult<Vec<_>>>()?;

    let mut markers = Vec::new();
    let mut bootstrap = Vec::new();
    for_each_attribute(&mut reader, &pool, |attr, body| {
        match attr {
            "RuntimeVisibleAnnotations" => markers = recognize_all(&parse_annotations(body, &pool)?),
            "BootstrapMethods" => bootstrap = parse_bootstrap_methods(body)?,
            _ => {}
        }
        Ok(())
    })?;

    let methods = pending
        .into_iter()
        .map(|p| finish_method(p, &pool, &bootstrap))
        .collect::<DecodeResult<Vec<_>>>()?;

    let is_enum = access & ACC_ENUM != 0;
    Ok(ClassDescriptor {
        classification: Classification::from_markers(&markers, is_enum),
        name,
        superclass,
        interfaces,
        markers,
        fields,
        methods,
        is_interface: access & ACC_INTERFACE != 0,
        is_enum,
        data_access: false,
    })
}

/// Reads an attribute table, handing each attribute body to `visit` as a
/// reader bounded to that attribute.
fn for_each_attribute<'a, F>(
    reader: &mut ByteReader<'a>,
    pool: &ConstantPool,
    mut visit: F,
) -> DecodeResult<()>
where
    F: FnMut(&str, &mut ByteReader<'a>) -> DecodeResult<()>,
{
    let count = reader.u16()?;
    for _ in 0..count {
        let name = pool.utf8(reader.u16()?)?;
        let len = reader.u32()? as usize;
        let mut body = ByteReader::new(reader.bytes(len)?);
        visit(name, &mut body)?;
    }
    Ok(())
}

fn recognize_all(raw: &[RawAnnotation]) -> Vec<AnnotationMarker> {
    raw.iter().filter_map(AnnotationMarker::recognize).collect()
}

fn parse_field(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> DecodeResult<FieldDescriptor> {
    let _access = reader.u16()?;
    let name = pool.utf8(reader.u16()?)?.to_string();
    let field_type = decode_type(pool.utf8(reader.u16()?)?)?;
    let mut markers = Vec::new();
    for_each_attribute(reader, pool, |attr, body| {
        if attr == "RuntimeVisibleAnnotations" {
            markers = recognize_all(&parse_annotations(body, pool)?);
        }
        Ok(())
    })?;
    Ok(FieldDescriptor {
        name,
        field_type,
        markers,
    })
}

fn parse_method<'a>(
    reader: &mut ByteReader<'a>,
    pool: &ConstantPool,
    owner: &str,
) -> DecodeResult<PendingMethod<'a>> {
    let access = reader.u16()?;
    let name = pool.utf8(reader.u16()?)?;
    let descriptor = pool.utf8(reader.u16()?)?;
    let mut method = MethodDescriptor::new(owner, name, descriptor)?;
    method.is_static = access & ACC_STATIC != 0;

    let mut code = None;
    let mut parameter_annotations: Vec<Vec<RawAnnotation>> = Vec::new();
    let mut parameter_names: Vec<Option<String>> = Vec::new();
    for_each_attribute(reader, pool, |attr, body| {
        match attr {
            "Code" => {
                let _max_stack = body.u16()?;
                let _max_locals = body.u16()?;
                let len = body.u32()? as usize;
                code = Some(body.bytes(len)?);
            }
            "Exceptions" => method.declared_exceptions = parse_exceptions(body, pool)?,
            "Signature" => {
                // Generic signatures are advisory; an unparseable one keeps the erased type.
                if let Ok((_, ret)) = decode_method_signature(pool.utf8(body.u16()?)?) {
                    method.generic_return_type = Some(ret);
                }
            }
            "MethodParameters" => parameter_names = parse_method_parameters(body, pool)?,
            "RuntimeVisibleAnnotations" => {
                method.markers = recognize_all(&parse_annotations(body, pool)?);
            }
            "RuntimeVisibleParameterAnnotations" => {
                parameter_annotations = parse_parameter_annotations(body, pool)?;
            }
            _ => {}
        }
        Ok(())
    })?;

    // Synthetic leading parameters may be absent from the annotation table;
    // align it to the end of the parameter list.
    let arity = method.param_types.len();
    let offset = arity.saturating_sub(parameter_annotations.len());
    for (i, raw) in parameter_annotations.iter().enumerate().take(arity) {
        method.parameter_markers[offset + i] = recognize_all(raw);
    }
    for (i, name) in parameter_names.into_iter().enumerate().take(arity) {
        method.parameter_names[i] = name;
    }

    Ok(PendingMethod {
        descriptor: method,
        code,
    })
}

fn finish_method(
    pending: PendingMethod<'_>,
    pool: &ConstantPool,
    bootstrap: &[BootstrapMethod],
) -> DecodeResult<MethodDescriptor> {
    let mut method = pending.descriptor;
    if let Some(bytes) = pending.code {
        method.instructions = code::decode_code(bytes, pool, bootstrap)?;
    }
    Ok(method)
}
