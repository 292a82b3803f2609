//! Constant pool parsing and typed accessors.

use crate::descriptor::{decode_type, internal_to_dotted};
use crate::model::{Constant, FieldRef, InvokeKind, MethodRef};

use super::reader::ByteReader;
use super::{DecodeResult, MalformedClassError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConstantEntry {
    /// Slot 0 and the second slot of long/double entries
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef { class: u16, name_and_type: u16 },
    MethodRef { class: u16, name_and_type: u16 },
    InterfaceMethodRef { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType(u16),
    Dynamic { bootstrap: u16, name_and_type: u16 },
    InvokeDynamic { bootstrap: u16, name_and_type: u16 },
    Module(u16),
    Package(u16),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ConstantPool {
    entries: Vec<ConstantEntry>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut ByteReader<'_>) -> DecodeResult<Self> {
        let count = reader.u16()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(ConstantEntry::Unusable);
        while entries.len() < count {
            let tag = reader.u8()?;
            let entry = match tag {
                1 => {
                    let len = reader.u16()? as usize;
                    ConstantEntry::Utf8(decode_modified_utf8(reader.bytes(len)?))
                }
                3 => ConstantEntry::Integer(reader.i32()?),
                4 => ConstantEntry::Float(f32::from_bits(reader.u32()?)),
                5 => ConstantEntry::Long(reader.u64()? as i64),
                6 => ConstantEntry::Double(f64::from_bits(reader.u64()?)),
                7 => ConstantEntry::Class(reader.u16()?),
                8 => ConstantEntry::String(reader.u16()?),
                9 => ConstantEntry::FieldRef {
                    class: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                10 => ConstantEntry::MethodRef {
                    class: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                11 => ConstantEntry::InterfaceMethodRef {
                    class: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                12 => ConstantEntry::NameAndType {
                    name: reader.u16()?,
                    descriptor: reader.u16()?,
                },
                15 => ConstantEntry::MethodHandle {
                    kind: reader.u8()?,
                    reference: reader.u16()?,
                },
                16 => ConstantEntry::MethodType(reader.u16()?),
                17 => ConstantEntry::Dynamic {
                    bootstrap: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                18 => ConstantEntry::InvokeDynamic {
                    bootstrap: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                19 => ConstantEntry::Module(reader.u16()?),
                20 => ConstantEntry::Package(reader.u16()?),
                other => return Err(MalformedClassError::UnknownConstantTag(other)),
            };
            let wide = matches!(entry, ConstantEntry::Long(_) | ConstantEntry::Double(_));
            entries.push(entry);
            if wide {
                entries.push(ConstantEntry::Unusable);
            }
        }
        Ok(Self { entries })
    }

    pub(crate) fn entry(&self, index: u16) -> DecodeResult<&ConstantEntry> {
        match self.entries.get(index as usize) {
            Some(ConstantEntry::Unusable) | None => {
                Err(MalformedClassError::BadConstantIndex(index))
            }
            Some(entry) => Ok(entry),
        }
    }

    fn kind_error(index: u16, expected: &'static str) -> MalformedClassError {
        MalformedClassError::ConstantKind { index, expected }
    }

    pub(crate) fn utf8(&self, index: u16) -> DecodeResult<&str> {
        match self.entry(index)? {
            ConstantEntry::Utf8(s) => Ok(s),
            _ => Err(Self::kind_error(index, "Utf8")),
        }
    }

    pub(crate) fn integer(&self, index: u16) -> DecodeResult<i32> {
        match self.entry(index)? {
            ConstantEntry::Integer(v) => Ok(*v),
            _ => Err(Self::kind_error(index, "Integer")),
        }
    }

    pub(crate) fn long(&self, index: u16) -> DecodeResult<i64> {
        match self.entry(index)? {
            ConstantEntry::Long(v) => Ok(*v),
            _ => Err(Self::kind_error(index, "Long")),
        }
    }

    pub(crate) fn float(&self, index: u16) -> DecodeResult<f64> {
        match self.entry(index)? {
            ConstantEntry::Float(v) => Ok(f64::from(*v)),
            ConstantEntry::Double(v) => Ok(*v),
            _ => Err(Self::kind_error(index, "Float")),
        }
    }

    /// Dotted class name of a `Class` entry; array classes are decoded as types.
    pub(crate) fn class_name(&self, index: u16) -> DecodeResult<String> {
        match self.entry(index)? {
            ConstantEntry::Class(name) => {
                let raw = self.utf8(*name)?;
                if raw.starts_with('[') {
                    Ok(decode_type(raw)?)
                } else {
                    Ok(internal_to_dotted(raw))
                }
            }
            _ => Err(Self::kind_error(index, "Class")),
        }
    }

    pub(crate) fn name_and_type(&self, index: u16) -> DecodeResult<(&str, &str)> {
        match self.entry(index)? {
            ConstantEntry::NameAndType { name, descriptor } => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            _ => Err(Self::kind_error(index, "NameAndType")),
        }
    }

    pub(crate) fn method_ref(&self, index: u16, kind: InvokeKind) -> DecodeResult<MethodRef> {
        let (class, nat) = match self.entry(index)? {
            ConstantEntry::MethodRef {
                class,
                name_and_type,
            }
            | ConstantEntry::InterfaceMethodRef {
                class,
                name_and_type,
            } => (*class, *name_and_type),
            _ => return Err(Self::kind_error(index, "Methodref")),
        };
        let owner = self.class_name(class)?;
        let (name, descriptor) = self.name_and_type(nat)?;
        Ok(MethodRef::new(owner, name, descriptor, kind)?)
    }

    pub(crate) fn field_ref(&self, index: u16) -> DecodeResult<FieldRef> {
        match self.entry(index)? {
            ConstantEntry::FieldRef {
                class,
                name_and_type,
            } => {
                let owner = self.class_name(*class)?;
                let (name, descriptor) = self.name_and_type(*name_and_type)?;
                Ok(FieldRef {
                    owner,
                    name: name.to_string(),
                    field_type: decode_type(descriptor)?,
                })
            }
            _ => Err(Self::kind_error(index, "Fieldref")),
        }
    }

    /// Loadable constant for `ldc`; method handles and dynamic constants yield `None`.
    pub(crate) fn loadable(&self, index: u16) -> DecodeResult<Option<Constant>> {
        let constant = match self.entry(index)? {
            ConstantEntry::Integer(v) => Constant::Int(*v),
            ConstantEntry::Float(v) => Constant::Float(*v),
            ConstantEntry::Long(v) => Constant::Long(*v),
            ConstantEntry::Double(v) => Constant::Double(*v),
            ConstantEntry::String(s) => Constant::String(self.utf8(*s)?.to_string()),
            ConstantEntry::Class(_) => Constant::Class(self.class_name(index)?),
            _ => return Ok(None),
        };
        Ok(Some(constant))
    }

    /// `(bootstrap index, name, descriptor)` of an `InvokeDynamic` entry.
    pub(crate) fn invoke_dynamic(&self, index: u16) -> DecodeResult<(u16, &str, &str)> {
        match self.entry(index)? {
            ConstantEntry::InvokeDynamic {
                bootstrap,
                name_and_type,
            } => {
                let (name, descriptor) = self.name_and_type(*name_and_type)?;
                Ok((*bootstrap, name, descriptor))
            }
            _ => Err(Self::kind_error(index, "InvokeDynamic")),
        }
    }

    /// Target of a `MethodHandle` entry if it references a method.
    pub(crate) fn method_handle(&self, index: u16) -> DecodeResult<Option<MethodRef>> {
        let (kind, reference) = match self.entry(index)? {
            ConstantEntry::MethodHandle { kind, reference } => (*kind, *reference),
            _ => return Err(Self::kind_error(index, "MethodHandle")),
        };
        let invoke = match kind {
            5 => InvokeKind::Virtual,
            6 => InvokeKind::Static,
            7 | 8 => InvokeKind::Special,
            9 => InvokeKind::Interface,
            _ => return Ok(None),
        };
        self.method_ref(reference, invoke).map(Some)
    }
}

/// Decodes the class-file "modified UTF-8" encoding.
///
/// Embedded NULs (`C0 80`) and surrogate pairs are handled; malformed
/// sequences degrade to U+FFFD rather than failing the whole class.
fn decode_modified_utf8(bytes: &[u8]) -> String {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(u16::from(b));
            i += 1;
        } else if b & 0xE0 == 0xC0 && i + 1 < bytes.len() {
            units.push((u16::from(b & 0x1F) << 6) | u16::from(bytes[i + 1] & 0x3F));
            i += 2;
        } else if b & 0xF0 == 0xE0 && i + 2 < bytes.len() {
            units.push(
                (u16::from(b & 0x0F) << 12)
                    | (u16::from(bytes[i + 1] & 0x3F) << 6)
                    | u16::from(bytes[i + 2] & 0x3F),
            );
            i += 3;
        } else {
            units.push(0xFFFD);
            i += 1;
        }
    }
    String::from_utf16_lossy(&units)
}
