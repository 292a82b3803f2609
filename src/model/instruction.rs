//! The instruction stream of a method body.
//!
//! Only the operations the analysis reasons about get their own variant;
//! everything else collapses into [`Instruction::Other`] carrying the opcode.

use crate::descriptor::{decode_method_descriptor, DescriptorResult};

use super::MethodSignature;

/// A constant pushed by `ldc`, `bipush`, `iconst_*` and friends.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Class(String),
    Null,
}

impl Constant {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integral value of `Int` and `Long` constants.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Constant::Int(v) => Some(i64::from(*v)),
            Constant::Long(v) => Some(*v),
            _ => None,
        }
    }
}

/// Dispatch kind of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

/// A resolved method reference with decoded parameter and return types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub param_types: Vec<String>,
    pub return_type: String,
    pub kind: InvokeKind,
}

impl MethodRef {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
        kind: InvokeKind,
    ) -> DescriptorResult<Self> {
        let descriptor = descriptor.into();
        let (param_types, return_type) = decode_method_descriptor(&descriptor)?;
        Ok(Self {
            owner: owner.into(),
            name: name.into(),
            descriptor,
            param_types,
            return_type,
            kind,
        })
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn signature(&self) -> MethodSignature {
        MethodSignature::new(&self.owner, &self.name, &self.descriptor)
    }
}

/// A static field read (`getstatic`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
    pub field_type: String,
}

/// An `invokedynamic` call site.
///
/// `bound` is the implementation method of a lambda or method reference
/// when the bootstrap is the lambda metafactory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub name: String,
    pub descriptor: String,
    pub bound: Option<MethodRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    NewObject(String),
    LoadConstant(Constant),
    GetStatic(FieldRef),
    InvokeMethod(MethodRef),
    InvokeDynamic(CallSite),
    Throw,
    Return,
    Other(u8),
}

impl Instruction {
    /// The method an invocation transfers control to, if statically known.
    pub fn invoked(&self) -> Option<&MethodRef> {
        match self {
            Instruction::InvokeMethod(m) => Some(m),
            Instruction::InvokeDynamic(site) => site.bound.as_ref(),
            _ => None,
        }
    }
}
