//! Descriptor data model shared by every analysis stage.
//!
//! Descriptors are produced once while loading and are read-only afterwards.

pub mod annotation;
pub mod endpoint;
pub mod failure;
pub mod instruction;

pub use annotation::{AnnotationMarker, AnnotationValue, HttpMethod, RawAnnotation, StereotypeKind};
pub use endpoint::{
    EndpointKey, EndpointResponseModel, ParameterDescriptor, ParameterSource, SuccessResponse,
};
pub use failure::{
    Confidence, Evidence, FailureKey, FailureRecord, FailureSet, OriginLayer, StatusSource,
};
pub use instruction::{CallSite, Constant, FieldRef, Instruction, InvokeKind, MethodRef};

use serde::Serialize;

use crate::descriptor::{decode_method_descriptor, DescriptorResult};

/// Identity of a method: owner, name and raw descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MethodSignature {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl MethodSignature {
    pub fn new(owner: &str, name: &str, descriptor: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }
}

impl std::fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}{}", self.owner, self.name, self.descriptor)
    }
}

/// Role of a class, derived from its declared markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Classification {
    Handler,
    BusinessComponent,
    Advice,
    Model,
    Enum,
    #[default]
    Unclassified,
}

impl Classification {
    /// Classifies from declared markers; advice wins over handler, handler over
    /// stereotype, stereotype over model.
    pub fn from_markers(markers: &[AnnotationMarker], is_enum: bool) -> Self {
        let has = |pred: fn(&AnnotationMarker) -> bool| markers.iter().any(pred);
        if has(|m| matches!(m, AnnotationMarker::AdviceClass { .. })) {
            Classification::Advice
        } else if has(|m| matches!(m, AnnotationMarker::HandlerClass)) {
            Classification::Handler
        } else if has(|m| matches!(m, AnnotationMarker::Stereotype { .. })) {
            Classification::BusinessComponent
        } else if has(|m| matches!(m, AnnotationMarker::ModelType)) {
            Classification::Model
        } else if is_enum {
            Classification::Enum
        } else {
            Classification::Unclassified
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: String,
    pub markers: Vec<AnnotationMarker>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub param_types: Vec<String>,
    pub return_type: String,
    /// Return type from the generic signature, when one was recorded
    pub generic_return_type: Option<String>,
    pub declared_exceptions: Vec<String>,
    pub instructions: Vec<Instruction>,
    pub markers: Vec<AnnotationMarker>,
    /// One entry per parameter, possibly empty
    pub parameter_markers: Vec<Vec<AnnotationMarker>>,
    pub parameter_names: Vec<Option<String>>,
    pub is_static: bool,
}

impl MethodDescriptor {
    pub fn new(owner: &str, name: &str, descriptor: &str) -> DescriptorResult<Self> {
        let (param_types, return_type) = decode_method_descriptor(descriptor)?;
        let arity = param_types.len();
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            param_types,
            return_type,
            generic_return_type: None,
            declared_exceptions: Vec::new(),
            instructions: Vec::new(),
            markers: Vec::new(),
            parameter_markers: vec![Vec::new(); arity],
            parameter_names: vec![None; arity],
            is_static: false,
        })
    }

    pub fn with_instructions(mut self, instructions: Vec<Instruction>) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn with_marker(mut self, marker: AnnotationMarker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn with_exception(mut self, exception_type: &str) -> Self {
        self.declared_exceptions.push(exception_type.to_string());
        self
    }

    pub fn with_generic_return(mut self, generic: &str) -> Self {
        self.generic_return_type = Some(generic.to_string());
        self
    }

    /// Attaches markers and a name to parameter `index`; out-of-range indices are ignored.
    pub fn with_parameter(
        mut self,
        index: usize,
        name: Option<&str>,
        markers: Vec<AnnotationMarker>,
    ) -> Self {
        if index < self.param_types.len() {
            self.parameter_names[index] = name.map(str::to_string);
            self.parameter_markers[index] = markers;
        }
        self
    }

    pub fn signature(&self) -> MethodSignature {
        MethodSignature::new(&self.owner, &self.name, &self.descriptor)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>" || self.name == "<clinit>"
    }

    /// Generic return type if known, else the erased one.
    pub fn effective_return_type(&self) -> &str {
        self.generic_return_type
            .as_deref()
            .unwrap_or(&self.return_type)
    }

    pub fn endpoint_mapping(&self) -> Option<(HttpMethod, &[String])> {
        self.markers.iter().find_map(|m| match m {
            AnnotationMarker::EndpointMapping { http_method, paths } => {
                Some((*http_method, paths.as_slice()))
            }
            _ => None,
        })
    }

    pub fn explicit_status(&self) -> Option<u16> {
        explicit_status(&self.markers)
    }

    pub fn handled_exception_types(&self) -> Option<&[String]> {
        self.markers.iter().find_map(|m| match m {
            AnnotationMarker::ExceptionHandler { handled_types } => Some(handled_types.as_slice()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    pub name: String,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub classification: Classification,
    pub markers: Vec<AnnotationMarker>,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub is_interface: bool,
    pub is_enum: bool,
    /// Repository-like receiver for the finder heuristic
    pub data_access: bool,
}

impl ClassDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            superclass: Some("java.lang.Object".to_string()),
            interfaces: Vec::new(),
            classification: Classification::Unclassified,
            markers: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            is_interface: false,
            is_enum: false,
            data_access: false,
        }
    }

    pub fn with_marker(mut self, marker: AnnotationMarker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn with_superclass(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    pub fn with_interface(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn as_interface(mut self) -> Self {
        self.is_interface = true;
        self
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodDescriptor> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    /// Base paths declared by a class-level mapping.
    pub fn base_paths(&self) -> &[String] {
        self.markers
            .iter()
            .find_map(|m| match m {
                AnnotationMarker::EndpointMapping { paths, .. } => Some(paths.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn explicit_status(&self) -> Option<u16> {
        explicit_status(&self.markers)
    }

    pub fn has_stereotype(&self, kind: StereotypeKind) -> bool {
        self.markers
            .iter()
            .any(|m| matches!(m, AnnotationMarker::Stereotype { kind: k } if *k == kind))
    }
}

fn explicit_status(markers: &[AnnotationMarker]) -> Option<u16> {
    markers.iter().find_map(|m| match m {
        AnnotationMarker::ExplicitStatus { code, .. } => Some(*code),
        _ => None,
    })
}
