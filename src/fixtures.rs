//! Descriptor and instruction builders shared by unit tests.

use crate::config::AnalysisConfig;
use crate::context::AnalysisContext;
use crate::index::ClassIndex;
use crate::model::{
    AnnotationMarker, ClassDescriptor, Constant, FieldRef, HttpMethod, Instruction, InvokeKind,
    MethodDescriptor, MethodRef, StereotypeKind,
};

// =============================================================================
// Classes
// =============================================================================

pub fn handler(name: &str) -> ClassDescriptor {
    ClassDescriptor::new(name).with_marker(AnnotationMarker::HandlerClass)
}

pub fn service(name: &str) -> ClassDescriptor {
    ClassDescriptor::new(name).with_marker(AnnotationMarker::Stereotype {
        kind: StereotypeKind::Service,
    })
}

pub fn advice(name: &str) -> ClassDescriptor {
    ClassDescriptor::new(name).with_marker(AnnotationMarker::AdviceClass {
        base_packages: vec![],
    })
}

/// Advice mapping `jakarta.validation.ValidationException` to `status`
/// with an `ErrorBody` response.
pub fn validation_advice(status: u16) -> ClassDescriptor {
    advice("com.acme.GlobalErrors").with_method(
        method(
            "com.acme.GlobalErrors",
            "onValidation",
            "(Ljakarta/validation/ValidationException;)Lorg/springframework/http/ResponseEntity;",
        )
        .with_generic_return("org.springframework.http.ResponseEntity<com.acme.ErrorBody>")
        .with_marker(AnnotationMarker::ExceptionHandler {
            handled_types: vec!["jakarta.validation.ValidationException".into()],
        })
        .with_marker(AnnotationMarker::ExplicitStatus { code: status, reason: None }),
    )
}

pub fn method(owner: &str, name: &str, desc: &str) -> MethodDescriptor {
    MethodDescriptor::new(owner, name, desc).unwrap()
}

// =============================================================================
// Mappings
// =============================================================================

fn mapping(http_method: HttpMethod, paths: &[&str]) -> AnnotationMarker {
    AnnotationMarker::EndpointMapping {
        http_method,
        paths: paths.iter().map(|p| p.to_string()).collect(),
    }
}

pub fn request_mapping(paths: &[&str]) -> AnnotationMarker {
    mapping(HttpMethod::Any, paths)
}

pub fn get_mapping(paths: &[&str]) -> AnnotationMarker {
    mapping(HttpMethod::Get, paths)
}

pub fn post_mapping(paths: &[&str]) -> AnnotationMarker {
    mapping(HttpMethod::Post, paths)
}

pub fn delete_mapping(paths: &[&str]) -> AnnotationMarker {
    mapping(HttpMethod::Delete, paths)
}

// =============================================================================
// Instructions
// =============================================================================

fn call(owner: &str, name: &str, desc: &str, kind: InvokeKind) -> Instruction {
    Instruction::InvokeMethod(MethodRef::new(owner, name, desc, kind).unwrap())
}

pub fn invoke(owner: &str, name: &str, desc: &str) -> Instruction {
    call(owner, name, desc, InvokeKind::Virtual)
}

pub fn invoke_static(owner: &str, name: &str, desc: &str) -> Instruction {
    call(owner, name, desc, InvokeKind::Static)
}

pub fn invoke_interface(owner: &str, name: &str, desc: &str) -> Instruction {
    call(owner, name, desc, InvokeKind::Interface)
}

pub fn init(ty: &str, desc: &str) -> Instruction {
    call(ty, "<init>", desc, InvokeKind::Special)
}

pub fn new_obj(ty: &str) -> Instruction {
    Instruction::NewObject(ty.to_string())
}

pub fn dup() -> Instruction {
    Instruction::Other(0x59)
}

pub fn ldc(value: &str) -> Instruction {
    Instruction::LoadConstant(Constant::String(value.to_string()))
}

pub fn int(value: i32) -> Instruction {
    Instruction::LoadConstant(Constant::Int(value))
}

pub fn http_status_field(constant: &str) -> Instruction {
    Instruction::GetStatic(FieldRef {
        owner: "org.springframework.http.HttpStatus".into(),
        name: constant.into(),
        field_type: "org.springframework.http.HttpStatus".into(),
    })
}

/// `throw new <ty>(<message>)`, or the no-arg constructor without one.
pub fn throw_new(ty: &str, message: Option<&str>) -> Vec<Instruction> {
    let mut out = vec![new_obj(ty), dup()];
    let desc = match message {
        Some(msg) => {
            out.push(ldc(msg));
            "(Ljava/lang/String;)V"
        }
        None => "()V",
    };
    out.push(init(ty, desc));
    out.push(Instruction::Throw);
    out
}

// =============================================================================
// Contexts
// =============================================================================

pub fn context(classes: Vec<ClassDescriptor>) -> AnalysisContext {
    context_with(classes, AnalysisConfig::default())
}

pub fn context_with(classes: Vec<ClassDescriptor>, config: AnalysisConfig) -> AnalysisContext {
    let index = ClassIndex::from_descriptors(classes, &config.data_access_interfaces);
    AnalysisContext::new(index, config)
}
