//! Global exception advice.
//!
//! Advice classes declare `@ExceptionHandler` methods that turn an exception
//! type into a response. The registry records, per handled type, the status
//! the handler declares and the body type it returns.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::descriptor::{canonical_name, erasure, first_type_argument, simple_name};
use crate::index::ClassIndex;
use crate::model::{Classification, MethodDescriptor};
use crate::scanner::status_literal::embedded_status_literals;

const RESPONSE_ENTITY: &str = "org.springframework.http.ResponseEntity";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdviceMapping {
    pub exception_type: String,
    /// `None` when the handler declares no status of its own
    pub status: Option<u16>,
    pub response_type: String,
    pub advice_class: String,
    pub handler_method: String,
}

#[derive(Debug, Clone, Default)]
pub struct AdviceRegistry {
    mappings: Vec<AdviceMapping>,
    by_type: HashMap<String, usize>,
    by_simple: HashMap<String, usize>,
}

impl AdviceRegistry {
    /// Collects mappings from every advice class, in class-name order then
    /// declaration order. The first handler declared for a type wins.
    pub fn from_index(index: &ClassIndex) -> Self {
        let mut registry = Self::default();
        for class in index
            .classes()
            .filter(|c| c.classification == Classification::Advice)
        {
            for method in &class.methods {
                let Some(declared) = method.handled_exception_types() else {
                    continue;
                };
                let handled = if declared.is_empty() {
                    exception_parameters(method, index)
                } else {
                    declared.to_vec()
                };
                let status = method
                    .explicit_status()
                    .or_else(|| embedded_status_literals(&method.instructions).first().copied());
                let response_type = response_body_type(method.effective_return_type());
                for exception_type in handled {
                    registry.insert(AdviceMapping {
                        exception_type: canonical_name(&exception_type),
                        status,
                        response_type: response_type.clone(),
                        advice_class: class.name.clone(),
                        handler_method: method.name.clone(),
                    });
                }
            }
        }
        debug!(mappings = registry.len(), "advice registry built");
        registry
    }

    fn insert(&mut self, mapping: AdviceMapping) {
        if self.by_type.contains_key(&mapping.exception_type) {
            return;
        }
        let slot = self.mappings.len();
        self.by_type.insert(mapping.exception_type.clone(), slot);
        self.by_simple
            .entry(simple_name(&mapping.exception_type).to_string())
            .or_insert(slot);
        self.mappings.push(mapping);
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn mappings(&self) -> &[AdviceMapping] {
        &self.mappings
    }

    /// Mapping for the exact type, else for its simple name.
    pub fn mapping_for(&self, exception_type: &str) -> Option<&AdviceMapping> {
        let canonical = canonical_name(erasure(exception_type));
        self.by_type
            .get(&canonical)
            .or_else(|| self.by_simple.get(simple_name(&canonical)))
            .map(|slot| &self.mappings[*slot])
    }

    /// Mapping for the type or its nearest indexed ancestor.
    pub fn mapping_for_hierarchy(
        &self,
        exception_type: &str,
        index: &ClassIndex,
    ) -> Option<&AdviceMapping> {
        self.mapping_for(exception_type).or_else(|| {
            index
                .ancestors(exception_type)
                .iter()
                .find_map(|a| self.mapping_for(a))
        })
    }

    pub fn status_for(&self, exception_type: &str) -> Option<u16> {
        self.mapping_for(exception_type).and_then(|m| m.status)
    }
}

/// Parameters typed as exceptions; what the framework handles when the
/// annotation lists no types.
fn exception_parameters(method: &MethodDescriptor, index: &ClassIndex) -> Vec<String> {
    method
        .param_types
        .iter()
        .filter(|p| {
            is_throwable_name(p) || index.ancestors(p).iter().any(|a| is_throwable_name(a))
        })
        .cloned()
        .collect()
}

fn is_throwable_name(name: &str) -> bool {
    name.ends_with("Exception") || name.ends_with("Error") || name == "java.lang.Throwable"
}

/// Body type of a handler return: the argument of `ResponseEntity<T>`,
/// else the return type itself.
pub(crate) fn response_body_type(return_type: &str) -> String {
    if erasure(return_type) == RESPONSE_ENTITY {
        if let Some(arg) = first_type_argument(return_type) {
            return arg.to_string();
        }
    }
    return_type.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::model::{AnnotationMarker, ClassDescriptor, Instruction};

    fn handler_method(name: &str, handled: &[&str]) -> MethodDescriptor {
        method(
            "com.acme.GlobalErrors",
            name,
            "(Ljava/lang/RuntimeException;)Lorg/springframework/http/ResponseEntity;",
        )
        .with_marker(AnnotationMarker::ExceptionHandler {
            handled_types: handled.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn registry(methods: Vec<MethodDescriptor>, extra: Vec<ClassDescriptor>) -> AdviceRegistry {
        let mut class = advice("com.acme.GlobalErrors");
        for m in methods {
            class = class.with_method(m);
        }
        let mut classes = vec![class];
        classes.extend(extra);
        AdviceRegistry::from_index(&ClassIndex::from_descriptors(classes, &[]))
    }

    #[test]
    fn test_explicit_status_on_handler() {
        let reg = registry(
            vec![handler_method("onValidation", &["jakarta.validation.ValidationException"])
                .with_marker(AnnotationMarker::ExplicitStatus {
                    code: 422,
                    reason: None,
                })],
            vec![],
        );
        assert_eq!(reg.status_for("jakarta.validation.ValidationException"), Some(422));
        assert_eq!(reg.status_for("ValidationException"), Some(422));
        assert_eq!(reg.status_for("com.other.ValidationException"), Some(422));
    }

    #[test]
    fn test_status_from_builder_call() {
        let reg = registry(
            vec![handler_method("onMissing", &["com.acme.NotFoundException"]).with_instructions(vec![
                http_status_field("NOT_FOUND"),
                invoke_static(
                    RESPONSE_ENTITY,
                    "status",
                    "(Lorg/springframework/http/HttpStatusCode;)Lorg/springframework/http/ResponseEntity$BodyBuilder;",
                ),
                Instruction::Return,
            ])],
            vec![],
        );
        assert_eq!(reg.status_for("com.acme.NotFoundException"), Some(404));
    }

    #[test]
    fn test_handler_without_status() {
        let reg = registry(vec![handler_method("onAny", &["com.acme.Oops"])], vec![]);
        assert_eq!(reg.len(), 1);
        assert!(reg.mapping_for("com.acme.Oops").is_some());
        assert_eq!(reg.status_for("com.acme.Oops"), None);
    }

    #[test]
    fn test_handled_types_default_to_parameters() {
        let reg = registry(vec![handler_method("onRuntime", &[])], vec![]);
        assert_eq!(reg.mappings()[0].exception_type, "java.lang.RuntimeException");
    }

    #[test]
    fn test_first_declared_handler_wins() {
        let reg = registry(
            vec![
                handler_method("first", &["com.acme.Dup"]).with_marker(AnnotationMarker::ExplicitStatus {
                    code: 409,
                    reason: None,
                }),
                handler_method("second", &["com.acme.Dup"]).with_marker(AnnotationMarker::ExplicitStatus {
                    code: 400,
                    reason: None,
                }),
            ],
            vec![],
        );
        assert_eq!(reg.status_for("com.acme.Dup"), Some(409));
        assert_eq!(reg.mapping_for("com.acme.Dup").unwrap().handler_method, "first");
    }

    #[test]
    fn test_hierarchy_lookup() {
        let index = ClassIndex::from_descriptors(
            vec![
                advice("com.acme.GlobalErrors").with_method(
                    handler_method("onApp", &["com.acme.AppException"]).with_marker(
                        AnnotationMarker::ExplicitStatus {
                            code: 418,
                            reason: None,
                        },
                    ),
                ),
                ClassDescriptor::new("com.acme.TeapotException").with_superclass("com.acme.AppException"),
                ClassDescriptor::new("com.acme.AppException").with_superclass("java.lang.RuntimeException"),
            ],
            &[],
        );
        let reg = AdviceRegistry::from_index(&index);
        assert!(reg.mapping_for("com.acme.TeapotException").is_none());
        assert_eq!(
            reg.mapping_for_hierarchy("com.acme.TeapotException", &index)
                .and_then(|m| m.status),
            Some(418)
        );
    }

    #[test]
    fn test_response_body_type() {
        assert_eq!(
            response_body_type("org.springframework.http.ResponseEntity<com.acme.ErrorBody>"),
            "com.acme.ErrorBody"
        );
        assert_eq!(response_body_type("com.acme.ErrorBody"), "com.acme.ErrorBody");
        assert_eq!(
            response_body_type(RESPONSE_ENTITY),
            RESPONSE_ENTITY
        );
    }

    #[test]
    fn test_non_advice_classes_are_ignored() {
        let class = ClassDescriptor::new("com.acme.Helper")
            .with_method(handler_method("onX", &["com.acme.X"]));
        let reg = AdviceRegistry::from_index(&ClassIndex::from_descriptors(vec![class], &[]));
        assert!(reg.is_empty());
    }
}
