//! Per-method exception provenance scanning.
//!
//! The scanner reads a single method's instruction stream and reports every
//! failure it can attribute: direct throws, optional unwraps, precondition
//! and null-check helpers, finder calls on data-access receivers, and the
//! checked exceptions the method declares. It never follows calls; that is
//! the walker's job.

pub mod idioms;
pub mod status_literal;
pub mod throw_state;

use tracing::debug;

use crate::context::AnalysisContext;
use crate::descriptor::erasure;
use crate::model::{
    Evidence, FailureRecord, FailureSet, Instruction, MethodDescriptor, OriginLayer,
};

use idioms::{is_finder_call, is_optional_unwrap, optional_unwrap_type, PreconditionDetector};
use throw_state::{ExceptionTypes, ThrowTracker};

/// Exception types whose constructors take the response status.
const STATUS_CARRYING: &[&str] = &[
    "org.springframework.web.server.ResponseStatusException",
    "org.springframework.web.ErrorResponseException",
];

pub struct ExceptionProvenanceScanner<'a> {
    ctx: &'a AnalysisContext,
    preconditions: PreconditionDetector,
}

impl<'a> ExceptionProvenanceScanner<'a> {
    pub fn new(ctx: &'a AnalysisContext) -> Self {
        Self {
            ctx,
            preconditions: PreconditionDetector::new(),
        }
    }

    /// Whether `ty` names an exception: by suffix, as the throwable root, as a
    /// knowledge-base type, or through an indexed exception-like ancestor.
    pub fn is_exception_like(&self, ty: &str) -> bool {
        let name = erasure(ty);
        has_exception_name(name)
            || self.ctx.knowledge.contains(name)
            || self
                .ctx
                .index
                .ancestors(name)
                .iter()
                .any(|a| has_exception_name(a))
    }

    /// Status an exception class declares for itself, searching its ancestors.
    fn declared_status(&self, exception_type: &str) -> Option<u16> {
        let index = &self.ctx.index;
        std::iter::once(exception_type.to_string())
            .chain(index.ancestors(exception_type))
            .find_map(|ty| index.class_by_name(&ty).and_then(|c| c.explicit_status()))
    }

    pub fn scan(&self, method: &MethodDescriptor) -> FailureSet {
        let config = &self.ctx.config;
        let signature = method.signature();
        let instructions = &method.instructions;
        let is_exception_like = |ty: &str| self.is_exception_like(ty);
        let record = |ty: &str, layer: OriginLayer, evidence: Evidence| {
            FailureRecord::new(ty, layer, evidence).with_method(signature.clone())
        };

        let mut failures = FailureSet::new();
        let mut tracker = ThrowTracker::new();
        for (pos, instruction) in instructions.iter().enumerate() {
            if let Some(thrown) = tracker.step(instructions, pos, self) {
                let status = thrown
                    .status
                    .or_else(|| self.declared_status(&thrown.exception_type));
                failures.insert(
                    record(&thrown.exception_type, OriginLayer::ControllerLayer, Evidence::DirectThrow)
                        .with_message(thrown.message)
                        .with_site_status(status),
                );
            }

            let Instruction::InvokeMethod(callee) = instruction else {
                continue;
            };
            if config.finder_heuristic && is_finder_call(callee, &self.ctx.index) {
                failures.insert(record(
                    &config.finder_exception,
                    OriginLayer::DataAccessLayer,
                    Evidence::FinderHeuristic,
                ));
            }
            if is_optional_unwrap(callee) {
                match optional_unwrap_type(
                    instructions,
                    pos,
                    config.unwrap_window,
                    &self.ctx.index,
                    is_exception_like,
                ) {
                    Some(ty) => {
                        let status = self.declared_status(&ty);
                        failures.insert(
                            record(&ty, OriginLayer::DataAccessLayer, Evidence::OptionalUnwrap)
                                .with_site_status(status),
                        );
                    }
                    None => debug!(method = %signature, pos, "unwrap supplier not resolved"),
                }
            } else if let Some(hit) = self.preconditions.detect(callee) {
                failures.insert(record(&hit.exception_type, hit.origin_layer, hit.evidence));
            }
        }

        for declared in &method.declared_exceptions {
            let status = self.declared_status(declared);
            failures.insert(
                record(declared, OriginLayer::MethodSignature, Evidence::DeclaredThrows)
                    .with_site_status(status),
            );
        }
        failures
    }
}

impl ExceptionTypes for ExceptionProvenanceScanner<'_> {
    fn is_exception_like(&self, ty: &str) -> bool {
        ExceptionProvenanceScanner::is_exception_like(self, ty)
    }

    fn carries_status(&self, ty: &str) -> bool {
        let name = erasure(ty);
        STATUS_CARRYING.contains(&name)
            || self
                .ctx
                .index
                .ancestors(name)
                .iter()
                .any(|a| STATUS_CARRYING.contains(&a.as_str()))
    }
}

fn has_exception_name(name: &str) -> bool {
    name.ends_with("Exception") || name.ends_with("Error") || name == "java.lang.Throwable"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::model::{AnnotationMarker, CallSite, ClassDescriptor, Confidence, InvokeKind, MethodRef};

    fn scan_one(classes: Vec<ClassDescriptor>, m: &MethodDescriptor) -> Vec<FailureRecord> {
        let ctx = context(classes);
        ExceptionProvenanceScanner::new(&ctx).scan(m).into_vec()
    }

    #[test]
    fn test_direct_throw_in_handler() {
        let m = method("com.acme.UserController", "get", "(J)Lcom/acme/User;")
            .with_instructions(throw_new("com.acme.NotFoundException", Some("user not found")));
        let found = scan_one(vec![], &m);
        assert_eq!(found.len(), 1);
        let r = &found[0];
        assert_eq!(r.exception_type, "com.acme.NotFoundException");
        assert_eq!(r.origin_layer, OriginLayer::ControllerLayer);
        assert_eq!(r.evidence, Evidence::DirectThrow);
        assert_eq!(r.message.as_deref(), Some("user not found"));
        assert_eq!(r.method, Some(m.signature()));
        assert_eq!(r.http_status, None);
    }

    #[test]
    fn test_exception_like_by_ancestry() {
        let classes = vec![
            ClassDescriptor::new("com.acme.Missing").with_superclass("com.acme.AppFailure"),
            ClassDescriptor::new("com.acme.AppFailure").with_superclass("java.lang.RuntimeException"),
        ];
        let ctx = context(classes);
        let scanner = ExceptionProvenanceScanner::new(&ctx);
        assert!(scanner.is_exception_like("com.acme.Missing"));
        assert!(scanner.is_exception_like("java.lang.Throwable"));
        assert!(!scanner.is_exception_like("com.acme.User"));
    }

    #[test]
    fn test_class_level_status_is_site_status() {
        let classes = vec![ClassDescriptor::new("com.acme.GoneException").with_marker(
            AnnotationMarker::ExplicitStatus {
                code: 410,
                reason: None,
            },
        )];
        let m = method("com.acme.C", "h", "()V").with_instructions(throw_new("com.acme.GoneException", None));
        let found = scan_one(classes, &m);
        assert_eq!(found[0].site_status, Some(410));
        assert_eq!(found[0].http_status, Some(410));
    }

    #[test]
    fn test_status_carrying_by_ancestry() {
        let classes = vec![ClassDescriptor::new("com.acme.QuotaException")
            .with_superclass("org.springframework.web.server.ResponseStatusException")];
        let m = method("com.acme.C", "h", "()V").with_instructions(vec![
            new_obj("com.acme.QuotaException"),
            dup(),
            int(429),
            init("com.acme.QuotaException", "(I)V"),
            Instruction::Throw,
            new_obj("com.acme.LimitException"),
            dup(),
            int(429),
            init("com.acme.LimitException", "(I)V"),
            Instruction::Throw,
        ]);
        let found = scan_one(classes, &m);
        let status_of = |name: &str| found.iter().find(|r| r.simple_name() == name).and_then(|r| r.site_status);
        assert_eq!(status_of("QuotaException"), Some(429));
        assert_eq!(status_of("LimitException"), None);
    }

    #[test]
    fn test_declared_throws() {
        let m = method("com.acme.FileController", "read", "()V").with_exception("java.io.IOException");
        let found = scan_one(vec![], &m);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].origin_layer, OriginLayer::MethodSignature);
        assert_eq!(found[0].evidence, Evidence::DeclaredThrows);
    }

    #[test]
    fn test_precondition_and_null_check() {
        let m = method("com.acme.C", "h", "(Ljava/lang/Object;)V").with_instructions(vec![
            invoke_static("java.util.Objects", "requireNonNull", "(Ljava/lang/Object;)Ljava/lang/Object;"),
            invoke_static("org.springframework.util.Assert", "isTrue", "(ZLjava/lang/String;)V"),
            Instruction::Return,
        ]);
        let found = scan_one(vec![], &m);
        let types: Vec<_> = found.iter().map(|r| r.simple_name()).collect();
        assert!(types.contains(&"NullPointerException"));
        assert!(types.contains(&"IllegalArgumentException"));
        assert!(found.iter().all(|r| r.origin_layer == OriginLayer::ValidationLayer));
    }

    #[test]
    fn test_unwrap_replaces_finder_heuristic() {
        let repo = ClassDescriptor::new("com.acme.UserRepository")
            .as_interface()
            .with_interface("org.springframework.data.jpa.repository.JpaRepository");
        let ctor = MethodRef::new(
            "jakarta.persistence.EntityNotFoundException",
            "<init>",
            "()V",
            InvokeKind::Special,
        )
        .unwrap();
        let m = method("com.acme.UserService", "find", "(J)Lcom/acme/User;").with_instructions(vec![
            invoke_interface(
                "com.acme.UserRepository",
                "findById",
                "(Ljava/lang/Object;)Ljava/util/Optional;",
            ),
            Instruction::InvokeDynamic(CallSite {
                name: "get".into(),
                descriptor: "()Ljava/util/function/Supplier;".into(),
                bound: Some(ctor),
            }),
            invoke(
                "java.util.Optional",
                "orElseThrow",
                "(Ljava/util/function/Supplier;)Ljava/lang/Object;",
            ),
            Instruction::Return,
        ]);
        let found = scan_one(vec![repo], &m);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].evidence, Evidence::OptionalUnwrap);
        assert_eq!(found[0].confidence, Confidence::Confirmed);
        assert_eq!(found[0].origin_layer, OriginLayer::DataAccessLayer);
    }

    #[test]
    fn test_finder_heuristic_alone() {
        let repo = ClassDescriptor::new("com.acme.UserRepository")
            .as_interface()
            .with_interface("org.springframework.data.repository.CrudRepository");
        let m = method("com.acme.UserService", "all", "()V").with_instructions(vec![
            invoke_interface("com.acme.UserRepository", "findAll", "()Ljava/lang/Iterable;"),
            Instruction::Return,
        ]);
        let found = scan_one(vec![repo], &m);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].exception_type, "jakarta.persistence.EntityNotFoundException");
        assert_eq!(found[0].confidence, Confidence::Heuristic);
    }

    #[test]
    fn test_finder_heuristic_can_be_disabled() {
        let repo = ClassDescriptor::new("com.acme.UserRepository")
            .as_interface()
            .with_interface("org.springframework.data.repository.CrudRepository");
        let m = method("com.acme.UserService", "all", "()V").with_instructions(vec![invoke_interface(
            "com.acme.UserRepository",
            "findAll",
            "()Ljava/lang/Iterable;",
        )]);
        let mut config = crate::config::AnalysisConfig::default();
        config.finder_heuristic = false;
        let ctx = context_with(vec![repo], config);
        assert!(ExceptionProvenanceScanner::new(&ctx).scan(&m).is_empty());
    }

    #[test]
    fn test_same_type_thrown_twice_is_one_record() {
        let mut instrs = throw_new("com.acme.BadRequestException", Some("a"));
        instrs.extend(throw_new("com.acme.BadRequestException", Some("b")));
        let m = method("com.acme.C", "h", "()V").with_instructions(instrs);
        let found = scan_one(vec![], &m);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message.as_deref(), Some("a"));
    }
}
