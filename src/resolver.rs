//! Per-endpoint response resolution.
//!
//! For each handler method the resolver enumerates its routes, extracts the
//! bound parameters, derives the success response and assembles the failure
//! set from the scanner, the call-graph walk and the framework's own binding
//! failures. Each failure's final status is decided in a fixed order:
//!
//! 1. a global advice mapping for the type or its nearest ancestor,
//! 2. a status literal at the throw site, or one declared on the exception class,
//! 3. the knowledge base, for the type or its ancestors,
//! 4. `500`.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::advice::response_body_type;
use crate::config::AnalysisConfig;
use crate::context::AnalysisContext;
use crate::descriptor::{erasure, first_type_argument};
use crate::http_status;
use crate::index::SkippedArtifact;
use crate::model::{
    AnnotationMarker, ClassDescriptor, EndpointKey, EndpointResponseModel, Evidence,
    FailureRecord, FailureSet, HttpMethod, MethodDescriptor, OriginLayer, ParameterDescriptor,
    ParameterSource, StatusSource, SuccessResponse,
};
use crate::scanner::status_literal::embedded_status_literals;
use crate::scanner::ExceptionProvenanceScanner;
use crate::walker::CallGraphWalker;

/// Status of a failure no source has an opinion on.
pub const DEFAULT_FAILURE_STATUS: u16 = 500;

/// Description of a failure no source describes.
pub const DEFAULT_DESCRIPTION: &str = "Exception occurred";

/// Wrappers whose first type argument is the actual response body.
const BODY_WRAPPERS: &[&str] = &[
    "org.springframework.http.ResponseEntity",
    "org.springframework.http.HttpEntity",
    "java.util.concurrent.CompletableFuture",
    "java.util.concurrent.CompletionStage",
    "java.util.concurrent.Callable",
    "reactor.core.publisher.Mono",
    "java.util.Optional",
];

const STRING_TYPES: &[&str] = &["java.lang.String", "java.lang.CharSequence"];

pub struct ResponseResolver<'a> {
    ctx: &'a AnalysisContext,
    scanner: ExceptionProvenanceScanner<'a>,
}

impl<'a> ResponseResolver<'a> {
    pub fn new(ctx: &'a AnalysisContext) -> Self {
        Self {
            ctx,
            scanner: ExceptionProvenanceScanner::new(ctx),
        }
    }

    /// Resolves every endpoint of every handler class.
    ///
    /// With `parallel` set, handler methods are resolved on the rayon pool;
    /// the result is identical either way.
    pub fn resolve_all(&self) -> BTreeMap<EndpointKey, EndpointResponseModel> {
        let methods: Vec<(&ClassDescriptor, &MethodDescriptor)> = self
            .ctx
            .index
            .handlers()
            .flat_map(|class| {
                class
                    .methods
                    .iter()
                    .filter(|m| m.endpoint_mapping().is_some())
                    .map(move |m| (class, m))
            })
            .collect();

        let models: Vec<EndpointResponseModel> = if self.ctx.config.parallel {
            methods
                .par_iter()
                .flat_map_iter(|(class, method)| self.resolve(class, method))
                .collect()
        } else {
            methods
                .iter()
                .flat_map(|(class, method)| self.resolve(class, method))
                .collect()
        };

        let mut endpoints = BTreeMap::new();
        for model in models {
            let key = model.key();
            if endpoints.contains_key(&key) {
                debug!(endpoint = %key, "duplicate route ignored");
                continue;
            }
            endpoints.insert(key, model);
        }
        info!(endpoints = endpoints.len(), "endpoints resolved");
        endpoints
    }

    /// One model per route a handler method serves; empty for methods without
    /// a mapping.
    pub fn resolve(
        &self,
        class: &ClassDescriptor,
        method: &MethodDescriptor,
    ) -> Vec<EndpointResponseModel> {
        let Some((declared, paths)) = method.endpoint_mapping() else {
            return Vec::new();
        };
        let http_method = match declared {
            HttpMethod::Any => class_http_method(class),
            other => other,
        };
        let parameters = self.parameters(method);
        let success = self.success_for(method);
        let failures = self.failures_for(method, &parameters);

        route_paths(class.base_paths(), paths)
            .into_iter()
            .map(|path| EndpointResponseModel {
                handler_class: class.name.clone(),
                handler_method: method.name.clone(),
                http_method,
                path,
                parameters: parameters.clone(),
                success: success.clone(),
                failures: failures.clone(),
            })
            .collect()
    }

    /// Resolved, deduplicated failures of the handler and everything the
    /// walker reaches from it, plus binding failures implied by `parameters`.
    pub fn failures_for(
        &self,
        method: &MethodDescriptor,
        parameters: &[ParameterDescriptor],
    ) -> Vec<FailureRecord> {
        let mut raw = CallGraphWalker::new(self.ctx, &self.scanner).walk(method).failures;
        if self.ctx.config.framework_failures {
            raw.extend(framework_failures(parameters));
        }
        // Resolution may give records different statuses, so dedup again.
        let resolved: FailureSet = raw.into_iter().map(|r| self.resolve_status(r)).collect();
        resolved.into_vec()
    }

    /// Decides the final status and description of a record.
    pub fn resolve_status(&self, mut record: FailureRecord) -> FailureRecord {
        let index = &self.ctx.index;
        let mapping = self
            .ctx
            .advice
            .mapping_for_hierarchy(&record.exception_type, index);
        let knowledge = self
            .ctx
            .knowledge
            .lookup_in_hierarchy(&record.exception_type, index);

        let (status, source) = if let Some(code) = mapping.and_then(|m| m.status) {
            (code, StatusSource::Advice)
        } else if let Some(code) = record.site_status {
            (code, StatusSource::ThrowSite)
        } else if let Some(entry) = knowledge {
            (entry.status, StatusSource::KnowledgeBase)
        } else {
            (DEFAULT_FAILURE_STATUS, StatusSource::Default)
        };

        record.http_status = Some(status);
        record.status_source = Some(source);
        record.response_type = mapping.map(|m| m.response_type.clone());
        record.description = record
            .message
            .clone()
            .or_else(|| knowledge.map(|e| e.description.clone()))
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        record
    }

    /// Success status and body type of a handler method.
    pub fn success_for(&self, method: &MethodDescriptor) -> SuccessResponse {
        let status = method
            .explicit_status()
            .or_else(|| {
                embedded_status_literals(&method.instructions)
                    .into_iter()
                    .find(|s| http_status::is_success(*s))
            })
            .unwrap_or(200);
        SuccessResponse {
            status,
            response_type: body_type(method.effective_return_type()),
            description: http_status::reason_phrase(status).to_string(),
        }
    }

    /// Parameters bound from the path, query, headers or body.
    pub fn parameters(&self, method: &MethodDescriptor) -> Vec<ParameterDescriptor> {
        method
            .param_types
            .iter()
            .enumerate()
            .filter_map(|(i, param_type)| {
                let markers = method.parameter_markers.get(i).map(Vec::as_slice).unwrap_or(&[]);
                let fallback = method
                    .parameter_names
                    .get(i)
                    .cloned()
                    .flatten()
                    .unwrap_or_else(|| format!("arg{i}"));
                let validated = markers.iter().any(|m| matches!(m, AnnotationMarker::Validated));
                let (source, name, required, default_value) =
                    markers.iter().find_map(binding)?;
                Some(ParameterDescriptor {
                    name: name.unwrap_or(fallback),
                    source,
                    param_type: param_type.clone(),
                    required,
                    validated,
                    default_value,
                })
            })
            .collect()
    }
}

/// `(source, explicit name, required, default)` of a binding marker.
fn binding(
    marker: &AnnotationMarker,
) -> Option<(ParameterSource, Option<String>, bool, Option<String>)> {
    match marker {
        AnnotationMarker::PathVariable { name, required } => {
            Some((ParameterSource::Path, name.clone(), *required, None))
        }
        AnnotationMarker::RequestParam {
            name,
            required,
            default_value,
        } => Some((
            ParameterSource::Query,
            name.clone(),
            *required,
            default_value.clone(),
        )),
        AnnotationMarker::RequestHeader { name, required } => {
            Some((ParameterSource::Header, name.clone(), *required, None))
        }
        AnnotationMarker::RequestBody { required } => {
            Some((ParameterSource::Body, None, *required, None))
        }
        _ => None,
    }
}

/// Failures the framework raises before the handler body runs.
pub fn framework_failures(parameters: &[ParameterDescriptor]) -> Vec<FailureRecord> {
    let implied = |ty: &str, layer: OriginLayer, message: String| {
        FailureRecord::new(ty, layer, Evidence::FrameworkBinding)
            .with_message(Some(message))
            .with_site_status(Some(400))
    };
    let mut out = Vec::new();
    for p in parameters {
        match p.source {
            ParameterSource::Body => {
                if p.required {
                    out.push(implied(
                        "org.springframework.http.converter.HttpMessageNotReadableException",
                        OriginLayer::ApplicationLayer,
                        "Request body is missing or malformed".to_string(),
                    ));
                }
                if p.validated {
                    out.push(implied(
                        "org.springframework.web.bind.MethodArgumentNotValidException",
                        OriginLayer::ValidationLayer,
                        format!("Validation failed for {}", p.param_type),
                    ));
                }
            }
            ParameterSource::Query if p.required => out.push(implied(
                "org.springframework.web.bind.MissingServletRequestParameterException",
                OriginLayer::ApplicationLayer,
                format!("Required request parameter '{}' is not present", p.name),
            )),
            ParameterSource::Header if p.required => out.push(implied(
                "org.springframework.web.bind.MissingRequestHeaderException",
                OriginLayer::ApplicationLayer,
                format!("Required request header '{}' is not present", p.name),
            )),
            _ => {}
        }
        let converted = matches!(p.source, ParameterSource::Path | ParameterSource::Query);
        if converted && !STRING_TYPES.contains(&erasure(&p.param_type)) {
            out.push(implied(
                "org.springframework.web.method.annotation.MethodArgumentTypeMismatchException",
                OriginLayer::ApplicationLayer,
                format!("Parameter '{}' must be of type {}", p.name, p.param_type),
            ));
        }
    }
    out
}

fn class_http_method(class: &ClassDescriptor) -> HttpMethod {
    class
        .markers
        .iter()
        .find_map(|m| match m {
            AnnotationMarker::EndpointMapping { http_method, .. } => Some(*http_method),
            _ => None,
        })
        .unwrap_or(HttpMethod::Any)
}

/// Body type of a handler return, unwrapping response and async wrappers.
fn body_type(return_type: &str) -> String {
    let mut current = response_body_type(return_type);
    while BODY_WRAPPERS.contains(&erasure(&current)) {
        match first_type_argument(&current) {
            Some(arg) => current = arg.to_string(),
            None => break,
        }
    }
    current
}

/// Every `base × path` combination, normalized to a single leading slash
/// and no trailing slash.
pub fn route_paths(bases: &[String], paths: &[String]) -> Vec<String> {
    let root = [String::new()];
    let bases = if bases.is_empty() { &root[..] } else { bases };
    let paths = if paths.is_empty() { &root[..] } else { paths };
    let mut out = Vec::new();
    for base in bases {
        for path in paths {
            let joined = normalize_path(&format!("{base}/{path}"));
            if !out.contains(&joined) {
                out.push(joined);
            }
        }
    }
    out
}

fn normalize_path(raw: &str) -> String {
    let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// The outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub endpoints: Vec<EndpointResponseModel>,
    pub classes_indexed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_artifacts: Vec<SkippedArtifact>,
}

impl AnalysisReport {
    /// Notice emitted when nothing could be discovered.
    pub const EMPTY_NOTICE: &'static str = "no endpoints discoverable";

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.is_empty().then_some(Self::EMPTY_NOTICE)
    }
}

/// Loads class buffers and resolves every endpoint they define.
pub fn analyze<B: AsRef<[u8]>>(buffers: &[B], config: AnalysisConfig) -> AnalysisReport {
    let ctx = AnalysisContext::load(buffers, config);
    report(&ctx)
}

/// Resolves every endpoint of an already built context.
pub fn report(ctx: &AnalysisContext) -> AnalysisReport {
    let endpoints = ResponseResolver::new(ctx).resolve_all();
    AnalysisReport {
        endpoints: endpoints.into_values().collect(),
        classes_indexed: ctx.index.len(),
        skipped_artifacts: ctx.index.skipped().to_vec(),
    }
}
