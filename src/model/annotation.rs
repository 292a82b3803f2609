//! Annotation values and the closed marker vocabulary.
//!
//! The decoder produces [`RawAnnotation`]s with a typed element map; only
//! annotations from the fixed vocabulary below survive into descriptors, as
//! [`AnnotationMarker`]s.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::http_status;

/// A typed annotation element value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnnotationValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    TypeRef(String),
    EnumConstant { type_name: String, constant: String },
    List(Vec<AnnotationValue>),
    Nested(RawAnnotation),
}

/// An annotation as declared in the class file, before recognition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawAnnotation {
    pub type_name: String,
    pub elements: BTreeMap<String, AnnotationValue>,
}

impl RawAnnotation {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            elements: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.elements.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.elements.get(key)
    }

    /// String values of an element that may be a single string or an array.
    pub fn strings(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(AnnotationValue::String(s)) => vec![s.clone()],
            Some(AnnotationValue::List(items)) => items
                .iter()
                .filter_map(|v| match v {
                    AnnotationValue::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// First non-empty string among the given aliased keys.
    pub fn first_string(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .flat_map(|k| self.strings(k))
            .find(|s| !s.is_empty())
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(AnnotationValue::Bool(b)) => *b,
            _ => default,
        }
    }

    /// Class literals of an element that may be a single class or an array.
    pub fn type_refs(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(AnnotationValue::TypeRef(t)) => vec![t.clone()],
            Some(AnnotationValue::List(items)) => items
                .iter()
                .filter_map(|v| match v {
                    AnnotationValue::TypeRef(t) => Some(t.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Enum constant names of an element that may be single or an array.
    pub fn enum_constants(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(AnnotationValue::EnumConstant { constant, .. }) => vec![constant.clone()],
            Some(AnnotationValue::List(items)) => items
                .iter()
                .filter_map(|v| match v {
                    AnnotationValue::EnumConstant { constant, .. } => Some(constant.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// HTTP method of an endpoint mapping
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
    /// Mapping without a method restriction
    #[default]
    Any,
}

impl HttpMethod {
    /// Parses a request-method enum constant name (`GET`, `POST`, ...).
    pub fn from_constant(name: &str) -> Option<Self> {
        match name {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            "TRACE" => Some(HttpMethod::Trace),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Patch => write!(f, "PATCH"),
            HttpMethod::Delete => write!(f, "DELETE"),
            HttpMethod::Head => write!(f, "HEAD"),
            HttpMethod::Options => write!(f, "OPTIONS"),
            HttpMethod::Trace => write!(f, "TRACE"),
            HttpMethod::Any => write!(f, "ANY"),
        }
    }
}

/// Component stereotypes that make a class eligible for call-graph expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StereotypeKind {
    Service,
    Repository,
    Component,
}

/// A recognized annotation with its literal arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "marker", rename_all = "snake_case")]
pub enum AnnotationMarker {
    HandlerClass,
    Stereotype {
        kind: StereotypeKind,
    },
    ModelType,
    EndpointMapping {
        http_method: HttpMethod,
        paths: Vec<String>,
    },
    PathVariable {
        name: Option<String>,
        required: bool,
    },
    RequestParam {
        name: Option<String>,
        required: bool,
        default_value: Option<String>,
    },
    RequestHeader {
        name: Option<String>,
        required: bool,
    },
    RequestBody {
        required: bool,
    },
    Validated,
    ExplicitStatus {
        code: u16,
        reason: Option<String>,
    },
    AdviceClass {
        base_packages: Vec<String>,
    },
    ExceptionHandler {
        handled_types: Vec<String>,
    },
}

const WEB: &str = "org.springframework.web.bind.annotation.";

/// Sentinel the framework stores for "no default value".
const NO_DEFAULT: &str = "\n\t\t\n\t\t\n\u{E000}\u{E001}\u{E002}\n\t\t\t\t\n";

impl AnnotationMarker {
    /// Maps a raw annotation onto the vocabulary, or `None` if it is not part of it.
    pub fn recognize(raw: &RawAnnotation) -> Option<Self> {
        let name = raw.type_name.as_str();
        match name {
            "org.springframework.stereotype.Controller" => return Some(Self::HandlerClass),
            "org.springframework.stereotype.Service" => {
                return Some(Self::Stereotype {
                    kind: StereotypeKind::Service,
                })
            }
            "org.springframework.stereotype.Repository" => {
                return Some(Self::Stereotype {
                    kind: StereotypeKind::Repository,
                })
            }
            "org.springframework.stereotype.Component" => {
                return Some(Self::Stereotype {
                    kind: StereotypeKind::Component,
                })
            }
            "jakarta.persistence.Entity"
            | "javax.persistence.Entity"
            | "jakarta.persistence.Embeddable"
            | "javax.persistence.Embeddable"
            | "org.springframework.data.mongodb.core.mapping.Document" => {
                return Some(Self::ModelType)
            }
            "jakarta.validation.Valid"
            | "javax.validation.Valid"
            | "org.springframework.validation.annotation.Validated" => {
                return Some(Self::Validated)
            }
            _ => {}
        }

        let local = name.strip_prefix(WEB)?;
        let marker = match local {
            "RestController" | "Controller" => Self::HandlerClass,
            "RequestMapping" => {
                let http_method = raw
                    .enum_constants("method")
                    .first()
                    .and_then(|m| HttpMethod::from_constant(m))
                    .unwrap_or(HttpMethod::Any);
                Self::EndpointMapping {
                    http_method,
                    paths: mapping_paths(raw),
                }
            }
            "GetMapping" => shortcut_mapping(raw, HttpMethod::Get),
            "PostMapping" => shortcut_mapping(raw, HttpMethod::Post),
            "PutMapping" => shortcut_mapping(raw, HttpMethod::Put),
            "PatchMapping" => shortcut_mapping(raw, HttpMethod::Patch),
            "DeleteMapping" => shortcut_mapping(raw, HttpMethod::Delete),
            "PathVariable" => Self::PathVariable {
                name: raw.first_string(&["value", "name"]),
                required: raw.bool_or("required", true),
            },
            "RequestParam" => {
                let default_value = raw
                    .first_string(&["defaultValue"])
                    .filter(|d| d != NO_DEFAULT);
                Self::RequestParam {
                    name: raw.first_string(&["value", "name"]),
                    required: raw.bool_or("required", true) && default_value.is_none(),
                    default_value,
                }
            }
            "RequestHeader" => Self::RequestHeader {
                name: raw.first_string(&["value", "name"]),
                required: raw.bool_or("required", true),
            },
            "RequestBody" => Self::RequestBody {
                required: raw.bool_or("required", true),
            },
            "ResponseStatus" => {
                let code = ["value", "code"]
                    .iter()
                    .flat_map(|k| raw.enum_constants(k))
                    .find_map(|c| http_status::by_constant(&c).map(|s| s.code))
                    .unwrap_or(500);
                Self::ExplicitStatus {
                    code,
                    reason: raw.first_string(&["reason"]),
                }
            }
            "ControllerAdvice" | "RestControllerAdvice" => {
                let mut base_packages = raw.strings("basePackages");
                base_packages.extend(raw.strings("value"));
                Self::AdviceClass { base_packages }
            }
            "ExceptionHandler" => Self::ExceptionHandler {
                handled_types: raw.type_refs("value"),
            },
            _ => return None,
        };
        Some(marker)
    }
}

fn mapping_paths(raw: &RawAnnotation) -> Vec<String> {
    let mut paths = raw.strings("value");
    paths.extend(raw.strings("path"));
    paths
}

fn shortcut_mapping(raw: &RawAnnotation, http_method: HttpMethod) -> AnnotationMarker {
    AnnotationMarker::EndpointMapping {
        http_method,
        paths: mapping_paths(raw),
    }
}
