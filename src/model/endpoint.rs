//! Per-endpoint response model handed to renderers.

use serde::Serialize;

use super::{FailureRecord, HttpMethod};

/// Key of an endpoint: `(handler class, http method, path)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EndpointKey {
    pub handler_class: String,
    pub http_method: HttpMethod,
    pub path: String,
}

impl std::fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.http_method, self.path, self.handler_class)
    }
}

/// Where a handler parameter is bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSource {
    Path,
    Query,
    Header,
    Body,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub source: ParameterSource,
    pub param_type: String,
    pub required: bool,
    pub validated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessResponse {
    pub status: u16,
    #[serde(rename = "type")]
    pub response_type: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointResponseModel {
    pub handler_class: String,
    pub handler_method: String,
    pub http_method: HttpMethod,
    pub path: String,
    pub parameters: Vec<ParameterDescriptor>,
    pub success: SuccessResponse,
    pub failures: Vec<FailureRecord>,
}

impl EndpointResponseModel {
    pub fn key(&self) -> EndpointKey {
        EndpointKey {
            handler_class: self.handler_class.clone(),
            http_method: self.http_method,
            path: self.path.clone(),
        }
    }

    /// Failures with the given simple or qualified exception name.
    pub fn failures_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FailureRecord> {
        self.failures
            .iter()
            .filter(move |f| f.exception_type == name || f.simple_name() == name)
    }
}
