//! HTTP status codes as they appear in compiled handler code.
//!
//! Status literals show up either as integers (`ResponseEntity.status(201)`)
//! or as constants of the framework's status enum (`HttpStatus.NOT_FOUND`);
//! this table maps between both spellings and the reason phrase.

/// One row of the status table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatusInfo {
    pub code: u16,
    pub constant: &'static str,
    pub reason: &'static str,
}

const fn status(code: u16, constant: &'static str, reason: &'static str) -> HttpStatusInfo {
    HttpStatusInfo {
        code,
        constant,
        reason,
    }
}

const STATUSES: &[HttpStatusInfo] = &[
    status(100, "CONTINUE", "Continue"),
    status(101, "SWITCHING_PROTOCOLS", "Switching Protocols"),
    status(200, "OK", "OK"),
    status(201, "CREATED", "Created"),
    status(202, "ACCEPTED", "Accepted"),
    status(203, "NON_AUTHORITATIVE_INFORMATION", "Non-Authoritative Information"),
    status(204, "NO_CONTENT", "No Content"),
    status(205, "RESET_CONTENT", "Reset Content"),
    status(206, "PARTIAL_CONTENT", "Partial Content"),
    status(207, "MULTI_STATUS", "Multi-Status"),
    status(300, "MULTIPLE_CHOICES", "Multiple Choices"),
    status(301, "MOVED_PERMANENTLY", "Moved Permanently"),
    status(302, "FOUND", "Found"),
    status(303, "SEE_OTHER", "See Other"),
    status(304, "NOT_MODIFIED", "Not Modified"),
    status(307, "TEMPORARY_REDIRECT", "Temporary Redirect"),
    status(308, "PERMANENT_REDIRECT", "Permanent Redirect"),
    status(400, "BAD_REQUEST", "Bad Request"),
    status(401, "UNAUTHORIZED", "Unauthorized"),
    status(402, "PAYMENT_REQUIRED", "Payment Required"),
    status(403, "FORBIDDEN", "Forbidden"),
    status(404, "NOT_FOUND", "Not Found"),
    status(405, "METHOD_NOT_ALLOWED", "Method Not Allowed"),
    status(406, "NOT_ACCEPTABLE", "Not Acceptable"),
    status(407, "PROXY_AUTHENTICATION_REQUIRED", "Proxy Authentication Required"),
    status(408, "REQUEST_TIMEOUT", "Request Timeout"),
    status(409, "CONFLICT", "Conflict"),
    status(410, "GONE", "Gone"),
    status(411, "LENGTH_REQUIRED", "Length Required"),
    status(412, "PRECONDITION_FAILED", "Precondition Failed"),
    status(413, "PAYLOAD_TOO_LARGE", "Payload Too Large"),
    status(414, "URI_TOO_LONG", "URI Too Long"),
    status(415, "UNSUPPORTED_MEDIA_TYPE", "Unsupported Media Type"),
    status(416, "REQUESTED_RANGE_NOT_SATISFIABLE", "Requested Range Not Satisfiable"),
    status(417, "EXPECTATION_FAILED", "Expectation Failed"),
    status(418, "I_AM_A_TEAPOT", "I'm a teapot"),
    status(422, "UNPROCESSABLE_ENTITY", "Unprocessable Entity"),
    status(423, "LOCKED", "Locked"),
    status(424, "FAILED_DEPENDENCY", "Failed Dependency"),
    status(425, "TOO_EARLY", "Too Early"),
    status(426, "UPGRADE_REQUIRED", "Upgrade Required"),
    status(428, "PRECONDITION_REQUIRED", "Precondition Required"),
    status(429, "TOO_MANY_REQUESTS", "Too Many Requests"),
    status(431, "REQUEST_HEADER_FIELDS_TOO_LARGE", "Request Header Fields Too Large"),
    status(451, "UNAVAILABLE_FOR_LEGAL_REASONS", "Unavailable For Legal Reasons"),
    status(500, "INTERNAL_SERVER_ERROR", "Internal Server Error"),
    status(501, "NOT_IMPLEMENTED", "Not Implemented"),
    status(502, "BAD_GATEWAY", "Bad Gateway"),
    status(503, "SERVICE_UNAVAILABLE", "Service Unavailable"),
    status(504, "GATEWAY_TIMEOUT", "Gateway Timeout"),
    status(505, "HTTP_VERSION_NOT_SUPPORTED", "HTTP Version Not Supported"),
    status(507, "INSUFFICIENT_STORAGE", "Insufficient Storage"),
    status(508, "LOOP_DETECTED", "Loop Detected"),
    status(511, "NETWORK_AUTHENTICATION_REQUIRED", "Network Authentication Required"),
];

/// Classes whose static fields are status enum constants.
pub const STATUS_ENUM_TYPES: &[&str] = &[
    "org.springframework.http.HttpStatus",
    "io.micronaut.http.HttpStatus",
];

/// Looks up a status by numeric code.
pub fn by_code(code: u16) -> Option<&'static HttpStatusInfo> {
    STATUSES.iter().find(|s| s.code == code)
}

/// Looks up a status by its enum constant name (`NOT_FOUND`).
pub fn by_constant(constant: &str) -> Option<&'static HttpStatusInfo> {
    STATUSES.iter().find(|s| s.constant == constant)
}

/// Returns the reason phrase for a code, or a class-level fallback.
pub fn reason_phrase(code: u16) -> &'static str {
    match by_code(code) {
        Some(info) => info.reason,
        None => match code {
            100..=199 => "Informational",
            200..=299 => "Success",
            300..=399 => "Redirection",
            400..=499 => "Client Error",
            _ => "Server Error",
        },
    }
}

/// Whether an integer literal is plausibly an HTTP status code.
pub fn is_status_code(value: i64) -> bool {
    (100..=599).contains(&value)
}

/// Whether a code is in the 2xx range.
pub fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}
