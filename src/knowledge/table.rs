//! Built-in exception type to status table.
//!
//! Rows are `(fully qualified type, status, description)`. When two rows share
//! a simple name the earlier one answers simple-name lookups.

pub(crate) const BUILTIN: &[(&str, u16, &str)] = &[
    // Argument and state
    ("java.lang.IllegalArgumentException", 400, "Invalid argument supplied"),
    ("java.lang.IllegalStateException", 400, "Operation not valid in the current state"),
    ("java.lang.NumberFormatException", 400, "Malformed numeric value"),
    ("java.lang.IndexOutOfBoundsException", 400, "Index out of range"),
    ("java.lang.ArrayIndexOutOfBoundsException", 400, "Index out of range"),
    ("java.time.format.DateTimeParseException", 400, "Malformed date or time value"),
    ("java.lang.UnsupportedOperationException", 501, "Operation not supported"),
    ("java.lang.NullPointerException", 500, "Required value was null"),
    ("java.lang.AssertionError", 500, "Internal assertion failed"),
    ("java.util.NoSuchElementException", 404, "Requested element not found"),
    // Bean validation
    ("jakarta.validation.ValidationException", 400, "Validation failed"),
    ("javax.validation.ValidationException", 400, "Validation failed"),
    ("jakarta.validation.ConstraintViolationException", 400, "Constraint violation"),
    ("javax.validation.ConstraintViolationException", 400, "Constraint violation"),
    ("org.springframework.validation.BindException", 400, "Request binding failed"),
    ("org.springframework.web.bind.MethodArgumentNotValidException", 400, "Request body validation failed"),
    // Web binding
    ("org.springframework.http.converter.HttpMessageNotReadableException", 400, "Malformed or missing request body"),
    ("org.springframework.web.bind.MissingServletRequestParameterException", 400, "Required request parameter missing"),
    ("org.springframework.web.bind.MissingRequestHeaderException", 400, "Required request header missing"),
    ("org.springframework.web.bind.MissingPathVariableException", 500, "Path variable not bound"),
    ("org.springframework.web.bind.ServletRequestBindingException", 400, "Request binding failed"),
    ("org.springframework.web.method.annotation.MethodArgumentTypeMismatchException", 400, "Argument type mismatch"),
    ("org.springframework.beans.TypeMismatchException", 400, "Argument type mismatch"),
    ("org.springframework.web.server.ServerWebInputException", 400, "Invalid request input"),
    ("org.springframework.web.multipart.MaxUploadSizeExceededException", 413, "Upload too large"),
    ("org.springframework.web.HttpRequestMethodNotSupportedException", 405, "HTTP method not supported"),
    ("org.springframework.web.HttpMediaTypeNotSupportedException", 415, "Media type not supported"),
    ("org.springframework.web.HttpMediaTypeNotAcceptableException", 406, "Media type not acceptable"),
    ("org.springframework.web.servlet.NoHandlerFoundException", 404, "No handler found"),
    ("org.springframework.web.servlet.resource.NoResourceFoundException", 404, "Resource not found"),
    ("org.springframework.web.server.ResponseStatusException", 500, "Response status error"),
    // Not found family
    ("jakarta.persistence.EntityNotFoundException", 404, "Entity not found"),
    ("javax.persistence.EntityNotFoundException", 404, "Entity not found"),
    ("jakarta.persistence.NoResultException", 404, "No result found"),
    ("javax.persistence.NoResultException", 404, "No result found"),
    ("org.springframework.dao.EmptyResultDataAccessException", 404, "No result found"),
    ("java.io.FileNotFoundException", 404, "File not found"),
    ("NotFoundException", 404, "Resource not found"),
    ("ResourceNotFoundException", 404, "Resource not found"),
    ("UserNotFoundException", 404, "User not found"),
    // Security
    ("org.springframework.security.core.AuthenticationException", 401, "Authentication required"),
    ("org.springframework.security.authentication.BadCredentialsException", 401, "Bad credentials"),
    ("org.springframework.security.authentication.InsufficientAuthenticationException", 401, "Authentication required"),
    ("org.springframework.security.access.AccessDeniedException", 403, "Access denied"),
    ("org.springframework.security.authorization.AuthorizationDeniedException", 403, "Access denied"),
    ("java.lang.SecurityException", 403, "Access denied"),
    ("UnauthorizedException", 401, "Authentication required"),
    ("ForbiddenException", 403, "Access denied"),
    // Conflict and integrity
    ("org.springframework.dao.DataIntegrityViolationException", 409, "Data integrity violation"),
    ("org.springframework.dao.DuplicateKeyException", 409, "Duplicate key"),
    ("org.springframework.dao.OptimisticLockingFailureException", 409, "Concurrent modification"),
    ("jakarta.persistence.OptimisticLockException", 409, "Concurrent modification"),
    ("javax.persistence.OptimisticLockException", 409, "Concurrent modification"),
    ("jakarta.persistence.EntityExistsException", 409, "Entity already exists"),
    ("javax.persistence.EntityExistsException", 409, "Entity already exists"),
    ("org.hibernate.exception.ConstraintViolationException", 409, "Database constraint violation"),
    ("ConflictException", 409, "Resource conflict"),
    ("DuplicateResourceException", 409, "Resource already exists"),
    ("BadRequestException", 400, "Bad request"),
    // Generic
    ("org.springframework.dao.DataAccessException", 500, "Data access failure"),
    ("java.sql.SQLException", 500, "Database error"),
    ("java.io.IOException", 500, "I/O failure"),
    ("java.io.UncheckedIOException", 500, "I/O failure"),
    ("java.util.concurrent.TimeoutException", 504, "Operation timed out"),
    ("java.lang.RuntimeException", 500, "Internal server error"),
    ("java.lang.Exception", 500, "Internal server error"),
    ("java.lang.Throwable", 500, "Internal server error"),
];
