//! Type descriptor decoding and encoding.
//!
//! Compiled classes spell types as descriptor tokens (`I`, `[J`,
//! `Ljava/lang/String;`) and, where generics are involved, as signature
//! strings (`Ljava/util/List<Lcom/acme/User;>;`). Everything above the
//! decoder works with canonical dotted names (`int`, `long[]`,
//! `java.lang.String`, `java.util.List<com.acme.User>`).

use thiserror::Error;

/// Errors produced while decoding descriptor or signature strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("empty type descriptor")]
    Empty,

    #[error("invalid type descriptor `{0}`")]
    InvalidType(String),

    #[error("invalid method descriptor `{0}`")]
    InvalidMethod(String),
}

/// Result type for descriptor operations
pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// Primitive descriptor characters and their canonical names.
const PRIMITIVES: &[(char, &str)] = &[
    ('B', "byte"),
    ('C', "char"),
    ('D', "double"),
    ('F', "float"),
    ('I', "int"),
    ('J', "long"),
    ('S', "short"),
    ('Z', "boolean"),
    ('V', "void"),
];

fn primitive_name(tag: char) -> Option<&'static str> {
    PRIMITIVES
        .iter()
        .find(|(c, _)| *c == tag)
        .map(|(_, name)| *name)
}

fn primitive_tag(name: &str) -> Option<char> {
    PRIMITIVES
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(c, _)| *c)
}

/// Converts an internal binary name (`com/acme/User`) to dotted form.
pub fn internal_to_dotted(internal: &str) -> String {
    internal.replace('/', ".")
}

/// Returns the unqualified name of a type, stripping package and outer classes.
///
/// ```
/// use restprobe::descriptor::simple_name;
///
/// assert_eq!(simple_name("java.io.IOException"), "IOException");
/// assert_eq!(simple_name("com.acme.Errors$NotFound"), "NotFound");
/// assert_eq!(simple_name("NotFoundException"), "NotFoundException");
/// ```
pub fn simple_name(name: &str) -> &str {
    let start = name
        .rfind(|c| c == '.' || c == '/' || c == '$')
        .map(|i| i + 1)
        .unwrap_or(0);
    &name[start..]
}

/// Normalizes any spelling of a class name to canonical dotted form.
///
/// Accepts dotted names, internal names and `L...;` descriptors.
pub fn canonical_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.starts_with('L') && trimmed.ends_with(';') && trimmed.len() > 2 {
        return internal_to_dotted(&trimmed[1..trimmed.len() - 1]);
    }
    internal_to_dotted(trimmed)
}

/// Decodes a single field descriptor into its canonical type name.
///
/// ```
/// use restprobe::descriptor::decode_type;
///
/// assert_eq!(decode_type("I").unwrap(), "int");
/// assert_eq!(decode_type("[[Ljava/lang/String;").unwrap(), "java.lang.String[][]");
/// ```
pub fn decode_type(descriptor: &str) -> DescriptorResult<String> {
    if descriptor.is_empty() {
        return Err(DescriptorError::Empty);
    }
    let (ty, rest) = descriptor_prefix(descriptor)?;
    if !rest.is_empty() {
        return Err(DescriptorError::InvalidType(descriptor.to_string()));
    }
    Ok(ty)
}

/// Encodes a canonical type name back into a field descriptor.
pub fn encode_type(name: &str) -> DescriptorResult<String> {
    let mut base = name.trim();
    if base.is_empty() {
        return Err(DescriptorError::Empty);
    }
    let mut dims = 0;
    while let Some(stripped) = base.strip_suffix("[]") {
        dims += 1;
        base = stripped;
    }
    if base.is_empty() || (dims > 0 && base == "void") {
        return Err(DescriptorError::InvalidType(name.to_string()));
    }
    let element = match primitive_tag(base) {
        Some(tag) => tag.to_string(),
        None => format!("L{};", base.replace('.', "/")),
    };
    Ok(format!("{}{}", "[".repeat(dims), element))
}

/// Decodes a method descriptor into `(parameter types, return type)`.
///
/// ```
/// use restprobe::descriptor::decode_method_descriptor;
///
/// let (params, ret) = decode_method_descriptor("(JLjava/lang/String;)V").unwrap();
/// assert_eq!(params, vec!["long", "java.lang.String"]);
/// assert_eq!(ret, "void");
/// ```
pub fn decode_method_descriptor(descriptor: &str) -> DescriptorResult<(Vec<String>, String)> {
    method_with(descriptor, descriptor_prefix)
}

/// Decodes a generic field or class-type signature.
pub fn decode_signature_type(signature: &str) -> DescriptorResult<String> {
    if signature.is_empty() {
        return Err(DescriptorError::Empty);
    }
    let (ty, rest) = signature_prefix(signature)?;
    if !rest.is_empty() {
        return Err(DescriptorError::InvalidType(signature.to_string()));
    }
    Ok(ty)
}

/// Decodes a generic method signature into `(parameter types, return type)`.
///
/// Formal type parameters and `^` throws clauses are skipped.
pub fn decode_method_signature(signature: &str) -> DescriptorResult<(Vec<String>, String)> {
    let body = if signature.starts_with('<') {
        skip_type_parameters(signature)
            .ok_or_else(|| DescriptorError::InvalidMethod(signature.to_string()))?
    } else {
        signature
    };
    method_with(body, signature_prefix)
}

type PrefixParser = fn(&str) -> DescriptorResult<(String, &str)>;

fn method_with(descriptor: &str, parse: PrefixParser) -> DescriptorResult<(Vec<String>, String)> {
    let invalid = || DescriptorError::InvalidMethod(descriptor.to_string());
    let mut rest = descriptor.strip_prefix('(').ok_or_else(invalid)?;
    let mut params = Vec::new();
    loop {
        if let Some(after) = rest.strip_prefix(')') {
            rest = after;
            break;
        }
        if rest.is_empty() {
            return Err(invalid());
        }
        let (param, after) = parse(rest).map_err(|_| invalid())?;
        if param == "void" {
            return Err(invalid());
        }
        params.push(param);
        rest = after;
    }
    let (ret, tail) = parse(rest).map_err(|_| invalid())?;
    if !tail.is_empty() && !tail.starts_with('^') {
        return Err(invalid());
    }
    Ok((params, ret))
}

fn array_dims(input: &str) -> (usize, &str) {
    let rest = input.trim_start_matches('[');
    (input.len() - rest.len(), rest)
}

fn descriptor_prefix(input: &str) -> DescriptorResult<(String, &str)> {
    let (dims, rest) = array_dims(input);
    let head = rest
        .chars()
        .next()
        .ok_or_else(|| DescriptorError::InvalidType(input.to_string()))?;

    let (base, rest) = if head == 'L' {
        let end = rest
            .find(';')
            .ok_or_else(|| DescriptorError::InvalidType(input.to_string()))?;
        let internal = &rest[1..end];
        if internal.is_empty() {
            return Err(DescriptorError::InvalidType(input.to_string()));
        }
        (internal_to_dotted(internal), &rest[end + 1..])
    } else {
        let name =
            primitive_name(head).ok_or_else(|| DescriptorError::InvalidType(input.to_string()))?;
        (name.to_string(), &rest[1..])
    };

    if dims > 0 && base == "void" {
        return Err(DescriptorError::InvalidType(input.to_string()));
    }
    Ok((format!("{}{}", base, "[]".repeat(dims)), rest))
}

fn signature_prefix(input: &str) -> DescriptorResult<(String, &str)> {
    let (dims, rest) = array_dims(input);
    let head = rest
        .chars()
        .next()
        .ok_or_else(|| DescriptorError::InvalidType(input.to_string()))?;

    let (base, rest) = match head {
        'L' => class_signature(&rest[1..])?,
        'T' => {
            let end = rest
                .find(';')
                .ok_or_else(|| DescriptorError::InvalidType(input.to_string()))?;
            (rest[1..end].to_string(), &rest[end + 1..])
        }
        other => {
            let name = primitive_name(other)
                .ok_or_else(|| DescriptorError::InvalidType(input.to_string()))?;
            (name.to_string(), &rest[1..])
        }
    };
    Ok((format!("{}{}", base, "[]".repeat(dims)), rest))
}

fn class_signature(input: &str) -> DescriptorResult<(String, &str)> {
    let mut out = String::new();
    let mut rest = input;
    loop {
        let stop = rest
            .find(|c| matches!(c, '<' | ';' | '.'))
            .ok_or_else(|| DescriptorError::InvalidType(input.to_string()))?;
        out.push_str(&internal_to_dotted(&rest[..stop]));
        let delimiter = rest.as_bytes()[stop];
        rest = &rest[stop + 1..];
        match delimiter {
            b';' => return Ok((out, rest)),
            b'.' => out.push('$'),
            _ => {
                let mut args = Vec::new();
                while !rest.starts_with('>') {
                    let (arg, after) = type_argument(rest)?;
                    args.push(arg);
                    rest = after;
                }
                rest = &rest[1..];
                out.push('<');
                out.push_str(&args.join(", "));
                out.push('>');
            }
        }
    }
}

fn type_argument(input: &str) -> DescriptorResult<(String, &str)> {
    if let Some(rest) = input.strip_prefix('*') {
        return Ok(("?".to_string(), rest));
    }
    if let Some(rest) = input.strip_prefix('+') {
        let (bound, rest) = signature_prefix(rest)?;
        return Ok((format!("? extends {bound}"), rest));
    }
    if let Some(rest) = input.strip_prefix('-') {
        let (bound, rest) = signature_prefix(rest)?;
        return Ok((format!("? super {bound}"), rest));
    }
    signature_prefix(input)
}

fn skip_type_parameters(signature: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (i, c) in signature.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&signature[i + 1..]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Returns the first generic argument of a parameterized type name.
///
/// `org.springframework.http.ResponseEntity<com.acme.User>` yields
/// `com.acme.User`; nested arguments are kept intact.
pub fn first_type_argument(name: &str) -> Option<&str> {
    let open = name.find('<')?;
    let inner = name.strip_suffix('>')?.get(open + 1..)?;
    let mut depth = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some(inner[..i].trim()),
            _ => {}
        }
    }
    Some(inner.trim())
}

/// Strips generic arguments from a type name.
pub fn erasure(name: &str) -> &str {
    match name.find('<') {
        Some(i) => &name[..i],
        None => name,
    }
}
