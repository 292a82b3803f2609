//! Status literals embedded in instruction streams.
//!
//! Handler and advice code spells statuses as integers passed to a status
//! consumer (`ResponseEntity.status(404)`), as status enum constants
//! (`HttpStatus.NOT_FOUND`) or through `ResponseEntity` shortcut builders
//! (`ResponseEntity.notFound()`).

use crate::descriptor::erasure;
use crate::http_status::{self, STATUS_ENUM_TYPES};
use crate::model::{Constant, FieldRef, Instruction, MethodRef};

const RESPONSE_ENTITY: &str = "org.springframework.http.ResponseEntity";

/// How far after an integer literal a consumer may appear.
const CONSUMER_LOOKAHEAD: usize = 3;

const STATUS_CONSUMERS: &[&str] = &["status", "withStatus", "setStatus", "sendError"];

/// Integer to status conversions; only meaningful on status types.
const STATUS_FACTORIES: &[&str] = &["valueOf", "resolve"];

const STATUS_CODE_TYPE: &str = "org.springframework.http.HttpStatusCode";

const SHORTCUTS: &[(&str, u16)] = &[
    ("ok", 200),
    ("created", 201),
    ("accepted", 202),
    ("noContent", 204),
    ("badRequest", 400),
    ("notFound", 404),
    ("unprocessableEntity", 422),
    ("internalServerError", 500),
];

/// Status code of a status enum constant read.
pub fn status_constant(field: &FieldRef) -> Option<u16> {
    if !STATUS_ENUM_TYPES.contains(&field.owner.as_str()) {
        return None;
    }
    http_status::by_constant(&field.name).map(|s| s.code)
}

/// Integer constant in the HTTP status range.
fn int_status(constant: &Constant) -> Option<u16> {
    constant
        .as_integer()
        .filter(|v| http_status::is_status_code(*v))
        .and_then(|v| u16::try_from(v).ok())
}

fn is_status_consumer(method: &MethodRef) -> bool {
    let owner = erasure(&method.owner);
    if STATUS_CONSUMERS.contains(&method.name.as_str()) {
        return true;
    }
    if STATUS_FACTORIES.contains(&method.name.as_str()) {
        return owner == STATUS_CODE_TYPE || STATUS_ENUM_TYPES.contains(&owner);
    }
    method.is_constructor() && (owner == RESPONSE_ENTITY || owner.ends_with("Exception"))
}

fn shortcut_status(method: &MethodRef) -> Option<u16> {
    if erasure(&method.owner) != RESPONSE_ENTITY {
        return None;
    }
    SHORTCUTS
        .iter()
        .find(|(name, _)| *name == method.name)
        .map(|(_, code)| *code)
}

/// Status literal carried by the instruction at `pos`, if any.
pub fn status_at(instructions: &[Instruction], pos: usize) -> Option<u16> {
    match instructions.get(pos)? {
        Instruction::GetStatic(field) => status_constant(field),
        Instruction::LoadConstant(constant) => {
            let code = int_status(constant)?;
            let end = (pos + 1 + CONSUMER_LOOKAHEAD).min(instructions.len());
            instructions[pos + 1..end]
                .iter()
                .filter_map(Instruction::invoked)
                .any(is_status_consumer)
                .then_some(code)
        }
        Instruction::InvokeMethod(method) => shortcut_status(method),
        _ => None,
    }
}

/// Every status literal in the stream, in instruction order.
pub fn embedded_status_literals(instructions: &[Instruction]) -> Vec<u16> {
    (0..instructions.len())
        .filter_map(|pos| status_at(instructions, pos))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    #[test]
    fn test_int_literal_needs_consumer() {
        let with_consumer = vec![
            int(404),
            invoke_static(RESPONSE_ENTITY, "status", "(I)Lorg/springframework/http/ResponseEntity$BodyBuilder;"),
        ];
        assert_eq!(embedded_status_literals(&with_consumer), vec![404]);

        // A bare 404 elsewhere is just a number.
        let bare = vec![int(404), invoke("java.util.List", "get", "(I)Ljava/lang/Object;")];
        assert!(embedded_status_literals(&bare).is_empty());
    }

    #[test]
    fn test_out_of_range_int_is_ignored() {
        let instrs = vec![int(42), invoke_static(RESPONSE_ENTITY, "status", "(I)Lorg/springframework/http/ResponseEntity$BodyBuilder;")];
        assert!(embedded_status_literals(&instrs).is_empty());
    }

    #[test]
    fn test_status_enum_constant() {
        let instrs = vec![
            http_status_field("UNPROCESSABLE_ENTITY"),
            invoke_static(
                RESPONSE_ENTITY,
                "status",
                "(Lorg/springframework/http/HttpStatusCode;)Lorg/springframework/http/ResponseEntity$BodyBuilder;",
            ),
        ];
        assert_eq!(embedded_status_literals(&instrs), vec![422]);
        assert_eq!(
            status_constant(&FieldRef {
                owner: "com.acme.Codes".into(),
                name: "NOT_FOUND".into(),
                field_type: "com.acme.Codes".into(),
            }),
            None
        );
    }

    #[test]
    fn test_response_entity_shortcuts() {
        let instrs = vec![
            invoke_static(RESPONSE_ENTITY, "created", "(Ljava/net/URI;)Lorg/springframework/http/ResponseEntity$BodyBuilder;"),
            invoke_static(RESPONSE_ENTITY, "noContent", "()Lorg/springframework/http/ResponseEntity$HeadersBuilder;"),
        ];
        assert_eq!(embedded_status_literals(&instrs), vec![201, 204]);
    }

    #[test]
    fn test_exception_constructor_consumes_status() {
        let instrs = vec![
            new_obj("com.acme.ApiException"),
            dup(),
            int(409),
            ldc("taken"),
            init("com.acme.ApiException", "(ILjava/lang/String;)V"),
        ];
        assert_eq!(status_at(&instrs, 2), Some(409));
    }
}
