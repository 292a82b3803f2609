//! Stateless detectors for exception-raising idioms.

use regex::Regex;
use tracing::warn;

use crate::index::ClassIndex;
use crate::model::{Evidence, Instruction, MethodRef, OriginLayer};

const NO_SUCH_ELEMENT: &str = "java.util.NoSuchElementException";

/// Optional-like types and their unwrap-or-throw methods.
const OPTIONAL_UNWRAPS: &[(&str, &str)] = &[
    ("java.util.Optional", "orElseThrow"),
    ("java.util.OptionalInt", "orElseThrow"),
    ("java.util.OptionalLong", "orElseThrow"),
    ("java.util.OptionalDouble", "orElseThrow"),
    ("io.vavr.control.Option", "getOrElseThrow"),
    ("io.vavr.control.Try", "getOrElseThrow"),
];

/// A raw idiom hit before it becomes a failure record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdiomHit {
    pub exception_type: String,
    pub origin_layer: OriginLayer,
    pub evidence: Evidence,
}

impl IdiomHit {
    fn new(exception_type: &str, origin_layer: OriginLayer, evidence: Evidence) -> Self {
        Self {
            exception_type: exception_type.to_string(),
            origin_layer,
            evidence,
        }
    }
}

pub fn is_optional_unwrap(method: &MethodRef) -> bool {
    OPTIONAL_UNWRAPS
        .iter()
        .any(|(owner, name)| method.owner == *owner && method.name == *name)
}

/// Resolves the exception an unwrap-or-throw at `pos` raises.
///
/// The supplier is looked up from the nearest preceding `invokedynamic`
/// within `window` instructions: a constructor reference names the type
/// directly, a lambda body is looked up in `index` and scanned for the
/// exception it constructs. Without a call site the window of the current
/// stream is searched for a constructed exception. A no-argument unwrap
/// raises `NoSuchElementException`.
pub fn optional_unwrap_type<F>(
    instructions: &[Instruction],
    pos: usize,
    window: usize,
    index: &ClassIndex,
    is_exception_like: F,
) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let Some(Instruction::InvokeMethod(method)) = instructions.get(pos) else {
        return None;
    };
    if method.param_types.is_empty() {
        return Some(NO_SUCH_ELEMENT.to_string());
    }

    let start = pos.saturating_sub(window);
    let preceding = &instructions[start..pos];
    // Call sites without a bound implementation (string concatenation and
    // the like) cannot be the supplier.
    let bound = preceding.iter().rev().find_map(|i| match i {
        Instruction::InvokeDynamic(site) => site.bound.as_ref(),
        _ => None,
    });

    if let Some(bound) = bound {
        if bound.is_constructor() {
            return Some(bound.owner.clone());
        }
        let body = index.method_by_signature(&bound.owner, &bound.name, &bound.descriptor)?;
        let end = window.min(body.instructions.len());
        return constructed_exception(&body.instructions[..end], &is_exception_like);
    }
    constructed_exception(preceding, &is_exception_like)
}

/// The exception type constructed in `instructions`: a `new T` followed by
/// `T.<init>`, else the last exception-like `new T`.
fn constructed_exception<F>(instructions: &[Instruction], is_exception_like: &F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let mut fallback = None;
    for (i, instruction) in instructions.iter().enumerate() {
        let Instruction::NewObject(ty) = instruction else {
            continue;
        };
        if !is_exception_like(ty) {
            continue;
        }
        let initialized = instructions[i + 1..].iter().any(|next| {
            matches!(next, Instruction::InvokeMethod(m) if m.is_constructor() && &m.owner == ty)
        });
        if initialized {
            return Some(ty.clone());
        }
        fallback = Some(ty.clone());
    }
    fallback
}

/// A precondition helper matched against `owner#name`.
#[derive(Debug)]
pub struct PreconditionPattern {
    regex: Regex,
    exception_type: &'static str,
    evidence: Evidence,
}

impl PreconditionPattern {
    pub fn try_new(
        pattern: &str,
        exception_type: &'static str,
        evidence: Evidence,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            exception_type,
            evidence,
        })
    }

    pub fn matches(&self, target: &str) -> bool {
        self.regex.is_match(target)
    }
}

/// Precondition and null-check helpers, first match wins.
#[derive(Debug)]
pub struct PreconditionDetector {
    patterns: Vec<PreconditionPattern>,
}

impl Default for PreconditionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PreconditionDetector {
    pub fn new() -> Self {
        Self {
            patterns: Self::default_patterns(),
        }
    }

    fn default_patterns() -> Vec<PreconditionPattern> {
        const IAE: &str = "java.lang.IllegalArgumentException";
        const ISE: &str = "java.lang.IllegalStateException";
        const IOOBE: &str = "java.lang.IndexOutOfBoundsException";
        const NPE: &str = "java.lang.NullPointerException";
        const AE: &str = "java.lang.AssertionError";
        let table: &[(&str, &str, Evidence)] = &[
            (r"^org\.springframework\.util\.Assert#state$", ISE, Evidence::Precondition),
            (r"^org\.springframework\.util\.Assert#\w+$", IAE, Evidence::Precondition),
            (r"^com\.google\.common\.base\.Preconditions#checkArgument$", IAE, Evidence::Precondition),
            (r"^com\.google\.common\.base\.Preconditions#checkState$", ISE, Evidence::Precondition),
            (r"^com\.google\.common\.base\.Preconditions#checkNotNull$", NPE, Evidence::NullCheck),
            (r"^com\.google\.common\.base\.Preconditions#check(Element|Position)Index(es)?$", IOOBE, Evidence::Precondition),
            (r"^java\.util\.Objects#requireNonNull$", NPE, Evidence::NullCheck),
            (r"^java\.util\.Objects#check(Index|FromToIndex|FromIndexSize)$", IOOBE, Evidence::Precondition),
            (r"^org\.apache\.commons\.lang3\.Validate#notNull$", NPE, Evidence::NullCheck),
            (r"^org\.apache\.commons\.lang3\.Validate#validState$", ISE, Evidence::Precondition),
            (r"^org\.apache\.commons\.lang3\.Validate#validIndex$", IOOBE, Evidence::Precondition),
            (r"^org\.apache\.commons\.lang3\.Validate#(isTrue|notEmpty|notBlank|noNullElements|inclusiveBetween|exclusiveBetween|matchesPattern|isInstanceOf|isAssignableFrom|finite|notNaN)$", IAE, Evidence::Precondition),
            (r"\.Assert(ions)?#(assert[A-Z]\w*|fail)$", AE, Evidence::Precondition),
        ];
        table
            .iter()
            .filter_map(|(pattern, ty, evidence)| {
                PreconditionPattern::try_new(pattern, ty, *evidence)
                    .map_err(|e| warn!(pattern, error = %e, "invalid precondition pattern"))
                    .ok()
            })
            .collect()
    }

    pub fn detect(&self, method: &MethodRef) -> Option<IdiomHit> {
        let target = format!("{}#{}", method.owner, method.name);
        self.patterns
            .iter()
            .find(|p| p.matches(&target))
            .map(|p| IdiomHit::new(p.exception_type, OriginLayer::ValidationLayer, p.evidence))
    }
}

/// `find*` on a data-access receiver.
pub fn is_finder_call(method: &MethodRef, index: &ClassIndex) -> bool {
    method.name.starts_with("find") && index.is_data_access(&method.owner)
}
