//! Direct-throw tracking.
//!
//! A `throw new T("message")` compiles to `new T`, an optional message
//! constant, the constructor call and `athrow`. The tracker follows that
//! shape with a small state machine:
//!
//! ```text
//! Idle --new T--> PendingType --"msg"--> PendingMessage --athrow--> emit, Idle
//!                      \----------------------athrow---------------/
//! ```
//!
//! Exceptions built as constructor arguments of another exception
//! (`new ConflictException("x", new IOException())`) are nested frames that
//! close at their own constructor. Only the most recent exception type left
//! pending at an `athrow` is attributed.

use crate::descriptor::erasure;
use crate::model::{Constant, Instruction, MethodRef};

use super::status_literal::{status_at, status_constant};

/// Smallest status a throw site may report as a failure.
const MIN_FAILURE_STATUS: u16 = 400;

/// Parameter types through which a constructor receives a status.
const STATUS_PARAM_TYPES: &[&str] = &[
    "org.springframework.http.HttpStatusCode",
    "org.springframework.http.HttpStatus",
];

/// Type questions the tracker asks about the classes it sees.
pub trait ExceptionTypes {
    fn is_exception_like(&self, ty: &str) -> bool;

    /// Whether the type forwards a constructor status to the response.
    fn carries_status(&self, ty: &str) -> bool;
}

/// A throw the tracker observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedThrow {
    pub exception_type: String,
    pub message: Option<String>,
    /// Status literal passed while the exception was being built
    pub status: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ThrowState {
    PendingType {
        exception_type: String,
        candidate: Option<u16>,
    },
    PendingMessage {
        exception_type: String,
        message: String,
        candidate: Option<u16>,
    },
    Constructed(ObservedThrow),
}

impl ThrowState {
    fn pending(exception_type: &str) -> Self {
        ThrowState::PendingType {
            exception_type: exception_type.to_string(),
            candidate: None,
        }
    }

    fn exception_type(&self) -> &str {
        match self {
            ThrowState::PendingType { exception_type, .. }
            | ThrowState::PendingMessage { exception_type, .. } => exception_type,
            ThrowState::Constructed(t) => &t.exception_type,
        }
    }

    fn is_open(&self) -> bool {
        !matches!(self, ThrowState::Constructed(_))
    }

    /// The first message constant becomes the exception's message.
    fn record_message(&mut self, text: &str) {
        if let ThrowState::PendingType {
            exception_type,
            candidate,
        } = self
        {
            let next = ThrowState::PendingMessage {
                exception_type: std::mem::take(exception_type),
                message: text.to_string(),
                candidate: *candidate,
            };
            *self = next;
        }
    }

    fn offer_status(&mut self, code: u16) {
        if let ThrowState::PendingType { candidate, .. } | ThrowState::PendingMessage { candidate, .. } = self {
            candidate.get_or_insert(code);
        }
    }

    /// Closes the frame at its constructor, keeping the captured status only
    /// when the constructor can actually receive one.
    fn construct(self, accepts_status: bool) -> ObservedThrow {
        let (exception_type, message, candidate) = match self {
            ThrowState::PendingType {
                exception_type,
                candidate,
            } => (exception_type, None, candidate),
            ThrowState::PendingMessage {
                exception_type,
                message,
                candidate,
            } => (exception_type, Some(message), candidate),
            ThrowState::Constructed(t) => return t,
        };
        ObservedThrow {
            exception_type,
            message,
            status: candidate.filter(|_| accepts_status),
        }
    }

    /// What an `athrow` reports for this frame.
    fn into_throw(self) -> ObservedThrow {
        match self {
            ThrowState::Constructed(t) => t,
            open => open.construct(false),
        }
    }
}

/// Open and just-constructed exceptions, innermost last. Empty is idle.
#[derive(Debug, Default)]
pub struct ThrowTracker {
    frames: Vec<ThrowState>,
}

impl ThrowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn innermost_open(&mut self) -> Option<&mut ThrowState> {
        self.frames.last_mut().filter(|f| f.is_open())
    }

    /// Feeds the instruction at `pos`; returns the throw it completes, if any.
    pub fn step<T>(&mut self, instructions: &[Instruction], pos: usize, types: &T) -> Option<ObservedThrow>
    where
        T: ExceptionTypes + ?Sized,
    {
        let instruction = instructions.get(pos)?;
        match instruction {
            Instruction::NewObject(ty) if types.is_exception_like(ty) => {
                while self.frames.last().is_some_and(|f| !f.is_open()) {
                    self.frames.pop();
                }
                self.frames.push(ThrowState::pending(ty));
            }
            Instruction::InvokeMethod(m) if m.is_constructor() => self.construct(m, types),
            Instruction::InvokeMethod(m) if types.is_exception_like(&m.return_type) => {
                let building = self.frames.iter().any(ThrowState::is_open);
                let throws_next = matches!(instructions.get(pos + 1), Some(Instruction::Throw));
                if !building || throws_next {
                    self.frames = vec![ThrowState::Constructed(ObservedThrow {
                        exception_type: m.return_type.clone(),
                        message: None,
                        status: None,
                    })];
                }
            }
            Instruction::LoadConstant(Constant::String(s)) => {
                if let Some(frame) = self.innermost_open() {
                    frame.record_message(s);
                }
            }
            Instruction::LoadConstant(_) => {
                if let Some(code) = status_at(instructions, pos) {
                    self.offer_status(code);
                }
            }
            Instruction::GetStatic(field) => {
                if let Some(code) = status_constant(field) {
                    self.offer_status(code);
                }
            }
            Instruction::Throw => {
                return std::mem::take(&mut self.frames).pop().map(ThrowState::into_throw);
            }
            Instruction::Return => self.frames.clear(),
            _ => {}
        }
        None
    }

    fn offer_status(&mut self, code: u16) {
        if let Some(frame) = self.innermost_open() {
            frame.offer_status(code);
        }
    }

    fn construct<T>(&mut self, ctor: &MethodRef, types: &T)
    where
        T: ExceptionTypes + ?Sized,
    {
        let owner = erasure(&ctor.owner);
        let Some(frame) = self.frames.pop() else {
            return;
        };
        if !frame.is_open() || frame.exception_type() != owner {
            self.frames.push(frame);
            return;
        }
        let accepts_status = types.carries_status(owner)
            || ctor
                .param_types
                .iter()
                .any(|p| STATUS_PARAM_TYPES.contains(&erasure(p)));
        let mut built = frame.construct(accepts_status);
        built.status = built.status.filter(|code| *code >= MIN_FAILURE_STATUS);
        // An exception built inside another one's constructor call is its
        // argument, not the thrown value.
        if !self.frames.iter().any(ThrowState::is_open) {
            self.frames.push(ThrowState::Constructed(built));
        }
    }
}
