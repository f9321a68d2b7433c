//! Structured error model for shape-directed decoding.
//!
//! Every failure is classified into a closed taxonomy and wrapped in an
//! envelope carrying the failure-site node, the hierarchical path, and the
//! target shape being decoded into. Failures caused by a broken target
//! description get their own envelope without node or path, since they
//! precede any document traversal. The underlying low-level cause, when one
//! exists, stays reachable through [`std::error::Error::source`].

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::node::{Kind, Node};
use crate::path::Path;
use crate::shape::Shape;

/// Boxed low-level cause retained verbatim alongside the classification.
pub type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// Failure from the node parser, before any decoding takes place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, message: String) -> Self {
        ParseError { line, message }
    }
}

/// Classified reason for one decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    /// The node's kind does not match what the target shape requires.
    /// `expected` and `of` are the same shape judgment at two
    /// granularities: the node kind we wanted, and the classifier's name
    /// for the target. The kind actually found is on the envelope's node.
    #[error("expected a {expected} for '{of}' target")]
    WrongType { expected: Kind, of: &'static str },

    /// Mapping key with no corresponding target field, reported only under
    /// the deny-unknown-fields policy.
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    /// The key was defined twice. `value_collision` distinguishes a
    /// document-side duplicate (the value for this key was already set)
    /// from a target-side one (the key is already claimed by another
    /// field of the shape).
    #[error("{}", already_defined_text(.key, .value_collision))]
    AlreadyDefined { key: String, value_collision: bool },
}

fn already_defined_text(key: &str, value_collision: &bool) -> String {
    if *value_collision {
        format!("value for key '{key}' already defined")
    } else {
        format!("key '{key}' already claimed by another field of the target")
    }
}

/// Kind and position of the node at a failure site, copied out of the
/// document tree so envelopes own their data and can cross threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub kind: Kind,
    pub line: usize,
    pub column: usize,
}

impl From<&Node> for NodeInfo {
    fn from(node: &Node) -> Self {
        NodeInfo {
            kind: node.kind(),
            line: node.line,
            column: node.column,
        }
    }
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.kind, self.line, self.column
        )
    }
}

/// Envelope for a failure while mapping document content onto the target:
/// the classified reason plus the node, the path as of the failing
/// field/key/index, and the shape being decoded into.
#[derive(Debug, Error)]
#[error("decode error at '{path}': {kind} (found {node})")]
pub struct DocumentError {
    pub kind: DecodeErrorKind,
    pub node: NodeInfo,
    pub path: Path,
    pub target: Shape,
    /// Original low-level cause, never discarded by classification.
    #[source]
    pub cause: Option<Cause>,
}

impl DocumentError {
    /// The node's kind does not match `target`. Both sides of the mismatch
    /// are derived from the shape itself, so the diagnostic vocabulary
    /// stays closed.
    pub fn wrong_type(node: impl Into<NodeInfo>, path: Path, target: &Shape) -> Self {
        DocumentError {
            kind: DecodeErrorKind::WrongType {
                expected: target.document_kind(),
                of: target.primitive(),
            },
            node: node.into(),
            path,
            target: target.clone(),
            cause: None,
        }
    }

    pub fn unknown_field(
        node: impl Into<NodeInfo>,
        path: Path,
        target: &Shape,
        field: &str,
    ) -> Self {
        DocumentError {
            kind: DecodeErrorKind::UnknownField {
                field: field.to_string(),
            },
            node: node.into(),
            path,
            target: target.clone(),
            cause: None,
        }
    }

    pub fn already_defined(
        node: impl Into<NodeInfo>,
        path: Path,
        target: &Shape,
        key: &str,
        value_collision: bool,
    ) -> Self {
        DocumentError {
            kind: DecodeErrorKind::AlreadyDefined {
                key: key.to_string(),
                value_collision,
            },
            node: node.into(),
            path,
            target: target.clone(),
            cause: None,
        }
    }

    /// Attaches the original low-level cause (e.g. the integer parse
    /// failure behind a scalar type mismatch).
    pub fn with_cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

/// Defect in the target description itself, independent of any document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// An inline field must promote a struct's keys; other shapes have no
    /// keys to promote.
    #[error("inline field '{field}' is not a struct")]
    InlineNotStruct { field: String },
    /// Inline promotion unwraps exactly one level.
    #[error("inline field '{field}' declares a nested inline promotion")]
    NestedInline { field: String },
}

/// One decode failure: either the document is malformed relative to the
/// target, or the target description is broken.
#[derive(Debug, Error)]
pub enum YamlError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Target-side defect. Carries no node or path: no document content
    /// was being read when it was detected.
    #[error("invalid target shape: {cause}")]
    TargetShape {
        #[source]
        cause: ShapeError,
    },
}

impl YamlError {
    pub fn target_shape(cause: ShapeError) -> Self {
        YamlError::TargetShape { cause }
    }

    pub fn as_document(&self) -> Option<&DocumentError> {
        match self {
            YamlError::Document(err) => Some(err),
            YamlError::TargetShape { .. } => None,
        }
    }

    fn line(&self) -> Option<usize> {
        self.as_document().map(|err| err.node.line)
    }
}

/// All failures of one decode attempt, in detection (document) order.
///
/// The decoder keeps going past individual field failures so a caller sees
/// every malformed field in one pass. The list is never empty.
#[derive(Debug, Error)]
#[error("decode errors:{}", error_list(.errors))]
pub struct DecodeFailure {
    pub errors: Vec<YamlError>,
}

fn error_list(errors: &[YamlError]) -> String {
    let mut out = String::new();
    for err in errors {
        match err.line() {
            Some(line) => out.push_str(&format!("\n  line {line}: {err}")),
            None => out.push_str(&format!("\n  {err}")),
        }
    }
    out
}

/// Failure of a full text-to-value decode attempt.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Decode(#[from] DecodeFailure),
}
