//! Target shape descriptions and their coarse classification.
//!
//! A [`Shape`] plays the role runtime reflection plays in dynamic decoders:
//! it tells the engine what structure the caller expects at each position,
//! without the error model knowing any concrete application type.

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use crate::node::Kind;

/// Structural description of the value a document position decodes into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Int,
    Uint,
    Float,
    Str,
    Bool,
    /// One level of indirection: the value may be absent (`null`/`~`).
    Optional(Box<Shape>),
    /// Homogeneous ordered collection.
    Sequence(Box<Shape>),
    /// Associative collection with free-form string keys.
    Map(Box<Shape>),
    /// Record with a fixed field set.
    Struct(Vec<Field>),
}

/// Single field of a [`Shape::Struct`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Mapping key this field matches in the document.
    pub name: String,
    pub shape: Shape,
    /// Promote the keys of a nested struct into the enclosing mapping.
    #[serde(default)]
    pub inline: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Field {
            name: name.into(),
            shape,
            inline: false,
        }
    }

    pub fn inline(name: impl Into<String>, shape: Shape) -> Self {
        Field {
            name: name.into(),
            shape,
            inline: true,
        }
    }
}

impl Shape {
    pub fn optional(inner: Shape) -> Self {
        Shape::Optional(Box::new(inner))
    }

    pub fn sequence_of(item: Shape) -> Self {
        Shape::Sequence(Box::new(item))
    }

    pub fn map_of(value: Shape) -> Self {
        Shape::Map(Box::new(value))
    }

    /// Coarse name of this shape, used only to phrase type-mismatch
    /// diagnostics. The vocabulary is closed: `int`, `uint`, `float`,
    /// `string`, `key:value`, `[]value`, `unknown`.
    ///
    /// An optional unwraps exactly one level before classifying; a doubly
    /// wrapped optional therefore reads as `unknown` rather than recursing.
    pub fn primitive(&self) -> &'static str {
        match self {
            Shape::Optional(inner) => inner.primitive_unwrapped(),
            other => other.primitive_unwrapped(),
        }
    }

    fn primitive_unwrapped(&self) -> &'static str {
        match self {
            Shape::Struct(_) | Shape::Map(_) => "key:value",
            Shape::Sequence(_) => "[]value",
            Shape::Int => "int",
            Shape::Uint => "uint",
            Shape::Float => "float",
            Shape::Str => "string",
            Shape::Bool | Shape::Optional(_) => "unknown",
        }
    }

    /// Document-level kind this shape requires: the same judgment as
    /// [`Shape::primitive`] at the granularity of node kinds.
    ///
    /// Shapes with no meaningful kind of their own default to
    /// [`Kind::Scalar`]. A doubly wrapped optional therefore pairs
    /// `Kind::Scalar` with the `"unknown"` classification: the node-kind
    /// vocabulary has no unknown member, so Scalar is the fallback for
    /// anything that is not a container.
    pub fn document_kind(&self) -> Kind {
        match self {
            Shape::Sequence(_) => Kind::Sequence,
            Shape::Map(_) | Shape::Struct(_) => Kind::Mapping,
            Shape::Optional(inner) => inner.document_kind_unwrapped(),
            _ => Kind::Scalar,
        }
    }

    fn document_kind_unwrapped(&self) -> Kind {
        match self {
            Shape::Sequence(_) => Kind::Sequence,
            Shape::Map(_) | Shape::Struct(_) => Kind::Mapping,
            _ => Kind::Scalar,
        }
    }
}

/// One entry of a struct's effective field set after inline promotion.
#[derive(Debug)]
pub(crate) struct EffectiveField<'a> {
    pub key: &'a str,
    pub shape: &'a Shape,
}

/// Outcome of flattening a struct's fields.
#[derive(Debug)]
pub(crate) enum Flattened<'a> {
    Fields(Vec<EffectiveField<'a>>),
    /// The field set claims the same effective key twice.
    DuplicateKey(String),
    /// The target description itself is broken.
    Invalid(ShapeError),
}

/// Computes a struct's effective field set, promoting inline fields one
/// level. Declared before inspecting any document content, so defects here
/// are target-side, not document-side.
pub(crate) fn flatten_fields(fields: &[Field]) -> Flattened<'_> {
    let mut out: Vec<EffectiveField<'_>> = Vec::with_capacity(fields.len());

    for field in fields {
        if !field.inline {
            if out.iter().any(|f| f.key == field.name) {
                return Flattened::DuplicateKey(field.name.clone());
            }
            out.push(EffectiveField {
                key: &field.name,
                shape: &field.shape,
            });
            continue;
        }

        let Shape::Struct(inner) = &field.shape else {
            return Flattened::Invalid(ShapeError::InlineNotStruct {
                field: field.name.clone(),
            });
        };
        for promoted in inner {
            if promoted.inline {
                return Flattened::Invalid(ShapeError::NestedInline {
                    field: promoted.name.clone(),
                });
            }
            if out.iter().any(|f| f.key == promoted.name) {
                return Flattened::DuplicateKey(promoted.name.clone());
            }
            out.push(EffectiveField {
                key: &promoted.name,
                shape: &promoted.shape,
            });
        }
    }

    Flattened::Fields(out)
}
