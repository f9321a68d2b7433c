//! Shape-directed decoding of node trees into JSON values.
//!
//! The engine walks a document node and a target shape in tandem. It does
//! not stop at the first failure: every malformed field is reported, in
//! document order, so a caller fixes a document in one pass instead of a
//! fix-one/rerun loop.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};

use crate::error::{DecodeFailure, DocumentError, Error, NodeInfo, YamlError};
use crate::node::{self, MapEntry, Node};
use crate::path::Path;
use crate::shape::{flatten_fields, Field, Flattened, Shape};

/// Decoding policy flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Report mapping keys with no corresponding target field instead of
    /// silently skipping them.
    #[serde(default)]
    pub deny_unknown_fields: bool,
}

/// Parses `input` and decodes it against `shape`.
pub fn decode_str(
    input: &str,
    shape: &Shape,
    options: &DecodeOptions,
) -> Result<JsonValue, Error> {
    let doc = node::parse(input)?;
    decode_node(&doc, shape, options).map_err(Error::from)
}

/// Decodes an already-parsed document against `shape`.
///
/// Target-side defects are checked across the whole shape tree before any
/// document content is read, so a broken description surfaces even against
/// an empty document; they abort the walk since decoding against a broken
/// description is meaningless. Document-side failures are aggregated and
/// returned together.
pub fn decode_node(
    doc: &Node,
    shape: &Shape,
    options: &DecodeOptions,
) -> Result<JsonValue, DecodeFailure> {
    let mut shape_errors = Vec::new();
    check_shape(shape, doc, &Path::root(), &mut shape_errors);
    if !shape_errors.is_empty() {
        return Err(DecodeFailure {
            errors: shape_errors,
        });
    }

    let mut decoder = Decoder {
        options,
        errors: Vec::new(),
    };
    let value = decoder.decode_value(doc, shape, &Path::root());

    if decoder.errors.is_empty() {
        Ok(value.unwrap_or(JsonValue::Null))
    } else {
        Err(DecodeFailure {
            errors: decoder.errors,
        })
    }
}

/// Validates the target description itself: inline promotions must refer to
/// structs, promote only one level, and must not claim an effective key
/// twice. `doc` only supplies the failure-site position for the key-claim
/// case, which the taxonomy treats as an `AlreadyDefined` without a value
/// collision.
fn check_shape(shape: &Shape, doc: &Node, path: &Path, errors: &mut Vec<YamlError>) {
    match shape {
        Shape::Struct(fields) => match flatten_fields(fields) {
            Flattened::Fields(effective) => {
                for field in effective {
                    check_shape(field.shape, doc, &path.child(field.key), errors);
                }
            }
            Flattened::DuplicateKey(key) => {
                errors.push(YamlError::Document(DocumentError::already_defined(
                    doc,
                    path.clone(),
                    shape,
                    &key,
                    false,
                )));
            }
            Flattened::Invalid(cause) => {
                errors.push(YamlError::target_shape(cause));
            }
        },
        Shape::Optional(inner) | Shape::Sequence(inner) | Shape::Map(inner) => {
            check_shape(inner, doc, path, errors);
        }
        _ => {}
    }
}

struct Decoder<'a> {
    options: &'a DecodeOptions,
    errors: Vec<YamlError>,
}

impl Decoder<'_> {
    fn fail(&mut self, err: DocumentError) {
        self.errors.push(YamlError::Document(err));
    }

    fn decode_value(&mut self, node: &Node, shape: &Shape, path: &Path) -> Option<JsonValue> {
        match shape {
            Shape::Optional(inner) => {
                if node.is_null() {
                    Some(JsonValue::Null)
                } else {
                    self.decode_value(node, inner, path)
                }
            }
            Shape::Struct(fields) => self.decode_struct(node, shape, fields, path),
            Shape::Map(value_shape) => self.decode_map(node, shape, value_shape, path),
            Shape::Sequence(item_shape) => self.decode_sequence(node, shape, item_shape, path),
            scalar => self.decode_scalar(node, scalar, path),
        }
    }

    fn decode_struct(
        &mut self,
        node: &Node,
        target: &Shape,
        fields: &[Field],
        path: &Path,
    ) -> Option<JsonValue> {
        let Flattened::Fields(effective) = flatten_fields(fields) else {
            unreachable!("shape validated before the walk");
        };

        let Some(entries) = node.entries() else {
            self.fail(DocumentError::wrong_type(node, path.clone(), target));
            return None;
        };

        let mut out = JsonMap::new();
        let mut seen: Vec<&str> = Vec::new();

        for entry in entries {
            let field_path = path.child(&entry.key);

            let Some(field) = effective.iter().find(|f| f.key == entry.key) else {
                if self.options.deny_unknown_fields {
                    self.fail(DocumentError::unknown_field(
                        key_site(entry),
                        field_path,
                        target,
                        &entry.key,
                    ));
                }
                continue;
            };

            if seen.contains(&entry.key.as_str()) {
                self.fail(DocumentError::already_defined(
                    key_site(entry),
                    field_path,
                    target,
                    &entry.key,
                    true,
                ));
                continue;
            }
            seen.push(&entry.key);

            if let Some(value) = self.decode_value(&entry.value, field.shape, &field_path) {
                out.insert(entry.key.clone(), value);
            }
        }

        Some(JsonValue::Object(out))
    }

    fn decode_map(
        &mut self,
        node: &Node,
        target: &Shape,
        value_shape: &Shape,
        path: &Path,
    ) -> Option<JsonValue> {
        let Some(entries) = node.entries() else {
            self.fail(DocumentError::wrong_type(node, path.clone(), target));
            return None;
        };

        let mut out = JsonMap::new();
        let mut seen: Vec<&str> = Vec::new();

        for entry in entries {
            let entry_path = path.child(&entry.key);

            if seen.contains(&entry.key.as_str()) {
                self.fail(DocumentError::already_defined(
                    key_site(entry),
                    entry_path,
                    target,
                    &entry.key,
                    true,
                ));
                continue;
            }
            seen.push(&entry.key);

            if let Some(value) = self.decode_value(&entry.value, value_shape, &entry_path) {
                out.insert(entry.key.clone(), value);
            }
        }

        Some(JsonValue::Object(out))
    }

    fn decode_sequence(
        &mut self,
        node: &Node,
        target: &Shape,
        item_shape: &Shape,
        path: &Path,
    ) -> Option<JsonValue> {
        let Some(items) = node.items() else {
            self.fail(DocumentError::wrong_type(node, path.clone(), target));
            return None;
        };

        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if let Some(value) = self.decode_value(item, item_shape, &path.index(i)) {
                out.push(value);
            }
        }

        Some(JsonValue::Array(out))
    }

    fn decode_scalar(&mut self, node: &Node, target: &Shape, path: &Path) -> Option<JsonValue> {
        let Some(text) = node.scalar_text() else {
            self.fail(DocumentError::wrong_type(node, path.clone(), target));
            return None;
        };

        match target {
            Shape::Int => match text.parse::<i64>() {
                Ok(v) => Some(JsonValue::Number(JsonNumber::from(v))),
                Err(e) => {
                    self.fail(DocumentError::wrong_type(node, path.clone(), target).with_cause(e));
                    None
                }
            },
            Shape::Uint => match text.parse::<u64>() {
                Ok(v) => Some(JsonValue::Number(JsonNumber::from(v))),
                Err(e) => {
                    self.fail(DocumentError::wrong_type(node, path.clone(), target).with_cause(e));
                    None
                }
            },
            Shape::Float => match text.parse::<f64>() {
                Ok(v) => match JsonNumber::from_f64(v) {
                    Some(n) => Some(JsonValue::Number(n)),
                    // Non-finite floats have no JSON representation.
                    None => {
                        self.fail(DocumentError::wrong_type(node, path.clone(), target));
                        None
                    }
                },
                Err(e) => {
                    self.fail(DocumentError::wrong_type(node, path.clone(), target).with_cause(e));
                    None
                }
            },
            Shape::Bool => match text.parse::<bool>() {
                Ok(v) => Some(JsonValue::Bool(v)),
                Err(e) => {
                    self.fail(DocumentError::wrong_type(node, path.clone(), target).with_cause(e));
                    None
                }
            },
            Shape::Str => Some(JsonValue::String(text.to_string())),
            _ => unreachable!("container shapes handled by decode_value"),
        }
    }
}

/// Failure site for key-level errors: the key's own position, with the kind
/// of the value sitting under it.
fn key_site(entry: &MapEntry) -> NodeInfo {
    NodeInfo {
        kind: entry.value.kind(),
        line: entry.key_line,
        column: entry.key_column,
    }
}
