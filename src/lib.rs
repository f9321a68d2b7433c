//! Shape-directed decoding of a YAML subset with structured errors.
//!
//! A document is parsed into a position-carrying node tree, then walked
//! against an explicit [`Shape`] description of the target value. Every
//! failure is a structured value a caller can branch on: what kind of node
//! was expected vs. what the target is, which key was duplicated and on
//! which side, which field is unknown, or which part of the target
//! description itself is broken. Message text is derived from those fields,
//! never the other way around.

pub mod decode;
pub mod error;
pub mod node;
pub mod path;
pub mod shape;

pub use decode::{decode_node, decode_str, DecodeOptions};
pub use error::{
    Cause, DecodeErrorKind, DecodeFailure, DocumentError, Error, NodeInfo, ParseError, ShapeError,
    YamlError,
};
pub use node::{parse, Kind, MapEntry, Node};
pub use path::Path;
pub use shape::{Field, Shape};

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{decode_str, DecodeOptions, Field, Shape};

    #[test]
    fn decodes_nested_document() {
        let shape = Shape::Struct(vec![
            Field::new("name", Shape::Str),
            Field::new(
                "servers",
                Shape::sequence_of(Shape::Struct(vec![
                    Field::new("host", Shape::Str),
                    Field::new("port", Shape::Uint),
                ])),
            ),
        ]);

        let input = "name: prod\nservers:\n  - { host: a, port: 1 }\n  - { host: b, port: 2 }\n";
        let value = decode_str(input, &shape, &DecodeOptions::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "prod",
                "servers": [
                    {"host": "a", "port": 1},
                    {"host": "b", "port": 2}
                ]
            })
        );
    }

    #[test]
    fn failures_are_values_not_strings() {
        let shape = Shape::Struct(vec![Field::new("port", Shape::Uint)]);
        let err = decode_str("port: {}\n", &shape, &DecodeOptions::default()).unwrap_err();

        let crate::Error::Decode(failure) = err else {
            panic!("expected decode failure");
        };
        let document = failure.errors[0].as_document().unwrap();
        assert_eq!(document.path.as_str(), "port");
        assert!(matches!(
            document.kind,
            crate::DecodeErrorKind::WrongType {
                expected: crate::Kind::Scalar,
                of: "uint",
            }
        ));
    }
}
