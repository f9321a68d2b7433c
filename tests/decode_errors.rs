use typed_yaml::{
    decode_str, DecodeErrorKind, DecodeOptions, Error, Field, Kind, Shape, YamlError,
};

fn decode_failure(input: &str, shape: &Shape, options: &DecodeOptions) -> Vec<YamlError> {
    match decode_str(input, shape, options) {
        Err(Error::Decode(failure)) => {
            assert!(!failure.errors.is_empty());
            failure.errors
        }
        Err(Error::Parse(e)) => panic!("unexpected parse error: {e}"),
        Ok(v) => panic!("expected decode failure, got {v}"),
    }
}

#[test]
fn scalar_into_container_targets_classifies_both_sides() {
    let shape = Shape::Struct(vec![
        Field::new("m", Shape::map_of(Shape::Int)),
        Field::new("s", Shape::sequence_of(Shape::Int)),
    ]);

    let errors = decode_failure("m: x\ns: y\n", &shape, &DecodeOptions::default());
    assert_eq!(errors.len(), 2);

    let m = errors[0].as_document().unwrap();
    assert_eq!(
        m.kind,
        DecodeErrorKind::WrongType {
            expected: Kind::Mapping,
            of: "key:value",
        }
    );
    assert_eq!(m.path.as_str(), "m");
    assert_eq!(m.node.kind, Kind::Scalar);

    let s = errors[1].as_document().unwrap();
    assert_eq!(
        s.kind,
        DecodeErrorKind::WrongType {
            expected: Kind::Sequence,
            of: "[]value",
        }
    );
    assert_eq!(s.path.as_str(), "s");

    // A well-formed container target never classifies as unknown.
    for err in [m, s] {
        let DecodeErrorKind::WrongType { of, .. } = &err.kind else {
            panic!("expected wrong type");
        };
        assert_ne!(*of, "unknown");
    }
}

#[test]
fn mapping_into_sequences_reports_each_field_in_document_order() {
    let shape = Shape::Struct(vec![
        Field::new("sequence", Shape::sequence_of(Shape::Str)),
        Field::new("sequence-2", Shape::sequence_of(Shape::Str)),
    ]);

    let input = "sequence-2:\n a: b\nsequence:\n a: b\n";
    let errors = decode_failure(input, &shape, &DecodeOptions::default());
    assert_eq!(errors.len(), 2);

    let first = errors[0].as_document().unwrap();
    assert_eq!(first.path.as_str(), "sequence-2");
    assert_eq!(
        first.kind,
        DecodeErrorKind::WrongType {
            expected: Kind::Sequence,
            of: "[]value",
        }
    );
    assert_eq!(first.node.kind, Kind::Mapping);
    assert_eq!(first.node.line, 2);

    let second = errors[1].as_document().unwrap();
    assert_eq!(second.path.as_str(), "sequence");
    assert_eq!(second.node.line, 4);
}

#[test]
fn duplicate_document_key_is_a_value_collision() {
    let shape = Shape::Struct(vec![Field::new("A", Shape::Int)]);

    let errors = decode_failure("A: 3\nA: 4\n", &shape, &DecodeOptions::default());
    assert_eq!(errors.len(), 1);

    let err = errors[0].as_document().unwrap();
    assert_eq!(
        err.kind,
        DecodeErrorKind::AlreadyDefined {
            key: "A".to_string(),
            value_collision: true,
        }
    );
    assert_eq!(err.path.as_str(), "A");
    assert_eq!(err.node.line, 2);
}

#[test]
fn duplicate_map_key_is_reported_per_extra_occurrence() {
    let shape = Shape::map_of(Shape::Str);

    let errors = decode_failure("k: a\nk: b\nk: c\n", &shape, &DecodeOptions::default());
    assert_eq!(errors.len(), 2);
    for err in &errors {
        let err = err.as_document().unwrap();
        assert_eq!(
            err.kind,
            DecodeErrorKind::AlreadyDefined {
                key: "k".to_string(),
                value_collision: true,
            }
        );
    }
}

#[test]
fn shape_side_key_claim_is_detected_against_an_empty_document() {
    // The effective field set claims `A` twice through inline promotion.
    let shape = Shape::Struct(vec![
        Field::new("A", Shape::Int),
        Field::inline(
            "nest",
            Shape::Struct(vec![Field::new("A", Shape::Int)]),
        ),
    ]);

    for input in ["", "A: 7\n"] {
        let errors = decode_failure(input, &shape, &DecodeOptions::default());
        assert_eq!(errors.len(), 1, "shape defects abort the walk");

        let err = errors[0].as_document().unwrap();
        assert_eq!(
            err.kind,
            DecodeErrorKind::AlreadyDefined {
                key: "A".to_string(),
                value_collision: false,
            }
        );
    }
}

#[test]
fn inline_non_struct_is_a_target_shape_error() {
    let shape = Shape::Struct(vec![Field::inline("nest", Shape::Int)]);

    let errors = decode_failure("", &shape, &DecodeOptions::default());
    assert_eq!(errors.len(), 1);

    match &errors[0] {
        YamlError::TargetShape { cause } => {
            assert!(cause.to_string().contains("nest"));
        }
        other => panic!("expected target shape error, got {other}"),
    }
    assert!(errors[0].as_document().is_none());
}

#[test]
fn unknown_field_is_policy_gated() {
    let shape = Shape::Struct(vec![Field::new("a", Shape::Int)]);
    let input = "a: 1\nextra: 2\n";

    // Permissive by default.
    assert!(decode_str(input, &shape, &DecodeOptions::default()).is_ok());

    let options = DecodeOptions {
        deny_unknown_fields: true,
    };
    let errors = decode_failure(input, &shape, &options);
    assert_eq!(errors.len(), 1);

    let err = errors[0].as_document().unwrap();
    assert_eq!(
        err.kind,
        DecodeErrorKind::UnknownField {
            field: "extra".to_string(),
        }
    );
    assert_eq!(err.path.as_str(), "extra");
}

#[test]
fn path_reaches_three_levels_and_tracks_the_failing_sibling() {
    let inner = Shape::Struct(vec![
        Field::new("x", Shape::Int),
        Field::new("y", Shape::Int),
    ]);
    let shape = Shape::Struct(vec![Field::new("a", Shape::sequence_of(inner))]);

    let errors = decode_failure(
        "a:\n  - x: 1\n    y: oops\n",
        &shape,
        &DecodeOptions::default(),
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].as_document().unwrap().path.as_str(), "a[0].y");

    let errors = decode_failure(
        "a:\n  - x: oops\n    y: 2\n",
        &shape,
        &DecodeOptions::default(),
    );
    assert_eq!(errors[0].as_document().unwrap().path.as_str(), "a[0].x");
}

#[test]
fn identical_inputs_classify_identically() {
    let shape = Shape::Struct(vec![Field::new("n", Shape::Uint)]);
    let input = "n: minus-one\n";

    let first = decode_failure(input, &shape, &DecodeOptions::default());
    let second = decode_failure(input, &shape, &DecodeOptions::default());
    assert_eq!(first.len(), second.len());

    let (a, b) = (
        first[0].as_document().unwrap(),
        second[0].as_document().unwrap(),
    );
    assert_eq!(a.kind, b.kind);
    assert_eq!(a.path, b.path);
    assert_eq!(a.node, b.node);
    assert_eq!(a.target, b.target);
}

#[test]
fn failure_list_renders_one_line_per_error() {
    let shape = Shape::Struct(vec![
        Field::new("a", Shape::sequence_of(Shape::Int)),
        Field::new("b", Shape::Int),
    ]);

    let Err(Error::Decode(failure)) =
        decode_str("a: 1\nb: x\n", &shape, &DecodeOptions::default())
    else {
        panic!("expected decode failure");
    };

    let rendered = failure.to_string();
    assert!(rendered.contains("decode errors:"), "{rendered}");
    assert!(rendered.contains("line 1"), "{rendered}");
    assert!(rendered.contains("line 2"), "{rendered}");
    assert!(rendered.contains("'a'"), "{rendered}");
    assert!(rendered.contains("'b'"), "{rendered}");
}

#[test]
fn malformed_text_is_a_parse_error_not_a_decode_error() {
    let shape = Shape::map_of(Shape::Str);
    let err = decode_str("a: 1\n   b: 2\n", &shape, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}
