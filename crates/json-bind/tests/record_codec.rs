//! Records: constructor-built types with mandatory, non-null and default
//! handling.

use std::sync::Arc;

use json_bind::{
    ConfigurationError, Constructor, DecodeErrorKind, Error, JsonBind, Member, Object, Parameter,
    RecordShape, Settings, Shape, TypeDeclaration, TypeDescriptor, UnknownPolicy, Value,
};

fn pair(json: &JsonBind) -> TypeDescriptor {
    json.declare(TypeDeclaration::record(
        "Pair",
        vec![
            Member::new("x", TypeDescriptor::int()),
            Member::new("y", TypeDescriptor::int()),
        ],
    ))
}

fn decode_kind(err: Error) -> DecodeErrorKind {
    match err {
        Error::Decode(e) => e.kind,
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn encodes_members_in_declaration_order() {
    let json = JsonBind::new(Settings::default());
    let t = pair(&json);
    let value: Value = Object::new(t.clone()).with("y", 2).with("x", 1).into();
    assert_eq!(json.to_vec(&t, &value).unwrap(), br#"{"x":1,"y":2}"#);
    assert_eq!(json.to_vec(&t, &Value::Null).unwrap(), b"null");
}

#[test]
fn decodes_members_in_any_order() {
    let json = JsonBind::new(Settings::default());
    let t = pair(&json);
    let expected: Value = Object::new(t.clone()).with("x", 1).with("y", 2).into();
    assert_eq!(json.from_slice(&t, br#"{"y":2,"x":1}"#).unwrap(), expected);
    assert_eq!(
        json.from_slice(&t, br#" { "x" : 1 , "y" : 2 } "#).unwrap(),
        expected
    );
    assert_eq!(json.from_slice(&t, b"null").unwrap(), Value::Null);
}

#[test]
fn absent_members_take_their_defaults() {
    let json = JsonBind::new(Settings::default());
    let t = json.declare(TypeDeclaration::record(
        "Sized",
        vec![
            Member::new("name", TypeDescriptor::string()),
            Member::new("size", TypeDescriptor::int()).default_value(10),
        ],
    ));
    let decoded = json.from_slice(&t, br#"{"name":"box"}"#).unwrap();
    assert_eq!(decoded.field("size"), Some(&Value::Int(10)));
    let empty = json.from_slice(&t, b"{}").unwrap();
    assert_eq!(empty.field("name"), Some(&Value::Null));
}

#[test]
fn missing_mandatory_member_is_named() {
    let json = JsonBind::new(Settings::default());
    let t = json.declare(TypeDeclaration::record(
        "Triple",
        vec![
            Member::new("a", TypeDescriptor::int()).mandatory(),
            Member::new("b", TypeDescriptor::int()).mandatory(),
            Member::new("c", TypeDescriptor::int()).mandatory(),
        ],
    ));
    assert!(json.from_slice(&t, br#"{"c":3,"a":1,"b":2}"#).is_ok());
    let err = json.from_slice(&t, br#"{"a":1,"c":3}"#).unwrap_err();
    let decode = err.as_decode().unwrap();
    assert_eq!(decode.field.as_deref(), Some("b"));
    assert_eq!(
        decode.kind,
        DecodeErrorKind::MissingMandatory(vec!["b".to_string()])
    );
    assert_eq!(
        err.to_string(),
        "Mandatory property (b) not found for 'b' at position 13"
    );
    let err = json.from_slice(&t, b"{}").unwrap_err();
    assert_eq!(
        decode_kind(err),
        DecodeErrorKind::MissingMandatory(vec!["a".into(), "b".into(), "c".into()])
    );
}

#[test]
fn explicit_indexes_order_member_lookup() {
    let json = JsonBind::new(Settings::default());
    let t = json.declare(TypeDeclaration::record(
        "Indexed",
        vec![
            Member::new("late", TypeDescriptor::int()).index(1).mandatory(),
            Member::new("early", TypeDescriptor::int()).index(0).mandatory(),
            Member::new("free", TypeDescriptor::int()).mandatory(),
        ],
    ));
    let err = json.from_slice(&t, b"{}").unwrap_err();
    assert_eq!(
        decode_kind(err),
        DecodeErrorKind::MissingMandatory(vec!["early".into(), "late".into(), "free".into()])
    );
    let value = json
        .from_slice(&t, br#"{"early":1,"late":2,"free":3}"#)
        .unwrap();
    assert_eq!(value.field("late"), Some(&Value::Int(2)));
}

#[test]
fn null_for_non_null_member() {
    let json = JsonBind::new(Settings::default());
    let t = json.declare(TypeDeclaration::record(
        "Named",
        vec![Member::new("name", TypeDescriptor::string()).non_null()],
    ));
    let err = json.from_slice(&t, br#"{"name":null}"#).unwrap_err();
    let decode = err.as_decode().unwrap();
    assert_eq!(decode.kind, DecodeErrorKind::NullForNonNull);
    assert_eq!(decode.field.as_deref(), Some("name"));
    assert_eq!(decode.offset, 8);
}

#[test]
fn unknown_properties_skip_or_fail() {
    let lenient = JsonBind::new(Settings::default());
    let t = pair(&lenient);
    let decoded = lenient
        .from_slice(&t, br#"{"x":1,"extra":{"deep":[1,{"a":null}],"s":"}"},"y":2}"#)
        .unwrap();
    assert_eq!(decoded.field("y"), Some(&Value::Int(2)));

    let strict =
        JsonBind::new(Settings::default().with_unknown_properties(UnknownPolicy::Fail));
    let t = pair(&strict);
    let err = strict.from_slice(&t, br#"{"x":1,"w":3}"#).unwrap_err();
    assert_eq!(
        decode_kind(err),
        DecodeErrorKind::UnknownProperty("w".to_string())
    );
}

#[test]
fn omit_defaults_uses_minimal_writer() {
    let json = JsonBind::new(Settings::default().with_omit_defaults(true));
    let t = json.declare(TypeDeclaration::record(
        "Sparse",
        vec![
            Member::new("a", TypeDescriptor::int()),
            Member::new("b", TypeDescriptor::string()),
            Member::new("c", TypeDescriptor::int()).default_value(5),
        ],
    ));
    let all_default: Value = Object::new(t.clone()).with("c", 5).into();
    assert_eq!(json.to_vec(&t, &all_default).unwrap(), b"{}");

    let first: Value = Object::new(t.clone()).with("a", 1).with("c", 5).into();
    assert_eq!(json.to_vec(&t, &first).unwrap(), br#"{"a":1}"#);

    let last: Value = Object::new(t.clone()).with("c", 7).into();
    assert_eq!(json.to_vec(&t, &last).unwrap(), br#"{"c":7}"#);

    let full: Value = Object::new(t.clone())
        .with("a", 1)
        .with("b", "x")
        .with("c", 7)
        .into();
    let bytes = json.to_vec(&t, &full).unwrap();
    assert_eq!(bytes, br#"{"a":1,"b":"x","c":7}"#);
    assert_eq!(json.from_slice(&t, &bytes).unwrap(), full);
    let decoded_empty: Value = Object::new(t.clone())
        .with("a", Value::Null)
        .with("b", Value::Null)
        .with("c", 5)
        .into();
    assert_eq!(json.from_slice(&t, b"{}").unwrap(), decoded_empty);
}

#[test]
fn unnamed_parameters_match_by_unique_type() {
    let json = JsonBind::new(Settings::default());
    let constructor: Constructor = Arc::new(|type_: &TypeDescriptor, args: Vec<Value>| {
        let mut args = args.into_iter();
        let age = args.next().unwrap_or_default();
        let name = args.next().unwrap_or_default();
        Ok(Value::Object(
            Object::new(type_.clone()).with("name", name).with("age", age),
        ))
    });
    let t = json.declare(TypeDeclaration::new(
        "Person",
        Shape::Record(RecordShape::with_constructor(
            vec![
                Member::new("name", TypeDescriptor::string()),
                Member::new("age", TypeDescriptor::int()),
            ],
            vec![
                Parameter::unnamed(TypeDescriptor::int()),
                Parameter::unnamed(TypeDescriptor::string()),
            ],
            constructor,
        )),
    ));
    let decoded = json.from_slice(&t, br#"{"name":"Ada","age":36}"#).unwrap();
    assert_eq!(decoded.field("name"), Some(&Value::from("Ada")));
    assert_eq!(decoded.field("age"), Some(&Value::Int(36)));
}

#[test]
fn ambiguous_constructor_is_a_configuration_error() {
    let json = JsonBind::new(Settings::default());
    let constructor: Constructor = Arc::new(|type_: &TypeDescriptor, _args: Vec<Value>| {
        Ok(Value::Object(Object::new(type_.clone())))
    });
    let t = json.declare(TypeDeclaration::new(
        "Span",
        Shape::Record(RecordShape::with_constructor(
            vec![
                Member::new("start", TypeDescriptor::int()),
                Member::new("end", TypeDescriptor::int()),
            ],
            vec![
                Parameter::unnamed(TypeDescriptor::int()),
                Parameter::unnamed(TypeDescriptor::int()),
            ],
            constructor,
        )),
    ));
    let err = json.resolve(&t).err().unwrap();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::AmbiguousConstructor { .. })
    ));
    // A failed analysis leaves nothing behind in the registry.
    assert!(json.lookup(&t).is_none());
}

#[test]
fn constructor_failure_is_reported_as_decode_error() {
    let json = JsonBind::new(Settings::default());
    let constructor: Constructor = Arc::new(|type_: &TypeDescriptor, args: Vec<Value>| {
        match args.first().and_then(Value::as_i64) {
            Some(n) if n >= 0 => Ok(Value::Object(Object::new(type_.clone()).with("n", n))),
            _ => Err("n must be non-negative".to_string()),
        }
    });
    let t = json.declare(TypeDeclaration::new(
        "Natural",
        Shape::Record(RecordShape::with_constructor(
            vec![Member::new("n", TypeDescriptor::int())],
            vec![Parameter::named("n", TypeDescriptor::int())],
            constructor,
        )),
    ));
    assert!(json.from_slice(&t, br#"{"n":4}"#).is_ok());
    let err = json.from_slice(&t, br#"{"n":-4}"#).unwrap_err();
    assert_eq!(
        decode_kind(err),
        DecodeErrorKind::Construction("n must be non-negative".to_string())
    );
}

#[test]
fn records_cannot_be_bound_in_place() {
    let json = JsonBind::new(Settings::default());
    let t = pair(&json);
    let mut existing: Value = Object::new(t.clone()).with("x", 1).into();
    let err = json
        .bind_from_slice(&t, br#"{"y":2}"#, &mut existing)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::BindUnsupported { .. })
    ));
}

#[test]
fn syntax_errors_carry_offsets() {
    let json = JsonBind::new(Settings::default());
    let t = pair(&json);
    let err = json.from_slice(&t, br#"{"x":1 "y":2}"#).unwrap_err();
    let decode = err.as_decode().unwrap();
    assert!(matches!(decode.kind, DecodeErrorKind::Syntax(_)));
    assert_eq!(decode.offset, 7);
    let err = json.from_slice(&t, br#"{"x":1,"#).unwrap_err();
    assert_eq!(decode_kind(err), DecodeErrorKind::UnexpectedEnd);
}
