//! Collections, maps, optionals and enums.

use json_bind::{
    DecodeErrorKind, EncodeError, EnumValue, Error, JsonBind, Settings, TypeDeclaration,
    TypeDescriptor, Value,
};

fn engine() -> std::sync::Arc<JsonBind> {
    JsonBind::new(Settings::default())
}

#[test]
fn empty_and_null_collections() {
    let json = engine();
    let t = TypeDescriptor::list(TypeDescriptor::int());
    assert_eq!(json.to_vec(&t, &Value::List(vec![])).unwrap(), b"[]");
    assert_eq!(json.to_vec(&t, &Value::Null).unwrap(), b"null");
    assert_eq!(json.from_slice(&t, b"[]").unwrap(), Value::List(vec![]));
    assert_eq!(json.from_slice(&t, b" [ ] ").unwrap(), Value::List(vec![]));
    assert_eq!(json.from_slice(&t, b"null").unwrap(), Value::Null);

    let m = TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::int());
    assert_eq!(json.to_vec(&m, &Value::Map(vec![])).unwrap(), b"{}");
    assert_eq!(json.from_slice(&m, b"{}").unwrap(), Value::Map(vec![]));
}

#[test]
fn nested_lists() {
    let json = engine();
    let t = TypeDescriptor::list(TypeDescriptor::list(TypeDescriptor::int()));
    let value = Value::List(vec![
        Value::List(vec![Value::Int(1), Value::Int(2)]),
        Value::List(vec![]),
        Value::Null,
    ]);
    let bytes = json.to_vec(&t, &value).unwrap();
    assert_eq!(bytes, b"[[1,2],[],null]");
    assert_eq!(json.from_slice(&t, &bytes).unwrap(), value);
}

#[test]
fn sets_drop_repeated_elements() {
    let json = engine();
    let t = TypeDescriptor::set(TypeDescriptor::int());
    assert_eq!(
        json.from_slice(&t, b"[1,2,1,3,2]").unwrap(),
        Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn fixed_arrays_check_arity() {
    let json = engine();
    let t = TypeDescriptor::fixed_array(TypeDescriptor::float(), 2);
    assert_eq!(
        json.from_slice(&t, b"[1.5,2]").unwrap(),
        Value::List(vec![Value::Float(1.5), Value::Float(2.0)])
    );
    let err = json.from_slice(&t, b"[1,2,3]").unwrap_err();
    assert_eq!(
        err.as_decode().map(|e| e.kind.clone()),
        Some(DecodeErrorKind::WrongArity {
            expected: 2,
            found: 3
        })
    );
    let err = json
        .to_vec(&t, &Value::List(vec![Value::Float(1.0)]))
        .unwrap_err();
    assert!(matches!(err, Error::Encode(EncodeError::TypeMismatch { .. })));
}

#[test]
fn maps_with_non_string_keys() {
    let json = engine();
    let t = TypeDescriptor::map(TypeDescriptor::int(), TypeDescriptor::string());
    let value = Value::Map(vec![
        (Value::Int(1), Value::from("one")),
        (Value::Int(-2), Value::from("minus two")),
    ]);
    let bytes = json.to_vec(&t, &value).unwrap();
    assert_eq!(bytes, br#"{"1":"one","-2":"minus two"}"#);
    assert_eq!(json.from_slice(&t, &bytes).unwrap(), value);

    let err = json.from_slice(&t, br#"{"null":"x"}"#).unwrap_err();
    assert_eq!(err.as_decode().map(|e| e.kind.clone()), Some(DecodeErrorKind::NullKey));
    assert_eq!(err.as_decode().map(|e| e.offset), Some(1));

    let err = json
        .to_vec(&t, &Value::Map(vec![(Value::Null, Value::from("x"))]))
        .unwrap_err();
    assert!(matches!(err, Error::Encode(EncodeError::TypeMismatch { .. })));
}

#[test]
fn optional_key_types() {
    let json = engine();
    let t = TypeDescriptor::map(
        TypeDescriptor::optional(TypeDescriptor::string()),
        TypeDescriptor::int(),
    );
    let value = Value::Map(vec![(Value::from("a"), Value::Int(1))]);
    let bytes = json.to_vec(&t, &value).unwrap();
    assert_eq!(bytes, br#"{"a":1}"#);
    assert_eq!(json.from_slice(&t, &bytes).unwrap(), value);

    let t = TypeDescriptor::map(
        TypeDescriptor::optional(TypeDescriptor::int()),
        TypeDescriptor::string(),
    );
    let value = Value::Map(vec![(Value::Int(7), Value::from("seven"))]);
    let bytes = json.to_vec(&t, &value).unwrap();
    assert_eq!(bytes, br#"{"7":"seven"}"#);
    assert_eq!(json.from_slice(&t, &bytes).unwrap(), value);
}

#[test]
fn map_values_may_be_null() {
    let json = engine();
    let t = TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::int());
    let value = Value::Map(vec![(Value::from("a"), Value::Null)]);
    let bytes = json.to_vec(&t, &value).unwrap();
    assert_eq!(bytes, br#"{"a":null}"#);
    assert_eq!(json.from_slice(&t, &bytes).unwrap(), value);
}

#[test]
fn enum_keys_and_values() {
    let json = engine();
    let color = json.declare(TypeDeclaration::enumeration("Color", &["RED", "GREEN"]));
    let red = Value::Enum(EnumValue::new(color.clone(), "RED"));
    assert_eq!(json.to_vec(&color, &red).unwrap(), br#""RED""#);
    assert_eq!(json.from_slice(&color, br#""RED""#).unwrap(), red);
    let err = json.from_slice(&color, br#""BLUE""#).unwrap_err();
    assert_eq!(
        err.as_decode().map(|e| e.kind.clone()),
        Some(DecodeErrorKind::UnknownEnumConstant("BLUE".into()))
    );

    let t = TypeDescriptor::map(color.clone(), TypeDescriptor::int());
    let value = Value::Map(vec![(red, Value::Int(1))]);
    let bytes = json.to_vec(&t, &value).unwrap();
    assert_eq!(bytes, br#"{"RED":1}"#);
    assert_eq!(json.from_slice(&t, &bytes).unwrap(), value);
}

#[test]
fn optional_values() {
    let json = engine();
    let t = TypeDescriptor::optional(TypeDescriptor::string());
    assert_eq!(json.to_vec(&t, &Value::Null).unwrap(), b"null");
    assert_eq!(json.to_vec(&t, &Value::from("s")).unwrap(), br#""s""#);
    assert_eq!(json.from_slice(&t, b"null").unwrap(), Value::Null);
}

#[test]
fn untyped_lists_dispatch_on_runtime_type() {
    let json = engine();
    let t = TypeDescriptor::list(TypeDescriptor::any());
    let value = Value::List(vec![
        Value::Int(1),
        Value::from("a"),
        Value::Bool(true),
        Value::Null,
        Value::Float(2.5),
        Value::List(vec![Value::Int(3)]),
    ]);
    let bytes = json.to_vec(&t, &value).unwrap();
    assert_eq!(bytes, br#"[1,"a",true,null,2.5,[3]]"#);
    assert_eq!(json.from_slice(&t, &bytes).unwrap(), value);
}

#[test]
fn integral_floats_stay_floats_without_static_type() {
    let json = engine();
    let t = TypeDescriptor::list(TypeDescriptor::any());
    let value = Value::List(vec![Value::Float(2.0), Value::Int(3), Value::Float(-0.5)]);
    let bytes = json.to_vec(&t, &value).unwrap();
    assert_eq!(bytes, b"[2.0,3,-0.5]");
    assert_eq!(json.from_slice(&t, &bytes).unwrap(), value);
}

#[test]
fn bytes_travel_as_base64() {
    let json = engine();
    let t = TypeDescriptor::bytes();
    let value = Value::Bytes(vec![0, 1, 2, 250]);
    let bytes = json.to_vec(&t, &value).unwrap();
    assert_eq!(bytes, br#""AAEC+g==""#);
    assert_eq!(json.from_slice(&t, &bytes).unwrap(), value);
}
