//! Unions dispatched on a discriminator property or leading array element.

use json_bind::{
    DecodeErrorKind, EncodeError, Error, FormatPolicy, JsonBind, Member, Object, Settings,
    TypeDeclaration, TypeDescriptor, Value, Variant,
};

struct Shapes {
    union: TypeDescriptor,
    a: TypeDescriptor,
    b: TypeDescriptor,
    c: TypeDescriptor,
}

fn declare(json: &JsonBind, b_formats: FormatPolicy) -> Shapes {
    let a = json.declare(TypeDeclaration::record(
        "A",
        vec![Member::new("a", TypeDescriptor::int())],
    ));
    let b = json.declare(
        TypeDeclaration::record(
            "B",
            vec![
                Member::new("x", TypeDescriptor::int()),
                Member::new("y", TypeDescriptor::int()),
            ],
        )
        .with_formats(b_formats),
    );
    let c = json.declare(TypeDeclaration::record("C", vec![]).with_formats(b_formats));
    let union = json.declare(TypeDeclaration::union(
        "Shape",
        vec![
            Variant::new(a.clone()),
            Variant::new(b.clone()),
            Variant::new(c.clone()),
        ],
    ));
    Shapes { union, a, b, c }
}

#[test]
fn discriminator_is_written_first() {
    let json = JsonBind::new(Settings::default());
    let s = declare(&json, FormatPolicy::ObjectOnly);
    let b: Value = Object::new(s.b.clone()).with("x", 1).with("y", 2).into();
    let bytes = json.to_vec(&s.union, &b).unwrap();
    assert_eq!(bytes, br#"{"$type":"B","x":1,"y":2}"#);
    assert_eq!(json.from_slice(&s.union, &bytes).unwrap(), b);
    assert_eq!(
        json.from_slice(&s.union, br#"{"$type":"B","y":2,"x":1}"#)
            .unwrap(),
        b
    );
}

#[test]
fn variant_without_members() {
    let json = JsonBind::new(Settings::default());
    let s = declare(&json, FormatPolicy::ObjectOnly);
    let c: Value = Object::new(s.c.clone()).into();
    assert_eq!(json.to_vec(&s.union, &c).unwrap(), br#"{"$type":"C"}"#);
    assert_eq!(json.from_slice(&s.union, br#"{"$type":"C"}"#).unwrap(), c);
    assert_eq!(json.to_vec(&s.union, &Value::Null).unwrap(), b"null");
    assert_eq!(json.from_slice(&s.union, b"null").unwrap(), Value::Null);
}

#[test]
fn minimal_writer_closes_after_discriminator() {
    let json = JsonBind::new(Settings::default().with_omit_defaults(true));
    let s = declare(&json, FormatPolicy::ObjectOnly);
    let c: Value = Object::new(s.c.clone()).into();
    assert_eq!(json.to_vec(&s.union, &c).unwrap(), br#"{"$type":"C"}"#);
    let b: Value = Object::new(s.b.clone()).with("x", 1).into();
    assert_eq!(
        json.to_vec(&s.union, &b).unwrap(),
        br#"{"$type":"B","x":1}"#
    );
    let a: Value = Object::new(s.a.clone()).into();
    assert_eq!(json.to_vec(&s.union, &a).unwrap(), br#"{"$type":"A"}"#);
}

#[test]
fn discriminator_must_come_first() {
    let json = JsonBind::new(Settings::default());
    let s = declare(&json, FormatPolicy::ObjectOnly);
    let err = json
        .from_slice(&s.union, br#"{"x":1,"$type":"B"}"#)
        .unwrap_err();
    assert!(err
        .to_string()
        .starts_with(r#"Expecting "$type" attribute as first element of Shape"#));
    assert!(json.from_slice(&s.union, b"{}").is_err());
}

#[test]
fn unknown_discriminator() {
    let json = JsonBind::new(Settings::default());
    let s = declare(&json, FormatPolicy::ObjectOnly);
    let err = json
        .from_slice(&s.union, br#"{"$type":"Z","x":1}"#)
        .unwrap_err();
    let decode = err.as_decode().unwrap();
    assert_eq!(decode.kind, DecodeErrorKind::UnknownDiscriminator("Z".into()));
    assert_eq!(decode.offset, 9);
}

#[test]
fn unregistered_runtime_type() {
    let json = JsonBind::new(Settings::default());
    let s = declare(&json, FormatPolicy::ObjectOnly);
    let stranger = json.declare(TypeDeclaration::record("D", vec![]));
    let err = json
        .to_vec(&s.union, &Object::new(stranger).into())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Encode(EncodeError::UnregisteredVariant { .. })
    ));
}

#[test]
fn array_form_carries_tag_as_first_element() {
    let json = JsonBind::new(Settings::default());
    let s = declare(&json, FormatPolicy::ArrayPrimary);
    let b: Value = Object::new(s.b.clone()).with("x", 1).with("y", 2).into();
    let bytes = json.to_vec(&s.union, &b).unwrap();
    assert_eq!(bytes, br#"["B",1,2]"#);
    assert_eq!(json.from_slice(&s.union, &bytes).unwrap(), b);
    assert_eq!(
        json.from_slice(&s.union, br#"{"$type":"B","x":1,"y":2}"#)
            .unwrap(),
        b
    );

    let c: Value = Object::new(s.c.clone()).into();
    assert_eq!(json.to_vec(&s.union, &c).unwrap(), br#"["C"]"#);
    assert_eq!(json.from_slice(&s.union, br#"["C"]"#).unwrap(), c);
}

#[test]
fn custom_tags_and_discriminator_names() {
    let json = JsonBind::new(Settings::default().with_discriminator("@type"));
    let circle = json.declare(TypeDeclaration::record(
        "Circle",
        vec![Member::new("r", TypeDescriptor::float())],
    ));
    let engine_wide = json.declare(TypeDeclaration::union(
        "Figure",
        vec![Variant::tagged("circle", circle.clone())],
    ));
    let per_union = json.declare(
        TypeDeclaration::union("Drawable", vec![Variant::tagged("c", circle.clone())])
            .with_discriminator("kind"),
    );
    let value: Value = Object::new(circle).with("r", 1.5).into();
    assert_eq!(
        json.to_vec(&engine_wide, &value).unwrap(),
        br#"{"@type":"circle","r":1.5}"#
    );
    assert_eq!(
        json.to_vec(&per_union, &value).unwrap(),
        br#"{"kind":"c","r":1.5}"#
    );
    assert_eq!(
        json.from_slice(&per_union, br#"{"kind":"c","r":1.5}"#)
            .unwrap(),
        value
    );
}

#[test]
fn lists_of_variants() {
    let json = JsonBind::new(Settings::default());
    let s = declare(&json, FormatPolicy::ObjectOnly);
    let list = TypeDescriptor::list(s.union.clone());
    let value = Value::List(vec![
        Object::new(s.a.clone()).with("a", 1).into(),
        Object::new(s.c.clone()).into(),
        Value::Null,
        Object::new(s.b.clone()).with("x", 2).with("y", 3).into(),
    ]);
    let bytes = json.to_vec(&list, &value).unwrap();
    assert_eq!(
        bytes,
        br#"[{"$type":"A","a":1},{"$type":"C"},null,{"$type":"B","x":2,"y":3}]"#
    );
    assert_eq!(json.from_slice(&list, &bytes).unwrap(), value);
}
