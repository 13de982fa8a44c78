//! Property-based checks: declared records and untyped trees survive an
//! encode/decode cycle in both writer modes, and member order in the input
//! never changes what a record decodes to.

#![allow(clippy::unwrap_used)]

use json_bind::{JsonBind, Member, Object, Settings, TypeDeclaration, TypeDescriptor, Value};
use proptest::prelude::*;

fn profile(json: &JsonBind) -> TypeDescriptor {
    json.declare(TypeDeclaration::record(
        "Profile",
        vec![
            Member::new("id", TypeDescriptor::int()),
            Member::new("name", TypeDescriptor::string()),
            Member::new("score", TypeDescriptor::float()),
            Member::new("tags", TypeDescriptor::list(TypeDescriptor::string())),
            Member::new("active", TypeDescriptor::bool()),
        ],
    ))
}

fn or_null<T: Into<Value>>(v: Option<T>) -> Value {
    v.map(Into::into).unwrap_or(Value::Null)
}

fn arb_profile(t: TypeDescriptor) -> impl Strategy<Value = Value> {
    (
        prop::option::of(any::<i64>()),
        prop::option::of("[a-zA-Z0-9 \"\\\\]{0,12}"),
        prop::option::of(any::<f64>().prop_filter("finite", |f| f.is_finite())),
        prop::option::of(prop::collection::vec("[a-z]{0,6}", 0..4)),
        prop::option::of(any::<bool>()),
    )
        .prop_map(move |(id, name, score, tags, active)| {
            let tags = tags.map(|tags| Value::List(tags.into_iter().map(Value::from).collect()));
            Object::new(t.clone())
                .with("id", or_null(id))
                .with("name", or_null(name))
                .with("score", or_null(score))
                .with("tags", tags.unwrap_or(Value::Null))
                .with("active", or_null(active))
                .into()
        })
}

/// Trees the untyped codec reproduces exactly.
fn arb_untyped() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::Float),
        (-1000i32..1000).prop_map(|n| Value::Float(n as f64)),
        "[a-zé中]{0,8}".prop_map(Value::Str),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Value::List)
    })
}

proptest! {
    #[test]
    fn records_round_trip(
        omit in any::<bool>(),
        value in arb_profile(TypeDescriptor::named("Profile")),
    ) {
        let json = JsonBind::new(Settings::default().with_omit_defaults(omit));
        let t = profile(&json);
        let bytes = json.to_vec(&t, &value).unwrap();
        prop_assert_eq!(json.from_slice(&t, &bytes).unwrap(), value);
    }

    #[test]
    fn member_order_does_not_matter(id in any::<i64>(), name in "[a-z]{0,8}", active in any::<bool>()) {
        let json = JsonBind::new(Settings::default());
        let t = profile(&json);
        let members = [
            format!("\"id\":{}", id),
            format!("\"name\":\"{}\"", name),
            format!("\"active\":{}", active),
        ];
        let forward = format!("{{{}}}", members.join(","));
        let reversed: Vec<_> = members.iter().rev().cloned().collect();
        let backward = format!("{{ {} }}", reversed.join(" , "));
        prop_assert_eq!(
            json.from_slice(&t, forward.as_bytes()).unwrap(),
            json.from_slice(&t, backward.as_bytes()).unwrap()
        );
    }

    #[test]
    fn untyped_lists_round_trip(items in prop::collection::vec(arb_untyped(), 0..6)) {
        let json = JsonBind::new(Settings::default());
        let t = TypeDescriptor::list(TypeDescriptor::any());
        let value = Value::List(items);
        let bytes = json.to_vec(&t, &value).unwrap();
        prop_assert_eq!(json.from_slice(&t, &bytes).unwrap(), value);
    }
}
