use serde_json::{Value, json};
use skein_roundtrip::*;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// `decode(encode(x)) == x`
fn assert_round_trip<T: Decode + Encode + PartialEq + Debug>(value: T) {
    let encoded = value.encode();
    let decoded = T::decode(&encoded);
    assert_eq!(decoded, Ok(value), "{encoded}");
}

fn tree(value: &str, children: Vec<TreeNode>) -> TreeNode {
    TreeNode {
        value: Some(value.to_owned()),
        children: Some(children.into_iter().map(Box::new).collect()),
    }
}

#[test]
fn user_with_labels() {
    let mut labels = BTreeMap::new();
    labels.insert("team".to_owned(), "core".to_owned());
    labels.insert("tier".to_owned(), "gold".to_owned());
    assert_round_trip(User {
        id: 7,
        name: "Ada".to_owned(),
        labels: Some(Labels {
            additional_properties: labels,
        }),
    });
    assert_round_trip(User {
        id: -1,
        name: String::new(),
        labels: None,
    });
}

#[test]
fn user_wire_shape() {
    let user = User::decode(&json!({"id": 3, "name": "Bo", "labels": {"a": "b"}})).expect("decodes");
    assert_eq!(user.id, 3);
    assert_eq!(
        user.labels.as_ref().and_then(|l| l.additional_properties.get("a")),
        Some(&"b".to_owned())
    );
    assert_eq!(user.encode(), json!({"id": 3, "name": "Bo", "labels": {"a": "b"}}));

    let missing = User::decode(&json!({"id": 3}));
    assert_eq!(
        missing,
        Err(DecodeError::MissingField {
            type_name: "User",
            field: "name"
        })
    );
}

#[test]
fn nested_trees() {
    assert_round_trip(tree(
        "root",
        vec![tree("left", vec![tree("leaf", Vec::new())]), tree("right", Vec::new())],
    ));
    assert_round_trip(TreeNode {
        value: None,
        children: None,
    });
}

#[test]
fn forest_of_forests() {
    let empty = Forest(Vec::new());
    let forest = Forest(vec![
        Box::new(Forest(vec![Box::new(empty.clone())])),
        Box::new(empty.clone()),
    ]);
    assert_eq!(forest.encode(), json!([[[]], []]));
    assert_round_trip(forest);
    assert_round_trip(empty);
}

#[test]
fn pets_by_discriminator() {
    assert_round_trip(Pet::Cat(Cat {
        pet_type: "cat".to_owned(),
        indoor: Some(true),
    }));
    assert_round_trip(Pet::Dog(Dog {
        pet_type: "dog".to_owned(),
        good_boy: None,
    }));

    let unknown = Pet::decode(&json!({"petType": "parrot"}));
    assert_eq!(
        unknown,
        Err(DecodeError::UnknownDiscriminator {
            type_name: "Pet",
            field: "petType",
            value: "parrot".to_owned(),
        })
    );
}

#[test]
fn merged_animal() {
    assert_round_trip(Animal {
        id: "a-1".to_owned(),
        legs: Some(4),
    });
    assert_round_trip(Animal {
        id: "a-2".to_owned(),
        legs: None,
    });
}

#[test]
fn no_content_reads_as_absent() {
    let none: Option<TreeNode> = decode_body(204, "").expect("empty body");
    assert_eq!(none, None);

    let some: Option<TreeNode> = decode_body(200, r#"{"value": "oak"}"#).expect("tree body");
    assert_eq!(
        some,
        Some(TreeNode {
            value: Some("oak".to_owned()),
            children: None,
        })
    );

    let err = decode_body::<Forest>(200, "not json").expect_err("malformed body");
    assert!(matches!(err, TransportError::Decode { status: 200, .. }));
}

#[test]
fn param_text_prefers_raw_strings() {
    assert_eq!(param_text(&"plain".to_owned()), "plain");
    assert_eq!(param_text(&Value::from(12)), "12");
}

#[tokio::test]
async fn bad_base_url_fails_before_sending() {
    let config = ClientConfig {
        base_url: "not a url".to_owned(),
        ..ClientConfig::default()
    };
    let err = get_ping(&config).await.expect_err("invalid url");
    assert!(matches!(err, TransportError::InvalidUrl(_)));

    let err = get_user(&config, 1, None).await.expect_err("invalid url");
    assert!(matches!(err, OperationError::Transport(TransportError::InvalidUrl(_))));
}

#[test]
fn default_config_points_at_the_first_server() {
    let config = ClientConfig::default();
    assert_eq!(config.base_url, "https://api.example.com/v1");
    assert_eq!(config.timeout, std::time::Duration::from_secs(30));
    assert!(config.custom_headers.is_empty());
}
