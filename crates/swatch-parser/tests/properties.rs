use proptest::prelude::*;
use serde_json::{Map, Value, json};
use swatch_parser::{Input, ParseOptions, TokenSet, parse};

/// Token entries with aliases pointing both forwards and backwards.
fn entries() -> Vec<(&'static str, Value)> {
    vec![
        ("base", json!({"$type": "dimension", "$value": "4px"})),
        ("double", json!({"$type": "dimension", "$value": "{triple}"})),
        ("triple", json!({"$type": "dimension", "$value": "12px"})),
        ("ink", json!({"$type": "color", "$value": "#112233"})),
        ("text", json!({"$type": "color", "$value": "{ink}"})),
        (
            "outline",
            json!({"$type": "border", "$value": {"color": "{text}", "width": "{base}", "style": "dashed"}}),
        ),
        ("muted", json!({"$type": "color", "$value": "{text}"})),
        ("weight", json!({"$type": "fontWeight", "$value": "bold"})),
    ]
}

fn run(entries: Vec<(&'static str, Value)>) -> TokenSet {
    let document: Map<String, Value> = entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("Failed to build runtime");
    runtime
        .block_on(parse(vec![Input::new(Value::Object(document))], ParseOptions::default()))
        .expect("Failed to parse")
        .tokens
}

proptest! {
    #[test]
    fn member_order_does_not_change_values(shuffled in Just(entries()).prop_shuffle()) {
        let expected = run(entries());
        let actual = run(shuffled);

        prop_assert_eq!(actual.len(), expected.len());
        for token in &expected {
            let other = actual.get(&token.id).unwrap();
            prop_assert_eq!(&other.value, &token.value);
            prop_assert_eq!(&other.alias_of, &token.alias_of);
            prop_assert_eq!(&other.alias_chain, &token.alias_chain);
        }
    }
}
