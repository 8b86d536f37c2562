// Tests for the regex-based JSON scraping in `counsel_core::extract`.
//
// Model replies are free text: JSON may arrive bare, wrapped in prose,
// fenced in markdown, or not at all. Extraction must never panic and
// parsing must degrade to None so callers can substitute fallbacks.

use counsel_core::extract::{
    extract_json_array, extract_json_object, parse_json_array, parse_json_object,
};
use counsel_core::types::LawyerProfile;
use std::collections::HashMap;

// =============================================================================
// Array extraction
// =============================================================================

#[test]
fn bare_array_is_extracted() {
    let text = r#"["query one", "query two"]"#;
    assert_eq!(extract_json_array(text), Some(text));
}

#[test]
fn array_in_surrounding_prose_is_extracted() {
    let text = "Sure! Here are the queries you asked for:\n\n[\"a\", \"b\"]\n\nLet me know if you need more.";
    assert_eq!(extract_json_array(text), Some(r#"["a", "b"]"#));
}

#[test]
fn array_in_code_fence_is_extracted() {
    let text = "```json\n[\"a\", \"b\", \"c\"]\n```";
    let parsed: Vec<String> = parse_json_array(text).expect("should parse");
    assert_eq!(parsed, vec!["a", "b", "c"]);
}

#[test]
fn multiline_array_is_extracted() {
    let text = "Queries:\n[\n  \"first\",\n  \"second\"\n]";
    let parsed: Vec<String> = parse_json_array(text).expect("should parse");
    assert_eq!(parsed.len(), 2);
}

#[test]
fn no_brackets_yields_none() {
    assert!(extract_json_array("no json here at all").is_none());
    assert!(extract_json_array("").is_none());
}

#[test]
fn only_open_bracket_yields_none() {
    assert!(extract_json_array("list: [a, b, c").is_none());
}

// =============================================================================
// Greedy span: first bracket through last bracket
// =============================================================================

#[test]
fn two_arrays_produce_one_greedy_span() {
    let text = r#"First: ["a"] and second: ["b"]"#;
    // The span covers both arrays...
    assert_eq!(extract_json_array(text), Some(r#"["a"] and second: ["b"]"#));
    // ...which is not valid JSON, so parsing falls through to None.
    assert!(parse_json_array::<String>(text).is_none());
}

#[test]
fn nested_arrays_parse_as_one_value() {
    let text = r#"[["a"], ["b"]]"#;
    let parsed: Vec<Vec<String>> = parse_json_array(text).expect("should parse");
    assert_eq!(parsed.len(), 2);
}

// =============================================================================
// Parse failures degrade to None
// =============================================================================

#[test]
fn malformed_json_inside_brackets_yields_none() {
    assert!(parse_json_array::<String>("[not, valid, json]").is_none());
}

#[test]
fn shape_mismatch_yields_none() {
    // An array of numbers does not deserialize as lawyer profiles.
    assert!(parse_json_array::<LawyerProfile>("[1, 2, 3]").is_none());
}

#[test]
fn lawyer_profiles_parse_from_wire_shape() {
    let text = r#"Here are the extracted profiles:
    [
      {
        "name": "Jane Smith",
        "firm": "Smith Immigration Law",
        "contact_info": {"email": "jane@smithlaw.com", "phone": "212-555-0100", "website": "www.smithlaw.com"}
      },
      {
        "name": "Bob Jones",
        "firm": "Jones & Partners"
      }
    ]"#;
    let profiles: Vec<LawyerProfile> = parse_json_array(text).expect("should parse");
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0].name, "Jane Smith");
    assert_eq!(
        profiles[0].contact_info.email.as_deref(),
        Some("jane@smithlaw.com")
    );
    // Missing contact_info defaults to empty, not a parse failure.
    assert_eq!(profiles[1].contact_info.field_count(), 0);
}

// =============================================================================
// Object extraction
// =============================================================================

#[test]
fn score_object_in_prose_is_parsed() {
    let text = "Based on the priorities, here are my scores:\n{\"Jane Smith\": 92, \"Bob Jones\": 75.5}";
    let scores: HashMap<String, f64> = parse_json_object(text).expect("should parse");
    assert_eq!(scores.get("Jane Smith"), Some(&92.0));
    assert_eq!(scores.get("Bob Jones"), Some(&75.5));
}

#[test]
fn no_object_yields_none() {
    assert!(extract_json_object("scores: none").is_none());
    assert!(parse_json_object::<HashMap<String, f64>>("nothing structured").is_none());
}
