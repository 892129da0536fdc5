//! Unit tests for payload records and codecs.

use rstest::rstest;
use serde_json::json;

use super::*;

#[test]
fn spelling_result_uses_native_field_names() {
    let value = json!({
        "suggestionAttributes": 2,
        "suggestions": ["the", "then"]
    });
    let result: SpellingResult = decode_binary(Some(&value)).expect("decodes");
    assert!(
        result
            .suggestion_attributes
            .contains(SpellingAttributes::LOOKS_LIKE_TYPO)
    );
    assert_eq!(result.suggestions, vec!["the", "then"]);
}

#[test]
fn unspecified_spelling_result_is_empty() {
    let result = SpellingResult::unspecified();
    assert!(result.is_unspecified());
    assert!(!SpellingResult::valid_word().is_unspecified());
}

#[test]
fn attributes_combine() {
    let combined =
        SpellingAttributes::LOOKS_LIKE_TYPO | SpellingAttributes::HAS_RECOMMENDED_SUGGESTIONS;
    assert_eq!(combined.bits(), 6);
    assert!(combined.contains(SpellingAttributes::HAS_RECOMMENDED_SUGGESTIONS));
    assert!(!combined.contains(SpellingAttributes::IN_THE_DICTIONARY));
}

#[test]
fn candidate_defaults_fill_missing_fields() {
    let value = json!({"text": "hello"});
    let candidate: CandidateData = decode_binary(Some(&value)).expect("decodes");
    assert_eq!(candidate.text, "hello");
    assert!(!candidate.is_eligible_for_auto_commit);
    assert!(candidate.secondary_text.is_none());
}

#[test]
fn word_request_carries_flags() {
    let request = WordRequest {
        subtype_id: 3,
        word: "helo".into(),
        prev_words: vec!["say".into()],
        flags: SuggestionRequestFlags {
            is_private_session: true,
            ..SuggestionRequestFlags::default()
        },
    };
    let value = encode_binary(&request).expect("encodes");
    assert_eq!(value["flags"]["isPrivateSession"], json!(true));
    assert_eq!(value["flags"]["maxSuggestionCount"], json!(8));
    let back: WordRequest = decode_binary(Some(&value)).expect("decodes");
    assert_eq!(back, request);
}

#[test]
fn missing_binary_payload_is_reported() {
    let result: Result<SpellingResult, _> = decode_binary(None);
    assert!(matches!(
        result,
        Err(PayloadError::Missing { expected: "binary" })
    ));
}

#[test]
fn malformed_binary_payload_is_reported() {
    let value = json!({"suggestionAttributes": "many"});
    let result: Result<SpellingResult, _> = decode_binary(Some(&value));
    assert!(matches!(result, Err(PayloadError::Malformed(_))));
}

#[rstest]
#[case(Some("true"), Some(true))]
#[case(Some("false"), Some(false))]
#[case(Some("yes"), None)]
#[case(None, None)]
fn decodes_boolean_strings(#[case] input: Option<&str>, #[case] expected: Option<bool>) {
    assert_eq!(decode_bool(input).ok(), expected);
}

#[test]
fn support_info_constructors() {
    assert_eq!(
        SubtypeSupportInfo::fully_supported().state(),
        SupportState::Supported
    );
    let unsupported = SubtypeSupportInfo::unsupported("no dictionary");
    assert_eq!(unsupported.state(), SupportState::Unsupported);
    assert_eq!(unsupported.reason(), Some("no dictionary"));
    assert_eq!(
        SubtypeSupportInfo::unspecified().state(),
        SupportState::Unspecified
    );
}
