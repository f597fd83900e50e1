//! Strict decoding of the simplification model's JSON output.

use edugen_shared::{EdugenError, Result, SimplifiedDraft};

/// Decode `text` as a [`SimplifiedDraft`] or fail with `MalformedResponse`.
///
/// A single Markdown code fence around the payload is tolerated; anything
/// else that is not the schema is rejected.
pub fn parse_draft(service: &str, text: &str) -> Result<SimplifiedDraft> {
    let payload = strip_code_fence(text);

    if payload.is_empty() {
        return Err(EdugenError::malformed(service, "empty response text"));
    }

    let draft: SimplifiedDraft = serde_json::from_str(payload).map_err(|e| {
        EdugenError::malformed(
            service,
            format!("output does not match the content schema: {e}"),
        )
    })?;

    draft
        .validate()
        .map_err(|reason| EdugenError::malformed(service, reason))?;

    Ok(draft)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    match inner.split_once('\n') {
        Some((tag, body)) if !tag.trim_start().starts_with('{') => body.trim(),
        _ => inner.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "title": "Plants Make Food",
        "grade_level_appropriateness_assessment": "Good",
        "sections": [{"heading": "Intro", "content": "Plants use sunlight."}],
        "summary": "Plants need light."
    }"#;

    #[test]
    fn parses_valid_payload() {
        let draft = parse_draft("gemini", VALID).unwrap();
        assert_eq!(draft.title, "Plants Make Food");
        assert_eq!(draft.sections.len(), 1);
    }

    #[test]
    fn tolerates_code_fence() {
        let fenced = format!("```json\n{VALID}\n```");
        assert!(parse_draft("gemini", &fenced).is_ok());
    }

    #[test]
    fn rejects_plain_text() {
        let err = parse_draft("gemini", "Sure! Here is your content about plants.").unwrap_err();
        assert!(matches!(err, EdugenError::MalformedResponse { .. }));
    }

    #[test]
    fn rejects_wrong_shape() {
        let err = parse_draft("gemini", r#"{"title": "X", "sections": "none"}"#).unwrap_err();
        assert!(err.to_string().contains("schema"));
    }

    #[test]
    fn rejects_missing_sections() {
        let err = parse_draft("gemini", r#"{"title": "X", "sections": []}"#).unwrap_err();
        assert!(err.to_string().contains("sections"));
    }

    #[test]
    fn rejects_empty() {
        assert!(parse_draft("gemini", "  \n").is_err());
    }
}
