//! Prompt construction and search-query derivation.

use std::collections::HashSet;

use edugen_shared::ContentRequest;

/// Upper bound on the derived search query length, in characters.
const MAX_QUERY_CHARS: usize = 200;

/// Prompt for the draft generation stage.
pub fn generation_prompt(request: &ContentRequest) -> String {
    let ContentRequest {
        grade_level,
        subject,
        topic,
        topic_details,
    } = request;
    let details = topic_details.as_deref().unwrap_or("None provided.");

    format!(
        "Generate educational content for {subject} at a {grade_level} level, focusing on the topic of {topic}.

Please ensure the content is:
- Informative and accurate for a {grade_level} level understanding.
- Engaging and easy to understand for students.
- Structured logically with headings and bullet points where appropriate.
- Written in a neutral, inclusive, and unbiased manner.
- Written in clear and simple language appropriate for {grade_level}.

Topic details: {details}"
    )
}

/// Derive the web search query from the request and the generated draft.
///
/// Starts from `"{topic} {subject} {grade_level}"` and appends the first
/// Markdown heading of the draft that contributes new words. Whitespace is
/// collapsed and the result is capped at 200 characters on a word boundary;
/// a single word longer than the cap is cut to fit.
pub fn search_query(request: &ContentRequest, draft: &str) -> String {
    let mut parts = vec![
        request.topic.as_str(),
        request.subject.as_str(),
        request.grade_level.as_str(),
    ];

    let known: HashSet<String> = parts
        .iter()
        .flat_map(|p| p.split_whitespace())
        .map(str::to_lowercase)
        .collect();
    if let Some(heading) =
        headings(draft).find(|h| h.split_whitespace().any(|w| !known.contains(&w.to_lowercase())))
    {
        parts.push(heading);
    }

    let mut query = String::new();
    let mut chars = 0;
    for word in parts.iter().flat_map(|p| p.split_whitespace()) {
        let word_chars = word.chars().count();
        if query.is_empty() {
            query.extend(word.chars().take(MAX_QUERY_CHARS));
            chars = word_chars.min(MAX_QUERY_CHARS);
            continue;
        }
        if chars + 1 + word_chars > MAX_QUERY_CHARS {
            break;
        }
        query.push(' ');
        query.push_str(word);
        chars += 1 + word_chars;
    }
    query
}

/// Markdown heading texts (`#`..`######`) in draft order, without emphasis
/// markers.
fn headings(draft: &str) -> impl Iterator<Item = &str> {
    draft
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().trim_matches('*').trim())
        .filter(|text| !text.is_empty())
}

/// Prompt for the structured simplification stage.
///
/// Embeds the draft, the search context and the exact JSON schema the
/// response must follow.
pub fn simplification_prompt(request: &ContentRequest, draft: &str, search_context: &str) -> String {
    let grade_level = &request.grade_level;

    format!(
        r#"Simplify the following educational content so it is easy to understand and engaging for {grade_level} students. Use clear, concise language and vocabulary suited to their age. Use the search results below to add relevant context and to check accuracy.

Structure the simplified content as a JSON object in exactly this format:

{{
  "title": "Concise title for the topic",
  "grade_level_appropriateness_assessment": "Brief assessment of how well the content suits the target grade level (e.g. 'Excellent', 'Good', 'Needs further simplification')",
  "sections": [
    {{
      "heading": "Section heading (e.g. Introduction)",
      "content": "Simplified content for this section, as short paragraphs or bullet points"
    }}
  ],
  "summary": "A short summary of the key learning points."
}}

Include as many sections as the topic needs.

Original Content: {draft}

Search Results: {search_context}

The ENTIRE response must be valid JSON and nothing else."#
    )
}
