//! JSON decoding for extraction-service responses
//!
//! Model responses are untrusted: they routinely wrap the JSON payload in
//! code fences or surrounding prose. These functions strip the wrappers,
//! locate the payload by brace matching, and decode into typed structs.
//! Any failure is a structured `Error::Extraction`, never a partial value.

use crate::error::{Error, Result};

use super::types::{ExtractedInsight, ExtractedStatement};

/// Strip a leading/trailing Markdown code fence (``` or ```json)
fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Locate the first complete JSON object by matching braces
fn find_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let mut depth = 0;

    for (i, c) in response[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&response[start..=start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn truncate_for_error(s: &str) -> String {
    const LIMIT: usize = 200;
    if s.len() <= LIMIT {
        return s.to_string();
    }
    // Back off to a char boundary so multibyte output can't split
    let mut end = LIMIT;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Parse a statement extraction from a model response
pub fn parse_statement_response(response: &str) -> Result<ExtractedStatement> {
    let cleaned = strip_code_fences(response);
    let json_str = find_json_object(cleaned).ok_or_else(|| {
        Error::Extraction(format!(
            "No JSON found in extraction response | Raw: {}",
            truncate_for_error(cleaned)
        ))
    })?;

    serde_json::from_str(json_str).map_err(|e| {
        Error::Extraction(format!(
            "Invalid extraction JSON: {} | Raw: {}",
            e,
            truncate_for_error(json_str)
        ))
    })
}

/// Envelope the insight prompt asks for
#[derive(Debug, serde::Deserialize)]
struct InsightEnvelope {
    insights: Vec<ExtractedInsight>,
}

/// Parse generated insights from a model response
pub fn parse_insights_response(response: &str) -> Result<Vec<ExtractedInsight>> {
    let cleaned = strip_code_fences(response);
    let json_str = find_json_object(cleaned).ok_or_else(|| {
        Error::Extraction(format!(
            "No JSON found in insight response | Raw: {}",
            truncate_for_error(cleaned)
        ))
    })?;

    let envelope: InsightEnvelope = serde_json::from_str(json_str).map_err(|e| {
        Error::Extraction(format!(
            "Invalid insight JSON: {} | Raw: {}",
            e,
            truncate_for_error(json_str)
        ))
    })?;

    Ok(envelope.insights)
}
