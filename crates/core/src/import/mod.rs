//! Import: parse a document, analyze it into an outline, apply the outline.

pub mod analyzer;
pub mod parser;

use serde::Serialize;
use serde_json::{Map, Value};

pub use analyzer::{default_outline, extract_json, AnalyzerError, CommandAnalyzer, StoryAnalyzer};
pub use parser::{DocumentKind, DocumentParser, ParsedDocument};

use crate::error::CoreError;
use crate::model::project::DEFAULT_PROJECT_NAME;
use crate::model::StoryboardProject;
use crate::outline::StoryOutline;

/// Outcome of analyzing one document.
#[derive(Debug, Clone, Serialize)]
pub struct ImportAnalysis {
    /// False only when the document itself could not be parsed.
    pub success: bool,
    pub kind: DocumentKind,
    pub raw_content: String,
    /// Pretty-printed outline JSON, empty when parsing failed.
    pub outline_json: String,
    pub used_fallback: bool,
    pub message: String,
}

/// Analyze a parsed document. Analyzer failures fall back to
/// [`default_outline`] and are reported in `message`.
pub async fn analyze_document(
    analyzer: Option<&dyn StoryAnalyzer>,
    document: &ParsedDocument,
) -> ImportAnalysis {
    let kind = document.kind;
    if document.is_error() {
        return ImportAnalysis {
            success: false,
            kind,
            raw_content: document.text.clone(),
            outline_json: String::new(),
            used_fallback: false,
            message: document.text.clone(),
        };
    }

    let analyzed = match analyzer {
        Some(analyzer) => match analyzer.analyze(&document.text, kind).await {
            Ok(json) => Ok(json),
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Story analysis failed, using default outline");
                Err(format!("Analysis failed, generated a default outline. Reason: {e}"))
            }
        },
        None => Err(format!("Generated a default outline from {kind} file")),
    };

    let (outline_json, used_fallback, message) = match analyzed {
        Ok(json) => (json, false, format!("Analyzed {kind} file")),
        Err(message) => {
            let fallback = default_outline(&document.text, kind);
            let json = serde_json::to_string_pretty(&fallback).unwrap_or_default();
            (json, true, message)
        }
    };

    ImportAnalysis {
        success: true,
        kind,
        raw_content: document.text.clone(),
        outline_json,
        used_fallback,
        message,
    }
}

/// Parse outline JSON and fill in any missing top-level fields.
pub fn validate_and_fix_json(text: &str) -> Result<String, CoreError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CoreError::Validation(format!("invalid outline JSON: {e}")))?;
    let Value::Object(mut map) = value else {
        return Err(CoreError::Validation("outline JSON must be an object".into()));
    };

    fill(&mut map, "project_name", Value::from(DEFAULT_PROJECT_NAME));
    for list in ["characters", "scenes", "shots"] {
        fill(&mut map, list, Value::Array(Vec::new()));
    }
    fill(&mut map, "description", Value::from(""));
    fill(&mut map, "aspect_ratio", Value::from("16:9"));
    fill(&mut map, "style", Value::from("cinematic"));

    Ok(serde_json::to_string_pretty(&Value::Object(map))?)
}

fn fill(map: &mut Map<String, Value>, key: &str, default: Value) {
    map.entry(key).or_insert(default);
}

/// Validate outline JSON and build a fresh project from it.
pub fn apply_outline(text: &str) -> Result<StoryboardProject, CoreError> {
    let fixed = validate_and_fix_json(text)?;
    let outline = StoryOutline::from_json(&fixed)
        .map_err(|e| CoreError::Validation(format!("outline does not match the expected shape: {e}")))?;
    Ok(outline.to_project())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;

    struct FixedAnalyzer(Result<&'static str, ()>);

    #[async_trait]
    impl StoryAnalyzer for FixedAnalyzer {
        async fn analyze(&self, _text: &str, _kind: DocumentKind) -> Result<String, AnalyzerError> {
            match self.0 {
                Ok(json) => Ok(json.to_string()),
                Err(()) => Err(AnalyzerError::InvalidJson("nope".into())),
            }
        }
    }

    // -- analyze --

    #[tokio::test]
    async fn analyzer_output_is_used_when_it_succeeds() {
        let analyzer = FixedAnalyzer(Ok(r#"{"project_name":"From AI"}"#));
        let result = analyze_document(Some(&analyzer), &ParsedDocument::raw("story")).await;
        assert!(result.success);
        assert!(!result.used_fallback);
        assert_eq!(result.outline_json, r#"{"project_name":"From AI"}"#);
    }

    #[tokio::test]
    async fn failing_or_missing_analyzer_falls_back() {
        let analyzer = FixedAnalyzer(Err(()));
        let failed = analyze_document(Some(&analyzer), &ParsedDocument::raw("My Story\nbody")).await;
        assert!(failed.success);
        assert!(failed.used_fallback);
        assert!(failed.message.starts_with("Analysis failed"));
        assert!(failed.outline_json.contains("My Story"));

        let absent = analyze_document(None, &ParsedDocument::raw("x")).await;
        assert!(absent.used_fallback);
    }

    #[tokio::test]
    async fn unparseable_document_is_not_analyzed() {
        let doc = DocumentParser::parse(std::path::Path::new("/nonexistent/story.md"));
        let result = analyze_document(None, &doc).await;
        assert!(!result.success);
        assert!(result.outline_json.is_empty());
        assert!(result.message.starts_with("[error]"));
    }

    // -- validate --

    #[test]
    fn missing_fields_are_filled() {
        let fixed = validate_and_fix_json(r#"{"characters":[{"name":"A"}]}"#).unwrap();
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["project_name"], DEFAULT_PROJECT_NAME);
        assert_eq!(value["scenes"], Value::Array(Vec::new()));
        assert_eq!(value["aspect_ratio"], "16:9");
        assert_eq!(value["style"], "cinematic");
        assert_eq!(value["characters"][0]["name"], "A");
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert_matches!(validate_and_fix_json("{oops"), Err(CoreError::Validation(_)));
        assert_matches!(validate_and_fix_json("[1,2]"), Err(CoreError::Validation(_)));
    }

    // -- apply --

    #[test]
    fn apply_builds_project_from_fallback_outline() {
        let outline = default_outline("Rainy Night", DocumentKind::Text);
        let json = serde_json::to_string(&outline).unwrap();
        let project = apply_outline(&json).unwrap();
        assert_eq!(project.name, "Rainy Night");
        assert_eq!(project.shots.len(), 2);
        assert_eq!(
            project.shots[1].characters_in_shot,
            vec![project.characters[0].id.clone()]
        );
    }

    #[test]
    fn apply_rejects_wrongly_typed_fields() {
        assert_matches!(
            apply_outline(r#"{"shots": "not a list"}"#),
            Err(CoreError::Validation(_))
        );
    }
}
