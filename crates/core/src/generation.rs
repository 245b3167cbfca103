//! Boundary types for the external layout generator.
//!
//! The generator itself is an HTTP collaborator living in the API crate.
//! This module owns what crosses that boundary: the closed set of actions,
//! prompt construction, repair of loosely formatted model output, and the
//! placeholder document persisted when generation fails.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of a natural-language layout description.
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Maximum size of code submitted for improvement or recommendations.
pub const MAX_CODE_LENGTH: usize = 500_000;

/// Maximum number of recommendations returned to the caller.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Title used when neither the caller nor the model supplies one.
pub const FALLBACK_TITLE: &str = "Untitled layout";

define_text_enum! {
    /// How the user described the layout they want.
    InputMethod ("input method") {
        Text = "text",
        Image = "image",
    }
}

/// A single request to the generator. Each variant carries only the fields
/// valid for that kind of action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GenerationAction {
    Generate {
        description: String,
        #[serde(default)]
        additional_context: Option<String>,
        input_method: InputMethod,
    },
    Improve {
        code: String,
        feedback: String,
    },
    Recommend {
        code: String,
    },
}

impl GenerationAction {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationAction::Generate { .. } => "generate",
            GenerationAction::Improve { .. } => "improve",
            GenerationAction::Recommend { .. } => "recommend",
        }
    }

    /// Check the action's fields before any call leaves the process.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            GenerationAction::Generate { description, .. } => {
                require_text("description", description, MAX_DESCRIPTION_LENGTH)
            }
            GenerationAction::Improve { code, feedback } => {
                require_text("code", code, MAX_CODE_LENGTH)?;
                require_text("feedback", feedback, MAX_DESCRIPTION_LENGTH)
            }
            GenerationAction::Recommend { code } => require_text("code", code, MAX_CODE_LENGTH),
        }
    }

    /// System instruction sent with every request of this kind.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            GenerationAction::Generate { .. } | GenerationAction::Improve { .. } => {
                "You are a front-end engineer. Produce a single self-contained HTML document \
                 with embedded CSS. Respond with a JSON object containing the keys \
                 \"html\", \"title\" and \"description\" and nothing else."
            }
            GenerationAction::Recommend { .. } => {
                "You review HTML/CSS layouts. Respond with a JSON object of the form \
                 {\"recommendations\": [\"...\"]} listing concrete, actionable improvements."
            }
        }
    }

    /// User message for this action.
    pub fn user_prompt(&self) -> String {
        match self {
            GenerationAction::Generate {
                description,
                additional_context,
                input_method,
            } => {
                let mut prompt = match input_method {
                    InputMethod::Text => format!("Create a layout for: {description}"),
                    InputMethod::Image => format!(
                        "Recreate the layout shown in the attached image. Image description: {description}"
                    ),
                };
                if let Some(context) = additional_context.as_deref().filter(|c| !c.trim().is_empty())
                {
                    prompt.push_str("\n\nAdditional context: ");
                    prompt.push_str(context);
                }
                prompt
            }
            GenerationAction::Improve { code, feedback } => format!(
                "Improve the following layout according to this feedback: {feedback}\n\n{code}"
            ),
            GenerationAction::Recommend { code } => {
                format!("Suggest improvements for this layout:\n\n{code}")
            }
        }
    }
}

fn require_text(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if value.len() > max {
        return Err(CoreError::Validation(format!(
            "{field} must not exceed {max} bytes"
        )));
    }
    Ok(())
}

/// Layout markup extracted from a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMarkup {
    pub html: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
struct RawMarkup {
    #[serde(alias = "code")]
    html: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecommendations {
    Wrapped { recommendations: Vec<String> },
    Bare(Vec<String>),
}

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\n?\s*```\s*$").expect("valid fence regex")
});

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid trailing comma regex"));

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*(!doctype|html|body|div|section|main|header|style)\b")
        .expect("valid html regex")
});

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+)$").expect("valid list regex"));

/// Remove a surrounding Markdown code fence, if any.
fn strip_fence(raw: &str) -> &str {
    FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map_or(raw.trim(), |m| m.as_str().trim())
}

/// Parse `text` as JSON, retrying on the outermost `{...}` / `[...]` span and
/// with trailing commas removed.
fn parse_lenient<T: for<'de> Deserialize<'de>>(text: &str) -> Option<T> {
    let mut candidates = vec![text.to_string()];
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
            if start < end {
                candidates.push(text[start..=end].to_string());
            }
        }
    }

    candidates.into_iter().find_map(|candidate| {
        serde_json::from_str(&candidate).ok().or_else(|| {
            let cleaned = TRAILING_COMMA.replace_all(&candidate, "$1");
            serde_json::from_str(&cleaned).ok()
        })
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Turn raw model output into layout markup.
///
/// Accepts strict JSON, fenced JSON, JSON embedded in prose, JSON with
/// trailing commas, or bare HTML. Anything else is a `DependencyFailure`.
pub fn repair_markup(raw: &str) -> Result<GeneratedMarkup, CoreError> {
    let text = strip_fence(raw);

    if let Some(parsed) = parse_lenient::<RawMarkup>(text) {
        if !parsed.html.trim().is_empty() {
            return Ok(GeneratedMarkup {
                html: parsed.html,
                title: non_blank(parsed.title),
                description: non_blank(parsed.description),
            });
        }
    }

    if HTML_TAG.is_match(text) {
        return Ok(GeneratedMarkup {
            html: text.to_string(),
            title: None,
            description: None,
        });
    }

    Err(CoreError::DependencyFailure(
        "Generator returned output that is neither JSON nor HTML".to_string(),
    ))
}

/// Turn raw model output into a list of recommendations.
///
/// Falls back to Markdown list items when the output is not JSON.
pub fn repair_recommendations(raw: &str) -> Result<Vec<String>, CoreError> {
    let text = strip_fence(raw);

    let items = match parse_lenient::<RawRecommendations>(text) {
        Some(RawRecommendations::Wrapped { recommendations }) => recommendations,
        Some(RawRecommendations::Bare(items)) => items,
        None => text
            .lines()
            .filter_map(|line| LIST_ITEM.captures(line))
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect(),
    };

    let items: Vec<String> = items
        .into_iter()
        .filter_map(|i| non_blank(Some(i)))
        .take(MAX_RECOMMENDATIONS)
        .collect();

    if items.is_empty() {
        return Err(CoreError::DependencyFailure(
            "Generator returned no usable recommendations".to_string(),
        ));
    }
    Ok(items)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Minimal, valid HTML document persisted when the generator fails so the
/// user still receives a layout.
pub fn placeholder_markup(title: &str, description: &str) -> GeneratedMarkup {
    let title = escape_html(title);
    let body = escape_html(description);
    let html = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>\n\
         body {{ font-family: system-ui, sans-serif; margin: 0; padding: 3rem; color: #1f2937; }}\n\
         main {{ max-width: 48rem; margin: 0 auto; }}\n\
         h1 {{ font-size: 2rem; margin-bottom: 1rem; }}\n\
         </style>\n</head>\n<body>\n<main>\n<h1>{title}</h1>\n<p>{body}</p>\n</main>\n</body>\n</html>\n"
    );
    GeneratedMarkup {
        html,
        title: None,
        description: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_deserializes_by_tag() {
        let json = r#"{"action":"improve","code":"<div></div>","feedback":"bigger"}"#;
        let action: GenerationAction = serde_json::from_str(json).unwrap();
        assert_eq!(action.kind(), "improve");
    }

    #[test]
    fn action_rejects_foreign_fields_shape() {
        let json = r#"{"action":"recommend"}"#;
        assert!(serde_json::from_str::<GenerationAction>(json).is_err());
    }

    #[test]
    fn generate_requires_description() {
        let action = GenerationAction::Generate {
            description: "  ".into(),
            additional_context: None,
            input_method: InputMethod::Text,
        };
        assert!(action.validate().is_err());
    }

    #[test]
    fn generate_prompt_includes_context() {
        let action = GenerationAction::Generate {
            description: "a bakery landing page".into(),
            additional_context: Some("use pastel colours".into()),
            input_method: InputMethod::Text,
        };
        let prompt = action.user_prompt();
        assert!(prompt.contains("a bakery landing page"));
        assert!(prompt.contains("use pastel colours"));
    }

    #[test]
    fn repairs_strict_json() {
        let raw = r#"{"html":"<div>Hi</div>","title":"Hello","description":"greeting"}"#;
        let markup = repair_markup(raw).unwrap();
        assert_eq!(markup.html, "<div>Hi</div>");
        assert_eq!(markup.title.as_deref(), Some("Hello"));
    }

    #[test]
    fn repairs_fenced_json_with_trailing_comma() {
        let raw = "```json\n{\"html\": \"<main></main>\", \"title\": \"Shop\",}\n```";
        let markup = repair_markup(raw).unwrap();
        assert_eq!(markup.html, "<main></main>");
        assert_eq!(markup.title.as_deref(), Some("Shop"));
    }

    #[test]
    fn repairs_json_embedded_in_prose() {
        let raw = "Sure! Here you go: {\"code\": \"<section>x</section>\"} Enjoy.";
        let markup = repair_markup(raw).unwrap();
        assert_eq!(markup.html, "<section>x</section>");
        assert!(markup.title.is_none());
    }

    #[test]
    fn accepts_bare_html() {
        let raw = "```html\n<!DOCTYPE html><html><body>ok</body></html>\n```";
        let markup = repair_markup(raw).unwrap();
        assert!(markup.html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn unusable_output_is_dependency_failure() {
        let err = repair_markup("I cannot help with that.").unwrap_err();
        assert!(matches!(err, CoreError::DependencyFailure(_)));
    }

    #[test]
    fn empty_html_field_is_dependency_failure() {
        assert!(repair_markup(r#"{"html": "   "}"#).is_err());
    }

    #[test]
    fn recommendations_from_json_or_list() {
        let json = r#"{"recommendations": ["Add alt text", "Increase contrast"]}"#;
        assert_eq!(repair_recommendations(json).unwrap().len(), 2);

        let list = "Here are some ideas:\n- Add alt text\n2. Use a grid\n";
        assert_eq!(
            repair_recommendations(list).unwrap(),
            vec!["Add alt text".to_string(), "Use a grid".to_string()]
        );
    }

    #[test]
    fn placeholder_escapes_user_text() {
        let markup = placeholder_markup("<script>", "Tom & Jerry");
        assert!(markup.html.contains("&lt;script&gt;"));
        assert!(markup.html.contains("Tom &amp; Jerry"));
        assert!(markup.html.starts_with("<!DOCTYPE html>"));
    }
}
