//! Mustache template for LilyPond documents

use serde::Serialize;

use crate::error::{Result, ScoreError};

pub const LILYPOND_VERSION: &str = "2.24.0";

const STAFF_SYSTEM_TEMPLATE: &str = include_str!("templates/staff_system.ly.mustache");

/// Values substituted into the document template
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    pub version: String,
    pub has_title: bool,
    /// Already escaped for a LilyPond string
    pub title: String,
    /// The complete staff group expression
    pub staff_group: String,
}

impl TemplateContext {
    pub fn new(staff_group: String, title: Option<&str>) -> Self {
        let title = title.map(escape_string).unwrap_or_default();
        Self {
            version: LILYPOND_VERSION.to_string(),
            has_title: !title.is_empty(),
            title,
            staff_group,
        }
    }
}

pub fn render_lilypond(context: &TemplateContext) -> Result<String> {
    let template = mustache::compile_str(STAFF_SYSTEM_TEMPLATE)
        .map_err(|e| ScoreError::Export(format!("LilyPond template: {}", e)))?;
    template
        .render_to_string(context)
        .map_err(|e| ScoreError::Export(format!("LilyPond template: {}", e)))
}

fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_title() {
        let context = TemplateContext::new("  << >>".to_string(), None);
        let rendered = render_lilypond(&context).unwrap();
        assert!(rendered.starts_with("\\version \"2.24.0\""));
        assert!(!rendered.contains("\\header"));
        assert!(rendered.contains("  << >>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let context = TemplateContext::new(String::new(), Some("Say \"hi\""));
        let rendered = render_lilypond(&context).unwrap();
        assert!(rendered.contains("title = \"Say \\\"hi\\\"\""));
    }
}
