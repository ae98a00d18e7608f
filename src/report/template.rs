use std::path::Path;

use anyhow::{Context, Result};

use super::ReportContext;

const DEFAULT_TEMPLATE: &str = include_str!("email_template.html");

/// Produces a notification body from a [ReportContext].
pub trait Renderer {
    fn render(&self, context: &ReportContext) -> String;
}

/// Replaces `{{name}}` placeholders in an HTML template. Values are inserted as is, escaping is
/// the responsibility of whoever builds the context.
pub struct TemplateRenderer {
    template: String,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl TemplateRenderer {
    pub fn new(template: String) -> Self {
        Self { template }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let template = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {path:?}"))?;
        Ok(Self::new(template))
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, context: &ReportContext) -> String {
        context
            .placeholders()
            .into_iter()
            .fold(self.template.clone(), |body, (key, value)| {
                body.replace(&format!("{{{{{key}}}}}"), value)
            })
    }
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
