//! Notification email templates.
//!
//! Templates use `{{Name}}` placeholders. Every placeholder must name a known
//! variable; values substituted into HTML bodies are escaped.

use std::collections::BTreeMap;
use std::path::Path;

use super::email::EmailError;

const DEFAULT_SUBJECT: &str = "{{SenderName}} sent you an eCard";

const DEFAULT_TEXT: &str = "Hi {{RecipientName}},

{{SenderName}} ({{SenderEmail}}) sent you an eCard:

{{CardMessage}}

Open your card here:
{{ViewUrl}}

The {{AppName}} Team";

const DEFAULT_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{AppName}}</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: linear-gradient(135deg, #f6a04d 0%, #e2557b 100%); padding: 30px; border-radius: 10px 10px 0 0;">
        <h1 style="color: white; margin: 0; font-size: 24px;">{{AppName}}</h1>
    </div>
    <div style="background: #fafafa; padding: 30px; border-radius: 0 0 10px 10px;">
        <p>Hi {{RecipientName}},</p>
        <p><strong>{{SenderName}}</strong> ({{SenderEmail}}) sent you an eCard:</p>
        <blockquote style="border-left: 4px solid #e2557b; margin: 20px 0; padding-left: 16px; white-space: pre-wrap;">{{CardMessage}}</blockquote>
        <div style="text-align: center; margin: 30px 0;">
            <a href="{{ViewUrl}}" style="background: #e2557b; color: white; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: bold; display: inline-block;">Open your card</a>
        </div>
        <p style="color: #999; font-size: 12px;">Or copy and paste this link into your browser:<br><a href="{{ViewUrl}}" style="color: #e2557b;">{{ViewUrl}}</a></p>
    </div>
</body>
</html>"#;

/// Subject, HTML and plain-text templates of one notification.
#[derive(Debug, Clone)]
pub struct EmailTemplates {
    subject: String,
    html: String,
    text: String,
}

impl Default for EmailTemplates {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            html: DEFAULT_HTML.to_string(),
            text: DEFAULT_TEXT.to_string(),
        }
    }
}

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
}

impl EmailTemplates {
    /// Loads `{key}.subject.hbs`, `{key}.html.hbs` and `{key}.text.hbs` from
    /// `dir`. Missing files keep the built-in template.
    pub async fn load(dir: &Path, key: &str) -> Result<Self, EmailError> {
        let mut templates = Self::default();

        for (part, slot) in [
            ("subject", &mut templates.subject),
            ("html", &mut templates.html),
            ("text", &mut templates.text),
        ] {
            let path = dir.join(format!("{}.{}.hbs", key, part));
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    tracing::info!(path = %path.display(), "Loaded email template");
                    *slot = content;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "Using built-in email template");
                }
                Err(e) => {
                    return Err(EmailError::TemplateError(format!(
                        "Failed to read {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        Ok(templates)
    }

    pub fn render(&self, vars: &BTreeMap<&'static str, String>) -> Result<RenderedEmail, EmailError> {
        Ok(RenderedEmail {
            // Subjects are single-line headers
            subject: render(&self.subject, vars, false)?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            body_html: render(&self.html, vars, true)?,
            body_text: render(&self.text, vars, false)?,
        })
    }
}

/// Substitutes `{{Name}}` placeholders.
pub fn render(
    template: &str,
    vars: &BTreeMap<&'static str, String>,
    escape: bool,
) -> Result<String, EmailError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| EmailError::TemplateError("Unclosed placeholder".to_string()))?;

        let name = after[..end].trim();
        let value = vars
            .get(name)
            .ok_or_else(|| EmailError::TemplateError(format!("Unknown variable '{}'", name)))?;

        if escape {
            output.push_str(&escape_html(value));
        } else {
            output.push_str(value);
        }
        rest = &after[end + 2..];
    }
    output.push_str(rest);

    Ok(output)
}

/// Escapes text for inclusion in HTML element content or attribute values.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
