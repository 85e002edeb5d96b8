use crate::common::errors::{ClearError, EnvError};
use crate::env::{Document, NodeId};

const PANEL_STYLE: &str = "font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;\
padding:16px 20px;border-radius:8px;background:#f6f8fa;color:#24292f;\
display:flex;align-items:center;gap:12px;font-size:14px;";

const SPINNER_STYLE: &str = "width:18px;height:18px;border:3px solid #d0d7de;\
border-top-color:#0969da;border-radius:50%;animation:cachegate-spin 0.8s linear infinite;";

/// What the mount element currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum Indicator<'a> {
    Progress,
    Complete { version: &'a str },
    Error,
}

/// Markup for an indicator state
pub fn markup(indicator: &Indicator<'_>) -> String {
    match indicator {
        Indicator::Progress => format!(
            "<style>@keyframes cachegate-spin{{to{{transform:rotate(360deg)}}}}</style>\
             <div class=\"cachegate cachegate-progress\" style=\"{}\">\
             <span style=\"{}\"></span><span>Updating to the latest version…</span></div>",
            PANEL_STYLE, SPINNER_STYLE
        ),
        Indicator::Complete { version } => format!(
            "<div class=\"cachegate cachegate-complete\" style=\"{}\">\
             <span style=\"color:#1a7f37;font-weight:bold\">&#10003;</span>\
             <span>Updated to version {}</span></div>",
            PANEL_STYLE,
            escape_html(version)
        ),
        Indicator::Error => format!(
            "<div class=\"cachegate cachegate-error\" style=\"{}\">\
             <span style=\"color:#cf222e;font-weight:bold\">!</span>\
             <span>Something went wrong while updating. Please reload the page.</span></div>",
            PANEL_STYLE
        ),
    }
}

/// Write an indicator into the mount element
pub fn render(
    doc: &dyn Document,
    mount: NodeId,
    mount_id: &str,
    indicator: &Indicator<'_>,
) -> Result<(), ClearError> {
    doc.set_inner_html(mount, &markup(indicator))
        .map_err(|source: EnvError| ClearError::Render {
            mount: mount_id.to_string(),
            source,
        })
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
