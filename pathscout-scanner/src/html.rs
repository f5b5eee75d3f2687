//! Separates inline script bodies from `src`-referenced scripts in HTML.

use scraper::{ElementRef, Html};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Script `type` values treated as JavaScript.
pub const JAVASCRIPT_CONTENT_TYPES: [&str; 8] = [
    "text/javascript",
    "text/javascript+module",
    "application/x-javascript",
    "application/javascript",
    "application/javascript+module",
    "text/ecmascript",
    "application/ecmascript",
    "text/jscript",
];

/// What to do with the scripts of a document, called in document order.
pub trait ScriptHandler {
    /// A `<script src=...>` tag. `src` is the raw attribute value.
    fn on_script_source(&mut self, src: &str);

    /// The body of an inline JavaScript `<script>` tag.
    fn on_script_content(&mut self, content: &str);
}

/// Script references and inline bodies of one HTML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlScriptParseResult {
    pub script_sources: HashSet<String>,
    /// Inline bodies in document order.
    pub script_contents: Vec<String>,
}

impl ScriptHandler for HtmlScriptParseResult {
    fn on_script_source(&mut self, src: &str) {
        self.script_sources.insert(src.to_string());
    }

    fn on_script_content(&mut self, content: &str) {
        self.script_contents.push(content.to_string());
    }
}

/// Whether a script `type` attribute denotes JavaScript. A missing or empty
/// attribute does; parameters after `;` are ignored.
pub fn is_javascript_type(type_attribute: Option<&str>) -> bool {
    let Some(type_attribute) = type_attribute.filter(|value| !value.trim().is_empty()) else {
        return true;
    };
    let mime = type_attribute
        .split(';')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    JAVASCRIPT_CONTENT_TYPES.contains(&mime.trim_end())
}

/// Feed every script tag of `html` to `handler`.
///
/// Tags with a non-empty `src` are reported as sources and their bodies are
/// ignored. Other tags are reported as content when their `type` denotes
/// JavaScript and their body is not empty.
pub fn extract_scripts<H: ScriptHandler + ?Sized>(html: &str, handler: &mut H) {
    let document = Html::parse_document(html);

    if !document.errors.is_empty() {
        warn!("HTML parser reported {} problems", document.errors.len());
        for error in &document.errors {
            debug!("HTML parse problem: {}", error);
        }
    }

    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if element.value().name() != "script" {
            continue;
        }

        if let Some(src) = element.value().attr("src")
            && !src.is_empty()
        {
            handler.on_script_source(src);
            continue;
        }

        if !is_javascript_type(element.value().attr("type")) {
            continue;
        }

        let content: String = element.text().collect();
        if !content.is_empty() {
            handler.on_script_content(&content);
        }
    }
}

/// Collect the scripts of `html` without resolving anything.
pub fn html_content_to_parse_result(html: &str) -> HtmlScriptParseResult {
    let mut result = HtmlScriptParseResult::default();
    extract_scripts(html, &mut result);
    result
}
