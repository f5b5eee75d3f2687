//! Context-tracking traversal: walks a parsed script and reports every
//! endpoint-looking literal together with its nearest reportable ancestor.

use crate::classify::is_endpoint_literal;
use crate::comments::scan_comments;
use crate::error::{Result, ScanError};
use crate::result::EndpointCandidateMatch;
use crate::syntax::{ContextKind, JsParser, SyntaxNode};
use std::ops::Range;
use tree_sitter::Node;

/// Terminal escape that starts highlighting the matched literal.
pub const HIGHLIGHT_START: &str = "\x1b[31m";
/// Terminal escape that resets highlighting.
pub const HIGHLIGHT_END: &str = "\x1b[0m";

/// Per-source analysis switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Wrap the literal inside `context` in terminal highlight markers.
    pub color_context: bool,
    /// Also mine source comments for endpoints.
    pub scan_comments: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            color_context: false,
            scan_comments: true,
        }
    }
}

/// Find endpoint candidates in the contents of a script.
pub fn find_endpoint_candidates(
    content: &str,
    options: &ScanOptions,
) -> Result<Vec<EndpointCandidateMatch>> {
    let mut parser = JsParser::new()?;
    find_endpoint_candidates_with(&mut parser, content, options)
}

/// Same as [`find_endpoint_candidates`], reusing an existing parser.
pub fn find_endpoint_candidates_with(
    parser: &mut JsParser,
    content: &str,
    options: &ScanOptions,
) -> Result<Vec<EndpointCandidateMatch>> {
    let tree = parser.parse(content)?;
    let mut matches = collect_matches(content, tree.statements(), options.color_context)?;

    if options.scan_comments {
        matches.extend(scan_comments(parser, content, &tree, options.color_context)?);
    }

    Ok(matches)
}

/// Traverse `statements` depth-first, left to right, and report each
/// classified literal. Offsets are taken relative to `source`.
pub fn collect_matches<'t>(
    source: &str,
    statements: Vec<SyntaxNode<'t>>,
    color_context: bool,
) -> Result<Vec<EndpointCandidateMatch>> {
    let mut traversal = ContextTraversal::new(source, color_context);
    for statement in statements {
        traversal.visit(statement)?;
    }
    Ok(traversal.matches)
}

#[derive(Clone, Copy)]
struct ContextFrame<'t> {
    kind: ContextKind,
    node: Node<'t>,
}

enum Step<'t> {
    Visit(SyntaxNode<'t>),
    Leave,
}

struct ContextTraversal<'s, 't> {
    source: &'s str,
    highlight: (&'static str, &'static str),
    stack: Vec<ContextFrame<'t>>,
    matches: Vec<EndpointCandidateMatch>,
}

impl<'s, 't> ContextTraversal<'s, 't> {
    fn new(source: &'s str, color_context: bool) -> Self {
        let highlight = if color_context {
            (HIGHLIGHT_START, HIGHLIGHT_END)
        } else {
            ("", "")
        };
        Self {
            source,
            highlight,
            stack: Vec::new(),
            matches: Vec::new(),
        }
    }

    fn visit(&mut self, root: SyntaxNode<'t>) -> Result<()> {
        let mut work = vec![Step::Visit(root)];

        while let Some(step) = work.pop() {
            let node = match step {
                Step::Visit(node) => node,
                Step::Leave => {
                    self.stack.pop();
                    continue;
                }
            };

            if is_endpoint_literal(&node, self.source) {
                self.report(&node)?;
                continue;
            }

            if let (Some(kind), Some(inner)) = (node.context_kind(), node.node()) {
                self.stack.push(ContextFrame { kind, node: inner });
                work.push(Step::Leave);
            }

            work.extend(node.children().into_iter().rev().map(Step::Visit));
        }

        Ok(())
    }

    fn report(&mut self, literal: &SyntaxNode<'t>) -> Result<()> {
        let span = literal.span();
        let value = slice(self.source, span.clone())?;

        let Some(frame) = self.stack.last().copied() else {
            return Err(ScanError::MissingContext {
                offset: span.start,
                literal: value.to_string(),
            });
        };

        let context = reporting_span(frame, &span);
        let (highlight_start, highlight_end) = self.highlight;
        let context_text = [
            slice(self.source, context.start..span.start)?,
            highlight_start,
            value,
            highlight_end,
            slice(self.source, span.end..context.end)?,
        ]
        .concat();

        self.matches
            .push(EndpointCandidateMatch::new(value, context_text));
        Ok(())
    }
}

/// The span reported as context. An `if` statement reports only its
/// condition, as long as the literal sits inside it.
fn reporting_span(frame: ContextFrame<'_>, literal: &Range<usize>) -> Range<usize> {
    if frame.kind == ContextKind::If
        && let Some(condition) = if_condition(frame.node)
    {
        let condition_span = condition.start_byte()..condition.end_byte();
        if condition_span.start <= literal.start && literal.end <= condition_span.end {
            return condition_span;
        }
    }
    frame.node.start_byte()..frame.node.end_byte()
}

/// The test expression of an `if` statement, without its parentheses.
fn if_condition(statement: Node<'_>) -> Option<Node<'_>> {
    let condition = statement.child_by_field_name("condition")?;
    if condition.kind() != "parenthesized_expression" {
        return Some(condition);
    }
    let mut cursor = condition.walk();
    let inner = condition
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    Some(inner.unwrap_or(condition))
}

fn slice(source: &str, range: Range<usize>) -> Result<&str> {
    source
        .get(range.clone())
        .ok_or_else(|| ScanError::Other(format!("span {:?} is outside the source", range)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> ScanOptions {
        ScanOptions {
            color_context: false,
            scan_comments: false,
        }
    }

    fn values(matches: &[EndpointCandidateMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.value.as_str()).collect()
    }

    #[test]
    fn test_if_statement_reports_condition_only() {
        let matches = find_endpoint_candidates(
            r#"if (x === "/admin/secret") { doThing(); }"#,
            &plain(),
        )
        .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value, r#""/admin/secret""#);
        assert_eq!(matches[0].context, r#"x === "/admin/secret""#);
    }

    #[test]
    fn test_call_expression_is_nearest_context() {
        let matches = find_endpoint_candidates(r#"fetch("/foo/bar")"#, &plain()).unwrap();

        assert_eq!(values(&matches), vec![r#""/foo/bar""#]);
        assert_eq!(matches[0].context, r#"fetch("/foo/bar")"#);
    }

    #[test]
    fn test_variable_declarator_context() {
        let matches =
            find_endpoint_candidates(r#"var api = "/api/v1", mime = "text/html";"#, &plain())
                .unwrap();

        assert_eq!(values(&matches), vec![r#""/api/v1""#]);
        assert_eq!(matches[0].context, r#"api = "/api/v1""#);
    }

    #[test]
    fn test_object_property_context() {
        let source = r#"var routes = { login: "/auth/login", type: "application/json" };"#;
        let matches = find_endpoint_candidates(source, &plain()).unwrap();

        assert_eq!(values(&matches), vec![r#""/auth/login""#]);
        assert_eq!(matches[0].context, r#"login: "/auth/login""#);
    }

    #[test]
    fn test_color_wraps_literal_in_markers() {
        let options = ScanOptions {
            color_context: true,
            scan_comments: false,
        };
        let matches = find_endpoint_candidates(r#"x = "/a/b";"#, &options).unwrap();

        assert_eq!(
            matches[0].context,
            format!("x = {}\"/a/b\"{}", HIGHLIGHT_START, HIGHLIGHT_END)
        );
        assert_eq!(matches[0].value, r#""/a/b""#);
    }

    #[test]
    fn test_matches_follow_source_order() {
        let source = r#"
            function load() {
                return get("/first/one");
            }
            throw new Error("/second/two");
            a.b = `/third/${id}/three`;
        "#;
        let matches = find_endpoint_candidates(source, &plain()).unwrap();

        assert_eq!(
            values(&matches),
            vec![
                r#""/first/one""#,
                r#""/second/two""#,
                "`/third/${",
                "}/three`",
            ]
        );
        assert_eq!(matches[0].context, r#"get("/first/one")"#);
        assert_eq!(matches[1].context, r#"new Error("/second/two")"#);
        assert_eq!(matches[2].context, "a.b = `/third/${id}/three`");
    }

    #[test]
    fn test_literals_in_template_substitutions_are_found() {
        let matches =
            find_endpoint_candidates(r#"x = `${base("/nested/path")}`;"#, &plain()).unwrap();

        assert_eq!(values(&matches), vec![r#""/nested/path""#]);
        assert_eq!(matches[0].context, r#"base("/nested/path")"#);
    }

    #[test]
    fn test_non_endpoint_strings_are_ignored() {
        let source = r#"var a = "hello", b = "</div>", c = 'application/xml', d = /a\/b/;"#;
        let matches = find_endpoint_candidates(source, &plain()).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_missing_context_is_an_error() {
        let source = r#"switch (x) { case "/a/b": break; }"#;
        let err = find_endpoint_candidates(source, &plain()).err().unwrap();

        match err {
            ScanError::MissingContext { literal, .. } => assert_eq!(literal, r#""/a/b""#),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_source_is_syntax_error() {
        let err = find_endpoint_candidates("fetch(\"/a/b\"", &plain()).err().unwrap();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_traversal_is_repeatable() {
        let source = r#"if (a) { post("/x/y", { url: `/z/${q}` }); }"#;
        let options = ScanOptions {
            color_context: true,
            scan_comments: true,
        };

        let first = find_endpoint_candidates(source, &options).unwrap();
        let second = find_endpoint_candidates(source, &options).unwrap();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_literal_in_if_branch_without_own_context_uses_whole_statement() {
        let source = r#"if (a) for (const p of "/a/b") {}"#;
        let matches = find_endpoint_candidates(source, &plain()).unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].context, source);
    }

    #[test]
    fn test_comment_matches_follow_code_matches() {
        let source = "// fetch(\"/old/endpoint\")\nfetch(\"/new/endpoint\");";
        let matches = find_endpoint_candidates(source, &ScanOptions::default()).unwrap();

        assert_eq!(
            values(&matches),
            vec![r#""/new/endpoint""#, r#""/old/endpoint""#]
        );
    }

    #[test]
    fn test_octal_escaped_path_is_reported_verbatim() {
        let matches = find_endpoint_candidates(r#"x = "\57api\57v1";"#, &plain()).unwrap();

        assert_eq!(values(&matches), vec![r#""\57api\57v1""#]);
    }
}
