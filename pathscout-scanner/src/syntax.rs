//! JavaScript parsing on top of tree-sitter, and the small node model the
//! traversal works with.

use crate::classify::decode_escapes;
use crate::error::{Result, ScanError};
use std::ops::Range;
use tree_sitter::{Node, Parser, Tree};

/// Syntax constructs that may serve as the reported context of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Assignment,
    VariableDeclarator,
    Property,
    Call,
    New,
    Return,
    Throw,
    ExpressionStatement,
    If,
}

impl ContextKind {
    /// Map a tree-sitter-javascript node kind onto the reportable set.
    pub fn from_grammar_kind(kind: &str) -> Option<Self> {
        match kind {
            "assignment_expression" | "augmented_assignment_expression" => Some(Self::Assignment),
            "variable_declarator" => Some(Self::VariableDeclarator),
            "pair" | "pair_pattern" => Some(Self::Property),
            "call_expression" => Some(Self::Call),
            "new_expression" => Some(Self::New),
            "return_statement" => Some(Self::Return),
            "throw_statement" => Some(Self::Throw),
            "expression_statement" => Some(Self::ExpressionStatement),
            "if_statement" => Some(Self::If),
            _ => None,
        }
    }
}

/// The stretch of a template literal between substitutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateElement {
    /// Includes the delimiters: a leading backtick or `}` and a trailing `${`
    /// or backtick.
    pub span: Range<usize>,
    /// The raw text between the delimiters.
    pub body: Range<usize>,
}

/// A node as the traversal sees it.
#[derive(Debug, Clone)]
pub enum SyntaxNode<'t> {
    StringLiteral(Node<'t>),
    Template(Node<'t>),
    TemplateElement(TemplateElement),
    Comment(Node<'t>),
    Branch(Node<'t>),
}

impl<'t> SyntaxNode<'t> {
    pub fn from_node(node: Node<'t>) -> Self {
        match node.kind() {
            "string" => Self::StringLiteral(node),
            "template_string" => Self::Template(node),
            "comment" | "html_comment" => Self::Comment(node),
            _ => Self::Branch(node),
        }
    }

    pub fn span(&self) -> Range<usize> {
        match self {
            Self::StringLiteral(node)
            | Self::Template(node)
            | Self::Comment(node)
            | Self::Branch(node) => node.start_byte()..node.end_byte(),
            Self::TemplateElement(element) => element.span.clone(),
        }
    }

    /// The tree-sitter node behind this variant, if there is one.
    pub fn node(&self) -> Option<Node<'t>> {
        match self {
            Self::StringLiteral(node)
            | Self::Template(node)
            | Self::Comment(node)
            | Self::Branch(node) => Some(*node),
            Self::TemplateElement(_) => None,
        }
    }

    pub fn context_kind(&self) -> Option<ContextKind> {
        match self {
            Self::Branch(node) => ContextKind::from_grammar_kind(node.kind()),
            _ => None,
        }
    }

    /// Decoded string value of a string literal or template element.
    pub fn literal_value(&self, source: &str) -> Option<String> {
        let body = match self {
            Self::StringLiteral(node) => {
                let (start, end) = (node.start_byte(), node.end_byte());
                // Quotes are one byte each.
                if end < start + 2 {
                    return None;
                }
                source.get(start + 1..end - 1)?
            }
            Self::TemplateElement(element) => source.get(element.body.clone())?,
            _ => return None,
        };
        Some(decode_escapes(body))
    }

    /// Child slots in source order. Comments and literals have none.
    pub fn children(&self) -> Vec<SyntaxNode<'t>> {
        match self {
            Self::Branch(node) => {
                let mut cursor = node.walk();
                node.named_children(&mut cursor)
                    .map(SyntaxNode::from_node)
                    .collect()
            }
            Self::Template(node) => template_slots(*node),
            _ => Vec::new(),
        }
    }
}

/// Template elements interleaved with the substitutions that separate them.
fn template_slots(template: Node<'_>) -> Vec<SyntaxNode<'_>> {
    let mut slots = Vec::new();
    let mut segment_start = template.start_byte();
    let mut cursor = template.walk();

    for child in template.named_children(&mut cursor) {
        if child.kind() != "template_substitution" {
            continue;
        }
        let substitution_start = child.start_byte();
        slots.push(SyntaxNode::TemplateElement(TemplateElement {
            span: segment_start..substitution_start + 2,
            body: segment_start + 1..substitution_start,
        }));
        slots.push(SyntaxNode::Branch(child));
        segment_start = child.end_byte().saturating_sub(1);
    }

    let end = template.end_byte();
    slots.push(SyntaxNode::TemplateElement(TemplateElement {
        span: segment_start..end,
        body: segment_start + 1..end - 1,
    }));
    slots
}

/// A source comment with its delimiters removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub span: Range<usize>,
    pub value: String,
}

impl Comment {
    /// Block comments yield one entry per line.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.value.lines()
    }
}

/// A parsed script.
pub struct SyntaxTree {
    tree: Tree,
}

impl SyntaxTree {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Top-level statements in source order.
    pub fn statements(&self) -> Vec<SyntaxNode<'_>> {
        SyntaxNode::Branch(self.root()).children()
    }

    /// Every comment in the tree, in source order.
    pub fn comments(&self, source: &str) -> Vec<Comment> {
        let mut comments = Vec::new();
        let mut pending = vec![self.root()];

        while let Some(node) = pending.pop() {
            if node.kind() == "comment" {
                let span = node.start_byte()..node.end_byte();
                if let Some(text) = source.get(span.clone()) {
                    comments.push(Comment {
                        span,
                        value: strip_comment_delimiters(text).to_string(),
                    });
                }
                continue;
            }
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            pending.extend(children.into_iter().rev());
        }

        comments
    }
}

fn strip_comment_delimiters(text: &str) -> &str {
    if let Some(line) = text.strip_prefix("//") {
        line
    } else if let Some(block) = text.strip_prefix("/*") {
        block.strip_suffix("*/").unwrap_or(block)
    } else {
        text
    }
}

/// Parses JavaScript with script (not module) semantics.
pub struct JsParser {
    parser: Parser,
}

impl JsParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .map_err(|e| ScanError::ParserError(format!("Failed to set language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Parse `source`, failing with [`ScanError::Syntax`] when it is not a
    /// valid script.
    pub fn parse(&mut self, source: &str) -> Result<SyntaxTree> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ScanError::ParserError("parser produced no tree".to_string()))?;

        validate_script(tree.root_node(), source)?;
        Ok(SyntaxTree { tree })
    }
}

/// Reject trees with parse errors, module-only declarations or JSX.
fn validate_script(root: Node<'_>, source: &str) -> Result<()> {
    if root.has_error() {
        return Err(syntax_error_at(first_error_node(root).unwrap_or(root), source));
    }

    let mut cursor = root.walk();
    let module_declaration = root
        .named_children(&mut cursor)
        .find(|child| matches!(child.kind(), "import_statement" | "export_statement"));
    if let Some(declaration) = module_declaration {
        let position = declaration.start_position();
        return Err(ScanError::Syntax {
            line: position.row + 1,
            column: position.column + 1,
            message: "module declarations are not allowed in a script".to_string(),
        });
    }

    if let Some(markup) = first_jsx_node(root) {
        let position = markup.start_position();
        return Err(ScanError::Syntax {
            line: position.row + 1,
            column: position.column + 1,
            message: "JSX is not allowed in a script".to_string(),
        });
    }

    Ok(())
}

fn first_jsx_node(root: Node<'_>) -> Option<Node<'_>> {
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        if matches!(
            node.kind(),
            "jsx_element" | "jsx_self_closing_element" | "jsx_fragment"
        ) {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        pending.extend(children.into_iter().rev());
    }
    None
}

fn first_error_node(root: Node<'_>) -> Option<Node<'_>> {
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        pending.extend(children.into_iter().rev());
    }
    None
}

fn syntax_error_at(node: Node<'_>, source: &str) -> ScanError {
    let position = node.start_position();
    let message = if node.is_missing() {
        format!("missing {}", node.kind())
    } else {
        let snippet: String = source
            .get(node.start_byte()..node.end_byte())
            .unwrap_or_default()
            .chars()
            .take(40)
            .collect();
        format!("unexpected {:?}", snippet)
    };
    ScanError::Syntax {
        line: position.row + 1,
        column: position.column + 1,
        message,
    }
}
