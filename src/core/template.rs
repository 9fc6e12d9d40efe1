/// Template AST and parser.
///
/// Grammar:
/// - `{{name}}` → `Variable`, where `name` matches `[a-zA-Z][a-zA-Z0-9_]*`
/// - `{{#if expr}} .. {{else}} .. {{/if}}` → `Conditional` (nestable)
/// - `[[options]] [[option title=".." condition=".."]] .. [[/option]] .. [[/options]]`
///   → `OptionGroup`
/// - Everything else → `Literal`, whitespace preserved verbatim

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unterminated tag: '{{{{' without a closing '}}}}'")]
    UnterminatedVariable,
    #[error("conditional block is never closed with '{{{{/if}}}}'")]
    UnclosedConditional,
    #[error("'{{{{else}}}}' outside of an open conditional block")]
    UnexpectedElse,
    #[error("'{{{{/if}}}}' without a matching '{{{{#if}}}}'")]
    UnmatchedEndIf,
    #[error("invalid option tag: {reason}")]
    InvalidOptionTag { reason: String },
    #[error("option tags are not properly opened and closed")]
    UnclosedOptionGroup,
}

/// A structural error in a template, with a 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template parse error at line {line}, column {column}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub kind: ParseErrorKind,
}

/// A node of a parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Literal text, emitted as-is.
    Literal(String),
    /// Reference to a catalog variable: `{{name}}`.
    Variable(String),
    /// `{{#if expr}}`; `expr` is kept verbatim for the condition evaluator.
    Conditional {
        expr: String,
        then_branch: Vec<Node>,
        else_branch: Option<Vec<Node>>,
    },
    /// `[[options]]` block; `index` is the group's document-order position.
    OptionGroup {
        index: usize,
        options: Vec<TemplateOption>,
    },
}

/// One `[[option]]` branch of an option group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateOption {
    pub title: String,
    #[serde(default)]
    pub condition: Option<String>,
    pub body: Vec<Node>,
}

/// A parsed template: an ordered sequence of nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub nodes: Vec<Node>,
}

impl Template {
    /// Parse a raw template string.
    ///
    /// Parsing is purely structural: no variable or condition is evaluated.
    pub fn parse(input: &str) -> Result<Template, ParseError> {
        Parser::new(input).run()
    }

    /// Visit every node in document order, descending into all branches.
    pub fn for_each_node<F: FnMut(&Node)>(&self, mut f: F) {
        visit_nodes(&self.nodes, &mut f);
    }

    /// Distinct variable names referenced anywhere in the template, in
    /// order of first appearance.
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        collect_variable_names(&self.nodes, &mut names);
        names
    }

    /// True when the template contains no directives at all.
    pub fn is_static(&self) -> bool {
        self.nodes.iter().all(|n| matches!(n, Node::Literal(_)))
    }
}

fn visit_nodes<F: FnMut(&Node)>(nodes: &[Node], f: &mut F) {
    for node in nodes {
        f(node);
        match node {
            Node::Literal(_) | Node::Variable(_) => {}
            Node::Conditional {
                then_branch,
                else_branch,
                ..
            } => {
                visit_nodes(then_branch, f);
                if let Some(else_branch) = else_branch {
                    visit_nodes(else_branch, f);
                }
            }
            Node::OptionGroup { options, .. } => {
                for option in options {
                    visit_nodes(&option.body, f);
                }
            }
        }
    }
}

fn collect_variable_names<'a>(nodes: &'a [Node], names: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Literal(_) => {}
            Node::Variable(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Node::Conditional {
                then_branch,
                else_branch,
                ..
            } => {
                collect_variable_names(then_branch, names);
                if let Some(else_branch) = else_branch {
                    collect_variable_names(else_branch, names);
                }
            }
            Node::OptionGroup { options, .. } => {
                for option in options {
                    collect_variable_names(&option.body, names);
                }
            }
        }
    }
}

/// Whether `s` is a valid variable identifier: `[a-zA-Z][a-zA-Z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// An open block awaiting its closing tag.
enum Block {
    Conditional {
        expr: String,
        /// Set once `{{else}}` is seen; the frame's nodes then fill the else branch.
        then_branch: Option<Vec<Node>>,
    },
    Options {
        index: usize,
        options: Vec<TemplateOption>,
    },
    OptionBody {
        title: String,
        condition: Option<String>,
    },
}

struct Frame {
    block: Block,
    nodes: Vec<Node>,
    /// Byte offset of the opening tag.
    opened_at: usize,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    root: Vec<Node>,
    stack: Vec<Frame>,
    literal: String,
    literal_start: usize,
    next_group: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            root: Vec::new(),
            stack: Vec::new(),
            literal: String::new(),
            literal_start: 0,
            next_group: 0,
        }
    }

    fn run(mut self) -> Result<Template, ParseError> {
        let input = self.input;
        while self.pos < input.len() {
            let rest = &input[self.pos..];
            let next_tag = match (rest.find("{{"), rest.find("[[")) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };

            match next_tag {
                None => {
                    self.push_literal(rest);
                    self.pos = input.len();
                }
                Some(offset) => {
                    self.push_literal(&rest[..offset]);
                    self.pos += offset;
                    if input[self.pos..].starts_with("{{") {
                        self.brace_tag()?;
                    } else {
                        self.bracket_tag()?;
                    }
                }
            }
        }

        if let Some(frame) = self.stack.last() {
            let kind = match frame.block {
                Block::Conditional { .. } => ParseErrorKind::UnclosedConditional,
                Block::Options { .. } | Block::OptionBody { .. } => {
                    ParseErrorKind::UnclosedOptionGroup
                }
            };
            return Err(self.error_at(frame.opened_at, kind));
        }

        self.flush_literal()?;
        Ok(Template { nodes: self.root })
    }

    /// Handle a `{{ ... }}` tag starting at `self.pos`.
    fn brace_tag(&mut self) -> Result<(), ParseError> {
        let input = self.input;
        let start = self.pos;
        let inner_start = start + 2;
        let close = input[inner_start..]
            .find("}}")
            .ok_or_else(|| self.error_at(start, ParseErrorKind::UnterminatedVariable))?;
        let content = input[inner_start..inner_start + close].trim();
        let end = inner_start + close + 2;

        if let Some(expr) = content.strip_prefix("#if") {
            if expr.is_empty() || expr.starts_with(char::is_whitespace) {
                self.flush_literal()?;
                self.ensure_content_allowed(start)?;
                self.stack.push(Frame {
                    block: Block::Conditional {
                        expr: expr.trim().to_string(),
                        then_branch: None,
                    },
                    nodes: Vec::new(),
                    opened_at: start,
                });
                self.pos = end;
                return Ok(());
            }
        }

        match content {
            "else" => {
                self.flush_literal()?;
                let in_then_branch = matches!(
                    self.stack.last(),
                    Some(Frame {
                        block: Block::Conditional {
                            then_branch: None,
                            ..
                        },
                        ..
                    })
                );
                if !in_then_branch {
                    return Err(self.error_at(start, ParseErrorKind::UnexpectedElse));
                }
                if let Some(Frame {
                    block: Block::Conditional { then_branch, .. },
                    nodes,
                    ..
                }) = self.stack.last_mut()
                {
                    *then_branch = Some(std::mem::take(nodes));
                }
            }
            "/if" => {
                self.flush_literal()?;
                self.close_conditional(start)?;
            }
            name if is_identifier(name) => {
                self.flush_literal()?;
                self.ensure_content_allowed(start)?;
                self.current_nodes().push(Node::Variable(name.to_string()));
            }
            _ => {
                // Not a directive: keep the delimiter as text and rescan after it.
                self.push_literal("{{");
                self.pos = inner_start;
                return Ok(());
            }
        }

        self.pos = end;
        Ok(())
    }

    fn close_conditional(&mut self, at: usize) -> Result<(), ParseError> {
        match self.stack.pop() {
            Some(Frame {
                block: Block::Conditional { expr, then_branch },
                nodes,
                ..
            }) => {
                let node = match then_branch {
                    Some(then_branch) => Node::Conditional {
                        expr,
                        then_branch,
                        else_branch: Some(nodes),
                    },
                    None => Node::Conditional {
                        expr,
                        then_branch: nodes,
                        else_branch: None,
                    },
                };
                self.current_nodes().push(node);
                Ok(())
            }
            Some(frame) => {
                let has_open_conditional = self
                    .stack
                    .iter()
                    .any(|f| matches!(f.block, Block::Conditional { .. }));
                if has_open_conditional {
                    Err(self.error_at(frame.opened_at, ParseErrorKind::UnclosedOptionGroup))
                } else {
                    Err(self.error_at(at, ParseErrorKind::UnmatchedEndIf))
                }
            }
            None => Err(self.error_at(at, ParseErrorKind::UnmatchedEndIf)),
        }
    }

    /// Handle a `[[ ... ]]` tag starting at `self.pos`.
    fn bracket_tag(&mut self) -> Result<(), ParseError> {
        let input = self.input;
        let start = self.pos;
        let inner_start = start + 2;
        let rest = &input[inner_start..];

        let close = match rest.find("]]") {
            Some(close) => close,
            None => {
                let head = rest.trim_start();
                let looks_like_option = head.starts_with("options")
                    || head.starts_with("/option")
                    || head
                        .strip_prefix("option")
                        .is_some_and(|attrs| attrs.starts_with(char::is_whitespace));
                if looks_like_option {
                    return Err(self.error_at(
                        start,
                        ParseErrorKind::InvalidOptionTag {
                            reason: "tag is missing its closing ']]'".to_string(),
                        },
                    ));
                }
                self.push_literal("[[");
                self.pos = inner_start;
                return Ok(());
            }
        };
        let content = rest[..close].trim();
        let end = inner_start + close + 2;

        match content {
            "options" => {
                self.flush_literal()?;
                self.ensure_content_allowed(start)?;
                let index = self.next_group;
                self.next_group += 1;
                self.stack.push(Frame {
                    block: Block::Options {
                        index,
                        options: Vec::new(),
                    },
                    nodes: Vec::new(),
                    opened_at: start,
                });
            }
            "/options" => {
                self.flush_literal()?;
                self.close_options(start)?;
            }
            "/option" => {
                self.flush_literal()?;
                self.close_option(start)?;
            }
            "option" => {
                return Err(self.error_at(
                    start,
                    ParseErrorKind::InvalidOptionTag {
                        reason: "missing title attribute".to_string(),
                    },
                ));
            }
            _ => match content.strip_prefix("option") {
                Some(attrs) if attrs.starts_with(char::is_whitespace) => {
                    self.flush_literal()?;
                    self.open_option(start, attrs)?;
                }
                _ => {
                    self.push_literal("[[");
                    self.pos = inner_start;
                    return Ok(());
                }
            },
        }

        self.pos = end;
        Ok(())
    }

    fn open_option(&mut self, at: usize, attrs: &str) -> Result<(), ParseError> {
        if !matches!(
            self.stack.last(),
            Some(Frame {
                block: Block::Options { .. },
                ..
            })
        ) {
            return Err(self.error_at(
                at,
                ParseErrorKind::InvalidOptionTag {
                    reason: "option tag outside of an options group".to_string(),
                },
            ));
        }

        let (title, condition) = parse_option_attributes(attrs)
            .map_err(|reason| self.error_at(at, ParseErrorKind::InvalidOptionTag { reason }))?;

        self.stack.push(Frame {
            block: Block::OptionBody { title, condition },
            nodes: Vec::new(),
            opened_at: at,
        });
        Ok(())
    }

    fn close_option(&mut self, at: usize) -> Result<(), ParseError> {
        match self.stack.pop() {
            Some(Frame {
                block: Block::OptionBody { title, condition },
                nodes,
                ..
            }) => {
                if let Some(Frame {
                    block: Block::Options { options, .. },
                    ..
                }) = self.stack.last_mut()
                {
                    options.push(TemplateOption {
                        title,
                        condition,
                        body: nodes,
                    });
                }
                Ok(())
            }
            Some(Frame {
                block: Block::Conditional { .. },
                opened_at,
                ..
            }) => Err(self.error_at(opened_at, ParseErrorKind::UnclosedConditional)),
            _ => Err(self.error_at(at, ParseErrorKind::UnclosedOptionGroup)),
        }
    }

    fn close_options(&mut self, at: usize) -> Result<(), ParseError> {
        match self.stack.pop() {
            Some(Frame {
                block: Block::Options { index, options },
                opened_at,
                ..
            }) => {
                if options.is_empty() {
                    return Err(self.error_at(
                        opened_at,
                        ParseErrorKind::InvalidOptionTag {
                            reason: "options group contains no options".to_string(),
                        },
                    ));
                }
                self.current_nodes()
                    .push(Node::OptionGroup { index, options });
                Ok(())
            }
            Some(Frame {
                block: Block::Conditional { .. },
                opened_at,
                ..
            }) => Err(self.error_at(opened_at, ParseErrorKind::UnclosedConditional)),
            Some(Frame { opened_at, .. }) => {
                Err(self.error_at(opened_at, ParseErrorKind::UnclosedOptionGroup))
            }
            None => Err(self.error_at(at, ParseErrorKind::UnclosedOptionGroup)),
        }
    }

    fn push_literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.literal.is_empty() {
            self.literal_start = self.pos;
        }
        self.literal.push_str(text);
    }

    /// Emit the pending literal into the current block.
    ///
    /// Directly inside `[[options]]` only whitespace may separate options;
    /// it is dropped.
    fn flush_literal(&mut self) -> Result<(), ParseError> {
        if self.literal.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.literal);
        if self.in_options_group() {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(self.error_at(
                self.literal_start,
                ParseErrorKind::InvalidOptionTag {
                    reason: "text between options must be inside an option".to_string(),
                },
            ));
        }
        self.current_nodes().push(Node::Literal(text));
        Ok(())
    }

    fn ensure_content_allowed(&self, at: usize) -> Result<(), ParseError> {
        if self.in_options_group() {
            return Err(self.error_at(
                at,
                ParseErrorKind::InvalidOptionTag {
                    reason: "content between options must be inside an option".to_string(),
                },
            ));
        }
        Ok(())
    }

    fn in_options_group(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame {
                block: Block::Options { .. },
                ..
            })
        )
    }

    fn current_nodes(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.nodes,
            None => &mut self.root,
        }
    }

    fn error_at(&self, offset: usize, kind: ParseErrorKind) -> ParseError {
        let before = &self.input[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        ParseError { line, column, kind }
    }
}

/// Parse `title="..." condition="..."` from an option tag.
fn parse_option_attributes(src: &str) -> Result<(String, Option<String>), String> {
    let mut title = None;
    let mut condition = None;
    let mut rest = src.trim_start();

    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| format!("expected key=\"value\", found '{}'", rest))?;
        let key = rest[..eq].trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(format!("malformed attribute name '{}'", key));
        }

        let after = rest[eq + 1..].trim_start();
        let quoted = after
            .strip_prefix('"')
            .ok_or_else(|| format!("value of '{}' must be double-quoted", key))?;
        let close = quoted
            .find('"')
            .ok_or_else(|| format!("unterminated value for '{}'", key))?;
        let value = quoted[..close].to_string();

        let slot = match key {
            "title" => &mut title,
            "condition" => &mut condition,
            other => return Err(format!("unknown attribute '{}'", other)),
        };
        if slot.is_some() {
            return Err(format!("duplicate attribute '{}'", key));
        }
        *slot = Some(value);

        rest = &quoted[close + 1..];
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return Err("attributes must be separated by whitespace".to_string());
        }
        rest = rest.trim_start();
    }

    let title = title.ok_or_else(|| "missing title attribute".to_string())?;
    Ok((title, condition))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Node {
        Node::Literal(s.to_string())
    }

    fn var(s: &str) -> Node {
        Node::Variable(s.to_string())
    }

    fn kind_of(input: &str) -> ParseErrorKind {
        Template::parse(input).unwrap_err().kind
    }

    #[test]
    fn parse_empty() {
        assert!(Template::parse("").unwrap().nodes.is_empty());
    }

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("Hello, world.\n  Indented  ").unwrap();
        assert_eq!(t.nodes, vec![lit("Hello, world.\n  Indented  ")]);
        assert!(t.is_static());
    }

    #[test]
    fn parse_variable_ref() {
        let t = Template::parse("You see a {{color}} door.").unwrap();
        assert_eq!(t.nodes, vec![lit("You see a "), var("color"), lit(" door.")]);
        assert!(!t.is_static());
    }

    #[test]
    fn parse_variable_with_inner_whitespace() {
        let t = Template::parse("{{ monster_name }}").unwrap();
        assert_eq!(t.nodes, vec![var("monster_name")]);
    }

    #[test]
    fn non_identifier_braces_are_literal() {
        let t = Template::parse("a {{9lives}} b {{two words}}").unwrap();
        assert_eq!(t.nodes, vec![lit("a {{9lives}} b {{two words}}")]);
    }

    #[test]
    fn literal_braces_around_variable() {
        let t = Template::parse("{{ {{name}} }}").unwrap();
        assert_eq!(t.nodes, vec![lit("{{ "), var("name"), lit(" }}")]);
    }

    #[test]
    fn unterminated_variable() {
        let err = Template::parse("Hello\n  {{name").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedVariable);
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn parse_conditional_with_else() {
        let t = Template::parse("{{#if level > 5}}strong{{else}}normal{{/if}}").unwrap();
        assert_eq!(
            t.nodes,
            vec![Node::Conditional {
                expr: "level > 5".to_string(),
                then_branch: vec![lit("strong")],
                else_branch: Some(vec![lit("normal")]),
            }]
        );
    }

    #[test]
    fn parse_conditional_without_else() {
        let t = Template::parse("A{{#if torch == lit}} glow{{/if}}B").unwrap();
        assert_eq!(
            t.nodes,
            vec![
                lit("A"),
                Node::Conditional {
                    expr: "torch == lit".to_string(),
                    then_branch: vec![lit(" glow")],
                    else_branch: None,
                },
                lit("B"),
            ]
        );
    }

    #[test]
    fn parse_nested_conditionals() {
        let t = Template::parse(
            "{{#if a == 1}}{{#if b == 2}}both{{else}}only a{{/if}}{{else}}{{name}}{{/if}}",
        )
        .unwrap();
        let Node::Conditional {
            then_branch,
            else_branch,
            ..
        } = &t.nodes[0]
        else {
            panic!("expected conditional, got {:?}", t.nodes[0]);
        };
        assert!(matches!(&then_branch[0], Node::Conditional { expr, .. } if expr == "b == 2"));
        assert_eq!(else_branch.as_deref(), Some(&[var("name")][..]));
    }

    #[test]
    fn unclosed_conditional() {
        let err = Template::parse("start {{#if a == 1}} never closed").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedConditional);
        assert_eq!((err.line, err.column), (1, 7));
    }

    #[test]
    fn unexpected_else() {
        assert_eq!(kind_of("no block {{else}} here"), ParseErrorKind::UnexpectedElse);
        assert_eq!(
            kind_of("{{#if a == 1}}x{{else}}y{{else}}z{{/if}}"),
            ParseErrorKind::UnexpectedElse
        );
    }

    #[test]
    fn unmatched_end_if() {
        assert_eq!(kind_of("text {{/if}}"), ParseErrorKind::UnmatchedEndIf);
    }

    #[test]
    fn parse_option_group() {
        let t = Template::parse(
            "Before [[options]]\n  [[option title=\"Fight\"]]You draw {{weapon}}.[[/option]]\n  [[option title=\"Flee\" condition=\"speed > 3\"]]You run.[[/option]]\n[[/options]] after",
        )
        .unwrap();
        assert_eq!(t.nodes.len(), 3);
        let Node::OptionGroup { index, options } = &t.nodes[1] else {
            panic!("expected option group, got {:?}", t.nodes[1]);
        };
        assert_eq!(*index, 0);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].title, "Fight");
        assert_eq!(options[0].condition, None);
        assert_eq!(options[0].body, vec![lit("You draw "), var("weapon"), lit(".")]);
        assert_eq!(options[1].title, "Flee");
        assert_eq!(options[1].condition.as_deref(), Some("speed > 3"));
        assert_eq!(t.nodes[2], lit(" after"));
    }

    #[test]
    fn nested_option_groups_numbered_in_document_order() {
        let t = Template::parse(
            "[[options]][[option title=\"a\"]][[options]][[option title=\"inner\"]]x[[/option]][[/options]][[/option]][[/options]][[options]][[option title=\"b\"]]y[[/option]][[/options]]",
        )
        .unwrap();
        let mut indices = Vec::new();
        t.for_each_node(|node| {
            if let Node::OptionGroup { index, .. } = node {
                indices.push(*index);
            }
        });
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn option_tag_attribute_errors() {
        for bad in [
            "[[options]][[option title=unquoted]]x[[/option]][[/options]]",
            "[[options]][[option name=\"x\"]]x[[/option]][[/options]]",
            "[[options]][[option title=\"a\" title=\"b\"]]x[[/option]][[/options]]",
            "[[options]][[option title=\"open]]x[[/option]][[/options]]",
            "[[options]][[option]]x[[/option]][[/options]]",
            "[[options]][[option condition=\"a == 1\"]]x[[/option]][[/options]]",
            "[[options]][[option title=\"a\"condition=\"b\"]]x[[/option]][[/options]]",
        ] {
            assert!(
                matches!(kind_of(bad), ParseErrorKind::InvalidOptionTag { .. }),
                "expected InvalidOptionTag for {:?}",
                bad
            );
        }
    }

    #[test]
    fn option_outside_group_is_invalid() {
        assert!(matches!(
            kind_of("[[option title=\"x\"]]body[[/option]]"),
            ParseErrorKind::InvalidOptionTag { .. }
        ));
    }

    #[test]
    fn stray_content_between_options_is_invalid() {
        assert!(matches!(
            kind_of("[[options]] stray [[option title=\"x\"]]y[[/option]][[/options]]"),
            ParseErrorKind::InvalidOptionTag { .. }
        ));
        assert!(matches!(
            kind_of("[[options]]{{name}}[[option title=\"x\"]]y[[/option]][[/options]]"),
            ParseErrorKind::InvalidOptionTag { .. }
        ));
    }

    #[test]
    fn empty_option_group_is_invalid() {
        assert!(matches!(
            kind_of("[[options]]  [[/options]]"),
            ParseErrorKind::InvalidOptionTag { .. }
        ));
    }

    #[test]
    fn unclosed_option_groups() {
        assert_eq!(
            kind_of("[[options]][[option title=\"x\"]]y[[/options]]"),
            ParseErrorKind::UnclosedOptionGroup
        );
        assert_eq!(
            kind_of("[[options]][[option title=\"x\"]]y[[/option]]"),
            ParseErrorKind::UnclosedOptionGroup
        );
        assert_eq!(kind_of("text [[/options]]"), ParseErrorKind::UnclosedOptionGroup);
        assert_eq!(kind_of("text [[/option]]"), ParseErrorKind::UnclosedOptionGroup);
    }

    #[test]
    fn interleaved_blocks_rejected() {
        assert_eq!(
            kind_of("{{#if a == 1}}[[options]][[option title=\"x\"]]y{{/if}}[[/option]][[/options]]"),
            ParseErrorKind::UnclosedOptionGroup
        );
        assert_eq!(
            kind_of("[[options]][[option title=\"x\"]]{{#if a == 1}}y[[/option]][[/options]]{{/if}}"),
            ParseErrorKind::UnclosedConditional
        );
    }

    #[test]
    fn unrecognized_brackets_are_literal() {
        let t = Template::parse("[[note]] keep [[ this").unwrap();
        assert_eq!(t.nodes, vec![lit("[[note]] keep [[ this")]);
    }

    #[test]
    fn variable_names_in_order() {
        let t = Template::parse(
            "{{a}} {{#if x == 1}}{{b}}{{else}}{{a}}{{/if}}[[options]][[option title=\"t\"]]{{c}}[[/option]][[/options]]",
        )
        .unwrap();
        assert_eq!(t.variable_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn identifier_rules() {
        assert!(is_identifier("color"));
        assert!(is_identifier("player_level2"));
        assert!(!is_identifier("_hidden"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("with space"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn parse_is_deterministic() {
        let src = "{{#if a == 1}}{{x}}{{/if}}[[options]][[option title=\"o\"]]{{y}}[[/option]][[/options]]";
        assert_eq!(Template::parse(src).unwrap(), Template::parse(src).unwrap());
    }

    #[test]
    fn ron_round_trip() {
        let t = Template::parse("{{#if a == 1}}{{x}}{{else}}z{{/if}}").unwrap();
        let serialized = ron::to_string(&t).unwrap();
        let deserialized: Template = ron::from_str(&serialized).unwrap();
        assert_eq!(deserialized, t);
    }
}
