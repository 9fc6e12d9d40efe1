/// Condition evaluator: `<identifier> <operator> <literal>` over a context.
///
/// Operators: `==`, `!=`, `>`, `<`, `>=`, `<=`, `in`, `contains`.
/// Literals are bare tokens, numbers, `"quoted"` / `'quoted'` strings, or a
/// bracketed list `[a, b, c]` (only with `in`). A literal that itself holds
/// an operator must be quoted.

use std::fmt;
use thiserror::Error;

use crate::core::context::GenerationContext;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("malformed condition '{expr}': {reason}")]
    MalformedExpression { expr: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    In,
    Contains,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::In => "in",
            Self::Contains => "contains",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar { text: String, quoted: bool },
    List(Vec<String>),
}

impl Operand {
    /// Numeric value of an unquoted scalar.
    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Scalar {
                text,
                quoted: false,
            } => text.parse::<f64>().ok().filter(|n| n.is_finite()),
            Self::Scalar { quoted: true, .. } | Self::List(_) => None,
        }
    }
}

/// A parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub identifier: String,
    pub operator: Operator,
    pub operand: Operand,
}

/// Symbolic operators, longest first so `>=` wins over `>`.
const SYMBOLIC_OPERATORS: [(&str, Operator); 6] = [
    ("==", Operator::Eq),
    ("!=", Operator::Ne),
    (">=", Operator::Ge),
    ("<=", Operator::Le),
    (">", Operator::Gt),
    ("<", Operator::Lt),
];

const WORD_OPERATORS: [(&str, Operator); 2] =
    [("contains", Operator::Contains), ("in", Operator::In)];

impl Condition {
    pub fn parse(expr: &str) -> Result<Condition, EvalError> {
        let malformed = |reason: &str| EvalError::MalformedExpression {
            expr: expr.to_string(),
            reason: reason.to_string(),
        };

        let src = expr.trim();
        if src.is_empty() {
            return Err(malformed("empty expression"));
        }

        let ident_end = src
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(src.len());
        let identifier = &src[..ident_end];
        if identifier.is_empty() {
            return Err(malformed("missing identifier"));
        }

        let (operator, rest) = split_operator(src[ident_end..].trim_start())
            .ok_or_else(|| malformed("expected an operator after the identifier"))?;

        let operand_src = rest.trim();
        if operand_src.is_empty() {
            return Err(malformed("missing value after operator"));
        }
        let operand = parse_operand(operator, operand_src).map_err(|reason| malformed(&reason))?;

        Ok(Condition {
            identifier: identifier.to_string(),
            operator,
            operand,
        })
    }

    /// Evaluate against `context`. A missing identifier fails closed.
    pub fn evaluate(&self, context: &GenerationContext) -> bool {
        let Some(value) = context.get(&self.identifier) else {
            return false;
        };

        match (&self.operator, &self.operand) {
            (Operator::In, Operand::List(items)) => {
                let text = value.to_string();
                items.iter().any(|item| *item == text)
            }
            (_, Operand::List(_)) | (Operator::In, Operand::Scalar { .. }) => false,
            (Operator::Contains, Operand::Scalar { text, .. }) => {
                value.to_string().contains(text.as_str())
            }
            (Operator::Eq | Operator::Ne, Operand::Scalar { text, .. }) => {
                let equal = match (value.as_number(), self.operand.as_number()) {
                    (Some(lhs), Some(rhs)) => lhs == rhs,
                    _ => value.to_string() == *text,
                };
                equal == (self.operator == Operator::Eq)
            }
            (ordering, Operand::Scalar { .. }) => {
                match (value.as_number(), self.operand.as_number()) {
                    (Some(lhs), Some(rhs)) => match ordering {
                        Operator::Gt => lhs > rhs,
                        Operator::Lt => lhs < rhs,
                        Operator::Ge => lhs >= rhs,
                        Operator::Le => lhs <= rhs,
                        _ => false,
                    },
                    _ => false,
                }
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.identifier, self.operator)?;
        match &self.operand {
            Operand::Scalar { text, quoted: true } => write!(f, "\"{}\"", text),
            Operand::Scalar { text, .. } => f.write_str(text),
            Operand::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Evaluate `expr` against `context`.
pub fn evaluate(expr: &str, context: &GenerationContext) -> Result<bool, EvalError> {
    Ok(Condition::parse(expr)?.evaluate(context))
}

fn split_operator(src: &str) -> Option<(Operator, &str)> {
    for (token, op) in SYMBOLIC_OPERATORS {
        if let Some(rest) = src.strip_prefix(token) {
            return Some((op, rest));
        }
    }
    for (word, op) in WORD_OPERATORS {
        if let Some(rest) = src.strip_prefix(word) {
            if rest.starts_with(|c: char| c.is_whitespace() || c == '[' || c == '"' || c == '\'') {
                return Some((op, rest));
            }
        }
    }
    None
}

fn parse_operand(operator: Operator, src: &str) -> Result<Operand, String> {
    if let Some(inner) = src.strip_prefix('[') {
        let inner = inner
            .strip_suffix(']')
            .ok_or_else(|| "unterminated list".to_string())?;
        if operator != Operator::In {
            return Err(format!("a list is only valid with 'in', not '{}'", operator));
        }
        return Ok(Operand::List(split_list(inner)?));
    }
    if operator == Operator::In {
        return Err("'in' expects a bracketed list like [a, b]".to_string());
    }

    for quote in ['"', '\''] {
        if let Some(inner) = src.strip_prefix(quote) {
            let inner = inner
                .strip_suffix(quote)
                .ok_or_else(|| "unterminated quoted string".to_string())?;
            if inner.contains(quote) {
                return Err("unexpected quote inside string literal".to_string());
            }
            return Ok(Operand::Scalar {
                text: inner.to_string(),
                quoted: true,
            });
        }
    }

    if SYMBOLIC_OPERATORS.iter().any(|(token, _)| src.contains(*token))
        || src
            .split_whitespace()
            .any(|word| WORD_OPERATORS.iter().any(|(op, _)| *op == word))
    {
        return Err("more than one operator".to_string());
    }

    Ok(Operand::Scalar {
        text: src.to_string(),
        quoted: false,
    })
}

/// Split a list body on commas outside quotes. Quoted items keep their
/// commas; empty unquoted items are dropped.
fn split_list(inner: &str) -> Result<Vec<String>, String> {
    let mut items = Vec::new();
    let mut item_start = 0;
    let mut open_quote: Option<char> = None;

    for (i, c) in inner.char_indices() {
        match (open_quote, c) {
            (Some(quote), c) if c == quote => open_quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => open_quote = Some(c),
            (None, ',') => {
                items.extend(list_item(&inner[item_start..i])?);
                item_start = i + 1;
            }
            (None, _) => {}
        }
    }
    if open_quote.is_some() {
        return Err("unterminated quoted string in list".to_string());
    }
    items.extend(list_item(&inner[item_start..])?);
    Ok(items)
}

fn list_item(raw: &str) -> Result<Option<String>, String> {
    let item = raw.trim();
    if item.is_empty() {
        return Ok(None);
    }
    for quote in ['"', '\''] {
        if let Some(rest) = item.strip_prefix(quote) {
            return match rest.strip_suffix(quote) {
                Some(text) if !text.contains(quote) => Ok(Some(text.to_string())),
                _ => Err(format!("malformed quoted list item {}", item)),
            };
        }
    }
    if item.contains(['"', '\'']) {
        return Err(format!("unexpected quote in list item {}", item));
    }
    Ok(Some(item.to_string()))
}
