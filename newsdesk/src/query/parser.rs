//! Validator for the boolean query mini-language.
//!
//! Performs a lexical scan (operators, quoted phrases, wildcard terms,
//! `NEAR(...)` calls) followed by a structural pass. Pure function over the
//! input string; no network or state side effects.

use strum::Display;
use thiserror::Error;

/// A structural error in a query. Recoverable by caller correction, never
/// auto-retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at position {position}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Byte offset into the query string.
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SyntaxErrorKind {
    EmptyQuery,
    UnbalancedParens,
    UnterminatedPhrase,
    MisplacedOperator,
    NearArgCount,
    NearBadTerm,
    NearBadDistance,
    NearBadOrderFlag,
}

/// Non-fatal advisories. The query is still executable; the backend's own
/// precedence rules are simply not guaranteed to match user intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Top-level `AND` and `OR` mixed without an enclosing group.
    AmbiguousPrecedence { position: usize },
}

/// Outcome of validating one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<SyntaxError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen { pos: usize },
    RParen { pos: usize },
    And { pos: usize },
    Or { pos: usize },
    Not { pos: usize },
    /// Quoted exact phrase or bare term (wildcards included).
    Operand { pos: usize },
    /// A full `NEAR(...)` call, argument checks already applied during lexing.
    Near { pos: usize },
}

impl Token {
    fn pos(&self) -> usize {
        match self {
            Token::LParen { pos }
            | Token::RParen { pos }
            | Token::And { pos }
            | Token::Or { pos }
            | Token::Not { pos }
            | Token::Operand { pos }
            | Token::Near { pos } => *pos,
        }
    }
}

/// Validates a query against the boolean mini-language.
pub fn validate(query: &str) -> ValidationResult {
    let mut result = ValidationResult::default();

    if query.trim().is_empty() {
        result.errors.push(SyntaxError {
            kind: SyntaxErrorKind::EmptyQuery,
            position: 0,
        });
        return result;
    }

    let tokens = lex(query, &mut result.errors);
    check_parens(&tokens, &mut result.errors);
    check_operator_placement(&tokens, &mut result.errors);
    check_precedence(&tokens, &mut result.warnings);

    result
}

fn lex(query: &str, errors: &mut Vec<SyntaxError>) -> Vec<Token> {
    let bytes = query.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            c if c.is_whitespace() => i += 1,
            // Bare commas separate terms, same as whitespace. NEAR argument
            // commas never reach here; scan_near_call consumes them.
            ',' => i += 1,
            '(' => {
                tokens.push(Token::LParen { pos: i });
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen { pos: i });
                i += 1;
            }
            '"' => match scan_phrase(bytes, i) {
                Some(end) => {
                    tokens.push(Token::Operand { pos: i });
                    i = end;
                }
                None => {
                    errors.push(SyntaxError {
                        kind: SyntaxErrorKind::UnterminatedPhrase,
                        position: i,
                    });
                    return tokens;
                }
            },
            _ => {
                let start = i;
                while i < bytes.len() && !is_boundary(bytes[i] as char) {
                    i += 1;
                }
                let word = &query[start..i];

                match word {
                    "AND" => tokens.push(Token::And { pos: start }),
                    "OR" => tokens.push(Token::Or { pos: start }),
                    "NOT" => tokens.push(Token::Not { pos: start }),
                    "NEAR" if i < bytes.len() && bytes[i] == b'(' => {
                        match scan_near_call(query, start, i, errors) {
                            Some(end) => {
                                tokens.push(Token::Near { pos: start });
                                i = end;
                            }
                            None => return tokens,
                        }
                    }
                    _ => tokens.push(Token::Operand { pos: start }),
                }
            }
        }
    }

    tokens
}

fn is_boundary(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')' || c == '"' || c == ','
}

/// Scans a quoted phrase starting at the opening quote. Backslash-escaped
/// quotes do not terminate the phrase. Returns the index one past the closing
/// quote, or `None` when the phrase never terminates.
fn scan_phrase(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Scans and validates a `NEAR("a","b",dist[,inOrder])` call. `open` is the
/// index of the opening parenthesis. Returns the index one past the closing
/// parenthesis, or `None` on an unterminated call.
fn scan_near_call(
    query: &str,
    call_pos: usize,
    open: usize,
    errors: &mut Vec<SyntaxError>,
) -> Option<usize> {
    let bytes = query.as_bytes();
    let mut i = open + 1;
    let mut in_quote = false;
    let args_start = i;
    let mut close = None;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quote && i + 1 < bytes.len() => i += 1,
            b'"' => in_quote = !in_quote,
            b')' if !in_quote => {
                close = Some(i);
                break;
            }
            _ => {}
        }
        i += 1;
    }

    let Some(close) = close else {
        errors.push(SyntaxError {
            kind: SyntaxErrorKind::UnbalancedParens,
            position: open,
        });
        return None;
    };

    check_near_args(&query[args_start..close], call_pos, errors);
    Some(close + 1)
}

fn check_near_args(args: &str, call_pos: usize, errors: &mut Vec<SyntaxError>) {
    let parts = split_args(args);

    if !(3..=4).contains(&parts.len()) {
        errors.push(SyntaxError {
            kind: SyntaxErrorKind::NearArgCount,
            position: call_pos,
        });
        return;
    }

    for term in &parts[..2] {
        let unquoted = term
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(term);
        if unquoted.trim().is_empty() {
            errors.push(SyntaxError {
                kind: SyntaxErrorKind::NearBadTerm,
                position: call_pos,
            });
        }
    }

    match parts[2].parse::<u64>() {
        Ok(distance) if distance > 0 => {}
        _ => errors.push(SyntaxError {
            kind: SyntaxErrorKind::NearBadDistance,
            position: call_pos,
        }),
    }

    if let Some(flag) = parts.get(3) {
        if !flag.eq_ignore_ascii_case("true") && !flag.eq_ignore_ascii_case("false") {
            errors.push(SyntaxError {
                kind: SyntaxErrorKind::NearBadOrderFlag,
                position: call_pos,
            });
        }
    }
}

/// Splits NEAR arguments on top-level commas, respecting quoted terms.
fn split_args(args: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut chars = args.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quote => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' => {
                in_quote = !in_quote;
                current.push(c);
            }
            ',' if !in_quote => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    parts.push(current.trim().to_string());

    parts
}

fn check_parens(tokens: &[Token], errors: &mut Vec<SyntaxError>) {
    let mut open_stack = Vec::new();

    for token in tokens {
        match token {
            Token::LParen { pos } => open_stack.push(*pos),
            Token::RParen { pos } => {
                if open_stack.pop().is_none() {
                    errors.push(SyntaxError {
                        kind: SyntaxErrorKind::UnbalancedParens,
                        position: *pos,
                    });
                }
            }
            _ => {}
        }
    }

    if let Some(pos) = open_stack.first() {
        errors.push(SyntaxError {
            kind: SyntaxErrorKind::UnbalancedParens,
            position: *pos,
        });
    }
}

fn check_operator_placement(tokens: &[Token], errors: &mut Vec<SyntaxError>) {
    let is_operand_end = |t: &Token| {
        matches!(
            t,
            Token::Operand { .. } | Token::Near { .. } | Token::RParen { .. }
        )
    };
    let is_operand_start = |t: &Token| {
        matches!(
            t,
            Token::Operand { .. } | Token::Near { .. } | Token::LParen { .. } | Token::Not { .. }
        )
    };

    for (idx, token) in tokens.iter().enumerate() {
        match token {
            Token::And { pos } | Token::Or { pos } => {
                let left_ok = idx > 0 && is_operand_end(&tokens[idx - 1]);
                let right_ok = tokens.get(idx + 1).is_some_and(is_operand_start);
                if !left_ok || !right_ok {
                    errors.push(SyntaxError {
                        kind: SyntaxErrorKind::MisplacedOperator,
                        position: *pos,
                    });
                }
            }
            Token::Not { pos } => {
                if !tokens.get(idx + 1).is_some_and(is_operand_start) {
                    errors.push(SyntaxError {
                        kind: SyntaxErrorKind::MisplacedOperator,
                        position: *pos,
                    });
                }
            }
            _ => {}
        }
    }
}

/// Flags a top-level mix of `AND` and `OR` without grouping. Advisory only.
fn check_precedence(tokens: &[Token], warnings: &mut Vec<ValidationWarning>) {
    let mut depth: i32 = 0;
    let mut top_level_and = false;
    let mut top_level_or = false;

    for token in tokens {
        match token {
            Token::LParen { .. } => depth += 1,
            Token::RParen { .. } => depth = (depth - 1).max(0),
            Token::And { .. } if depth == 0 => {
                top_level_and = true;
                if top_level_or {
                    warnings.push(ValidationWarning::AmbiguousPrecedence {
                        position: token.pos(),
                    });
                    return;
                }
            }
            Token::Or { .. } if depth == 0 => {
                top_level_or = true;
                if top_level_and {
                    warnings.push(ValidationWarning::AmbiguousPrecedence {
                        position: token.pos(),
                    });
                    return;
                }
            }
            _ => {}
        }
    }
}
