//! A deliberately small expression/statement evaluator for the Python-like
//! stub dialect, used only to make this repository's own Example-gate
//! tests deterministic without a live interpreter. It understands: string,
//! integer, and list literals; identifiers; `+`; the `int()`/`str()`
//! builtins; tuple assignment; and `return`. Nothing else. Production
//! deployments evaluate Examples with a real interpreter via their own
//! `TargetIntrospector`.

use std::collections::BTreeMap;

use crate::error::IntrospectError;
use crate::types::{Bindings, FunctionDef, LoadedArtifact, Value};

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    IntLit(i64),
    StrLit(String),
    ListLit(Vec<Expr>),
    Ident(String),
    Call(String, Vec<Expr>),
    Add(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Stmt {
    Assign(Vec<String>, Vec<Expr>),
    Return(Expr),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    IntLit(i64),
    StrLit(String),
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Plus,
    Equals,
}

fn tokenize(src: &str) -> Result<Vec<Token>, IntrospectError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Equals);
                i += 1;
            }
            '\'' | '"' => {
                let quote = c;
                let mut s = String::new();
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    s.push(chars[i]);
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(IntrospectError::EvaluationError {
                        expr: src.to_string(),
                        reason: "unterminated string literal".to_string(),
                    });
                }
                i += 1;
                tokens.push(Token::StrLit(s));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n: i64 = text.parse().map_err(|_| IntrospectError::EvaluationError {
                    expr: src.to_string(),
                    reason: format!("invalid integer literal '{text}'"),
                })?;
                tokens.push(Token::IntLit(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(text));
            }
            other => {
                return Err(IntrospectError::EvaluationError {
                    expr: src.to_string(),
                    reason: format!("unexpected character '{other}'"),
                })
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn expr_list(&mut self) -> Result<Vec<Expr>, IntrospectError> {
        let mut items = vec![self.expr()?];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.next();
            if self.peek().is_none() {
                break;
            }
            items.push(self.expr()?);
        }
        Ok(items)
    }

    fn expr(&mut self) -> Result<Expr, IntrospectError> {
        let mut left = self.atom()?;
        while matches!(self.peek(), Some(Token::Plus)) {
            self.next();
            let right = self.atom()?;
            left = Expr::Add(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn atom(&mut self) -> Result<Expr, IntrospectError> {
        match self.next().cloned() {
            Some(Token::IntLit(n)) => Ok(Expr::IntLit(n)),
            Some(Token::StrLit(s)) => Ok(Expr::StrLit(s)),
            Some(Token::LBracket) => {
                let items = if matches!(self.peek(), Some(Token::RBracket)) {
                    Vec::new()
                } else {
                    self.expr_list()?
                };
                self.expect(Token::RBracket)?;
                Ok(Expr::ListLit(items))
            }
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.next();
                    let args = if matches!(self.peek(), Some(Token::RParen)) {
                        Vec::new()
                    } else {
                        self.expr_list()?
                    };
                    self.expect(Token::RParen)?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(IntrospectError::EvaluationError {
                expr: String::new(),
                reason: format!("unexpected token {other:?}"),
            }),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), IntrospectError> {
        match self.next() {
            Some(tok) if *tok == expected => Ok(()),
            other => Err(IntrospectError::EvaluationError {
                expr: String::new(),
                reason: format!("expected {expected:?}, found {other:?}"),
            }),
        }
    }
}

fn parse_expr(src: &str) -> Result<Expr, IntrospectError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser::new(&tokens);
    parser.expr()
}

fn parse_stmt(line: &str) -> Result<Option<Stmt>, IntrospectError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    if let Some(rest) = trimmed.strip_prefix("return ") {
        return Ok(Some(Stmt::Return(parse_expr(rest)?)));
    }
    if trimmed == "return" {
        return Ok(Some(Stmt::Return(Expr::Ident("None".to_string()))));
    }

    if let Some(eq_idx) = top_level_equals(trimmed) {
        let (lhs, rhs) = trimmed.split_at(eq_idx);
        let rhs = &rhs[1..];
        let targets: Vec<String> = lhs.split(',').map(|s| s.trim().to_string()).collect();
        let values = {
            let tokens = tokenize(rhs)?;
            let mut parser = Parser::new(&tokens);
            parser.expr_list()?
        };
        return Ok(Some(Stmt::Assign(targets, values)));
    }

    Err(IntrospectError::EvaluationError {
        expr: trimmed.to_string(),
        reason: "unsupported statement form".to_string(),
    })
}

fn top_level_equals(line: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        let c = b as char;
        if let Some(q) = in_string {
            if c == q {
                in_string = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => in_string = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '=' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn eval_expr(expr: &Expr, bindings: &Bindings) -> Result<Value, IntrospectError> {
    match expr {
        Expr::IntLit(n) => Ok(Value::Int(*n)),
        Expr::StrLit(s) => Ok(Value::Str(s.clone())),
        Expr::ListLit(items) => {
            let values = items
                .iter()
                .map(|e| eval_expr(e, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(values))
        }
        Expr::Ident(name) if name == "None" => Ok(Value::None),
        Expr::Ident(name) => bindings
            .get(name)
            .cloned()
            .ok_or_else(|| IntrospectError::EvaluationError {
                expr: name.clone(),
                reason: "undefined variable".to_string(),
            }),
        Expr::Add(lhs, rhs) => {
            let l = eval_expr(lhs, bindings)?;
            let r = eval_expr(rhs, bindings)?;
            match (l, r) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                (Value::List(mut a), Value::List(b)) => {
                    a.extend(b);
                    Ok(Value::List(a))
                }
                (a, b) => Err(IntrospectError::EvaluationError {
                    expr: format!("{a} + {b}"),
                    reason: "mismatched operand types for '+'".to_string(),
                }),
            }
        }
        Expr::Call(name, args) => {
            let values = args
                .iter()
                .map(|a| eval_expr(a, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            eval_builtin(name, &values)
        }
    }
}

fn eval_builtin(name: &str, args: &[Value]) -> Result<Value, IntrospectError> {
    match (name, args) {
        ("int", [Value::Str(s)]) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| IntrospectError::EvaluationError {
                expr: format!("int({s})"),
                reason: "not a valid integer".to_string(),
            }),
        ("int", [Value::Int(n)]) => Ok(Value::Int(*n)),
        ("str", [Value::Int(n)]) => Ok(Value::Str(n.to_string())),
        ("str", [Value::Str(s)]) => Ok(Value::Str(s.clone())),
        ("str", [Value::List(items)]) => {
            Ok(Value::Str(Value::List(items.clone()).to_string()))
        }
        (other, _) => Err(IntrospectError::EvaluationError {
            expr: other.to_string(),
            reason: "unknown or unsupported builtin call".to_string(),
        }),
    }
}

fn exec_body(def: &FunctionDef, mut bindings: Bindings) -> Result<Value, IntrospectError> {
    for line in &def.body_lines {
        let Some(stmt) = parse_stmt(line)? else {
            continue;
        };
        match stmt {
            Stmt::Assign(targets, values) => {
                if targets.len() != values.len() {
                    return Err(IntrospectError::EvaluationError {
                        expr: line.clone(),
                        reason: "assignment target/value count mismatch".to_string(),
                    });
                }
                let evaluated: Vec<Value> = values
                    .iter()
                    .map(|v| eval_expr(v, &bindings))
                    .collect::<Result<_, _>>()?;
                for (target, value) in targets.into_iter().zip(evaluated) {
                    bindings.insert(target, value);
                }
            }
            Stmt::Return(expr) => return eval_expr(&expr, &bindings),
        }
    }
    Ok(Value::None)
}

/// Evaluate a doctest-style `input_source` (a single call expression, e.g.
/// `add_strs("2", "3")`) against the named function in `artifact`.
pub fn evaluate_call(
    artifact: &LoadedArtifact,
    input_source: &str,
) -> Result<Value, IntrospectError> {
    let expr = parse_expr(input_source.trim())?;
    let Expr::Call(name, arg_exprs) = expr else {
        return Err(IntrospectError::EvaluationError {
            expr: input_source.to_string(),
            reason: "input_source must be a function call".to_string(),
        });
    };

    let def = artifact
        .parsed
        .find(&name)
        .ok_or_else(|| IntrospectError::EvaluationError {
            expr: input_source.to_string(),
            reason: format!("no definition for '{name}' in artifact"),
        })?;

    let empty_bindings = BTreeMap::new();
    let args: Vec<Value> = arg_exprs
        .iter()
        .map(|e| eval_expr(e, &empty_bindings))
        .collect::<Result<_, _>>()?;

    if args.len() != def.params.len() {
        return Err(IntrospectError::EvaluationError {
            expr: input_source.to_string(),
            reason: format!(
                "'{name}' expects {} argument(s), got {}",
                def.params.len(),
                args.len()
            ),
        });
    }

    let mut bindings: Bindings = BTreeMap::new();
    for ((param_name, _), value) in def.params.iter().zip(args) {
        bindings.insert(param_name.clone(), value);
    }

    exec_body(def, bindings)
}
