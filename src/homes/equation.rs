//! Arithmetic equations used in teleport cost permissions
//!
//! Parses equation text into an AST once, then evaluates it against named variables.
//!
//! **Supported Syntax:**
//! - Literals: `12`, `0.5`, `1e3`
//! - Variables: `distance`, `isAcrossWorlds`
//! - Operators: `+ - * / % ^`, unary `-`, comparisons `== != < > <= >=` (yield 1 or 0)
//! - Functions: `min`, `max`, `abs`, `sqrt`, `floor`, `ceil`, `round`

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::homes::ports::EquationEvaluator;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EquationError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{name} takes {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: &'static str,
        found: usize,
    },
}

/// Token types for lexical analysis
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Identifier(String),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,

    LeftParen,
    RightParen,
    Comma,

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::Identifier(s) => write!(f, "identifier '{}'", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Caret => write!(f, "^"),
            Token::Equal => write!(f, "=="),
            Token::NotEqual => write!(f, "!="),
            Token::Greater => write!(f, ">"),
            Token::Less => write!(f, "<"),
            Token::GreaterEqual => write!(f, ">="),
            Token::LessEqual => write!(f, "<="),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Power,
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
}

impl BinaryOperator {
    fn apply(self, left: f64, right: f64) -> f64 {
        let truth = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            BinaryOperator::Add => left + right,
            BinaryOperator::Subtract => left - right,
            BinaryOperator::Multiply => left * right,
            BinaryOperator::Divide => left / right,
            BinaryOperator::Remainder => left % right,
            BinaryOperator::Power => left.powf(right),
            BinaryOperator::Equal => truth(left == right),
            BinaryOperator::NotEqual => truth(left != right),
            BinaryOperator::Greater => truth(left > right),
            BinaryOperator::Less => truth(left < right),
            BinaryOperator::GreaterEqual => truth(left >= right),
            BinaryOperator::LessEqual => truth(left <= right),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        self.position += 1;
        ch
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_number(&mut self) -> Result<f64, EquationError> {
        let mut text = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() || ch == '.' {
                text.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E') && !text.is_empty() {
                text.push(ch);
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.current() {
                    text.push(sign);
                    self.advance();
                }
            } else {
                break;
            }
        }
        text.parse()
            .map_err(|_| EquationError::Syntax(format!("invalid number '{}'", text)))
    }

    /// Consume `=` after a leading character and return `paired`, or `single` otherwise.
    fn with_equals(&mut self, paired: Token, single: Option<Token>, lead: char) -> Result<Token, EquationError> {
        self.advance();
        if self.current() == Some('=') {
            self.advance();
            Ok(paired)
        } else {
            single.ok_or_else(|| {
                EquationError::Syntax(format!("expected '{}=', found single '{}'", lead, lead))
            })
        }
    }

    pub fn next_token(&mut self) -> Result<Token, EquationError> {
        self.skip_whitespace();

        let single = |tokenizer: &mut Self, token: Token| {
            tokenizer.advance();
            Ok(token)
        };

        match self.current() {
            None => Ok(Token::Eof),
            Some('+') => single(self, Token::Plus),
            Some('-') => single(self, Token::Minus),
            Some('*') => single(self, Token::Star),
            Some('/') => single(self, Token::Slash),
            Some('%') => single(self, Token::Percent),
            Some('^') => single(self, Token::Caret),
            Some('(') => single(self, Token::LeftParen),
            Some(')') => single(self, Token::RightParen),
            Some(',') => single(self, Token::Comma),
            Some('=') => self.with_equals(Token::Equal, None, '='),
            Some('!') => self.with_equals(Token::NotEqual, None, '!'),
            Some('>') => self.with_equals(Token::GreaterEqual, Some(Token::Greater), '>'),
            Some('<') => self.with_equals(Token::LessEqual, Some(Token::Less), '<'),
            Some(ch) if ch.is_ascii_digit() || ch == '.' => Ok(Token::Number(self.read_number()?)),
            Some(ch) if ch.is_alphabetic() || ch == '_' => Ok(Token::Identifier(self.read_identifier())),
            Some(ch) => Err(EquationError::Syntax(format!("unexpected character: '{}'", ch))),
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, EquationError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

static EOF: Token = Token::Eof;

/// Deepest nesting of parentheses, call arguments, signs and exponents the parser accepts.
pub const MAX_NESTING: usize = 128;

/// Longest equation, in tokens, that [`Equation::parse`] accepts.
pub const MAX_TOKENS: usize = 1024;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Run `parse` one nesting level deeper, failing instead of recursing past [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, EquationError>,
    ) -> Result<T, EquationError> {
        if self.depth >= MAX_NESTING {
            return Err(EquationError::Syntax("expression nested too deeply".to_string()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&EOF)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn expect(&mut self, expected: Token) -> Result<(), EquationError> {
        if *self.current() == expected {
            self.advance();
            Ok(())
        } else {
            Err(EquationError::Syntax(format!(
                "expected {}, found {}",
                expected,
                self.current()
            )))
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EquationError> {
        match self.current().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }

            Token::Identifier(name) => {
                self.advance();
                if *self.current() != Token::LeftParen {
                    return Ok(Expr::Variable(name));
                }
                self.advance();

                let mut args = Vec::new();
                if *self.current() != Token::RightParen {
                    loop {
                        args.push(self.nested(Self::parse_comparison)?);
                        if *self.current() == Token::Comma {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(Token::RightParen)?;
                Ok(Expr::Call { name, args })
            }

            Token::LeftParen => {
                self.advance();
                let expr = self.nested(Self::parse_comparison)?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }

            token => Err(EquationError::Syntax(format!(
                "unexpected {} in expression",
                token
            ))),
        }
    }

    /// `-x` binds looser than `^`, so `-2^2` is -4.
    fn parse_unary(&mut self) -> Result<Expr, EquationError> {
        if *self.current() == Token::Minus {
            self.advance();
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::Negate(Box::new(operand)));
        }
        if *self.current() == Token::Plus {
            self.advance();
            return self.nested(Self::parse_unary);
        }
        self.parse_power()
    }

    /// Right-associative exponentiation.
    fn parse_power(&mut self) -> Result<Expr, EquationError> {
        let base = self.parse_primary()?;
        if *self.current() == Token::Caret {
            self.advance();
            let exponent = self.nested(Self::parse_unary)?;
            return Ok(Expr::Binary {
                op: BinaryOperator::Power,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_term(&mut self) -> Result<Expr, EquationError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                Token::Percent => BinaryOperator::Remainder,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, EquationError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, EquationError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::Greater => BinaryOperator::Greater,
                Token::Less => BinaryOperator::Less,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                Token::LessEqual => BinaryOperator::LessEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    pub fn parse(&mut self) -> Result<Expr, EquationError> {
        let expr = self.parse_comparison()?;
        if *self.current() != Token::Eof {
            return Err(EquationError::Syntax(format!(
                "unexpected {} after expression",
                self.current()
            )));
        }
        Ok(expr)
    }
}

/// A parsed equation, ready to evaluate any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    root: Expr,
}

impl Equation {
    pub fn parse(text: &str) -> Result<Self, EquationError> {
        let tokens = Tokenizer::new(text).tokenize()?;
        // Long operator chains build deep trees too; keep evaluation and drop shallow.
        if tokens.len() > MAX_TOKENS {
            return Err(EquationError::Syntax(format!(
                "equation too long ({} tokens, at most {})",
                tokens.len(),
                MAX_TOKENS
            )));
        }
        let root = Parser::new(tokens).parse()?;
        Ok(Self { root })
    }

    pub fn evaluate(&self, variables: &HashMap<&str, f64>) -> Result<f64, EquationError> {
        eval(&self.root, variables)
    }
}

fn eval(expr: &Expr, variables: &HashMap<&str, f64>) -> Result<f64, EquationError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Variable(name) => variables
            .get(name.as_str())
            .copied()
            .ok_or_else(|| EquationError::UnknownVariable(name.clone())),
        Expr::Negate(inner) => Ok(-eval(inner, variables)?),
        Expr::Binary { op, left, right } => {
            Ok(op.apply(eval(left, variables)?, eval(right, variables)?))
        }
        Expr::Call { name, args } => {
            let values = args
                .iter()
                .map(|arg| eval(arg, variables))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, &values)
        }
    }
}

fn call(name: &str, args: &[f64]) -> Result<f64, EquationError> {
    let unary = |f: fn(f64) -> f64| match args {
        [x] => Ok(f(*x)),
        _ => Err(EquationError::Arity {
            name: name.to_string(),
            expected: "1",
            found: args.len(),
        }),
    };
    match name {
        "abs" => unary(f64::abs),
        "sqrt" => unary(f64::sqrt),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "round" => unary(f64::round),
        "min" | "max" => {
            if args.is_empty() {
                return Err(EquationError::Arity {
                    name: name.to_string(),
                    expected: "at least 1",
                    found: 0,
                });
            }
            let pick: fn(f64, f64) -> f64 = if name == "min" { f64::min } else { f64::max };
            Ok(args[1..].iter().fold(args[0], |acc, v| pick(acc, *v)))
        }
        _ => Err(EquationError::UnknownFunction(name.to_string())),
    }
}

/// Default evaluator: parses and evaluates with the grammar above.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinEvaluator;

impl EquationEvaluator for BuiltinEvaluator {
    fn evaluate(
        &self,
        expression: &str,
        variables: &HashMap<&str, f64>,
    ) -> Result<f64, EquationError> {
        Equation::parse(expression)?.evaluate(variables)
    }
}
