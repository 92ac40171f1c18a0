//! Boolean query expressions.
//!
//! Syntax: words, the uppercase keywords `AND`, `OR` and `NOT`, and
//! parentheses. Operators bind left to right with equal precedence; grouping
//! comes only from parentheses. Two operands with nothing between them are
//! joined by an implicit `AND`. `NOT` is binary: `a NOT b` is every document
//! matching `a` but not `b`.

use crate::error::{Error, Result};
use crate::tokenizer::tokenize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BooleanQuery {
    Term(String),
    And(Box<BooleanQuery>, Box<BooleanQuery>),
    Or(Box<BooleanQuery>, Box<BooleanQuery>),
    /// Set difference: left minus right.
    Not(Box<BooleanQuery>, Box<BooleanQuery>),
}

impl BooleanQuery {
    pub fn term(term: impl Into<String>) -> Self {
        BooleanQuery::Term(term.into())
    }

    pub fn and(left: BooleanQuery, right: BooleanQuery) -> Self {
        BooleanQuery::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: BooleanQuery, right: BooleanQuery) -> Self {
        BooleanQuery::Or(Box::new(left), Box::new(right))
    }

    pub fn not(left: BooleanQuery, right: BooleanQuery) -> Self {
        BooleanQuery::Not(Box::new(left), Box::new(right))
    }

    /// Implicit conjunction of a bag of terms. `None` if `terms` is empty.
    pub fn all_of<I, S>(terms: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        terms.into_iter().map(|t| BooleanQuery::Term(t.into())).reduce(BooleanQuery::and)
    }

    pub fn parse(input: &str) -> Result<Self> {
        let tokens = lex(input);
        if tokens.is_empty() {
            return Err(Error::malformed("empty query"));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let query = parser.expr()?;
        match parser.peek() {
            None => Ok(query),
            Some(_) => Err(Error::malformed("unbalanced parentheses: unexpected ')'")),
        }
    }

    /// Leaf terms in left-to-right order.
    pub fn terms(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            BooleanQuery::Term(t) => out.push(t),
            BooleanQuery::And(l, r) | BooleanQuery::Or(l, r) | BooleanQuery::Not(l, r) => {
                l.collect_terms(out);
                r.collect_terms(out);
            }
        }
    }
}

impl fmt::Display for BooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BooleanQuery::Term(t) => f.write_str(t),
            BooleanQuery::And(l, r) => write!(f, "({l} AND {r})"),
            BooleanQuery::Or(l, r) => write!(f, "({l} OR {r})"),
            BooleanQuery::Not(l, r) => write!(f, "({l} NOT {r})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
    Not,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Op::And => "AND",
            Op::Or => "OR",
            Op::Not => "NOT",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Op(Op),
    /// One query word, already split into tokens.
    Word(Vec<String>),
}

fn lex(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in input.chars() {
        if c == '(' || c == ')' || c.is_whitespace() {
            flush_word(&mut word, &mut tokens);
            match c {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                _ => {}
            }
        } else {
            word.push(c);
        }
    }
    flush_word(&mut word, &mut tokens);
    tokens
}

fn flush_word(word: &mut String, tokens: &mut Vec<Token>) {
    if word.is_empty() {
        return;
    }
    match word.as_str() {
        "AND" => tokens.push(Token::Op(Op::And)),
        "OR" => tokens.push(Token::Op(Op::Or)),
        "NOT" => tokens.push(Token::Op(Op::Not)),
        _ => {
            let parts = tokenize(word);
            if !parts.is_empty() {
                tokens.push(Token::Word(parts));
            }
        }
    }
    word.clear();
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<BooleanQuery> {
        let mut left = self.operand()?;
        loop {
            match self.peek() {
                None | Some(Token::Close) => return Ok(left),
                Some(Token::Op(op)) => {
                    let op = *op;
                    self.pos += 1;
                    if matches!(self.peek(), None | Some(Token::Close) | Some(Token::Op(_))) {
                        return Err(Error::malformed(format!("{op} is missing a right operand")));
                    }
                    let right = self.operand()?;
                    left = match op {
                        Op::And => BooleanQuery::and(left, right),
                        Op::Or => BooleanQuery::or(left, right),
                        Op::Not => BooleanQuery::not(left, right),
                    };
                }
                Some(Token::Open) | Some(Token::Word(_)) => {
                    let right = self.operand()?;
                    left = BooleanQuery::and(left, right);
                }
            }
        }
    }

    fn operand(&mut self) -> Result<BooleanQuery> {
        match self.next() {
            Some(Token::Open) => {
                if matches!(self.peek(), Some(Token::Close)) {
                    return Err(Error::malformed("empty parentheses"));
                }
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(Error::malformed("unbalanced parentheses: missing ')'")),
                }
            }
            Some(Token::Word(parts)) => {
                BooleanQuery::all_of(parts).ok_or_else(|| Error::malformed("empty term"))
            }
            Some(Token::Op(op)) => Err(Error::malformed(format!("{op} is missing a left operand"))),
            Some(Token::Close) => Err(Error::malformed("unbalanced parentheses: unexpected ')'")),
            None => Err(Error::malformed("expected a term")),
        }
    }
}
