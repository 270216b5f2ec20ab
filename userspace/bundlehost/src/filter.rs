// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! LDAP-style attribute filters used to select service registrations.
//!
//! Supported syntax:
//!
//! ```text
//! filter  := '(' body ')'
//! body    := '&' filter+ | '|' filter+ | '!' filter | key '=' value
//! value   := '*'            presence
//!          | text ('*' text)*  substring when at least one unescaped '*'
//!          | text           equality
//! ```
//!
//! Keys compare case-insensitively, values case-sensitively. A backslash
//! escapes the next character inside values. Approximate (`~=`) and ordering
//! (`>=`, `<=`) operators are rejected.

#![deny(clippy::all, missing_docs)]

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a filter string cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed filter `{filter}` at offset {offset}: {reason}")]
pub struct FilterError {
    /// Filter text as supplied by the caller.
    pub filter: String,
    /// Character offset where parsing failed.
    pub offset: usize,
    /// Short description of the failure.
    pub reason: &'static str,
}

/// Parsed attribute filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// All nested filters must match.
    And(Vec<Filter>),
    /// At least one nested filter must match.
    Or(Vec<Filter>),
    /// The nested filter must not match.
    Not(Box<Filter>),
    /// Some value of `key` equals `value`.
    Equal {
        /// Attribute name.
        key: String,
        /// Expected value.
        value: String,
    },
    /// `key` carries at least one value.
    Present {
        /// Attribute name.
        key: String,
    },
    /// Some value of `key` matches the `*`-separated pieces in order.
    ///
    /// The first piece anchors the start and the last piece anchors the end;
    /// either may be empty.
    Substring {
        /// Attribute name.
        key: String,
        /// Literal pieces between wildcards.
        pieces: Vec<String>,
    },
}

/// Source of attribute values a [`Filter`] is evaluated against.
pub trait Attributes {
    /// Returns every value stored under `key`, looked up case-insensitively.
    fn values(&self, key: &str) -> Vec<&str>;
}

impl Attributes for BTreeMap<String, String> {
    fn values(&self, key: &str) -> Vec<&str> {
        self.iter()
            .filter(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

impl Filter {
    /// Parses `input` into a filter.
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let mut parser = Parser { input, chars: input.chars().collect(), pos: 0 };
        parser.skip_ws();
        let filter = parser.filter()?;
        parser.skip_ws();
        if parser.pos != parser.chars.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(filter)
    }

    /// Evaluates the filter against `attributes`.
    pub fn matches<A: Attributes + ?Sized>(&self, attributes: &A) -> bool {
        match self {
            Filter::And(children) => children.iter().all(|child| child.matches(attributes)),
            Filter::Or(children) => children.iter().any(|child| child.matches(attributes)),
            Filter::Not(child) => !child.matches(attributes),
            Filter::Equal { key, value } => {
                attributes.values(key).into_iter().any(|candidate| candidate == value)
            }
            Filter::Present { key } => !attributes.values(key).is_empty(),
            Filter::Substring { key, pieces } => {
                attributes.values(key).into_iter().any(|candidate| substring_match(candidate, pieces))
            }
        }
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::And(children) => {
                f.write_str("(&")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
            Filter::Or(children) => {
                f.write_str("(|")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
            Filter::Not(child) => write!(f, "(!{child})"),
            Filter::Equal { key, value } => write!(f, "({key}={})", escape(value)),
            Filter::Present { key } => write!(f, "({key}=*)"),
            Filter::Substring { key, pieces } => {
                let rendered: Vec<String> = pieces.iter().map(|piece| escape(piece)).collect();
                write!(f, "({key}={})", rendered.join("*"))
            }
        }
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '(' | ')' | '*' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn substring_match(candidate: &str, pieces: &[String]) -> bool {
    let (first, rest) = match pieces.split_first() {
        Some(split) => split,
        None => return false,
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return candidate == first,
    };
    if !candidate.starts_with(first.as_str()) {
        return false;
    }
    let mut pos = first.len();
    for piece in middle {
        match candidate[pos..].find(piece.as_str()) {
            Some(found) => pos += found + piece.len(),
            None => return false,
        }
    }
    candidate.len() >= pos + last.len() && candidate.ends_with(last.as_str())
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &'static str) -> FilterError {
        FilterError { filter: self.input.to_string(), offset: self.pos, reason }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, want: char, reason: &'static str) -> Result<(), FilterError> {
        if self.peek() == Some(want) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(reason))
        }
    }

    fn filter(&mut self) -> Result<Filter, FilterError> {
        self.expect('(', "expected `(`")?;
        self.skip_ws();
        let filter = match self.peek() {
            Some('&') => {
                self.pos += 1;
                Filter::And(self.list()?)
            }
            Some('|') => {
                self.pos += 1;
                Filter::Or(self.list()?)
            }
            Some('!') => {
                self.pos += 1;
                self.skip_ws();
                Filter::Not(Box::new(self.filter()?))
            }
            Some(_) => self.item()?,
            None => return Err(self.error("unexpected end of filter")),
        };
        self.skip_ws();
        self.expect(')', "expected `)`")?;
        Ok(filter)
    }

    fn list(&mut self) -> Result<Vec<Filter>, FilterError> {
        let mut children = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() != Some('(') {
                break;
            }
            children.push(self.filter()?);
        }
        if children.is_empty() {
            return Err(self.error("operator requires at least one operand"));
        }
        Ok(children)
    }

    fn item(&mut self) -> Result<Filter, FilterError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            match ch {
                '=' => break,
                '~' | '<' | '>' => return Err(self.error("unsupported comparison operator")),
                '(' | ')' | '*' | '\\' => return Err(self.error("invalid character in attribute name")),
                _ => self.pos += 1,
            }
        }
        let key: String = self.chars[start..self.pos].iter().collect::<String>().trim().to_string();
        if key.is_empty() {
            return Err(self.error("missing attribute name"));
        }
        self.expect('=', "expected `=`")?;

        let mut pieces = vec![String::new()];
        loop {
            match self.peek() {
                Some(')') => break,
                Some('(') => return Err(self.error("unescaped `(` in value")),
                Some('*') => {
                    self.pos += 1;
                    pieces.push(String::new());
                }
                Some('\\') => {
                    self.pos += 1;
                    let escaped = self.peek().ok_or_else(|| self.error("dangling escape"))?;
                    self.pos += 1;
                    if let Some(piece) = pieces.last_mut() {
                        piece.push(escaped);
                    }
                }
                Some(ch) => {
                    self.pos += 1;
                    if let Some(piece) = pieces.last_mut() {
                        piece.push(ch);
                    }
                }
                None => return Err(self.error("unterminated value")),
            }
        }

        Ok(match pieces.len() {
            1 => Filter::Equal { key, value: pieces.remove(0) },
            2 if pieces.iter().all(String::is_empty) => Filter::Present { key },
            _ => Filter::Substring { key, pieces },
        })
    }
}
