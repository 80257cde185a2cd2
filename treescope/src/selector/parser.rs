//! Recursive-descent selector parser.
//!
//! ```text
//! selector   := complex (',' complex)*
//! complex    := compound (combinator compound)*
//! combinator := '>' | whitespace
//! compound   := type? ('#' ident)? attr* pseudo*
//! attr       := '[' name '=' quoted ']'
//! pseudo     := ':text(' quoted ')' | ':display-name(' quoted ')'
//!             | ':nth-of-type(' int ')' | ':first-of-type' | ':last-of-type'
//!             | ':has-press' | ':has-scroll'
//! ```
//!
//! Single pass over character positions with one character of lookahead.
//! Error positions are character offsets into the input.

use crate::domain::SelectorError;

/// Relation between a segment and the segment before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `A > B`: the previous segment matches the immediate parent
    Child,
    /// `A B`: the previous segment matches some ancestor
    Descendant,
}

/// Which of a branch's matches to keep, counted in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nth {
    #[default]
    All,
    /// Only the final match, known after the whole walk
    Last,
    /// Zero-based occurrence
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub type_name: Option<String>,
    pub identifier: Option<String>,
    pub attrs: Vec<AttrSelector>,
    pub text: Option<String>,
    pub display_name: Option<String>,
    pub nth: Nth,
    pub has_press: bool,
    pub has_scroll: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// `None` for the first segment of a chain
    pub combinator: Option<Combinator>,
    pub compound: CompoundSelector,
}

/// A chain of compounds; the last segment is the match anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub segments: Vec<Segment>,
}

impl ComplexSelector {
    #[must_use]
    pub fn anchor(&self) -> Option<&CompoundSelector> {
        self.segments.last().map(|s| &s.compound)
    }
}

/// Comma-separated alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSet {
    pub branches: Vec<ComplexSelector>,
}

/// Parse a selector string.
///
/// # Errors
/// Returns a [`SelectorError`] describing the first offending position
pub fn parse(input: &str) -> Result<SelectorSet, SelectorError> {
    Parser::new(input).parse_set()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '$' | '.')
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self { chars: input.chars().collect(), pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Skip whitespace, returning whether any was skipped.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::UnexpectedChar { found, pos: self.pos },
            None => SelectorError::UnexpectedEnd(self.pos),
        }
    }

    fn expect(&mut self, c: char) -> Result<(), SelectorError> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn read_ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn require_ident(&mut self) -> Result<String, SelectorError> {
        let ident = self.read_ident();
        if ident.is_empty() {
            return Err(self.unexpected());
        }
        Ok(ident)
    }

    fn parse_set(&mut self) -> Result<SelectorSet, SelectorError> {
        self.skip_ws();
        if self.at_end() {
            return Err(SelectorError::Empty);
        }

        let mut branches = vec![self.parse_complex()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            self.skip_ws();
            branches.push(self.parse_complex()?);
        }
        if !self.at_end() {
            return Err(self.unexpected());
        }
        Ok(SelectorSet { branches })
    }

    /// Parses a chain and any trailing whitespace; stops before `,` or the end.
    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut segments = vec![Segment { combinator: None, compound: self.parse_compound()? }];

        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            let compound = self.parse_compound()?;
            segments.push(Segment { combinator: Some(combinator), compound });
        }

        Ok(ComplexSelector { segments })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let start = self.pos;
        let mut compound = CompoundSelector::default();

        let type_name = self.read_ident();
        if !type_name.is_empty() {
            compound.type_name = Some(type_name);
        }

        if self.peek() == Some('#') {
            self.pos += 1;
            compound.identifier = Some(self.require_ident()?);
        }

        while self.peek() == Some('[') {
            self.pos += 1;
            compound.attrs.push(self.parse_attr()?);
        }

        while self.peek() == Some(':') {
            self.pos += 1;
            self.parse_pseudo(&mut compound)?;
        }

        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrSelector, SelectorError> {
        self.skip_ws();
        let name = self.require_ident()?;
        self.skip_ws();
        self.expect('=')?;
        self.skip_ws();
        let value = match self.peek() {
            Some('"' | '\'') => self.parse_quoted()?,
            _ => self.require_ident()?,
        };
        self.skip_ws();
        self.expect(']')?;
        Ok(AttrSelector { name, value })
    }

    fn parse_pseudo(&mut self, compound: &mut CompoundSelector) -> Result<(), SelectorError> {
        let pos = self.pos;
        let name = self.read_ident();
        match name.as_str() {
            "text" => compound.text = Some(self.parse_quoted_arg()?),
            "display-name" => compound.display_name = Some(self.parse_quoted_arg()?),
            "nth-of-type" => compound.nth = Nth::Index(self.parse_index_arg()?),
            "first-of-type" => compound.nth = Nth::Index(0),
            "last-of-type" => compound.nth = Nth::Last,
            "has-press" => compound.has_press = true,
            "has-scroll" => compound.has_scroll = true,
            _ => return Err(SelectorError::UnknownPseudo { name, pos }),
        }
        Ok(())
    }

    fn parse_quoted_arg(&mut self) -> Result<String, SelectorError> {
        self.expect('(')?;
        self.skip_ws();
        let value = self.parse_quoted()?;
        self.skip_ws();
        self.expect(')')?;
        Ok(value)
    }

    /// `(N)` with a 1-based N, returned 0-based.
    fn parse_index_arg(&mut self) -> Result<usize, SelectorError> {
        self.expect('(')?;
        self.skip_ws();
        let pos = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let value: String = self.chars[pos..self.pos].iter().collect();
        let index = match value.parse::<usize>() {
            Ok(n) if n >= 1 => n - 1,
            _ => {
                let rest: String = self.chars[self.pos..]
                    .iter()
                    .take_while(|c| **c != ')' && !c.is_whitespace())
                    .collect();
                return Err(SelectorError::InvalidIndex { value: value + &rest, pos });
            }
        };
        self.skip_ws();
        self.expect(')')?;
        Ok(index)
    }

    fn parse_quoted(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.unexpected()),
        };
        self.pos += 1;

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(SelectorError::UnterminatedString(start)),
                Some('\\') => {
                    self.pos += 1;
                    let escaped =
                        self.peek().ok_or(SelectorError::UnterminatedString(start))?;
                    value.push(escaped);
                    self.pos += 1;
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
    }
}
