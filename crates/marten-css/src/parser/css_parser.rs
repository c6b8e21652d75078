//! Style sheet parser.
//!
//! A small recursive-descent parser over characters. The grammar is:
//!
//! ```text
//! stylesheet  := (selector '{' declarations '}')*
//! selector    := word (whitespace word)*
//! declarations:= (word ':' value (';' | before '}'))*
//! value       := any characters up to the next ';' or '}', trimmed
//! word        := (alphanumeric | '#' | '-' | '.' | '%' | '_')+
//! ```
//!
//! Errors never escape: a bad declaration is skipped up to the next `;`, a
//! bad rule up to the next `}`.

use std::collections::HashMap;

use thiserror::Error;

use marten_common::warning::warn_once;

use crate::selector::Selector;

/// Declared properties of a rule or an inline `style` attribute.
///
/// Keys are lowercased property names; values are the raw value text.
pub type PropertyMap = HashMap<String, String>;

/// A failure inside one declaration or rule, consumed by the recovery loops.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CssParseError {
    /// A specific character was required.
    #[error("expected '{expected}' at offset {offset}, found {found:?}")]
    Expected {
        /// The required character.
        expected: char,
        /// What was there instead (`None` at end of input).
        found: Option<char>,
        /// Character offset.
        offset: usize,
    },
    /// A word was required but none was present.
    #[error("expected a word at offset {offset}")]
    ExpectedWord {
        /// Character offset.
        offset: usize,
    },
    /// A declaration had nothing after the colon.
    #[error("empty value for '{property}' at offset {offset}")]
    EmptyValue {
        /// The property being declared.
        property: String,
        /// Character offset.
        offset: usize,
    },
}

/// One style rule: a selector and the properties it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Which nodes the rule applies to.
    pub selector: Selector,
    /// Declared properties.
    pub declarations: PropertyMap,
}

/// An ordered list of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    /// Rules in source order.
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    /// Create an empty style sheet.
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append every rule of `other` after the rules already present.
    pub fn extend(&mut self, other: &Self) {
        self.rules.extend(other.rules.iter().cloned());
    }

    /// The rules in cascade order: ascending priority, source order kept
    /// among equal priorities.
    #[must_use]
    pub fn sorted_by_priority(&self) -> Vec<Rule> {
        let mut rules = self.rules.clone();
        rules.sort_by_key(|rule| rule.selector.priority());
        rules
    }

    /// Number of rules.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the sheet has no rules.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Character-level style sheet parser.
pub struct CSSParser {
    chars: Vec<char>,
    position: usize,
}

impl CSSParser {
    /// Create a parser over `input`.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            position: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    /// Skip whitespace and `/* ... */` comments.
    fn whitespace(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.position += 1;
            }
            if self.peek() == Some('/') && self.chars.get(self.position + 1) == Some(&'*') {
                self.position += 2;
                while !self.at_end() {
                    if self.peek() == Some('*') && self.chars.get(self.position + 1) == Some(&'/')
                    {
                        self.position += 2;
                        break;
                    }
                    self.position += 1;
                }
                continue;
            }
            break;
        }
    }

    fn literal(&mut self, expected: char) -> Result<(), CssParseError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.position += 1;
                Ok(())
            }
            found => Err(CssParseError::Expected {
                expected,
                found,
                offset: self.position,
            }),
        }
    }

    fn word(&mut self) -> Result<String, CssParseError> {
        let start = self.position;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '#' | '-' | '.' | '%' | '_'))
        {
            self.position += 1;
        }
        if self.position == start {
            return Err(CssParseError::ExpectedWord { offset: start });
        }
        Ok(self.chars[start..self.position].iter().collect())
    }

    /// Everything up to (not including) the next `;` or `}`, trimmed.
    fn value(&mut self) -> String {
        let start = self.position;
        while self.peek().is_some_and(|c| c != ';' && c != '}') {
            self.position += 1;
        }
        let raw: String = self.chars[start..self.position].iter().collect();
        raw.trim().to_string()
    }

    fn pair(&mut self) -> Result<(String, String), CssParseError> {
        let property = self.word()?.to_ascii_lowercase();
        self.whitespace();
        self.literal(':')?;
        self.whitespace();
        let offset = self.position;
        let value = self.value();
        if value.is_empty() {
            return Err(CssParseError::EmptyValue { property, offset });
        }
        Ok((property, value))
    }

    /// Advance to the first of `stops`, returning it, or `None` at end of input.
    fn ignore_until(&mut self, stops: &[char]) -> Option<char> {
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                return Some(c);
            }
            self.position += 1;
        }
        None
    }

    /// Parse declarations until `}` or end of input.
    ///
    /// Used both for rule bodies and for inline `style` attributes. Later
    /// declarations of the same property win.
    pub fn parse_declarations(&mut self) -> PropertyMap {
        let mut declarations = PropertyMap::new();
        self.whitespace();
        while !self.at_end() && self.peek() != Some('}') {
            match self.pair() {
                Ok((property, value)) => {
                    let _ = declarations.insert(property, value);
                    self.whitespace();
                    if self.peek() == Some(';') {
                        self.position += 1;
                    }
                    self.whitespace();
                }
                Err(err) => {
                    warn_once("CSS", &format!("dropped declaration: {err}"));
                    if self.ignore_until(&[';', '}']) == Some(';') {
                        self.position += 1;
                        self.whitespace();
                    } else {
                        break;
                    }
                }
            }
        }
        declarations
    }

    /// Parse one selector, stopping before `{` or at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if a selector word is missing.
    pub fn parse_selector(&mut self) -> Result<Selector, CssParseError> {
        let mut chain = vec![Selector::from_word(&self.word()?)];
        self.whitespace();
        while !self.at_end() && self.peek() != Some('{') {
            chain.push(Selector::from_word(&self.word()?));
            self.whitespace();
        }
        Ok(if chain.len() == 1 {
            chain.remove(0)
        } else {
            Selector::Descendant(chain)
        })
    }

    fn rule(&mut self) -> Result<Rule, CssParseError> {
        let selector = self.parse_selector()?;
        self.literal('{')?;
        let declarations = self.parse_declarations();
        self.literal('}')?;
        Ok(Rule {
            selector,
            declarations,
        })
    }

    /// Parse a whole style sheet, dropping malformed rules.
    pub fn parse_stylesheet(&mut self) -> Stylesheet {
        let mut sheet = Stylesheet::new();
        self.whitespace();
        while !self.at_end() {
            match self.rule() {
                Ok(rule) => {
                    sheet.rules.push(rule);
                    self.whitespace();
                }
                Err(err) => {
                    warn_once("CSS", &format!("dropped rule: {err}"));
                    if self.ignore_until(&['}']).is_some() {
                        self.position += 1;
                        self.whitespace();
                    } else {
                        break;
                    }
                }
            }
        }
        sheet
    }
}

/// Parse style sheet text.
#[must_use]
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    CSSParser::new(css).parse_stylesheet()
}

/// Parse a declaration list such as an inline `style` attribute.
#[must_use]
pub fn parse_declarations(css: &str) -> PropertyMap {
    CSSParser::new(css).parse_declarations()
}

/// Parse a standalone selector such as the argument of a query.
///
/// Returns `None` if the text is not a complete selector.
#[must_use]
pub fn parse_selector(css: &str) -> Option<Selector> {
    let mut parser = CSSParser::new(css.trim());
    let selector = parser.parse_selector().ok()?;
    parser.at_end().then_some(selector)
}
