//! A small CSS selector engine.
//!
//! Supports the subset the behavior layer actually uses to find its
//! elements:
//!
//! | Syntax | Example |
//! |--------|---------|
//! | type / universal | `nav`, `*` |
//! | id | `#backToTop` |
//! | class | `.timeline-item` |
//! | attribute presence | `[data-date]` |
//! | attribute equality | `a[href="#contact"]` |
//! | descendant combinator | `.hero-slideshow .slide` |
//! | selector list | `a, button` |
//!
//! Child, sibling and pseudo-class selectors are rejected at parse time so
//! a config typo fails loudly instead of silently matching nothing.
//!
//! Matching is tree-agnostic: anything implementing [`SelectorTree`] can be
//! queried. The headless [`MemoryDocument`](crate::memory::MemoryDocument)
//! is the main consumer; config validation uses [`SelectorList::parse`]
//! alone.

use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector in {0:?}")]
    Empty(String),
    #[error("unexpected {found:?} at offset {offset} in {selector:?}")]
    Unexpected {
        selector: String,
        offset: usize,
        found: char,
    },
    #[error("unterminated attribute selector in {0:?}")]
    UnterminatedAttribute(String),
}

/// Read access to a tree of elements, enough to evaluate selectors.
pub trait SelectorTree {
    type Node: Copy;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;
    fn tag(&self, node: Self::Node) -> &str;
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;
    fn has_class(&self, node: Self::Node, class: &str) -> bool;
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Vec<Compound>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        Parser {
            source: input,
            chars: input.char_indices().peekable(),
        }
        .parse_list()
    }

    /// True if `node` matches any selector in the list.
    pub fn matches<T: SelectorTree>(&self, tree: &T, node: T::Node) -> bool {
        self.selectors
            .iter()
            .any(|compounds| matches_descendant_chain(compounds, tree, node))
    }
}

fn matches_descendant_chain<T: SelectorTree>(
    compounds: &[Compound],
    tree: &T,
    node: T::Node,
) -> bool {
    let Some((subject, ancestors)) = compounds.split_last() else {
        return false;
    };
    if !subject.matches(tree, node) {
        return false;
    }

    // Nearest-ancestor matching is exact when the only combinator is
    // "descendant".
    let mut cursor = tree.parent(node);
    for compound in ancestors.iter().rev() {
        loop {
            match cursor {
                None => return false,
                Some(candidate) => {
                    cursor = tree.parent(candidate);
                    if compound.matches(tree, candidate) {
                        break;
                    }
                }
            }
        }
    }
    true
}

impl Compound {
    fn matches<T: SelectorTree>(&self, tree: &T, node: T::Node) -> bool {
        if let Some(tag) = &self.tag {
            if !tree.tag(node).eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if tree.attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| tree.has_class(node, class)) {
            return false;
        }
        self.attributes.iter().all(|attr| {
            match (tree.attribute(node, &attr.name), &attr.value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected.as_str(),
            }
        })
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl Parser<'_> {
    fn parse_list(mut self) -> Result<SelectorList, SelectorError> {
        let mut selectors = Vec::new();
        loop {
            let compounds = self.parse_complex()?;
            if compounds.is_empty() {
                return Err(SelectorError::Empty(self.source.to_string()));
            }
            selectors.push(compounds);
            match self.chars.next() {
                None => break,
                Some((_, ',')) => continue,
                Some((offset, found)) => return Err(self.unexpected(offset, found)),
            }
        }
        Ok(SelectorList { selectors })
    }

    /// Parse compounds up to the next top-level `,` or end of input.
    fn parse_complex(&mut self) -> Result<Vec<Compound>, SelectorError> {
        let mut compounds = Vec::new();
        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                None | Some((_, ',')) => break,
                Some(_) => compounds.push(self.parse_compound()?),
            }
        }
        Ok(compounds)
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut started = false;
        loop {
            match self.chars.peek().copied() {
                None => break,
                Some((_, c)) if c.is_whitespace() || c == ',' => break,
                Some((_, '*')) if !started => {
                    self.chars.next();
                }
                Some((_, c)) if is_ident_char(c) && !started => {
                    compound.tag = Some(self.ident().to_ascii_lowercase());
                }
                Some((_, '#')) => {
                    self.chars.next();
                    compound.id = Some(self.required_ident()?);
                }
                Some((_, '.')) => {
                    self.chars.next();
                    compound.classes.push(self.required_ident()?);
                }
                Some((_, '[')) => {
                    self.chars.next();
                    compound.attributes.push(self.attribute()?);
                }
                Some((offset, found)) => return Err(self.unexpected(offset, found)),
            }
            started = true;
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttributeMatch, SelectorError> {
        self.skip_whitespace();
        let name = self.required_ident()?;
        self.skip_whitespace();
        let value = match self.chars.next() {
            Some((_, ']')) => return Ok(AttributeMatch { name, value: None }),
            Some((_, '=')) => {
                self.skip_whitespace();
                let value = match self.chars.peek().copied() {
                    Some((_, quote @ ('"' | '\''))) => {
                        self.chars.next();
                        self.quoted(quote)?
                    }
                    _ => self.required_ident()?,
                };
                self.skip_whitespace();
                value
            }
            Some((offset, found)) => return Err(self.unexpected(offset, found)),
            None => return Err(self.unterminated()),
        };
        match self.chars.next() {
            Some((_, ']')) => Ok(AttributeMatch {
                name,
                value: Some(value),
            }),
            Some((offset, found)) => Err(self.unexpected(offset, found)),
            None => Err(self.unterminated()),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut value = String::new();
        for (_, c) in self.chars.by_ref() {
            if c == quote {
                return Ok(value);
            }
            value.push(c);
        }
        Err(self.unterminated())
    }

    fn ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some((_, c)) = self.chars.peek().copied() {
            if !is_ident_char(c) {
                break;
            }
            ident.push(c);
            self.chars.next();
        }
        ident
    }

    fn required_ident(&mut self) -> Result<String, SelectorError> {
        let ident = self.ident();
        if !ident.is_empty() {
            return Ok(ident);
        }
        match self.chars.peek().copied() {
            Some((offset, found)) => Err(self.unexpected(offset, found)),
            None => Err(SelectorError::Empty(self.source.to_string())),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn unexpected(&self, offset: usize, found: char) -> SelectorError {
        SelectorError::Unexpected {
            selector: self.source.to_string(),
            offset,
            found,
        }
    }

    fn unterminated(&self) -> SelectorError {
        SelectorError::UnterminatedAttribute(self.source.to_string())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}
