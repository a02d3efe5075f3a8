//! Unresolved type references as written in source.
//!
//! Declarations carry their types as [`TypeRef`] trees: dotted names with
//! per-segment type arguments, primitives, arrays and wildcards. Names are
//! resolved later against a scope; nothing here knows about packages.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveKind {
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "char" => PrimitiveKind::Char,
            "short" => PrimitiveKind::Short,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            "void" => PrimitiveKind::Void,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Void => "void",
        }
    }
}

/// One `Name<Args>` piece of a dotted type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRefSegment {
    pub name: String,
    pub arguments: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardRef {
    Unbound,
    Extends(Box<TypeRef>),
    Super(Box<TypeRef>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    Named {
        segments: Vec<TypeRefSegment>,
        span: Span,
    },
    Array {
        element: Box<TypeRef>,
        dimensions: u32,
    },
    /// Only valid as a type argument.
    Wildcard(WildcardRef),
}

impl TypeRef {
    /// Parse Java type syntax, e.g. `java.util.Map<String, ? extends List<T>>[]`.
    pub fn parse(text: &str) -> Result<TypeRef, TypeRefParseError> {
        let mut parser = Parser::new(text);
        let ty = parser.parse_type(false)?;
        parser.skip_ws();
        if let Some(found) = parser.peek() {
            return Err(TypeRefParseError::Unexpected {
                text: text.to_string(),
                offset: parser.pos,
                found,
            });
        }
        Ok(ty)
    }

    /// A reference to a dotted name without type arguments. Primitive
    /// keywords produce [`TypeRef::Primitive`].
    pub fn named(dotted: &str) -> TypeRef {
        if let Some(kind) = PrimitiveKind::from_keyword(dotted) {
            return TypeRef::Primitive(kind);
        }
        TypeRef::Named {
            segments: dotted
                .split('.')
                .map(|name| TypeRefSegment {
                    name: name.to_string(),
                    arguments: Vec::new(),
                })
                .collect(),
            span: Span::default(),
        }
    }

    pub fn array_of(element: TypeRef, dimensions: u32) -> TypeRef {
        match element {
            TypeRef::Array {
                element,
                dimensions: inner,
            } => TypeRef::Array {
                element,
                dimensions: inner + dimensions,
            },
            element => TypeRef::Array {
                element: Box::new(element),
                dimensions,
            },
        }
    }

    pub fn with_span(mut self, new_span: Span) -> TypeRef {
        if let TypeRef::Named { span, .. } = &mut self {
            *span = new_span;
        }
        self
    }

    pub fn span(&self) -> Span {
        match self {
            TypeRef::Named { span, .. } => *span,
            TypeRef::Array { element, .. } => element.span(),
            TypeRef::Wildcard(WildcardRef::Extends(b) | WildcardRef::Super(b)) => b.span(),
            _ => Span::default(),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Primitive(PrimitiveKind::Void))
    }

    /// The dotted name of a `Named` reference, ignoring type arguments.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            TypeRef::Named { segments, .. } => Some(
                segments
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join("."),
            ),
            _ => None,
        }
    }

    /// Last simple name of a `Named` reference (array leaves included).
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { segments, .. } => segments.last().map(|s| s.name.as_str()),
            TypeRef::Array { element, .. } => element.simple_name(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(kind) => f.write_str(kind.keyword()),
            TypeRef::Named { segments, .. } => {
                for (idx, segment) in segments.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(&segment.name)?;
                    if !segment.arguments.is_empty() {
                        f.write_str("<")?;
                        for (i, arg) in segment.arguments.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{arg}")?;
                        }
                        f.write_str(">")?;
                    }
                }
                Ok(())
            }
            TypeRef::Array {
                element,
                dimensions,
            } => {
                write!(f, "{element}")?;
                for _ in 0..*dimensions {
                    f.write_str("[]")?;
                }
                Ok(())
            }
            TypeRef::Wildcard(WildcardRef::Unbound) => f.write_str("?"),
            TypeRef::Wildcard(WildcardRef::Extends(bound)) => write!(f, "? extends {bound}"),
            TypeRef::Wildcard(WildcardRef::Super(bound)) => write!(f, "? super {bound}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeRefParseError {
    #[error("unexpected end of type reference `{text}`")]
    UnexpectedEnd { text: String },
    #[error("unexpected `{found}` at offset {offset} in type reference `{text}`")]
    Unexpected {
        text: String,
        offset: usize,
        found: char,
    },
    #[error("`{keyword}` cannot be used as a type argument in `{text}`")]
    PrimitiveArgument { text: String, keyword: &'static str },
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn consume_char(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), TypeRefParseError> {
        if self.consume_char(expected) {
            return Ok(());
        }
        Err(self.unexpected())
    }

    fn unexpected(&self) -> TypeRefParseError {
        match self.peek() {
            Some(found) => TypeRefParseError::Unexpected {
                text: self.text.to_string(),
                offset: self.pos,
                found,
            },
            None => TypeRefParseError::UnexpectedEnd {
                text: self.text.to_string(),
            },
        }
    }

    fn ident(&mut self) -> Result<&'a str, TypeRefParseError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            let ok = if self.pos == start {
                ch.is_alphabetic() || ch == '_' || ch == '$'
            } else {
                ch.is_alphanumeric() || ch == '_' || ch == '$'
            };
            if !ok {
                break;
            }
            self.pos += ch.len_utf8();
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(&self.text[start..self.pos])
    }

    fn parse_type(&mut self, as_argument: bool) -> Result<TypeRef, TypeRefParseError> {
        self.skip_ws();
        if as_argument && self.consume_char('?') {
            return self.parse_wildcard();
        }
        let start = self.pos;
        let first = self.ident()?;
        let base = if let Some(kind) = PrimitiveKind::from_keyword(first) {
            TypeRef::Primitive(kind)
        } else {
            let mut segments = vec![TypeRefSegment {
                name: first.to_string(),
                arguments: self.parse_arguments()?,
            }];
            while self.consume_char('.') {
                let name = self.ident()?.to_string();
                let arguments = self.parse_arguments()?;
                segments.push(TypeRefSegment { name, arguments });
            }
            TypeRef::Named {
                segments,
                span: Span::new(start, self.pos),
            }
        };

        let mut dimensions = 0;
        loop {
            self.skip_ws();
            if self.text[self.pos..].starts_with('[') {
                self.pos += 1;
                self.expect_char(']')?;
                dimensions += 1;
            } else {
                break;
            }
        }

        if dimensions > 0 {
            return Ok(TypeRef::array_of(base, dimensions));
        }
        if let TypeRef::Primitive(kind) = base {
            if as_argument {
                return Err(TypeRefParseError::PrimitiveArgument {
                    text: self.text.to_string(),
                    keyword: kind.keyword(),
                });
            }
        }
        Ok(base)
    }

    fn parse_wildcard(&mut self) -> Result<TypeRef, TypeRefParseError> {
        self.skip_ws();
        let rest = &self.text[self.pos..];
        let keyword_end = |word: &str| {
            rest.starts_with(word)
                && !rest[word.len()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        };
        if keyword_end("extends") {
            self.pos += "extends".len();
            let bound = self.parse_type(false)?;
            Ok(TypeRef::Wildcard(WildcardRef::Extends(Box::new(bound))))
        } else if keyword_end("super") {
            self.pos += "super".len();
            let bound = self.parse_type(false)?;
            Ok(TypeRef::Wildcard(WildcardRef::Super(Box::new(bound))))
        } else {
            Ok(TypeRef::Wildcard(WildcardRef::Unbound))
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<TypeRef>, TypeRefParseError> {
        if !self.consume_char('<') {
            return Ok(Vec::new());
        }
        let mut args = Vec::new();
        loop {
            args.push(self.parse_type(true)?);
            if self.consume_char(',') {
                continue;
            }
            self.expect_char('>')?;
            return Ok(args);
        }
    }
}
