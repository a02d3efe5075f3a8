//! Field/method descriptors and generic signatures (JVMS 4.3, 4.7.9.1).
//!
//! Descriptors are a subset of signatures, so a single grammar handles both:
//! `parse_field_signature("Ljava/lang/String;")` and
//! `parse_field_signature("Ljava/util/List<TT;>;")` both succeed.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    pub fn from_descriptor(ch: u8) -> Option<Self> {
        Some(match ch {
            b'B' => BaseType::Byte,
            b'C' => BaseType::Char,
            b'D' => BaseType::Double,
            b'F' => BaseType::Float,
            b'I' => BaseType::Int,
            b'J' => BaseType::Long,
            b'S' => BaseType::Short,
            b'Z' => BaseType::Boolean,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JavaTypeSignature {
    Base(BaseType),
    Class(ClassTypeSignature),
    TypeVariable(String),
    Array(Box<JavaTypeSignature>),
}

/// `Lpkg/Outer<..>.Inner<..>;`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassTypeSignature {
    /// Dotted package name (`java.util`), empty for the default package.
    pub package: String,
    pub segments: Vec<SimpleClassTypeSignature>,
}

impl ClassTypeSignature {
    /// Dotted binary name, e.g. `java.util.Map$Entry`.
    pub fn binary_name(&self) -> String {
        let types = self
            .segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join("$");
        if self.package.is_empty() {
            types
        } else {
            format!("{}.{}", self.package, types)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleClassTypeSignature {
    pub name: String,
    pub arguments: Vec<TypeArgument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeArgument {
    Any,
    Extends(JavaTypeSignature),
    Super(JavaTypeSignature),
    Exact(JavaTypeSignature),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameterSignature {
    pub name: String,
    pub class_bound: Option<JavaTypeSignature>,
    pub interface_bounds: Vec<JavaTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameterSignature>,
    pub superclass: ClassTypeSignature,
    pub interfaces: Vec<ClassTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameterSignature>,
    pub parameters: Vec<JavaTypeSignature>,
    /// `None` for `V`.
    pub return_type: Option<JavaTypeSignature>,
    pub throws: Vec<JavaTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("unexpected end of signature `{signature}`")]
    UnexpectedEnd { signature: String },
    #[error("invalid signature `{signature}` at offset {offset}")]
    Invalid { signature: String, offset: usize },
}

pub type Result<T> = std::result::Result<T, SignatureError>;

pub fn parse_field_signature(sig: &str) -> Result<JavaTypeSignature> {
    let mut parser = Parser::new(sig);
    let ty = parser.reference_or_base()?;
    parser.finish()?;
    Ok(ty)
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSignature> {
    let mut parser = Parser::new(sig);
    let type_parameters = parser.type_parameters()?;
    parser.expect(b'(')?;
    let mut parameters = Vec::new();
    while parser.peek() != Some(b')') {
        parameters.push(parser.reference_or_base()?);
    }
    parser.expect(b')')?;
    let return_type = if parser.eat(b'V') {
        None
    } else {
        Some(parser.reference_or_base()?)
    };
    let mut throws = Vec::new();
    while parser.eat(b'^') {
        throws.push(parser.reference_or_base()?);
    }
    parser.finish()?;
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        throws,
    })
}

pub fn parse_class_signature(sig: &str) -> Result<ClassSignature> {
    let mut parser = Parser::new(sig);
    let type_parameters = parser.type_parameters()?;
    let superclass = parser.class_type()?;
    let mut interfaces = Vec::new();
    while parser.peek().is_some() {
        interfaces.push(parser.class_type()?);
    }
    Ok(ClassSignature {
        type_parameters,
        superclass,
        interfaces,
    })
}

struct Parser<'a> {
    sig: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(sig: &'a str) -> Self {
        Self { sig, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.sig.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn error(&self) -> SignatureError {
        if self.pos >= self.sig.len() {
            SignatureError::UnexpectedEnd {
                signature: self.sig.to_string(),
            }
        } else {
            SignatureError::Invalid {
                signature: self.sig.to_string(),
                offset: self.pos,
            }
        }
    }

    fn finish(&self) -> Result<()> {
        if self.pos == self.sig.len() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    /// An identifier up to (not including) one of the signature delimiters.
    fn identifier(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b';' | b'<' | b'>' | b'.' | b':' | b'/' | b'[') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(&self.sig[start..self.pos])
    }

    fn type_parameters(&mut self) -> Result<Vec<TypeParameterSignature>> {
        let mut params = Vec::new();
        if !self.eat(b'<') {
            return Ok(params);
        }
        while !self.eat(b'>') {
            let name = self.identifier()?.to_string();
            self.expect(b':')?;
            let class_bound = match self.peek() {
                Some(b':') | None => None,
                _ => Some(self.reference()?),
            };
            let mut interface_bounds = Vec::new();
            while self.eat(b':') {
                interface_bounds.push(self.reference()?);
            }
            params.push(TypeParameterSignature {
                name,
                class_bound,
                interface_bounds,
            });
        }
        Ok(params)
    }

    fn reference_or_base(&mut self) -> Result<JavaTypeSignature> {
        match self.peek().and_then(BaseType::from_descriptor) {
            Some(base) => {
                self.pos += 1;
                Ok(JavaTypeSignature::Base(base))
            }
            None => self.reference(),
        }
    }

    fn reference(&mut self) -> Result<JavaTypeSignature> {
        match self.peek() {
            Some(b'L') => Ok(JavaTypeSignature::Class(self.class_type()?)),
            Some(b'T') => {
                self.pos += 1;
                let name = self.identifier()?.to_string();
                self.expect(b';')?;
                Ok(JavaTypeSignature::TypeVariable(name))
            }
            Some(b'[') => {
                self.pos += 1;
                Ok(JavaTypeSignature::Array(Box::new(self.reference_or_base()?)))
            }
            _ => Err(self.error()),
        }
    }

    fn class_type(&mut self) -> Result<ClassTypeSignature> {
        self.expect(b'L')?;
        let mut path = vec![self.identifier()?];
        while self.eat(b'/') {
            path.push(self.identifier()?);
        }
        let first = path.pop().ok_or_else(|| self.error())?;
        let package = path.join(".");
        let mut segments = vec![SimpleClassTypeSignature {
            name: first.to_string(),
            arguments: self.type_arguments()?,
        }];
        while self.eat(b'.') {
            let name = self.identifier()?.to_string();
            let arguments = self.type_arguments()?;
            segments.push(SimpleClassTypeSignature { name, arguments });
        }
        self.expect(b';')?;
        Ok(ClassTypeSignature { package, segments })
    }

    fn type_arguments(&mut self) -> Result<Vec<TypeArgument>> {
        let mut args = Vec::new();
        if !self.eat(b'<') {
            return Ok(args);
        }
        while !self.eat(b'>') {
            let arg = match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    TypeArgument::Any
                }
                Some(b'+') => {
                    self.pos += 1;
                    TypeArgument::Extends(self.reference()?)
                }
                Some(b'-') => {
                    self.pos += 1;
                    TypeArgument::Super(self.reference()?)
                }
                Some(_) => TypeArgument::Exact(self.reference()?),
                None => return Err(self.error()),
            };
            args.push(arg);
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn class(package: &str, name: &str, arguments: Vec<TypeArgument>) -> JavaTypeSignature {
        JavaTypeSignature::Class(ClassTypeSignature {
            package: package.to_string(),
            segments: vec![SimpleClassTypeSignature {
                name: name.to_string(),
                arguments,
            }],
        })
    }

    #[test]
    fn descriptors_parse_as_signatures() {
        assert_eq!(
            parse_field_signature("[[Ljava/lang/String;").unwrap(),
            JavaTypeSignature::Array(Box::new(JavaTypeSignature::Array(Box::new(class(
                "java.lang",
                "String",
                vec![]
            )))))
        );
        let method = parse_method_signature("(ILjava/lang/Object;)[I").unwrap();
        assert_eq!(method.parameters.len(), 2);
        assert_eq!(
            method.return_type,
            Some(JavaTypeSignature::Array(Box::new(JavaTypeSignature::Base(
                BaseType::Int
            ))))
        );
    }

    #[test]
    fn class_signature_with_recursive_bound() {
        let sig = parse_class_signature(
            "<E:Ljava/lang/Enum<TE;>;>Ljava/lang/Object;Ljava/lang/Comparable<TE;>;",
        )
        .unwrap();
        assert_eq!(sig.type_parameters.len(), 1);
        assert_eq!(sig.type_parameters[0].name, "E");
        assert_eq!(
            sig.type_parameters[0].class_bound,
            Some(class(
                "java.lang",
                "Enum",
                vec![TypeArgument::Exact(JavaTypeSignature::TypeVariable(
                    "E".to_string()
                ))]
            ))
        );
        assert_eq!(sig.interfaces.len(), 1);
        assert_eq!(sig.interfaces[0].binary_name(), "java.lang.Comparable");
    }

    #[test]
    fn interface_only_bound_and_wildcards() {
        let sig = parse_method_signature(
            "<T::Ljava/lang/Comparable<-TT;>;>(Ljava/util/List<+TT;>;)TT;^Ljava/io/IOException;",
        )
        .unwrap();
        let param = &sig.type_parameters[0];
        assert!(param.class_bound.is_none());
        assert_eq!(param.interface_bounds.len(), 1);
        assert_eq!(sig.throws.len(), 1);
        assert_eq!(
            sig.return_type,
            Some(JavaTypeSignature::TypeVariable("T".to_string()))
        );
    }

    #[test]
    fn inner_class_segments() {
        let sig = parse_field_signature("Lp/Outer<Ljava/lang/String;>.Inner<*>;").unwrap();
        let JavaTypeSignature::Class(class) = sig else {
            panic!("expected class type");
        };
        assert_eq!(class.binary_name(), "p.Outer$Inner");
        assert_eq!(class.segments[1].arguments, vec![TypeArgument::Any]);
    }

    #[test]
    fn truncated_signature_is_an_error() {
        assert!(matches!(
            parse_field_signature("Ljava/util/List<TT;"),
            Err(SignatureError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_method_signature("(I)Q"),
            Err(SignatureError::Invalid { offset: 3, .. })
        ));
    }
}
