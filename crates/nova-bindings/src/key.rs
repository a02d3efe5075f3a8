//! Names, keys and signatures of bindings.
//!
//! Unique keys identify a binding across environments built from the same
//! inputs: equal keys mean the same declaration with the same type
//! arguments. Generic signatures use the class-file `Signature` grammar, so
//! [`nova_decl::signature`] parses them back.

use std::fmt::Write as _;

use crate::binding::{Declarer, MethodKind, TypeKind, WildcardKind};
use crate::env::Environment;
use crate::hierarchy::erasure;
use crate::ids::{FieldId, MethodId, TypeId};

fn internal_name(binary_name: &str) -> String {
    binary_name.replace('.', "/")
}

/// `Lp/A;` for the declaration behind `ty`, without type arguments.
fn declaration_key(env: &Environment, ty: TypeId) -> String {
    match env.declaration(ty) {
        Some(class) => format!("L{};", internal_name(&class.binary_name)),
        None => String::new(),
    }
}

fn strip_semicolon(mut key: String) -> String {
    if key.ends_with(';') {
        key.pop();
    }
    key
}

/// Unique key of a type.
pub fn type_key(env: &mut Environment, ty: TypeId) -> String {
    let mut out = String::new();
    write_type_key(env, ty, &mut out);
    out
}

fn write_type_key(env: &mut Environment, ty: TypeId, out: &mut String) {
    if let TypeKind::Class(class) = env.type_kind(ty) {
        let _ = write!(out, "L{}", internal_name(&class.binary_name));
        if !class.type_variables.is_empty() {
            out.push('<');
            for &var in &class.type_variables {
                if let Some(data) = env.type_variable(var) {
                    let _ = write!(out, "T{};", data.name);
                }
            }
            out.push('>');
        }
        out.push(';');
        return;
    }
    match env.type_kind(ty).clone() {
        TypeKind::Base(base) => out.push(base.descriptor()),
        TypeKind::Annotated(data) => write_type_key(env, data.unannotated, out),
        TypeKind::Array { leaf, dimensions } => {
            for _ in 0..dimensions {
                out.push('[');
            }
            write_type_key(env, leaf, out);
        }
        TypeKind::Class(_) => {}
        TypeKind::Parameterized(data) | TypeKind::Raw(data) => {
            let raw = matches!(env.type_kind(ty), TypeKind::Raw(_));
            write_owner_prefix(env, data.generic, data.enclosing, out, write_type_key);
            if raw {
                out.push_str("<>");
            } else if !data.arguments.is_empty() {
                out.push('<');
                for &arg in &data.arguments {
                    write_type_key(env, arg, out);
                }
                out.push('>');
            }
            out.push(';');
        }
        TypeKind::TypeVariable(data) => {
            match data.declarer {
                Declarer::Type(owner) => out.push_str(&declaration_key(env, owner)),
                Declarer::Method(method) => out.push_str(&method_declaration_key(env, method)),
            }
            let _ = write!(out, ":T{};", data.name);
        }
        TypeKind::Wildcard(data) => {
            if let Some(generic) = data.generic {
                out.push_str(&declaration_key(env, generic));
                let _ = write!(out, "{{{}}}", data.rank);
            }
            match (data.kind, data.bound) {
                (WildcardKind::Extends, Some(bound)) => {
                    out.push('+');
                    write_type_key(env, bound, out);
                    for &other in &data.other_bounds {
                        out.push(':');
                        write_type_key(env, other, out);
                    }
                }
                (WildcardKind::Super, Some(bound)) => {
                    out.push('-');
                    write_type_key(env, bound, out);
                }
                _ => out.push('*'),
            }
        }
        TypeKind::Capture(data) => {
            let _ = write!(out, "&{}-{}", data.position.start, data.position.end);
            out.push_str(&declaration_key(env, data.source_type));
            write_type_key(env, data.wildcard, out);
        }
        TypeKind::Intersection(parts) => {
            for (i, &part) in parts.iter().enumerate() {
                if i > 0 {
                    out.push(':');
                }
                write_type_key(env, part, out);
            }
        }
        TypeKind::InferenceVariable(data) => {
            let _ = write!(out, "^{}:", data.site);
            write_type_key(env, data.type_parameter, out);
        }
        TypeKind::Problem(data) => {
            let _ = write!(out, "L{};", internal_name(&data.name));
        }
    }
}

/// Writes `Lp/A` or, for a member of a parameterized or raw type,
/// `<enclosing without ';'>.A`.
fn write_owner_prefix(
    env: &mut Environment,
    generic: TypeId,
    enclosing: Option<TypeId>,
    out: &mut String,
    write_enclosing: fn(&mut Environment, TypeId, &mut String),
) {
    let (binary_name, simple_name) = match env.class(generic) {
        Some(class) => (class.binary_name.clone(), class.simple_name.clone()),
        None => return,
    };
    match enclosing {
        Some(outer) => {
            let mut prefix = String::new();
            write_enclosing(env, outer, &mut prefix);
            out.push_str(&strip_semicolon(prefix));
            let _ = write!(out, ".{simple_name}");
        }
        None => {
            let _ = write!(out, "L{}", internal_name(&binary_name));
        }
    }
}

/// `Lp/A;.name(descriptor)`: the erased identity of a method, used as the
/// declarer part of its type variables' keys.
fn method_declaration_key(env: &mut Environment, method: MethodId) -> String {
    let declaring = env.method(method).declaring_class;
    let selector = env.method(method).selector.clone();
    format!(
        "{}.{}{}",
        declaration_key(env, declaring),
        selector,
        method_descriptor(env, method)
    )
}

/// Unique key of a method:
/// `declaringKey.selector<vars>(params)return|thrown`, with `%<args>` for
/// a generic method applied to type arguments.
pub fn method_key(env: &mut Environment, method: MethodId) -> String {
    let data = env.method(method).clone();
    let mut out = type_key(env, data.declaring_class);
    out.push('.');
    out.push_str(&data.selector);
    if !data.type_variables.is_empty() {
        out.push('<');
        for &var in &data.type_variables {
            if let Some(tv) = env.type_variable(var) {
                let _ = write!(out, "T{};", tv.name);
            }
        }
        out.push('>');
    }
    out.push('(');
    for &param in &data.parameters {
        write_type_key(env, param, &mut out);
    }
    out.push(')');
    write_type_key(env, data.return_type, &mut out);
    for &thrown in &data.thrown {
        out.push('|');
        write_type_key(env, thrown, &mut out);
    }
    if let MethodKind::ParameterizedGeneric {
        type_arguments,
        is_raw,
        ..
    } = &data.kind
    {
        out.push_str("%<");
        if !is_raw {
            for &arg in type_arguments {
                write_type_key(env, arg, &mut out);
            }
        }
        out.push('>');
    }
    out
}

/// Unique key of a field: `declaringKey.name)type`.
pub fn field_key(env: &mut Environment, field: FieldId) -> String {
    let data = env.field(field).clone();
    let mut out = match data.declaring_class {
        Some(owner) => type_key(env, owner),
        None => String::new(),
    };
    let _ = write!(out, ".{})", data.name);
    write_type_key(env, data.ty, &mut out);
    out
}

/// Erased descriptor: `Ljava/util/List;`, `[I`.
pub fn descriptor(env: &mut Environment, ty: TypeId) -> String {
    let erased = erasure(env, ty);
    let mut out = String::new();
    write_descriptor(env, erased, &mut out);
    out
}

fn write_descriptor(env: &Environment, ty: TypeId, out: &mut String) {
    match env.type_kind(ty) {
        TypeKind::Base(base) => out.push(base.descriptor()),
        TypeKind::Array { leaf, dimensions } => {
            for _ in 0..*dimensions {
                out.push('[');
            }
            write_descriptor(env, *leaf, out);
        }
        TypeKind::Problem(data) => {
            let _ = write!(out, "L{};", internal_name(&data.name));
        }
        _ => out.push_str(&declaration_key(env, ty)),
    }
}

/// Erased method descriptor `(params)return`.
pub fn method_descriptor(env: &mut Environment, method: MethodId) -> String {
    let data = env.method(method).clone();
    let mut out = String::from("(");
    for &param in &data.parameters {
        out.push_str(&descriptor(env, param));
    }
    out.push(')');
    out.push_str(&descriptor(env, data.return_type));
    out
}

/// Generic signature of a type as written in a `Signature` attribute.
pub fn generic_signature(env: &mut Environment, ty: TypeId) -> String {
    let mut out = String::new();
    write_signature(env, ty, &mut out);
    out
}

fn write_signature(env: &mut Environment, ty: TypeId, out: &mut String) {
    if let TypeKind::Class(class) = env.type_kind(ty) {
        let _ = write!(out, "L{};", internal_name(&class.binary_name));
        return;
    }
    match env.type_kind(ty).clone() {
        TypeKind::Base(base) => out.push(base.descriptor()),
        TypeKind::Annotated(data) => write_signature(env, data.unannotated, out),
        TypeKind::Array { leaf, dimensions } => {
            for _ in 0..dimensions {
                out.push('[');
            }
            write_signature(env, leaf, out);
        }
        TypeKind::Class(_) => {}
        TypeKind::Raw(data) => {
            let binary_name = env
                .class(data.generic)
                .map(|class| class.binary_name.clone())
                .unwrap_or_default();
            let _ = write!(out, "L{};", internal_name(&binary_name));
        }
        TypeKind::Parameterized(data) => {
            let enclosing = data
                .enclosing
                .filter(|&outer| matches!(env.type_kind(outer), TypeKind::Parameterized(_)));
            write_owner_prefix(env, data.generic, enclosing, out, write_signature);
            if !data.arguments.is_empty() {
                out.push('<');
                for &arg in &data.arguments {
                    write_signature(env, arg, out);
                }
                out.push('>');
            }
            out.push(';');
        }
        TypeKind::TypeVariable(data) => {
            let _ = write!(out, "T{};", data.name);
        }
        TypeKind::Wildcard(data) => match (data.kind, data.bound) {
            (WildcardKind::Extends, Some(bound)) => {
                out.push('+');
                write_signature(env, bound, out);
            }
            (WildcardKind::Super, Some(bound)) => {
                out.push('-');
                write_signature(env, bound, out);
            }
            _ => out.push('*'),
        },
        TypeKind::Capture(data) => {
            let erased = erasure(env, data.wildcard);
            write_signature(env, erased, out);
        }
        TypeKind::Intersection(parts) => match parts.first() {
            Some(&first) => write_signature(env, first, out),
            None => out.push_str("Ljava/lang/Object;"),
        },
        TypeKind::InferenceVariable(data) => write_signature(env, data.type_parameter, out),
        TypeKind::Problem(data) => {
            let _ = write!(out, "L{};", internal_name(&data.name));
        }
    }
}

/// Generic method signature: `<T:bound>(params)return^thrown`. Thrown
/// types are listed only when one of them is a type variable, as in class
/// files.
pub fn method_signature(env: &mut Environment, method: MethodId) -> String {
    let data = env.method(method).clone();
    let mut out = String::new();
    if !data.type_variables.is_empty() {
        out.push('<');
        for &var in &data.type_variables {
            let name = env
                .type_variable(var)
                .map(|tv| tv.name.clone())
                .unwrap_or_default();
            let bounds = env.type_variable_bounds(var);
            out.push_str(&name);
            out.push(':');
            match bounds.superclass {
                Some(class) => write_signature(env, class, &mut out),
                None if bounds.superinterfaces.is_empty() => out.push_str("Ljava/lang/Object;"),
                None => {}
            }
            for &iface in &bounds.superinterfaces {
                out.push(':');
                write_signature(env, iface, &mut out);
            }
        }
        out.push('>');
    }
    out.push('(');
    for &param in &data.parameters {
        write_signature(env, param, &mut out);
    }
    out.push(')');
    write_signature(env, data.return_type, &mut out);
    if data
        .thrown
        .iter()
        .any(|&t| matches!(env.type_kind(t), TypeKind::TypeVariable(_)))
    {
        for &thrown in &data.thrown {
            out.push('^');
            write_signature(env, thrown, &mut out);
        }
    }
    out
}

/// `java.util.List<java.lang.String>`.
pub fn readable_name(env: &Environment, ty: TypeId) -> String {
    let mut out = String::new();
    write_readable(env, ty, false, &mut out);
    out
}

/// `List<String>`.
pub fn short_readable_name(env: &Environment, ty: TypeId) -> String {
    let mut out = String::new();
    write_readable(env, ty, true, &mut out);
    out
}

fn write_readable(env: &Environment, ty: TypeId, short: bool, out: &mut String) {
    match env.type_kind(ty) {
        TypeKind::Base(base) => out.push_str(base.keyword()),
        TypeKind::Annotated(data) => {
            out.push_str(data.annotation.as_str());
            out.push(' ');
            write_readable(env, data.unannotated, short, out);
        }
        TypeKind::Array { leaf, dimensions } => {
            write_readable(env, *leaf, short, out);
            for _ in 0..*dimensions {
                out.push_str("[]");
            }
        }
        TypeKind::Class(class) => out.push_str(if short {
            &class.simple_name
        } else {
            &class.qualified_name
        }),
        TypeKind::Parameterized(data) | TypeKind::Raw(data) => {
            match (data.enclosing, env.class(data.generic)) {
                (Some(outer), Some(class)) => {
                    write_readable(env, outer, short, out);
                    out.push('.');
                    out.push_str(&class.simple_name);
                }
                (None, Some(class)) => out.push_str(if short {
                    &class.simple_name
                } else {
                    &class.qualified_name
                }),
                _ => {}
            }
            if !data.arguments.is_empty() {
                out.push('<');
                for (i, &arg) in data.arguments.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_readable(env, arg, short, out);
                }
                out.push('>');
            }
        }
        TypeKind::TypeVariable(data) => out.push_str(&data.name),
        TypeKind::Wildcard(data) => {
            out.push('?');
            match (data.kind, data.bound) {
                (WildcardKind::Extends, Some(bound)) => {
                    out.push_str(" extends ");
                    write_readable(env, bound, short, out);
                    for &other in &data.other_bounds {
                        out.push_str(" & ");
                        write_readable(env, other, short, out);
                    }
                }
                (WildcardKind::Super, Some(bound)) => {
                    out.push_str(" super ");
                    write_readable(env, bound, short, out);
                }
                _ => {}
            }
        }
        TypeKind::Capture(data) => {
            let _ = write!(out, "capture#{}-of ", data.id);
            write_readable(env, data.wildcard, short, out);
        }
        TypeKind::Intersection(parts) => {
            for (i, &part) in parts.iter().enumerate() {
                if i > 0 {
                    out.push_str(" & ");
                }
                write_readable(env, part, short, out);
            }
        }
        TypeKind::InferenceVariable(data) => {
            write_readable(env, data.type_parameter, short, out);
            let _ = write!(out, "#{}", data.rank);
        }
        TypeKind::Problem(data) => out.push_str(&data.name),
    }
}

/// `selector(T1, T2)`, constructors by their class's simple name.
pub fn method_readable_name(env: &Environment, method: MethodId, short: bool) -> String {
    let data = env.method(method);
    let mut out = if data.is_constructor() {
        env.declaration(data.declaring_class)
            .map(|class| class.simple_name.clone())
            .unwrap_or_default()
    } else {
        data.selector.clone()
    };
    out.push('(');
    for (i, &param) in data.parameters.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_readable(env, param, short, &mut out);
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::WellKnown;
    use crate::options::CompilerOptions;
    use nova_decl::signature::parse_field_signature;
    use nova_decl::MinimalJdk;
    use pretty_assertions::assert_eq;

    fn env() -> Environment {
        Environment::new(CompilerOptions::default(), MinimalJdk::new()).unwrap()
    }

    #[test]
    fn keys_distinguish_parameterizations() {
        let mut env = env();
        let list = env.get_type("java.util.List").unwrap();
        let string = env.well_known(WellKnown::String);
        let param = env.create_parameterized_type(list, vec![string], None);
        let raw = env.create_raw_type(list, None);

        assert_eq!(type_key(&mut env, list), "Ljava/util/List<TE;>;");
        assert_eq!(type_key(&mut env, param), "Ljava/util/List<Ljava/lang/String;>;");
        assert_eq!(type_key(&mut env, raw), "Ljava/util/List<>;");
        let e = env.class(list).unwrap().type_variables[0];
        assert_eq!(type_key(&mut env, e), "Ljava/util/List;:TE;");
    }

    #[test]
    fn method_keys_are_deterministic() {
        let mut first = env();
        let mut second = env();
        let key = |env: &mut Environment| {
            let list = env.get_type("java.util.ArrayList").unwrap();
            let string = env.well_known(WellKnown::String);
            let owner = env.create_parameterized_type(list, vec![string], None);
            let get = env.get_methods(owner, "get")[0];
            method_key(env, get)
        };
        let a = key(&mut first);
        assert_eq!(a, key(&mut second));
        assert_eq!(a, "Ljava/util/ArrayList<Ljava/lang/String;>;.get(I)Ljava/lang/String;");
    }

    #[test]
    fn signatures_parse_back() {
        let mut env = env();
        let map = env.get_type("java.util.Map").unwrap();
        let list = env.get_type("java.util.List").unwrap();
        let string = env.well_known(WellKnown::String);
        let number = env.get_type("java.lang.Number").unwrap();
        let wildcard = env.create_wildcard(Some(map), 1, WildcardKind::Extends, Some(number), vec![]);
        let list_of_string = env.create_parameterized_type(list, vec![string], None);
        let ty = env.create_parameterized_type(map, vec![list_of_string, wildcard], None);
        let array = env.create_array(ty, 1);

        let signature = generic_signature(&mut env, array);
        assert_eq!(
            signature,
            "[Ljava/util/Map<Ljava/util/List<Ljava/lang/String;>;+Ljava/lang/Number;>;"
        );
        assert!(parse_field_signature(&signature).is_ok());
        assert_eq!(descriptor(&mut env, array), "[Ljava/util/Map;");
    }

    #[test]
    fn readable_names() {
        let mut env = env();
        let list = env.get_type("java.util.List").unwrap();
        let string = env.well_known(WellKnown::String);
        let param = env.create_parameterized_type(list, vec![string], None);
        assert_eq!(readable_name(&env, param), "java.util.List<java.lang.String>");
        assert_eq!(short_readable_name(&env, param), "List<String>");
    }
}
