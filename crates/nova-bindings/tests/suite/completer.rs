use std::cell::Cell;
use std::rc::Rc;

use nova_bindings::{
    is_subtype_of, ClassData, ClassSort, Environment, Hierarchy, MethodData, MethodKind,
    SourceKey, TagBits, TypeCompleter, TypeId, TypeOrigin, WellKnown,
};
use nova_decl::{Modifiers, Span};

use super::jdk_env;

/// Completes `Widget extends Number` with one method, counting calls.
#[derive(Default)]
struct WidgetCompleter {
    hierarchy_calls: Cell<u32>,
    method_calls: Cell<u32>,
}

impl TypeCompleter for WidgetCompleter {
    fn connect_hierarchy(&self, env: &mut Environment, ty: TypeId) {
        self.hierarchy_calls.set(self.hierarchy_calls.get() + 1);
        let number = env.get_type("java.lang.Number").unwrap();
        let serializable = env.well_known(WellKnown::Serializable);
        env.set_hierarchy(
            ty,
            Hierarchy {
                superclass: Some(number),
                superinterfaces: vec![serializable],
            },
        );
    }

    fn build_fields(&self, _env: &mut Environment, _ty: TypeId) {}

    fn build_methods(&self, env: &mut Environment, ty: TypeId) {
        self.method_calls.set(self.method_calls.get() + 1);
        let int = env.base(nova_bindings::BaseType::Int);
        let method = env.create_method(MethodData {
            selector: "size".to_string(),
            modifiers: Modifiers::PUBLIC,
            declaring_class: ty,
            type_variables: Vec::new(),
            parameters: Vec::new(),
            parameter_names: Vec::new(),
            return_type: int,
            thrown: Vec::new(),
            kind: MethodKind::Declared,
            tag_bits: TagBits::empty(),
            span: Span::new(0, 4),
        });
        env.set_methods(ty, vec![method]);
    }

    fn build_components(&self, _env: &mut Environment, _ty: TypeId) {}
}

#[test]
fn source_stages_are_built_once_on_demand() {
    let mut env = jdk_env();
    let completer = Rc::new(WidgetCompleter::default());
    env.set_completer(completer.clone());

    let widget = env.create_class(ClassData::new(
        "app.Widget",
        ClassSort::Class,
        TypeOrigin::Source(SourceKey(0)),
    ));
    assert_eq!(completer.hierarchy_calls.get(), 0);

    let number = env.get_type("java.lang.Number").unwrap();
    assert!(is_subtype_of(&mut env, widget, number));
    assert!(is_subtype_of(&mut env, widget, number));
    assert_eq!(completer.hierarchy_calls.get(), 1);

    assert_eq!(env.get_methods(widget, "size").len(), 1);
    assert_eq!(env.get_methods(widget, "size").len(), 1);
    assert_eq!(completer.method_calls.get(), 1);
    assert!(env.fields(widget).is_empty());
}
