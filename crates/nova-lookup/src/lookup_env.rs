//! The driver tying source units, binary types and lookups together.

use std::rc::Rc;

use nova_bindings::{AbortCompilation, CompilerOptions, Environment, ProblemReporter, TypeId};
use nova_decl::{CompilationUnit, TypeProvider};

use crate::scope::{with_unit_scope, Scope, UnitContext};
use crate::source::{check_imports, with_type_scope, SourceCompleter};
use crate::synthetic::SyntheticRegistry;

/// An [`Environment`] whose source types are completed from registered
/// compilation units.
pub struct LookupEnvironment {
    env: Environment,
    completer: Rc<SourceCompleter>,
    synthetics: SyntheticRegistry,
}

impl std::fmt::Debug for LookupEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupEnvironment")
            .field("env", &self.env)
            .field("source_types", &self.completer.types().len())
            .finish_non_exhaustive()
    }
}

impl LookupEnvironment {
    pub fn new(options: CompilerOptions, provider: impl TypeProvider + 'static) -> Result<Self, AbortCompilation> {
        let mut env = Environment::new(options, provider)?;
        let completer = Rc::new(SourceCompleter::new());
        env.set_completer(completer.clone());
        Ok(Self {
            env,
            completer,
            synthetics: SyntheticRegistry::new(),
        })
    }

    /// Runs `f` over an environment holding `units`, all completed. An
    /// abort raised anywhere inside ends up in the `Err`.
    pub fn compile<R>(
        options: CompilerOptions,
        provider: impl TypeProvider + 'static,
        units: &[CompilationUnit],
        f: impl FnOnce(&mut LookupEnvironment) -> R,
    ) -> Result<R, AbortCompilation> {
        AbortCompilation::catch(move || {
            let mut lookup = LookupEnvironment::new(options, provider)?;
            for unit in units {
                lookup.add_compilation_unit(unit);
            }
            lookup.complete_types();
            Ok(f(&mut lookup))
        })?
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn set_reporter(&mut self, reporter: Box<dyn ProblemReporter>) {
        self.env.set_reporter(reporter);
    }

    /// Creates the types of `unit`. Nothing beyond their names and type
    /// variables is built until asked for.
    pub fn add_compilation_unit(&mut self, unit: &CompilationUnit) -> Rc<UnitContext> {
        let context = self.completer.register_unit(&mut self.env, unit);
        tracing::debug!(
            target: "nova.lookup",
            unit = %unit.name,
            types = context.types.len(),
            "added compilation unit"
        );
        context
    }

    /// Checks imports, then connects and builds every source type.
    pub fn complete_types(&mut self) {
        for unit in self.completer.units() {
            check_imports(&mut self.env, &unit);
        }
        for ty in self.completer.types() {
            self.env.ensure_hierarchy(ty);
            self.env.components(ty);
            self.env.fields(ty);
            self.env.methods(ty);
        }
    }

    pub fn units(&self) -> Vec<Rc<UnitContext>> {
        self.completer.units()
    }

    /// A source or binary type by binary name (`p.Outer$Inner`).
    pub fn get_type(&mut self, binary_name: &str) -> Option<TypeId> {
        self.env.get_type(binary_name)
    }

    /// Runs `f` in the scope of the source type `ty`'s body. `None` for
    /// binary types.
    pub fn with_type_scope<R>(
        &mut self,
        ty: TypeId,
        f: impl FnOnce(&mut Environment, &Scope<'_>) -> R,
    ) -> Option<R> {
        let (_, unit) = self.completer.declaration(&self.env, ty)?;
        Some(with_type_scope(&mut self.env, &unit, ty, f))
    }

    /// Runs `f` in the top-level scope of `unit`.
    pub fn with_unit_scope<R>(
        &mut self,
        unit: &Rc<UnitContext>,
        f: impl FnOnce(&mut Environment, &Scope<'_>) -> R,
    ) -> R {
        let env = &mut self.env;
        with_unit_scope(unit, |scope| f(env, scope))
    }

    /// The environment together with the synthetic member registry, which
    /// needs it to create members.
    pub fn synthetics(&mut self) -> (&mut Environment, &mut SyntheticRegistry) {
        (&mut self.env, &mut self.synthetics)
    }
}
