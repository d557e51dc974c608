use std::collections::HashMap;

use crate::ast::FunctionDecl;
use crate::diagnostics::CbError;
use crate::types::{Type, TypeRegistry};

use super::heap::Heap;
use super::namespace::NamespaceSearch;
use super::scope::Scope;
use super::variable::Variable;

/// A registered `impl` method: its name and definition, plus whether
/// it came from an inherent block or an interface implementation
/// (spec §4.5 dispatch order step 1 vs step 2).
#[derive(Debug, Clone)]
pub struct ImplMethod {
    pub name: String,
    pub decl: FunctionDecl,
}

/// Key into the impl table: `(interface_name, concrete_type)` (spec §3).
/// `interface_name` is `None` for an inherent `impl T { ... }` block.
pub type ImplKey = (Option<String>, String);

/// Key into the generic instantiation cache: `(base_name, type_args)`
/// (spec §4.5).
pub type GenericKey = (String, Vec<Type>);

#[derive(Debug, Clone)]
pub enum GenericCacheEntry {
    Function(FunctionDecl),
    Struct(crate::ast::StructDecl),
    Enum(crate::ast::EnumDecl),
}

/// The Environment (spec §3, §4.3, component C3): the scope stack,
/// globals, and every process-scoped registry the rest of the
/// evaluator consults by name.
pub struct Environment {
    pub scopes: Vec<Scope>,
    pub globals: Scope,
    pub type_registry: TypeRegistry,
    pub impls: HashMap<ImplKey, Vec<ImplMethod>>,
    pub functions: HashMap<String, FunctionDecl>,
    pub generic_cache: HashMap<GenericKey, GenericCacheEntry>,
    pub namespaces: NamespaceSearch,
    pub heap: Heap,
    /// Persistent storage for `static` locals, keyed by an owner tag
    /// (a plain function's qualified name, or `"Type::method"` for an
    /// impl method) so the same scope re-attaches on every call (spec
    /// §4.3 "Static locals persist across calls").
    static_scopes: HashMap<String, Scope>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            globals: Scope::new(),
            type_registry: TypeRegistry::new(),
            impls: HashMap::new(),
            functions: HashMap::new(),
            generic_cache: HashMap::new(),
            namespaces: NamespaceSearch::new(),
            heap: Heap::new(),
            static_scopes: HashMap::new(),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn pop_scope(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    pub fn current_scope_mut(&mut self) -> Option<&mut Scope> {
        self.scopes.last_mut()
    }

    pub fn current_depth(&self) -> usize {
        self.scopes.len()
    }

    /// `declare(name, ...)`: fails on a same-scope duplicate (spec §4.3).
    pub fn declare(&mut self, variable: Variable) -> Result<(), CbError> {
        let name = variable.name.clone();
        let target = self.scopes.last_mut().unwrap_or(&mut self.globals);
        if !target.declare(variable) {
            return Err(CbError::DuplicateDeclaration { name, position: None });
        }
        Ok(())
    }

    /// `find_variable(name)`: walks inner-to-outer, then globals
    /// (spec §4.3).
    pub fn find_variable(&self, name: &str) -> Option<&Variable> {
        for scope in self.scopes.iter().rev() {
            if let Some(var) = scope.find(name) {
                return Some(var);
            }
        }
        self.globals.find(name)
    }

    pub fn find_variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        for scope in self.scopes.iter_mut().rev() {
            if scope.find(name).is_some() {
                return scope.find_mut(name);
            }
        }
        self.globals.find_mut(name)
    }

    /// Record a `defer` on the innermost scope (spec §4.4).
    pub fn push_defer(&mut self, statement: crate::ast::Stmt) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push_defer(statement);
        } else {
            self.globals.push_defer(statement);
        }
    }

    pub fn register_function(&mut self, qualified_name: impl Into<String>, decl: FunctionDecl) {
        self.functions.insert(qualified_name.into(), decl);
    }

    pub fn lookup_function(&self, name: &str) -> Option<&FunctionDecl> {
        for candidate in self.namespaces.search_order() {
            let qualified = match candidate {
                Some(ns) => format!("{ns}::{name}"),
                None => name.to_owned(),
            };
            if let Some(decl) = self.functions.get(&qualified) {
                return Some(decl);
            }
        }
        None
    }

    pub fn register_impl_method(&mut self, key: ImplKey, method: ImplMethod) {
        self.impls.entry(key).or_default().push(method);
    }

    pub fn static_scope(&mut self, owner: &str) -> &mut Scope {
        self.static_scopes.entry(owner.to_owned()).or_insert_with(Scope::new)
    }
}
