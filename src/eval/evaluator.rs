//! The Evaluator's owning struct (spec §4.4, component C4): one
//! [`Environment`], one [`Scheduler`], and the bookkeeping needed to
//! know which function a `?` or automatic yield check is currently
//! inside.
use std::collections::HashMap;

use crate::ast::{
    Ast, EnumDecl, FunctionDecl, InterfaceDecl, Item, Position, StructDecl, TypeParamDecl,
    UnionDecl, VarDecl as AstVarDecl,
};
use crate::diagnostics::CbError;
use crate::env::Environment;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::types::Type;
use crate::value::Value;

use super::control::Unwind;

/// Per-task bookkeeping the scheduler itself doesn't track: the
/// declared return type of the function the task is currently inside
/// (consulted when desugaring `?`, spec §4.4), and whether the task is
/// running inside an `async` call graph (consulted for automatic
/// yield insertion, spec §4.6).
#[derive(Debug, Clone, Default)]
pub struct TaskFrame {
    pub return_type: Type,
    pub in_async_context: bool,
}

/// An `async` call that has been handed a [`TaskHandle`] and enqueued,
/// but whose body has not run yet (spec §4.6 "Task lifecycle: spawned
/// -> ready -> running -> ... -> resolved").
pub(super) struct PendingCall {
    pub decl: FunctionDecl,
    pub args: Vec<Value>,
    pub self_value: Option<Value>,
}

pub struct Evaluator {
    pub env: Environment,
    pub scheduler: Scheduler,
    pub frames: HashMap<TaskHandle, TaskFrame>,
    pub(super) pending: HashMap<TaskHandle, PendingCall>,
    pub(super) struct_decls: HashMap<String, StructDecl>,
    pub(super) enum_decls: HashMap<String, EnumDecl>,
    pub(super) union_decls: HashMap<String, UnionDecl>,
    pub(super) interface_decls: HashMap<String, InterfaceDecl>,
    pub(super) current_task: Option<TaskHandle>,
    /// Every value handed to `print`/`println`/`printf` (spec §6 print
    /// API), accumulated for tests and callers that want the
    /// program's full output rather than watching stdout.
    pub output: String,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            scheduler: Scheduler::new(),
            frames: HashMap::new(),
            pending: HashMap::new(),
            struct_decls: HashMap::new(),
            enum_decls: HashMap::new(),
            union_decls: HashMap::new(),
            interface_decls: HashMap::new(),
            current_task: None,
            output: String::new(),
        }
    }

    /// Register every top-level declaration from a parsed unit (spec
    /// §6 "Parser contract"): functions, impls, typedefs and globals.
    /// Struct/enum/union/interface declarations register their shape
    /// into the type registry so later `resolve()` calls see them.
    pub fn load(&mut self, ast: &Ast) -> Result<(), CbError> {
        if self.enum_decls.is_empty() {
            self.register_builtins();
        }
        for item in &ast.items {
            self.register_item(item)?;
        }
        Ok(())
    }

    /// Pre-register the built-in generic `Option<T>`/`Result<T, E>`
    /// enums (spec §3 "discriminated enums (Option/Result built-in)")
    /// so `Some`/`None`/`Ok`/`Err` resolve before any user code runs,
    /// and so later redefinition attempts have something to collide
    /// with (spec §4.8 "Attempting to redefine the built-in
    /// `Option`/`Result` types is an error").
    fn register_builtins(&mut self) {
        let pos = Position::new("<builtin>", 0, 0);
        let t = || Type::TypeParam { name: "T".to_owned(), bounds: vec![] };
        let option_decl = EnumDecl {
            name: "Option".to_owned(),
            type_params: vec![TypeParamDecl { name: "T".to_owned(), bounds: vec![] }],
            variants: vec![("Some".to_owned(), Some(t()), None), ("None".to_owned(), None, None)],
            exported: true,
            position: pos.clone(),
        };
        let e = || Type::TypeParam { name: "E".to_owned(), bounds: vec![] };
        let result_decl = EnumDecl {
            name: "Result".to_owned(),
            type_params: vec![
                TypeParamDecl { name: "T".to_owned(), bounds: vec![] },
                TypeParamDecl { name: "E".to_owned(), bounds: vec![] },
            ],
            variants: vec![("Ok".to_owned(), Some(t()), None), ("Err".to_owned(), Some(e()), None)],
            exported: true,
            position: pos,
        };
        for decl in [option_decl, result_decl] {
            let variants = decl.variants.iter().map(|(n, t, _)| (n.clone(), t.clone())).collect();
            self.env
                .type_registry
                .define(decl.name.clone(), Type::Enum { qualified_name: decl.name.clone(), variants });
            self.enum_decls.insert(decl.name.clone(), decl);
        }
    }

    fn register_item(&mut self, item: &Item) -> Result<(), CbError> {
        match item {
            Item::Function(decl) => {
                self.env.register_function(decl.name.clone(), decl.clone());
            }
            Item::Enum(decl) if decl.name == "Option" || decl.name == "Result" => {
                return Err(CbError::RedefineBuiltin {
                    name: decl.name.clone(),
                    position: Some(decl.position.clone()),
                });
            }
            Item::Struct(decl) => {
                let members = decl
                    .members
                    .iter()
                    .map(|m| (m.name.clone(), m.type_annotation.clone(), None))
                    .collect();
                self.env.type_registry.define(
                    decl.name.clone(),
                    Type::Struct { qualified_name: decl.name.clone(), members },
                );
                self.struct_decls.insert(decl.name.clone(), decl.clone());
            }
            Item::Enum(decl) => {
                let variants =
                    decl.variants.iter().map(|(n, t, _)| (n.clone(), t.clone())).collect();
                self.env.type_registry.define(
                    decl.name.clone(),
                    Type::Enum { qualified_name: decl.name.clone(), variants },
                );
                self.enum_decls.insert(decl.name.clone(), decl.clone());
            }
            Item::Union(decl) => {
                let allowed = decl
                    .alternatives
                    .iter()
                    .map(|alt| match alt {
                        crate::ast::UnionAlternative::IntLiteral(v) => {
                            crate::types::AllowedAlternative::IntLiteral(*v)
                        }
                        crate::ast::UnionAlternative::StringLiteral(s) => {
                            crate::types::AllowedAlternative::StringLiteral(s.clone())
                        }
                        crate::ast::UnionAlternative::BoolLiteral(b) => {
                            crate::types::AllowedAlternative::BoolLiteral(*b)
                        }
                        crate::ast::UnionAlternative::Type(t) => {
                            crate::types::AllowedAlternative::Type(Box::new(t.clone()))
                        }
                    })
                    .collect();
                self.env.type_registry.define(
                    decl.name.clone(),
                    Type::Union { qualified_name: decl.name.clone(), allowed },
                );
                self.union_decls.insert(decl.name.clone(), decl.clone());
            }
            Item::Interface(decl) => {
                let methods = decl
                    .methods
                    .iter()
                    .map(|m| crate::types::FunctionSignature {
                        params: m
                            .params
                            .iter()
                            .map(|p| (p.name.clone(), p.type_annotation.clone(), None))
                            .collect(),
                        varargs: false,
                        return_type: Box::new(m.return_type.clone()),
                        is_async: m.is_async,
                    })
                    .collect();
                self.env
                    .type_registry
                    .define(decl.name.clone(), Type::Interface { name: decl.name.clone(), methods });
                self.interface_decls.insert(decl.name.clone(), decl.clone());
            }
            Item::Impl(block) => {
                for method in &block.methods {
                    self.env.register_impl_method(
                        (block.interface_name.clone(), block.type_name.clone()),
                        crate::env::ImplMethod { name: method.name.clone(), decl: method.clone() },
                    );
                }
            }
            Item::Typedef(decl) => {
                self.env.type_registry.define(decl.name.clone(), decl.target.clone());
            }
            Item::Global(decl) => self.declare_global(decl)?,
            Item::Module(module) => {
                for item in &module.items {
                    self.register_item(item)?;
                }
            }
            Item::Using(using) => self.env.namespaces.add_using(using.namespace.clone()),
            Item::Import(_) => {
                // Module loading is an external collaborator (spec §1);
                // the loader hands this crate already-merged ASTs.
            }
        }
        Ok(())
    }

    fn declare_global(&mut self, decl: &AstVarDecl) -> Result<(), CbError> {
        let value = match &decl.initializer {
            Some(expr) => self.eval_expr_top(expr)?,
            None => self.default_value(&decl.type_annotation).map_err(|unwind| match unwind {
                Unwind::Error(e) => e,
                Unwind::EarlyReturn(_) => unreachable!("default_value never early-returns"),
            })?,
        };
        let mut var = crate::env::Variable::new(
            decl.name.clone(),
            decl.type_annotation.clone(),
            value,
            decl.position.clone(),
        );
        var.is_const = decl.is_const;
        self.env.globals.declare(var);
        Ok(())
    }

    /// Evaluate a global initializer outside of any running task; used
    /// only during [`Evaluator::load`].
    fn eval_expr_top(&mut self, expr: &crate::ast::Expr) -> Result<Value, CbError> {
        let root = self.scheduler.current().unwrap_or(TaskHandle(u64::MAX));
        self.eval_expr(expr, root).map_err(|unwind| match unwind {
            Unwind::Error(e) => e,
            Unwind::EarlyReturn(_) => CbError::UnknownType {
                name: "top-level `?`".to_owned(),
                position: Some(expr.position().clone()),
            },
        })
    }

    /// Run `name`'s body to completion as the root task, draining
    /// nothing else automatically: background tasks that are never
    /// `await`ed are left un-started (spec §4.6 "If the root task
    /// finishes, the program ends").
    pub fn run_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value, CbError> {
        let root = self.scheduler.spawn_root();
        let decl = self
            .env
            .lookup_function(name)
            .cloned()
            .ok_or_else(|| CbError::UndefinedFunction { name: name.to_owned(), position: None })?;
        self.frames.insert(
            root,
            TaskFrame { return_type: decl.return_type.clone(), in_async_context: decl.is_async },
        );
        let (value, _) = self
            .call_function(&decl, args, None, root)
            .map_err(|unwind| match unwind {
                Unwind::Error(e) => e,
                Unwind::EarlyReturn(_) => unreachable!("`?` cannot escape the root call"),
            })?;
        Ok(value)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
