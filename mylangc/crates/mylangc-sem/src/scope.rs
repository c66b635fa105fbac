//! Lexically scoped symbol table.

use mylangc_ast::Type;
use mylangc_util::Symbol;
use rustc_hash::FxHashMap;

/// What a name in scope refers to.
#[derive(Debug, Clone)]
pub enum Binding {
    Variable(Type),
    Function(FunctionSig),
    /// The enclosing function's return type, stored under the
    /// `__return_type__` sentinel key.
    ReturnType(Type),
}

#[derive(Debug, Clone)]
pub struct FunctionSig {
    pub return_type: Type,
    pub params: Vec<(Symbol, Type)>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScopeId(u32);

struct Scope {
    bindings: FxHashMap<Symbol, Binding>,
    parent: Option<ScopeId>,
}

/// A stack of nested scopes, each holding its own bindings plus a link to
/// its parent. `lookup` walks to the root; `lookup_local` is scope-only.
pub struct ScopeTree {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl ScopeTree {
    pub fn new() -> Self {
        let root = Scope {
            bindings: FxHashMap::default(),
            parent: None,
        };
        Self {
            scopes: vec![root],
            current: ScopeId(0),
        }
    }

    pub fn enter_scope(&mut self) {
        let parent = self.current;
        self.scopes.push(Scope {
            bindings: FxHashMap::default(),
            parent: Some(parent),
        });
        self.current = ScopeId(self.scopes.len() as u32 - 1);
    }

    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current.0 as usize].parent {
            self.current = parent;
        }
    }

    /// Installs `name` in the current scope. Returns `false` (and leaves
    /// the scope untouched) if `name` is already defined locally; callers
    /// that need a redeclaration error check `lookup_local` themselves.
    pub fn define(&mut self, name: Symbol, binding: Binding) -> bool {
        let scope = &mut self.scopes[self.current.0 as usize];
        if scope.bindings.contains_key(&name) {
            return false;
        }
        scope.bindings.insert(name, binding);
        true
    }

    pub fn lookup_local(&self, name: Symbol) -> Option<&Binding> {
        self.scopes[self.current.0 as usize].bindings.get(&name)
    }

    pub fn lookup(&self, name: Symbol) -> Option<&Binding> {
        let mut id = Some(self.current);
        while let Some(ScopeId(idx)) = id {
            let scope = &self.scopes[idx as usize];
            if let Some(binding) = scope.bindings.get(&name) {
                return Some(binding);
            }
            id = scope.parent;
        }
        None
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
