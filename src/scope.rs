//! Lexical scope chain
//!
//! A [`ScopeChain`] is a stack of nested scopes, each holding three
//! independent namespaces:
//!
//! - ordinary identifiers (variables)
//! - typedef names
//! - struct tags
//!
//! The namespaces never collide: `typedef int t; t t = 1;` binds `t` both as
//! a type and as a variable, and `struct t` coexists with an ordinary `t`.
//! Lookups walk from the innermost scope outward and return the first match
//! in the requested namespace, so an inner declaration shadows an outer one
//! until its scope is left.
//!
//! The chain is generic over the ordinary-namespace payload: the parser
//! tracks bare spellings (to disambiguate type position from expression
//! position) while the evaluator stores full symbols with storage addresses.

use crate::types::Ty;
use rustc_hash::FxHashMap;

#[derive(Debug)]
pub struct Scope<O> {
    ordinary: FxHashMap<String, O>,
    typedefs: FxHashMap<String, Ty>,
    tags: FxHashMap<String, Ty>,
}

impl<O> Scope<O> {
    fn new() -> Scope<O> {
        Scope {
            ordinary: FxHashMap::default(),
            typedefs: FxHashMap::default(),
            tags: FxHashMap::default(),
        }
    }
}

#[derive(Debug)]
pub struct ScopeChain<O> {
    scopes: Vec<Scope<O>>,
}

impl<O> ScopeChain<O> {
    /// Create a chain holding only the global scope.
    pub fn new() -> ScopeChain<O> {
        ScopeChain {
            scopes: vec![Scope::new()],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Enter a nested scope. Every `enter` must be paired with a `leave`.
    pub fn enter(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Leave the innermost scope, discarding its bindings. The global scope
    /// is never popped.
    pub fn leave(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn declare_ordinary(&mut self, name: &str, value: O) {
        self.innermost().ordinary.insert(name.to_string(), value);
    }

    pub fn declare_typedef(&mut self, name: &str, ty: Ty) {
        self.innermost().typedefs.insert(name.to_string(), ty);
    }

    /// Declare a struct tag in the innermost scope. Redeclaring a tag in the
    /// same scope is accepted only if the layout is identical.
    pub fn declare_tag(&mut self, name: &str, ty: Ty) -> Result<(), String> {
        let scope = self.innermost();
        if let Some(existing) = scope.tags.get(name) {
            if *existing != ty {
                return Err(format!("tag '{}' redefined with a different layout", name));
            }
            return Ok(());
        }
        scope.tags.insert(name.to_string(), ty);
        Ok(())
    }

    pub fn resolve_ordinary(&self, name: &str) -> Option<&O> {
        self.scopes.iter().rev().find_map(|s| s.ordinary.get(name))
    }

    pub fn resolve_typedef(&self, name: &str) -> Option<&Ty> {
        self.scopes.iter().rev().find_map(|s| s.typedefs.get(name))
    }

    pub fn resolve_tag(&self, name: &str) -> Option<&Ty> {
        self.scopes.iter().rev().find_map(|s| s.tags.get(name))
    }

    /// Decide whether `name` stands for a type where the grammar allows
    /// either a type or an expression. The innermost scope that binds the
    /// spelling in either namespace wins, and an ordinary binding hides an
    /// outer typedef, which is what makes `typedef int t; t t = 1; t;`
    /// parse as a declaration followed by an expression.
    pub fn is_type_name(&self, name: &str) -> bool {
        for scope in self.scopes.iter().rev() {
            if scope.ordinary.contains_key(name) {
                return false;
            }
            if scope.typedefs.contains_key(name) {
                return true;
            }
        }
        false
    }

    /// Detach every scope above the global one. Used at function-call
    /// boundaries: the callee sees only the global scope plus its own
    /// frame, never the caller's locals.
    pub fn save_locals(&mut self) -> Vec<Scope<O>> {
        self.scopes.split_off(1)
    }

    /// Reattach scopes detached by [`ScopeChain::save_locals`].
    pub fn restore_locals(&mut self, saved: Vec<Scope<O>>) {
        self.scopes.truncate(1);
        self.scopes.extend(saved);
    }

    fn innermost(&mut self) -> &mut Scope<O> {
        self.scopes.last_mut().expect("scope chain is never empty")
    }
}

impl<O> Default for ScopeChain<O> {
    fn default() -> Self {
        ScopeChain::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_resolves_innermost_first() {
        let mut chain: ScopeChain<i32> = ScopeChain::new();
        chain.declare_ordinary("x", 1);
        chain.enter();
        chain.declare_ordinary("x", 2);
        assert_eq!(chain.resolve_ordinary("x"), Some(&2));
        chain.leave();
        assert_eq!(chain.resolve_ordinary("x"), Some(&1));
    }

    #[test]
    fn namespaces_are_independent() {
        let mut chain: ScopeChain<i32> = ScopeChain::new();
        chain.declare_typedef("t", Ty::int());
        chain.declare_ordinary("t", 7);
        chain.declare_tag("t", Ty::char()).unwrap();
        assert_eq!(chain.resolve_ordinary("t"), Some(&7));
        assert_eq!(chain.resolve_typedef("t"), Some(&Ty::int()));
        assert_eq!(chain.resolve_tag("t"), Some(&Ty::char()));
    }

    #[test]
    fn inner_tag_invisible_after_leave() {
        let mut chain: ScopeChain<()> = ScopeChain::new();
        chain.declare_tag("t", Ty::array_of(Ty::char(), 2)).unwrap();
        chain.enter();
        chain.declare_tag("t", Ty::array_of(Ty::char(), 4)).unwrap();
        assert_eq!(chain.resolve_tag("t").unwrap().size(), 4);
        chain.leave();
        assert_eq!(chain.resolve_tag("t").unwrap().size(), 2);
    }

    #[test]
    fn same_scope_tag_conflict_rejected() {
        let mut chain: ScopeChain<()> = ScopeChain::new();
        chain.declare_tag("t", Ty::int()).unwrap();
        assert!(chain.declare_tag("t", Ty::int()).is_ok());
        assert!(chain.declare_tag("t", Ty::long()).is_err());
    }

    #[test]
    fn ordinary_binding_hides_outer_typedef() {
        let mut chain: ScopeChain<()> = ScopeChain::new();
        chain.declare_typedef("t", Ty::int());
        assert!(chain.is_type_name("t"));
        chain.declare_ordinary("t", ());
        assert!(!chain.is_type_name("t"));
        chain.enter();
        // The inner scope sees the ordinary binding first.
        assert!(!chain.is_type_name("t"));
        chain.declare_typedef("t", Ty::char());
        assert!(chain.is_type_name("t"));
        chain.leave();
    }

    #[test]
    fn call_boundary_hides_caller_locals() {
        let mut chain: ScopeChain<i32> = ScopeChain::new();
        chain.declare_ordinary("g", 0);
        chain.enter();
        chain.declare_ordinary("local", 1);
        let saved = chain.save_locals();
        assert_eq!(chain.resolve_ordinary("local"), None);
        assert_eq!(chain.resolve_ordinary("g"), Some(&0));
        chain.restore_locals(saved);
        assert_eq!(chain.resolve_ordinary("local"), Some(&1));
    }
}
