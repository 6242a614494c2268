//! Scopes and Call Contexts
//!
//! Two structures live here:
//!
//! - [`ScopeArena`]: the symbol tables. Scopes form a parent chain; lookup
//!   walks upward (shadowing), assignment always writes the current frame.
//!   The arena owns every frame and hands out [`ScopeId`] handles, which is
//!   how function values can capture their defining scope without creating
//!   reference cycles: a function stored in the very scope it captures is
//!   just two ids pointing at arena slots.
//! - [`Context`]: one record per active call, linked caller-to-callee, used
//!   to render runtime tracebacks. Contexts only ever point at their parent,
//!   so the chain is acyclic and reference counted.
//!
//! Call frames are released when the call returns, unless a function value
//! was created inside them: defining a function pins its whole scope chain,
//! keeping captured frames alive for as long as the arena exists.

use crate::token::Position;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// Handle to a scope frame inside the [`ScopeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    symbols: HashMap<String, Value>,
    parent: Option<ScopeId>,
    /// Pinned frames are captured by a function value and never released
    pinned: bool,
}

/// Arena of symbol table frames.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
    /// Slots of released frames, reused by the next `new_scope`
    free: Vec<usize>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new frame whose lookups fall through to `parent`.
    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let scope = Scope {
            symbols: HashMap::new(),
            parent,
            pinned: false,
        };

        match self.free.pop() {
            Some(slot) => {
                self.scopes[slot] = scope;
                ScopeId(slot)
            }
            None => {
                self.scopes.push(scope);
                ScopeId(self.scopes.len() - 1)
            }
        }
    }

    /// Looks a name up, walking the parent chain. Inner bindings shadow
    /// outer ones.
    pub fn get(&self, scope: ScopeId, name: &str) -> Option<Value> {
        let mut current = Some(scope);
        while let Some(ScopeId(slot)) = current {
            let frame = &self.scopes[slot];
            if let Some(value) = frame.symbols.get(name) {
                return Some(value.clone());
            }
            current = frame.parent;
        }
        None
    }

    /// Binds a name in the given frame only; parent frames are never
    /// mutated through `set`.
    pub fn set(&mut self, scope: ScopeId, name: impl Into<String>, value: Value) {
        self.scopes[scope.0].symbols.insert(name.into(), value);
    }

    /// Pins `scope` and its whole parent chain, marking the frames as
    /// captured by a function value.
    pub fn pin(&mut self, scope: ScopeId) {
        let mut current = Some(scope);
        while let Some(ScopeId(slot)) = current {
            if self.scopes[slot].pinned {
                break;
            }
            self.scopes[slot].pinned = true;
            current = self.scopes[slot].parent;
        }
    }

    /// Releases a call frame for reuse; pinned frames stay alive.
    pub fn release(&mut self, scope: ScopeId) {
        let frame = &mut self.scopes[scope.0];
        if frame.pinned {
            return;
        }
        frame.symbols.clear();
        frame.parent = None;
        self.free.push(scope.0);
    }
}

/// One frame of the call chain, used for traceback rendering.
#[derive(Debug)]
pub struct Context {
    /// Name shown in tracebacks: `<program>`, a function name, or
    /// `<anonymous>`
    pub display_name: String,
    /// The calling context, `None` for the program root
    pub parent: Option<Rc<Context>>,
    /// Position of the call that entered this context
    pub parent_entry_pos: Option<Position>,
    /// The symbol table frame this context executes against
    pub scope: ScopeId,
}

impl Context {
    /// The root context a program or shell line runs in.
    pub fn program(scope: ScopeId) -> Rc<Context> {
        Rc::new(Context {
            display_name: "<program>".to_string(),
            parent: None,
            parent_entry_pos: None,
            scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Number;

    fn int(value: i64) -> Value {
        Value::Number(Number::Int(value))
    }

    #[test]
    fn lookup_walks_the_parent_chain() {
        let mut arena = ScopeArena::new();
        let outer = arena.new_scope(None);
        let inner = arena.new_scope(Some(outer));

        arena.set(outer, "x", int(1));
        assert!(matches!(
            arena.get(inner, "x"),
            Some(Value::Number(Number::Int(1)))
        ));
        assert!(arena.get(inner, "y").is_none());
    }

    #[test]
    fn assignment_shadows_without_touching_the_parent() {
        let mut arena = ScopeArena::new();
        let outer = arena.new_scope(None);
        let inner = arena.new_scope(Some(outer));

        arena.set(outer, "x", int(1));
        arena.set(inner, "x", int(2));

        assert!(matches!(
            arena.get(inner, "x"),
            Some(Value::Number(Number::Int(2)))
        ));
        assert!(matches!(
            arena.get(outer, "x"),
            Some(Value::Number(Number::Int(1)))
        ));
    }

    #[test]
    fn released_frames_are_reused_but_pinned_frames_are_not() {
        let mut arena = ScopeArena::new();
        let global = arena.new_scope(None);

        let frame = arena.new_scope(Some(global));
        arena.release(frame);
        let reused = arena.new_scope(Some(global));
        assert_eq!(frame, reused);

        arena.pin(reused);
        arena.release(reused);
        let fresh = arena.new_scope(Some(global));
        assert_ne!(reused, fresh);
    }
}
