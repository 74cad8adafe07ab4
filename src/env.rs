//! Lexical environments.
//!
//! An environment is a persistent chain of single-binding frames, most
//! recent first. `extend` shares the old chain, so environments held by
//! other closures never see new bindings; each frame's value lives in an
//! interior-mutable cell, so `modify` is visible to every environment
//! sharing that frame. This split is what makes `set!`, top-level
//! `define`, and letrec fixup behave while `let` extension stays
//! invisible to older closures.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

struct Frame {
    name: String,
    // None is a letrec placeholder that has not been filled yet
    cell: RefCell<Option<Value>>,
    rest: Option<Rc<Frame>>,
}

/// A handle to a chain of frames. Cloning is cheap and shares the chain.
#[derive(Clone, Default)]
pub struct Env {
    head: Option<Rc<Frame>>,
}

impl Env {
    pub fn new() -> Self {
        Env { head: None }
    }

    /// Look a name up, most recently extended frame first; the first match
    /// wins. An unfilled letrec placeholder reads as absent.
    pub fn find(&self, name: &str) -> Option<Value> {
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            if f.name == name {
                return f.cell.borrow().clone();
            }
            frame = f.rest.as_deref();
        }
        None
    }

    /// New environment one frame longer. Holders of `self` are unaffected.
    pub fn extend(&self, name: impl Into<String>, value: Value) -> Env {
        self.push(name.into(), Some(value))
    }

    /// Extend with an unfilled binding (letrec's first pass).
    pub fn extend_uninit(&self, name: impl Into<String>) -> Env {
        self.push(name.into(), None)
    }

    fn push(&self, name: String, value: Option<Value>) -> Env {
        Env {
            head: Some(Rc::new(Frame {
                name,
                cell: RefCell::new(value),
                rest: self.head.clone(),
            })),
        }
    }

    /// Overwrite the first binding of `name` in place. The write is seen by
    /// every environment sharing that frame. Returns false when the name is
    /// not bound at all.
    pub fn modify(&self, name: &str, value: Value) -> bool {
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            if f.name == name {
                *f.cell.borrow_mut() = Some(value);
                return true;
            }
            frame = f.rest.as_deref();
        }
        false
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        let mut frame = self.head.as_deref();
        while let Some(fr) = frame {
            names.push(fr.name.as_str());
            frame = fr.rest.as_deref();
        }
        write!(f, "Env[{}]", names.join(" "))
    }
}
