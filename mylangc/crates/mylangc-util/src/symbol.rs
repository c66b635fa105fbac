//! String interning for identifiers, keywords, and labels.
//!
//! A [`Symbol`] is a 4-byte handle into a global string table. Interning
//! means two identical identifiers compare in O(1) (index equality) instead
//! of O(n) (byte comparison), which matters once the same variable name is
//! looked up in every enclosing scope during semantic analysis.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;

thread_local! {
    static TABLE: RefCell<SymbolTable> = RefCell::new(SymbolTable::new());
}

/// An interned string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Intern `s`, returning the existing symbol if already interned.
    pub fn intern(s: &str) -> Self {
        TABLE.with(|t| t.borrow_mut().intern(s))
    }

    /// Look up the text behind this symbol.
    pub fn as_str(self) -> &'static str {
        TABLE.with(|t| t.borrow().get(self))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backing storage for interned strings. Strings are leaked to get a
/// `'static` lifetime; the compiler runs once per process so the leaked
/// memory is bounded by source size and never needs reclaiming.
struct SymbolTable {
    index: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl SymbolTable {
    fn new() -> Self {
        Self {
            index: FxHashMap::default(),
            strings: Vec::new(),
        }
    }

    fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&idx) = self.index.get(s) {
            return Symbol(idx);
        }
        let leaked: &'static str = Box::leak(s.to_string().into_boxed_str());
        let idx = self.strings.len() as u32;
        self.strings.push(leaked);
        self.index.insert(leaked, idx);
        Symbol(idx)
    }

    fn get(&self, sym: Symbol) -> &'static str {
        self.strings[sym.0 as usize]
    }
}
