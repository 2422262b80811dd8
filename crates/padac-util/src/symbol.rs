//! String interning.
//!
//! `Symbol` is a compact, `Copy`, `Hash`-cheap handle to a string held in a
//! [`StringTable`]. The resolver and scope tree use `Symbol` (not `String`)
//! as hash-map keys so that repeated identifier lookups during a deep
//! static-link search never re-hash or re-compare full strings.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHashMap;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    index: u32,
}

impl Symbol {
    pub fn as_u32(self) -> u32 {
        self.index
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.index)
    }
}

/// Owns the backing storage for every [`Symbol`] minted during a
/// compilation. Strings are interned for the lifetime of the table and
/// never removed (leak-on-intern, matching the teacher's `StringTable`);
/// a single compiler invocation never interns enough identifiers for this
/// to matter.
pub struct StringTable {
    index: FxHashMap<u64, Vec<(u32, &'static str)>>,
    strings: Vec<&'static str>,
    arena: bumpalo::Bump,
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            index: FxHashMap::default(),
            strings: Vec::new(),
            arena: bumpalo::Bump::new(),
        }
    }

    pub fn intern(&mut self, string: &str) -> Symbol {
        let hash = Self::hash_string(string);

        if let Some(bucket) = self.index.get(&hash) {
            for &(idx, existing) in bucket {
                if existing == string {
                    return Symbol { index: idx };
                }
            }
        }

        // Leaked once per distinct spelling; see module doc for why that's fine.
        let interned: &'static str = Box::leak(string.to_string().into_boxed_str());
        let idx = self.strings.len() as u32;
        self.strings.push(interned);
        self.index.entry(hash).or_default().push((idx, interned));

        Symbol { index: idx }
    }

    pub fn get(&self, symbol: Symbol) -> &str {
        self.strings[symbol.index as usize]
    }

    fn hash_string(string: &str) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        string.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_spelling_interns_to_the_same_symbol() {
        let mut table = StringTable::new();
        let a = table.intern("counter");
        let b = table.intern("counter");
        let c = table.intern("bound");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.get(a), "counter");
    }
}
