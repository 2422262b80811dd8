//! The scope tree. Generalizes the teacher's `Rib`/`RibId`/`ScopeTree`
//! (`faxc-sem/src/scope.rs`, which only tracks a single "current rib"
//! cursor) into a full arena with parent *and* children links, because
//! `padac-gen`'s static-link search needs to walk from an arbitrary
//! reference's enclosing region up to an arbitrary ancestor's region, not
//! just push/pop a cursor.
//!
//! Region numbering is drawn from the arena's own insertion order, which
//! is exactly the "single monotonic counter shared across the whole
//! tree" spec.md calls for — matching
//! `examples/original_source/parser/symbols.go`'s `newScope`, where every
//! child scope increments the *same* `*parent.regionCounter` the root
//! created.

use padac_util::{define_idx, IndexVec, Symbol};
use rustc_hash::FxHashMap;

define_idx!(RegionId);
define_idx!(SymbolId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    Integer,
    Character,
    Boolean,
    Record(Symbol),
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Symbol,
    pub ty: TypeName,
    pub is_in: bool,
    pub is_out: bool,
}

#[derive(Debug, Clone)]
pub enum Sym {
    Variable {
        name: Symbol,
        ty: TypeName,
        is_in: bool,
        is_out: bool,
        is_loop_index: bool,
        /// True for a parameter, false for a local. `padac-gen` needs this
        /// to pick which of the two frame-offset formulas in
        /// `examples/original_source/parser/asm.go` applies: a parameter
        /// sits above `R11` in the caller-pushed argument area, a local
        /// sits below it in the callee's own reserved stack space, and the
        /// two use unrelated offset arithmetic despite sharing this same
        /// monotonically increasing `offset` counter.
        is_param: bool,
        /// Offset from the frame pointer, assigned in declaration order
        /// by the resolver (see `Resolver::declare_var`).
        offset: i32,
    },
    Function {
        name: Symbol,
        params: Vec<Param>,
        return_type: TypeName,
        label: String,
    },
    Procedure {
        name: Symbol,
        params: Vec<Param>,
        label: String,
    },
    Record {
        name: Symbol,
        fields: Vec<(Symbol, TypeName)>,
    },
}

impl Sym {
    pub fn name(&self) -> Symbol {
        match self {
            Sym::Variable { name, .. }
            | Sym::Function { name, .. }
            | Sym::Procedure { name, .. }
            | Sym::Record { name, .. } => *name,
        }
    }

    pub fn param_count(&self) -> usize {
        match self {
            Sym::Function { params, .. } | Sym::Procedure { params, .. } => params.len(),
            _ => 0,
        }
    }
}

#[derive(Debug)]
pub struct Scope {
    pub region: RegionId,
    pub depth: u32,
    pub parent: Option<RegionId>,
    pub children: Vec<RegionId>,
    pub table: FxHashMap<Symbol, Vec<SymbolId>>,
}

/// Arena owning every scope created during resolution, plus the symbol
/// table entries they reference. `RegionId`s are never reused and are
/// assigned strictly in scope-creation order.
#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: IndexVec<RegionId, Scope>,
    symbols: IndexVec<SymbolId, Sym>,
    symbol_owner: IndexVec<SymbolId, RegionId>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the file (root) scope. Must be called exactly once, first.
    pub fn new_root(&mut self) -> RegionId {
        debug_assert!(self.scopes.is_empty(), "root scope created twice");
        self.scopes.push(Scope {
            region: RegionId(0),
            depth: 0,
            parent: None,
            children: Vec::new(),
            table: FxHashMap::default(),
        })
    }

    pub fn new_child(&mut self, parent: RegionId) -> RegionId {
        let depth = self.scopes[parent].depth + 1;
        let id = self.scopes.push(Scope {
            region: RegionId(0), // patched below
            depth,
            parent: Some(parent),
            children: Vec::new(),
            table: FxHashMap::default(),
        });
        self.scopes[id].region = id;
        self.scopes[parent].children.push(id);
        id
    }

    pub fn scope(&self, region: RegionId) -> &Scope {
        &self.scopes[region]
    }

    pub fn add_symbol(&mut self, region: RegionId, sym: Sym) -> SymbolId {
        let name = sym.name();
        let id = self.symbols.push(sym);
        self.symbol_owner.push(region);
        self.scopes[region].table.entry(name).or_default().push(id);
        id
    }

    pub fn symbol(&self, id: SymbolId) -> &Sym {
        &self.symbols[id]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Sym {
        &mut self.symbols[id]
    }

    pub fn owner_region(&self, id: SymbolId) -> RegionId {
        self.symbol_owner[id]
    }

    /// Walks from `from` up through `parent` links, returning the first
    /// scope (and its candidate symbol ids) whose table binds `name`.
    /// Mirrors `symbols.go`'s implicit lexical-scoping behavior: a name
    /// resolves to the nearest enclosing declaration.
    pub fn resolve(&self, from: RegionId, name: Symbol) -> Option<(RegionId, &[SymbolId])> {
        let mut current = Some(from);
        while let Some(region) = current {
            if let Some(ids) = self.scopes[region].table.get(&name) {
                return Some((region, ids));
            }
            current = self.scopes[region].parent;
        }
        None
    }

    /// The current maximum `Variable` frame offset recorded directly in
    /// `region`'s own table, used by the resolver to compute the next
    /// variable's offset. Matches `Scope.getCurrentOffset` in the
    /// original (`symbols.go`), which only looks at the scope's own
    /// table, never ancestors.
    pub fn current_max_offset(&self, region: RegionId) -> i32 {
        self.scopes[region]
            .table
            .values()
            .flatten()
            .filter_map(|&id| match &self.symbols[id] {
                Sym::Variable { offset, .. } => Some(*offset),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}
