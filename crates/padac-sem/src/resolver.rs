//! Depth-first walk over the AST building the scope tree, symbol tables,
//! and procedure/function labels, plus the identifier-existence/arity
//! checks SPEC_FULL.md's symbol-and-scope duties add as a supplement to
//! the distilled spec.
//!
//! Grounded on `examples/original_source/parser/symbols.go`'s
//! `dfsSymbols`/`newScope`/`addParam`/`addParamProc`/`handleInOut`/
//! `ReadAST`. One deliberate departure: the original defers all
//! identifier resolution to codegen's `goUpScope` (which simply panics on
//! a miss); this pass resolves and validates references itself, as a
//! single front-loaded check, and still leaves `node_symbol` populated so
//! `padac-gen` never has to re-resolve anything.

use rustc_hash::FxHashMap;

use padac_par::{Ast, NodeId};
use padac_util::{Handler, Lexicon, Span, StringTable, Symbol};

use crate::error::SemError;
use crate::scope::{Param, RegionId, ScopeTree, Sym, SymbolId, TypeName};

/// Everything the resolver produces, handed off to `padac-gen`.
pub struct Resolution {
    pub scopes: ScopeTree,
    pub strings: StringTable,
    pub node_scope: FxHashMap<NodeId, RegionId>,
    pub node_label: FxHashMap<NodeId, String>,
    pub node_symbol: FxHashMap<NodeId, SymbolId>,
    /// The `Function`/`Procedure` symbol that owns each non-file region,
    /// i.e. the scope's own activation-record shape. `padac-gen` needs
    /// this to know a scope's parameter count when computing a
    /// parameter's caller-pushed frame offset (see `asm.go`'s
    /// `16+fnc.ParamCount*4`); the file region and `for`-loop regions
    /// have no entry.
    pub region_owner: FxHashMap<RegionId, SymbolId>,
}

pub fn resolve(ast: &Ast, lexicon: &Lexicon, handler: &mut Handler) -> Resolution {
    let mut resolver = Resolver {
        lexicon,
        handler,
        strings: StringTable::new(),
        scopes: ScopeTree::new(),
        record_types: FxHashMap::default(),
        access_types: FxHashMap::default(),
        node_scope: FxHashMap::default(),
        node_label: FxHashMap::default(),
        node_symbol: FxHashMap::default(),
        region_owner: FxHashMap::default(),
        label_counters: FxHashMap::default(),
    };
    let file_region = resolver.scopes.new_root();
    resolver.declare_builtin_put(file_region);
    resolver.walk(ast, ast.root(), file_region);
    Resolution {
        scopes: resolver.scopes,
        strings: resolver.strings,
        node_scope: resolver.node_scope,
        node_label: resolver.node_label,
        node_symbol: resolver.node_symbol,
        region_owner: resolver.region_owner,
    }
}

struct Resolver<'a, 'h> {
    lexicon: &'a Lexicon,
    handler: &'h mut Handler,
    strings: StringTable,
    scopes: ScopeTree,
    record_types: FxHashMap<Symbol, SymbolId>,
    /// `type T is access U` resolves transparently to `U`'s `TypeName` —
    /// genuine heap/pointer indirection is out of scope, so an access
    /// type is sized and typed exactly like the thing it points to.
    access_types: FxHashMap<Symbol, TypeName>,
    node_scope: FxHashMap<NodeId, RegionId>,
    node_label: FxHashMap<NodeId, String>,
    node_symbol: FxHashMap<NodeId, SymbolId>,
    region_owner: FxHashMap<RegionId, SymbolId>,
    /// One counter per distinct name, so two different nested procedures
    /// that happen to share a spelling still get distinct, deterministic
    /// assembly labels (the original emits the bare name and relies on
    /// Ada scoping alone, which does not guarantee label uniqueness).
    label_counters: FxHashMap<Symbol, u32>,
}

impl<'a, 'h> Resolver<'a, 'h> {
    fn spelling(&self, ast: &Ast, node: NodeId) -> &str {
        match ast.literal(node) {
            Some(idx) => self.lexicon.get(idx),
            None => ast.kind(node),
        }
    }

    fn intern_ident(&mut self, ast: &Ast, node: NodeId) -> Symbol {
        let text = self.spelling(ast, node).to_string();
        self.strings.intern(&text)
    }

    fn fresh_label(&mut self, sym: Symbol) -> String {
        let n = *self.label_counters.entry(sym).or_insert(0);
        self.label_counters.insert(sym, n + 1);
        if n == 0 {
            self.strings.get(sym).to_string()
        } else {
            format!("{}_{}", self.strings.get(sym), n)
        }
    }

    fn report_unknown(&mut self, name: Symbol) {
        self.handler.error(
            SemError::UnknownIdentifier(self.strings.get(name).to_string()).to_string(),
            Span::DUMMY,
        );
    }

    /// Registers the built-in `Put`-equivalent output procedure into file
    /// scope before the walk begins, matching spec.md's requirement that
    /// `put`/`put_line` resolve without an explicit declaration.
    fn declare_builtin_put(&mut self, file_region: RegionId) {
        let name = self.strings.intern("put");
        let item = self.strings.intern("item");
        self.scopes.add_symbol(
            file_region,
            Sym::Procedure {
                name,
                params: vec![Param {
                    name: item,
                    ty: TypeName::Integer,
                    is_in: true,
                    is_out: false,
                }],
                label: "put".to_string(),
            },
        );
    }

    fn type_from_ident(&mut self, ast: &Ast, node: NodeId) -> TypeName {
        let text = self.spelling(ast, node).to_string();
        match text.as_str() {
            "integer" => TypeName::Integer,
            "character" => TypeName::Character,
            "boolean" => TypeName::Boolean,
            _ => {
                let sym = self.strings.intern(&text);
                if let Some(&target) = self.access_types.get(&sym) {
                    return target;
                }
                if !self.record_types.contains_key(&sym) {
                    self.handler
                        .error(SemError::UnknownType(text).to_string(), Span::DUMMY);
                }
                TypeName::Record(sym)
            }
        }
    }

    fn type_size(&self, ty: &TypeName) -> i32 {
        match ty {
            TypeName::Integer | TypeName::Character | TypeName::Boolean => 4,
            TypeName::Record(sym) => match self.record_types.get(sym) {
                Some(&id) => match self.scopes.symbol(id) {
                    Sym::Record { fields, .. } => {
                        fields.iter().map(|(_, fty)| self.type_size(fty)).sum()
                    }
                    _ => 4,
                },
                None => 4,
            },
        }
    }

    // -- dispatch -------------------------------------------------------------

    fn walk(&mut self, ast: &Ast, node: NodeId, scope: RegionId) {
        self.node_scope.insert(node, scope);
        match ast.kind(node) {
            "file" => self.walk_file(ast, node, scope),
            "function" => self.walk_subprogram(ast, node, scope, true),
            "procedure" => self.walk_subprogram(ast, node, scope, false),
            "for" => self.walk_for(ast, node, scope),
            "var" => self.walk_var(ast, node, scope),
            "type" => self.walk_type(ast, node, scope),
            ":=" => self.walk_assign(ast, node, scope),
            "call" => self.walk_call(ast, node, scope),
            "access" => self.walk_access(ast, node, scope),
            "ident" => self.walk_reference(ast, node, scope),
            _ => self.walk_children(ast, node, scope),
        }
    }

    fn walk_children(&mut self, ast: &Ast, node: NodeId, scope: RegionId) {
        for &child in ast.children(node) {
            self.walk(ast, child, scope);
        }
    }

    fn walk_file(&mut self, ast: &Ast, node: NodeId, scope: RegionId) {
        let children = ast.children(node);
        let (name, decl, body) = (children[0], children[1], children[2]);
        self.node_scope.insert(name, scope);
        self.node_scope.insert(decl, scope);
        for &d in ast.children(decl) {
            self.walk(ast, d, scope);
        }
        self.walk(ast, body, scope);
    }

    fn walk_subprogram(&mut self, ast: &Ast, node: NodeId, scope: RegionId, is_function: bool) {
        let children = ast.children(node);
        let name_node = children[0];
        let mut idx = 1;

        let region = self.scopes.new_child(scope);

        let has_params = children.len() > idx && ast.kind(children[idx]) == "params";
        let mut params = Vec::new();
        if has_params {
            for &p in ast.children(children[idx]) {
                params.extend(self.declare_param(ast, p, region));
            }
            idx += 1;
        }

        let return_type = if is_function {
            let rt_node = children[idx];
            self.node_scope.insert(rt_node, scope);
            let rt = self.type_from_ident(ast, rt_node);
            idx += 1;
            rt
        } else {
            TypeName::Integer
        };

        let decl_node = children[idx];
        let body_node = children[idx + 1];

        let name_sym = self.intern_ident(ast, name_node);
        self.node_scope.insert(name_node, scope);
        let label = self.fresh_label(name_sym);
        self.node_label.insert(node, label.clone());

        let sym = if is_function {
            Sym::Function {
                name: name_sym,
                params,
                return_type,
                label,
            }
        } else {
            Sym::Procedure {
                name: name_sym,
                params,
                label,
            }
        };
        // Registered unconditionally in the *parent* scope. The original
        // only adds a symbol-table entry for procedures that declare at
        // least one parameter (`addParamProc` is never called otherwise);
        // a parameterless nested procedure is normalized here to get an
        // entry too, so it can actually be called — see DESIGN.md.
        let symbol_id = self.scopes.add_symbol(scope, sym);
        self.node_symbol.insert(node, symbol_id);
        self.region_owner.insert(region, symbol_id);

        self.node_scope.insert(decl_node, region);
        for &d in ast.children(decl_node) {
            self.walk(ast, d, region);
        }
        self.walk(ast, body_node, region);
    }

    fn declare_param(&mut self, ast: &Ast, node: NodeId, region: RegionId) -> Vec<Param> {
        let children = ast.children(node);
        let mut idx = 0;
        let name_nodes: Vec<NodeId> = if ast.kind(children[idx]) == "sameType" {
            ast.children(children[idx]).to_vec()
        } else {
            vec![children[idx]]
        };
        idx += 1;

        let (is_in, is_out) = match ast.kind(children[idx]) {
            "in" => {
                idx += 1;
                (true, false)
            }
            "out" => {
                idx += 1;
                (false, true)
            }
            "inout" => {
                idx += 1;
                (true, true)
            }
            // An Ada parameter with no explicit mode defaults to `in`.
            _ => (true, false),
        };

        let ty_node = children[idx];
        let ty = self.type_from_ident(ast, ty_node);
        self.node_scope.insert(ty_node, region);

        let mut out = Vec::with_capacity(name_nodes.len());
        for &n in &name_nodes {
            self.node_scope.insert(n, region);
            let name = self.intern_ident(ast, n);
            let offset = self.scopes.current_max_offset(region) + 4;
            let id = self.scopes.add_symbol(
                region,
                Sym::Variable {
                    name,
                    ty,
                    is_in,
                    is_out,
                    is_loop_index: false,
                    is_param: true,
                    offset,
                },
            );
            self.node_symbol.insert(n, id);
            out.push(Param { name, ty, is_in, is_out });
        }
        out
    }

    fn walk_for(&mut self, ast: &Ast, node: NodeId, scope: RegionId) {
        let children = ast.children(node);
        let (index_node, direction_node, lo, hi, body) =
            (children[0], children[1], children[2], children[3], children[4]);

        let region = self.scopes.new_child(scope);
        self.node_scope.insert(index_node, region);
        self.node_scope.insert(direction_node, region);

        let name = self.intern_ident(ast, index_node);
        let id = self.scopes.add_symbol(
            region,
            Sym::Variable {
                name,
                ty: TypeName::Integer,
                is_in: false,
                is_out: false,
                is_loop_index: true,
                is_param: false,
                // The loop counter lives in a fixed frame slot codegen
                // reserves directly when it sets up the for-frame; this
                // offset is never consulted.
                offset: 0,
            },
        );
        self.node_symbol.insert(index_node, id);

        self.walk(ast, lo, region);
        self.walk(ast, hi, region);
        self.walk(ast, body, region);
    }

    fn walk_var(&mut self, ast: &Ast, node: NodeId, scope: RegionId) {
        let children = ast.children(node);
        let name_group = children[0];
        let ty_node = children[1];
        let init = children.get(2).copied();

        let ty = self.type_from_ident(ast, ty_node);
        self.node_scope.insert(ty_node, scope);
        self.node_scope.insert(name_group, scope);

        let name_nodes: Vec<NodeId> = if ast.kind(name_group) == "sameType" {
            ast.children(name_group).to_vec()
        } else {
            vec![name_group]
        };

        for &n in &name_nodes {
            self.node_scope.insert(n, scope);
            let name = self.intern_ident(ast, n);
            let size = self.type_size(&ty);
            let offset = self.scopes.current_max_offset(scope) + size;
            let id = self.scopes.add_symbol(
                scope,
                Sym::Variable {
                    name,
                    ty,
                    is_in: false,
                    is_out: false,
                    is_loop_index: false,
                    is_param: false,
                    offset,
                },
            );
            self.node_symbol.insert(n, id);
        }

        // A shared initializer (`a, b : integer := f(x);`) is only
        // validated once here; the original's `ReadVar` re-evaluates it
        // once per grouped name, but that is a codegen-time instruction-
        // count concern, not a semantic one.
        if let Some(init) = init {
            self.walk(ast, init, scope);
        }
    }

    fn walk_type(&mut self, ast: &Ast, node: NodeId, scope: RegionId) {
        let children = ast.children(node);
        let name_node = children[0];
        let name = self.intern_ident(ast, name_node);
        self.node_scope.insert(name_node, scope);

        if children.len() < 2 {
            return; // an incomplete type declaration; nothing more to register
        }

        match ast.kind(children[1]) {
            "access" => {
                let access_node = children[1];
                let target_node = ast.children(access_node)[0];
                self.node_scope.insert(access_node, scope);
                self.node_scope.insert(target_node, scope);
                let target = self.type_from_ident(ast, target_node);
                self.access_types.insert(name, target);
            }
            "fields" => {
                let fields_node = children[1];
                self.node_scope.insert(fields_node, scope);
                let mut fields = Vec::new();
                for &field_node in ast.children(fields_node) {
                    self.node_scope.insert(field_node, scope);
                    let fchildren = ast.children(field_node);
                    self.node_scope.insert(fchildren[0], scope);
                    self.node_scope.insert(fchildren[1], scope);
                    let fname = self.intern_ident(ast, fchildren[0]);
                    let fty = self.type_from_ident(ast, fchildren[1]);
                    fields.push((fname, fty));
                }
                let id = self.scopes.add_symbol(scope, Sym::Record { name, fields });
                self.record_types.insert(name, id);
            }
            _ => {}
        }
    }

    fn walk_assign(&mut self, ast: &Ast, node: NodeId, scope: RegionId) {
        let children = ast.children(node);
        let (target, value) = (children[0], children[1]);

        self.node_scope.insert(target, scope);
        if ast.kind(target) == "access" {
            self.walk_access(ast, target, scope);
        } else {
            self.check_write_target(ast, target, scope);
        }
        self.walk(ast, value, scope);
    }

    fn check_write_target(&mut self, ast: &Ast, node: NodeId, scope: RegionId) {
        if ast.kind(node) != "ident" {
            return;
        }
        let name = self.intern_ident(ast, node);
        match self.scopes.resolve(scope, name) {
            Some((_, ids)) => {
                let id = ids[0];
                self.node_symbol.insert(node, id);
                if let Sym::Variable { is_in, is_out, .. } = self.scopes.symbol(id) {
                    if *is_in && !*is_out {
                        self.handler.error(
                            SemError::AssignToInParam(self.strings.get(name).to_string())
                                .to_string(),
                            Span::DUMMY,
                        );
                    }
                }
            }
            None => self.report_unknown(name),
        }
    }

    fn walk_reference(&mut self, ast: &Ast, node: NodeId, scope: RegionId) {
        let name = self.intern_ident(ast, node);
        match self.scopes.resolve(scope, name) {
            Some((_, ids)) => {
                self.node_symbol.insert(node, ids[0]);
            }
            None => self.report_unknown(name),
        }
    }

    fn walk_access(&mut self, ast: &Ast, node: NodeId, scope: RegionId) {
        let children = ast.children(node);
        let (base, field) = (children[0], children[1]);
        self.node_scope.insert(base, scope);
        self.node_scope.insert(field, scope);

        if ast.kind(base) != "ident" {
            self.walk(ast, base, scope);
            return;
        }
        let name = self.intern_ident(ast, base);
        match self.scopes.resolve(scope, name) {
            Some((_, ids)) => {
                self.node_symbol.insert(base, ids[0]);
            }
            None => self.report_unknown(name),
        }
        // The field name itself is validated against the record's
        // declared fields by `padac-gen`, which already has the
        // resolved variable's `TypeName::Record` on hand.
    }

    fn walk_call(&mut self, ast: &Ast, node: NodeId, scope: RegionId) {
        let children = ast.children(node);
        let target = children[0];
        let args_node = children.get(1).copied();

        self.node_scope.insert(target, scope);
        if ast.kind(target) != "ident" {
            // The unary-minus-as-call quirk's bare `"-"` leaf target, or
            // some other non-identifier shape; nothing to resolve.
            self.walk_children(ast, node, scope);
            return;
        }

        let arg_count = args_node.map(|a| ast.children(a).len()).unwrap_or(0);
        let name = self.intern_ident(ast, target);
        match self.scopes.resolve(scope, name) {
            Some((_, ids)) => {
                let id = ids[0];
                self.node_symbol.insert(target, id);
                match self.scopes.symbol(id) {
                    Sym::Function { .. } | Sym::Procedure { .. } => {
                        let expected = self.scopes.symbol(id).param_count();
                        if expected != arg_count {
                            self.handler.error(
                                SemError::ArityMismatch {
                                    name: self.strings.get(name).to_string(),
                                    expected,
                                    got: arg_count,
                                }
                                .to_string(),
                                Span::DUMMY,
                            );
                        }
                    }
                    _ => {
                        self.handler.error(
                            SemError::NotCallable(self.strings.get(name).to_string()).to_string(),
                            Span::DUMMY,
                        );
                    }
                }
            }
            None => self.report_unknown(name),
        }

        if let Some(args) = args_node {
            self.node_scope.insert(args, scope);
            for &a in ast.children(args) {
                self.walk(ast, a, scope);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padac_lex::Lexer;
    use padac_par::{lower, Parser};

    const PRELUDE: &str = "with Ada.Text_IO; use Ada.Text_IO; procedure main is";

    fn resolve_source(src: &str) -> (Resolution, Handler) {
        let mut handler = Handler::new();
        let mut lexicon = Lexicon::new();
        let tokens = Lexer::new(src, &mut handler, &mut lexicon).tokenize();
        let cst = Parser::new(&tokens, &mut handler).parse().expect("parses");
        let ast = lower(&cst);
        let resolution = resolve(&ast, &lexicon, &mut handler);
        (resolution, handler)
    }

    #[test]
    fn sibling_variables_get_increasing_offsets_in_declaration_order() {
        let src = format!("{PRELUDE} a : integer; b : integer; begin null; end main;");
        let (mut res, handler) = resolve_source(&src);
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());

        let file_region = RegionId(0);
        let a = res.strings.intern("a");
        let b = res.strings.intern("b");
        let (_, a_ids) = res.scopes.resolve(file_region, a).unwrap();
        let (_, b_ids) = res.scopes.resolve(file_region, b).unwrap();
        let a_offset = match res.scopes.symbol(a_ids[0]) {
            Sym::Variable { offset, .. } => *offset,
            _ => unreachable!(),
        };
        let b_offset = match res.scopes.symbol(b_ids[0]) {
            Sym::Variable { offset, .. } => *offset,
            _ => unreachable!(),
        };
        assert!(b_offset > a_offset);
    }

    #[test]
    fn nested_procedure_resolves_enclosing_variable() {
        let src = format!(
            "{PRELUDE} \
             x : integer; \
             procedure inner is \
             begin \
               x := 1; \
             end inner; \
             begin \
               inner(); \
             end main;"
        );
        let (_res, handler) = resolve_source(&src);
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
    }

    #[test]
    fn unknown_identifier_is_reported() {
        let src = format!("{PRELUDE} begin y := 1; end main;");
        let (_res, handler) = resolve_source(&src);
        assert!(handler.has_errors());
    }

    #[test]
    fn arity_mismatch_on_call_is_reported() {
        let src = format!(
            "{PRELUDE} \
             procedure helper(n : integer) is \
             begin \
               null; \
             end helper; \
             begin \
               helper(); \
             end main;"
        );
        let (_res, handler) = resolve_source(&src);
        assert!(handler.has_errors());
    }

    #[test]
    fn assigning_to_an_in_only_parameter_is_reported() {
        let src = format!(
            "{PRELUDE} \
             procedure helper(n : in integer) is \
             begin \
               n := 1; \
             end helper; \
             begin \
               helper(1); \
             end main;"
        );
        let (_res, handler) = resolve_source(&src);
        assert!(handler.has_errors());
    }

    #[test]
    fn two_nested_procedures_sharing_a_name_get_distinct_labels() {
        let src = format!(
            "{PRELUDE} \
             procedure outer1 is \
               procedure helper is begin null; end helper; \
             begin \
               helper(); \
             end outer1; \
             procedure outer2 is \
               procedure helper is begin null; end helper; \
             begin \
               helper(); \
             end outer2; \
             begin \
               outer1(); \
               outer2(); \
             end main;"
        );
        let (res, handler) = resolve_source(&src);
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        let labels: Vec<&String> = res.node_label.values().collect();
        let helper_labels: Vec<&&String> =
            labels.iter().filter(|l| l.starts_with("helper")).collect();
        assert_eq!(helper_labels.len(), 2);
        assert_ne!(helper_labels[0], helper_labels[1]);
    }
}
