//! The actual AST-to-assembly walk. Grounded line-for-line on
//! `examples/original_source/parser/asm.go`'s `ReadFile`, `ReadDecl`,
//! `ReadProcedure`, `ReadVar`, `ReadBody`, `ReadIf`, `ReadWhile`, `ReadFor`,
//! `ReadOperand`, `Call` and `CallWithParameters`, with three deliberate
//! corrections and a handful of gaps filled in — see `DESIGN.md`.

use padac_par::{Ast, NodeId};
use padac_sem::{RegionId, Resolution, Sym, SymbolId, TypeName};
use padac_util::Lexicon;

use crate::buffer::{AssemblyBuffer, BufferMode, Cond};
use crate::error::GenError;
use crate::runtime;

pub struct Codegen<'a> {
    ast: &'a Ast,
    res: &'a Resolution,
    lexicon: &'a Lexicon,
    buf: AssemblyBuffer,
    if_counter: u32,
    while_counter: u32,
    for_counter: u32,
    link_counter: u32,
    sc_counter: u32,
}

impl<'a> Codegen<'a> {
    pub fn new(ast: &'a Ast, res: &'a Resolution, lexicon: &'a Lexicon) -> Self {
        Self {
            ast,
            res,
            lexicon,
            buf: AssemblyBuffer::new(),
            if_counter: 0,
            while_counter: 0,
            for_counter: 0,
            link_counter: 0,
            sc_counter: 0,
        }
    }

    pub fn generate(mut self) -> Result<String, GenError> {
        self.buf.raw(runtime::HEADER);
        self.gen_file(self.ast.root())?;
        Ok(self.buf.finish(&runtime::all()))
    }

    // ---- top level -----------------------------------------------------

    fn gen_file(&mut self, node: NodeId) -> Result<(), GenError> {
        let children = self.ast.children(node).to_vec();
        let decl_node = children[1];
        let body_node = children[2];
        let region = RegionId(0);

        self.buf.emit("STMFD SP!, {R10, R11, LR}");
        self.buf.emit(format!("LDR R10, ={}", region.0));
        self.buf.emit("MOV R11, SP");
        self.buf.emit("SUB R11, R11, #4");
        self.buf.annotate_prev("SP points to R10, so subtract 4 to find the frame base");

        self.gen_decl_vars(decl_node, region)?;
        self.gen_decl_procs(decl_node)?;
        self.gen_body(body_node, region)?;
        Ok(())
    }

    fn gen_decl_vars(&mut self, decl_node: NodeId, scope: RegionId) -> Result<(), GenError> {
        // Encounter order, not the original's alphabetical sort: the
        // resolver already assigned offsets in encounter order, and
        // sorting here would desync pushes from those offsets.
        for child in self.ast.children(decl_node).to_vec() {
            if self.ast.kind(child) == "var" {
                self.gen_var(scope, child)?;
            }
        }
        Ok(())
    }

    fn gen_decl_procs(&mut self, decl_node: NodeId) -> Result<(), GenError> {
        for child in self.ast.children(decl_node).to_vec() {
            match self.ast.kind(child) {
                "procedure" | "function" => self.gen_procedure(child)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn gen_var(&mut self, scope: RegionId, node: NodeId) -> Result<(), GenError> {
        let children = self.ast.children(node).to_vec();
        let name_group = children[0];
        let value = children.get(2).copied();

        let name_nodes: Vec<NodeId> = if self.ast.kind(name_group) == "sameType" {
            self.ast.children(name_group).to_vec()
        } else {
            vec![name_group]
        };

        for name_node in name_nodes {
            let name = self.spelling(name_node).to_string();
            match value {
                Some(v) => {
                    self.gen_operand(scope, v)?;
                    self.buf.annotate_prev(format!("declares '{name}'"));
                }
                None => {
                    let sym_id = self.sym_of(name_node)?;
                    let size = match self.res.scopes.symbol(sym_id) {
                        Sym::Variable { ty, .. } => self.type_size(*ty, scope),
                        _ => 4,
                    };
                    self.buf.emit(format!("SUB SP, SP, #{size}"));
                    self.buf.annotate_prev(format!("Reserve space for the value of {name}"));
                }
            }
        }
        Ok(())
    }

    fn gen_procedure(&mut self, node: NodeId) -> Result<(), GenError> {
        let symbol_id = self.sym_of(node)?;
        let label = match self.res.node_label.get(&node) {
            Some(l) => l.clone(),
            None => match self.res.scopes.symbol(symbol_id) {
                Sym::Function { label, .. } | Sym::Procedure { label, .. } => label.clone(),
                _ => return Err(GenError::Internal("subprogram symbol has no label".into())),
            },
        };

        let children = self.ast.children(node).to_vec();
        let decl_node = children[children.len() - 2];
        let body_node = children[children.len() - 1];
        let region = *self
            .res
            .node_scope
            .get(&decl_node)
            .ok_or_else(|| GenError::Internal(format!("'{label}' body has no region")))?;

        // Every subprogram body lands in the deferred buffer regardless of
        // nesting depth, so it always ends up after the top-level `end`
        // label; forcing Deferred here (rather than toggling a global flag
        // the way the original does) means a doubly-nested procedure's
        // siblings can't leak back into the main buffer.
        let prev_mode = self.buf.set_mode(BufferMode::Deferred);
        self.buf.comment(format!("Procedure {label}"));
        self.buf.label(label.clone());
        self.buf.emit("STMFD SP!, {R10, R11, LR}");
        self.buf.emit(format!("LDR R10, ={}", region.0));
        self.buf.emit("MOV R11, SP");
        self.buf.emit("SUB R11, R11, #4");
        self.buf.annotate_prev("SP points to R10, so subtract 4 to find the frame base");

        self.gen_decl_vars(decl_node, region)?;
        self.gen_body(body_node, region)?;

        let decl_offset = self.res.scopes.current_max_offset(region);
        if decl_offset > 0 {
            self.buf.emit(format!("ADD SP, SP, #{decl_offset}"));
            self.buf.annotate_prev(format!("Clear the stack of declarations: {decl_offset}"));
        }
        self.buf.emit("LDMFD SP!, {R10, R11, PC}");
        self.buf.comment(format!("End of procedure {label}"));

        self.buf.set_mode(prev_mode);
        self.gen_decl_procs(decl_node)?;
        Ok(())
    }

    // ---- statements ------------------------------------------------------

    fn gen_body(&mut self, node: NodeId, scope: RegionId) -> Result<(), GenError> {
        for stmt in self.ast.children(node).to_vec() {
            match self.ast.kind(stmt) {
                ":=" => self.gen_assign(scope, stmt)?,
                "for" => self.gen_for(scope, stmt)?,
                "while" => self.gen_while(scope, stmt)?,
                "if" => self.gen_if(scope, stmt)?,
                "call" => {
                    self.gen_call(scope, stmt)?;
                }
                "return" => self.gen_return(scope, stmt)?,
                other => return Err(GenError::Internal(format!("'{other}' cannot appear as a statement"))),
            }
        }
        Ok(())
    }

    fn gen_assign(&mut self, scope: RegionId, node: NodeId) -> Result<(), GenError> {
        let children = self.ast.children(node).to_vec();
        let (target, value) = (children[0], children[1]);

        self.gen_operand(scope, value)?;
        // `gen_operand` leaves the result in R0 *and* pushed at [SP]; only
        // the stack copy needs popping, matching every `ReadOperand` call
        // in the original, whose last instruction before returning is
        // always `Str(R0)`.
        self.buf.emit("ADD SP, SP, #4");

        if self.ast.kind(target) == "access" {
            self.gen_access(scope, target, true)?;
        } else {
            let sym_id = self.sym_of(target)?;
            let name = self.spelling(target).to_string();
            self.gen_var_ref(scope, sym_id, true, 0, &name)?;
        }
        Ok(())
    }

    fn gen_if(&mut self, scope: RegionId, node: NodeId) -> Result<(), GenError> {
        let children = self.ast.children(node).to_vec();
        let (cond, body) = (children[0], children[1]);
        let n = self.if_counter;
        self.if_counter += 1;

        self.gen_operand(scope, cond)?;
        self.buf.emit("LDR R0, [SP]");
        self.buf.annotate_prev("Load result of condition");
        self.buf.emit("ADD SP, SP, #4");
        self.buf.emit("CMP R0, #0");
        self.buf.emit(format!("BEQ else{n}"));

        self.gen_body(body, scope)?;
        self.buf.emit(format!("B end_if_{n}"));

        self.buf.label(format!("else{n}"));
        if children.len() >= 3 {
            let tail = children[2];
            if self.ast.kind(tail) == "elif" {
                // same shape as "if": [cond, body, ...tail]
                self.gen_if(scope, tail)?;
            } else {
                self.gen_body(tail, scope)?;
            }
        }
        self.buf.label(format!("end_if_{n}"));
        Ok(())
    }

    fn gen_while(&mut self, scope: RegionId, node: NodeId) -> Result<(), GenError> {
        let children = self.ast.children(node).to_vec();
        let (cond, body) = (children[0], children[1]);
        let n = self.while_counter;
        self.while_counter += 1;

        self.buf.label(format!("while{n}"));
        self.gen_operand(scope, cond)?;
        self.buf.emit("LDR R0, [SP]");
        self.buf.annotate_prev("Load result of condition");
        self.buf.emit("ADD SP, SP, #4");
        self.buf.emit("CMP R0, #0");
        self.buf.emit(format!("BEQ endwhile{n}"));
        self.gen_body(body, scope)?;
        self.buf.emit(format!("B while{n}"));
        self.buf.label(format!("endwhile{n}"));
        Ok(())
    }

    fn gen_for(&mut self, _scope: RegionId, node: NodeId) -> Result<(), GenError> {
        let children = self.ast.children(node).to_vec();
        let (index_node, direction_node, lo, hi, body) =
            (children[0], children[1], children[2], children[3], children[4]);

        let index_sym = self.sym_of(index_node)?;
        // the resolver scopes lo/hi/body to the loop's own fresh region,
        // not the enclosing one
        let region = self.res.scopes.owner_region(index_sym);
        let reverse = self.ast.kind(direction_node) == "reverse";
        let n = self.for_counter;
        self.for_counter += 1;

        self.buf.emit("STMFD SP!, {R10, R11}");
        self.buf.emit(format!("LDR R10, ={}", region.0));
        self.buf.emit("MOV R11, SP");
        self.buf.emit("SUB R11, R11, #4");

        self.buf.emit("SUB SP, SP, #4");
        self.buf.annotate_prev("Reserve space for the index");

        // a reverse loop counts down from hi to lo, so hi seeds the counter
        // and lo is the bound it must not pass; the other way round for
        // a normal ascending loop.
        let (start, bound) = if reverse { (hi, lo) } else { (lo, hi) };

        match self.const_int(start) {
            Some(v) => {
                self.buf.emit(format!("LDR R0, ={v}"));
                self.buf.annotate_prev("Load to R0 the value of the counter");
            }
            None => {
                self.gen_operand(region, start)?;
                self.buf.emit("LDR R0, [SP]");
                self.buf.annotate_prev("Load to R0 the value of the counter");
                self.buf.emit("ADD SP, SP, #4");
            }
        }
        self.buf.emit("STR R0, [SP]");
        self.buf.annotate_prev("Store the value of the counter");

        match self.const_int(bound) {
            Some(v) => {
                self.buf.emit("SUB SP, SP, #4");
                self.buf.annotate_prev("Reserve space for the max");
                self.buf.emit(format!("LDR R1, ={v}"));
                self.buf.annotate_prev("Load to R1 the value of the max");
            }
            None => {
                self.gen_operand(region, bound)?;
                self.buf.emit("LDR R1, [SP]");
                self.buf.annotate_prev("Load to R1 the value of the max");
            }
        }
        self.buf.emit("STR R1, [SP]");
        self.buf.annotate_prev("Store the value of the max");

        self.buf.label(format!("for{n}"));
        self.buf.emit("LDR R0, [SP, #4]");
        self.buf.annotate_prev("Load to R0 the value of the counter");
        self.buf.emit("LDR R1, [SP]");
        self.buf.annotate_prev("Load to R1 the value of the max");
        self.buf.emit("CMP R0, R1");
        self.buf.annotate_prev("Compare the counter with the max");
        let exit_cond = if reverse { Cond::Lt } else { Cond::Gt };
        self.buf.emit(format!("B{exit_cond} endfor{n}"));

        self.gen_body(body, region)?;

        self.buf.emit("LDR R0, [SP, #4]");
        if reverse {
            self.buf.emit("SUB R0, R0, #1");
        } else {
            self.buf.emit("ADD R0, R0, #1");
        }
        self.buf.emit("STR R0, [SP, #4]");
        self.buf.emit(format!("B for{n}"));
        self.buf.label(format!("endfor{n}"));
        self.buf.emit("ADD SP, SP, #8");
        self.buf.emit("LDMFD SP!, {R10, R11}");
        Ok(())
    }

    fn gen_return(&mut self, scope: RegionId, node: NodeId) -> Result<(), GenError> {
        let children = self.ast.children(node).to_vec();
        let decl_offset = self.res.scopes.current_max_offset(scope);

        if children.is_empty() {
            if decl_offset > 0 {
                self.buf.emit(format!("ADD SP, SP, #{decl_offset}"));
            }
            self.buf.emit("LDMFD SP!, {R10, R11, PC}");
            return Ok(());
        }

        self.gen_operand(scope, children[0])?;
        self.buf.emit("LDR R0, [SP]");
        let owner_sym = *self
            .res
            .region_owner
            .get(&scope)
            .ok_or_else(|| GenError::Internal("return outside a function or procedure".into()))?;
        let param_offset = match self.res.scopes.symbol(owner_sym) {
            Sym::Function { params, .. } => params.len() as i32 * 4,
            _ => 0,
        };
        self.buf.emit(format!("STR R0, [R11, #{}]", 16 + param_offset));
        self.buf.annotate_prev("Store the return value");
        self.buf.emit("ADD SP, SP, #4");
        if decl_offset > 0 {
            self.buf.emit(format!("ADD SP, SP, #{decl_offset}"));
        }
        self.buf.emit("LDMFD SP!, {R10, R11, PC}");
        Ok(())
    }

    // ---- calls -------------------------------------------------------

    fn gen_call(&mut self, scope: RegionId, node: NodeId) -> Result<(), GenError> {
        let children = self.ast.children(node).to_vec();
        let target = children[0];
        let args_node = children.get(1).copied();

        if self.ast.kind(target) == "ident" && self.spelling(target) == "put" {
            return self.gen_put(scope, args_node);
        }

        let sym_id = self.sym_of(target)?;
        let (label, is_function) = match self.res.scopes.symbol(sym_id) {
            Sym::Function { label, .. } => (label.clone(), true),
            Sym::Procedure { label, .. } => (label.clone(), false),
            _ => return Err(GenError::Internal(format!("'{}' is not callable", self.spelling(target)))),
        };

        if is_function {
            self.buf.emit("SUB SP, SP, #4");
            self.buf.annotate_prev("Save space for the return value");
        }

        let argc = args_node.map(|a| self.ast.children(a).len()).unwrap_or(0);
        if let Some(args) = args_node {
            for a in self.ast.children(args).to_vec() {
                self.gen_operand(scope, a)?;
            }
        }

        self.buf.emit(format!("BL {label}"));
        if argc > 0 {
            self.buf.emit(format!("ADD SP, SP, #{}", argc * 4));
            self.buf.annotate_prev("Pop the arguments");
        }
        if is_function {
            self.buf.emit("LDR R0, [SP]");
            self.buf.annotate_prev("Load the return value");
            self.buf.emit("ADD SP, SP, #4");
        }
        Ok(())
    }

    fn gen_put(&mut self, scope: RegionId, args_node: Option<NodeId>) -> Result<(), GenError> {
        let args = args_node.ok_or_else(|| GenError::Internal("'put' requires one argument".into()))?;
        let arg = *self
            .ast
            .children(args)
            .first()
            .ok_or_else(|| GenError::Internal("'put' requires one argument".into()))?;

        self.gen_operand(scope, arg)?;
        self.buf.emit("LDR R0, [SP]");
        self.buf.annotate_prev("Load the value to print");
        self.buf.emit("ADD SP, SP, #4");

        let addr = self.buf.fill(12);
        self.buf.emit(format!("LDR R3, ={addr}"));
        self.buf.emit("BL to_ascii");
        self.buf.emit(format!("LDR R0, ={addr}"));
        self.buf.emit("BL println");
        Ok(())
    }

    // ---- operands ------------------------------------------------------

    fn gen_operand(&mut self, scope: RegionId, node: NodeId) -> Result<(), GenError> {
        let kind = self.ast.kind(node).to_string();
        match kind.as_str() {
            "int" => {
                let v = self.const_int(node).unwrap_or(0);
                self.push_const(v);
            }
            "char" => {
                let v = self.char_code(node);
                self.push_const(v);
            }
            "true" => self.push_const(1),
            "false" | "null" => self.push_const(0),
            "new" => {
                tracing::warn!("'new' has no heap model; treating it as a zeroed value");
                self.push_const(0);
            }
            "string" => {
                tracing::warn!("string literal used as a computed operand; treating it as 0");
                self.push_const(0);
            }
            "ident" => {
                let sym_id = self.sym_of(node)?;
                let name = self.spelling(node).to_string();
                self.gen_var_ref(scope, sym_id, false, 0, &name)?;
                self.buf.emit("SUB SP, SP, #4");
                self.buf.emit("STR R0, [SP]");
            }
            "access" => {
                self.gen_access(scope, node, false)?;
                self.buf.emit("SUB SP, SP, #4");
                self.buf.emit("STR R0, [SP]");
            }
            "not" => {
                let child = self.ast.children(node)[0];
                self.gen_operand(scope, child)?;
                self.buf.emit("LDR R0, [SP]");
                self.buf.emit("ADD SP, SP, #4");
                self.buf.emit("EOR R0, R0, #1");
                self.buf.emit("SUB SP, SP, #4");
                self.buf.emit("STR R0, [SP]");
            }
            "+" | "-" | "*" | "/" | "rem" | "and" | "or" | "=" | "/=" | "<" | "<=" | ">" | ">=" => {
                let children = self.ast.children(node).to_vec();
                self.gen_binary(scope, &kind, children[0], children[1])?;
            }
            "and then" | "or else" => {
                let children = self.ast.children(node).to_vec();
                self.gen_short_circuit(scope, &kind, children[0], children[1])?;
            }
            "cast" => {
                // Never produced by the parser; the original's handling
                // of this case is itself dead (a `to_ascii` stub guarded
                // by a string check that never fires). Defensively
                // evaluate the operand being cast and keep its value.
                let children = self.ast.children(node).to_vec();
                let inner = *children.last().ok_or_else(|| GenError::Internal("empty cast".into()))?;
                self.gen_operand(scope, inner)?;
            }
            "call" => {
                let children = self.ast.children(node).to_vec();
                if !children.is_empty() && self.ast.kind(children[0]) == "-" {
                    self.gen_operand(scope, children[1])?;
                    self.buf.emit("LDR R0, [SP]");
                    self.buf.emit("ADD SP, SP, #4");
                    self.buf.emit("RSB R0, R0, #0");
                    self.buf.annotate_prev("Negate R0");
                    self.buf.emit("SUB SP, SP, #4");
                    self.buf.emit("STR R0, [SP]");
                } else {
                    self.gen_call(scope, node)?;
                    self.buf.emit("SUB SP, SP, #4");
                    self.buf.emit("STR R0, [SP]");
                }
            }
            other => return Err(GenError::Internal(format!("'{other}' cannot appear as an operand"))),
        }
        Ok(())
    }

    fn gen_binary(&mut self, scope: RegionId, op: &str, lhs: NodeId, rhs: NodeId) -> Result<(), GenError> {
        self.gen_operand(scope, lhs)?;
        self.gen_operand(scope, rhs)?;
        match op {
            "+" => {
                self.buf.emit("LDR R0, [SP]");
                self.buf.emit("LDR R1, [SP, #4]");
                self.buf.emit("ADD R0, R1, R0");
                self.buf.emit("ADD SP, SP, #4");
                self.buf.emit("STR R0, [SP]");
            }
            "-" => {
                self.buf.emit("LDR R0, [SP]");
                self.buf.emit("LDR R1, [SP, #4]");
                self.buf.emit("SUB R0, R1, R0");
                self.buf.emit("ADD SP, SP, #4");
                self.buf.emit("STR R0, [SP]");
            }
            "*" => {
                self.buf.emit("LDR R1, [SP]");
                self.buf.emit("LDR R2, [SP, #4]");
                self.buf.emit("BL mul");
                self.buf.emit("ADD SP, SP, #4");
                self.buf.emit("STR R0, [SP]");
            }
            "/" | "rem" => {
                self.buf.emit("LDR R2, [SP]");
                self.buf.emit("LDR R1, [SP, #4]");
                self.buf.emit("BL div32");
                if op == "rem" {
                    self.buf.emit("MOV R0, R1");
                }
                self.buf.emit("ADD SP, SP, #4");
                self.buf.emit("STR R0, [SP]");
            }
            "and" | "or" => {
                self.buf.emit("LDR R1, [SP]");
                self.buf.emit("LDR R2, [SP, #4]");
                let mnemonic = if op == "and" { "AND" } else { "ORR" };
                self.buf.emit(format!("{mnemonic} R0, R1, R2"));
                self.buf.emit("ADD SP, SP, #4");
                self.buf.emit("STR R0, [SP]");
            }
            "=" | "/=" | "<" | "<=" | ">" | ">=" => {
                self.buf.emit("LDR R1, [SP]");
                self.buf.emit("LDR R0, [SP, #4]");
                self.buf.emit("CMP R0, R1");
                let (set, clear) = match op {
                    "=" => (Cond::Eq, Cond::Ne),
                    "/=" => (Cond::Ne, Cond::Eq),
                    "<" => (Cond::Lt, Cond::Ge),
                    "<=" => (Cond::Le, Cond::Gt),
                    ">" => (Cond::Gt, Cond::Le),
                    ">=" => (Cond::Ge, Cond::Lt),
                    _ => unreachable!(),
                };
                self.buf.emit(format!("MOV{set} R0, #1"));
                self.buf.emit(format!("MOV{clear} R0, #0"));
                self.buf.emit("ADD SP, SP, #4");
                self.buf.emit("STR R0, [SP]");
            }
            _ => return Err(GenError::Internal(format!("unknown binary operator '{op}'"))),
        }
        Ok(())
    }

    /// `and then`/`or else`: evaluates `lhs`, and only evaluates `rhs` if
    /// the short-circuit can't already decide the result — `lhs` false
    /// for `and then`, `lhs` true for `or else`. Booleans are the same
    /// 0/1 word `gen_binary`'s comparison operators and `push_const`
    /// produce, so the two branches converge on a plain pushed word.
    fn gen_short_circuit(&mut self, scope: RegionId, op: &str, lhs: NodeId, rhs: NodeId) -> Result<(), GenError> {
        let n = self.sc_counter;
        self.sc_counter += 1;

        self.gen_operand(scope, lhs)?;
        self.buf.emit("LDR R0, [SP]");
        self.buf.emit("ADD SP, SP, #4");
        self.buf.emit("CMP R0, #0");
        if op == "and then" {
            self.buf.emit(format!("BEQ sc_short_{n}"));
        } else {
            self.buf.emit(format!("BNE sc_short_{n}"));
        }

        self.gen_operand(scope, rhs)?;
        self.buf.emit("LDR R0, [SP]");
        self.buf.emit("ADD SP, SP, #4");
        self.buf.emit(format!("B sc_end_{n}"));

        self.buf.label(format!("sc_short_{n}"));
        self.buf.emit(format!("MOV R0, #{}", if op == "and then" { 0 } else { 1 }));

        self.buf.label(format!("sc_end_{n}"));
        self.buf.emit("SUB SP, SP, #4");
        self.buf.emit("STR R0, [SP]");
        Ok(())
    }

    fn gen_access(&mut self, scope: RegionId, node: NodeId, store: bool) -> Result<(), GenError> {
        let children = self.ast.children(node).to_vec();
        let (base, field) = (children[0], children[1]);
        if self.ast.kind(base) != "ident" {
            return Err(GenError::Internal("only a plain identifier base is supported in a field access".into()));
        }
        let base_sym = self.sym_of(base)?;
        let extra = self.field_offset(scope, base_sym, field)?;
        let name = self.spelling(base).to_string();
        self.gen_var_ref(scope, base_sym, store, extra, &name)
    }

    /// Loads (`store == false`) or stores (`store == true`) R0 against
    /// `sym_id`'s frame slot, walking the static link if `sym_id`'s
    /// owning region isn't the current one. `extra_offset` folds in a
    /// record field's byte offset for `"access"` nodes; it's 0 for a
    /// plain variable reference.
    fn gen_var_ref(
        &mut self,
        scope: RegionId,
        sym_id: SymbolId,
        store: bool,
        extra_offset: i32,
        name: &str,
    ) -> Result<(), GenError> {
        let owner_region = self.res.scopes.owner_region(sym_id);
        let (is_param, base_offset) = match self.res.scopes.symbol(sym_id) {
            Sym::Variable { is_param, offset, .. } => (*is_param, *offset),
            _ => return Err(GenError::Internal(format!("'{name}' is not a variable"))),
        };
        let frame_off = self.frame_offset(owner_region, is_param, base_offset)? + extra_offset;
        let op = if store { "STR" } else { "LDR" };
        let verb = if store { "Store" } else { "Load" };

        if owner_region == scope {
            self.buf.emit(format!("{op} R0, [R11, #{frame_off}]"));
            self.buf.annotate_prev(format!("(same scope) {verb} the value of {name}"));
        } else {
            let tag = format!("{}_{name}", self.link_counter);
            self.link_counter += 1;
            self.buf.emit("MOV R9, R11");
            self.buf.emit("LDR R8, [R11, #4]");
            self.buf.emit(format!("CMP R8, #{}", owner_region.0));
            self.buf.emit(format!("BEQ notload_{tag}"));
            self.buf.label(format!("load_{tag}"));
            self.buf.emit("LDR R11, [R11, #8]");
            self.buf.emit("LDR R8, [R11, #4]");
            self.buf.emit(format!("CMP R8, #{}", owner_region.0));
            self.buf.emit(format!("BNE load_{tag}"));
            self.buf.label(format!("notload_{tag}"));
            self.buf.emit("LDR R11, [R11, #8]");
            self.buf.emit(format!("{op} R0, [R11, #{frame_off}]"));
            self.buf.emit("MOV R11, R9");
            self.buf.annotate_prev(format!("(via static link) {verb} the value of {name}"));
        }
        Ok(())
    }

    fn frame_offset(&self, owner_region: RegionId, is_param: bool, offset: i32) -> Result<i32, GenError> {
        if is_param {
            let owner_sym = *self
                .res
                .region_owner
                .get(&owner_region)
                .ok_or_else(|| GenError::Internal("parameter's region has no owning symbol".into()))?;
            let param_count = self.res.scopes.symbol(owner_sym).param_count() as i32;
            Ok(16 + param_count * 4 - offset)
        } else {
            Ok(4 - offset)
        }
    }

    fn field_offset(&self, scope: RegionId, base_sym: SymbolId, field_node: NodeId) -> Result<i32, GenError> {
        let ty = match self.res.scopes.symbol(base_sym) {
            Sym::Variable { ty, .. } => *ty,
            _ => return Err(GenError::Internal("field access base is not a variable".into())),
        };
        let record_name = match ty {
            TypeName::Record(sym) => sym,
            _ => return Err(GenError::UnknownField(self.spelling(field_node).to_string())),
        };
        let (_, ids) = self
            .res
            .scopes
            .resolve(scope, record_name)
            .ok_or_else(|| GenError::Internal("unknown record type".into()))?;
        let fields = match self.res.scopes.symbol(ids[0]) {
            Sym::Record { fields, .. } => fields,
            _ => return Err(GenError::Internal("not a record type".into())),
        };

        let field_name = self.spelling(field_node);
        let mut acc = 0;
        for (fname, fty) in fields {
            if self.res.strings.get(*fname) == field_name {
                return Ok(acc);
            }
            acc += self.type_size(*fty, scope);
        }
        Err(GenError::UnknownField(field_name.to_string()))
    }

    fn type_size(&self, ty: TypeName, scope: RegionId) -> i32 {
        match ty {
            TypeName::Integer | TypeName::Character | TypeName::Boolean => 4,
            TypeName::Record(sym) => match self.res.scopes.resolve(scope, sym) {
                Some((_, ids)) => match self.res.scopes.symbol(ids[0]) {
                    Sym::Record { fields, .. } => fields.iter().map(|(_, fty)| self.type_size(*fty, scope)).sum(),
                    _ => 4,
                },
                None => 4,
            },
        }
    }

    fn push_const(&mut self, v: i32) {
        self.buf.emit("SUB SP, SP, #4");
        self.buf.emit(format!("LDR R0, ={v}"));
        self.buf.emit("STR R0, [SP]");
    }

    // ---- small helpers -------------------------------------------------

    fn spelling(&self, node: NodeId) -> &str {
        match self.ast.literal(node) {
            Some(idx) => self.lexicon.get(idx),
            None => self.ast.kind(node),
        }
    }

    fn sym_of(&self, node: NodeId) -> Result<SymbolId, GenError> {
        self.res
            .node_symbol
            .get(&node)
            .copied()
            .ok_or_else(|| GenError::Internal(format!("'{}' has no resolved symbol", self.spelling(node))))
    }

    fn const_int(&self, node: NodeId) -> Option<i32> {
        if self.ast.kind(node) != "int" {
            return None;
        }
        self.ast.literal(node).and_then(|idx| self.lexicon.get(idx).parse::<i32>().ok())
    }

    fn char_code(&self, node: NodeId) -> i32 {
        let text = self.ast.literal(node).map(|idx| self.lexicon.get(idx)).unwrap_or("''");
        text.chars().nth(1).map(|c| c as i32).unwrap_or(0)
    }
}
