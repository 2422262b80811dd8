//! The assembly text buffer, plus the small set of ARM register and
//! condition names the generated programs actually use. Grounded on
//! `examples/original_source/parser/asm.go`'s `Register`/`Condition`
//! enums and `AssemblyFile` struct, trimmed to the subset codegen emits
//! (the original carries all fifteen ARM condition codes; this only needs
//! the six its comparison and branch lowering produce).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    R0,
    R1,
    R2,
    R3,
    R8,
    R9,
    R10,
    R11,
    Sp,
    Lr,
    Pc,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reg::R0 => "R0",
            Reg::R1 => "R1",
            Reg::R2 => "R2",
            Reg::R3 => "R3",
            Reg::R8 => "R8",
            Reg::R9 => "R9",
            Reg::R10 => "R10",
            Reg::R11 => "R11",
            Reg::Sp => "SP",
            Reg::Lr => "LR",
            Reg::Pc => "PC",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cond::Eq => "EQ",
            Cond::Ne => "NE",
            Cond::Gt => "GT",
            Cond::Ge => "GE",
            Cond::Lt => "LT",
            Cond::Le => "LE",
        };
        f.write_str(s)
    }
}

/// Which of the two output buffers subsequent `emit` calls land in. Every
/// nested procedure/function body is generated in `Deferred` so it ends up
/// after the top-level `end` label, matching `examples/original_source`'s
/// scheme of writing the main program inline and stashing every nested
/// subprogram's body for a later append, without a second AST pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferMode {
    Main,
    Deferred,
}

/// Accumulates generated assembly text. `next_addr` backs [`fill`], which
/// mints a fresh `addrN` label for a reserved-but-uninitialized data word
/// (used once per `put` call site for its `to_ascii` scratch buffer).
#[derive(Debug, Default)]
pub struct AssemblyBuffer {
    main: String,
    deferred: String,
    mode: BufferMode,
    next_addr: u32,
}

impl Default for BufferMode {
    fn default() -> Self {
        BufferMode::Main
    }
}

impl AssemblyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_mut(&mut self) -> &mut String {
        match self.mode {
            BufferMode::Main => &mut self.main,
            BufferMode::Deferred => &mut self.deferred,
        }
    }

    /// Appends `text` with no indentation or trailing newline management
    /// of its own — used for the fixed two-line program header, which is
    /// copied verbatim from the original rather than built instruction by
    /// instruction.
    pub fn raw(&mut self, text: &str) {
        self.current_mut().push_str(text);
    }

    /// Appends one line of assembly text, indented to line up under a
    /// label column, matching the teacher's fixed-width instruction
    /// formatting conventions.
    pub fn emit(&mut self, line: impl AsRef<str>) {
        let buf = self.current_mut();
        buf.push_str("\t");
        buf.push_str(line.as_ref());
        buf.push('\n');
    }

    pub fn label(&mut self, name: impl AsRef<str>) {
        let buf = self.current_mut();
        buf.push_str(name.as_ref());
        buf.push('\n');
    }

    pub fn comment(&mut self, text: impl AsRef<str>) {
        let buf = self.current_mut();
        buf.push_str("\t; ");
        buf.push_str(text.as_ref());
        buf.push('\n');
    }

    /// Appends `text` as a trailing comment on the line just emitted,
    /// mirroring `AssemblyFile.CommentPreviousLine` in the original.
    pub fn annotate_prev(&mut self, text: impl AsRef<str>) {
        let buf = self.current_mut();
        if let Some(pos) = buf.rfind('\n') {
            // `pos` is the newline closing the line we want to annotate;
            // find the newline before it (or the buffer start) and splice
            // the comment in just before `pos`.
            let line_start = buf[..pos].rfind('\n').map(|p| p + 1).unwrap_or(0);
            if line_start < pos {
                buf.insert_str(pos, &format!(" ; {}", text.as_ref()));
            }
        }
    }

    /// Reserves a fresh, zero-initialized data word and returns its label.
    pub fn fill(&mut self, bytes: u32) -> String {
        let name = format!("addr{}", self.next_addr);
        self.next_addr += 1;
        let buf = self.current_mut();
        buf.push_str(&format!("{name}\tFILL\t{bytes}\n"));
        name
    }

    /// Switches the active buffer, returning the previous mode so callers
    /// can restore it after finishing a nested subprogram.
    pub fn set_mode(&mut self, mode: BufferMode) -> BufferMode {
        std::mem::replace(&mut self.mode, mode)
    }

    pub fn mode(&self) -> BufferMode {
        self.mode
    }

    /// Concatenates the main program, the deferred nested-subprogram
    /// bodies, and the fixed runtime routines into the final listing.
    pub fn finish(self, runtime: &str) -> String {
        let mut out = self.main;
        out.push_str("end\n\n");
        out.push_str(&self.deferred);
        out.push('\n');
        out.push_str(runtime);
        out
    }
}
