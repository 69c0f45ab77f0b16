//! LLVM IR generation for RX modules.
//!
//! The IR generator runs one pass over the typed AST and produces a
//! module-level text buffer. All storage is word-addressed: every scalar
//! occupies one 64-bit slot, aggregates occupy contiguous runs of slots,
//! and references are pointers into that slot space. Lowering is split
//! across this directory the same way the pipeline is layered:
//!
//! - `helpers`: type layout, fresh names, coercions, slot copies
//! - `expr`: expression lowering to `Value`s
//! - `stmt`: statement lowering and block termination tracking
//! - `emit`: per-function emission and signature assembly
//! - `runtime_decls`: runtime declarations and the builtin C stub
//!
//! `ModuleEmitter` owns all module-level state (analyzer handle, string
//! literal interning, emitted text) and is passed explicitly to every
//! emission routine; there is no global state.

use anyhow::Result;
use rx_ast::{Item, Module, TypeRef};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::types::SemanticAnalyzer;
use crate::CompileOptions;

mod emit;
mod expr;
mod helpers;
pub mod runtime_decls;
mod stmt;

/// IR-level type of a lowered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrType {
    I64,
    I1,
    Ptr,
}

impl IrType {
    pub fn as_str(self) -> &'static str {
        match self {
            IrType::I64 => "i64",
            IrType::I1 => "i1",
            IrType::Ptr => "ptr",
        }
    }
}

/// A lowered expression result: a symbolic SSA name or literal plus the
/// metadata lowering needs to consume it correctly.
#[derive(Debug, Clone)]
pub struct Value {
    /// The SSA name (`%t7`) or inline constant (`42`).
    pub name: String,
    pub ty: IrType,
    /// True when `name` is a pointer to addressable storage (assignment
    /// targets, `&` operands, auto-deref sources).
    pub is_lvalue_ptr: bool,
    /// True when the pointer comes from an `alloca [N x i64]`, which keeps
    /// GEPs on it typed against the array.
    pub array_alloca: bool,
    /// Total slots behind the pointer when it denotes an aggregate.
    pub slots: usize,
}

impl Value {
    /// An inline `i64` constant; emits no instructions.
    pub fn imm(n: i64) -> Value {
        Value {
            name: n.to_string(),
            ty: IrType::I64,
            is_lvalue_ptr: false,
            array_alloca: false,
            slots: 1,
        }
    }

    /// A scalar `i64` temporary.
    pub fn scalar(name: String) -> Value {
        Value {
            name,
            ty: IrType::I64,
            is_lvalue_ptr: false,
            array_alloca: false,
            slots: 1,
        }
    }

    /// An `i1` temporary.
    pub fn boolean(name: String) -> Value {
        Value {
            name,
            ty: IrType::I1,
            is_lvalue_ptr: false,
            array_alloca: false,
            slots: 1,
        }
    }

    /// Placeholder result for value-less contexts (e.g. a call to `exit`).
    pub fn fallback() -> Value {
        Value::imm(0)
    }
}

/// Memory layout of a source type in 64-bit slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLayout {
    /// Number of i64 slots occupied.
    pub slots: usize,
    /// True for structs, tuples, and arrays.
    pub aggregate: bool,
    /// True for arrays (including array-typed fields).
    pub array_like: bool,
}

impl TypeLayout {
    pub const SCALAR: TypeLayout = TypeLayout {
        slots: 1,
        aggregate: false,
        array_like: false,
    };
}

/// Per-variable lowering state.
#[derive(Debug, Clone)]
pub struct VarInfo {
    pub ty: TypeRef,
    /// Layout of the stored value (for references, of the referent).
    pub layout: TypeLayout,
    /// Pointer to the variable's storage, or the aliased target pointer for
    /// non-slot reference bindings.
    pub ptr: String,
    pub array_alloca: bool,
    /// True when the variable binds a reference (a raw pointer).
    pub is_ref_binding: bool,
    /// True when the reference pointer itself lives in an `alloca ptr` slot
    /// and must be reloaded at each use.
    pub ref_is_raw_slot: bool,
}

/// Per-function mutable emission state, created at function entry and
/// discarded once the function text is assembled.
pub struct FunctionCtx {
    pub name: String,
    pub returns_void: bool,
    pub aggregate_return: bool,
    pub ret_layout: TypeLayout,
    /// The sret parameter name when `aggregate_return` is set.
    pub ret_ptr: String,
    temp_id: u32,
    label_id: u32,
    /// Instruction text for everything after the entry allocas.
    pub body: String,
    /// Alloca lines hoisted to the entry block.
    pub entry_allocas: Vec<String>,
    pub current_label: String,
    /// True once the current block has a terminator; further instructions
    /// are suppressed until a new label is started.
    pub terminated: bool,
    pub vars: HashMap<String, VarInfo>,
    pub break_label: Option<String>,
    pub continue_label: Option<String>,
    /// Alloca names already handed out, to keep shadowed locals distinct.
    slot_names: HashSet<String>,
}

impl FunctionCtx {
    pub fn new(name: &str) -> Self {
        FunctionCtx {
            name: name.to_string(),
            returns_void: false,
            aggregate_return: false,
            ret_layout: TypeLayout::SCALAR,
            ret_ptr: String::new(),
            temp_id: 0,
            label_id: 0,
            body: String::new(),
            entry_allocas: Vec::new(),
            current_label: "entry".to_string(),
            terminated: false,
            vars: HashMap::new(),
            break_label: None,
            continue_label: None,
            slot_names: HashSet::new(),
        }
    }
}

/// Module-level emission state for a single compilation.
pub struct ModuleEmitter<'a> {
    pub analyzer: &'a SemanticAnalyzer,
    target_triple: String,
    target_datalayout: String,
    /// Interned string literal contents -> global name.
    string_literals: HashMap<String, String>,
    next_str_id: u32,
    /// Emitted `@.str.N` global definitions.
    string_globals: String,
    /// Emitted function definitions, in declaration order.
    functions: String,
}

impl<'a> ModuleEmitter<'a> {
    pub fn new(analyzer: &'a SemanticAnalyzer, options: &CompileOptions) -> Self {
        ModuleEmitter {
            analyzer,
            target_triple: options
                .target_triple
                .clone()
                .unwrap_or_else(|| runtime_decls::DEFAULT_TRIPLE.to_string()),
            target_datalayout: options
                .target_datalayout
                .clone()
                .unwrap_or_else(|| runtime_decls::DEFAULT_DATALAYOUT.to_string()),
            string_literals: HashMap::new(),
            next_str_id: 0,
            string_globals: String::new(),
            functions: String::new(),
        }
    }

    /// Assemble the final module text: target strings, string globals, the
    /// runtime declarations, synthesized prototypes for called-but-undefined
    /// functions, then the function definitions.
    fn finish(self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "target datalayout = \"{}\"", self.target_datalayout);
        let _ = writeln!(out, "target triple = \"{}\"", self.target_triple);
        out.push('\n');

        if !self.string_globals.is_empty() {
            out.push_str(&self.string_globals);
            out.push('\n');
        }

        out.push_str(runtime_decls::runtime_declarations());

        let mut externs: Vec<(&String, &usize)> = self
            .analyzer
            .decl_arity()
            .iter()
            .filter(|(name, _)| {
                self.analyzer.fn_sig(name.as_str()).is_none()
                    && !runtime_decls::is_runtime_fn(name.as_str())
            })
            .collect();
        externs.sort();
        for (name, arity) in externs {
            let params = vec!["i64"; *arity].join(", ");
            let _ = writeln!(out, "declare i64 @{}({})", name, params);
        }
        out.push('\n');

        out.push_str(&self.functions);
        out
    }
}

/// Lower a whole analyzed module to LLVM IR text. This is the unwind
/// boundary for code generation: any error discards the partial buffers.
pub fn generate_ir(
    module: &Module,
    analyzer: &SemanticAnalyzer,
    options: &CompileOptions,
) -> Result<String> {
    let mut emitter = ModuleEmitter::new(analyzer, options);
    for item in &module.items {
        if let Item::Fn(f) = item {
            emitter.emit_function(f)?;
        }
    }
    Ok(emitter.finish())
}
