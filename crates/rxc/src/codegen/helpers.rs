//! Small helper utilities used across codegen lowering.
//!
//! This module centralizes the ABI decisions of the word-addressed memory
//! model: type layout computation, fresh temp/label naming, the
//! i1 <-> i64 coercions, slot addressing, and word-by-word aggregate
//! copies. Lowering code calls these instead of formatting instructions
//! directly so the decisions stay consistent.

use anyhow::{bail, Result};
use rx_ast::TypeRef;
use std::fmt::Write as _;

use super::{FunctionCtx, IrType, ModuleEmitter, TypeLayout, Value};

impl FunctionCtx {
    /// Next `%tN` temporary name; unique within the function.
    pub fn fresh_temp(&mut self) -> String {
        let id = self.temp_id;
        self.temp_id += 1;
        format!("%t{}", id)
    }

    /// Next label with the given prefix (`if.then3`); unique within the
    /// function.
    pub fn fresh_label(&mut self, prefix: &str) -> String {
        let id = self.label_id;
        self.label_id += 1;
        format!("{}{}", prefix, id)
    }

    /// Append one instruction to the current block. Suppressed when the
    /// block already has a terminator.
    pub fn line(&mut self, text: &str) {
        if !self.terminated {
            self.body.push_str("  ");
            self.body.push_str(text);
            self.body.push('\n');
        }
    }

    /// Append the block terminator and mark the block closed.
    pub fn terminate(&mut self, text: &str) {
        if !self.terminated {
            self.body.push_str("  ");
            self.body.push_str(text);
            self.body.push('\n');
            self.terminated = true;
        }
    }

    /// Open a new labeled block; emission resumes.
    pub fn start_block(&mut self, label: &str) {
        let _ = writeln!(self.body, "{}:", label);
        self.current_label = label.to_string();
        self.terminated = false;
    }

    /// Hoist an alloca instruction to the entry block.
    pub fn entry_alloca(&mut self, text: String) {
        self.entry_allocas.push(text);
    }

    /// Storage slot name for a source variable, kept unique across
    /// shadowing re-declarations.
    pub fn named_slot(&mut self, name: &str) -> String {
        let mut candidate = format!("%{}.addr", name);
        let mut n = 1;
        while self.slot_names.contains(&candidate) {
            candidate = format!("%{}.addr.{}", name, n);
            n += 1;
        }
        self.slot_names.insert(candidate.clone());
        candidate
    }
}

impl<'a> ModuleEmitter<'a> {
    /// Memory layout of a source type. Pure: depends only on the type and
    /// the module's struct table.
    pub fn layout_of(&self, ty: &TypeRef) -> Result<TypeLayout> {
        match ty {
            TypeRef::I64 | TypeRef::Bool | TypeRef::Str | TypeRef::Ref { .. } => {
                Ok(TypeLayout::SCALAR)
            }
            TypeRef::Unit => Ok(TypeLayout {
                slots: 0,
                aggregate: false,
                array_like: false,
            }),
            TypeRef::Array(elem, len) => {
                let elem_layout = self.layout_of(elem)?;
                Ok(TypeLayout {
                    slots: elem_layout.slots * len,
                    aggregate: true,
                    array_like: true,
                })
            }
            TypeRef::Tuple(fields) => {
                let mut slots = 0;
                for f in fields {
                    slots += self.layout_of(f)?.slots;
                }
                Ok(TypeLayout {
                    slots,
                    aggregate: true,
                    array_like: false,
                })
            }
            TypeRef::Named(name) => {
                let mut slots = 0;
                for (_, fty) in self.analyzer.struct_fields(name)? {
                    slots += self.layout_of(fty)?.slots;
                }
                Ok(TypeLayout {
                    slots,
                    aggregate: true,
                    array_like: false,
                })
            }
        }
    }

    /// True when values of this type travel by address at call boundaries:
    /// explicit references and all aggregates.
    pub fn needs_by_ref(&self, ty: &TypeRef) -> Result<bool> {
        Ok(ty.is_ref() || self.layout_of(ty)?.aggregate)
    }

    /// Slot offset of a struct field, in i64 words, with its type.
    pub fn field_offset(&self, struct_name: &str, field: &str) -> Result<(usize, TypeRef)> {
        let mut offset = 0;
        for (name, fty) in self.analyzer.struct_fields(struct_name)? {
            if name == field {
                return Ok((offset, fty.clone()));
            }
            offset += self.layout_of(fty)?.slots;
        }
        bail!("struct `{}` has no field `{}`", struct_name, field)
    }

    /// Slot offset of a tuple field, in i64 words.
    pub fn tuple_offset(&self, fields: &[TypeRef], index: usize) -> Result<usize> {
        let mut offset = 0;
        for fty in &fields[..index] {
            offset += self.layout_of(fty)?.slots;
        }
        Ok(offset)
    }

    /// Allocate an aggregate temporary of `slots` words in the entry block.
    pub fn alloc_aggregate(&mut self, fx: &mut FunctionCtx, slots: usize) -> Value {
        let name = fx.fresh_temp();
        fx.entry_alloca(format!("{} = alloca [{} x i64]", name, slots));
        Value {
            name,
            ty: IrType::Ptr,
            is_lvalue_ptr: false,
            array_alloca: true,
            slots,
        }
    }

    /// Address of slot `offset` (an i64 operand: a constant or a register)
    /// behind `base`. A zero offset on a plain pointer reuses the base.
    pub fn slot_ptr(&mut self, fx: &mut FunctionCtx, base: &Value, offset: &str) -> String {
        if base.array_alloca {
            let tmp = fx.fresh_temp();
            fx.line(&format!(
                "{} = getelementptr inbounds [{} x i64], ptr {}, i64 0, i64 {}",
                tmp, base.slots, base.name, offset
            ));
            tmp
        } else if offset == "0" {
            base.name.clone()
        } else {
            let tmp = fx.fresh_temp();
            fx.line(&format!(
                "{} = getelementptr inbounds i64, ptr {}, i64 {}",
                tmp, base.name, offset
            ));
            tmp
        }
    }

    /// Convert a value to a scalar rvalue, loading through lvalue pointers.
    pub fn scalar_value(&mut self, fx: &mut FunctionCtx, v: &Value) -> Value {
        if v.is_lvalue_ptr {
            let tmp = fx.fresh_temp();
            fx.line(&format!("{} = load i64, ptr {}", tmp, v.name));
            Value::scalar(tmp)
        } else {
            v.clone()
        }
    }

    /// Widen an `i1` to `i64`; other values pass through as scalars.
    pub fn to_i64(&mut self, fx: &mut FunctionCtx, v: &Value) -> Value {
        let v = self.scalar_value(fx, v);
        if v.ty == IrType::I1 {
            let tmp = fx.fresh_temp();
            fx.line(&format!("{} = zext i1 {} to i64", tmp, v.name));
            Value::scalar(tmp)
        } else {
            v
        }
    }

    /// Narrow a value to `i1`, comparing `i64` against zero when needed.
    pub fn ensure_bool(&mut self, fx: &mut FunctionCtx, v: &Value) -> Value {
        let v = self.scalar_value(fx, v);
        if v.ty == IrType::I1 {
            v
        } else {
            let tmp = fx.fresh_temp();
            fx.line(&format!("{} = icmp ne i64 {}, 0", tmp, v.name));
            Value::boolean(tmp)
        }
    }

    /// Copy `count` i64 words from `src` to `dst`, word by word.
    pub fn copy_slots(&mut self, fx: &mut FunctionCtx, src: &Value, dst: &Value, count: usize) {
        for k in 0..count {
            let offset = k.to_string();
            let src_ptr = self.slot_ptr(fx, src, &offset);
            let tmp = fx.fresh_temp();
            fx.line(&format!("{} = load i64, ptr {}", tmp, src_ptr));
            let dst_ptr = self.slot_ptr(fx, dst, &offset);
            fx.line(&format!("store i64 {}, ptr {}", tmp, dst_ptr));
        }
    }

    /// Intern a string literal, emitting its global on first use. Returns
    /// the global's name.
    pub fn intern_string(&mut self, content: &str) -> String {
        if let Some(existing) = self.string_literals.get(content) {
            return existing.clone();
        }
        let name = format!("@.str.{}", self.next_str_id);
        self.next_str_id += 1;
        let bytes = content.as_bytes();
        let mut encoded = String::new();
        for &b in bytes {
            match b {
                b'\\' => encoded.push_str("\\5C"),
                b'"' => encoded.push_str("\\22"),
                0x20..=0x7E => encoded.push(b as char),
                other => {
                    let _ = write!(encoded, "\\{:02X}", other);
                }
            }
        }
        let _ = writeln!(
            self.string_globals,
            "{} = private unnamed_addr constant [{} x i8] c\"{}\\00\"",
            name,
            bytes.len() + 1,
            encoded
        );
        self.string_literals.insert(content.to_string(), name.clone());
        name
    }
}
