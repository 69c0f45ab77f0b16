//! Per-function emission: signature assembly, parameter binding, body
//! lowering, and the fall-off-the-end default terminator.

use anyhow::{anyhow, Result};
use rx_ast::{FnDecl, TypeRef};
use std::fmt::Write as _;

use super::{FunctionCtx, ModuleEmitter, TypeLayout, VarInfo};

impl<'a> ModuleEmitter<'a> {
    pub fn emit_function(&mut self, f: &FnDecl) -> Result<()> {
        let name = f.ident.name.clone();
        let sig = self
            .analyzer
            .fn_sig(&name)
            .cloned()
            .ok_or_else(|| anyhow!("no signature recorded for fn `{}`", name))?;

        let is_main = name == "main";
        let ret_layout = self.layout_of(&sig.ret)?;

        let mut fx = FunctionCtx::new(&name);
        fx.returns_void = sig.ret == TypeRef::Unit;
        fx.aggregate_return = ret_layout.aggregate;
        fx.ret_layout = ret_layout;
        if fx.aggregate_return {
            fx.ret_ptr = "%sret".to_string();
        }

        // Signature: aggregate returns become a leading out-pointer and a
        // void IR return type; every scalar travels as i64.
        let ret_ir = if is_main {
            "i32"
        } else if fx.aggregate_return || fx.returns_void {
            "void"
        } else {
            "i64"
        };
        let mut params = Vec::new();
        if fx.aggregate_return {
            params.push("ptr %sret".to_string());
        }
        for (i, p) in f.params.iter().enumerate() {
            let ir_ty = if self.needs_by_ref(&p.ty)? { "ptr" } else { "i64" };
            params.push(format!("{} %arg{}", ir_ty, i));
        }

        // Bind parameters. Scalars are stored to entry allocas so they are
        // addressable and mutable; reference parameters store their pointer
        // in a slot and reload it at each use; aggregate parameters arrive
        // as pointers to caller-owned (or caller-copied) storage.
        for (i, p) in f.params.iter().enumerate() {
            let incoming = format!("%arg{}", i);
            match &p.ty {
                TypeRef::Ref { inner, .. } => {
                    let referent_layout = self.layout_of(inner)?;
                    let slot = fx.named_slot(&p.ident.name);
                    fx.entry_alloca(format!("{} = alloca ptr", slot));
                    fx.line(&format!("store ptr {}, ptr {}", incoming, slot));
                    fx.vars.insert(
                        p.ident.name.clone(),
                        VarInfo {
                            ty: p.ty.clone(),
                            layout: referent_layout,
                            ptr: slot,
                            array_alloca: false,
                            is_ref_binding: true,
                            ref_is_raw_slot: true,
                        },
                    );
                }
                ty => {
                    let layout = self.layout_of(ty)?;
                    if layout.aggregate {
                        fx.vars.insert(
                            p.ident.name.clone(),
                            VarInfo {
                                ty: ty.clone(),
                                layout,
                                ptr: incoming,
                                array_alloca: true,
                                is_ref_binding: false,
                                ref_is_raw_slot: false,
                            },
                        );
                    } else {
                        let slot = fx.named_slot(&p.ident.name);
                        fx.entry_alloca(format!("{} = alloca i64", slot));
                        fx.line(&format!("store i64 {}, ptr {}", incoming, slot));
                        fx.vars.insert(
                            p.ident.name.clone(),
                            VarInfo {
                                ty: ty.clone(),
                                layout: TypeLayout::SCALAR,
                                ptr: slot,
                                array_alloca: false,
                                is_ref_binding: false,
                                ref_is_raw_slot: false,
                            },
                        );
                    }
                }
            }
        }

        self.emit_block(&mut fx, &f.body, f.body.tail.is_some())?;

        // Fall-off-the-end default terminator. A non-void function reaching
        // here is an upstream invariant violation, closed with unreachable.
        if !fx.terminated {
            if is_main {
                fx.terminate("ret i32 0");
            } else if fx.returns_void && !fx.aggregate_return {
                fx.terminate("ret void");
            } else {
                fx.terminate("unreachable");
            }
        }

        let _ = writeln!(
            self.functions,
            "define {} @{}({}) {{",
            ret_ir,
            name,
            params.join(", ")
        );
        self.functions.push_str("entry:\n");
        for alloca in &fx.entry_allocas {
            self.functions.push_str("  ");
            self.functions.push_str(alloca);
            self.functions.push('\n');
        }
        self.functions.push_str(&fx.body);
        self.functions.push_str("}\n\n");
        Ok(())
    }
}
