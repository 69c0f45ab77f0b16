//! Statement lowering.
//!
//! `emit_stmt` appends instructions for one statement; control-flow
//! statements open fresh labeled blocks and every block ends with exactly
//! one terminator. After a `return`/`break`/`continue`, the `terminated`
//! flag suppresses further emission until the next label starts, which
//! drops unreachable code at emission time.

use anyhow::{bail, Result};
use rx_ast::*;

use super::{FunctionCtx, IrType, ModuleEmitter, Value, VarInfo};

impl<'a> ModuleEmitter<'a> {
    /// Lower a block's statements. Bindings introduced inside the block go
    /// out of scope on exit; shadowed outer bindings are restored. The
    /// trailing expression is evaluated for its value only when the caller
    /// asks (`tail_is_return` makes it the function's return value).
    pub fn emit_block(
        &mut self,
        fx: &mut FunctionCtx,
        block: &Block,
        tail_is_return: bool,
    ) -> Result<()> {
        let saved_vars = fx.vars.clone();
        for stmt in &block.stmts {
            self.emit_stmt(fx, stmt)?;
        }
        if let Some(tail) = &block.tail {
            if tail_is_return {
                self.emit_return_value(fx, Some(tail))?;
            } else {
                self.emit_expr(fx, tail)?;
            }
        }
        fx.vars = saved_vars;
        Ok(())
    }

    pub fn emit_stmt(&mut self, fx: &mut FunctionCtx, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Let(l) => self.emit_let(fx, l),
            Stmt::Assign(a) => self.emit_assign(fx, a),
            Stmt::Expr(e) => {
                self.emit_expr(fx, &e.expr)?;
                Ok(())
            }
            Stmt::If(i) => self.emit_if(fx, i),
            Stmt::While(w) => self.emit_while(fx, w),
            Stmt::Loop(l) => self.emit_loop(fx, l),
            Stmt::Break(_) => {
                match fx.break_label.clone() {
                    Some(label) => fx.terminate(&format!("br label %{}", label)),
                    None => bail!("`break` lowered outside of a loop"),
                }
                Ok(())
            }
            Stmt::Continue(_) => {
                match fx.continue_label.clone() {
                    Some(label) => fx.terminate(&format!("br label %{}", label)),
                    None => bail!("`continue` lowered outside of a loop"),
                }
                Ok(())
            }
            Stmt::Return(r) => self.emit_return_value(fx, r.arg.as_ref()),
            Stmt::Block(b) => self.emit_block(fx, b, false),
        }
    }

    fn emit_let(&mut self, fx: &mut FunctionCtx, l: &LetStmt) -> Result<()> {
        let ty = match &l.ty {
            Some(declared) => declared.clone(),
            None => self.analyzer.expr_type(&l.init)?,
        };

        if let TypeRef::Ref { inner, .. } = &ty {
            // Reference binding: the variable names a pointer. A `mut`
            // binding stores the pointer in its own slot so it can be
            // re-pointed; otherwise the binding aliases the target.
            let referent_layout = self.layout_of(inner)?;
            let v = self.emit_expr(fx, &l.init)?;
            if l.mutable {
                let slot = fx.named_slot(&l.ident.name);
                fx.entry_alloca(format!("{} = alloca ptr", slot));
                fx.line(&format!("store ptr {}, ptr {}", v.name, slot));
                fx.vars.insert(
                    l.ident.name.clone(),
                    VarInfo {
                        ty,
                        layout: referent_layout,
                        ptr: slot,
                        array_alloca: false,
                        is_ref_binding: true,
                        ref_is_raw_slot: true,
                    },
                );
            } else {
                fx.vars.insert(
                    l.ident.name.clone(),
                    VarInfo {
                        ty,
                        layout: referent_layout,
                        ptr: v.name,
                        array_alloca: v.array_alloca,
                        is_ref_binding: true,
                        ref_is_raw_slot: false,
                    },
                );
            }
            return Ok(());
        }

        let layout = self.layout_of(&ty)?;
        let slot = fx.named_slot(&l.ident.name);
        if layout.aggregate {
            fx.entry_alloca(format!("{} = alloca [{} x i64]", slot, layout.slots));
            let dst = Value {
                name: slot.clone(),
                ty: IrType::Ptr,
                is_lvalue_ptr: true,
                array_alloca: true,
                slots: layout.slots,
            };
            let v = self.emit_expr(fx, &l.init)?;
            self.copy_slots(fx, &v, &dst, layout.slots);
        } else {
            fx.entry_alloca(format!("{} = alloca i64", slot));
            let v = self.emit_expr(fx, &l.init)?;
            let v = self.to_i64(fx, &v);
            fx.line(&format!("store i64 {}, ptr {}", v.name, slot));
        }
        fx.vars.insert(
            l.ident.name.clone(),
            VarInfo {
                ty,
                layout,
                ptr: slot,
                array_alloca: layout.aggregate,
                is_ref_binding: false,
                ref_is_raw_slot: false,
            },
        );
        Ok(())
    }

    fn emit_assign(&mut self, fx: &mut FunctionCtx, a: &AssignStmt) -> Result<()> {
        // Re-pointing a reference variable stores the new pointer into the
        // reference's own slot rather than through it.
        if let ExprKind::Var(name) = &a.target.kind {
            if let Some(info) = fx.vars.get(name).cloned() {
                if info.is_ref_binding {
                    if !info.ref_is_raw_slot {
                        bail!("reference binding `{}` has no slot to reassign", name);
                    }
                    let v = self.emit_expr(fx, &a.value)?;
                    fx.line(&format!("store ptr {}, ptr {}", v.name, info.ptr));
                    return Ok(());
                }
            }
        }

        let target = self.emit_expr(fx, &a.target)?;
        if !target.is_lvalue_ptr {
            bail!("assignment target did not lower to an lvalue address");
        }
        let target_ty = self.analyzer.expr_type(&a.target)?;
        let layout = self.layout_of(&target_ty)?;
        if layout.aggregate {
            let v = self.emit_expr(fx, &a.value)?;
            self.copy_slots(fx, &v, &target, layout.slots);
        } else {
            let v = self.emit_expr(fx, &a.value)?;
            let v = self.to_i64(fx, &v);
            fx.line(&format!("store i64 {}, ptr {}", v.name, target.name));
        }
        Ok(())
    }

    fn emit_if(&mut self, fx: &mut FunctionCtx, i: &IfStmt) -> Result<()> {
        let cond = self.emit_expr(fx, &i.cond)?;
        let cond = self.ensure_bool(fx, &cond);

        let then_label = fx.fresh_label("if.then");
        let end_label = fx.fresh_label("if.end");
        let else_label = if i.else_branch.is_some() {
            fx.fresh_label("if.else")
        } else {
            end_label.clone()
        };

        fx.terminate(&format!(
            "br i1 {}, label %{}, label %{}",
            cond.name, then_label, else_label
        ));

        fx.start_block(&then_label);
        self.emit_block(fx, &i.then_block, false)?;
        if !fx.terminated {
            fx.terminate(&format!("br label %{}", end_label));
        }

        if let Some(else_branch) = &i.else_branch {
            fx.start_block(&else_label);
            self.emit_stmt(fx, else_branch)?;
            if !fx.terminated {
                fx.terminate(&format!("br label %{}", end_label));
            }
        }

        fx.start_block(&end_label);
        Ok(())
    }

    fn emit_while(&mut self, fx: &mut FunctionCtx, w: &WhileStmt) -> Result<()> {
        let cond_label = fx.fresh_label("while.cond");
        let body_label = fx.fresh_label("while.body");
        let end_label = fx.fresh_label("while.end");

        fx.terminate(&format!("br label %{}", cond_label));

        fx.start_block(&cond_label);
        let cond = self.emit_expr(fx, &w.cond)?;
        let cond = self.ensure_bool(fx, &cond);
        fx.terminate(&format!(
            "br i1 {}, label %{}, label %{}",
            cond.name, body_label, end_label
        ));

        fx.start_block(&body_label);
        let saved_break = fx.break_label.replace(end_label.clone());
        let saved_continue = fx.continue_label.replace(cond_label.clone());
        self.emit_block(fx, &w.body, false)?;
        fx.break_label = saved_break;
        fx.continue_label = saved_continue;
        if !fx.terminated {
            fx.terminate(&format!("br label %{}", cond_label));
        }

        fx.start_block(&end_label);
        Ok(())
    }

    fn emit_loop(&mut self, fx: &mut FunctionCtx, l: &LoopStmt) -> Result<()> {
        let body_label = fx.fresh_label("loop.body");
        let end_label = fx.fresh_label("loop.end");

        fx.terminate(&format!("br label %{}", body_label));

        fx.start_block(&body_label);
        let saved_break = fx.break_label.replace(end_label.clone());
        let saved_continue = fx.continue_label.replace(body_label.clone());
        self.emit_block(fx, &l.body, false)?;
        fx.break_label = saved_break;
        fx.continue_label = saved_continue;
        if !fx.terminated {
            fx.terminate(&format!("br label %{}", body_label));
        }

        fx.start_block(&end_label);
        Ok(())
    }

    /// Lower a return: store through the sret pointer for aggregates,
    /// `ret i64` for scalars, `ret void` (or `ret i32 0` in `main`) for
    /// value-less returns.
    pub fn emit_return_value(&mut self, fx: &mut FunctionCtx, arg: Option<&Expr>) -> Result<()> {
        if fx.aggregate_return {
            let arg = match arg {
                Some(arg) => arg,
                None => bail!("missing return value for aggregate-returning function"),
            };
            let v = self.emit_expr(fx, arg)?;
            let dst = Value {
                name: fx.ret_ptr.clone(),
                ty: IrType::Ptr,
                is_lvalue_ptr: false,
                array_alloca: false,
                slots: fx.ret_layout.slots,
            };
            self.copy_slots(fx, &v, &dst, fx.ret_layout.slots);
            fx.terminate("ret void");
        } else if fx.name == "main" {
            if let Some(arg) = arg {
                self.emit_expr(fx, arg)?;
            }
            fx.terminate("ret i32 0");
        } else if fx.returns_void {
            if let Some(arg) = arg {
                self.emit_expr(fx, arg)?;
            }
            fx.terminate("ret void");
        } else {
            let arg = match arg {
                Some(arg) => arg,
                None => bail!("missing return value for value-returning function"),
            };
            let v = self.emit_expr(fx, arg)?;
            let v = self.to_i64(fx, &v);
            fx.terminate(&format!("ret i64 {}", v.name));
        }
        Ok(())
    }
}
