//! Expression lowering.
//!
//! `emit_expr` translates one expression node into a `Value`, appending
//! instructions to the function body. Scalars produce `i64`/`i1` rvalues;
//! place expressions (variables, field access, indexing, `*`) produce
//! lvalue pointers that consumers load through on demand; `&`/`&mut`
//! return the place's pointer as a plain rvalue.

use anyhow::{bail, Result};
use rx_ast::*;

use super::{FunctionCtx, IrType, ModuleEmitter, Value};
use crate::types::{builtin_sig, FunctionSig};

/// Fold literal integer expressions (including unary minus chains) so they
/// lower to inline constants without emitting instructions.
pub fn const_int(expr: &Expr) -> Option<i64> {
    match &expr.kind {
        ExprKind::Int(n) => Some(*n),
        ExprKind::Unary(u) if u.op == UnaryOp::Neg => const_int(&u.expr).map(i64::wrapping_neg),
        _ => None,
    }
}

impl<'a> ModuleEmitter<'a> {
    pub fn emit_expr(&mut self, fx: &mut FunctionCtx, expr: &Expr) -> Result<Value> {
        if let Some(n) = const_int(expr) {
            return Ok(Value::imm(n));
        }
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::imm(*n)),
            ExprKind::Bool(b) => {
                let name = if *b { "1" } else { "0" };
                Ok(Value::boolean(name.to_string()))
            }
            ExprKind::Str(s) => {
                let global = self.intern_string(s);
                Ok(Value {
                    name: global,
                    ty: IrType::Ptr,
                    is_lvalue_ptr: false,
                    array_alloca: false,
                    slots: 1,
                })
            }
            ExprKind::Var(name) => self.emit_var(fx, name),
            ExprKind::Unary(u) => self.emit_unary(fx, u),
            ExprKind::Binary(b) => self.emit_binary(fx, b),
            ExprKind::Call(call) => self.emit_call(fx, call),
            ExprKind::Field(f) => self.emit_field(fx, f),
            ExprKind::Index(idx) => self.emit_index(fx, expr, idx),
            ExprKind::Tuple(elems) => self.emit_aggregate_literal(fx, expr, elems),
            ExprKind::Array(elems) => self.emit_aggregate_literal(fx, expr, elems),
            ExprKind::Repeat(r) => self.emit_repeat(fx, expr, r),
            ExprKind::StructLit(lit) => self.emit_struct_literal(fx, expr, lit),
            ExprKind::Ref { expr: inner, .. } => {
                let v = self.emit_expr(fx, inner)?;
                if v.ty != IrType::Ptr {
                    bail!("cannot take the address of a non-place expression");
                }
                Ok(Value {
                    name: v.name,
                    ty: IrType::Ptr,
                    is_lvalue_ptr: false,
                    array_alloca: v.array_alloca,
                    slots: v.slots,
                })
            }
            ExprKind::Deref(inner) => {
                let v = self.emit_expr(fx, inner)?;
                let referent = self.analyzer.expr_type(expr)?;
                let layout = self.layout_of(&referent)?;
                if v.is_lvalue_ptr {
                    // The pointer itself lives in addressable storage.
                    let tmp = fx.fresh_temp();
                    fx.line(&format!("{} = load ptr, ptr {}", tmp, v.name));
                    Ok(Value {
                        name: tmp,
                        ty: IrType::Ptr,
                        is_lvalue_ptr: true,
                        array_alloca: false,
                        slots: layout.slots,
                    })
                } else {
                    Ok(Value {
                        name: v.name,
                        ty: IrType::Ptr,
                        is_lvalue_ptr: true,
                        array_alloca: v.array_alloca,
                        slots: layout.slots,
                    })
                }
            }
        }
    }

    fn emit_var(&mut self, fx: &mut FunctionCtx, name: &str) -> Result<Value> {
        let info = match fx.vars.get(name) {
            Some(info) => info.clone(),
            None => bail!("no storage recorded for variable `{}`", name),
        };
        if info.is_ref_binding {
            if info.ref_is_raw_slot {
                // The reference pointer is stored in its own slot.
                let tmp = fx.fresh_temp();
                fx.line(&format!("{} = load ptr, ptr {}", tmp, info.ptr));
                Ok(Value {
                    name: tmp,
                    ty: IrType::Ptr,
                    is_lvalue_ptr: false,
                    array_alloca: false,
                    slots: info.layout.slots,
                })
            } else {
                Ok(Value {
                    name: info.ptr,
                    ty: IrType::Ptr,
                    is_lvalue_ptr: false,
                    array_alloca: info.array_alloca,
                    slots: info.layout.slots,
                })
            }
        } else {
            Ok(Value {
                name: info.ptr,
                ty: IrType::Ptr,
                is_lvalue_ptr: true,
                array_alloca: info.array_alloca,
                slots: info.layout.slots,
            })
        }
    }

    fn emit_unary(&mut self, fx: &mut FunctionCtx, u: &UnaryExpr) -> Result<Value> {
        match u.op {
            UnaryOp::Neg => {
                let v = self.emit_expr(fx, &u.expr)?;
                let v = self.to_i64(fx, &v);
                let tmp = fx.fresh_temp();
                fx.line(&format!("{} = sub i64 0, {}", tmp, v.name));
                Ok(Value::scalar(tmp))
            }
            UnaryOp::Not => {
                let v = self.emit_expr(fx, &u.expr)?;
                let b = self.ensure_bool(fx, &v);
                let tmp = fx.fresh_temp();
                fx.line(&format!("{} = xor i1 {}, 1", tmp, b.name));
                Ok(Value::boolean(tmp))
            }
        }
    }

    fn emit_binary(&mut self, fx: &mut FunctionCtx, b: &BinaryExpr) -> Result<Value> {
        if b.op.is_logical() {
            return self.emit_short_circuit(fx, b);
        }
        let lhs = self.emit_expr(fx, &b.left)?;
        let lhs = self.to_i64(fx, &lhs);
        let rhs = self.emit_expr(fx, &b.right)?;
        let rhs = self.to_i64(fx, &rhs);
        let tmp = fx.fresh_temp();
        if b.op.is_comparison() {
            let pred = match b.op {
                BinaryOp::Eq => "eq",
                BinaryOp::Ne => "ne",
                BinaryOp::Lt => "slt",
                BinaryOp::Le => "sle",
                BinaryOp::Gt => "sgt",
                BinaryOp::Ge => "sge",
                _ => unreachable!(),
            };
            fx.line(&format!(
                "{} = icmp {} i64 {}, {}",
                tmp, pred, lhs.name, rhs.name
            ));
            Ok(Value::boolean(tmp))
        } else {
            let opcode = match b.op {
                BinaryOp::Add => "add",
                BinaryOp::Sub => "sub",
                BinaryOp::Mul => "mul",
                BinaryOp::Div => "sdiv",
                BinaryOp::Rem => "srem",
                _ => unreachable!(),
            };
            fx.line(&format!(
                "{} = {} i64 {}, {}",
                tmp, opcode, lhs.name, rhs.name
            ));
            Ok(Value::scalar(tmp))
        }
    }

    /// `&&`/`||` lower through an entry-hoisted result slot and a fresh
    /// rhs/end block pair, so the right operand only evaluates when the
    /// left one did not already decide the result.
    fn emit_short_circuit(&mut self, fx: &mut FunctionCtx, b: &BinaryExpr) -> Result<Value> {
        let slot = fx.fresh_temp();
        fx.entry_alloca(format!("{} = alloca i64", slot));

        let prefix = if b.op == BinaryOp::And { "and" } else { "or" };
        let rhs_label = fx.fresh_label(&format!("{}.rhs", prefix));
        let end_label = fx.fresh_label(&format!("{}.end", prefix));

        let lhs = self.emit_expr(fx, &b.left)?;
        let lhs_b = self.ensure_bool(fx, &lhs);
        let lhs_i = self.to_i64(fx, &lhs_b);
        fx.line(&format!("store i64 {}, ptr {}", lhs_i.name, slot));
        if b.op == BinaryOp::And {
            fx.terminate(&format!(
                "br i1 {}, label %{}, label %{}",
                lhs_b.name, rhs_label, end_label
            ));
        } else {
            fx.terminate(&format!(
                "br i1 {}, label %{}, label %{}",
                lhs_b.name, end_label, rhs_label
            ));
        }

        fx.start_block(&rhs_label);
        let rhs = self.emit_expr(fx, &b.right)?;
        let rhs_b = self.ensure_bool(fx, &rhs);
        let rhs_i = self.to_i64(fx, &rhs_b);
        fx.line(&format!("store i64 {}, ptr {}", rhs_i.name, slot));
        fx.terminate(&format!("br label %{}", end_label));

        fx.start_block(&end_label);
        let loaded = fx.fresh_temp();
        fx.line(&format!("{} = load i64, ptr {}", loaded, slot));
        let result = fx.fresh_temp();
        fx.line(&format!("{} = icmp ne i64 {}, 0", result, loaded));
        Ok(Value::boolean(result))
    }

    fn emit_call(&mut self, fx: &mut FunctionCtx, call: &CallExpr) -> Result<Value> {
        let name = call.callee.name.as_str();
        let sig = if let Some(sig) = self.analyzer.fn_sig(name) {
            sig.clone()
        } else if let Some(sig) = builtin_sig(name) {
            sig
        } else {
            FunctionSig {
                params: vec![TypeRef::I64; call.args.len()],
                ret: TypeRef::I64,
            }
        };
        // The source-level `exit` builtin maps onto the runtime's `exit_rt`.
        let ir_name = if name == "exit" { "exit_rt" } else { name };

        let mut call_args: Vec<String> = Vec::with_capacity(call.args.len() + 1);
        for (arg, param_ty) in call.args.iter().zip(&sig.params) {
            let layout = self.layout_of(param_ty)?;
            if layout.aggregate {
                // Aggregates travel by address. A by-value formal gets the
                // address of a fresh caller-side copy; rvalue temporaries
                // already have private storage.
                let v = self.emit_expr(fx, arg)?;
                let passed = if v.is_lvalue_ptr {
                    let copy = self.alloc_aggregate(fx, layout.slots);
                    self.copy_slots(fx, &v, &copy, layout.slots);
                    copy.name
                } else {
                    v.name
                };
                call_args.push(format!("ptr {}", passed));
            } else {
                match param_ty {
                    TypeRef::Ref { .. } | TypeRef::Str => {
                        let v = self.emit_expr(fx, arg)?;
                        call_args.push(format!("ptr {}", v.name));
                    }
                    _ => {
                        let v = self.emit_expr(fx, arg)?;
                        let v = self.to_i64(fx, &v);
                        call_args.push(format!("i64 {}", v.name));
                    }
                }
            }
        }

        let ret_layout = self.layout_of(&sig.ret)?;
        if ret_layout.aggregate {
            // Aggregate returns go through a caller-allocated result slot
            // prepended as the first argument; the call itself is void.
            let slot = self.alloc_aggregate(fx, ret_layout.slots);
            let mut full_args = vec![format!("ptr {}", slot.name)];
            full_args.extend(call_args);
            fx.line(&format!(
                "call void @{}({})",
                ir_name,
                full_args.join(", ")
            ));
            Ok(slot)
        } else if sig.ret == TypeRef::Unit {
            fx.line(&format!("call void @{}({})", ir_name, call_args.join(", ")));
            if ir_name == "exit_rt" {
                fx.terminate("unreachable");
            }
            Ok(Value::fallback())
        } else {
            let tmp = fx.fresh_temp();
            fx.line(&format!(
                "{} = call i64 @{}({})",
                tmp,
                ir_name,
                call_args.join(", ")
            ));
            Ok(Value::scalar(tmp))
        }
    }

    fn emit_field(&mut self, fx: &mut FunctionCtx, f: &FieldExpr) -> Result<Value> {
        let base_ty = self.analyzer.expr_type(&f.base)?;
        let stripped = base_ty.strip_ref().clone();
        let base_v = self.emit_expr(fx, &f.base)?;
        let (offset, member_ty) = match (&stripped, &f.member) {
            (TypeRef::Tuple(fields), FieldMember::Index(i)) => {
                (self.tuple_offset(fields, *i)?, fields[*i].clone())
            }
            (TypeRef::Named(name), FieldMember::Named(field)) => self.field_offset(name, field)?,
            _ => bail!("unsupported field access on {:?}", stripped),
        };
        let member_layout = self.layout_of(&member_ty)?;
        let ptr = self.slot_ptr(fx, &base_v, &offset.to_string());
        Ok(Value {
            name: ptr,
            ty: IrType::Ptr,
            is_lvalue_ptr: true,
            array_alloca: false,
            slots: member_layout.slots,
        })
    }

    fn emit_index(&mut self, fx: &mut FunctionCtx, expr: &Expr, idx: &IndexExpr) -> Result<Value> {
        let base_v = self.emit_expr(fx, &idx.base)?;
        let index = self.emit_expr(fx, &idx.index)?;
        let index = self.to_i64(fx, &index);
        let elem_ty = self.analyzer.expr_type(expr)?;
        let elem_layout = self.layout_of(&elem_ty)?;
        let offset = if elem_layout.slots == 1 {
            index.name
        } else {
            let tmp = fx.fresh_temp();
            fx.line(&format!(
                "{} = mul i64 {}, {}",
                tmp, index.name, elem_layout.slots
            ));
            tmp
        };
        let ptr = self.slot_ptr(fx, &base_v, &offset);
        Ok(Value {
            name: ptr,
            ty: IrType::Ptr,
            is_lvalue_ptr: true,
            array_alloca: false,
            slots: elem_layout.slots,
        })
    }

    /// Tuple and array literals materialize into a fresh entry-block
    /// aggregate slot, element by element at their cumulative offsets.
    fn emit_aggregate_literal(
        &mut self,
        fx: &mut FunctionCtx,
        expr: &Expr,
        elems: &[Expr],
    ) -> Result<Value> {
        let ty = self.analyzer.expr_type(expr)?;
        let layout = self.layout_of(&ty)?;
        let base = self.alloc_aggregate(fx, layout.slots);
        let mut offset = 0;
        for e in elems {
            offset += self.store_element(fx, &base, offset, e)?;
        }
        Ok(base)
    }

    fn emit_repeat(&mut self, fx: &mut FunctionCtx, expr: &Expr, r: &RepeatExpr) -> Result<Value> {
        let ty = self.analyzer.expr_type(expr)?;
        let layout = self.layout_of(&ty)?;
        let base = self.alloc_aggregate(fx, layout.slots);

        let elem_ty = self.analyzer.expr_type(&r.elem)?;
        let elem_layout = self.layout_of(&elem_ty)?;
        // The element expression evaluates once; the value is then copied
        // into every position.
        let v = self.emit_expr(fx, &r.elem)?;
        if elem_layout.aggregate {
            for k in 0..r.len {
                let dst_ptr = self.slot_ptr(fx, &base, &(k * elem_layout.slots).to_string());
                let dst = Value {
                    name: dst_ptr,
                    ty: IrType::Ptr,
                    is_lvalue_ptr: false,
                    array_alloca: false,
                    slots: elem_layout.slots,
                };
                self.copy_slots(fx, &v, &dst, elem_layout.slots);
            }
        } else {
            let sv = self.to_i64(fx, &v);
            for k in 0..r.len {
                let dst_ptr = self.slot_ptr(fx, &base, &k.to_string());
                fx.line(&format!("store i64 {}, ptr {}", sv.name, dst_ptr));
            }
        }
        Ok(base)
    }

    fn emit_struct_literal(
        &mut self,
        fx: &mut FunctionCtx,
        expr: &Expr,
        lit: &StructLitExpr,
    ) -> Result<Value> {
        let ty = self.analyzer.expr_type(expr)?;
        let layout = self.layout_of(&ty)?;
        let base = self.alloc_aggregate(fx, layout.slots);
        // Fields are stored in declaration order regardless of the order
        // the literal spells them in.
        let declared = self.analyzer.struct_fields(&lit.name.name)?.to_vec();
        let mut offset = 0;
        for (field_name, field_ty) in &declared {
            let init = lit
                .fields
                .iter()
                .find(|(ident, _)| &ident.name == field_name);
            let init = match init {
                Some((_, expr)) => expr,
                None => bail!(
                    "struct literal `{}` is missing field `{}`",
                    lit.name.name,
                    field_name
                ),
            };
            self.store_element(fx, &base, offset, init)?;
            offset += self.layout_of(field_ty)?.slots;
        }
        Ok(base)
    }

    /// Store one element expression at `offset` slots behind `base`.
    /// Returns the number of slots the element occupies.
    fn store_element(
        &mut self,
        fx: &mut FunctionCtx,
        base: &Value,
        offset: usize,
        e: &Expr,
    ) -> Result<usize> {
        let ty = self.analyzer.expr_type(e)?;
        let layout = self.layout_of(&ty)?;
        let v = self.emit_expr(fx, e)?;
        if layout.aggregate {
            let dst_ptr = self.slot_ptr(fx, base, &offset.to_string());
            let dst = Value {
                name: dst_ptr,
                ty: IrType::Ptr,
                is_lvalue_ptr: false,
                array_alloca: false,
                slots: layout.slots,
            };
            self.copy_slots(fx, &v, &dst, layout.slots);
        } else {
            let sv = self.to_i64(fx, &v);
            let dst_ptr = self.slot_ptr(fx, base, &offset.to_string());
            fx.line(&format!("store i64 {}, ptr {}", sv.name, dst_ptr));
        }
        Ok(layout.slots)
    }
}
