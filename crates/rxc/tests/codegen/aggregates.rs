// Aggregate lowering: tuples, arrays, structs, the slot model, and the
// out-pointer calling convention for aggregate returns.
use anyhow::Result;

use super::common;

#[test]
fn tuple_return_uses_caller_allocated_out_pointer() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn swap(a: i64, b: i64) -> (i64, i64) { (b, a) }\n         fn main() { let t = swap(1, 2); printlnInt(t.0); printlnInt(t.1); }",
    )?;
    // Callee: void IR type, leading sret pointer, scalars as i64.
    assert!(
        ir.contains("define void @swap(ptr %sret, i64 %arg0, i64 %arg1)"),
        "ir:\n{}",
        ir
    );
    // Caller: a two-slot result region passed as the first argument.
    let main_body = common::function_body(&ir, "main").join("\n");
    assert!(main_body.contains("alloca [2 x i64]"), "ir:\n{}", ir);
    assert!(
        main_body.contains("call void @swap(ptr %t0, i64 1, i64 2)"),
        "ir:\n{}",
        ir
    );
    // Callee copies the tuple into the out-pointer, then returns void.
    let swap_body = common::function_body(&ir, "swap").join("\n");
    assert!(swap_body.contains("store i64"), "ir:\n{}", ir);
    assert!(swap_body.contains("ret void"));
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn array_sum_indexes_through_typed_geps() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let a: [i64; 3] = [10, 20, 30]; let mut s = 0; let mut i = 0;\n                     while i < 3 { s = s + a[i]; i = i + 1; } printlnInt(s); }",
    )?;
    assert!(ir.contains("alloca [3 x i64]"), "ir:\n{}", ir);
    assert!(
        ir.contains("getelementptr inbounds [3 x i64], ptr %a.addr, i64 0, i64 %t"),
        "indexing must address the array alloca with a two-index GEP:\n{}",
        ir
    );
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn struct_fields_address_by_cumulative_slot_offset() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "struct Point { x: i64, y: i64 }\n         fn main() { let mut p = Point { x: 1, y: 2 }; p.y = p.x + p.y; printlnInt(p.y); }",
    )?;
    // Field y lives one slot past the base.
    assert!(
        ir.contains("getelementptr inbounds [2 x i64], ptr %p.addr, i64 0, i64 1"),
        "ir:\n{}",
        ir
    );
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn struct_literal_stores_fields_in_declaration_order() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "struct Point { x: i64, y: i64 }\n         fn main() { let p = Point { y: 2, x: 1 }; printlnInt(p.x); }",
    )?;
    let body = common::function_body(&ir, "main");
    // The store of x (slot 0) comes before the store of y (slot 1) even
    // though the literal names y first.
    let store_1 = body.iter().position(|l| l.contains("store i64 1")).unwrap();
    let store_2 = body.iter().position(|l| l.contains("store i64 2")).unwrap();
    assert!(store_1 < store_2, "ir:\n{}", ir);
    Ok(())
}

#[test]
fn nested_aggregates_flatten_into_contiguous_slots() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "struct Pair { a: i64, b: (i64, i64) }\n         fn main() { let p = Pair { a: 1, b: (2, 3) }; printlnInt(p.b.1); }",
    )?;
    // Pair occupies three slots.
    assert!(ir.contains("alloca [3 x i64]"), "ir:\n{}", ir);
    common::assert_blocks_terminated(&ir);
    common::assert_names_fresh(&ir);
    Ok(())
}

#[test]
fn by_value_aggregate_argument_is_copied_before_the_call() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn sum(a: [i64; 2]) -> i64 { a[0] + a[1] }\n         fn main() { let xs = [1, 2]; printlnInt(sum(xs)); }",
    )?;
    // Callee receives a pointer.
    assert!(ir.contains("define i64 @sum(ptr %arg0)"), "ir:\n{}", ir);
    let main_body = common::function_body(&ir, "main").join("\n");
    // Three two-slot allocas in main: the literal temp, xs itself, and the
    // copy made for the by-value formal.
    assert_eq!(
        main_body.matches("alloca [2 x i64]").count(),
        3,
        "ir:\n{}",
        ir
    );
    assert!(main_body.contains("call i64 @sum(ptr %t"), "ir:\n{}", ir);
    Ok(())
}

#[test]
fn aggregate_assignment_copies_word_by_word() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let mut a = (1, 2, 3); let b = (4, 5, 6); a = b; printlnInt(a.0); }",
    )?;
    let body = common::function_body(&ir, "main").join("\n");
    // The assignment produces three load/store pairs from b's storage into
    // a's storage.
    assert!(
        body.matches("load i64, ptr %t").count() >= 3,
        "expected a word-by-word copy:\n{}",
        body
    );
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn array_repeat_evaluates_element_once() -> Result<()> {
    let ir = common::gen_ir_for_source("fn main() { let a = [getInt(); 3]; printlnInt(a[0]); }")?;
    let body = common::function_body(&ir, "main").join("\n");
    assert_eq!(
        body.matches("call i64 @getInt()").count(),
        1,
        "repeat element must evaluate exactly once:\n{}",
        body
    );
    // ...but lands in all three slots.
    assert_eq!(body.matches("store i64 %t1").count(), 3, "body:\n{}", body);
    Ok(())
}

#[test]
fn aggregate_element_of_array_scales_the_index() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let pts = [(1, 2), (3, 4)]; let mut i = 1; printlnInt(pts[i].0); }",
    )?;
    // Each element is two slots, so the index is scaled by 2.
    assert!(ir.contains("mul i64 %t"), "ir:\n{}", ir);
    assert!(ir.contains(", 2"), "ir:\n{}", ir);
    common::assert_blocks_terminated(&ir);
    Ok(())
}
