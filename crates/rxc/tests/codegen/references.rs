// Reference bindings: pointer parameters, aliasing lets, deref loads and
// stores, references to aggregates.
use anyhow::Result;

use super::common;

#[test]
fn mutable_reference_parameter_round_trip() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn inc(x: &mut i64) { *x = *x + 1; }\n         fn main() { let mut v = 41; inc(&mut v); printlnInt(v); }",
    )?;
    // The reference parameter arrives as a pointer and is parked in its own
    // slot.
    assert!(ir.contains("define void @inc(ptr %arg0)"), "ir:\n{}", ir);
    let inc_body = common::function_body(&ir, "inc").join("\n");
    assert!(inc_body.contains("%x.addr = alloca ptr"), "ir:\n{}", ir);
    assert!(inc_body.contains("store ptr %arg0, ptr %x.addr"));
    // Each use reloads the pointer, then loads/stores through it.
    assert!(inc_body.contains("load ptr, ptr %x.addr"));
    // The caller passes the variable's address directly.
    let main_body = common::function_body(&ir, "main").join("\n");
    assert!(
        main_body.contains("call void @inc(ptr %v.addr)"),
        "ir:\n{}",
        ir
    );
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn immutable_let_reference_aliases_without_a_slot() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let mut v = 1; let r = &mut v; *r = 2; printlnInt(v); }",
    )?;
    let body = common::function_body(&ir, "main").join("\n");
    // No pointer slot: the binding aliases v's storage, so the store goes
    // straight to %v.addr.
    assert!(!body.contains("alloca ptr"), "body:\n{}", body);
    assert!(body.contains("store i64 2, ptr %v.addr"), "body:\n{}", body);
    Ok(())
}

#[test]
fn mutable_let_reference_can_be_repointed() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let mut a = 1; let mut b = 2; let mut r = &mut a;\n                     r = &mut b; *r = 7; printlnInt(b); }",
    )?;
    let body = common::function_body(&ir, "main").join("\n");
    // The reference lives in its own slot...
    assert!(body.contains("%r.addr = alloca ptr"), "body:\n{}", body);
    // ...initialized to a, then re-pointed to b.
    assert!(body.contains("store ptr %a.addr, ptr %r.addr"));
    assert!(body.contains("store ptr %b.addr, ptr %r.addr"));
    // The write reloads the pointer and stores through it.
    assert!(body.contains("load ptr, ptr %r.addr"));
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn reference_to_array_indexes_through_the_pointer() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn first(a: &[i64; 3]) -> i64 { a[0] }\n         fn main() { let xs = [7, 8, 9]; printlnInt(first(&xs)); }",
    )?;
    assert!(ir.contains("define i64 @first(ptr %arg0)"), "ir:\n{}", ir);
    // The caller passes the array's address without copying.
    let main_body = common::function_body(&ir, "main").join("\n");
    assert!(
        main_body.contains("call i64 @first(ptr %xs.addr)"),
        "a by-reference aggregate must not be copied:\n{}",
        main_body
    );
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn shared_reference_parameter_reads_through_pointer() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn get(x: &i64) -> i64 { *x }\n         fn main() { let v = 5; printlnInt(get(&v)); }",
    )?;
    let get_body = common::function_body(&ir, "get").join("\n");
    assert!(get_body.contains("load ptr, ptr %x.addr"), "ir:\n{}", ir);
    assert!(get_body.contains("ret i64"), "ir:\n{}", ir);
    common::assert_blocks_terminated(&ir);
    Ok(())
}
