// Scalar lowering: literals, operator selection, builtins, string output.
use anyhow::Result;

use super::common;

#[test]
fn print_literal_lowers_to_inline_constant() -> Result<()> {
    let ir = common::gen_ir_for_source("fn main() { printlnInt(42); }")?;
    assert!(
        ir.contains("call i64 @printlnInt(i64 42)"),
        "literal argument should stay an inline constant:\n{}",
        ir
    );
    // Pure literals emit no arithmetic instructions at all.
    assert!(!ir.contains("add i64"));
    Ok(())
}

#[test]
fn arithmetic_respects_precedence() -> Result<()> {
    let ir = common::gen_ir_for_source("fn main() { printlnInt(2 + 3 * 4); }")?;
    assert!(ir.contains("%t0 = mul i64 3, 4"), "ir:\n{}", ir);
    assert!(ir.contains("%t1 = add i64 2, %t0"), "ir:\n{}", ir);
    Ok(())
}

#[test]
fn operators_map_to_signed_instructions() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let a = 7; let b = 2; printlnInt(a / b); printlnInt(a % b); }",
    )?;
    assert!(ir.contains("sdiv i64"));
    assert!(ir.contains("srem i64"));
    Ok(())
}

#[test]
fn negative_literals_fold_to_constants() -> Result<()> {
    let ir = common::gen_ir_for_source("fn main() { printlnInt(-5); }")?;
    assert!(ir.contains("call i64 @printlnInt(i64 -5)"), "ir:\n{}", ir);
    assert!(!ir.contains("sub i64 0"));
    Ok(())
}

#[test]
fn unary_minus_on_variables_subtracts_from_zero() -> Result<()> {
    let ir = common::gen_ir_for_source("fn main() { let x = 3; printlnInt(-x); }")?;
    assert!(ir.contains("sub i64 0, "), "ir:\n{}", ir);
    Ok(())
}

#[test]
fn comparisons_produce_i1_consumed_by_branches() -> Result<()> {
    let ir =
        common::gen_ir_for_source("fn main() { let x = 1; if x < 2 { printlnInt(x); } }")?;
    assert!(ir.contains("icmp slt i64"), "ir:\n{}", ir);
    assert!(ir.contains("br i1 %t"), "ir:\n{}", ir);
    Ok(())
}

#[test]
fn string_literals_become_interned_globals() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { printlnStr(\"hi\"); printlnStr(\"hi\"); printlnStr(\"bye\"); }",
    )?;
    assert!(
        ir.contains("@.str.0 = private unnamed_addr constant [3 x i8] c\"hi\\00\""),
        "ir:\n{}",
        ir
    );
    assert!(ir.contains("@.str.1 = private unnamed_addr constant [4 x i8] c\"bye\\00\""));
    // Two uses of "hi" share one global.
    assert!(!ir.contains("@.str.2"));
    assert!(ir.contains("call i64 @printlnStr(ptr @.str.0)"));
    Ok(())
}

#[test]
fn exit_lowers_to_runtime_call_and_unreachable() -> Result<()> {
    let ir = common::gen_ir_for_source("fn main() { exit(3); printlnInt(1); }")?;
    assert!(ir.contains("call void @exit_rt(i64 3)"), "ir:\n{}", ir);
    assert!(ir.contains("unreachable"));
    // Code after the noreturn call is suppressed.
    let body = common::function_body(&ir, "main").join("\n");
    assert!(!body.contains("printlnInt"), "body:\n{}", body);
    Ok(())
}

#[test]
fn bool_stores_widen_to_i64() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let mut f = true; f = 1 < 2; if f { printlnInt(1); } }",
    )?;
    // Slots hold i64 words; no i1-typed memory traffic.
    assert!(!ir.contains("store i1"));
    assert!(!ir.contains("load i1"));
    assert!(ir.contains("zext i1"), "ir:\n{}", ir);
    assert!(ir.contains("icmp ne i64"), "ir:\n{}", ir);
    Ok(())
}
