// Structured control flow: branches, loops, break/continue, short-circuit.
use anyhow::Result;

use super::common;

#[test]
fn while_with_break_builds_header_body_exit() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let mut i = 0; while i < 10 { if i == 5 { break; } i = i + 1; } printlnInt(i); }",
    )?;
    assert!(ir.contains("while.cond0:"), "ir:\n{}", ir);
    assert!(ir.contains("while.body1:"), "ir:\n{}", ir);
    assert!(ir.contains("while.end2:"), "ir:\n{}", ir);
    // The break branches straight to the exit block.
    assert!(ir.contains("br label %while.end2"));
    // The back edge re-tests the condition.
    assert!(ir.contains("br label %while.cond0"));
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn loop_with_continue_targets_the_loop_header() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let mut i = 0; loop { i = i + 1; if i < 3 { continue; } break; } printlnInt(i); }",
    )?;
    assert!(ir.contains("loop.body0:"), "ir:\n{}", ir);
    assert!(ir.contains("loop.end1:"), "ir:\n{}", ir);
    assert!(ir.contains("br label %loop.body0"));
    assert!(ir.contains("br label %loop.end1"));
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn if_else_joins_at_a_merge_block() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let x = 1; if x == 1 { printlnInt(10); } else { printlnInt(20); } printlnInt(30); }",
    )?;
    assert!(ir.contains("if.then0:"));
    assert!(ir.contains("if.else2:"));
    assert!(ir.contains("if.end1:"));
    // Both arms fall through to the merge block.
    assert_eq!(ir.matches("br label %if.end1").count(), 2, "ir:\n{}", ir);
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn short_circuit_and_skips_rhs_evaluation() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn check(x: i64) -> bool { x > 0 }\n         fn main() { let a = 1; if a > 0 && check(a) { printlnInt(1); } }",
    )?;
    assert!(ir.contains("and.rhs0:"), "ir:\n{}", ir);
    assert!(ir.contains("and.end1:"), "ir:\n{}", ir);
    // The rhs call only happens inside the rhs block.
    let body = common::function_body(&ir, "main");
    let rhs_pos = body.iter().position(|l| l.contains("and.rhs0:")).unwrap();
    let call_pos = body.iter().position(|l| l.contains("call i64 @check")).unwrap();
    assert!(call_pos > rhs_pos, "rhs must evaluate after the branch");
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn short_circuit_or_branches_to_end_on_true() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let a = 1; if a == 0 || a == 1 { printlnInt(1); } }",
    )?;
    assert!(ir.contains("or.rhs0:"), "ir:\n{}", ir);
    assert!(ir.contains("or.end1:"), "ir:\n{}", ir);
    assert!(
        ir.contains("label %or.end1, label %or.rhs0"),
        "a true lhs must skip the rhs:\n{}",
        ir
    );
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn code_after_return_is_suppressed() -> Result<()> {
    let ir = common::gen_ir_for_source("fn main() { return; printlnInt(1); }")?;
    let body = common::function_body(&ir, "main").join("\n");
    assert!(body.contains("ret i32 0"));
    assert!(
        !body.contains("printlnInt"),
        "statements after return must not emit:\n{}",
        body
    );
    Ok(())
}

#[test]
fn code_after_break_is_suppressed_until_next_label() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let mut i = 0; loop { break; i = i + 1; } printlnInt(i); }",
    )?;
    let body = common::function_body(&ir, "main");
    // Between the break branch and the loop.end label there are no
    // instructions.
    let break_pos = body
        .iter()
        .position(|l| l.trim() == "br label %loop.end1")
        .unwrap();
    let next_instr = body[break_pos + 1..]
        .iter()
        .find(|l| !l.trim().is_empty())
        .unwrap();
    assert!(
        next_instr.ends_with(':'),
        "expected a label right after break, found `{}`",
        next_instr
    );
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn early_return_in_both_arms_leaves_merge_block_terminated() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn pick(x: i64) -> i64 { if x > 0 { return 1; } else { return 2; } }\n         fn main() { printlnInt(pick(5)); }",
    )?;
    common::assert_blocks_terminated(&ir);
    // The merge block after two returning arms closes with unreachable,
    // the default terminator for a non-void function.
    let body = common::function_body(&ir, "pick").join("\n");
    assert!(body.contains("unreachable"), "body:\n{}", body);
    Ok(())
}
