// Whole-module invariants: block termination, name freshness, determinism,
// and the shape of the module preamble.
use anyhow::Result;

use super::common;

const MIXED_PROGRAM: &str = "\
struct Point { x: i64, y: i64 }

fn dist2(p: &Point) -> i64 { p.x * p.x + p.y * p.y }

fn scale(p: Point, k: i64) -> Point {
    Point { x: p.x * k, y: p.y * k }
}

fn main() {
    let mut p = Point { x: 3, y: 4 };
    let q = scale(p, 2);
    let mut total = 0;
    let mut i = 0;
    while i < 10 {
        if i % 2 == 0 && i > 0 {
            total = total + dist2(&q);
        } else {
            total = total + 1;
        }
        i = i + 1;
    }
    p.x = total;
    printlnInt(p.x);
}
";

#[test]
fn every_block_has_exactly_one_terminator() -> Result<()> {
    let ir = common::gen_ir_for_source(MIXED_PROGRAM)?;
    common::assert_blocks_terminated(&ir);
    Ok(())
}

#[test]
fn temps_and_labels_are_fresh_per_function() -> Result<()> {
    let ir = common::gen_ir_for_source(MIXED_PROGRAM)?;
    common::assert_names_fresh(&ir);
    Ok(())
}

#[test]
fn generation_is_deterministic() -> Result<()> {
    let first = common::gen_ir_for_source(MIXED_PROGRAM)?;
    let second = common::gen_ir_for_source(MIXED_PROGRAM)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn module_preamble_carries_target_strings_and_runtime_decls() -> Result<()> {
    let ir = common::gen_ir_for_source("fn main() { }")?;
    assert!(ir.starts_with(
        "target datalayout = \"e-m:e-p:64:64-i64:64-i128:128-n64-S128\"\ntarget triple = \"riscv64-unknown-elf\"\n"
    ));
    for decl in [
        "declare i64 @printInt(i64)",
        "declare i64 @printlnInt(i64)",
        "declare i64 @printlnStr(ptr)",
        "declare i64 @getInt()",
        "declare void @exit_rt(i64)",
    ] {
        assert!(ir.contains(decl), "missing `{}` in:\n{}", decl, ir);
    }
    Ok(())
}

#[test]
fn target_strings_are_parameterizable() -> Result<()> {
    let mut options = rxc::CompileOptions::default();
    options.target_triple = Some("x86_64-pc-linux-gnu".to_string());
    let out = rxc::compile_source("fn main() { }", &options)?;
    assert!(out
        .ir
        .contains("target triple = \"x86_64-pc-linux-gnu\""));
    // The datalayout keeps its default unless overridden.
    assert!(out
        .ir
        .contains("target datalayout = \"e-m:e-p:64:64-i64:64-i128:128-n64-S128\""));
    Ok(())
}

#[test]
fn undefined_callees_get_arity_prototypes() -> Result<()> {
    let ir = common::gen_ir_for_source("fn main() { let x = mystery(1, 2, 3); printlnInt(x); }")?;
    assert!(
        ir.contains("declare i64 @mystery(i64, i64, i64)"),
        "ir:\n{}",
        ir
    );
    assert!(ir.contains("call i64 @mystery(i64 1, i64 2, i64 3)"));
    Ok(())
}

#[test]
fn layout_queries_are_pure() -> Result<()> {
    use rx_ast::TypeRef;

    let module = rx_parser::parse_module("struct Point { x: i64, y: i64 } fn main() { }")?;
    let mut analyzer = rxc::types::SemanticAnalyzer::new();
    analyzer.analyze(&module)?;
    let options = rxc::CompileOptions::default();
    let emitter = rxc::codegen::ModuleEmitter::new(&analyzer, &options);

    let ty = TypeRef::Array(Box::new(TypeRef::Named("Point".to_string())), 4);
    let first = emitter.layout_of(&ty)?;
    let second = emitter.layout_of(&ty)?;
    assert_eq!(first, second);
    assert_eq!(first.slots, 8);
    assert!(first.aggregate);
    assert!(first.array_like);

    let scalar = emitter.layout_of(&TypeRef::Bool)?;
    assert_eq!(scalar.slots, 1);
    assert!(!scalar.aggregate);
    Ok(())
}

#[test]
fn main_is_emitted_as_i32_entry_point() -> Result<()> {
    let ir = common::gen_ir_for_source("fn main() { }")?;
    assert!(ir.contains("define i32 @main()"), "ir:\n{}", ir);
    assert!(ir.contains("ret i32 0"));
    Ok(())
}

#[test]
fn shadowed_locals_get_distinct_slots() -> Result<()> {
    let ir = common::gen_ir_for_source(
        "fn main() { let x = 1; { let x = 2; printlnInt(x); } printlnInt(x); }",
    )?;
    let body = common::function_body(&ir, "main").join("\n");
    assert!(body.contains("%x.addr = alloca i64"));
    assert!(body.contains("%x.addr.1 = alloca i64"), "body:\n{}", body);
    common::assert_names_fresh(&ir);
    Ok(())
}
