// The combined output contract: module text plus the builtin stub, and the
// .ll debug file path.
use anyhow::Result;

use rxc::codegen::runtime_decls;
use rxc::CompileOptions;

#[test]
fn builtin_stub_starts_with_the_split_marker() {
    let stub = runtime_decls::builtin_stub();
    assert!(stub.starts_with("typedef unsigned long size_t;\n"));
}

#[test]
fn builtin_stub_exposes_the_five_runtime_functions() {
    let stub = runtime_decls::builtin_stub();
    for sig in [
        "long printInt(long x)",
        "long printlnInt(long x)",
        "long printlnStr(const char *s)",
        "long getInt(void)",
        "__attribute__((noreturn)) void exit_rt(long code)",
    ] {
        assert!(stub.contains(sig), "stub is missing `{}`", sig);
    }
}

#[test]
fn builtin_stub_is_riscv_freestanding() {
    let stub = runtime_decls::builtin_stub();
    // The harness detects the RISC-V stub by its raw ecall encoding and
    // swaps in a host stub for local runs.
    assert!(stub.contains(".word 0x00000073"));
    assert!(!stub.contains("#include"));
}

#[test]
fn combined_output_splits_cleanly_on_the_marker() -> Result<()> {
    let out = rxc::compile_source("fn main() { printlnInt(1); }", &CompileOptions::default())?;
    let combined = format!("{}{}", out.ir, out.builtin_stub);
    let marker = "typedef unsigned long size_t;";
    let pos = combined.find(marker).expect("marker must be present");
    let (ir_part, stub_part) = combined.split_at(pos);
    assert!(ir_part.contains("define i32 @main()"));
    assert!(!ir_part.contains(marker));
    assert!(stub_part.starts_with(marker));
    Ok(())
}

#[test]
fn write_ll_path_lands_next_to_the_input() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let src_path = dir.path().join("prog.rx");
    std::fs::write(&src_path, "fn main() { printlnInt(7); }")?;

    let source = std::fs::read_to_string(&src_path)?;
    let out = rxc::compile_source(&source, &CompileOptions::default())?;
    let ll_path = rxc::derive_ll_path(src_path.to_str().unwrap());
    std::fs::write(&ll_path, &out.ir)?;

    assert_eq!(ll_path, dir.path().join("prog.ll"));
    let written = std::fs::read_to_string(ll_path)?;
    assert!(written.contains("call i64 @printlnInt(i64 7)"));
    Ok(())
}
