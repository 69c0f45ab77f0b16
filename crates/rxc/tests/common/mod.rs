use anyhow::Result;

use rxc::CompileOptions;

/// Run the full pipeline over a source string and return the module text.
#[allow(dead_code)]
pub fn gen_ir_for_source(src: &str) -> Result<String> {
    let out = rxc::compile_source(src, &CompileOptions::default())?;
    Ok(out.ir)
}

/// The instruction lines of one emitted function, signature excluded.
#[allow(dead_code)]
pub fn function_body<'a>(ir: &'a str, name: &str) -> Vec<&'a str> {
    let header = format!("@{}(", name);
    let mut lines = Vec::new();
    let mut in_function = false;
    for line in ir.lines() {
        if line.starts_with("define") && line.contains(&header) {
            in_function = true;
            continue;
        }
        if in_function {
            if line == "}" {
                break;
            }
            lines.push(line);
        }
    }
    lines
}

fn is_terminator(instr: &str) -> bool {
    instr.starts_with("br ") || instr.starts_with("ret") || instr == "unreachable"
}

/// Assert the block-termination invariant over every function in the
/// module: each non-empty basic block contains exactly one terminator and
/// it is the last instruction of the block.
#[allow(dead_code)]
pub fn assert_blocks_terminated(ir: &str) {
    let mut in_function = false;
    let mut block: Vec<String> = Vec::new();
    let check_block = |block: &[String]| {
        if block.is_empty() {
            return;
        }
        for instr in &block[..block.len() - 1] {
            assert!(
                !is_terminator(instr),
                "terminator mid-block: `{}` in block {:?}",
                instr,
                block
            );
        }
        let last = block.last().unwrap();
        assert!(
            is_terminator(last),
            "block does not end with a terminator: {:?}",
            block
        );
    };
    for line in ir.lines() {
        if line.starts_with("define") {
            in_function = true;
            block.clear();
            continue;
        }
        if !in_function {
            continue;
        }
        if line == "}" {
            check_block(&block);
            block.clear();
            in_function = false;
        } else if line.ends_with(':') {
            check_block(&block);
            block.clear();
        } else {
            let instr = line.trim();
            if !instr.is_empty() {
                block.push(instr.to_string());
            }
        }
    }
}

/// Assert that `%tN` temp definitions and block labels are unique within
/// each function.
#[allow(dead_code)]
pub fn assert_names_fresh(ir: &str) {
    let mut temps: Vec<String> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut in_function = false;
    for line in ir.lines() {
        if line.starts_with("define") {
            in_function = true;
            temps.clear();
            labels.clear();
            continue;
        }
        if !in_function {
            continue;
        }
        if line == "}" {
            in_function = false;
            continue;
        }
        if line.ends_with(':') {
            let label = line.trim_end_matches(':').to_string();
            assert!(!labels.contains(&label), "duplicate label `{}`", label);
            labels.push(label);
            continue;
        }
        let instr = line.trim();
        if let Some(eq) = instr.find(" = ") {
            let name = instr[..eq].to_string();
            assert!(
                !temps.contains(&name),
                "duplicate definition of `{}`",
                name
            );
            temps.push(name);
        }
    }
}
