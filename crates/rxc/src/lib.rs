//! RX compiler core.
//!
//! The pipeline is lex -> parse -> semantic analysis -> IR generation.
//! `compile_source` runs the whole pipeline over a source string and hands
//! back the module text plus the builtin runtime stub. The CLI driver in
//! `main.rs` layers the input/output policy (stdin vs file, stdout IR,
//! stderr stub, exit codes) on top.

use anyhow::Result;
use std::path::PathBuf;

pub mod codegen;
pub mod diagnostics;
pub mod types;

use rx_ast::Module;
use types::SemanticAnalyzer;

/// Compilation options for the RX compiler.
///
/// This follows the rustc model: the compiler accepts explicit options
/// rather than discovering anything from the environment.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Path of the input file, used for diagnostics and `--write-ll`.
    /// None when reading from stdin.
    pub src_file: Option<String>,

    /// Also write the module text to the input path with its extension
    /// replaced by `.ll`.
    pub write_ll: bool,

    /// Treat IR-generation failure as a hard error. By default the driver
    /// reports it and still exits 0, which the test harness relies on.
    pub strict_codegen: bool,

    /// Override the emitted target triple.
    pub target_triple: Option<String>,

    /// Override the emitted datalayout string.
    pub target_datalayout: Option<String>,
}

impl CompileOptions {
    pub fn new(src_file: Option<String>) -> Self {
        CompileOptions {
            src_file,
            ..Default::default()
        }
    }
}

/// A fully lowered module: the IR text and the runtime stub it links with.
pub struct CompiledModule {
    pub ir: String,
    pub builtin_stub: &'static str,
}

/// Run the front end: tokenize, parse, and analyze. Errors here are
/// source-level failures (exit code 1 at the driver).
pub fn parse_and_analyze(source: &str) -> Result<(Module, SemanticAnalyzer)> {
    let module = rx_parser::parse_module(source)?;
    let mut analyzer = SemanticAnalyzer::new();
    analyzer.analyze(&module)?;
    Ok((module, analyzer))
}

/// Run the whole pipeline over a source string.
pub fn compile_source(source: &str, options: &CompileOptions) -> Result<CompiledModule> {
    let (module, analyzer) = parse_and_analyze(source)?;
    let ir = codegen::generate_ir(&module, &analyzer, options)?;
    Ok(CompiledModule {
        ir,
        builtin_stub: codegen::runtime_decls::builtin_stub(),
    })
}

/// Debug output path for a compiled module: the input path with its
/// extension replaced by `.ll`.
pub fn derive_ll_path(input_path: &str) -> PathBuf {
    let mut path = PathBuf::from(input_path);
    path.set_extension("ll");
    path
}
