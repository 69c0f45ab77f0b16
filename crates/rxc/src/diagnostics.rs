//! Diagnostic reporting utilities for the RX compiler.
//!
//! Lightweight, rustc-style error reporting to stderr: an "error:" header
//! in red, the file path, and an optional note. Positions come embedded in
//! the message text; the parser formats its errors as `line:col: ...`
//! before they reach this module.

/// Prints a compact, rustc-style diagnostic message to stderr.
pub fn report_error(file: Option<&str>, message: &str, note: Option<&str>) {
    // ANSI red for "error"
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    eprintln!("{}error{}: {}", red, reset, message);
    if let Some(path) = file {
        eprintln!("  --> {}", path);
    }

    if let Some(note) = note {
        // ANSI blue for note
        let blue = "\x1b[34m";
        eprintln!("{}note{}: {}", blue, reset, note);
    }
}

/// Convenience that prints an error then returns an `anyhow::Error` for
/// callers who want to terminate via `?`.
pub fn report_error_and_bail<T>(
    file: Option<&str>,
    message: &str,
    note: Option<&str>,
) -> anyhow::Result<T> {
    report_error(file, message, note);
    Err(anyhow::anyhow!("{}", message))
}
