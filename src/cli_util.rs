use std::io::{self, Write};

use crate::EngineError;

/// Bytes shown on each side of the failing instruction.
const WINDOW_BYTES: usize = 32;

/// Pretty-print an [`EngineError`] for the source called `name`, with a caret
/// under the failing instruction when the error points at one.
pub fn print_engine_error(program: &str, name: &str, code: &[u8], err: &EngineError) {
    let mut stderr = io::stderr().lock();
    let _ = write_engine_error(&mut stderr, program, name, code, err);
    let _ = stderr.flush();
}

/// Same as [`print_engine_error`] but into any writer.
pub fn write_engine_error<W: Write>(
    out: &mut W,
    program: &str,
    name: &str,
    code: &[u8],
    err: &EngineError,
) -> io::Result<()> {
    let kind = match err {
        EngineError::UnterminatedLoop { .. } | EngineError::UnmatchedLoopEnd { .. } => {
            "Parse error"
        }
        EngineError::PointerOutOfBounds { .. } => "Runtime error",
        EngineError::Io { .. } => "I/O error",
        EngineError::InvalidTapeSize { .. } => "Configuration error",
        EngineError::StepLimitExceeded { .. } | EngineError::Canceled => "Aborted",
    };
    writeln!(out, "{program}: {name}: {kind}: {err}")?;

    if let Some(ip) = err.ip() {
        write_context(out, code, ip)?;
    }
    Ok(())
}

/// Print a short window of `code` around `pos` with a caret under `pos`.
/// Line breaks and tabs are shown as spaces so the caret stays aligned.
fn write_context<W: Write>(out: &mut W, code: &[u8], pos: usize) -> io::Result<()> {
    let start = pos.saturating_sub(WINDOW_BYTES);
    let end = (pos + WINDOW_BYTES + 1).min(code.len());
    if start >= end {
        return Ok(());
    }

    let window: String = code[start..end]
        .iter()
        .map(|&b| if b.is_ascii_graphic() { b as char } else { ' ' })
        .collect();
    writeln!(out, "  {window}")?;

    let caret_offset = pos - start;
    writeln!(out, "  {}^", " ".repeat(caret_offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(code: &[u8], err: &EngineError) -> String {
        let mut out = Vec::new();
        write_engine_error(&mut out, "bff", "prog.bf", code, err).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn caret_points_at_instruction() {
        let text = render(b"++\n<", &EngineError::PointerOutOfBounds { ip: 3, ptr: 0, op: '<' });
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("bff: prog.bf: Runtime error: Out-of-range memory access"));
        assert_eq!(lines[1], "  ++ <");
        assert_eq!(lines[2], "     ^");
    }

    #[test]
    fn window_is_clipped_on_long_programs() {
        let code = "+".repeat(100);
        let text = render(code.as_bytes(), &EngineError::UnterminatedLoop { ip: 50 });
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("Parse error"));
        assert_eq!(lines[1].len(), 2 + 2 * WINDOW_BYTES + 1);
        assert_eq!(lines[2], format!("  {}^", " ".repeat(WINDOW_BYTES)));
    }

    #[test]
    fn errors_without_position_have_no_context() {
        let text = render(b"+[]", &EngineError::StepLimitExceeded { limit: 7 });
        assert_eq!(text, "bff: prog.bf: Aborted: Execution aborted: step limit exceeded (7)\n");
    }
}
