//! Vim script emitted for reverse sync.
//!
//! Vim refuses `:buffer` with E94 when no buffer matches and refuses both
//! `:buffer` and `:edit` with E37 when the current buffer is modified, so the
//! command walks reuse-buffer, reuse-buffer-in-split, edit, edit-in-split.

pub const REDRAW: &str = "redraw";

const E37_PATTERN: &str = r"/^Vim\%((\a\+)\)\=:E37/";
const E94_PATTERN: &str = r"/^Vim\%((\a\+)\)\=:E94/";

/// Escape a path for use inside a double-quoted Vim string.
pub fn escape_quotes(path: &str) -> String {
    path.replace('\\', "\\\\").replace('"', "\\\"")
}

fn open_with(ex: &str, line: i32, file: &str) -> String {
    format!("execute '{} +{} ' . fnameescape(\"{}\")", ex, line, file)
}

/// Build the navigation command for `path` at 1-based `line`.
///
/// `path` is the already decoded local path; quoting happens here.
pub fn navigate_command(path: &str, line: i32) -> String {
    let file = escape_quotes(path);
    [
        "silent".to_string(),
        "try".to_string(),
        "try".to_string(),
        open_with("buffer", line, &file),
        format!("catch {}", E37_PATTERN),
        open_with("sbuffer", line, &file),
        "endtry".to_string(),
        format!("catch {}", E94_PATTERN),
        "try".to_string(),
        open_with("edit", line, &file),
        format!("catch {}", E37_PATTERN),
        open_with("split", line, &file),
        "endtry".to_string(),
        "endtry".to_string(),
    ]
    .join(" | ")
}
