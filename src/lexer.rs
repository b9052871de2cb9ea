//! A module implementing the textual stages applied to an input line before
//! it is interpreted: `$$` expansion and splitting into words.

use tracing::warn;

/// The two-character marker replaced by the interpreter's process id.
pub const PID_MARKER: &str = "$$";

/// Default upper bound on the number of words taken from one line.
pub const DEFAULT_MAX_ARGS: usize = 512;

/// Replace every `$$` in `line` with `pid`.
///
/// The scan runs left to right over non-overlapping occurrences and never
/// revisits inserted text, so `"$$$"` becomes `"<pid>$"`.
///
/// # Arguments
/// * `line` - The raw input line.
/// * `pid` - Decimal process id of the interpreter.
pub fn expand_pid(line: &str, pid: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(idx) = rest.find(PID_MARKER) {
        out.push_str(&rest[..idx]);
        out.push_str(pid);
        rest = &rest[idx + PID_MARKER.len()..];
    }
    out.push_str(rest);
    out
}

fn is_delimiter(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

/// Split an expanded line into whitespace separated words.
///
/// Words past `max_args` are dropped with a warning.
///
/// # Returns
/// The non-empty words of `line` in order; empty for a blank line.
pub fn split_into_tokens(line: &str, max_args: usize) -> Vec<String> {
    let mut words = line.split(is_delimiter).filter(|w| !w.is_empty());
    let tokens: Vec<String> = words.by_ref().take(max_args).map(str::to_owned).collect();
    let dropped = words.count();
    if dropped > 0 {
        warn!(max_args, dropped, "argument limit reached, ignoring trailing words");
    }
    tokens
}
