//! Detection and rewriting of shell idioms embedded in python snippets.

use std::ops::Range;

use super::Platform;
use super::builder::{LogicalOp, parse_stage};
use super::translator::{split_pipeline, translate};

/// Name of the runner helper that trims captured output to `n` lines.
pub const FIRST_LINES_HELPER: &str = "_first_lines";

const SHELL_CALLS: &[&str] = &[
    "os.system(",
    "os.popen(",
    "subprocess.run(",
    "subprocess.call(",
    "subprocess.check_call(",
    "subprocess.check_output(",
    "subprocess.Popen(",
];

const CAPTURING_CALLS: &[&str] = &["subprocess.run(", "subprocess.check_output("];

const PIPE_TOOLS: &[&str] = &["head", "tail", "grep", "wc"];

/// A shell-level idiom found in a code snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemIdiom {
    Subprocess,
    OsSystem,
    OsPopen,
    PipCommand,
    ShellPipe,
}

/// Finds system-level idioms in python code.
pub struct SystemCommandDetector;

impl SystemCommandDetector {
    pub fn detect(code: &str) -> Vec<SystemIdiom> {
        let mut found = Vec::new();
        if code.contains("subprocess.") || code.contains("import subprocess") {
            found.push(SystemIdiom::Subprocess);
        }
        if code.contains("os.system(") {
            found.push(SystemIdiom::OsSystem);
        }
        if code.contains("os.popen(") {
            found.push(SystemIdiom::OsPopen);
        }
        if ["pip list", "pip install", "pip freeze", "pip show"]
            .iter()
            .any(|p| code.contains(p))
        {
            found.push(SystemIdiom::PipCommand);
        }
        if has_pipe_to_tool(code) {
            found.push(SystemIdiom::ShellPipe);
        }
        found
    }

    pub fn is_system_code(code: &str) -> bool {
        !Self::detect(code).is_empty()
    }
}

fn has_pipe_to_tool(code: &str) -> bool {
    code.match_indices('|').any(|(idx, _)| {
        let rest = code[idx + 1..].trim_start();
        PIPE_TOOLS.iter().any(|tool| {
            rest.strip_prefix(tool)
                .is_some_and(|after| after.is_empty() || after.starts_with([' ', '"', '\'', '\n']))
        })
    })
}

#[derive(Debug, Clone)]
struct Literal {
    quote: u8,
    content: Range<usize>,
    end: usize,
}

#[derive(Debug, Clone, Copy)]
struct CallSpan {
    start: usize,
    open: usize,
    close: usize,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

fn scan_literal(bytes: &[u8], start: usize) -> Option<Literal> {
    let quote = bytes[start];
    let triple = bytes.get(start + 1) == Some(&quote) && bytes.get(start + 2) == Some(&quote);
    let content_start = start + if triple { 3 } else { 1 };
    let mut i = content_start;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            if !triple {
                return Some(Literal { quote, content: content_start..i, end: i + 1 });
            }
            if bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote) {
                return Some(Literal { quote, content: content_start..i, end: i + 3 });
            }
        }
        if !triple && b == b'\n' {
            return None;
        }
        i += 1;
    }
    None
}

fn literals_in(bytes: &[u8], range: Range<usize>) -> Vec<Literal> {
    let mut literals = Vec::new();
    let mut i = range.start;
    while i < range.end {
        if matches!(bytes[i], b'\'' | b'"') {
            match scan_literal(bytes, i) {
                Some(literal) => {
                    i = literal.end;
                    literals.push(literal);
                }
                None => break,
            }
        } else {
            i += 1;
        }
    }
    literals
}

fn matching_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'\'' | b'"' => {
                i = scan_literal(bytes, i)?.end;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn call_spans(code: &str, prefixes: &[&str]) -> Vec<CallSpan> {
    let bytes = code.as_bytes();
    let mut spans: Vec<CallSpan> = prefixes
        .iter()
        .flat_map(|prefix| {
            code.match_indices(prefix)
                .filter(|(start, _)| *start == 0 || !is_ident_byte(bytes[start - 1]))
                .filter_map(|(start, _)| {
                    let open = start + prefix.len() - 1;
                    matching_paren(bytes, open).map(|close| CallSpan { start, open, close })
                })
                .collect::<Vec<_>>()
        })
        .collect();
    spans.sort_by_key(|span| span.start);
    spans
}

fn is_captured(call: &str) -> bool {
    call.starts_with("subprocess.check_output(")
        || call.contains("capture_output=True")
        || call.contains("stdout=subprocess.PIPE")
}

fn runs_through_shell(call: &str) -> bool {
    call.starts_with("os.system(") || call.starts_with("os.popen(") || call.contains("shell=True")
}

/// Move a trailing `| head -n N` out of captured subprocess calls.
///
/// `subprocess.run("ps aux | head -5", shell=True, capture_output=True)`
/// becomes `_first_lines(subprocess.run("ps aux", ...), 5)`, trimming
/// the captured output in-process instead of relying on a `head`
/// binary.
pub fn rewrite_captured_head(code: &str) -> String {
    let bytes = code.as_bytes();
    let mut out = String::with_capacity(code.len() + 32);
    let mut cursor = 0;

    for span in call_spans(code, CAPTURING_CALLS) {
        if span.start < cursor {
            continue;
        }
        let call = &code[span.start..=span.close];
        if !is_captured(call) {
            continue;
        }
        let Some(literal) = literals_in(bytes, span.open..span.close).into_iter().next() else {
            continue;
        };
        let stages = split_pipeline(&code[literal.content.clone()]);
        let Some((last, rest)) = stages.split_last() else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        let Some(LogicalOp::FirstLines(n)) = parse_stage(last) else {
            continue;
        };

        out.push_str(&code[cursor..span.start]);
        out.push_str(FIRST_LINES_HELPER);
        out.push('(');
        out.push_str(&code[span.start..literal.content.start]);
        out.push_str(rest.join("|").trim_end());
        out.push_str(&code[literal.content.end..=span.close]);
        out.push_str(&format!(", {})", n));
        cursor = span.close + 1;
    }

    out.push_str(&code[cursor..]);
    out
}

/// Wrap a PowerShell pipeline so `cmd.exe` (python's Windows shell) runs it.
fn wrap_for_cmd(pipeline: &str, quote: u8) -> String {
    let inner = pipeline.replace('"', "'");
    if quote == b'"' {
        format!("powershell -NoProfile -Command \\\"{}\\\"", inner)
    } else {
        format!("powershell -NoProfile -Command \"{}\"", inner)
    }
}

/// Adapt shell idioms inside a python snippet to the target platform.
///
/// POSIX targets get the snippet back unchanged. On Windows, captured
/// `| head` pipes are rewritten first, then string literals passed to
/// shell-executing calls are translated stage by stage.
pub fn rewrite_python_snippet(code: &str, platform: Platform) -> String {
    if platform == Platform::Posix {
        return code.to_string();
    }

    let code = rewrite_captured_head(code);
    let bytes = code.as_bytes();
    let mut out = String::with_capacity(code.len());
    let mut cursor = 0;
    let mut last_close: Option<usize> = None;

    for span in call_spans(&code, SHELL_CALLS) {
        if last_close.is_some_and(|close| span.start <= close) {
            continue;
        }
        last_close = Some(span.close);
        if !runs_through_shell(&code[span.start..=span.close]) {
            continue;
        }
        for literal in literals_in(bytes, span.open..span.close) {
            let content = &code[literal.content.clone()];
            let translated = translate(content, platform);
            if translated == content {
                continue;
            }
            out.push_str(&code[cursor..literal.content.start]);
            out.push_str(&wrap_for_cmd(&translated, literal.quote));
            cursor = literal.content.end;
        }
    }

    out.push_str(&code[cursor..]);
    out
}
