//! Conservative free-text command translation.

use super::Platform;
use super::builder::{CommandBuilder, parse_stage};

/// Split a command line on top-level single pipes.
///
/// Pipes inside quotes and `||` operators do not split.
pub fn split_pipeline(command: &str) -> Vec<&str> {
    let bytes = command.as_bytes();
    let mut stages = Vec::new();
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'|' if bytes.get(i + 1) == Some(&b'|') => i += 1,
                b'|' => {
                    stages.push(&command[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += 1;
    }
    stages.push(&command[start..]);
    stages
}

/// Rewrite POSIX command idioms for the target platform.
///
/// Only whole pipeline stages recognized by [`parse_stage`] are
/// re-rendered; unrecognized text passes through unchanged. Text is
/// returned as-is for POSIX targets and when nothing was recognized.
pub fn translate(command: &str, platform: Platform) -> String {
    if platform == Platform::Posix {
        return command.to_string();
    }

    let stages = split_pipeline(command);
    let mut changed = false;
    let rendered: Vec<String> = stages
        .iter()
        .map(|stage| match parse_stage(stage) {
            Some(op) => {
                changed = true;
                CommandBuilder::build(&op, platform)
            }
            None => stage.trim().to_string(),
        })
        .collect();

    if changed {
        rendered.join(" | ")
    } else {
        command.to_string()
    }
}
