//! Shared subprocess plumbing for the converter and encoder bridges.

use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Run a command, feeding `input` on stdin and collecting stdout/stderr.
///
/// Stdin is written from a separate thread so a child that emits output
/// before draining its input cannot deadlock the pipe. A child that
/// exits early closes its end of the pipe; the resulting broken-pipe
/// write error is ignored and the exit status reported instead.
pub(crate) fn run_piped(mut cmd: Command, input: &[u8]) -> std::io::Result<Output> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| std::io::Error::other("child stdin unavailable"))?;
    let input = input.to_vec();
    let writer = std::thread::spawn(move || {
        let _ = stdin.write_all(&input);
    });

    let output = child.wait_with_output();
    let _ = writer.join();
    output
}

/// Render the tail of a child's stderr for error messages.
pub(crate) fn stderr_excerpt(output: &Output) -> String {
    let text = String::from_utf8_lossy(&output.stderr);
    let trimmed = text.trim();
    const MAX: usize = 512;
    if trimmed.len() > MAX {
        let start = trimmed.len() - MAX;
        // Keep the tail; converters print the actual failure last.
        let mut at = start;
        while at < trimmed.len() && !trimmed.is_char_boundary(at) {
            at += 1;
        }
        trimmed[at..].to_string()
    } else {
        trimmed.to_string()
    }
}
