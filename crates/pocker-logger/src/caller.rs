//! Call-site and stack-trace capture.

use std::backtrace::Backtrace;
use std::panic::Location;

/// Upper bound, in bytes, of the `exception.stacktrace` attribute.
pub const MAX_STACK_TRACE_BYTES: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub function: Option<String>,
    pub file: String,
    pub line: u32,
}

/// Resolves the reported call site.
///
/// With `depth == 0` the tracked file and line are kept and the function name
/// comes from the backtrace frame of `location`, when one matches. A positive
/// depth walks that many frames further up, starting from the frame of
/// `location`; `None` when that frame cannot be found.
pub fn resolve(location: &'static Location<'static>, depth: usize) -> Option<Caller> {
    let rendered = Backtrace::force_capture().to_string();
    let frames = parse_frames(&rendered);
    let start = frames.iter().position(|frame| frame.matches(location));

    if depth == 0 {
        return Some(Caller {
            function: start
                .and_then(|index| frames.get(index))
                .map(|frame| frame.function.clone()),
            file: location.file().to_string(),
            line: location.line(),
        });
    }

    let frame = frames.get(start? + depth)?;
    Some(Caller {
        function: Some(frame.function.clone()),
        file: frame.file.clone()?,
        line: frame.line?,
    })
}

/// Captures the current stack, truncated to [`MAX_STACK_TRACE_BYTES`].
pub fn stack_trace() -> String {
    let mut trace = Backtrace::force_capture().to_string();
    truncate_at_char_boundary(&mut trace, MAX_STACK_TRACE_BYTES);
    trace
}

pub(crate) fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    function: String,
    file: Option<String>,
    line: Option<u32>,
}

impl Frame {
    /// Backtrace paths may be absolute or relative to the working directory,
    /// while tracked locations are relative to the workspace: compare suffixes.
    fn matches(&self, location: &Location<'_>) -> bool {
        let wanted = location.file().trim_start_matches("./");
        match (&self.file, self.line) {
            (Some(file), Some(line)) if line == location.line() => {
                let file = file.trim_start_matches("./");
                file.ends_with(wanted) || wanted.ends_with(file)
            }
            _ => false,
        }
    }
}

/// Parses the `Display` rendering of a [`Backtrace`].
///
/// Frames look like `  12: crate::module::function` optionally followed by an
/// `at path/to/file.rs:LINE:COL` line.
fn parse_frames(rendered: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    for line in rendered.lines() {
        let line = line.trim();
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                let (file, line_no) = split_location(location);
                frame.file = Some(file.to_string());
                frame.line = line_no;
            }
            continue;
        }
        let Some((index, function)) = line.split_once(": ") else {
            continue;
        };
        if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
            frames.push(Frame {
                function: function.trim().to_string(),
                file: None,
                line: None,
            });
        }
    }
    frames
}

/// Splits `path:line:col` (or `path:line`) from the right.
fn split_location(location: &str) -> (&str, Option<u32>) {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next();
    let middle = parts.next();
    let rest = parts.next();
    match (rest, middle, last) {
        (Some(file), Some(line), Some(_col)) => (file, line.parse().ok()),
        (None, Some(file), Some(line)) => (file, line.parse().ok()),
        _ => (location, None),
    }
}
