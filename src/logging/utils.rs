//! Line formatting for `config.log`.
use chrono::{DateTime, Utc};

/// Remove terminal escape sequences.
///
/// CSI sequences (`ESC [` ... final byte in `@..=~`) are dropped whole; a
/// lone `ESC` swallows the byte after it.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some((text, escaped)) = rest.split_once('\x1b') {
        out.push_str(text);
        let mut tail = escaped.chars();
        if tail.next() == Some('[') {
            let _ = tail.find(|c| ('@'..='~').contains(c));
        }
        rest = tail.as_str();
    }
    out.push_str(rest);
    out
}

/// Header opening each run's log: version, start time and command line.
pub(super) fn run_header(version: &str, started: DateTime<Utc>, args: &[String]) -> String {
    format!(
        "# buildconf {version} {}\n# {}\n",
        started.format("%Y-%m-%d %H:%M:%S"),
        args.join(" ")
    )
}

/// One `config.log` line for an event.
pub(super) fn file_line(
    at: DateTime<Utc>,
    level: tracing::Level,
    stage: bool,
    message: &str,
) -> String {
    let ts = at.format("%H:%M:%S%.3f");
    let msg = strip_ansi(message);
    if stage {
        return format!("[{ts}] ==> {msg}");
    }
    let tag = match level {
        tracing::Level::ERROR => "[error] ",
        tracing::Level::WARN => "[warn] ",
        tracing::Level::DEBUG | tracing::Level::TRACE => "[debug] ",
        _ => "",
    };
    format!("[{ts}]     {tag}{msg}")
}
