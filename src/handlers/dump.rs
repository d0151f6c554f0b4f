use std::fmt::Write as _;
use std::io::Write as _;
use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Paths containing this marker get printed to the console.
pub const DUMP_MARKER: &str = "dump";

/// Bodies up to this many bytes are printed verbatim.
pub const MAX_DISPLAY_BODY: usize = 1024;

const RULE_WIDTH: usize = 50;

pub fn wants_dump(path: &str) -> bool {
    path.contains(DUMP_MARKER)
}

/// Format a request for the console. Reads only the request itself.
pub fn render(
    method: &str,
    path: &str,
    remote: Option<SocketAddr>,
    headers: &HeaderMap,
    body: &[u8],
) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::with_capacity(512 + body.len().min(MAX_DISPLAY_BODY));

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "REQUEST DUMP");
    let _ = writeln!(out, "Method:      {method}");
    let _ = writeln!(out, "Path:        {path}");
    match remote {
        Some(addr) => {
            let _ = writeln!(out, "Remote Addr: {addr}");
        }
        None => {
            let _ = writeln!(out, "Remote Addr: unknown");
        }
    }

    let _ = writeln!(out, "Headers:");
    for (name, value) in headers {
        let _ = writeln!(
            out,
            "  {}: {}",
            name,
            String::from_utf8_lossy(value.as_bytes())
        );
    }

    let len = body.len();
    let _ = writeln!(out, "Body Size:   {len} bytes");
    if len > MAX_DISPLAY_BODY {
        let _ = writeln!(out, "Body:        [{len} bytes - too large to display]");
    } else if len > 0 {
        let _ = writeln!(out, "Body:        {}", String::from_utf8_lossy(body));
    }
    let _ = writeln!(out, "{rule}");

    out
}

/// Write a rendered dump in one call so concurrent dumps don't interleave.
pub fn print(dump: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(dump.as_bytes());
    let _ = stdout.flush();
}
