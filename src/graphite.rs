//! Graphite plaintext output: `<metric path> <value> <timestamp>` per line.

use crate::{CheckStatus, Result, Sample};

pub const PREFIX: &str = "cmws";

/// Flattens per-location `httptime`, per-location states and the exported metadata fields of a
/// status under `cmws.<hostname>.`. Non-numeric values are skipped. Lines are joined with `\n`,
/// without a trailing newline.
pub fn graphite_lines(status: &CheckStatus) -> Result<String> {
    let hostname = status.target()?.hostname;
    let timestamp = status.timestamp();

    let mut lines = Vec::new();
    let mut push = |path: String, value: &Sample| {
        if value.is_number() {
            lines.push(format!("{}.{}.{} {} {}", PREFIX, hostname, path, value, timestamp));
        }
    };

    if let Some(httptime) = status.lastvalues.get("httptime") {
        for (location, value) in httptime {
            push(format!("httptime.{}", location_path(location)), value);
        }
    }

    for (location, value) in &status.states {
        push(format!("states.{}", location_path(location)), value);
    }

    for (label, value) in status.exported_metas() {
        push(format!("metas.{}", label), value);
    }

    Ok(lines.join("\n"))
}

fn location_path(location: &str) -> String {
    location.replace(':', ".").to_lowercase()
}
