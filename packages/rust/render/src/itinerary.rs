//! Text formatting for the itinerary panel.

use flearoute_shared::RouteSegment;

/// Format seconds as `HhMM`, e.g. `3725` → `1h02`.
pub fn format_duration(total_sec: u64) -> String {
    let hours = total_sec / 3600;
    let minutes = (total_sec % 3600) / 60;
    format!("{hours}h{minutes:02}")
}

/// Every instruction of every segment as `• text – N km<br>` lines.
///
/// Instruction text is HTML-escaped; the result is meant to be inserted unescaped.
pub fn instructions_html(segments: &[RouteSegment]) -> String {
    segments
        .iter()
        .flat_map(|segment| &segment.steps)
        .map(|step| {
            let km = (step.distance / 1000.0 * 100.0).round() / 100.0;
            format!("• {} – {km} km<br>", tera::escape_html(&step.instruction))
        })
        .collect()
}
