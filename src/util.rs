use eframe::egui::{Vec2, vec2};

/// Shortens `text` to `max_chars` characters, ending with `ellipsis` when cut.
pub fn truncate_label(text: &str, max_chars: usize, ellipsis: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let keep = max_chars.saturating_sub(ellipsis.chars().count()).max(1);
    let mut short = text.chars().take(keep).collect::<String>();
    short.push_str(ellipsis);
    short
}

/// Unit direction used when two points coincide, spread by index so stacked
/// nodes separate in different directions.
pub fn fallback_direction(i: usize, j: usize) -> Vec2 {
    let angle = ((i as f32) * 0.618_034 + (j as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

pub fn escape_xml(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
