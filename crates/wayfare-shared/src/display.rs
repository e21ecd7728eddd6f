//! Compact count formatting shared by every front-end, so the card chrome
//! renders identically on web and mobile.

/// Format an engagement count the way the feed chrome displays it:
/// `999` stays `"999"`, `12_100` becomes `"12.1K"`, `1_240_000` becomes
/// `"1.2M"`.
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
