//! Excerpt generation for search hits.

/// Width of an excerpt window in characters.
pub const EXCERPT_WIDTH: usize = 160;

/// Characters kept before the first match.
pub const EXCERPT_LEFT_BIAS: usize = 50;

const ELLIPSIS: &str = "...";

/// Window of `content` around the earliest occurrence of any
/// whitespace-delimited token of `query`, matched case-insensitively.
///
/// Falls back to the start of the content when no token occurs. An ellipsis
/// marks each side where the window stops short of the content boundary.
pub fn excerpt(content: &str, query: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let lowered: Vec<char> = chars.iter().map(|c| fold(*c)).collect();

    let first_match = query
        .split_whitespace()
        .filter_map(|token| {
            let needle: Vec<char> = token.chars().map(fold).collect();
            find(&lowered, &needle)
        })
        .min();

    let start = first_match.map_or(0, |pos| pos.saturating_sub(EXCERPT_LEFT_BIAS));
    let end = (start + EXCERPT_WIDTH).min(chars.len());

    let mut out = String::new();
    if start > 0 {
        out.push_str(ELLIPSIS);
    }
    out.extend(&chars[start..end]);
    if end < chars.len() {
        out.push_str(ELLIPSIS);
    }
    out
}

/// Single-character lowercase fold, keeping positions aligned.
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
