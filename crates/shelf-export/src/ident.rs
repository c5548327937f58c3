//! Identifier and title utilities.
//!
//! Exported file and folder names interleave human titles with 32-digit
//! hexadecimal identifiers, either concatenated (`Notes 1a2b...`) or grouped
//! as `8-4-4-4-12`. These helpers pull identifiers out, clean titles for
//! display, and build URL slugs.

use std::borrow::Cow;
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([0-9a-f]{8})-?([0-9a-f]{4})-?([0-9a-f]{4})-?([0-9a-f]{4})-?([0-9a-f]{12})",
    )
    .unwrap()
});

static TRAILING_FILE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+[0-9a-f]{32}(?:_all)?\.[a-z0-9]+$").unwrap());

static DASHED_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

static TRAILING_BARE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s+)[0-9a-f]{32}$").unwrap());

static TRAILING_EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(?:md|markdown|html?|csv)$").unwrap());

static INLINE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\(inline (?:database|table)\)\s*$").unwrap());

static SLUG_STRIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SLUG_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SLUG_DASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// Length of the short identifier prefix used for slugs and fuzzy matching.
pub const SHORT_ID_LEN: usize = 8;

/// Extract the last embedded identifier from `text`.
///
/// Returns the lowercase 32-digit form, or an empty string when `text`
/// contains no identifier. Hex runs longer than an identifier are ignored.
/// The last match wins because nested export paths carry every ancestor's
/// identifier before the file's own.
pub fn extract_identifier(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut found = None;

    for caps in IDENTIFIER_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let before_ok = whole.start() == 0 || !bytes[whole.start() - 1].is_ascii_hexdigit();
        let after_ok = whole.end() == bytes.len() || !bytes[whole.end()].is_ascii_hexdigit();
        if before_ok && after_ok {
            let joined: String = (1..=5)
                .filter_map(|i| caps.get(i).map(|m| m.as_str()))
                .collect();
            found = Some(joined.to_ascii_lowercase());
        }
    }

    found.unwrap_or_default()
}

/// Strip identifier tokens, file extensions and export annotations from a
/// display title.
pub fn clean_title(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    let title = TRAILING_FILE_ID_RE.replace(&decoded, "");
    let title = DASHED_ID_RE.replace_all(&title, "");
    let title = TRAILING_BARE_ID_RE.replace(&title, "");
    let title = TRAILING_EXTENSION_RE.replace(&title, "");
    let title = INLINE_SUFFIX_RE.replace(&title, "");
    title.trim().to_owned()
}

/// Whether `text` carries an inline table annotation.
pub fn has_inline_annotation(text: &str) -> bool {
    INLINE_SUFFIX_RE.is_match(text.trim_end())
}

/// Build a URL slug from a title.
///
/// Word characters are kept in any script; everything else except
/// whitespace and hyphens is dropped.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = SLUG_STRIP_RE.replace_all(&lower, "");
    let dashed = SLUG_SPACE_RE.replace_all(stripped.trim(), "-");
    let collapsed = SLUG_DASH_RE.replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_owned()
}

/// Percent-decode a path taken from navigation markup.
///
/// Never fails. When the input contains a `%` not followed by two hex digits,
/// or decodes to invalid UTF-8, the input is returned undecoded with each
/// malformed `%` escaped as `%25`.
pub fn decode_path(text: &str) -> String {
    if let Some(escaped) = escape_malformed_percents(text) {
        return escaped;
    }
    match percent_decode_str(text).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => text.to_owned(),
    }
}

/// Replace `%` characters that do not start a valid escape with `%25`.
///
/// Returns `None` when every `%` is already well-formed.
fn escape_malformed_percents(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let is_malformed = |i: usize| {
        !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
            && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
    };

    let positions: Vec<usize> = bytes
        .iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'%' && is_malformed(i))
        .map(|(i, _)| i)
        .collect();
    if positions.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(text.len() + positions.len() * 2);
    let mut last = 0;
    for pos in positions {
        out.push_str(&text[last..pos]);
        out.push_str("%25");
        last = pos + 1;
    }
    out.push_str(&text[last..]);
    Some(out)
}

/// Lowercase an identifier and drop its dashes.
pub fn normalize_identifier(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// First [`SHORT_ID_LEN`] characters of an identifier.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Prefix comparison used for every tree lookup.
///
/// Ids are normalized and compared on their first [`SHORT_ID_LEN`]
/// characters; either side may be a prefix of the other. Unrelated ids that
/// share a short prefix compare equal. Empty ids never match.
pub fn ids_match(a: &str, b: &str) -> bool {
    let a = normalize_identifier(a);
    let b = normalize_identifier(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let a = short_id(&a);
    let b = short_id(&b);
    a.starts_with(b) || b.starts_with(a)
}

/// Derive the identifier to search for from a slug or raw id.
///
/// Prefers an embedded full identifier, then a trailing hex slug suffix of
/// at least [`SHORT_ID_LEN`] characters, then the normalized input.
pub fn identifier_hint(slug_or_id: &str) -> String {
    let full = extract_identifier(slug_or_id);
    if !full.is_empty() {
        return full;
    }
    if let Some((_, suffix)) = slug_or_id.rsplit_once('-')
        && suffix.len() >= SHORT_ID_LEN
        && suffix.chars().all(|c| c.is_ascii_hexdigit())
    {
        return suffix.to_ascii_lowercase();
    }
    normalize_identifier(slug_or_id)
}

/// Join a slug with the short form of its identifier.
pub(crate) fn slug_with_id<'a>(base: &'a str, id: &str) -> Cow<'a, str> {
    let short = short_id(id);
    match (base.is_empty(), short.is_empty()) {
        (_, true) => Cow::Borrowed(base),
        (true, false) => Cow::Owned(short.to_owned()),
        (false, false) => Cow::Owned(format!("{base}-{short}")),
    }
}
