use std::collections::HashSet;

pub const DEFAULT_MAX_NAME_LENGTH: usize = 150;
pub const DEFAULT_FALLBACK_STEM: &str = "record";

const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Turns a header candidate into a filesystem-safe filename.
///
/// Returns `None` when nothing usable is left. The result never exceeds
/// `max_length` bytes, and sanitizing it again returns it unchanged.
pub fn sanitize_filename(name: &str, max_length: usize) -> Option<String> {
    let mut mapped = String::with_capacity(name.len());

    for ch in name.chars() {
        match ch {
            c if INVALID_CHARS.contains(&c) => mapped.push('_'),
            c if c.is_whitespace() => mapped.push(' '),
            c if c.is_control() => {}
            c => mapped.push(c),
        }
    }

    let collapsed = mapped.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut sanitized = trim_trailing(truncate_to(&collapsed, max_length)).to_string();

    if sanitized.is_empty() {
        return None;
    }

    if is_reserved(&sanitized) {
        let escaped = format!("_{}", sanitized);
        sanitized = trim_trailing(truncate_to(&escaped, max_length)).to_string();
    }

    Some(sanitized)
}

/// Derives the final name for a record: sanitized candidate, or the fallback
/// stem numbered after the header block, plus the optional extension.
///
/// The whole name, extension included, stays within `max_length` bytes.
pub fn derive_name(
    candidate: &str,
    header_block: usize,
    max_length: usize,
    fallback_stem: &str,
    append_extension: Option<&str>,
) -> String {
    let suffix = match append_extension {
        Some(ext) if !ext.is_empty() => format!(".{}", ext),
        _ => String::new(),
    };

    if let Some(name) = sanitize_filename(candidate, max_length) {
        if suffix.is_empty() || name.to_lowercase().ends_with(&suffix.to_lowercase()) {
            return name;
        }
    }

    let budget = max_length.saturating_sub(suffix.len());
    let fallback = format!("{}_{}", fallback_stem, header_block);
    let base = sanitize_filename(candidate, budget)
        .or_else(|| sanitize_filename(&fallback, budget))
        .unwrap_or(fallback);

    base + &suffix
}

fn truncate_to(s: &str, max_length: usize) -> &str {
    if s.len() <= max_length {
        return s;
    }

    let mut end = max_length;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn trim_trailing(s: &str) -> &str {
    s.trim_end_matches(&['.', ' '][..])
}

fn is_reserved(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name).trim_end();
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}

/// Splits `name` into stem and extension (with its dot). Dot-files and names
/// without a dot have no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}

/// Builds `stem + marker + extension` within `max_length` bytes, shortening
/// the stem first and dropping the extension only when nothing else fits.
fn fit_name(stem: &str, marker: &str, extension: &str, max_length: usize) -> String {
    if stem.len() + marker.len() + extension.len() <= max_length {
        return format!("{}{}{}", stem, marker, extension);
    }

    let budget = max_length.saturating_sub(marker.len() + extension.len());
    let short_stem = trim_trailing(truncate_to(stem, budget));
    if !short_stem.is_empty() {
        return format!("{}{}{}", short_stem, marker, extension);
    }

    let whole = format!("{}{}", stem, extension);
    let budget = max_length.saturating_sub(marker.len());
    format!("{}{}", trim_trailing(truncate_to(&whole, budget)), marker)
}

/// Names handed out during one run, compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    used: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Registers `name`, or the first free `stem_N.ext` variant, and returns it.
    /// The returned name is at most `max_length` bytes; the stem is shortened
    /// on a char boundary to make room for the suffix.
    pub fn claim(&mut self, name: &str, max_length: usize) -> String {
        let (stem, extension) = split_extension(name);

        let mut first = fit_name(stem, "", extension, max_length);
        if is_reserved(&first) {
            first = fit_name(&format!("_{}", stem), "", extension, max_length);
        }
        if self.used.insert(first.to_lowercase()) {
            return first;
        }

        let mut counter = 1usize;
        loop {
            let candidate = fit_name(stem, &format!("_{}", counter), extension, max_length);
            if self.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            counter += 1;
        }
    }
}
