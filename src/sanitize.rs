//! File-name normalization for variant and artifact names.

/// Diacritics replaced by their ASCII digraph transliteration.
pub const TRANSLITERATIONS: &[(char, &str)] = &[
    ('å', "aa"),
    ('Å', "Aa"),
    ('æ', "ae"),
    ('Æ', "Ae"),
    ('ø', "oe"),
    ('Ø', "Oe"),
    ('ä', "ae"),
    ('Ä', "Ae"),
    ('ö', "oe"),
    ('Ö', "Oe"),
    ('ü', "ue"),
    ('Ü', "Ue"),
    ('ß', "ss"),
];

/// Directional phrases (top-to-bottom, bottom-to-top, motorized swivel). A name containing any of
/// them has all its spaces turned into underscores.
pub const DIRECTIONAL_PHRASES: &[&str] = &["ovenfra og ned", "nedenfra og opp", "motorisert sving"];

/// Normalize a raw variant name into a locale-neutral file name.
///
/// Total and idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match TRANSLITERATIONS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }

    let lower = out.to_lowercase();
    if DIRECTIONAL_PHRASES.iter().any(|p| lower.contains(p)) {
        out = out.replace(' ', "_");
    }
    out
}

const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const RESERVED_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Portable file-name validity check (the strictest of the common filesystems).
pub fn is_valid_file_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 255 || name == "." || name == ".." {
        return false;
    }
    if name
        .chars()
        .any(|c| c.is_control() || RESERVED_CHARS.contains(&c))
    {
        return false;
    }
    if name.ends_with('.') || name.ends_with(' ') {
        return false;
    }
    let stem = name.split('.').next().unwrap_or(name);
    !RESERVED_DEVICE_NAMES
        .iter()
        .any(|d| d.eq_ignore_ascii_case(stem))
}

#[cfg(test)]
#[path = "../tests/unit/sanitize.rs"]
mod tests;
