use std::path::{Path, PathBuf};

/// Alternate path used when `target` cannot be written:
/// `{dir}/{stem}_{stamp}.{ext}`.
pub fn timestamped_fallback(target: &Path, stamp: &str) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output".to_string());
    let name = match target.extension() {
        Some(ext) => format!("{stem}_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{stamp}"),
    };
    target.with_file_name(name)
}

/// Windows-safe file stem built from free text such as a genre marker.
pub fn sanitize_stem(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) || c.is_whitespace() { '_' } else { c })
        .collect();

    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }

    let mut stem = compacted.trim_matches(&['_', '.'][..]).to_string();
    if stem.is_empty() {
        stem = "untitled".to_string();
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_keeps_directory_and_extension() {
        let path = timestamped_fallback(Path::new("out/douban_chart.csv"), "20261018_101500");
        assert_eq!(path, PathBuf::from("out/douban_chart_20261018_101500.csv"));
    }

    #[test]
    fn fallback_without_extension() {
        let path = timestamped_fallback(Path::new("report"), "20261018_101500");
        assert_eq!(path, PathBuf::from("report_20261018_101500"));
    }

    #[test]
    fn stems_are_made_safe() {
        assert_eq!(sanitize_stem("剧情"), "剧情");
        assert_eq!(sanitize_stem("sci-fi / fantasy?"), "sci-fi_fantasy");
        assert_eq!(sanitize_stem("  "), "untitled");
        assert_eq!(sanitize_stem("con"), "con_");
    }
}
