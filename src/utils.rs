use log::error;
use std::error::Error;

/// Logs an error along with every source beneath it.
pub fn log_error(error: &dyn Error) {
    error!("Error: {}", error);
    let mut source = error.source();
    while let Some(cause) = source {
        error!("  caused by: {}", cause);
        source = cause.source();
    }
}

/// Makes a mapset title usable as a single path component.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_ordinary_titles() {
        assert_eq!(sanitize_file_name("Blue Zenith"), "Blue Zenith");
        assert_eq!(sanitize_file_name("Über-Schnell (TV Size)"), "Über-Schnell (TV Size)");
    }

    #[test]
    fn replaces_path_separators_and_reserved_characters() {
        assert_eq!(sanitize_file_name("AC/DC: Live?"), "AC_DC_ Live_");
        assert_eq!(sanitize_file_name("a\\b\tc"), "a_b_c");
    }

    #[test]
    fn never_returns_empty_or_dot_names() {
        assert_eq!(sanitize_file_name("   "), "untitled");
        assert_eq!(sanitize_file_name(".."), "untitled");
        assert_eq!(sanitize_file_name("end..."), "end");
    }
}
