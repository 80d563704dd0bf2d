use once_cell::sync::Lazy;
use regex::Regex;

/// Company and category names: 1-64 chars, must start alphanumeric, then
/// letters, digits, spaces, dots, underscores or hyphens.
static NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 ._-]{0,63}$").expect("Invalid name regex pattern")
});

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_CONTENT_CHARS: usize = 10_000;

/// Validate a company or category name.
///
/// # Examples
///
/// ```
/// use lux_server::validation::validate_name;
///
/// assert!(validate_name("Acme Robotics").is_ok());
/// assert!(validate_name("").is_err());
/// assert!(validate_name(" leading space").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), String> {
    if NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err("Name must be 1-64 characters and start with a letter or digit".to_string())
    }
}

/// Validate a post title: non-blank, at most 200 characters.
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(format!("Title cannot exceed {} characters", MAX_TITLE_CHARS));
    }
    Ok(())
}

/// Validate post content: non-blank, at most 10000 characters.
pub fn validate_content(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Content cannot be empty".to_string());
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(format!(
            "Content cannot exceed {} characters",
            MAX_CONTENT_CHARS
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_name("Acme").is_ok());
        assert!(validate_name("Acme Robotics").is_ok());
        assert!(validate_name("acme-labs").is_ok());
        assert!(validate_name("acme.io").is_ok());
        assert!(validate_name("deep_mind").is_ok());
        assert!(validate_name("42signals").is_ok());
        assert!(validate_name("a").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name(" leading").is_err());
        assert!(validate_name("-leading").is_err());
        assert!(validate_name("tab\tname").is_err());
        assert!(validate_name("new\nline").is_err());
        assert!(validate_name("emoji🚀").is_err());
        assert!(validate_name("semi;colon").is_err());
    }

    #[test]
    fn test_name_length_boundary() {
        let max = "a".repeat(64);
        let over = "a".repeat(65);
        assert!(validate_name(&max).is_ok());
        assert!(validate_name(&over).is_err());
    }

    #[test]
    fn test_title_rejects_blank() {
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title("\t\n").is_err());
    }

    #[test]
    fn test_title_length_boundary() {
        let max = "t".repeat(MAX_TITLE_CHARS);
        let over = "t".repeat(MAX_TITLE_CHARS + 1);
        assert!(validate_title(&max).is_ok());
        assert!(validate_title(&over).is_err());
    }

    #[test]
    fn test_title_counts_chars_not_bytes() {
        // 200 snowmen are 600 bytes but exactly 200 chars
        let snowmen = "☃".repeat(MAX_TITLE_CHARS);
        assert!(validate_title(&snowmen).is_ok());
    }

    #[test]
    fn test_content_rejects_blank() {
        assert!(validate_content("").is_err());
        assert!(validate_content("  \n ").is_err());
    }

    #[test]
    fn test_content_length_boundary() {
        let max = "c".repeat(MAX_CONTENT_CHARS);
        let over = "c".repeat(MAX_CONTENT_CHARS + 1);
        assert!(validate_content(&max).is_ok());
        assert!(validate_content(&over).is_err());
    }

    #[test]
    fn test_error_messages_are_specific() {
        let err = validate_title(&"t".repeat(300)).unwrap_err();
        assert!(err.contains("200"));

        let err = validate_content("").unwrap_err();
        assert!(err.contains("empty"));
    }
}
