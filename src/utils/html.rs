// src/utils/html.rs

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: safe tags (like <b>, <p>) survive, dangerous tags
/// (like <script>, <iframe>) and event attributes (like onclick) are removed.
/// Applied to every free-text field of exams and questions before storage.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// `clean_html` for optional fields.
pub fn clean_optional(input: Option<&str>) -> Option<String> {
    input.map(clean_html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_strips_scripts() {
        assert_eq!(clean_html("<b>Final</b><script>alert(1)</script>"), "<b>Final</b>");
        assert_eq!(clean_optional(None), None);
    }
}
