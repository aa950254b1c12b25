use regex::Regex;
use std::sync::OnceLock;

fn credits_pattern() -> &'static Regex {
    static CREDITS: OnceLock<Regex> = OnceLock::new();
    CREDITS.get_or_init(|| Regex::new(r"(\d+)\s*/\s*(\d+)").expect("credits pattern is valid"))
}

/// Parse a credits counter such as `"37/250 credits available"`.
///
/// Returns the first of the two slash-separated integers.
pub fn parse_quota(text: &str) -> Option<u32> {
    credits_pattern()
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quota_first_number() {
        assert_eq!(parse_quota("37/250 credits available"), Some(37));
        assert_eq!(parse_quota("Credits: 5 / 100"), Some(5));
        assert_eq!(parse_quota("0/250 credits"), Some(0));
    }

    #[test]
    fn test_parse_quota_missing() {
        assert_eq!(parse_quota("No credits left"), None);
        assert_eq!(parse_quota(""), None);
        assert_eq!(parse_quota("12 credits"), None);
    }

    #[test]
    fn test_parse_quota_overflow_is_none() {
        assert_eq!(parse_quota("99999999999/1 credits"), None);
    }
}
