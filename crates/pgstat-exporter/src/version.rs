//! Server version parsing.

/// Parses a `server_version` string into a comparable `major.minor` number.
///
/// `"16.2 (Debian 16.2-1)"` → `16.2`, `"9.6.24"` → `9.6`, `"13beta2"` → `13.0`.
/// Returns `None` when the string does not start with a number.
pub fn parse_server_version(raw: &str) -> Option<f64> {
    let token = raw.split_whitespace().next()?;
    let mut parts = token.split('.');

    let major = leading_digits(parts.next()?);
    if major.is_empty() {
        return None;
    }
    let minor = parts.next().map(leading_digits).unwrap_or("");
    let minor = if minor.is_empty() { "0" } else { minor };

    format!("{}.{}", major, minor).parse().ok()
}

fn leading_digits(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_formats() {
        assert_eq!(parse_server_version("16.2 (Debian 16.2-1.pgdg120+2)"), Some(16.2));
        assert_eq!(parse_server_version("9.6.24"), Some(9.6));
        assert_eq!(parse_server_version("13beta2"), Some(13.0));
        assert_eq!(parse_server_version("4.2.1-compat"), Some(4.2));
    }

    #[test]
    fn rejects_non_numeric() {
        assert_eq!(parse_server_version(""), None);
        assert_eq!(parse_server_version("PostgreSQL"), None);
    }
}
