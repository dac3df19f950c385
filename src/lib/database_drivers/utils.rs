/// Rewrites `?` placeholders into postgres' `$1..$n`, leaving quoted text
/// and `$$` bodies untouched.
pub fn numbered_placeholders(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 8);
    let mut count = 0;
    let mut quote: Option<char> = None;
    let mut dollar_quoted = false;
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quote) {
            ('$', None) if chars.peek() == Some(&'$') => {
                chars.next();
                dollar_quoted = !dollar_quoted;
                out.push_str("$$");
            }
            (_, None) if dollar_quoted => out.push(c),
            ('?', None) => {
                count += 1;
                out.push('$');
                out.push_str(&count.to_string());
            }
            ('\'' | '"', None) => {
                quote = Some(c);
                out.push(c);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_each_placeholder() {
        let query = "SELECT id FROM users WHERE username = ? OR email = ?";
        assert_eq!(
            numbered_placeholders(query),
            "SELECT id FROM users WHERE username = $1 OR email = $2"
        );
    }

    #[test]
    fn test_call_with_seven_arguments() {
        let query = "CALL create_profile(?, ?, ?, ?, ?, ?, ?)";
        assert_eq!(
            numbered_placeholders(query),
            "CALL create_profile($1, $2, $3, $4, $5, $6, $7)"
        );
    }

    #[test]
    fn test_skips_quoted_question_marks() {
        let query = "SELECT '?' AS q, \"odd?\" FROM t WHERE a = ? AND b = 'it''s ?'";
        assert_eq!(
            numbered_placeholders(query),
            "SELECT '?' AS q, \"odd?\" FROM t WHERE a = $1 AND b = 'it''s ?'"
        );
    }

    #[test]
    fn test_skips_dollar_quoted_bodies() {
        let query = "CREATE FUNCTION f() RETURNS text LANGUAGE sql AS $$ SELECT '?' || ? $$";
        assert_eq!(numbered_placeholders(query), query);
    }

    #[test]
    fn test_query_without_placeholders_is_unchanged() {
        let query = "SELECT 1";
        assert_eq!(numbered_placeholders(query), query);
    }
}
