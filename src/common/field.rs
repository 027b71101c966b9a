//! Field command strings shared by both formats.

/// Target of a hyperlink field command.
///
/// Commands look like `https\://example.com;1;0;0;`: the target runs up to
/// the first unescaped `;`, and `\` escapes the character after it.
///
/// # Examples
///
/// ```rust
/// use hanji::common::field::command_target;
///
/// assert_eq!(command_target("https\\://example.com;1;0;0;"), "https://example.com");
/// ```
pub fn command_target(command: &str) -> String {
    let mut target = String::with_capacity(command.len());
    let mut chars = command.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    target.push(next);
                }
            }
            ';' => break,
            c => target.push(c),
        }
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escaped_separators_stay_in_target() {
        assert_eq!(
            command_target("https\\://example.com/a\\;b;1;0;0;"),
            "https://example.com/a;b"
        );
        assert_eq!(command_target("plain"), "plain");
        assert_eq!(command_target(""), "");
    }
}
