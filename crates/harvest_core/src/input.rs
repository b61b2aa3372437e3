/// Parses the newline-delimited URL list: trims lines, drops blanks and
/// `#`-prefixed comments, preserves order.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_url_list;

    #[test]
    fn blank_and_comment_lines_are_dropped() {
        let raw = "https://a.example/\n\n# a comment\n  https://b.example/  \n#https://c.example/\n";
        assert_eq!(
            parse_url_list(raw),
            vec!["https://a.example/", "https://b.example/"]
        );
    }

    #[test]
    fn order_is_preserved() {
        let raw = "https://z.example/\nhttps://a.example/";
        assert_eq!(
            parse_url_list(raw),
            vec!["https://z.example/", "https://a.example/"]
        );
    }
}
