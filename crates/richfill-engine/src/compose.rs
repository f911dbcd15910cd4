/// Append hashtag topics to the body text.
///
/// Topics go on their own line after the content as `#topic `, typed in the
/// same pass as the body so the caret never has to be repositioned. A leading
/// `#` on a topic is not doubled; blank topics are skipped.
pub fn compose_with_topics<S: AsRef<str>>(content: &str, topics: &[S]) -> String {
    let tags: Vec<&str> = topics
        .iter()
        .map(|t| t.as_ref().trim().trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .collect();

    if tags.is_empty() {
        return content.to_string();
    }

    let mut composed = String::with_capacity(content.len() + tags.len() * 8 + 1);
    composed.push_str(content);
    composed.push('\n');
    for tag in tags {
        composed.push('#');
        composed.push_str(tag);
        composed.push(' ');
    }
    composed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_topics_returns_content() {
        let none: [&str; 0] = [];
        assert_eq!(compose_with_topics("body", &none), "body");
        assert_eq!(compose_with_topics("body", &["  ", "#"]), "body");
    }

    #[test]
    fn test_topics_on_new_line() {
        assert_eq!(
            compose_with_topics("Trip notes", &["travel", "#food", " tokyo "]),
            "Trip notes\n#travel #food #tokyo "
        );
    }
}
