/// Text processing utilities
pub mod text {
    /// First `max_chars` characters of `text`, never splitting a code point.
    pub fn truncate_chars(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => text[..idx].to_string(),
            None => text.to_string(),
        }
    }

    /// Like `truncate_chars` but marks the cut with `...`.
    pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        format!("{}...", truncate_chars(text, max_chars))
    }

    /// Collapse every whitespace run (newlines included) into one space.
    pub fn flatten_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Case-insensitive, whitespace-insensitive key used to compare titles.
    pub fn title_key(title: &str) -> String {
        flatten_whitespace(title).to_lowercase()
    }
}

/// Markdown to speakable text
pub mod speech {
    use once_cell::sync::Lazy;
    use regex::Regex;

    /// Heading that opens the statistics appendix of a script. Nothing after it is read aloud.
    pub const STATS_HEADING: &str = "## Source statistics";

    static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]*").unwrap());
    static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*{1,3}|_{2,3}").unwrap());
    static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").unwrap());
    static QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*>[ \t]?").unwrap());
    static RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*_]{3,}[ \t]*$").unwrap());
    static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-+][ \t]+").unwrap());
    static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

    /// Removes Markdown markup so a narration engine does not read symbols aloud.
    pub fn strip_markdown(markdown: &str) -> String {
        // The appendix is always last; an analysis quoting the heading must not cut the script.
        let body = match markdown.rfind(STATS_HEADING) {
            Some(idx) => &markdown[..idx],
            None => markdown,
        };
        // Rules first: `---` would otherwise lose its dashes to the bullet pass.
        let text = RULE.replace_all(body, "");
        let text = HEADING.replace_all(&text, "");
        let text = LINK.replace_all(&text, "$1");
        let text = QUOTE.replace_all(&text, "");
        let text = BULLET.replace_all(&text, "");
        let text = EMPHASIS.replace_all(&text, "");
        let text = BLANK_RUNS.replace_all(&text, "\n\n");
        text.trim().to_string()
    }
}
