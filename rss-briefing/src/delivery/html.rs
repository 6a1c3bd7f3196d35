use crate::types::Script;
use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{html, Options, Parser};

const STYLE: &str = r#"
    body { font-family: -apple-system, BlinkMacSystemFont, "Helvetica Neue", Arial, sans-serif; background: #f7f7f7; color: #333; line-height: 1.75; margin: 0; padding: 0; }
    .container { max-width: 650px; margin: 0 auto; background: #fff; padding: 20px 18px; min-height: 100vh; }
    h1 { font-size: 22px; margin-bottom: 10px; line-height: 1.4; }
    h2 { font-size: 18px; margin-top: 35px; border-left: 4px solid #d32f2f; padding-left: 10px; margin-bottom: 15px; }
    p, li { font-size: 16px; }
    strong { color: #d32f2f; }
    .audio-box { margin: 20px 0; padding: 15px; background: #f1f3f4; border-radius: 8px; text-align: center; }
    audio { width: 100%; margin-top: 10px; }
    .footer { text-align: center; font-size: 12px; color: #aaa; margin-top: 50px; padding-bottom: 30px; }
    hr { border: 0; border-top: 1px solid #eee; margin: 30px 0; }
"#;

pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// Mobile-friendly page for one script, with a player for the day's audio.
pub fn render_page(script: &Script, page_title: &str, audio_src: &str) -> String {
    let body = markdown_to_html(script.text());
    let title = encode_text(page_title);
    let audio_src = encode_double_quoted_attribute(audio_src);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title} · {date}</title>
<style>{STYLE}</style>
</head>
<body>
<div class="container">
<div class="audio-box">
<div>Listen to today's briefing</div>
<audio controls src="./{audio_src}">Your browser does not support audio playback.</audio>
</div>
{body}
<div class="footer">{title}</div>
</div>
</body>
</html>
"#,
        date = script.run_date(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RunDate, ScriptKind};
    use chrono::NaiveDate;

    #[test]
    fn renders_markdown_and_player() {
        let date = RunDate::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        let script = Script::new(date, ScriptKind::Full, "# Brief\n\n**bold** text".to_string());
        let page = render_page(&script, "Morning <Brief>", "briefing_20261016.mp3");
        assert!(page.contains("<h1>Brief</h1>"));
        assert!(page.contains("<strong>bold</strong>"));
        assert!(page.contains(r#"src="./briefing_20261016.mp3""#));
        assert!(page.contains("Morning &lt;Brief&gt;"));
    }
}
