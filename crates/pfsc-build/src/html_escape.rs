//! Minimal HTML escaping for annotation bodies. No crate in the workspace's
//! dependency stack is a text escaper (the one HTML-flavored crate anywhere
//! in the retrieval corpus is a DOM *builder*, not an escaper), so this is
//! hand-rolled rather than borrowed.

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_the_five_reserved_characters() {
        assert_eq!(escape_html(r#"<a href="x">it's & ok</a>"#), "&lt;a href=&quot;x&quot;&gt;it&#39;s &amp; ok&lt;/a&gt;");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(escape_html("just some notes"), "just some notes");
    }
}
