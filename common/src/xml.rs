//! XML/HTML 文字列ユーティリティ

/// XML特殊文字をエスケープ
pub fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// エスケープを戻す（GPX/KML読み込み用）
pub fn unescape_xml(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
        assert_eq!(escape_xml("日本語"), "日本語");
    }

    #[test]
    fn test_unescape_xml() {
        assert_eq!(unescape_xml("a&lt;b&gt;&amp;&quot;c&apos;"), "a<b>&\"c'");
        assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
    }
}
