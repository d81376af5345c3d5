/// Whitespace minification for fiscal XML.
use std::sync::LazyLock;

use regex::Regex;

/// Declaration prepended to documents that lack one.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

static BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r">\s+<").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| unreachable!("regex engine broken"))
    })
});

/// Removes CR, LF and TAB, collapses whitespace between tags and trims.
///
/// Whitespace inside text content is left alone apart from the removed
/// control characters. A declaration is added when missing.
///
/// ```
/// use nfkit_xml::minify;
///
/// let xml = "<a>\r\n  <b>1</b>\n</a>";
/// assert_eq!(minify(xml), r#"<?xml version="1.0" encoding="UTF-8"?><a><b>1</b></a>"#);
/// ```
pub fn minify(xml: &str) -> String {
    let stripped: String = xml
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\t'))
        .collect();
    let collapsed = BETWEEN_TAGS.replace_all(&stripped, "><");
    let trimmed = collapsed.trim();
    if trimmed.starts_with("<?xml") {
        trimmed.to_owned()
    } else {
        format!("{XML_DECLARATION}{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_existing_declaration() {
        let xml = "<?xml version=\"1.0\"?>\n<a> <b> x y </b>  </a>\n";
        assert_eq!(minify(xml), "<?xml version=\"1.0\"?><a><b> x y </b></a>");
    }

    #[test]
    fn is_idempotent() {
        let once = minify("\t<a>\n<b/>\r\n</a>");
        assert_eq!(minify(&once), once);
    }
}
