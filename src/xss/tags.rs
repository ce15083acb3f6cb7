//! Tag and attribute level stripping stages.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, NoExpand, Regex, RegexBuilder};

use super::Mode;

static ATTRIBUTE_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)[a-z]+=(?:'.*?'|".*?")"#).expect("pattern compiles")
});

static PHP_OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\?(php)").expect("pattern compiles"));

/// Words an attacker may spell out with whitespace between the letters.
const EXPLODED_WORDS: &[&str] = &[
    "javascript",
    "expression",
    "vbscript",
    "script",
    "base64",
    "applet",
    "alert",
    "document",
    "write",
    "cookie",
    "window",
];

// Only when followed by a non-word character, so "dealer to" stays intact.
static EXPLODED_WORD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    EXPLODED_WORDS
        .iter()
        .map(|word| {
            let spaced = word
                .chars()
                .map(String::from)
                .collect::<Vec<_>>()
                .join(r"\s*");
            Regex::new(&format!(r"(?is)({spaced})([^A-Za-z0-9_])")).expect("pattern compiles")
        })
        .collect()
});

static LINK_PROBE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<a").expect("pattern compiles"));

static IMG_PROBE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img").expect("pattern compiles"));

static SCRIPT_PROBE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)script|xss").expect("pattern compiles"));

static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\s+([^>]*?)(>|$)").expect("pattern compiles"));

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\s+([^>]*?)(\s?/?>|$)").expect("pattern compiles"));

static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(/*)(script|xss)(.*?)>").expect("pattern compiles"));

static HREF_PAYLOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)href=.*?(alert\(|alert&#40;|javascript:|livescript:|mocha:|charset=",
        r"|window\.|document\.|\.cookie|<script|<xss|data\s*:)",
    ))
    .expect("pattern compiles")
});

static SRC_PAYLOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)src=.*?(alert\(|alert&#40;|javascript:|livescript:|mocha:|charset=",
        r"|window\.|document\.|\.cookie|<script|<xss|base64\s*,)",
    ))
    .expect("pattern compiles")
});

static QUOTED_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\s*[a-z\-]+\s*=\s*(?:"[^\x01"]*"|'[^\x01']*')"#).expect("pattern compiles")
});

static CSS_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("pattern compiles"));

/// Finds evil attribute assignments, unquoted and quoted.
struct EvilAttributes {
    unquoted: Regex,
    quoted: Regex,
}

impl EvilAttributes {
    fn new(names: &str) -> Self {
        Self {
            unquoted: Regex::new(&format!(r"(?is)({names})\s*=\s*([^\s>]*)"))
                .expect("pattern compiles"),
            quoted: Regex::new(&format!(
                r#"(?is)({names})\s*=\s*(?:"[^\x02"]*"|'[^\x02']*')"#
            ))
            .expect("pattern compiles"),
        }
    }
}

// Event handlers, style, xmlns and formaction.
static EVIL_ATTRIBUTES: LazyLock<EvilAttributes> =
    LazyLock::new(|| EvilAttributes::new(r"on\w*|style|xmlns|formaction"));

// Image metadata legitimately carries xmlns.
static EVIL_IMAGE_ATTRIBUTES: LazyLock<EvilAttributes> =
    LazyLock::new(|| EvilAttributes::new(r"on\w*|style|formaction"));

static NAUGHTY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)<(/*\s*)(alert|applet|audio|basefont|base|behavior|bgsound|blink|body",
        r"|embed|expression|form|frameset|frame|head|html|ilayer|iframe|input|isindex",
        r"|layer|link|meta|object|plaintext|style|script|textarea|title|video|xml|xss)",
        r"([^><]*)([><]*)",
    ))
    .expect("pattern compiles")
});

static DANGEROUS_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)(alert|cmd|passthru|eval|exec|expression|system|fopen|fsockopen",
        r"|file|file_get_contents|readfile|unlink)(\s*)\((.*?)\)",
    ))
    .expect("pattern compiles")
});

/// Escape `<`, `>` and `\` inside quoted attribute values so later tag
/// patterns cannot be confused by brackets hidden in attribute text.
pub(crate) fn escape_attribute_brackets(text: &str) -> String {
    ATTRIBUTE_ASSIGNMENT
        .replace_all(text, |caps: &Captures| {
            caps[0]
                .replace('>', "&gt;")
                .replace('<', "&lt;")
                .replace('\\', "\\\\")
        })
        .into_owned()
}

/// Make PHP tags inert. Image payloads often carry short tags in their
/// metadata, so there only `<?php` is escaped.
pub(crate) fn neutralize_php_tags(text: &str, mode: Mode) -> String {
    match mode {
        Mode::Image => PHP_OPEN_TAG.replace_all(text, "&lt;?${1}").into_owned(),
        Mode::Text => text.replace("<?", "&lt;?").replace("?>", "?&gt;"),
    }
}

/// Collapse `j a v a s c r i p t` back to `javascript`.
pub(crate) fn compact_exploded_words(text: &str) -> String {
    EXPLODED_WORD_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, re| {
            re.replace_all(&acc, |caps: &Captures| {
                let word: String = caps[1].chars().filter(|c| !c.is_whitespace()).collect();
                format!("{word}{}", &caps[2])
            })
            .into_owned()
        })
}

/// Strip dangerous `href`/`src` values and remove `<script>`/`<xss>` tags,
/// repeating until a pass changes nothing.
pub(crate) fn strip_links_and_scripts(mut text: String, removal_marker: &str) -> String {
    let mut passes = 0usize;
    loop {
        passes += 1;
        let original = text.clone();

        if LINK_PROBE.is_match(&text) {
            text = LINK_TAG
                .replace_all(&text, |caps: &Captures| {
                    strip_tag_payload(caps, &HREF_PAYLOAD)
                })
                .into_owned();
        }

        if IMG_PROBE.is_match(&text) {
            text = IMG_TAG
                .replace_all(&text, |caps: &Captures| strip_tag_payload(caps, &SRC_PAYLOAD))
                .into_owned();
        }

        if SCRIPT_PROBE.is_match(&text) {
            text = SCRIPT_TAG
                .replace_all(&text, NoExpand(removal_marker))
                .into_owned();
        }

        if text == original {
            break;
        }
    }
    tracing::trace!(passes, "link, image and script stripping settled");
    text
}

/// Rebuild a matched `<a`/`<img` tag keeping only its quoted attributes,
/// with anything from `href=`/`src=` up to a dangerous token cut out.
fn strip_tag_payload(caps: &Captures, payload: &Regex) -> String {
    let (Some(whole), Some(attributes)) = (caps.get(0), caps.get(1)) else {
        return caps[0].to_string();
    };

    let unbracketed = attributes.as_str().replace(['<', '>'], "");
    let filtered = filter_attributes(&unbracketed);
    let cleaned = payload.replace_all(&filtered, "");

    // whitespace before the closing bracket is kept so a rebuilt tag
    // rebuilds to itself
    let trailing = &attributes.as_str()[attributes.as_str().trim_end().len()..];

    let tag = whole.as_str();
    let start = attributes.start() - whole.start();
    let end = attributes.end() - whole.start();
    format!("{}{cleaned}{trailing}{}", &tag[..start], &tag[end..])
}

/// Keep only well-formed quoted `name="value"` pairs, minus CSS comments.
fn filter_attributes(attributes: &str) -> String {
    QUOTED_ATTRIBUTE
        .find_iter(attributes)
        .map(|m| CSS_COMMENT.replace_all(m.as_str(), ""))
        .collect()
}

/// Remove event handlers, `style`, `xmlns` (text mode only) and `formaction`
/// attributes from every tag, until no tag loses an attribute. A tag left
/// open at the end of the input counts as a tag.
pub(crate) fn remove_evil_attributes(mut text: String, mode: Mode) -> String {
    let evil = match mode {
        Mode::Text => &*EVIL_ATTRIBUTES,
        Mode::Image => &*EVIL_IMAGE_ATTRIBUTES,
    };

    let mut passes = 0usize;
    loop {
        passes += 1;
        let mut attributes: Vec<String> = Vec::new();
        for m in evil
            .unquoted
            .find_iter(&text)
            .chain(evil.quoted.find_iter(&text))
        {
            let escaped = regex::escape(m.as_str());
            if !attributes.contains(&escaped) {
                attributes.push(escaped);
            }
        }
        if attributes.is_empty() {
            break;
        }

        let pattern = format!(
            r"(?i)<(/?[^><]+?)([^A-Za-z<>\-])(.*?)({})(.*?)([\s><]|$)([><]*)",
            attributes.join("|")
        );
        let in_tag = match RegexBuilder::new(&pattern)
            .size_limit(64 * (1 << 20))
            .build()
        {
            Ok(re) => re,
            Err(err) => {
                tracing::warn!(
                    attributes = attributes.len(),
                    "evil attribute pattern rejected, leaving attributes in place: {err}"
                );
                break;
            }
        };

        let next = match in_tag.replace_all(&text, "<${1} ${3}${5}${6}${7}") {
            Cow::Borrowed(_) => break,
            Cow::Owned(next) => next,
        };
        text = next;
    }
    tracing::trace!(passes, "evil attribute removal settled");
    text
}

/// Entity-encode the brackets of naughty tags, leaving the tag visible as
/// text. Brackets captured right after the tag are encoded too, so a nested
/// `<<` cannot re-open a tag.
pub(crate) fn neutralize_naughty_tags(text: &str) -> String {
    NAUGHTY_TAG
        .replace_all(text, |caps: &Captures| {
            let trailing = caps[4].replace('>', "&gt;").replace('<', "&lt;");
            format!("&lt;{}{}{}{trailing}", &caps[1], &caps[2], &caps[3])
        })
        .into_owned()
}

/// Turn `eval(...)`-style calls into `eval&#40;...&#41;`.
pub(crate) fn neutralize_dangerous_calls(text: &str) -> String {
    DANGEROUS_CALL
        .replace_all(text, "${1}${2}&#40;${3}&#41;")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_brackets_inside_attribute_values() {
        assert_eq!(
            escape_attribute_brackets(r#"<img alt="<b>" title='a\b'>"#),
            r#"<img alt="&lt;b&gt;" title='a\\b'>"#
        );
    }

    #[test]
    fn brackets_outside_attributes_untouched() {
        assert_eq!(escape_attribute_brackets("<b>1 < 2</b>"), "<b>1 < 2</b>");
    }

    #[test]
    fn php_tags_escaped_in_text_mode() {
        assert_eq!(
            neutralize_php_tags("<?php echo 1; ?>", Mode::Text),
            "&lt;?php echo 1; ?&gt;"
        );
        assert_eq!(neutralize_php_tags("<?xml ?>", Mode::Text), "&lt;?xml ?&gt;");
    }

    #[test]
    fn only_long_php_tag_escaped_in_image_mode() {
        assert_eq!(
            neutralize_php_tags("<?PHP echo 1; ?>", Mode::Image),
            "&lt;?PHP echo 1; ?>"
        );
        assert_eq!(neutralize_php_tags("<?xpacket?>", Mode::Image), "<?xpacket?>");
    }

    #[test]
    fn compacts_exploded_words() {
        assert_eq!(
            compact_exploded_words("j a v a s c r i p t:alert(1)"),
            "javascript:alert(1)"
        );
        assert_eq!(
            compact_exploded_words("w r i t e (x) and c o o k i e."),
            "write (x) and cookie."
        );
    }

    #[test]
    fn exploded_word_needs_trailing_non_word_character() {
        assert_eq!(compact_exploded_words("alert me"), "alert me");
        assert_eq!(compact_exploded_words("a l e r tx"), "a l e r tx");
    }

    #[test]
    fn strips_javascript_href() {
        let out = strip_links_and_scripts(
            r#"<a href="javascript:alert(1)">x</a>"#.to_string(),
            "[removed]",
        );
        assert_eq!(out, "<a >x</a>");
    }

    #[test]
    fn safe_href_survives() {
        let text = r#"<a href="https://example.com/" title="home">x</a>"#;
        assert_eq!(strip_links_and_scripts(text.to_string(), "[removed]"), text);
    }

    #[test]
    fn strips_dangerous_img_src_and_unquoted_attributes() {
        let out = strip_links_and_scripts(
            r#"<img src="x" data-x=1 alt="y">"#.to_string(),
            "[removed]",
        );
        assert_eq!(out, r#"<img src="x" alt="y">"#);

        let out = strip_links_and_scripts(
            r#"<img src="window.alert(1)" alt="a">"#.to_string(),
            "[removed]",
        );
        assert_eq!(out, r#"<img  alt="a">"#);
    }

    #[test]
    fn css_comments_dropped_from_kept_attributes() {
        let out = strip_links_and_scripts(
            r#"<a title="a/* hidden */b">x</a>"#.to_string(),
            "[removed]",
        );
        assert_eq!(out, r#"<a title="ab">x</a>"#);
    }

    #[test]
    fn script_and_xss_tags_replaced_by_marker() {
        let out = strip_links_and_scripts(
            "<script src=//x.js></script><XSS STYLE=1>".to_string(),
            "[gone]",
        );
        assert_eq!(out, "[gone][gone][gone]");
    }

    #[test]
    fn nested_script_tags_removed_to_fixed_point() {
        let out = strip_links_and_scripts("<scr<script>ipt>alert(1)".to_string(), "");
        assert_eq!(out, "alert(1)");
    }

    #[test]
    fn removes_quoted_event_handler() {
        let out = remove_evil_attributes(
            r#"<div onclick="alert(1)" class="x">hi</div>"#.to_string(),
            Mode::Text,
        );
        assert_eq!(out, r#"<div  class="x">hi</div>"#);
    }

    #[test]
    fn removes_unquoted_handler_and_style() {
        let out = remove_evil_attributes(
            "<body onload=alert(1) style=color:red>".to_string(),
            Mode::Text,
        );
        assert!(!out.contains("onload"));
        assert!(!out.contains("style"));
        assert!(out.starts_with("<body"));
    }

    #[test]
    fn xmlns_kept_only_in_image_mode() {
        let text = r#"<rdf xmlns="http://ns.adobe.com/">"#;
        assert_eq!(remove_evil_attributes(text.to_string(), Mode::Text), "<rdf >");
        assert_eq!(remove_evil_attributes(text.to_string(), Mode::Image), text);
    }

    #[test]
    fn handler_in_unterminated_tag_removed() {
        assert_eq!(
            remove_evil_attributes("<svg onload=alert(1)".to_string(), Mode::Text),
            "<svg "
        );
        assert_eq!(
            remove_evil_attributes("<img/src=x onerror=alert(1)".to_string(), Mode::Text),
            "<img src=x "
        );
    }

    #[test]
    fn rebuilt_link_keeps_space_before_bracket() {
        let text = r#"<a href="x" >z</a>"#;
        assert_eq!(strip_links_and_scripts(text.to_string(), "[removed]"), text);
    }

    #[test]
    fn handler_text_outside_tags_left_alone() {
        let text = "set onload=1 in config";
        assert_eq!(remove_evil_attributes(text.to_string(), Mode::Text), text);
    }

    #[test]
    fn naughty_tags_encoded_not_deleted() {
        assert_eq!(
            neutralize_naughty_tags(r#"<iframe src="http://evil.example/"></iframe>"#),
            r#"&lt;iframe src="http://evil.example/"&gt;&lt;/iframe>"#
        );
        assert_eq!(
            neutralize_naughty_tags("<b>bold</b><meta charset=x>"),
            "<b>bold</b>&lt;meta charset=x&gt;"
        );
    }

    #[test]
    fn unterminated_naughty_tag_encoded_to_end() {
        assert_eq!(neutralize_naughty_tags("<object data=x"), "&lt;object data=x");
    }

    #[test]
    fn dangerous_calls_get_entity_parentheses() {
        assert_eq!(
            neutralize_dangerous_calls("eval('x') and system (ls)"),
            "eval&#40;'x'&#41; and system &#40;ls&#41;"
        );
        assert_eq!(
            neutralize_dangerous_calls("file_get_contents(/etc/passwd)"),
            "file_get_contents&#40;/etc/passwd&#41;"
        );
    }
}
