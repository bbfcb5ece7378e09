//! WordprocessingML preprocessing for Jinja-style templates.
//!
//! Word freely splits typed text into several runs, so a placeholder such as
//! `{{ objetivo }}` can reach us as `{{ obj</w:t></w:r><w:r><w:t>etivo }}`.
//! Before handing a part to the template engine we:
//! 1. re-join tags split across runs (`merge_split_tags`)
//! 2. replace the element enclosing a `{%tr %}`/`{%tc %}`/`{%p %}`/`{%r %}`
//!    tag with a plain `{% %}` statement (`hoist_block_tags`)
//!
//! Values are escaped separately (`escape_values`) since the engine runs
//! with autoescape off.

use serde_json::Value;

/// Elements that may be replaced wholesale by a block tag, outermost first.
const BLOCK_ELEMENTS: [&str; 4] = ["tr", "tc", "p", "r"];

/// Replaces a `\n` in a value with a line break inside the current run.
const LINE_BREAK: &str = "</w:t><w:br/><w:t xml:space=\"preserve\">";

/// Runs every preprocessing step over one XML part.
pub fn prepare_template(xml: &str) -> Result<String, String> {
    let mut xml = merge_split_tags(xml);
    for element in BLOCK_ELEMENTS {
        xml = hoist_block_tags(&xml, element)?;
    }
    Ok(xml)
}

/// Removes markup that Word inserted inside `{{ }}`, `{% %}` and `{# #}` tags.
pub fn merge_split_tags(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let after_markup = skip_markup(after);

        let closer = match after_markup.chars().next() {
            Some('{') => Some("}}"),
            Some('%') => Some("%}"),
            Some('#') => Some("#}"),
            _ => None,
        };

        match closer.and_then(|c| take_until_closer(&after_markup[1..], c).map(|t| (c, t))) {
            Some((closer, (inner, remaining))) => {
                out.push('{');
                out.push_str(&after_markup[..1]);
                out.push_str(&clean_tag_text(&inner));
                out.push_str(closer);
                rest = remaining;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn skip_markup(mut s: &str) -> &str {
    while s.starts_with('<') {
        match s.find('>') {
            Some(end) => s = &s[end + 1..],
            None => break,
        }
    }
    s
}

/// Collects visible text up to `closer`, dropping any markup in between.
/// Returns the text before the closer and the input after it.
fn take_until_closer<'a>(s: &'a str, closer: &str) -> Option<(String, &'a str)> {
    let mut visible = String::new();
    let mut idx = 0;

    while idx < s.len() {
        let tail = &s[idx..];
        if tail.starts_with('<') {
            idx += tail.find('>')? + 1;
            continue;
        }
        let ch = tail.chars().next()?;
        visible.push(ch);
        idx += ch.len_utf8();
        if visible.ends_with(closer) {
            visible.truncate(visible.len() - closer.len());
            return Some((visible, &s[idx..]));
        }
    }
    None
}

/// Undoes the XML escaping and smart quotes Word applies to tag text.
fn clean_tag_text(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace("&amp;", "&")
}

/// Replaces the `<w:{element}>` enclosing each `{%{element} ... %}` tag with `{% ... %}`.
pub fn hoist_block_tags(xml: &str, element: &str) -> Result<String, String> {
    let marker = format!("{{%{element} ");
    let open_bare = format!("<w:{element}>");
    let open_attrs = format!("<w:{element} ");
    let close = format!("</w:{element}>");

    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(pos) = rest.find(&marker) {
        let before = &rest[..pos];
        let elem_start = match (before.rfind(&open_bare), before.rfind(&open_attrs)) {
            (Some(a), Some(b)) => a.max(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => {
                return Err(format!("'{{%{element}' tag is not inside a <w:{element}> element"))
            }
        };

        let stmt_start = pos + marker.len();
        let stmt_len = rest[stmt_start..]
            .find("%}")
            .ok_or_else(|| format!("unterminated '{{%{element}' tag"))?;
        let statement = rest[stmt_start..stmt_start + stmt_len].trim();

        let after_tag = stmt_start + stmt_len + 2;
        let elem_end = rest[after_tag..]
            .find(&close)
            .map(|i| after_tag + i + close.len())
            .ok_or_else(|| format!("<w:{element}> holding a block tag is never closed"))?;

        out.push_str(&rest[..elem_start]);
        out.push_str("{% ");
        out.push_str(statement);
        out.push_str(" %}");
        rest = &rest[elem_end..];
    }

    out.push_str(rest);
    Ok(out)
}

/// XML-escapes every string in `value`, turning newlines into Word line breaks.
pub fn escape_values(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape_text(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(escape_values).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, escape_values(v)))
                .collect(),
        ),
        other => other,
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str(LINE_BREAK),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}
