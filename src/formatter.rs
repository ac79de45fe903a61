//! Renders the model's markdown-like recipe text as a small HTML fragment.
//!
//! Only three constructs are recognised: `##` headers, flat bullet or
//! numbered lists, and plain paragraphs. Blank lines become `<br>`.

/// Convert recipe text to HTML, one fragment per input line.
pub fn format_recipe(text: &str) -> String {
    let mut html = String::with_capacity(text.len() * 2);
    let mut in_list = false;

    for raw_line in text.split('\n') {
        let line = raw_line.trim();

        if line.is_empty() {
            close_list(&mut html, &mut in_list);
            html.push_str("<br>");
            continue;
        }

        if let Some(rest) = line.strip_prefix("##") {
            close_list(&mut html, &mut in_list);
            html.push_str("<h3>");
            push_escaped(&mut html, rest.trim_start());
            html.push_str("</h3>");
        } else if is_list_item(line) {
            if !in_list {
                html.push_str("<ul>");
                in_list = true;
            }
            html.push_str("<li>");
            push_escaped(&mut html, strip_list_marker(line));
            html.push_str("</li>");
        } else {
            close_list(&mut html, &mut in_list);
            html.push_str("<p>");
            push_escaped(&mut html, line);
            html.push_str("</p>");
        }
    }

    close_list(&mut html, &mut in_list);
    html
}

fn close_list(html: &mut String, in_list: &mut bool) {
    if *in_list {
        html.push_str("</ul>");
        *in_list = false;
    }
}

fn is_list_item(line: &str) -> bool {
    bullet_body(line).is_some() || ordinal_body(line).is_some()
}

/// Bullet marker first, then an ordinal marker on what is left.
fn strip_list_marker(line: &str) -> &str {
    let line = bullet_body(line).unwrap_or(line);
    ordinal_body(line).unwrap_or(line)
}

/// Text after `- ` or `* ` (exactly one whitespace character is consumed).
fn bullet_body(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('-').or_else(|| line.strip_prefix('*'))?;
    after_one_whitespace(rest)
}

/// Text after `<digits>. `.
fn ordinal_body(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    after_one_whitespace(rest)
}

fn after_one_whitespace(s: &str) -> Option<&str> {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => Some(chars.as_str()),
        _ => None,
    }
}

fn push_escaped(html: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => html.push_str("&amp;"),
            '<' => html.push_str("&lt;"),
            '>' => html.push_str("&gt;"),
            '"' => html.push_str("&quot;"),
            '\'' => html.push_str("&#39;"),
            _ => html.push(c),
        }
    }
}
