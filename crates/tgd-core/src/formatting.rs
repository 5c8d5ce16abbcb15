//! Markdown → Telegram HTML conversion for outbound text.
//!
//! Telegram's HTML mode accepts a small tag set (`b`, `i`, `s`, `code`, `pre`,
//! `a`, `blockquote`, `tg-spoiler`). Anything Telegram still rejects is resent
//! as plain text by the dispatcher.

use std::sync::OnceLock;

use regex::Regex;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Convert a markdown subset to Telegram-compatible HTML.
pub fn convert_markdown_to_html(input: &str) -> String {
    let mut stash = Stash::default();
    let text = stash.take_fenced(input);
    let text = stash.take_inline(&text);

    let text = render_blocks(&escape_html(&text));
    let text = stash.take_links(&text);
    let text = render_inline(&text);
    let mut text = stash.restore(text);

    while text.contains("\n\n\n") {
        text = text.replace("\n\n\n", "\n\n");
    }
    text.trim_matches('\n').to_string()
}

/// Code spans and link targets are pulled out before emphasis runs and put back afterwards.
#[derive(Default)]
struct Stash {
    items: Vec<String>,
}

impl Stash {
    fn push(&mut self, html: String) -> String {
        let token = format!("\0{}\0", self.items.len());
        self.items.push(html);
        token
    }

    fn take_fenced(&mut self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find("```") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 3..];
            let lang_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
                .unwrap_or(after.len());
            let lang = &after[..lang_len];
            let body = after[lang_len..].strip_prefix('\n').unwrap_or(&after[lang_len..]);

            let Some(end) = body.find("```") else {
                // Unclosed fence stays literal.
                out.push_str(&rest[start..]);
                return out;
            };
            let code = escape_html(body[..end].trim_end_matches('\n'));
            let html = if lang.is_empty() {
                format!("<pre>{code}</pre>")
            } else {
                format!("<pre><code class=\"language-{lang}\">{code}</code></pre>")
            };
            out.push_str(&self.push(html));
            rest = &body[end + 3..];
        }

        out.push_str(rest);
        out
    }

    fn take_inline(&mut self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find('`') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find(|c: char| c == '`' || c == '\n') {
                Some(end) if after.as_bytes()[end] == b'`' && end > 0 => {
                    let html = format!("<code>{}</code>", escape_html(&after[..end]));
                    out.push_str(&self.push(html));
                    rest = &after[end + 1..];
                }
                _ => {
                    out.push('`');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }

    /// Only the opening tag is stashed; link text still gets emphasis.
    fn take_links(&mut self, input: &str) -> String {
        link_re()
            .replace_all(input, |caps: &regex::Captures<'_>| {
                let open = self.push(format!("<a href=\"{}\">", &caps[2]));
                format!("{open}{}</a>", &caps[1])
            })
            .into_owned()
    }

    fn restore(&self, mut text: String) -> String {
        for (i, html) in self.items.iter().enumerate() {
            text = text.replace(&format!("\0{i}\0"), html);
        }
        text
    }
}

/// Line-level constructs: headers, bullets, rules and blockquotes. Input is already escaped.
fn render_blocks(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut quote: Vec<String> = Vec::new();

    let flush = |quote: &mut Vec<String>, out: &mut Vec<String>| {
        if !quote.is_empty() {
            out.push(format!("<blockquote>{}</blockquote>", quote.join("\n")));
            quote.clear();
        }
    };

    for line in text.split('\n') {
        if line == "&gt;" {
            quote.push(String::new());
            continue;
        }
        if let Some(q) = line.strip_prefix("&gt; ") {
            quote.push(q.to_string());
            continue;
        }
        flush(&mut quote, &mut out);

        let trimmed = line.trim();
        if is_rule(trimmed) {
            continue;
        }
        if let Some(title) = header_text(line) {
            out.push(format!("<b>{title}</b>"));
            continue;
        }
        if let Some(item) = ["- ", "* ", "+ "]
            .iter()
            .find_map(|marker| line.strip_prefix(marker))
        {
            out.push(format!("• {item}"));
            continue;
        }
        out.push(line.to_string());
    }
    flush(&mut quote, &mut out);

    out.join("\n")
}

fn is_rule(line: &str) -> bool {
    line.len() >= 3 && ['-', '*', '_'].iter().any(|c| line.chars().all(|ch| ch == *c))
}

fn header_text(line: &str) -> Option<&str> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    line[hashes..].strip_prefix(' ').map(str::trim)
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]\n]+)\]\(([^)\s]+)\)").expect("valid regex"))
}

struct InlineRule {
    re: Regex,
    replacement: &'static str,
}

fn inline_rules() -> &'static [InlineRule] {
    static RULES: OnceLock<Vec<InlineRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let rule = |pattern: &str, replacement: &'static str| InlineRule {
            re: Regex::new(pattern).expect("valid regex"),
            replacement,
        };
        vec![
            rule(r"\*\*([^*\n]+?)\*\*", "<b>$1</b>"),
            rule(r"__([^_\n]+?)__", "<b>$1</b>"),
            rule(r"~~([^~\n]+?)~~", "<s>$1</s>"),
            rule(r"\|\|([^|\n]+?)\|\|", "<tg-spoiler>$1</tg-spoiler>"),
            rule(r"\*([^*\s][^*\n]*?)\*", "<i>$1</i>"),
            // Word boundaries keep snake_case identifiers intact.
            rule(r"\b_([^_\n]+?)_\b", "<i>$1</i>"),
        ]
    })
}

fn render_inline(text: &str) -> String {
    inline_rules()
        .iter()
        .fold(text.to_string(), |acc, rule| {
            rule.re.replace_all(&acc, rule.replacement).into_owned()
        })
}
