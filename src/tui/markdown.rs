// Markdown rendering for agent output
//
// Agent sessions stream markdown. This module turns it into styled terminal
// rows (SGR escapes, no widgets) wrapped to the output pane width.
//
// Two stages, like any pulldown-cmark consumer:
// 1. parse_markdown: events -> flat list of semantic segments
// 2. segments_to_lines: segments -> styled rows for a given width and theme
//
// Supports: headings, inline code, fenced code blocks, bold, italic,
// strikethrough, lists (nested, ordered), blockquotes, rules, links.

use super::text::{measure_width, strip_ansi, wrap_to_width};
use crate::theme::Theme;
use crossterm::style::Stylize;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Markdown collaborator used by the output pane
pub trait MarkdownRenderer: Send + Sync {
    /// Render `text` to newline-joined styled rows no wider than `width`
    fn render(&self, text: &str, width: usize, theme: &Theme) -> String;
}

/// Default renderer built on pulldown-cmark
#[derive(Debug, Clone, Copy, Default)]
pub struct TermMarkdown;

impl MarkdownRenderer for TermMarkdown {
    fn render(&self, text: &str, width: usize, theme: &Theme) -> String {
        render_markdown(text, width, theme).join("\n")
    }
}

/// A segment of parsed markdown with semantic meaning
#[derive(Debug, Clone, PartialEq)]
pub enum StyledSegment {
    Text(String),
    /// Inline code: `like this`
    InlineCode(String),
    CodeBlock {
        lang: Option<String>,
        code: String,
    },
    /// Line break (soft or hard). Agent output is line-oriented, so both break.
    Break,
    /// End of paragraph (adds blank line for spacing)
    ParagraphEnd,
    Heading {
        level: u8,
        text: String,
    },
    ListItemStart {
        ordered: bool,
        number: u64,
        depth: usize,
    },
    ListItemEnd,
    ListEnd,
    Bold(String),
    Italic(String),
    Strikethrough(String),
    BlockQuoteStart,
    BlockQuoteEnd,
    Rule,
    Link {
        text: String,
        url: String,
    },
}

/// Which inline span is collecting text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inline {
    Bold,
    Italic,
    Strike,
    Link,
    Heading,
}

/// Parse markdown into styled segments
pub fn parse_markdown(markdown: &str) -> Vec<StyledSegment> {
    let mut segments = Vec::new();
    let mut inline: Option<(Inline, String)> = None;
    let mut heading_level = 0u8;
    let mut link_url = String::new();
    let mut code_block: Option<(Option<String>, String)> = None;
    // (ordered, next number) per nesting level
    let mut list_stack: Vec<(bool, u64)> = Vec::new();

    let options = Options::ENABLE_STRIKETHROUGH;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    pulldown_cmark::CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
                        Some(lang.to_string())
                    }
                    _ => None,
                };
                code_block = Some((lang, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, code)) = code_block.take() {
                    segments.push(StyledSegment::CodeBlock { lang, code });
                }
            }
            Event::Text(text) if code_block.is_some() => {
                if let Some((_, code)) = code_block.as_mut() {
                    code.push_str(&text);
                }
            }

            Event::Text(text) | Event::Code(text) if inline.is_some() => {
                if let Some((_, buf)) = inline.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::Text(text) => segments.push(StyledSegment::Text(text.to_string())),
            Event::Code(code) => segments.push(StyledSegment::InlineCode(code.to_string())),
            Event::Html(html) | Event::InlineHtml(html) => {
                segments.push(StyledSegment::Text(html.trim_end_matches('\n').to_string()))
            }

            Event::Start(Tag::Heading { level, .. }) => {
                heading_level = match level {
                    HeadingLevel::H1 => 1,
                    HeadingLevel::H2 => 2,
                    HeadingLevel::H3 => 3,
                    HeadingLevel::H4 => 4,
                    HeadingLevel::H5 => 5,
                    HeadingLevel::H6 => 6,
                };
                inline = Some((Inline::Heading, String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((_, text)) = inline.take() {
                    segments.push(StyledSegment::Heading {
                        level: heading_level,
                        text,
                    });
                }
            }

            Event::Start(Tag::Strong) if inline.is_none() => inline = Some((Inline::Bold, String::new())),
            Event::Start(Tag::Emphasis) if inline.is_none() => inline = Some((Inline::Italic, String::new())),
            Event::Start(Tag::Strikethrough) if inline.is_none() => inline = Some((Inline::Strike, String::new())),
            Event::Start(Tag::Link { dest_url, .. }) if inline.is_none() => {
                link_url = dest_url.to_string();
                inline = Some((Inline::Link, String::new()));
            }
            Event::End(TagEnd::Strong) => close_inline(&mut inline, Inline::Bold, &mut segments, &link_url),
            Event::End(TagEnd::Emphasis) => close_inline(&mut inline, Inline::Italic, &mut segments, &link_url),
            Event::End(TagEnd::Strikethrough) => close_inline(&mut inline, Inline::Strike, &mut segments, &link_url),
            Event::End(TagEnd::Link) => close_inline(&mut inline, Inline::Link, &mut segments, &link_url),

            Event::SoftBreak | Event::HardBreak => match inline.as_mut() {
                Some((_, buf)) => buf.push(' '),
                None => segments.push(StyledSegment::Break),
            },
            Event::End(TagEnd::Paragraph) => segments.push(StyledSegment::ParagraphEnd),

            Event::Start(Tag::List(first)) => list_stack.push((first.is_some(), first.unwrap_or(1))),
            Event::End(TagEnd::List(_)) => {
                list_stack.pop();
                segments.push(StyledSegment::ListEnd);
            }
            Event::Start(Tag::Item) => {
                let depth = list_stack.len();
                if let Some((ordered, number)) = list_stack.last_mut() {
                    segments.push(StyledSegment::ListItemStart {
                        ordered: *ordered,
                        number: *number,
                        depth,
                    });
                    *number += 1;
                }
            }
            Event::End(TagEnd::Item) => segments.push(StyledSegment::ListItemEnd),
            Event::TaskListMarker(done) => {
                segments.push(StyledSegment::Text(if done { "[x] " } else { "[ ] " }.to_string()))
            }

            Event::Start(Tag::BlockQuote) => segments.push(StyledSegment::BlockQuoteStart),
            Event::End(TagEnd::BlockQuote) => segments.push(StyledSegment::BlockQuoteEnd),
            Event::Rule => segments.push(StyledSegment::Rule),

            _ => {}
        }
    }

    segments
}

fn close_inline(
    inline: &mut Option<(Inline, String)>,
    kind: Inline,
    segments: &mut Vec<StyledSegment>,
    link_url: &str,
) {
    // Nested spans were flattened into the outer one
    if inline.as_ref().map(|(k, _)| *k) != Some(kind) {
        return;
    }
    let Some((_, text)) = inline.take() else {
        return;
    };
    segments.push(match kind {
        Inline::Bold => StyledSegment::Bold(text),
        Inline::Italic => StyledSegment::Italic(text),
        Inline::Strike => StyledSegment::Strikethrough(text),
        Inline::Link => StyledSegment::Link {
            text,
            url: link_url.to_string(),
        },
        Inline::Heading => StyledSegment::Text(text),
    });
}

/// Accumulates styled text for one logical line, then wraps it under a prefix
struct LineBuilder<'a> {
    theme: &'a Theme,
    width: usize,
    lines: Vec<String>,
    current: String,
    quote_depth: usize,
    list_depth: usize,
    /// Marker for the first row of the current list item ("• ", "2. ")
    marker: Option<String>,
    /// Width of the current item's marker, for continuation rows
    item_indent: usize,
}

impl<'a> LineBuilder<'a> {
    fn new(theme: &'a Theme, width: usize) -> Self {
        Self {
            theme,
            width: width.max(1),
            lines: Vec::new(),
            current: String::new(),
            quote_depth: 0,
            list_depth: 0,
            marker: None,
            item_indent: 0,
        }
    }

    fn prefixes(&mut self) -> (String, String) {
        let quote = if self.quote_depth > 0 {
            self.theme.muted(&"│ ".repeat(self.quote_depth))
        } else {
            String::new()
        };
        let nest = "  ".repeat(self.list_depth.saturating_sub(1));
        let continuation = format!("{}{}{}", quote, nest, " ".repeat(self.item_indent));
        let first = match self.marker.take() {
            Some(marker) => format!("{}{}{}", quote, nest, self.theme.paint(&marker, self.theme.accent)),
            None => continuation.clone(),
        };
        (first, continuation)
    }

    /// Emit the current logical line (if any)
    fn flush(&mut self) {
        if self.current.is_empty() && self.marker.is_none() {
            return;
        }
        let body = std::mem::take(&mut self.current);
        let (first, continuation) = self.prefixes();
        let avail = self.width.saturating_sub(measure_width(&continuation)).max(1);
        for (i, row) in wrap_to_width(&body, avail).into_iter().enumerate() {
            let prefix = if i == 0 { &first } else { &continuation };
            self.lines.push(format!("{}{}", prefix, row));
        }
    }

    /// Blank spacer row, never doubled and never at the top
    fn blank(&mut self) {
        self.flush();
        if self
            .lines
            .last()
            .is_some_and(|last| !strip_ansi(last).trim().is_empty())
        {
            self.lines.push(String::new());
        }
    }

    fn push_row(&mut self, row: String) {
        self.flush();
        self.lines.push(row);
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        while self
            .lines
            .last()
            .is_some_and(|last| strip_ansi(last).trim().is_empty())
        {
            self.lines.pop();
        }
        self.lines
    }
}

/// Convert parsed segments to styled rows no wider than `width`
pub fn segments_to_lines(segments: &[StyledSegment], width: usize, theme: &Theme) -> Vec<String> {
    let mut out = LineBuilder::new(theme, width);

    for segment in segments {
        match segment {
            StyledSegment::Text(text) => {
                let mut parts = text.split('\n');
                if let Some(first) = parts.next() {
                    out.current.push_str(first);
                }
                for part in parts {
                    out.flush();
                    out.current.push_str(part);
                }
            }
            StyledSegment::InlineCode(code) => {
                out.current.push_str(&theme.paint(code, theme.accent));
            }
            StyledSegment::Bold(text) => {
                out.current.push_str(&text.as_str().bold().to_string());
            }
            StyledSegment::Italic(text) => {
                out.current.push_str(&text.as_str().italic().to_string());
            }
            StyledSegment::Strikethrough(text) => {
                out.current.push_str(&text.as_str().crossed_out().to_string());
            }
            StyledSegment::Link { text, url } => {
                out.current.push_str(&text.as_str().underlined().to_string());
                if !url.is_empty() && url != text {
                    out.current.push_str(&theme.muted(&format!(" ({})", url)));
                }
            }
            StyledSegment::Break => out.flush(),
            StyledSegment::ParagraphEnd => {
                if out.list_depth == 0 && out.quote_depth == 0 {
                    out.blank();
                } else {
                    out.flush();
                }
            }
            StyledSegment::Heading { level, text } => {
                out.blank();
                let styled = match level {
                    1 => theme.strong(&text.to_uppercase(), theme.accent),
                    2 => theme.strong(text, theme.accent),
                    _ => theme.strong(text, theme.foreground),
                };
                out.current.push_str(&styled);
                out.flush();
                out.blank();
            }
            StyledSegment::CodeBlock { code, .. } => {
                out.flush();
                let avail = out.width.saturating_sub(2).max(1);
                for line in code.lines() {
                    for row in wrap_to_width(line, avail) {
                        let styled = format!("  {}", theme.muted(&row));
                        out.push_row(styled);
                    }
                }
                if out.list_depth == 0 {
                    out.blank();
                }
            }
            StyledSegment::ListItemStart { ordered, number, depth } => {
                out.flush();
                let marker = if *ordered {
                    format!("{}. ", number)
                } else {
                    "• ".to_string()
                };
                out.list_depth = *depth;
                out.item_indent = measure_width(&marker);
                out.marker = Some(marker);
            }
            StyledSegment::ListItemEnd => {
                out.flush();
                out.marker = None;
            }
            StyledSegment::ListEnd => {
                out.flush();
                out.list_depth = out.list_depth.saturating_sub(1);
                if out.list_depth == 0 {
                    out.item_indent = 0;
                    out.blank();
                } else {
                    out.item_indent = 2;
                }
            }
            StyledSegment::BlockQuoteStart => {
                out.flush();
                out.quote_depth += 1;
            }
            StyledSegment::BlockQuoteEnd => {
                out.flush();
                out.quote_depth = out.quote_depth.saturating_sub(1);
                if out.quote_depth == 0 {
                    out.blank();
                }
            }
            StyledSegment::Rule => {
                let rule = theme.paint(&"─".repeat(out.width), theme.border);
                out.push_row(rule);
                out.blank();
            }
        }
    }

    out.finish()
}

/// Strip control characters and foreign escapes that would corrupt the frame.
///
/// Agent output may contain its own ANSI sequences, carriage returns or
/// backspaces; none of it is ours to replay.
pub fn sanitize_for_tui(text: &str) -> String {
    strip_ansi(text)
        .chars()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .map(|c| if c == '\t' { ' ' } else { c })
        .collect()
}

/// High-level: sanitize, parse and render to rows
pub fn render_markdown(markdown: &str, width: usize, theme: &Theme) -> Vec<String> {
    let sanitized = sanitize_for_tui(markdown);
    let segments = parse_markdown(&sanitized);
    segments_to_lines(&segments, width, theme)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(markdown: &str, width: usize) -> Vec<String> {
        let theme = Theme::hardcoded_default();
        render_markdown(markdown, width, &theme)
            .iter()
            .map(|l| strip_ansi(l))
            .collect()
    }

    #[test]
    fn test_parse_inline_segments() {
        let segments = parse_markdown("use `cargo` and **care**");
        assert!(segments.contains(&StyledSegment::InlineCode("cargo".to_string())));
        assert!(segments.contains(&StyledSegment::Bold("care".to_string())));
    }

    #[test]
    fn test_heading_and_paragraph() {
        let lines = plain("## Plan\n\nDo the thing.", 40);
        assert_eq!(lines, vec!["Plan", "", "Do the thing."]);
    }

    #[test]
    fn test_lines_stay_separate() {
        let lines = plain("first line\nsecond line", 40);
        assert_eq!(lines, vec!["first line", "second line"]);
    }

    #[test]
    fn test_bullets_and_numbers() {
        let lines = plain("- one\n- two\n\n1. a\n2. b", 40);
        assert_eq!(lines, vec!["• one", "• two", "", "1. a", "2. b"]);
    }

    #[test]
    fn test_list_continuation_is_indented() {
        let lines = plain("- alpha beta gamma delta", 12);
        assert_eq!(lines[0], "• alpha beta");
        assert!(lines[1].starts_with("  "));
    }

    #[test]
    fn test_code_block_indented() {
        let lines = plain("```rust\nfn main() {}\n```", 40);
        assert_eq!(lines, vec!["  fn main() {}"]);
    }

    #[test]
    fn test_blockquote_prefix() {
        let lines = plain("> cargo test: ok", 40);
        assert_eq!(lines, vec!["│ cargo test: ok"]);
    }

    #[test]
    fn test_rows_fit_width() {
        let markdown = "# Title\n\nA paragraph with quite a few words that must wrap.\n\n- item with a long description that wraps\n\n```\nlet x = some_function_with_a_very_long_name(argument);\n```\n\n> quoted text that also goes past the edge";
        let theme = Theme::hardcoded_default();
        for line in render_markdown(markdown, 20, &theme) {
            assert!(measure_width(&line) <= 20, "too wide: {:?}", strip_ansi(&line));
        }
    }

    #[test]
    fn test_sanitize_strips_foreign_escapes() {
        assert_eq!(sanitize_for_tui("a\x1b[31mb\rc\x08d"), "abcd");
        assert_eq!(sanitize_for_tui("tab\there"), "tab here");
    }

    #[test]
    fn test_empty_input() {
        assert!(plain("", 40).is_empty());
    }
}
