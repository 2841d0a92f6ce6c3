use std::ops::Range;

use pulldown_cmark::{html, CowStr, Event, Parser, Tag};

use super::{parser_options, RenderFlags, RenderRequest};

const GENERATOR: &str = concat!("markdown-convert v", env!("CARGO_PKG_VERSION"));

pub(super) fn render(text: &str, request: &RenderRequest<'_>) -> String {
    let flags = request.flags;
    let parser = Parser::new_ext(text, parser_options(request.extensions, flags));
    let events = adjust_events(text, parser.into_offset_iter(), flags);

    let mut body = String::new();
    if flags.contains(RenderFlags::TOC) {
        let (events, entries) = number_headings(events);
        push_toc(&mut body, &entries);
        if !flags.contains(RenderFlags::OMIT_CONTENTS) {
            html::push_html(&mut body, events.into_iter());
        }
    } else {
        html::push_html(&mut body, events.into_iter());
    }

    if flags.contains(RenderFlags::COMPLETE_PAGE) {
        wrap_page(&body, request.title, request.css, flags.contains(RenderFlags::USE_XHTML))
    } else {
        body
    }
}

fn adjust_events<'a>(
    source: &str,
    events: impl Iterator<Item = (Event<'a>, Range<usize>)>,
    flags: RenderFlags,
) -> Vec<Event<'a>> {
    let xhtml = flags.contains(RenderFlags::USE_XHTML);
    let em_dashes = flags.contains(RenderFlags::USE_SMARTYPANTS)
        && !flags.contains(RenderFlags::SMARTYPANTS_LATEX_DASHES);
    let mut in_code_block = false;

    events
        .map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                event
            }
            Event::End(Tag::CodeBlock(_)) => {
                in_code_block = false;
                event
            }
            Event::HardBreak if !xhtml => Event::Html(CowStr::Borrowed("<br>\n")),
            Event::Rule if !xhtml => Event::Html(CowStr::Borrowed("<hr>\n")),
            // Without LaTeX dash rules a double hyphen is an em dash.
            Event::Text(text)
                if em_dashes && !in_code_block && is_hyphen_run(source, range.clone()) =>
            {
                Event::Text(CowStr::from(text.replace('\u{2013}', "\u{2014}")))
            }
            other => other,
        })
        .collect()
}

/// True when the source behind a text event is nothing but hyphens, which
/// is how smart punctuation output shows up. Literal dashes never match.
fn is_hyphen_run(source: &str, range: Range<usize>) -> bool {
    source
        .get(range)
        .is_some_and(|raw| !raw.is_empty() && raw.bytes().all(|b| b == b'-'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TocEntry {
    level: usize,
    anchor: String,
    text: String,
}

/// Give every heading a `toc_N` id and collect its plain text.
fn number_headings(events: Vec<Event<'_>>) -> (Vec<Event<'_>>, Vec<TocEntry>) {
    let mut out = Vec::with_capacity(events.len());
    let mut entries: Vec<TocEntry> = Vec::new();
    let mut open: Option<TocEntry> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading(level, _, _)) => {
                let level = level as usize;
                let anchor = format!("toc_{}", entries.len());
                out.push(Event::Html(CowStr::from(format!(
                    "<h{level} id=\"{anchor}\">"
                ))));
                open = Some(TocEntry {
                    level,
                    anchor,
                    text: String::new(),
                });
            }
            Event::End(Tag::Heading(level, _, _)) => {
                out.push(Event::Html(CowStr::from(format!(
                    "</h{}>\n",
                    level as usize
                ))));
                if let Some(entry) = open.take() {
                    entries.push(entry);
                }
            }
            Event::Text(ref text) | Event::Code(ref text) => {
                if let Some(entry) = open.as_mut() {
                    entry.text.push_str(text);
                }
                out.push(event);
            }
            other => out.push(other),
        }
    }

    (out, entries)
}

fn push_toc(out: &mut String, entries: &[TocEntry]) {
    if entries.is_empty() {
        return;
    }

    out.push_str("<nav>\n");
    let mut levels: Vec<usize> = Vec::new();
    for entry in entries {
        match levels.last().copied() {
            None => {
                out.push_str("<ul>\n");
                levels.push(entry.level);
            }
            Some(top) if entry.level > top => {
                out.push_str("\n<ul>\n");
                levels.push(entry.level);
            }
            Some(_) => {
                out.push_str("</li>\n");
                while levels.len() > 1 && levels.last().is_some_and(|&top| top > entry.level) {
                    levels.pop();
                    out.push_str("</ul>\n</li>\n");
                }
            }
        }
        out.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            entry.anchor,
            escape_html(&entry.text)
        ));
    }

    out.push_str("</li>\n");
    while levels.pop().is_some() {
        out.push_str("</ul>\n");
        if !levels.is_empty() {
            out.push_str("</li>\n");
        }
    }
    out.push_str("</nav>\n");
}

fn wrap_page(body: &str, title: &str, css: Option<&str>, xhtml: bool) -> String {
    let close = if xhtml { " />" } else { ">" };
    let mut page = String::with_capacity(body.len() + 512);

    if xhtml {
        page.push_str(
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \
             \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\">\n",
        );
        page.push_str("<html xmlns=\"http://www.w3.org/1999/xhtml\">\n");
    } else {
        page.push_str("<!DOCTYPE html>\n<html>\n");
    }
    page.push_str("<head>\n");
    page.push_str(&format!("  <title>{}</title>\n", escape_html(title)));
    page.push_str(&format!(
        "  <meta name=\"GENERATOR\" content=\"{GENERATOR}\"{close}\n"
    ));
    page.push_str(&format!("  <meta charset=\"utf-8\"{close}\n"));
    if let Some(css) = css {
        page.push_str(&format!(
            "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"{close}\n",
            escape_html(css)
        ));
    }
    page.push_str("</head>\n<body>\n\n");
    page.push_str(body);
    page.push_str("\n</body>\n</html>\n");
    page
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
