//! Adapter around the Markdown engine (pulldown-cmark).
//!
//! The batch driver only sees the [`Renderer`] trait: document bytes plus a
//! [`RenderRequest`] in, rendered text out. No state is carried between calls.

mod html;
mod latex;

use bitflags::bitflags;
use pulldown_cmark::Options;

bitflags! {
    /// Parser features requested from the engine.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Extensions: u32 {
        const NO_INTRA_EMPHASIS = 1 << 0;
        const TABLES = 1 << 1;
        const FENCED_CODE = 1 << 2;
        const AUTOLINK = 1 << 3;
        const STRIKETHROUGH = 1 << 4;
        const SPACE_HEADERS = 1 << 5;

        /// The fixed set every document is parsed with.
        const BASELINE = Self::NO_INTRA_EMPHASIS.bits()
            | Self::TABLES.bits()
            | Self::FENCED_CODE.bits()
            | Self::AUTOLINK.bits()
            | Self::STRIKETHROUGH.bits()
            | Self::SPACE_HEADERS.bits();
    }
}

bitflags! {
    /// HTML output toggles. Ignored in LaTeX mode.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u32 {
        const USE_XHTML = 1 << 0;
        const USE_SMARTYPANTS = 1 << 1;
        const SMARTYPANTS_FRACTIONS = 1 << 2;
        const SMARTYPANTS_LATEX_DASHES = 1 << 3;
        const COMPLETE_PAGE = 1 << 4;
        const TOC = 1 << 5;
        const OMIT_CONTENTS = 1 << 6;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Html,
    Latex,
}

impl OutputMode {
    /// Extension (with leading dot) for files written in this mode.
    pub fn file_extension(self) -> &'static str {
        match self {
            OutputMode::Html => ".html",
            OutputMode::Latex => ".tex",
        }
    }
}

/// Everything the engine needs besides the document itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderRequest<'a> {
    pub mode: OutputMode,
    pub flags: RenderFlags,
    pub extensions: Extensions,
    pub title: &'a str,
    pub css: Option<&'a str>,
}

pub trait Renderer {
    fn render(&self, input: &[u8], request: &RenderRequest<'_>) -> String;
}

/// pulldown-cmark backed engine producing HTML or LaTeX.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkdownEngine;

impl Renderer for MarkdownEngine {
    fn render(&self, input: &[u8], request: &RenderRequest<'_>) -> String {
        let text = String::from_utf8_lossy(input);
        match request.mode {
            OutputMode::Html => html::render(&text, request),
            OutputMode::Latex => latex::render(&text, request),
        }
    }
}

// Intra-word emphasis rules, fenced code and ATX spacing are plain CommonMark
// behaviour in pulldown-cmark; bare-URL autolinking has no engine switch.
fn parser_options(extensions: Extensions, flags: RenderFlags) -> Options {
    let mut options = Options::empty();
    if extensions.contains(Extensions::TABLES) {
        options.insert(Options::ENABLE_TABLES);
    }
    if extensions.contains(Extensions::STRIKETHROUGH) {
        options.insert(Options::ENABLE_STRIKETHROUGH);
    }
    if flags.contains(RenderFlags::USE_SMARTYPANTS) {
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
    }
    options
}
