//! Flag resolution into the effective conversion settings.

use std::fs;
use std::path::{Path, PathBuf};

use markdown_convert_config::FlagLayer;

use crate::error::{ConvertError, ConvertResult};
use crate::render::{Extensions, OutputMode, RenderFlags, RenderRequest};

/// Flags as the user supplied them, before any implication is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFlags {
    pub page: bool,
    pub toc: bool,
    pub toc_only: bool,
    pub xhtml: bool,
    pub latex: bool,
    pub smartypants: bool,
    pub latex_dashes: bool,
    pub fractions: bool,
    pub css: Option<String>,
    pub template: Option<PathBuf>,
    pub repeat: usize,
}

impl Default for RawFlags {
    fn default() -> Self {
        RawFlags {
            page: false,
            toc: false,
            toc_only: false,
            xhtml: true,
            latex: false,
            smartypants: true,
            latex_dashes: true,
            fractions: true,
            css: None,
            template: None,
            repeat: 1,
        }
    }
}

impl From<FlagLayer> for RawFlags {
    fn from(layer: FlagLayer) -> Self {
        let defaults = RawFlags::default();
        RawFlags {
            page: layer.page.unwrap_or(defaults.page),
            toc: layer.toc.unwrap_or(defaults.toc),
            toc_only: layer.toc_only.unwrap_or(defaults.toc_only),
            xhtml: layer.xhtml.unwrap_or(defaults.xhtml),
            latex: layer.latex.unwrap_or(defaults.latex),
            smartypants: layer.smartypants.unwrap_or(defaults.smartypants),
            latex_dashes: layer.latex_dashes.unwrap_or(defaults.latex_dashes),
            fractions: layer.fractions.unwrap_or(defaults.fractions),
            css: layer.css.or(defaults.css),
            template: layer.template.or(defaults.template),
            repeat: layer.repeat.unwrap_or(defaults.repeat),
        }
    }
}

impl From<&Settings> for RawFlags {
    fn from(settings: &Settings) -> Self {
        RawFlags {
            page: settings.page,
            toc: settings.toc,
            toc_only: settings.toc_only,
            xhtml: settings.xhtml,
            latex: settings.mode == OutputMode::Latex,
            smartypants: settings.smartypants,
            latex_dashes: settings.latex_dashes,
            fractions: settings.fractions,
            css: settings.css.clone(),
            template: settings.template_path.clone(),
            repeat: settings.repeat,
        }
    }
}

/// Effective configuration for a whole run. Built once, never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    mode: OutputMode,
    page: bool,
    toc: bool,
    toc_only: bool,
    xhtml: bool,
    smartypants: bool,
    latex_dashes: bool,
    fractions: bool,
    css: Option<String>,
    template_path: Option<PathBuf>,
    template: Option<String>,
    extensions: Extensions,
    render_flags: RenderFlags,
    repeat: usize,
}

impl Settings {
    /// Apply the flag implications. Pure; the template is not read.
    ///
    /// Order matters: a stylesheet implies a page, a page rules out LaTeX,
    /// contents-only implies a TOC, and a TOC rules out LaTeX.
    pub fn resolve(flags: &RawFlags) -> Settings {
        let page = flags.page || flags.css.is_some();
        let mut latex = flags.latex && !page;
        let toc_only = flags.toc_only;
        let toc = flags.toc || toc_only;
        latex = latex && !toc;

        let mode = if latex {
            OutputMode::Latex
        } else {
            OutputMode::Html
        };

        let mut render_flags = RenderFlags::empty();
        if mode == OutputMode::Html {
            let toggles = [
                (flags.xhtml, RenderFlags::USE_XHTML),
                (flags.smartypants, RenderFlags::USE_SMARTYPANTS),
                (flags.fractions, RenderFlags::SMARTYPANTS_FRACTIONS),
                (flags.latex_dashes, RenderFlags::SMARTYPANTS_LATEX_DASHES),
                (page, RenderFlags::COMPLETE_PAGE),
                (toc_only, RenderFlags::OMIT_CONTENTS),
                (toc, RenderFlags::TOC),
            ];
            for (enabled, flag) in toggles {
                if enabled {
                    render_flags |= flag;
                }
            }
        }

        Settings {
            mode,
            page,
            toc,
            toc_only,
            xhtml: flags.xhtml,
            smartypants: flags.smartypants,
            latex_dashes: flags.latex_dashes,
            fractions: flags.fractions,
            css: flags.css.clone(),
            // Templates only wrap HTML output.
            template_path: match mode {
                OutputMode::Html => flags.template.clone(),
                OutputMode::Latex => None,
            },
            template: None,
            extensions: Extensions::BASELINE,
            render_flags,
            repeat: flags.repeat.max(1),
        }
    }

    /// Resolve flags and read the template file, if one applies.
    pub fn load(flags: &RawFlags) -> ConvertResult<Settings> {
        let mut settings = Settings::resolve(flags);
        if let Some(path) = &settings.template_path {
            settings.template = Some(read_template(path)?);
        }
        Ok(settings)
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn page(&self) -> bool {
        self.page
    }

    pub fn toc(&self) -> bool {
        self.toc
    }

    pub fn toc_only(&self) -> bool {
        self.toc_only
    }

    pub fn css(&self) -> Option<&str> {
        self.css.as_deref()
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn extensions(&self) -> Extensions {
        self.extensions
    }

    pub fn render_flags(&self) -> RenderFlags {
        self.render_flags
    }

    pub fn repeat(&self) -> usize {
        self.repeat
    }

    /// A title is only consumed by a complete page or a template.
    pub fn wants_title(&self) -> bool {
        self.mode == OutputMode::Html && (self.page || self.template.is_some())
    }

    pub fn render_request<'a>(&'a self, title: &'a str) -> RenderRequest<'a> {
        RenderRequest {
            mode: self.mode,
            flags: self.render_flags,
            extensions: self.extensions,
            title,
            css: self.css(),
        }
    }
}

fn read_template(path: &Path) -> ConvertResult<String> {
    let bytes = fs::read(path).map_err(|source| ConvertError::Template {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
