//! Batch driver: input expansion, per-file naming, rendering and output.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{is_separator, Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::error::{ConvertError, ConvertResult};
use crate::options::Settings;
use crate::profile::{ProfileSession, RenderSample};
use crate::render::{OutputMode, RenderRequest, Renderer};
use crate::template::compose;
use crate::title::{sniff_title, DEFAULT_TITLE};

const STDIN_LABEL: &str = "<stdin>";

pub struct Batch<'a> {
    settings: &'a Settings,
    engine: &'a dyn Renderer,
    profile: Option<&'a mut ProfileSession>,
}

impl<'a> Batch<'a> {
    pub fn new(settings: &'a Settings, engine: &'a dyn Renderer) -> Self {
        Batch {
            settings,
            engine,
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: Option<&'a mut ProfileSession>) -> Self {
        self.profile = profile;
        self
    }

    /// Convert according to the positional arguments.
    ///
    /// * no arguments: `stdin` to `stdout`
    /// * `PATTERN`: every match to `stdout`, back to back
    /// * `PATTERN PREFIX`: every match to `PREFIX + base name + extension`
    ///
    /// The first failure aborts the run.
    pub fn run<R: Read, W: Write>(
        &mut self,
        positional: &[String],
        mut stdin: R,
        mut stdout: W,
    ) -> ConvertResult<()> {
        match positional {
            [] => {
                let mut input = Vec::new();
                stdin
                    .read_to_end(&mut input)
                    .map_err(ConvertError::ReadStdin)?;
                let output = self.convert(&input, "", STDIN_LABEL);
                write_stdout(&mut stdout, &output)
            }
            [pattern] => self.run_pattern(pattern, None, &mut stdout),
            [pattern, prefix] => self.run_pattern(pattern, Some(prefix.as_str()), &mut stdout),
            _ => Err(ConvertError::TooManyArguments(positional.len())),
        }
    }

    fn run_pattern<W: Write>(
        &mut self,
        pattern: &str,
        prefix: Option<&str>,
        stdout: &mut W,
    ) -> ConvertResult<()> {
        let entries = glob::glob(pattern).map_err(|source| ConvertError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        for entry in entries {
            let path = entry.map_err(|err| {
                let path = err.path().to_path_buf();
                ConvertError::ReadInput {
                    path,
                    source: io::Error::from(err),
                }
            })?;
            let input = fs::read(&path).map_err(|source| ConvertError::ReadInput {
                path: path.clone(),
                source,
            })?;

            let label = path.to_string_lossy();
            let name = base_name(&label);
            let output = self.convert(&input, &name, &label);

            match prefix {
                Some(prefix) => {
                    let target = output_path(prefix, &name, self.settings.mode());
                    write_file(&target, &output)?;
                    info!(input = %label, output = %target.display(), "converted");
                }
                None => write_stdout(stdout, &output)?,
            }
        }

        Ok(())
    }

    /// Render one document and apply the template, if any.
    pub fn convert(&mut self, input: &[u8], file_name: &str, source: &str) -> String {
        let title = if self.settings.wants_title() {
            sniff_title(input)
        } else {
            DEFAULT_TITLE.to_string()
        };
        let request = self.settings.render_request(&title);
        let passes = self.settings.repeat();

        debug!(source, passes, title = %title, "rendering");
        let started = Instant::now();
        let rendered = render_repeated(self.engine, input, &request, passes);
        if let Some(profile) = self.profile.as_deref_mut() {
            profile.record(RenderSample {
                source: source.to_string(),
                passes,
                total: started.elapsed(),
            });
        }

        compose(self.settings.template(), &title, file_name, rendered)
    }
}

/// Render `passes` times and keep the last result.
pub fn render_repeated(
    engine: &dyn Renderer,
    input: &[u8],
    request: &RenderRequest<'_>,
    passes: usize,
) -> String {
    let mut output = engine.render(input, request);
    for pass in 1..passes {
        trace!(pass, "repeat render");
        output = engine.render(input, request);
    }
    output
}

/// Final path segment with a trailing `.md` (any case) removed.
pub fn base_name(path: &str) -> String {
    let bytes = path.as_bytes();
    let stem = if bytes.len() > 3 && bytes[bytes.len() - 3..].eq_ignore_ascii_case(b".md") {
        &path[..path.len() - 3]
    } else {
        path
    };
    match stem.rfind(is_separator) {
        Some(idx) => stem[idx + 1..].to_string(),
        None => stem.to_string(),
    }
}

/// `prefix` is used verbatim; no separator is inserted before the base name.
pub fn output_path(prefix: &str, base_name: &str, mode: OutputMode) -> PathBuf {
    PathBuf::from(format!("{prefix}{base_name}{}", mode.file_extension()))
}

fn write_file(path: &Path, content: &str) -> ConvertResult<()> {
    let mut file = File::create(path).map_err(|source| ConvertError::CreateOutput {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(content.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|source| ConvertError::WriteOutput {
            target: path.display().to_string(),
            source,
        })
}

fn write_stdout<W: Write>(stdout: &mut W, content: &str) -> ConvertResult<()> {
    match stdout
        .write_all(content.as_bytes())
        .and_then(|_| stdout.flush())
    {
        Ok(()) => Ok(()),
        Err(err) if should_ignore_pipe_error(&err) => Ok(()),
        Err(source) => Err(ConvertError::WriteOutput {
            target: "stdout".to_string(),
            source,
        }),
    }
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::BrokenPipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn base_name_strips_md_suffix_and_directories() {
        assert_eq!(base_name("docs/guide.md"), "guide");
        assert_eq!(base_name("docs/GUIDE.MD"), "GUIDE");
        assert_eq!(base_name("notes.txt"), "notes.txt");
        assert_eq!(base_name("a/b/c.markdown"), "c.markdown");
        assert_eq!(base_name("x.md"), "x");
    }

    #[test]
    fn base_name_edge_cases() {
        // Too short to carry a suffix.
        assert_eq!(base_name(".md"), ".md");
        // Stripping leaves only the directory.
        assert_eq!(base_name("docs/.md"), "");
    }

    #[test]
    fn output_path_concatenates_without_separator() {
        assert_eq!(
            output_path("out", "guide", OutputMode::Html),
            PathBuf::from("outguide.html")
        );
        assert_eq!(
            output_path("out/", "guide", OutputMode::Latex),
            PathBuf::from("out/guide.tex")
        );
    }

    struct CountingEngine {
        calls: Cell<usize>,
    }

    impl Renderer for CountingEngine {
        fn render(&self, input: &[u8], _request: &RenderRequest<'_>) -> String {
            self.calls.set(self.calls.get() + 1);
            String::from_utf8_lossy(input).to_uppercase()
        }
    }

    #[test]
    fn render_repeated_keeps_last_result() {
        let engine = CountingEngine {
            calls: Cell::new(0),
        };
        let settings = Settings::resolve(&Default::default());
        let request = settings.render_request("");

        let once = render_repeated(&engine, b"abc", &request, 1);
        assert_eq!(engine.calls.get(), 1);

        let many = render_repeated(&engine, b"abc", &request, 5);
        assert_eq!(engine.calls.get(), 6);
        assert_eq!(once, many);
    }
}
