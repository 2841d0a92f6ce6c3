use pulldown_cmark::{Alignment, CodeBlockKind, Event, Parser, Tag};

use super::{parser_options, RenderFlags, RenderRequest};

const PREAMBLE: &str = "\\documentclass{article}\n\
\n\
\\usepackage{graphicx}\n\
\\usepackage{listings}\n\
\\usepackage[margin=1in]{geometry}\n\
\\usepackage[utf8]{inputenc}\n\
\\usepackage{verbatim}\n\
\\usepackage[normalem]{ulem}\n\
\\usepackage{hyperref}\n\
\n\
\\hypersetup{colorlinks,%\n\
  citecolor=black,%\n\
  filecolor=black,%\n\
  linkcolor=black,%\n\
  urlcolor=black,%\n\
  pdfstartview=FitH,%\n\
  breaklinks=true,%\n\
  pdfauthor={markdown-convert}}\n\
\n\
\\newcommand{\\HRule}{\\rule{\\linewidth}{0.5mm}}\n\
\\addtolength{\\parskip}{0.5\\baselineskip}\n\
\\parindent=0pt\n\
\n\
\\begin{document}\n";

const POSTAMBLE: &str = "\n\\end{document}\n";

/// HTML toggles do not apply here; only the parser extensions matter.
pub(super) fn render(text: &str, request: &RenderRequest<'_>) -> String {
    let parser = Parser::new_ext(text, parser_options(request.extensions, RenderFlags::empty()));
    let mut writer = LatexWriter::default();
    writer.out.push_str(PREAMBLE);
    for event in parser {
        writer.event(event);
    }
    writer.out.push_str(POSTAMBLE);
    writer.out
}

#[derive(Default)]
struct LatexWriter {
    out: String,
    in_code_block: bool,
    image_depth: usize,
    cell_index: usize,
}

impl LatexWriter {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.image_depth > 0 {
                    return;
                }
                if self.in_code_block {
                    self.out.push_str(&text);
                } else {
                    self.out.push_str(&escape_latex(&text));
                }
            }
            Event::Code(code) => {
                self.out.push_str("\\texttt{");
                self.out.push_str(&escape_latex(&code));
                self.out.push('}');
            }
            Event::SoftBreak => self.out.push('\n'),
            Event::HardBreak => self.out.push_str(" \\\\\n"),
            Event::Rule => self.out.push_str("\n\\HRule\n"),
            Event::TaskListMarker(checked) => {
                self.out.push_str(if checked { "[x] " } else { "[ ] " })
            }
            Event::Html(_) | Event::FootnoteReference(_) => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.out.push('\n'),
            Tag::Heading(level, _, _) => {
                let command = match level as usize {
                    1 => "\\section{",
                    2 => "\\subsection{",
                    3 => "\\subsubsection{",
                    4 => "\\paragraph{",
                    5 => "\\subparagraph{",
                    _ => "\\textbf{",
                };
                self.out.push('\n');
                self.out.push_str(command);
            }
            Tag::BlockQuote => self.out.push_str("\n\\begin{quotation}\n"),
            Tag::CodeBlock(kind) => {
                if let CodeBlockKind::Fenced(lang) = &kind {
                    if !lang.is_empty() {
                        self.out.push_str(&format!("\n% language: {}", &**lang));
                    }
                }
                self.out.push_str("\n\\begin{verbatim}\n");
                self.in_code_block = true;
            }
            Tag::List(Some(_)) => self.out.push_str("\n\\begin{enumerate}\n"),
            Tag::List(None) => self.out.push_str("\n\\begin{itemize}\n"),
            Tag::Item => self.out.push_str("\\item "),
            Tag::Table(alignments) => {
                let columns: String = alignments.iter().map(column_spec).collect();
                self.out.push_str(&format!("\n\\begin{{tabular}}{{{columns}}}\n"));
            }
            Tag::TableHead | Tag::TableRow => self.cell_index = 0,
            Tag::TableCell => {
                if self.cell_index > 0 {
                    self.out.push_str(" & ");
                }
                self.cell_index += 1;
            }
            Tag::Emphasis => self.out.push_str("\\emph{"),
            Tag::Strong => self.out.push_str("\\textbf{"),
            Tag::Strikethrough => self.out.push_str("\\sout{"),
            Tag::Link(_, dest, _) => {
                self.out.push_str(&format!("\\href{{{}}}{{", escape_url(&dest)));
            }
            Tag::Image(_, dest, _) => {
                if self.image_depth == 0 {
                    self.out
                        .push_str(&format!("\\includegraphics{{{}}}", escape_url(&dest)));
                }
                self.image_depth += 1;
            }
            Tag::FootnoteDefinition(_) => {}
        }
    }

    fn end(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.out.push('\n'),
            Tag::Heading(..) => self.out.push_str("}\n"),
            Tag::BlockQuote => self.out.push_str("\\end{quotation}\n"),
            Tag::CodeBlock(_) => {
                self.in_code_block = false;
                self.out.push_str("\\end{verbatim}\n");
            }
            Tag::List(Some(_)) => self.out.push_str("\\end{enumerate}\n"),
            Tag::List(None) => self.out.push_str("\\end{itemize}\n"),
            Tag::Item => {
                if !self.out.ends_with('\n') {
                    self.out.push('\n');
                }
            }
            Tag::Table(_) => self.out.push_str("\\end{tabular}\n"),
            Tag::TableHead => self.out.push_str(" \\\\\n\\hline\n"),
            Tag::TableRow => self.out.push_str(" \\\\\n"),
            Tag::TableCell | Tag::FootnoteDefinition(_) => {}
            Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link(..) => {
                self.out.push('}')
            }
            Tag::Image(..) => self.image_depth = self.image_depth.saturating_sub(1),
        }
    }
}

fn column_spec(alignment: &Alignment) -> char {
    match alignment {
        Alignment::Center => 'c',
        Alignment::Right => 'r',
        Alignment::None | Alignment::Left => 'l',
    }
}

fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\textbackslash{}"),
            '~' => escaped.push_str("\\textasciitilde{}"),
            '^' => escaped.push_str("\\textasciicircum{}"),
            '{' | '}' | '$' | '&' | '#' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn escape_url(url: &str) -> String {
    url.replace('%', "\\%").replace('#', "\\#")
}
