//! Batch Markdown conversion: title sniffing, flag resolution, templates and
//! the driver that ties them to the rendering engine.

pub mod batch;
pub mod error;
pub mod options;
pub mod profile;
pub mod render;
pub mod template;
pub mod title;

pub use batch::{base_name, output_path, render_repeated, Batch};
pub use error::{ConvertError, ConvertResult};
pub use options::{RawFlags, Settings};
pub use profile::{ProfileError, ProfileSession, RenderSample};
pub use render::{Extensions, MarkdownEngine, OutputMode, RenderFlags, RenderRequest, Renderer};
pub use template::compose;
pub use title::{sniff_title, DEFAULT_TITLE};
