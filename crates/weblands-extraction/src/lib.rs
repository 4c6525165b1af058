//! Content extraction for the fetch ladder.
//!
//! Three families of extractors feed the ladder: the in-process
//! readability stage (main content + Markdown projection), the structural
//! DOM fallback, and the subprocess extractor driving an external parser
//! binary. Metadata chains and markdown link/media mining live here too.

mod markdown;
mod media;
mod metadata;
mod readable;
mod structural;
mod subprocess;

pub use markdown::{links_from_markdown, media_from_markdown};
pub use media::{is_image_url, media_from_html};
pub use metadata::extract_page_meta;
pub use readable::{extract_readable, InProcessReadability};
pub use structural::{links_from_html, structural_text};
pub use subprocess::SubprocessReadability;
