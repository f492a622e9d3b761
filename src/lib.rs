//! # Overview
//! This crate converts PDFs to `image::DynamicImage`s by wrapping `pdfinfo` and
//! `pdftoppm` (part of [poppler](https://poppler.freedesktop.org/)). The requested
//! page span is split into contiguous partitions and one converter process is
//! spawned per partition, so large documents render in parallel; results are
//! reassembled in page order.
//!
//! It requires `poppler` to be installed on your system. If the tools are not on
//! `PATH`, point the `PDF2PNG_POPPLER_PATH` environment variable at the directory
//! containing them.
//!
//! Pages can either be streamed back in memory or written into an output
//! directory, where each page ends up as `<document stem>-<page number>.png`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf2png::{convert_from_path, Pages, RenderOptionsBuilder};
//!
//! #[tokio::main]
//! async fn main() -> pdf2png::Result<()> {
//!     let options = RenderOptionsBuilder::default()
//!         .dpi(300_u32)
//!         .thread_count(4_usize)
//!         .build()?;
//!     let pages = convert_from_path("document.pdf", Pages::Range(1..=8), &options).await?;
//!     println!("rendered {} pages", pages.len());
//!
//!     Ok(())
//! }
//! ```
mod buffer;
mod error;
mod partition;
mod pdf;
mod render_options;

pub use error::{PDF2PngError, Result};
pub use pdf::{convert_from_bytes, convert_from_path, Pages, PdfInfo, RenderedPage};
pub use render_options::{RenderOptions, RenderOptionsBuilder, RenderOptionsBuilderError};

// re-export image crate
pub use image;
