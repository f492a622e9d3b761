use std::path::PathBuf;

use derive_builder::Builder;
use image::Limits;

/// Options controlling how pages are rendered.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct RenderOptions {
    /// Rendering resolution in dots per inch.
    #[builder(default = "200")]
    pub dpi: u32,
    /// Upper bound on the number of converter processes spawned at once.
    /// Clamped to the number of pages actually being rendered.
    #[builder(default = "1")]
    pub thread_count: usize,
    /// Directory the converter writes page files into. When unset, pages
    /// are streamed back over the converter's stdout instead of going
    /// through the filesystem.
    #[builder(default, setter(strip_option))]
    pub output_dir: Option<PathBuf>,
    /// User password for encrypted documents, passed via `-upw`.
    #[builder(default, setter(strip_option))]
    pub password: Option<String>,
    /// Resource limits applied when decoding each produced image. Use
    /// [`Limits::no_limits`] to disable the decompression guard.
    #[builder(default)]
    pub decode_limits: Limits,
}

impl RenderOptions {
    /// Converter arguments shared by every partition.
    pub(crate) fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec!["-r".to_string(), self.dpi.to_string()];
        if let Some(password) = &self.password {
            args.push("-upw".to_string());
            args.push(password.clone());
        }
        args
    }
}
