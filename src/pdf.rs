use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use futures::{stream, StreamExt, TryStreamExt};
use image::{DynamicImage, ImageFormat, ImageReader, Limits};
use log::debug;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::buffer::split_png_stream;
use crate::error::{PDF2PngError, Result};
use crate::partition::{partition_range, Partition};
use crate::render_options::RenderOptions;

/// The document handed to the poppler tools, either as a path argument or
/// piped over stdin.
#[derive(Clone, Copy)]
enum Document<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

impl Document<'_> {
    /// File stem used when naming rendered pages.
    fn stem(&self) -> String {
        match self {
            Document::Path(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "pdf".to_string()),
            Document::Bytes(_) => "pdf".to_string(),
        }
    }
}

pub struct PdfInfo {
    /// The page count within the pdf
    page_count: u32,
    /// Whether the PDF is encrypted
    encrypted: bool,
}

impl PdfInfo {
    pub async fn read_from_path(path: impl AsRef<Path>, password: Option<&str>) -> Result<Self> {
        Self::read(Document::Path(path.as_ref()), password).await
    }

    pub async fn read_from_bytes(data: &[u8], password: Option<&str>) -> Result<Self> {
        Self::read(Document::Bytes(data), password).await
    }

    async fn read(doc: Document<'_>, password: Option<&str>) -> Result<Self> {
        let (page_count, encrypted) = extract_pdf_info(doc, password).await?;

        Ok(Self {
            page_count,
            encrypted,
        })
    }

    /// Returns the number of pages in the PDF.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Returns whether the PDF is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }
}

#[derive(Debug, Clone)]
/// Specifies which pages to render. Page numbers are 1-based and the span
/// is contiguous so it can be partitioned across workers.
pub enum Pages {
    All,
    Range(std::ops::RangeInclusive<u32>),
}

impl Pages {
    /// Clamps the request to `[1, total]`, returning `None` when nothing
    /// is left to render.
    fn resolve(&self, total: u32) -> Option<(u32, u32)> {
        let (first, last) = match self {
            Pages::All => (1, total),
            Pages::Range(range) => ((*range.start()).max(1), (*range.end()).min(total)),
        };
        (first <= last).then_some((first, last))
    }
}

/// A single rendered page, in output order.
#[derive(Debug)]
pub struct RenderedPage {
    /// Absolute 1-based page number within the source document.
    pub page: u32,
    /// The decoded raster image.
    pub image: DynamicImage,
    /// Final location on disk when rendering into an output directory.
    pub path: Option<PathBuf>,
}

/// Image as produced by one worker, before pages are numbered and renamed.
struct CollectedImage {
    image: DynamicImage,
    path: Option<PathBuf>,
}

/// Renders the PDF at `path` to images.
pub async fn convert_from_path(
    path: impl AsRef<Path>,
    pages: Pages,
    options: &RenderOptions,
) -> Result<Vec<RenderedPage>> {
    convert(Document::Path(path.as_ref()), pages, options).await
}

/// Renders an in-memory PDF to images.
pub async fn convert_from_bytes(
    data: &[u8],
    pages: Pages,
    options: &RenderOptions,
) -> Result<Vec<RenderedPage>> {
    convert(Document::Bytes(data), pages, options).await
}

async fn convert(
    doc: Document<'_>,
    pages: Pages,
    options: &RenderOptions,
) -> Result<Vec<RenderedPage>> {
    let info = PdfInfo::read(doc, options.password.as_deref()).await?;
    if info.encrypted && options.password.is_none() {
        return Err(PDF2PngError::NoPasswordForEncryptedPDF);
    }

    let Some((first, last)) = pages.resolve(info.page_count()) else {
        return Ok(Vec::new());
    };

    let partitions = partition_range(first, last, options.thread_count);
    let pool_size = partitions.len();
    debug!("rendering pages {first}..={last} across {pool_size} converter processes");

    // Ordered stream bounded to the clamped worker count: at most
    // `pool_size` converters run at once, and results come back in
    // partition order so assembly needs no re-sort.
    let collected: Vec<Vec<CollectedImage>> = stream::iter(partitions)
        .map(|partition| run_partition(doc, partition, options))
        .buffered(pool_size)
        .try_collect()
        .await?;

    assemble(doc.stem(), first, collected, options).await
}

/// Spawns one converter for a partition, waits for it, and collects its
/// images from either the output directory or its stdout stream.
async fn run_partition(
    doc: Document<'_>,
    partition: Partition,
    options: &RenderOptions,
) -> Result<Vec<CollectedImage>> {
    let mut command = Command::new(get_executable_path("pdftoppm"));
    command
        .arg("-png")
        .args([
            "-f".to_string(),
            partition.first.to_string(),
            "-l".to_string(),
            partition.last.to_string(),
        ])
        .args(options.to_cli_args());

    match doc {
        Document::Path(path) => {
            command.arg(path);
        }
        Document::Bytes(_) => {
            command.arg("-").stdin(Stdio::piped());
        }
    }
    if let Some(dir) = &options.output_dir {
        command.arg(dir.join(&partition.run_id));
    }

    debug!(
        "partition {}: pages {}..={} (run id {})",
        partition.index, partition.first, partition.last, partition.run_id
    );

    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Document::Bytes(data) = doc {
        // UNWRAP SAFETY: The child process is guaranteed to have a stdin as .stdin(Stdio::piped()) was called
        child.stdin.as_mut().unwrap().write_all(data).await?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(PDF2PngError::ConverterFailed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    match &options.output_dir {
        Some(dir) => collect_from_dir(dir, &partition.run_id, &options.decode_limits).await,
        None => split_png_stream(&output.stdout)?
            .into_iter()
            .map(|bytes| {
                decode_png(bytes, &options.decode_limits)
                    .map(|image| CollectedImage { image, path: None })
            })
            .collect(),
    }
}

/// Loads the files a worker left in the output directory, filtered by its
/// run id and sorted by file name.
async fn collect_from_dir(dir: &Path, run_id: &str, limits: &Limits) -> Result<Vec<CollectedImage>> {
    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name().to_string_lossy().contains(run_id) {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(&path).await?;
        images.push(CollectedImage {
            image: decode_png(&bytes, limits)?,
            path: Some(path),
        });
    }
    Ok(images)
}

fn decode_png(bytes: &[u8], limits: &Limits) -> Result<DynamicImage> {
    let mut reader = ImageReader::with_format(Cursor::new(bytes), ImageFormat::Png);
    reader.limits(limits.clone());
    Ok(reader.decode()?)
}

/// Numbers images by absolute page and, in directory mode, renames each
/// backing file to `<stem>-<page>.png`. A pre-existing file with the
/// target name is replaced.
async fn assemble(
    stem: String,
    first: u32,
    collected: Vec<Vec<CollectedImage>>,
    options: &RenderOptions,
) -> Result<Vec<RenderedPage>> {
    let mut pages = Vec::new();
    for (offset, item) in collected.into_iter().flatten().enumerate() {
        let page = first + offset as u32;
        let path = match (item.path, &options.output_dir) {
            (Some(old), Some(dir)) => {
                let target = dir.join(target_file_name(&stem, page));
                if target != old {
                    let _ = tokio::fs::remove_file(&target).await;
                    tokio::fs::rename(&old, &target).await?;
                }
                Some(target)
            }
            _ => None,
        };
        pages.push(RenderedPage {
            page,
            image: item.image,
            path,
        });
    }
    Ok(pages)
}

fn target_file_name(stem: &str, page: u32) -> String {
    format!("{stem}-{page}.png")
}

/// Determines the executable path for the provided command
pub(crate) fn get_executable_path(command: &str) -> String {
    if let Ok(poppler_path) = std::env::var("PDF2PNG_POPPLER_PATH") {
        #[cfg(target_os = "windows")]
        return format!("{}\\{}.exe", poppler_path, command);
        #[cfg(not(target_os = "windows"))]
        return format!("{}/{}", poppler_path, command);
    }

    #[cfg(target_os = "windows")]
    return format!("{}.exe", command);

    #[cfg(not(target_os = "windows"))]
    return command.to_string();
}

async fn extract_pdf_info(doc: Document<'_>, password: Option<&str>) -> Result<(u32, bool)> {
    let mut command = Command::new(get_executable_path("pdfinfo"));
    if let Some(password) = password {
        command.args(["-upw", password]);
    }
    match doc {
        Document::Path(path) => {
            command.arg(path);
        }
        Document::Bytes(_) => {
            command.arg("-").stdin(Stdio::piped());
        }
    }

    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Document::Bytes(data) = doc {
        // UNWRAP SAFETY: The child process is guaranteed to have a stdin as .stdin(Stdio::piped()) was called
        child.stdin.as_mut().unwrap().write_all(data).await?;
    }
    let output = child.wait_with_output().await?;

    let page_count = field_value(&output.stdout, b"Pages:")?
        .ok_or(PDF2PngError::UnableToExtractPageCount)?
        .parse::<u32>()
        .map_err(|_| PDF2PngError::UnableToExtractPageCount)?;

    let encrypted = match field_value(&output.stdout, b"Encrypted:")? {
        Some("yes") => true,
        Some("no") => false,
        _ => return Err(PDF2PngError::UnableToExtractEncryptionStatus),
    };

    Ok((page_count, encrypted))
}

/// Value of a `Label: value` line in pdfinfo output, if present. Only the
/// first token after the label is returned.
fn field_value<'a>(stdout: &'a [u8], label: &[u8]) -> Result<Option<&'a str>> {
    for line in stdout.split(|&byte| byte == b'\n') {
        if line.starts_with(label) {
            let line = std::str::from_utf8(line)?;
            return Ok(line.split_whitespace().nth(1));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_options::RenderOptionsBuilder;

    fn blank_image() -> CollectedImage {
        CollectedImage {
            image: DynamicImage::new_rgb8(1, 1),
            path: None,
        }
    }

    #[test]
    fn pages_resolve_clamps_to_the_document() {
        assert_eq!(Pages::All.resolve(5), Some((1, 5)));
        assert_eq!(Pages::Range(2..=9).resolve(5), Some((2, 5)));
        assert_eq!(Pages::Range(0..=3).resolve(5), Some((1, 3)));
        assert_eq!(Pages::Range(7..=9).resolve(5), None);
    }

    #[test]
    fn field_value_reads_the_token_after_the_label() {
        let stdout = b"Title:          report\nPages:          12\nEncrypted:      no\n" as &[u8];
        assert_eq!(field_value(stdout, b"Pages:").unwrap(), Some("12"));
        assert_eq!(field_value(stdout, b"Encrypted:").unwrap(), Some("no"));
        assert_eq!(field_value(stdout, b"Producer:").unwrap(), None);
    }

    #[test]
    fn target_names_carry_the_stem_and_page() {
        assert_eq!(target_file_name("report", 3), "report-3.png");
    }

    #[tokio::test]
    async fn buffer_mode_pages_are_numbered_from_the_first_requested_page() {
        let collected = vec![vec![blank_image(), blank_image()], vec![blank_image()]];
        let options = RenderOptionsBuilder::default().build().unwrap();

        let pages = assemble("doc".to_string(), 3, collected, &options)
            .await
            .unwrap();
        let numbers: Vec<u32> = pages.iter().map(|page| page.page).collect();
        assert_eq!(numbers, vec![3, 4, 5]);
        assert!(pages.iter().all(|page| page.path.is_none()));
    }

    #[tokio::test]
    async fn directory_collection_filters_by_run_id() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["aaa-1.png", "aaa-2.png", "bbb-1.png"] {
            image::RgbImage::new(2, 2)
                .save(dir.path().join(name))
                .unwrap();
        }

        let collected = collect_from_dir(dir.path(), "aaa", &Limits::default())
            .await
            .unwrap();
        assert_eq!(collected.len(), 2);
        for (item, expected) in collected.iter().zip(["aaa-1.png", "aaa-2.png"]) {
            assert_eq!(
                item.path.as_deref(),
                Some(dir.path().join(expected).as_path())
            );
        }
    }

    #[tokio::test]
    async fn directory_mode_renames_files_by_absolute_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut collected = Vec::new();
        for name in ["run-1.png", "run-2.png"] {
            let path = dir.path().join(name);
            image::RgbImage::new(2, 2).save(&path).unwrap();
            collected.push(CollectedImage {
                image: DynamicImage::new_rgb8(2, 2),
                path: Some(path),
            });
        }
        // A leftover from an earlier run is replaced without error.
        image::RgbImage::new(4, 4)
            .save(dir.path().join("doc-3.png"))
            .unwrap();

        let options = RenderOptionsBuilder::default()
            .output_dir(dir.path().to_path_buf())
            .build()
            .unwrap();
        let pages = assemble("doc".to_string(), 3, vec![collected], &options)
            .await
            .unwrap();

        assert_eq!(
            pages[0].path.as_deref(),
            Some(dir.path().join("doc-3.png").as_path())
        );
        assert_eq!(
            pages[1].path.as_deref(),
            Some(dir.path().join("doc-4.png").as_path())
        );
        assert!(!dir.path().join("run-1.png").exists());
    }
}
