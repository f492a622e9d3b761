use crate::render_options::RenderOptionsBuilderError;

pub type Result<T> = std::result::Result<T, PDF2PngError>;

#[derive(Debug, thiserror::Error)]
pub enum PDF2PngError {
    #[error("unable to extract page count from pdfinfo output")]
    UnableToExtractPageCount,
    #[error("unable to extract encryption status from pdfinfo output")]
    UnableToExtractEncryptionStatus,
    #[error("no password provided for an encrypted PDF")]
    NoPasswordForEncryptedPDF,
    #[error("converter exited with {status}: {stderr}")]
    ConverterFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("converter output ends with bytes that are not a complete PNG")]
    TruncatedImageStream,
    #[error(transparent)]
    InvalidOptions(#[from] RenderOptionsBuilderError),
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}
