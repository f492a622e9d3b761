use pdf2png::{convert_from_path, PDF2PngError, Pages, RenderOptionsBuilder};

#[tokio::main]
async fn main() -> Result<(), PDF2PngError> {
    let path = std::env::args()
        .nth(1)
        .expect("usage: render_pages <pdf> [output dir]");
    let mut builder = RenderOptionsBuilder::default();
    builder.dpi(150_u32).thread_count(4_usize);
    if let Some(dir) = std::env::args().nth(2) {
        builder.output_dir(std::path::PathBuf::from(dir));
    }
    let options = builder.build()?;

    let pages = convert_from_path(&path, Pages::All, &options).await?;
    for page in &pages {
        println!(
            "page {}: {}x{}",
            page.page,
            page.image.width(),
            page.image.height()
        );
    }

    Ok(())
}
