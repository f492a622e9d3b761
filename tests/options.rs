use pdf2png::RenderOptionsBuilder;

#[test]
fn builder_defaults_match_documented_values() {
    let options = RenderOptionsBuilder::default().build().unwrap();
    assert_eq!(options.dpi, 200);
    assert_eq!(options.thread_count, 1);
    assert!(options.output_dir.is_none());
    assert!(options.password.is_none());
}

#[test]
fn builder_accepts_overrides() {
    let options = RenderOptionsBuilder::default()
        .dpi(300_u32)
        .thread_count(8_usize)
        .output_dir(std::path::PathBuf::from("/tmp/pages"))
        .password("hunter2")
        .build()
        .unwrap();
    assert_eq!(options.dpi, 300);
    assert_eq!(options.thread_count, 8);
    assert_eq!(
        options.output_dir.as_deref(),
        Some(std::path::Path::new("/tmp/pages"))
    );
    assert_eq!(options.password.as_deref(), Some("hunter2"));
}
