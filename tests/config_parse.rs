use parliament_pipeline::{config::Config, segment::TargetScript};

#[test]
fn parse_example_config() {
    let raw = include_str!("../parliament-pipeline.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(cfg.processing.enable_ocr);
    assert_eq!(cfg.processing.ocr_languages, "eng+hin");
    assert_eq!(cfg.processing.max_pages, None);
    assert_eq!(cfg.translation.target_script, TargetScript::Devanagari);
    assert!(!cfg.paths.processed_dir.is_empty());
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: Config = toml::from_str("[processing]\nenable_ocr = false\nocr_dpi = 150\nocr_languages = \"eng\"\nmax_pages = 3\n")
        .expect("parse TOML");
    assert!(!cfg.processing.enable_ocr);
    assert_eq!(cfg.processing.page_cap(), Some(3));
    assert_eq!(cfg.translation.batch_size, 4);
    assert_eq!(cfg.translation.chunk_chars, 512);
    assert_eq!(cfg.ocr.fallback_languages, "eng");
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let cfg: Config = toml::from_str(
        "[translation]\nmodel = \"my-model\"\n\n[processing]\nmax_pages = 2\n\n[logging]\njson = true\n",
    )
    .expect("parse TOML");
    assert_eq!(cfg.translation.model, "my-model");
    assert_eq!(cfg.translation.device_preference, "mps");
    assert_eq!(cfg.translation.default_source_tag, "hin_Deva");
    assert_eq!(cfg.translation.target_script, TargetScript::Devanagari);
    assert_eq!(cfg.processing.page_cap(), Some(2));
    assert!(cfg.processing.enable_ocr);
    assert_eq!(cfg.processing.ocr_dpi, 300);
    assert!(cfg.logging.json);
    assert_eq!(cfg.logging.level, "info");
    assert_eq!(cfg.logging.retention_days, 7);
}

#[test]
fn render_scale_never_drops_below_one() {
    let mut cfg = Config::default();
    assert!((cfg.processing.render_scale() - 300.0 / 72.0).abs() < 1e-4);
    cfg.processing.ocr_dpi = 36;
    assert_eq!(cfg.processing.render_scale(), 1.0);
}

#[test]
fn zero_page_cap_means_unlimited() {
    let mut cfg = Config::default();
    cfg.processing.max_pages = Some(0);
    assert_eq!(cfg.processing.page_cap(), None);
}

#[test]
fn artifact_dirs_live_under_processed_dir() {
    let mut cfg = Config::default();
    cfg.paths.processed_dir = "out".into();
    assert_eq!(cfg.original_dir(), std::path::Path::new("out/original"));
    assert_eq!(cfg.english_dir(), std::path::Path::new("out/english"));
}

#[test]
fn empty_model_id_has_no_model_dir() {
    let mut cfg = Config::default();
    cfg.translation.model = "  ".into();
    assert!(cfg.translation.model_dir(&cfg.paths.models_dir).is_none());

    cfg.translation.model = "org/name".into();
    assert_eq!(
        cfg.translation.model_dir("models"),
        Some(std::path::PathBuf::from("models/org/name"))
    );
}
