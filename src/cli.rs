use crate::{
    config::Config,
    extract::{Extractor, PdfiumBackend, TesseractCli},
    logging,
    pipeline::Pipeline,
    translate::{Device, onnx},
    util::{collect_pdfs, is_pdf, now_rfc3339},
};
use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "parliament-pipeline")]
#[command(about = "Bilingual PDF transcript pipeline (OCR/native text + script-aware translation)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./parliament-pipeline.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report pdfium, tesseract and model availability.
    Doctor {},
    /// Print the per-page extraction of one PDF as JSON.
    Extract {
        #[arg(long)]
        input: PathBuf,
    },
    /// Write original and english JSON artifacts for PDFs or directories of PDFs.
    Process {
        #[arg(long)]
        input: Vec<PathBuf>,
    },
}

pub async fn dispatch(args: Args) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let _guard = logging::configure(&cfg, args.log_level.as_deref());

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg),
        Command::Extract { input } => extract(&cfg, input).await,
        Command::Process { input } => process(&cfg, input).await,
    }
}

fn load_config(user: Option<&Path>) -> Result<Config> {
    if let Some(p) = user {
        return Config::load(p);
    }
    let default = PathBuf::from("parliament-pipeline.toml");
    if default.exists() {
        Config::load(&default)
    } else {
        Ok(Config::default())
    }
}

fn doctor(cfg: &Config) -> Result<()> {
    let pdfium = match PdfiumBackend::new(cfg.pdfium.library_path.as_deref()).bind() {
        Ok(_) => serde_json::json!({"ok": true}),
        Err(e) => serde_json::json!({"ok": false, "error": e.to_string()}),
    };

    let tesseract = TesseractCli::new(&cfg.ocr.tesseract_exe, cfg.processing.ocr_dpi, 0);
    let tesseract = match (tesseract.version(), tesseract.list_languages()) {
        (Ok(version), Ok(languages)) => {
            let missing: Vec<&str> = cfg
                .processing
                .ocr_languages
                .split('+')
                .map(str::trim)
                .filter(|l| !languages.iter().any(|have| have == l))
                .collect();
            serde_json::json!({
                "ok": missing.is_empty(),
                "version": version,
                "languages": languages,
                "missing": missing,
            })
        }
        (Err(e), _) | (_, Err(e)) => serde_json::json!({"ok": false, "error": e.to_string()}),
    };

    let model = match cfg.translation.model_dir(&cfg.paths.models_dir) {
        Some(dir) => {
            let missing: Vec<PathBuf> = onnx::required_files(&dir)
                .into_iter()
                .filter(|p| !p.exists())
                .collect();
            serde_json::json!({
                "ok": missing.is_empty(),
                "dir": dir,
                "missing": missing,
            })
        }
        None => serde_json::json!({"ok": false, "error": "no translation model configured"}),
    };

    let devices: Vec<_> = [Device::Cuda, Device::CoreMl, Device::DirectMl, Device::Cpu]
        .into_iter()
        .filter(|d| d.is_available())
        .collect();

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "ocr_enabled": cfg.processing.enable_ocr,
            "pdfium": pdfium,
            "tesseract": tesseract,
            "model": model,
            "devices": devices,
            "selected_device": onnx::select_device(&cfg.translation.device_preference),
        }))?
    );
    Ok(())
}

async fn extract(cfg: &Config, input: &Path) -> Result<()> {
    validate_input(cfg, input)?;
    let extractor = Extractor::from_config(cfg);
    let path = input.to_path_buf();
    let extraction = tokio::task::spawn_blocking(move || extractor.extract(&path)).await?;
    println!("{}", serde_json::to_string_pretty(&extraction)?);
    Ok(())
}

async fn process(cfg: &Config, inputs: &[PathBuf]) -> Result<()> {
    let inputs = if inputs.is_empty() {
        vec![PathBuf::from(&cfg.paths.raw_dir)]
    } else {
        inputs.to_vec()
    };
    for input in &inputs {
        if !input.is_dir() {
            validate_input(cfg, input)?;
        }
    }

    let pdfs = collect_pdfs(&inputs)?;
    if pdfs.is_empty() {
        return Err(anyhow!("no PDFs found in {:?}", inputs));
    }

    let pipeline = Pipeline::new(cfg)?;
    let started = now_rfc3339();
    let results = pipeline.process_all(&pdfs).await;

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    let documents: Vec<_> = results
        .iter()
        .map(|(pdf, result)| match result {
            Ok(paths) => serde_json::json!({
                "source": pdf,
                "status": "ok",
                "original": paths.original,
                "english": paths.english,
            }),
            Err(err) => serde_json::json!({
                "source": pdf,
                "status": "error",
                "error": format!("{err:#}"),
            }),
        })
        .collect();

    info!(
        "processed {} documents ({failed} failed), translation {:?}",
        results.len(),
        pipeline.translator().status()
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "started": started,
            "finished": now_rfc3339(),
            "translation": pipeline.translator().status(),
            "documents": documents,
        }))?
    );

    if failed > 0 {
        return Err(anyhow!("{failed} of {} documents failed", results.len()));
    }
    Ok(())
}

pub fn validate_input(cfg: &Config, input: &Path) -> Result<()> {
    let input_str = input.display().to_string();

    if cfg.security.reject_url_inputs && looks_like_url(&input_str) {
        return Err(anyhow!("URL inputs are disabled: {input_str}"));
    }

    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }

    if input.extension().is_some() && !is_pdf(input) {
        return Err(anyhow!("input is not a PDF: {}", input.display()));
    } else if input.extension().is_none() {
        warn!("input has no extension; assuming PDF: {}", input.display());
    }

    Ok(())
}

fn looks_like_url(s: &str) -> bool {
    let s = s.to_ascii_lowercase();
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("file://")
}
