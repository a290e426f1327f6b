use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;

use attendance_core::attendance::take_attendance_use_case::{
    AttendanceReport, TakeAttendanceUseCase,
};
use attendance_core::enrollment::reference_cache::ReferenceEmbeddingCache;
use attendance_core::extraction::domain::embedding_extractor::EmbeddingExtractor;
use attendance_core::extraction::infrastructure::directory_reference_source::DirectoryReferenceSource;
use attendance_core::extraction::infrastructure::json_embedding_extractor::JsonEmbeddingExtractor;
use attendance_core::extraction::infrastructure::model_resolver;
use attendance_core::extraction::infrastructure::onnx_arcface_extractor::OnnxArcFaceExtractor;
use attendance_core::shared::config::AttendanceConfig;
use attendance_core::shared::constants::{
    ARCFACE_MODEL_NAME, ARCFACE_MODEL_URL, EMBEDDING_EXTENSIONS, IMAGE_EXTENSIONS,
};
use attendance_core::shared::roll_id::{parse_roster, RollId};

/// Take classroom attendance by matching detected faces to enrolled students.
#[derive(Parser, Debug)]
#[command(name = "attendance")]
struct Cli {
    /// Enrolled roll IDs as a JSON array or comma-separated list; `@path` reads them from a file.
    #[arg(long)]
    roster: String,

    /// JSON file with the faces detected in the classroom image.
    #[arg(long)]
    faces: PathBuf,

    /// Directory with one folder of reference files per roll ID.
    #[arg(long)]
    references: PathBuf,

    /// ArcFace ONNX model. When set, reference folders hold face images
    /// instead of pre-extracted embedding JSON.
    #[arg(long, conflicts_with = "download_model")]
    model: Option<PathBuf>,

    /// Use the ArcFace model from the user cache, downloading it if missing.
    #[arg(long)]
    download_model: bool,

    /// JSON config file; flags and environment variables override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cosine similarity needed to mark a student present (-1.0 to 1.0).
    #[arg(long, env = "SIMILARITY_THRESHOLD")]
    threshold: Option<f64>,

    /// Minimum detector confidence for a classroom face to be scored.
    #[arg(long, env = "DET_CONF_THRESHOLD")]
    det_confidence: Option<f64>,

    /// Embedding dimensionality of the recognition model.
    #[arg(long, env = "EMBEDDING_DIM")]
    embedding_dim: Option<usize>,

    /// Abort a reference extraction after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Label echoed in the output.
    #[arg(long)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct Output<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    #[serde(flatten)]
    report: &'a AttendanceReport,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let roster = read_roster(&cli.roster)?;
    if roster.is_empty() {
        log::warn!("Roster is empty");
    }

    let (reference_extractor, extensions) = build_reference_extractor(&cli)?;
    let cache = Arc::new(ReferenceEmbeddingCache::from_config(
        reference_extractor,
        &config,
    ));
    let source = Arc::new(DirectoryReferenceSource::new(&cli.references, extensions));
    let use_case = TakeAttendanceUseCase::new(
        Arc::new(JsonEmbeddingExtractor::new()),
        source,
        cache,
        &config,
    )?;

    let classroom = fs::read(&cli.faces)
        .map_err(|e| format!("cannot read {}: {e}", cli.faces.display()))?;
    let report = use_case.execute(&classroom, &roster)?;

    let output = Output {
        session_id: cli.session_id.as_deref(),
        report: &report,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Defaults, then the config file, then environment and flags.
fn load_config(cli: &Cli) -> Result<AttendanceConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => AttendanceConfig::load(path)?,
        None => AttendanceConfig::default(),
    };
    if let Some(t) = cli.threshold {
        config.similarity_threshold = t;
    }
    if let Some(c) = cli.det_confidence {
        config.detection_confidence_threshold = c;
    }
    if let Some(d) = cli.embedding_dim {
        config.embedding_dim = d;
    }
    if cli.timeout_ms.is_some() {
        config.extraction_timeout_ms = cli.timeout_ms;
    }
    config.validate()?;
    Ok(config)
}

fn read_roster(arg: &str) -> Result<Vec<RollId>, Box<dyn std::error::Error>> {
    match arg.strip_prefix('@') {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .map_err(|e| format!("cannot read roster {path}: {e}"))?;
            Ok(parse_roster(&contents))
        }
        None => Ok(parse_roster(arg)),
    }
}

type ReferenceExtractor = (Arc<dyn EmbeddingExtractor>, &'static [&'static str]);

fn build_reference_extractor(
    cli: &Cli,
) -> Result<ReferenceExtractor, Box<dyn std::error::Error>> {
    let model = match (&cli.model, cli.download_model) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(model_resolver::resolve(ARCFACE_MODEL_NAME, ARCFACE_MODEL_URL)?),
        (None, false) => None,
    };
    match model {
        Some(path) => Ok((load_model(&path)?, IMAGE_EXTENSIONS)),
        None => Ok((Arc::new(JsonEmbeddingExtractor::new()), EMBEDDING_EXTENSIONS)),
    }
}

fn load_model(path: &Path) -> Result<Arc<dyn EmbeddingExtractor>, Box<dyn std::error::Error>> {
    log::info!("Loading recognition model {}", path.display());
    Ok(Arc::new(OnnxArcFaceExtractor::new(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli(extra: &[&str]) -> Cli {
        let mut args = vec![
            "attendance",
            "--roster",
            "a,b",
            "--faces",
            "faces.json",
            "--references",
            "refs",
        ];
        args.extend_from_slice(extra);
        Cli::parse_from(args)
    }

    #[test]
    fn test_flags_override_config_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(
            &path,
            r#"{"similarity_threshold": 0.4, "detection_confidence_threshold": 0.3}"#,
        )
        .unwrap();

        let config = load_config(&cli(&[
            "--config",
            path.to_str().unwrap(),
            "--threshold",
            "0.6",
            "--timeout-ms",
            "100",
        ]))
        .unwrap();

        assert_eq!(config.similarity_threshold, 0.6);
        assert_eq!(config.detection_confidence_threshold, 0.3);
        assert_eq!(config.extraction_timeout_ms, Some(100));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        assert!(load_config(&cli(&["--threshold", "1.5"])).is_err());
    }

    #[test]
    fn test_read_roster_inline_and_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("roster.json");
        fs::write(&path, r#"["S2", "s1"]"#).unwrap();

        let inline = read_roster("s1, s2").unwrap();
        let from_file = read_roster(&format!("@{}", path.display())).unwrap();

        assert_eq!(inline.len(), 2);
        assert_eq!(from_file[0].as_str(), "s2");
        assert_eq!(from_file[1].as_str(), "s1");
    }

    #[test]
    fn test_json_references_without_model() {
        let (_, extensions) = build_reference_extractor(&cli(&[])).unwrap();
        assert_eq!(extensions, EMBEDDING_EXTENSIONS);
    }

    #[test]
    fn test_end_to_end_with_json_embeddings() {
        let tmp = TempDir::new().unwrap();
        let refs = tmp.path().join("refs");
        fs::create_dir_all(refs.join("bt23eci024_pragyan")).unwrap();
        fs::create_dir_all(refs.join("bt23eci044_kaushik")).unwrap();
        fs::write(refs.join("bt23eci024_pragyan/front.json"), "[0.72, 0.694]").unwrap();
        fs::write(refs.join("bt23eci044_kaushik/front.json"), "[0.18, 0.984]").unwrap();
        let faces = tmp.path().join("faces.json");
        fs::write(&faces, r#"[{"embedding": [1.0, 0.0], "confidence": 0.9}]"#).unwrap();

        let config = AttendanceConfig {
            similarity_threshold: 0.5,
            embedding_dim: 2,
            ..Default::default()
        };
        let cache = Arc::new(ReferenceEmbeddingCache::from_config(
            Arc::new(JsonEmbeddingExtractor::new()),
            &config,
        ));
        let use_case = TakeAttendanceUseCase::new(
            Arc::new(JsonEmbeddingExtractor::new()),
            Arc::new(DirectoryReferenceSource::new(&refs, EMBEDDING_EXTENSIONS)),
            cache,
            &config,
        )
        .unwrap();

        let roster = read_roster("bt23eci024_pragyan,bt23eci044_kaushik").unwrap();
        let report = use_case.execute(&fs::read(&faces).unwrap(), &roster).unwrap();
        let output = serde_json::to_value(Output {
            session_id: Some("s-1"),
            report: &report,
        })
        .unwrap();

        assert_eq!(output["session_id"], "s-1");
        assert_eq!(output["present_count"], 1);
        assert_eq!(output["attendance"][0]["status"], "present");
        assert_eq!(output["attendance"][1]["status"], "absent");
    }
}
