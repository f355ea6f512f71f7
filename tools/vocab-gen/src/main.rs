use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use esc_audio::{decode_batch, format_top_results, rank_scores};
use esc_vocab::{
    load_vocab_json, read_artifact, DuplicatePolicy, GeneratorConfig, LabelPolicy, Params,
    Vocabulary,
};
use ndarray::{Array1, Array2};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generate the vocabulary header for the ESC inference app"
)]
struct Cli {
    /// YAML generator configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Repository root, overrides the configuration
    #[arg(long, global = true)]
    repo_root: Option<PathBuf>,
    /// Native source directory, overrides the configuration
    #[arg(long, global = true)]
    source_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the vocabulary header
    Write(InputArgs),
    /// Fail unless the header matches the vocabulary
    Check(InputArgs),
    /// List the labels compiled into the header
    Show {
        /// Header to read instead of the configured one
        #[arg(long)]
        artifact: Option<PathBuf>,
    },
    /// Print the best scoring labels for a prediction file
    Top {
        /// JSON array of scores, or an array of score rows for a batch
        #[arg(long)]
        predictions: PathBuf,
        /// Name shown for the sample
        #[arg(long, default_value = "sample")]
        sample: String,
        #[arg(short, long, default_value_t = 5)]
        k: usize,
        /// Header to read the labels from instead of the configured one
        #[arg(long)]
        artifact: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
#[group(multiple = false)]
struct VocabSource {
    /// JSON file holding an array of labels
    #[arg(long)]
    vocab: Option<PathBuf>,
    /// JSON params file holding the labels under `--key` (default: train/params.json)
    #[arg(long)]
    params: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InputArgs {
    #[command(flatten)]
    source: VocabSource,
    /// Params entry holding the labels
    #[arg(long, default_value = "vocab")]
    key: String,
    /// Accept repeated labels
    #[arg(long)]
    allow_duplicates: bool,
    /// Fail on labels that need escaping instead of escaping them
    #[arg(long)]
    reject_quotes: bool,
    /// Use an #ifndef guard with this name instead of #pragma once
    #[arg(long, value_name = "NAME")]
    macro_guard: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Predictions {
    Single(Vec<f32>),
    Batch(Vec<Vec<f32>>),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    run(cli, &mut stdout.lock())
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let mut config = resolve_config(&cli)?;
    match cli.command {
        Command::Write(input) => {
            input.apply(&mut config);
            let vocab = load_vocab(&input, &config)?;
            let report = config.writer().write(&vocab)?;
            writeln!(
                out,
                "Wrote {} labels to {}",
                report.entries,
                report.path.display()
            )?;
        }
        Command::Check(input) => {
            input.apply(&mut config);
            let vocab = load_vocab(&input, &config)?;
            let writer = config.writer();
            if !writer.is_current(&vocab)? {
                bail!(
                    "{} is out of date with the vocabulary ({} labels); run `vocab-gen write`",
                    writer.target().display(),
                    vocab.len()
                );
            }
            writeln!(out, "{} is up to date", writer.target().display())?;
        }
        Command::Show { artifact } => {
            let path = artifact.unwrap_or_else(|| config.artifact_path());
            let vocab = read_vocab(&path)?;
            for (index, label) in vocab.iter().enumerate() {
                writeln!(out, "{index}\t{label}")?;
            }
        }
        Command::Top {
            predictions,
            sample,
            k,
            artifact,
        } => {
            let path = artifact.unwrap_or_else(|| config.artifact_path());
            let vocab = read_vocab(&path)?;
            let text = fs::read_to_string(&predictions)
                .with_context(|| format!("read predictions {}", predictions.display()))?;
            let parsed: Predictions = serde_json::from_str(&text)
                .with_context(|| format!("parse predictions {}", predictions.display()))?;
            match parsed {
                Predictions::Single(scores) => {
                    let ranked = rank_scores(Array1::from(scores).view(), &vocab, Some(k))?;
                    write!(out, "{}", format_top_results(&sample, &ranked))?;
                }
                Predictions::Batch(rows) => {
                    let outputs = to_matrix(rows)?;
                    writeln!(out, "Output: [sample #] (prediction, score)")?;
                    for (i, decoded) in decode_batch(outputs.view(), &vocab)?.iter().enumerate() {
                        writeln!(
                            out,
                            "  [#{}] ('{}', {:.2})",
                            i + 1,
                            decoded.label,
                            decoded.score
                        )?;
                    }
                }
            }
        }
    }
    Ok(())
}

impl InputArgs {
    fn apply(&self, config: &mut GeneratorConfig) {
        if self.allow_duplicates {
            config.duplicates = DuplicatePolicy::Allow;
        }
        if self.reject_quotes {
            config.labels = LabelPolicy::Reject;
        }
        if let Some(name) = &self.macro_guard {
            config.guard_macro = Some(name.clone());
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(root) = &cli.repo_root {
        config.repo_root = root.clone();
    }
    if let Some(dir) = &cli.source_dir {
        config.cpp_source_dir = dir.clone();
    }
    Ok(config)
}

fn load_vocab(input: &InputArgs, config: &GeneratorConfig) -> Result<Vocabulary> {
    let vocab = match (&input.source.vocab, &input.source.params) {
        (Some(path), _) => load_vocab_json(path)?,
        (None, Some(path)) => Params::load(path)?.vocab(&input.key)?,
        (None, None) => Params::load(&config.layout().params_file())?.vocab(&input.key)?,
    };
    info!(labels = vocab.len(), "loaded vocabulary");
    Ok(vocab)
}

fn read_vocab(path: &Path) -> Result<Vocabulary> {
    read_artifact(path).with_context(|| format!("read vocabulary header {}", path.display()))
}

fn to_matrix(rows: Vec<Vec<f32>>) -> Result<Array2<f32>> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    if let Some(i) = rows.iter().position(|r| r.len() != width) {
        bail!("prediction row {i} has {} scores, expected {width}", rows[i].len());
    }
    let height = rows.len();
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Ok(Array2::from_shape_vec((height, width), flat)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("vocab-gen").chain(args.iter().copied())).unwrap()
    }

    fn run_to_string(args: &[&str]) -> Result<String> {
        let mut out = Vec::new();
        run(cli(args), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("inference-cpp/src")).unwrap();
        fs::create_dir_all(dir.path().join("train")).unwrap();
        fs::write(
            dir.path().join("train/params.json"),
            r#"{"lr": 0.01, "vocab": ["dog", "rooster", "rain"]}"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn vocab_and_params_are_exclusive() {
        let result = Cli::try_parse_from([
            "vocab-gen",
            "write",
            "--vocab",
            "a.json",
            "--params",
            "b.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn write_check_show_round_trip() {
        let dir = repo();
        let root = dir.path().to_str().unwrap();

        let written = run_to_string(&["--repo-root", root, "write"]).unwrap();
        assert!(written.starts_with("Wrote 3 labels to "));

        let checked = run_to_string(&["--repo-root", root, "check"]).unwrap();
        assert!(checked.ends_with("is up to date\n"));

        let shown = run_to_string(&["--repo-root", root, "show"]).unwrap();
        assert_eq!(shown, "0\tdog\n1\trooster\n2\train\n");
    }

    #[test]
    fn check_fails_after_vocab_changes() {
        let dir = repo();
        let root = dir.path().to_str().unwrap();
        run_to_string(&["--repo-root", root, "write"]).unwrap();

        let other = dir.path().join("vocab.json");
        fs::write(&other, r#"["rooster", "dog", "rain"]"#).unwrap();
        let err = run_to_string(&[
            "--repo-root",
            root,
            "check",
            "--vocab",
            other.to_str().unwrap(),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("out of date"));
    }

    #[test]
    fn write_flags_allow_duplicates_and_set_guard() {
        let dir = repo();
        let root = dir.path().to_str().unwrap();
        let vocab = dir.path().join("vocab.json");
        fs::write(&vocab, r#"["dog", "dog"]"#).unwrap();
        let vocab = vocab.to_str().unwrap();

        assert!(run_to_string(&["--repo-root", root, "write", "--vocab", vocab]).is_err());
        run_to_string(&[
            "--repo-root",
            root,
            "write",
            "--vocab",
            vocab,
            "--allow-duplicates",
            "--macro-guard",
            "ESC_VOCAB_GEN_H",
        ])
        .unwrap();
        let header = fs::read_to_string(dir.path().join("inference-cpp/src/vocab-gen.h")).unwrap();
        assert!(header.contains("#ifndef ESC_VOCAB_GEN_H"));
    }

    #[test]
    fn config_file_is_applied_and_flags_win() {
        let dir = repo();
        let root = dir.path().to_str().unwrap();
        let config = dir.path().join("vocab-gen.yaml");
        fs::write(
            &config,
            "repo_root: /does/not/exist\n\
             cpp_source_dir: elsewhere\n\
             labels: reject\n\
             guard_macro: ESC_FROM_CONFIG\n",
        )
        .unwrap();
        let config = config.to_str().unwrap();

        let written = run_to_string(&[
            "--config",
            config,
            "--repo-root",
            root,
            "--source-dir",
            "inference-cpp",
            "write",
        ])
        .unwrap();
        assert!(written.contains("inference-cpp"));
        let header = fs::read_to_string(dir.path().join("inference-cpp/src/vocab-gen.h")).unwrap();
        assert!(header.contains("#ifndef ESC_FROM_CONFIG"));
        assert!(!header.contains("#pragma once"));
        assert!(!dir.path().join("elsewhere").exists());

        let quoted = dir.path().join("quoted.json");
        fs::write(&quoted, r#"["say \"hi\""]"#).unwrap();
        let err = run_to_string(&[
            "--config",
            config,
            "--repo-root",
            root,
            "--source-dir",
            "inference-cpp",
            "write",
            "--vocab",
            quoted.to_str().unwrap(),
        ])
        .unwrap_err();
        assert!(err.downcast_ref::<esc_vocab::VocabError>().is_some());

        // the rejected write leaves the previous header in place
        let after = fs::read_to_string(dir.path().join("inference-cpp/src/vocab-gen.h")).unwrap();
        assert_eq!(after, header);
    }

    #[test]
    fn top_reports_single_and_batch() {
        let dir = repo();
        let root = dir.path().to_str().unwrap();
        run_to_string(&["--repo-root", root, "write"]).unwrap();

        let single = dir.path().join("single.json");
        fs::write(&single, "[0.2, 0.7, 0.1]").unwrap();
        let report = run_to_string(&[
            "--repo-root",
            root,
            "top",
            "--predictions",
            single.to_str().unwrap(),
            "--sample",
            "rooster_3",
            "-k",
            "2",
        ])
        .unwrap();
        assert_eq!(
            report,
            "Top 2 results for sample 'rooster_3':\n    [#1] rooster (0.70)\n    [#2] dog (0.20)\n"
        );

        let batch = dir.path().join("batch.json");
        fs::write(&batch, "[[0.1, 0.1, 0.8], [0.5, 0.3, 0.2]]").unwrap();
        let report = run_to_string(&[
            "--repo-root",
            root,
            "top",
            "--predictions",
            batch.to_str().unwrap(),
        ])
        .unwrap();
        assert!(report.contains("[#1] ('rain', 0.80)"));
        assert!(report.contains("[#2] ('dog', 0.50)"));
    }

    #[test]
    fn ragged_batches_are_rejected() {
        let err = to_matrix(vec![vec![0.1, 0.2], vec![0.3]]).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }
}
