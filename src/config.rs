//! CLI arguments layered over an optional config file.
//!
//! Flags win over file values; the file (YAML or JSON) fills whatever
//! the command line leaves unset. Validation failures are the
//! configuration errors of the pipeline's failure taxonomy.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::error::{Result, RollupError};

const DEFAULT_NAME: &str = "Unknown";
const DEFAULT_BIB_REF: &str = "Unknown reference";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Html,
    Json,
    Turtle,
    Ntriples,
}

#[derive(Debug, Parser)]
#[command(
    name = "earl-rollup",
    version,
    about = "Aggregates EARL conformance-test assertions into a consolidated rollup report"
)]
pub struct CliArgs {
    /// Assertion sources: Turtle files or URLs. With --json, the first
    /// source is a previously generated report document instead.
    #[arg(required = true)]
    pub sources: Vec<String>,

    /// Config file (YAML or JSON) supplying defaults for other options.
    #[arg(long, env = "EARL_ROLLUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Test manifest, repeatable. Required unless --json is given.
    #[arg(short, long = "manifest")]
    pub manifests: Vec<String>,

    /// Base IRI for parsing relative references in local files.
    #[arg(short, long, env = "EARL_ROLLUP_BASE")]
    pub base: Option<String>,

    /// Report name.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Bibliographic citation for the report header.
    #[arg(long = "bibref")]
    pub bib_ref: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output file; stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// HTML template overriding the built-in one.
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// File containing a custom test-discovery query.
    #[arg(long)]
    pub query: Option<PathBuf>,

    /// Treat the first source as a previously generated report document.
    #[arg(long)]
    pub json: bool,

    /// Turn accumulated warnings into an error once processing finishes.
    #[arg(long)]
    pub strict: bool,
}

/// File-level counterpart of the flags; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    #[serde(default)]
    manifests: Vec<String>,
    base: Option<String>,
    name: Option<String>,
    #[serde(rename = "bibref")]
    bib_ref: Option<String>,
    format: Option<OutputFormat>,
    output: Option<PathBuf>,
    template: Option<PathBuf>,
    query: Option<PathBuf>,
    #[serde(default)]
    strict: Option<bool>,
}

#[derive(Debug)]
pub struct RollupConfig {
    pub sources: Vec<String>,
    pub manifests: Vec<String>,
    pub base: Option<String>,
    pub name: String,
    pub bib_ref: String,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    /// Template text, already read from disk.
    pub template: Option<String>,
    /// Discovery query text replacing the built-in one.
    pub query: Option<String>,
    pub json_input: bool,
    pub strict: bool,
}

impl RollupConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| {
                    RollupError::config(format!("cannot read config {}: {e}", path.display()))
                })?;
                serde_yaml::from_str::<PartialConfig>(&text).map_err(|e| {
                    RollupError::config(format!("cannot parse config {}: {e}", path.display()))
                })?
            }
            None => PartialConfig::default(),
        };

        let manifests = if args.manifests.is_empty() {
            file.manifests
        } else {
            args.manifests
        };
        if manifests.is_empty() && !args.json {
            return Err(RollupError::config(
                "at least one manifest is required (use --manifest, or --json for a \
                 previously generated report)",
            ));
        }
        if args.sources.is_empty() {
            return Err(RollupError::config("at least one input source is required"));
        }

        let template = match args.template.or(file.template) {
            Some(path) => Some(fs::read_to_string(&path).map_err(|e| {
                RollupError::config(format!("cannot read template {}: {e}", path.display()))
            })?),
            None => None,
        };
        let query = match args.query.or(file.query) {
            Some(path) => Some(fs::read_to_string(&path).map_err(|e| {
                RollupError::config(format!("cannot read query {}: {e}", path.display()))
            })?),
            None => None,
        };

        Ok(RollupConfig {
            sources: args.sources,
            manifests,
            base: args.base.or(file.base),
            name: args
                .name
                .or(file.name)
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            bib_ref: args
                .bib_ref
                .or(file.bib_ref)
                .unwrap_or_else(|| DEFAULT_BIB_REF.to_string()),
            format: args.format.or(file.format).unwrap_or(OutputFormat::Html),
            output: args.output.or(file.output),
            template,
            query,
            json_input: args.json,
            strict: args.strict || file.strict.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("earl-rollup").chain(argv.iter().copied()))
            .expect("argv should parse")
    }

    #[test]
    fn flags_alone_build_a_config() {
        let config = RollupConfig::from_args(args(&[
            "--manifest",
            "manifest.ttl",
            "--name",
            "Results",
            "--strict",
            "a.ttl",
            "b.ttl",
        ]))
        .unwrap();

        assert_eq!(config.manifests, vec!["manifest.ttl"]);
        assert_eq!(config.sources, vec!["a.ttl", "b.ttl"]);
        assert_eq!(config.name, "Results");
        assert_eq!(config.bib_ref, DEFAULT_BIB_REF);
        assert_eq!(config.format, OutputFormat::Html);
        assert!(config.strict);
    }

    #[test]
    fn missing_manifest_is_a_configuration_error() {
        let err = RollupConfig::from_args(args(&["a.ttl"])).unwrap_err();
        assert_matches!(err, RollupError::Configuration(_));
    }

    #[test]
    fn json_input_waives_the_manifest_requirement() {
        let config = RollupConfig::from_args(args(&["--json", "report.jsonld"])).unwrap();
        assert!(config.json_input);
        assert!(config.manifests.is_empty());
    }

    #[test]
    fn file_fills_gaps_and_flags_win() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "manifests: [from-file.ttl]\nname: File Name\nbibref: File Ref\nformat: turtle"
        )
        .unwrap();

        let config = RollupConfig::from_args(args(&[
            "--config",
            file.path().to_str().unwrap(),
            "--name",
            "Flag Name",
            "a.ttl",
        ]))
        .unwrap();

        assert_eq!(config.manifests, vec!["from-file.ttl"]);
        assert_eq!(config.name, "Flag Name");
        assert_eq!(config.bib_ref, "File Ref");
        assert_eq!(config.format, OutputFormat::Turtle);
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "manifests: [m.ttl]\nbogus: true").unwrap();

        let err = RollupConfig::from_args(args(&[
            "--config",
            file.path().to_str().unwrap(),
            "a.ttl",
        ]))
        .unwrap_err();
        assert_matches!(err, RollupError::Configuration(_));
    }
}
