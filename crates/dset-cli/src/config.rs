//! Compile settings from a config file, the command line and the environment

use anyhow::{Context, Result};
use dset_schema::SearchRoot;
use serde::Deserialize;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding extra search roots, lowest priority
pub const INCLUDE_ENV: &str = "DSET_INCLUDE";

/// Contents of a `--config` file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileConfig {
    /// Search roots in `DISK` or `VIRTUAL=DISK` form
    #[serde(default)]
    pub include_paths: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub force: bool,
}

impl CompileConfig {
    /// Load a YAML config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Values given on the command line
#[derive(Debug, Default)]
pub struct CompileArgs {
    pub include_paths: Vec<String>,
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub force: bool,
}

/// Everything `dset compile` needs, merged
#[derive(Debug)]
pub struct CompileSettings {
    pub search_roots: Vec<SearchRoot>,
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub force: bool,
}

impl CompileSettings {
    /// Merge config file, command line and environment.
    ///
    /// Config values come first, command-line values are appended after
    /// them, and roots from the environment come last. The command-line
    /// output wins over the config output.
    pub fn merge(
        config: CompileConfig,
        args: CompileArgs,
        env_include: Option<&OsStr>,
    ) -> Result<Self> {
        let mut search_roots = Vec::new();
        for spec in config.include_paths.iter().chain(&args.include_paths) {
            let root = spec
                .parse::<SearchRoot>()
                .with_context(|| format!("Invalid include path '{spec}'"))?;
            search_roots.push(root);
        }
        if let Some(paths) = env_include {
            for path in std::env::split_paths(paths) {
                if !path.as_os_str().is_empty() {
                    debug!("Adding search root {:?} from {}", path, INCLUDE_ENV);
                    search_roots.push(SearchRoot::new(path));
                }
            }
        }

        let mut inputs = config.inputs;
        inputs.extend(args.inputs);
        if inputs.is_empty() {
            anyhow::bail!("No input files given");
        }

        let output = args
            .output
            .or(config.output)
            .context("No output file given; pass -o/--output or set output in the config file")?;

        Ok(Self {
            search_roots,
            inputs,
            output,
            force: args.force || config.force,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(include: &[&str], inputs: &[&str], output: Option<&str>) -> CompileArgs {
        CompileArgs {
            include_paths: include.iter().map(ToString::to_string).collect(),
            inputs: inputs.iter().map(PathBuf::from).collect(),
            output: output.map(PathBuf::from),
            force: false,
        }
    }

    #[test]
    fn test_parse_config() {
        let config = CompileConfig::from_yaml(
            "include_paths: [schemas, vendor=third_party]\ninputs: [schemas/a.yaml]\noutput: out.bin\nforce: true\n",
        )
        .unwrap();
        assert_eq!(config.include_paths, vec!["schemas", "vendor=third_party"]);
        assert_eq!(config.output, Some(PathBuf::from("out.bin")));
        assert!(config.force);
    }

    #[test]
    fn test_unknown_config_key_is_rejected() {
        assert!(CompileConfig::from_yaml("include: [x]\n").is_err());
    }

    #[test]
    fn test_merge_orders_roots_and_inputs() {
        let config = CompileConfig {
            include_paths: vec!["from_config".to_string()],
            inputs: vec![PathBuf::from("first.yaml")],
            output: Some(PathBuf::from("config.bin")),
            force: false,
        };
        let env = std::env::join_paths(["env_a", "env_b"]).unwrap();
        let merged = CompileSettings::merge(
            config,
            args(&["vendor=from_cli"], &["second.yaml"], Some("cli.bin")),
            Some(env.as_os_str()),
        )
        .unwrap();

        let roots: Vec<(&str, &Path)> = merged
            .search_roots
            .iter()
            .map(|r| (r.virtual_prefix(), r.disk_path()))
            .collect();
        assert_eq!(
            roots,
            vec![
                ("", Path::new("from_config")),
                ("vendor", Path::new("from_cli")),
                ("", Path::new("env_a")),
                ("", Path::new("env_b")),
            ]
        );
        assert_eq!(merged.inputs, vec![PathBuf::from("first.yaml"), PathBuf::from("second.yaml")]);
        assert_eq!(merged.output, PathBuf::from("cli.bin"));
    }

    #[test]
    fn test_merge_requires_inputs_and_output() {
        let err = CompileSettings::merge(CompileConfig::default(), args(&[], &[], Some("o")), None)
            .unwrap_err();
        assert!(err.to_string().contains("No input files"));

        let err = CompileSettings::merge(CompileConfig::default(), args(&[], &["a.yaml"], None), None)
            .unwrap_err();
        assert!(err.to_string().contains("No output file"));
    }

    #[test]
    fn test_empty_env_entries_are_skipped() {
        let env = OsString::from("");
        let merged = CompileSettings::merge(
            CompileConfig::default(),
            args(&["."], &["a.yaml"], Some("o")),
            Some(env.as_os_str()),
        )
        .unwrap();
        assert_eq!(merged.search_roots.len(), 1);
    }

    #[test]
    fn test_bad_include_path_is_reported() {
        let err = CompileSettings::merge(
            CompileConfig::default(),
            args(&["vendor="], &["a.yaml"], Some("o")),
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("vendor="));
    }
}
