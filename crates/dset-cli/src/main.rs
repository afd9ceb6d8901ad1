#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # dset-cli
//!
//! Command-line front end for the schema descriptor-set compiler.
//!
//! `dset compile` maps the given schema files onto the search roots, pulls
//! in everything they import, and writes the result as one descriptor set.
//! `dset inspect` lists what a descriptor set file contains.

mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::{CompileArgs, CompileConfig, CompileSettings, INCLUDE_ENV};
use dset_diagnostics::Diagnostics;
use dset_writer::{CompileRequest, compile};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dset")]
#[command(about = "Compile schema files into a self-contained descriptor set")]
#[command(version)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile schema files and everything they import
    Compile {
        /// Search root, as DIR or VIRTUAL=DIR; earlier roots take priority
        #[arg(short = 'I', long = "include", value_name = "DIR")]
        include: Vec<String>,

        /// Descriptor set file to write
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// YAML file with include_paths, inputs, output and force
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the output even if it is unchanged
        #[arg(long)]
        force: bool,

        /// Schema files to compile
        inputs: Vec<PathBuf>,
    },

    /// List the files in a descriptor set
    Inspect {
        /// Descriptor set file
        file: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            include,
            output,
            config,
            force,
            inputs,
        } => {
            let file_config = match config {
                Some(path) => CompileConfig::load(&path)?,
                None => CompileConfig::default(),
            };
            let args = CompileArgs {
                include_paths: include,
                inputs,
                output,
                force,
            };
            let env_include = std::env::var_os(INCLUDE_ENV);
            let settings = CompileSettings::merge(file_config, args, env_include.as_deref())?;
            run_compile(&settings)
        }
        Commands::Inspect { file } => {
            tracing::info!("Inspecting {}", file.display());
            let set = output::read_descriptor_set(&file)?;
            output::print_summary(&set, &mut io::stdout().lock())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_compile(settings: &CompileSettings) -> Result<ExitCode> {
    let request = CompileRequest::new(settings.search_roots.clone(), settings.inputs.clone());
    let mut bytes = Vec::new();
    let mut diagnostics = Diagnostics::stderr();

    let status = compile(&request, &mut bytes, &mut diagnostics);
    if !status.is_success() {
        tracing::info!("Compilation failed; {} left untouched", settings.output.display());
        return Ok(ExitCode::from(u8::try_from(status.code()).unwrap_or(1)));
    }

    output::write_if_changed(&settings.output, &bytes, settings.force)?;
    Ok(ExitCode::SUCCESS)
}
