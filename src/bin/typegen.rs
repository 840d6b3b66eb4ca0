//! Type Generator CLI
//!
//! Compiles JSON Schema files into Rust declarations.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use familiar_typegen::{compile, header_lines, loader, Compilation, TypegenConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "typegen")]
#[command(about = "Compile JSON Schema documents into Rust types")]
struct Cli {
    /// Config file (merged over typegen.toml and the user config)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Rust source from schema files and directories
    Generate {
        /// Schema files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Base URI for documents without an `$id`
        #[arg(long)]
        base_uri: Option<String>,

        /// Discriminant property of tagged unions
        #[arg(long)]
        discriminant: Option<String>,

        /// Leave out the generated-file banner
        #[arg(long)]
        no_header: bool,
    },

    /// Compile without writing output and report what would be generated
    Check {
        /// Schema files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Base URI for documents without an `$id`
        #[arg(long)]
        base_uri: Option<String>,
    },

    /// Inspect or write configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the default configuration to a file
    Init {
        #[arg(default_value = "typegen.toml")]
        path: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `false` when compilation reported schema errors
fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = TypegenConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            inputs,
            out,
            base_uri,
            discriminant,
            no_header,
        } => {
            if base_uri.is_some() {
                config.compiler.base_uri = base_uri;
            }
            if let Some(discriminant) = discriminant {
                config.compiler.discriminant = discriminant;
            }

            let corpus = loader::load_paths(&inputs, &config.loader)?;
            let Some(compilation) = compile_or_report(&corpus, &config) else {
                return Ok(false);
            };

            let header = if no_header || !config.output.header {
                Vec::new()
            } else {
                header_lines(Some(&corpus.fingerprint))
            };
            let source = compilation.render(&config.render, &header);

            match out.or(config.output.path) {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&path, source)?;
                    eprintln!(
                        "Wrote {} declarations to {}",
                        compilation.declarations.len(),
                        path.display()
                    );
                }
                None => print!("{}", source),
            }
            Ok(true)
        }

        Commands::Check { inputs, base_uri } => {
            if base_uri.is_some() {
                config.compiler.base_uri = base_uri;
            }
            let corpus = loader::load_paths(&inputs, &config.loader)?;
            let Some(compilation) = compile_or_report(&corpus, &config) else {
                return Ok(false);
            };

            println!("Documents:    {}", corpus.len());
            println!("Declarations: {}", compilation.declarations.len());
            println!("Boxed members: {}", compilation.recursion.boxed_count());
            for group in compilation.recursion.groups() {
                println!("  cycle: {}", group.join(" -> "));
            }
            println!("Fingerprint:  sha256:{}", corpus.fingerprint);
            Ok(true)
        }

        Commands::Config { command } => {
            match command {
                ConfigCommands::Show => {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
                ConfigCommands::Init { path } => {
                    TypegenConfig::default().save(&path)?;
                    eprintln!("Wrote default configuration to {}", path);
                }
            }
            Ok(true)
        }
    }
}

fn compile_or_report(corpus: &loader::LoadedCorpus, config: &TypegenConfig) -> Option<Compilation> {
    match compile(&corpus.documents, &config.compiler) {
        Ok(compilation) => Some(compilation),
        Err(errors) => {
            eprintln!("{} error(s):", errors.len());
            eprintln!("{}", errors);
            None
        }
    }
}
