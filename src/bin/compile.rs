//! Schema Compiler CLI
//!
//! Compiles a niflotoxml description and reports or exports the registry.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use nifxml_schema::config::OutputFormat;
use nifxml_schema::{SchemaCompiler, SchemaConfig, SchemaOrigin, SchemaRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nifxml-compile")]
#[command(about = "Compile and inspect niflotoxml format descriptions")]
struct Cli {
    /// Configuration file (defaults to nifxml.toml lookup)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Reject field-group and ancestor cycles of any length
    #[arg(long, global = true)]
    strict_cycles: bool,

    /// Fail instead of using the bundled description
    #[arg(long, global = true)]
    no_fallback: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a description and print a summary
    Check {
        /// Description to compile (defaults to the configured source)
        schema: Option<PathBuf>,
    },

    /// Compile a description and write the registry as JSON
    Dump {
        schema: Option<PathBuf>,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the entry registered under an id
    Show {
        /// Entry id (primitive type, compound, ancestor or niblock)
        id: String,
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Write the default configuration to a file
    InitConfig {
        #[arg(default_value = "nifxml.toml")]
        path: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = SchemaConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if cli.strict_cycles {
        config.validation.strict_cycles = true;
    }
    if cli.no_fallback {
        config.source.fallback_to_bundled = false;
    }
    let compiler = SchemaCompiler::from_config(&config);

    match cli.command {
        Commands::Check { schema } => {
            let (registry, origin) = compile(&compiler, &config, schema)?;
            let stats = registry.stats();
            println!("✅ {} compiled", describe(&origin));
            println!("  primitive types:     {}", stats.primitive_types);
            println!("  compounds:           {}", stats.field_groups);
            println!("  ancestors:           {}", stats.ancestors);
            println!("  niblocks:            {}", stats.record_types);
            println!("  fields:              {}", stats.fields);
            println!("  unconditional types: {}", stats.unconditional_types);
            Ok(())
        }

        Commands::Dump { schema, output } => {
            let (registry, _) = compile(&compiler, &config, schema)?;
            let json = match config.output.format {
                OutputFormat::Pretty => serde_json::to_string_pretty(&registry)?,
                OutputFormat::Compact => serde_json::to_string(&registry)?,
            };

            if let Some(path) = output {
                std::fs::write(&path, &json)?;
                println!("✅ Registry written to {:?}", path);
            } else {
                println!("{}", json);
            }
            Ok(())
        }

        Commands::Show { id, schema } => {
            let (registry, _) = compile(&compiler, &config, schema)?;
            let entry = lookup(&registry, &id).ok_or_else(|| anyhow!("no entry named {id}"))?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
            Ok(())
        }

        Commands::InitConfig { path } => {
            SchemaConfig::default().save(&path)?;
            println!("✅ Default configuration written to {}", path);
            Ok(())
        }
    }
}

fn compile(
    compiler: &SchemaCompiler,
    config: &SchemaConfig,
    schema: Option<PathBuf>,
) -> anyhow::Result<(SchemaRegistry, SchemaOrigin)> {
    match schema.or_else(|| config.source_path()) {
        Some(path) => compiler
            .compile_path_with_origin(&path)
            .with_context(|| format!("compiling {}", path.display())),
        None => Ok((compiler.compile_bundled()?, SchemaOrigin::Bundled)),
    }
}

fn describe(origin: &SchemaOrigin) -> String {
    match origin {
        SchemaOrigin::File(path) => path.display().to_string(),
        SchemaOrigin::Bundled => "bundled description".to_string(),
    }
}

fn lookup(registry: &SchemaRegistry, id: &str) -> Option<serde_json::Value> {
    let unconditional = registry.is_unconditional(id);
    let entry = if let Some(primitive) = registry.primitive_type(id) {
        serde_json::json!({ "primitive_type": primitive })
    } else if let Some(group) = registry.field_group(id) {
        serde_json::json!({ "compound": group })
    } else if let Some(ancestor) = registry.ancestor(id) {
        serde_json::json!({ "ancestor": ancestor })
    } else {
        serde_json::json!({ "niblock": registry.record_type(id)? })
    };
    Some(serde_json::json!({ "entry": entry, "unconditional": unconditional }))
}
