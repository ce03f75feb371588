use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;

use elvm_targets::desmos::DesmosConfig;
use elvm_targets::ir::text;
use elvm_targets::piet::PietConfig;

#[derive(Parser)]
#[command(name = "elvm-targets")]
#[command(about = "Compiles a register-machine IR program to a Desmos graph state or a Piet PPM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Desmos,
    Piet,
}

#[derive(Subcommand)]
enum Commands {
    Compile {
        #[arg(help = "Input IR text file (see elvm_targets::ir::text for the format)")]
        input: PathBuf,

        #[arg(short, long, help = "Output file (JSON for desmos, PPM for piet)")]
        output: PathBuf,

        #[arg(short, long, value_enum, help = "Target backend")]
        backend: Backend,

        #[arg(long, help = "Pc-chunk / memory-chunk size (desmos only)")]
        chunk_size: Option<usize>,

        #[arg(long, help = "Total addressable memory words")]
        mem_size: Option<usize>,

        #[arg(long, help = "Register width mask, e.g. 0x1000000 for 24 bits")]
        reg_mask: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            backend,
            chunk_size,
            mem_size,
            reg_mask,
        } => {
            let source = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let module = text::parse(&source).context("Failed to parse IR text")?;

            let reg_mask = reg_mask.map(|s| parse_mask(&s)).transpose()?;

            match backend {
                Backend::Desmos => {
                    let mut cfg = DesmosConfig::default();
                    if let Some(chunk_size) = chunk_size {
                        cfg = cfg.with_chunk_size(chunk_size);
                    }
                    if let Some(mem_size) = mem_size {
                        cfg = cfg.with_mem_size(mem_size);
                    }
                    if let Some(reg_mask) = reg_mask {
                        cfg = cfg.with_reg_mask(reg_mask);
                    }
                    let json = elvm_targets::desmos::compile(&module, &cfg)
                        .context("Desmos compilation failed")?;
                    fs::write(&output, json)
                        .with_context(|| format!("Failed to write output to {}", output.display()))?;
                }
                Backend::Piet => {
                    let mut cfg = PietConfig::default();
                    if let Some(mem_size) = mem_size {
                        cfg = cfg.with_mem_size(mem_size);
                    }
                    if let Some(reg_mask) = reg_mask {
                        cfg = cfg.with_reg_mask(reg_mask);
                    }
                    let ppm = elvm_targets::piet::compile(&module, &cfg)
                        .context("Piet compilation failed")?;
                    fs::write(&output, &ppm)
                        .with_context(|| format!("Failed to write output to {}", output.display()))?;
                }
            }

            println!("Compiled {} -> {}", input.display(), output.display());
        }
    }

    Ok(())
}

fn parse_mask(s: &str) -> Result<i64> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).with_context(|| format!("'{s}' is not a valid hex mask"))
    } else {
        s.parse::<i64>()
            .with_context(|| format!("'{s}' is not a valid integer mask"))
    }
}
