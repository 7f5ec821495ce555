//! Glbsplice CLI

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use glbsplice::config::Config;
use glbsplice::inspect::ContainerSummary;
use glbsplice::repair::Repair;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];

    let result = match command.as_str() {
        "repair" => repair(&args[2..]),
        "inspect" => {
            if args.len() < 3 {
                eprintln!("Usage: glbsplice inspect <file.glb>");
                process::exit(1);
            }
            inspect(Path::new(&args[2]))
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!("Run 'glbsplice' for usage information.");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!("Glbsplice v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("Usage: glbsplice <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  repair <current> <backup> [--output <path>] [--strict] [--no-atomic]");
    eprintln!("            Keep the JSON chunk of <current>, take the BIN chunk of <backup>");
    eprintln!("  repair --config <file.toml>");
    eprintln!("            Same, with paths and options read from a TOML file");
    eprintln!("  inspect <file>");
    eprintln!("            Print header fields and the chunk table");
    eprintln!();
    eprintln!("Set RUST_LOG=debug for chunk-level logging.");
}

fn repair(args: &[String]) -> anyhow::Result<()> {
    let config = parse_repair_args(args)?;
    config.validate()?;

    let report = Repair::from_config(&config)
        .run()
        .with_context(|| format!("Failed to repair {}", config.current.display()))?;

    println!("Rebuilt {}", report.output.display());
    println!("  JSON chunk: {} bytes (from current)", report.json_len);
    println!("  BIN chunk:  {} bytes (from backup)", report.bin_len);
    println!("  Total:      {} bytes", report.total_len);
    println!("  BIN sha256: {}", report.bin_sha256);

    Ok(())
}

fn parse_repair_args(args: &[String]) -> anyhow::Result<Config> {
    let mut positional: Vec<&str> = Vec::new();
    let mut config_path = None;
    let mut output = None;
    let mut strict = false;
    let mut atomic = true;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config_path = Some(iter.next().context("--config needs a path")?),
            "--output" | "-o" => output = Some(iter.next().context("--output needs a path")?),
            "--strict" => strict = true,
            "--no-atomic" => atomic = false,
            flag if flag.starts_with('-') => bail!("Unknown option: {flag}"),
            other => positional.push(other),
        }
    }

    if let Some(path) = config_path {
        if !positional.is_empty() || output.is_some() {
            bail!("--config cannot be combined with paths on the command line");
        }
        let mut config = Config::from_file(Path::new(path))?;
        config.read.strict |= strict;
        config.write.atomic &= atomic;
        return Ok(config);
    }

    let [current, backup] = positional[..] else {
        bail!("Usage: glbsplice repair <current> <backup> [--output <path>]");
    };

    let mut config = Config::new(current, backup);
    config.output = output.map(PathBuf::from);
    config.read.strict = strict;
    config.write.atomic = atomic;
    Ok(config)
}

fn inspect(path: &Path) -> anyhow::Result<()> {
    let summary = ContainerSummary::open(path)
        .with_context(|| format!("Failed to inspect {}", path.display()))?;

    println!("{}", path.display());
    print!("{summary}");

    if summary.bin_count() > 1 {
        println!();
        println!("Note: only the first BIN chunk is used when repairing.");
    }

    Ok(())
}
