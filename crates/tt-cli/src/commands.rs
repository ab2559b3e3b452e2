use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use tracing::debug;
use tt_delta::{
    apply_delta, decode_delta, decode_signature, make_delta, make_signature, write_delta,
    write_signature,
};
use tt_store::{ChainedBlobStore, LooseObjectStore, StoreConfig};
use tt_types::ContentId;

use crate::cli::*;

const REPO_CONFIG_FILE: &str = "config.toml";

/// Global options shared by the repository commands.
struct Repo<'a> {
    root: &'a Path,
    config: Option<&'a Path>,
    format: OutputFormat,
}

impl Repo<'_> {
    fn config(&self) -> anyhow::Result<StoreConfig> {
        if let Some(path) = self.config {
            debug!(path = %path.display(), "loading explicit config");
            return StoreConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()));
        }
        let default_path = self.root.join(REPO_CONFIG_FILE);
        if default_path.is_file() {
            debug!(path = %default_path.display(), "loading repository config");
            return StoreConfig::load(&default_path)
                .with_context(|| format!("loading config {}", default_path.display()));
        }
        debug!("no config file, using defaults");
        Ok(StoreConfig::default())
    }

    fn open(&self) -> anyhow::Result<ChainedBlobStore> {
        let config = self.config()?;
        debug!(
            repo = %self.root.display(),
            min_delta_size = config.min_delta_size,
            max_chain_depth = config.max_chain_depth,
            "opening repository"
        );
        let backend = LooseObjectStore::open(self.root)
            .with_context(|| format!("opening repository {}", self.root.display()))?;
        Ok(ChainedBlobStore::new(Arc::new(backend), config)?)
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let repo = Repo {
        root: &cli.repo,
        config: cli.config.as_deref(),
        format: cli.format,
    };
    match cli.command {
        Command::Store(args) => cmd_store(&repo, args),
        Command::Cat(args) => cmd_cat(&repo, args),
        Command::Inspect(args) => cmd_inspect(&repo, args),
        Command::Signature(args) => cmd_signature(args),
        Command::Delta(args) => cmd_delta(args),
        Command::Patch(args) => cmd_patch(args),
        Command::Config => cmd_config(&repo),
    }
}

fn parse_id(text: &str) -> anyhow::Result<ContentId> {
    text.parse()
        .with_context(|| format!("invalid object ID {text:?}"))
}

fn cmd_store(repo: &Repo<'_>, args: StoreArgs) -> anyhow::Result<()> {
    let store = repo.open()?;
    let previous = args.previous.as_deref().map(parse_id).transpose()?;
    let data = fs::read(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let outcome = store.store_bytes(&data, previous.as_ref())?;

    match repo.format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "id": outcome.id.to_hex(),
                "used_delta": outcome.used_delta,
                "stored_len": outcome.stored_len,
                "content_len": data.len(),
            })
        ),
        OutputFormat::Text => {
            let how = if outcome.used_delta {
                "delta".cyan()
            } else {
                "raw".yellow()
            };
            println!("{} {} ({})", "✓".green().bold(), outcome.id.to_hex().bold(), how);
            println!("  Stored: {} of {} bytes", outcome.stored_len, data.len());
        }
    }
    Ok(())
}

fn cmd_cat(repo: &Repo<'_>, args: CatArgs) -> anyhow::Result<()> {
    let store = repo.open()?;
    let id = parse_id(&args.id)?;
    let mut output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    store
        .read(&id, &mut output)
        .with_context(|| format!("reading object {id}"))?;
    output.flush()?;
    Ok(())
}

fn cmd_inspect(repo: &Repo<'_>, args: InspectArgs) -> anyhow::Result<()> {
    let store = repo.open()?;
    let id = parse_id(&args.id)?;
    let stats = store.stats(&id)?;
    let chain = store.chain(&id)?;
    let intact = store.verify(&id)?;

    match repo.format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "id": id.to_hex(),
                "is_delta": stats.is_delta,
                "chain_depth": stats.chain_depth,
                "stored_len": stats.stored_len,
                "chain": chain.iter().map(ContentId::to_hex).collect::<Vec<_>>(),
                "verified": intact,
            })
        ),
        OutputFormat::Text => {
            println!("Object {}", id.to_hex().bold());
            let kind = if stats.is_delta {
                "delta".cyan()
            } else {
                "raw".yellow()
            };
            println!("  Stored as: {kind}, {} bytes", stats.stored_len);
            println!("  Chain depth: {}", stats.chain_depth);
            for base in chain.iter().skip(1) {
                println!("    → {}", base.short_hex().dimmed());
            }
            if intact {
                println!("  Integrity: {}", "✓ verified".green());
            } else {
                println!("  Integrity: {}", "✗ hash mismatch".red().bold());
            }
        }
    }

    if !intact {
        anyhow::bail!("object {id} does not reconstruct to its ID");
    }
    Ok(())
}

fn cmd_signature(args: SignatureArgs) -> anyhow::Result<()> {
    let basis = File::open(&args.basis)
        .with_context(|| format!("opening {}", args.basis.display()))?;
    let signature = make_signature(BufReader::new(basis), args.block_size)?;
    let out = File::create(&args.signature)
        .with_context(|| format!("creating {}", args.signature.display()))?;
    let mut out = BufWriter::new(out);
    write_signature(&signature, &mut out)?;
    out.flush()?;
    println!(
        "{} {} blocks of {} bytes",
        "✓".green().bold(),
        signature.len(),
        signature.block_size
    );
    Ok(())
}

fn cmd_delta(args: DeltaArgs) -> anyhow::Result<()> {
    let bytes = fs::read(&args.signature)
        .with_context(|| format!("reading {}", args.signature.display()))?;
    let signature = decode_signature(&bytes)
        .with_context(|| format!("decoding signature {}", args.signature.display()))?;
    let target = File::open(&args.target)
        .with_context(|| format!("opening {}", args.target.display()))?;
    let delta = make_delta(target, &signature)?;
    debug!(
        ops = delta.op_count(),
        copied = delta.copy_len(),
        literal = delta.literal_len(),
        "delta computed"
    );

    let out = File::create(&args.delta)
        .with_context(|| format!("creating {}", args.delta.display()))?;
    let mut out = BufWriter::new(out);
    write_delta(&delta, &mut out)?;
    out.flush()?;
    println!(
        "{} {} ops: {} bytes copied, {} literal",
        "✓".green().bold(),
        delta.op_count(),
        delta.copy_len(),
        delta.literal_len()
    );
    Ok(())
}

fn cmd_patch(args: PatchArgs) -> anyhow::Result<()> {
    let bytes = fs::read(&args.delta)
        .with_context(|| format!("reading {}", args.delta.display()))?;
    let delta = decode_delta(&bytes)
        .with_context(|| format!("decoding delta {}", args.delta.display()))?;
    let mut basis = File::open(&args.basis)
        .with_context(|| format!("opening {}", args.basis.display()))?;
    let out = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut out = BufWriter::new(out);
    let written = apply_delta(&mut basis, &delta, &mut out)?;
    out.flush()?;
    println!(
        "{} wrote {} bytes to {}",
        "✓".green().bold(),
        written,
        args.output.display()
    );
    Ok(())
}

fn cmd_config(repo: &Repo<'_>) -> anyhow::Result<()> {
    let config = repo.config()?;
    match repo.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}
