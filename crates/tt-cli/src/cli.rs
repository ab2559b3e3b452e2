use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tt",
    about = "TinyTrack: content-addressed blob storage with delta chains",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository directory holding the object store
    #[arg(long, global = true, default_value = ".tt")]
    pub repo: PathBuf,

    /// Store configuration file (defaults to <repo>/config.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log store decisions at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for command results
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a file, as a delta against a previous version when worthwhile
    Store(StoreArgs),
    /// Reconstruct a stored object
    Cat(CatArgs),
    /// Show how an object is stored and check its integrity
    Inspect(InspectArgs),
    /// Write the block signature of a basis file
    Signature(SignatureArgs),
    /// Encode a target file as a delta against a signature
    Delta(DeltaArgs),
    /// Apply a delta to a basis file
    Patch(PatchArgs),
    /// Print the effective store configuration
    Config,
}

#[derive(Args)]
pub struct StoreArgs {
    pub path: PathBuf,
    /// ID of the version this file replaces
    #[arg(short, long)]
    pub previous: Option<String>,
}

#[derive(Args)]
pub struct CatArgs {
    pub id: String,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct InspectArgs {
    pub id: String,
}

#[derive(Args)]
pub struct SignatureArgs {
    pub basis: PathBuf,
    pub signature: PathBuf,
    #[arg(short, long, default_value_t = 2048)]
    pub block_size: u32,
}

#[derive(Args)]
pub struct DeltaArgs {
    pub signature: PathBuf,
    pub target: PathBuf,
    pub delta: PathBuf,
}

#[derive(Args)]
pub struct PatchArgs {
    pub basis: PathBuf,
    pub delta: PathBuf,
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_have_help_text() {
        let command = Cli::command();
        for name in ["repo", "config", "verbose", "format"] {
            let arg = command
                .get_arguments()
                .find(|arg| arg.get_id().as_str() == name)
                .unwrap();
            assert!(arg.get_help().is_some(), "--{name} has no help text");
        }
    }

    #[test]
    fn global_flags_default() {
        let cli = Cli::parse_from(["tt", "config"]);
        assert_eq!(cli.repo, PathBuf::from(".tt"));
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn store_with_previous() {
        let cli = Cli::parse_from(["tt", "--repo", "/tmp/r", "store", "a.bin", "-p", "abcd"]);
        assert_eq!(cli.repo, PathBuf::from("/tmp/r"));
        match cli.command {
            Command::Store(args) => {
                assert_eq!(args.path, PathBuf::from("a.bin"));
                assert_eq!(args.previous.as_deref(), Some("abcd"));
            }
            _ => panic!("expected store"),
        }
    }

    #[test]
    fn signature_block_size_defaults() {
        let cli = Cli::parse_from(["tt", "signature", "basis", "sig"]);
        match cli.command {
            Command::Signature(args) => assert_eq!(args.block_size, 2048),
            _ => panic!("expected signature"),
        }
    }
}
