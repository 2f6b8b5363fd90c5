//! Definition loader CLI
//!
//! Usage:
//!   tower-defs data/defs                    # load and summarize a directory
//!   tower-defs data/defs --tree Tile        # also list every definition under Tile
//!   tower-defs data/defs --config defs.json --no-recursive

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tower_defs::defs::builtin_types;
use tower_defs::logging::init_tracing;
use tower_defs::{DefDatabase, DefLoader, LoaderConfig};

#[derive(Parser)]
#[command(name = "tower-defs")]
#[command(about = "Load Tower definition files and report what resolved")]
struct Cli {
    /// Directory holding definition files
    dir: PathBuf,

    /// Only read files directly inside the directory
    #[arg(long)]
    no_recursive: bool,

    /// Loader configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Treat definitions without parent or class as children of the default root
    #[arg(long)]
    assume_default_parent: bool,

    /// Print every concrete definition below this node
    #[arg(long, value_name = "ROOT")]
    tree: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LoaderConfig::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => LoaderConfig::default(),
    };
    if cli.assume_default_parent {
        config.assume_default_parent = true;
    }
    if cli.no_recursive {
        config.recursive = false;
    }
    init_tracing(&config.logging);

    let types = builtin_types();
    let recursive = config.recursive;
    let mut loader = DefLoader::new(&types, config);
    let files = loader
        .add_directory(&cli.dir, recursive)
        .with_context(|| format!("Failed to scan {}", cli.dir.display()))?;

    let mut db = DefDatabase::new();
    let summary = loader.load_into(&mut db).context("Definition batch aborted")?;

    println!("files:      {}", files);
    println!("registered: {}", summary.registered);
    println!("abstract:   {}", summary.abstracts);
    println!("rejected:   {}", summary.rejected);
    println!("errors:     {}", loader.error_count());

    if let Some(root) = &cli.tree {
        if !db.contains(root) {
            anyhow::bail!("No definition named '{}'", root);
        }
        println!();
        println!("{}", root);
        for def in db.children_of(root, true) {
            println!(
                "  {} [{}] {} <- {}",
                def.name,
                def.id,
                def.type_name(),
                def.parent_name.as_deref().unwrap_or("-")
            );
        }
    }

    db.dispose();
    Ok(())
}
