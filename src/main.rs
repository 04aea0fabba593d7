use anthology::{check, config, index, output, scan};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Shared flags for commands that parse content.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the parse cache and re-parse every document
    #[arg(long)]
    no_cache: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            env!("CARGO_PKG_VERSION")
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("{} ({hash})", env!("CARGO_PKG_VERSION")).into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "anthology")]
#[command(about = "Build and lint pipeline for Markdown article collections")]
#[command(long_about = "\
Build and lint pipeline for Markdown article collections

Your filesystem is the data source. Markdown files with YAML front-matter
become documents, directories become URL paths, and every other file is an
asset that image references are checked against.

Content structure:

  content/
  ├── config.toml                    # Site config (optional, cascades to children)
  ├── about.md                       # Undated page → /about/
  ├── posts/
  │   ├── config.toml                # Section defaults (override parent)
  │   ├── 2014-01-12-types-intro.md  # Dated post → /posts/types-intro/
  │   └── images/
  │       └── lattice.png            # Asset
  └── guides/
      └── setup.md                   # → /guides/setup/

Front-matter keys: layout, title, description, nav, seriesId, seriesOrder,
categories, date. Metadata resolution (first available wins):
  title:   front-matter → humanized slug
  date:    front-matter → filename date prefix
  layout:  front-matter → [defaults] cascade
  nav:     front-matter → [defaults] cascade

Pipeline: scan writes <temp>/manifest.json, index derives series/navigation
into <output>/index.json, check reports integrity findings.

Run 'anthology gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (manifest, parse cache)
    #[arg(long, default_value = ".anthology-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the content tree into a manifest
    Scan(CacheArgs),
    /// Derive series, navigation, and URLs from the manifest
    Index,
    /// Run every content integrity check
    Check(CacheArgs),
    /// Run the full pipeline: scan → index → check
    Build(CacheArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scan(cache_args) => {
            init_thread_pool(&cli.source)?;
            let (manifest, stats) = scan::scan(&cli.source, &cli.temp_dir, !cache_args.no_cache)?;
            scan::write_manifest(&manifest, &cli.temp_dir)?;
            output::print_scan_output(&manifest, &stats);
        }
        Command::Index => {
            let manifest = scan::read_manifest(&cli.temp_dir)?;
            let site_index = index::build_index(&manifest);
            index::write_index(&site_index, &cli.output)?;
            output::print_index_output(&site_index);
        }
        Command::Check(cache_args) => {
            println!("==> Checking {}", cli.source.display());
            init_thread_pool(&cli.source)?;
            let (manifest, _) = scan::scan(&cli.source, &cli.temp_dir, !cache_args.no_cache)?;
            let site_index = index::build_index(&manifest);
            let report = check::run(&manifest, &site_index);
            output::print_check_output(&report);
            if report.has_errors() {
                std::process::exit(1);
            }
        }
        Command::Build(cache_args) => {
            init_thread_pool(&cli.source)?;

            println!("==> Stage 1: Scanning {}", cli.source.display());
            let (manifest, stats) = scan::scan(&cli.source, &cli.temp_dir, !cache_args.no_cache)?;
            scan::write_manifest(&manifest, &cli.temp_dir)?;
            output::print_scan_output(&manifest, &stats);

            println!("==> Stage 2: Indexing \u{2192} {}", cli.output.display());
            let site_index = index::build_index(&manifest);
            index::write_index(&site_index, &cli.output)?;
            output::print_index_output(&site_index);

            println!("==> Stage 3: Checking");
            let report = check::run(&manifest, &site_index);
            output::print_check_output(&report);
            if report.has_errors() {
                std::process::exit(1);
            }

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool from the root config.
///
/// Caps at the number of available CPU cores; users can constrain down,
/// not up.
fn init_thread_pool(source: &Path) -> Result<(), config::ConfigError> {
    let site_config = config::load_config(source)?;
    let threads = config::effective_threads(&site_config.processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
    Ok(())
}
