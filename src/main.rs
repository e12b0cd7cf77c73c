use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use portext::{
    Config, MemoryStore, PostInput, SanityStore, markdown_to_portable_text_with_style,
    parse_blocks_with_style, publish, summarize,
};

#[derive(Parser)]
#[command(name = "portext", version)]
#[command(about = "Convert markdown posts to portable text and publish them to the CMS")]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "portext.toml")]
    config: PathBuf,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update a blog post from a JSON file
    Publish {
        /// Post JSON file with title, excerpt, content, tags and publishedAt
        post: PathBuf,

        /// Publish into an in-memory store and print the record instead
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the portable text of a markdown file as JSON
    Convert {
        /// Input Markdown file
        input: PathBuf,
    },

    /// Print a one-line summary of each block in a markdown file
    Inspect {
        /// Input Markdown file
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)?.with_env_overrides();

    match cli.command {
        Command::Publish { post, dry_run } => publish_post(&post, dry_run, &config),
        Command::Convert { input } => {
            let markdown = read_markdown(&input)?;
            let blocks = markdown_to_portable_text_with_style(&markdown, &config.table);
            println!("{}", serde_json::to_string_pretty(&blocks)?);
            Ok(())
        }
        Command::Inspect { input } => {
            let markdown = read_markdown(&input)?;
            for line in summarize(&parse_blocks_with_style(&markdown, &config.table)) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn read_markdown(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Error reading {}", path.display()))
}

fn publish_post(path: &Path, dry_run: bool, config: &Config) -> Result<()> {
    let post = PostInput::from_file(path)?.validate()?;
    println!("Creating/updating blog post: {}", post.title);

    let report = if dry_run {
        let mut store = MemoryStore::new();
        let report = publish(&mut store, &post, &config.table, Utc::now())?;
        if let Some(record) = store.post(&report.id) {
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        report
    } else {
        let mut store = SanityStore::new(&config.store)?;
        publish(&mut store, &post, &config.table, Utc::now())
            .context("Publishing failed")?
    };

    println!("\n✓ Post {} successfully!", report.outcome);
    println!("  Title: {}", report.title);
    println!("  Slug: {}", report.slug);
    println!("  ID: {}", report.id);

    Ok(())
}
