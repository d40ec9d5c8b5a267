//! article-topics: generate article topics for a theme with a five-agent
//! LLM pipeline, and manage the files it produces.
//!
//!   article-topics generate --theme "Space Exploration"
//!   article-topics archive Article_Topic_Generated_1-2-2025_3-4-5.md
//!   article-topics purge --yes
//!   article-topics serve --bind 127.0.0.1:8501
//!
//! Requires the API key environment variable named in the config
//! (`GOOGLE_API_KEY` by default) for `generate` and `serve`.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use article_topics::events::FnObserver;
use article_topics::web::{self, AppState};
use article_topics::{
    archive, packager, pipeline, Config, PipelineProgress, RunInput, Theme, TopicCount,
};
use chrono::Local;
use clap::{Parser, Subcommand};
use regex::Regex;

#[derive(Parser)]
#[command(name = "article-topics", version, about = "Generate article topics for a theme")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, env = "ARTICLE_TOPICS_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline and save the topics as Markdown
    Generate {
        /// Theme to generate topics for (prompted if absent)
        #[arg(long, env = "THEME")]
        theme: Option<String>,

        /// Number of topics (random within the configured range if absent)
        #[arg(long)]
        topics: Option<u32>,

        /// Directory to save the document in (default: ~/Downloads)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Also print the generated topics to stdout
        #[arg(long)]
        print: bool,
    },

    /// Zip a file into a zipped_file_<timestamp>.zip archive
    Archive {
        file: PathBuf,

        /// Where to write the archive
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Extract the archive into this directory right away
        #[arg(long)]
        extract_to: Option<PathBuf>,
    },

    /// Extract every entry of an archive
    Extract { archive: PathBuf, dest: PathBuf },

    /// Delete archives whose file name matches a pattern
    Purge {
        /// Directory to search recursively
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Regex matched against file names
        #[arg(long, default_value = "^zipped_file_")]
        pattern: String,

        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Find the nearest Downloads folder above a directory
    LocateDownloads {
        #[arg(long, default_value = ".")]
        from: PathBuf,
    },

    /// Serve the web API
    Serve {
        /// Address to bind (default from config)
        #[arg(long)]
        bind: Option<String>,
    },
}

fn prompt(question: &str) -> Result<String> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "article_topics=debug"
    } else {
        "article_topics=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = Config::load(cli.config.as_deref()).context("loading config")?;

    match cli.command {
        Command::Generate {
            theme,
            topics,
            output_dir,
            print,
        } => generate(&config, theme, topics, output_dir, print).await,
        Command::Archive {
            file,
            out_dir,
            extract_to,
        } => {
            let zip_path = archive::archive(&file, &out_dir, &Local::now())?;
            println!("Archived {} -> {}", file.display(), zip_path.display());
            if let Some(dest) = extract_to {
                archive::extract(&zip_path, &dest)?;
                println!("Download of file: {} complete! Check {}", file.display(), dest.display());
            }
            Ok(())
        }
        Command::Extract { archive: zip_path, dest } => {
            for file in archive::extract(&zip_path, &dest)? {
                println!("{}", file.display());
            }
            Ok(())
        }
        Command::Purge { root, pattern, yes } => {
            let pattern = Regex::new(&pattern).context("invalid --pattern")?;
            let confirmed = yes
                || prompt("Do you want to delete the zip files? Enter 'y' for yes and 'n' for no: ")?
                    .to_lowercase()
                    .starts_with('y');
            if !confirmed {
                println!("No deletion of zip files will take place.");
                return Ok(());
            }
            match archive::purge(&root, &pattern, true)? {
                0 => println!("No zipped files found. So, nothing deleted."),
                n => println!("{} files deleted.", n),
            }
            Ok(())
        }
        Command::LocateDownloads { from } => {
            let start = std::fs::canonicalize(&from)
                .with_context(|| format!("resolving {}", from.display()))?;
            match packager::probe_downloads(&start) {
                Some(found) => println!("{}", found.display()),
                None => println!("No Downloads folder found above {}", start.display()),
            }
            Ok(())
        }
        Command::Serve { bind } => {
            let agent = config.build_agent()?;
            let addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            let state = Arc::new(AppState::new(Arc::new(agent), config));
            web::serve(state, &addr).await?;
            Ok(())
        }
    }
}

async fn generate(
    config: &Config,
    theme: Option<String>,
    topics: Option<u32>,
    output_dir: Option<PathBuf>,
    print: bool,
) -> Result<()> {
    // credential and destination first: nothing runs without them
    let agent = config.build_agent()?;
    let output_dir = output_dir.or_else(|| config.output_dir.clone());
    let dir = packager::prepare_output_dir(output_dir.as_deref())?;

    let theme = match theme {
        Some(t) => Theme::new(t)?,
        None => Theme::new(prompt("Enter the theme: ")?)?,
    };
    let topic_count = match topics {
        Some(n) => TopicCount::new(n, config.cli_topic_range)?,
        None => config.cli_topic_range.sample()?,
    };

    println!("\nTheme: {}", theme);
    println!("Number of topics: {}", topic_count);
    println!("\nPreparing setup...");

    let observer = FnObserver(|p: &PipelineProgress| {
        println!("✅ [{}/{}] {} completed!", p.stage_index + 1, p.total_stages, p.label);
    });
    let result = pipeline::run_article(&agent, RunInput::new(theme, topic_count), &observer).await?;

    if print {
        println!("\nPrinting the topics collected:\n\n{}", result.content);
    }

    match packager::save_run(&result, &dir, &Local::now()) {
        Ok(path) => {
            println!("\nDownload complete! Saved to {}", path.display());
            Ok(())
        }
        Err(e) => {
            if !print {
                println!(
                    "\nCould not save the topics, printing them instead:\n\n{}",
                    result.content
                );
            }
            Err(e).with_context(|| format!("saving to {}", dir.display()))
        }
    }
}
