use clap::Parser;
use mediatree::session::{Session, SessionEnd};
use mediatree::{Config, MediaLibrary, MediaTreeError, SearchMode};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about = "Per-user multimedia library indexed by bounding box", long_about = None)]
struct Args {
    /// CSV file holding every user's records
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// Directory receiving `<user>_search_result.txt` reports
    #[arg(short, long)]
    results_dir: Option<PathBuf>,

    /// Configuration file (JSON, or TOML when built with the `toml` feature)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum entries per tree node
    #[arg(long)]
    max_children: Option<usize>,

    /// Report only records whose box equals the query box
    #[arg(long)]
    exact_search: bool,
}

fn load_config(path: &Path) -> mediatree::Result<Config> {
    let text = std::fs::read_to_string(path)?;

    #[cfg(feature = "toml")]
    if path.extension().is_some_and(|ext| ext == "toml") {
        return Config::from_toml(&text).map_err(|e| MediaTreeError::InvalidConfig(e.to_string()));
    }

    Config::from_json(&text).map_err(|e| MediaTreeError::InvalidConfig(e.to_string()))
}

fn build_config(args: &Args) -> mediatree::Result<Config> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    if let Some(path) = &args.data_file {
        config = config.with_data_file(path);
    }
    if let Some(dir) = &args.results_dir {
        config = config.with_results_dir(dir);
    }
    if let Some(max_children) = args.max_children {
        config.index.max_children = max_children;
    }
    if args.exact_search {
        config = config.with_search_mode(SearchMode::Exact);
    }

    config.validate().map_err(MediaTreeError::InvalidConfig)?;
    Ok(config)
}

fn run(args: Args) -> mediatree::Result<SessionEnd> {
    let config = build_config(&args)?;
    log::info!(
        "Opening library at {}",
        config.persistence.data_file.display()
    );

    let mut library = MediaLibrary::builder().config(config).build()?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let end = Session::new(&mut library, stdin.lock(), stdout.lock()).run()?;

    let stats = library.stats();
    log::info!(
        "Session ended ({:?}): {} users, {} records, {} failed writes",
        end,
        stats.users,
        stats.records,
        stats.failed_writes
    );
    Ok(end)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
