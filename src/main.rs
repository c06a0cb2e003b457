use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use filevault::console::ConsolePrompt;
use filevault::format::format_file_size;
use filevault::models::{FilterState, SizeRange};
use filevault::services::{DeleteOutcome, FileApiClient, FileList, FilterPanel, UploadPanel, DELETE_FAILED};
use filevault::AppConfig;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(version, about = "Browse, upload, download and delete files on a filevault server")]
struct Opts {
    /// Increase verbosity (-v, -vv). Default INFO.
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Decrease verbosity (-q)
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    quiet: u8,
    /// API base URL, overrides FILEVAULT_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List stored files
    List {
        /// Case-insensitive filename search
        #[arg(long)]
        search: Option<String>,
        /// MIME type substring, e.g. image/ or application/pdf
        #[arg(long = "type")]
        file_type: Option<String>,
        /// small, medium, large, very-large or min,max in bytes
        #[arg(long)]
        size: Option<String>,
        #[arg(long, conflicts_with = "size")]
        min_size: Option<u64>,
        #[arg(long, conflicts_with = "size")]
        max_size: Option<u64>,
        /// Only files uploaded in the last N days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Upload a file
    Upload {
        path: PathBuf,
        /// Hash locally first and report a matching stored file
        #[arg(long)]
        check: bool,
    },
    /// Delete a stored file
    Delete {
        id: String,
        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Download a stored file under its original name
    Download {
        id: String,
        /// Target directory, overrides FILEVAULT_DOWNLOAD_DIR
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Interactive session with live search
    Browse,
}

fn log_level(verbose: u8, quiet: u8) -> &'static str {
    match verbose as i16 - quiet as i16 {
        i16::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8, quiet: u8) {
    let level = log_level(verbose, quiet);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("filevault={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .init();
}

#[tokio::main]
async fn main() {
    let opts = Opts::parse();
    init_tracing(opts.verbose, opts.quiet);

    if let Err(e) = run(opts).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(opts: Opts) -> Result<()> {
    let mut config = AppConfig::new()?;
    if let Some(url) = &opts.api_url {
        config = config.with_base_url(url);
    }
    debug!("Using API at {}", config.api.base_url);

    let api = FileApiClient::new(&config.api);

    match opts.command {
        Command::List { search, file_type, size, min_size, max_size, days } => {
            let size_range = match size {
                Some(s) => Some(SizeRange::from_preset(&s).ok_or_else(|| anyhow!("unknown size filter '{}'", s))?),
                None => None,
            };
            let filters = FilterState { search, file_type, size_range, min_size, max_size, date_range: days };

            let mut list = FileList::new(api);
            list.load(&filters).await;
            if let Some(error) = list.error() {
                return Err(anyhow!("{}", error));
            }
            print!("{}", list.render());
        }
        Command::Upload { path, check } => {
            let mut uploads = UploadPanel::new(api.clone());
            uploads.select(&path);

            if check {
                let listing = api.list_files(&FilterState::default()).await?;
                if let Some(existing) = uploads.precheck(&listing) {
                    println!("Identical content already stored as {} ({})", existing.original_filename, existing.id);
                }
            }

            upload_selected(&mut uploads).await?;
        }
        Command::Delete { id, yes } => {
            let prompt = ConsolePrompt::stdio(yes);
            let mut list = FileList::new(api);
            match list.delete(&id, &prompt).await {
                DeleteOutcome::Cancelled => println!("Cancelled"),
                DeleteOutcome::Deleted => println!("Deleted {}", id),
                DeleteOutcome::Failed => return Err(anyhow!(DELETE_FAILED)),
            }
        }
        Command::Download { id, out } => {
            let dir = out.unwrap_or_else(|| PathBuf::from(&config.download.dir));
            let mut list = FileList::new(api);
            download(&mut list, &id, &dir).await?;
        }
        Command::Browse => browse(&config, api).await?,
    }

    Ok(())
}

async fn upload_selected(uploads: &mut UploadPanel) -> Result<()> {
    if let Some(record) = uploads.upload().await {
        println!("Uploaded {} ({}, {})", record.original_filename, record.id, format_file_size(record.size));
    } else if let Some(duplicate) = uploads.duplicate() {
        println!("{}", duplicate.notice());
    } else if let Some(error) = uploads.error() {
        return Err(anyhow!("{}", error));
    }
    Ok(())
}

/// Find `id` in the listing and save it into `dir`
async fn download(list: &mut FileList, id: &str, dir: &Path) -> Result<PathBuf> {
    if list.find(id).is_none() {
        list.reload().await;
        if let Some(error) = list.error() {
            return Err(anyhow!("{}", error));
        }
    }

    let record = list.find(id).cloned().ok_or_else(|| anyhow!("no file with id {}", id))?;
    match list.download(&record, dir).await {
        Some(path) => {
            println!("Saved {} to {}", record.original_filename, path.display());
            Ok(path)
        }
        None => Err(anyhow!("{}", list.error().unwrap_or("download failed"))),
    }
}

const BROWSE_HELP: &str = "\
Type to search (each line replaces the search text). Commands:
  :type <mime>      file type filter      :size <bucket|min,max>  size filter
  :days <n>         uploaded in last n    :apply / :reset         apply or clear filters
  :delete <id>      delete a file         :download <id>          save a file
  :upload <path>    upload a file         :refresh                reload the list
  :help             this text             :quit                   leave
";

#[derive(Debug, PartialEq, Eq)]
enum BrowseCommand {
    Search(String),
    FileType(String),
    Size(String),
    Days(String),
    Apply,
    Reset,
    Refresh,
    Delete(String),
    Download(String),
    Upload(PathBuf),
    Help,
    Quit,
    Unknown(String),
}

impl BrowseCommand {
    fn parse(line: &str) -> Self {
        let Some(command) = line.strip_prefix(':') else {
            return BrowseCommand::Search(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim().to_string()),
            None => (command.trim(), String::new()),
        };

        match name {
            "type" => BrowseCommand::FileType(arg),
            "size" => BrowseCommand::Size(arg),
            "days" => BrowseCommand::Days(arg),
            "apply" => BrowseCommand::Apply,
            "reset" => BrowseCommand::Reset,
            "refresh" => BrowseCommand::Refresh,
            "delete" if !arg.is_empty() => BrowseCommand::Delete(arg),
            "download" if !arg.is_empty() => BrowseCommand::Download(arg),
            "upload" if !arg.is_empty() => BrowseCommand::Upload(PathBuf::from(arg)),
            "help" | "h" => BrowseCommand::Help,
            "quit" | "q" | "exit" => BrowseCommand::Quit,
            _ => BrowseCommand::Unknown(line.to_string()),
        }
    }
}

async fn browse(config: &AppConfig, api: FileApiClient) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut panel = FilterPanel::new(tx);
    let mut list = FileList::new(api.clone());
    let mut uploads = UploadPanel::new(api);
    let prompt = ConsolePrompt::stdio(false);
    let download_dir = PathBuf::from(&config.download.dir);

    info!("Starting interactive session against {}", config.api.base_url);
    prompt.print(BROWSE_HELP).await;
    list.load(&FilterState::default()).await;
    prompt.print(&list.render()).await;

    loop {
        tokio::select! {
            Some(filters) = rx.recv() => {
                list.load(&filters).await;
                prompt.print(&list.render()).await;
            }
            line = prompt.next_line() => {
                let Some(line) = line else { break };

                match BrowseCommand::parse(&line) {
                    BrowseCommand::Search(text) => panel.set_search(&text),
                    BrowseCommand::FileType(value) => panel.set_file_type(&value),
                    BrowseCommand::Size(value) => {
                        if value.is_empty() {
                            panel.set_size_range("");
                        } else if let Some(range) = SizeRange::from_preset(&value) {
                            panel.set_size_range(&range.to_string());
                        } else {
                            prompt.print(&format!("Unknown size filter '{}'\n", value)).await;
                        }
                    }
                    BrowseCommand::Days(value) => panel.set_date_range(&value),
                    BrowseCommand::Apply => panel.apply(),
                    BrowseCommand::Reset => panel.reset(),
                    BrowseCommand::Refresh => {
                        list.reload().await;
                        prompt.print(&list.render()).await;
                    }
                    BrowseCommand::Delete(id) => {
                        if list.delete(&id, &prompt).await == DeleteOutcome::Deleted {
                            prompt.print(&list.render()).await;
                        }
                    }
                    BrowseCommand::Download(id) => {
                        if let Err(e) = download(&mut list, &id, &download_dir).await {
                            prompt.print(&format!("{}\n", e)).await;
                        }
                    }
                    BrowseCommand::Upload(path) => {
                        uploads.select(path);
                        match upload_selected(&mut uploads).await {
                            Ok(()) => {
                                if uploads.duplicate().is_none() {
                                    list.reload().await;
                                    prompt.print(&list.render()).await;
                                }
                            }
                            Err(e) => prompt.print(&format!("{}\n", e)).await,
                        }
                    }
                    BrowseCommand::Help => prompt.print(BROWSE_HELP).await,
                    BrowseCommand::Quit => break,
                    BrowseCommand::Unknown(line) => {
                        prompt.print(&format!("Unknown command '{}', :help lists commands\n", line)).await
                    }
                }
            }
        }
    }

    Ok(())
}
