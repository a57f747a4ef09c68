use chrono::Utc;
use clap::Parser;
use colored::*;
use daybook::api::{resolve_date, ConfigAction, DaybookApi, ExportFormat};
use daybook::codec;
use daybook::commands::{self, CmdMessage, EntryListing, MessageLevel};
use daybook::config::DaybookConfig;
use daybook::editor::edit_document;
use daybook::error::{DaybookError, Result};
use daybook::index::Page;
use daybook::remote::github::GitHubStore;
use daybook::store::fs::FileStore;
use daybook::sync::EntrySyncState;
use directories::ProjectDirs;
use std::io::{self, Write};
use std::path::PathBuf;

mod args;
use args::{Cli, Commands, ExportFormatArg};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose { "daybook=debug" } else { "daybook=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();
}

struct AppContext {
    api: DaybookApi<FileStore, GitHubStore>,
    config: DaybookConfig,
    data_dir: PathBuf,
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::Edit { date }) => handle_edit(&ctx, date).await,
        Some(Commands::Show { date }) => handle_show(&ctx, date).await,
        Some(Commands::List { search, page }) => handle_list(&ctx, search, page),
        Some(Commands::Sync { no_refresh }) => handle_sync(&ctx, no_refresh).await,
        Some(Commands::Status) => handle_status(&ctx),
        Some(Commands::Export { format }) => handle_export(&ctx, format),
        Some(Commands::Import { path }) => handle_import(&ctx, path),
        Some(Commands::Delete { date, yes }) => handle_delete(&ctx, date, yes).await,
        Some(Commands::Prune { keep }) => handle_prune(&ctx, keep),
        Some(Commands::Config { key, value }) => handle_config(&ctx, key, value),
        None => handle_list(&ctx, None, 1),
    }
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => {
            let proj_dirs = ProjectDirs::from("com", "daybook", "daybook")
                .expect("Could not determine data dir");
            proj_dirs.data_dir().to_path_buf()
        }
    };

    let config = DaybookConfig::load(&data_dir).unwrap_or_default();
    let store = FileStore::new(data_dir.join("cache"));
    let remote = GitHubStore::new(
        &config.owner,
        &config.repo,
        &config.branch,
        config.token(),
    )?;
    let api = DaybookApi::new(store, remote);

    Ok(AppContext {
        api,
        config,
        data_dir,
    })
}

async fn handle_edit(ctx: &AppContext, date: Option<String>) -> Result<()> {
    let date = resolve_date(date.as_deref())?;
    let entry = ctx.api.load_entry(&date).await?;

    let buffer = edit_document(&codec::encode(&entry))?;
    let edited = codec::decode(&buffer);

    let result = ctx.api.save_entry(&edited)?;
    print_messages(&result.messages);
    if ctx.config.remote_configured() {
        println!("{}", "Run `daybook sync` to push.".dimmed());
    }
    Ok(())
}

async fn handle_show(ctx: &AppContext, date: Option<String>) -> Result<()> {
    let date = resolve_date(date.as_deref())?;
    let result = ctx.api.show_entry(&date).await?;

    if let Some(document) = &result.document {
        println!("{}", document);
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_list(ctx: &AppContext, search: Option<String>, page: usize) -> Result<()> {
    let result = ctx.api.list_entries(search.as_deref(), page)?;
    print_listings(&result.listings);
    if let Some(page) = &result.page {
        print_page_footer(page);
    }
    print_messages(&result.messages);
    Ok(())
}

async fn handle_sync(ctx: &AppContext, no_refresh: bool) -> Result<()> {
    if !ctx.config.remote_configured() {
        return Err(DaybookError::Api(
            "Remote not configured. Run `daybook config owner <owner>` and `daybook config repo <repo>` first.".into(),
        ));
    }

    let result = ctx.api.sync(!no_refresh).await?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_status(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.status()?;
    print_messages(&result.messages);

    if ctx.config.remote_configured() {
        println!(
            "{}",
            format!(
                "Remote: {}/{} ({})",
                ctx.config.owner, ctx.config.repo, ctx.config.branch
            )
            .dimmed()
        );
    } else {
        println!("{}", "Remote: not configured".dimmed());
    }
    Ok(())
}

fn handle_export(ctx: &AppContext, format: ExportFormatArg) -> Result<()> {
    let format = match format {
        ExportFormatArg::Json => ExportFormat::Json,
        ExportFormatArg::Archive => ExportFormat::Archive,
    };
    let result = ctx.api.export_entries(format)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_import(ctx: &AppContext, path: PathBuf) -> Result<()> {
    let result = ctx.api.import_entries(&path)?;
    print_messages(&result.messages);
    Ok(())
}

async fn handle_delete(ctx: &AppContext, date: String, yes: bool) -> Result<()> {
    let date = resolve_date(Some(&date))?;

    if !yes {
        print!("Permanently delete {} locally and remotely? [Y] ", date);
        io::stdout().flush().map_err(DaybookError::Io)?;

        let mut input = String::new();
        io::stdin().read_line(&mut input).map_err(DaybookError::Io)?;
        if input.trim() != "Y" {
            println!("Operation cancelled.");
            return Ok(());
        }
    }

    let result = ctx.api.delete_entry(&date).await?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_prune(ctx: &AppContext, keep: Option<usize>) -> Result<()> {
    let keep = keep.unwrap_or(ctx.config.retain_synced);
    let result = ctx.api.prune(keep)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (Some(key), Some(value)) => ConfigAction::Set { key, value },
        (None, _) => ConfigAction::Show,
        (Some(key), None) => {
            return Err(DaybookError::Api(format!(
                "Missing value for config key '{}'",
                key
            )))
        }
    };
    let result = commands::config::run(&ctx.data_dir, action)?;
    print_messages(&result.messages);
    Ok(())
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

fn print_listings(listings: &[EntryListing]) {
    let formatter = timeago::Formatter::new();
    for listing in listings {
        let state = match listing.state {
            EntrySyncState::Pending => "pending".yellow(),
            EntrySyncState::Synced => "synced".green(),
            EntrySyncState::Unsynced => "remote".dimmed(),
        };
        let age = listing
            .modified
            .map(|modified| {
                let elapsed = (Utc::now() - modified).to_std().unwrap_or_default();
                formatter.convert(elapsed)
            })
            .unwrap_or_default();
        println!("{}  {:<8} {}", listing.date.to_string().bold(), state, age.dimmed());
    }
}

fn print_page_footer(page: &Page) {
    if page.total > 1 {
        let mut hints = Vec::new();
        if page.has_previous {
            hints.push(format!("--page {}", page.current - 1));
        }
        if page.has_next {
            hints.push(format!("--page {}", page.current + 1));
        }
        println!(
            "{}",
            format!("Page {}/{} ({})", page.current, page.total, hints.join(", ")).dimmed()
        );
    }
}
