//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use checkio_core::{
    AggregationPipeline, AggregationProgress, CategoryWarning, CheckoutRequest, FeaturedAssetList,
    category_overview, checkin_by_tag, checkout_by_tag, configure_featured_categories,
    lookup_employee,
};
use checkio_directory::{AssetDirectory, SnipeItClient};
use checkio_shared::{
    AppConfig, AssignmentMode, CategoryId, FeaturedCategoryConfig, Session, expand_home,
    init_config, load_config, load_config_from,
};
use checkio_storage::{CategoryConfigStore, Storage};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::render::{asset_cells, format_table, warning_lines};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Look up employees and manage their checked-out hardware.
#[derive(Parser)]
#[command(
    name = "checkio",
    version,
    about = "Look up employees, check hardware in and out, and manage featured asset categories.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.checkio/checkio.toml).
    #[arg(long, global = true, env = "CHECKIO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Check that the configured API token is accepted by the asset directory.
    Login,

    /// Show an employee and the assets checked out to them.
    Employee {
        /// Employee number.
        number: String,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Check an asset out to an employee.
    Checkout {
        /// Asset tag.
        #[arg(long)]
        tag: String,

        /// Employee number of the recipient.
        #[arg(long)]
        employee: String,

        /// Note recorded with the checkout.
        #[arg(long, default_value = "")]
        note: String,

        /// Category the asset is assigned under (select mode).
        #[arg(long)]
        category: Option<i64>,
    },

    /// Check an asset back in.
    Checkin {
        /// Asset tag.
        #[arg(long)]
        tag: String,

        /// Note recorded with the checkin.
        #[arg(long, default_value = "")]
        note: String,
    },

    /// List asset categories, marking the featured ones.
    Categories,

    /// Featured category management.
    Featured {
        #[command(subcommand)]
        action: FeaturedAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Featured category subcommands.
#[derive(Subcommand)]
pub(crate) enum FeaturedAction {
    /// Show the featured category configuration.
    Show,
    /// List every asset in the featured categories.
    Assets {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Replace the featured category configuration (admin only).
    Set {
        /// Assignment mode.
        #[arg(long, value_enum)]
        mode: ModeArg,

        /// Comma-separated category ids; omit to clear.
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
    },
}

/// Assignment mode as accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum ModeArg {
    /// The person assigning picks a category.
    Select,
    /// Only the featured categories may be assigned.
    Fixed,
}

impl From<ModeArg> for AssignmentMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Select => AssignmentMode::Select,
            ModeArg::Fixed => AssignmentMode::Fixed,
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = ["checkio", "checkio_core", "checkio_directory", "checkio_storage", "checkio_shared"]
        .map(|target| format!("{target}={level}"))
        .join(",");

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Login => cmd_login(&config).await,
        Command::Employee { number, json } => cmd_employee(&config, &number, json).await,
        Command::Checkout {
            tag,
            employee,
            note,
            category,
        } => cmd_checkout(&config, tag, employee, note, category.map(CategoryId)).await,
        Command::Checkin { tag, note } => cmd_checkin(&config, &tag, &note).await,
        Command::Categories => cmd_categories(&config).await,
        Command::Featured { action } => match action {
            FeaturedAction::Show => cmd_featured_show(&config).await,
            FeaturedAction::Assets { json } => cmd_featured_assets(&config, json).await,
            FeaturedAction::Set { mode, ids } => cmd_featured_set(&config, mode.into(), &ids).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

async fn open_storage(config: &AppConfig) -> Result<Storage> {
    let path = expand_home(&config.storage.db_path)?;
    Ok(Storage::open(&path).await?)
}

fn directory_client(config: &AppConfig) -> Result<SnipeItClient> {
    Ok(SnipeItClient::from_config(&config.directory)?)
}

/// Verify the token upstream, then attach the configured admin flag.
async fn establish_session(config: &AppConfig, directory: &SnipeItClient) -> Session {
    let authenticated = match directory.verify().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "asset directory rejected the session");
            false
        }
    };
    Session {
        authenticated,
        is_admin: authenticated && config.access.admin,
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_login(config: &AppConfig) -> Result<()> {
    let directory = directory_client(config)?;
    match directory.verify().await {
        Ok(()) => {
            println!("Logged in to {}", config.directory.base_url);
            if config.access.admin {
                println!("Administrator access enabled.");
            }
            Ok(())
        }
        Err(e @ checkio_shared::CheckIoError::Network(_)) => {
            Err(eyre!("Error connecting to the asset directory: {e}"))
        }
        Err(e) => Err(eyre!("Asset directory authentication failed: {e}")),
    }
}

async fn cmd_employee(config: &AppConfig, number: &str, json: bool) -> Result<()> {
    let directory = directory_client(config)?;
    let found = lookup_employee(&directory, number, &config.display_properties).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    println!();
    println!("  {} (#{})", found.user.name, number.trim());
    if let Some(email) = &found.user.email {
        println!("  {email}");
    }
    println!();
    if found.rows.is_empty() {
        println!("  No assets checked out.");
    } else {
        println!("{}", format_table(&found.columns, &asset_cells(&found.rows)));
    }
    if found.skipped_without_id > 0 {
        println!("  ({} records without an id were skipped)", found.skipped_without_id);
    }
    Ok(())
}

async fn cmd_checkout(
    config: &AppConfig,
    tag: String,
    employee: String,
    note: String,
    category: Option<CategoryId>,
) -> Result<()> {
    let directory = directory_client(config)?;
    let storage = open_storage(config).await?;

    let request = CheckoutRequest {
        asset_tag: tag,
        employee_number: employee,
        note,
        category,
    };
    info!(tag = %request.asset_tag, employee = %request.employee_number, "checking out");

    let receipt = checkout_by_tag(&directory, &storage, &request).await?;
    if !receipt.outcome.is_success() {
        return Err(eyre!(
            "checkout of {} refused: {}",
            receipt.asset_tag,
            receipt.outcome.message
        ));
    }

    let to = receipt
        .user
        .as_ref()
        .map(|u| u.name.as_str())
        .unwrap_or("unknown user");
    println!("Checked out {} ({}) to {to}.", receipt.asset_tag, receipt.asset_name);
    Ok(())
}

async fn cmd_checkin(config: &AppConfig, tag: &str, note: &str) -> Result<()> {
    let directory = directory_client(config)?;
    let receipt = checkin_by_tag(&directory, tag, note).await?;
    if !receipt.outcome.is_success() {
        return Err(eyre!(
            "checkin of {} refused: {}",
            receipt.asset_tag,
            receipt.outcome.message
        ));
    }
    println!("Checked in {} ({}).", receipt.asset_tag, receipt.asset_name);
    Ok(())
}

async fn cmd_categories(config: &AppConfig) -> Result<()> {
    let directory = directory_client(config)?;
    let storage = open_storage(config).await?;
    let rows = category_overview(&directory, &storage).await?;

    let columns = ["ID", "Name", "Type", "Featured"].map(String::from);
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.category.id.to_string(),
                row.category.name.clone(),
                row.category.category_type.clone().unwrap_or_default(),
                if row.featured { "yes".into() } else { String::new() },
            ]
        })
        .collect();
    println!("{}", format_table(&columns, &cells));
    Ok(())
}

async fn cmd_featured_show(config: &AppConfig) -> Result<()> {
    let storage = open_storage(config).await?;
    let featured = storage.load().await?;
    let updated_at = storage.featured_config_updated_at().await?;

    println!("Mode:       {}", featured.mode);
    if featured.allowed_category_ids.is_empty() {
        println!("Categories: none");
    } else {
        let ids: Vec<String> = featured
            .allowed_category_ids
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("Categories: {}", ids.join(", "));
    }
    if let Some(updated_at) = updated_at {
        println!("Updated:    {updated_at}");
    }
    Ok(())
}

async fn cmd_featured_assets(config: &AppConfig, json: bool) -> Result<()> {
    let directory = directory_client(config)?;
    let storage = open_storage(config).await?;

    let reporter = CliProgress::new();
    let list = AggregationPipeline::new(&storage, &directory, &config.display_properties)
        .with_page_limit(config.directory.page_limit)
        .build_featured_asset_list(&reporter)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if let Some(notice) = list.notice {
        println!("{}", notice.message());
        return Ok(());
    }

    for line in warning_lines(&list.warnings) {
        eprintln!("{line}");
    }
    if list.rows.is_empty() {
        println!("No assets found in the featured categories.");
    } else {
        println!("{}", format_table(&list.columns, &asset_cells(&list.rows)));
    }
    if list.skipped_without_id > 0 {
        println!("({} records without an id were skipped)", list.skipped_without_id);
    }
    Ok(())
}

async fn cmd_featured_set(config: &AppConfig, mode: AssignmentMode, ids: &[String]) -> Result<()> {
    let allowed_category_ids = ids
        .iter()
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| raw.parse::<CategoryId>())
        .collect::<checkio_shared::Result<Vec<_>>>()?;

    let directory = directory_client(config)?;
    let session = establish_session(config, &directory).await;
    let storage = open_storage(config).await?;

    let saved = configure_featured_categories(
        &storage,
        &session,
        FeaturedCategoryConfig {
            mode,
            allowed_category_ids,
        },
    )
    .await?;

    println!(
        "Featured categories saved: mode {}, {} categor{}.",
        saved.mode,
        saved.allowed_category_ids.len(),
        if saved.allowed_category_ids.len() == 1 { "y" } else { "ies" }
    );
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl AggregationProgress for CliProgress {
    fn category_started(&self, category_id: CategoryId, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching category {category_id} [{current}/{total}]"));
    }

    fn category_failed(&self, warning: &CategoryWarning) {
        self.spinner
            .set_message(format!("Category {} failed", warning.category_id));
    }

    fn done(&self, _list: &FeaturedAssetList) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn featured_set_parses_mode_and_ids() {
        let cli = Cli::try_parse_from(["checkio", "featured", "set", "--mode", "fixed", "--ids", "3,7"])
            .expect("parse");
        match cli.command {
            Command::Featured {
                action: FeaturedAction::Set { mode, ids },
            } => {
                assert_eq!(AssignmentMode::from(mode), AssignmentMode::Fixed);
                assert_eq!(ids, vec!["3", "7"]);
            }
            _ => panic!("expected featured set"),
        }
    }

    #[test]
    fn featured_set_rejects_unknown_mode() {
        let err = Cli::try_parse_from(["checkio", "featured", "set", "--mode", "sometimes"])
            .err()
            .expect("unknown mode must be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
