use clap::{Parser, Subcommand};
use std::process::ExitCode;

use stockdesk::commands::{
    ReportOptions, cmd_config_get, cmd_config_path, cmd_config_set, cmd_config_show, cmd_find,
    cmd_login, cmd_ls, cmd_report, cmd_set, cmd_show,
};
use stockdesk::config::Config;
use stockdesk::tickets::TicketPriority;
use stockdesk::types::ItemId;

#[derive(Parser)]
#[command(name = "stockdesk")]
#[command(about = "Inventory and issue tickets on a SharePoint site")]
#[command(version)]
struct Cli {
    /// Sign in as this user (default: $STOCKDESK_USERNAME)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the credentials can sign in to the site
    Login,

    /// List inventory items, one page at a time
    #[command(visible_alias = "l")]
    Ls {
        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Display field to filter on (e.g. Location)
        #[arg(short, long, requires = "value")]
        field: Option<String>,

        /// Substring the field must contain
        #[arg(short, long, requires = "field")]
        value: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display one item
    #[command(visible_alias = "s")]
    Show {
        /// Item ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find an item by serial number or name
    Find {
        /// Serial number or item name (substring)
        value: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update fields of an item
    Set {
        /// Item ID
        id: String,

        /// Changes as Field=Value (empty value clears the field)
        #[arg(required = true)]
        changes: Vec<String>,
    },

    /// Report an issue
    Report {
        /// Ticket title (default: "Issue with <item>" when --item is given)
        #[arg(short, long)]
        title: Option<String>,

        /// What is wrong
        #[arg(short, long)]
        description: String,

        /// Priority: Low, Medium, High
        #[arg(short, long, default_value = "Low", value_parser = parse_priority)]
        priority: TicketPriority,

        /// Inventory item the issue is about
        #[arg(short, long, value_parser = parse_item_id)]
        item: Option<ItemId>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the config file location
    Path,
    /// Set a configuration value
    Set {
        /// Key (e.g. site_url, auth.client_id, lists.inventory)
        key: String,
        /// Value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Key
        key: String,
    },
}

fn parse_priority(s: &str) -> Result<TicketPriority, String> {
    s.parse().map_err(|_| {
        let valid: Vec<&str> = TicketPriority::ALL.iter().map(|p| p.as_str()).collect();
        format!("Invalid priority. Must be one of: {}", valid.join(", "))
    })
}

fn parse_item_id(s: &str) -> Result<ItemId, String> {
    s.parse().map_err(|e| format!("{e}"))
}

/// Log to stderr. `RUST_LOG` wins over the configured level.
fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = Config::load()
            .map(|c| c.log_level)
            .unwrap_or_else(|_| "warn".to_string());
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging();

    let user = cli.user.as_deref();
    let result = match cli.command {
        Commands::Login => cmd_login(user).await,
        Commands::Ls {
            page,
            field,
            value,
            json,
        } => cmd_ls(user, page, field.as_deref(), value.as_deref(), json).await,
        Commands::Show { id, json } => cmd_show(user, &id, json).await,
        Commands::Find { value, json } => cmd_find(user, &value, json).await,
        Commands::Set { id, changes } => cmd_set(user, &id, &changes).await,
        Commands::Report {
            title,
            description,
            priority,
            item,
            json,
        } => {
            cmd_report(
                user,
                ReportOptions {
                    title,
                    description,
                    priority,
                    item,
                    json,
                },
            )
            .await
        }

        Commands::Config { action } => match action {
            ConfigAction::Show { json } => cmd_config_show(json),
            ConfigAction::Path => cmd_config_path(),
            ConfigAction::Set { key, value } => cmd_config_set(&key, &value),
            ConfigAction::Get { key } => cmd_config_get(&key),
        },
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
