use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use report::{ReportOptions, SortOrder};

mod config;
mod conversation;
mod debug_log;
mod grouper;
mod like_matrix;
mod loader;
mod participants;
mod report;
mod totals;
mod types;
mod utils;
mod week;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "dmstats")]
#[command(version)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    input: InputArgs,

    /// Output stats as JSON instead of the text summary
    #[arg(long)]
    json: bool,

    /// Use comma-separated number formatting
    #[arg(long)]
    number_comma: bool,

    /// Use human-readable number formatting (k, m, b, t)
    #[arg(short = 'H', long)]
    number_human: bool,

    /// Locale for number formatting (en, de, fr, es, it, ja, ko, zh)
    #[arg(long)]
    locale: Option<String>,

    /// Number of decimal places for human-readable formatting
    #[arg(long)]
    decimal_places: Option<usize>,
}

#[derive(Args, Clone)]
struct InputArgs {
    /// Username the export belongs to (overrides the config file)
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Path to the exported messages.json (overrides the config file)
    #[arg(short, long, global = true)]
    export: Option<PathBuf>,

    /// Only show the first N conversations
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// Conversation ordering
    #[arg(long, value_enum, default_value_t = SortOrder::Id, global = true)]
    sort: SortOrder,
}

#[derive(Subcommand)]
enum Commands {
    /// Output per-conversation statistics as JSON
    Stats(StatsArgs),
    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Args)]
struct StatsArgs {
    /// Include the full per-participant totals and like matrix
    #[arg(long, default_value_t = false)]
    include_totals: bool,

    /// Pretty-print JSON instead of a single line
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    subcommand: ConfigSubcommands,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Create default configuration file
    Init {
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key (username, export-path, number-comma, number-human, locale, decimal-places)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() {
    debug_log::init();
    let cli = Cli::parse();

    // Load config file to get defaults
    let config = config::Config::load().unwrap_or(None).unwrap_or_default();

    // Create format options merging config defaults with CLI overrides
    let defaults = config.format_options();
    let format_options = utils::NumberFormatOptions {
        use_comma: cli.number_comma || defaults.use_comma,
        use_human: cli.number_human || defaults.use_human,
        locale: cli.locale.unwrap_or(defaults.locale),
        decimal_places: cli.decimal_places.unwrap_or(defaults.decimal_places),
    };

    match cli.command {
        None => {
            let result = if cli.json {
                run_stats(
                    &config,
                    &cli.input,
                    StatsArgs {
                        include_totals: false,
                        pretty: true,
                    },
                )
            } else {
                run_default(&config, &cli.input, &format_options)
            };
            if let Err(e) = result {
                eprintln!("Error generating stats: {e:#}");
                std::process::exit(1);
            }
        }
        Some(Commands::Stats(stats_args)) => {
            if let Err(e) = run_stats(&config, &cli.input, stats_args) {
                eprintln!("Error generating JSON stats: {e:#}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config(config_args)) => {
            handle_config_subcommand(config_args);
        }
    }
}

/// Owner and export path after applying CLI overrides to the config file.
fn resolve_input(config: &config::Config, input: &InputArgs) -> Result<(String, PathBuf)> {
    let owner = match &input.username {
        Some(username) => username.trim().to_string(),
        None => config.owner.username.trim().to_string(),
    };
    if owner.is_empty() {
        anyhow::bail!(
            "No username given. Pass --username or run `dmstats config set username <name>`"
        );
    }

    let export = input
        .export
        .clone()
        .unwrap_or_else(|| config.export.path.clone());

    Ok((owner, export))
}

fn load_conversations(
    config: &config::Config,
    input: &InputArgs,
) -> Result<(String, Vec<conversation::ConversationAggregate>)> {
    let (owner, export) = resolve_input(config, input)?;
    let records = loader::load_export(&export).context("Failed to load export")?;
    let conversations = grouper::group_conversations(&records, &owner);
    Ok((owner, conversations))
}

fn run_default(
    config: &config::Config,
    input: &InputArgs,
    format_options: &utils::NumberFormatOptions,
) -> Result<()> {
    let (_, conversations) = load_conversations(config, input)?;

    if conversations.is_empty() {
        println!("No conversations found.");
        return Ok(());
    }

    let options = ReportOptions {
        sort: input.sort,
        limit: input.limit,
        include_totals: false,
    };
    let reports = report::build_reports(&conversations, &options);
    print!("{}", report::render_text_report(&reports, format_options));

    Ok(())
}

fn run_stats(config: &config::Config, input: &InputArgs, args: StatsArgs) -> Result<()> {
    let (owner, conversations) = load_conversations(config, input)?;

    let options = ReportOptions {
        sort: input.sort,
        limit: input.limit,
        include_totals: args.include_totals,
    };
    let output = report::build_stats_output(&owner, &conversations, &options);

    if args.pretty {
        let json = simd_json::to_string_pretty(&output)?;
        println!("{json}");
    } else {
        let json = simd_json::to_string(&output)?;
        println!("{json}");
    }

    Ok(())
}

fn handle_config_subcommand(config_args: ConfigArgs) {
    match config_args.subcommand {
        ConfigSubcommands::Init { overwrite } => {
            if let Err(e) = config::create_default_config(overwrite) {
                eprintln!("Error creating config: {e}");
                std::process::exit(1);
            }
        }
        ConfigSubcommands::Show => {
            if let Err(e) = config::show_config() {
                eprintln!("Error showing config: {e}");
                std::process::exit(1);
            }
        }
        ConfigSubcommands::Set { key, value } => {
            if let Err(e) = config::set_config_value(&key, &value) {
                eprintln!("Error setting config: {e}");
                std::process::exit(1);
            }
        }
    }
}
