//! # Quiver CLI Application
//!
//! Command-line front end for quiver_core: live weight and FOC calculation,
//! a saved-build library file, presets, and reports.
//!
//! Every command accepts `--json` for machine-readable output.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quiver_core::errors::BuildError;

mod cmd;
mod interactive;
mod output;

use cmd::{ComponentArgs, Context, DraftArgs};

/// Exit status when the request itself was bad (weights, names, fields)
const EXIT_BAD_INPUT: u8 = 2;

/// Quiver - arrow build weight and balance calculator
#[derive(Parser)]
#[command(name = "quiver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Library file holding saved builds
    #[arg(long, global = true, env = "QUIVER_LIBRARY", default_value = "builds.qvr")]
    library: PathBuf,

    /// Principal that owns new builds and sees its own
    #[arg(long, global = true, env = "QUIVER_USER")]
    user: Option<String>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute total weight and FOC from component flags
    Calc {
        #[command(flatten)]
        components: ComponentArgs,
    },

    /// Total a JSON component list from a file or stdin
    Total {
        /// JSON file with an array of {name, grains}; stdin if omitted
        file: Option<PathBuf>,

        /// Reject non-numeric or negative weights instead of skipping them
        #[arg(long)]
        strict: bool,
    },

    /// Save a new build to the library
    Save {
        /// Build name
        #[arg(long)]
        name: Option<String>,

        /// Start from a preset (e.g. deer-medium)
        #[arg(long)]
        preset: Option<String>,

        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Change fields of a saved build
    Update {
        /// Build id or unique id prefix
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Delete a saved build
    Delete {
        /// Build id or unique id prefix
        id: String,
    },

    /// List saved builds, newest first
    List,

    /// Show one saved build
    Show {
        /// Build id or unique id prefix
        id: String,
    },

    /// Summary statistics over saved builds
    Stats,

    /// Compare up to 8 saved builds side by side
    Compare {
        /// Build ids or unique id prefixes
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List big-game presets
    Presets {
        /// Only presets for this animal
        #[arg(long)]
        animal: Option<String>,
    },

    /// Browse the component catalog
    Catalog {
        /// knock, fletching, shaft, insert or tip
        category: String,

        /// Filter by name or brand
        #[arg(long)]
        search: Option<String>,

        /// Length used to price shafts sold by GPI
        #[arg(long)]
        length: Option<f64>,
    },

    /// Export saved builds as JSON or text
    Export {
        /// Build ids or unique id prefixes; all visible builds if omitted
        ids: Vec<String>,

        /// json or text
        #[arg(long, default_value = "json")]
        format: cmd::ExportFormat,

        /// Write files into this directory instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show or change library settings
    Settings {
        /// strict or lenient handling of bad weights on save
        #[arg(long)]
        policy: Option<String>,

        /// Length used when a build omits one
        #[arg(long)]
        default_length: Option<f64>,
    },

    /// Selectable lengths for a build type
    Lengths {
        /// arrow or bolt
        build_type: String,

        /// Show where this length lands after switching to the type
        #[arg(long)]
        clamp: Option<f64>,
    },

    /// Prompt for components and recompute after every entry
    Interactive,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = Context {
        library_path: cli.library,
        user: cli.user,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Calc { components } => cmd::calc::cmd_calc(&ctx, &components),
        Commands::Total { file, strict } => cmd::calc::cmd_total(&ctx, file.as_deref(), strict),
        Commands::Save { name, preset, draft } => {
            cmd::library::cmd_save(&ctx, name.as_deref(), preset.as_deref(), &draft)
        }
        Commands::Update { id, name, draft } => cmd::library::cmd_update(&ctx, &id, name.as_deref(), &draft),
        Commands::Delete { id } => cmd::library::cmd_delete(&ctx, &id),
        Commands::List => cmd::library::cmd_list(&ctx),
        Commands::Show { id } => cmd::library::cmd_show(&ctx, &id),
        Commands::Stats => cmd::report::cmd_stats(&ctx),
        Commands::Compare { ids } => cmd::report::cmd_compare(&ctx, &ids),
        Commands::Presets { animal } => cmd::reference::cmd_presets(&ctx, animal.as_deref()),
        Commands::Catalog { category, search, length } => {
            cmd::reference::cmd_catalog(&ctx, &category, search.as_deref(), length)
        }
        Commands::Export { ids, format, out } => cmd::report::cmd_export(&ctx, &ids, format, out.as_deref()),
        Commands::Settings { policy, default_length } => {
            cmd::library::cmd_settings(&ctx, policy.as_deref(), default_length)
        }
        Commands::Lengths { build_type, clamp } => cmd::calc::cmd_lengths(&ctx, &build_type, clamp),
        Commands::Interactive => interactive::cmd_interactive(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let build_error = e.downcast_ref::<BuildError>();
            if ctx.json {
                if let Some(json) = build_error.and_then(|b| serde_json::to_string_pretty(b).ok()) {
                    eprintln!("{}", json);
                }
            }
            match build_error {
                Some(b) if b.is_client_error() => ExitCode::from(EXIT_BAD_INPUT),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
