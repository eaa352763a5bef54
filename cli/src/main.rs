use anyhow::Result;
use clap::{Parser, Subcommand};
use nessi_core::pipeline::run_category;
use nessi_core::report::{rarity_distribution, sample_line};
use nessi_core::{ItemRecord, ItemType};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "nessi",
    version = "0.1.0",
    about = "Convert item catalog dumps into normalized JSON records",
    long_about = None
)]
struct Cli {
    /// Path to log file
    #[arg(long, global = true, default_value = "/tmp/nessi-tools.log")]
    log_file: std::path::PathBuf,

    /// Verbosity level (repeat for more verbose output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct CategoryArgs {
    /// Raw dump to parse
    #[arg(long, default_value = "inbound.txt")]
    input: std::path::PathBuf,

    /// JSON price table
    #[arg(long, default_value = "priceTable.json")]
    price_table: std::path::PathBuf,

    /// Output JSON file (defaults to <category>.json)
    #[arg(long)]
    output: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a weapon dump
    Weapons(CategoryArgs),
    /// Parse a wand dump
    Wands(CategoryArgs),
    /// Parse a staff dump
    Staffs(CategoryArgs),
    /// Parse a wondrous-item dump
    Wondrous(CategoryArgs),
    /// Parse all four category dumps from one directory
    All {
        /// Directory holding weapons.txt, wands.txt, staffs.txt, wondrous.txt
        #[arg(long, default_value = ".")]
        input_dir: std::path::PathBuf,

        /// JSON price table
        #[arg(long, default_value = "priceTable.json")]
        price_table: std::path::PathBuf,

        /// Directory for the output JSON files
        #[arg(long, default_value = ".")]
        output_dir: std::path::PathBuf,
    },
}

fn setup_logging(
    verbose: u8,
    log_file: &std::path::Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter_level = match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(filter_level.into());

    let file_appender = tracing_appender::rolling::never(
        log_file.parent().unwrap_or(std::path::Path::new(".")),
        log_file.file_name().unwrap_or(std::ffi::OsStr::new("nessi.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().with_writer(std::io::stderr).with_ansi(true))
        .with(fmt::Layer::new().with_writer(non_blocking).with_ansi(false));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

fn default_output(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Weapon => "weapons.json",
        ItemType::Wand => "wands.json",
        ItemType::Staff => "staffs.json",
        ItemType::WondrousItem => "wondrous.json",
    }
}

fn default_input(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Weapon => "weapons.txt",
        ItemType::Wand => "wands.txt",
        ItemType::Staff => "staffs.txt",
        ItemType::WondrousItem => "wondrous.txt",
    }
}

fn run_one(item_type: ItemType, args: CategoryArgs) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| std::path::PathBuf::from(default_output(item_type)));
    let records = run_category(item_type, &args.input, &args.price_table, &output)?;
    summarize(item_type, &records);
    Ok(())
}

fn summarize(item_type: ItemType, records: &[ItemRecord]) {
    info!("Parsed {} {} records", records.len(), item_type);
    for (rarity, count) in rarity_distribution(records) {
        info!("  {}: {}", rarity, count);
    }
    for record in records.iter().take(3) {
        info!("  sample: {}", sample_line(record));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(cli.verbose, &cli.log_file)?;

    info!("Starting nessi CLI");

    match cli.command {
        Commands::Weapons(args) => run_one(ItemType::Weapon, args)?,
        Commands::Wands(args) => run_one(ItemType::Wand, args)?,
        Commands::Staffs(args) => run_one(ItemType::Staff, args)?,
        Commands::Wondrous(args) => run_one(ItemType::WondrousItem, args)?,
        Commands::All {
            input_dir,
            price_table,
            output_dir,
        } => {
            for item_type in [
                ItemType::Weapon,
                ItemType::Wand,
                ItemType::Staff,
                ItemType::WondrousItem,
            ] {
                let input = input_dir.join(default_input(item_type));
                let output = output_dir.join(default_output(item_type));
                let records = run_category(item_type, &input, &price_table, &output)?;
                summarize(item_type, &records);
            }
        }
    }

    info!("Nessi CLI finished");
    Ok(())
}
