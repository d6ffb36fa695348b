use anyhow::Result;
use caskcheck::commands::{self, OutputFormat, config::ConfigOptions};
use caskcheck::discovery::DEFAULT_PATTERN;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// caskcheck - Cask manifest linter
///
/// Check package-manager cask records for missing stanzas, placeholder
/// values and malformed URLs before they are published.
///
/// If the GITHUB_TOKEN environment variable is set, it is sent with
/// `--online` probes to github.com to avoid rate limits.
///
/// Examples:
///   caskcheck audit Casks/            # Lint every *.rb file under Casks/
///   caskcheck url cola.rb -V 1.0.1    # Print the download URL for 1.0.1
#[derive(Parser, Debug)]
#[command(author, version = env!("CASKCHECK_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Lint cask files and report whether they can be published
    Audit(AuditArgs),

    /// Print a parsed cask record
    Show(ShowArgs),

    /// Print the download URL of a cask with the version substituted
    Url(UrlArgs),
}

#[derive(clap::Args, Debug)]
pub struct AuditArgs {
    /// Cask files or directories to check
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Treat `sha256 :no_check` as an error
    #[arg(long, env = "CASKCHECK_STRICT")]
    pub strict: bool,

    /// Check that the download URL and homepage answer
    #[arg(long)]
    pub online: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// File-name pattern used inside directories
    #[arg(long, env = "CASKCHECK_PATTERN", default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// Additional placeholder host (repeatable, comma separated in the env var)
    #[arg(
        long = "placeholder-host",
        value_name = "HOST",
        env = "CASKCHECK_PLACEHOLDER_HOSTS",
        value_delimiter = ','
    )]
    pub placeholder_hosts: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// The cask file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct UrlArgs {
    /// The cask file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Substitute this version instead of the record's own
    #[arg(long = "version", short = 'V', value_name = "VERSION")]
    pub version: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    let runtime = caskcheck::runtime::RealRuntime;

    match cli.command {
        Commands::Audit(args) => {
            let options = ConfigOptions {
                strict: args.strict,
                online: args.online,
                pattern: args.pattern,
                placeholder_hosts: args.placeholder_hosts,
            };
            let config = commands::config::Config::new(&runtime, options)?;
            let publishable = commands::audit(&runtime, &config, &args.paths, args.format).await?;
            if !publishable {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Show(args) => commands::show(&runtime, &args.file, args.format)?,
        Commands::Url(args) => commands::url(&runtime, &args.file, args.version.as_deref())?,
    }
    Ok(ExitCode::SUCCESS)
}
