//! Clap derive structures for the `partnerdash` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// partnerdash -- manage your Psiehlavičky Partner shops from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "partnerdash",
    version,
    about = "Manage products and shops on the Psiehlavičky Partner dashboard",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Dashboard backend origin (overrides config)
    #[arg(long, env = "PARTNERDASH_ORIGIN", global = true)]
    pub origin: Option<String>,

    /// Account email (overrides config)
    #[arg(long, short = 'e', env = "PARTNERDASH_EMAIL", global = true)]
    pub email: Option<String>,

    /// Config file to use instead of the platform default
    #[arg(long, env = "PARTNERDASH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', env = "PARTNERDASH_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "PARTNERDASH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output, Color & Log Enums ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and check the credentials
    Login(LoginArgs),

    /// End the server session
    Logout,

    /// Show the signed-in user, roles and permissions
    Whoami,

    /// Navigate to a dashboard route and report the guard's decision
    #[command(alias = "nav")]
    Navigate(NavigateArgs),

    /// List dashboard routes and their access requirements
    Routes,

    /// Manage products
    #[command(alias = "p")]
    Products(ProductsArgs),

    /// Manage shops
    Shops(ShopsArgs),

    /// Product tags, delivery times and stock statuses
    Catalog(CatalogArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Store the password in the system keyring after a successful sign-in
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct NavigateArgs {
    /// Route path, e.g. /shops or /product/edit/12
    pub path: String,

    /// Navigate without signing in first
    #[arg(long)]
    pub anonymous: bool,
}

// ── Products ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub command: ProductsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProductsCommand {
    /// List products
    #[command(alias = "ls")]
    List,

    /// Show one product
    Get { id: u64 },

    /// Create a product from a JSON file
    Create {
        #[arg(long, short = 'F')]
        from_file: PathBuf,
    },

    /// Update a product from a JSON file
    Update {
        id: u64,
        #[arg(long, short = 'F')]
        from_file: PathBuf,
        /// Push the changes to the storefront too
        #[arg(long)]
        publish: bool,
    },

    /// Delete a product
    #[command(alias = "rm")]
    Delete { id: u64 },

    /// Change a product's status
    Status {
        id: u64,
        /// Status identifier, e.g. "approved"
        status: String,
    },

    /// Publish a product to the storefront
    Publish { id: u64 },

    /// List a product's images
    Images { id: u64 },

    /// Upload image files to a product
    UploadImages {
        id: u64,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Make an image the product's main image
    SetMainImage { id: u64, image_id: u64 },

    /// Delete one of a product's images
    DeleteImage { id: u64, image_id: u64 },
}

// ── Shops ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ShopsArgs {
    #[command(subcommand)]
    pub command: ShopsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ShopsCommand {
    /// List shops
    #[command(alias = "ls")]
    List,

    /// Show one shop
    Get { id: u64 },
}

// ── Catalog ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    /// List product tags
    Tags,

    /// List delivery times
    DeliveryTimes,

    /// List stock statuses
    StockStatuses,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// Write a config file interactively
    Init,

    /// Store a password in the system keyring
    SetPassword,

    /// Remove a stored password from the system keyring
    ForgetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
