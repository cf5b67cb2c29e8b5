///
/// This module implements the CLI interface for rspace: command parsing,
/// argument exposure, and the async entrypoint that wires a real HTTP client
/// to the command bodies in [`crate::commands`].
///
/// All business logic (scanning, submission, interrupt handling, formatting)
/// lives in the [`rspace-core`] crate.
///
/// ## How To Use
/// - For command-line users: use the installed `rspace` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`rspace-core`]: ../../rspace-core/
use crate::client::RsWebClient;
use crate::commands::{self, open_output};
use crate::load_config::load_config;
use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use rspace_core::bulk::BulkRequest;
use rspace_core::contract::{RecordListingConfig, SortOrder};
use rspace_core::format::OutputFormat;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for the RSpace electronic lab notebook.
#[derive(Parser, Debug)]
#[command(
    name = "rspace",
    version,
    about = "Command-line client for the RSpace ELN: bulk upload, Word import, user creation"
)]
pub struct Cli {
    /// Config file (default is $HOME/.rspace)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the RSpace server version and status
    Status,
    /// Work with the ELN: upload, import, list and create users
    Eln(ElnArgs),
}

#[derive(Args, Debug)]
pub struct ElnArgs {
    /// Output format: one of 'json', 'table', 'csv' or 'quiet'
    #[arg(short = 'f', long = "outputFormat", default_value = "table", global = true)]
    pub output_format: String,

    /// Output file for program output
    #[arg(short = 'o', long = "outFile", global = true)]
    pub out_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ElnCommands,
}

#[derive(Subcommand, Debug)]
pub enum ElnCommands {
    /// Upload files or folders of files to the Gallery
    Upload(UploadArgs),
    /// Import Word or OpenOffice files as native documents
    #[command(name = "importWord")]
    ImportWord(ImportArgs),
    /// Create a user, or many users from a CSV file (sysadmin only)
    #[command(name = "addUser")]
    AddUser(AddUserArgs),
    /// List Gallery files
    #[command(name = "listFiles")]
    ListFiles {
        /// Optional media type: 'image', 'document' or 'av'
        #[arg(long = "mediaType", value_parser = ["image", "document", "av"])]
        media_type: Option<String>,
        #[command(flatten)]
        listing: ListingArgs,
    },
    /// List documents
    #[command(name = "listDocuments")]
    ListDocuments {
        /// Search query term
        #[arg(long)]
        query: Option<String>,
        #[command(flatten)]
        listing: ListingArgs,
    },
}

/// Flags shared by the bulk file commands.
#[derive(Args, Debug, Clone)]
pub struct BulkArgs {
    /// Files or folders to process
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// If uploading a folder, uploads contents recursively
    #[arg(long)]
    pub recursive: bool,

    /// Reports what would be uploaded without uploading anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// File for the list of files that weren't uploaded; standard error if not set
    #[arg(long)]
    pub logfile: Option<PathBuf>,
}

impl BulkArgs {
    pub fn to_request(&self) -> BulkRequest {
        BulkRequest {
            paths: self.paths.clone(),
            recursive: self.recursive,
            dry_run: self.dry_run,
            logfile: self.logfile.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    #[command(flatten)]
    pub bulk: BulkArgs,

    /// Caption added to every uploaded file
    #[arg(long, default_value = "")]
    pub caption: String,

    /// ID of the target Gallery folder; the Api Inbox if not set
    #[arg(long)]
    pub folder: Option<i64>,

    /// Creates a summary document linking to the uploaded files
    #[arg(long = "add-summary")]
    pub add_summary: bool,

    /// Jinja template for the summary document
    #[arg(long = "summary-template")]
    pub summary_template: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub bulk: BulkArgs,

    /// ID of the target folder for imported Word files
    #[arg(long)]
    pub folder: Option<i64>,
}

#[derive(Args, Debug, Clone)]
pub struct AddUserArgs {
    #[arg(long)]
    pub username: Option<String>,

    /// Valid email address
    #[arg(long)]
    pub email: Option<String>,

    /// First name
    #[arg(long, default_value = "Unknown")]
    pub first: String,

    /// Last name
    #[arg(long, default_value = "Unknown")]
    pub last: String,

    /// Role, either 'pi' or 'user'
    #[arg(long, default_value = "user")]
    pub role: String,

    /// Affiliation (Community only)
    #[arg(long, default_value = "unknown")]
    pub affiliation: String,

    /// A file containing the password
    #[arg(long)]
    pub pwdfile: Option<PathBuf>,

    /// A CSV file of new users: first,last,email,role,username,password,affiliation,apiKey
    #[arg(long, conflicts_with_all = ["username", "email", "pwdfile"])]
    pub userfile: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ListingArgs {
    /// 'asc' or 'desc'; 'asc' by default when ordering by name, else 'desc'
    #[arg(long = "sortOrder", value_parser = ["asc", "desc"])]
    pub sort_order: Option<String>,

    /// 'name', 'created' or 'lastModified'
    #[arg(long = "orderBy", default_value = "lastModified", value_parser = ["name", "created", "lastModified"])]
    pub order_by: String,

    /// Maximum number of results to show
    #[arg(long = "maxResults", default_value_t = 20)]
    pub max_results: u32,
}

impl ListingArgs {
    pub fn to_config(&self) -> RecordListingConfig {
        let sort_order = match self.sort_order.as_deref() {
            Some("asc") => SortOrder::Asc,
            Some(_) => SortOrder::Desc,
            None if self.order_by == "name" => SortOrder::Asc,
            None => SortOrder::Desc,
        };
        RecordListingConfig {
            page_number: 0,
            page_size: self.max_results,
            order_by: self.order_by.clone(),
            sort_order,
        }
    }
}

fn client_from_config(config: Option<&std::path::Path>) -> Result<RsWebClient> {
    let config = load_config(config)?;
    RsWebClient::new(&config).map_err(|e| anyhow!("Could not create RSpace client: {e}"))
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Status => {
            let client = client_from_config(cli.config.as_deref())?;
            let mut out = open_output(OutputFormat::Table, None)?;
            commands::status(&client, &mut out).await
        }
        Commands::Eln(eln) => {
            // validated before any remote setup so a typo never touches the network
            let format: OutputFormat = eln.output_format.parse().map_err(|e: String| {
                tracing::error!(value = %eln.output_format, "Invalid output format");
                anyhow!(e)
            })?;
            let client = client_from_config(cli.config.as_deref())?;
            let mut out = open_output(format, eln.out_file.as_deref())?;
            tracing::info!(command = ?eln.command, %format, "Running eln command");
            match eln.command {
                ElnCommands::Upload(args) => commands::upload(&client, &args, &mut out).await,
                ElnCommands::ImportWord(args) => {
                    commands::import_word(&client, &args, &mut out).await
                }
                ElnCommands::AddUser(args) => {
                    commands::add_user(Arc::new(client), &args, &mut out).await
                }
                ElnCommands::ListFiles {
                    media_type,
                    listing,
                } => commands::list_files(&client, &listing, media_type, &mut out).await,
                ElnCommands::ListDocuments { query, listing } => {
                    commands::list_documents(&client, &listing, query, &mut out).await
                }
            }
        }
    }
}
