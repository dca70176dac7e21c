mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vinfo_lib::Credentials;
use vinfo_lib::config::{DOMAIN_ENV, PASSWORD_ENV, USERNAME_ENV};
use vinfo_lib::manifest::DEFAULT_ENCODING;

use cmd::*;
use output::{OutputFormat, print_error};

/// vinfo - build manifest (versioninfo.xml) tooling
#[derive(Parser)]
#[command(name = "vinfo")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Text encoding of written manifests, also named in their XML declaration
  #[arg(long, global = true, default_value = DEFAULT_ENCODING)]
  encoding: String,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Write a new manifest holding a single build
  Create {
    product: String,
    version: String,
    /// Build number, e.g. 20080311.m.154
    build: String,

    /// Manifest to write (replaced if present)
    #[arg(short, long, default_value = "versioninfo.xml")]
    output: PathBuf,
  },

  /// Print "version build" for each matching build
  Versions {
    /// Manifest file or inline XML
    source: String,

    #[arg(short, long)]
    product: Option<String>,
  },

  /// Print the timestamp of each matching build
  Dates {
    /// Manifest file or inline XML
    source: String,

    #[arg(short, long)]
    product: Option<String>,
  },

  /// Print the target of the first build
  Target {
    /// Manifest file or inline XML
    source: String,
  },

  /// Print the files recorded in the first build
  Files {
    /// Manifest file or inline XML
    source: String,
  },

  /// Summarize every build in a manifest
  Show {
    /// Manifest file or inline XML
    source: String,

    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Merge builds from another manifest into the first build
  AddComponent {
    /// Manifest to update
    manifest: PathBuf,
    /// Manifest to take builds from
    source: PathBuf,

    /// Only take builds of this product
    #[arg(short, long)]
    product: Option<String>,

    /// Record as direct components instead of components
    #[arg(long)]
    direct: bool,

    /// Drop nested components from the source first
    #[arg(long)]
    prune: bool,
  },

  /// Record the files under a directory in the first build
  AddFiles {
    /// Manifest to update
    manifest: PathBuf,
    /// Directory to scan
    dir: PathBuf,
  },

  /// Copy a file or directory from a location
  Fetch {
    /// Location URI, e.g. smb://server/volume/path
    uri: String,
    /// Path relative to the location
    remote: String,
    /// Local destination
    local: PathBuf,

    #[command(flatten)]
    credentials: CredentialArgs,
  },

  /// Copy a file or directory to a location
  Publish {
    /// Location URI, e.g. smb://server/volume/path
    uri: String,
    /// Local source
    local: PathBuf,
    /// Path relative to the location
    remote: String,

    #[command(flatten)]
    credentials: CredentialArgs,
  },
}

#[derive(Args)]
struct CredentialArgs {
  #[arg(long, env = USERNAME_ENV)]
  username: Option<String>,

  #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
  password: Option<String>,

  #[arg(long, env = DOMAIN_ENV)]
  domain: Option<String>,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let encoding = cli.encoding.as_str();
  let result = match cli.command {
    Commands::Create {
      product,
      version,
      build,
      output,
    } => cmd_create(&product, &version, &build, &output, encoding),
    Commands::Versions { source, product } => cmd_versions(&source, product.as_deref()),
    Commands::Dates { source, product } => cmd_dates(&source, product.as_deref()),
    Commands::Target { source } => cmd_target(&source),
    Commands::Files { source } => cmd_files(&source),
    Commands::Show { source, format } => cmd_show(&source, format),
    Commands::AddComponent {
      manifest,
      source,
      product,
      direct,
      prune,
    } => cmd_add_component(
      &manifest,
      &source,
      &ComponentOptions {
        product: product.as_deref(),
        direct,
        prune,
      },
      encoding,
    ),
    Commands::AddFiles { manifest, dir } => cmd_add_files(&manifest, &dir, encoding),
    Commands::Fetch {
      uri,
      remote,
      local,
      credentials,
    } => credentials
      .resolve()
      .and_then(|creds| cmd_fetch(&uri, &remote, &local, &creds)),
    Commands::Publish {
      uri,
      local,
      remote,
      credentials,
    } => credentials
      .resolve()
      .and_then(|creds| cmd_publish(&uri, &local, &remote, &creds)),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}

impl CredentialArgs {
  fn resolve(self) -> anyhow::Result<Credentials> {
    Ok(Credentials::resolve(self.username, self.password, self.domain)?)
  }
}
