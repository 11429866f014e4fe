use anyhow::Result;
use clap::Parser;
use pkglink::commands;
use pkglink::config::ConfigOverrides;
use std::path::PathBuf;

/// pkglink - link working copies of packages into a project
///
/// Replaces installed dependencies with links to local working copies and
/// restores the released packages when the links are removed.
///
/// If the PKGLINK_AUTH_TOKEN environment variable is set, it is sent as a
/// bearer token when restoring packages from remote archives.
///
/// Examples:
///   pkglink link ../foo        # Link the working copy in ../foo
///   pkglink link '../libs/*'   # Link every package under ../libs
///   pkglink unlink ../foo      # Restore the installed release
#[derive(Parser, Debug)]
#[command(author, version = env!("PKGLINK_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory (defaults to the working directory)
    #[arg(
        long = "project",
        short = 'p',
        env = "PKGLINK_PROJECT",
        value_name = "PATH",
        global = true
    )]
    pub project: Option<PathBuf>,

    /// Directory installed packages live in (defaults to <project>/vendor)
    #[arg(
        long = "vendor-dir",
        env = "PKGLINK_VENDOR_DIR",
        value_name = "PATH",
        global = true
    )]
    pub vendor_dir: Option<PathBuf>,

    /// Registry file (defaults to <vendor-dir>/linked-packages.json)
    #[arg(
        long = "registry",
        env = "PKGLINK_REGISTRY",
        value_name = "PATH",
        global = true
    )]
    pub registry: Option<PathBuf>,

    /// Manifest file name looked up in each package directory
    #[arg(
        long = "manifest",
        env = "PKGLINK_MANIFEST",
        value_name = "NAME",
        global = true
    )]
    pub manifest: Option<String>,

    /// Increase log output (-v for info, -vv for debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Link one or more local packages into the project
    Link(LinkArgs),

    /// Remove links and restore the original packages
    Unlink(UnlinkArgs),

    /// Remove every link
    UnlinkAll,

    /// List linked packages
    Linked,

    /// Re-apply links replaced by a dependency install
    Sync,
}

#[derive(clap::Args, Debug)]
pub struct LinkArgs {
    /// Package directories, wildcards allowed
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,

    /// Do not pull in the linked package's own requirements
    #[arg(long = "without-dependencies")]
    pub without_dependencies: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnlinkArgs {
    /// Package directories, wildcards allowed
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            project: self.project.clone(),
            vendor_dir: self.vendor_dir.clone(),
            registry: self.registry.clone(),
            manifest: self.manifest.clone(),
        }
    }

    fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();
    let runtime = pkglink::runtime::RealRuntime;
    let overrides = cli.overrides();

    match cli.command {
        Commands::Link(args) => {
            commands::link(runtime, &args.paths, args.without_dependencies, overrides)?
        }
        Commands::Unlink(args) => commands::unlink(runtime, &args.paths, overrides).await?,
        Commands::UnlinkAll => commands::unlink_all(runtime, overrides).await?,
        Commands::Linked => commands::linked(runtime, overrides)?,
        Commands::Sync => commands::sync(runtime, overrides)?,
    }
    Ok(())
}
