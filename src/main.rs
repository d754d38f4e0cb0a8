use anyhow::Result;
use bowl::commands::{ConfigOverrides, install};
use clap::Parser;
use std::path::PathBuf;

/// bowl - front-end package installer
///
/// Installs packages listed in the bower registry from their GitHub tags.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
///
/// Examples:
///   bowl install                 # Install every dependency in ./bower.json
///   bowl install jquery          # Install the latest jquery
///   bowl install -S jquery#~2.1  # Install jquery 2.1.x and save it to bower.json
#[derive(Parser, Debug)]
#[command(author, version = env!("BOWL_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory containing bower.json (defaults to the current directory)
    #[arg(long = "cwd", value_name = "PATH", global = true)]
    pub cwd: Option<PathBuf>,

    /// Directory for downloaded archives
    #[arg(long = "cache-dir", env = "BOWL_CACHE_DIR", value_name = "PATH", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Bower registry URL (defaults to https://registry.bower.io)
    #[arg(long = "registry-url", env = "BOWL_REGISTRY_URL", value_name = "URL", global = true)]
    pub registry_url: Option<String>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", env = "BOWL_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install the project dependencies from bower.json, or a single package
    Install(InstallArgs),
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Add the installed package to bower.json (only if bower.json already exists)
    #[arg(long, short = 'S')]
    pub save: bool,

    /// Package to install, optionally with a version constraint
    #[arg(value_name = "PACKAGE[#VERSION]")]
    pub package: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = bowl::runtime::RealRuntime;

    let overrides = ConfigOverrides {
        cwd: cli.cwd,
        cache_dir: cli.cache_dir,
        registry_url: cli.registry_url,
        api_url: cli.api_url,
    };

    let code = match cli.command {
        Commands::Install(args) => {
            install(runtime, args.package.as_deref(), args.save, overrides).await?
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
