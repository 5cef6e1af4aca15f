use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use git_autoversion::config;
use git_autoversion::git::Git2Repository;
use git_autoversion::ui;
use git_autoversion::{ProjectContext, VersionResolver};

#[derive(clap::Parser)]
#[command(
    name = "git-autoversion",
    version,
    about = "Compute a project version from git tags and repository state"
)]
struct Args {
    #[arg(short, long, default_value = ".", help = "Project directory inside the repository")]
    path: PathBuf,

    #[arg(short, long, help = "Folder of the project's own tags (defaults to the project path)")]
    scope: Option<String>,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, help = "Explain how the version was resolved")]
    explain: bool,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = config::load_config(args.config.as_deref())?;

    let repo = Git2Repository::open(&args.path)?;
    let path = repo.relative_path(&args.path)?;
    let scope = args.scope.clone().or_else(|| path.clone());
    tracing::debug!(path = ?path, scope = ?scope, "resolved project location");

    let project = ProjectContext::new(path.as_deref(), scope.as_deref());
    let resolver = VersionResolver::new(&repo, project, &config);
    let resolution = resolver.resolve()?;

    if args.explain {
        ui::print_explanation(&resolution);
    } else {
        ui::print_version(&resolution);
    }

    Ok(())
}
