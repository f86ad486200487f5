use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ghost_imports::analysis::analyze;
use ghost_imports::config::{discover_config, AnalysisConfig, ConfigFile};
use ghost_imports::export::{export, ReportFormat};
use ghost_imports::fix::{
    fix_workspaces, CachingRegistryClient, InstalledVersions, NpmRegistryClient,
};

#[derive(Parser)]
#[command(name = "ghost-imports")]
#[command(author = "Zachary Woods <143150513+zach-fau@users.noreply.github.com>")]
#[command(version, about = "Finds unused and undeclared dependencies in JavaScript/TypeScript projects", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report unused and undeclared dependencies
    Validate(ValidateArgs),
    /// Show version information
    Version,
}

#[derive(Args)]
struct ValidateArgs {
    /// Directory to analyze (defaults to current directory)
    path: Option<PathBuf>,

    /// Directory to analyze; takes precedence over PATH
    #[arg(long, value_name = "DIR")]
    cwd: Option<PathBuf>,

    /// Only scan source files matching this glob (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    include: Vec<String>,

    /// Never scan source files matching this glob (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Treat files matching this glob as development-only (repeatable)
    #[arg(long = "dev", value_name = "GLOB")]
    dev: Vec<String>,

    /// Never report packages matching this glob as unused (repeatable)
    #[arg(long = "exclude-package", value_name = "NAME")]
    exclude_package: Vec<String>,

    /// Always add packages matching this glob as peer dependencies (repeatable)
    #[arg(long = "always-peer", value_name = "NAME")]
    always_peer: Vec<String>,

    /// Leave the monorepo root out of the analysis
    #[arg(long)]
    skip_root: bool,

    /// Rewrite package.json files to fix the findings
    #[arg(long)]
    fix: bool,

    /// Registry used to resolve versions when fixing
    #[arg(long, value_name = "URL")]
    registry: Option<String>,

    /// Output format: text or json
    #[arg(short, long, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Exit with status 1 when anything is reported
    #[arg(long)]
    strict: bool,
}

impl ValidateArgs {
    fn directory(&self) -> PathBuf {
        self.cwd
            .clone()
            .or_else(|| self.path.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Command-line values that override the configuration file.
    fn overrides(&self) -> ConfigFile {
        fn list(values: &[String]) -> Option<Vec<String>> {
            (!values.is_empty()).then(|| values.to_vec())
        }

        ConfigFile {
            include_files: list(&self.include),
            exclude_files: list(&self.exclude),
            dev_files: list(&self.dev),
            exclude_packages: list(&self.exclude_package),
            always_peer_dependencies: list(&self.always_peer),
            fix: self.fix.then_some(true),
            skip_root: self.skip_root.then_some(true),
            registry_url: self.registry.clone(),
            ..Default::default()
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "ghost_imports=warn",
        1 => "ghost_imports=info",
        _ => "ghost_imports=debug",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

async fn validate(args: ValidateArgs) -> anyhow::Result<ExitCode> {
    let cwd = args.directory();

    let file = discover_config(&cwd)
        .with_context(|| format!("Failed to load configuration in {}", cwd.display()))?;
    let config = AnalysisConfig::resolve(file, args.overrides());
    tracing::debug!(?config, "effective configuration");

    let analysis = analyze(&cwd, &config)
        .await
        .with_context(|| format!("Failed to analyze {}", cwd.display()))?;

    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        export(args.format, &analysis.report, &mut out).context("Failed to write report")?;
    }

    if config.fix {
        let installed = InstalledVersions::crawl(analysis.project.cwd())
            .context("Failed to read installed packages")?;
        let registry = CachingRegistryClient::new(
            NpmRegistryClient::new(&config.registry_url).context("Failed to create registry client")?,
        );

        let summary = fix_workspaces(&analysis, &installed, &registry)
            .await
            .context("Failed to fix manifests")?;

        if args.format == ReportFormat::Text {
            for fix in &summary.workspaces {
                println!(
                    "({}) added {} packages and removed {}.",
                    fix.workspace,
                    fix.added.len(),
                    fix.removed.len()
                );
            }
        }
    }

    if args.strict && analysis.report.has_findings() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Validate(args)) => validate(args).await,
        Some(Commands::Version) => {
            println!("ghost-imports v{}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("ghost-imports - dependency drift finder");
            println!("Run 'ghost-imports validate' to analyze the current project");
            println!("Run 'ghost-imports --help' for more information");
            Ok(ExitCode::SUCCESS)
        }
    }
}
