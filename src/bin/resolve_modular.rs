//! `resolve-modular` — drives the library's `resolve` entry point from a
//! TOML config file or from plain repeated flags, installs `env_logger`
//! as the library's logging sink, and maps the outcome to an exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rpm_modular_resolve::config::ResolveConfig;
use rpm_modular_resolve::repository::{InMemoryRepoLoader, RepoDescriptor, RepoDescriptorKind};
use rpm_modular_resolve::{resolve, Error, ResolveRequest};

/// Resolve a modular RPM dependency request against one or more
/// repositories.
#[derive(Debug, Parser)]
#[clap(about = "Modular RPM dependency resolution driver", author, version)]
struct Cli {
    /// Load the full invocation from a TOML config file instead of flags.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target architecture (ignored when `--config` is given).
    #[arg(long, default_value = "x86_64")]
    arch: String,

    /// Default stream of the synthetic platform module.
    #[arg(long)]
    platform: Option<String>,

    /// A repo descriptor as `id:type:path`; may be repeated.
    #[arg(long = "repo", value_name = "ID:TYPE:PATH")]
    repos: Vec<String>,

    /// An exclude specifier; may be repeated.
    #[arg(long = "exclude")]
    excludes: Vec<String>,

    /// A solvable specifier or `@file`; may be repeated.
    #[arg(value_name = "SPECIFIER")]
    solvables: Vec<String>,
}

fn parse_repo_flag(raw: &str) -> Result<RepoDescriptor, String> {
    let mut parts = raw.splitn(3, ':');
    let (Some(id), Some(kind), Some(path)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("malformed --repo value {raw:?}, expected id:type:path"));
    };
    let kind = RepoDescriptorKind::parse(kind).map_err(|e| e.to_string())?;
    Ok(RepoDescriptor {
        id: id.to_string(),
        kind,
        path: path.to_string(),
    })
}

fn build_request(cli: &Cli) -> Result<ResolveRequest, String> {
    if let Some(path) = &cli.config {
        let contents = std::fs::read_to_string(path).map_err(|e| format!("reading {path:?}: {e}"))?;
        let config: ResolveConfig = toml::from_str(&contents).map_err(|e| format!("parsing {path:?}: {e}"))?;
        return config.into_request().map_err(|e| e.to_string());
    }

    let repos = cli
        .repos
        .iter()
        .map(|r| parse_repo_flag(r))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResolveRequest {
        arch: cli.arch.clone(),
        platform: cli.platform.clone(),
        excludes: cli.excludes.clone(),
        repos,
        solvables: cli.solvables.clone(),
    })
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let request = match build_request(&cli) {
        Ok(request) => request,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    // The CLI only drives in-memory fixtures loaded straight out of the
    // config; a production front-end would swap this for a loader that
    // parses repomd/modulemd from `RepoDescriptor::path`.
    let loader = InMemoryRepoLoader::new();

    match resolve(&request, &loader) {
        Ok(outcome) => {
            for line in &outcome.results {
                println!("{line}");
            }
            for warning in &outcome.warnings {
                eprintln!("{warning}");
            }
            // Partial failure is soft per spec: still exit 0, the warning
            // above is the user-visible signal.
            ExitCode::SUCCESS
        }
        Err(Error::Input(err)) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
