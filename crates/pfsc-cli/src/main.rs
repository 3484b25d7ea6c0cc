use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pfsc_build::{Builder, FixedRootCheckout, ScratchCopyCheckout};
use pfsc_core::{Libpath, Version};
use pfsc_write::FsWriteBackend;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pfsc", version, about = "Proofscape module build pipeline")]
struct Cli {
    /// Path to a TOML config file; falls back to `pfsc.toml` in the current
    /// directory if present, else built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build, write, and index a repo's module tree.
    Build(BuildArgs),
    /// Walk a checked-out repo and report which directories hold `.pfsc`
    /// modules, without building anything.
    Walk(WalkArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Dotted libpath of the repo root (e.g. `some.author.repo`).
    repopath: String,
    /// Checked-out working tree for the repo.
    path: PathBuf,
    /// Version to build: `WIP` or `vMAJOR.MINOR.PATCH`.
    #[arg(long, default_value = "WIP")]
    version: String,
    /// Also rebuild every submodule's content, not just changed ones.
    #[arg(long)]
    recursive: bool,
    /// Rebuild even if this process already built the same repo/version.
    #[arg(long)]
    force: bool,
    /// Copy `path` into a scratch directory before building, so a release
    /// build can't race a concurrent edit of the working tree.
    #[arg(long)]
    scratch: bool,
    /// Emit the build report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct WalkArgs {
    /// Dotted libpath of the repo root.
    repopath: String,
    /// Checked-out working tree for the repo.
    path: PathBuf,
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            2
        }
    };
    std::process::exit(exit_code);
}

fn load_config(explicit: Option<&PathBuf>) -> Result<pfsc_config::Config> {
    let path = explicit.cloned().or_else(|| {
        let candidate = PathBuf::from("pfsc.toml");
        candidate.is_file().then_some(candidate)
    });
    let config = match path {
        Some(path) => pfsc_config::Config::load_from_path(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => pfsc_config::Config::default(),
    };
    Ok(config.apply_env_overrides())
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Build(args) => {
            let repopath = Libpath::new(&args.repopath);
            let version = Version::parse(&args.version)
                .map_err(|e| anyhow::anyhow!("invalid --version {:?}: {e}", args.version))?;

            let write_backend = Arc::new(FsWriteBackend::new(config.build_root.clone()));
            let builder = if args.scratch {
                let scratch_parent = std::env::temp_dir();
                Builder::new(Arc::new(ScratchCopyCheckout::new(args.path.as_path(), scratch_parent)), write_backend)
            } else {
                Builder::new(Arc::new(FixedRootCheckout::new(args.path.as_path())), write_backend)
            };

            let report = builder.build_write_index(&repopath, version, args.recursive, args.force)?;

            if args.json {
                let useless_dirs: Vec<String> =
                    report.useless_dirs.iter().map(|p| p.display().to_string()).collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "repopath": report.repopath.as_str(),
                        "version": report.version.to_string(),
                        "modules_built": report.modules_built,
                        "useless_dirs": useless_dirs,
                    }))?
                );
            } else {
                println!("built {} at {}", report.repopath, report.version);
                println!("  modules_built: {}", report.modules_built);
                for dir in &report.useless_dirs {
                    println!("  useless_dir: {}", dir.display());
                }
            }
            Ok(0)
        }
        Command::Walk(args) => {
            let repopath = Libpath::new(&args.repopath);
            let report = pfsc_build::walk_modules(&args.path, &repopath, &Default::default())?;

            if args.json {
                let jobs: Vec<_> = report
                    .jobs
                    .iter()
                    .map(|j| {
                        serde_json::json!({
                            "libpath": j.libpath.as_str(),
                            "path": j.path.display().to_string(),
                            "is_dunder": j.is_dunder,
                        })
                    })
                    .collect();
                let useless_dirs: Vec<String> =
                    report.useless_dirs.iter().map(|p| p.display().to_string()).collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "jobs": jobs,
                        "useless_dirs": useless_dirs,
                    }))?
                );
            } else {
                for job in &report.jobs {
                    println!("{} -> {}", job.libpath, job.path.display());
                }
                for dir in &report.useless_dirs {
                    println!("useless_dir: {}", dir.display());
                }
            }
            Ok(0)
        }
    }
}
