use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Parser)]
enum Cmd {
    /// Build msprof and lay out `bin/` + `profiler_tool/analysis/msprof/`
    Dist {
        /// Install root
        #[arg(long, default_value = "target/dist")]
        out: PathBuf,
        /// Directory holding the analysis backend (must contain msprof.py)
        #[arg(long)]
        analysis: Option<PathBuf>,
        #[arg(long)]
        debug: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Cmd::Dist { out, analysis, debug } => dist(&out, analysis.as_deref(), debug)?,
    }

    Ok(())
}

fn dist(out: &Path, analysis: Option<&Path>, debug: bool) -> Result<()> {
    let profile = if debug { "debug" } else { "release" };
    let mut cmd = Command::new("cargo");
    cmd.arg("build").arg("--package").arg("msprof");
    if !debug {
        cmd.arg("--release");
    }

    let status = cmd.status().context("Failed to build msprof")?;
    if !status.success() {
        anyhow::bail!("Failed to build msprof");
    }

    let bin_dir = out.join("bin");
    fs::create_dir_all(&bin_dir).with_context(|| format!("Failed to create {}", bin_dir.display()))?;
    let built = Path::new("target").join(profile).join("msprof");
    fs::copy(&built, bin_dir.join("msprof")).with_context(|| format!("Failed to copy {}", built.display()))?;

    let backend_dir = out.join("profiler_tool/analysis/msprof");
    fs::create_dir_all(&backend_dir).with_context(|| format!("Failed to create {}", backend_dir.display()))?;
    match analysis {
        Some(src) => copy_backend(src, &backend_dir)?,
        None => println!("  (no --analysis given, backend directory left empty)"),
    }

    println!("✓ msprof install tree ready");
    println!("  Root: {}", out.display());
    println!("  Profile: {profile}");

    Ok(())
}

fn copy_backend(src: &Path, dst: &Path) -> Result<()> {
    let script = src.join("msprof.py");
    if !script.is_file() {
        anyhow::bail!("{} not found", script.display());
    }
    for entry in fs::read_dir(src).with_context(|| format!("Failed to read {}", src.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            fs::copy(entry.path(), dst.join(entry.file_name()))?;
        }
    }
    // The analysis environment check requires an executable entry script
    fs::set_permissions(dst.join("msprof.py"), fs::Permissions::from_mode(0o755))?;
    Ok(())
}
