//! `chtlc` - the CHTL compiler driver binary (spec §6.1).
//!
//! Thin glue over `chtl_compiler`: parses flags, builds a `CompilerConfig`,
//! calls into `chtl_compiler::driver`, and writes the resulting artifact to
//! disk. All compiler semantics live in the library; this binary only owns
//! process concerns (argv, exit codes, file writing, logging setup).

use chtl_compiler::config::{CompilerConfig, ProjectConfig};
use chtl_compiler::driver;
use chtl_compiler::output::Artifact;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "chtlc", version, about = "Compiles CHTL sources to HTML/CSS/JS")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Minify the emitted HTML/CSS/JS respectively.
    #[arg(long = "minify-html", global = true)]
    minify_html: bool,
    #[arg(long = "minify-css", global = true)]
    minify_css: bool,
    #[arg(long = "minify-js", global = true)]
    minify_js: bool,
    /// Emit a v3 source map alongside each artifact.
    #[arg(long = "source-map", global = true)]
    source_map: bool,
    /// Reserved for a future formatter pass; accepted so scripts that
    /// already pass it don't break.
    #[arg(long = "pretty", global = true)]
    pretty: bool,
    /// Abort the whole build on the first error instead of accumulating.
    #[arg(long, global = true)]
    strict: bool,
    /// Additional module search root, repeatable.
    #[arg(long = "module-path", global = true, value_name = "DIR")]
    module_path: Vec<PathBuf>,
    /// Additional source root to scan for `.chtl` files, repeatable
    /// (`build` subcommand only).
    #[arg(long = "include", global = true, value_name = "DIR")]
    include: Vec<PathBuf>,
    /// Project config file (defaults to `chtl.toml` in the current
    /// directory if present).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    verbose: bool,
    #[arg(long, global = true)]
    debug: bool,
    /// Parse and resolve without writing any output file.
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a single `.chtl` file.
    Compile {
        input: PathBuf,
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Compile every `.chtl` file under a project directory.
    Build { project: PathBuf },
    /// Recompile a directory's `.chtl` files whenever one changes.
    Watch { dir: PathBuf },
    /// Remove previously emitted artifacts next to their sources.
    Clean { dir: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("chtlc: {e}");
            return ExitCode::from(3);
        }
    };

    let result = match &cli.command {
        Commands::Compile { input, output } => run_compile(input, output.as_deref(), &config, cli.dry_run),
        Commands::Build { project } => run_build(project, &config, cli.dry_run),
        Commands::Watch { dir } => run_watch(dir, &config),
        Commands::Clean { dir } => run_clean(dir),
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(CliError::Compile(err)) => {
            eprintln!("chtlc: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
        Err(CliError::Usage(message)) => {
            eprintln!("chtlc: {message}");
            ExitCode::from(3)
        }
    }
}

enum CliError {
    Compile(chtl_compiler::CompileError),
    Usage(String),
}

impl From<chtl_compiler::CompileError> for CliError {
    fn from(err: chtl_compiler::CompileError) -> Self {
        CliError::Compile(err)
    }
}

/// `--debug` implies `trace`, `--verbose` implies `debug`, otherwise `warn`
/// (SPEC_FULL §10.2). The library never installs a logger itself; only the
/// binary does.
fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        log::LevelFilter::Trace
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new().filter_level(level).init();
}

/// Builds the effective `CompilerConfig` following SPEC_FULL §10.3's
/// precedence (defaults -> project `chtl.toml` -> CLI flags, later layers
/// win): the project file is folded in first, then CLI flags are applied on
/// top. CLI boolean flags are opt-in switches (there's no `--no-minify-css`),
/// so "apply on top" means OR-ing them in rather than overwriting wholesale —
/// a flag left unset on the command line must never turn off something the
/// project file turned on.
fn build_config(cli: &Cli) -> Result<CompilerConfig, String> {
    let mut config = CompilerConfig::default();

    let project_file = cli.config.clone().or_else(|| {
        let default = PathBuf::from("chtl.toml");
        default.exists().then_some(default)
    });
    if let Some(path) = project_file {
        let project = ProjectConfig::load(&path).map_err(|e| e.to_string())?;
        project.apply_to(&mut config);
    }

    config.debug = config.debug || cli.debug;
    config.strict = config.strict || cli.strict;
    config.module_paths.extend(cli.module_path.iter().cloned());
    config.module_paths.extend(cli.include.iter().cloned());
    config.merge.minify_html = config.merge.minify_html || cli.minify_html;
    config.merge.minify_css = config.merge.minify_css || cli.minify_css;
    config.merge.minify_js = config.merge.minify_js || cli.minify_js;
    config.merge.output_sourcemaps = config.merge.output_sourcemaps || cli.source_map;

    Ok(config)
}

fn run_compile(input: &Path, output: Option<&Path>, config: &CompilerConfig, dry_run: bool) -> Result<(), CliError> {
    let artifact = driver::compile_file(input, config)?;
    if dry_run {
        log::info!("dry run: {} compiled without writing output", input.display());
        return Ok(());
    }
    let target = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("html"));
    write_artifact(&target, &artifact).map_err(CliError::Usage)
}

fn run_build(project: &Path, config: &CompilerConfig, dry_run: bool) -> Result<(), CliError> {
    let artifacts = driver::compile_project(project, config)?;
    if dry_run {
        log::info!("dry run: {} file(s) compiled without writing output", artifacts.len());
        return Ok(());
    }
    for (source, artifact) in &artifacts {
        let target = source.with_extension("html");
        write_artifact(&target, artifact).map_err(CliError::Usage)?;
    }
    Ok(())
}

fn run_watch(dir: &Path, _config: &CompilerConfig) -> Result<(), CliError> {
    Err(CliError::Usage(format!(
        "watch mode is not implemented; rerun `chtlc build {}` after each change",
        dir.display()
    )))
}

/// Removes the `.html`/`.css`/`.js`/`.map` siblings `compile`/`build` would
/// have written next to each `.chtl` source found under `dir`.
fn run_clean(dir: &Path) -> Result<(), CliError> {
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let entries = std::fs::read_dir(&current)
            .map_err(|e| CliError::Usage(format!("cannot read `{}`: {e}", current.display())))?;
        for entry in entries {
            let entry = entry.map_err(|e| CliError::Usage(e.to_string()))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("chtl") {
                continue;
            }
            for ext in ["html", "css", "js"] {
                let sibling = path.with_extension(ext);
                if sibling.exists() {
                    std::fs::remove_file(&sibling)
                        .map_err(|e| CliError::Usage(format!("cannot remove `{}`: {e}", sibling.display())))?;
                }
            }
            let mut map_path = path.with_extension("html").into_os_string();
            map_path.push(".map");
            let map_path = PathBuf::from(map_path);
            if map_path.exists() {
                std::fs::remove_file(&map_path)
                    .map_err(|e| CliError::Usage(format!("cannot remove `{}`: {e}", map_path.display())))?;
            }
        }
    }
    Ok(())
}

fn write_artifact(target: &Path, artifact: &Artifact) -> Result<(), String> {
    std::fs::write(target, &artifact.html).map_err(|e| format!("cannot write `{}`: {e}", target.display()))?;
    if let Some(css) = &artifact.css_file {
        std::fs::write(target.with_extension("css"), css)
            .map_err(|e| format!("cannot write css sidecar: {e}"))?;
    }
    if let Some(js) = &artifact.js_file {
        std::fs::write(target.with_extension("js"), js).map_err(|e| format!("cannot write js sidecar: {e}"))?;
    }
    if let Some(map) = &artifact.html_source_map {
        let json = serde_json::to_string_pretty(map).map_err(|e| e.to_string())?;
        let mut map_path = target.as_os_str().to_owned();
        map_path.push(".map");
        std::fs::write(map_path, json).map_err(|e| format!("cannot write source map: {e}"))?;
    }
    Ok(())
}
