//! Command-line interface for callscope.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::analysis::AnalysisContext;
use crate::config::{Config, ModuleCallPolicy, DEFAULT_CONFIG_NAMES, DEFAULT_CONFIG_TEMPLATE};
use crate::discover;
use crate::report;
use crate::summary::Summary;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Scope-aware call relationship extraction for Python code.
///
/// Callscope records which function, method or class calls which callee,
/// ranks the most called names and the biggest orchestrators, and lists the
/// classes, functions and imports it finds.
#[derive(Parser)]
#[command(name = "callscope")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a Python file or directory
    Analyze(AnalyzeArgs),
    /// Write a default callscope.yaml
    Init(InitArgs),
}

/// Output format for the analyze command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Path to analyze (file or directory)
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Also write entities.json, relationships.json, summary.md and
    /// diagram.mermaid into this directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Rows in the most-called and orchestrator tables
    #[arg(short, long)]
    pub top: Option<usize>,

    /// How module-level calls count in the orchestrator table
    #[arg(long, value_enum)]
    pub module_calls: Option<ModuleCallPolicy>,

    /// Analyze test files
    #[arg(long, conflicts_with = "exclude_tests")]
    pub include_tests: bool,

    /// Skip test files
    #[arg(long)]
    pub exclude_tests: bool,

    /// Worker threads (1 disables parallel analysis)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "callscope.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Load the config named on the command line, or discover one in the
/// current directory. No file means defaults.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => Config::discover(Path::new(".")),
    };
    match path {
        Some(p) => {
            let config = Config::parse_file(&p)?;
            tracing::info!(path = %p.display(), "loaded config");
            Ok(config)
        }
        None => {
            tracing::debug!(
                "no config found (looked for {}), using defaults",
                DEFAULT_CONFIG_NAMES.join(", ")
            );
            Ok(Config::default())
        }
    }
}

/// Command-line flags take precedence over config file values.
pub fn apply_overrides(config: &mut Config, args: &AnalyzeArgs) {
    if let Some(top) = args.top {
        config.top_n = Some(top);
    }
    if let Some(policy) = args.module_calls {
        config.module_calls = Some(policy);
    }
    if args.include_tests {
        config.include_test_files = Some(true);
    }
    if args.exclude_tests {
        config.include_test_files = Some(false);
    }
    if let Some(jobs) = args.jobs {
        config.parallel = Some(jobs > 1);
    }
}

/// Directory reported paths are relative to.
///
/// The parent of the analyzed path, so a package root shows up as
/// `pkg/mod.py` and a single file as its file name.
fn report_base(abs_path: &Path) -> PathBuf {
    abs_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| abs_path.to_path_buf())
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    crate::analysis::register_analyzers();

    let mut config = match load_config(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    apply_overrides(&mut config, args);

    if args.jobs == Some(0) {
        eprintln!("Error: --jobs must be greater than zero");
        return Ok(EXIT_ERROR);
    }
    if let Err(e) = config.validate() {
        eprintln!("Error: invalid config: {}", e);
        return Ok(EXIT_ERROR);
    }

    // Resolve path
    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let files = discover::collect_files(&abs_path, &config)?;
    tracing::info!(count = files.len(), root = %abs_path.display(), "collected files");
    if files.is_empty() {
        eprintln!("Warning: no Python files to analyze");
    }

    let ctx = AnalysisContext::new(report_base(&abs_path))
        .allow_partial_parse(config.allows_partial_parse())
        .parallel(config.is_parallel());

    let project = match args.jobs {
        Some(jobs) if jobs > 1 => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(|| ctx.analyze_files(&files))
        }
        _ => ctx.analyze_files(&files),
    };

    let summary = Summary::build(&project, config.top_n(), config.module_call_policy());

    // Output results
    let path_str = args.path.to_string_lossy().to_string();
    match args.format {
        OutputFormat::Json => report::write_json(&path_str, &project, &summary)?,
        OutputFormat::Pretty => report::write_pretty(&path_str, &project, &summary),
    }

    if let Some(output_dir) = &args.output {
        let written =
            report::save_results(output_dir, &project, &summary, config.mermaid_max_edges())?;
        if args.format == OutputFormat::Pretty {
            println!("  Results saved to {}/", output_dir.display());
            for path in written {
                if let Some(name) = path.file_name() {
                    println!("    {}", name.to_string_lossy());
                }
            }
            println!();
        }
    }

    if project.failures.is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Use --force to overwrite it or --output to pick a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, DEFAULT_CONFIG_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: callscope analyze . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse_analyze(argv: &[&str]) -> AnalyzeArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Analyze(args) => args,
            Commands::Init(_) => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse_analyze(&[
            "callscope",
            "analyze",
            "src",
            "--top",
            "3",
            "--module-calls",
            "omit",
            "--exclude-tests",
            "--jobs",
            "1",
        ]);
        let mut config = Config::parse_str("top_n: 20\ninclude_test_files: true\n").unwrap();
        apply_overrides(&mut config, &args);

        assert_eq!(config.top_n(), 3);
        assert_eq!(config.module_call_policy(), ModuleCallPolicy::Omit);
        assert!(!config.should_include_test_files());
        assert!(!config.is_parallel());
    }

    #[test]
    fn test_config_values_survive_without_flags() {
        let args = parse_analyze(&["callscope", "analyze", "src"]);
        let mut config = Config::parse_str("top_n: 20\nparallel: false\n").unwrap();
        apply_overrides(&mut config, &args);

        assert_eq!(config.top_n(), 20);
        assert!(!config.is_parallel());
        assert_eq!(args.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_test_flags_conflict() {
        let result = Cli::try_parse_from([
            "callscope",
            "analyze",
            "src",
            "--include-tests",
            "--exclude-tests",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_report_base_is_parent() {
        assert_eq!(
            report_base(Path::new("/work/pkg")),
            PathBuf::from("/work")
        );
        assert_eq!(
            report_base(Path::new("/work/pkg/mod.py")),
            PathBuf::from("/work/pkg")
        );
    }

    #[test]
    fn test_init_refuses_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("conf/callscope.yaml");

        let args = InitArgs {
            output: output.clone(),
            force: false,
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        let written = Config::parse_file(&output).unwrap();
        assert!(written.validate().is_ok());

        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);

        let forced = InitArgs {
            output,
            force: true,
        };
        assert_eq!(run_init(&forced).unwrap(), EXIT_SUCCESS);
    }
}
