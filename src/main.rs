use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use semver::Version;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cpython_build::{
    BuildPaths, MetadataSet, OptionSet, Platform, Recipe, RecipeFile, ValidationMode,
};

/// CPython build recipe - resolve feature toggles into dependency
/// requirements and configure arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments shared by every subcommand that needs a configuration
#[derive(ClapArgs, Debug)]
struct ConfigArgs {
    /// Upstream version to build
    #[arg(long)]
    upstream: Option<String>,

    /// Options string applied on top of the defaults, e.g. "shared -nis"
    #[arg(short, long)]
    options: Option<String>,

    /// Recipe file (TOML)
    #[arg(short, long, env = "CPYTHON_BUILD_RECIPE")]
    recipe: Option<PathBuf>,

    /// Target operating system (defaults to the host)
    #[arg(long)]
    os: Option<String>,

    /// Compiler family (defaults to the host convention)
    #[arg(long)]
    compiler: Option<String>,

    /// Target architecture (defaults to the host)
    #[arg(long)]
    arch: Option<String>,

    /// Build type: Debug or Release
    #[arg(long)]
    build_type: Option<String>,

    /// Skip unknown options instead of failing
    #[arg(long)]
    lenient: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve requirements and configure arguments
    Resolve {
        #[command(flatten)]
        config: ConfigArgs,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Assemble the full build plan for the invocation layer
    Plan {
        #[command(flatten)]
        config: ConfigArgs,

        /// Extracted upstream source tree
        #[arg(long, default_value = "sources")]
        source_dir: PathBuf,

        /// Out-of-tree build directory
        #[arg(long, default_value = "build")]
        build_dir: PathBuf,

        /// pkg-config executable for the configure step
        #[arg(long)]
        pkg_config: Option<PathBuf>,

        /// Existing interpreter for source regeneration
        #[arg(long)]
        python_for_regen: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the validated configuration and upstream source facts
    Show {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// List known build options with defaults and descriptions
    Options,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Resolve { config, json } => {
            let recipe = build_recipe(&config)?;
            let resolution = recipe.resolve()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
            } else {
                println!("Requirements:");
                for req in &resolution.requirements {
                    println!("  {}", req);
                }
                println!();
                println!("Configure arguments:");
                for arg in &resolution.configure_args {
                    println!("  {}", arg);
                }
                if !resolution.extra_include_paths.is_empty() {
                    println!();
                    println!("Extra include paths:");
                    for path in &resolution.extra_include_paths {
                        println!("  {}", path.display());
                    }
                }
            }
        }
        Commands::Plan {
            config,
            source_dir,
            build_dir,
            pkg_config,
            python_for_regen,
            json,
        } => {
            let recipe = build_recipe(&config)?;
            let mut paths = BuildPaths::new(source_dir, build_dir);
            if let Some(pkg_config) = pkg_config {
                paths.pkg_config = pkg_config;
            }
            paths.python_for_regen = python_for_regen;

            let plan = recipe.plan(&paths)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                if !plan.env.is_empty() {
                    println!("Environment:");
                    for (key, value) in &plan.env {
                        println!("  {}={}", key, value);
                    }
                    println!();
                }
                println!("Steps:");
                for step in &plan.steps {
                    println!(
                        "  [{}] {} {}",
                        step.cwd.display(),
                        step.program.display(),
                        step.args.join(" ")
                    );
                }
            }
        }
        Commands::Show { config } => {
            let recipe = build_recipe(&config)?;
            let source = recipe.source();

            println!("Version:  {}", recipe.config().version());
            println!("Platform: {}", recipe.config().platform());
            println!("Options:  {}", recipe.config().options().to_options_string());
            println!("Source:   {}", source.download_url());
            match source.sha256() {
                Some(sum) => println!("Sha256:   {}", sum),
                None => println!("Sha256:   (unknown release)"),
            }
        }
        Commands::Options => {
            println!("Known build options (* = enabled by default):");
            for option in cpython_build::BuildOption::all() {
                let marker = if option.default_enabled() { "*" } else { " " };
                println!("  {} {:<14} {}", marker, option.name(), option.description());
            }
        }
    }

    Ok(())
}

/// Build a recipe from the CLI arguments and optional recipe file.
/// Precedence: CLI flags over recipe file over host/default facts.
fn build_recipe(args: &ConfigArgs) -> Result<Recipe> {
    let mode = if args.lenient {
        ValidationMode::Lenient
    } else {
        ValidationMode::Strict
    };

    let file = match args.recipe {
        Some(ref path) => RecipeFile::load(path)?,
        None => RecipeFile::default(),
    };

    let mut platform = file.platform(Platform::host())?;
    if let Some(ref os) = args.os {
        platform.os = cpython_build::Os::parse(os)?;
    }
    if let Some(ref compiler) = args.compiler {
        platform.compiler = cpython_build::Compiler::parse(compiler)?;
    }
    if let Some(ref arch) = args.arch {
        platform.arch = cpython_build::Arch::parse(arch)?;
    }
    if let Some(ref build_type) = args.build_type {
        platform.build_type = cpython_build::BuildType::parse(build_type)?;
    }

    let mut options: OptionSet = file.option_set(mode)?;
    if let Some(ref s) = args.options {
        options.apply_options_string(s, mode)?;
    }

    let version: Version = args
        .upstream
        .as_deref()
        .or(file.version.as_deref())
        .unwrap_or("3.7.1")
        .parse()
        .map_err(cpython_build::Error::from)?;

    let metadata = if file.metadata.is_empty() {
        MetadataSet::new()
    } else {
        file.metadata_set()
    };

    Ok(Recipe::from_options(options, platform, version, metadata)?)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
