use anyhow::Result;
use clap::Parser;
use depgraph::{resolve_direct_dependencies, AnalysisParams, Config, DependencySource};

/// depgraph - report a package's direct dependencies from a registry
#[derive(Parser)]
#[command(name = "depgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Package to analyze
    #[arg(long)]
    package: Option<String>,

    /// Registry base URL or repository path
    #[arg(long)]
    repository: Option<String>,

    /// Run mode: production, development or test (default: production)
    #[arg(long)]
    mode: Option<String>,

    /// Analysis depth, 1 through 10 (default: 3)
    #[arg(long)]
    depth: Option<String>,

    /// Read dependencies from the published source archive instead of the
    /// dependency API
    #[arg(long)]
    from_archive: bool,
}

fn run(cli: &Cli) -> Result<()> {
    // Requiredness is enforced by the validators, not by clap
    let params = AnalysisParams::from_raw(
        cli.package.as_deref(),
        cli.repository.as_deref(),
        cli.mode.as_deref(),
        cli.depth.as_deref(),
    )?;

    println!("Параметры конфигурации:");
    println!("package = {}", params.package);
    println!("repository = {}", params.repository);
    println!("mode = {}", params.mode);
    println!("depth = {}", params.depth);

    let config = Config::load()?;
    let source = if cli.from_archive {
        DependencySource::SourceArchive
    } else {
        DependencySource::RegistryApi
    };

    let deps =
        resolve_direct_dependencies(&params.package, &params.repository, &config.http, source)?;

    println!();
    println!("Прямые зависимости: '{}'", params.package);
    for dep in &deps {
        let mut line = format!("  {} @ {}", dep.name, dep.requirement);
        if dep.optional {
            line.push_str(" (optional)");
        }
        if let Some(kind) = dep.kind.as_deref() {
            if kind != "normal" {
                line.push_str(&format!(" [{}]", kind));
            }
        }
        println!("{}", line);
    }

    Ok(())
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors exit 1; --help and --version exit 0
            let code = i32::from(e.use_stderr());
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
