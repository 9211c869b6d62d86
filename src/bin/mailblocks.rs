use clap::{Parser, Subcommand};
use mailblocks::presets::{find_preset, PRESETS};
use mailblocks::{compile_with, MailError, MailResult, MailblocksConfig, Template};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailblocks", version, about = "Compile and check email template documents")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a template document to HTML
    Compile {
        input: PathBuf,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check one or more template documents
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the predefined templates
    Presets,
    /// Print a predefined template as JSON
    Preset { id: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            print_error(&e);
            1
        }
    };
    process::exit(exit_code);
}

fn run(cli: Cli) -> MailResult<i32> {
    let config = match &cli.config {
        Some(path) => MailblocksConfig::load(path)?,
        None => MailblocksConfig::default(),
    };

    match cli.command {
        Command::Compile { input, output } => {
            let template = Template::load(&input)?;
            let options = config.compiler.to_options()?;
            let html = compile_with(&template, &options);
            match output {
                Some(path) => {
                    fs::write(&path, html)?;
                    eprintln!("✓ {} → {}", input.display(), path.display());
                }
                None => println!("{}", html),
            }
            Ok(0)
        }
        Command::Validate { files } => {
            let mut exit_code = 0;
            for path in files {
                match validate_file(&path) {
                    Ok(count) => println!("✓ {} is valid ({} blocks)", path.display(), count),
                    Err(e) => {
                        eprintln!("✗ {} has errors:", path.display());
                        print_error(&e);
                        exit_code = 1;
                    }
                }
            }
            Ok(exit_code)
        }
        Command::Presets => {
            for preset in PRESETS {
                println!("{:<26} {:<20} {}", preset.id, preset.name, preset.description);
            }
            Ok(0)
        }
        Command::Preset { id } => {
            let template = find_preset(&id)?.template()?;
            println!("{}", template.to_json_pretty()?);
            Ok(0)
        }
    }
}

fn validate_file(path: &Path) -> MailResult<usize> {
    let template = Template::load(path)?;
    Ok(mailblocks::tree::collect_ids(&template).len())
}

fn print_error(error: &MailError) {
    match error {
        MailError::InvalidJson {
            line,
            column,
            message,
        } => {
            eprintln!("  Not valid JSON at line {}, column {}:", line, column);
            eprintln!("    {}", message);
        }
        MailError::InvalidShape(msg) => {
            eprintln!("  Not a template document:");
            eprintln!("    {}", msg);
        }
        MailError::DuplicateId { id } => {
            eprintln!("  Block id '{}' is used more than once", id);
        }
        MailError::MaxDepthExceeded { max_depth } => {
            eprintln!("  Maximum nesting depth ({}) exceeded", max_depth);
            eprintln!("    Blocks are nested too deeply");
        }
        MailError::Config(msg) => {
            eprintln!("  Configuration error:");
            eprintln!("    {}", msg);
        }
        e => {
            eprintln!("  {}", e);
        }
    }
}
