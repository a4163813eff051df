use anyhow::Result;
use clap::Parser;
use mfinder::*;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tracing::*;

#[derive(Parser, Debug)]
#[command(name = "find-molecules", about = "Extract amine fragments from CSD names and convert them with OPSIN.")]
struct Cli {
    /// CSV with a header row; the first column is used as the identifier.
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    output: PathBuf,
    #[arg(long)]
    opsin_jar: PathBuf,
    #[arg(long, default_value = "java")]
    java: PathBuf,
    /// Zero-based column holding the chemical name.
    #[arg(long, default_value_t = 1)]
    name_column: usize,
    /// Substitution rules CSV (`old,new`). Defaults to the built-in CSD table.
    #[arg(long)]
    rules: Option<PathBuf>,
    #[arg(long, default_value_t = OutputFormat::Smiles)]
    format: OutputFormat,
    /// Retry failed names with web-suggested spelling corrections. Check the results.
    #[arg(long)]
    correct: bool,
    /// Timeout in seconds for each suggestion request.
    #[arg(long)]
    suggest_timeout: Option<u64>,
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut config = amine_finder_config();
    if let Some(rules) = &cli.rules {
        config = config.with_rules(SubstitutionRules::from_csv_path(rules)?);
    }

    let converter = OpsinConverter::new(&cli.opsin_jar).with_java(&cli.java).silent(true);
    let mut finder = MoleculeFinder::new(config, Rc::new(converter))?.with_format(cli.format);
    if cli.correct {
        let suggester = WebSuggest::new(WebSuggestConfig {
            timeout: cli.suggest_timeout.map(Duration::from_secs),
            ..Default::default()
        })?;
        finder = finder.with_suggestions(Rc::new(suggester));
    }

    let summary = find_molecules_in_csv(&finder, &cli.input, &cli.output, cli.name_column, cli.correct)?;
    info!("{} of {} names produced a molecule", summary.found, summary.total);
    Ok(())
}
