use std::path::PathBuf;

use clap::Parser;
use rpd_match::{Config, Mapper, MappingOutcome, load_document, mapping::Diagnostic};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Map {
    /// The generated (candidate) document
    generated: PathBuf,

    /// The hand-authored reference document
    reference: PathBuf,

    /// A TOML configuration file describing the document layout
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

impl Map {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let config = match &self.config {
            Some(path) => Config::load(path).map_err(anyhow::Error::msg)?,
            None => Config::default(),
        };
        let mapper = Mapper::new(&config)?;

        let generated = load_document(&self.generated)?;
        let reference = load_document(&self.reference)?;

        let outcome = mapper.map(&generated, &reference);
        let failed = outcome.has_errors();

        if self.json {
            Self::output_json(&outcome)?;
        } else {
            Self::output_text(&outcome);
        }

        if failed {
            std::process::exit(2);
        }
        Ok(())
    }

    fn output_text(outcome: &MappingOutcome) {
        for category in outcome.map.categories() {
            println!("{category}");
            for (generated, reference) in outcome.map.category(category) {
                println!("  {generated} {} {reference}", "→".dim());
            }
        }

        for diagnostic in &outcome.diagnostics {
            match diagnostic {
                Diagnostic::Warning(warning) => {
                    println!("{} {warning}", "warning:".warning());
                }
                Diagnostic::Error(error) => println!("{} {error}", "error:".error()),
            }
        }

        let summary = format!(
            "{} pairs, {} warnings, {} errors",
            outcome.map.len(),
            outcome.warnings().len(),
            outcome.errors().len()
        );
        if outcome.has_errors() {
            println!("\n{}", summary.error());
        } else if outcome.warnings().is_empty() {
            println!("\n{}", summary.success());
        } else {
            println!("\n{}", summary.warning());
        }
    }

    fn output_json(outcome: &MappingOutcome) -> anyhow::Result<()> {
        use serde_json::json;

        let output = json!({
            "map": outcome.map,
            "warnings": outcome.warnings(),
            "errors": outcome.errors(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
