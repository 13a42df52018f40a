use std::path::PathBuf;

use clap::Parser;
use rpd_match::{Path, load_document};
use tracing::instrument;

#[derive(Debug, Parser)]
pub struct Query {
    /// The path expression, e.g. `$.buildings[*].building_segments[*].zones[*].id`
    expression: String,

    /// The JSON document to query
    document: PathBuf,
}

impl Query {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        // reject malformed expressions before touching the file
        let path: Path = self.expression.parse()?;
        let document = load_document(&self.document)?;

        let results = path.evaluate(&document);
        tracing::info!("{path} matched {} values", results.len());
        for value in results {
            println!("{}", serde_json::to_string(value)?);
        }
        Ok(())
    }
}
