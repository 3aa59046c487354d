//! Implementation of the `ragguard query` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, QueryHit, QueryResult};

use super::{open_with_index, parse_top_k};

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Text to embed and look up
    pub question: String,

    /// Nearest neighbours to return (defaults to retrieval.top_k)
    #[arg(short = 'k', long, value_parser = parse_top_k)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HitOutput {
    pub index: usize,
    pub distance: f32,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct QueryOutput {
    pub question: String,
    pub results: Vec<HitOutput>,
    #[serde(skip)]
    hits: Vec<QueryHit>,
}

impl QueryOutput {
    fn new(question: String, result: QueryResult) -> Self {
        let results = result
            .iter()
            .map(|hit| HitOutput {
                index: hit.index,
                distance: hit.distance,
                metadata: hit.metadata.clone(),
            })
            .collect();
        Self {
            question,
            results,
            hits: result.hits,
        }
    }
}

impl CommandOutput for QueryOutput {
    fn to_human(&self) -> String {
        if self.hits.is_empty() {
            return "No results.".to_string();
        }
        format!(
            "{} result(s) for \"{}\":\n{}",
            self.hits.len(),
            self.question,
            TableFormatter::new().format_hits(&self.hits)
        )
    }
}

pub async fn execute(args: QueryArgs, config: &Config, json_mode: bool) -> Result<()> {
    let services = open_with_index(config).await?;
    let top_k = args.top_k.unwrap_or(config.retrieval.top_k);

    let result = services
        .retrieval
        .search(&args.question, top_k)
        .await
        .context("Query failed")?;

    output(&QueryOutput::new(args.question, result), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Document;

    #[test]
    fn test_json_shape() {
        let doc = Document::new("a#0", "passage");
        let result = QueryResult {
            hits: vec![QueryHit {
                rank: 0,
                index: 7,
                distance: 1.5,
                metadata: doc.hit_metadata(),
            }],
        };
        let json = QueryOutput::new("q".into(), result).to_json();
        assert_eq!(json["results"][0]["index"], 7);
        assert_eq!(json["results"][0]["distance"], 1.5);
        assert_eq!(json["results"][0]["metadata"]["text"], "passage");
        assert_eq!(json["results"][0]["metadata"]["document_id"], "a#0");
    }

    #[test]
    fn test_no_results() {
        assert_eq!(QueryOutput::new("q".into(), QueryResult::empty()).to_human(), "No results.");
    }
}
