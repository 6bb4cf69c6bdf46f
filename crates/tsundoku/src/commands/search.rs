//! Search command.

use anyhow::{Result, anyhow};
use clap::Args;
use tsundoku_core::SourceManager;
use tsundoku_source::SearchFilter;

use crate::output::print_manga;

/// Arguments for the `search` command.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Source name
    pub source: String,

    /// Search query, sent as the `q` filter
    #[arg(short, long)]
    pub query: Option<String>,

    /// Source-specific filter (repeatable)
    #[arg(short, long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,
}

impl SearchArgs {
    /// Builds the filter passed to the source.
    pub fn to_filter(&self) -> SearchFilter {
        let mut filter: SearchFilter = self.filters.iter().cloned().collect();
        if let Some(query) = &self.query {
            filter.insert("q".to_string(), query.clone());
        }
        filter
    }
}

fn parse_filter(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got `{raw}`"))?;
    if key.is_empty() {
        return Err(anyhow!("filter key is empty in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Runs the search command.
pub async fn run(manager: &SourceManager, args: &SearchArgs) -> Result<()> {
    let manga = manager.search_manga(&args.source, &args.to_filter()).await?;
    print_manga(&manga, "No results.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("genre=Action").unwrap(),
            ("genre".to_string(), "Action".to_string())
        );
        assert_eq!(
            parse_filter("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_filter("genre").is_err());
        assert!(parse_filter("=x").is_err());
    }

    #[test]
    fn test_query_overrides_q_filter() {
        let args = SearchArgs {
            source: "local".to_string(),
            query: Some("dragon".to_string()),
            filters: vec![
                ("q".to_string(), "tiger".to_string()),
                ("genre".to_string(), "Action".to_string()),
            ],
        };
        let filter = args.to_filter();
        assert_eq!(filter.get("q").map(String::as_str), Some("dragon"));
        assert_eq!(filter.get("genre").map(String::as_str), Some("Action"));
    }
}
