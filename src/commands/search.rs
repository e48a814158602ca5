use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::SearchArgs;
use crate::search_index::{FlatDocument, SearchIndex, SqliteSearchIndex};

#[derive(Debug, Serialize)]
struct SearchResponse<'a> {
    index: &'a str,
    query: &'a str,
    limit: usize,
    returned: usize,
    results: Vec<FlatDocument>,
}

pub fn run(args: SearchArgs) -> Result<()> {
    let search_db_path = args.store.resolved_search_db_path();
    let search = SqliteSearchIndex::open(&search_db_path)?;

    let results = search
        .search(&args.index_name, &args.query, args.limit)
        .with_context(|| format!("search failed in index {}", args.index_name))?;
    info!(
        index = %args.index_name,
        query = %args.query,
        returned = results.len(),
        "search finished"
    );

    if args.json {
        write_json_response(&args, results)
    } else {
        write_text_response(&args, &results)
    }
}

fn write_json_response(args: &SearchArgs, results: Vec<FlatDocument>) -> Result<()> {
    let response = SearchResponse {
        index: &args.index_name,
        query: &args.query,
        limit: args.limit,
        returned: results.len(),
        results,
    };

    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, &response)
        .context("failed to serialize search json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(args: &SearchArgs, results: &[FlatDocument]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Index: {}", args.index_name)?;
    writeln!(output, "Query: {}", args.query)?;
    writeln!(output, "Results: {}", results.len())?;

    for (rank, document) in results.iter().enumerate() {
        writeln!(
            output,
            "{}.\t{}\t{}",
            rank + 1,
            document.get("id").map(String::as_str).unwrap_or("(no id)"),
            document.get("name").map(String::as_str).unwrap_or("(unnamed)")
        )?;
        if let Some(description) = document.get("description") {
            writeln!(output, "\t{}", snippet(description, 160))?;
        }
    }

    output.flush()?;
    Ok(())
}

fn snippet(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<&str>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut cut = collapsed.chars().take(max_chars).collect::<String>();
    cut.push_str("...");
    cut
}
