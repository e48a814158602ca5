use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::DeleteAllArgs;
use crate::search_index::{SearchIndex, SqliteSearchIndex};
use crate::store::{DocumentFilter, DocumentStore, SqliteDocumentStore};

pub fn run(args: DeleteAllArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    warn!(
        path = %db_path.display(),
        doc_type = %args.doc_type,
        "deleting every document of type"
    );

    let mut store =
        SqliteDocumentStore::connect(&db_path, &args.store.database, &args.store.namespace)?;
    let deleted = delete_documents_of_type(&mut store, &args.doc_type)?;
    info!(doc_type = %args.doc_type, deleted, "deleted documents");

    if let Some(index_name) = &args.index_name {
        let search = SqliteSearchIndex::open(&args.store.resolved_search_db_path())?;
        let dropped = search
            .delete_index(index_name)
            .with_context(|| format!("failed to delete search index {index_name}"))?;
        info!(index = %index_name, dropped, "deleted search index");
    }

    Ok(())
}

fn delete_documents_of_type(store: &mut dyn DocumentStore, doc_type: &str) -> Result<usize> {
    let ids = store
        .query(&DocumentFilter::of_type(doc_type))?
        .iter()
        .filter_map(|document| document.get("@id").and_then(Value::as_str))
        .map(ToOwned::to_owned)
        .collect::<Vec<String>>();

    if ids.is_empty() {
        return Ok(0);
    }
    store
        .delete(&ids)
        .with_context(|| format!("failed to delete {} {doc_type} documents", ids.len()))
}
