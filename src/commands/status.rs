use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::search_index::{SearchIndex, SqliteSearchIndex};
use crate::store::{DocumentStore, SqliteDocumentStore};

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    let search_db_path = args.store.resolved_search_db_path();

    info!(data_root = %args.store.data_root.display(), "status requested");

    if db_path.exists() {
        let store =
            SqliteDocumentStore::connect(&db_path, &args.store.database, &args.store.namespace)?;
        let counts = store.count_by_type()?;
        if counts.is_empty() {
            info!(path = %db_path.display(), "document store is empty");
        }
        for (doc_type, count) in counts {
            info!(
                path = %db_path.display(),
                database = %args.store.database,
                namespace = %args.store.namespace,
                doc_type = %doc_type,
                documents = count,
                "document store status"
            );
        }
    } else {
        warn!(path = %db_path.display(), "document store missing");
    }

    if search_db_path.exists() {
        let search = SqliteSearchIndex::open(&search_db_path)?;
        for (index_name, count) in search.list_indexes()? {
            info!(index = %index_name, documents = count, "search index status");
        }
    } else {
        warn!(path = %search_db_path.display(), "search index missing");
    }

    Ok(())
}
