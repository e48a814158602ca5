use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, params};
use serde_json::Value;

use crate::store::id_suffix;

/// A search document: every value is a string and `id` is the plain key.
pub type FlatDocument = BTreeMap<String, String>;

pub trait SearchIndex {
    /// Adds or replaces documents by `id` and returns how many were written.
    fn add_documents(&self, index_name: &str, documents: &[FlatDocument]) -> Result<usize>;

    fn delete_index(&self, index_name: &str) -> Result<usize>;

    fn search(&self, index_name: &str, query_text: &str, limit: usize) -> Result<Vec<FlatDocument>>;

    fn document_count(&self, index_name: &str) -> Result<i64>;

    fn list_indexes(&self) -> Result<Vec<(String, i64)>>;
}

/// Turns a stored document into its search form: `@id` is replaced by a plain
/// `id` holding the id suffix, strings are kept verbatim and every other value
/// is written as compact json.
pub fn flatten_document(document: &Value) -> Result<FlatDocument> {
    let Value::Object(map) = document else {
        bail!("cannot flatten non-object document: {document}");
    };
    let Some(full_id) = map.get("@id").and_then(Value::as_str) else {
        bail!("document is missing @id: {document}");
    };

    let mut flat = FlatDocument::new();
    for (key, value) in map {
        if key == "@id" {
            continue;
        }
        let rendered = match value {
            Value::String(text) => text.clone(),
            other => serde_json::to_string(other)
                .with_context(|| format!("failed to render field {key} of {full_id}"))?,
        };
        flat.insert(key.clone(), rendered);
    }
    flat.insert("id".to_string(), id_suffix(full_id).to_string());

    Ok(flat)
}

fn to_fts_query(query_text: &str) -> String {
    query_text
        .split_whitespace()
        .filter(|token| !token.trim().is_empty())
        .map(|token| format!("\"{}\"", token.replace('"', "")))
        .collect::<Vec<String>>()
        .join(" ")
}

pub struct SqliteSearchIndex {
    connection: Connection,
}

impl SqliteSearchIndex {
    pub fn open(db_path: &Path) -> Result<Self> {
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        connection
            .pragma_update(None, "journal_mode", "WAL")
            .context("failed to set journal_mode=WAL for search index")?;
        Self::from_connection(connection)
    }

    pub fn from_connection(connection: Connection) -> Result<Self> {
        connection.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS search_documents (
              index_name TEXT NOT NULL,
              doc_id TEXT NOT NULL,
              body TEXT NOT NULL,
              PRIMARY KEY (index_name, doc_id)
            );
            ",
        )?;
        connection
            .execute(
                "
                CREATE VIRTUAL TABLE IF NOT EXISTS search_fts
                USING fts5(index_name UNINDEXED, doc_id UNINDEXED, content)
                ",
                [],
            )
            .context("failed to initialize FTS5 table search_fts")?;

        Ok(Self { connection })
    }
}

impl SearchIndex for SqliteSearchIndex {
    fn add_documents(&self, index_name: &str, documents: &[FlatDocument]) -> Result<usize> {
        let tx = self.connection.unchecked_transaction()?;

        {
            let mut upsert = tx.prepare(
                "
                INSERT INTO search_documents(index_name, doc_id, body)
                VALUES(?1, ?2, ?3)
                ON CONFLICT(index_name, doc_id) DO UPDATE SET body=excluded.body
                ",
            )?;
            let mut clear_fts =
                tx.prepare("DELETE FROM search_fts WHERE index_name = ?1 AND doc_id = ?2")?;
            let mut insert_fts = tx.prepare(
                "INSERT INTO search_fts(index_name, doc_id, content) VALUES(?1, ?2, ?3)",
            )?;

            for document in documents {
                let Some(doc_id) = document.get("id") else {
                    bail!("search document for index {index_name} is missing id");
                };
                let body = serde_json::to_string(document)
                    .with_context(|| format!("failed to serialize search document {doc_id}"))?;
                let content = document
                    .iter()
                    .filter(|(key, _)| key.as_str() != "id")
                    .map(|(_, value)| value.as_str())
                    .collect::<Vec<&str>>()
                    .join(" ");

                upsert.execute(params![index_name, doc_id, body])?;
                clear_fts.execute(params![index_name, doc_id])?;
                insert_fts.execute(params![index_name, doc_id, content])?;
            }
        }

        tx.commit()?;
        Ok(documents.len())
    }

    fn delete_index(&self, index_name: &str) -> Result<usize> {
        let tx = self.connection.unchecked_transaction()?;
        let deleted = tx.execute(
            "DELETE FROM search_documents WHERE index_name = ?1",
            [index_name],
        )?;
        tx.execute("DELETE FROM search_fts WHERE index_name = ?1", [index_name])?;
        tx.commit()?;
        Ok(deleted)
    }

    fn search(&self, index_name: &str, query_text: &str, limit: usize) -> Result<Vec<FlatDocument>> {
        let fts_query = to_fts_query(query_text);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        let mut statement = self.connection.prepare(
            "
            SELECT d.body
            FROM search_fts
            JOIN search_documents d
              ON d.index_name = search_fts.index_name AND d.doc_id = search_fts.doc_id
            WHERE search_fts MATCH ?1 AND search_fts.index_name = ?2
            ORDER BY bm25(search_fts) ASC
            LIMIT ?3
            ",
        )?;

        let mut rows = statement.query(params![fts_query, index_name, limit as i64])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            let document: FlatDocument = serde_json::from_str(&body)
                .with_context(|| format!("failed to parse search document in {index_name}"))?;
            out.push(document);
        }

        Ok(out)
    }

    fn document_count(&self, index_name: &str) -> Result<i64> {
        let count = self.connection.query_row(
            "SELECT COUNT(*) FROM search_documents WHERE index_name = ?1",
            [index_name],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn list_indexes(&self) -> Result<Vec<(String, i64)>> {
        let mut statement = self.connection.prepare(
            "SELECT index_name, COUNT(*) FROM search_documents GROUP BY index_name ORDER BY index_name",
        )?;
        let rows = statement
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, i64)>>>()?;
        Ok(rows)
    }
}
