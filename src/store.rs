use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::util::{now_utc_string, sha256_hex};

const STORE_SCHEMA_VERSION: &str = "0.1.0";

/// How the store derives the key half of a `<type>/<key>` document id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStrategy {
    Random,
    /// Hash of a natural key. The id is known before insert, which lets
    /// documents in one batch reference documents in a later one.
    ValueHash(String),
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub doc_type: String,
    pub key: KeyStrategy,
    pub body: Map<String, Value>,
}

impl NewDocument {
    pub fn from_serializable<T: serde::Serialize>(
        doc_type: &str,
        key: KeyStrategy,
        value: &T,
    ) -> Result<Self> {
        let body = match serde_json::to_value(value)
            .with_context(|| format!("failed to serialize {doc_type} document"))?
        {
            Value::Object(map) => map,
            other => bail!("{doc_type} document serialized to non-object json: {other}"),
        };

        Ok(Self {
            doc_type: doc_type.to_string(),
            key,
            body,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DocumentFilter {
    pub doc_type: String,
}

impl DocumentFilter {
    pub fn of_type(doc_type: &str) -> Self {
        Self {
            doc_type: doc_type.to_string(),
        }
    }
}

pub trait DocumentStore {
    /// Inserts every document in one commit and returns the assigned ids in
    /// input order. Nothing is written if any document fails.
    fn insert(&mut self, documents: &[NewDocument], message: &str) -> Result<Vec<String>>;

    fn get(&self, id: &str) -> Result<Option<Value>>;

    fn query(&self, filter: &DocumentFilter) -> Result<Vec<Value>>;

    fn delete(&mut self, ids: &[String]) -> Result<usize>;

    fn count_by_type(&self) -> Result<Vec<(String, i64)>>;
}

pub fn value_hash_id(doc_type: &str, natural_key: &str) -> String {
    format!("{doc_type}/{}", sha256_hex(natural_key))
}

pub fn id_suffix(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

fn assign_id(document: &NewDocument) -> String {
    match &document.key {
        KeyStrategy::Random => format!("{}/{}", document.doc_type, Uuid::new_v4().simple()),
        KeyStrategy::ValueHash(natural_key) => value_hash_id(&document.doc_type, natural_key),
    }
}

pub struct SqliteDocumentStore {
    connection: Connection,
    database: String,
    namespace: String,
}

impl SqliteDocumentStore {
    pub fn connect(db_path: &Path, database: &str, namespace: &str) -> Result<Self> {
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;
        Self::from_connection(connection, database, namespace)
    }

    pub fn from_connection(connection: Connection, database: &str, namespace: &str) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self {
            connection,
            database: database.to_string(),
            namespace: namespace.to_string(),
        })
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS commits (
          commit_id INTEGER PRIMARY KEY AUTOINCREMENT,
          database TEXT NOT NULL,
          namespace TEXT NOT NULL,
          message TEXT NOT NULL,
          document_count INTEGER NOT NULL,
          created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS documents (
          database TEXT NOT NULL,
          namespace TEXT NOT NULL,
          doc_id TEXT NOT NULL,
          doc_type TEXT NOT NULL,
          body TEXT NOT NULL,
          commit_id INTEGER NOT NULL,
          PRIMARY KEY (database, namespace, doc_id),
          FOREIGN KEY(commit_id) REFERENCES commits(commit_id)
        );

        CREATE INDEX IF NOT EXISTS idx_documents_type ON documents(database, namespace, doc_type);
        ",
    )?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('store_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [STORE_SCHEMA_VERSION],
    )?;

    Ok(())
}

fn decode_body(id: &str, doc_type: &str, body: &str) -> Result<Value> {
    let mut map: Map<String, Value> = serde_json::from_str(body)
        .with_context(|| format!("failed to parse stored document {id}"))?;
    map.insert("@id".to_string(), Value::String(id.to_string()));
    map.insert("@type".to_string(), Value::String(doc_type.to_string()));
    Ok(Value::Object(map))
}

impl DocumentStore for SqliteDocumentStore {
    fn insert(&mut self, documents: &[NewDocument], message: &str) -> Result<Vec<String>> {
        let tx = self.connection.transaction()?;
        let mut ids = Vec::with_capacity(documents.len());

        {
            tx.execute(
                "INSERT INTO commits(database, namespace, message, document_count, created_at)
                 VALUES(?1, ?2, ?3, ?4, ?5)",
                params![
                    &self.database,
                    &self.namespace,
                    message,
                    documents.len() as i64,
                    now_utc_string()
                ],
            )?;
            let commit_id = tx.last_insert_rowid();

            let mut statement = tx.prepare(
                "
                INSERT INTO documents(database, namespace, doc_id, doc_type, body, commit_id)
                VALUES(?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )?;

            for document in documents {
                let id = assign_id(document);
                let body = serde_json::to_string(&document.body)
                    .with_context(|| format!("failed to serialize document {id}"))?;
                statement
                    .execute(params![
                        &self.database,
                        &self.namespace,
                        &id,
                        &document.doc_type,
                        body,
                        commit_id
                    ])
                    .with_context(|| format!("failed to insert document {id}"))?;
                ids.push(id);
            }
        }

        tx.commit()?;
        Ok(ids)
    }

    fn get(&self, id: &str) -> Result<Option<Value>> {
        let row = self
            .connection
            .query_row(
                "SELECT doc_type, body FROM documents
                 WHERE database = ?1 AND namespace = ?2 AND doc_id = ?3",
                params![&self.database, &self.namespace, id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(doc_type, body)| decode_body(id, &doc_type, &body))
            .transpose()
    }

    fn query(&self, filter: &DocumentFilter) -> Result<Vec<Value>> {
        let mut statement = self.connection.prepare(
            "
            SELECT doc_id, doc_type, body
            FROM documents
            WHERE database = ?1 AND namespace = ?2 AND doc_type = ?3
            ORDER BY rowid ASC
            ",
        )?;

        let mut rows = statement.query(params![&self.database, &self.namespace, &filter.doc_type])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let doc_type: String = row.get(1)?;
            let body: String = row.get(2)?;
            out.push(decode_body(&id, &doc_type, &body)?);
        }

        Ok(out)
    }

    fn delete(&mut self, ids: &[String]) -> Result<usize> {
        let tx = self.connection.transaction()?;
        let mut deleted = 0usize;

        {
            let mut statement = tx.prepare(
                "DELETE FROM documents WHERE database = ?1 AND namespace = ?2 AND doc_id = ?3",
            )?;
            for id in ids {
                deleted += statement
                    .execute(params![&self.database, &self.namespace, id])
                    .with_context(|| format!("failed to delete document {id}"))?;
            }
        }

        tx.commit()?;
        Ok(deleted)
    }

    fn count_by_type(&self) -> Result<Vec<(String, i64)>> {
        let mut statement = self.connection.prepare(
            "
            SELECT doc_type, COUNT(*)
            FROM documents
            WHERE database = ?1 AND namespace = ?2
            GROUP BY doc_type
            ORDER BY doc_type ASC
            ",
        )?;

        let rows = statement
            .query_map(params![&self.database, &self.namespace], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<(String, i64)>>>()?;

        Ok(rows)
    }
}
