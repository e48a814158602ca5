use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::ExportGraphArgs;
use crate::model::{GraphEntity, GraphRelation, KnowledgeGraph};
use crate::store::{DocumentFilter, DocumentStore, SqliteDocumentStore};
use crate::util::write_json_pretty;

/// Relationship fields exported as edges, paired with the relation type they carry.
const RELATION_FIELDS: [(&str, &str); 2] = [("LI", "LI"), ("vouches_for", "vouches_for")];

pub fn run(args: ExportGraphArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    info!(
        path = %db_path.display(),
        doc_type = %args.doc_type,
        "exporting knowledge graph"
    );

    let store =
        SqliteDocumentStore::connect(&db_path, &args.store.database, &args.store.namespace)?;
    let graph = export_graph(&store, &args.doc_type)?;

    write_json_pretty(&args.output_path, &graph)?;
    info!(
        path = %args.output_path.display(),
        entities = graph.entities.len(),
        relations = graph.relations.len(),
        "wrote knowledge graph"
    );

    Ok(())
}

fn export_graph(store: &dyn DocumentStore, doc_type: &str) -> Result<KnowledgeGraph> {
    let documents = store
        .query(&DocumentFilter::of_type(doc_type))
        .with_context(|| format!("failed to read {doc_type} documents"))?;
    Ok(build_graph(&documents, doc_type))
}

fn build_graph(documents: &[Value], default_type: &str) -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::default();

    for document in documents {
        let Some(id) = document.get("@id").and_then(Value::as_str) else {
            warn!(document = %document, "skipping document without @id");
            continue;
        };

        graph.entities.push(GraphEntity {
            id: id.to_string(),
            label: string_field(document, "name"),
            entity_type: string_field(document, "@type").unwrap_or_else(|| default_type.to_string()),
            description: string_field(document, "description"),
            image: string_field(document, "image"),
            locality: string_field(document, "locality"),
            primary_url: string_field(document, "primary_url"),
        });

        for (field, relation_type) in RELATION_FIELDS {
            let Some(value) = document.get(field) else {
                continue;
            };
            for target in reference_targets(value) {
                graph.relations.push(GraphRelation {
                    source: id.to_string(),
                    target,
                    relation_type: relation_type.to_string(),
                });
            }
        }
    }

    graph
}

fn string_field(document: &Value, field: &str) -> Option<String> {
    document
        .get(field)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

/// Relationship fields arrive as a single reference or a list of them, and a
/// reference is either a bare id or an object carrying `@id`.
fn reference_targets(value: &Value) -> Vec<String> {
    match value {
        Value::String(id) if !id.is_empty() => vec![id.clone()],
        Value::Object(map) => map
            .get("@id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(|id| vec![id.to_string()])
            .unwrap_or_default(),
        Value::Array(items) => items.iter().flat_map(reference_targets).collect(),
        _ => Vec::new(),
    }
}
