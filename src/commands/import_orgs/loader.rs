use super::*;

pub(super) const COMMIT_MESSAGE: &str = "Adding orgs";

#[derive(Debug, Default)]
pub(super) struct LoadOutcome {
    pub(super) counts: OrgImportCounts,
    pub(super) failures: Vec<String>,
}

struct PendingRow {
    line: u64,
    cells: Vec<String>,
}

/// Streams the export after its header row, committing every `chunk_size`
/// rows as one insert and mirroring the inserted documents into the search
/// index. A row that fails to normalize sinks its whole chunk; later chunks
/// still run.
pub(super) fn load_organizations<R: Read>(
    reader: R,
    normalizer: &RowNormalizer,
    store: &mut dyn DocumentStore,
    search: &dyn SearchIndex,
    index_name: &str,
    chunk_size: usize,
) -> Result<LoadOutcome> {
    let chunk_size = chunk_size.max(1);
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut outcome = LoadOutcome::default();
    let mut chunk = Vec::<PendingRow>::with_capacity(chunk_size);

    for record in csv_reader.records() {
        let record = record.context("failed to read organizations csv row")?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        outcome.counts.rows_read += 1;

        chunk.push(PendingRow {
            line,
            cells: record.iter().map(ToOwned::to_owned).collect(),
        });

        if chunk.len() == chunk_size {
            commit_chunk(&chunk, normalizer, store, search, index_name, &mut outcome)?;
            chunk.clear();
        }
    }

    if !chunk.is_empty() {
        commit_chunk(&chunk, normalizer, store, search, index_name, &mut outcome)?;
    }

    Ok(outcome)
}

fn commit_chunk(
    chunk: &[PendingRow],
    normalizer: &RowNormalizer,
    store: &mut dyn DocumentStore,
    search: &dyn SearchIndex,
    index_name: &str,
    outcome: &mut LoadOutcome,
) -> Result<()> {
    let first_line = chunk.first().map(|row| row.line).unwrap_or_default();

    let orgs = match normalize_chunk(chunk, normalizer, &mut outcome.counts) {
        Ok(orgs) => orgs,
        Err((line, err)) => {
            let pending = chunk.iter().filter(|row| !is_blank_row(&row.cells)).count();
            outcome.counts.rows_failed += pending;
            outcome.counts.rows_skipped_blank += chunk.len() - pending;
            outcome.counts.chunks_failed += 1;
            let message = format!("chunk starting at line {first_line}: line {line}: {err}");
            warn!(
                line,
                first_line,
                rows = pending,
                error = %err,
                "organization chunk rejected"
            );
            outcome.failures.push(message);
            return Ok(());
        }
    };

    if orgs.is_empty() {
        return Ok(());
    }

    let documents = orgs
        .values()
        .map(|org| NewDocument::from_serializable(ORGANIZATION_TYPE, KeyStrategy::Random, org))
        .collect::<Result<Vec<NewDocument>>>()?;

    let ids = store
        .insert(&documents, COMMIT_MESSAGE)
        .with_context(|| format!("failed to insert organization chunk starting at line {first_line}"))?;
    outcome.counts.rows_inserted += ids.len();
    outcome.counts.chunks_committed += 1;

    let flattened = mirror_documents(store, &ids)?;
    outcome.counts.search_documents_added += search
        .add_documents(index_name, &flattened)
        .with_context(|| format!("failed to index organization chunk starting at line {first_line}"))?;

    info!(
        first_line,
        inserted = ids.len(),
        index = index_name,
        "committed organization chunk"
    );

    Ok(())
}

/// Keyed by position within the chunk so insert order follows the file.
fn normalize_chunk(
    chunk: &[PendingRow],
    normalizer: &RowNormalizer,
    counts: &mut OrgImportCounts,
) -> std::result::Result<BTreeMap<usize, Organization>, (u64, NormalizeError)> {
    let mut orgs = BTreeMap::new();
    let mut skipped = 0usize;

    for (position, row) in chunk.iter().enumerate() {
        if is_blank_row(&row.cells) {
            skipped += 1;
            continue;
        }
        let org = normalizer
            .normalize(&row.cells)
            .map_err(|err| (row.line, err))?;
        orgs.insert(position, org);
    }

    counts.rows_skipped_blank += skipped;
    Ok(orgs)
}

pub(super) fn mirror_documents(store: &dyn DocumentStore, ids: &[String]) -> Result<Vec<FlatDocument>> {
    let mut flattened = Vec::with_capacity(ids.len());
    for id in ids {
        let document = store
            .get(id)?
            .with_context(|| format!("inserted document {id} could not be read back"))?;
        flattened.push(flatten_document(&document)?);
    }
    Ok(flattened)
}
