use super::*;

pub fn run(args: ImportPeopleArgs) -> Result<()> {
    let directory = HttpProfileDirectory::new(&args.directory_url)?;
    run_with_directory(&args, &directory)
}

/// Runs the import against `directory` and always writes the run report,
/// marking it failed when the import stops early.
pub(super) fn run_with_directory(
    args: &ImportPeopleArgs,
    directory: &dyn ProfileDirectory,
) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("people-{}", utc_compact_string(started_ts));

    let db_path = args.store.resolved_db_path();
    let search_db_path = args.store.resolved_search_db_path();
    let report_path = args.report_path.clone().unwrap_or_else(|| {
        args.store
            .report_dir()
            .join(format!("import_people_{}.json", utc_compact_string(started_ts)))
    });
    ensure_parent_directory(&db_path)?;
    ensure_parent_directory(&search_db_path)?;

    info!(
        directory_url = %args.directory_url,
        run_id = %run_id,
        batch_size = args.batch_size,
        "starting people import"
    );

    let mut store =
        SqliteDocumentStore::connect(&db_path, &args.store.database, &args.store.namespace)?;
    let search = SqliteSearchIndex::open(&search_db_path)?;
    let emoji = EmojiStripper::new()?;

    let mut counts = PeopleImportCounts::default();
    let mut warnings = Vec::new();
    let outcome = import_people(
        directory,
        &emoji,
        &mut store,
        &search,
        &args.index_name,
        args.batch_size,
        &mut counts,
        &mut warnings,
    );

    let failure = outcome.as_ref().err().map(|err| format!("{err:#}"));
    let status = if failure.is_some() { "failed" } else { "completed" };
    let report = PeopleImportReport {
        manifest_version: 1,
        run_id,
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        directory_url: args.directory_url.clone(),
        batch_size: args.batch_size,
        index_name: args.index_name.clone(),
        paths: StorePaths {
            db_path: db_path.display().to_string(),
            search_db_path: search_db_path.display().to_string(),
            database: args.store.database.clone(),
            namespace: args.store.namespace.clone(),
        },
        counts: counts.clone(),
        warnings,
        failure,
    };
    write_json_pretty(&report_path, &report)?;
    info!(path = %report_path.display(), status = %report.status, "wrote people import report");

    outcome?;
    info!(
        discovered = counts.profiles_discovered,
        inserted = counts.people_inserted,
        fetch_failures = counts.fetch_failures,
        duplicates = counts.duplicates_skipped,
        relations = counts.relations_resolved,
        "people import finished"
    );

    Ok(())
}

/// Discover, fetch, resolve relationships and insert. The search index is
/// only cleared and rebuilt from the stored people once the insert succeeds.
#[allow(clippy::too_many_arguments)]
pub(super) fn import_people(
    directory: &dyn ProfileDirectory,
    emoji: &EmojiStripper,
    store: &mut dyn DocumentStore,
    search: &dyn SearchIndex,
    index_name: &str,
    batch_size: usize,
    counts: &mut PeopleImportCounts,
    warnings: &mut Vec<String>,
) -> Result<Vec<String>> {
    let snapshot = discover_profiles(directory, emoji, counts, warnings)?;
    let people = resolve_relationships(&snapshot, counts);
    let ids = insert_people(store, &people, batch_size, counts)?;

    let dropped = search
        .delete_index(index_name)
        .with_context(|| format!("failed to clear search index {index_name}"))?;
    info!(index = index_name, dropped, "cleared people search index");

    counts.search_documents_added = reindex_people(store, search, index_name)
        .with_context(|| format!("failed to index people into {index_name}"))?;
    let indexed = search.document_count(index_name)?;
    info!(index = index_name, indexed, "rebuilt people search index");

    Ok(ids)
}
