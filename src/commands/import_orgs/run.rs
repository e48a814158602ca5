use super::*;

pub fn run(args: ImportOrgsArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("orgs-{}", utc_compact_string(started_ts));

    let db_path = args.store.resolved_db_path();
    let search_db_path = args.store.resolved_search_db_path();
    let report_path = args.report_path.clone().unwrap_or_else(|| {
        args.store
            .report_dir()
            .join(format!("import_orgs_{}.json", utc_compact_string(started_ts)))
    });
    ensure_parent_directory(&db_path)?;
    ensure_parent_directory(&search_db_path)?;

    info!(
        csv = %args.csv_path.display(),
        run_id = %run_id,
        chunk_size = args.chunk_size,
        "starting organization import"
    );

    let mut store =
        SqliteDocumentStore::connect(&db_path, &args.store.database, &args.store.namespace)?;
    let search = SqliteSearchIndex::open(&search_db_path)?;
    let normalizer = RowNormalizer::new()?;

    let file = File::open(&args.csv_path)
        .with_context(|| format!("failed to open {}", args.csv_path.display()))?;

    let outcome = load_organizations(
        file,
        &normalizer,
        &mut store,
        &search,
        &args.index_name,
        args.chunk_size,
    )?;

    let status = if outcome.counts.chunks_failed == 0 {
        "completed"
    } else {
        "completed_with_failures"
    };

    let report = OrgImportReport {
        manifest_version: 1,
        run_id,
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        csv_path: args.csv_path.display().to_string(),
        chunk_size: args.chunk_size,
        index_name: args.index_name.clone(),
        paths: StorePaths {
            db_path: db_path.display().to_string(),
            search_db_path: search_db_path.display().to_string(),
            database: args.store.database.clone(),
            namespace: args.store.namespace.clone(),
        },
        counts: outcome.counts.clone(),
        failures: outcome.failures.clone(),
    };
    write_json_pretty(&report_path, &report)?;

    info!(path = %report_path.display(), "wrote organization import report");
    info!(
        rows_read = outcome.counts.rows_read,
        inserted = outcome.counts.rows_inserted,
        skipped_blank = outcome.counts.rows_skipped_blank,
        failed = outcome.counts.rows_failed,
        "organization import finished"
    );

    if outcome.counts.chunks_failed > 0 {
        bail!(
            "{} of {} organization chunks were rejected; first failure: {}",
            outcome.counts.chunks_failed,
            outcome.counts.chunks_failed + outcome.counts.chunks_committed,
            outcome.failures.first().map(String::as_str).unwrap_or("unknown")
        );
    }

    Ok(())
}
