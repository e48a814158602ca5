use super::*;

pub(super) const COMMIT_MESSAGE: &str = "Adding people";
const VOUCHES_FOR: &str = "VOUCHES_FOR";
const LI: &str = "LI";
const MISSING_NAME: &str = "None";

/// A profile that survived dedup, with its store id fixed up front.
#[derive(Debug, Clone)]
pub(super) struct MaterializedPerson {
    pub(super) id: String,
    pub(super) profile_url: String,
    pub(super) person: Person,
    pub(super) knows: Vec<KnowsEntry>,
}

#[derive(Debug)]
pub(super) enum ProfileOutcome {
    Materialized(MaterializedPerson),
    Duplicate { profile_url: String },
    Nameless { profile_url: String },
    Failed(FetchError),
}

/// Everything the first pass learned; the relationship pass reads it only.
#[derive(Debug, Default)]
pub(super) struct ProfileSnapshot {
    pub(super) people: Vec<MaterializedPerson>,
    pub(super) directory_urls: HashSet<String>,
    pub(super) ids_by_url: HashMap<String, String>,
}

pub(super) fn discover_profiles(
    directory: &dyn ProfileDirectory,
    emoji: &EmojiStripper,
    counts: &mut PeopleImportCounts,
    warnings: &mut Vec<String>,
) -> Result<ProfileSnapshot> {
    let stubs = directory.list_profiles()?;
    counts.profiles_discovered = stubs.len();
    info!(profiles = stubs.len(), "discovered profile stubs");

    let mut snapshot = ProfileSnapshot {
        directory_urls: stubs.iter().map(|stub| stub.profile_url.clone()).collect(),
        ..ProfileSnapshot::default()
    };
    let mut seen = HashSet::<String>::new();

    for stub in &stubs {
        match fetch_and_materialize(directory, emoji, stub, &seen) {
            ProfileOutcome::Materialized(person) => {
                counts.profiles_fetched += 1;
                seen.insert(stub.profile_url.clone());
                seen.insert(person.profile_url.clone());
                for url in [&stub.profile_url, &person.profile_url] {
                    snapshot
                        .ids_by_url
                        .entry(url.clone())
                        .or_insert_with(|| person.id.clone());
                }
                snapshot.people.push(person);
            }
            ProfileOutcome::Duplicate { profile_url } => {
                counts.profiles_fetched += 1;
                counts.duplicates_skipped += 1;
                info!(profile_url = %profile_url, "skipping duplicate profile");
            }
            ProfileOutcome::Nameless { profile_url } => {
                counts.profiles_fetched += 1;
                counts.nameless_skipped += 1;
                warn!(profile_url = %profile_url, "discarding profile without a name");
            }
            ProfileOutcome::Failed(err) => {
                counts.fetch_failures += 1;
                warn!(error = %err, "profile fetch failed");
                warnings.push(err.to_string());
            }
        }
    }

    Ok(snapshot)
}

fn fetch_and_materialize(
    directory: &dyn ProfileDirectory,
    emoji: &EmojiStripper,
    stub: &ProfileStub,
    seen: &HashSet<String>,
) -> ProfileOutcome {
    let body = match directory.fetch_profile(&stub.profile_url) {
        Ok(body) => body,
        Err(err) => return ProfileOutcome::Failed(err),
    };

    let profile_url = body
        .profile_url
        .clone()
        .unwrap_or_else(|| stub.profile_url.clone());
    if seen.contains(&profile_url) || seen.contains(&stub.profile_url) {
        return ProfileOutcome::Duplicate { profile_url };
    }

    let Some(name) = clean_name(emoji, body.name.as_deref()) else {
        return ProfileOutcome::Nameless { profile_url };
    };

    ProfileOutcome::Materialized(MaterializedPerson {
        id: value_hash_id(PERSON_TYPE, &profile_url),
        profile_url,
        person: Person {
            name: Some(name),
            description: body.description,
            image: body.image,
            locality: body.locality,
            primary_url: body.primary_url,
            ..Person::default()
        },
        knows: body.knows,
    })
}

fn clean_name(emoji: &EmojiStripper, raw: Option<&str>) -> Option<String> {
    let cleaned = emoji.strip(raw?);
    if cleaned.trim().is_empty() || cleaned == MISSING_NAME {
        None
    } else {
        Some(cleaned)
    }
}

/// Fills `vouches_for` and `LI` from each person's `knows` list. Targets are
/// matched by profile url and must be both listed in the directory and
/// materialized in this run.
pub(super) fn resolve_relationships(
    snapshot: &ProfileSnapshot,
    counts: &mut PeopleImportCounts,
) -> Vec<MaterializedPerson> {
    let mut resolved = Vec::with_capacity(snapshot.people.len());

    for entry in &snapshot.people {
        let mut person = entry.clone();
        for knows in &entry.knows {
            let target = knows
                .url
                .as_deref()
                .filter(|url| snapshot.directory_urls.contains(*url))
                .and_then(|url| snapshot.ids_by_url.get(url));

            let Some(target) = target else {
                counts.relations_dropped += 1;
                continue;
            };

            let inserted = match knows.relation_type.as_deref() {
                Some(VOUCHES_FOR) => person.person.vouches_for.insert(target.clone()),
                Some(LI) => person.person.li.insert(target.clone()),
                other => {
                    debug!(
                        source = %entry.profile_url,
                        known_name = knows.name.as_deref().unwrap_or_default(),
                        relation_type = other.unwrap_or_default(),
                        "ignoring unrecognized relationship type"
                    );
                    counts.relations_dropped += 1;
                    continue;
                }
            };
            if inserted {
                counts.relations_resolved += 1;
            }
        }
        resolved.push(person);
    }

    resolved
}

/// Inserts people `batch_size` at a time and returns ids in insertion order.
pub(super) fn insert_people(
    store: &mut dyn DocumentStore,
    people: &[MaterializedPerson],
    batch_size: usize,
    counts: &mut PeopleImportCounts,
) -> Result<Vec<String>> {
    let mut inserted = Vec::with_capacity(people.len());

    for batch in people.chunks(batch_size.max(1)) {
        let documents = batch
            .iter()
            .map(|entry| {
                NewDocument::from_serializable(
                    PERSON_TYPE,
                    KeyStrategy::ValueHash(entry.profile_url.clone()),
                    &entry.person,
                )
            })
            .collect::<Result<Vec<NewDocument>>>()?;

        let ids = store.insert(&documents, COMMIT_MESSAGE).with_context(|| {
            format!(
                "failed to insert people batch {}; existing people must be removed with delete-all first",
                counts.batches_committed + 1
            )
        })?;
        counts.batches_committed += 1;
        counts.people_inserted += ids.len();
        info!(batch = counts.batches_committed, inserted = ids.len(), "inserted people batch");
        inserted.extend(ids);
    }

    Ok(inserted)
}

/// Rebuilds the people search index from every stored person.
pub(super) fn reindex_people(
    store: &dyn DocumentStore,
    search: &dyn SearchIndex,
    index_name: &str,
) -> Result<usize> {
    let documents = store.query(&DocumentFilter::of_type(PERSON_TYPE))?;
    let flattened = documents
        .iter()
        .map(flatten_document)
        .collect::<Result<Vec<_>>>()?;
    search.add_documents(index_name, &flattened)
}
