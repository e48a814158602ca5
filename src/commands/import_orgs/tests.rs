use chrono::TimeZone;
use rusqlite::Connection;

use super::*;
use crate::categories::{Blockchain, CategoryFamily, ImpactArea, Topic, Web3};
use crate::store::DocumentFilter;

const HEADER: [&str; COLUMN_COUNT] = [
    "Assignee",
    "Blockchain ecosystem",
    "Date created",
    "Description",
    "Impact area",
    "Logo",
    "Name",
    "preJan20thUpvotes",
    "Upvotes",
    "Reviewed",
    "Submitted by (email)",
    "Submitted by (name)",
    "Submitted by (owner)",
    "Subscribed",
    "Topic",
    "Web3",
];

fn row_with(overrides: &[(usize, &str)]) -> Vec<String> {
    let mut row = vec![String::new(); COLUMN_COUNT];
    for (idx, value) in overrides {
        row[*idx] = value.to_string();
    }
    row
}

fn csv_bytes(rows: &[Vec<String>]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER).expect("header");
    for row in rows {
        writer.write_record(row).expect("row");
    }
    writer.into_inner().expect("flush csv")
}

fn memory_stores() -> (SqliteDocumentStore, SqliteSearchIndex) {
    let store = SqliteDocumentStore::from_connection(
        Connection::open_in_memory().expect("store sqlite"),
        "myseelia",
        "Myseelia",
    )
    .expect("store schema");
    let search = SqliteSearchIndex::from_connection(
        Connection::open_in_memory().expect("search sqlite"),
    )
    .expect("search schema");
    (store, search)
}

#[test]
fn normalize_social_justice_row_leaves_everything_else_absent() {
    let normalizer = RowNormalizer::new().expect("normalizer");
    let row = [
        "", "", "", "", "{Social justice}", "", "Acme", "", "", "", "", "", "", "", "", "",
    ];

    let org = normalizer.normalize(&row).expect("row should normalize");

    let expected = Organization {
        name: "Acme".to_string(),
        impactarea: Some([ImpactArea::SocialJustice].into_iter().collect()),
        ..Organization::default()
    };
    assert_eq!(org, expected);
}

#[test]
fn normalize_blank_name_becomes_empty_string_and_blank_optionals_are_absent() {
    let normalizer = RowNormalizer::new().expect("normalizer");
    let org = normalizer
        .normalize(&row_with(&[(3, "Builds things")]))
        .expect("row should normalize");

    assert_eq!(org.name, "");
    assert_eq!(org.description.as_deref(), Some("Builds things"));
    assert!(org.assignee.is_none());
    assert!(org.logo.is_none());
    assert!(org.reviewed.is_none());
    assert!(org.submittedbyemail.is_none());
    assert!(org.submittedbyname.is_none());
    assert!(org.submittedbyowner.is_none());
    assert!(org.subscribed.is_none());
    assert!(org.datecreated.is_none());
    assert!(org.topic.is_none());
}

#[test]
fn normalize_maps_every_column_position() {
    let normalizer = RowNormalizer::new().expect("normalizer");
    let row = row_with(&[
        (0, "dana"),
        (1, "{Ethereum,\"Regen Network\"}"),
        (2, "03/07/2023 02:05 PM"),
        (3, "desc"),
        (4, "{Carbon}"),
        (5, "https://logo"),
        (6, "Acme"),
        (7, "5"),
        (8, "12"),
        (9, "yes"),
        (10, "a@b.c"),
        (11, "Ann"),
        (12, "owner"),
        (13, "true"),
        (14, "{Move-to-earn,Art}"),
        (15, "{\"Blockchain (L1, L2)\",DAO}"),
    ]);

    let org = normalizer.normalize(&row).expect("row should normalize");

    assert_eq!(org.assignee.as_deref(), Some("dana"));
    assert_eq!(
        org.blockchainecosystem,
        Some([Blockchain::Ethereum, Blockchain::RegenNetwork].into_iter().collect())
    );
    assert_eq!(
        org.datecreated,
        Some(Utc.with_ymd_and_hms(2023, 3, 7, 14, 5, 0).unwrap())
    );
    assert_eq!(org.impactarea, Some([ImpactArea::Carbon].into_iter().collect()));
    assert_eq!(org.logo.as_deref(), Some("https://logo"));
    assert_eq!(org.pre_jan20th_upvotes, Some(5));
    assert_eq!(org.upvotes, Some(12));
    assert_eq!(org.reviewed.as_deref(), Some("yes"));
    assert_eq!(org.submittedbyemail.as_deref(), Some("a@b.c"));
    assert_eq!(org.submittedbyname.as_deref(), Some("Ann"));
    assert_eq!(org.submittedbyowner.as_deref(), Some("owner"));
    assert_eq!(org.subscribed.as_deref(), Some("true"));
    assert_eq!(
        org.topic,
        Some([Topic::MoveToEarn, Topic::Art].into_iter().collect())
    );
    assert_eq!(org.web3, Some([Web3::Blockchain, Web3::Dao].into_iter().collect()));
}

#[test]
fn zero_and_non_digit_counts_are_absent() {
    assert_eq!(parse_count("0"), None);
    assert_eq!(parse_count("000"), None);
    assert_eq!(parse_count(""), None);
    assert_eq!(parse_count("1a"), None);
    assert_eq!(parse_count("-3"), None);
    assert_eq!(parse_count(" 4"), None);
    assert_eq!(parse_count("42"), Some(42));
}

#[test]
fn malformed_date_fails_the_row() {
    assert!(parse_datecreated("").expect("blank date").is_none());
    assert!(matches!(
        parse_datecreated("2023-03-07"),
        Err(NormalizeError::InvalidDate { .. })
    ));

    let normalizer = RowNormalizer::new().expect("normalizer");
    let err = normalizer
        .normalize(&row_with(&[(2, "yesterday"), (6, "Acme")]))
        .expect_err("bad date should fail");
    assert!(err.to_string().contains("yesterday"));
}

#[test]
fn emoji_are_removed_before_lookup_and_storage() {
    let normalizer = RowNormalizer::new().expect("normalizer");
    let org = normalizer
        .normalize(&row_with(&[(4, "{🌱Carbon}"), (5, "🌱"), (6, "Acme 🌍")]))
        .expect("row should normalize");

    assert_eq!(org.impactarea, Some([ImpactArea::Carbon].into_iter().collect()));
    assert!(org.logo.is_none());
    assert_eq!(org.name, "Acme ");
}

#[test]
fn not_applicable_drops_the_rest_of_the_blockchain_cell() {
    let normalizer = RowNormalizer::new().expect("normalizer");
    let org = normalizer
        .normalize(&row_with(&[(1, "{Not applicable,Ethereum}"), (6, "Acme")]))
        .expect("row should normalize");

    assert!(org.blockchainecosystem.is_none());
}

#[test]
fn unknown_category_fails_the_row_with_family() {
    let normalizer = RowNormalizer::new().expect("normalizer");
    let err = normalizer
        .normalize(&row_with(&[(15, "{Hologram}"), (6, "Acme")]))
        .expect_err("unknown web3 label should fail");

    match err {
        NormalizeError::UnknownCategory { token, family } => {
            assert_eq!(token, "Hologram");
            assert_eq!(family, CategoryFamily::Web3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn short_rows_are_padded_with_empty_cells() {
    let normalizer = RowNormalizer::new().expect("normalizer");
    let org = normalizer
        .normalize(&["", "", "", "", "", "", "Acme"])
        .expect("short row should normalize");

    assert_eq!(org.name, "Acme");
    assert!(org.web3.is_none());
}

#[test]
fn load_organizations_commits_chunks_and_mirrors_search_documents() {
    let normalizer = RowNormalizer::new().expect("normalizer");
    let (mut store, search) = memory_stores();
    let data = csv_bytes(&[
        row_with(&[(6, "Regen Farmers"), (14, "{Agriculture}")]),
        vec![String::new(); COLUMN_COUNT],
        row_with(&[(6, "Ocean Guild"), (8, "7")]),
    ]);

    let outcome = load_organizations(
        data.as_slice(),
        &normalizer,
        &mut store,
        &search,
        "organizations",
        2,
    )
    .expect("load should succeed");

    assert_eq!(outcome.counts.rows_read, 3);
    assert_eq!(outcome.counts.rows_inserted, 2);
    assert_eq!(outcome.counts.rows_skipped_blank, 1);
    assert_eq!(outcome.counts.chunks_committed, 2);
    assert_eq!(outcome.counts.search_documents_added, 2);
    assert!(outcome.failures.is_empty());

    let stored = store
        .query(&DocumentFilter::of_type(ORGANIZATION_TYPE))
        .expect("query");
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0]["name"], "Regen Farmers");
    assert_eq!(stored[0]["topic"], serde_json::json!(["Agriculture"]));
    assert!(stored[0].get("upvotes").is_none());
    assert!(stored[0].get("datecreated").is_none());
    assert_eq!(stored[1]["upvotes"], 7);

    let hits = search
        .search("organizations", "ocean", 10)
        .expect("search");
    assert_eq!(hits.len(), 1);
    let full_id = stored[1]["@id"].as_str().expect("id");
    assert_eq!(
        hits[0].get("id").map(String::as_str),
        Some(crate::store::id_suffix(full_id))
    );
    assert_eq!(hits[0].get("upvotes").map(String::as_str), Some("7"));
}

#[test]
fn failed_row_rejects_its_chunk_but_not_later_chunks() {
    let normalizer = RowNormalizer::new().expect("normalizer");
    let (mut store, search) = memory_stores();
    let data = csv_bytes(&[
        row_with(&[(6, "Good One")]),
        row_with(&[(6, "Bad One"), (14, "{Astrology}")]),
        row_with(&[(6, "Good Two")]),
    ]);

    let outcome = load_organizations(
        data.as_slice(),
        &normalizer,
        &mut store,
        &search,
        "organizations",
        2,
    )
    .expect("row failures are reported, not raised");

    assert_eq!(outcome.counts.chunks_failed, 1);
    assert_eq!(outcome.counts.chunks_committed, 1);
    assert_eq!(outcome.counts.rows_failed, 2);
    assert_eq!(outcome.counts.rows_inserted, 1);
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].contains("Astrology"));
    assert!(outcome.failures[0].contains("Topic"));

    let stored = store
        .query(&DocumentFilter::of_type(ORGANIZATION_TYPE))
        .expect("query");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["name"], "Good Two");
    assert_eq!(search.document_count("organizations").expect("count"), 1);
}

#[test]
fn header_only_file_inserts_nothing() {
    let normalizer = RowNormalizer::new().expect("normalizer");
    let (mut store, search) = memory_stores();
    let data = csv_bytes(&[]);

    let outcome = load_organizations(
        data.as_slice(),
        &normalizer,
        &mut store,
        &search,
        "organizations",
        1000,
    )
    .expect("load");

    assert_eq!(outcome.counts.rows_read, 0);
    assert_eq!(outcome.counts.chunks_committed, 0);
    assert!(store.count_by_type().expect("counts").is_empty());
}
