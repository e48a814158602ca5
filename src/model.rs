use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::categories::{Blockchain, ImpactArea, Topic, Web3};

pub const ORGANIZATION_TYPE: &str = "Organization";
pub const PERSON_TYPE: &str = "person";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Organization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchainecosystem: Option<BTreeSet<Blockchain>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datecreated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impactarea: Option<BTreeSet<ImpactArea>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub name: String,
    #[serde(rename = "preJan20thUpvotes", skip_serializing_if = "Option::is_none")]
    pub pre_jan20th_upvotes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submittedbyemail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submittedbyname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submittedbyowner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<BTreeSet<Topic>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upvotes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web3: Option<BTreeSet<Web3>>,
}

/// A person as stored: relationship sets hold the document ids of other people.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Person {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_url: Option<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub vouches_for: BTreeSet<String>,
    #[serde(rename = "LI", skip_serializing_if = "BTreeSet::is_empty")]
    pub li: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEntity {
    pub id: String,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphRelation {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub relation_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeGraph {
    pub entities: Vec<GraphEntity>,
    pub relations: Vec<GraphRelation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorePaths {
    pub db_path: String,
    pub search_db_path: String,
    pub database: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OrgImportCounts {
    pub rows_read: usize,
    pub rows_inserted: usize,
    pub rows_skipped_blank: usize,
    pub rows_failed: usize,
    pub chunks_committed: usize,
    pub chunks_failed: usize,
    pub search_documents_added: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrgImportReport {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub csv_path: String,
    pub chunk_size: usize,
    pub index_name: String,
    pub paths: StorePaths,
    pub counts: OrgImportCounts,
    pub failures: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PeopleImportCounts {
    pub profiles_discovered: usize,
    pub profiles_fetched: usize,
    pub fetch_failures: usize,
    pub duplicates_skipped: usize,
    pub nameless_skipped: usize,
    pub people_inserted: usize,
    pub batches_committed: usize,
    pub relations_resolved: usize,
    pub relations_dropped: usize,
    pub search_documents_added: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeopleImportReport {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub directory_url: String,
    pub batch_size: usize,
    pub index_name: String,
    pub paths: StorePaths,
    pub counts: PeopleImportCounts,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}
