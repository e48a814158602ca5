use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{info, warn};

use crate::categories::{NormalizeError, Resolvable, resolve_cell};
use crate::cli::ImportOrgsArgs;
use crate::emoji::EmojiStripper;
use crate::model::{
    ORGANIZATION_TYPE, OrgImportCounts, OrgImportReport, Organization, StorePaths,
};
use crate::search_index::{FlatDocument, SearchIndex, SqliteSearchIndex, flatten_document};
use crate::store::{DocumentStore, KeyStrategy, NewDocument, SqliteDocumentStore};
use crate::util::{
    ensure_parent_directory, non_empty, now_utc_string, utc_compact_string, write_json_pretty,
};

mod loader;
mod normalize;
mod run;
#[cfg(test)]
mod tests;

pub use run::run;

use loader::*;
use normalize::*;
