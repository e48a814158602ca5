use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cli::ImportPeopleArgs;
use crate::emoji::EmojiStripper;
use crate::model::{PERSON_TYPE, PeopleImportCounts, PeopleImportReport, Person, StorePaths};
use crate::search_index::{SearchIndex, SqliteSearchIndex, flatten_document};
use crate::store::{
    DocumentFilter, DocumentStore, KeyStrategy, NewDocument, SqliteDocumentStore, value_hash_id,
};
use crate::util::{ensure_parent_directory, now_utc_string, utc_compact_string, write_json_pretty};

mod builder;
mod directory;
mod run;

pub use run::run;

use builder::*;
use directory::*;
