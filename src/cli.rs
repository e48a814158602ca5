use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_DIRECTORY_URL: &str =
    "https://test-index.murmurations.network/v2/nodes?schema=person_schema-v0.1.0";

#[derive(Parser, Debug)]
#[command(
    name = "myseelia-ingest",
    version,
    about = "Loads Myseelia organizations and people into the document store and search index"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    ImportOrgs(ImportOrgsArgs),
    ImportPeople(ImportPeopleArgs),
    ExportGraph(ExportGraphArgs),
    DeleteAll(DeleteAllArgs),
    Search(SearchArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, default_value = ".cache/myseelia")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub search_db_path: Option<PathBuf>,

    #[arg(long, default_value = "myseelia")]
    pub database: String,

    #[arg(long, default_value = "Myseelia")]
    pub namespace: String,
}

impl StoreArgs {
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.data_root.join("myseelia.sqlite"))
    }

    pub fn resolved_search_db_path(&self) -> PathBuf {
        self.search_db_path
            .clone()
            .unwrap_or_else(|| self.data_root.join("search.sqlite"))
    }

    pub fn report_dir(&self) -> PathBuf {
        self.data_root.join("reports")
    }
}

#[derive(Args, Debug, Clone)]
pub struct ImportOrgsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value = "Organizations.csv")]
    pub csv_path: PathBuf,

    #[arg(long, default_value_t = 1000)]
    pub chunk_size: usize,

    #[arg(long, default_value = "organizations")]
    pub index_name: String,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportPeopleArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value = DEFAULT_DIRECTORY_URL)]
    pub directory_url: String,

    #[arg(long, default_value_t = 100)]
    pub batch_size: usize,

    #[arg(long, default_value = "people")]
    pub index_name: String,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ExportGraphArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value = "knowledge_graph.json")]
    pub output_path: PathBuf,

    #[arg(long, default_value = "person")]
    pub doc_type: String,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteAllArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub doc_type: String,

    #[arg(long)]
    pub index_name: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub index_name: String,

    #[arg(long)]
    pub query: String,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}
