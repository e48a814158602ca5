pub mod delete_all;
pub mod export_graph;
pub mod import_orgs;
pub mod import_people;
pub mod search;
pub mod status;
