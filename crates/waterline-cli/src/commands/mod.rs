pub mod ingest;
pub mod quarantine;
pub mod query;
pub mod vocab;
