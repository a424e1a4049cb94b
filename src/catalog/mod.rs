mod models;
mod schema;
mod series;
mod store;

pub use models::{parse_release_date, Dataset, Issue, Series};
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use series::SeriesCatalog;
pub use store::{create_catalog_db, insert_issue, load_issue_catalog, IssueCatalog, IssueStore};
