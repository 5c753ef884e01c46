pub mod ranking;
pub mod record;

pub use ranking::RankingStore;
pub use record::{OrderBy, UrlRecord};
