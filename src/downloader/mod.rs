pub mod batch;
pub mod fetcher;
pub mod pool;

pub use batch::BatchScheduler;
pub use fetcher::{FetchOutcome, Fetcher, HttpFetcher};
pub use pool::WorkerPool;
