mod fetcher;
mod scheduler;

pub use fetcher::{FetchKind, Fetcher};
pub use scheduler::RefreshScheduler;
