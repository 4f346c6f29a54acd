mod deduper;
mod handle;

pub use deduper::RequestDeduper;
pub use handle::FetchHandle;
