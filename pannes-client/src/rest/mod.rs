pub mod postgrest;

pub use postgrest::{PageCursor, PostgrestClient, DEFAULT_PAGE_SIZE};
