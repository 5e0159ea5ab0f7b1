//! Quota-sized work partitioning.
//!
//! Splits the page range `1..=total_pages` into chunks of at most `quota`
//! URLs (one chunk per worker identity), and reads/writes the on-disk plan:
//! one newline-delimited `chunk_NNN.txt` per chunk plus `manifest.json`.

mod chunk;
mod manifest;

pub use chunk::{page_url, partition, PartitionError, WorkChunk, PAGE_PLACEHOLDER};
pub use manifest::{
    chunk_file_name, id_width, load_chunk, parse_chunk_id, read_manifest, write_plan,
    ChunkManifest, MANIFEST_FILE,
};
