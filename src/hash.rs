//! xxHash-based content hashing for move verification
//!
//! Files are streamed through an XXH3-128 hasher in fixed-size chunks so
//! large files never need to be held in memory.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::trace;
use xxhash_rust::xxh3::Xxh3;

/// Size of each read chunk (256KB)
const CHUNK_SIZE: usize = 256 * 1024;

/// Compute the XXH3-128 digest of an entire file
pub fn compute_content_hash(path: &Path) -> io::Result<u128> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, file);
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let hash = hasher.digest128();
    trace!(?path, ?hash, "Computed content hash");
    Ok(hash)
}

/// Whether two files have identical content
pub fn same_content(a: &Path, b: &Path) -> io::Result<bool> {
    if std::fs::metadata(a)?.len() != std::fs::metadata(b)?.len() {
        return Ok(false);
    }
    Ok(compute_content_hash(a)? == compute_content_hash(b)?)
}
