pub mod fingerprint;
pub mod sanitize;
#[cfg(test)]
mod testutils;
pub mod walk;

pub use fingerprint::{
    hash_content, hash_file, hash_reader, Fingerprint, FingerprintError, CHUNK_SIZE,
};
pub use sanitize::{sanitize, sanitize_or};
pub use walk::{is_hidden, walk_files};
