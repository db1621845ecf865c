//! Release download and verification.
//!
//! ```text
//! RetryDownloader
//!         │
//!         ├── HttpFetcher (trait)
//!         │       └── HttpDownloader (reqwest, blocking)
//!         │
//!         └── checksum (SHA-512 against sidecar or remote digest)
//! ```

mod checksum;
mod http;
mod retry;

pub use checksum::{
    calculate_sha512, check_sum, expected_checksum, is_sha512_hex, normalize_digest, verify_checksum,
};
pub use http::{HttpDownloader, HttpFetcher};
pub use retry::RetryDownloader;
