//! Hashing estable de payloads: fingerprints de stage y de run, hash de
//! definición del grafo y de cada borrador.
pub mod canonical_json;
pub mod hash;

pub use canonical_json::to_canonical_json;
pub use hash::{hash_str, hash_value};
