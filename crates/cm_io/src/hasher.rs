//! crates/cm_io/src/hasher.rs
//!
//! Deterministic hashing and ID builders for canonical artifacts.
//!
//! - Canonical JSON hashing: UTF-8, **sorted object keys**, array order preserved.
//! - `RES:` ids derive from the canonical bytes of the result payload.
//! - Hex digests are **lowercase**.
//!
//! Use `sha256_canonical(..)` for JSON values/structs and `sha256_hex(..)` or
//! `sha256_file(..)` for raw bytes/files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use cm_core::ids::{is_valid_sha256, ResultId};

use crate::canonical_json::to_canonical_bytes;
use crate::{IoError, IoResult};

/* ------------------------------- Raw hashing ------------------------------- */

/// SHA-256 over raw bytes, lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over a reader stream (raw, not canonicalized).
pub fn sha256_stream<R: Read>(reader: &mut R) -> IoResult<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// SHA-256 over a file's raw bytes.
pub fn sha256_file(path: &Path) -> IoResult<String> {
    let f = File::open(path).map_err(|e| IoError::Hash(format!("{}: {e}", path.display())))?;
    sha256_stream(&mut BufReader::new(f))
}

/* ---------------------------- Canonical hashing ---------------------------- */

/// SHA-256 over **canonical JSON bytes** of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> IoResult<String> {
    Ok(sha256_hex(&to_canonical_bytes(value)?))
}

/// `RES:<hex>` for a result payload (hash of its canonical bytes).
pub fn res_id_from_canonical<T: Serialize>(value: &T) -> IoResult<ResultId> {
    let hex = sha256_canonical(value)?;
    ResultId::from_digest(&hex).map_err(|e| IoError::Hash(e.to_string()))
}

/// Reject anything but a lowercase 64-hex digest.
pub fn check_digest_shape(label: &str, hex: &str) -> IoResult<()> {
    if !is_valid_sha256(hex) {
        return Err(IoError::Hash(format!("{label}: expected lowercase 64-hex, got `{hex}`")));
    }
    Ok(())
}

/* ------------------------------------ Tests ------------------------------------ */

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_encoding_is_lowercase() {
        let h = sha256_hex(b"abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert!(check_digest_shape("abc", &h).is_ok());
        assert!(check_digest_shape("upper", &h.to_uppercase()).is_err());
    }

    #[test]
    fn canonical_hashing_ignores_field_order() {
        #[derive(Serialize)]
        struct T {
            b: u32,
            a: u32,
        }
        let h1 = sha256_canonical(&T { b: 2, a: 1 }).unwrap();
        let h2 = sha256_canonical(&json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1, sha256_hex(br#"{"a":1,"b":2}"#));
    }

    #[test]
    fn result_ids() {
        let id = res_id_from_canonical(&json!({"x": 1})).unwrap();
        assert!(id.as_str().starts_with("RES:"));
        assert_eq!(id.digest(), sha256_hex(br#"{"x":1}"#));
    }

    #[test]
    fn file_and_stream_agree() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("f.bin");
        std::fs::write(&p, b"abc").unwrap();
        assert_eq!(sha256_file(&p).unwrap(), sha256_hex(b"abc"));
        assert!(sha256_file(&dir.path().join("missing")).is_err());
    }
}
