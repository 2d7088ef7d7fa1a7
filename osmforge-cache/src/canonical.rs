//! Byte canonicalization and hashing.
//!
//! Content hashes must not change when a file is checked out with CRLF line
//! endings or a UTF-8 BOM, so hashing goes through a canonical byte stream:
//! BOM stripped, CRLF and lone CR normalized to LF.

use sha2::{Digest, Sha256};
use xxhash_rust::xxh3::xxh3_64;

use osmforge_core::config::ModuleSelection;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Normalize a byte stream: strip a leading BOM, fold CRLF/CR to LF.
pub fn canonicalize(bytes: &[u8]) -> Vec<u8> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().peekable();
    while let Some(&b) = iter.next() {
        if b == b'\r' {
            if iter.peek() == Some(&&b'\n') {
                iter.next();
            }
            out.push(b'\n');
        } else {
            out.push(b);
        }
    }
    out
}

/// Lowercase hex SHA-256 of the canonicalized bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonicalize(bytes));
    hex_encode(&hasher.finalize())
}

/// Lowercase hex SHA-256 over already-canonical text.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Stable hash of `(includeSystem, includeInactive, sorted(moduleNames))`.
pub fn module_selection_hash(selection: &ModuleSelection) -> String {
    let names = selection.sorted_names().join(",").to_ascii_lowercase();
    let payload = format!(
        "{}|{}|{}",
        selection.include_system, selection.include_inactive, names
    );
    format!("{:016x}", xxh3_64(payload.as_bytes()))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use osmforge_core::types::ModuleName;

    #[test]
    fn crlf_and_bom_do_not_change_the_hash() {
        let unix = b"line one\nline two\n";
        let windows = b"\xEF\xBB\xBFline one\r\nline two\r\n";
        let old_mac = b"line one\rline two\r";
        assert_eq!(content_hash(unix), content_hash(windows));
        assert_eq!(content_hash(unix), content_hash(old_mac));
    }

    #[test]
    fn hashes_are_64_char_lowercase_hex() {
        let hash = content_hash(b"payload");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn selection_hash_ignores_module_order_and_case() {
        let a = ModuleSelection {
            include_system: false,
            include_inactive: false,
            modules: vec![
                ModuleName::new("Sales").unwrap(),
                ModuleName::new("Billing").unwrap(),
            ],
        };
        let b = ModuleSelection {
            include_system: false,
            include_inactive: false,
            modules: vec![
                ModuleName::new("BILLING").unwrap(),
                ModuleName::new("sales").unwrap(),
            ],
        };
        assert_eq!(module_selection_hash(&a), module_selection_hash(&b));

        let c = ModuleSelection {
            include_system: true,
            ..a.clone()
        };
        assert_ne!(module_selection_hash(&a), module_selection_hash(&c));
    }
}
