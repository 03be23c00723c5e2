//! Identifiers: thread IDs, item hashes, slugs and filename parsing.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use md5::{Digest, Md5};
use regex::Regex;

use crate::error::{Error, Result};

pub const ID_LEN: usize = 6;
pub const ID_ATTEMPTS: usize = 10;

static ID_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{6}$").unwrap());
static ID_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9a-f]{6})-").unwrap());
static SLUG_NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// True for a bare 6-character lowercase hex ID.
pub fn is_id(s: &str) -> bool {
    ID_ONLY_RE.is_match(s)
}

/// Draw IDs until one is absent from `existing`, giving up after [`ID_ATTEMPTS`].
pub fn allocate_id<F>(existing: &HashSet<String>, mut draw: F) -> Result<String>
where
    F: FnMut() -> Result<[u8; 3]>,
{
    for _ in 0..ID_ATTEMPTS {
        let bytes = draw()?;
        let id = hex(&bytes);
        if !existing.contains(&id) {
            return Ok(id);
        }
    }
    Err(Error::IdExhausted(ID_ATTEMPTS))
}

/// Three bytes from the OS entropy source.
pub fn random_id_bytes() -> Result<[u8; 3]> {
    let mut bytes = [0u8; 3];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| Error::io("failed to generate random bytes", std::io::Error::other(e.to_string())))?;
    Ok(bytes)
}

/// 4-hex item hash over the text plus the current time in nanoseconds.
///
/// Not content-addressed: the same text added twice gets different hashes
/// (almost always), and two different texts may collide.
pub fn generate_hash(text: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    hash_with_seed(text, nanos)
}

fn hash_with_seed(text: &str, seed: u128) -> String {
    let mut hasher = Md5::new();
    hasher.update(format!("{}{}", text, seed).as_bytes());
    let digest = hasher.finalize();
    hex(&digest[..2])
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Lowercase, collapse non-alphanumeric runs to single hyphens, trim hyphens.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    SLUG_NON_ALNUM_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// ID prefix of a thread filename, if it has one.
pub fn extract_id_from_path(path: &Path) -> Option<String> {
    let filename = path.file_name()?.to_string_lossy();
    ID_PREFIX_RE
        .captures(filename.trim_end_matches(".md"))
        .map(|c| c[1].to_string())
}

/// Display name of a thread: the filename minus ID prefix and extension.
pub fn extract_name_from_path(path: &Path) -> String {
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = filename.trim_end_matches(".md");

    if ID_PREFIX_RE.is_match(stem) && stem.len() > ID_LEN + 1 {
        stem[ID_LEN + 1..].to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        let cases = vec![
            ("Hello World", "hello-world"),
            ("Hello, World!!", "hello-world"),
            ("---lead--trail---", "lead-trail"),
            ("Fix login bug", "fix-login-bug"),
            ("Fix: bug in parser", "fix-bug-in-parser"),
            ("Remove   extra   spaces", "remove-extra-spaces"),
            ("Special!@#$%chars", "special-chars"),
            ("MixedCASE", "mixedcase"),
            ("already-kebab-case", "already-kebab-case"),
            ("123 numbers first", "123-numbers-first"),
            ("!!!", ""),
        ];

        for (title, want) in cases {
            let got = slugify(title);
            assert_eq!(got, want, "slugify({:?}) = {:?}, want {:?}", title, got, want);
        }
    }

    #[test]
    fn test_extract_id_from_path() {
        let cases = vec![
            ("abc123-my-thread.md", Some("abc123")),
            ("/path/to/abc123-my-thread.md", Some("abc123")),
            ("deadbe-another-one.md", Some("deadbe")),
            ("no-id-here.md", None),
            ("ABC123-uppercase.md", None),
            ("ab123-too-short.md", None),
            ("abc1234-too-long.md", None),
        ];

        for (path, want) in cases {
            let got = extract_id_from_path(Path::new(path));
            assert_eq!(
                got.as_deref(),
                want,
                "extract_id_from_path({:?}) = {:?}, want {:?}",
                path,
                got,
                want
            );
        }
    }

    #[test]
    fn test_extract_name_from_path() {
        let cases = vec![
            ("abc123-my-thread.md", "my-thread"),
            ("/path/to/abc123-my-thread.md", "my-thread"),
            ("abc123-multi-word-name.md", "multi-word-name"),
            ("no-id-here.md", "no-id-here"),
        ];

        for (path, want) in cases {
            let got = extract_name_from_path(Path::new(path));
            assert_eq!(got, want, "extract_name_from_path({:?}) = {:?}, want {:?}", path, got, want);
        }
    }

    #[test]
    fn test_is_id() {
        assert!(is_id("abc123"));
        assert!(!is_id("abc12"));
        assert!(!is_id("ABC123"));
        assert!(!is_id("abc123-x"));
    }

    #[test]
    fn test_hash_shape() {
        let h = generate_hash("check session expiry");
        assert_eq!(h.len(), 4);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_depends_on_seed() {
        assert_eq!(hash_with_seed("x", 1), hash_with_seed("x", 1));
        let distinct: HashSet<String> = (0..64).map(|s| hash_with_seed("x", s)).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_allocate_id_skips_existing() {
        let existing: HashSet<String> = ["000000".to_string()].into_iter().collect();
        let mut draws = vec![[0, 0, 0], [0xab, 0xcd, 0xef]].into_iter();
        let id = allocate_id(&existing, || Ok(draws.next().unwrap())).unwrap();
        assert_eq!(id, "abcdef");
    }

    #[test]
    fn test_allocate_id_exhausts() {
        let existing: HashSet<String> = ["0a0b0c".to_string()].into_iter().collect();
        let mut calls = 0;
        let err = allocate_id(&existing, || {
            calls += 1;
            Ok([0x0a, 0x0b, 0x0c])
        })
        .unwrap_err();
        assert!(matches!(err, Error::IdExhausted(ID_ATTEMPTS)));
        assert_eq!(calls, ID_ATTEMPTS);
    }
}
