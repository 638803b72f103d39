use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const TOKEN_LEN: usize = 13;
const FALLBACK_EXTENSION: &str = "img";

static NOT_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]").expect("invalid extension pattern"));

pub fn random_token(len: usize) -> String {
    let mut rng = rand::rng();

    (0..len)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Lowercase and strip everything outside `[a-z0-9]`.
pub fn sanitize_extension(raw: &str) -> String {
    NOT_ALPHANUMERIC
        .replace_all(&raw.to_lowercase(), "")
        .into_owned()
}

/// Extension of the original file name, else the MIME subtype.
pub fn file_extension(file_name: &str, content_type: &str) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| sanitize_extension(ext))
        .filter(|ext| !ext.is_empty());

    from_name
        .or_else(|| {
            content_type
                .split_once('/')
                .map(|(_, subtype)| subtype.split(';').next().unwrap_or_default())
                .map(sanitize_extension)
                .filter(|ext| !ext.is_empty())
        })
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// `{token}_{unix millis}.{ext}`, unique enough for concurrent staff uploads.
pub fn storage_key(file_name: &str, content_type: &str, now_millis: i64) -> String {
    format!(
        "{}_{}.{}",
        random_token(TOKEN_LEN),
        now_millis,
        file_extension(file_name, content_type)
    )
}
