use std::{fs, io::Read, path::Path};

/// Characters cp1252 assigns to 0x80..=0x9F; `None` marks the five undefined bytes.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

/// Reads at most `max_bytes` of `path` as text.
///
/// Unreadable files yield an empty string; callers treat that as "nothing to
/// see" rather than an error.
pub fn read_file_safe(path: &Path, max_bytes: usize) -> String {
    read_prefix(path, max_bytes)
        .map(|bytes| {
            let cut_short = bytes.len() == max_bytes;
            decode(&bytes, cut_short)
        })
        .unwrap_or_default()
}

fn read_prefix(path: &Path, max_bytes: usize) -> std::io::Result<Vec<u8>> {
    let file = fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.take(max_bytes as u64).read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// UTF-8, then cp1252, then latin-1 (which accepts any byte sequence).
///
/// `cut_short` says `bytes` may end mid code point because the read stopped
/// at its limit; only then is an incomplete trailing sequence dropped.
pub fn decode(bytes: &[u8], cut_short: bool) -> String {
    if let Some(text) = decode_utf8(bytes, cut_short) {
        return text;
    }
    if let Some(text) = decode_cp1252(bytes) {
        return text;
    }
    decode_latin1(bytes)
}

fn decode_utf8(bytes: &[u8], cut_short: bool) -> Option<String> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Some(s.to_string()),
        Err(e) if cut_short && e.error_len().is_none() => {
            Some(String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned())
        }
        Err(_) => None,
    }
}

fn decode_cp1252(bytes: &[u8]) -> Option<String> {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
            _ => Some(b as char),
        })
        .collect()
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Leading `max_chars` characters of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
