//! `Content-Disposition` values for document downloads.
//!
//! The plain `filename` parameter carries an ASCII fallback so the header
//! stays valid for any stored name. The exact name travels percent-encoded
//! in `filename*`.

/// Build `attachment; filename="..."; filename*=UTF-8''...` for `filename`.
pub fn attachment(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    let encoded = urlencoding::encode(filename);
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

/// Recover the filename from a header value, preferring `filename*`.
pub fn parse_filename(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').map(str::trim) {
        if let Some(ext) = param.strip_prefix("filename*=") {
            let encoded = ext
                .strip_prefix("UTF-8''")
                .or_else(|| ext.strip_prefix("utf-8''"))?;
            return urlencoding::decode(encoded).ok().map(|s| s.into_owned());
        }
        if let Some(raw) = param.strip_prefix("filename=") {
            plain = Some(raw.trim_matches('"').to_string());
        }
    }
    plain
}
