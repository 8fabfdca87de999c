//! Filename extraction from `Content-Disposition` headers and URL path segments

/// Extracts the filename from a raw Content-Disposition header value.
///
/// Supports `filename="value"`, `filename=value` and the RFC 5987
/// `filename*=UTF-8''percent-encoded` form, which takes precedence.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut filename_from_token: Option<String> = None;

    for param in header_value.trim().split(';') {
        let Some((name, value)) = param.trim().split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();

        if name == "filename*" {
            let lowered = value.to_ascii_lowercase();
            if lowered.starts_with("utf-8''") {
                let decoded = percent_decode(&value["utf-8''".len()..]);
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
        }

        if name == "filename" {
            let unquoted = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
                unescape_quoted(&value[1..value.len() - 1])
            } else {
                value.trim_matches('"').to_string()
            };
            if !unquoted.is_empty() {
                filename_from_token = Some(unquoted);
            }
        }
    }

    filename_from_token
}

/// Last non-empty path segment of a URL, percent-decoded
pub fn last_path_segment(url: &url::Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(percent_decode)
}

/// Reduce an advertised name to a bare file name; rejects anything that would escape its folder
pub fn sanitize_filename(name: &str) -> Option<String> {
    let candidate = name.rsplit(['/', '\\']).next()?.trim();
    if candidate.is_empty() || candidate == "." || candidate == ".." {
        return None;
    }
    Some(candidate.to_string())
}

fn unescape_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '"' || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(high << 4 | low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
