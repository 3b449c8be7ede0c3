//! Minimal tag/attribute scanning shared by the XRFF reader and the run-summary writer/reader.
//! No XML crate is pulled in for this (see `DESIGN.md`'s Open Question resolutions): the shapes
//! this crate needs to read and write are both fixed and small, so a couple of `str::find` scans
//! do the job without a general-purpose parser.

pub(crate) fn extract_between<'a>(content: &'a str, start_tag: &str, end_tag: &str) -> Option<&'a str> {
    let start = content.find(start_tag)? + start_tag.len();
    let end = content[start..].find(end_tag)? + start;
    Some(&content[start..end])
}

/// Parses `key="value"` pairs out of the text between a tag's name and its closing `>`/`/>`.
pub(crate) fn tag_attrs(tag_inner: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let bytes = tag_inner.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let key_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if key_start == i || i >= bytes.len() || bytes[i] != b'=' {
            break;
        }
        let key = tag_inner[key_start..i].to_string();
        i += 1;
        if i >= bytes.len() || bytes[i] != b'"' {
            break;
        }
        i += 1;
        let val_start = i;
        while i < bytes.len() && bytes[i] != b'"' {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        attrs.push((key, tag_inner[val_start..i].to_string()));
        i += 1;
    }
    attrs
}

pub(crate) fn find_attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

pub(crate) fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
