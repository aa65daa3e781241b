//! Cache key derivation.
//!
//! Every store key is a pure function of the resolver's inputs:
//! dish name -> slug, free-text query -> normalized query,
//! location + tags -> composite key.

/// Separator between the parts of a composite key.
const PART_SEPARATOR: char = '_';

/// Prefix for a separator or escape character occurring inside a part.
const ESCAPE: char = '\\';

/// Trim and lower-case one key part.
fn normalize_part(part: &str) -> String {
    part.trim().to_lowercase()
}

fn push_escaped(key: &mut String, part: &str) {
    for c in part.chars() {
        if c == PART_SEPARATOR || c == ESCAPE {
            key.push(ESCAPE);
        }
        key.push(c);
    }
}

/// Normalize a free-text query ("  Phở Bò " -> "phở bò").
pub fn normalize_query(query: &str) -> String {
    normalize_part(query)
}

/// Build a canonical key from a primary subject and secondary parts.
///
/// The first part is the subject. The remaining parts are normalized, blank
/// ones dropped, then sorted so call-site ordering never changes the key.
/// Whitespace inside the subject is removed ("Quận 1" and "quận1" share a key).
/// Separators inside a part are escaped, so distinct part lists never share a key.
/// A blank subject yields an empty key, which callers treat as "do not query".
pub fn normalize(parts: &[&str]) -> String {
    let Some((subject, rest)) = parts.split_first() else {
        return String::new();
    };

    let subject: String = normalize_part(subject)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if subject.is_empty() {
        return String::new();
    }

    let mut rest: Vec<String> = rest
        .iter()
        .map(|p| normalize_part(p))
        .filter(|p| !p.is_empty())
        .collect();
    rest.sort();
    rest.dedup();

    let mut key = String::with_capacity(subject.len());
    push_escaped(&mut key, &subject);
    for part in rest {
        key.push(PART_SEPARATOR);
        push_escaped(&mut key, &part);
    }
    key
}

/// Composite key for a location and a set of scenario tags.
pub fn composite_key<S: AsRef<str>>(location: &str, tags: &[S]) -> String {
    let mut parts = Vec::with_capacity(tags.len() + 1);
    parts.push(location);
    parts.extend(tags.iter().map(AsRef::as_ref));
    normalize(&parts)
}

/// URL-safe, diacritic-free, hyphenated identifier for a dish name.
///
/// "Phở Bò Tái" -> "pho-bo-tai", "Bánh Đa Cua" -> "banh-da-cua".
pub fn slugify(name: &str) -> String {
    slug::slugify(name.trim())
}
