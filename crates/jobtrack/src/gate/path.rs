//! Request path canonicalization.
//!
//! Zones and bypass prefixes are matched against the percent-decoded path.
//! A path that the upstream could resolve to a different location than the
//! one matched here has no canonical form and is refused.

use std::borrow::Cow;

/// Percent-decoded form of a request path, `None` if it cannot be gated safely.
///
/// Refused:
/// - `.` and `..` segments, plain or percent-encoded (`%2e%2e`)
/// - the same with a `;` parameter suffix (`..;`)
/// - encoded separators (`%2f`, `%5c`) and backslashes
/// - bytes that do not decode to UTF-8
pub fn canonical_path(raw: &str) -> Option<Cow<'_, str>> {
    for segment in raw.split('/') {
        let decoded = urlencoding::decode(segment).ok()?;
        if decoded.contains(['/', '\\']) {
            return None;
        }
        let name = decoded.split(';').next().unwrap_or_default();
        if name == "." || name == ".." {
            return None;
        }
    }

    urlencoding::decode(raw).ok()
}
