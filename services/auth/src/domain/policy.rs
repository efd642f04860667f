//! Email syntax and role/domain policy checks.

/// Local part of an email address (everything before the first `@`).
pub fn local_part(email: &str) -> &str {
    email.split_once('@').map_or(email, |(local, _)| local)
}

/// Domain part of an email address, if present.
pub fn domain_part(email: &str) -> Option<&str> {
    email.split_once('@').map(|(_, domain)| domain)
}

/// Syntactic email check: one `@`, non-empty parts, a dotted domain, no
/// whitespace, conservative ASCII charset. Deliverability is not our problem;
/// this only rejects addresses the mail store could never hold.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let domain_ok = domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || ".-".contains(c));
    local_ok && domain_ok
}

/// Whether `email`'s domain is permitted for a role. An empty list is the
/// "all domains" sentinel; matching is case-insensitive and tolerates a
/// leading `@` on stored entries.
pub fn is_domain_permitted(avail_domains: &[String], email: &str) -> bool {
    if avail_domains.is_empty() {
        return true;
    }
    let Some(domain) = domain_part(email) else {
        return false;
    };
    avail_domains
        .iter()
        .any(|d| d.trim_start_matches('@').eq_ignore_ascii_case(domain))
}
