pub const DEFAULT_DOMAIN: &str = "www.ga.gov.au";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    domains: Vec<String>,
}

impl AllowList {
    pub fn new(domains: Vec<String>) -> Self {
        Self { domains }
    }

    /// Resolves the allow-list from a raw comma-separated value.
    ///
    /// An absent or empty value falls back to [`DEFAULT_DOMAIN`]. Entries are
    /// trimmed and blanks dropped; duplicates and order are kept as written.
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = match raw {
            Some(value) if !value.is_empty() => value,
            _ => DEFAULT_DOMAIN,
        };

        let domains = raw
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect();

        Self::new(domains)
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn is_default(&self) -> bool {
        self.domains.len() == 1 && self.domains[0] == DEFAULT_DOMAIN
    }

    /// A host is allowed when it equals an entry or is a subdomain of it.
    /// Matching only happens on a `.` boundary, never as a substring.
    pub fn allows(&self, hostname: &str) -> bool {
        self.domains
            .iter()
            .any(|domain| host_matches(hostname, domain))
    }
}

fn host_matches(hostname: &str, domain: &str) -> bool {
    if hostname.eq_ignore_ascii_case(domain) {
        return true;
    }

    let base = domain.strip_prefix('.').unwrap_or(domain);
    if hostname.len() <= base.len() {
        return false;
    }

    let split = hostname.len() - base.len();
    // `split` may land inside a multi-byte char for IDN-looking input
    match (hostname.get(..split), hostname.get(split..)) {
        (Some(head), Some(tail)) => head.ends_with('.') && tail.eq_ignore_ascii_case(base),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ga() -> AllowList {
        AllowList::parse(None)
    }

    #[test]
    fn falls_back_to_default_when_unset_or_empty() {
        assert_eq!(ga().domains(), ["www.ga.gov.au"]);
        assert_eq!(AllowList::parse(Some("")).domains(), ["www.ga.gov.au"]);
        assert!(ga().is_default());
    }

    #[test]
    fn trims_entries_and_drops_blanks() {
        let list = AllowList::parse(Some(" a.com , b.com ,, c.com"));
        assert_eq!(list.domains(), ["a.com", "b.com", "c.com"]);
        assert!(!list.is_default());
    }

    #[test]
    fn keeps_duplicates_in_order() {
        let list = AllowList::parse(Some("b.com,a.com,b.com"));
        assert_eq!(list.domains(), ["b.com", "a.com", "b.com"]);
    }

    #[test]
    fn separators_only_yield_empty_list_that_denies_everything() {
        let list = AllowList::parse(Some(" , ,"));
        assert!(list.domains().is_empty());
        assert!(!list.allows("www.ga.gov.au"));
    }

    #[test]
    fn exact_host_is_allowed() {
        assert!(ga().allows("www.ga.gov.au"));
    }

    #[test]
    fn subdomain_is_allowed() {
        assert!(ga().allows("sub.www.ga.gov.au"));
        assert!(ga().allows("a.b.www.ga.gov.au"));
    }

    #[test]
    fn unrelated_host_is_denied() {
        assert!(!ga().allows("evil.com"));
        assert!(!ga().allows("ga.gov.au"));
    }

    #[test]
    fn substring_lookalikes_are_denied() {
        assert!(!ga().allows("notwww.ga.gov.au"));
        assert!(!ga().allows("www.ga.gov.au.attacker.com"));
        assert!(!ga().allows("evil-www.ga.gov.au.attacker.com"));
    }

    #[test]
    fn leading_dot_entry_matches_subdomains_only() {
        let list = AllowList::parse(Some(".ga.gov.au"));
        assert!(list.allows("www.ga.gov.au"));
        assert!(!list.allows("ga.gov.au"));
        assert!(!list.allows("evilga.gov.au"));
    }

    #[test]
    fn matching_ignores_ascii_case() {
        let list = AllowList::parse(Some("WWW.GA.gov.au"));
        assert!(list.allows("www.ga.gov.au"));
        assert!(list.allows("cdn.www.ga.gov.au"));
    }

    #[test]
    fn any_entry_may_match() {
        let list = AllowList::new(vec!["a.com".into(), "127.0.0.1".into()]);
        assert!(list.allows("127.0.0.1"));
        assert!(list.allows("img.a.com"));
        assert!(!list.allows("b.com"));
    }
}
