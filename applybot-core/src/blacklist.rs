//! Posting exclusion by company or title fragment.
use applybot_common::Blacklist;

/// True when a company fragment occurs in `company` or a title fragment
/// occurs in `title`, ignoring case.
///
/// Empty fragments match everything, as an empty substring would.
///
/// ```
/// use applybot_common::Blacklist;
/// use applybot_core::blacklist::is_blacklisted;
///
/// let blacklist = Blacklist {
///     companies: vec!["Acme".into()],
///     titles: vec![],
/// };
/// assert!(is_blacklisted("Engineer", "ACME Corp", &blacklist));
/// assert!(!is_blacklisted("Engineer", "Globex", &blacklist));
/// ```
pub fn is_blacklisted(title: &str, company: &str, blacklist: &Blacklist) -> bool {
    contains_any(company, &blacklist.companies) || contains_any(title, &blacklist.titles)
}

fn contains_any(haystack: &str, fragments: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    fragments
        .iter()
        .any(|fragment| haystack.contains(&fragment.to_lowercase()))
}
