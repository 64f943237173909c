//! Destination-address selection.
//!
//! An exported message carries several candidate destination addresses
//! (To lines, then Cc lines). Exercises designate a clearinghouse
//! address the submission "counts" toward; the resolver picks it by
//! layered preference rules rather than trusting header order.

use serde::Deserialize;

/// Envelope-routing prefix some gateways prepend to the real address.
const ROUTING_PREFIX: &str = "SMTP:";

/// Preferred / not-preferred address fragments, each split into prefix
/// and suffix sets. Built from comma-separated config strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPreferences {
    pub preferred_prefixes: Vec<String>,
    pub preferred_suffixes: Vec<String>,
    pub not_preferred_prefixes: Vec<String>,
    pub not_preferred_suffixes: Vec<String>,
}

impl AddressPreferences {
    /// Split comma-separated config strings into the four sets.
    pub fn from_lists(
        preferred_prefixes: &str,
        preferred_suffixes: &str,
        not_preferred_prefixes: &str,
        not_preferred_suffixes: &str,
    ) -> Self {
        Self {
            preferred_prefixes: split_list(preferred_prefixes),
            preferred_suffixes: split_list(preferred_suffixes),
            not_preferred_prefixes: split_list(not_preferred_prefixes),
            not_preferred_suffixes: split_list(not_preferred_suffixes),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Selects the single best destination address from a candidate list.
#[derive(Debug, Clone, Default)]
pub struct AddressResolver {
    prefs: AddressPreferences,
}

impl AddressResolver {
    pub fn new(prefs: AddressPreferences) -> Self {
        Self { prefs }
    }

    /// Pick the best candidate, in six ordered passes; the first pass
    /// with any match wins, and candidates keep their original order
    /// within a pass. Falls back to the first candidate.
    pub fn select<'a>(&self, candidates: &'a [String]) -> Option<&'a str> {
        if candidates.is_empty() {
            return None;
        }

        let p = &self.prefs;
        let pp = |c: &str| matches_prefix(c, &p.preferred_prefixes);
        let ps = |c: &str| matches_suffix(c, &p.preferred_suffixes);
        let np = |c: &str| matches_prefix(c, &p.not_preferred_prefixes);
        let ns = |c: &str| matches_suffix(c, &p.not_preferred_suffixes);

        let passes: [&dyn Fn(&str) -> bool; 6] = [
            &|c| pp(c) && ps(c) && !np(c) && !ns(c),
            &|c| (pp(c) || ps(c)) && !np(c) && !ns(c),
            &|c| pp(c) && ps(c),
            &|c| pp(c) || ps(c),
            &|c| !np(c) && !ns(c),
            &|c| !(np(c) && ns(c)),
        ];

        for pass in passes {
            if let Some(found) = candidates.iter().find(|c| pass(c)) {
                return Some(found);
            }
        }
        Some(&candidates[0])
    }

    /// Select, then strip the routing prefix and truncate at the first
    /// `@` to yield a bare local-part identifier.
    pub fn resolve(&self, candidates: &[String]) -> Option<String> {
        let chosen = self.select(candidates)?;
        let bare = chosen.strip_prefix(ROUTING_PREFIX).unwrap_or(chosen);
        let local = bare.split('@').next().unwrap_or(bare);
        Some(local.trim().to_string())
    }
}

fn matches_prefix(candidate: &str, set: &[String]) -> bool {
    let upper = candidate.to_ascii_uppercase();
    set.iter().any(|p| upper.starts_with(&p.to_ascii_uppercase()))
}

fn matches_suffix(candidate: &str, set: &[String]) -> bool {
    let upper = candidate.to_ascii_uppercase();
    set.iter().any(|s| upper.ends_with(&s.to_ascii_uppercase()))
}
