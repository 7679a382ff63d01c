//! Entity linking: alias resolution, mention clustering, and overlap
//! resolution.
//!
//! The linker turns flat detector output into entity clusters: alias
//! definitions are anchored to their subjects, later occurrences of alias
//! terms are propagated, and mentions of the same person or organization are
//! grouped through a union-find so that cyclic alias graphs (A a/k/a B,
//! B a/k/a A) always collapse into a single cluster.

pub mod address_merge;
pub mod span_merger;

pub use address_merge::merge_address_lines;
pub use span_merger::merge_spans;

use crate::config::Config;
use crate::detect::ner::Providers;
use crate::detect::person::parse_person_name;
use crate::models::{EntityCluster, EntityKind, EntityLabel, Span, SpanAttrs};
use regex::RegexBuilder;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::warn;

// ---------------------------------------------------------------------------
// Line index helpers
// ---------------------------------------------------------------------------

/// Per-line `(start, end_without_eol, line_text)` tuples.
pub(crate) fn build_line_index(text: &str) -> Vec<(usize, usize, &str)> {
    let mut lines = Vec::new();
    let mut pos = 0;
    for raw in text.split_inclusive('\n') {
        let body = raw.trim_end_matches(['\n', '\r']);
        lines.push((pos, pos + body.len(), body));
        pos += raw.len();
    }
    if lines.is_empty() {
        lines.push((0, 0, ""));
    }
    lines
}

/// Line number containing byte offset `pos`.
pub(crate) fn line_for_offset(lines: &[(usize, usize, &str)], pos: usize) -> usize {
    match lines.binary_search_by_key(&pos, |&(start, _, _)| start) {
        Ok(i) => i,
        Err(i) => i.saturating_sub(1),
    }
}

// ---------------------------------------------------------------------------
// Union-find with path compression
// ---------------------------------------------------------------------------

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Smaller root wins so results do not depend on union order.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

// ---------------------------------------------------------------------------
// Canonicalization
// ---------------------------------------------------------------------------

/// Normalize an entity key: trim, collapse whitespace, lowercase.
pub(crate) fn canonicalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn cluster_id_for(kind: EntityKind, canonical: &str) -> String {
    let digest = Sha256::digest(format!("cluster/{}/{}", kind.as_str(), canonical).as_bytes());
    let mut id = String::with_capacity(20);
    for byte in digest.iter() {
        id.push_str(&format!("{byte:02x}"));
        if id.len() >= 20 {
            break;
        }
    }
    id.truncate(20);
    id
}

/// Case-folded surname of a person mention, used as the clustering key.
fn person_surname_key(surface: &str) -> Option<String> {
    let parsed = parse_person_name(surface);
    let surname = parsed.surname.last()?;
    Some(canonicalize_key(surname))
}

fn person_honorific(surface: &str) -> Option<String> {
    let parsed = parse_person_name(surface);
    parsed
        .honorifics
        .first()
        .map(|h| h.trim_end_matches('.').to_lowercase())
}

/// Case-folded head noun of an organization mention.
fn org_head_key(surface: &str) -> Option<String> {
    surface
        .split_whitespace()
        .next()
        .map(|w| canonicalize_key(w.trim_matches(|c: char| !c.is_alphanumeric())))
        .filter(|k| !k.is_empty())
}

// ---------------------------------------------------------------------------
// Linker
// ---------------------------------------------------------------------------

const SUBJECT_GAP_LIMIT: usize = 80;

fn is_subject_label(label: EntityLabel) -> bool {
    matches!(
        label,
        EntityLabel::Person | EntityLabel::GenericOrg | EntityLabel::BankOrg
    )
}

/// Resolve aliases, propagate alias terms, and cluster mentions.
///
/// Returns the immutable cluster set; member spans get their `cluster_id`
/// populated in place, and synthesized alias mention spans are appended.
pub fn link_entities(
    text: &str,
    spans: &mut Vec<Span>,
    config: &Config,
    providers: &Providers,
) -> (Vec<EntityCluster>, Vec<String>) {
    let mut warnings = Vec::new();
    let lines = build_line_index(text);

    // -- Alias resolution --------------------------------------------------
    // Definition spans come straight from the alias detector; propagation
    // appends synthetic mentions after each definition's scope begins.
    let def_indices: Vec<usize> = spans
        .iter()
        .enumerate()
        .filter(|(_, s)| s.label == EntityLabel::AliasLabel && !s.attrs.propagated)
        .map(|(i, _)| i)
        .collect();

    // subject span index per definition (if anchored to a real span)
    let mut def_subjects: Vec<(usize, Option<usize>)> = Vec::new();
    for &def_idx in &def_indices {
        let def = &spans[def_idx];
        let def_line = line_for_offset(&lines, def.start);
        let mut best: Option<(usize, usize)> = None; // (distance, span index)
        for (i, sp) in spans.iter().enumerate() {
            if !is_subject_label(sp.label) || sp.start >= def.start {
                continue;
            }
            let sp_line = line_for_offset(&lines, sp.start);
            if def_line.saturating_sub(sp_line) > 1 {
                continue;
            }
            let distance = def.start.saturating_sub(sp.end);
            if distance <= SUBJECT_GAP_LIMIT && best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, i));
            }
        }
        def_subjects.push((def_idx, best.map(|(_, i)| i)));
    }

    // Propagate alias terms forward from each definition.
    let mut synthesized: Vec<Span> = Vec::new();
    let mut occupied: Vec<(usize, usize)> = spans.iter().map(|s| (s.start, s.end)).collect();
    for &(def_idx, _) in &def_subjects {
        let (term, is_role, scope_start) = {
            let def = &spans[def_idx];
            let term = def
                .attrs
                .alias_term
                .clone()
                .unwrap_or_else(|| def.text.clone());
            (term, def.attrs.is_role, def.end)
        };
        let pattern = match RegexBuilder::new(&format!(r"\b{}\b", regex::escape(&term)))
            .case_insensitive(true)
            .build()
        {
            Ok(p) => p,
            Err(e) => {
                warn!("alias propagation pattern failed for {term:?}: {e}");
                continue;
            }
        };
        for m in pattern.find_iter(&text[scope_start..]) {
            let (start, end) = (scope_start + m.start(), scope_start + m.end());
            if occupied.iter().any(|&(s, e)| s < end && start < e) {
                continue;
            }
            let attrs = SpanAttrs {
                alias_term: Some(term.clone()),
                is_role,
                propagated: true,
                ..Default::default()
            };
            synthesized.push(
                Span::new(
                    start,
                    end,
                    &text[start..end],
                    EntityLabel::AliasLabel,
                    "alias_link",
                    0.96,
                )
                .with_attrs(attrs),
            );
            occupied.push((start, end));
        }
    }
    let first_synth = spans.len();
    spans.extend(synthesized);

    // -- Union-find over all spans ----------------------------------------
    let mut uf = UnionFind::new(spans.len());

    // Surname / head-noun keyed unions.
    let mut by_surname: HashMap<String, Vec<usize>> = HashMap::new();
    let mut by_org_head: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, sp) in spans.iter().enumerate() {
        match sp.label {
            EntityLabel::Person => {
                if let Some(key) = person_surname_key(&sp.text) {
                    by_surname.entry(key).or_default().push(i);
                }
            }
            EntityLabel::GenericOrg | EntityLabel::BankOrg => {
                if let Some(key) = org_head_key(&sp.text) {
                    by_org_head.entry(key).or_default().push(i);
                }
            }
            _ => {}
        }
    }
    for members in by_surname.values() {
        for pair in members.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            // Differing titles ("Mr. Smith" vs "Mrs. Smith") disambiguate
            // two people sharing a surname.
            let (ha, hb) = (
                person_honorific(&spans[a].text),
                person_honorific(&spans[b].text),
            );
            if let (Some(ha), Some(hb)) = (&ha, &hb) {
                if ha != hb {
                    continue;
                }
            }
            uf.union(a, b);
        }
    }
    for members in by_org_head.values() {
        for pair in members.windows(2) {
            uf.union(pair[0], pair[1]);
        }
    }

    // An alias definition shares its surface with any mention span covering
    // the same range; union them so alias graphs stay connected even when a
    // term is independently detected as a name.
    for &(def_idx, _) in &def_subjects {
        let (ds, de) = (spans[def_idx].start, spans[def_idx].end);
        for i in 0..spans.len() {
            if is_subject_label(spans[i].label) && spans[i].start <= ds && de <= spans[i].end {
                uf.union(def_idx, i);
            }
        }
    }

    // Alias unions: definition span joins its subject; propagated mentions
    // of the same term join the definition.
    let mut def_by_term: HashMap<String, usize> = HashMap::new();
    for &(def_idx, subject) in &def_subjects {
        if let Some(subject_idx) = subject {
            uf.union(def_idx, subject_idx);
        }
        let term_key = canonicalize_key(
            spans[def_idx]
                .attrs
                .alias_term
                .as_deref()
                .unwrap_or(&spans[def_idx].text),
        );
        // Cyclic or repeated definitions of one term collapse here.
        if let Some(&prev) = def_by_term.get(&term_key) {
            uf.union(def_idx, prev);
        }
        def_by_term.insert(term_key, def_idx);
    }
    for i in first_synth..spans.len() {
        let term_key = canonicalize_key(spans[i].attrs.alias_term.as_deref().unwrap_or(""));
        if let Some(&def_idx) = def_by_term.get(&term_key) {
            uf.union(i, def_idx);
        }
    }

    // -- Optional coreference provider -------------------------------------
    if config.detectors.coref.enable {
        if let Some(provider) = providers.coref.as_deref() {
            if provider.probe() {
                match provider.chains(text) {
                    Ok(chains) => {
                        for chain in chains {
                            let mut matched: Vec<usize> = Vec::new();
                            for (cs, ce) in &chain {
                                for (i, sp) in spans.iter().enumerate() {
                                    if is_subject_label(sp.label)
                                        && sp.start < *ce
                                        && *cs < sp.end
                                    {
                                        matched.push(i);
                                    }
                                }
                            }
                            // Majority overlap: more than half of the chain's
                            // mentions must land on known spans.
                            if !matched.is_empty() && 2 * matched.len() >= chain.len() {
                                for pair in matched.windows(2) {
                                    uf.union(pair[0], pair[1]);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!("coref provider failed, continuing without it: {e}");
                        warnings.push(format!("coref provider failed: {e}"));
                    }
                }
            }
        }
    }

    // -- Materialize clusters ----------------------------------------------
    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..spans.len() {
        let relevant = is_subject_label(spans[i].label)
            || spans[i].label == EntityLabel::AliasLabel
            || spans[i].label == EntityLabel::AddressBlock;
        if relevant {
            groups.entry(uf.find(i)).or_default().push(i);
        }
    }

    let mut roots: Vec<usize> = groups.keys().copied().collect();
    roots.sort_unstable();

    let mut clusters = Vec::new();
    for root in roots {
        let members = &groups[&root];
        let kind = members
            .iter()
            .map(|&i| spans[i].label)
            .fold(EntityKind::Other, |acc, label| match (acc, label) {
                (_, EntityLabel::BankOrg) => EntityKind::Bank,
                (EntityKind::Bank, _) => EntityKind::Bank,
                (_, EntityLabel::Person) => EntityKind::Person,
                (EntityKind::Person, _) => EntityKind::Person,
                (_, EntityLabel::GenericOrg) => EntityKind::Org,
                (EntityKind::Org, _) => EntityKind::Org,
                (_, EntityLabel::AddressBlock) => EntityKind::Address,
                (acc, _) => acc,
            });

        // Canonical form: longest non-alias mention, falling back to the
        // subject guess, then the alias term itself.
        let canonical = members
            .iter()
            .filter(|&&i| spans[i].label != EntityLabel::AliasLabel)
            .max_by_key(|&&i| spans[i].text.len())
            .map(|&i| spans[i].text.clone())
            .or_else(|| {
                members
                    .iter()
                    .find_map(|&i| spans[i].attrs.alias_subject.clone())
            })
            .unwrap_or_else(|| spans[members[0]].text.clone());

        let mut aliases: Vec<String> = Vec::new();
        for &i in members {
            if let Some(term) = spans[i].attrs.alias_term.clone() {
                if !aliases.contains(&term) {
                    aliases.push(term);
                }
            }
        }

        let only_aliases = members
            .iter()
            .all(|&i| spans[i].label == EntityLabel::AliasLabel);
        let is_role = only_aliases && members.iter().all(|&i| spans[i].attrs.is_role);

        let id = cluster_id_for(kind, &canonicalize_key(&canonical));
        for &i in members {
            spans[i].cluster_id = Some(id.clone());
        }
        // Two components with the same canonical surface share one cluster.
        if let Some(existing) = clusters
            .iter_mut()
            .find(|c: &&mut EntityCluster| c.cluster_id == id)
        {
            for alias in aliases {
                if !existing.aliases.contains(&alias) {
                    existing.aliases.push(alias);
                }
            }
            continue;
        }
        let mut cluster = EntityCluster::new(id, kind, canonical);
        cluster.is_role = is_role;
        cluster.aliases = aliases;
        clusters.push(cluster);
    }

    spans.sort_by_key(|s| (s.start, s.end, s.label.precedence()));
    (clusters, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{run_detectors, Providers};

    fn linked(text: &str, config: &Config) -> (Vec<Span>, Vec<EntityCluster>) {
        let providers = Providers::default();
        let (mut spans, _) = run_detectors(text, config, &providers).unwrap();
        merge_address_lines(text, &mut spans);
        let (clusters, _) = link_entities(text, &mut spans, config, &providers);
        (spans, clusters)
    }

    #[test]
    fn alias_links_subject_and_later_mentions() {
        let config = Config::default();
        let text = r#"John Doe ("Morgan") executed the deed. Later, Morgan signed the contract."#;
        let (spans, clusters) = linked(text, &config);

        let person = spans.iter().find(|s| s.text == "John Doe").unwrap();
        let mentions: Vec<&Span> = spans.iter().filter(|s| s.text == "Morgan").collect();
        assert_eq!(mentions.len(), 2, "definition plus one propagated mention");
        for m in &mentions {
            assert_eq!(m.cluster_id, person.cluster_id);
        }
        let cluster = clusters
            .iter()
            .find(|c| Some(&c.cluster_id) == person.cluster_id.as_ref())
            .unwrap();
        assert_eq!(cluster.kind, EntityKind::Person);
        assert_eq!(cluster.canonical_form, "John Doe");
        assert!(cluster.aliases.contains(&"Morgan".to_string()));
    }

    #[test]
    fn surname_clustering_groups_mentions() {
        let config = Config::default();
        let text = "Jane Smith attended. Later Jane Smith left early.";
        let (spans, clusters) = linked(text, &config);
        let ids: Vec<_> = spans
            .iter()
            .filter(|s| s.label == EntityLabel::Person)
            .map(|s| s.cluster_id.clone())
            .collect();
        assert!(ids.len() >= 2);
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(
            clusters.iter().filter(|c| c.kind == EntityKind::Person).count(),
            1
        );
    }

    #[test]
    fn differing_titles_stay_separate() {
        let config = Config::default();
        let text = "Mr. Alan Smith and Mrs. Betty Smith own the parcel jointly.";
        let (_, clusters) = linked(text, &config);
        assert_eq!(
            clusters.iter().filter(|c| c.kind == EntityKind::Person).count(),
            2
        );
    }

    #[test]
    fn role_alias_cluster_is_marked() {
        let config = Config::default();
        // No preceding subject span: the alias stands alone as a role.
        let text = r#"(the "Buyer") shall remit the deposit. The Buyer waives notice."#;
        let (spans, clusters) = linked(text, &config);
        let alias_spans: Vec<&Span> = spans
            .iter()
            .filter(|s| s.label == EntityLabel::AliasLabel)
            .collect();
        assert!(!alias_spans.is_empty());
        let cluster = clusters.iter().find(|c| c.is_role).unwrap();
        assert!(cluster.aliases.contains(&"Buyer".to_string()));
    }

    #[test]
    fn cyclic_alias_definitions_collapse() {
        let config = Config::default();
        let text = r#"Alpha Corp a/k/a Beta Group provides services. Beta Group a/k/a Alpha Corp accepts."#;
        let (_, clusters) = linked(text, &config);
        assert_eq!(clusters.len(), 1, "cyclic aliases must form one cluster");
    }

    #[test]
    fn address_blocks_get_their_own_cluster() {
        let config = Config::default();
        let text = "Ship to:\n1600 Pennsylvania Ave NW\nWashington, DC 20500\n";
        let (spans, clusters) = linked(text, &config);
        let block = spans
            .iter()
            .find(|s| s.label == EntityLabel::AddressBlock)
            .unwrap();
        assert!(block.cluster_id.is_some());
        assert!(clusters.iter().any(|c| c.kind == EntityKind::Address));
    }
}
