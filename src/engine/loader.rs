//! Pure helpers for the progressive load pipelines. All IO stays in the
//! runtime; these functions only reshape data between phases.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::models::{BeadInfo, PrInfo, ProjectSummary, Resource};

/// Phase-1 dashboard summaries from `(name, repo_count)` pairs. PR and bead
/// counts stay at the pending sentinel until enrichment replaces the list.
pub fn phase1_summaries(listing: Vec<(String, usize)>) -> Vec<ProjectSummary> {
    listing
        .into_iter()
        .map(|(name, repo_count)| ProjectSummary::pending(name, repo_count))
        .collect()
}

/// Merge fetched PRs into the phase-1 repo list. The output walks the stored
/// repo order: each repo resource, then its PRs in fetch order, then the next
/// repo. Arrival order of the PR fetches never shows through.
///
/// `probe` maps `(repo, pr number)` to an existing worktree directory, so PRs
/// whose worktree was created in an earlier session come back live.
pub fn merge_prs(
    repos: &[Resource],
    prs: &HashMap<String, Vec<PrInfo>>,
    probe: impl Fn(&str, u64) -> Option<PathBuf>,
) -> Vec<Resource> {
    let mut merged = Vec::new();
    for repo in repos {
        let mut repo = repo.clone();
        repo.loading_prs = false;
        repo.loading_beads = repo.has_worktree();
        let name = repo.repo_name.clone();
        merged.push(repo);

        for pr in prs.get(&name).into_iter().flatten() {
            let worktree = probe(&name, pr.number).unwrap_or_default();
            let mut resource = Resource::pull_request(name.clone(), pr.clone(), worktree);
            resource.loading_beads = resource.has_worktree();
            merged.push(resource);
        }
    }
    merged
}

/// `(resource index, worktree dir)` for every resource beads can be fetched
/// from. Indices are positions in `resources`, which phase 3 attaches by.
pub fn bead_targets(resources: &[Resource]) -> Vec<(usize, PathBuf)> {
    resources
        .iter()
        .enumerate()
        .filter(|(_, r)| r.has_worktree())
        .map(|(i, r)| (i, r.worktree_path.clone()))
        .collect()
}

/// Phase 3: attach per-index bead lists. `beads` must be sized to the
/// resource list it was computed against; a length mismatch means the list
/// changed underneath the fetch, and the whole result is dropped.
pub fn attach_beads(resources: &mut [Resource], beads: Vec<Vec<BeadInfo>>) -> bool {
    if beads.len() != resources.len() {
        return false;
    }
    for (resource, list) in resources.iter_mut().zip(beads) {
        if resource.has_worktree() {
            resource.beads = list;
        }
        resource.loading_beads = false;
    }
    true
}
