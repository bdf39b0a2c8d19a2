/// Sentinel for "count not yet loaded". Dashboard phase 1 fills PR and bead
/// counts with this; phase 2 replaces the whole list with real counts.
pub const COUNT_PENDING: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub name: String,
    pub repo_count: usize,
    pub pr_count: i64,
    pub bead_count: i64,
}

impl ProjectSummary {
    /// A phase-1 summary: repo count known, PR/bead counts pending.
    pub fn pending(name: impl Into<String>, repo_count: usize) -> Self {
        Self {
            name: name.into(),
            repo_count,
            pr_count: COUNT_PENDING,
            bead_count: COUNT_PENDING,
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.pr_count != COUNT_PENDING && self.bead_count != COUNT_PENDING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_summary_uses_sentinels() {
        let summary = ProjectSummary::pending("alpha", 2);
        assert_eq!(summary.repo_count, 2);
        assert_eq!(summary.pr_count, COUNT_PENDING);
        assert_eq!(summary.bead_count, COUNT_PENDING);
        assert!(!summary.is_enriched());
    }

    #[test]
    fn enriched_after_counts_set() {
        let mut summary = ProjectSummary::pending("alpha", 2);
        summary.pr_count = 0;
        summary.bead_count = 3;
        assert!(summary.is_enriched());
    }
}
