//! Per-page review status and progress counters

use serde::Serialize;
use shared_types::{Issue, PageStatus, SeverityClass};

/// Derive the status of one page.
///
/// Precedence: no issues is `Clean`, all ignored is `Resolved`, then any
/// active error, then any active warning; anything else is `Resolved`.
pub fn page_status(issues: &[Issue], page: u32) -> PageStatus {
    let mut on_page = issues.iter().filter(|i| i.page == page).peekable();
    if on_page.peek().is_none() {
        return PageStatus::Clean;
    }

    let mut has_warning = false;
    for issue in on_page.filter(|i| i.is_active()) {
        match issue.severity_class() {
            SeverityClass::Error => return PageStatus::Error,
            SeverityClass::Warning => has_warning = true,
            SeverityClass::Other => {}
        }
    }

    if has_warning {
        PageStatus::Warning
    } else {
        PageStatus::Resolved
    }
}

/// First page after `current` that still has an active error or warning
pub fn next_problem_page(issues: &[Issue], current: u32, page_count: u32) -> Option<u32> {
    (current.saturating_add(1)..=page_count).find(|&p| page_status(issues, p).needs_attention())
}

/// Dashboard counters for one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewStats {
    pub total: usize,
    pub resolved: usize,
    pub remaining: usize,
}

impl ReviewStats {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let resolved = issues.iter().filter(|i| i.is_ignored).count();
        Self {
            total: issues.len(),
            resolved,
            remaining: issues.len() - resolved,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_issue() -> impl Strategy<Value = Issue> {
        (
            1u32..5,
            prop::sample::select(vec!["error", "warning", "info", "Warn", "critical error"]),
            any::<bool>(),
        )
            .prop_map(|(page, severity, ignored)| {
                Issue::new(0, page, severity, "C", "m").ignored(ignored)
            })
    }

    proptest! {
        /// Property: computing the status twice gives the same answer
        #[test]
        fn status_is_idempotent(issues in prop::collection::vec(arb_issue(), 0..20), page in 1u32..5) {
            prop_assert_eq!(page_status(&issues, page), page_status(&issues, page));
        }

        /// Property: ignoring every issue on a page resolves it
        #[test]
        fn all_ignored_resolves(issues in prop::collection::vec(arb_issue(), 1..20)) {
            let page = issues[0].page;
            let ignored: Vec<Issue> = issues.into_iter().map(|i| i.ignored(true)).collect();
            prop_assert_eq!(page_status(&ignored, page), PageStatus::Resolved);
        }

        /// Property: issue order does not matter
        #[test]
        fn status_ignores_order(issues in prop::collection::vec(arb_issue(), 0..20), page in 1u32..5) {
            let mut reversed = issues.clone();
            reversed.reverse();
            prop_assert_eq!(page_status(&issues, page), page_status(&reversed, page));
        }
    }
}
