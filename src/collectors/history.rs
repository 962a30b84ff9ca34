use chrono::{DateTime, Utc};
use log::{debug, info};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::Result;
use crate::models::{Commit, PullRequestCommit, PullRequestDto};
use crate::providers::PullRequestProvider;

/// Timestamp the release notes are ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey {
    Created,
    Merged,
}

impl OrderKey {
    /// `created` anywhere in the selector (any case) picks creation time,
    /// everything else merge time
    pub fn from_selector(selector: &str) -> Self {
        if selector.to_lowercase().contains("created") {
            OrderKey::Created
        } else {
            OrderKey::Merged
        }
    }

    fn timestamp(&self, pr: &PullRequestDto) -> Option<DateTime<Utc>> {
        match self {
            OrderKey::Created => Some(pr.created_at),
            OrderKey::Merged => pr.merged_at,
        }
    }
}

/// Builds the list of pull requests merged into the unreleased commits
pub struct HistoryBuilder<'a, P: PullRequestProvider + ?Sized> {
    provider: &'a P,
    follow_label: String,
    order: OrderKey,
    descending: bool,
}

impl<'a, P: PullRequestProvider + ?Sized> HistoryBuilder<'a, P> {
    pub fn new(provider: &'a P, follow_label: &str, order: OrderKey, descending: bool) -> Self {
        Self {
            provider,
            follow_label: follow_label.to_string(),
            order,
            descending,
        }
    }

    /// Resolve, expand, dedupe and order the pull requests behind `commits`
    pub fn build(&self, commits: &[Commit]) -> Result<Vec<PullRequestDto>> {
        let mut history = Vec::new();
        let mut expanded = HashSet::new();

        for merge_commit in commits.iter().filter(|c| c.is_merge()) {
            match self.provider.get(&merge_commit.message)? {
                Some(pr) => self.follow(pr, &mut history, &mut expanded)?,
                None => debug!(
                    "Merge commit {} does not reference a pull request",
                    merge_commit.id.short()
                ),
            }
        }

        let mut history = dedupe(history);
        self.sort(&mut history);

        info!(
            "Collected {} pull requests ({} umbrella pull requests expanded)",
            history.len(),
            expanded.len()
        );
        Ok(history)
    }

    /// Add `pr` to the history, or walk its children depth-first if it is an umbrella
    fn follow(
        &self,
        pr: PullRequestDto,
        history: &mut Vec<PullRequestDto>,
        expanded: &mut HashSet<u64>,
    ) -> Result<()> {
        let mut stack: Vec<std::vec::IntoIter<PullRequestCommit>> = Vec::new();
        self.accept(pr, history, expanded, &mut stack)?;

        while let Some(children) = stack.last_mut() {
            let Some(child) = children.next() else {
                stack.pop();
                continue;
            };
            if !child.merge {
                continue;
            }
            if let Some(pr) = self.provider.get(&child.message)? {
                self.accept(pr, history, expanded, &mut stack)?;
            }
        }

        Ok(())
    }

    fn accept(
        &self,
        pr: PullRequestDto,
        history: &mut Vec<PullRequestDto>,
        expanded: &mut HashSet<u64>,
        stack: &mut Vec<std::vec::IntoIter<PullRequestCommit>>,
    ) -> Result<()> {
        if !pr.has_label(&self.follow_label) {
            history.push(pr);
            return Ok(());
        }

        if !expanded.insert(pr.number) {
            debug!("Umbrella PR #{} already expanded", pr.number);
            return Ok(());
        }

        debug!("Following umbrella PR #{}", pr.number);
        stack.push(self.provider.commits(pr.number)?.into_iter());
        Ok(())
    }

    /// Stable sort on the order key; a missing timestamp always sorts last
    fn sort(&self, history: &mut [PullRequestDto]) {
        history.sort_by(|a, b| {
            match (self.order.timestamp(a), self.order.timestamp(b)) {
                (Some(a), Some(b)) if self.descending => b.cmp(&a),
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }
}

/// Keep the first pull request of every number
fn dedupe(history: Vec<PullRequestDto>) -> Vec<PullRequestDto> {
    let mut seen = HashSet::new();
    history
        .into_iter()
        .filter(|pr| seen.insert(pr.number))
        .collect()
}
