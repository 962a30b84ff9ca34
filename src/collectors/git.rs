use git2::{BranchType, ErrorCode, ObjectType, Oid, Repository as Git2Repository, Sort};
use log::{debug, info};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Result, UnreleasedError};
use crate::models::{Commit, CommitId, Tag};

/// Read-only queries over a commit graph
pub trait CommitGraph {
    /// All tags in the repository
    fn tags(&self) -> Result<Vec<Tag>>;

    /// Head commit of a branch, `None` when the repository has no commits yet
    fn branch_head(&self, branch: &str) -> Result<Option<CommitId>>;

    /// Commits reachable from `since` that are not reachable from `until`
    fn range(&self, since: &CommitId, until: &CommitId) -> Result<Vec<Commit>>;

    /// Every commit reachable from `since`, `since` included
    fn ancestry(&self, since: &CommitId) -> Result<Vec<Commit>>;
}

/// Which tags mark a release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFilter {
    /// Lightweight and annotated tags
    Any,
    /// Annotated tags only
    AnnotatedOnly,
}

impl TagFilter {
    pub fn from_annotated_only(annotated_only: bool) -> Self {
        if annotated_only {
            TagFilter::AnnotatedOnly
        } else {
            TagFilter::Any
        }
    }

    fn accepts(&self, tag: &Tag) -> bool {
        match self {
            TagFilter::Any => true,
            TagFilter::AnnotatedOnly => tag.annotated,
        }
    }
}

/// Resolves the commits on a release branch that no release tag includes yet
pub struct UnreleasedCommits<'a, G: CommitGraph + ?Sized> {
    graph: &'a G,
}

impl<'a, G: CommitGraph + ?Sized> UnreleasedCommits<'a, G> {
    pub fn new(graph: &'a G) -> Self {
        Self { graph }
    }

    /// Commits reachable from `branch` and from no qualifying tag
    ///
    /// Ordered as the branch walk first yields them.
    pub fn resolve(&self, branch: &str, filter: TagFilter) -> Result<Vec<Commit>> {
        let Some(head) = self.graph.branch_head(branch)? else {
            info!("Repository has no commits");
            return Ok(Vec::new());
        };

        let tag_commits = self.qualifying_tag_commits(filter)?;

        if tag_commits.is_empty() {
            info!("No release tags found, treating all of '{}' as unreleased", branch);
            return self.graph.ancestry(&head);
        }

        // Everything between the branch head and each release tag
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for tag_commit in &tag_commits {
            for commit in self.graph.range(&head, tag_commit)? {
                if seen.insert(commit.id.clone()) {
                    candidates.push(commit);
                }
            }
        }

        // Drop whatever any release already contains
        let mut released = HashSet::new();
        for tag_commit in &tag_commits {
            released.extend(self.graph.ancestry(tag_commit)?.into_iter().map(|c| c.id));
        }

        let unreleased: Vec<Commit> = candidates
            .into_iter()
            .filter(|commit| !released.contains(&commit.id))
            .collect();

        info!(
            "Found {} unreleased commits on '{}' across {} release tags",
            unreleased.len(),
            branch,
            tag_commits.len()
        );
        Ok(unreleased)
    }

    /// Distinct commit targets of the tags passing `filter`
    fn qualifying_tag_commits(&self, filter: TagFilter) -> Result<Vec<CommitId>> {
        let mut seen = HashSet::new();
        let mut commits = Vec::new();

        for tag in self.graph.tags()? {
            if !filter.accepts(&tag) {
                debug!("Skipping lightweight tag {}", tag.name);
                continue;
            }
            match tag.target {
                Some(target) => {
                    if seen.insert(target.clone()) {
                        commits.push(target);
                    }
                }
                None => debug!("Skipping tag {} which does not point at a commit", tag.name),
            }
        }

        Ok(commits)
    }
}

/// Commit graph backed by a git2 repository
pub struct GitRepository {
    repo: Git2Repository,
}

impl GitRepository {
    /// Open a Git repository
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Git2Repository::open(path).map_err(|e| {
            UnreleasedError::Repository(format!(
                "Cannot open Git repository at '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self { repo })
    }

    /// URL of a named remote, `None` when the remote does not exist
    pub fn remote_url(&self, name: &str) -> Result<Option<String>> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(str::to_string)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn oid(id: &CommitId) -> Result<Oid> {
        Oid::from_str(id.as_str()).map_err(|e| {
            UnreleasedError::Repository(format!("Invalid commit id '{}': {}", id, e))
        })
    }

    /// Walk from `since`, optionally hiding everything reachable from `hide`
    fn walk(&self, since: Oid, hide: Option<Oid>) -> Result<Vec<Commit>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(since)?;
        if let Some(hide) = hide {
            revwalk.hide(hide)?;
        }

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result?;
            let git_commit = self.repo.find_commit(oid).map_err(|e| {
                UnreleasedError::Repository(format!("Failed to find commit {}: {}", oid, e))
            })?;

            commits.push(Commit {
                id: CommitId::new(oid.to_string()),
                parents: git_commit
                    .parent_ids()
                    .map(|p| CommitId::new(p.to_string()))
                    .collect(),
                message: String::from_utf8_lossy(git_commit.message_bytes()).into_owned(),
            });
        }

        Ok(commits)
    }
}

impl CommitGraph for GitRepository {
    fn tags(&self) -> Result<Vec<Tag>> {
        let names = self.repo.tag_names(None)?;
        let mut tags = Vec::new();

        for name in names.iter().flatten() {
            let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;
            let Some(oid) = reference.target() else {
                continue;
            };
            let object = self.repo.find_object(oid, None)?;

            let (annotated, target) = match object.as_tag() {
                Some(tag) => (true, tag.target_id()),
                None => (false, oid),
            };
            let is_commit = self
                .repo
                .find_object(target, None)
                .map(|o| o.kind() == Some(ObjectType::Commit))
                .unwrap_or(false);

            tags.push(Tag {
                name: name.to_string(),
                target: is_commit.then(|| CommitId::new(target.to_string())),
                annotated,
            });
        }

        debug!("Found {} tags", tags.len());
        Ok(tags)
    }

    fn branch_head(&self, branch: &str) -> Result<Option<CommitId>> {
        if self.repo.is_empty()? {
            return Ok(None);
        }

        // Local branch first, then a remote-tracking one such as `origin/main`
        let found = match self.repo.find_branch(branch, BranchType::Local) {
            Err(e) if e.code() == ErrorCode::NotFound => {
                self.repo.find_branch(branch, BranchType::Remote)
            }
            other => other,
        };
        let found = found.map_err(|e| {
            UnreleasedError::Repository(format!("Cannot resolve branch '{}': {}", branch, e))
        })?;
        let commit = found.get().peel_to_commit().map_err(|e| {
            UnreleasedError::Repository(format!(
                "Branch '{}' does not point at a commit: {}",
                branch, e
            ))
        })?;

        Ok(Some(CommitId::new(commit.id().to_string())))
    }

    fn range(&self, since: &CommitId, until: &CommitId) -> Result<Vec<Commit>> {
        self.walk(Self::oid(since)?, Some(Self::oid(until)?))
    }

    fn ancestry(&self, since: &CommitId) -> Result<Vec<Commit>> {
        self.walk(Self::oid(since)?, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    /// Helper to create an empty test Git repository
    fn create_test_repo() -> (TempDir, Git2Repository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = Git2Repository::init(temp_dir.path()).unwrap();
        (temp_dir, repo)
    }

    /// Helper to write a commit with the given parents, without moving any ref
    fn commit(repo: &Git2Repository, parents: &[Oid], message: &str) -> Oid {
        let signature = Signature::now("Test User", "test@example.com").unwrap();
        let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parents: Vec<git2::Commit> = parents
            .iter()
            .map(|oid| repo.find_commit(*oid).unwrap())
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        repo.commit(None, &signature, &signature, message, &tree, &parent_refs)
            .unwrap()
    }

    fn set_branch(repo: &Git2Repository, name: &str, oid: Oid) {
        repo.reference(&format!("refs/heads/{}", name), oid, true, "test")
            .unwrap();
    }

    fn lightweight_tag(repo: &Git2Repository, name: &str, oid: Oid) {
        let object = repo.find_object(oid, None).unwrap();
        repo.tag_lightweight(name, &object, false).unwrap();
    }

    fn annotated_tag(repo: &Git2Repository, name: &str, oid: Oid) {
        let object = repo.find_object(oid, None).unwrap();
        let signature = Signature::now("Test User", "test@example.com").unwrap();
        repo.tag(name, &object, &signature, "release", false).unwrap();
    }

    fn resolve(path: &Path, filter: TagFilter) -> Vec<Commit> {
        let repository = GitRepository::open(path).unwrap();
        UnreleasedCommits::new(&repository)
            .resolve("main", filter)
            .unwrap()
    }

    fn ids(commits: &[Commit]) -> HashSet<String> {
        commits.iter().map(|c| c.id.to_string()).collect()
    }

    #[test]
    fn test_open_invalid_repository() {
        let result = GitRepository::open(Path::new("/nonexistent"));
        assert!(matches!(result, Err(UnreleasedError::Repository(_))));
    }

    #[test]
    fn test_empty_repository_has_no_unreleased_commits() {
        let (temp_dir, _repo) = create_test_repo();
        assert!(resolve(temp_dir.path(), TagFilter::Any).is_empty());
    }

    #[test]
    fn test_unknown_branch_is_an_error() {
        let (temp_dir, repo) = create_test_repo();
        let root = commit(&repo, &[], "Initial commit");
        set_branch(&repo, "main", root);

        let repository = GitRepository::open(temp_dir.path()).unwrap();
        let result = UnreleasedCommits::new(&repository).resolve("release", TagFilter::Any);
        assert!(matches!(result, Err(UnreleasedError::Repository(_))));
    }

    #[test]
    fn test_branch_wins_over_tag_of_same_name() {
        let (temp_dir, repo) = create_test_repo();
        let root = commit(&repo, &[], "Initial commit");
        let second = commit(&repo, &[root], "Second commit");
        set_branch(&repo, "main", second);
        lightweight_tag(&repo, "main", root);

        let unreleased = resolve(temp_dir.path(), TagFilter::Any);

        assert_eq!(ids(&unreleased), HashSet::from([second.to_string()]));
    }

    #[test]
    fn test_remote_tracking_branch() {
        let (temp_dir, repo) = create_test_repo();
        let root = commit(&repo, &[], "Initial commit");
        let second = commit(&repo, &[root], "Second commit");
        set_branch(&repo, "main", root);
        repo.reference("refs/remotes/origin/release", second, true, "test")
            .unwrap();

        let repository = GitRepository::open(temp_dir.path()).unwrap();
        assert_eq!(
            repository.branch_head("origin/release").unwrap(),
            Some(CommitId::new(second.to_string()))
        );
    }

    #[test]
    fn test_no_tags_returns_whole_branch() {
        let (temp_dir, repo) = create_test_repo();
        let root = commit(&repo, &[], "Initial commit");
        let second = commit(&repo, &[root], "Second commit");
        let feature = commit(&repo, &[root], "Feature work");
        let merge = commit(&repo, &[second, feature], "Merge pull request #5 from acme/feature");
        set_branch(&repo, "main", merge);

        let commits = resolve(temp_dir.path(), TagFilter::Any);

        assert_eq!(commits.len(), 4);
        assert_eq!(commits[0].id.to_string(), merge.to_string());
        assert!(commits[0].is_merge());
        assert_eq!(
            commits[0].message,
            "Merge pull request #5 from acme/feature"
        );
    }

    #[test]
    fn test_excludes_commits_reachable_from_tag() {
        let (temp_dir, repo) = create_test_repo();
        let root = commit(&repo, &[], "Initial commit");
        let released = commit(&repo, &[root], "Released work");
        let fresh = commit(&repo, &[released], "Unreleased work");
        set_branch(&repo, "main", fresh);
        lightweight_tag(&repo, "v1.0.0", released);

        let commits = resolve(temp_dir.path(), TagFilter::Any);

        assert_eq!(ids(&commits), HashSet::from([fresh.to_string()]));
    }

    #[test]
    fn test_tag_on_branch_head_leaves_nothing() {
        let (temp_dir, repo) = create_test_repo();
        let root = commit(&repo, &[], "Initial commit");
        let head = commit(&repo, &[root], "Release me");
        set_branch(&repo, "main", head);
        lightweight_tag(&repo, "v1.0.0", head);

        assert!(resolve(temp_dir.path(), TagFilter::Any).is_empty());
    }

    #[test]
    fn test_diverged_tags_leave_only_new_merge() {
        let (temp_dir, repo) = create_test_repo();
        let root = commit(&repo, &[], "Initial commit");

        // Release line A
        let f1 = commit(&repo, &[root], "Feature 1");
        let m1 = commit(&repo, &[root, f1], "Merge pull request #1 from acme/f1");
        let f2 = commit(&repo, &[m1], "Feature 2");
        let m2 = commit(&repo, &[m1, f2], "Merge pull request #2 from acme/f2");
        annotated_tag(&repo, "v1.0.0", m2);

        // Release line B, diverging from the root
        let f3 = commit(&repo, &[root], "Feature 3");
        let m3 = commit(&repo, &[root, f3], "Merge pull request #3 from acme/f3");
        let f4 = commit(&repo, &[m3], "Feature 4");
        let m4 = commit(&repo, &[m3, f4], "Merge pull request #4 from acme/f4");
        lightweight_tag(&repo, "v0.9.1", m4);

        // Release branch joins both lines
        let m5 = commit(&repo, &[m2, m4], "Merge pull request #5 from acme/f5");
        set_branch(&repo, "main", m5);

        let commits = resolve(temp_dir.path(), TagFilter::Any);

        assert_eq!(ids(&commits), HashSet::from([m5.to_string()]));
    }

    #[test]
    fn test_result_is_disjoint_from_every_tag_ancestry() {
        let (temp_dir, repo) = create_test_repo();
        let root = commit(&repo, &[], "Initial commit");
        let a = commit(&repo, &[root], "A");
        let b = commit(&repo, &[root], "B");
        let c = commit(&repo, &[a, b], "Merge pull request #9 from acme/b");
        let d = commit(&repo, &[c], "D");
        set_branch(&repo, "main", d);
        lightweight_tag(&repo, "v1", a);
        lightweight_tag(&repo, "v2", b);

        let repository = GitRepository::open(temp_dir.path()).unwrap();
        let commits = UnreleasedCommits::new(&repository)
            .resolve("main", TagFilter::Any)
            .unwrap();

        let mut released = HashSet::new();
        for tag in [a, b] {
            let tag_id = CommitId::new(tag.to_string());
            released.extend(ids(&repository.ancestry(&tag_id).unwrap()));
        }

        assert!(ids(&commits).is_disjoint(&released));
        assert_eq!(ids(&commits), HashSet::from([c.to_string(), d.to_string()]));
    }

    #[test]
    fn test_annotated_only_ignores_lightweight_tags() {
        let (temp_dir, repo) = create_test_repo();
        let root = commit(&repo, &[], "Initial commit");
        let first = commit(&repo, &[root], "First");
        let second = commit(&repo, &[first], "Second");
        set_branch(&repo, "main", second);
        lightweight_tag(&repo, "nightly", first);

        let any = resolve(temp_dir.path(), TagFilter::Any);
        assert_eq!(ids(&any), HashSet::from([second.to_string()]));

        let annotated_only = resolve(temp_dir.path(), TagFilter::AnnotatedOnly);
        assert_eq!(annotated_only.len(), 3);
    }

    #[test]
    fn test_tag_on_tree_is_ignored() {
        let (temp_dir, repo) = create_test_repo();
        let root = commit(&repo, &[], "Initial commit");
        let head = commit(&repo, &[root], "Second");
        set_branch(&repo, "main", head);

        let tree_id = repo.find_commit(root).unwrap().tree_id();
        lightweight_tag(&repo, "tree-tag", tree_id);

        let repository = GitRepository::open(temp_dir.path()).unwrap();
        let tags = repository.tags().unwrap();
        assert_eq!(tags.len(), 1);
        assert!(tags[0].target.is_none());

        assert_eq!(resolve(temp_dir.path(), TagFilter::Any).len(), 2);
    }

    #[test]
    fn test_tags_report_annotation() {
        let (temp_dir, repo) = create_test_repo();
        let root = commit(&repo, &[], "Initial commit");
        set_branch(&repo, "main", root);
        lightweight_tag(&repo, "light", root);
        annotated_tag(&repo, "heavy", root);

        let repository = GitRepository::open(temp_dir.path()).unwrap();
        let mut tags = repository.tags().unwrap();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(tags[0].name, "heavy");
        assert!(tags[0].annotated);
        assert_eq!(tags[1].name, "light");
        assert!(!tags[1].annotated);
        assert_eq!(tags[0].target, tags[1].target);
    }

    #[test]
    fn test_remote_url() {
        let (temp_dir, repo) = create_test_repo();
        repo.remote("origin", "git@github.com:acme/widgets.git")
            .unwrap();

        let repository = GitRepository::open(temp_dir.path()).unwrap();
        assert_eq!(
            repository.remote_url("origin").unwrap().as_deref(),
            Some("git@github.com:acme/widgets.git")
        );
        assert_eq!(repository.remote_url("upstream").unwrap(), None);
    }
}
