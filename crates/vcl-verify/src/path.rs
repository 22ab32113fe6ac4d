use std::path::{Component, Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::feedback::Feedback;

/// Directory names that mark version-control metadata.
const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn", ".bzr"];

/// Default marker a path must contain to be considered.
pub const DEFAULT_EXTENSION: &str = ".vcl";

/// Default skip pattern: paths starting with four underscores opt out.
pub const DEFAULT_SKIP_PATTERN: &str = "^____";

/// Errors raised while building a filter or walking the local tree.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("invalid {kind} pattern {pattern:?}: {source}")]
    Pattern {
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to walk {}: {message}", path.display())]
    Walk { path: PathBuf, message: String },
}

/// The lookup key for a local file: its file name up to the first `.`.
///
/// `service/foo.vcl` gives `foo`, `a.b.c` gives `a`. Paths without a file
/// name give an empty string.
pub fn logical_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('.').next().map(str::to_owned))
        .unwrap_or_default()
}

/// True if any component of the path is a version-control metadata directory.
pub fn is_vcs_path(path: &Path) -> bool {
    path.components().any(|component| {
        let name = component.as_os_str().to_string_lossy();
        VCS_DIRS.contains(&name.as_ref())
    })
}

/// A local path selected for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub path: PathBuf,
    pub logical_name: String,
}

impl Candidate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let logical_name = logical_name(&path);
        Self { path, logical_name }
    }
}

/// Uncompiled filter settings. `None` disables a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    pub extension: Option<String>,
    pub match_pattern: Option<String>,
    pub skip_pattern: Option<String>,
    pub exclude_vcs: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            extension: Some(DEFAULT_EXTENSION.to_owned()),
            match_pattern: None,
            skip_pattern: Some(DEFAULT_SKIP_PATTERN.to_owned()),
            exclude_vcs: true,
        }
    }
}

/// Decides whether a path is a comparison candidate.
///
/// Patterns are unanchored regexes applied to the whole path string as
/// walked (root prefix included). The extension rule is a substring test,
/// so `foo.vcl.txt` qualifies.
#[derive(Debug, Clone)]
pub struct PathFilter {
    extension: Option<String>,
    match_pattern: Option<Regex>,
    skip_pattern: Option<Regex>,
    exclude_vcs: bool,
}

impl PathFilter {
    pub fn new(options: &FilterOptions) -> Result<Self, DiscoveryError> {
        Ok(Self {
            extension: options.extension.clone().filter(|e| !e.is_empty()),
            match_pattern: compile("match", options.match_pattern.as_deref())?,
            skip_pattern: compile("skip", options.skip_pattern.as_deref())?,
            exclude_vcs: options.exclude_vcs,
        })
    }

    pub fn admits(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();

        if self.exclude_vcs && is_vcs_path(path) {
            return false;
        }

        if let Some(ext) = &self.extension
            && !text.contains(ext.as_str())
        {
            return false;
        }

        if let Some(re) = &self.match_pattern
            && !re.is_match(&text)
        {
            return false;
        }

        if let Some(re) = &self.skip_pattern
            && re.is_match(&text)
        {
            return false;
        }

        true
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self {
            extension: Some(DEFAULT_EXTENSION.to_owned()),
            match_pattern: None,
            skip_pattern: Regex::new(DEFAULT_SKIP_PATTERN).ok(),
            exclude_vcs: true,
        }
    }
}

fn compile(kind: &'static str, pattern: Option<&str>) -> Result<Option<Regex>, DiscoveryError> {
    match pattern {
        None | Some("") => Ok(None),
        Some(p) => Regex::new(p).map(Some).map_err(|source| DiscoveryError::Pattern {
            kind,
            pattern: p.to_owned(),
            source,
        }),
    }
}

/// What to do when the directory walk hits an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WalkErrorPolicy {
    /// Record a warning and keep walking. Errors at the root leave an
    /// empty (or partial) candidate list.
    #[default]
    Continue,
    /// Abort discovery on the first walk error.
    Fail,
}

/// Result of walking the local tree.
#[derive(Debug, Default)]
pub struct Discovery {
    pub candidates: Vec<Candidate>,
    pub feedback: Vec<Feedback>,
}

/// Drop a leading `./` so a walk of `.` yields `a/main.vcl`, not
/// `./a/main.vcl`. Patterns anchored with `^` rely on this.
pub fn walked_path(path: &Path) -> &Path {
    path.strip_prefix(Component::CurDir).unwrap_or(path)
}

/// Walk `root` recursively and collect every path the filter admits.
///
/// Directories are tested like files. Entries are visited in file-name
/// order so repeated runs see the same candidate list. Paths are tested and
/// stored as [`walked_path`] returns them. An unreadable root is reported as
/// an error; an unreadable entry below it as a warning.
pub fn discover(
    root: &Path,
    filter: &PathFilter,
    policy: WalkErrorPolicy,
) -> Result<Discovery, DiscoveryError> {
    let mut discovery = Discovery::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                let path = walked_path(entry.path());
                if !path.as_os_str().is_empty() && filter.admits(path) {
                    discovery.candidates.push(Candidate::new(path));
                }
            }
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                let message = err.to_string();

                if policy == WalkErrorPolicy::Fail {
                    return Err(DiscoveryError::Walk { path, message });
                }

                tracing::warn!(path = %path.display(), error = %message, "walk error, continuing");
                discovery.feedback.push(if err.depth() == 0 {
                    Feedback::error(format!("cannot read {}: {message}", path.display()))
                } else {
                    Feedback::warning(format!("skipping {}: {message}", path.display()))
                });
            }
        }
    }

    tracing::debug!(
        root = %root.display(),
        candidates = discovery.candidates.len(),
        "discovered candidates"
    );

    Ok(discovery)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FilterOptions {
        FilterOptions::default()
    }

    fn filter(options: FilterOptions) -> PathFilter {
        PathFilter::new(&options).unwrap()
    }

    // -- logical_name --

    #[test]
    fn logical_name_strips_extension() {
        assert_eq!(logical_name(Path::new("service/foo.vcl")), "foo");
    }

    #[test]
    fn logical_name_splits_on_first_dot() {
        assert_eq!(logical_name(Path::new("a.b.c")), "a");
        assert_eq!(logical_name(Path::new("dir/foo.vcl.txt")), "foo");
    }

    #[test]
    fn logical_name_without_dot_is_file_name() {
        assert_eq!(logical_name(Path::new("dir/main")), "main");
    }

    #[test]
    fn logical_name_of_dotfile_is_empty() {
        assert_eq!(logical_name(Path::new("dir/.vcl")), "");
    }

    // -- is_vcs_path --

    #[test]
    fn git_directory_is_vcs() {
        assert!(is_vcs_path(Path::new("repo/.git/objects/main.vcl")));
    }

    #[test]
    fn plain_directory_is_not_vcs() {
        assert!(!is_vcs_path(Path::new("repo/service/main.vcl")));
    }

    #[test]
    fn gitignore_like_names_are_not_vcs_dirs() {
        assert!(!is_vcs_path(Path::new("repo/.github/main.vcl")));
    }

    // -- PathFilter --

    #[test]
    fn default_filter_admits_vcl_file() {
        assert!(filter(options()).admits(Path::new("vcl/main.vcl")));
    }

    #[test]
    fn extension_is_substring_not_suffix() {
        assert!(filter(options()).admits(Path::new("vcl/main.vcl.bak")));
    }

    #[test]
    fn missing_extension_rejected() {
        assert!(!filter(options()).admits(Path::new("vcl/readme.md")));
    }

    #[test]
    fn extension_rule_can_be_disabled() {
        let f = filter(FilterOptions {
            extension: None,
            ..options()
        });
        assert!(f.admits(Path::new("vcl/readme.md")));
    }

    #[test]
    fn vcs_path_rejected() {
        assert!(!filter(options()).admits(Path::new("vcl/.git/main.vcl")));
    }

    #[test]
    fn vcs_rule_can_be_disabled() {
        let f = filter(FilterOptions {
            exclude_vcs: false,
            ..options()
        });
        assert!(f.admits(Path::new("vcl/.git/main.vcl")));
    }

    #[test]
    fn match_pattern_restricts() {
        let f = filter(FilterOptions {
            match_pattern: Some("production".into()),
            ..options()
        });
        assert!(f.admits(Path::new("vcl/production/main.vcl")));
        assert!(!f.admits(Path::new("vcl/staging/main.vcl")));
    }

    #[test]
    fn empty_match_pattern_matches_everything() {
        let f = filter(FilterOptions {
            match_pattern: Some(String::new()),
            ..options()
        });
        assert!(f.admits(Path::new("anything/main.vcl")));
    }

    #[test]
    fn default_skip_pattern_opts_out_prefixed_paths() {
        let f = filter(options());
        assert!(!f.admits(Path::new("____old/main.vcl")));
        assert!(f.admits(Path::new("vcl/____old/main.vcl")));
    }

    #[test]
    fn skip_pattern_rejects() {
        let f = filter(FilterOptions {
            skip_pattern: Some("staging".into()),
            ..options()
        });
        assert!(!f.admits(Path::new("vcl/staging/main.vcl")));
        assert!(f.admits(Path::new("vcl/production/main.vcl")));
    }

    #[test]
    fn skip_wins_over_match() {
        let f = filter(FilterOptions {
            match_pattern: Some("main".into()),
            skip_pattern: Some("main".into()),
            ..options()
        });
        assert!(!f.admits(Path::new("vcl/main.vcl")));
    }

    #[test]
    fn all_rules_disabled_admits_anything() {
        let f = filter(FilterOptions {
            extension: None,
            match_pattern: None,
            skip_pattern: None,
            exclude_vcs: false,
        });
        assert!(f.admits(Path::new(".git/config")));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let result = PathFilter::new(&FilterOptions {
            match_pattern: Some("(".into()),
            ..options()
        });
        assert!(matches!(
            result,
            Err(DiscoveryError::Pattern { kind: "match", .. })
        ));
    }

    #[test]
    fn default_filter_equals_default_options() {
        let from_options = filter(options());
        let default = PathFilter::default();
        for path in ["a/main.vcl", "____x/main.vcl", "a/.git/x.vcl", "a/readme"] {
            assert_eq!(
                from_options.admits(Path::new(path)),
                default.admits(Path::new(path)),
                "{path}"
            );
        }
    }

    // -- Candidate --

    #[test]
    fn candidate_derives_logical_name() {
        let candidate = Candidate::new("vcl/service/edge.vcl");
        assert_eq!(candidate.logical_name, "edge");
        assert_eq!(candidate.path, PathBuf::from("vcl/service/edge.vcl"));
    }

    // -- walked_path --

    #[test]
    fn walked_path_drops_leading_cur_dir() {
        assert_eq!(walked_path(Path::new("./____old/main.vcl")), Path::new("____old/main.vcl"));
        assert_eq!(walked_path(Path::new("./vcl/a.vcl")), Path::new("vcl/a.vcl"));
        assert_eq!(walked_path(Path::new(".")), Path::new(""));
    }

    #[test]
    fn walked_path_keeps_other_roots() {
        assert_eq!(walked_path(Path::new("vcl/a.vcl")), Path::new("vcl/a.vcl"));
        assert_eq!(walked_path(Path::new("/srv/vcl/a.vcl")), Path::new("/srv/vcl/a.vcl"));
        assert_eq!(walked_path(Path::new("../vcl/a.vcl")), Path::new("../vcl/a.vcl"));
    }

    #[test]
    fn default_skip_fires_after_cur_dir_is_dropped() {
        let filter = PathFilter::default();
        assert!(!filter.admits(walked_path(Path::new("./____old/main.vcl"))));
        assert!(filter.admits(walked_path(Path::new("./keep.vcl"))));
    }

    // -- discover --

    #[test]
    fn missing_root_is_an_error_feedback() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");

        let discovery = discover(&missing, &PathFilter::default(), WalkErrorPolicy::Continue).unwrap();

        assert!(discovery.candidates.is_empty());
        assert_eq!(discovery.feedback.len(), 1);
        assert!(discovery.feedback[0].is_error());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_skipped_with_warning() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.vcl"), "").unwrap();
        fs::write(dir.path().join("a.vcl"), "").unwrap();
        fs::create_dir(dir.path().join("z")).unwrap();
        fs::write(dir.path().join("z/b.vcl"), "").unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop root.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = discover(dir.path(), &PathFilter::default(), WalkErrorPolicy::Continue);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let discovery = result.unwrap();

        let names: Vec<&str> = discovery
            .candidates
            .iter()
            .map(|c| c.logical_name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(discovery.feedback.len(), 1);
        assert!(discovery.feedback[0].is_warning());
        assert!(discovery.feedback[0].message().contains("locked"));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_fails_under_strict_policy() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(dir.path().join("a.vcl"), "").unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = discover(dir.path(), &PathFilter::default(), WalkErrorPolicy::Fail);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(DiscoveryError::Walk { path, .. }) => assert!(path.ends_with("locked")),
            other => panic!("expected walk error, got {other:?}"),
        }
    }
}
