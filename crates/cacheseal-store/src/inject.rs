use crate::{read_text, write_atomic, StoreError};
use cacheseal_schema::VersionTarget;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum InjectOutcome {
    Replaced { count: usize },
    PlaceholderNotFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
    pub path: PathBuf,
    pub placeholder: String,
    #[serde(flatten)]
    pub outcome: InjectOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct InjectReport {
    pub version: String,
    pub targets: Vec<TargetOutcome>,
}

impl InjectReport {
    pub fn replaced_files(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| matches!(t.outcome, InjectOutcome::Replaced { .. }))
            .count()
    }
}

/// Replace every occurrence of each target's placeholder with `version`.
///
/// A target without its placeholder is left byte-identical and only warned
/// about. Every target is read and rewritten in memory before the first
/// write, so a read error leaves all targets untouched. A path listed under
/// several placeholders sees the earlier replacements.
pub fn inject_version(version: &str, targets: &[VersionTarget]) -> Result<InjectReport, StoreError> {
    let mut outcomes = Vec::with_capacity(targets.len());
    let mut pending: Vec<(PathBuf, String)> = Vec::new();

    for target in targets {
        let slot = pending.iter().position(|(p, _)| *p == target.path);
        let content = match slot {
            Some(i) => pending[i].1.clone(),
            None => read_text(&target.path)?,
        };
        let count = content.matches(target.placeholder.as_str()).count();
        let outcome = if count == 0 {
            tracing::warn!(
                "placeholder {} not found in {}",
                target.placeholder,
                target.path.display()
            );
            InjectOutcome::PlaceholderNotFound
        } else {
            let updated = content.replace(target.placeholder.as_str(), version);
            match slot {
                Some(i) => pending[i].1 = updated,
                None => pending.push((target.path.clone(), updated)),
            }
            InjectOutcome::Replaced { count }
        };
        outcomes.push(TargetOutcome {
            path: target.path.clone(),
            placeholder: target.placeholder.clone(),
            outcome,
        });
    }

    for (path, content) in &pending {
        write_atomic(path, content)?;
        tracing::info!("injected version {version} into {}", path.display());
    }

    Ok(InjectReport {
        version: version.to_owned(),
        targets: outcomes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn target(path: &Path) -> VersionTarget {
        VersionTarget {
            path: path.to_path_buf(),
            placeholder: "__APP_VERSION__".to_owned(),
        }
    }

    #[test]
    fn replaces_every_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sw.js");
        fs::write(
            &path,
            "const V = '__APP_VERSION__';\nconst CACHE = 'app-__APP_VERSION__';\n",
        )
        .unwrap();

        let report = inject_version("2.3.0", &[target(&path)]).unwrap();
        assert_eq!(report.targets[0].outcome, InjectOutcome::Replaced { count: 2 });
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "const V = '2.3.0';\nconst CACHE = 'app-2.3.0';\n"
        );
    }

    #[test]
    fn absent_placeholder_leaves_file_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "<p>v1.0.0</p>\n").unwrap();

        let report = inject_version("2.3.0", &[target(&path)]).unwrap();
        assert_eq!(report.targets[0].outcome, InjectOutcome::PlaceholderNotFound);
        assert_eq!(report.replaced_files(), 0);
        assert_eq!(fs::read(&path).unwrap(), b"<p>v1.0.0</p>\n");
    }

    #[test]
    fn continues_past_files_without_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "none").unwrap();
        fs::write(&b, "__APP_VERSION__").unwrap();

        let report = inject_version("9.9.9", &[target(&a), target(&b)]).unwrap();
        assert_eq!(report.replaced_files(), 1);
        assert_eq!(fs::read_to_string(&b).unwrap(), "9.9.9");
    }

    #[test]
    fn missing_later_target_leaves_earlier_targets_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let sw = dir.path().join("sw.js");
        let original = "const V = '__APP_VERSION__';\n";
        fs::write(&sw, original).unwrap();
        let missing = dir.path().join("missing.html");

        let result = inject_version("2.0.0", &[target(&sw), target(&missing)]);
        assert!(matches!(result, Err(StoreError::FileNotFound(ref p)) if *p == missing));
        assert_eq!(fs::read(&sw).unwrap(), original.as_bytes());
    }

    #[test]
    fn same_file_with_two_placeholders_keeps_both_replacements() {
        let dir = tempfile::tempdir().unwrap();
        let sw = dir.path().join("sw.js");
        fs::write(&sw, "'__APP_VERSION__' '__BUILD__'").unwrap();
        let build = VersionTarget {
            path: sw.clone(),
            placeholder: "__BUILD__".to_owned(),
        };

        let report = inject_version("3.1.0", &[target(&sw), build]).unwrap();
        assert_eq!(report.replaced_files(), 2);
        assert_eq!(fs::read_to_string(&sw).unwrap(), "'3.1.0' '3.1.0'");
    }

    #[test]
    fn missing_target_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.js");
        assert!(matches!(
            inject_version("1.0.0", &[target(&path)]),
            Err(StoreError::FileNotFound(_))
        ));
    }

    #[test]
    fn outcome_serializes_flat() {
        let outcome = TargetOutcome {
            path: PathBuf::from("sw.js"),
            placeholder: "__V__".to_owned(),
            outcome: InjectOutcome::Replaced { count: 3 },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["result"], "replaced");
        assert_eq!(json["count"], 3);
    }
}
