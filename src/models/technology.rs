//! Detection reports and the flattened technology sets derived from them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Nested report produced by the detection engine.
///
/// Every node carries the identifiers detected at its level; `childs`
/// holds nested components (sub-projects, services, packages). Fields the
/// engine emits beyond these two are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TechnologyReport {
    #[serde(default)]
    pub techs: Vec<String>,
    #[serde(default)]
    pub childs: Vec<TechnologyReport>,
}

impl TechnologyReport {
    pub fn new(techs: &[&str], childs: Vec<TechnologyReport>) -> Self {
        Self {
            techs: techs.iter().map(|t| t.to_string()).collect(),
            childs,
        }
    }

    /// Collects the identifiers of this node and all of its descendants.
    pub fn flatten(&self) -> TechnologySet {
        let mut set = TechnologySet::default();
        self.collect_into(&mut set.0);
        set
    }

    fn collect_into(&self, out: &mut BTreeSet<String>) {
        out.extend(self.techs.iter().cloned());
        for child in &self.childs {
            child.collect_into(out);
        }
    }
}

/// Duplicate-free set of technology identifiers.
///
/// Backed by an ordered set so iteration and serialization are stable for
/// identical content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechnologySet(BTreeSet<String>);

impl TechnologySet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, tech: &str) -> bool {
        self.0.contains(tech)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Copy of the set without the given identifiers.
    pub fn without<'a>(&self, ignored: impl IntoIterator<Item = &'a str>) -> TechnologySet {
        let mut set = self.0.clone();
        for tech in ignored {
            set.remove(tech);
        }
        TechnologySet(set)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for TechnologySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for TechnologySet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_unions_root_and_children() {
        let report = TechnologyReport::new(
            &["nodejs"],
            vec![TechnologyReport::new(&["typescript", "nodejs"], vec![])],
        );
        assert_eq!(report.flatten().to_vec(), vec!["nodejs", "typescript"]);
    }

    #[test]
    fn test_flatten_deduplicates_across_levels() {
        let report = TechnologyReport::new(
            &["docker"],
            vec![
                TechnologyReport::new(&["docker", "go"], vec![]),
                TechnologyReport::new(&["docker"], vec![]),
            ],
        );
        let set = report.flatten();
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().filter(|t| *t == "docker").count(), 1);
    }

    #[test]
    fn test_flatten_descends_into_grandchildren() {
        let report = TechnologyReport::new(
            &[],
            vec![TechnologyReport::new(
                &["python"],
                vec![TechnologyReport::new(&["django", "postgresql"], vec![])],
            )],
        );
        assert_eq!(
            report.flatten().to_vec(),
            vec!["django", "postgresql", "python"]
        );
    }

    #[test]
    fn test_flatten_ignores_child_order() {
        let a = TechnologyReport::new(&["react"], vec![]);
        let b = TechnologyReport::new(&["vite", "typescript"], vec![]);
        let c = TechnologyReport::new(&["eslint"], vec![]);

        let forward = TechnologyReport::new(&["nodejs"], vec![a.clone(), b.clone(), c.clone()]);
        let reversed = TechnologyReport::new(&["nodejs"], vec![c, b, a]);

        assert_eq!(forward.flatten(), reversed.flatten());
        assert_eq!(forward.flatten(), forward.flatten());
    }

    #[test]
    fn test_report_deserializes_engine_output() {
        let json = r#"{
            "id": "root",
            "name": "main",
            "techs": ["github", "nodejs"],
            "childs": [
                { "id": "api", "techs": ["express"], "dependencies": [] },
                { "id": "empty" }
            ]
        }"#;
        let report: TechnologyReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.childs.len(), 2);
        assert!(report.childs[1].techs.is_empty());
        assert_eq!(
            report.flatten().to_vec(),
            vec!["express", "github", "nodejs"]
        );
    }

    #[test]
    fn test_without_removes_ignored() {
        let set: TechnologySet = ["github", "react"].into_iter().collect();
        let filtered = set.without(["github"]);
        assert!(!filtered.contains("github"));
        assert!(filtered.contains("react"));
        assert!(set.contains("github"));
    }

    #[test]
    fn test_serializes_as_array() {
        let set: TechnologySet = ["typescript", "nodejs"].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"["nodejs","typescript"]"#
        );
    }
}
