//! Structured traces of permission evaluation.
//!
//! [`Permission::explain`](crate::Permission::explain) returns an
//! [`Explanation`] tree describing exactly what an evaluation did: which
//! checks ran, what each returned, and how long each took. The tree
//! serializes to JSON for audit logs and implements [`Display`] as an
//! indented text tree for quick debugging:
//!
//! ```text
//! (isOwner OR isAdmin) -> true (184.75µs)
//!   isOwner -> false (102.5µs)
//!   isAdmin -> true (31.25µs)
//! ```
//!
//! [`Display`]: std::fmt::Display

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// The logical operator at a composite trace node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    /// Every child must grant
    And,
    /// At least one child must grant
    Or,
    /// Inverts its single child
    Not,
}

/// One node of an explain trace
///
/// Leaf checks have `operator: None` and no `details`. Composite nodes
/// carry their operator and the children that were **actually evaluated**,
/// in input order: sequential groups omit short-circuited children,
/// parallel groups list every child, `NOT` lists its single child.
///
/// `duration` is the wall-clock time spent evaluating this node, children
/// included.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    /// The name of the permission at this node
    pub name: String,
    /// The verdict of this subtree
    pub result: bool,
    /// Wall-clock evaluation time for this node, children included
    pub duration: Duration,
    /// The operator for composite nodes; `None` for leaf checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    /// The children that were evaluated, in input order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Explanation>,
}

impl Explanation {
    pub(crate) fn leaf(name: &str, result: bool, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            result,
            duration,
            operator: None,
            details: Vec::new(),
        }
    }

    pub(crate) fn group(
        name: &str,
        operator: Operator,
        result: bool,
        duration: Duration,
        details: Vec<Explanation>,
    ) -> Self {
        Self {
            name: name.to_string(),
            result,
            duration,
            operator: Some(operator),
            details,
        }
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn render(node: &Explanation, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "{:indent$}{} -> {} ({:?})",
                "",
                node.name,
                node.result,
                node.duration,
                indent = depth * 2
            )?;
            for child in &node.details {
                writeln!(f)?;
                render(child, depth + 1, f)?;
            }
            Ok(())
        }
        render(self, 0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Explanation {
        Explanation::group(
            "(isOwner OR isAdmin)",
            Operator::Or,
            true,
            Duration::from_micros(180),
            vec![
                Explanation::leaf("isOwner", false, Duration::from_micros(100)),
                Explanation::leaf("isAdmin", true, Duration::from_micros(30)),
            ],
        )
    }

    #[test]
    fn test_leaf_serialization_skips_empty_fields() {
        let leaf = Explanation::leaf("isOwner", true, Duration::from_micros(5));
        let value = serde_json::to_value(&leaf).unwrap();

        assert_eq!(value["name"], "isOwner");
        assert_eq!(value["result"], true);
        assert!(value.get("duration").is_some());
        assert!(value.get("operator").is_none());
        assert!(value.get("details").is_none());
    }

    #[test]
    fn test_group_serialization_includes_operator_and_details() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["operator"], "OR");
        assert_eq!(value["details"].as_array().unwrap().len(), 2);
        assert_eq!(value["details"][0]["name"], "isOwner");
        assert_eq!(value["details"][1]["result"], true);
    }

    #[test]
    fn test_operator_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Operator::And).unwrap(), "AND");
        assert_eq!(serde_json::to_value(Operator::Or).unwrap(), "OR");
        assert_eq!(serde_json::to_value(Operator::Not).unwrap(), "NOT");
    }

    #[test]
    fn test_display_renders_an_indented_tree() {
        let rendered = sample().to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("(isOwner OR isAdmin) -> true"));
        assert!(lines[1].starts_with("  isOwner -> false"));
        assert!(lines[2].starts_with("  isAdmin -> true"));
    }
}
