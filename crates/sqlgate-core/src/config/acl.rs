//! Access rule configuration.

use serde::{Deserialize, Serialize};

/// Wildcard selector value. Matches any literal in the same position.
pub const STAR: &str = "*";

/// One ordered access rule.
///
/// Each selector is either a literal (`"u1"`, `"select"`, `"t1"`,
/// `"public.clients"`) or [`STAR`]. The first rule whose four selectors all
/// match a query decides the outcome; absence of a match is an implicit
/// deny.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRule {
    pub user: String,
    pub op: String,
    pub target: String,
    pub tbl: String,
    pub allow: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_round_trips() {
        let raw = r#"{"user":"*","op":"select","target":"t1","tbl":"public.clients","allow":true}"#;
        let rule: AclRule = serde_json::from_str(raw).unwrap();
        assert_eq!(rule.user, STAR);
        assert!(rule.allow);
        assert_eq!(serde_json::to_string(&rule).unwrap(), raw);
    }
}
