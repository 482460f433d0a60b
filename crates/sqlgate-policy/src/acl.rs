//! Access rule evaluation.
//!
//! Rules are evaluated in declaration order with firewall semantics: the
//! first rule every filter matches decides the outcome, and no match means
//! deny. Wildcard selectors match anything, so broad defaults belong at the
//! end of the list.

use sqlgate_core::config::{AclRule, STAR};
use sqlgate_core::{Op, TargetId, UserId};

/// Predicate over one rule. A rule matches a query when every filter
/// returns true for it.
pub type RuleFilter = Box<dyn Fn(&AclRule) -> bool + Send + Sync>;

/// The ordered rule list of one gateway process.
#[derive(Debug, Clone, Default)]
pub struct AclSet {
    rules: Vec<AclRule>,
}

impl AclSet {
    pub fn new(rules: Vec<AclRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[AclRule] {
        &self.rules
    }

    /// Evaluate the rule list against the given filters. Returns the
    /// `allow` field of the first full match, or false when nothing
    /// matches. An empty filter list never grants access.
    pub fn allow(&self, filters: &[RuleFilter]) -> bool {
        if filters.is_empty() || self.rules.is_empty() {
            return false;
        }

        for rule in &self.rules {
            if filters.iter().all(|filter| filter(rule)) {
                return rule.allow;
            }
        }

        false
    }
}

/// Match rules whose `user` selector names this user or is the wildcard.
pub fn by_user(user: &UserId) -> RuleFilter {
    let user = user.to_string();
    Box::new(move |rule| rule.user == STAR || rule.user == user)
}

/// Match rules whose `target` selector names this target or is the wildcard.
pub fn by_target(target: &TargetId) -> RuleFilter {
    let target = target.to_string();
    Box::new(move |rule| rule.target == STAR || rule.target == target)
}

/// Match rules whose `op` selector names this operation or is the wildcard.
pub fn by_op(op: Op) -> RuleFilter {
    Box::new(move |rule| rule.op == STAR || rule.op == op.as_str())
}

/// Match rules whose `tbl` selector names this table or is the wildcard.
pub fn by_table(table: &str) -> RuleFilter {
    let table = table.to_owned();
    Box::new(move |rule| rule.tbl == STAR || rule.tbl == table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(user: &str, op: &str, target: &str, tbl: &str, allow: bool) -> AclRule {
        AclRule {
            user: user.into(),
            op: op.into(),
            target: target.into(),
            tbl: tbl.into(),
            allow,
        }
    }

    fn filters(user: &str, op: Op, target: &str, tbl: &str) -> Vec<RuleFilter> {
        vec![
            by_user(&UserId::from(user)),
            by_op(op),
            by_target(&TargetId::from(target)),
            by_table(tbl),
        ]
    }

    #[test]
    fn empty_rule_list_denies() {
        let acls = AclSet::new(Vec::new());
        assert!(!acls.allow(&filters("u1", Op::Select, "t1", "public.clients")));
    }

    #[test]
    fn empty_filter_list_denies() {
        let acls = AclSet::new(vec![rule("*", "*", "*", "*", true)]);
        assert!(!acls.allow(&[]));
    }

    #[test]
    fn literal_match_returns_allow_field() {
        let acls = AclSet::new(vec![rule("u1", "select", "t1", "public.clients", true)]);
        assert!(acls.allow(&filters("u1", Op::Select, "t1", "public.clients")));
        assert!(!acls.allow(&filters("u2", Op::Select, "t1", "public.clients")));
        assert!(!acls.allow(&filters("u1", Op::Insert, "t1", "public.clients")));
        assert!(!acls.allow(&filters("u1", Op::Select, "t2", "public.clients")));
        assert!(!acls.allow(&filters("u1", Op::Select, "t1", "public.orders")));
    }

    #[test]
    fn wildcard_matches_every_field() {
        let acls = AclSet::new(vec![rule("*", "*", "*", "*", true)]);
        assert!(acls.allow(&filters("anyone", Op::Delete, "anything", "any.table")));
    }

    #[test]
    fn first_match_wins() {
        let acls = AclSet::new(vec![
            rule("u1", "select", "t1", "public.clients", false),
            rule("*", "*", "*", "*", true),
        ]);
        assert!(!acls.allow(&filters("u1", Op::Select, "t1", "public.clients")));
        assert!(acls.allow(&filters("u2", Op::Select, "t1", "public.clients")));
    }

    #[test]
    fn later_rules_do_not_override_an_earlier_match() {
        let acls = AclSet::new(vec![
            rule("*", "*", "*", "*", true),
            rule("u1", "select", "t1", "public.clients", false),
        ]);
        assert!(acls.allow(&filters("u1", Op::Select, "t1", "public.clients")));
    }

    #[test]
    fn deny_rule_matches_like_allow() {
        let acls = AclSet::new(vec![rule("*", "select", "t1", "public.clients", false)]);
        assert!(!acls.allow(&filters("u1", Op::Select, "t1", "public.clients")));
    }
}
