//! Statement-scoped table resolution.
//!
//! Every identifier that can qualify a column in a statement (bare
//! relation, alias, `schema.relation`, `catalog.schema.relation`, or the
//! empty string for unqualified references in single-table statements) maps
//! back to one fully-qualified table name.

use std::collections::{BTreeSet, HashMap};

use sqlparser::ast::{ObjectName, TableFactor};

use crate::error::PolicyError;

/// Qualifier-to-FQN map for one statement.
#[derive(Debug)]
pub(crate) struct Tables {
    default_schema: String,
    map: HashMap<String, String>,
}

impl Tables {
    pub(crate) fn new(default_schema: &str) -> Self {
        Self {
            default_schema: default_schema.to_owned(),
            map: HashMap::new(),
        }
    }

    /// Register a table appearance and return its fully-qualified name.
    ///
    /// When the statement omits the schema, the default schema is folded
    /// into the FQN, and the explicit `default_schema.relation` spelling
    /// resolves to the same entry.
    pub(crate) fn put(
        &mut self,
        catalog: Option<String>,
        schema: Option<String>,
        relation: String,
        alias: Option<String>,
    ) -> Result<String, PolicyError> {
        if relation.is_empty() {
            return Err(PolicyError::bad_query("empty relation name"));
        }

        let schema = schema
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.default_schema.clone());
        let qualified = format!("{schema}.{relation}");
        let fqn = match catalog.filter(|c| !c.is_empty()) {
            Some(catalog) => format!("{catalog}.{qualified}"),
            None => qualified.clone(),
        };

        self.map.insert(relation, fqn.clone());
        self.map.insert(qualified, fqn.clone());
        self.map.insert(fqn.clone(), fqn.clone());
        if let Some(alias) = alias.filter(|a| !a.is_empty()) {
            self.map.insert(alias, fqn.clone());
        }

        Ok(fqn)
    }

    /// Resolve a qualifier to its FQN, following alias chains.
    pub(crate) fn get(&self, name: &str) -> Option<String> {
        let mut current = self.map.get(name)?;
        while let Some(next) = self.map.get(current) {
            if next == current {
                break;
            }
            current = next;
        }
        Some(current.clone())
    }

    /// Install the empty-string qualifier when exactly one table is
    /// registered, so unqualified column references resolve to it. Must be
    /// called after all tables are registered.
    pub(crate) fn finalize(&mut self) {
        let all = self.all();
        if let [only] = all.as_slice() {
            self.map.insert(String::new(), only.clone());
        }
    }

    /// All distinct FQNs registered so far, in a stable order.
    pub(crate) fn all(&self) -> Vec<String> {
        let mut distinct = BTreeSet::new();
        for key in self.map.keys() {
            if let Some(fqn) = self.get(key) {
                distinct.insert(fqn);
            }
        }
        distinct.into_iter().collect()
    }
}

/// Split an object name into (catalog, schema, relation) identifier parts.
pub(crate) fn split_object_name(
    name: &ObjectName,
) -> Result<(Option<String>, Option<String>, String), PolicyError> {
    let mut parts = Vec::with_capacity(name.0.len());
    for part in &name.0 {
        let Some(ident) = part.as_ident() else {
            return Err(PolicyError::complicated("unsupported table name syntax"));
        };
        parts.push(ident.value.clone());
    }

    let relation = parts
        .pop()
        .ok_or_else(|| PolicyError::bad_query("empty table name"))?;
    let schema = parts.pop();
    let catalog = parts.pop();
    if !parts.is_empty() {
        return Err(PolicyError::complicated(
            "table name has too many qualifiers",
        ));
    }

    Ok((catalog, schema, relation))
}

/// Register the single relation of a FROM-like clause. Anything that is not
/// a plain (optionally aliased) table reference is refused.
pub(crate) fn register_table_factor(
    tables: &mut Tables,
    relation: &TableFactor,
) -> Result<String, PolicyError> {
    match relation {
        TableFactor::Table {
            name,
            alias,
            args,
            with_ordinality,
            ..
        } => {
            if args.is_some() {
                return Err(PolicyError::complicated(
                    "table functions are not supported",
                ));
            }
            if *with_ordinality {
                return Err(PolicyError::complicated(
                    "WITH ORDINALITY is not supported",
                ));
            }

            let alias = match alias {
                Some(alias) => {
                    if !alias.columns.is_empty() {
                        return Err(PolicyError::complicated(
                            "column aliases on tables are not supported",
                        ));
                    }
                    Some(alias.name.value.clone())
                }
                None => None,
            };

            let (catalog, schema, relation) = split_object_name(name)?;
            tables.put(catalog, schema, relation, alias)
        }
        TableFactor::Derived { .. } => Err(PolicyError::complicated(
            "subqueries in FROM are not supported",
        )),
        TableFactor::NestedJoin { .. } => Err(PolicyError::complicated(
            "JOIN expressions are not supported",
        )),
        _ => Err(PolicyError::complicated("unsupported FROM clause")),
    }
}
