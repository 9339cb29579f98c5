//! Entity table descriptors and their foreign-key dependency graph.
//!
//! Each [`TableSpec`] names the tables it references. The initialisation
//! order is computed from those declarations rather than hand-maintained, so
//! an inconsistent catalog is reported at startup instead of producing a
//! dangling constraint.

use std::collections::{BTreeSet, HashMap};

use crate::{Error, Result};

/// Describes one entity table: its DDL, the tables it foreign-keys into, and
/// (for singleton settings tables) the statement that seeds the default row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
  pub name:    &'static str,
  /// Every table referenced by a `FOREIGN KEY` / `REFERENCES` clause.
  /// A self-reference is allowed and ignored for ordering purposes.
  pub parents: &'static [&'static str],
  /// Idempotent statements (`CREATE ... IF NOT EXISTS`), executed in order.
  pub ddl:     &'static [&'static str],
  /// Insert-if-absent statement for singleton-row tables.
  pub seed:    Option<&'static str>,
}

impl TableSpec {
  pub fn is_singleton(&self) -> bool { self.seed.is_some() }

  fn foreign_parents(&self) -> impl Iterator<Item = &'static str> + '_ {
    let name = self.name;
    self.parents.iter().copied().filter(move |p| *p != name)
  }
}

/// Compute a creation order in which every table follows all of its parents.
///
/// Uses Kahn's algorithm; among tables that are ready at the same time, the
/// one declared first wins, so the result is deterministic.
pub fn initialization_order(tables: &[TableSpec]) -> Result<Vec<&TableSpec>> {
  let mut index: HashMap<&str, usize> = HashMap::with_capacity(tables.len());
  for (i, spec) in tables.iter().enumerate() {
    if index.insert(spec.name, i).is_some() {
      return Err(Error::DuplicateTable(spec.name.to_owned()));
    }
  }

  let mut pending  = vec![0usize; tables.len()];
  let mut children = vec![Vec::new(); tables.len()];

  for (i, spec) in tables.iter().enumerate() {
    let parents: BTreeSet<&str> = spec.foreign_parents().collect();
    for parent in parents {
      let Some(&p) = index.get(parent) else {
        return Err(Error::UnknownDependency {
          table:  spec.name.to_owned(),
          parent: parent.to_owned(),
        });
      };
      children[p].push(i);
      pending[i] += 1;
    }
  }

  let mut ready: BTreeSet<usize> =
    (0..tables.len()).filter(|&i| pending[i] == 0).collect();
  let mut order = Vec::with_capacity(tables.len());

  while let Some(i) = ready.pop_first() {
    order.push(&tables[i]);
    for &child in &children[i] {
      pending[child] -= 1;
      if pending[child] == 0 {
        ready.insert(child);
      }
    }
  }

  if order.len() < tables.len() {
    let stuck = tables
      .iter()
      .enumerate()
      .filter(|(i, _)| pending[*i] > 0)
      .map(|(_, spec)| spec.name.to_owned())
      .collect();
    return Err(Error::DependencyCycle(stuck));
  }

  Ok(order)
}

/// The reverse of [`initialization_order`]: children before parents, as
/// required when dropping tables.
pub fn teardown_order(tables: &[TableSpec]) -> Result<Vec<&TableSpec>> {
  let mut order = initialization_order(tables)?;
  order.reverse();
  Ok(order)
}

/// Concatenate every table's DDL and seed statement, in initialisation order,
/// into one schema script.
pub fn render_schema(tables: &[TableSpec]) -> Result<String> {
  let mut out = String::new();
  for spec in initialization_order(tables)? {
    out.push_str(&format!("-- {}\n", spec.name));
    for stmt in spec.ddl.iter().chain(spec.seed.iter()) {
      out.push_str(stmt.trim());
      out.push_str(";\n");
    }
    out.push('\n');
  }
  Ok(out)
}
