use std::collections::HashSet;

/// Canonical paths currently being loaded by one top-level load call.
///
/// Keeps both a stack (for the cycle message) and a set (for lookups).
#[derive(Debug, Default)]
pub(crate) struct VisitingSet {
    stack: Vec<String>,
    members: HashSet<String>,
}

impl VisitingSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn contains(&self, path: &str) -> bool {
        self.members.contains(path)
    }

    pub(crate) fn len(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub(crate) fn push(&mut self, path: &str) {
        if self.members.insert(path.to_string()) {
            self.stack.push(path.to_string());
        }
    }

    pub(crate) fn remove(&mut self, path: &str) {
        if self.members.remove(path)
            && let Some(position) = self.stack.iter().rposition(|entry| entry == path)
        {
            self.stack.remove(position);
        }
    }

    /// The chain of paths from the first visit of `path` back to `path`,
    /// e.g. `a.prefab → b.prefab → a.prefab`.
    pub(crate) fn chain_to(&self, path: &str) -> String {
        let start = self.stack.iter().position(|entry| entry == path).unwrap_or(0);
        self.stack[start..]
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(path))
            .collect::<Vec<_>>()
            .join(" → ")
    }
}
