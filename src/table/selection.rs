//! Row selection keyed by row id
//!
//! Selection survives pagination, filtering and reordering because it is
//! stored against the stable row identifier rather than a position.

use std::collections::{BTreeMap, HashSet};

/// Aggregate checkbox state for the rows on the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Unchecked,
    Indeterminate,
    Checked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSelection {
    selected: BTreeMap<String, bool>,
}

impl RowSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.get(id).copied().unwrap_or(false)
    }

    pub fn set(&mut self, id: &str, value: bool) {
        if value {
            self.selected.insert(id.to_string(), true);
        } else {
            self.selected.remove(id);
        }
    }

    pub fn toggle(&mut self, id: &str) {
        let value = !self.is_selected(id);
        self.set(id, value);
    }

    /// Select or deselect every id on the current page
    pub fn set_all(&mut self, page_ids: &[&str], value: bool) {
        for id in page_ids {
            self.set(id, value);
        }
    }

    /// Header checkbox behaviour: a fully checked page is cleared,
    /// anything else becomes fully checked.
    pub fn toggle_all(&mut self, page_ids: &[&str]) {
        let value = self.page_state(page_ids) != CheckState::Checked;
        self.set_all(page_ids, value);
    }

    pub fn page_state(&self, page_ids: &[&str]) -> CheckState {
        let count = page_ids.iter().filter(|id| self.is_selected(id)).count();
        match count {
            0 => CheckState::Unchecked,
            n if n == page_ids.len() => CheckState::Checked,
            _ => CheckState::Indeterminate,
        }
    }

    /// Selected ids in sorted order
    pub fn selected_ids(&self) -> Vec<String> {
        self.selected
            .iter()
            .filter(|(_, v)| **v)
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.selected.values().filter(|v| **v).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop ids no longer present in the row collection.
    /// Returns how many entries were removed.
    pub fn retain_known<'a>(&mut self, known: impl IntoIterator<Item = &'a str>) -> usize {
        let known: HashSet<&str> = known.into_iter().collect();
        let before = self.selected.len();
        self.selected.retain(|id, _| known.contains(id.as_str()));
        before - self.selected.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut s = RowSelection::new();
        s.toggle("a");
        assert!(s.is_selected("a"));
        s.toggle("a");
        assert!(!s.is_selected("a"));
        assert!(s.is_empty());
    }

    #[test]
    fn test_page_state() {
        let mut s = RowSelection::new();
        let page = ["a", "b", "c"];
        assert_eq!(s.page_state(&page), CheckState::Unchecked);
        s.set("b", true);
        assert_eq!(s.page_state(&page), CheckState::Indeterminate);
        s.set_all(&page, true);
        assert_eq!(s.page_state(&page), CheckState::Checked);
    }

    #[test]
    fn test_toggle_all_from_indeterminate_selects_page() {
        let mut s = RowSelection::new();
        s.set("a", true);
        s.set("z", true);
        s.toggle_all(&["a", "b"]);
        assert_eq!(s.selected_ids(), vec!["a", "b", "z"]);
        s.toggle_all(&["a", "b"]);
        assert_eq!(s.selected_ids(), vec!["z"]);
    }

    #[test]
    fn test_empty_page_is_unchecked() {
        let s = RowSelection::new();
        assert_eq!(s.page_state(&[]), CheckState::Unchecked);
    }

    #[test]
    fn test_retain_known_prunes_stale_ids() {
        let mut s = RowSelection::new();
        s.set_all(&["a", "b", "c"], true);
        let removed = s.retain_known(["a", "c"]);
        assert_eq!(removed, 1);
        assert_eq!(s.selected_ids(), vec!["a", "c"]);
    }

    #[test]
    fn test_clear() {
        let mut s = RowSelection::new();
        s.set_all(&["a", "b"], true);
        s.clear();
        assert_eq!(s.len(), 0);
    }
}
