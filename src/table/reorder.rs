//! Drag-to-reorder controller
//!
//! Pointer drags only start once the pointer has travelled further than the
//! activation distance, so a plain click never reorders. Drop targets are
//! resolved from the vertical position alone. Keyboard pick-up / move / drop
//! offers the same operation without a pointer.

use super::value::Row;

/// Move one element from `from` to `to`, keeping the relative order of the rest
pub fn move_item<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut moved = items.to_vec();
    if from < moved.len() && to < moved.len() {
        let item = moved.remove(from);
        moved.insert(to, item);
    }
    moved
}

/// Move the item identified by `active_id` to the position of `over_id`.
/// `None` when either id is unknown or both are the same row.
pub fn reorder_by_id<T, F>(items: &[T], active_id: &str, over_id: &str, id_of: F) -> Option<Vec<T>>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    if active_id == over_id {
        return None;
    }
    let old_index = items.iter().position(|item| id_of(item) == active_id)?;
    let new_index = items.iter().position(|item| id_of(item) == over_id)?;
    Some(move_item(items, old_index, new_index))
}

/// New persisted order value of a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderChange {
    pub id: String,
    pub order: i64,
}

/// Rows whose new zero-based index differs from their stored order value.
/// Rows without a stored value are always written.
pub fn order_changes<F>(reordered: &[Row], stored_order: F) -> Vec<OrderChange>
where
    F: Fn(&str) -> Option<i64>,
{
    reordered
        .iter()
        .enumerate()
        .filter(|(i, row)| stored_order(row.id()) != Some(*i as i64))
        .map(|(i, row)| OrderChange {
            id: row.id().to_string(),
            order: i as i64,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragInput {
    Pointer,
    Keyboard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragPhase {
    Idle,
    /// Pointer pressed on a row, not yet past the activation distance
    Pending { row_id: String, origin: (u16, u16) },
    Dragging {
        row_id: String,
        over: Option<String>,
        input: DragInput,
    },
}

#[derive(Debug, Clone)]
pub struct DragReorder {
    phase: DragPhase,
    activation_distance: f32,
}

impl Default for DragReorder {
    fn default() -> Self {
        Self::new(1)
    }
}

impl DragReorder {
    pub fn new(activation_distance: u16) -> Self {
        Self {
            phase: DragPhase::Idle,
            activation_distance: f32::from(activation_distance),
        }
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    pub fn active_id(&self) -> Option<&str> {
        match &self.phase {
            DragPhase::Dragging { row_id, .. } => Some(row_id),
            _ => None,
        }
    }

    /// How the current drag is driven
    pub fn input(&self) -> Option<DragInput> {
        match &self.phase {
            DragPhase::Dragging { input, .. } => Some(*input),
            _ => None,
        }
    }

    pub fn over_id(&self) -> Option<&str> {
        match &self.phase {
            DragPhase::Dragging { over, .. } => over.as_deref(),
            _ => None,
        }
    }

    /// Pointer pressed on a row's drag handle
    pub fn pointer_down(&mut self, row_id: &str, column: u16, row: u16) {
        self.phase = DragPhase::Pending {
            row_id: row_id.to_string(),
            origin: (column, row),
        };
    }

    /// Pointer moved; `hovered` is the row under the pointer's vertical position
    pub fn pointer_move(&mut self, column: u16, row: u16, hovered: Option<&str>) {
        match &mut self.phase {
            DragPhase::Pending { row_id, origin } => {
                let dx = f32::from(column) - f32::from(origin.0);
                let dy = f32::from(row) - f32::from(origin.1);
                if (dx * dx + dy * dy).sqrt() > self.activation_distance {
                    let row_id = std::mem::take(row_id);
                    tracing::debug!("Drag started for row {}", row_id);
                    self.phase = DragPhase::Dragging {
                        row_id,
                        over: hovered.map(str::to_string),
                        input: DragInput::Pointer,
                    };
                }
            }
            DragPhase::Dragging { over, .. } => {
                *over = hovered.map(str::to_string);
            }
            DragPhase::Idle => {}
        }
    }

    /// Pointer released. Returns the reordered rows when a drag completed
    /// over a different row.
    pub fn pointer_up<T, F>(&mut self, items: &[T], id_of: F) -> Option<Vec<T>>
    where
        T: Clone,
        F: Fn(&T) -> &str,
    {
        match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Dragging {
                row_id,
                over: Some(over),
                ..
            } => reorder_by_id(items, &row_id, &over, id_of),
            _ => None,
        }
    }

    /// Pick a row up for keyboard reordering
    pub fn begin_drag(&mut self, row_id: &str) {
        self.phase = DragPhase::Dragging {
            row_id: row_id.to_string(),
            over: Some(row_id.to_string()),
            input: DragInput::Keyboard,
        };
    }

    /// Move the keyboard drop target one row up or down among `visible_ids`
    pub fn move_target(&mut self, visible_ids: &[&str], down: bool) {
        if let DragPhase::Dragging { over, .. } = &mut self.phase {
            let Some(pos) = over
                .as_deref()
                .and_then(|o| visible_ids.iter().position(|id| *id == o))
            else {
                return;
            };
            let next = if down {
                (pos + 1).min(visible_ids.len().saturating_sub(1))
            } else {
                pos.saturating_sub(1)
            };
            *over = Some(visible_ids[next].to_string());
        }
    }

    /// Drop the dragged row onto `target_id`
    pub fn drop_onto<T, F>(&mut self, target_id: &str, items: &[T], id_of: F) -> Option<Vec<T>>
    where
        T: Clone,
        F: Fn(&T) -> &str,
    {
        match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Dragging { row_id, .. } => reorder_by_id(items, &row_id, target_id, id_of),
            _ => None,
        }
    }

    /// Drop onto the current target
    pub fn drop_current<T, F>(&mut self, items: &[T], id_of: F) -> Option<Vec<T>>
    where
        T: Clone,
        F: Fn(&T) -> &str,
    {
        match self.over_id().map(str::to_string) {
            Some(target) => self.drop_onto(&target, items, id_of),
            None => {
                self.cancel();
                None
            }
        }
    }

    pub fn cancel(&mut self) {
        self.phase = DragPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rows(ids: &[&str]) -> Vec<Row> {
        ids.iter().map(|id| Row::new(*id)).collect()
    }

    fn ids(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(Row::id).collect()
    }

    #[test]
    fn test_drag_first_row_to_end() {
        let data = rows(&["a", "b", "c"]);
        let mut drag = DragReorder::new(1);
        drag.begin_drag("a");
        let result = drag.drop_onto("c", &data, Row::id).unwrap();
        assert_eq!(ids(&result), vec!["b", "c", "a"]);
        assert_eq!(ids(&data), vec!["a", "b", "c"]);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_click_does_not_reorder() {
        let data = rows(&["a", "b", "c"]);
        let mut drag = DragReorder::new(2);
        drag.pointer_down("a", 1, 5);
        drag.pointer_move(2, 6, Some("b"));
        assert!(!drag.is_dragging());
        assert_eq!(drag.pointer_up(&data, Row::id), None);
        assert_eq!(drag.phase(), &DragPhase::Idle);
    }

    #[test]
    fn test_pointer_drag_past_threshold() {
        let data = rows(&["a", "b", "c"]);
        let mut drag = DragReorder::new(1);
        drag.pointer_down("c", 1, 7);
        drag.pointer_move(1, 6, Some("b"));
        assert_eq!(drag.input(), Some(DragInput::Pointer));
        drag.pointer_move(1, 5, Some("a"));
        assert_eq!(drag.over_id(), Some("a"));
        let result = drag.pointer_up(&data, Row::id).unwrap();
        assert_eq!(ids(&result), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_drop_on_self_or_nowhere_is_skipped() {
        let data = rows(&["a", "b"]);
        let mut drag = DragReorder::new(1);
        drag.pointer_down("a", 0, 0);
        drag.pointer_move(0, 3, None);
        assert_eq!(drag.pointer_up(&data, Row::id), None);

        drag.begin_drag("a");
        assert_eq!(drag.drop_onto("a", &data, Row::id), None);
    }

    #[test]
    fn test_stale_ids_are_skipped() {
        let data = rows(&["a", "b"]);
        let mut drag = DragReorder::new(1);
        drag.begin_drag("gone");
        assert_eq!(drag.drop_onto("a", &data, Row::id), None);
        drag.begin_drag("a");
        assert_eq!(drag.drop_onto("gone", &data, Row::id), None);
    }

    #[test]
    fn test_keyboard_target_moves_within_bounds() {
        let data = rows(&["a", "b", "c"]);
        let visible = ["a", "b", "c"];
        let mut drag = DragReorder::default();
        assert_eq!(drag.input(), None);
        drag.begin_drag("b");
        assert_eq!(drag.input(), Some(DragInput::Keyboard));
        drag.move_target(&visible, true);
        drag.move_target(&visible, true);
        assert_eq!(drag.over_id(), Some("c"));
        drag.move_target(&visible, false);
        drag.move_target(&visible, false);
        drag.move_target(&visible, false);
        assert_eq!(drag.over_id(), Some("a"));
        let result = drag.drop_current(&data, Row::id).unwrap();
        assert_eq!(ids(&result), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_order_changes_only_moved_rows() {
        let stored = |id: &str| ["a", "b", "c", "d"].iter().position(|s| *s == id).map(|i| i as i64);
        let reordered = rows(&["a", "c", "b", "d"]);
        assert_eq!(
            order_changes(&reordered, stored),
            vec![
                OrderChange { id: "c".to_string(), order: 1 },
                OrderChange { id: "b".to_string(), order: 2 },
            ]
        );
    }

    #[test]
    fn test_order_changes_rewrite_stale_orders() {
        // Every row shares order 0, as after several inserts
        let reordered = rows(&["b", "a", "c"]);
        let changes = order_changes(&reordered, |id| (id != "d").then_some(0));
        let written: Vec<(&str, i64)> = changes.iter().map(|c| (c.id.as_str(), c.order)).collect();
        assert_eq!(written, vec![("a", 1), ("c", 2)]);

        let missing = order_changes(&rows(&["d"]), |_| None);
        assert_eq!(missing, vec![OrderChange { id: "d".to_string(), order: 0 }]);
    }

    proptest! {
        #[test]
        fn prop_move_preserves_others(from in 0usize..5, to in 0usize..5) {
            prop_assume!(from != to);
            let data = rows(&["r0", "r1", "r2", "r3", "r4"]);
            let moved_id = data[from].id().to_string();
            let result = move_item(&data, from, to);
            prop_assert_eq!(result[to].id(), moved_id.as_str());
            let others_before: Vec<&str> = ids(&data).into_iter().filter(|id| *id != moved_id).collect();
            let others_after: Vec<&str> = ids(&result).into_iter().filter(|id| *id != moved_id).collect();
            prop_assert_eq!(others_before, others_after);
        }
    }
}
