//! Hospital record screens: patients, the staff directory and account
//! creation.

use ratatui::widgets::TableState;

pub mod accounts;
pub mod patients;
pub mod staff;

/// Moves the table selection down one row, wrapping to the top.
pub(crate) fn select_next(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let i = match state.selected() {
        Some(i) if i + 1 < len => i + 1,
        _ => 0,
    };
    state.select(Some(i));
}

/// Moves the table selection up one row, wrapping to the bottom.
pub(crate) fn select_previous(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let i = match state.selected() {
        Some(0) | None => len - 1,
        Some(i) => i - 1,
    };
    state.select(Some(i.min(len - 1)));
}

/// Keeps the selection inside a list that may have shrunk.
pub(crate) fn clamp_selection(state: &mut TableState, len: usize) {
    match (state.selected(), len) {
        (_, 0) => state.select(None),
        (None, _) => state.select(Some(0)),
        (Some(i), len) if i >= len => state.select(Some(len - 1)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_wraps_both_ways() {
        let mut state = TableState::default();
        select_next(&mut state, 3);
        assert_eq!(state.selected(), Some(0));
        select_previous(&mut state, 3);
        assert_eq!(state.selected(), Some(2));
        select_next(&mut state, 3);
        assert_eq!(state.selected(), Some(0));
    }

    #[test]
    fn clamp_follows_shrinking_list() {
        let mut state = TableState::default().with_selected(Some(4));
        clamp_selection(&mut state, 2);
        assert_eq!(state.selected(), Some(1));
        clamp_selection(&mut state, 0);
        assert_eq!(state.selected(), None);
    }
}
