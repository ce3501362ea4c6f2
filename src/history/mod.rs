pub mod commands;

use crate::model::ViewState;

/// Command categories, for logging and history inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Selection,
    LayerVisibility,
    CameraMove,
    Annotation,
}

/// A reversible unit of state change. Implementations carry immutable
/// before/after snapshots captured at construction time, never live
/// references, so a later change to the same entity cannot alias the undo.
pub trait Command {
    fn kind(&self) -> CommandKind;
    fn apply(&mut self, state: &mut ViewState);
    fn undo(&mut self, state: &mut ViewState);
    fn description(&self) -> &str;
}

/// Linear undo/redo history using the command pattern.
///
/// `commands[..applied]` are the currently applied commands in execution
/// order; `commands[applied..]` is the redo tail, discarded whenever a new
/// command is pushed. There is no branching timeline and no coalescing:
/// undo/redo replay commands strictly in the order they were pushed.
pub struct History {
    commands: Vec<Box<dyn Command>>,
    applied: usize,
}

impl History {
    pub fn new() -> Self {
        Self { commands: Vec::new(), applied: 0 }
    }

    /// Apply `cmd` and record it, discarding any redoable commands.
    /// The command is recorded only after `apply` returns, so a panicking
    /// apply leaves the history untouched.
    pub fn push(&mut self, mut cmd: Box<dyn Command>, state: &mut ViewState) {
        cmd.apply(state);
        log::debug!("executed {:?}: {}", cmd.kind(), cmd.description());
        self.commands.truncate(self.applied);
        self.commands.push(cmd);
        self.applied = self.commands.len();
    }

    /// Undo the most recently applied command. No-op on an empty history.
    pub fn undo(&mut self, state: &mut ViewState) -> bool {
        if self.applied == 0 {
            return false;
        }
        self.applied -= 1;
        let cmd = &mut self.commands[self.applied];
        cmd.undo(state);
        log::debug!("undone {:?}: {}", cmd.kind(), cmd.description());
        true
    }

    /// Re-apply the most recently undone command. No-op when nothing was undone.
    pub fn redo(&mut self, state: &mut ViewState) -> bool {
        if self.applied == self.commands.len() {
            return false;
        }
        let cmd = &mut self.commands[self.applied];
        cmd.apply(state);
        log::debug!("redone {:?}: {}", cmd.kind(), cmd.description());
        self.applied += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.commands.len()
    }

    /// Description of the command `undo` would revert.
    pub fn undo_description(&self) -> Option<&str> {
        self.applied
            .checked_sub(1)
            .map(|i| self.commands[i].description())
    }

    /// Description of the command `redo` would re-apply.
    pub fn redo_description(&self) -> Option<&str> {
        self.commands.get(self.applied).map(|c| c.description())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::commands::SelectEquipment;
    use crate::model::ViewState;

    fn state() -> ViewState {
        ViewState::new(Vec::new())
    }

    fn select(state: &ViewState, tags: &[&str]) -> Box<dyn Command> {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        Box::new(SelectEquipment::from_batch(state, &tags, None).expect("non-trivial selection"))
    }

    #[test]
    fn undo_rewinds_to_prefix_of_history() {
        let mut state = state();
        let mut history = History::new();

        let sequences: [&[&str]; 3] = [&["A"], &["A", "B"], &["C"]];
        for tags in sequences {
            let cmd = select(&state, tags);
            history.push(cmd, &mut state);
        }
        assert_eq!(state.selected_tags, vec!["C"]);

        // After N undos the observable state equals the state after the
        // first (len - N) commands only.
        history.undo(&mut state);
        assert_eq!(state.selected_tags, vec!["A", "B"]);
        history.undo(&mut state);
        assert_eq!(state.selected_tags, vec!["A"]);
        history.undo(&mut state);
        assert!(state.selected_tags.is_empty());
        assert!(!history.can_undo());
        assert!(!history.undo(&mut state));
    }

    #[test]
    fn undo_then_redo_is_identity() {
        let mut state = state();
        let mut history = History::new();
        history.push(select(&state, &["A"]), &mut state);
        history.push(select(&state, &["A", "B"]), &mut state);

        let before = state.selected_tags.clone();
        history.undo(&mut state);
        history.redo(&mut state);
        assert_eq!(state.selected_tags, before);
    }

    #[test]
    fn push_discards_redo_tail() {
        let mut state = state();
        let mut history = History::new();
        history.push(select(&state, &["A"]), &mut state);
        history.push(select(&state, &["B"]), &mut state);
        history.undo(&mut state);
        assert!(history.can_redo());

        history.push(select(&state, &["C"]), &mut state);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(state.selected_tags, vec!["C"]);

        // The old redo branch is gone for good: undoing walks back to "A".
        history.undo(&mut state);
        assert_eq!(state.selected_tags, vec!["A"]);
    }

    #[test]
    fn boundary_calls_are_noops() {
        let mut state = state();
        let mut history = History::new();
        assert!(!history.undo(&mut state));
        assert!(!history.redo(&mut state));

        history.push(select(&state, &["A"]), &mut state);
        assert!(!history.redo(&mut state));
        assert_eq!(state.selected_tags, vec!["A"]);
    }

    #[test]
    fn descriptions_follow_the_cursor() {
        let mut state = state();
        let mut history = History::new();
        history.push(select(&state, &["A"]), &mut state);
        assert!(history.undo_description().is_some());
        assert!(history.redo_description().is_none());

        history.undo(&mut state);
        assert!(history.undo_description().is_none());
        assert!(history.redo_description().is_some());
    }
}
