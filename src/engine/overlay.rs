use crossterm::event::KeyCode;

use crate::models::ResourceKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPurpose {
    CreateProject,
    AddRepo { project: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    RemoveResource { project: String, key: ResourceKey },
    DeleteProject { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayView {
    /// Single-line text entry.
    Input {
        title: String,
        value: String,
        purpose: InputPurpose,
    },
    /// Yes/no confirmation before a destructive action.
    Confirm {
        prompt: String,
        action: ConfirmAction,
    },
    /// Progress log for a supervised run. Dismissal is two-step while a
    /// cancel handle is live (see update::handle_overlay_key).
    Progress {
        title: String,
        lines: Vec<String>,
        done: bool,
    },
}

/// A modal view that owns all input until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub view: OverlayView,
    pub dismiss_key: KeyCode,
}

impl Overlay {
    pub fn input(title: impl Into<String>, purpose: InputPurpose) -> Self {
        Self {
            view: OverlayView::Input {
                title: title.into(),
                value: String::new(),
                purpose,
            },
            dismiss_key: KeyCode::Esc,
        }
    }

    pub fn confirm(prompt: impl Into<String>, action: ConfirmAction) -> Self {
        Self {
            view: OverlayView::Confirm {
                prompt: prompt.into(),
                action,
            },
            dismiss_key: KeyCode::Esc,
        }
    }

    pub fn progress(title: impl Into<String>, first_line: impl Into<String>) -> Self {
        Self {
            view: OverlayView::Progress {
                title: title.into(),
                lines: vec![first_line.into()],
                done: false,
            },
            dismiss_key: KeyCode::Esc,
        }
    }
}

/// LIFO stack of overlays owned by the dispatcher.
#[derive(Debug, Default)]
pub struct OverlayStack {
    stack: Vec<Overlay>,
}

impl OverlayStack {
    pub fn push(&mut self, overlay: Overlay) {
        self.stack.push(overlay);
    }

    pub fn pop(&mut self) -> Option<Overlay> {
        self.stack.pop()
    }

    pub fn peek(&self) -> Option<&Overlay> {
        self.stack.last()
    }

    pub fn peek_mut(&mut self) -> Option<&mut Overlay> {
        self.stack.last_mut()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Mutable view of the top overlay when it is a progress overlay.
    pub fn top_progress_mut(&mut self) -> Option<(&mut Vec<String>, &mut bool)> {
        match self.stack.last_mut() {
            Some(Overlay {
                view: OverlayView::Progress { lines, done, .. },
                ..
            }) => Some((lines, done)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_is_lifo() {
        let mut stack = OverlayStack::default();
        stack.push(Overlay::input("Create project", InputPurpose::CreateProject));
        stack.push(Overlay::progress("Agent run", "starting"));

        assert_eq!(stack.len(), 2);
        assert!(matches!(
            stack.peek().unwrap().view,
            OverlayView::Progress { .. }
        ));

        let top = stack.pop().unwrap();
        assert!(matches!(top.view, OverlayView::Progress { .. }));
        assert!(matches!(
            stack.peek().unwrap().view,
            OverlayView::Input { .. }
        ));
    }

    #[test]
    fn top_progress_mut_only_matches_progress_on_top() {
        let mut stack = OverlayStack::default();
        stack.push(Overlay::progress("Agent run", "starting"));
        stack.push(Overlay::input("Create project", InputPurpose::CreateProject));

        assert!(stack.top_progress_mut().is_none());
        stack.pop();
        assert!(stack.top_progress_mut().is_some());
    }
}
