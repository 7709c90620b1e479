use crate::app::{AppContext, SelectedApp};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::KeyEvent;

pub mod home;
pub mod hospital;
pub mod login;
pub mod register;
pub mod widgets;

/// A full-screen page.
///
/// Pages never own application data; they receive the [`AppContext`] on
/// every call and ask it to perform operations.
pub trait Component {
    /// Handles a key press. Returns the page to switch to, if any.
    fn handle_input(
        &mut self,
        event: KeyEvent,
        ctx: &mut AppContext,
    ) -> Result<Option<SelectedApp>>;

    fn render(&self, frame: &mut Frame, ctx: &AppContext);

    /// Called on every idle tick (expires flash messages).
    fn tick(&mut self) {}
}
