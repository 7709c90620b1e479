//! The main application state and logic for CareDesk.
//!
//! This module owns the [`AppContext`] (storage plus the two state holders)
//! and the screen that is currently shown. Screens ask for navigation by
//! returning a [`SelectedApp`]; the [`App`] checks the current user's role
//! before switching.

use crate::auth::AuthState;
use crate::components::home::Home;
use crate::components::hospital::accounts::CreateAccount;
use crate::components::hospital::patients::{form::PatientForm, list::ListPatients};
use crate::components::hospital::staff::{form::StaffForm, list::ListStaff};
use crate::components::login::Login;
use crate::components::register::Register;
use crate::components::Component;
use crate::data::DataState;
use crate::db::Storage;
use crate::models::UserRole;
use crate::tui::{self, Frame, Tui};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};

/// Application state shared by every screen.
///
/// Storage is owned here and lent to the state holders on each call.
pub struct AppContext {
    pub storage: Storage,
    pub auth: AuthState,
    pub data: DataState,
}

impl AppContext {
    /// Loads both state holders, seeding demo data into an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if seeding fails.
    pub fn load(storage: Storage, bcrypt_cost: u32) -> Result<Self> {
        let auth = AuthState::load(&storage, bcrypt_cost)?;
        let data = DataState::load(&storage)?;
        Ok(Self {
            storage,
            auth,
            data,
        })
    }

    /// Role of the logged-in user.
    pub fn role(&self) -> Option<UserRole> {
        self.auth.user().map(|u| u.role)
    }
}

/// Navigation targets requested by the screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedApp {
    Login,
    Register,
    Home,
    PatientList,
    PatientAdd,
    PatientEdit(String),
    StaffList,
    StaffAdd,
    StaffEdit(String),
    CreateAccount,
    Logout,
    Quit,
}

impl SelectedApp {
    /// Whether a user with `role` (or nobody) may open this page.
    pub fn allowed_for(&self, role: Option<UserRole>) -> bool {
        match self {
            SelectedApp::Login | SelectedApp::Register | SelectedApp::Quit => true,
            SelectedApp::Home | SelectedApp::PatientList | SelectedApp::Logout => role.is_some(),
            SelectedApp::PatientAdd => role.is_some_and(UserRole::can_manage_patients),
            SelectedApp::PatientEdit(_) => role.is_some_and(UserRole::can_edit_patients),
            SelectedApp::StaffList
            | SelectedApp::StaffAdd
            | SelectedApp::StaffEdit(_)
            | SelectedApp::CreateAccount => role.is_some_and(UserRole::can_manage_staff),
        }
    }
}

/// The screen currently on display.
enum Screen {
    Login(Login),
    Register(Register),
    Home(Home),
    Patients(ListPatients),
    PatientForm(PatientForm),
    Staff(ListStaff),
    StaffForm(StaffForm),
    Accounts(CreateAccount),
}

impl Screen {
    fn component(&mut self) -> &mut dyn Component {
        match self {
            Screen::Login(c) => c,
            Screen::Register(c) => c,
            Screen::Home(c) => c,
            Screen::Patients(c) => c,
            Screen::PatientForm(c) => c,
            Screen::Staff(c) => c,
            Screen::StaffForm(c) => c,
            Screen::Accounts(c) => c,
        }
    }

    fn render(&self, frame: &mut Frame, ctx: &AppContext) {
        match self {
            Screen::Login(c) => c.render(frame, ctx),
            Screen::Register(c) => c.render(frame, ctx),
            Screen::Home(c) => c.render(frame, ctx),
            Screen::Patients(c) => c.render(frame, ctx),
            Screen::PatientForm(c) => c.render(frame, ctx),
            Screen::Staff(c) => c.render(frame, ctx),
            Screen::StaffForm(c) => c.render(frame, ctx),
            Screen::Accounts(c) => c.render(frame, ctx),
        }
    }
}

/// Main application struct for CareDesk.
pub struct App {
    pub ctx: AppContext,
    screen: Screen,
    pub should_quit: bool,
}

impl App {
    /// Creates the application, resuming a stored session if there is one.
    pub fn new(ctx: AppContext) -> Self {
        let screen = if ctx.auth.is_authenticated() {
            Screen::Home(Home::new())
        } else {
            Screen::Login(Login::new())
        };
        Self {
            ctx,
            screen,
            should_quit: false,
        }
    }

    /// Runs the main loop until the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing or reading terminal events fails.
    pub fn run(&mut self, tui: &mut Tui) -> Result<()> {
        while !self.should_quit {
            tui.draw(|frame| self.screen.render(frame, &self.ctx))?;
            match tui.next_event()? {
                tui::Event::Key(key) => self.handle_key(key)?,
                tui::Event::Resize => {}
                tui::Event::Tick => self.screen.component().tick(),
            }
        }
        Ok(())
    }

    /// Routes a key press to the active screen and applies its navigation.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Global keybinding: Ctrl+Q to quit
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        if let Some(target) = self.screen.component().handle_input(key, &mut self.ctx)? {
            self.navigate(target);
        }
        Ok(())
    }

    /// Switches screens, falling back to a safe page when the role forbids the target.
    pub fn navigate(&mut self, target: SelectedApp) {
        let role = self.ctx.role();
        if !target.allowed_for(role) {
            warn!(?target, ?role, "navigation refused");
            self.screen = if role.is_some() {
                Screen::Home(Home::new())
            } else {
                Screen::Login(Login::new())
            };
            return;
        }

        debug!(?target, "navigate");
        self.screen = match target {
            SelectedApp::Quit => {
                self.should_quit = true;
                return;
            }
            SelectedApp::Logout => {
                self.ctx.auth.logout(&self.ctx.storage);
                Screen::Login(Login::new())
            }
            SelectedApp::Login => Screen::Login(Login::new()),
            SelectedApp::Register => Screen::Register(Register::new()),
            SelectedApp::Home => Screen::Home(Home::new()),
            SelectedApp::PatientList => Screen::Patients(ListPatients::new()),
            SelectedApp::PatientAdd => Screen::PatientForm(PatientForm::new()),
            SelectedApp::PatientEdit(id) => Screen::PatientForm(PatientForm::edit(&self.ctx, id)),
            SelectedApp::StaffList => Screen::Staff(ListStaff::new()),
            SelectedApp::StaffAdd => Screen::StaffForm(StaffForm::new()),
            SelectedApp::StaffEdit(id) => Screen::StaffForm(StaffForm::edit(&self.ctx, id)),
            SelectedApp::CreateAccount => Screen::Accounts(CreateAccount::new()),
        };
    }

    /// Name of the current screen, for tests and logs.
    pub fn screen_name(&self) -> &'static str {
        match self.screen {
            Screen::Login(_) => "login",
            Screen::Register(_) => "register",
            Screen::Home(_) => "home",
            Screen::Patients(_) => "patients",
            Screen::PatientForm(_) => "patient-form",
            Screen::Staff(_) => "staff",
            Screen::StaffForm(_) => "staff-form",
            Screen::Accounts(_) => "accounts",
        }
    }
}
