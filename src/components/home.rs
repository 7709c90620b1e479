use crate::app::{AppContext, SelectedApp};
use crate::components::widgets::{
    self, ConfirmDialog, DialogOutcome, ACCENT, BORDER, DANGER, HIGHLIGHT, MUTED, PANEL, SUCCESS,
    TEXT,
};
use crate::components::Component;
use crate::models::UserRole;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, Padding, Paragraph},
};

/// Dashboard entries a role can open.
fn menu_for(role: Option<UserRole>) -> Vec<(&'static str, SelectedApp)> {
    let Some(role) = role else {
        return Vec::new();
    };

    let mut menu = vec![("List Patients", SelectedApp::PatientList)];
    if role.can_manage_patients() {
        menu.push(("Add Patient", SelectedApp::PatientAdd));
    }
    if role.can_manage_staff() {
        menu.push(("Staff Directory", SelectedApp::StaffList));
        menu.push(("Add Staff Member", SelectedApp::StaffAdd));
        menu.push(("Create Staff Account", SelectedApp::CreateAccount));
    }
    menu
}

/// The role-based dashboard shown after login.
pub struct Home {
    selected: usize,
    logout_dialog: ConfirmDialog,
}

impl Home {
    pub fn new() -> Self {
        Self {
            selected: 0,
            logout_dialog: ConfirmDialog::default(),
        }
    }
}

impl Default for Home {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Home {
    fn handle_input(
        &mut self,
        event: KeyEvent,
        ctx: &mut AppContext,
    ) -> Result<Option<SelectedApp>> {
        if self.logout_dialog.open {
            return Ok(match self.logout_dialog.handle_key(event.code) {
                DialogOutcome::Confirmed => Some(SelectedApp::Logout),
                _ => None,
            });
        }

        let menu = menu_for(ctx.role());
        if menu.is_empty() {
            return Ok(Some(SelectedApp::Login));
        }

        match event.code {
            KeyCode::Up => {
                self.selected = (self.selected + menu.len() - 1) % menu.len();
            }
            KeyCode::Down => {
                self.selected = (self.selected + 1) % menu.len();
            }
            KeyCode::Enter => {
                let (_, target) = &menu[self.selected.min(menu.len() - 1)];
                return Ok(Some(target.clone()));
            }
            KeyCode::Tab | KeyCode::Esc | KeyCode::Char('l') => self.logout_dialog.show(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, ctx: &AppContext) {
        widgets::render_background(frame);
        let area = frame.area();

        let main_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(10),
                Constraint::Length(1),
            ])
            .split(area);

        let (name, role) = ctx
            .auth
            .user()
            .map(|u| (u.name.as_str(), u.role))
            .unwrap_or(("User", UserRole::Staff));

        let welcome_text = vec![
            Line::from(vec![
                Span::styled(
                    "Welcome to CareDesk, ",
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    name,
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                format!("{} Dashboard", role.dashboard_title()),
                Style::default().fg(MUTED),
            )),
        ];
        let welcome_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER))
            .style(Style::default().bg(Color::Rgb(24, 24, 40)))
            .padding(Padding::new(0, 0, 1, 0));
        frame.render_widget(
            Paragraph::new(welcome_text)
                .alignment(Alignment::Center)
                .block(welcome_block),
            main_layout[0],
        );

        let content_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .margin(1)
            .split(main_layout[1]);

        let menu = menu_for(Some(role));
        let items: Vec<ListItem> = menu
            .iter()
            .enumerate()
            .map(|(idx, (label, _))| {
                if idx == self.selected {
                    ListItem::new(format!(" ► {label}"))
                        .style(Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD))
                } else {
                    ListItem::new(format!("   {label}")).style(Style::default().fg(TEXT))
                }
            })
            .collect();
        let menu_block = Block::default()
            .title(" Tasks ")
            .title_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(HIGHLIGHT))
            .style(Style::default().bg(PANEL))
            .padding(Padding::new(1, 1, 1, 0));
        frame.render_widget(List::new(items).block(menu_block), content_layout[0]);

        let stat = |label: &'static str, value: usize, color: Color| {
            Line::from(vec![
                Span::styled(format!("{label:<18}"), Style::default().fg(TEXT)),
                Span::styled(
                    value.to_string(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ])
        };
        let staff = ctx.data.staff_members();
        let mut overview = vec![
            stat("Patients", ctx.data.patients().len(), ACCENT),
            stat("Staff members", staff.len(), ACCENT),
            stat("Active staff", ctx.data.active_staff_count(), SUCCESS),
            stat(
                "Inactive staff",
                staff.len() - ctx.data.active_staff_count(),
                DANGER,
            ),
        ];
        if let Some(latest) = ctx.data.patients().iter().max_by_key(|p| p.updated_at) {
            overview.push(Line::from(""));
            overview.push(Line::from(Span::styled(
                "Last updated record",
                Style::default().fg(MUTED),
            )));
            overview.push(Line::from(Span::styled(
                format!("{} ({})", latest.full_name(), latest.diagnosis),
                Style::default().fg(TEXT),
            )));
        }
        let overview_block = Block::default()
            .title(" Overview ")
            .title_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER))
            .style(Style::default().bg(PANEL))
            .padding(Padding::new(2, 2, 1, 0));
        frame.render_widget(
            Paragraph::new(overview).block(overview_block),
            content_layout[1],
        );

        widgets::render_help(
            frame,
            main_layout[2],
            "↑↓: Navigate | Enter: Open | Tab/Esc: Logout | Ctrl+Q: Quit",
        );

        self.logout_dialog
            .render(frame, "Confirm Logout", "Are you sure you want to logout?");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{key, logged_in};
    use ratatui::backend::TestBackend;

    #[test]
    fn admin_menu_has_every_task() {
        let labels: Vec<&str> = menu_for(Some(UserRole::Admin))
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(
            labels,
            vec![
                "List Patients",
                "Add Patient",
                "Staff Directory",
                "Add Staff Member",
                "Create Staff Account"
            ]
        );
    }

    #[test]
    fn doctor_and_staff_only_see_patients() {
        assert_eq!(menu_for(Some(UserRole::Doctor)).len(), 1);
        assert_eq!(menu_for(Some(UserRole::Staff)).len(), 1);
        assert!(menu_for(None).is_empty());
    }

    #[test]
    fn enter_opens_selected_task() {
        let mut ctx = logged_in("admin@hospital.com", "admin123");
        let mut home = Home::new();
        home.handle_input(key(KeyCode::Down), &mut ctx).unwrap();
        let result = home.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(result, Some(SelectedApp::PatientAdd));
    }

    #[test]
    fn logout_requires_confirmation() {
        let mut ctx = logged_in("doctor@hospital.com", "doctor123");
        let mut home = Home::new();
        home.handle_input(key(KeyCode::Esc), &mut ctx).unwrap();
        assert!(home.logout_dialog.open);
        home.handle_input(key(KeyCode::Left), &mut ctx).unwrap();
        let result = home.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(result, Some(SelectedApp::Logout));
    }

    #[test]
    fn overview_shows_record_counts() {
        let ctx = logged_in("admin@hospital.com", "admin123");
        let home = Home::new();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| home.render(frame, &ctx)).unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("Staff members"));
        assert!(screen.contains("Active staff"));
        assert!(screen.contains("Inactive staff"));
        assert!(screen.contains("Admin User"));
    }
}
