use crate::discovery::ModelGroup;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{DefaultTerminal, Frame};
use std::path::PathBuf;

/// Interactive picker over the model groups of a directory.
pub struct App {
    pub directory: PathBuf,
    pub groups: Vec<ModelGroup>,
    pub selected: usize,
    pub chosen: Option<usize>,
    /// Shown in the footer until the next key press.
    pub message: Option<String>,
    pub should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new(directory: PathBuf, groups: Vec<ModelGroup>) -> Self {
        // Start on the first group that can be checked
        let selected = groups.iter().position(ModelGroup::is_checkable).unwrap_or(0);
        Self {
            directory,
            groups,
            selected,
            chosen: None,
            message: None,
            should_quit: false,
        }
    }

    /// Runs until a group is chosen or the user quits.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<Option<ModelGroup>> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            self.handle_events()?;
        }
        Ok(self.into_choice())
    }

    fn draw(&self, frame: &mut Frame) {
        super::dashboard::draw_picker(frame, self);
    }

    fn handle_events(&mut self) -> Result<()> {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                return Ok(());
            }
            self.handle_key(key.code);
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        self.message = None;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => self.selected = self.groups.len().saturating_sub(1),
            KeyCode::Enter => self.choose(),
            _ => {}
        }
    }

    fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn next(&mut self) {
        if self.selected < self.groups.len().saturating_sub(1) {
            self.selected += 1;
        }
    }

    fn choose(&mut self) {
        match self.selected_group() {
            Some(group) if group.is_checkable() => {
                self.chosen = Some(self.selected);
                self.should_quit = true;
            }
            Some(group) => {
                self.message = Some(format!("'{}' has no -STR model", group.prefix));
            }
            None => {}
        }
    }

    #[must_use]
    pub fn selected_group(&self) -> Option<&ModelGroup> {
        self.groups.get(self.selected)
    }

    #[must_use]
    pub fn into_choice(self) -> Option<ModelGroup> {
        let index = self.chosen?;
        self.groups.into_iter().nth(index)
    }
}
