use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::cli::i18n::{texts, Catalog};
use crate::device_settings::{Activation, InfoResponse, SettingsView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub remaining_ticks: u16,
}

impl Toast {
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            remaining_ticks: 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Help,
}

impl Overlay {
    pub fn is_active(&self) -> bool {
        !matches!(self, Overlay::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Activate(usize),
    Quit,
}

pub const CONTROL_COUNT: usize = 5;

#[derive(Debug)]
pub struct App {
    pub view: SettingsView,
    pub catalog: &'static Catalog,
    pub focus: usize,
    pub overlay: Overlay,
    pub toast: Option<Toast>,
    pub should_quit: bool,
}

impl App {
    pub fn new(view: SettingsView, catalog: &'static Catalog) -> Self {
        Self {
            view,
            catalog,
            focus: 0,
            overlay: Overlay::None,
            toast: None,
            should_quit: false,
        }
    }

    pub fn on_tick(&mut self) {
        if let Some(toast) = &mut self.toast {
            if toast.remaining_ticks > 0 {
                toast.remaining_ticks -= 1;
            }
            if toast.remaining_ticks == 0 {
                self.toast = None;
            }
        }
    }

    pub fn push_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toast = Some(Toast::new(message, kind));
    }

    pub fn on_info_response(&mut self, response: InfoResponse) {
        let failed = response.result.is_err();
        if self.view.apply(response) && failed {
            self.push_toast(texts::device_info_failed(self.catalog), ToastKind::Warning);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
            self.should_quit = true;
            return Action::Quit;
        }

        if self.overlay.is_active() {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Enter
            ) {
                self.overlay = Overlay::None;
            }
            return Action::None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                Action::Quit
            }
            KeyCode::Char('?') => {
                self.overlay = Overlay::Help;
                Action::None
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => {
                self.focus = (self.focus + CONTROL_COUNT - 1) % CONTROL_COUNT;
                Action::None
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                self.focus = (self.focus + 1) % CONTROL_COUNT;
                Action::None
            }
            KeyCode::Home => {
                self.focus = 0;
                Action::None
            }
            KeyCode::End => {
                self.focus = CONTROL_COUNT - 1;
                Action::None
            }
            KeyCode::Enter | KeyCode::Char(' ') => Action::Activate(self.focus),
            _ => Action::None,
        }
    }

    pub fn activate(&mut self, index: usize) {
        let layout = self.view.layout(self.catalog);
        let Some(control) = layout.controls.get(index) else {
            return;
        };
        let label = control.label(self.catalog);

        match control.activate() {
            Activation::Blocked => {
                self.push_toast(
                    texts::control_disabled(self.catalog, &label),
                    ToastKind::Warning,
                );
            }
            Activation::Navigate(target) => {
                log::info!("navigate to {target}");
                self.push_toast(
                    texts::control_opens(self.catalog, &label, &target),
                    ToastKind::Info,
                );
            }
            Activation::Delegated { device_id } => {
                self.push_toast(
                    texts::control_delegated(self.catalog, &label, &device_id),
                    ToastKind::Info,
                );
            }
        }
    }
}
