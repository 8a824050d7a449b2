use crate::api::TaskApi;
use crate::models::Task;
use crate::state::{Action, Effect, FormField, TextEdit, ViewState};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

pub struct App {
    pub state: ViewState,
    pub list_state: ListState,
    pub focus: Focus,
    api: Arc<dyn TaskApi>,
    tx: UnboundedSender<Action>,
    rx: UnboundedReceiver<Action>,
    in_flight: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Focus {
    List,
    Create(ActiveInput),
    Edit(ActiveInput),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActiveInput {
    Title,
    Description,
}

impl ActiveInput {
    fn other(self) -> Self {
        match self {
            ActiveInput::Title => ActiveInput::Description,
            ActiveInput::Description => ActiveInput::Title,
        }
    }
}

// Runs one request and turns its outcome into the matching completion.
async fn run_effect(api: &dyn TaskApi, effect: Effect) -> Action {
    match effect {
        Effect::Fetch { token } => Action::Loaded {
            token,
            result: api.list_tasks().await,
        },
        Effect::Create(task) => Action::Created(api.create_task(&task).await),
        Effect::Toggle { id, patch } => Action::Toggled(api.update_task(id, &patch).await),
        Effect::Save { id, patch } => Action::Saved {
            id,
            result: api.update_task(id, &patch).await,
        },
        Effect::Delete { id } => Action::Deleted(api.delete_task(id).await),
    }
}

impl App {
    pub fn new(api: Arc<dyn TaskApi>) -> App {
        let (tx, rx) = mpsc::unbounded_channel();
        App {
            state: ViewState::new(),
            list_state: ListState::default(),
            focus: Focus::List,
            api,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        for effect in self.state.update(action) {
            self.spawn(effect);
        }
        self.sync_selection();
        if matches!(self.focus, Focus::Edit(_)) && self.state.editing_id.is_none() {
            self.focus = Focus::List;
        }
    }

    // Requests run concurrently; their completions come back through the channel.
    fn spawn(&mut self, effect: Effect) {
        debug!(?effect, "issuing request");
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let action = run_effect(api.as_ref(), effect).await;
            let _ = tx.send(action);
        });
    }

    /// Applies every completion that has arrived so far without waiting.
    pub fn drain_completions(&mut self) {
        while let Ok(action) = self.rx.try_recv() {
            self.in_flight -= 1;
            self.dispatch(action);
        }
    }

    #[cfg(test)]
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(action) => {
                    self.in_flight -= 1;
                    self.dispatch(action);
                }
                None => break,
            }
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.list_state
            .selected()
            .and_then(|i| self.state.tasks.get(i))
    }

    fn sync_selection(&mut self) {
        let len = self.state.tasks.len();
        if len == 0 {
            self.list_state.select(None);
        } else {
            let i = self.list_state.selected().unwrap_or(0).min(len - 1);
            self.list_state.select(Some(i));
        }
    }

    pub fn next(&mut self) {
        let len = self.state.tasks.len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.state.tasks.len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    /// Returns true when the user asked to quit.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        if self.state.notice.is_some() {
            self.dispatch(Action::DismissNotice);
            return false;
        }
        if self.state.pending_delete.is_some() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.dispatch(Action::ConfirmDelete),
                _ => self.dispatch(Action::CancelDelete),
            }
            return false;
        }

        match self.focus {
            Focus::List => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('j') | KeyCode::Down => self.next(),
                KeyCode::Char('k') | KeyCode::Up => self.previous(),
                KeyCode::Char('r') => self.dispatch(Action::Reload),
                KeyCode::Char('a') => self.focus = Focus::Create(ActiveInput::Title),
                KeyCode::Char('e') | KeyCode::Enter => {
                    if let Some(task) = self.selected_task().cloned() {
                        self.dispatch(Action::BeginEdit(task));
                        self.focus = Focus::Edit(ActiveInput::Title);
                    }
                }
                KeyCode::Char(' ') | KeyCode::Char('x') => {
                    if let Some(task) = self.selected_task().cloned() {
                        self.dispatch(Action::ToggleComplete(task));
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(id) = self.selected_task().map(|task| task.id) {
                        self.dispatch(Action::RequestDelete(id));
                    }
                }
                _ => {}
            },
            Focus::Create(active) => match key.code {
                KeyCode::Esc => self.focus = Focus::List,
                KeyCode::Tab => self.focus = Focus::Create(active.other()),
                KeyCode::Enter => self.dispatch(Action::SubmitCreate),
                code => {
                    let field = match active {
                        ActiveInput::Title => FormField::CreateTitle,
                        ActiveInput::Description => FormField::CreateDescription,
                    };
                    self.type_key(field, code, key.modifiers);
                }
            },
            Focus::Edit(active) => match key.code {
                KeyCode::Esc => {
                    self.dispatch(Action::CancelEdit);
                    self.focus = Focus::List;
                }
                KeyCode::Tab => self.focus = Focus::Edit(active.other()),
                KeyCode::Enter => self.dispatch(Action::SaveEdit),
                code => {
                    let field = match active {
                        ActiveInput::Title => FormField::EditTitle,
                        ActiveInput::Description => FormField::EditDescription,
                    };
                    self.type_key(field, code, key.modifiers);
                }
            },
        }
        false
    }

    // Control and Alt chords are not text.
    fn type_key(&mut self, field: FormField, code: KeyCode, modifiers: KeyModifiers) {
        if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return;
        }
        match code {
            KeyCode::Char(c) => self.dispatch(Action::Input(field, TextEdit::Push(c))),
            KeyCode::Backspace => self.dispatch(Action::Input(field, TextEdit::Pop)),
            _ => {}
        }
    }
}
