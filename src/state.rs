//! View state of the task list and the reducer that drives it.
//!
//! Every user intent and every request completion is an [`Action`]. Feeding an
//! action to [`ViewState::update`] mutates the state and returns the requests
//! ([`Effect`]s) the runner must issue. Nothing in here touches the network.

use crate::api::ApiError;
use crate::models::{NewTask, Task, TaskPatch};
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    CreateTitle,
    CreateDescription,
    EditTitle,
    EditDescription,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextEdit {
    Push(char),
    Pop,
}

#[derive(Debug)]
pub enum Action {
    Mount,
    Reload,
    Input(FormField, TextEdit),
    SubmitCreate,
    RequestDelete(u64),
    ConfirmDelete,
    CancelDelete,
    ToggleComplete(Task),
    BeginEdit(Task),
    SaveEdit,
    CancelEdit,
    DismissNotice,
    Loaded {
        token: u64,
        result: Result<Vec<Task>, ApiError>,
    },
    Created(Result<(), ApiError>),
    Deleted(Result<(), ApiError>),
    Toggled(Result<(), ApiError>),
    Saved {
        id: u64,
        result: Result<(), ApiError>,
    },
}

/// A request the runner has to send. Each one answers with exactly one completion action.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Fetch { token: u64 },
    Create(NewTask),
    Toggle { id: u64, patch: TaskPatch },
    Save { id: u64, patch: TaskPatch },
    Delete { id: u64 },
}

#[derive(Debug, Default)]
pub struct ViewState {
    pub tasks: Vec<Task>,
    pub loading: bool,
    pub draft_title: String,
    pub draft_description: String,
    pub editing_id: Option<u64>,
    pub edit_draft_title: String,
    pub edit_draft_description: String,
    pub pending_delete: Option<u64>,
    pub notice: Option<String>,
    last_token: u64,
    applied_token: u64,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Mount => {
                self.loading = true;
                vec![self.load_all()]
            }
            Action::Reload => vec![self.load_all()],
            Action::Input(field, edit) => {
                let text = match field {
                    FormField::CreateTitle => &mut self.draft_title,
                    FormField::CreateDescription => &mut self.draft_description,
                    FormField::EditTitle => &mut self.edit_draft_title,
                    FormField::EditDescription => &mut self.edit_draft_description,
                };
                match edit {
                    TextEdit::Push(c) => text.push(c),
                    TextEdit::Pop => {
                        text.pop();
                    }
                }
                vec![]
            }
            Action::SubmitCreate => {
                if self.draft_title.trim().is_empty() {
                    self.notice = Some("Title required".to_string());
                    return vec![];
                }
                vec![Effect::Create(NewTask {
                    title: self.draft_title.clone(),
                    description: self.draft_description.clone(),
                })]
            }
            Action::Created(Ok(())) => {
                self.draft_title.clear();
                self.draft_description.clear();
                vec![self.load_all()]
            }
            Action::Created(Err(err)) => {
                self.notice = Some(format!("Error: {}", err));
                vec![]
            }
            Action::RequestDelete(id) => {
                self.pending_delete = Some(id);
                vec![]
            }
            Action::ConfirmDelete => match self.pending_delete.take() {
                Some(id) => vec![Effect::Delete { id }],
                None => vec![],
            },
            Action::CancelDelete => {
                self.pending_delete = None;
                vec![]
            }
            Action::Deleted(Ok(())) => vec![self.load_all()],
            Action::Deleted(Err(err)) => {
                warn!(%err, "delete failed");
                self.notice = Some("Delete failed".to_string());
                vec![]
            }
            Action::ToggleComplete(task) => vec![Effect::Toggle {
                id: task.id,
                patch: TaskPatch::completed(!task.completed),
            }],
            Action::Toggled(result) => {
                if let Err(err) = result {
                    warn!(%err, "toggle failed");
                    self.notice = Some("Could not update task".to_string());
                }
                vec![self.load_all()]
            }
            Action::BeginEdit(task) => {
                self.editing_id = Some(task.id);
                self.edit_draft_title = task.title;
                self.edit_draft_description = task.description.unwrap_or_default();
                vec![]
            }
            Action::SaveEdit => match self.editing_id {
                Some(id) => vec![Effect::Save {
                    id,
                    patch: TaskPatch::text(&self.edit_draft_title, &self.edit_draft_description),
                }],
                None => vec![],
            },
            Action::Saved { id, result: Ok(()) } => {
                // A newer edit may have started while the save was in flight.
                if self.editing_id == Some(id) {
                    self.editing_id = None;
                }
                vec![self.load_all()]
            }
            Action::Saved { id, result: Err(err) } => {
                warn!(id, %err, "save failed");
                self.notice = Some("Update failed".to_string());
                vec![]
            }
            Action::CancelEdit => {
                self.editing_id = None;
                self.edit_draft_title.clear();
                self.edit_draft_description.clear();
                vec![]
            }
            Action::DismissNotice => {
                self.notice = None;
                vec![]
            }
            Action::Loaded { token, result } => {
                match result {
                    Ok(tasks) if token > self.applied_token => {
                        self.applied_token = token;
                        self.tasks = tasks;
                        self.loading = false;
                    }
                    Ok(_) => {
                        debug!(token, applied = self.applied_token, "discarding stale task list");
                    }
                    Err(err) => {
                        warn!(token, %err, "loading tasks failed");
                        self.notice = Some(format!("Could not load tasks: {}", err));
                    }
                }
                vec![]
            }
        }
    }

    pub fn is_editing(&self, id: u64) -> bool {
        self.editing_id == Some(id)
    }

    fn load_all(&mut self) -> Effect {
        self.last_token += 1;
        Effect::Fetch {
            token: self.last_token,
        }
    }
}
