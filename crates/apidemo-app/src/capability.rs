//! Named input capabilities backed by plain closures
//!
//! Controls turn user input into [`Message`]s. They hold no state of their own
//! and never touch the host state directly, so they can live on the input
//! thread.

use crate::message::Message;

/// Something that produces a message when clicked
pub trait Clickable {
    fn label(&self) -> &str;
    fn click(&self) -> Message;
}

/// Something that produces a message when one of its items is selected
pub trait Selectable {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `None` when `index` is out of range
    fn select(&self, index: usize) -> Option<Message>;
}

type ClickHandler = Box<dyn Fn() -> Message + Send + Sync>;

pub struct Button {
    label: String,
    on_click: ClickHandler,
}

impl Button {
    pub fn new(label: impl Into<String>, on_click: impl Fn() -> Message + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            on_click: Box::new(on_click),
        }
    }
}

impl std::fmt::Debug for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Button").field("label", &self.label).finish()
    }
}

impl Clickable for Button {
    fn label(&self) -> &str {
        &self.label
    }

    fn click(&self) -> Message {
        (self.on_click)()
    }
}

type SelectHandler<T> = Box<dyn Fn(&T) -> Message + Send + Sync>;

pub struct Spinner<T> {
    items: Vec<T>,
    on_select: SelectHandler<T>,
}

impl<T> Spinner<T> {
    pub fn new(items: Vec<T>, on_select: impl Fn(&T) -> Message + Send + Sync + 'static) -> Self {
        Self {
            items,
            on_select: Box::new(on_select),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Spinner<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spinner").field("items", &self.items).finish()
    }
}

impl<T> Selectable for Spinner<T> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn select(&self, index: usize) -> Option<Message> {
        self.items.get(index).map(|item| (self.on_select)(item))
    }
}

/// The demo's control surface
#[derive(Debug)]
pub struct Controls {
    pub restart: Button,
    pub rotate: Button,
    pub finish: Button,
    pub notify_start: Button,
    pub notify_stop: Button,
    pub status: Button,
    pub limit: Spinner<u32>,
}

impl Controls {
    pub fn new(limit_choices: Vec<u32>) -> Self {
        Self {
            restart: Button::new("Restart", || Message::Restart),
            rotate: Button::new("Rotate", || Message::ConfigurationChange),
            finish: Button::new("Finish", || Message::Finish),
            notify_start: Button::new("Start notifying", || Message::StartNotifying),
            notify_stop: Button::new("Stop notifying", || Message::StopNotifying),
            status: Button::new("Status", || Message::Status),
            limit: Spinner::new(limit_choices, |limit| Message::SetLimit(*limit)),
        }
    }
}
