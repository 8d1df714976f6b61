//! UI state shared by the web page and the terminal chat

pub mod controller;

pub use controller::{ChatController, ChatEntry, EntryRole, LayoutState, Snapshot};
