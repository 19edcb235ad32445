//! Screen-level state: the editor, its capture worker and the shared history.

pub(crate) mod capture;
pub(crate) mod editor;
pub(crate) mod history;
