//! Kanban board logic: ordering, display projection and drag handling.

pub mod drag;
pub mod order;
pub mod projection;
