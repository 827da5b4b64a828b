#![forbid(unsafe_code)]

//! Runtime: two-tier event dispatch, focus traversal, and keybindings.
//!
//! Sits between `weft-core` (which decodes bytes into events) and the
//! application: [`dispatch::EventBus`] routes decoded events through
//! global and scoped listener tiers, [`focus`] walks the host's renderable
//! tree, and [`bindings`] resolves pressed keys against canonical
//! keybinding maps.

pub mod bindings;
pub mod dispatch;
pub mod focus;
