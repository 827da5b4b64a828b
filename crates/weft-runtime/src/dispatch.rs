#![forbid(unsafe_code)]

//! Two-tier event dispatch with DOM-style cancellation.
//!
//! Every event name (`keypress`, `keyrepeat`, `keyrelease`, `paste`) has two
//! ordered listener tiers:
//!
//! - the **global** tier runs first, in registration order — application-wide
//!   handlers that observe and may block keystrokes before widgets see them;
//! - the **scoped** tier runs second — handlers registered on behalf of
//!   focusable elements.
//!
//! A listener may call [`KeyEvent::prevent_default`] to keep the scoped tier
//! from running, or [`KeyEvent::stop_propagation`] to stop all further
//! delivery. Both flags are monotonic: once set they stay set for the
//! event's lifetime.
//!
//! # Design
//!
//! Dispatch iterates a snapshot of both tiers taken when `emit` is called,
//! so a listener that adds or removes listeners affects subsequent events
//! only. Registries live behind `RefCell` and the bus API takes `&self`,
//! which lets a listener hold an `Rc<EventBus>` and mutate registrations
//! mid-dispatch without aliasing issues.
//!
//! A panicking listener is caught, logged, and skipped; dispatch continues
//! with the next listener and the event flags are left untouched.
//!
//! # Example
//!
//! ```
//! use weft_core::event::ParsedKey;
//! use weft_runtime::dispatch::EventBus;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let bus = EventBus::new();
//! let seen = Rc::new(Cell::new(false));
//!
//! let seen2 = seen.clone();
//! bus.add_global_key_listener(move |event| {
//!     if event.key().is_named("escape") {
//!         event.stop_propagation();
//!     }
//!     seen2.set(true);
//! });
//!
//! assert!(bus.emit_key(ParsedKey::named("escape")));
//! assert!(seen.get());
//! ```

use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use weft_core::event::{KeyEventKind, ParsedKey};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Monotonic cancellation flags shared by the event wrappers.
#[derive(Debug, Default)]
struct EventFlags {
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

/// A key event travelling through the dispatch pipeline.
#[derive(Debug)]
pub struct KeyEvent {
    key: ParsedKey,
    flags: EventFlags,
}

impl KeyEvent {
    /// Wrap a decoded key for dispatch.
    #[must_use]
    pub fn new(key: ParsedKey) -> Self {
        Self {
            key,
            flags: EventFlags::default(),
        }
    }

    /// The decoded key.
    #[must_use]
    pub fn key(&self) -> &ParsedKey {
        &self.key
    }

    /// Keep the scoped tier from running. Irreversible for this event.
    pub fn prevent_default(&self) {
        self.flags.default_prevented.set(true);
    }

    /// Whether any listener prevented the default.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.flags.default_prevented.get()
    }

    /// Stop delivery to all subsequent listeners. Irreversible for this
    /// event.
    pub fn stop_propagation(&self) {
        self.flags.propagation_stopped.set(true);
    }

    /// Whether propagation has been stopped.
    #[must_use]
    pub fn propagation_stopped(&self) -> bool {
        self.flags.propagation_stopped.get()
    }
}

/// A paste payload travelling through the dispatch pipeline.
#[derive(Debug)]
pub struct PasteEvent {
    text: String,
    flags: EventFlags,
}

impl PasteEvent {
    /// Wrap pasted text for dispatch. Callers normally go through
    /// [`EventBus::process_paste`], which strips ANSI sequences first.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            flags: EventFlags::default(),
        }
    }

    /// The pasted text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Keep the scoped tier from running.
    pub fn prevent_default(&self) {
        self.flags.default_prevented.set(true);
    }

    /// Whether any listener prevented the default.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.flags.default_prevented.get()
    }

    /// Stop delivery to all subsequent listeners.
    pub fn stop_propagation(&self) {
        self.flags.propagation_stopped.set(true);
    }

    /// Whether propagation has been stopped.
    #[must_use]
    pub fn propagation_stopped(&self) -> bool {
        self.flags.propagation_stopped.get()
    }
}

/// Internal: read access to the cancellation flags.
trait Cancellable {
    fn flags(&self) -> &EventFlags;
}

impl Cancellable for KeyEvent {
    fn flags(&self) -> &EventFlags {
        &self.flags
    }
}

impl Cancellable for PasteEvent {
    fn flags(&self) -> &EventFlags {
        &self.flags
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Handle for removing a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Registry<E> {
    global: Vec<(ListenerId, Callback<E>)>,
    scoped: Vec<(ListenerId, Callback<E>)>,
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            global: Vec::new(),
            scoped: Vec::new(),
        }
    }
}

impl<E> Registry<E> {
    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.global.len() + self.scoped.len();
        self.global.retain(|(lid, _)| *lid != id);
        self.scoped.retain(|(lid, _)| *lid != id);
        before != self.global.len() + self.scoped.len()
    }
}

/// Deliver one event through a snapshot of both tiers.
///
/// Returns true iff at least one listener existed at snapshot time.
fn dispatch<E: Cancellable>(registry: &RefCell<Registry<E>>, event: &E) -> bool {
    let (global, scoped): (Vec<Callback<E>>, Vec<Callback<E>>) = {
        let reg = registry.borrow();
        (
            reg.global.iter().map(|(_, cb)| cb.clone()).collect(),
            reg.scoped.iter().map(|(_, cb)| cb.clone()).collect(),
        )
    };
    let had_listeners = !global.is_empty() || !scoped.is_empty();

    for callback in &global {
        if event.flags().propagation_stopped.get() {
            break;
        }
        invoke(callback, event);
    }

    if !event.flags().default_prevented.get() && !event.flags().propagation_stopped.get() {
        for callback in &scoped {
            if event.flags().propagation_stopped.get() {
                break;
            }
            invoke(callback, event);
        }
    }

    had_listeners
}

fn invoke<E>(callback: &Callback<E>, event: &E) {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        (&mut *callback.borrow_mut())(event);
    }));
    if outcome.is_err() {
        tracing::error!("input listener panicked, continuing dispatch");
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Two-tier listener registry for key and paste events.
#[derive(Default)]
pub struct EventBus {
    next_id: Cell<u64>,
    press: RefCell<Registry<KeyEvent>>,
    repeat: RefCell<Registry<KeyEvent>>,
    release: RefCell<Registry<KeyEvent>>,
    paste: RefCell<Registry<PasteEvent>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        ListenerId(id)
    }

    fn key_registry(&self, kind: KeyEventKind) -> &RefCell<Registry<KeyEvent>> {
        match kind {
            KeyEventKind::Press => &self.press,
            KeyEventKind::Repeat => &self.repeat,
            KeyEventKind::Release => &self.release,
        }
    }

    /// Register a global-tier listener for press events.
    pub fn add_global_key_listener(&self, f: impl FnMut(&KeyEvent) + 'static) -> ListenerId {
        self.add_global_key_listener_for(KeyEventKind::Press, f)
    }

    /// Register a global-tier listener for the given key event name.
    pub fn add_global_key_listener_for(
        &self,
        kind: KeyEventKind,
        f: impl FnMut(&KeyEvent) + 'static,
    ) -> ListenerId {
        let id = self.next_id();
        self.key_registry(kind)
            .borrow_mut()
            .global
            .push((id, Rc::new(RefCell::new(f))));
        id
    }

    /// Register a scoped-tier listener for press events.
    pub fn add_scoped_key_listener(&self, f: impl FnMut(&KeyEvent) + 'static) -> ListenerId {
        self.add_scoped_key_listener_for(KeyEventKind::Press, f)
    }

    /// Register a scoped-tier listener for the given key event name.
    pub fn add_scoped_key_listener_for(
        &self,
        kind: KeyEventKind,
        f: impl FnMut(&KeyEvent) + 'static,
    ) -> ListenerId {
        let id = self.next_id();
        self.key_registry(kind)
            .borrow_mut()
            .scoped
            .push((id, Rc::new(RefCell::new(f))));
        id
    }

    /// Remove a key listener from either tier of the given event name.
    pub fn remove_key_listener(&self, kind: KeyEventKind, id: ListenerId) -> bool {
        self.key_registry(kind).borrow_mut().remove(id)
    }

    /// Register a global-tier paste listener.
    pub fn add_global_paste_listener(&self, f: impl FnMut(&PasteEvent) + 'static) -> ListenerId {
        let id = self.next_id();
        self.paste
            .borrow_mut()
            .global
            .push((id, Rc::new(RefCell::new(f))));
        id
    }

    /// Register a scoped-tier paste listener.
    pub fn add_scoped_paste_listener(&self, f: impl FnMut(&PasteEvent) + 'static) -> ListenerId {
        let id = self.next_id();
        self.paste
            .borrow_mut()
            .scoped
            .push((id, Rc::new(RefCell::new(f))));
        id
    }

    /// Remove a paste listener from either tier.
    pub fn remove_paste_listener(&self, id: ListenerId) -> bool {
        self.paste.borrow_mut().remove(id)
    }

    /// Wrap a decoded key and dispatch it to the registry matching its
    /// event kind. Returns true iff any listener existed.
    pub fn emit_key(&self, key: ParsedKey) -> bool {
        let kind = key.kind;
        let event = KeyEvent::new(key);
        dispatch(self.key_registry(kind), &event)
    }

    /// Dispatch an already-wrapped key event.
    pub fn emit_key_event(&self, event: &KeyEvent) -> bool {
        dispatch(self.key_registry(event.key().kind), event)
    }

    /// Strip ANSI sequences from `text`, wrap it, and dispatch it to the
    /// paste registry. Returns true iff any listener existed.
    pub fn process_paste(&self, text: &str) -> bool {
        let event = PasteEvent::new(strip_ansi(text));
        self.emit_paste(&event)
    }

    /// Dispatch an already-wrapped paste event.
    pub fn emit_paste(&self, event: &PasteEvent) -> bool {
        dispatch(&self.paste, event)
    }

    /// Drop every listener in both tiers of every registry.
    pub fn clear(&self) {
        for registry in [&self.press, &self.repeat, &self.release] {
            let mut reg = registry.borrow_mut();
            reg.global.clear();
            reg.scoped.clear();
        }
        let mut paste = self.paste.borrow_mut();
        paste.global.clear();
        paste.scoped.clear();
    }
}

// ---------------------------------------------------------------------------
// ANSI stripping
// ---------------------------------------------------------------------------

/// Remove ANSI escape sequences (CSI, OSC, SS3, and `ESC <char>` prefixes)
/// from pasted text.
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\u{1B}' {
            out.push(c);
            continue;
        }
        match chars.next() {
            // CSI: skip through the final byte.
            Some('[') => {
                for follow in chars.by_ref() {
                    if ('\u{40}'..='\u{7E}').contains(&follow) {
                        break;
                    }
                }
            }
            // OSC: skip until BEL or ST.
            Some(']') => {
                while let Some(follow) = chars.next() {
                    if follow == '\u{07}' {
                        break;
                    }
                    if follow == '\u{1B}' {
                        if chars.peek() == Some(&'\\') {
                            chars.next();
                        }
                        break;
                    }
                }
            }
            // SS3: one more byte.
            Some('O') => {
                chars.next();
            }
            // Meta prefix or trailing ESC: the follow byte is consumed.
            Some(_) | None => {}
        }
    }
    out
}
