//! Typing-text effect as an explicit state machine.
//!
//! ```text
//!            type char (150ms)            delete char (75ms)
//!              ┌─────┐                      ┌─────┐
//!              ▼     │                      ▼     │
//!  PauseEmpty ──► Typing ──full──► PauseFull ──► Deleting ──empty──► PauseEmpty
//!   (800ms)                         (2500ms)                next role
//! ```
//!
//! [`Typewriter::step`] performs one transition and returns the text to show
//! plus how long to stay in the resulting state. The caller schedules the next
//! step after that delay, so the cycle is driven by whatever clock owns the
//! timer queue.
//!
//! Leaving a pause performs the first action of the next phase: the step out
//! of `PauseFull` already removes a character, and the step out of
//! `PauseEmpty` already types one.

use crate::config::TypingConfig;
use crate::timers::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Typing,
    PauseFull,
    Deleting,
    PauseEmpty,
}

/// What to render after a step and how long until the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub text: String,
    pub delay: Millis,
}

#[derive(Debug, Clone)]
pub struct Typewriter {
    roles: Vec<Vec<char>>,
    role: usize,
    shown: usize,
    phase: Phase,
    type_ms: Millis,
    delete_ms: Millis,
    pause_full_ms: Millis,
    pause_empty_ms: Millis,
}

impl Typewriter {
    /// Starts empty, about to type the first role. `config` is expected to be
    /// validated (non-empty roles).
    pub fn new(config: &TypingConfig) -> Self {
        Self {
            roles: config.roles.iter().map(|r| r.chars().collect()).collect(),
            role: 0,
            shown: 0,
            phase: Phase::Typing,
            type_ms: config.type_ms,
            delete_ms: config.delete_ms,
            pause_full_ms: config.pause_full_ms,
            pause_empty_ms: config.pause_empty_ms,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn role_index(&self) -> usize {
        self.role
    }

    pub fn text(&self) -> String {
        self.current().iter().take(self.shown).collect()
    }

    fn current(&self) -> &[char] {
        self.roles.get(self.role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn step(&mut self) -> Frame {
        match self.phase {
            Phase::Typing | Phase::PauseEmpty => self.type_char(),
            Phase::Deleting | Phase::PauseFull => self.delete_char(),
        }
    }

    fn type_char(&mut self) -> Frame {
        let len = self.current().len();
        self.shown = (self.shown + 1).min(len);
        let delay = if self.shown >= len {
            self.phase = Phase::PauseFull;
            self.pause_full_ms
        } else {
            self.phase = Phase::Typing;
            self.type_ms
        };
        Frame {
            text: self.text(),
            delay,
        }
    }

    fn delete_char(&mut self) -> Frame {
        self.shown = self.shown.saturating_sub(1);
        let text = self.text();
        let delay = if self.shown == 0 {
            self.role = (self.role + 1) % self.roles.len().max(1);
            self.phase = Phase::PauseEmpty;
            self.pause_empty_ms
        } else {
            self.phase = Phase::Deleting;
            self.delete_ms
        };
        Frame { text, delay }
    }
}
