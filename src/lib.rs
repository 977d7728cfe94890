//! # cv-page
//!
//! The interactive layer of a single-page CV: scroll-driven navigation
//! chrome, reveal-on-scroll, a typing headline, skill bars, a filterable
//! project grid, a certificate carousel and a validated contact form.
//!
//! The same controllers run in the browser (feature `web`, wasm32) and
//! headless against an in-memory copy of the page, where a scripted scenario
//! drives them on a virtual clock.
//!
//! # Architecture: Controllers Over a DOM Seam
//!
//! ```text
//!   native events ─┐                        ┌─ PageController ─┐
//!   scenario steps ├─► App::handle ─────────┼─ ProjectFilter ──┼─► dyn Dom
//!   clock ticks ───┘   App::advance_to ─────└─ Carousel ───────┘   (WebDom | MemoryDom)
//! ```
//!
//! Every read and write of the page goes through the [`dom::Dom`] trait.
//! Controllers never hold element references from the backend, only
//! [`dom::NodeId`] handles, and never sleep: each owns a
//! [`timers::Scheduler`] queue that [`app::App`] drains in due-time order.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`dom`] | The `Dom` trait, element handles, geometry, notifications |
//! | [`dom::selector`] | CSS selector matching over `MemoryDom` via the `selectors` crate |
//! | [`dom::memory`] | `MemoryDom`, the headless document parsed with `scraper` |
//! | [`timers`] | Virtual-time `Scheduler`, `Throttle` and `Debounce` |
//! | [`observe`] | Rect-based viewport intersection tracking |
//! | [`typing`] | The typing-effect state machine |
//! | [`contact`] | Contact-form validation and the local submission step |
//! | [`page`] | `PageController`: scroll, reveal, typing, resize, keys, load |
//! | [`filter`] | `ProjectFilter` and the seven project categories |
//! | [`carousel`] | Autoplay carousel with hover pause and swipe |
//! | [`app`] | `App`: owns the controllers and the clock, routes events |
//! | [`event`] | Input events and their outcome |
//! | [`scenario`] | Scripted sessions replayed against a `MemoryDom` |
//! | [`config`] | `cv-page.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing-subscriber` setup for the CLI |
//! | `web` | `WebDom` over `web-sys` and the wasm entry point |
//!
//! # Design Decisions
//!
//! ## Virtual Time
//!
//! Throttles, debounces, staggered reveals, the typing loop and carousel
//! autoplay are all timers. Keeping them in explicit queues rather than on
//! the browser's event loop makes every behavior steppable: tests advance
//! the clock to an exact millisecond and assert on the document. In the
//! browser a 16ms interval pumps the same queues from `performance.now()`.
//!
//! ## Soft Failure
//!
//! A page that lacks the markup for a feature simply does not get that
//! feature. Setup steps and event handlers report failures through
//! `tracing` and the rest of the page keeps working. The only hard failure
//! is an invalid config, which is rejected before anything attaches.
//!
//! ## Stale-Safe Filtering
//!
//! Project reveals are staggered, so a second filter can start while the
//! first one's reveals are still pending. Each filter run has a generation
//! number and reveals from an older generation are dropped when they fire.

pub mod app;
pub mod carousel;
pub mod config;
pub mod contact;
pub mod dom;
pub mod event;
pub mod filter;
pub mod logging;
pub mod observe;
pub mod output;
pub mod page;
pub mod scenario;
pub mod timers;
pub mod typing;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

#[cfg(test)]
pub(crate) mod test_helpers;
