//! # Freshet
//!
//! A feed reader built around an explicit reconciliation core and a staged
//! presentation pipeline.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → Reconciler → Store → Session pipeline → UI
//! ```
//!
//! Data flows one direction: the store pushes change events, the session
//! recomputes its displayed list, and user actions flow back as store
//! mutations or refresh requests.
//!
//! ## Modules
//!
//! - [`app`]: [`AppContext`](app::AppContext) wiring and error types
//! - [`cli`]: command-line interface (add, remove, update, list, tui)
//! - [`config`]: reader preferences from `~/.config/freshet/config.toml`
//! - [`domain`]: [`Feed`](domain::Feed), [`Entry`](domain::Entry) and the
//!   [`EntryMinimal`](domain::EntryMinimal) list projection
//! - [`store`]: the [`Store`](store::Store) interface and its SQLite
//!   implementation, with push-based change events
//! - [`fetcher`]: the async [`Fetcher`](fetcher::Fetcher) seam and its
//!   reqwest implementation
//! - [`normalizer`]: RSS/Atom parsing into domain records
//! - [`reconcile`]: the [`UpdateReconciler`](reconcile::UpdateReconciler),
//!   which diffs a fetch result against a stored snapshot into an
//!   add/update/delete delta, preserving reader-local flags
//! - [`session`]: the [`EntryListSession`](session::EntryListSession)
//!   view-model: filter → query → project → sort over observable outputs
//! - [`tui`]: terminal front end built with ratatui

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod fetcher;
pub mod normalizer;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod tui;
