//! # FretCoach Practice
//!
//! Interactive chord practice against a live fretboard sensor server.
//!
//! **Components:**
//! - `client`: HTTP client for the sensor server API
//! - `registry`: cached chord name → reference fingering lookup
//! - `sensor`: polling and push feeds publishing the latest sensor state
//! - `session`: target selection, evaluation and scoring
//! - `notifications`: transient messages shown under the board
//! - `cue`: success sound on a first match
//! - `render` / `runner`: terminal front end
//! - `logging`: tracing setup for the binary

pub mod client;
pub mod cue;
pub mod logging;
pub mod notifications;
pub mod registry;
pub mod render;
pub mod runner;
pub mod sensor;
pub mod session;

pub use client::ApiClient;
pub use registry::ChordRegistry;
pub use session::PracticeSession;
