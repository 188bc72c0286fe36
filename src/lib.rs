//! Leaderboard engine and member tracking for a small wellness club.
//!
//! [`aggregate`] and [`leaderboard`] are pure: they borrow record slices and
//! return freshly ranked rows. Everything else wires them to a record store,
//! week/month windows and the member roster.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod leaderboard;
pub mod models;
pub mod names;
pub mod payload;
pub mod report;
pub mod service;
pub mod stats;
pub mod store;
pub mod submit;
pub mod window;
