//! # treescope - Live Tree Query & Change-Classification Engine
//!
//! treescope inspects a live tree of UI components. It answers structural
//! queries against the current tree, serializes nodes into JSON-safe
//! records, and on every commit attributes each re-render to its cause
//! (state, props, context, or parent).
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Host Renderer (commits)                     │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ committed tree + alternates
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Engine (this crate)                      │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Tracking   │──▶│   Buffers    │──▶│   Analysis   │         │
//! │  │ (diff+class) │   │  (bounded)   │   │  (report)    │         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Selector   │──▶│  Serializer  │   │    Mocks     │         │
//! │  │(parse/match) │   │  (records)   │   │ (intercept)  │         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ JSON requests / responses
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Protocol clients, CLI, Chrome trace export         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`host`]: Arena tree of nodes with alternates, dynamic values, JSON fixtures
//! - [`accessor`]: Derived node facts (type name, text, uid, capabilities)
//! - [`selector`]: Selector grammar and matching against the tree
//! - [`serializer`]: Matched records, snapshots, node details, geometry
//! - [`capture`]: Bounded, cycle-safe conversion of values to JSON
//! - [`tracking`]: State change tracking, render classification, component filter
//! - [`buffers`]: Bounded ring buffers with filtered queries
//! - [`analysis`]: Render report aggregation
//! - [`network`]: Mock registry and request interception
//! - [`engine`]: Commit handling, profiling sessions, subscribers
//! - [`protocol`]: JSON request dispatch
//! - [`export`]: Chrome Trace Event Format output
//! - [`pending`] and [`geometry`]: asynchronous measurement plumbing
//! - [`config`], [`cli`], [`domain`]: configuration, arguments, core types
//!
//! ## Typical Usage
//!
//! ```bash
//! # Query a captured tree
//! treescope tree.json --query 'ScrollView > Pressable:has-press'
//!
//! # Profile a recorded session and export a trace
//! treescope --replay session.json --export trace.json
//! ```

pub mod accessor;
pub mod analysis;
pub mod buffers;
pub mod capture;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod export;
pub mod geometry;
pub mod host;
pub mod network;
pub mod pending;
pub mod protocol;
pub mod selector;
pub mod serializer;
pub mod tracking;
