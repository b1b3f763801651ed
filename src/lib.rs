//! # headless-press
//!
//! Server-side presentation layer for a headless WordPress CMS.
//!
//! Incoming paths are resolved against the CMS's GraphQL API, the matching
//! content item is fetched, and a view model is built from it with every
//! backend URL in its SEO metadata moved onto the public frontend origin.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌────────────┐
//! │   HTTP   │──▶│ Resolver │──▶│ ContentApi │──▶│ CMS GraphQL│
//! │  (axum)  │   │ 2-phase  │   │ CmsClient  │   │            │
//! └──────────┘   └────┬─────┘   └────────────┘   └────────────┘
//!                     ▼
//!               ┌────────────┐   rewrite · head_meta · jsonld
//!               │ ViewModel  │◀──────────────────────────────
//!               └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and env overrides |
//! | [`error`] | CMS transport errors |
//! | [`models`] | Content and SEO data types |
//! | [`html`] | Entity decoding and script-wrapper stripping |
//! | [`rewrite`] | Backend → frontend URL rewriting |
//! | [`head_meta`] | `<meta>` tag extraction from raw head markup |
//! | [`jsonld`] | JSON-LD normalization |
//! | [`queries`] | Named GraphQL operations |
//! | [`cms`] | GraphQL transport and typed operations |
//! | [`resolver`] | Path → content resolution |
//! | [`view_model`] | View model and page metadata |
//! | [`preview`] | Preview activation |
//! | [`server`] | HTTP server |

pub mod cms;
pub mod config;
pub mod error;
pub mod head_meta;
pub mod html;
pub mod jsonld;
pub mod models;
pub mod preview;
pub mod queries;
pub mod resolver;
pub mod rewrite;
pub mod server;
pub mod view_model;
