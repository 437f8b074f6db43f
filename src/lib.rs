//! # Chat Relay
//!
//! A self-hosted relay that fronts third-party LLM chat APIs (OpenAI,
//! GitHub Models, Anthropic, Cohere, Mistral, Gemini) behind one
//! normalized HTTP surface, with per-client rate limiting and chat/message
//! persistence.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Browser  │──▶│   Gateway   │──▶│  Provider   │──▶│  Vendor  │
//! │ chat UI  │   │ (axum HTTP) │   │  Adapter    │   │  HTTP API│
//! └──────────┘   └──────┬──────┘   └─────────────┘   └──────────┘
//!                       │
//!              ┌────────┴────────┐
//!              ▼                 ▼
//!        ┌──────────┐     ┌───────────┐
//!        │  Rate    │     │  Store    │
//!        │  Limiter │     │ SQLite/mem│
//!        └──────────┘     └───────────┘
//! ```
//!
//! Each request runs one single-shot turn: the caller is rate-limited, the
//! user's message is persisted, the vendor is called once (no streaming,
//! no retries), and the reply is persisted and returned.
//!
//! ## Quick Start
//!
//! ```bash
//! relayd init                   # create the SQLite database
//! relayd serve                  # start the HTTP server
//! curl -s localhost:7350/health
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment credentials |
//! | [`models`] | Core data types |
//! | [`ratelimit`] | Per-client fixed-window rate limiting |
//! | [`provider`] | Vendor request shaping and response parsing |
//! | [`store`] | Chat/message persistence (SQLite or in-memory) |
//! | [`server`] | The HTTP gateway |

pub mod config;
pub mod models;
pub mod provider;
pub mod ratelimit;
pub mod server;
pub mod store;
