//! # devdoc
//!
//! A retrieval-augmented assistant that writes docstrings and reviews code
//! using a project's own source tree and a library of best-practice
//! documents as grounding context.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │ Source tree │──▶│  Pipeline   │──▶│ code.sqlite  │
//! │ Practices   │   │ Chunk+Embed │   │ practices.…  │
//! └─────────────┘   └─────────────┘   └──────┬───────┘
//!                                            │ top-k
//!                      ┌─────────────────────┤
//!                      ▼                     ▼
//!                 ┌──────────┐         ┌──────────┐
//!                 │   CLI    │         │   HTTP   │
//!                 │ (devdoc) │         │ /document│
//!                 └──────────┘         │ /review  │
//!                                      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! devdoc ingest code --path ./my_project
//! devdoc ingest practices --language python
//! devdoc document < snippet.py
//! devdoc serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`connector_fs`] | Filesystem document source |
//! | [`extract`] | UTF-8 and PDF text extraction |
//! | [`ingest`] | Load, chunk, embed, and persist a corpus |
//! | [`embedding`] | Embedding providers |
//! | [`llm`] | Generative model providers |
//! | [`sqlite_store`] | Persistent per-corpus vector store |
//! | [`context`] | Shared application state |
//! | [`assist`] | Documentation and review requests |
//! | [`server`] | HTTP server |
//! | [`stats`] | Collection overview |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//!
//! Domain types, the chunker, prompt templates, and the store trait live in
//! the `dev-documento-core` crate.

pub mod assist;
pub mod config;
pub mod connector_fs;
pub mod context;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod ingest;
pub mod llm;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
pub mod stats;
