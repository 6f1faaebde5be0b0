#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Siren Resolver
//!
//! > **A session-scoped client for Siren hypermedia APIs.**
//!
//! This crate turns Siren JSON representations into live, shared [`Entity`]
//! handles. It resolves URLs and `#`-delimited chains
//! (`http://api.x.io/orders/42#customer#address`), caches what it fetched for
//! the rest of the session, makes sure concurrent requests for the same URL hit
//! the network once, and runs the actions entities advertise.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Entities Are Shared Handles
//! An entity is cached in the [`Store`], nested in its parent and held by the
//! caller at the same time. All of them are clones of one handle, so when an
//! action response replaces the entity's data every holder sees it.
//!
//! ### Register Before Await
//! The "is this URL already being fetched?" check and the registration of a new
//! pending [`RequestHandle`](store::RequestHandle) happen under one lock, before
//! the transport is ever awaited. Whoever comes second joins the first request.
//!
//! ### HTTP Is Someone Else's Job
//! The crate never opens a socket. Everything goes through the [`Transport`]
//! trait; tests use [`MockTransport`](transport::mock::MockTransport).
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Every failure is a [`SirenError`]. It is `Clone` because one failed fetch is
//! delivered to every caller that joined it. Transport failures carry the
//! response body parsed as an error entity.
//!
//! ### 2. Concurrency Model
//! Everything runs on tokio. The store's maps sit behind a mutex that is never
//! held across an `.await`; request handles are `tokio::sync::watch` channels
//! that settle exactly once.
//!
//! ### 3. Observability
//! We use `tracing` everywhere with structured fields. See the
//! [`runtime::tracing`] module for details.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Data ([`model`], [`entity`])
//! Raw payload types and the parsed, shared entity handles built from them.
//! - **Key items**: [`SirenPayload`](model::SirenPayload), [`Entity`], [`parse`](entity::parse).
//!
//! ### 2. The Engine ([`resolver`], [`store`])
//! Chain parsing, the resolution algorithm, the session cache.
//! - **Key items**: [`resolve`](resolver::resolve), [`Chain`], [`Store`].
//!
//! ### 3. The Operations ([`action`])
//! Serializing an entity through an action's fields and applying the response.
//! - **Key items**: [`Action`](action::Action), [`plan`](action::plan), [`ExecuteOptions`](action::ExecuteOptions).
//!
//! ### 4. The Interface ([`clients`], [`runtime`])
//! A session object that owns the store, transport and configuration.
//! - **Key items**: [`SirenClient`](clients::SirenClient), [`ClientConfig`](runtime::ClientConfig).
//!
//! ## 🚀 Quick Start
//!
//! ```ignore
//! let client = SirenClient::new(ClientConfig::new("http://api.x.io"), transport);
//! let order = client.resolve_entity("orders/42").await?;
//! let address = client.resolve_chain_from(&order, "customer#address").await?;
//! client.invoke(&order, "add-item", attributes).await?;
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod action;
pub mod clients;
pub mod entity;
pub mod error;
pub mod model;
pub mod resolver;
pub mod runtime;
pub mod store;
pub mod transport;

pub use entity::Entity;
pub use error::{Result, SirenError};
pub use resolver::{resolve, Chain, ResolveOptions};
pub use store::Store;
pub use transport::Transport;
