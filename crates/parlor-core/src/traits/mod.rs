// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Parlor pipeline seams.
//!
//! Shared mutable infrastructure (storage, counter, queue, cache, provider)
//! is injected as explicit interfaces rather than ambient singletons. All
//! adapters extend the [`PluginAdapter`] base trait and use `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod adapter;
pub mod cache;
pub mod counter;
pub mod provider;
pub mod queue;
pub mod store;

// Re-export all traits at the traits module level for convenience.
pub use adapter::PluginAdapter;
pub use cache::CacheStore;
pub use counter::CounterStore;
pub use provider::CompletionProvider;
pub use queue::QueueClient;
pub use store::ChatStore;
