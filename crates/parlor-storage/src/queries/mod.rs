// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for typed operations on storage entities.

pub mod messages;
pub mod queue;
pub mod rooms;
pub mod subscriptions;
pub mod usage;
pub mod users;
