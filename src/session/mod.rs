// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! View lifetimes and session state.
//!
//! - [`ViewScope`]: releases a view's subscriptions when it goes away
//! - [`MainView`]: the main screen controller
//! - [`TokenStore`]: where the session token lives, injected per view

mod main_view;
mod scope;
mod token_store;

pub use main_view::{MainView, Section};
pub use scope::ViewScope;
pub use token_store::{MemoryTokenStore, TokenStore};
