// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan state management types.
//!
//! [`FanState`] holds what the capability surface exposes: availability,
//! the last normalized snapshot and the fields derived from it (on/off,
//! percentage, preset, oscillation, natural mode). [`StateChange`]
//! represents an optimistic update applied after a successful command.
//!
//! # Examples
//!
//! ```
//! use miio_fan_lib::state::{FanState, StateChange};
//!
//! let mut state = FanState::new();
//! assert!(!state.available());
//!
//! state.apply(&StateChange::Oscillating(true));
//! assert_eq!(state.oscillating(), Some(true));
//! assert_eq!(state.snapshot().oscillate, Some(true));
//! ```

mod fan_state;
mod state_change;

pub use fan_state::FanState;
pub use state_change::StateChange;
