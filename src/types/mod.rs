// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for Kasa device control.
//!
//! - [`RelayState`] - On/Off state of a switch output
//! - [`ChildId`] - Identifier of one outlet on a multi-outlet device
//! - [`Brightness`] - Dimmer level (0-100%)

mod brightness;
mod relay;

pub use brightness::Brightness;
pub use relay::{ChildId, RelayState};
