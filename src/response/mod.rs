// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interpretation of decoded device responses.
//!
//! Responses are treated as text and mined for the specific fields a caller
//! asks for ([`extract`]). Only system information, whose `children` list
//! needs walking, is parsed structurally ([`SysInfo`]).

mod emeter;
pub mod extract;
mod pretty;
mod sysinfo;

pub use emeter::Telemetry;
pub use extract::{Identity, RelayStates};
pub use pretty::pretty;
pub use sysinfo::{ChildInfo, DeviceSummary, SysInfo};
