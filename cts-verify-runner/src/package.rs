// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Submission packages: archive extraction, naming, layout and release tags.

mod layout;
mod name;
mod release;
mod unarchiver;

pub use layout::*;
pub use name::*;
pub use release::*;
pub use unarchiver::*;
