// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*!
Build-time resource packing.

A JSON manifest lists files and the integer ids they are addressed by. This
library compiles those files into a single packed resources container (see
the `packed-resources` crate) and renders that container into source code a
consuming program can compile in, along with named constants for every id.

This library exposes that functionality to other tools, such as Cargo build
scripts.
*/

pub mod cli;
pub mod codegen;
pub mod environment;
pub mod logging;
pub mod manifest;
pub mod packing;
