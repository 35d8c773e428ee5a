// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// wandelwerk-media — Video and audio operations delegated to an external
// ffmpeg process: concatenate, trim, compress, mute, and replace audio.
//
// `command` turns an operation into an exact ffmpeg argument list without
// touching the filesystem; `executor` materialises inputs into a per-job
// scratch directory, runs ffmpeg with a timeout, and reads the result back.

pub mod command;
pub mod executor;
pub mod process;

pub use command::{MediaCommandBuilder, MediaOperation, Timestamp, TranscodeJob};
pub use executor::{MediaRequest, TranscodeExecutor};
