// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use wandelwerk_core::CompressionPreset;
use wandelwerk_media::Timestamp;

#[derive(Parser, Debug)]
#[command(
    name = "wandelwerk",
    version,
    about = "Wandelwerk: document and media transformation",
    long_about = "Merges, splits and locks PDFs, paginates images, converts contact \
                  sheets to vCards, edits videos through ffmpeg, and extracts text."
)]
pub struct Cli {
    /// JSON configuration file (WANDELWERK_* variables override it)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory the result is written to
    #[arg(short, long, global = true, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// PDF merge, page extraction, and password protection
    #[command(subcommand)]
    Pdf(PdfCommand),

    /// Lay images out one per page and write them as a PDF
    Images {
        #[arg(required = true, value_name = "IMAGE")]
        images: Vec<PathBuf>,
    },

    /// Convert a CSV with Name and Phone columns into a vCard file
    Vcard {
        #[arg(value_name = "CSV")]
        csv: PathBuf,
    },

    /// Video editing through ffmpeg
    #[command(subcommand)]
    Video(VideoCommand),

    /// Print the text content of a document
    Read(ReadArgs),
}

#[derive(Subcommand, Debug)]
pub enum PdfCommand {
    /// Join PDFs in the order given
    Merge {
        #[arg(required = true, value_name = "PDF")]
        inputs: Vec<PathBuf>,
    },
    /// Copy a page or page span ("3" or "2-7") into a new PDF
    Split {
        #[arg(value_name = "PDF")]
        input: PathBuf,
        #[arg(short, long, value_name = "RANGE")]
        pages: String,
    },
    /// Protect a PDF with a password
    Lock(PasswordArgs),
    /// Remove password protection from a PDF
    Unlock(PasswordArgs),
}

#[derive(Args, Debug)]
pub struct PasswordArgs {
    #[arg(value_name = "PDF")]
    pub input: PathBuf,
    #[arg(short, long)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum VideoCommand {
    /// Join videos end to end
    Merge {
        #[arg(required = true, value_name = "VIDEO")]
        inputs: Vec<PathBuf>,
    },
    /// Keep the section between two HH:MM:SS timestamps
    Trim {
        #[arg(value_name = "VIDEO")]
        input: PathBuf,
        #[arg(long)]
        start: Timestamp,
        #[arg(long)]
        end: Timestamp,
    },
    /// Re-encode at a smaller size
    Compress {
        #[arg(value_name = "VIDEO")]
        input: PathBuf,
        /// medium, fast, faster or ultrafast (defaults to the configured preset)
        #[arg(long)]
        preset: Option<CompressionPreset>,
    },
    /// Remove the audio track
    Mute {
        #[arg(value_name = "VIDEO")]
        input: PathBuf,
    },
    /// Replace the audio track, looping the new audio to the video's length
    ReplaceAudio {
        #[arg(value_name = "VIDEO")]
        input: PathBuf,
        #[arg(value_name = "AUDIO")]
        audio: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[arg(value_name = "FILE")]
    pub input: PathBuf,
    /// Page to read from a PDF (1-based)
    #[arg(long)]
    pub page: Option<u32>,
    /// Print the extraction as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_video_trim() {
        let cli = Cli::try_parse_from([
            "wandelwerk", "video", "trim", "clip.mp4", "--start", "00:00:05", "--end", "00:00:15",
        ])
        .unwrap();
        match cli.command {
            Command::Video(VideoCommand::Trim { start, end, .. }) => {
                assert_eq!(start.as_seconds(), 5);
                assert_eq!(end.as_seconds(), 15);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let result = Cli::try_parse_from([
            "wandelwerk", "video", "trim", "clip.mp4", "--start", "5s", "--end", "00:00:15",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_output_dir_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wandelwerk", "pdf", "split", "in.pdf", "--pages", "2-4", "-o", "out",
        ])
        .unwrap();
        assert_eq!(cli.output_dir, PathBuf::from("out"));
    }
}
