// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ffmpeg argument construction. Pure: nothing here reads or writes files.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use wandelwerk_core::error::{EngineError, Result};
use wandelwerk_core::{CompressionPreset, JobId};

/// Constant rate factor used for every compression.
pub const COMPRESSION_CRF: u8 = 28;
/// Video codec used for every compression.
pub const COMPRESSION_CODEC: &str = "libx264";

/// A wall-clock position written as `HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: u64,
}

impl Timestamp {
    pub fn from_seconds(seconds: u64) -> Self {
        Self { seconds }
    }

    pub fn as_seconds(&self) -> u64 {
        self.seconds
    }
}

impl FromStr for Timestamp {
    type Err = EngineError;

    /// Hours take two or more digits; minutes and seconds exactly two, below 60.
    fn from_str(s: &str) -> Result<Self> {
        let invalid =
            || EngineError::InvalidParameter(format!("'{s}' is not a HH:MM:SS timestamp"));

        let fields: Vec<&str> = s.trim().split(':').collect();
        let [hours, minutes, seconds] = fields.as_slice() else {
            return Err(invalid());
        };

        let digits = |field: &str, width: std::ops::RangeInclusive<usize>| -> Result<u64> {
            if !width.contains(&field.len()) || !field.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            field.parse().map_err(|_| invalid())
        };

        let hours = digits(hours, 2..=6)?;
        let minutes = digits(minutes, 2..=2)?;
        let seconds = digits(seconds, 2..=2)?;
        if minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }

        Ok(Self {
            seconds: hours * 3600 + minutes * 60 + seconds,
        })
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.seconds / 3600,
            (self.seconds / 60) % 60,
            self.seconds % 60
        )
    }
}

/// A media operation with the files and parameters it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaOperation {
    /// Join videos end to end without re-encoding.
    Concat { inputs: Vec<PathBuf> },
    /// Keep `start..end` of one video without re-encoding.
    Trim {
        input: PathBuf,
        start: Timestamp,
        end: Timestamp,
    },
    /// Re-encode with x264 at a fixed quality and the given speed preset.
    Compress {
        input: PathBuf,
        preset: CompressionPreset,
    },
    /// Copy the video and drop every audio stream.
    Mute { input: PathBuf },
    /// Loop `audio` under the video, ending with the shorter stream.
    ReplaceAudio { input: PathBuf, audio: PathBuf },
}

impl MediaOperation {
    /// Short name used in logs and job directory names.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Concat { .. } => "concat",
            Self::Trim { .. } => "trim",
            Self::Compress { .. } => "compress",
            Self::Mute { .. } => "mute",
            Self::ReplaceAudio { .. } => "replace-audio",
        }
    }

    /// Suggested download name for the result.
    pub fn output_file_name(&self) -> &'static str {
        match self {
            Self::Concat { .. } => "merged.mp4",
            Self::Trim { .. } => "trimmed.mp4",
            Self::Compress { .. } => "compressed.mp4",
            Self::Mute { .. } | Self::ReplaceAudio { .. } => "processed.mp4",
        }
    }
}

/// One transcoder invocation: the operation, where its output goes, and (for
/// concatenation) where the input manifest lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    pub id: JobId,
    pub operation: MediaOperation,
    pub output: PathBuf,
    /// Concat manifest location; unused by other operations.
    pub manifest: PathBuf,
}

impl TranscodeJob {
    /// A job whose output and manifest sit in `work_dir`.
    pub fn in_dir(id: JobId, operation: MediaOperation, work_dir: &Path) -> Self {
        Self {
            id,
            output: work_dir.join(format!("output_{}", operation.output_file_name())),
            manifest: work_dir.join("concat_list.txt"),
            operation,
        }
    }
}

/// Maps each [`MediaOperation`] to its exact ffmpeg argument list.
pub struct MediaCommandBuilder;

impl MediaCommandBuilder {
    /// Arguments following the ffmpeg executable.
    pub fn arguments(job: &TranscodeJob) -> Result<Vec<OsString>> {
        let output = || job.output.clone().into_os_string();

        let args: Vec<OsString> = match &job.operation {
            MediaOperation::Concat { inputs } => {
                if inputs.is_empty() {
                    return Err(EngineError::InvalidParameter(
                        "concatenation needs at least one video".into(),
                    ));
                }
                vec![
                    "-f".into(),
                    "concat".into(),
                    "-safe".into(),
                    "0".into(),
                    "-i".into(),
                    job.manifest.clone().into_os_string(),
                    "-c".into(),
                    "copy".into(),
                    "-y".into(),
                    output(),
                ]
            }
            MediaOperation::Trim { input, start, end } => {
                if start >= end {
                    return Err(EngineError::InvalidParameter(format!(
                        "trim start {start} must be before end {end}"
                    )));
                }
                vec![
                    "-ss".into(),
                    start.to_string().into(),
                    "-to".into(),
                    end.to_string().into(),
                    "-i".into(),
                    input.clone().into_os_string(),
                    "-c".into(),
                    "copy".into(),
                    "-y".into(),
                    output(),
                ]
            }
            MediaOperation::Compress { input, preset } => vec![
                "-i".into(),
                input.clone().into_os_string(),
                "-vcodec".into(),
                COMPRESSION_CODEC.into(),
                "-crf".into(),
                COMPRESSION_CRF.to_string().into(),
                "-preset".into(),
                preset.as_str().into(),
                "-y".into(),
                output(),
            ],
            MediaOperation::Mute { input } => vec![
                "-i".into(),
                input.clone().into_os_string(),
                "-c".into(),
                "copy".into(),
                "-an".into(),
                "-y".into(),
                output(),
            ],
            MediaOperation::ReplaceAudio { input, audio } => vec![
                "-i".into(),
                input.clone().into_os_string(),
                "-stream_loop".into(),
                "-1".into(),
                "-i".into(),
                audio.clone().into_os_string(),
                "-map".into(),
                "0:v".into(),
                "-map".into(),
                "1:a".into(),
                "-c:v".into(),
                "copy".into(),
                "-shortest".into(),
                "-y".into(),
                output(),
            ],
        };

        Ok(args)
    }

    /// Concat demuxer manifest: one `file '<path>'` line per input, in order.
    ///
    /// Inputs inside `manifest_dir` are listed by relative name; single quotes
    /// are escaped the way the demuxer expects.
    pub fn concat_manifest(inputs: &[PathBuf], manifest_dir: &Path) -> Result<String> {
        let mut manifest = String::new();
        for input in inputs {
            let listed = input.strip_prefix(manifest_dir).unwrap_or(input);
            let listed = listed.to_str().ok_or_else(|| {
                EngineError::InvalidParameter(format!(
                    "input path {} is not valid UTF-8",
                    input.display()
                ))
            })?;
            manifest.push_str("file '");
            manifest.push_str(&listed.replace('\'', r"'\''"));
            manifest.push_str("'\n");
        }
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(operation: MediaOperation) -> TranscodeJob {
        TranscodeJob::in_dir(JobId::new(), operation, Path::new("/work"))
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn timestamps_parse_and_print() {
        assert_eq!(ts("00:00:05").as_seconds(), 5);
        assert_eq!(ts("01:02:03").as_seconds(), 3723);
        assert_eq!(ts("100:00:00").to_string(), "100:00:00");
        assert_eq!(Timestamp::from_seconds(75).to_string(), "00:01:15");
    }

    #[test]
    fn malformed_timestamps_are_rejected() {
        for bad in ["", "5", "00:05", "0:00:05", "00:60:00", "00:00:60", "aa:bb:cc", "00:00:05.5", "-1:00:00"] {
            assert!(
                matches!(bad.parse::<Timestamp>(), Err(EngineError::InvalidParameter(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn trim_uses_stream_copy_only() {
        let args = strings(
            &MediaCommandBuilder::arguments(&job(MediaOperation::Trim {
                input: PathBuf::from("/work/input_0.mp4"),
                start: ts("00:00:05"),
                end: ts("00:00:15"),
            }))
            .unwrap(),
        );

        assert_eq!(
            args,
            vec![
                "-ss", "00:00:05", "-to", "00:00:15", "-i", "/work/input_0.mp4", "-c", "copy",
                "-y", "/work/output_trimmed.mp4",
            ]
        );
        assert!(!args.iter().any(|a| a == "-vcodec" || a == "-crf" || a == "-preset"));
    }

    #[test]
    fn trim_requires_start_before_end() {
        let result = MediaCommandBuilder::arguments(&job(MediaOperation::Trim {
            input: PathBuf::from("/work/input_0.mp4"),
            start: ts("00:00:15"),
            end: ts("00:00:15"),
        }));
        assert!(matches!(result, Err(EngineError::InvalidParameter(_))));
    }

    #[test]
    fn concat_reads_manifest_with_stream_copy() {
        let args = strings(
            &MediaCommandBuilder::arguments(&job(MediaOperation::Concat {
                inputs: vec![PathBuf::from("/work/input_0.mp4"), PathBuf::from("/work/input_1.mp4")],
            }))
            .unwrap(),
        );
        assert_eq!(
            args,
            vec![
                "-f", "concat", "-safe", "0", "-i", "/work/concat_list.txt", "-c", "copy", "-y",
                "/work/output_merged.mp4",
            ]
        );
    }

    #[test]
    fn concat_without_inputs_is_rejected() {
        let result = MediaCommandBuilder::arguments(&job(MediaOperation::Concat { inputs: vec![] }));
        assert!(matches!(result, Err(EngineError::InvalidParameter(_))));
    }

    #[test]
    fn compress_uses_crf_28_and_chosen_preset() {
        for preset in CompressionPreset::ALL {
            let args = strings(
                &MediaCommandBuilder::arguments(&job(MediaOperation::Compress {
                    input: PathBuf::from("/work/input_0.mp4"),
                    preset,
                }))
                .unwrap(),
            );
            assert_eq!(
                args,
                vec![
                    "-i", "/work/input_0.mp4", "-vcodec", "libx264", "-crf", "28", "-preset",
                    preset.as_str(), "-y", "/work/output_compressed.mp4",
                ]
            );
        }
    }

    #[test]
    fn mute_drops_audio() {
        let args = strings(
            &MediaCommandBuilder::arguments(&job(MediaOperation::Mute {
                input: PathBuf::from("/work/input_0.mp4"),
            }))
            .unwrap(),
        );
        assert_eq!(
            args,
            vec!["-i", "/work/input_0.mp4", "-c", "copy", "-an", "-y", "/work/output_processed.mp4"]
        );
    }

    #[test]
    fn replace_audio_loops_and_stops_at_shortest() {
        let args = strings(
            &MediaCommandBuilder::arguments(&job(MediaOperation::ReplaceAudio {
                input: PathBuf::from("/work/input_0.mp4"),
                audio: PathBuf::from("/work/audio.mp3"),
            }))
            .unwrap(),
        );
        assert_eq!(
            args,
            vec![
                "-i", "/work/input_0.mp4", "-stream_loop", "-1", "-i", "/work/audio.mp3", "-map",
                "0:v", "-map", "1:a", "-c:v", "copy", "-shortest", "-y",
                "/work/output_processed.mp4",
            ]
        );
    }

    #[test]
    fn manifest_lists_inputs_in_order() {
        let manifest = MediaCommandBuilder::concat_manifest(
            &[
                PathBuf::from("/work/input_0.mp4"),
                PathBuf::from("/work/input_1.mp4"),
                PathBuf::from("/elsewhere/it's.mp4"),
            ],
            Path::new("/work"),
        )
        .unwrap();
        assert_eq!(
            manifest,
            "file 'input_0.mp4'\nfile 'input_1.mp4'\nfile '/elsewhere/it'\\''s.mp4'\n"
        );
    }
}
