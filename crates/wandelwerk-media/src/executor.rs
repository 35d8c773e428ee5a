// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sandboxed transcoder runs. Every job gets its own scratch directory,
// removed when the job ends whether it succeeded or not, so concurrent jobs
// never share files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tracing::{error, info, warn};
use wandelwerk_core::error::{EngineError, Result};
use wandelwerk_core::{Artifact, CompressionPreset, EngineConfig, JobId, SourceKind};

use crate::command::{MediaCommandBuilder, MediaOperation, Timestamp, TranscodeJob};
use crate::process;

/// A media operation over in-memory uploads.
#[derive(Debug, Clone)]
pub enum MediaRequest<'a> {
    Concat {
        videos: Vec<&'a [u8]>,
    },
    Trim {
        video: &'a [u8],
        start: Timestamp,
        end: Timestamp,
    },
    Compress {
        video: &'a [u8],
        preset: CompressionPreset,
    },
    Mute {
        video: &'a [u8],
    },
    ReplaceAudio {
        video: &'a [u8],
        audio: &'a [u8],
        audio_kind: SourceKind,
    },
}

impl MediaRequest<'_> {
    fn validate(&self) -> Result<()> {
        match self {
            Self::Concat { videos } if videos.is_empty() => Err(EngineError::InvalidParameter(
                "concatenation needs at least one video".into(),
            )),
            Self::Trim { start, end, .. } if start >= end => Err(EngineError::InvalidParameter(
                format!("trim start {start} must be before end {end}"),
            )),
            Self::ReplaceAudio { audio, .. } if audio.is_empty() => Err(
                EngineError::InvalidParameter("replacement audio is empty".into()),
            ),
            Self::ReplaceAudio { audio_kind, .. }
                if !matches!(audio_kind, SourceKind::Mp3 | SourceKind::Wav) =>
            {
                Err(EngineError::UnsupportedKind(format!(
                    "{audio_kind:?} is not an audio track"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Write the uploads into `dir` and describe the job over those files.
    fn materialise(&self, dir: &Path) -> Result<MediaOperation> {
        let write = |name: String, bytes: &[u8]| -> Result<PathBuf> {
            let path = dir.join(name);
            fs::write(&path, bytes)?;
            Ok(path)
        };
        let video = |bytes: &[u8]| write("input_0.mp4".to_string(), bytes);

        Ok(match self {
            Self::Concat { videos } => MediaOperation::Concat {
                inputs: videos
                    .iter()
                    .enumerate()
                    .map(|(n, bytes)| write(format!("input_{n}.mp4"), bytes))
                    .collect::<Result<_>>()?,
            },
            Self::Trim { video: v, start, end } => MediaOperation::Trim {
                input: video(v)?,
                start: *start,
                end: *end,
            },
            Self::Compress { video: v, preset } => MediaOperation::Compress {
                input: video(v)?,
                preset: *preset,
            },
            Self::Mute { video: v } => MediaOperation::Mute { input: video(v)? },
            Self::ReplaceAudio {
                video: v,
                audio,
                audio_kind,
            } => {
                let extension = if *audio_kind == SourceKind::Wav { "wav" } else { "mp3" };
                MediaOperation::ReplaceAudio {
                    input: video(v)?,
                    audio: write(format!("audio.{extension}"), audio)?,
                }
            }
        })
    }
}

/// Runs media operations through an external ffmpeg binary.
#[derive(Debug, Clone)]
pub struct TranscodeExecutor {
    ffmpeg: PathBuf,
    timeout: Duration,
    temp_root: Option<PathBuf>,
}

impl TranscodeExecutor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            timeout: config.transcode_timeout(),
            temp_root: config.temp_root.clone(),
        }
    }

    /// Override the per-job deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one request and return the produced video.
    pub fn run(&self, request: &MediaRequest<'_>) -> Result<Artifact> {
        request.validate()?;

        let id = JobId::new();
        let workspace = self.workspace(id)?;
        let operation = request.materialise(workspace.path())?;
        let job = TranscodeJob::in_dir(id, operation, workspace.path());

        let result = self.execute(&job);
        if let Err(e) = workspace.close() {
            warn!(job = %id, "failed to remove job directory: {e}");
        }
        let bytes = result?;

        info!(
            job = %id,
            operation = job.operation.name(),
            bytes = bytes.len(),
            "transcode finished"
        );
        Ok(Artifact::mp4(bytes, job.operation.output_file_name()))
    }

    fn workspace(&self, id: JobId) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        let prefix = format!("wandelwerk-{id}-");
        builder.prefix(&prefix);
        let dir = match &self.temp_root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn execute(&self, job: &TranscodeJob) -> Result<Vec<u8>> {
        let args = MediaCommandBuilder::arguments(job)?;
        if let MediaOperation::Concat { inputs } = &job.operation {
            let dir = job.manifest.parent().unwrap_or(Path::new("."));
            fs::write(&job.manifest, MediaCommandBuilder::concat_manifest(inputs, dir)?)?;
        }

        let work_dir = job.output.parent().unwrap_or(Path::new("."));
        let outcome = process::run_with_timeout(&self.ffmpeg, &args, work_dir, self.timeout)
            .inspect_err(|e| error!(job = %job.id, operation = job.operation.name(), "{e}"))?;

        if !outcome.status.success() {
            let reason = match outcome.status.code() {
                Some(code) => format!("ffmpeg exited with status {code}"),
                None => "ffmpeg was terminated by a signal".to_string(),
            };
            error!(job = %job.id, operation = job.operation.name(), "{reason}");
            return Err(EngineError::TranscodeFailed {
                reason,
                stderr: outcome.stderr_tail,
            });
        }

        let bytes = match fs::read(&job.output) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        if bytes.is_empty() {
            error!(job = %job.id, operation = job.operation.name(), "no output produced");
            return Err(EngineError::TranscodeFailed {
                reason: "ffmpeg produced no output".into(),
                stderr: outcome.stderr_tail,
            });
        }
        Ok(bytes)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// A stand-in transcoder: a shell script given the same arguments ffmpeg
    /// would receive. The output path is always the final argument.
    struct FakeTranscoder {
        dir: TempDir,
    }

    impl FakeTranscoder {
        fn new(body: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let script = dir.path().join("ffmpeg");
            let text = format!(
                "#!/bin/sh\nfor out; do :; done\nrecord=\"{}\"\n{body}\n",
                dir.path().join("record").display()
            );
            fs::write(&script, text).unwrap();
            fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
            Self { dir }
        }

        fn writes(content: &str) -> Self {
            Self::new(&format!(
                "printf '%s\\n' \"$@\" > \"$record.args\"\nprintf '{content}' > \"$out\""
            ))
        }

        fn recorded(&self, suffix: &str) -> String {
            fs::read_to_string(self.dir.path().join(format!("record.{suffix}"))).unwrap()
        }

        fn executor(&self, temp_root: &Path) -> TranscodeExecutor {
            let config = EngineConfig {
                ffmpeg_path: self.dir.path().join("ffmpeg"),
                temp_root: Some(temp_root.to_path_buf()),
                ..EngineConfig::default()
            };
            TranscodeExecutor::new(&config)
        }
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn is_empty_dir(path: &Path) -> bool {
        fs::read_dir(path).unwrap().next().is_none()
    }

    #[test]
    fn successful_trim_returns_output_and_cleans_up() {
        let fake = FakeTranscoder::writes("trimmed-bytes");
        let root = tempfile::tempdir().unwrap();

        let artifact = fake
            .executor(root.path())
            .run(&MediaRequest::Trim {
                video: b"source video",
                start: ts("00:00:05"),
                end: ts("00:00:15"),
            })
            .unwrap();

        assert_eq!(artifact.bytes, b"trimmed-bytes");
        assert_eq!(artifact.file_name, "trimmed.mp4");
        assert_eq!(artifact.content_type, "video/mp4");
        let args = fake.recorded("args");
        assert!(args.starts_with("-ss\n00:00:05\n-to\n00:00:15\n-i\n"));
        assert!(!args.contains("-crf"));
        assert!(is_empty_dir(root.path()));
    }

    #[test]
    fn concat_writes_ordered_manifest() {
        let fake = FakeTranscoder::new(
            "cp \"$6\" \"$record.manifest\"\nfor f in input_0.mp4 input_1.mp4 input_2.mp4; do cat \"$f\" >> \"$out\"; done",
        );
        let root = tempfile::tempdir().unwrap();

        let artifact = fake
            .executor(root.path())
            .run(&MediaRequest::Concat {
                videos: vec![b"a".as_slice(), b"b".as_slice(), b"c".as_slice()],
            })
            .unwrap();

        assert_eq!(artifact.bytes, b"abc");
        assert_eq!(artifact.file_name, "merged.mp4");
        assert_eq!(
            fake.recorded("manifest"),
            "file 'input_0.mp4'\nfile 'input_1.mp4'\nfile 'input_2.mp4'\n"
        );
    }

    #[test]
    fn replace_audio_keeps_audio_extension() {
        let fake = FakeTranscoder::writes("with-audio");
        let root = tempfile::tempdir().unwrap();

        let artifact = fake
            .executor(root.path())
            .run(&MediaRequest::ReplaceAudio {
                video: b"video",
                audio: b"RIFF",
                audio_kind: SourceKind::Wav,
            })
            .unwrap();

        assert_eq!(artifact.file_name, "processed.mp4");
        assert!(fake.recorded("args").contains("/audio.wav\n-map\n0:v\n-map\n1:a\n"));
    }

    #[test]
    fn non_zero_exit_is_reported_with_stderr() {
        let fake = FakeTranscoder::new("echo 'Invalid data found' >&2\nexit 1");
        let root = tempfile::tempdir().unwrap();

        let err = fake
            .executor(root.path())
            .run(&MediaRequest::Mute { video: b"not a video" })
            .unwrap_err();

        match err {
            EngineError::TranscodeFailed { reason, stderr } => {
                assert!(reason.contains("status 1"));
                assert_eq!(stderr, "Invalid data found");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(is_empty_dir(root.path()));
    }

    #[test]
    fn success_without_output_is_a_failure() {
        let fake = FakeTranscoder::new("exit 0");
        let root = tempfile::tempdir().unwrap();

        let err = fake
            .executor(root.path())
            .run(&MediaRequest::Compress {
                video: b"video",
                preset: CompressionPreset::Fast,
            })
            .unwrap_err();

        assert!(matches!(err, EngineError::TranscodeFailed { .. }));
        assert!(is_empty_dir(root.path()));
    }

    #[test]
    fn empty_output_is_a_failure() {
        let fake = FakeTranscoder::new(": > \"$out\"");
        let root = tempfile::tempdir().unwrap();

        let err = fake
            .executor(root.path())
            .run(&MediaRequest::Mute { video: b"video" })
            .unwrap_err();
        assert!(matches!(err, EngineError::TranscodeFailed { .. }));
    }

    #[test]
    fn hung_transcoder_is_killed() {
        let fake = FakeTranscoder::new("exec sleep 30");
        let root = tempfile::tempdir().unwrap();

        let err = fake
            .executor(root.path())
            .with_timeout(Duration::from_millis(200))
            .run(&MediaRequest::Mute { video: b"video" })
            .unwrap_err();

        match err {
            EngineError::TranscodeFailed { reason, .. } => assert!(reason.contains("timed out")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(is_empty_dir(root.path()));
    }

    #[test]
    fn invalid_requests_never_start_the_transcoder() {
        let fake = FakeTranscoder::new("touch \"$record.started\"\nexit 1");
        let root = tempfile::tempdir().unwrap();
        let executor = fake.executor(root.path());

        let empty = executor.run(&MediaRequest::Concat { videos: vec![] });
        assert!(matches!(empty, Err(EngineError::InvalidParameter(_))));

        let backwards = executor.run(&MediaRequest::Trim {
            video: b"video",
            start: ts("00:00:15"),
            end: ts("00:00:05"),
        });
        assert!(matches!(backwards, Err(EngineError::InvalidParameter(_))));

        let no_audio = executor.run(&MediaRequest::ReplaceAudio {
            video: b"video",
            audio: b"",
            audio_kind: SourceKind::Mp3,
        });
        assert!(matches!(no_audio, Err(EngineError::InvalidParameter(_))));

        let not_audio = executor.run(&MediaRequest::ReplaceAudio {
            video: b"video",
            audio: b"%PDF",
            audio_kind: SourceKind::Pdf,
        });
        assert!(matches!(not_audio, Err(EngineError::UnsupportedKind(_))));

        assert!(!fake.dir.path().join("record.started").exists());
        assert!(is_empty_dir(root.path()));
    }

    #[test]
    fn missing_binary_fails_to_start() {
        let root = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
            temp_root: Some(root.path().to_path_buf()),
            ..EngineConfig::default()
        };

        let err = TranscodeExecutor::new(&config)
            .run(&MediaRequest::Mute { video: b"video" })
            .unwrap_err();
        match err {
            EngineError::TranscodeFailed { reason, .. } => {
                assert!(reason.starts_with("failed to start"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(is_empty_dir(root.path()));
    }

    #[test]
    fn concurrent_jobs_do_not_share_files() {
        let fake = FakeTranscoder::new("cat input_0.mp4 > \"$out\"");
        let root = tempfile::tempdir().unwrap();
        let executor = fake.executor(root.path());

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|n| {
                    let executor = &executor;
                    scope.spawn(move || {
                        let payload = format!("video-{n}");
                        let artifact = executor
                            .run(&MediaRequest::Mute {
                                video: payload.as_bytes(),
                            })
                            .unwrap();
                        assert_eq!(artifact.bytes, payload.as_bytes());
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });

        assert!(is_empty_dir(root.path()));
    }
}
