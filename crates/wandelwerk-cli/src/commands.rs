// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command dispatch: read inputs, call the engine, write the artifact.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use wandelwerk_core::error::{EngineError, Result};
use wandelwerk_core::{Artifact, EngineConfig, SourceFile, SourceKind};
use wandelwerk_document::contacts::csv_to_vcard_artifact;
use wandelwerk_document::pdf::writer::images_to_pdf;
use wandelwerk_document::{Extraction, PdfAssembler, extract};
use wandelwerk_media::{MediaRequest, TranscodeExecutor};

use crate::cli::{Cli, Command, PdfCommand, ReadArgs, VideoCommand};

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    let artifact = match cli.command {
        Command::Pdf(command) => pdf(command)?,
        Command::Images { images } => {
            require_kind(&images, SourceKind::is_image)?;
            let images = read_all(&images)?;
            images_to_pdf(&slices(&images), config.canvas)?
        }
        Command::Vcard { csv } => {
            let (artifact, valid) = csv_to_vcard_artifact(&read(&csv)?)?;
            info!(contacts = valid, "vCards written");
            artifact
        }
        Command::Video(command) => video(command, &config)?,
        Command::Read(args) => return read_document(args),
    };

    let path = write_artifact(&artifact, &cli.output_dir)?;
    println!("{}", path.display());
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    config.apply_env()
}

fn pdf(command: PdfCommand) -> Result<Artifact> {
    match command {
        PdfCommand::Merge { inputs } => {
            let documents = read_all(&inputs)?;
            PdfAssembler::merge_artifact(&slices(&documents))
        }
        PdfCommand::Split { input, pages } => PdfAssembler::extract_artifact(&read(&input)?, &pages),
        PdfCommand::Lock(args) => PdfAssembler::encrypt_artifact(&read(&args.input)?, &args.password),
        PdfCommand::Unlock(args) => {
            PdfAssembler::decrypt_artifact(&read(&args.input)?, &args.password)
        }
    }
}

fn video(command: VideoCommand, config: &EngineConfig) -> Result<Artifact> {
    let executor = TranscodeExecutor::new(config);
    match command {
        VideoCommand::Merge { inputs } => {
            require_kind(&inputs, SourceKind::is_media)?;
            let videos = read_all(&inputs)?;
            executor.run(&MediaRequest::Concat {
                videos: slices(&videos),
            })
        }
        VideoCommand::Trim { input, start, end } => executor.run(&MediaRequest::Trim {
            video: &read(&input)?,
            start,
            end,
        }),
        VideoCommand::Compress { input, preset } => executor.run(&MediaRequest::Compress {
            video: &read(&input)?,
            preset: preset.unwrap_or(config.default_preset),
        }),
        VideoCommand::Mute { input } => executor.run(&MediaRequest::Mute {
            video: &read(&input)?,
        }),
        VideoCommand::ReplaceAudio { input, audio } => {
            let audio_kind = kind_of(&audio)?;
            if !audio_kind.is_media() {
                return Err(EngineError::UnsupportedKind(audio.display().to_string()));
            }
            executor.run(&MediaRequest::ReplaceAudio {
                video: &read(&input)?,
                audio: &read(&audio)?,
                audio_kind,
            })
        }
    }
}

fn read_document(args: ReadArgs) -> Result<()> {
    let file = SourceFile::new(kind_of(&args.input)?, read(&args.input)?);
    let extraction = extract(&file, args.page)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
    } else {
        print!("{}", render(&extraction));
    }
    Ok(())
}

/// Plain-text rendering of an extraction for terminal output.
fn render(extraction: &Extraction) -> String {
    use wandelwerk_document::extract::slides::SlideContent;

    let mut out = String::new();
    match extraction {
        Extraction::Page {
            page,
            page_count,
            text,
        } => {
            out.push_str(&format!("Page {page} of {page_count}\n\n{text}\n"));
        }
        Extraction::Paragraphs { text } | Extraction::PlainText { text } => {
            out.push_str(text);
            out.push('\n');
        }
        Extraction::Slides { slides } => {
            for slide in slides {
                out.push_str(&format!("Slide {}\n", slide.number));
                match &slide.content {
                    SlideContent::Text(shapes) => {
                        for shape in shapes {
                            out.push_str(shape);
                            out.push('\n');
                        }
                    }
                    SlideContent::NoText => out.push_str("(no text)\n"),
                }
                out.push('\n');
            }
        }
        Extraction::Table {
            rows,
            columns,
            table,
        } => {
            out.push_str(&format!("{rows} rows x {columns} columns\n"));
            out.push_str(&table.headers.join("\t"));
            out.push('\n');
            for row in &table.rows {
                out.push_str(&row.join("\t"));
                out.push('\n');
            }
        }
    }
    out
}

fn kind_of(path: &Path) -> Result<SourceKind> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| EngineError::UnsupportedKind(path.display().to_string()))?;
    SourceKind::from_file_name(name)
}

/// Reject any path whose extension is not of the family `accepts` allows.
fn require_kind(paths: &[PathBuf], accepts: fn(&SourceKind) -> bool) -> Result<()> {
    for path in paths {
        if !accepts(&kind_of(path)?) {
            return Err(EngineError::UnsupportedKind(path.display().to_string()));
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}

fn read_all(paths: &[PathBuf]) -> Result<Vec<Vec<u8>>> {
    paths.iter().map(|path| read(path)).collect()
}

fn slices(buffers: &[Vec<u8>]) -> Vec<&[u8]> {
    buffers.iter().map(Vec::as_slice).collect()
}

fn write_artifact(artifact: &Artifact, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&artifact.file_name);
    fs::write(&path, &artifact.bytes)?;
    info!(
        path = %path.display(),
        content_type = artifact.content_type,
        bytes = artifact.bytes.len(),
        "Artifact written"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::ffi::OsString;

    #[test]
    fn vcard_command_writes_contacts_file() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("people.csv");
        fs::write(&csv, "Name,Phone\nAlice,123\n,456\n").unwrap();
        let out = dir.path().join("out");

        let cli = Cli::try_parse_from([
            OsString::from("wandelwerk"),
            "vcard".into(),
            csv.into_os_string(),
            "-o".into(),
            out.clone().into_os_string(),
        ])
        .unwrap();
        run(cli).unwrap();

        let written = fs::read_to_string(out.join("contacts.vcf")).unwrap();
        assert_eq!(
            written,
            "BEGIN:VCARD\nVERSION:3.0\nFN:Alice\nTEL;TYPE=CELL:123\nEND:VCARD\n"
        );
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert!(matches!(
            kind_of(Path::new("notes.xyz")),
            Err(EngineError::UnsupportedKind(_))
        ));
        assert_eq!(kind_of(Path::new("dir/Photo.JPG")).unwrap(), SourceKind::Jpeg);
    }

    #[test]
    fn images_command_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.csv");
        fs::write(&notes, "a,b\n").unwrap();

        let cli = Cli::try_parse_from([
            OsString::from("wandelwerk"),
            "images".into(),
            notes.into_os_string(),
            "-o".into(),
            dir.path().join("out").into_os_string(),
        ])
        .unwrap();
        assert!(matches!(run(cli), Err(EngineError::UnsupportedKind(ref name)) if name.ends_with("notes.csv")));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn kind_families_are_checked_per_path() {
        let images = [PathBuf::from("a.png"), PathBuf::from("b.JPEG")];
        require_kind(&images, SourceKind::is_image).unwrap();
        let mixed = [PathBuf::from("a.png"), PathBuf::from("clip.mp4")];
        assert!(matches!(
            require_kind(&mixed, SourceKind::is_image),
            Err(EngineError::UnsupportedKind(ref name)) if name == "clip.mp4"
        ));
        require_kind(&[PathBuf::from("clip.mp4"), PathBuf::from("song.mp3")], SourceKind::is_media)
            .unwrap();
        assert!(require_kind(&[PathBuf::from("scan.pdf")], SourceKind::is_media).is_err());
    }

    #[test]
    fn table_rendering_is_tab_separated() {
        let table = wandelwerk_document::extract::tabular::Table::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into(), "2".into()]],
        )
        .unwrap();
        let rendered = render(&Extraction::Table {
            rows: 1,
            columns: 2,
            table,
        });
        assert_eq!(rendered, "1 rows x 2 columns\na\tb\n1\t2\n");
    }
}
