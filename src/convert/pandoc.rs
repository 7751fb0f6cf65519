//! Word-processor document conversion through pandoc.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use walkdir::WalkDir;

use super::process::{Invocation, ProcessRunner};
use crate::error::{Error, Result};

/// File name of the converter output inside the work directory.
pub const CONVERTED_FILE: &str = "converted.tex";

/// Folder that `--extract-media` creates inside the work directory.
pub const EXTRACTED_MEDIA_DIR: &str = "media";

/// Archive folder holding embedded media in a DOCX package.
const MEDIA_PREFIX: &str = "word/media/";

/// Build the converter command line.
pub fn conversion_invocation(
    program: &str,
    input: &Path,
    output: &Path,
    media_dir: &Path,
    timeout: Option<Duration>,
) -> Invocation {
    let invocation = Invocation::new(program)
        .path_arg(input)
        .arg("-o")
        .path_arg(output)
        .arg("--to=latex")
        .arg("--standalone")
        .arg("--extract-media")
        .path_arg(media_dir);

    match timeout {
        Some(t) => invocation.timeout(t),
        None => invocation,
    }
}

/// Convert `input` to standalone LaTeX in `work_dir`.
///
/// Returns the path of the converted file. A non-zero exit, a timeout or a
/// missing output file is an [`Error::Process`] carrying the tool's stderr.
pub fn convert_document<R: ProcessRunner>(
    runner: &R,
    program: &str,
    input: &Path,
    work_dir: &Path,
    timeout: Option<Duration>,
) -> Result<PathBuf> {
    let output = work_dir.join(CONVERTED_FILE);
    let invocation = conversion_invocation(program, input, &output, work_dir, timeout);
    log::info!("Converting {} with {}", input.display(), program);

    let result = runner.run(&invocation)?;
    if result.timed_out {
        return Err(Error::process(
            program,
            format!("timed out after {:?}", timeout.unwrap_or_default()),
        ));
    }
    if !result.success() {
        return Err(Error::process(
            program,
            format!(
                "exit status {}: {}",
                result
                    .status
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "unknown".into()),
                result.diagnostic()
            ),
        ));
    }
    if !output.exists() {
        return Err(Error::process(
            program,
            format!("no output written to {}", output.display()),
        ));
    }

    Ok(output)
}

/// Copy every `word/media/*` entry of a DOCX archive into `dest`.
///
/// Entries are flattened to their file names. Returns the number of files
/// written.
pub fn extract_media(docx: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(docx)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut count = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || !entry.name().starts_with(MEDIA_PREFIX) {
            continue;
        }

        let file_name = match Path::new(entry.name()).file_name() {
            Some(name) => name.to_os_string(),
            None => continue,
        };

        if count == 0 {
            fs::create_dir_all(dest)?;
        }
        let target = dest.join(&file_name);
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        log::debug!("Extracted {}", target.display());
        count += 1;
    }

    if count == 0 {
        log::debug!("No embedded media in {}", docx.display());
    }
    Ok(count)
}

/// Flatten the files pandoc extracted under `<work_dir>/media` into `dest`.
///
/// Existing files in `dest` are not overwritten. Returns the number of files
/// copied.
pub fn collect_extracted_media(work_dir: &Path, dest: &Path) -> Result<usize> {
    let media = work_dir.join(EXTRACTED_MEDIA_DIR);
    if !media.is_dir() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in WalkDir::new(&media).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let target = dest.join(entry.file_name());
        if target.exists() {
            continue;
        }
        fs::create_dir_all(dest)?;
        fs::copy(entry.path(), &target)?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_docx(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_conversion_invocation() {
        let inv = conversion_invocation(
            "pandoc",
            Path::new("in.docx"),
            Path::new("work/converted.tex"),
            Path::new("work"),
            Some(Duration::from_secs(60)),
        );
        assert_eq!(
            inv.args,
            vec![
                "in.docx",
                "-o",
                "work/converted.tex",
                "--to=latex",
                "--standalone",
                "--extract-media",
                "work"
            ]
        );
        assert_eq!(inv.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_extract_media() {
        let dir = tempfile::tempdir().unwrap();
        let docx = dir.path().join("paper.docx");
        write_docx(
            &docx,
            &[
                ("word/document.xml", b"<w:document/>"),
                ("word/media/image1.png", b"png-bytes"),
                ("word/media/image2.jpeg", b"jpeg-bytes"),
                ("docProps/thumbnail.jpeg", b"thumb"),
            ],
        );

        let dest = dir.path().join("images");
        let count = extract_media(&docx, &dest).unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read(dest.join("image1.png")).unwrap(), b"png-bytes");
        assert!(dest.join("image2.jpeg").exists());
        assert!(!dest.join("thumbnail.jpeg").exists());
    }

    #[test]
    fn test_extract_media_without_media() {
        let dir = tempfile::tempdir().unwrap();
        let docx = dir.path().join("plain.docx");
        write_docx(&docx, &[("word/document.xml", b"<w:document/>")]);

        let dest = dir.path().join("images");
        assert_eq!(extract_media(&docx, &dest).unwrap(), 0);
        assert!(!dest.exists());
    }

    #[test]
    fn test_extract_media_not_an_archive() {
        let dir = tempfile::tempdir().unwrap();
        let docx = dir.path().join("broken.docx");
        fs::write(&docx, b"not a zip").unwrap();
        assert!(matches!(
            extract_media(&docx, dir.path()),
            Err(Error::Archive(_))
        ));
    }

    #[test]
    fn test_collect_extracted_media() {
        let work = tempfile::tempdir().unwrap();
        let nested = work.path().join("media").join("sub");
        fs::create_dir_all(&nested).unwrap();
        fs::write(work.path().join("media").join("a.png"), "a").unwrap();
        fs::write(nested.join("b.png"), "b").unwrap();

        let dest = work.path().join("images");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("a.png"), "from archive").unwrap();

        assert_eq!(collect_extracted_media(work.path(), &dest).unwrap(), 1);
        assert_eq!(fs::read_to_string(dest.join("a.png")).unwrap(), "from archive");
        assert_eq!(fs::read_to_string(dest.join("b.png")).unwrap(), "b");
    }

    #[test]
    fn test_collect_without_media_dir() {
        let work = tempfile::tempdir().unwrap();
        let dest = work.path().join("images");
        assert_eq!(collect_extracted_media(work.path(), &dest).unwrap(), 0);
        assert!(!dest.exists());
    }
}
