//! Integration tests for template layout detection.

use std::fs;

use camready::{detect_layout, detect_layout_detailed, LayoutMode, LayoutSource};

fn template_dir(main_tex: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.tex"), main_tex).unwrap();
    dir
}

#[test]
fn test_document_class_beats_class_defaults() {
    let dir = template_dir(
        "\\documentclass[twocolumn]{custom}\n\\begin{document}\n\\end{document}\n",
    );
    fs::write(
        dir.path().join("custom.cls"),
        "\\ExecuteOptions{onecolumn}\n\\ProcessOptions\n",
    )
    .unwrap();

    let detection = detect_layout_detailed(dir.path().join("main.tex"));
    assert_eq!(detection.layout, LayoutMode::MultiColumn);
    assert_eq!(detection.source, LayoutSource::DocumentClass);
    assert_eq!(detection.class_file, Some(dir.path().join("custom.cls")));
}

#[test]
fn test_class_defaults_used_without_option() {
    let dir = template_dir("\\documentclass{acmart}\n");
    fs::write(
        dir.path().join("acmart.cls"),
        "\\DeclareOption{onecolumn}{\\@twocolumnfalse}\n\\ExecuteOptions{letterpaper,twocolumn,10pt}\n",
    )
    .unwrap();

    let detection = detect_layout_detailed(dir.path().join("main.tex"));
    assert_eq!(detection.layout, LayoutMode::MultiColumn);
    assert_eq!(
        detection.source,
        LayoutSource::ClassDefaults(dir.path().join("acmart.cls"))
    );
}

#[test]
fn test_class_file_in_subdirectory() {
    let dir = template_dir("\\documentclass{llncs}\n");
    fs::create_dir(dir.path().join("styles")).unwrap();
    fs::write(
        dir.path().join("styles").join("llncs.CLS"),
        "\\ExecuteOptions{twocolumn}\n",
    )
    .unwrap();

    assert_eq!(detect_layout(dir.path().join("main.tex")), LayoutMode::MultiColumn);
}

#[test]
fn test_top_level_class_file_preferred() {
    let dir = template_dir("\\documentclass{paper}\n");
    fs::write(dir.path().join("paper.cls"), "\\ExecuteOptions{onecolumn}\n").unwrap();
    fs::create_dir(dir.path().join("alt")).unwrap();
    fs::write(dir.path().join("alt").join("alt.cls"), "\\ExecuteOptions{twocolumn}\n").unwrap();

    let detection = detect_layout_detailed(dir.path().join("main.tex"));
    assert_eq!(detection.layout, LayoutMode::SingleColumn);
    assert_eq!(detection.class_file, Some(dir.path().join("paper.cls")));
}

#[test]
fn test_commented_options_ignored() {
    let dir = template_dir(
        "%\\documentclass[twocolumn]{article}\n\\documentclass[a4paper]{article}\n",
    );
    fs::write(
        dir.path().join("article.cls"),
        "% \\ExecuteOptions{twocolumn}\n\\ExecuteOptions{a4paper}\n",
    )
    .unwrap();

    let detection = detect_layout_detailed(dir.path().join("main.tex"));
    assert_eq!(detection.layout, LayoutMode::SingleColumn);
    assert_eq!(detection.source, LayoutSource::Default);
}

#[test]
fn test_default_without_class_file() {
    let dir = template_dir("\\documentclass{article}\n");

    let detection = detect_layout_detailed(dir.path().join("main.tex"));
    assert_eq!(detection.layout, LayoutMode::SingleColumn);
    assert_eq!(detection.source, LayoutSource::Default);
    assert_eq!(detection.class_file, None);
}

#[test]
fn test_missing_template_never_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        detect_layout(dir.path().join("absent.tex")),
        LayoutMode::SingleColumn
    );
}

#[test]
fn test_missing_template_still_reads_class_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("conf.cls"), "\\ExecuteOptions{twocolumn}\n").unwrap();

    assert_eq!(
        detect_layout(dir.path().join("absent.tex")),
        LayoutMode::MultiColumn
    );
}
