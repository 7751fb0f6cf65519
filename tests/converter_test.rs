//! Integration tests for the conversion pipeline.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use camready::convert::CONVERTED_FILE;
use camready::{
    ConvertOptions, Converter, Error, Invocation, LayoutMode, ProcessOutput, ProcessRunner,
    RepairOptions, Result,
};

const CONVERTED: &str = "\\documentclass{article}
\\usepackage{longtable,booktabs}
\\begin{document}
Results are shown below.

\\begin{longtable}[]{@{}ll@{}}
\\toprule\\noalign{}
Model & Accuracy \\\\
\\midrule\\noalign{}
\\endhead
\\bottomrule\\noalign{}
\\endlastfoot
CNN & 0.91 \\\\
RNN & 0.87 \\\\
\\end{longtable}

\\includegraphics[width=0.9\\textwidth]{/tmp/work/media/image1.png}
\\end{document}
";

/// Scripted stand-in for pandoc and pdflatex.
struct MockRunner {
    installed: Vec<&'static str>,
    converted: String,
    write_pdf: bool,
    converter_exit: i32,
    extracted: Vec<&'static str>,
    calls: RefCell<Vec<Invocation>>,
}

impl MockRunner {
    fn new() -> Self {
        Self {
            installed: vec!["pandoc", "pdflatex"],
            converted: CONVERTED.to_string(),
            write_pdf: true,
            converter_exit: 0,
            extracted: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn programs(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.program.clone()).collect()
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.calls.borrow_mut().push(invocation.clone());

        match invocation.program.as_str() {
            "pandoc" => {
                if self.converter_exit != 0 {
                    return Ok(ProcessOutput::exited(
                        self.converter_exit,
                        "",
                        "pandoc: Unknown input format",
                    ));
                }
                let pos = invocation.args.iter().position(|a| a == "-o").unwrap();
                fs::write(&invocation.args[pos + 1], &self.converted)?;

                let pos = invocation
                    .args
                    .iter()
                    .position(|a| a == "--extract-media")
                    .unwrap();
                let media = Path::new(&invocation.args[pos + 1]).join("media");
                for name in &self.extracted {
                    fs::create_dir_all(&media)?;
                    fs::write(media.join(name), name.as_bytes())?;
                }
                Ok(ProcessOutput::exited(0, "", ""))
            }
            "pdflatex" => {
                let dir = invocation.cwd.clone().unwrap_or_default();
                let name = invocation.args.last().unwrap();
                if self.write_pdf {
                    let pdf = Path::new(name).with_extension("pdf");
                    fs::write(dir.join(pdf), "%PDF-1.5")?;
                }
                Ok(ProcessOutput::exited(1, "! Undefined control sequence.", ""))
            }
            other => panic!("unexpected program {}", other),
        }
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.installed
            .contains(&program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }
}

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new(template: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("paper.docx"), b"not really a docx").unwrap();
        fs::create_dir(dir.path().join("template")).unwrap();
        fs::write(dir.path().join("template").join("main.tex"), template).unwrap();
        Self { dir }
    }

    fn options(&self) -> ConvertOptions {
        ConvertOptions::new(
            self.dir.path().join("paper.docx"),
            self.dir.path().join("template").join("main.tex"),
        )
        .with_output_dir(self.output())
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }
}

const TWO_COLUMN_TEMPLATE: &str = "\\documentclass[conference,twocolumn]{IEEEtran}
\\usepackage{amsmath}
\\begin{document}
\\title{Template}
\\end{document}
";

#[test]
fn test_full_pipeline() {
    let fixture = Fixture::new(TWO_COLUMN_TEMPLATE);
    let runner = MockRunner::new();

    let report = Converter::with_runner(fixture.options(), &runner)
        .convert()
        .unwrap();

    assert_eq!(report.layout, LayoutMode::MultiColumn);
    assert_eq!(report.stats.tables_rewritten, 1);
    assert_eq!(report.stats.images_wrapped, 1);
    assert_eq!(runner.programs(), vec!["pandoc", "pdflatex", "pdflatex"]);

    let tex = fs::read_to_string(fixture.output().join("paper.tex")).unwrap();
    assert!(tex.starts_with("\\documentclass[conference,twocolumn]{IEEEtran}\n\\usepackage{amsmath}\n\\usepackage{graphicx}\n\\usepackage{booktabs}\n\n\\begin{document}\n"));
    assert!(!tex.contains("\\title{Template}"));
    assert!(!tex.contains("\\toprule"));
    assert!(!tex.contains("Model & Accuracy"));
    assert!(tex.contains("CNN & 0.91 \\\\\nRNN & 0.87 \\\\\n\\end{longtable}"));
    assert!(tex.contains(
        "\\begin{figure}[htbp]\n\\centering\n\\includegraphics[width=0.48\\textwidth]{images/image1.png}\n\\end{figure}"
    ));

    // pdflatex exited 1 both times, but the PDF exists
    assert_eq!(
        report.pdf_path(),
        Some(fixture.output().join("paper.pdf").as_path())
    );
}

#[test]
fn test_converter_invocation() {
    let fixture = Fixture::new(TWO_COLUMN_TEMPLATE);
    let runner = MockRunner::new();

    Converter::with_runner(fixture.options().with_pdf(false), &runner)
        .convert()
        .unwrap();

    let calls = runner.calls.borrow();
    assert_eq!(calls.len(), 1);
    let args = &calls[0].args;
    assert_eq!(args[0], fixture.dir.path().join("paper.docx").to_string_lossy());
    assert_eq!(args[1], "-o");
    assert!(args[2].ends_with(CONVERTED_FILE));
    assert_eq!(&args[3..6], &["--to=latex", "--standalone", "--extract-media"]);
}

#[test]
fn test_missing_dependency_leaves_output_untouched() {
    let fixture = Fixture::new(TWO_COLUMN_TEMPLATE);
    let mut runner = MockRunner::new();
    runner.installed = vec!["pandoc"];

    let result = Converter::with_runner(fixture.options(), &runner).convert();

    match result {
        Err(Error::MissingDependency(program)) => assert_eq!(program, "pdflatex"),
        other => panic!("expected missing dependency, got {:?}", other.map(|r| r.tex_path)),
    }
    assert!(!fixture.output().exists());
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_typesetter_not_required_without_pdf() {
    let fixture = Fixture::new(TWO_COLUMN_TEMPLATE);
    let mut runner = MockRunner::new();
    runner.installed = vec!["pandoc"];

    let report = Converter::with_runner(fixture.options().with_pdf(false), &runner)
        .convert()
        .unwrap();
    assert!(report.typeset.is_none());
    assert!(fixture.output().join("paper.tex").exists());
}

#[test]
fn test_missing_input() {
    let fixture = Fixture::new(TWO_COLUMN_TEMPLATE);
    fs::remove_file(fixture.dir.path().join("paper.docx")).unwrap();
    let runner = MockRunner::new();

    let result = Converter::with_runner(fixture.options(), &runner).convert();
    assert!(matches!(result, Err(Error::MissingInput(_))));
    assert!(!fixture.output().exists());
}

#[test]
fn test_converter_failure_is_fatal() {
    let fixture = Fixture::new(TWO_COLUMN_TEMPLATE);
    let mut runner = MockRunner::new();
    runner.converter_exit = 64;

    let result = Converter::with_runner(fixture.options(), &runner).convert();
    match result {
        Err(Error::Process { program, message }) => {
            assert_eq!(program, "pandoc");
            assert!(message.contains("Unknown input format"));
        }
        other => panic!("expected process error, got {:?}", other.map(|r| r.tex_path)),
    }
    assert!(!fixture.output().join("paper.tex").exists());
}

#[test]
fn test_no_pdf_is_not_an_error() {
    let fixture = Fixture::new(TWO_COLUMN_TEMPLATE);
    let mut runner = MockRunner::new();
    runner.write_pdf = false;

    let report = Converter::with_runner(fixture.options(), &runner)
        .convert()
        .unwrap();

    let typeset = report.typeset.as_ref().unwrap();
    assert!(!typeset.succeeded());
    assert_eq!(typeset.passes, 2);
    assert!(!typeset.diagnostics.is_empty());
    assert!(report.tex_path.exists());
}

#[test]
fn test_template_without_begin_document() {
    let fixture = Fixture::new("\\documentclass{article}\n\\usepackage{graphicx}\n");
    let mut runner = MockRunner::new();
    runner.converted = "Plain body with \\includegraphics{fig.png}".to_string();

    let report = Converter::with_runner(fixture.options().with_pdf(false), &runner)
        .convert()
        .unwrap();

    let tex = fs::read_to_string(report.tex_path).unwrap();
    assert_eq!(
        tex,
        "\\documentclass{article}\n\\usepackage{graphicx}\n\\usepackage{booktabs}\n\n\\begin{document}\nPlain body with \\includegraphics[width=0.8\\textwidth]{images/fig.png}\n\\end{document}"
    );
}

#[test]
fn test_forced_layout_overrides_template() {
    let fixture = Fixture::new(TWO_COLUMN_TEMPLATE);
    let runner = MockRunner::new();
    let options = fixture
        .options()
        .with_pdf(false)
        .with_repair(RepairOptions::new().with_layout(LayoutMode::SingleColumn));

    let report = Converter::with_runner(options, &runner).convert().unwrap();
    assert_eq!(report.layout, LayoutMode::SingleColumn);
    assert_eq!(report.stats.images_wrapped, 0);
}

#[test]
fn test_media_copied_and_replaced() {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let fixture = Fixture::new(TWO_COLUMN_TEMPLATE);
    let docx = fixture.dir.path().join("paper.docx");
    let mut zip = zip::ZipWriter::new(fs::File::create(&docx).unwrap());
    zip.start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"<w:document/>").unwrap();
    zip.start_file("word/media/image1.png", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"new-png").unwrap();
    zip.finish().unwrap();

    let stale = fixture.output().join("images");
    fs::create_dir_all(&stale).unwrap();
    fs::write(stale.join("old.png"), "old").unwrap();

    let runner = MockRunner::new();
    let report = Converter::with_runner(fixture.options().with_pdf(false), &runner)
        .convert()
        .unwrap();

    assert_eq!(report.images_copied, 1);
    assert_eq!(fs::read(stale.join("image1.png")).unwrap(), b"new-png");
    assert!(!stale.join("old.png").exists());
}

#[test]
fn test_converter_media_used_when_archive_unreadable() {
    let fixture = Fixture::new(TWO_COLUMN_TEMPLATE);
    let mut runner = MockRunner::new();
    runner.extracted = vec!["image1.png", "image2.jpeg"];

    let report = Converter::with_runner(fixture.options().with_pdf(false), &runner)
        .convert()
        .unwrap();

    let images = fixture.output().join("images");
    assert_eq!(report.images_copied, 2);
    assert_eq!(report.images_dir.as_deref(), Some(images.as_path()));
    assert_eq!(fs::read(images.join("image2.jpeg")).unwrap(), b"image2.jpeg");
}
