//! Build driver behind the `gtml` command.
//!
//! Collects `*.html` templates under an input directory, compiles them to a
//! single Go file and writes it atomically. Watch mode repeats the build
//! whenever a template changes.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, SystemTime};

use anyhow::{bail, Context, Result};
use gtml_codegen::{compile, go};
use gtml_parser::ComponentSet;
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Everything one build needs, as given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub input_dir: PathBuf,
    pub output_file: PathBuf,
    pub package_name: String,
    pub watch: bool,
}

impl BuildConfig {
    /// Reject settings that cannot produce a usable Go file.
    pub fn validate(&self) -> Result<()> {
        if !go::is_package_name(&self.package_name) {
            bail!(
                "'{}' is not a valid Go package name",
                self.package_name
            );
        }
        if !self.input_dir.is_dir() {
            bail!("input directory {} does not exist", self.input_dir.display());
        }
        Ok(())
    }
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub files: usize,
    pub components: usize,
    pub output: PathBuf,
}

/// Every `*.html` file below `input_dir`, sorted by path.
pub fn collect_sources(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(input_dir) {
        let entry = entry.with_context(|| format!("failed to walk {}", input_dir.display()))?;
        if entry.file_type().is_file() && is_template(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

fn is_template(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "html")
}

/// Compile the templates of `config` into the contents of the Go file.
pub fn render(config: &BuildConfig) -> Result<(String, BuildReport)> {
    let paths = collect_sources(&config.input_dir)?;
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let label = path
            .strip_prefix(&config.input_dir)
            .unwrap_or(path)
            .display()
            .to_string();
        files.push((label, contents));
    }

    let set = ComponentSet::parse(files.iter().map(|(l, c)| (l.as_str(), c.as_str())))?;
    let funcs = compile(&set)?;
    let output = go::render_file(&config.package_name, &funcs);

    Ok((
        output,
        BuildReport {
            files: paths.len(),
            components: funcs.len(),
            output: config.output_file.clone(),
        },
    ))
}

/// Run one build. On failure the previous output file is left untouched.
pub fn build(config: &BuildConfig) -> Result<BuildReport> {
    let (output, report) = render(config)?;
    write_atomic(&config.output_file, &output)?;
    info!(
        files = report.files,
        components = report.components,
        output = %report.output.display(),
        "build finished"
    );
    Ok(report)
}

/// Write `contents` to a temporary file next to `path`, then move it into place.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create a temporary file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .context("failed to write generated code")?;
    tmp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), bytes = contents.len(), "output written");
    Ok(())
}

/// Build, then rebuild on every template change until the watcher stops.
/// Build errors are logged and do not end the loop.
pub fn watch(config: &BuildConfig) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut debouncer =
        new_debouncer(Duration::from_millis(300), tx).context("failed to start file watcher")?;
    debouncer
        .watcher()
        .watch(&config.input_dir, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", config.input_dir.display()))?;

    info!(dir = %config.input_dir.display(), "watching for changes");
    let mut since = SystemTime::now();
    rebuild(config);

    loop {
        match rx.recv() {
            Ok(Ok(events)) if has_template_change(&events, since) => {
                info!("template changed, rebuilding");
                since = SystemTime::now();
                rebuild(config);
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(error = %e, "watcher error"),
            Err(_) => bail!("file watcher disconnected"),
        }
    }
}

fn rebuild(config: &BuildConfig) {
    if let Err(e) = build(config) {
        error!("{e:#}");
    }
}

/// Reading files can also raise events, so a change only counts when the
/// template was modified after `since`.
fn has_template_change(events: &[DebouncedEvent], since: SystemTime) -> bool {
    events.iter().any(|event| {
        event.kind == DebouncedEventKind::Any
            && is_template(&event.path)
            && modified_since(&event.path, since)
    })
}

fn modified_since(path: &Path, since: SystemTime) -> bool {
    match path.metadata().and_then(|m| m.modified()) {
        Ok(mtime) => mtime > since,
        // Removed templates change the build too.
        Err(_) => true,
    }
}
