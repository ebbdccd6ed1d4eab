use std::fs;
use std::path::Path;

use gtml_cli::{build, collect_sources, BuildConfig};
use pretty_assertions::assert_eq;

const GREETING: &str = r#"<p _component="Greeting">
    Hello {{ name }}
    <b _if="excited">!</b>
</p>
"#;

const PAGE: &str = r#"<main _component="Page">
    <greeting excited="true" name="Sam"></greeting>
</main>
"#;

fn write(dir: &Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn config(input: &Path, output: &Path) -> BuildConfig {
    BuildConfig {
        input_dir: input.to_path_buf(),
        output_file: output.to_path_buf(),
        package_name: "views".to_string(),
        watch: false,
    }
}

#[test]
fn build_writes_go_file() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(input.path(), "greeting.html", GREETING);
    write(input.path(), "pages/page.html", PAGE);
    let output = out.path().join("gen/views.go");

    let report = build(&config(input.path(), &output)).expect("build");
    assert_eq!(report.files, 2);
    assert_eq!(report.components, 2);

    let go = fs::read_to_string(&output).expect("read output");
    assert!(go.starts_with("// Code generated by gtml. DO NOT EDIT.\n\npackage views\n"));
    assert!(go.contains("func Greeting(name string, excited bool) string {"));
    assert!(go.contains("return Greeting(\"Sam\", true)"));
}

#[test]
fn sources_are_sorted_and_filtered() {
    let input = tempfile::tempdir().unwrap();
    write(input.path(), "b.html", "<p></p>");
    write(input.path(), "a/z.html", "<p></p>");
    write(input.path(), "notes.txt", "ignored");

    let names: Vec<_> = collect_sources(input.path())
        .unwrap()
        .iter()
        .map(|p| p.strip_prefix(input.path()).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(names, vec!["a/z.html", "b.html"]);
}

#[test]
fn failed_build_keeps_previous_output() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("views.go");
    fs::write(&output, "previous").unwrap();

    write(
        input.path(),
        "list.html",
        "<ul _component=\"List\"><li _for=\"x items []X\"></li></ul>",
    );
    let err = build(&config(input.path(), &output)).unwrap_err();
    assert!(err.to_string().contains("list.html"));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous");
}

#[test]
fn missing_placeholder_argument_fails() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(input.path(), "greeting.html", GREETING);
    write(
        input.path(),
        "page.html",
        "<main _component=\"Page\"><greeting name=\"Sam\"></greeting></main>",
    );
    let output = out.path().join("views.go");

    let err = build(&config(input.path(), &output)).unwrap_err();
    assert!(err.to_string().contains("Missing required attribute"));
    assert!(!output.exists());
}
