use pretty_assertions::assert_eq;
use readme_extract::{
    extract_from_path, extract_from_reader, extract_from_str, render_document, DocLine, Marker,
    PayloadMode, DEFAULT_HEADER,
};
use std::io::ErrorKind;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn payloads(lines: &[DocLine]) -> Vec<&str> {
    lines.iter().map(|line| line.payload.as_str()).collect()
}

#[test]
fn should_extract_trimmed_payloads_in_source_order() {
    // Given
    let path = fixture_path("lib_docs.rs");

    // When
    let lines = extract_from_path(&path, &Marker::default(), PayloadMode::Trimmed).unwrap();

    // Then
    assert_eq!(
        payloads(&lines),
        vec![
            "**Pixel buffers as a 3D array.**",
            "",
            "## Usage",
            "Indented continuation.",
            "```rust",
            "let x = 1;",
            "```",
            "trailing",
        ]
    );
    assert_eq!(lines.last().unwrap().line, 13);
}

#[test]
fn should_keep_whitespace_in_verbatim_mode() {
    // Given
    let path = fixture_path("lib_docs.rs");

    // When
    let lines = extract_from_path(&path, &Marker::default(), PayloadMode::Verbatim).unwrap();

    // Then
    assert_eq!(lines[0].payload, " **Pixel buffers as a 3D array.**");
    assert_eq!(lines[1].payload, "");
    assert_eq!(lines[3].payload, "   Indented continuation.  ");
    assert_eq!(lines[4].payload, " ```rust");
    assert_eq!(lines[5].payload, "let x = 1;");
}

#[test]
fn should_render_concrete_scenario_for_both_modes() {
    // Given
    let source = "//! Hello\ncode line\n//!   World  \n";
    let marker = Marker::default();

    // When
    let trimmed = extract_from_str(source, &marker, PayloadMode::Trimmed);
    let verbatim = extract_from_str(source, &marker, PayloadMode::Verbatim);

    // Then
    assert_eq!(
        render_document(DEFAULT_HEADER, &trimmed),
        "# softbuffer-rgb\n\nHello\nWorld"
    );
    assert_eq!(
        render_document(DEFAULT_HEADER, &verbatim),
        "# softbuffer-rgb\n\n Hello\n   World  "
    );
}

#[test]
fn should_not_leak_carriage_returns_into_payloads() {
    // Given
    let source = "//! one \r\n//! two\r\n";

    // When
    let lines = extract_from_str(source, &Marker::default(), PayloadMode::Verbatim);

    // Then
    assert_eq!(payloads(&lines), vec![" one ", " two"]);
}

#[test]
fn should_produce_header_only_document_without_markers() {
    // Given
    let mut reader = "fn main() {}\nlet a = \"//! inside a string\";\n".as_bytes();

    // When
    let lines =
        extract_from_reader(&mut reader, &Marker::default(), PayloadMode::Trimmed).unwrap();

    // Then
    assert!(lines.is_empty());
    assert_eq!(render_document(DEFAULT_HEADER, &lines), "# softbuffer-rgb\n\n");
}

#[test]
fn should_fail_for_missing_source() {
    let path = fixture_path("does_not_exist.rs");
    let err = extract_from_path(&path, &Marker::default(), PayloadMode::Trimmed).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn should_support_custom_markers() {
    let marker = Marker::new("///").unwrap();
    let lines = extract_from_str("/// item docs\n//! crate docs\n", &marker, PayloadMode::Trimmed);
    assert_eq!(payloads(&lines), vec!["item docs"]);
}
