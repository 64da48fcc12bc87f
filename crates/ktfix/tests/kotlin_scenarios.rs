//! End-to-end runs of the standard rules on Kotlin sources.

use ktfix::rules::{annotation, backing_property_naming, no_empty_block_whitespace};
use ktfix::{Code, Engine, EngineError, KtFix, ViolationStatus};

fn engine() -> Engine {
    KtFix::standard().build()
}

fn positions(violations: &[ktfix::Violation]) -> Vec<(usize, usize, String)> {
    violations
        .iter()
        .map(|v| (v.line, v.column, v.rule.to_string()))
        .collect()
}

#[test]
fn annotations_and_empty_body() {
    let code = Code::from_snippet("@Foo @Bar class FooBar { }\n");

    let report = engine().lint(&code).expect("lint");
    assert_eq!(
        positions(&report.violations),
        [
            (1, 10, annotation::rule_id().to_string()),
            (1, 25, no_empty_block_whitespace::rule_id().to_string()),
        ]
    );

    let report = engine().format(&code).expect("format");
    assert_eq!(report.output, "@Foo @Bar\nclass FooBar {}\n");
    assert!(report.is_clean());
    assert_eq!(report.corrected().count(), 2);
}

#[test]
fn backing_property_with_public_counterpart() {
    let code = Code::from_snippet("class Foo {\n    private val _foo = 1\n    val foo = _foo\n}\n");
    assert!(engine().lint(&code).expect("lint").is_clean());
}

#[test]
fn backing_property_with_internal_counterpart() {
    let code = Code::from_snippet("class Foo {\n    private val _foo = 1\n    internal val foo = _foo\n}\n");

    let report = engine().lint(&code).expect("lint");
    assert_eq!(
        positions(&report.violations),
        [(2, 17, backing_property_naming::rule_id().to_string())]
    );

    let report = engine().format(&code).expect("format");
    assert!(!report.changed);
    assert_eq!(report.violations[0].status, ViolationStatus::Reported);
}

#[test]
fn fixes_whitespace_and_is_idempotent() {
    let source = "class A {  \n\n\n    val a = 1\n}\n\n\n";
    let once = engine().format(&Code::from_snippet(source)).expect("format");
    assert_eq!(once.output, "class A {\n\n    val a = 1\n}\n");

    let twice = engine().format(&Code::from_snippet(once.output.as_str())).expect("format");
    assert!(!twice.changed);
    assert_eq!(twice.output, once.output);
}

#[test]
fn lint_and_format_agree() {
    let source = "@Foo @Bar class FooBar { }\nclass B {   }\n";
    let lint = engine().lint(&Code::from_snippet(source)).expect("lint");
    let format = engine().format(&Code::from_snippet(source)).expect("format");

    let mut reported: Vec<_> = lint
        .violations
        .iter()
        .filter(|v| v.autocorrectable)
        .map(|v| v.rule.clone())
        .collect();
    let mut corrected: Vec<_> = format.corrected().map(|v| v.rule.clone()).collect();
    reported.sort();
    corrected.sort();
    assert_eq!(reported, corrected);
    assert_eq!(format.output, "@Foo @Bar\nclass FooBar {}\nclass B {}\n");
}

#[test]
fn block_markers_suppress_a_rule() {
    let source = "\
/* ktfix-disable standard:no-empty-block-whitespace */
class A { }
/* ktfix-enable standard:no-empty-block-whitespace */
class B { }
";
    let report = engine().lint(&Code::from_snippet(source)).expect("lint");
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].line, 4);
    assert_eq!(report.suppressed.len(), 1);
    assert_eq!(report.raw_count(), 2);

    let report = engine().format(&Code::from_snippet(source)).expect("format");
    assert!(report.output.contains("class A { }\n"));
    assert!(report.output.contains("class B {}\n"));
}

#[test]
fn crlf_input_keeps_its_line_separator() {
    let report = engine()
        .format(&Code::from_snippet("class A { }\r\n"))
        .expect("format");
    assert_eq!(report.output, "class A {}\r\n");
}

#[test]
fn syntax_errors_abort_the_run() {
    let result = engine().lint(&Code::from_snippet("class A {\n"));
    assert!(matches!(result, Err(EngineError::Parse(_))));
}
