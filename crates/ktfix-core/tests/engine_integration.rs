//! End-to-end runs of the engine over a small comment-aware tokenizer.

use ktfix_core::{
    Code, Engine, EngineError, NodeId, NodeKind, ParseError, Rule, RuleContext, RuleDescriptor,
    RuleError, RuleId, RuleProvider, RunAfterMode, SourceParser, Tree, TreeBuilder,
    UserOverrides, ViolationStatus,
};

/// Flat tree of words, whitespace and comments.
struct TokenParser;

impl SourceParser for TokenParser {
    fn parse(&self, source: &str) -> Result<Tree, ParseError> {
        let mut b = TreeBuilder::new(NodeKind::File, "source_file");
        let mut rest = source;
        while !rest.is_empty() {
            let (kind, len) = if rest.starts_with("//") {
                (NodeKind::LineComment, rest.find('\n').unwrap_or(rest.len()))
            } else if rest.starts_with("/*") {
                let end = rest
                    .find("*/")
                    .ok_or_else(|| ParseError::new(1, 1, "unterminated comment"))?;
                (NodeKind::BlockComment, end + 2)
            } else if rest.starts_with(char::is_whitespace) {
                let len = rest.len() - rest.trim_start().len();
                (NodeKind::Whitespace, len)
            } else {
                let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
                (NodeKind::Identifier, len)
            };
            b.leaf(kind, "token", &rest[..len]);
            rest = &rest[len..];
        }
        Ok(b.finish())
    }
}

/// Flags the word `foo` and renames it to `bar`.
struct NoFoo;

impl Rule for NoFoo {
    fn visit(&mut self, node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        if ctx.tree().kind(node) == NodeKind::Identifier && ctx.tree().leaf_text(node) == Some("foo") {
            let offset = ctx.tree().offset(node);
            if let Some(tree) = ctx.emit(offset, "Unexpected foo", true) {
                tree.set_text(node, "bar")?;
            }
        }
        Ok(())
    }
}

fn no_foo() -> RuleProvider {
    RuleProvider::new(RuleDescriptor::new(RuleId::standard("no-foo")), || {
        Box::new(NoFoo)
    })
}

fn engine() -> Engine {
    Engine::builder(TokenParser).rule(no_foo()).build()
}

fn lines_of(violations: &[ktfix_core::Violation]) -> Vec<usize> {
    violations.iter().map(|v| v.line).collect()
}

#[test]
fn lint_and_format_agree() {
    let code = Code::from_snippet("foo x\nfoo\n");
    let lint = engine().lint(&code).expect("lint");
    let format = engine().format(&code).expect("format");

    assert_eq!(lines_of(&lint.violations), [1, 2]);
    assert_eq!(format.corrected().count(), lint.count());
    assert_eq!(format.output, "bar x\nbar\n");
}

#[test]
fn format_is_idempotent() {
    let first = engine().format(&Code::from_snippet("foo foo\n")).expect("format");
    let second = engine()
        .format(&Code::from_snippet(first.output.as_str()))
        .expect("format");
    assert_eq!(second.output, first.output);
    assert!(!second.changed);
    assert!(second.violations.is_empty());
}

#[test]
fn runs_are_deterministic() {
    let code = Code::from_snippet("foo\n/* ktfix-disable no-foo */\nfoo\n");
    let engine = engine();
    assert_eq!(engine.format(&code).expect("format"), engine.format(&code).expect("format"));
    assert_eq!(engine.lint(&code).expect("lint"), engine.lint(&code).expect("lint"));
}

#[test]
fn block_markers_suppress_only_their_region() {
    let source = "foo\n\
                  /* ktfix-disable standard:no-foo */\n\
                  foo\n\
                  /* ktfix-enable standard:no-foo */\n\
                  foo\n";
    let code = Code::from_snippet(source);

    let lint = engine().lint(&code).expect("lint");
    assert_eq!(lines_of(&lint.violations), [1, 5]);
    assert_eq!(lines_of(&lint.suppressed), [3]);
    assert_eq!(lint.raw_count(), 3);

    let format = engine().format(&code).expect("format");
    assert_eq!(
        format.output,
        "bar\n\
         /* ktfix-disable standard:no-foo */\n\
         foo\n\
         /* ktfix-enable standard:no-foo */\n\
         bar\n"
    );
    assert_eq!(lines_of(&format.suppressed), [3]);
}

#[test]
fn line_marker_suppresses_its_line() {
    let code = Code::from_snippet("foo // ktfix-disable\nfoo\n");
    let lint = engine().lint(&code).expect("lint");
    assert_eq!(lines_of(&lint.violations), [2]);
    assert_eq!(lines_of(&lint.suppressed), [1]);
}

#[test]
fn unmatched_enable_is_reported_and_removed() {
    let code = Code::from_snippet("val a\n/* ktfix-enable */\nval b\n");

    let lint = engine().lint(&code).expect("lint");
    assert_eq!(lint.violations.len(), 1);
    let violation = &lint.violations[0];
    assert_eq!(violation.rule.as_str(), "standard:ktfix-suppression");
    assert_eq!((violation.line, violation.column), (2, 1));
    assert!(!violation.autocorrectable);
    assert_eq!(
        violation.message,
        "Directive 'ktfix-enable' is obsolete as no matching 'ktfix-disable' precedes it"
    );

    let format = engine().format(&code).expect("format");
    assert_eq!(format.output, "val a\nval b\n");
    assert_eq!(format.violations.len(), 1);
    assert_eq!(format.violations[0].status, ViolationStatus::Corrected);
    assert!(format.is_clean());
}

#[test]
fn line_marker_alone_on_its_line_is_reported_and_removed() {
    let code = Code::from_snippet("foo\n    // ktfix-disable standard:no-foo\nfoo\n");

    let lint = engine().lint(&code).expect("lint");
    assert_eq!(lines_of(&lint.violations), [1, 2, 3]);
    assert!(lint.suppressed.is_empty());
    let directive = &lint.violations[1];
    assert_eq!(directive.rule.as_str(), "standard:ktfix-suppression");
    assert_eq!((directive.line, directive.column), (2, 5));
    assert!(directive.autocorrectable);
    assert_eq!(
        directive.message,
        "Directive 'ktfix-disable' in EOL comment is ignored as it is not preceded by a code element"
    );

    let format = engine().format(&code).expect("format");
    assert_eq!(format.output, "bar\nbar\n");
    assert!(format.is_clean());
}

#[test]
fn unqualified_directive_id_is_qualified() {
    let code = Code::from_snippet("/* ktfix-disable no-foo */\nfoo\n");

    let lint = engine().lint(&code).expect("lint");
    assert_eq!(lint.violations.len(), 1);
    assert_eq!((lint.violations[0].line, lint.violations[0].column), (1, 18));
    assert_eq!(
        lint.violations[0].message,
        "Identifier to suppress rule must be fully qualified with the rule set id"
    );
    assert_eq!(lines_of(&lint.suppressed), [2]);

    let format = engine().format(&code).expect("format");
    assert_eq!(format.output, "/* ktfix-disable standard:no-foo */\nfoo\n");
}

#[test]
fn unknown_directive_id_is_reported() {
    let code = Code::from_snippet("/* ktfix-disable standard:ghost */\nfoo\n");
    let lint = engine().lint(&code).expect("lint");
    let messages: Vec<_> = lint.violations.iter().map(|v| v.message.as_str()).collect();
    assert_eq!(
        messages,
        ["Rule with id 'standard:ghost' is unknown or not loaded", "Unexpected foo"]
    );
}

#[test]
fn disabled_rule_does_not_run() {
    let code = Code::from_snippet("foo\n");
    let overrides = UserOverrides::new().with("ktfix_standard_no-foo", "disabled");
    let lint = engine().lint_with(&code, &overrides).expect("lint");
    assert!(lint.is_clean());
}

#[test]
fn cyclic_rules_abort_the_run() {
    let cyclic = |rule: &'static str, after: &'static str| {
        RuleProvider::new(
            RuleDescriptor::new(RuleId::standard(rule))
                .with_run_after(RuleId::standard(after), RunAfterMode::IfLoaded),
            || Box::new(NoFoo),
        )
    };
    let engine = Engine::builder(TokenParser)
        .rule(cyclic("first", "second"))
        .rule(cyclic("second", "first"))
        .build();
    let err = engine.lint(&Code::from_snippet("foo")).expect_err("cycle");
    assert_eq!(
        err.to_string(),
        "cyclic rule dependency: standard:first -> standard:second -> standard:first"
    );
}

#[test]
fn parse_errors_abort_the_run() {
    let err = engine()
        .format(&Code::from_snippet("foo /* open"))
        .expect_err("parse error");
    assert!(matches!(err, EngineError::Parse(_)));
}
