//! End-to-end scenarios over the sample projects in `fixtures/`.

use pretty_assertions::assert_eq;
use varimap_config::{AliasEntry, VarimapConfig};
use varimap_core::{AliasPolicy, DiagnosticKind, DialectKind, Formula, Location, Symbol};
use varimap_dialect::SourceFile;
use varimap_engine::{AnalysisOptions, AnalysisReport, Analyzer};

const IO_FILE: &str = include_str!("../../../fixtures/busybox-sample/src/io-file.c");
const MAIN_C: &str = include_str!("../../../fixtures/busybox-sample/src/main.c");
const GETS_C: &str = include_str!("../../../fixtures/toybox-sample/toys/example/gets.c");
const MAIN_CPP: &str = include_str!("../../../fixtures/fiasco-sample/src/sample/main.cpp");

fn analyze(files: &[(&str, &str)]) -> AnalysisReport {
    analyze_with(AnalysisOptions::default(), files)
}

fn analyze_with(options: AnalysisOptions, files: &[(&str, &str)]) -> AnalysisReport {
    let sources: Vec<SourceFile> = files
        .iter()
        .map(|(path, content)| SourceFile::new(*path, *content))
        .collect();
    Analyzer::new(options).analyze(&sources).unwrap()
}

fn v(name: &str) -> Formula {
    Formula::var(name)
}

// ── busybox ─────────────────────────────────────────────────────────────

#[test]
fn busybox_chmod_condition_and_closure() {
    let report = analyze(&[("src/io-file.c", IO_FILE)]);
    let file = report.file("src/io-file.c").unwrap();

    assert_eq!(file.dialect, DialectKind::Kbuild);
    assert!(!file.fallback);
    assert_eq!(file.condition_at(22), Some(&v("PERFORM_CHMOD")));
    assert_eq!(file.condition_at(25), Some(&v("PERFORM_RENAME")));
    assert_eq!(file.condition_at(21), Some(&Formula::True));
    assert_eq!(file.file_condition, v("INCLUDE_IO_FILE"));

    let model = report.model();
    let closure: Vec<String> = model
        .dependency_closure("PERFORM_CHMOD")
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(closure, vec!["INCLUDE_IO_FILE".to_string()]);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn busybox_declarations() {
    let report = analyze(&[("src/io-file.c", IO_FILE)]);
    let names: Vec<&str> = report.features.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["INCLUDE_IO_FILE", "PERFORM_CHMOD", "PERFORM_RENAME"]);

    let include = &report.features[0];
    assert_eq!(
        include.default,
        varimap_core::DefaultValue::Value(varimap_core::Tristate::Yes)
    );
    assert_eq!(include.origin, Location::at("src/io-file.c", 1));
    assert_eq!(report.features[1].depends, Some(v("INCLUDE_IO_FILE")));
}

// ── main.c naming families ──────────────────────────────────────────────

#[test]
fn main_c_keeps_naming_families_apart() {
    let report = analyze(&[("src/main.c", MAIN_C)]);
    let file = report.file("src/main.c").unwrap();

    assert_eq!(file.dialect, DialectKind::Plain);
    assert!(file.fallback);
    assert_eq!(file.condition_at(27), Some(&v("TEST")));
    assert_eq!(file.condition_at(30), Some(&v("CONFIG_TEST")));
    assert_eq!(file.condition_at(33), Some(&v("ENABLE_TEST")));
    assert_eq!(file.condition_at(16), Some(&v("CONFIG_USE_GETS")));
    assert_eq!(
        file.condition_at(19),
        Some(&Formula::not(v("CONFIG_USE_GETS")))
    );
}

#[test]
fn main_c_symbols_are_registered_implicitly() {
    let report = analyze(&[("src/main.c", MAIN_C)]);
    let names: Vec<&str> = report.features.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "CONFIG_TEST",
            "CONFIG_USE_CPP_FILE",
            "CONFIG_USE_GETS",
            "ENABLE_TEST",
            "TEST"
        ]
    );
    assert!(report.features.iter().all(|f| f.implicit));
    assert_eq!(report.features[0].origin, Location::at("src/main.c", 29));
}

#[test]
fn main_c_only_reports_low_confidence() {
    let report = analyze(&[("src/main.c", MAIN_C)]);
    assert_eq!(report.diagnostics.len(), 1);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::LowConfidence);
    assert_eq!(diagnostic.location, Location::file("src/main.c"));
    assert!(diagnostic.low_confidence);
}

#[test]
fn explicit_alias_unifies_one_spelling() {
    let mut config = VarimapConfig::default();
    config.aliases.push(AliasEntry {
        token: "CONFIG_TEST".into(),
        symbol: "TEST".into(),
    });
    let options = AnalysisOptions::from_config(&config).unwrap();
    let report = analyze_with(options, &[("src/main.c", MAIN_C)]);
    let file = report.file("src/main.c").unwrap();

    assert_eq!(file.condition_at(27), Some(&v("TEST")));
    assert_eq!(file.condition_at(30), Some(&v("TEST")));
    assert_eq!(file.condition_at(33), Some(&v("ENABLE_TEST")));
}

#[test]
fn unify_policy_merges_all_families() {
    let options = AnalysisOptions {
        policy: AliasPolicy::Unify,
        ..AnalysisOptions::default()
    };
    let report = analyze_with(options, &[("src/main.c", MAIN_C)]);
    let file = report.file("src/main.c").unwrap();

    for line in [27, 30, 33] {
        assert_eq!(file.condition_at(line), Some(&v("TEST")), "line {line}");
    }
    assert_eq!(file.condition_at(16), Some(&v("USE_GETS")));
}

#[test]
fn bare_token_colliding_with_declaration_is_file_local() {
    let declares_test = "//config:config TEST\n//config:   bool \"Test mode\"\n";
    let report = analyze(&[("src/main.c", MAIN_C), ("src/test.c", declares_test)]);
    let file = report.file("src/main.c").unwrap();

    // Every spelling of the TEST family collides; none is unified.
    for (line, token) in [(27, "TEST"), (30, "CONFIG_TEST"), (33, "ENABLE_TEST")] {
        assert_eq!(
            file.condition_at(line),
            Some(&Formula::Var(Symbol::file_local(token, "src/main.c"))),
            "line {line}"
        );
    }

    let ambiguities: Vec<_> = report.diagnostics_of(DiagnosticKind::AliasAmbiguity).collect();
    let lines: Vec<Option<u32>> = ambiguities.iter().map(|d| d.location.line).collect();
    assert_eq!(lines, vec![Some(26), Some(29), Some(32)]);
    assert!(ambiguities.iter().all(|d| d.low_confidence));

    let test = report.features.iter().find(|f| f.name == "TEST").unwrap();
    assert!(!test.implicit);
}

// ── Fiasco ──────────────────────────────────────────────────────────────

#[test]
fn fiasco_sections() {
    let report = analyze(&[("src/sample/main.cpp", MAIN_CPP)]);
    let file = report.file("src/sample/main.cpp").unwrap();

    assert_eq!(file.dialect, DialectKind::InterfaceImpl);
    for line in 6..=10 {
        assert_eq!(file.condition_at(line), Some(&v("define_useless_function")));
    }
    assert_eq!(file.condition_at(3), Some(&Formula::True));
    assert_eq!(file.condition_at(5), Some(&Formula::True));
    for line in 11..=20 {
        assert_eq!(file.condition_at(line), Some(&Formula::True), "line {line}");
    }
    assert_eq!(file.condition_at(22), Some(&v("CONFIG_USE_GETS")));
}

#[test]
fn fiasco_alone_reports_undeclared_symbols() {
    let report = analyze(&[("src/sample/main.cpp", MAIN_CPP)]);
    let undeclared: Vec<(Option<u32>, &str)> = report
        .diagnostics_of(DiagnosticKind::UndeclaredSymbol)
        .map(|d| (d.location.line, d.message.as_str()))
        .collect();
    assert_eq!(
        undeclared,
        vec![
            (
                Some(5),
                "'define_useless_function' is not declared in the feature model"
            ),
            (Some(21), "'CONFIG_USE_GETS' is not declared in the feature model"),
        ]
    );
}

// ── toybox ──────────────────────────────────────────────────────────────

#[test]
fn toybox_gets_declarations_and_scopes() {
    let report = analyze(&[("toys/example/gets.c", GETS_C)]);
    let file = report.file("toys/example/gets.c").unwrap();
    assert_eq!(file.dialect, DialectKind::Toybox);

    let use_gets = report.features.iter().find(|f| f.name == "USE_GETS").unwrap();
    assert_eq!(use_gets.depends, Some(v("GETS")));
    assert!(report.features.iter().any(|f| f.name == "GETS"));

    assert_eq!(file.condition_at(2), Some(&v("GETS")));
    assert_eq!(file.condition_at(36), Some(&v("USE_GETS")));
    assert_eq!(file.condition_at(39), Some(&Formula::not(v("USE_GETS"))));
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);

    let closure = report.model().dependency_closure("USE_GETS").unwrap();
    assert!(closure.contains("GETS"));
}

#[test]
fn toybox_cycle_is_fatal_but_analysis_completes() {
    let cyclic = "\
/*
USE_PING(NEWTOY(ping, 0, TOYFLAG_USR))

config PING
  bool \"ping\"
  depends on PONG

config PONG
  bool \"pong\"
  depends on PING
*/
#ifdef CFG_PING
  ping();
#endif
";
    let report = analyze(&[("toys/net/ping.c", cyclic)]);
    let cycles: Vec<_> = report.diagnostics_of(DiagnosticKind::CyclicDependency).collect();
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].is_fatal());
    assert!(cycles[0].message.contains("PING -> PONG -> PING"));
    assert!(report.has_fatal());

    let file = report.file("toys/net/ping.c").unwrap();
    assert_eq!(file.condition_at(13), Some(&v("PING")));
    assert!(report.diagnostics_of(DiagnosticKind::UnsatisfiableScope).count() >= 1);
}

#[test]
fn toybox_missing_dependency_is_a_violation() {
    let missing = "\
/*
USE_WGET(NEWTOY(wget, 0, TOYFLAG_USR))

config WGET
  bool \"wget\"
  depends on NETWORKING
*/
";
    let report = analyze(&[("toys/net/wget.c", missing)]);
    let violations: Vec<_> = report
        .diagnostics_of(DiagnosticKind::DependencyViolation)
        .collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].location, Location::at("toys/net/wget.c", 4));
    assert!(violations[0].message.contains("NETWORKING"));
}

// ── whole corpus ────────────────────────────────────────────────────────

#[test]
fn corpus_resolves_across_dialects() {
    let report = analyze(&[
        ("src/sample/main.cpp", MAIN_CPP),
        ("src/io-file.c", IO_FILE),
        ("toys/example/gets.c", GETS_C),
        ("src/main.c", MAIN_C),
    ]);
    let paths: Vec<&str> = report.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["src/io-file.c", "src/main.c", "src/sample/main.cpp", "toys/example/gets.c"]
    );

    // The Fiasco file's CONFIG_ spelling reaches the toybox declaration.
    let cpp = report.file("src/sample/main.cpp").unwrap();
    assert_eq!(cpp.condition_at(22), Some(&v("USE_GETS")));

    // main.c has no alias rules of its own; its CONFIG_ spelling of the
    // toybox feature is a naming-family collision and stays file-local.
    let main = report.file("src/main.c").unwrap();
    assert_eq!(
        main.condition_at(16),
        Some(&Formula::Var(Symbol::file_local("CONFIG_USE_GETS", "src/main.c")))
    );
    let ambiguities: Vec<_> = report.diagnostics_of(DiagnosticKind::AliasAmbiguity).collect();
    assert_eq!(ambiguities.len(), 1);
    assert_eq!(ambiguities[0].location, Location::at("src/main.c", 15));
    assert!(ambiguities[0].message.contains("declared feature USE_GETS"));
    assert!(
        report.features.iter().all(|f| f.name != "CONFIG_USE_GETS"),
        "the colliding spelling must not be registered"
    );
}
