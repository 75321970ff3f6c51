use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use varimap_config::{AliasEntry, ConfigError, VarimapConfig};
use varimap_core::{AliasPolicy, DialectKind};

#[test]
fn project_toml_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".varimap")?;
        jail.create_file(
            ".varimap/config.toml",
            r#"
[analysis]
alias_policy = "unify"
confidence_threshold = 0.7

[[aliases]]
token = "HAVE_CHMOD"
symbol = "PERFORM_CHMOD"

[dialects.overrides]
"kernel/**/*.cpp" = "interface_impl"

[engine]
threads = 4
"#,
        )?;

        let config = VarimapConfig::load().expect("config loads");
        assert_eq!(config.analysis.alias_policy, AliasPolicy::Unify);
        assert!((config.analysis.confidence_threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(
            config.aliases,
            vec![AliasEntry {
                token: "HAVE_CHMOD".into(),
                symbol: "PERFORM_CHMOD".into(),
            }]
        );
        assert_eq!(config.engine.threads, 4);

        let overrides = config.dialects.compile().expect("globs compile");
        assert_eq!(
            overrides.lookup("kernel/sched/context.cpp"),
            Some(DialectKind::InterfaceImpl)
        );
        Ok(())
    });
}

#[test]
fn partial_toml_keeps_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("partial.toml", "[engine]\nthreads = 2\n")?;

        let config: VarimapConfig = Figment::from(Serialized::defaults(VarimapConfig::default()))
            .merge(Toml::file("partial.toml"))
            .extract()?;
        assert_eq!(config.engine.threads, 2);
        assert_eq!(config.analysis.alias_policy, AliasPolicy::Strict);
        assert!(config.analysis.check_satisfiability);
        Ok(())
    });
}

#[test]
fn root_argument_selects_project_directory() {
    Jail::expect_with(|jail| {
        jail.create_dir("project/.varimap")?;
        jail.create_file(
            "project/.varimap/config.toml",
            "[analysis]\ncheck_satisfiability = false\n",
        )?;

        let here = VarimapConfig::load().expect("config loads");
        assert!(here.analysis.check_satisfiability);

        let there = VarimapConfig::load_from(&jail.directory().join("project")).expect("loads");
        assert!(!there.analysis.check_satisfiability);
        Ok(())
    });
}

#[test]
fn out_of_range_threshold_fails_to_load() {
    Jail::expect_with(|jail| {
        jail.create_dir(".varimap")?;
        jail.create_file(
            ".varimap/config.toml",
            "[analysis]\nconfidence_threshold = 2.0\n",
        )?;

        let err = VarimapConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        Ok(())
    });
}

#[test]
fn unknown_dialect_name_is_an_error() {
    Jail::expect_with(|jail| {
        jail.create_dir(".varimap")?;
        jail.create_file(
            ".varimap/config.toml",
            "[dialects.overrides]\n\"*.c\" = \"cobol\"\n",
        )?;

        let err = VarimapConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
        Ok(())
    });
}
