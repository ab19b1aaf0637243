#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;
    use tracing_test::traced_test;

    use crate::config::{Config, ConfigError, Registry, Value};

    fn env_lock<'a>() -> std::sync::MutexGuard<'a, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
    }

    struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(vars: &[(&str, Option<&str>)]) -> Self {
            let saved = vars
                .iter()
                .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
                .collect::<Vec<_>>();
            for (key, value) in vars {
                match value {
                    Some(val) => unsafe { std::env::set_var(key, val) },
                    None => unsafe { std::env::remove_var(key) },
                }
            }
            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.saved {
                match value {
                    Some(val) => unsafe { std::env::set_var(key, val) },
                    None => unsafe { std::env::remove_var(key) },
                }
            }
        }
    }

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn sample(dir: &Path) -> PathBuf {
        write(dir, "sample.conf", "FOO = 'bar'\nbaz = 'lowercase'\n")
    }

    fn defaults(pairs: &[(&str, &str)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn load_errors_when_file_is_missing() {
        let registry = Registry::new();
        let err = Config::load(&registry, "/nonexistent/path.conf").unwrap_err();

        assert!(matches!(err, ConfigError::FileNotFound { .. }));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn load_reads_uppercase_settings_over_defaults() {
        let temp = TempDir::new().unwrap();
        let path = sample(temp.path());
        let registry = Registry::new();

        let config = Config::load_with_defaults(
            &registry,
            Some(path.as_path()),
            defaults(&[("PROPER", "PROPERVALUE")]),
        )
        .unwrap();

        assert_eq!(config.get_value("PROPER").unwrap(), Value::from("PROPERVALUE"));
        assert_eq!(config.get_value("FOO").unwrap(), Value::from("bar"));
        assert!(!config.has_value("baz"));
        assert_eq!(config.source(), Some(path.as_path()));
    }

    #[test]
    fn load_locates_file_in_search_paths() {
        let temp = TempDir::new().unwrap();
        let empty = TempDir::new().unwrap();
        sample(temp.path());
        let registry = Registry::new();

        let config = Config::builder(&registry)
            .with_file_name("sample.conf")
            .with_search_paths([empty.path(), temp.path()])
            .build()
            .unwrap();

        assert_eq!(config.get_value("FOO").unwrap(), Value::from("bar"));
        assert!(config.source().is_some());
    }

    #[test]
    fn load_falls_back_to_defaults_when_nothing_is_found() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::new();

        let config = Config::builder(&registry)
            .with_file_name("not-existent.conf")
            .with_search_paths([temp.path()])
            .with_default("DEFAULT", "DEFAULTVALUE")
            .build()
            .unwrap();
        assert_eq!(config.get_value("DEFAULT").unwrap(), Value::from("DEFAULTVALUE"));
        assert!(config.source().is_none());

        let config =
            Config::load_with_defaults(&registry, None, defaults(&[("DEFAULT", "DEFAULTVALUE")]))
                .unwrap();
        assert_eq!(config.get_value("DEFAULT").unwrap(), Value::from("DEFAULTVALUE"));
        assert!(config.explicit_items().is_empty());
    }

    #[test]
    fn load_merges_directory_in_sorted_order() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "10.conf", "FOO = 'override'\nNEW = 'thing'\n");
        write(temp.path(), "00.conf", "FOO = 'base'\nbaz = 1\n");
        write(temp.path(), "99.conf.bak", "FOO = 'ignored'\n");
        write(temp.path(), "README", "not a config file");
        let registry = Registry::new();

        let config = Config::load_with_defaults(
            &registry,
            Some(temp.path()),
            defaults(&[("PROPER", "PROPERVALUE")]),
        )
        .unwrap();

        assert_eq!(config.get_value("FOO").unwrap(), Value::from("override"));
        assert_eq!(config.get_value("NEW").unwrap(), Value::from("thing"));
        assert_eq!(config.get_value("PROPER").unwrap(), Value::from("PROPERVALUE"));
        assert!(!config.has_value("baz"));
        assert_eq!(config.source(), Some(temp.path()));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "broken.conf", "FOO = 'ok'\nBAR = open('x')\n");
        let registry = Registry::new();

        match Config::load(&registry, &path).unwrap_err() {
            ConfigError::Parse { path: at, line, .. } => {
                assert_eq!(at, path);
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn registry_defaults_fill_unset_keys() {
        let registry = Registry::new();
        registry.define("WORKERS", 4i64, "Number of workers");
        let config = Config::with_defaults(&registry, BTreeMap::new());

        assert_eq!(config.get_value("WORKERS").unwrap(), Value::Int(4));
    }

    #[test]
    fn precedence_is_explicit_then_instance_then_registry() {
        let registry = Registry::new();
        registry.define("LEVEL", "registry", "");
        let mut config = Config::with_defaults(&registry, defaults(&[("LEVEL", "instance")]));
        assert_eq!(config.get_value("LEVEL").unwrap(), Value::from("instance"));

        config.set_value("LEVEL", "explicit");
        assert_eq!(config.get_value("LEVEL").unwrap(), Value::from("explicit"));
        assert_eq!(config.items()["LEVEL"], Value::from("explicit"));
    }

    #[test]
    fn alias_given_at_construction_sets_canonical() {
        let registry = Registry::new();
        registry.alias("OTHER_ENGINE", "ENGINE");
        let config = Config::new(&registry, [("OTHER_ENGINE", "x")], BTreeMap::new());

        assert_eq!(config.get_value("ENGINE").unwrap(), Value::from("x"));
        assert_eq!(config.get_value("OTHER_ENGINE").unwrap(), Value::from("x"));
        assert!(!config.explicit_items().contains_key("OTHER_ENGINE"));
    }

    #[test]
    fn alias_reads_canonical_value() {
        let registry = Registry::new();
        registry.alias("LOADER_ALIAS", "LOADER");
        let config = Config::new(&registry, [("LOADER", "y")], BTreeMap::new());

        assert_eq!(config.get_value("LOADER_ALIAS").unwrap(), Value::from("y"));
    }

    #[test]
    fn aliased_aliases_resolve_to_the_same_value() {
        let registry = Registry::new();
        registry.alias("STORAGE_ALIAS", "STORAGE");
        registry.alias("STORAGE_ALIAS_ALIAS", "STORAGE_ALIAS");
        let config = Config::new(&registry, [("STORAGE_ALIAS_ALIAS", "z")], BTreeMap::new());

        for name in ["STORAGE", "STORAGE_ALIAS", "STORAGE_ALIAS_ALIAS"] {
            assert_eq!(config.get_value(name).unwrap(), Value::from("z"), "{name}");
        }
    }

    #[test]
    fn alias_falls_through_to_canonical_default() {
        let registry = Registry::new();
        registry.define("ENGINE", "pil", "Imaging engine");
        registry.alias("OLD_ENGINE", "ENGINE");
        let config = Config::with_defaults(&registry, BTreeMap::new());

        assert_eq!(config.get_value("OLD_ENGINE").unwrap(), Value::from("pil"));
        assert_eq!(
            config.get_description("OLD_ENGINE").unwrap().as_deref(),
            Some("Imaging engine")
        );
    }

    #[test]
    fn aliases_in_loaded_files_land_on_canonical_key() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "legacy.conf", "OLD_ENGINE = 'opencv'\n");
        let registry = Registry::new();
        registry.define("ENGINE", "pil", "");
        registry.alias("OLD_ENGINE", "ENGINE");

        let config = Config::load(&registry, &path).unwrap();
        assert_eq!(config.get_value("ENGINE").unwrap(), Value::from("opencv"));
    }

    #[test]
    #[traced_test]
    fn alias_use_emits_one_deprecation_per_access() {
        let registry = Registry::new();
        registry.alias("OLD_LOADER", "LOADER");
        let mut config = Config::with_defaults(&registry, BTreeMap::new());

        config.set_value("OLD_LOADER", "file");
        assert_eq!(config.get_value("OLD_LOADER").unwrap(), Value::from("file"));
        assert_eq!(config.get_value("LOADER").unwrap(), Value::from("file"));

        assert!(logs_contain(
            "Option OLD_LOADER is marked as deprecated please use LOADER instead."
        ));
        logs_assert(|lines: &[&str]| {
            let count = lines
                .iter()
                .filter(|line| line.contains("OLD_LOADER is marked as deprecated"))
                .count();
            match count {
                2 => Ok(()),
                n => Err(format!("expected 2 deprecation warnings, saw {n}")),
            }
        });
    }

    #[test]
    fn dictionary_access_uses_key_errors() {
        let temp = TempDir::new().unwrap();
        let path = sample(temp.path());
        let registry = Registry::new();
        let mut config = Config::load(&registry, &path).unwrap();

        assert_eq!(config.get_item("FOO").unwrap(), Value::from("bar"));
        config.set_item("X", "something");
        assert_eq!(config.get_item("X").unwrap(), Value::from("something"));

        assert!(matches!(
            config.get_item("INVALID_KEY"),
            Err(ConfigError::KeyNotFound(name)) if name == "INVALID_KEY"
        ));
        assert!(matches!(
            config.get_value("INVALID_KEY"),
            Err(ConfigError::AttributeNotFound(_))
        ));
        assert_eq!(config.get_or("INVALID_KEY", 3i64), Value::Int(3));
    }

    #[test]
    fn description_requires_a_resolvable_setting() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "missing.conf", "OTHER = 1\n");
        let registry = Registry::new();
        registry.define("some_key", "default", "test key");

        let config = Config::load(&registry, &path).unwrap();
        assert_eq!(
            config.get_description("some_key").unwrap().as_deref(),
            Some("test key")
        );
        assert_eq!(config.get_description("OTHER").unwrap(), None);
        assert!(matches!(
            config.get_description("NOPE"),
            Err(ConfigError::NoSuchConfiguration(_))
        ));
    }

    #[test]
    fn require_present_names_first_missing_key() {
        let registry = Registry::new();
        registry.define("A", 1i64, "");
        let config = Config::new(&registry, [("B", 2i64)], BTreeMap::new());

        assert!(config.require_present(&["A", "B"]).is_ok());
        let err = config.require_present(&["A", "C", "D"]).unwrap_err();
        assert!(matches!(&err, ConfigError::MissingRequired { key } if key == "C"));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn verify_reports_missing_registry_keys() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "missing.conf", "PRESENT = 1\nOLD_NAME = 2\n");
        let registry = Registry::new();
        registry.define("PRESENT", 0i64, "");
        registry.define("RENAMED", 0i64, "");
        registry.alias("OLD_NAME", "RENAMED");
        registry.define("some_key", "default", "test key");

        let missing = Config::verify(&registry, Some(path.as_path())).unwrap();
        assert_eq!(
            missing,
            vec![("some_key".to_string(), Value::from("default"))]
        );

        assert!(Config::verify(&registry, None).unwrap().is_empty());
        assert!(matches!(
            Config::verify(&registry, Some(Path::new("/nonexistent/x.conf"))),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn env_is_ignored_unless_allowed() {
        let _lock = env_lock();
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "env.conf", "LAYERCONF_TEST_FOO = 'bar'\n");
        let registry = Registry::new();
        let config = Config::load(&registry, &path).unwrap();

        let _env = EnvGuard::new(&[("LAYERCONF_TEST_FOO", Some("baz"))]);
        assert_eq!(config.get_value("LAYERCONF_TEST_FOO").unwrap(), Value::from("bar"));

        registry.allow_environment_variables();
        assert_eq!(config.get_value("LAYERCONF_TEST_FOO").unwrap(), Value::from("baz"));

        registry.disallow_environment_variables();
        assert_eq!(config.get_value("LAYERCONF_TEST_FOO").unwrap(), Value::from("bar"));
    }

    #[test]
    fn env_serves_unknown_keys_and_aliases_verbatim() {
        let _lock = env_lock();
        let registry = Registry::new();
        registry.define("LAYERCONF_TEST_PORT", 80i64, "");
        registry.alias("LAYERCONF_TEST_OLD_PORT", "LAYERCONF_TEST_PORT");
        registry.allow_environment_variables();
        let config = Config::with_defaults(&registry, BTreeMap::new());

        let _env = EnvGuard::new(&[
            ("LAYERCONF_TEST_SOME_CONFIGURATION", Some("test value")),
            ("LAYERCONF_TEST_OLD_PORT", Some("8080")),
            ("LAYERCONF_TEST_PORT", None),
        ]);

        assert_eq!(
            config.get_value("LAYERCONF_TEST_SOME_CONFIGURATION").unwrap(),
            Value::from("test value")
        );
        assert_eq!(
            config.get_value("LAYERCONF_TEST_OLD_PORT").unwrap(),
            Value::from("8080")
        );
        assert_eq!(config.get_value("LAYERCONF_TEST_PORT").unwrap(), Value::Int(80));
    }

    #[test]
    fn reload_picks_up_file_changes_and_late_definitions() {
        let temp = TempDir::new().unwrap();
        let path = sample(temp.path());
        let registry = Registry::new();
        let mut config = Config::load_with_defaults(
            &registry,
            Some(path.as_path()),
            defaults(&[("PROPER", "PROPERVALUE")]),
        )
        .unwrap();
        config.set_value("RUNTIME", "kept");

        registry.define_in("UBERFOO", "baz", "something", "else");
        write(temp.path(), "sample.conf", "FOO = 'changed'\n");
        config.reload().unwrap();

        assert_eq!(config.get_value("UBERFOO").unwrap(), Value::from("baz"));
        assert_eq!(config.get_value("FOO").unwrap(), Value::from("changed"));
        assert_eq!(config.get_value("PROPER").unwrap(), Value::from("PROPERVALUE"));
        assert_eq!(config.get_value("RUNTIME").unwrap(), Value::from("kept"));
    }

    #[test]
    fn reload_remerges_directories() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "00.conf", "FOO = 'base'\n");
        let registry = Registry::new();
        let mut config = Config::load(&registry, temp.path()).unwrap();

        write(temp.path(), "50.conf", "FOO = 'later'\n");
        config.reload().unwrap();
        assert_eq!(config.get_value("FOO").unwrap(), Value::from("later"));
    }

    #[test]
    fn reload_without_source_is_a_no_op() {
        let registry = Registry::new();
        let mut config = Config::new(&registry, [("A", 1i64)], BTreeMap::new());

        config.reload().unwrap();
        assert_eq!(config.get_value("A").unwrap(), Value::Int(1));
    }

    #[test]
    fn registries_are_independent() {
        let first = Registry::new();
        let second = Registry::new();
        first.define("ONLY_FIRST", true, "");

        assert!(Config::with_defaults(&first, BTreeMap::new()).has_value("ONLY_FIRST"));
        assert!(!Config::with_defaults(&second, BTreeMap::new()).has_value("ONLY_FIRST"));
    }

    #[test]
    fn aliasing_an_existing_alias_target_keeps_all_names_consistent() {
        let registry = Registry::new();
        registry.define("C", "default", "");
        registry.alias("B", "A");
        registry.alias("A", "C");
        let mut config = Config::with_defaults(&registry, BTreeMap::new());

        config.set_value("B", "v");

        for name in ["A", "B", "C"] {
            assert_eq!(config.get_value(name).unwrap(), Value::from("v"), "{name}");
        }
        assert_eq!(config.explicit_items().keys().collect::<Vec<_>>(), vec!["C"]);
    }

    #[test]
    fn alias_cycle_is_rejected_and_lookups_terminate() {
        let registry = Registry::new();
        registry.alias("B", "A");
        registry.alias("A", "B");
        let mut config = Config::with_defaults(&registry, BTreeMap::new());

        assert!(matches!(
            config.get_value("A"),
            Err(ConfigError::AttributeNotFound(_))
        ));

        config.set_value("B", "x");
        assert_eq!(config.get_value("A").unwrap(), Value::from("x"));
        assert_eq!(config.explicit_items().keys().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    #[traced_test]
    fn verify_warns_about_deprecated_names_in_the_file() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "legacy.conf", "OLD_QUALITY = 80\n");
        let registry = Registry::new();
        registry.define("QUALITY", 90i64, "");
        registry.alias("OLD_QUALITY", "QUALITY");

        assert!(Config::verify(&registry, Some(path.as_path())).unwrap().is_empty());
        assert!(logs_contain(
            "Option OLD_QUALITY is marked as deprecated please use QUALITY instead."
        ));
    }
}
