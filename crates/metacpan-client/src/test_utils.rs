use std::env;

/// Every variable the configuration layer reads from the environment.
const CONFIG_VARS: &[&str] = &[
    "METACPAN_CONFIG",
    "METACPAN_DOMAIN",
    "METACPAN_VERSION",
    "METACPAN_BASE_URL",
];

/// Restores the saved variables when dropped, including on panic.
struct EnvSnapshot(Vec<(String, Option<String>)>);

impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (key, value) in &self.0 {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }
}

/// Runs `f` in an environment where the `METACPAN_*` configuration
/// variables are unset apart from those in `vars`. Callers must be
/// `#[serial]`.
pub fn with_env<F>(vars: Vec<(&str, &str)>, f: F)
where
    F: FnOnce(),
{
    let mut keys: Vec<&str> = CONFIG_VARS.to_vec();
    keys.extend(vars.iter().map(|(key, _)| *key).filter(|key| !CONFIG_VARS.contains(key)));

    let _snapshot = EnvSnapshot(
        keys.iter()
            .map(|key| (key.to_string(), env::var(key).ok()))
            .collect(),
    );

    for key in CONFIG_VARS {
        env::remove_var(key);
    }
    for (key, value) in &vars {
        env::set_var(key, value);
    }

    f();
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_config_vars_are_cleared_and_restored() {
        let before = env::var("METACPAN_DOMAIN").ok();
        env::set_var("METACPAN_DOMAIN", "outer.example");

        with_env(vec![("METACPAN_VERSION", "v1")], || {
            assert!(env::var("METACPAN_DOMAIN").is_err());
            assert_eq!(env::var("METACPAN_VERSION").as_deref(), Ok("v1"));
        });

        assert_eq!(env::var("METACPAN_DOMAIN").as_deref(), Ok("outer.example"));
        match before {
            Some(value) => env::set_var("METACPAN_DOMAIN", value),
            None => env::remove_var("METACPAN_DOMAIN"),
        }
    }
}
