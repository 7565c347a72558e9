use digital_eye::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const TEST_SECRET: &str = "layered-config-test-secret";

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    unsafe {
        env::remove_var("DIGITAL_EYE_PROFILE");
        env::remove_var("DIGITAL_EYE_API_BIND_ADDR");
        env::remove_var("DIGITAL_EYE_LOG_LEVEL");
        env::remove_var("DIGITAL_EYE_AUTH_JWT_SECRET");
        env::remove_var("DIGITAL_EYE_AUTH_URL");
        env::remove_var("DIGITAL_EYE_AUTH_API_KEY");
        env::remove_var("DIGITAL_EYE_DB_MAX_CONNECTIONS");
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("DIGITAL_EYE_AUTH_JWT_SECRET", TEST_SECRET);
    }

    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:3001");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.cors_origin, "http://localhost:5173");
    assert_eq!(cfg.auth_jwt_secret.as_deref(), Some(TEST_SECRET));
    cfg.bind_addr().expect("default bind addr parses");
    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "DIGITAL_EYE_API_BIND_ADDR=127.0.0.1:3000\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test",
        "DIGITAL_EYE_API_BIND_ADDR=192.168.0.10:5000\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "DIGITAL_EYE_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "DIGITAL_EYE_PROFILE=test\nDIGITAL_EYE_API_BIND_ADDR=127.0.0.1:4000\n",
    );

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    clear_env();
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        &format!("DIGITAL_EYE_API_BIND_ADDR=127.0.0.1:3000\nDIGITAL_EYE_AUTH_JWT_SECRET={TEST_SECRET}\n"),
    );

    unsafe {
        env::set_var("DIGITAL_EYE_API_BIND_ADDR", "0.0.0.0:9090");
    }

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with env override");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");

    clear_env();
}

#[test]
fn unprefixed_keys_are_ignored() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "API_BIND_ADDR=1.2.3.4:1\nDIGITAL_EYE_PROFILE=test\n",
    );

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:3001");

    clear_env();
}

#[test]
fn missing_identity_provider_fails_outside_test_profile() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("no identity provider should fail");
    assert!(matches!(err, ConfigError::MissingIdentityProvider));

    clear_env();
}

#[test]
fn remote_provider_requires_api_key() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "DIGITAL_EYE_AUTH_URL=https://auth.example.com/auth/v1/\n",
    );

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("auth url without key should fail");
    assert!(matches!(err, ConfigError::MissingAuthApiKey));

    write_env_file(
        &temp_dir,
        ".env.local",
        "DIGITAL_EYE_AUTH_API_KEY=anon-key\n",
    );
    let cfg = loader.load().expect("auth url with key loads");
    assert_eq!(
        cfg.auth_url.as_deref(),
        Some("https://auth.example.com/auth/v1")
    );

    clear_env();
}

#[test]
fn invalid_number_returns_error() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("DIGITAL_EYE_PROFILE", "test");
        env::set_var("DIGITAL_EYE_DB_MAX_CONNECTIONS", "many");
    }
    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("invalid number should fail");
    assert!(format!("{}", err).contains("DIGITAL_EYE_DB_MAX_CONNECTIONS"));

    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("DIGITAL_EYE_API_BIND_ADDR", "not-an-addr");
        env::set_var("DIGITAL_EYE_AUTH_JWT_SECRET", TEST_SECRET);
    }
    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("invalid bind addr should fail");
    assert!(format!("{}", err).contains("invalid api bind address"));

    clear_env();
}
