use mcq_quiz::Settings;
use serial_test::serial;

const VARS: &[&str] = &["HOST", "PORT", "DATABASE_URL", "DB_MAX_CONNECTIONS", "QUIZ_DATA_DIR", "SEED_SAMPLE_QUESTIONS"];

fn clear_env() {
    for v in VARS { std::env::remove_var(v); }
}

#[test]
#[serial]
fn reads_process_environment() {
    clear_env();
    std::env::set_var("PORT", "9090");
    std::env::set_var("DATABASE_URL", "postgres://quiz@localhost/mcq_quiz");
    std::env::set_var("SEED_SAMPLE_QUESTIONS", "1");
    let s = Settings::from_env().unwrap();
    assert_eq!(s.port, 9090);
    assert_eq!(s.database_url.as_deref(), Some("postgres://quiz@localhost/mcq_quiz"));
    assert!(s.seed_sample_questions);
    clear_env();
}

#[test]
#[serial]
fn invalid_port_fails_startup() {
    clear_env();
    std::env::set_var("PORT", "99999");
    assert!(Settings::from_env().is_err());
    clear_env();
}
