//! Unit tests for the application error enumeration.

use agent_relay::AppError;

#[test]
fn display_prefixes_variant_name() {
    assert_eq!(
        AppError::TaskNotFound("t-1".into()).to_string(),
        "task not found: t-1"
    );
    assert_eq!(
        AppError::UnsupportedOperation("busy".into()).to_string(),
        "unsupported operation: busy"
    );
    assert_eq!(
        AppError::InvalidParams("mismatch".into()).to_string(),
        "invalid params: mismatch"
    );
    assert_eq!(AppError::Internal("oops".into()).to_string(), "internal: oops");
    assert_eq!(AppError::Agent("boom".into()).to_string(), "agent: boom");
}

#[test]
fn protocol_codes_are_stable() {
    assert_eq!(AppError::TaskNotFound(String::new()).code(), -32001);
    assert_eq!(AppError::UnsupportedOperation(String::new()).code(), -32004);
    assert_eq!(AppError::InvalidParams(String::new()).code(), -32602);
    assert_eq!(AppError::Internal(String::new()).code(), -32603);
    assert_eq!(AppError::Agent(String::new()).code(), -32603);
    assert_eq!(AppError::Storage(String::new()).code(), -32603);
}

#[test]
fn invalid_toml_converts_to_config_error() {
    let err: AppError = toml::from_str::<toml::Value>("not [valid")
        .map_err(AppError::from)
        .expect_err("parse must fail");
    assert!(matches!(err, AppError::Config(_)), "got {err:?}");
}
