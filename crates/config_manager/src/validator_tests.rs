use super::*;

fn invalid(path: &str, message: &str) -> ValidationError {
    ValidationError {
        error_type: ValidationErrorType::InvalidValue,
        field_path: path.to_string(),
        message: message.to_string(),
        suggestion: None,
    }
}

#[test]
fn test_empty_result_is_valid() {
    let result = ValidationResult::new();

    assert!(result.is_valid());
    assert_eq!(result.summary(), "");
}

#[test]
fn test_warnings_keep_result_valid() {
    let mut result = ValidationResult::new();
    result.push_warning(ValidationWarning {
        field_path: "webhooks[0].url".to_string(),
        message: "Webhook URL uses plain HTTP".to_string(),
        recommendation: None,
    });

    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_summary_joins_errors_in_order() {
    let mut result = ValidationResult::new();
    result.push_error(invalid("rulesets[0].target", "unknown target 'tags'"));
    result.extend_errors(vec![invalid("rulesets[1].enforcement", "unknown level 'on'")]);

    assert!(!result.is_valid());
    assert_eq!(
        result.summary(),
        "rulesets[0].target: unknown target 'tags' (InvalidValue); \
         rulesets[1].enforcement: unknown level 'on' (InvalidValue)"
    );
}
