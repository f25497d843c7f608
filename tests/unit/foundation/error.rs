use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ArError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(ArError::config("x").to_string().contains("config error:"));
}

#[test]
fn component_errors_convert_transparently() {
    let err: ArError = CaptureError::SourceNotReady.into();
    assert!(matches!(err, ArError::Capture(CaptureError::SourceNotReady)));
    assert_eq!(err.to_string(), CaptureError::SourceNotReady.to_string());

    let err: ArError = SelectionError::TargetNotFound.into();
    assert!(err.to_string().contains("marker"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ArError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
