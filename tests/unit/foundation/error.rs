use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PixfxError::manifest("x")
            .to_string()
            .contains("manifest error:")
    );
    assert!(
        PixfxError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        PixfxError::pipeline("x")
            .to_string()
            .contains("pipeline error:")
    );
    assert!(
        PixfxError::decode("a.png", "bad magic")
            .to_string()
            .contains("decode failed: a.png: bad magic")
    );
    assert!(
        PixfxError::encode("b.png", "boom")
            .to_string()
            .contains("encode failed: b.png")
    );
}

#[test]
fn io_variants_keep_path_and_source() {
    let err = PixfxError::NotFound {
        path: PathBuf::from("missing.png"),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    };
    let msg = err.to_string();
    assert!(msg.starts_with("source not found: missing.png"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PixfxError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
