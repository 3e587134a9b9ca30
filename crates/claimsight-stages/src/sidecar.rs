//! Sidecar detector: reads precomputed model output stored next to the image.
//!
//! For `uploads/car.jpg` and suffix `damage`, boxes are read from
//! `uploads/car.jpg.damage.json`, a JSON array of
//! `{"bbox": [x1, y1, x2, y2], "class_id": n, "confidence": c}`.
use claimsight_core::{CapabilityError, ObjectDetector, RawBox};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SidecarDetector {
    id: &'static str,
    suffix: String,
}

impl SidecarDetector {
    pub fn new(id: &'static str, suffix: impl Into<String>) -> Self {
        Self {
            id,
            suffix: suffix.into(),
        }
    }

    /// Damage model output (`<image>.damage.json`)
    pub fn damage() -> Self {
        Self::new("sidecar.damage.v1", "damage")
    }

    /// Part model output (`<image>.parts.json`)
    pub fn parts() -> Self {
        Self::new("sidecar.parts.v1", "parts")
    }

    pub fn sidecar_path(&self, image: &Path) -> PathBuf {
        let mut name = OsString::from(image.as_os_str());
        name.push(format!(".{}.json", self.suffix));
        PathBuf::from(name)
    }
}

impl ObjectDetector for SidecarDetector {
    fn id(&self) -> &'static str {
        self.id
    }

    fn detect(&self, image: &Path) -> Result<Vec<RawBox>, CapabilityError> {
        let path = self.sidecar_path(image);
        let bytes = std::fs::read(&path).map_err(|e| {
            CapabilityError::Unavailable(format!("{}: {}", path.display(), e))
        })?;

        serde_json::from_slice(&bytes)
            .map_err(|e| CapabilityError::Failed(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_path() {
        let detector = SidecarDetector::damage();
        assert_eq!(
            detector.sidecar_path(Path::new("uploads/car.jpg")),
            PathBuf::from("uploads/car.jpg.damage.json")
        );
    }

    #[test]
    fn test_reads_boxes() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("car.jpg");
        std::fs::write(
            dir.path().join("car.jpg.parts.json"),
            r#"[{"bbox": [0, 0, 100, 100], "class_id": 8}]"#,
        )
        .unwrap();

        let boxes = SidecarDetector::parts().detect(&image).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].class_id, 8);
        assert_eq!(boxes[0].confidence, 0.0);
    }

    #[test]
    fn test_missing_sidecar_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = SidecarDetector::damage()
            .detect(&dir.path().join("nothing.jpg"))
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Unavailable(_)));
    }

    #[test]
    fn test_malformed_sidecar_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("car.jpg.damage.json"), "{not json").unwrap();

        let err = SidecarDetector::damage()
            .detect(&dir.path().join("car.jpg"))
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Failed(_)));
    }

    #[test]
    fn test_tempdir_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std::fs::write(root.join("car.jpg.damage.json"), "[]").unwrap();
        assert!(SidecarDetector::damage().detect(&root.join("car.jpg")).unwrap().is_empty());

        drop(dir);
        assert!(!root.exists());
    }
}
