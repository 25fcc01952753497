//! Tests for error formatting and source chaining

#[cfg(test)]
mod tests {
    use soilmix::SoilError;
    use soilmix::io::error::{computation_error, file_system_error, invalid_parameter};
    use std::error::Error;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_invalid_parameter_message() {
        let err = invalid_parameter("tile_dimension", &0, &"must be positive");

        assert_eq!(
            err.to_string(),
            "Invalid parameter 'tile_dimension' = '0': must be positive"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_computation_message() {
        let err = computation_error("proportions", &"no tiles were counted");

        assert_eq!(
            err.to_string(),
            "Computation error in proportions: no tiles were counted"
        );
    }

    #[test]
    fn test_file_system_error_chains_source() {
        let err = file_system_error(
            "/data/Sand",
            "read directory",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );

        assert!(err.to_string().contains("read directory on '/data/Sand'"));
        assert_eq!(err.source().map(ToString::to_string), Some("denied".to_string()));
    }

    #[test]
    fn test_model_format_message() {
        let err = SoilError::ModelFormat {
            layer: "output.weights".to_string(),
            expected: vec![3, 28],
            found: vec![5, 28],
        };

        assert_eq!(
            err.to_string(),
            "Model tensor 'output.weights' has shape [5, 28], expected [3, 28]"
        );
    }

    #[test]
    fn test_image_load_error_names_path_and_chains_source() {
        let err = SoilError::ImageLoad {
            path: PathBuf::from("/data/Sand/site.jpg"),
            source: image::ImageError::IoError(io::Error::other("disk gone")),
        };

        assert!(err.to_string().starts_with("Failed to load image '/data/Sand/site.jpg'"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_model_export_message() {
        let err = SoilError::ModelExport {
            path: PathBuf::from("models/soil.mpk"),
            reason: "disk full".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Failed to export model to 'models/soil.mpk': disk full"
        );
        assert!(err.source().is_none());
    }
}
