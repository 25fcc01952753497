//! Tests for labeled sample discovery

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use soilmix::SoilError;
    use soilmix::dataset::samples::{class_directory, collect_samples, list_images};
    use soilmix::model::SoilLabel;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_image(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(4, 4, Rgb([90, 60, 30])).save(path).unwrap();
    }

    #[test]
    fn test_labels_come_from_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_image(&root.join("Sand/b.png"));
        write_image(&root.join("Sand/a.png"));
        write_image(&root.join("silt/x.png"));

        let samples = collect_samples(root).unwrap();

        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|s| s.path.starts_with(root)));
        let sand: Vec<_> = samples
            .iter()
            .filter(|s| s.label == SoilLabel::Sand)
            .map(|s| s.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(sand, vec!["a.png", "b.png"]);
        assert_eq!(
            samples
                .iter()
                .filter(|s| s.label == SoilLabel::Silt)
                .count(),
            1
        );
    }

    #[test]
    fn test_unknown_directories_and_files_skipped() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_image(&root.join("Gravel/g.png"));
        write_image(&root.join("Pebbles/p.png"));
        fs::write(root.join("Gravel/desktop.ini"), "[meta]").unwrap();
        fs::write(root.join("Gravel/notes.txt"), "not an image").unwrap();
        fs::write(root.join("readme.png"), "loose file").unwrap();

        let samples = collect_samples(root).unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(samples.first().map(|s| s.label), Some(SoilLabel::Gravel));
    }

    #[test]
    fn test_list_images_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write_image(&dir.path().join("c.jpg"));
        write_image(&dir.path().join("a.png"));
        fs::rename(dir.path().join("a.png"), dir.path().join("A.PNG")).unwrap();
        write_image(&dir.path().join("b.ini.png"));
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let files = list_images(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["A.PNG", "c.jpg"]);
    }

    #[test]
    fn test_class_directory_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("clay")).unwrap();

        let found = class_directory(dir.path(), SoilLabel::Clay).unwrap();
        let missing = class_directory(dir.path(), SoilLabel::Humus).unwrap();

        assert_eq!(found, Some(dir.path().join("clay")));
        assert_eq!(missing, None);
    }

    #[test]
    fn test_missing_root_is_file_system_error() {
        let dir = TempDir::new().unwrap();
        let result = collect_samples(&dir.path().join("absent"));

        assert!(matches!(result, Err(SoilError::FileSystem { .. })));
    }
}
