//! Tests for the end-to-end percentage classification pass

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use indicatif::ProgressBar;
    use soilmix::SoilError;
    use soilmix::analysis::pipeline::count_tiles;
    use soilmix::analysis::{PassConfig, classify_image};
    use soilmix::io::error::computation_error;
    use soilmix::model::{Classifier, Prediction, SoilLabel};
    use tempfile::TempDir;

    const RED: Rgb<u8> = Rgb([220, 20, 20]);
    const GREEN: Rgb<u8> = Rgb([20, 220, 20]);
    const BLUE: Rgb<u8> = Rgb([20, 20, 220]);

    // Red tiles are gravel, green sand, blue silt
    fn by_color(tile: &RgbImage) -> SoilLabel {
        let center = tile.get_pixel(tile.width() / 2, tile.height() / 2).0;
        if center[0] > center[1] && center[0] > center[2] {
            SoilLabel::Gravel
        } else if center[1] > center[2] {
            SoilLabel::Sand
        } else {
            SoilLabel::Silt
        }
    }

    // Top band red, two middle bands green, bottom band blue
    fn banded(size: u32) -> RgbImage {
        let band = size / 4;
        RgbImage::from_fn(size, size, |_, y| match y / band {
            0 => RED,
            1 | 2 => GREEN,
            _ => BLUE,
        })
    }

    struct Failing;

    impl Classifier for Failing {
        fn predict(&self, _tile: &RgbImage) -> soilmix::Result<Prediction> {
            Err(computation_error("predict", &"model unavailable"))
        }
    }

    #[test]
    fn test_banded_photo_reports_quarter_half_quarter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("banded.png");
        banded(1024).save(&path).unwrap();

        let pass = classify_image(&path, &by_color, &PassConfig::default(), None).unwrap();

        assert_eq!(pass.tiles, 16);
        assert_eq!(pass.report.counted(), 16);
        assert_eq!(pass.report.fraction(SoilLabel::Gravel), Some(0.25));
        assert_eq!(pass.report.fraction(SoilLabel::Sand), Some(0.5));
        assert_eq!(pass.report.fraction(SoilLabel::Silt), Some(0.25));
    }

    #[test]
    fn test_whole_canvas_is_aggregated_not_first_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("banded.png");
        banded(1024).save(&path).unwrap();

        let pass = classify_image(&path, &by_color, &PassConfig::default(), None).unwrap();

        // A first-row-only pass would report pure gravel
        assert!(pass.report.fraction(SoilLabel::Silt).unwrap_or(0.0) > 0.0);
    }

    #[test]
    fn test_photo_is_resized_to_canonical_canvas() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("large.png");
        banded(2048).save(&path).unwrap();

        let pass = classify_image(&path, &by_color, &PassConfig::default(), None).unwrap();

        assert_eq!(pass.tiles, 16);
        assert_eq!(pass.report.fraction(SoilLabel::Sand), Some(0.5));
    }

    #[test]
    fn test_out_of_set_tiles_shrink_denominator() {
        let canvas = banded(1024);
        // Two tiles in the sand band come back as clay
        let classifier = |tile: &RgbImage| {
            if tile.get_pixel(0, 0).0 == [0, 0, 0] {
                SoilLabel::Clay
            } else {
                by_color(tile)
            }
        };
        let mut marked = canvas;
        for (x, y) in [(0, 256), (256, 256)] {
            marked.put_pixel(x, y, Rgb([0, 0, 0]));
        }

        let counts = count_tiles(&marked, &classifier, &PassConfig::default(), None).unwrap();
        let report = counts.proportions().unwrap();

        assert_eq!(counts.ignored(), 2);
        assert_eq!(report.counted(), 14);
        assert_eq!(counts.count(SoilLabel::Sand), 6);
        assert!((report.fraction(SoilLabel::Sand).unwrap() - 6.0 / 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_small_canvas_yields_computation_error() {
        let canvas = banded(100);
        let counts = count_tiles(&canvas, &by_color, &PassConfig::default(), None).unwrap();

        assert_eq!(counts.counted() + counts.ignored(), 0);
        assert!(matches!(
            counts.proportions(),
            Err(SoilError::Computation { .. })
        ));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let canvas = banded(512);
        let sequential = PassConfig {
            resolution: 512,
            tile_dimension: 32,
            parallel_threshold: usize::MAX,
        };
        let parallel = PassConfig {
            parallel_threshold: 1,
            ..sequential
        };

        let a = count_tiles(&canvas, &by_color, &sequential, None).unwrap();
        let b = count_tiles(&canvas, &by_color, &parallel, None).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.counted(), 256);
    }

    #[test]
    fn test_progress_bar_tracks_tiles() {
        let canvas = banded(1024);
        let bar = ProgressBar::hidden();

        count_tiles(&canvas, &by_color, &PassConfig::default(), Some(&bar)).unwrap();

        assert_eq!(bar.length(), Some(16));
        assert_eq!(bar.position(), 16);
    }

    #[test]
    fn test_classifier_failure_propagates() {
        let canvas = banded(1024);
        let result = count_tiles(&canvas, &Failing, &PassConfig::default(), None);

        assert!(matches!(result, Err(SoilError::Computation { .. })));
    }

    #[test]
    fn test_missing_photo_is_image_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.jpg");

        let result = classify_image(&path, &by_color, &PassConfig::default(), None);

        assert!(matches!(result, Err(SoilError::ImageLoad { .. })));
    }

    #[test]
    fn test_config_validation() {
        assert!(PassConfig::default().validate().is_ok());
        assert_eq!(PassConfig::default().tiles_per_image(), 16);

        let oversized = PassConfig {
            resolution: 100,
            tile_dimension: 256,
            ..PassConfig::default()
        };
        assert!(oversized.validate().is_ok());
        assert_eq!(oversized.tiles_per_image(), 0);

        let zero = PassConfig {
            tile_dimension: 0,
            ..PassConfig::default()
        };
        assert!(zero.validate().is_err());
        assert_eq!(zero.tiles_per_image(), 0);
    }

    #[test]
    fn test_tile_larger_than_canvas_counts_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.png");
        banded(100).save(&path).unwrap();
        let config = PassConfig {
            resolution: 100,
            tile_dimension: 256,
            ..PassConfig::default()
        };

        let result = classify_image(&path, &by_color, &config, None);

        assert!(matches!(
            result,
            Err(SoilError::Computation {
                operation: "proportions",
                ..
            })
        ));
    }
}
