//! Tests for random geometric augmentation

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use soilmix::SoilError;
    use soilmix::dataset::augment::{
        AugmentationConfig, Augmenter, Transform, augment_dataset,
    };
    use soilmix::model::SoilLabel;
    use std::fs;
    use tempfile::TempDir;

    fn quadrants(size: u32) -> RgbImage {
        let half = size / 2;
        RgbImage::from_fn(size, size, |x, y| match (x < half, y < half) {
            (true, true) => Rgb([255, 0, 0]),
            (false, true) => Rgb([0, 255, 0]),
            (true, false) => Rgb([0, 0, 255]),
            (false, false) => Rgb([255, 255, 255]),
        })
    }

    #[test]
    fn test_identity_preserves_image() {
        let image = quadrants(32);

        assert_eq!(Transform::IDENTITY.apply(&image, 32), image);
    }

    #[test]
    fn test_apply_resizes_to_requested_size() {
        let image = quadrants(40);

        let out = Transform::IDENTITY.apply(&image, 16);

        assert_eq!(out.dimensions(), (16, 16));
    }

    #[test]
    fn test_flip_mirrors_horizontally() {
        let image = quadrants(32);
        let flip = Transform {
            flip: true,
            ..Transform::IDENTITY
        };

        let out = flip.apply(&image, 32);

        assert_eq!(out.get_pixel(0, 0), image.get_pixel(31, 0));
        assert_eq!(out.get_pixel(31, 31), image.get_pixel(0, 31));
    }

    #[test]
    fn test_samples_stay_within_ranges() {
        let config = AugmentationConfig::default();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let t = config.sample(&mut rng);
            assert!(t.rotation_degrees.abs() <= config.rotation_range);
            assert!(t.shear_degrees.abs() <= config.shear_range);
            assert!((t.zoom_x - 1.0).abs() <= config.zoom_range + 1e-12);
            assert!((t.zoom_y - 1.0).abs() <= config.zoom_range + 1e-12);
            assert!(t.shift_x.abs() <= config.width_shift_range);
            assert!(t.shift_y.abs() <= config.height_shift_range);
        }
    }

    #[test]
    fn test_zero_ranges_sample_identity() {
        let config = AugmentationConfig {
            horizontal_flip: false,
            zoom_range: 0.0,
            rotation_range: 0.0,
            shear_range: 0.0,
            height_shift_range: 0.0,
            width_shift_range: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(config.sample(&mut rng), Transform::IDENTITY);
    }

    #[test]
    fn test_same_seed_same_variants() {
        let image = quadrants(24);
        let mut a = Augmenter::new(AugmentationConfig::default(), 24, 99).unwrap();
        let mut b = Augmenter::new(AugmentationConfig::default(), 24, 99).unwrap();

        for _ in 0..3 {
            assert_eq!(a.variant(&image), b.variant(&image));
        }
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let negative = AugmentationConfig {
            rotation_range: -1.0,
            ..AugmentationConfig::default()
        };
        let collapsing = AugmentationConfig {
            zoom_range: 1.0,
            ..AugmentationConfig::default()
        };

        assert!(matches!(
            negative.validate(),
            Err(SoilError::InvalidParameter {
                parameter: "rotation_range",
                ..
            })
        ));
        assert!(collapsing.validate().is_err());
        assert!(Augmenter::new(AugmentationConfig::default(), 0, 1).is_err());
        assert!(Augmenter::with_defaults(1).is_ok());
    }

    #[test]
    fn test_augment_dataset_writes_variants() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let sand = input.path().join("Sand");
        fs::create_dir_all(&sand).unwrap();
        quadrants(20).save(sand.join("one.png")).unwrap();
        quadrants(20).save(sand.join("two.png")).unwrap();
        let mut augmenter = Augmenter::new(AugmentationConfig::default(), 16, 3).unwrap();

        let summary = augment_dataset(
            input.path(),
            output.path(),
            &[SoilLabel::Sand, SoilLabel::Silt],
            3,
            &mut augmenter,
            None,
        )
        .unwrap();

        assert_eq!(summary.images, 2);
        assert_eq!(summary.variants, 6);
        let written = output.path().join("Sand/one_png_aug2.jpg");
        assert_eq!(image::image_dimensions(&written).unwrap(), (16, 16));
        assert!(!output.path().join("Silt").exists());
    }
}
