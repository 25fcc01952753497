//! Tests for predictions and the classifier seam

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use soilmix::SoilError;
    use soilmix::model::{Classifier, Prediction, SoilLabel};

    #[test]
    fn test_top_picks_highest_score() {
        let prediction = Prediction::new(vec![
            (SoilLabel::Gravel, 0.1),
            (SoilLabel::Sand, 0.7),
            (SoilLabel::Silt, 0.2),
        ]);

        assert_eq!(prediction.top().unwrap(), SoilLabel::Sand);
        assert_eq!(prediction.score(SoilLabel::Silt), Some(0.2));
        assert_eq!(prediction.score(SoilLabel::Clay), None);
    }

    #[test]
    fn test_ties_resolve_to_earliest_output() {
        let prediction = Prediction::new(vec![
            (SoilLabel::Silt, 0.4),
            (SoilLabel::Gravel, 0.4),
            (SoilLabel::Sand, 0.2),
        ]);

        assert_eq!(prediction.top().unwrap(), SoilLabel::Silt);
    }

    #[test]
    fn test_nan_scores_are_skipped() {
        let prediction = Prediction::new(vec![(SoilLabel::Gravel, f32::NAN), (SoilLabel::Sand, 0.1)]);
        assert_eq!(prediction.top().unwrap(), SoilLabel::Sand);

        let unusable = Prediction::new(vec![(SoilLabel::Gravel, f32::NAN)]);
        assert!(matches!(unusable.top(), Err(SoilError::Computation { .. })));
    }

    #[test]
    fn test_empty_prediction_is_error() {
        assert!(Prediction::new(Vec::new()).top().is_err());
    }

    #[test]
    fn test_closures_are_classifiers() {
        let tile = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let always_silt = |_: &RgbImage| SoilLabel::Silt;

        assert_eq!(always_silt.classify(&tile).unwrap(), SoilLabel::Silt);
        assert_eq!(
            always_silt.predict(&tile).unwrap(),
            Prediction::certain(SoilLabel::Silt)
        );
    }

    #[test]
    fn test_default_classify_uses_prediction() {
        struct Fixed;

        impl Classifier for Fixed {
            fn predict(&self, _tile: &RgbImage) -> soilmix::Result<Prediction> {
                Ok(Prediction::new(vec![
                    (SoilLabel::Clay, 0.3),
                    (SoilLabel::Humus, 0.6),
                ]))
            }
        }

        let tile = RgbImage::new(4, 4);
        assert_eq!(Fixed.classify(&tile).unwrap(), SoilLabel::Humus);
    }
}
