//! Tests for classification constants

#[cfg(test)]
mod tests {
    use soilmix::io::configuration::{
        CANONICAL_RESOLUTION, DATASET_TILE_DIMENSION, MODEL_INPUT_SIZE, REPORTED_LABELS,
        TILE_DIMENSION,
    };
    use soilmix::model::SoilLabel;

    #[test]
    fn test_canonical_canvas_tiles_evenly() {
        assert_eq!(CANONICAL_RESOLUTION % TILE_DIMENSION, 0);
        assert_eq!((CANONICAL_RESOLUTION / TILE_DIMENSION).pow(2), 16);
    }

    #[test]
    fn test_tiles_match_model_input() {
        assert_eq!(TILE_DIMENSION as usize, MODEL_INPUT_SIZE);
        assert!(DATASET_TILE_DIMENSION < TILE_DIMENSION);
    }

    #[test]
    fn test_reported_labels_order() {
        assert_eq!(
            REPORTED_LABELS,
            [SoilLabel::Gravel, SoilLabel::Sand, SoilLabel::Silt]
        );
    }
}
