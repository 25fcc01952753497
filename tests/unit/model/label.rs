//! Tests for soil label names and parsing

#[cfg(test)]
mod tests {
    use soilmix::SoilError;
    use soilmix::model::SoilLabel;

    #[test]
    fn test_names_round_trip_through_parse() {
        for label in SoilLabel::ALL {
            assert_eq!(label.name().parse::<SoilLabel>().unwrap(), label);
            assert_eq!(label.to_string(), label.name());
        }
    }

    #[test]
    fn test_parse_ignores_case_and_whitespace() {
        assert_eq!("gravel".parse::<SoilLabel>().unwrap(), SoilLabel::Gravel);
        assert_eq!("  SILT\n".parse::<SoilLabel>().unwrap(), SoilLabel::Silt);
    }

    #[test]
    fn test_unknown_label_keeps_text() {
        let err = "loam".parse::<SoilLabel>().unwrap_err();

        assert!(matches!(&err, SoilError::UnknownLabel { text } if text == "loam"));
        assert_eq!(err.to_string(), "Unknown soil label 'loam'");
    }

    #[test]
    fn test_training_order() {
        let mut sorted = SoilLabel::ALL;
        sorted.sort();

        assert_eq!(sorted, SoilLabel::ALL);
        assert_eq!(SoilLabel::ALL.first(), Some(&SoilLabel::Clay));
    }
}
