//! Tests for multi-file progress bookkeeping

#[cfg(test)]
mod tests {
    use soilmix::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;
    use soilmix::io::progress::ProgressManager;
    use std::path::Path;

    #[test]
    fn test_small_batches_keep_individual_bars() {
        let mut manager = ProgressManager::new();
        manager.initialize(MAX_INDIVIDUAL_PROGRESS_BARS);

        assert!(!manager.is_batched());
    }

    #[test]
    fn test_large_batches_switch_mode() {
        let mut manager = ProgressManager::default();
        manager.initialize(MAX_INDIVIDUAL_PROGRESS_BARS + 1);

        assert!(manager.is_batched());
    }

    #[test]
    fn test_file_bar_lifecycle() {
        let mut manager = ProgressManager::new();
        manager.initialize(1);

        let bar = manager.start_file(Path::new("/photos/site-3.jpg"), "tiles");
        bar.set_length(16);
        bar.inc(16);
        manager.complete_file(&bar);
        manager.finish();

        assert_eq!(bar.prefix(), "site-3.jpg");
        assert_eq!(bar.position(), 16);
        assert!(bar.is_finished());
    }
}
