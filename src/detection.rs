use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DetectionConfig;
use crate::events::{DetectionEvent, GeoPoint};

/// Uniform randomness for coordinates, image choice and timer delays.
///
/// Seeded from the CLI for reproducible runs, otherwise from OS entropy.
#[derive(Debug)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Uniform real in `[min, max)`; collapses to `min` when the range is empty.
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max > min {
            self.rng.random_range(min..max)
        } else {
            min
        }
    }

    /// Uniform index in `[0, n)`.
    pub fn uniform_index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        self.rng.random_range(0..n)
    }

    /// Whole-millisecond delay in `[min, max]`, both ends inclusive.
    pub fn delay_between(&mut self, min: Duration, max: Duration) -> Duration {
        let lo = min.as_millis() as u64;
        let hi = (max.as_millis() as u64).max(lo);
        Duration::from_millis(self.rng.random_range(lo..=hi))
    }
}

/// Produces random points inside the configured surveillance box, rendered
/// with six fractional digits.
#[derive(Debug, Clone)]
pub struct CoordinateGenerator {
    lat_origin: f64,
    lat_span: f64,
    lng_origin: f64,
    lng_span: f64,
}

impl CoordinateGenerator {
    pub fn new(cfg: &DetectionConfig) -> Self {
        Self {
            lat_origin: cfg.lat_origin,
            lat_span: cfg.lat_span,
            lng_origin: cfg.lng_origin,
            lng_span: cfg.lng_span,
        }
    }

    pub fn generate(&self, random: &mut RandomSource) -> GeoPoint {
        let lat = self.lat_origin + random.uniform(0.0, self.lat_span);
        let lng = self.lng_origin + random.uniform(0.0, self.lng_span);
        GeoPoint {
            lat: format!("{lat:.6}"),
            lng: format!("{lng:.6}"),
        }
    }
}

/// Anti-repeat image picker: rejection sampling against a window of recent
/// selections. A window of 1 means "never the same image twice in a row".
#[derive(Debug, Clone)]
pub struct ImageIndexSelector {
    avoid_last: usize,
    history: VecDeque<usize>,
}

impl ImageIndexSelector {
    pub fn new(avoid_last: usize) -> Self {
        Self {
            avoid_last,
            history: VecDeque::new(),
        }
    }

    /// Record a selection made outside the picker (the startup display).
    pub fn remember(&mut self, index: usize) {
        if self.avoid_last == 0 {
            return;
        }
        self.history.push_back(index);
        while self.history.len() > self.avoid_last {
            self.history.pop_front();
        }
    }

    pub fn select_next(&mut self, catalog_size: usize, random: &mut RandomSource) -> usize {
        if catalog_size <= 1 {
            self.remember(0);
            return 0;
        }
        // Cap the exclusion window below the catalog size so at least one
        // index is always admissible and the loop terminates.
        let window = self.avoid_last.min(catalog_size - 1);
        loop {
            let draw = random.uniform_index(catalog_size);
            let excluded = self.history.iter().rev().take(window).any(|&i| i == draw);
            if !excluded {
                self.remember(draw);
                return draw;
            }
        }
    }
}

/// Composes a coordinate, an image selection and a clock reading into one
/// immutable detection record.
#[derive(Debug)]
pub struct DetectionEventFactory {
    coordinates: CoordinateGenerator,
    selector: ImageIndexSelector,
    catalog_size: usize,
    random: RandomSource,
}

impl DetectionEventFactory {
    /// `initial_index` is what the display shows before any detection; the
    /// first fabricated event must already differ from it.
    pub fn new(
        cfg: &DetectionConfig,
        catalog_size: usize,
        initial_index: usize,
        seed: Option<u64>,
    ) -> Self {
        let mut selector = ImageIndexSelector::new(cfg.avoid_last);
        selector.remember(initial_index);
        Self {
            coordinates: CoordinateGenerator::new(cfg),
            selector,
            catalog_size,
            random: RandomSource::from_seed(seed),
        }
    }

    /// The coordinates shown at startup, before any detection exists.
    pub fn startup_point(&mut self) -> GeoPoint {
        self.coordinates.generate(&mut self.random)
    }

    pub fn create(&mut self, now: DateTime<Local>) -> DetectionEvent {
        let image_index = self.selector.select_next(self.catalog_size, &mut self.random);
        let coordinates = self.coordinates.generate(&mut self.random);
        DetectionEvent {
            image_index,
            coordinates,
            timestamp: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;

    fn seeded(seed: u64) -> RandomSource {
        RandomSource::from_seed(Some(seed))
    }

    #[test]
    fn consecutive_selections_differ() {
        let mut random = seeded(7);
        let mut selector = ImageIndexSelector::new(1);
        let mut last = None;
        for _ in 0..500 {
            let next = selector.select_next(6, &mut random);
            assert!(next < 6);
            if let Some(prev) = last {
                assert_ne!(next, prev);
            }
            last = Some(next);
        }
    }

    #[test]
    fn single_entry_catalog_always_returns_zero() {
        let mut random = seeded(11);
        let mut selector = ImageIndexSelector::new(1);
        selector.remember(0);
        for _ in 0..20 {
            assert_eq!(selector.select_next(1, &mut random), 0);
        }
    }

    #[test]
    fn empty_history_accepts_the_first_draw() {
        // With no prior selection the picker must pass the draw through
        // untouched: an identically seeded source predicts it.
        let mut expected_rng = seeded(42);
        let expected = expected_rng.uniform_index(6);

        let mut random = seeded(42);
        let mut selector = ImageIndexSelector::new(1);
        assert_eq!(selector.select_next(6, &mut random), expected);
    }

    #[test]
    fn primed_history_is_never_repeated() {
        for seed in 0..50 {
            let mut random = seeded(seed);
            let mut selector = ImageIndexSelector::new(1);
            selector.remember(2);
            assert_ne!(selector.select_next(6, &mut random), 2);
        }
    }

    #[test]
    fn wider_window_skips_recent_selections() {
        let mut random = seeded(3);
        let mut selector = ImageIndexSelector::new(3);
        let mut recent: Vec<usize> = Vec::new();
        for _ in 0..300 {
            let next = selector.select_next(8, &mut random);
            assert!(
                !recent.iter().rev().take(3).any(|&i| i == next),
                "{next} repeats within the last 3 of {recent:?}"
            );
            recent.push(next);
        }
    }

    #[test]
    fn window_is_capped_below_catalog_size() {
        // Window 5 over a 2-entry catalog must still terminate and alternate.
        let mut random = seeded(9);
        let mut selector = ImageIndexSelector::new(5);
        let mut last = None;
        for _ in 0..50 {
            let next = selector.select_next(2, &mut random);
            if let Some(prev) = last {
                assert_ne!(next, prev);
            }
            last = Some(next);
        }
    }

    #[test]
    fn coordinates_stay_in_bounds_with_six_digits() {
        let cfg = DetectionConfig::default();
        let generator = CoordinateGenerator::new(&cfg);
        let mut random = seeded(5);
        for _ in 0..200 {
            let point = generator.generate(&mut random);
            let lat: f64 = point.lat.parse().unwrap();
            let lng: f64 = point.lng.parse().unwrap();
            assert!((18.9..19.1).contains(&lat), "lat out of range: {lat}");
            assert!((72.8..73.0).contains(&lng), "lng out of range: {lng}");
            assert_eq!(point.lat.split('.').nth(1).unwrap().len(), 6);
            assert_eq!(point.lng.split('.').nth(1).unwrap().len(), 6);
        }
    }

    #[test]
    fn zero_span_collapses_to_origin() {
        let cfg = DetectionConfig {
            lat_span: 0.0,
            lng_span: 0.0,
            ..DetectionConfig::default()
        };
        let generator = CoordinateGenerator::new(&cfg);
        let mut random = seeded(1);
        let point = generator.generate(&mut random);
        assert_eq!(point.lat, "18.900000");
        assert_eq!(point.lng, "72.800000");
    }

    #[test]
    fn delays_are_inclusive_of_both_bounds() {
        let mut random = seeded(13);
        let min = Duration::from_millis(50);
        let max = Duration::from_millis(100);
        for _ in 0..500 {
            let delay = random.delay_between(min, max);
            assert!(delay >= min && delay <= max, "delay out of range: {delay:?}");
        }
    }

    #[test]
    fn factory_avoids_the_startup_index() {
        let cfg = DetectionConfig::default();
        for seed in 0..20 {
            let mut factory = DetectionEventFactory::new(&cfg, 6, 0, Some(seed));
            let event = factory.create(Local::now());
            assert_ne!(event.image_index, 0);
            assert!(event.image_index < 6);
        }
    }

    #[test]
    fn factory_events_never_repeat_back_to_back() {
        let cfg = DetectionConfig::default();
        let mut factory = DetectionEventFactory::new(&cfg, 6, 0, Some(77));
        let mut last = 0;
        for _ in 0..100 {
            let event = factory.create(Local::now());
            assert_ne!(event.image_index, last);
            last = event.image_index;
        }
    }
}
