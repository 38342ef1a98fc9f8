use proptest::prelude::*;
use strategy::PriceWindowStore;

proptest! {
    /// The window never grows past its capacity, whatever the tick volume.
    #[test]
    fn window_length_is_bounded(prices in prop::collection::vec(0.01f64..100_000.0, 0..600)) {
        let store = PriceWindowStore::new(["X"]);
        for &p in &prices {
            store.append("X", p).unwrap();
            prop_assert!(store.len("X") <= 200);
        }
        prop_assert_eq!(store.len("X"), prices.len().min(200));
    }

    /// Fewer samples than the period always means "undefined".
    #[test]
    fn moving_average_undefined_below_period(
        prices in prop::collection::vec(0.01f64..100_000.0, 0..50),
        period in 1usize..200,
    ) {
        let store = PriceWindowStore::new(["X"]);
        for &p in &prices {
            store.append("X", p).unwrap();
        }
        let sma = store.moving_average("X", period);
        if prices.len() < period {
            prop_assert!(sma.is_none());
        } else {
            prop_assert!(sma.is_some());
        }
    }

    /// With enough samples the average covers exactly the latest `period`
    /// prices; anything evicted past capacity is unreachable.
    #[test]
    fn moving_average_is_mean_of_most_recent(
        prices in prop::collection::vec(0.01f64..1_000.0, 1..500),
        period in 1usize..=200,
    ) {
        let store = PriceWindowStore::new(["X"]);
        for &p in &prices {
            store.append("X", p).unwrap();
        }
        let retained = &prices[prices.len().saturating_sub(200)..];
        match store.moving_average("X", period) {
            Some(avg) => {
                prop_assert!(retained.len() >= period);
                let tail = &retained[retained.len() - period..];
                let expected = tail.iter().sum::<f64>() / period as f64;
                prop_assert!((avg - expected).abs() < 1e-6, "avg {} != expected {}", avg, expected);
            }
            None => prop_assert!(retained.len() < period),
        }
    }
}
