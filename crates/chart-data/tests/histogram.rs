// File: crates/chart-data/tests/histogram.rs
// Purpose: Bin derivation, placement and aggregation through the public binning API.

use chart_data::{
    bin_rows, derive_bins, place_data_in_bins, row, ConfigError, HistogramAggregation, HistogramOptions, Row, Value,
};

fn xs(values: &[f64]) -> Vec<Row> {
    values.iter().map(|&x| row! { "x" => x }).collect()
}

fn xys(values: &[(f64, f64)]) -> Vec<Row> {
    values.iter().map(|&(x, y)| row! { "x" => x, "y" => y }).collect()
}

fn tens() -> Vec<Row> {
    xs(&(0..=10).map(|i| i as f64 * 10.0).collect::<Vec<_>>())
}

fn scattered(n: usize, offset: f64, spread: f64) -> Vec<Row> {
    let values: Vec<f64> = (0..n).map(|i| offset + ((i * 7919) % 1000) as f64 / 1000.0 * spread).collect();
    xs(&values)
}

fn assert_contiguous(domains: &[[f64; 2]]) {
    for w in domains.windows(2) {
        assert_eq!(w[0][1], w[1][0], "bins {:?} and {:?} are not contiguous", w[0], w[1]);
    }
}

#[test]
fn bin_count_gives_exactly_that_many_contiguous_bins() {
    let options = HistogramOptions { bin_count: Some(4), ..HistogramOptions::new("x") };
    let data = bin_rows(&tens(), &options).unwrap();

    let domains: Vec<_> = data.bins.iter().map(|b| b.domain).collect();
    assert_eq!(domains, vec![[0.0, 25.0], [25.0, 50.0], [50.0, 75.0], [75.0, 100.0]]);
    let frequencies: Vec<_> = data.bins.iter().map(|b| b.frequency).collect();
    assert_eq!(frequencies, vec![3, 3, 2, 3]);
    assert_eq!(data.x_domain, vec![0.0, 100.0]);
    assert_eq!(data.y_domain, [0.0, 3.0]);
}

#[test]
fn bin_count_covers_the_data_for_any_count() {
    for (offset, spread) in [(0.0, 100.0), (13.0, 250.0), (-40.0, 17.0), (1000.0, 5.0)] {
        let rows = scattered(200, offset, spread);
        let finite: Vec<f64> = rows.iter().filter_map(|r| r["x"].as_finite_number()).collect();
        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        for count in 1..=12 {
            let bins = derive_bins(&rows, "x", None, Some(count));
            assert_eq!(bins.len(), count);
            assert_contiguous(&bins);
            assert!(bins[0][0] <= min, "first bin {:?} starts after {min}", bins[0]);
            assert!(bins[count - 1][1] >= max, "last bin {:?} ends before {max}", bins[count - 1]);

            let placed = place_data_in_bins(&rows, "x", &bins);
            let total: usize = placed.iter().map(|b| b.frequency).sum();
            assert_eq!(total, rows.len());
        }
    }
}

#[test]
fn automatic_bins_follow_nice_ticks_with_a_leading_bin() {
    let bins = derive_bins(&tens(), "x", None, None);
    assert_eq!(bins.len(), 12);
    assert_eq!(bins[0], [-10.0, 0.0]);
    assert_eq!(bins[1], [0.0, 10.0]);
    assert_eq!(bins[11], [100.0, 110.0]);
    assert_contiguous(&bins);
}

#[test]
fn trailing_empty_bins_are_not_emitted() {
    // the maximum sits on the last tick, so the final [100, 110] bin is never reached
    let data = bin_rows(&tens(), &HistogramOptions::new("x")).unwrap();
    assert_eq!(data.bins.len(), 11);
    assert_eq!(data.bins[0].domain, [-10.0, 0.0]);
    assert_eq!(data.bins[10].domain, [90.0, 100.0]);
    // each value sits on an upper edge, so every bin holds exactly one
    assert!(data.bins.iter().all(|b| b.frequency == 1));
    assert_eq!(data.x_domain, vec![-10.0, 100.0]);
}

#[test]
fn interior_empty_bins_are_kept() {
    let bins = [[0.0, 10.0], [10.0, 20.0], [20.0, 30.0], [30.0, 40.0]];
    let placed = place_data_in_bins(&xs(&[1.0, 25.0]), "x", &bins);
    assert_eq!(placed.iter().map(|b| b.frequency).collect::<Vec<_>>(), vec![1, 0, 1]);

    let none = place_data_in_bins(&[], "x", &[[0.0, 10.0], [10.0, 20.0]]);
    assert_eq!(none.len(), 1);
}

#[test]
fn automatic_bins_place_every_finite_row() {
    let rows = scattered(500, 3.0, 97.0);
    let data = bin_rows(&rows, &HistogramOptions::new("x")).unwrap();
    assert_contiguous(&data.bins.iter().map(|b| b.domain).collect::<Vec<_>>());
    let total: usize = data.bins.iter().map(|b| b.frequency).sum();
    assert_eq!(total, rows.len());
}

#[test]
fn explicit_bins_are_used_verbatim() {
    let explicit = vec![[0.0, 10.0], [10.0, 50.0], [60.0, 70.0]];
    let options = HistogramOptions { bins: Some(explicit.clone()), ..HistogramOptions::new("x") };
    let data = bin_rows(&tens(), &options).unwrap();

    assert_eq!(data.bins.iter().map(|b| b.domain).collect::<Vec<_>>(), explicit);
    // 0,10 | 20..50 | 60,70; 80..100 lie beyond the last bin
    assert_eq!(data.bins.iter().map(|b| b.frequency).collect::<Vec<_>>(), vec![2, 4, 2]);
    assert_eq!(data.x_domain, vec![0.0, 70.0]);
}

#[test]
fn bin_count_overrides_explicit_bins() {
    let options = HistogramOptions {
        bins: Some(vec![[0.0, 1.0]]),
        bin_count: Some(4),
        ..HistogramOptions::new("x")
    };
    assert_eq!(bin_rows(&tens(), &options).unwrap().bins.len(), 4);
}

#[test]
fn upper_edge_belongs_to_the_lower_bin() {
    let placed = place_data_in_bins(&xs(&[10.0, 10.0, 10.5]), "x", &[[0.0, 10.0], [10.0, 20.0]]);
    assert_eq!(placed[0].data, vec![0, 1]);
    assert_eq!(placed[1].data, vec![2]);
}

#[test]
fn placement_is_independent_of_row_order() {
    let mut rows = scattered(100, 0.0, 50.0);
    let bins = derive_bins(&rows, "x", None, Some(5));
    let before: Vec<_> = place_data_in_bins(&rows, "x", &bins).iter().map(|b| b.frequency).collect();
    rows.reverse();
    let after: Vec<_> = place_data_in_bins(&rows, "x", &bins).iter().map(|b| b.frequency).collect();
    assert_eq!(before, after);
}

#[test]
fn binning_twice_gives_the_same_result() {
    let rows = scattered(300, -5.0, 60.0);
    for options in [
        HistogramOptions::new("x"),
        HistogramOptions { bin_count: Some(7), ..HistogramOptions::new("x") },
        HistogramOptions {
            bins: Some(vec![[-5.0, 10.0], [20.0, 40.0]]),
            ..HistogramOptions::new("x")
        },
    ] {
        assert_eq!(bin_rows(&rows, &options).unwrap(), bin_rows(&rows, &options).unwrap());
    }
    let bins = derive_bins(&rows, "x", None, Some(4));
    assert_eq!(place_data_in_bins(&rows, "x", &bins), place_data_in_bins(&rows, "x", &bins));
}

#[test]
fn unusable_x_values_are_dropped() {
    let mut rows = xs(&[1.0, 2.0, f64::NAN, 3.0, f64::INFINITY]);
    rows.push(row! { "x" => "abc" });
    rows.push(row! { "x" => Value::Null });
    rows.push(row! { "y" => 1 });

    let data = bin_rows(&rows, &HistogramOptions { bin_count: Some(2), ..HistogramOptions::new("x") }).unwrap();
    let total: usize = data.bins.iter().map(|b| b.frequency).sum();
    assert_eq!(total, 3);
    assert!(data.bins.iter().flat_map(|b| &b.data).all(|&i| matches!(i, 0 | 1 | 3)));
}

#[test]
fn mean_without_y_key_is_count() {
    let rows = xys(&[(1.0, 100.0), (2.0, 200.0), (15.0, 5.0)]);
    let bins = Some(vec![[0.0, 10.0], [10.0, 20.0]]);
    let count = bin_rows(&rows, &HistogramOptions { bins: bins.clone(), ..HistogramOptions::new("x") }).unwrap();
    let mean = bin_rows(
        &rows,
        &HistogramOptions { bins, aggregation: HistogramAggregation::Mean, ..HistogramOptions::new("x") },
    )
    .unwrap();

    assert_eq!(mean, count);
    assert_eq!(mean.bins.iter().map(|b| b.aggregated_value).collect::<Vec<_>>(), vec![2.0, 1.0]);
}

#[test]
fn sum_and_mean_aggregate_the_y_column() {
    let rows = xys(&[(1.0, 2.0), (5.0, 4.0), (15.0, 10.0)]);
    let base = HistogramOptions {
        y_key: Some("y".into()),
        bins: Some(vec![[0.0, 10.0], [10.0, 20.0], [20.0, 30.0]]),
        ..HistogramOptions::new("x")
    };

    let with = |aggregation| HistogramOptions { aggregation, ..base.clone() };

    let sum = bin_rows(&rows, &with(HistogramAggregation::Sum)).unwrap();
    // [20, 30] lies past the last row and is not emitted
    assert_eq!(sum.bins.iter().map(|b| b.aggregated_value).collect::<Vec<_>>(), vec![6.0, 10.0]);
    assert_eq!(sum.y_domain, [0.0, 10.0]);

    let mean = bin_rows(&rows, &with(HistogramAggregation::Mean)).unwrap();
    assert_eq!(mean.bins.iter().map(|b| b.aggregated_value).collect::<Vec<_>>(), vec![3.0, 10.0]);

    let count = bin_rows(&rows, &base).unwrap();
    assert_eq!(count.bins.iter().map(|b| b.aggregated_value).collect::<Vec<_>>(), vec![2.0, 1.0]);
}

#[test]
fn empty_y_key_counts_as_unset() {
    let rows = xys(&[(1.0, 2.0), (5.0, 4.0)]);
    let options = HistogramOptions {
        y_key: Some(String::new()),
        aggregation: HistogramAggregation::Sum,
        bins: Some(vec![[0.0, 10.0]]),
        ..HistogramOptions::new("x")
    };
    assert_eq!(bin_rows(&rows, &options).unwrap().bins[0].aggregated_value, 2.0);
}

#[test]
fn area_plot_uses_density() {
    let rows = xs(&[1.0, 3.0, 4.0, 5.0]);
    let options = HistogramOptions {
        bins: Some(vec![[0.0, 2.0], [2.0, 6.0]]),
        area_plot: true,
        ..HistogramOptions::new("x")
    };
    let data = bin_rows(&rows, &options).unwrap();

    let heights: Vec<_> = data.bins.iter().map(|b| b.relative_height()).collect();
    assert_eq!(heights, vec![0.5, 0.75]);
    assert_eq!(data.bins[1].y(true), 0.75);
    assert_eq!(data.bins[1].y(false), 3.0);
    assert_eq!(data.y_domain, [0.0, 0.75]);
}

#[test]
fn single_value_makes_one_zero_width_bin() {
    let data = bin_rows(&xs(&[7.0, 7.0, 7.0]), &HistogramOptions::new("x")).unwrap();
    assert_eq!(data.bins.len(), 1);
    assert_eq!(data.bins[0].domain, [7.0, 7.0]);
    assert_eq!(data.bins[0].frequency, 3);
    assert_eq!(data.bins[0].relative_height(), 3.0);
    assert_eq!(data.x_domain, vec![7.0, 7.0]);
}

#[test]
fn empty_input_has_no_bins() {
    let data = bin_rows(&[], &HistogramOptions::new("x")).unwrap();
    assert!(data.bins.is_empty());
    assert!(data.x_domain.is_empty());
    assert_eq!(data.y_domain, [0.0, 1.0]);

    let counted = bin_rows(&[], &HistogramOptions { bin_count: Some(3), ..HistogramOptions::new("x") }).unwrap();
    assert!(counted.bins.is_empty());
}

#[test]
fn options_deserialize_from_camel_case_json() {
    let options: HistogramOptions = serde_json::from_str(
        r#"{ "xKey": "age", "yKey": "income", "binCount": 8, "aggregation": "mean", "areaPlot": true }"#,
    )
    .unwrap();
    assert_eq!(options.x_key, "age");
    assert_eq!(options.y_key(), Some("income"));
    assert_eq!(options.bin_count, Some(8));
    assert_eq!(options.aggregation, HistogramAggregation::Mean);
    assert!(options.area_plot);

    let defaults: HistogramOptions = serde_json::from_str(r#"{ "xKey": "age" }"#).unwrap();
    assert_eq!(defaults.aggregation, HistogramAggregation::Count);
    assert_eq!(defaults.bins, None);

    assert!(serde_json::from_str::<HistogramOptions>(r#"{ "xKey": "age", "aggregation": "median" }"#).is_err());
}

#[test]
fn bin_rows_rejects_unordered_bins() {
    let with_bins = |bins: Vec<[f64; 2]>| HistogramOptions { bins: Some(bins), ..HistogramOptions::new("x") };

    let descending = with_bins(vec![[10.0, 20.0], [0.0, 10.0]]);
    assert_eq!(bin_rows(&tens(), &descending), Err(ConfigError::UnorderedBins { index: 1 }));

    let overlapping = with_bins(vec![[0.0, 10.0], [5.0, 20.0]]);
    assert!(bin_rows(&tens(), &overlapping).is_err());
}

#[test]
fn invalid_options_are_rejected() {
    let with = |f: fn(&mut HistogramOptions)| {
        let mut o = HistogramOptions::new("x");
        f(&mut o);
        o.validate()
    };
    assert_eq!(with(|_| {}), Ok(()));
    assert_eq!(with(|o| o.x_key.clear()), Err(ConfigError::MissingKey("xKey")));
    assert_eq!(with(|o| o.bin_count = Some(0)), Err(ConfigError::ZeroBinCount));
    assert_eq!(
        with(|o| o.bins = Some(vec![[5.0, 1.0]])),
        Err(ConfigError::InvalidBin { index: 0, lo: 5.0, hi: 1.0 })
    );
    assert_eq!(
        with(|o| o.bins = Some(vec![[0.0, 10.0], [5.0, 20.0]])),
        Err(ConfigError::UnorderedBins { index: 1 })
    );
}
