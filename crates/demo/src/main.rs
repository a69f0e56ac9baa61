// File: crates/demo/src/main.rs
// Summary: Demo loads a CSV into rows, bins one column into a histogram, optionally runs the
// tabular data model over key/value columns, and prints domains, bins and node rectangles.

use anyhow::{Context, Result};
use chart_data::{
    ChartAxisDirection, ColumnDef, DataModel, DataModelOptions, HistogramAggregation, HistogramOptions,
    HistogramSeries, LinearScale, PropertyDef, ReducerDef, Row, SumDef, Value, ValueType,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Bin a CSV column and summarise key/value columns.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input CSV (a .csv/.cvs extension mix-up is tolerated)
    input: String,

    /// JSON file with histogram options (camelCase: xKey, yKey, bins, binCount, aggregation, areaPlot)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Column to bin; overrides the config file
    #[arg(short = 'x', long)]
    x_key: Option<String>,

    /// Column aggregated per bin
    #[arg(short = 'y', long)]
    y_key: Option<String>,

    /// Number of equal-width bins
    #[arg(short = 'n', long)]
    bin_count: Option<usize>,

    /// Explicit bins as lo:hi pairs, e.g. "0:10,10:25,25:100"
    #[arg(long)]
    bins: Option<String>,

    /// count | sum | mean
    #[arg(short, long)]
    aggregation: Option<HistogramAggregation>,

    /// Plot bin densities instead of aggregated values
    #[arg(long)]
    area_plot: bool,

    /// Key columns for the data model summary (repeatable)
    #[arg(short, long = "key")]
    keys: Vec<String>,

    /// Value columns for the data model summary (repeatable)
    #[arg(short, long = "value")]
    values: Vec<String>,

    /// Treat key columns as continuous instead of categorical
    #[arg(long)]
    range_keys: bool,

    /// Group rows sharing the same keys
    #[arg(short, long)]
    group: bool,

    /// Stack all value columns into one sum
    #[arg(long)]
    stack: bool,

    /// Rescale stacks so each group totals this value (implies --group)
    #[arg(long)]
    normalise: Option<f64>,

    /// Print full processed results as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let (path, used_alt) = resolve_path(&cli.input)?;
    println!("Using input file: {}", path.display());
    if used_alt {
        println!("  (extension swapped between .csv/.cvs)");
    }

    let rows = load_rows(&path).with_context(|| format!("failed to load CSV '{}'", path.display()))?;
    println!("Loaded {} rows", rows.len());
    if rows.is_empty() {
        anyhow::bail!("no rows loaded; check headers/delimiter.");
    }

    let options = histogram_options(&cli)?;
    run_histogram(&rows, options, cli.json)?;

    if !cli.keys.is_empty() {
        run_data_model(&rows, &cli)?;
    }
    Ok(())
}

/// Merge the optional JSON config with CLI flags; flags win.
fn histogram_options(cli: &Cli) -> Result<HistogramOptions> {
    let mut options = match &cli.config {
        Some(p) => {
            let text = std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            serde_json::from_str::<HistogramOptions>(&text).with_context(|| format!("parsing {}", p.display()))?
        }
        None => HistogramOptions::default(),
    };

    if let Some(x) = &cli.x_key {
        options.x_key = x.clone();
    }
    if options.x_key.is_empty() {
        anyhow::bail!("no x column given; pass --x-key or set xKey in --config");
    }
    if let Some(y) = &cli.y_key {
        options.y_key = Some(y.clone());
    }
    if let Some(n) = cli.bin_count {
        options.bin_count = Some(n);
    }
    if let Some(pairs) = &cli.bins {
        options.bins = Some(parse_bins(pairs)?);
    }
    if let Some(a) = cli.aggregation {
        options.aggregation = a;
    }
    options.area_plot |= cli.area_plot;

    debug!(?options, "histogram options");
    Ok(options)
}

fn run_histogram(rows: &[Row], options: HistogramOptions, json: bool) -> Result<()> {
    let area_plot = options.area_plot;
    let mut series = HistogramSeries::new(options).context("invalid histogram options")?;
    series.set_data(rows.to_vec());
    let data = series.process_data();

    let opts = series.options();
    println!(
        "Histogram of '{}' ({:?}{}): {} bins",
        opts.x_key,
        opts.aggregation,
        opts.y_key().map(|y| format!(" of '{y}'")).unwrap_or_default(),
        data.bins.len()
    );
    let placed: usize = data.bins.iter().map(|b| b.frequency).sum();
    if placed < rows.len() {
        warn!(dropped = rows.len() - placed, "rows outside every bin or without a numeric x");
    }
    println!("  x domain: {:?}", series.domain(ChartAxisDirection::X));
    println!("  y domain: {:?}", series.domain(ChartAxisDirection::Y));

    // Lay bins out on an 800x400 plot area, y growing downwards
    let x_domain = series.domain(ChartAxisDirection::X);
    let x_scale = match x_domain.as_slice() {
        [lo, hi] => LinearScale::new([*lo, *hi], [0.0, 800.0]),
        _ => LinearScale::new([0.0, 1.0], [0.0, 800.0]),
    };
    let y_scale = LinearScale::new(data.y_domain, [400.0, 0.0]);
    let nodes = series.create_node_data(&x_scale, &y_scale);

    for (bin, node) in data.bins.iter().zip(&nodes) {
        println!(
            "  [{:>10.3}, {:>10.3}]  n={:<6} value={:<12.4} {}rect=({:.1}, {:.1}, {:.1} x {:.1})",
            bin.domain[0],
            bin.domain[1],
            bin.frequency,
            bin.aggregated_value,
            if area_plot { format!("density={:<10.4} ", bin.relative_height()) } else { String::new() },
            node.x,
            node.y,
            node.width,
            node.height,
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&*data)?);
    }
    Ok(())
}

fn run_data_model(rows: &[Row], cli: &Cli) -> Result<()> {
    let key_type = if cli.range_keys { ValueType::Range } else { ValueType::Category };
    let mut props: Vec<PropertyDef> = cli.keys.iter().map(|k| ColumnDef::key(k.as_str(), key_type).into()).collect();
    props.extend(cli.values.iter().map(|v| PropertyDef::from(ColumnDef::value(v.as_str(), ValueType::Range))));
    if cli.stack && !cli.values.is_empty() {
        props.push(SumDef::new(cli.values.iter().cloned()).into());
        props.push(ReducerDef::SumValueExtent.into());
    }
    if cli.range_keys {
        props.push(ReducerDef::SmallestKeyInterval.into());
    }

    let mut options = DataModelOptions::new(props).group_by_keys(cli.group || cli.normalise.is_some());
    if let Some(total) = cli.normalise {
        options = options.normalise_to(total);
    }
    let model = DataModel::new(options).context("invalid data model options")?;
    let processed = model.process_data(rows);
    info!(kind = processed.kind(), len = processed.len(), "processed rows");

    println!("Data model: {} {} datums from {} rows", processed.len(), processed.kind(), rows.len());
    for (name, domain) in cli.keys.iter().zip(&processed.domain.keys) {
        println!("  key   {:<16} {}", name, format_domain(domain, key_type));
    }
    for (name, domain) in cli.values.iter().zip(&processed.domain.values) {
        println!("  value {:<16} {}", name, format_domain(domain, ValueType::Range));
    }
    if let Some(sums) = &processed.domain.sum_values {
        println!("  stack extent: {:?}", sums.first().cloned().unwrap_or_default());
    }
    if let Some(reduced) = &processed.reduced {
        if let Some(interval) = reduced.smallest_key_interval {
            println!("  smallest key interval: {interval}");
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&processed)?);
    }
    Ok(())
}

fn format_domain(domain: &[Value], value_type: ValueType) -> String {
    let text = |v: &Value| match v {
        Value::Number(n) => format!("{n}"),
        Value::String(s) => s.clone(),
        Value::Date(d) => d.to_rfc3339(),
        Value::Null => "null".to_string(),
    };
    match (value_type, domain) {
        (_, []) => "(empty)".to_string(),
        (ValueType::Range, [lo, hi]) => format!("[{}, {}]", text(lo), text(hi)),
        (_, values) if values.len() > 8 => {
            let head: Vec<_> = values.iter().take(8).map(text).collect();
            format!("{} distinct: {}, ...", values.len(), head.join(", "))
        }
        (_, values) => values.iter().map(text).collect::<Vec<_>>().join(", "),
    }
}

/// Parse "lo:hi,lo:hi" into bin edges.
fn parse_bins(pairs: &str) -> Result<Vec<[f64; 2]>> {
    pairs.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|pair| {
            let (lo, hi) = pair.split_once(':').with_context(|| format!("bin '{pair}' is not lo:hi"))?;
            let lo = lo.trim().parse::<f64>().with_context(|| format!("bad lower edge in '{pair}'"))?;
            let hi = hi.trim().parse::<f64>().with_context(|| format!("bad upper edge in '{pair}'"))?;
            Ok([lo, hi])
        })
        .collect()
}

/// Resolve path, trying .csv/.cvs swap if needed.
/// Returns (actual_path, used_alt)
fn resolve_path(raw: &str) -> Result<(PathBuf, bool)> {
    let p = Path::new(raw);
    if p.exists() {
        return Ok((p.to_path_buf(), false));
    }
    if let Some(alt) = swap_ext(p) {
        if alt.exists() {
            return Ok((alt, true));
        }
    }
    anyhow::bail!("file not found: {}", p.display());
}

fn swap_ext(p: &Path) -> Option<PathBuf> {
    let mut alt = p.to_path_buf();
    let ext = p.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "cvs" => {
            alt.set_extension("csv");
            Some(alt)
        }
        "csv" => {
            alt.set_extension("cvs");
            Some(alt)
        }
        _ => None,
    }
}

/// Load a headed CSV into rows; cells are typed with `Value::infer`.
fn load_rows(path: &Path) -> Result<Vec<Row>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect::<Vec<_>>();
    println!("Headers: {:?}", headers);

    let mut out = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("record {}", line + 1))?;
        // Short records simply lack the trailing properties
        let row: Row = headers
            .iter()
            .zip(rec.iter())
            .map(|(h, cell)| (h.clone(), Value::infer(cell)))
            .collect();
        out.push(row);
    }
    Ok(out)
}
