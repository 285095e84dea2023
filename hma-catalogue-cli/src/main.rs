use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

use hma_catalogue::attributes::{
    FORM_ARCHIVING, FORM_BROWSE, FORM_PLATFORM, FORM_PRODUCT, GRID_BRIEF,
};
use hma_catalogue::{
    matched_records, Attribute, Detail, GetRecordsBuilder, MetadataRecord, ResponseParser,
    ResultKind, SlotDictionary, SpatialOp,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a CSW GetRecords query document
    Request(RequestArgs),
    /// Parse GetRecords responses and print the catalogued products
    Parse(ParseArgs),
}

#[derive(clap::Args, Debug)]
struct RequestArgs {
    /// Collection (parent identifier) to query; repeat for alternatives
    #[arg(short, long, value_name = "ID")]
    collection: Vec<String>,

    /// Start of the sensing window, RFC 3339
    #[arg(long, value_name = "TIME")]
    from: Option<DateTime<Utc>>,

    /// End of the sensing window, RFC 3339
    #[arg(long, value_name = "TIME")]
    to: Option<DateTime<Utc>>,

    /// Match only products sensed entirely inside the window
    #[arg(long)]
    contained: bool,

    /// Footprint constraint as min-lat,max-lat,min-lon,max-lon
    #[arg(long, value_name = "RANGE", allow_hyphen_values = true)]
    bbox: Option<String>,

    /// Spatial operator applied to the bounding box
    #[arg(long, value_name = "OP", default_value = "overlaps")]
    spatial_op: SpatialOpArg,

    /// Ask only for the number of matching records
    #[arg(long)]
    hits: bool,

    /// Element set to request: brief, summary or full
    #[arg(long, value_name = "SET", default_value = "full")]
    detail: String,

    /// Position of the first record to return
    #[arg(long, value_name = "N", default_value_t = 1)]
    start_position: u32,

    /// Page size
    #[arg(long, value_name = "N", default_value_t = 100)]
    max_records: u32,

    /// Write the document here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct ParseArgs {
    /// Response XML files
    #[arg(value_name = "FILE", required = true)]
    inputs: Vec<PathBuf>,

    /// Print every metadata attribute instead of the summary set
    #[arg(long)]
    full: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SpatialOpArg {
    Overlaps,
    Contains,
    Intersects,
    Within,
}

impl From<SpatialOpArg> for SpatialOp {
    fn from(op: SpatialOpArg) -> SpatialOp {
        match op {
            SpatialOpArg::Overlaps => SpatialOp::Overlaps,
            SpatialOpArg::Contains => SpatialOp::Contains,
            SpatialOpArg::Intersects => SpatialOp::Intersects,
            SpatialOpArg::Within => SpatialOp::Within,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let start_time = std::time::Instant::now();

    let slots = SlotDictionary::standard();

    match &args.command {
        Command::Request(request) => run_request(&slots, request)?,
        Command::Parse(parse) => run_parse(&slots, parse)?,
    }

    let elapsed = start_time.elapsed();
    info!("Total processing time: {:?}", elapsed);

    Ok(())
}

fn run_request(slots: &SlotDictionary, args: &RequestArgs) -> Result<()> {
    let mut builder = GetRecordsBuilder::new(slots)?;

    if args.hits {
        builder.set_result_kind(ResultKind::Hits);
    }
    let detail = Detail::parse(&args.detail)
        .with_context(|| format!("unknown element set '{}'", args.detail))?;
    builder.set_detail(detail);
    builder.set_start_position(args.start_position);
    builder.set_max_records(args.max_records);

    match args.collection.as_slice() {
        [] => {}
        [only] => builder.add_collection(only),
        several => {
            let ids: Vec<&str> = several.iter().map(String::as_str).collect();
            builder.add_collections(&ids);
        }
    }

    match (args.from, args.to) {
        (Some(start), Some(stop)) if args.contained => builder.add_temporal_contained(start, stop),
        (Some(start), Some(stop)) => builder.add_temporal_overlaps(start, stop),
        (Some(start), None) => builder.add_temporal_after(start),
        (None, Some(stop)) => builder.add_temporal_before(stop),
        (None, None) => {}
    }

    if let Some(bbox) = &args.bbox {
        let (min_lat, max_lat, min_lon, max_lon) = parse_bbox(bbox)?;
        builder.add_spatial_range(args.spatial_op.into(), min_lat, max_lat, min_lon, max_lon);
    }

    let xml = builder.request_xml()?;

    match &args.output {
        Some(path) => {
            fs::write(path, &xml)?;
            info!("Written GetRecords document: {:?}", path);
        }
        None => print!("{}", xml),
    }

    Ok(())
}

fn parse_bbox(value: &str) -> Result<(f64, f64, f64, f64)> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        anyhow::bail!("bounding box must be min-lat,max-lat,min-lon,max-lon");
    }

    let mut bounds = [0.0f64; 4];
    for (bound, part) in bounds.iter_mut().zip(&parts) {
        *bound = part
            .parse()
            .with_context(|| format!("invalid bounding box ordinate '{}'", part))?;
    }

    Ok((bounds[0], bounds[1], bounds[2], bounds[3]))
}

fn run_parse(slots: &SlotDictionary, args: &ParseArgs) -> Result<()> {
    use rayon::prelude::*;

    let parser = ResponseParser::new(slots);

    // Decode the response files in parallel
    let results: Vec<Result<Vec<MetadataRecord>>> = args
        .inputs
        .par_iter()
        .map(|path| -> Result<Vec<MetadataRecord>> {
            let xml = fs::read_to_string(path)?;
            let records = parser.parse_response(&xml);
            if records.is_empty() {
                if let Some(hits) = matched_records(&xml) {
                    info!("{}: {} matching products, none returned", path.display(), hits);
                }
            }
            Ok(records)
        })
        .collect();

    let mut errors = Vec::new();
    let mut records = Vec::new();
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(parsed) => records.extend(parsed),
            Err(e) => errors.push(format!("{}: {}", args.inputs[i].display(), e)),
        }
    }

    if !errors.is_empty() {
        error!("Failed to read {} files:", errors.len());
        for err in &errors {
            error!("  {}", err);
        }
        anyhow::bail!("{} files failed to read", errors.len());
    }

    records.sort_by(|a, b| a.compare(b));
    info!(
        "Parsed {} products from {} files",
        records.len(),
        args.inputs.len()
    );

    for record in &mut records {
        print_record(record, args.full);
    }

    Ok(())
}

fn print_record(record: &mut MetadataRecord, full: bool) {
    let identifier = record
        .get(Attribute::ProductIdentifier)
        .unwrap_or("(unknown product)")
        .to_string();
    println!("{}", identifier);

    if full {
        print_section("Product", &FORM_PRODUCT, record);
        print_section("Platform", &FORM_PLATFORM, record);
        print_section("Archiving", &FORM_ARCHIVING, record);
        print_section("Browse", &FORM_BROWSE, record);
    } else {
        for attribute in GRID_BRIEF {
            if attribute == Attribute::ProductIdentifier {
                continue;
            }
            if let Some(value) = record.get(attribute) {
                println!("  {:<22} {}", format!("{}:", attribute.short_label()), value);
            }
        }
    }

    if let Some(center) = record.scene_center() {
        println!("  {:<22} {} {}", "Center:", center.lat, center.lon);
    }
    println!();
}

fn print_section(title: &str, attributes: &[Attribute], record: &MetadataRecord) {
    let present: Vec<(Attribute, &str)> = attributes
        .iter()
        .filter_map(|&attribute| record.get(attribute).map(|value| (attribute, value)))
        .collect();
    if present.is_empty() {
        return;
    }

    println!("  [{}]", title);
    for (attribute, value) in present {
        println!("    {:<28} {}", format!("{}:", attribute.long_label()), value);
    }
}
