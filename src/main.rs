use anyhow::{Context, Result};
use clap::Parser;
use flate2::Compression;
use flate2::write::GzEncoder;
use lazy_csv::{FileOptions, LazyCsvFile, LineError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Rewrite columns of large, optionally gzipped, CSV files line by line
#[derive(Parser, Debug)]
#[command(name = "lazy_csv", version)]
struct CliArgs {
    /// Input file, plain or gzip-compressed
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// JSON file with reader options; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Treat the input as gzip even without the magic bytes
    #[arg(long)]
    force_gzip: bool,

    /// Slack reserved on every line (default: 10% of the line length)
    #[arg(long, value_name = "N")]
    slack: Option<usize>,

    /// Fail instead of reallocating lines that outgrow their slack
    #[arg(long)]
    prevent_reallocation: bool,

    /// Assign VALUE to COLUMN on every line (repeatable)
    #[arg(long = "set", value_name = "COLUMN=VALUE", value_parser = parse_assignment)]
    assignments: Vec<(String, String)>,

    /// Only write these columns, in this order (repeatable)
    #[arg(long = "select", value_name = "COLUMN")]
    select: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Gzip-compress the output
    #[arg(long)]
    gzip_output: bool,
}

impl CliArgs {
    fn file_options(&self) -> Result<FileOptions> {
        let mut options = match &self.config {
            Some(path) => FileOptions::from_json_file(path)
                .with_context(|| format!("failed to load options from {}", path.display()))?,
            None => FileOptions::default(),
        };
        if self.force_gzip {
            options.force_decompression = true;
        }
        if let Some(slack) = self.slack {
            options.line_slack = Some(slack);
        }
        if self.prevent_reallocation {
            options.prevent_reallocation = true;
        }
        Ok(options)
    }
}

fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(column, value)| (column.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected COLUMN=VALUE, got `{arg}`"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

/// Stream every line of `csv` into `out`, applying `assignments` and keeping
/// only `selected` columns when any are given. Returns the number of data lines.
fn transform<W: Write>(
    csv: &mut LazyCsvFile,
    assignments: &[(usize, &str)],
    selected: &[usize],
    out: &mut W,
) -> Result<u64> {
    let headers = csv.headers();
    let header_line = if selected.is_empty() {
        headers.names().collect::<Vec<_>>().join(",")
    } else {
        selected
            .iter()
            .filter_map(|&index| headers.name(index))
            .collect::<Vec<_>>()
            .join(",")
    };
    writeln!(out, "{header_line}")?;

    let mut count = 0u64;
    while let Some(mut line) = csv.read_line()? {
        count += 1;
        for &(index, value) in assignments {
            line.set(index, value)
                .with_context(|| format!("data line {count}"))?;
        }

        if selected.is_empty() {
            writeln!(out, "{line}")?;
            continue;
        }
        for (n, &index) in selected.iter().enumerate() {
            if n > 0 {
                out.write_all(b",")?;
            }
            out.write_all(line.get(index)?.as_bytes())?;
        }
        out.write_all(b"\n")?;
    }
    Ok(count)
}

fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let options = args.file_options()?;
    let mut csv = LazyCsvFile::open(&args.input, options)
        .with_context(|| format!("failed to open {}", args.input.display()))?;

    let assignments = args
        .assignments
        .iter()
        .map(|(column, value)| -> Result<_, LineError> {
            Ok((csv.headers().index_of(column)?, value.as_str()))
        })
        .collect::<Result<Vec<_>, LineError>>()?;
    let selected = args
        .select
        .iter()
        .map(|column| csv.headers().index_of(column))
        .collect::<Result<Vec<_>, LineError>>()?;

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let started = Instant::now();
    let lines = if args.gzip_output {
        let mut encoder = GzEncoder::new(sink, Compression::fast());
        let lines = transform(&mut csv, &assignments, &selected, &mut encoder)?;
        encoder.finish()?.flush()?;
        lines
    } else {
        let mut sink = sink;
        let lines = transform(&mut csv, &assignments, &selected, &mut sink)?;
        sink.flush()?;
        lines
    };

    tracing::info!(
        lines,
        elapsed_ms = started.elapsed().as_millis() as u64,
        input = %args.input.display(),
        "transformed csv"
    );
    Ok(())
}
