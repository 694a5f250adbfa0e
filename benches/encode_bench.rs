// Standalone benchmark for CSV unparsing.
//
// Run: cargo bench --bench encode_bench
//
// Compares a naive per-field String-allocating encoder against the
// library's `Unparser`, across clean (no quoting needed) and mixed
// (quoting/escaping needed) data at a few sizes.

use std::time::{Duration, Instant};

use flowcsv::unparser::{UnparseInput, Unparser, UnparserConfig};
use flowcsv::value::FieldValue;

// ==========================================================================
// Naive encoder — one allocation per field scan plus one per escape,
// the way a first-pass implementation without a streaming sink would do it.
// ==========================================================================

fn encode_csv_naive(rows: &[Vec<String>], delimiter: u8, quote: u8) -> Vec<u8> {
    let mut lines: Vec<String> = Vec::with_capacity(rows.len());
    for row in rows {
        let mut fields: Vec<String> = Vec::with_capacity(row.len());
        for field in row {
            let needs_quoting = field
                .bytes()
                .any(|b| b == delimiter || b == quote || b == b'\n' || b == b'\r');
            if needs_quoting {
                let escaped = field.replace(quote as char, "\"\"");
                fields.push(format!("\"{escaped}\""));
            } else {
                fields.push(field.clone());
            }
        }
        lines.push(fields.join(&(delimiter as char).to_string()));
    }
    lines.join("\r\n").into_bytes()
}

fn encode_csv_unparser(rows: &[Vec<String>]) -> Vec<u8> {
    let unparser = Unparser::new(UnparserConfig {
        header: false,
        ..Default::default()
    });
    let arrays = rows
        .iter()
        .map(|row| row.iter().map(|f| FieldValue::Str(f.clone())).collect())
        .collect();
    let mut out = Vec::new();
    unparser.unparse_to(UnparseInput::Arrays(arrays), &mut |bytes| out.extend_from_slice(bytes));
    out
}

// ==========================================================================
// Row generators
// ==========================================================================

fn generate_clean_rows(n: usize, cols: usize) -> Vec<Vec<String>> {
    (0..n)
        .map(|i| (0..cols).map(|c| format!("row{i}col{c}")).collect())
        .collect()
}

fn generate_mixed_rows(n: usize, cols: usize) -> Vec<Vec<String>> {
    (0..n)
        .map(|i| {
            (0..cols)
                .map(|c| {
                    if c % 3 == 0 {
                        format!("needs,quote\"{i}-{c}")
                    } else {
                        format!("row{i}col{c}")
                    }
                })
                .collect()
        })
        .collect()
}

// ==========================================================================
// Harness
// ==========================================================================

struct BenchResult {
    name: String,
    iterations: u64,
    total_time: Duration,
    output_size: usize,
}

impl BenchResult {
    fn avg_ns(&self) -> f64 {
        self.total_time.as_nanos() as f64 / self.iterations as f64
    }

    fn throughput_mb_s(&self) -> f64 {
        let bytes_per_iter = self.output_size as f64;
        let secs_per_iter = self.avg_ns() / 1_000_000_000.0;
        bytes_per_iter / secs_per_iter / 1_000_000.0
    }
}

fn bench_fn<F: Fn() -> Vec<u8>>(name: &str, f: F, warmup_secs: f64, bench_secs: f64) -> BenchResult {
    let warmup_deadline = Instant::now() + Duration::from_secs_f64(warmup_secs);
    let mut output_size = 0;
    while Instant::now() < warmup_deadline {
        let out = f();
        output_size = out.len();
    }

    let mut iterations: u64 = 0;
    let start = Instant::now();
    let deadline = start + Duration::from_secs_f64(bench_secs);
    while Instant::now() < deadline {
        let _ = f();
        iterations += 1;
    }
    let total_time = start.elapsed();

    BenchResult {
        name: name.to_string(),
        iterations,
        total_time,
        output_size,
    }
}

fn print_results(results: &[BenchResult]) {
    let max_name_len = results.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let fastest_ns = results.iter().map(|r| r.avg_ns()).fold(f64::MAX, f64::min);

    for r in results {
        let avg = r.avg_ns();
        let speedup = avg / fastest_ns;
        let marker = if (speedup - 1.0).abs() < 0.01 { " (fastest)" } else { "" };
        println!(
            "  {:<width$}  {:>10.2} µs/iter  {:>8.1} MB/s  {:>6.2}x{}",
            r.name,
            avg / 1000.0,
            r.throughput_mb_s(),
            speedup,
            marker,
            width = max_name_len,
        );
    }
}

fn run_benchmark_suite(label: &str, rows: &[Vec<String>], warmup: f64, time: f64) {
    println!("\n--- {label} ---");

    let results = vec![
        bench_fn("Naive", || encode_csv_naive(rows, b',', b'"'), warmup, time),
        bench_fn("Unparser", || encode_csv_unparser(rows), warmup, time),
    ];

    let naive_out = encode_csv_naive(rows, b',', b'"');
    let unparser_out = encode_csv_unparser(rows);
    assert_eq!(naive_out, unparser_out, "Unparser output differs from naive!");
    println!("  Output: {} bytes (both match)", naive_out.len());

    print_results(&results);
}

fn main() {
    println!("=== CSV Unparsing Benchmark ===");
    println!("Comparing a naive per-field-allocating encoder against Unparser's streaming sink.");

    let warmup = 1.0;
    let time = 3.0;

    let rows = generate_clean_rows(1_000, 10);
    run_benchmark_suite("1K rows x 10 fields (clean, no quoting)", &rows, warmup, time);

    let rows = generate_clean_rows(10_000, 10);
    run_benchmark_suite("10K rows x 10 fields (clean, no quoting)", &rows, warmup, time);

    let rows = generate_mixed_rows(10_000, 10);
    run_benchmark_suite("10K rows x 10 fields (mixed, with quoting)", &rows, warmup, time);

    let rows = generate_clean_rows(100_000, 10);
    run_benchmark_suite("100K rows x 10 fields (clean, no quoting)", &rows, warmup, time);

    println!("\n=== Done ===");
}
