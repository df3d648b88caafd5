use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "memorder workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test suite once per backend
    Test {
        /// Only run this backend (e.g. `lock`)
        #[arg(long)]
        backend: Option<String>,
    },
    /// Run the benchmark once per backend and write a comparative report
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,
    },
}

/// `None` lets `build.rs` pick the family for the host.
const BACKENDS: &[Option<&str>] = &[
    None,
    Some("backend-builtin"),
    Some("backend-legacy"),
    Some("backend-native"),
    Some("backend-lock"),
];

const BENCH: &str = "atomics_benchmark";
const REPORT: &str = "benchmark_results/report.md";

fn baseline_name(feature: Option<&str>) -> String {
    feature.map_or_else(|| "auto".to_string(), |f| f.replace("backend-", ""))
}

fn cargo(subcommand: &str, feature: Option<&str>) -> Command {
    let mut cmd = Command::new(std::env::var("CARGO").unwrap_or_else(|_| "cargo".into()));
    cmd.arg(subcommand).arg("--package").arg("memorder");
    if let Some(feature) = feature {
        cmd.arg("--features").arg(feature);
    }
    cmd
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Test { backend } => run_tests(backend.as_deref()),
        Commands::Bench { quick, report_only } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            generate_report()
        }
    }
}

fn run_tests(only: Option<&str>) -> Result<()> {
    let mut failed = Vec::new();

    for &feature in BACKENDS {
        let name = baseline_name(feature);
        if only.is_some_and(|o| o != name) {
            continue;
        }
        println!("\n>>> Testing backend: {name}");
        let start = Instant::now();

        let status = cargo("test", feature)
            .status()
            .with_context(|| format!("Failed to run tests for {name}"))?;

        if status.success() {
            println!("Finished {name} in {:.2?}", start.elapsed());
        } else {
            eprintln!("Tests failed for {name}");
            failed.push(name);
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("test failures under: {}", failed.join(", "));
    }
    Ok(())
}

fn run_benchmarks(quick: bool) -> Result<()> {
    println!("Running per-backend benchmarks...");

    for &feature in BACKENDS {
        let name = baseline_name(feature);
        println!("\n>>> Benchmarking backend: {name}");
        let start = Instant::now();

        let mut cmd = cargo("bench", feature);
        cmd.env("CARGO_INCREMENTAL", "0").arg("--bench").arg(BENCH);

        // Args for the test runner (Criterion) go after --
        cmd.arg("--").arg("--save-baseline").arg(&name);

        if quick {
            cmd.arg("--measurement-time").arg("0.1");
            cmd.arg("--noplot");
            cmd.arg("--sample-size").arg("10");
        }

        let status = cmd
            .status()
            .with_context(|| format!("Failed to run bench for {name}"))?;

        if status.success() {
            println!("Finished {name} in {:.2?}", start.elapsed());
        } else {
            // A forced backend may be unsupported on this host.
            eprintln!("Warning: Benchmark failed for {name}");
        }
    }

    Ok(())
}

/// workload -> backend -> ops/s
type Results = BTreeMap<String, BTreeMap<String, f64>>;

fn generate_report() -> Result<()> {
    println!("\n>>> Generating Report...");
    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    let mut results = Results::new();
    collect_results(criterion_dir, criterion_dir, &mut results)?;

    let report_path = Path::new(REPORT);
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(report_path)
        .with_context(|| format!("Failed to create {}", report_path.display()))?;

    let names: Vec<String> = BACKENDS.iter().map(|&f| baseline_name(f)).collect();

    writeln!(file, "# Backend Benchmark Report")?;
    writeln!(file)?;
    write!(file, "| Workload |")?;
    for name in &names {
        write!(file, " {name} (Ops/s) | vs auto |")?;
    }
    writeln!(file)?;
    write!(file, "|---|")?;
    for _ in &names {
        write!(file, "---|---|")?;
    }
    writeln!(file)?;

    for (workload, by_backend) in &results {
        write!(file, "| {workload} |")?;
        let auto = by_backend.get("auto").copied().unwrap_or(0.0);

        for name in &names {
            match by_backend.get(name) {
                Some(&ops) => {
                    let rel = if auto > 0.0 { ops / auto } else { 0.0 };
                    write!(file, " {} | **{rel:.2}x** |", format_ops(ops))?;
                }
                None => write!(file, " N/A | - |")?,
            }
        }
        writeln!(file)?;
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

fn format_ops(ops: f64) -> String {
    if ops > 1_000_000.0 {
        format!("{:.2}M", ops / 1_000_000.0)
    } else if ops > 1_000.0 {
        format!("{:.2}K", ops / 1_000.0)
    } else {
        format!("{ops:.0}")
    }
}

/// Walks criterion output. Layout: `<root>/<group>/<bench>[/<param>]/<baseline>/estimates.json`.
fn collect_results(root: &Path, dir: &Path, results: &mut Results) -> Result<()> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Ok(());
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_results(root, &path, results)?;
            continue;
        }
        if path.file_name().and_then(|s| s.to_str()) != Some("estimates.json") {
            continue;
        }
        let Some(baseline_dir) = path.parent() else { continue };
        let Some(workload_dir) = baseline_dir.parent() else { continue };
        let Some(baseline) = baseline_dir.file_name().and_then(|s| s.to_str()) else { continue };
        if matches!(baseline, "report" | "base" | "new" | "change") {
            continue;
        }
        let workload = workload_dir
            .strip_prefix(root)
            .unwrap_or(workload_dir)
            .display()
            .to_string();

        // Throughput, if the group declared one.
        let mut elements = 1.0;
        if let Ok(content) = fs::read_to_string(workload_dir.join(baseline).join("benchmark.json")) {
            let json: serde_json::Value = serde_json::from_str(&content)?;
            if let Some(n) = json.pointer("/throughput/Elements").and_then(serde_json::Value::as_f64) {
                elements = n;
            }
        }

        let content = fs::read_to_string(&path)?;
        let json: serde_json::Value =
            serde_json::from_str(&content).with_context(|| format!("Malformed {}", path.display()))?;
        let time_ns = json
            .pointer("/mean/point_estimate")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0);
        if time_ns > 0.0 {
            results
                .entry(workload)
                .or_default()
                .insert(baseline.to_string(), elements * 1e9 / time_ns);
        }
    }
    Ok(())
}
