// scripts/benchmark.rs
use clap::Parser;
use local_vol_sde::market::RateCurve;
use local_vol_sde::math_utils::Timer;
use local_vol_sde::mc::{ExecutionMode, SamplingConfig};
use local_vol_sde::models::LocalVolatilityModel;
use local_vol_sde::output::{write_smile_to_csv, write_summary_to_csv};
use local_vol_sde::scenario::MarketScenario;
use local_vol_sde::smile::{reconstruct_smile, SmileReport, SmileTolerance};
use local_vol_sde::SdeResult;
use std::env;
use std::process::Command;
use tracing_subscriber::EnvFilter;

/// Times local volatility path sampling and checks the reconstructed smile
#[derive(Debug, Parser)]
#[command(name = "benchmark")]
struct Args {
    /// Monte Carlo samples per run
    #[arg(long, default_value_t = 100_000)]
    paths: usize,

    /// Uniform time steps up to the last expiry
    #[arg(long, default_value_t = 20)]
    steps: usize,

    /// Number of underlyings
    #[arg(long, default_value_t = 1)]
    dim: usize,

    /// Flat risk-free rate
    #[arg(long, default_value_t = 0.0)]
    rate: f64,
}

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_model: String,
    cpu_cores: usize,
    rust_version: String,
    rustc_flags: String,
    rayon_threads: usize,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_model: Self::get_cpu_model(),
            cpu_cores: num_cpus::get(),
            rust_version: Self::get_rust_version(),
            rustc_flags: env::var("RUSTFLAGS").unwrap_or_else(|_| "default".to_string()),
            rayon_threads: rayon::current_num_threads(),
        }
    }

    fn get_cpu_model() -> String {
        #[cfg(target_os = "linux")]
        {
            std::fs::read_to_string("/proc/cpuinfo")
                .ok()
                .and_then(|content| {
                    content
                        .lines()
                        .find(|line| line.starts_with("model name"))
                        .and_then(|line| line.split(':').nth(1))
                        .map(|s| s.trim().to_string())
                })
                .unwrap_or_else(|| "Unknown CPU".to_string())
        }

        #[cfg(target_os = "macos")]
        {
            Command::new("sysctl")
                .args(["-n", "machdep.cpu.brand_string"])
                .output()
                .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
                .unwrap_or_else(|_| "Unknown CPU".to_string())
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            "Unknown CPU".to_string()
        }
    }

    fn get_rust_version() -> String {
        Command::new("rustc")
            .arg("--version")
            .output()
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
            .unwrap_or_else(|_| "Unknown Rust version".to_string())
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    execution: ExecutionMode,
    paths: usize,
    time_ms: f64,
    throughput_paths_per_sec: f64,
    max_smile_error: f64,
    passed: bool,
}

fn run_sampling_benchmark(
    model: &LocalVolatilityModel,
    scenario: &MarketScenario,
    rates: &RateCurve,
    cfg: &SamplingConfig,
) -> SdeResult<(BenchmarkResult, SmileReport)> {
    let mut timer = Timer::new();
    timer.start();
    let paths = model.sample_paths(&scenario.spot, cfg)?;
    let time_ms = timer.elapsed_ms();

    let report = reconstruct_smile(
        paths.view(),
        scenario,
        rates,
        &[1, 2, 3],
        SmileTolerance::default(),
    )?;
    let result = BenchmarkResult {
        execution: cfg.execution,
        paths: cfg.num_samples,
        time_ms,
        throughput_paths_per_sec: cfg.num_samples as f64 / (time_ms / 1000.0),
        max_smile_error: report.max_abs_error(),
        passed: report.is_success(),
    };
    Ok((result, report))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    println!("local-vol-sde Sampling Benchmark");
    println!("================================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("  OS: {}", system_info.os);
    println!("  CPU: {}", system_info.cpu_model);
    println!("  CPU Cores: {}", system_info.cpu_cores);
    println!("  Rust Version: {}", system_info.rust_version);
    println!("  RUSTFLAGS: {}", system_info.rustc_flags);
    println!("  Rayon Threads: {}", system_info.rayon_threads);
    println!();

    let scenario = MarketScenario::smile_test(args.dim)?;
    let rates = RateCurve::flat(args.rate);
    let model = LocalVolatilityModel::from_market_data(
        args.dim,
        scenario.valuation_date,
        scenario.expiries.clone(),
        scenario.strikes.view(),
        scenario.implied_vols.view(),
        &scenario.spot,
        rates.clone(),
        &[0.0],
    )?;

    let mut results = Vec::new();
    let mut last_report = SmileReport::default();
    for execution in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
        let cfg = SamplingConfig {
            times: scenario.expiry_times.row(0).to_vec(),
            num_samples: args.paths,
            num_time_steps: args.steps,
            execution,
            ..Default::default()
        };
        let (result, report) = run_sampling_benchmark(&model, &scenario, &rates, &cfg)?;
        results.push(result);
        last_report = report;
    }

    println!("\n{:=<80}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<80}", "");
    println!(
        "{:<12} {:>10} {:>12} {:>15} {:>14} {:>8}",
        "Mode", "Paths", "Time (ms)", "Throughput", "Max Smile Err", "Passed"
    );
    println!("{:-<80}", "");
    for result in &results {
        println!(
            "{:<12} {:>10} {:>12.2} {:>15.0} {:>14.5} {:>8}",
            format!("{:?}", result.execution),
            result.paths,
            result.time_ms,
            result.throughput_paths_per_sec,
            result.max_smile_error,
            result.passed
        );
    }
    println!("{:=<80}", "");

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("benchmark_results_{}.csv", timestamp);
    let mut summary = vec![
        ("os", system_info.os.clone()),
        ("cpu", system_info.cpu_model.clone()),
        ("cpu_cores", system_info.cpu_cores.to_string()),
        ("rust_version", system_info.rust_version.clone()),
        ("rayon_threads", system_info.rayon_threads.to_string()),
        ("dim", args.dim.to_string()),
        ("steps", args.steps.to_string()),
        ("rate", args.rate.to_string()),
    ];
    for result in &results {
        let key = match result.execution {
            ExecutionMode::Sequential => "sequential_time_ms",
            ExecutionMode::Parallel => "parallel_time_ms",
        };
        summary.push((key, format!("{:.2}", result.time_ms)));
    }
    if let [sequential, parallel] = results.as_slice() {
        summary.push(("speedup", format!("{:.2}", sequential.time_ms / parallel.time_ms)));
    }
    write_summary_to_csv(&filename, &summary)?;

    let smile_filename = format!("smile_report_{}.csv", timestamp);
    write_smile_to_csv(&smile_filename, &last_report)?;

    println!("\nResults saved to: {} and {}", filename, smile_filename);
    println!("\nTo reproduce these results:");
    println!("1. Use Rust version: {}", system_info.rust_version);
    println!("2. Set RUSTFLAGS: {}", system_info.rustc_flags);
    println!(
        "3. Run: cargo run --bin benchmark --release -- --paths {} --steps {} --dim {}",
        args.paths, args.steps, args.dim
    );
    Ok(())
}
