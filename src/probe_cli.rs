// src/probe_cli.rs
// CLI front end - separated to keep main.rs down to startup

use log::{debug, error, info};
use std::time::Instant;
use cacheprobe::config::ProbeConfig;
use cacheprobe::core::aggregator::CacheProber;
use cacheprobe::core::source::{resolve, CacheSource, NativeQuery, TimingHeuristic};
use cacheprobe::report::{format_bytes, ProbeReport, SystemInfo};

#[derive(Debug, Default, PartialEq)]
pub struct CliOptions {
    pub timing_only: bool,
    pub line_only: bool,
    pub config_path: Option<String>,
    pub save_path: Option<String>,
}

impl CliOptions {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut options = CliOptions::default();
        let mut iter = args.iter().skip(1);

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--timing" => options.timing_only = true,
                "--line-only" => options.line_only = true,
                "--config" => {
                    options.config_path = Some(iter.next().ok_or("--config needs a path")?.clone());
                }
                "--save" => {
                    options.save_path = Some(iter.next().ok_or("--save needs a path")?.clone());
                }
                other => return Err(format!("unknown argument: {}", other)),
            }
        }

        Ok(options)
    }
}

pub fn usage() -> &'static str {
    "usage: cacheprobe [--timing] [--line-only] [--config PATH] [--save PATH]"
}

pub fn load_config(options: &CliOptions) -> cacheprobe::Result<ProbeConfig> {
    match &options.config_path {
        Some(path) => ProbeConfig::load_from_file(path),
        None => ProbeConfig::load(),
    }
}

pub fn run(options: &CliOptions, config: &ProbeConfig) -> i32 {
    let started = Instant::now();
    let mut native = NativeQuery::new();
    debug!("Native backends: {:?}", native.backends());
    let mut timing = TimingHeuristic::new(CacheProber::from_config(config));

    if options.line_only {
        let line = if options.timing_only || !config.prefer_native {
            timing.prober().detect_line()
        } else {
            native.query().map(|d| d.line).unwrap_or_else(|| timing.prober().detect_line())
        };
        println!("Cache line -> [{}]", format_bytes(line));
        return 0;
    }

    let resolved = if options.timing_only || !config.prefer_native {
        resolve(&mut [&mut timing as &mut dyn CacheSource])
    } else {
        resolve(&mut [&mut native as &mut dyn CacheSource, &mut timing])
    };

    let (source, descriptor) = match resolved {
        Some(found) => found,
        None => {
            error!("No cache information source answered");
            return 1;
        }
    };

    // Cross-check a timing result against the platform when it can answer
    let cross_check = if source == timing.name() { native.query() } else { None };

    let report = ProbeReport::new(source, descriptor, SystemInfo::collect())
        .with_native(cross_check)
        .with_elapsed_ms(started.elapsed().as_millis() as u64);
    report.print_summary();

    if let Some(path) = &options.save_path {
        match report.save_to_file(path) {
            Ok(_) => info!("Results saved to: {}", path),
            Err(e) => {
                error!("Error saving results: {}", e);
                return 1;
            }
        }
    }

    0
}
