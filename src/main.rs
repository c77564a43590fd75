use std::{
    fmt::Display,
    time::{Duration, Instant},
};

use anyhow::Result;
use tracing_subscriber::fmt::SubscriberBuilder;

use crucible::{day17, default_input, load_input};

fn main() -> Result<()> {
    SubscriberBuilder::default()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let input = match std::env::args_os().nth(1) {
        Some(path) => load_input(path)?,
        None => default_input(17)?,
    };
    let elapsed = execute_day(17, day17, &input)?;
    println!("Total processing time: {}", format_duration(elapsed));
    Ok(())
}

fn format_duration(dur: Duration) -> String {
    if dur.as_millis() != 0 {
        format!("{} ms", dur.as_millis())
    } else {
        format!("{} us", dur.as_micros())
    }
}

fn execute_day<S: Display, T: Display>(
    n: usize,
    f: fn(&str) -> Result<(S, T)>,
    input: &str,
) -> Result<Duration> {
    println!("Day {}:", n);

    let start = Instant::now();
    let (part1, part2) = f(input)?;
    let elapsed = start.elapsed();

    println!("  Part 1: {}", part1);
    println!("  Part 2: {}", part2);
    println!("  Finished in {}", format_duration(elapsed));
    println!("---------------------");
    Ok(elapsed)
}
