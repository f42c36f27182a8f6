use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Args, Subcommand};
use smartcal_core::{
    generate_preview, get_animation_steps, get_events_at_step, DemoHarness, DemoScenario, DemoSeed,
    GeneratePreviewOptions, PreviewEvent, PreviewInput, PreviewResult, StepAction,
};

use super::load_config;

#[derive(Args)]
pub struct RunArgs {
    /// Reference time (RFC 3339); defaults to the current time
    #[arg(long)]
    now: Option<DateTime<Utc>>,
    /// Number of local days to preview (overrides config)
    #[arg(long)]
    days: Option<u32>,
    /// IANA time zone (overrides config)
    #[arg(long)]
    timezone: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
pub enum PreviewAction {
    /// Run a preview and show placed and unplaced items
    Run {
        /// JSON file with tasks, habits and events
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        args: RunArgs,
    },
    /// Show every scheduling step in order
    Steps {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        args: RunArgs,
    },
    /// Show the events placed as of a step
    At {
        /// Step index (past the last step shows the final schedule)
        step: usize,
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        args: RunArgs,
    },
    /// Preview a seeded demo workload
    Demo {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 8)]
        tasks: usize,
        #[arg(long, default_value_t = 3)]
        habits: usize,
        #[arg(long, default_value_t = 6)]
        events: usize,
        #[command(flatten)]
        args: RunArgs,
    },
}

pub fn run(action: PreviewAction, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PreviewAction::Run { input, args } => {
            let (result, tz) = preview_from_file(&input, &args, config)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result, tz);
            }
        }
        PreviewAction::Steps { input, args } => {
            let (result, _) = preview_from_file(&input, &args, config)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result.steps)?);
            } else {
                for step in get_animation_steps(&result) {
                    let marker = match step.action {
                        StepAction::Schedule => "+",
                        StepAction::Skip => "-",
                    };
                    println!(
                        "{:>3} {marker} {} [{} placed]",
                        step.index, step.description, step.placed_count
                    );
                }
            }
        }
        PreviewAction::At { step, input, args } => {
            let (result, tz) = preview_from_file(&input, &args, config)?;
            let events = get_events_at_step(&result, step);
            if args.json {
                println!("{}", serde_json::to_string_pretty(events)?);
            } else {
                for event in events {
                    print_event(event, tz);
                }
            }
        }
        PreviewAction::Demo {
            seed,
            tasks,
            habits,
            events,
            args,
        } => {
            let options = options_for(PreviewInput::default(), &args, config)?;
            let mut scenario = DemoScenario::new("cli", DemoSeed::new(seed), options.now)
                .with_window_days(options.window_days.min(7))
                .with_timezone(options.timezone)
                .with_hours(options.hours)
                .with_flags(options.flags);
            scenario.generate_random_tasks(tasks);
            scenario.generate_random_habits(habits);
            scenario.generate_random_events(events);

            let demo = DemoHarness::new().run_scenario(&scenario)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&demo)?);
            } else {
                print_result(&demo.result, scenario.timezone);
                println!(
                    "utilisation: {:.0}% of {} requested minutes",
                    demo.metrics.utilisation * 100.0,
                    demo.metrics.minutes_requested
                );
            }
        }
    }
    Ok(())
}

fn options_for(
    input: PreviewInput,
    args: &RunArgs,
    config: Option<&Path>,
) -> Result<GeneratePreviewOptions, Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let now = args.now.unwrap_or_else(Utc::now);
    let mut options = GeneratePreviewOptions::from_config(&config, input, now)?;
    if let Some(days) = args.days {
        options.window_days = days;
    }
    if let Some(tz) = &args.timezone {
        options.timezone = tz
            .parse::<Tz>()
            .map_err(|_| format!("unknown time zone: {tz}"))?;
    }
    Ok(options)
}

fn preview_from_file(
    input: &Path,
    args: &RunArgs,
    config: Option<&Path>,
) -> Result<(PreviewResult, Tz), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(input)
        .map_err(|e| format!("cannot read {}: {e}", input.display()))?;
    let options = options_for(PreviewInput::from_json(&json)?, args, config)?;
    let result = generate_preview(&options)?;
    Ok((result, options.timezone))
}

fn print_event(event: &PreviewEvent, tz: Tz) {
    let start = event.start.with_timezone(&tz);
    let end = event.end.with_timezone(&tz);
    println!(
        "{} {}-{}  {:<5}  {}",
        start.format("%a %Y-%m-%d"),
        start.format("%H:%M"),
        end.format("%H:%M"),
        event.kind.as_str(),
        event.title
    );
}

fn print_result(result: &PreviewResult, tz: Tz) {
    for event in &result.events {
        print_event(event, tz);
    }
    for item in &result.unplaced {
        println!(
            "unplaced  {:<5}  {}: {}",
            item.kind.as_str(),
            item.title,
            item.reason.description()
        );
    }
    for warning in &result.warnings {
        eprintln!("{:?}: {}", warning.level, warning.message);
    }
    println!(
        "placed {}, unplaced {}, {} steps",
        result.summary.total_events, result.summary.unplaced, result.summary.steps
    );
}
