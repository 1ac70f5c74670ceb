//! Interactive timer session on stdin, standing in for the tray menu:
//! every menu action has a line command here.

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use pomotray_core::{
    Config, CountdownParams, LogDisplay, NullStore, PomodoroController, ProgressStore, RestStore,
};

#[derive(Args)]
pub struct RunArgs {
    /// Shorten a timer minute to this many seconds
    #[arg(long)]
    minute_seconds: Option<u64>,
    /// Start up, print status and exit without reading commands
    #[arg(long)]
    once: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let store = open_store(&config);

    let params = match args.minute_seconds {
        // Keep the poll at 100ms so cancellation latency stays put.
        Some(seconds) => CountdownParams {
            poll: Duration::from_millis(100),
            polls_per_minute: (seconds * 10).max(1) as u32,
        },
        None => CountdownParams::default(),
    };

    let controller = PomodoroController::start(config, store, Arc::new(LogDisplay), params);
    controller.init_features();

    if args.once {
        print_status(&controller);
        controller.shutdown();
        return Ok(());
    }

    println!("commands: start, stop, status, work +|-, pause +|-, toggle <feature>, exit");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let step = controller.snapshot().menu.step_minutes as i32;
        match line.trim() {
            "" => {}
            "start" => controller.press_start(),
            "stop" => controller.press_stop(),
            "status" => print_status(&controller),
            "work +" => controller.adjust_work(step),
            "work -" => controller.adjust_work(-step),
            "pause +" => controller.adjust_pause(step),
            "pause -" => controller.adjust_pause(-step),
            "exit" | "quit" => break,
            other => match other.strip_prefix("toggle ") {
                Some(name) => match controller.toggle_feature(name.trim()) {
                    Some(true) => println!("{} on", name.trim()),
                    Some(false) => println!("{} off", name.trim()),
                    None => println!("unknown feature: {}", name.trim()),
                },
                None => {
                    println!(
                        "commands: start, stop, status, work +|-, pause +|-, toggle <feature>, exit"
                    );
                }
            },
        }
    }

    controller.shutdown();
    Ok(())
}

fn open_store(config: &Config) -> Arc<dyn ProgressStore> {
    if config.store.base_url.is_empty() {
        tracing::info!("no store configured, running on defaults");
        return Arc::new(NullStore);
    }
    match RestStore::new(&config.store.base_url) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "store unusable, running on defaults");
            Arc::new(NullStore)
        }
    }
}

fn print_status(controller: &PomodoroController) {
    let snapshot = controller.snapshot();
    println!("phase: {}", snapshot.phase);
    println!("countdown: {} min", snapshot.countdown_minutes);
    println!("{}", snapshot.menu.worked_label);
    for feature in &snapshot.menu.features {
        let mark = if feature.checked { "x" } else { " " };
        let note = if feature.enabled { "" } else { " (unavailable)" };
        println!("[{mark}] {}{note}", feature.name);
    }
}
