use std::io::{BufRead, Write as _};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use roadtrip::{RoadtripConfig, TripPlan, TripPlanner};

/// Render a duration in minutes as "2h 30min", "45 min" or "3h"
fn format_duration(minutes: f64) -> String {
    let hours = (minutes / 60.0).floor() as u64;
    let mins = (minutes % 60.0).floor() as u64;

    match (hours, mins) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}min"),
    }
}

fn print_plan(plan: &TripPlan) {
    println!();
    println!("Trip: {} -> {}", plan.origin, plan.destination);
    println!(
        "  Distance: {:.0} km ({})",
        plan.route.distance_km(),
        format_duration(plan.route.duration_minutes())
    );

    match &plan.weather {
        Some(weather) => println!(
            "  Weather at destination: {:.0}°C, {}",
            weather.temperature_celsius, weather.description
        ),
        None => println!("  Weather at destination: unavailable"),
    }

    match &plan.map {
        Some(image) => {
            let path = match image.media_type.as_str() {
                "image/jpeg" => "trip-map.jpg",
                _ => "trip-map.png",
            };
            match std::fs::write(path, &image.bytes) {
                Ok(()) => println!("  Route map written to {path}"),
                Err(e) => println!("  Route map could not be saved: {e}"),
            }
        }
        None => println!("  Route map: unavailable"),
    }

    println!("  Open in browser: {}", plan.maps_link);
    println!("  Travel music:");
    print_tracks(&plan.tracks);
}

fn print_tracks(tracks: &[roadtrip::Track]) {
    if tracks.is_empty() {
        println!("  No travel music found.");
        return;
    }
    for track in tracks {
        println!("    - {} ({})", track.title, track.play_url);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roadtrip=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(origin), Some(destination)) = (args.next(), args.next()) else {
        eprintln!("Usage: roadtrip <origin> <destination>");
        eprintln!("  e.g. roadtrip \"Paris, France\" \"Lyon, France\"");
        std::process::exit(2);
    };

    let config = RoadtripConfig::load().context("Failed to load configuration")?;
    let planner = TripPlanner::new(&config);

    let plan = match planner.build_plan(&origin, &destination).await {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    };
    print_plan(&plan);

    // "Load more" affordance: Enter fetches the next page, q quits.
    let stdin = std::io::stdin();
    loop {
        print!("\n[Enter] more music, [q] quit: ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        if line.trim().eq_ignore_ascii_case("q") {
            break;
        }

        match planner.extend_music().await {
            Ok(tracks) if tracks.is_empty() => println!("  No more tracks."),
            Ok(tracks) => print_tracks(&tracks),
            Err(e) => eprintln!("{}", e.user_message()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45.0), "45 min");
        assert_eq!(format_duration(180.0), "3h");
        assert_eq!(format_duration(150.0), "2h 30min");
        assert_eq!(format_duration(273.0), "4h 33min");
    }
}
