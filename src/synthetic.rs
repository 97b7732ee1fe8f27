//! # Synthetic Event Generator
//!
//! Weighted random events for simulate mode and tests: exercises the full
//! aggregate pipeline without a queue service behind it.

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::EVENT_AVATAR;
use crate::model::{Event, EventStatus};

const SERVICES: [&str; 5] = [
    "Auth Service",
    "API Gateway",
    "Database",
    "Payment Processor",
    "Frontend App",
];

const OK_MESSAGES: [&str; 5] = [
    "User login successful",
    "API request processed",
    "DB query executed",
    "Payment completed",
    "Page loaded",
];

const WARN_MESSAGES: [&str; 4] = [
    "High latency detected",
    "DB connection pool near capacity",
    "Unusual traffic pattern",
    "API version deprecated",
];

const ERROR_MESSAGES: [&str; 5] = [
    "Authentication failed",
    "Service unavailable (503)",
    "Database connection failed",
    "Payment declined",
    "Critical component crash",
];

/// Status weights: 85% OK, 10% WARN, 5% ERROR.
fn random_status(rng: &mut impl Rng) -> EventStatus {
    match rng.gen_range(0..100) {
        0..=84 => EventStatus::Ok,
        85..=94 => EventStatus::Warn,
        _ => EventStatus::Error,
    }
}

/// Generate one synthetic event.
pub fn synthetic_event(rng: &mut impl Rng) -> Event {
    let status = random_status(rng);
    let service = *SERVICES.choose(rng).unwrap_or(&SERVICES[0]);
    let message = match status {
        EventStatus::Ok => OK_MESSAGES.choose(rng).unwrap_or(&OK_MESSAGES[0]),
        EventStatus::Warn => WARN_MESSAGES.choose(rng).unwrap_or(&WARN_MESSAGES[0]),
        EventStatus::Error => ERROR_MESSAGES.choose(rng).unwrap_or(&ERROR_MESSAGES[0]),
    };
    let origin = service.split(' ').next().unwrap_or(service);

    Event {
        timestamp: Utc::now().format("%H:%M:%S").to_string(),
        service: service.to_string(),
        status,
        message: format!("{message} from {origin}"),
        avatar: EVENT_AVATAR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_events_are_well_formed() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let event = synthetic_event(&mut rng);
            assert!(SERVICES.contains(&event.service.as_str()));
            assert!(event.message.contains("from"));
            assert_eq!(event.timestamp.len(), 8);
        }
    }

    #[test]
    fn all_statuses_eventually_appear() {
        let mut rng = rand::thread_rng();
        let mut seen_ok = false;
        let mut seen_warn = false;
        let mut seen_error = false;
        for _ in 0..2000 {
            match synthetic_event(&mut rng).status {
                EventStatus::Ok => seen_ok = true,
                EventStatus::Warn => seen_warn = true,
                EventStatus::Error => seen_error = true,
            }
        }
        assert!(seen_ok && seen_warn && seen_error);
    }
}
