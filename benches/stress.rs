use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};
use ulid::Ulid;

use suiteplan::config::EngineConfig;
use suiteplan::engine::{
    check_batch, chunk_available_days, chunk_for_creation, find_collisions, CreateRequest, Engine,
    InMemoryStore, MoveRequest, Outcome, SeriesChoice, WeekendPolicy,
};
use suiteplan::model::{DateRange, Day, Reservation, Resource, ResourceKind};
use suiteplan::notify::NotifyHub;

const ROOMS: usize = 20;
const DAYS: u64 = 365;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: no samples");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

fn year_start() -> Day {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
}

fn day(offset: u64) -> Day {
    year_start().checked_add_days(Days::new(offset)).expect("in range")
}

/// One room per resource, each booked every other day for a year by a rotating set of projects.
fn setup() -> (Arc<InMemoryStore>, Vec<Ulid>, Vec<Ulid>) {
    let store = Arc::new(InMemoryStore::new());
    let rooms: Vec<Ulid> = (0..ROOMS)
        .map(|i| {
            let room = Resource::new(Ulid::new(), format!("Suite {i}"), ResourceKind::StandardRoom);
            let id = room.id;
            store.insert_resource(room);
            id
        })
        .collect();
    let projects: Vec<Ulid> = (0..10).map(|_| Ulid::new()).collect();

    let mut rows = Vec::new();
    for (i, room) in rooms.iter().enumerate() {
        for offset in (0..DAYS).step_by(2) {
            let project = projects[(offset as usize / 2 + i) % projects.len()];
            let mut r = Reservation::new(*room, project, Ulid::new(), DateRange::single(day(offset)));
            r.id = Some(Ulid::new());
            rows.push(r);
        }
    }
    store.replace_all(rows);
    println!("  {} rooms, {} reservations", rooms.len(), store.reservation_count());
    (store, rooms, projects)
}

fn phase1_collisions(store: &InMemoryStore, rooms: &[Ulid]) {
    let existing = store.reservations();
    let mut latencies = Vec::new();
    for (i, room) in rooms.iter().enumerate() {
        for start in (0..DAYS - 7).step_by(7) {
            let candidate = Reservation::new(
                *room,
                Ulid::new(),
                Ulid::new(),
                DateRange::new(day(start + i as u64 % 2), day(start + 6)),
            );
            let t = Instant::now();
            let hits = find_collisions(&candidate, &existing, store);
            latencies.push(t.elapsed());
            std::hint::black_box(hits);
        }
    }
    print_latency("find_collisions (week candidate)", &mut latencies);
}

fn phase2_chunking(store: &InMemoryStore, rooms: &[Ulid]) {
    let existing = store.reservations();
    let template = Reservation::new(rooms[0], Ulid::new(), Ulid::new(), DateRange::new(day(0), day(DAYS - 1)));

    let mut creation = Vec::new();
    let mut available = Vec::new();
    let mut batch_check = Vec::new();
    for _ in 0..50 {
        let t = Instant::now();
        let batch = chunk_for_creation(&template, rooms, WeekendPolicy::default()).expect("bookable");
        creation.push(t.elapsed());

        let t = Instant::now();
        let conflicts = check_batch(&batch, &existing, store);
        batch_check.push(t.elapsed());
        std::hint::black_box(conflicts);

        let t = Instant::now();
        let collisions = find_collisions(&template, &existing, store);
        let chunks = chunk_available_days(&template, collisions).expect("free days");
        available.push(t.elapsed());
        std::hint::black_box(chunks);
    }
    print_latency("chunk_for_creation (year x all rooms)", &mut creation);
    print_latency("check_batch (year x all rooms)", &mut batch_check);
    print_latency("available-day chunking (year)", &mut available);
}

fn phase3_engine_round_trip(store: Arc<InMemoryStore>, rooms: &[Ulid], projects: &[Ulid]) {
    let mut engine = Engine::new(store, Arc::new(NotifyHub::new()), EngineConfig::default());
    let mut commits = Vec::new();
    let mut moves = Vec::new();
    let mut undos = Vec::new();

    for offset in (1..DAYS).step_by(14) {
        let template = Reservation::new(rooms[0], projects[0], Ulid::new(), DateRange::single(day(offset)));
        let t = Instant::now();
        let outcome = engine.create(CreateRequest::new(template));
        commits.push(t.elapsed());
        let Ok(Outcome::Committed(changes)) = outcome else { continue };
        let Some(id) = changes.first().and_then(|c| c.reservation_id()) else { continue };

        let request = MoveRequest {
            reservation_id: id,
            target_resource: rooms[1],
            target_day: day(offset),
            dragged_day: day(offset),
        };
        let t = Instant::now();
        let _ = engine.resolve_series_move(request, SeriesChoice::ThisAndFuture);
        moves.push(t.elapsed());

        let t = Instant::now();
        let _ = engine.undo();
        undos.push(t.elapsed());
    }
    print_latency("create", &mut commits);
    print_latency("series move", &mut moves);
    print_latency("undo", &mut undos);
}

fn main() {
    println!("=== suiteplan stress benchmark ===\n");

    println!("[setup]");
    let (store, rooms, projects) = setup();

    println!("\n[phase 1] collision detection");
    phase1_collisions(&store, &rooms);

    println!("\n[phase 2] chunking");
    phase2_chunking(&store, &rooms);

    println!("\n[phase 3] engine round trip");
    phase3_engine_round_trip(store, &rooms, &projects);
}
