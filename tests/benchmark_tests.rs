//! Performance benchmarks for critical server systems

use server::router::EventRouter;
use server::world::World;
use shared::{ClientEvent, Vec3};
use std::time::Instant;

/// Benchmarks decoding of the highest-frequency client event
#[test]
fn benchmark_event_decoding() {
    let raw = r#"{"type":"move","data":{"x":4.25,"y":1.7,"z":-9.5,"rotation":1.04}}"#;

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _event: ClientEvent = serde_json::from_str(raw).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Event decoding: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds for 100k iterations
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks serialization of a full-lobby bootstrap snapshot
#[test]
fn benchmark_snapshot_serialization() {
    use shared::ServerEvent;

    let mut world = World::with_seed(7);
    for id in 1..=32 {
        world.spawn_player(id);
    }
    for i in 0..50 {
        world.add_bullet(
            (i % 32) + 1,
            Vec3::new(i as f32, 1.7, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            40.0,
            15,
            "pistol".to_string(),
        );
    }

    let snapshot = world.snapshot();
    let event = ServerEvent::Init {
        player_id: 1,
        players: snapshot.players,
        bullets: snapshot.bullets,
        grenades: snapshot.grenades,
    };

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let text = serde_json::to_string(&event).unwrap();
        let _decoded: ServerEvent = serde_json::from_str(&text).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot serialization: {} roundtrips in {:?} ({:.2} μs/roundtrip)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should handle 1000 snapshot roundtrips in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks bullet registration and cleanup throughput
#[test]
fn benchmark_bullet_lifecycle() {
    let mut world = World::with_seed(7);
    world.spawn_player(1);

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let bullet = world.add_bullet(
            1,
            Vec3::new(0.0, 1.7, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            40.0,
            15,
            "pistol".to_string(),
        );
        world.remove_bullet(bullet.id);
    }

    let duration = start.elapsed();
    println!(
        "Bullet lifecycle: {} add/remove pairs in {:?} ({:.2} μs/pair)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks movement routing through the full event path
#[test]
fn benchmark_movement_routing() {
    let mut world = World::with_seed(7);
    let mut router = EventRouter::new();
    for id in 1..=8 {
        router.handle_connect(&mut world, id);
    }

    let now = Instant::now();
    let iterations = 10_000;
    let start = Instant::now();

    for i in 0..iterations {
        let event = ClientEvent::Move {
            x: (i % 40) as f32 - 20.0,
            y: 1.7,
            z: (i % 17) as f32 - 8.0,
            rotation: (i % 360) as f32,
        };
        let batch = router.route(&mut world, (i % 8) as u32 + 1, event, now);
        assert_eq!(batch.len(), 1);
    }

    let duration = start.elapsed();
    println!(
        "Movement routing: {} events in {:?} ({:.2} μs/event)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should route 10k movement events in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks blast resolution: radius query plus falloff per victim
#[test]
fn benchmark_blast_resolution() {
    use server::weapons::{falloff_damage, GRENADE_DAMAGE, GRENADE_RADIUS};

    let mut world = World::with_seed(7);
    for id in 1..=100 {
        world.spawn_player(id);
    }
    // Park a known cluster inside the blast radius.
    for id in 1..=10u32 {
        world.move_player(id, id as f32 * 0.4, 1.7, 0.0, 0.0);
    }

    let center = Vec3::new(0.0, 1.7, 0.0);
    let iterations = 10_000;
    let start = Instant::now();

    let mut total_damage: i64 = 0;
    for _ in 0..iterations {
        for (_, distance) in world.players_within(center, GRENADE_RADIUS) {
            total_damage += falloff_damage(GRENADE_DAMAGE, distance, GRENADE_RADIUS) as i64;
        }
    }

    let duration = start.elapsed();
    println!(
        "Blast resolution: {} blasts over {} players in {:?} ({:.2} μs/blast)",
        iterations,
        world.players.len(),
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(total_damage > 0);
    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks fan-out through live session queues
#[test]
fn benchmark_broadcast_dispatch() {
    use server::broadcast::{dispatch, Outbound};
    use server::registry::SessionRegistry;
    use shared::ServerEvent;
    use tokio::sync::mpsc;

    let mut registry = SessionRegistry::new(64);
    let mut receivers = Vec::new();
    for i in 0..32 {
        let (tx, rx) = mpsc::unbounded_channel();
        let addr = format!("127.0.0.1:{}", 9000 + i).parse().unwrap();
        registry.register(addr, tx).unwrap();
        receivers.push(rx);
    }

    let batch = vec![
        Outbound::all(ServerEvent::PlayerMoved {
            player_id: 1,
            x: 1.0,
            y: 1.7,
            z: 2.0,
            rotation: 0.5,
        }),
        Outbound::all(ServerEvent::PlayerHit {
            player_id: 2,
            health: 70,
        }),
    ];

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let delivered = dispatch(&registry, &batch);
        assert_eq!(delivered, 64);
    }

    let duration = start.elapsed();
    println!(
        "Broadcast dispatch: {} batches to {} sessions in {:?} ({:.2} μs/batch)",
        iterations,
        registry.len(),
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should fan out 1000 batches in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks vector normalization used on every shot
#[test]
fn benchmark_vector_normalization() {
    use assert_approx_eq::assert_approx_eq;

    let iterations = 100_000;
    let start = Instant::now();

    let mut checksum = 0.0f32;
    for i in 1..=iterations {
        let v = Vec3::new(i as f32, (i % 13) as f32, (i % 7) as f32 - 3.0);
        checksum += v.normalized().magnitude();
    }

    let duration = start.elapsed();
    println!(
        "Vector normalization: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_approx_eq!(checksum / iterations as f32, 1.0, 1e-3);
    // Should complete in under 100ms
    assert!(duration.as_millis() < 100);
}

/// Stress tests a sustained firefight through the router
#[test]
fn stress_test_sustained_firefight() {
    use std::time::Duration;

    let mut world = World::with_seed(7);
    let mut router = EventRouter::new();
    for id in 1..=16 {
        router.handle_connect(&mut world, id);
    }

    let base = Instant::now();
    let rounds = 200;
    let start = Instant::now();

    let mut bullets_created = 0;
    for round in 0..rounds {
        // Half a second between volleys keeps every shot inside the fire rate.
        let now = base + Duration::from_millis(500 * round);
        for shooter in 1..=16u32 {
            let batch = router.route(
                &mut world,
                shooter,
                ClientEvent::Shoot {
                    origin: Vec3::new(shooter as f32, 1.7, 0.0),
                    direction: Vec3::new(0.0, 0.0, 1.0),
                    speed: 40.0,
                    damage: 15,
                    weapon_type: "pistol".to_string(),
                },
                now,
            );
            bullets_created += batch.len();
        }
    }

    let duration = start.elapsed();
    println!(
        "Sustained firefight: {} shots in {:?} ({:.2} μs/shot)",
        bullets_created,
        duration,
        duration.as_micros() as f64 / bullets_created as f64
    );

    assert_eq!(bullets_created, rounds as usize * 16);
    assert_eq!(world.bullets.len(), rounds as usize * 16);
    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}
