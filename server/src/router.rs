//! Event routing for the game server
//!
//! This module turns decoded client events into world mutations and
//! outbound broadcasts. Every event is validated against the current
//! world before anything is mutated; events that fail validation are
//! dropped without a reply, since a malformed or stale event usually
//! means an out-of-date client rather than something worth answering.
//!
//! The router runs on the main server task and is the only place where
//! game rules live. The world stores facts, the router decides them.

use crate::broadcast::Outbound;
use crate::weapons::{falloff_damage, WeaponTable, GRENADE_DAMAGE, GRENADE_RADIUS};
use crate::world::World;
use log::{debug, info, warn};
use shared::{ClientEvent, PlayerId, ServerEvent, Vec3, MAX_UNATTRIBUTED_DAMAGE};
use std::collections::HashMap;
use std::time::Instant;

pub struct EventRouter {
    weapons: WeaponTable,
    /// Last accepted shot per player, for fire-rate enforcement.
    last_shot: HashMap<PlayerId, Instant>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self {
            weapons: WeaponTable::builtin(),
            last_shot: HashMap::new(),
        }
    }

    /// Spawns the new player and produces their bootstrap snapshot plus
    /// the join announcement for everyone else.
    pub fn handle_connect(&mut self, world: &mut World, player_id: PlayerId) -> Vec<Outbound> {
        let player = world.spawn_player(player_id);
        let snapshot = world.snapshot();

        vec![
            Outbound::one(
                player_id,
                ServerEvent::Init {
                    player_id,
                    players: snapshot.players,
                    bullets: snapshot.bullets,
                    grenades: snapshot.grenades,
                },
            ),
            Outbound::all_except(player_id, ServerEvent::PlayerJoined { player_id, player }),
        ]
    }

    /// Removes the player and announces it. Bullets and grenades the
    /// player owns stay in the world until they resolve on their own.
    pub fn handle_disconnect(&mut self, world: &mut World, player_id: PlayerId) -> Vec<Outbound> {
        self.last_shot.remove(&player_id);
        if !world.remove_player(player_id) {
            return Vec::new();
        }

        let mut out = vec![Outbound::all(ServerEvent::PlayerLeft { player_id })];
        self.check_game_over(world, &mut out);
        out
    }

    /// Applies one client event against the world and returns the
    /// broadcasts it produced. Invalid events return an empty batch.
    pub fn route(
        &mut self,
        world: &mut World,
        sender: PlayerId,
        event: ClientEvent,
        now: Instant,
    ) -> Vec<Outbound> {
        if !world.players.contains_key(&sender) {
            // The session raced with a disconnect; nothing to apply to.
            debug!("Dropping event from unknown player {}", sender);
            return Vec::new();
        }

        match event {
            ClientEvent::Move { x, y, z, rotation } => self.on_move(world, sender, x, y, z, rotation),
            ClientEvent::Shoot {
                origin,
                direction,
                speed,
                damage,
                weapon_type,
            } => self.on_shoot(world, sender, origin, direction, speed, damage, weapon_type, now),
            ClientEvent::Hit {
                player_id,
                bullet_id,
                damage,
            } => self.on_hit(world, sender, player_id, bullet_id, damage),
            ClientEvent::RemoveBullet { bullet_id } => {
                if world.remove_bullet(bullet_id) {
                    vec![Outbound::all(ServerEvent::BulletRemoved { bullet_id })]
                } else {
                    Vec::new()
                }
            }
            ClientEvent::ThrowGrenade { origin, velocity } => {
                self.on_throw_grenade(world, sender, origin, velocity)
            }
            ClientEvent::ExplodeGrenade {
                grenade_id,
                position,
            } => self.on_explode_grenade(world, grenade_id, position),
            ClientEvent::Respawn => self.on_respawn(world, sender),
        }
    }

    /// Position updates are applied in any state, dead included. The
    /// client is authoritative over where its player stands.
    fn on_move(
        &self,
        world: &mut World,
        sender: PlayerId,
        x: f32,
        y: f32,
        z: f32,
        rotation: f32,
    ) -> Vec<Outbound> {
        if !(x.is_finite() && y.is_finite() && z.is_finite() && rotation.is_finite()) {
            warn!("Dropping move with non-finite values from player {}", sender);
            return Vec::new();
        }

        world.move_player(sender, x, y, z, rotation);
        vec![Outbound::all_except(
            sender,
            ServerEvent::PlayerMoved {
                player_id: sender,
                x,
                y,
                z,
                rotation,
            },
        )]
    }

    #[allow(clippy::too_many_arguments)]
    fn on_shoot(
        &mut self,
        world: &mut World,
        sender: PlayerId,
        origin: Vec3,
        direction: Vec3,
        speed: f32,
        damage: i32,
        weapon_type: String,
        now: Instant,
    ) -> Vec<Outbound> {
        if !world.is_alive(sender) {
            debug!("Rejecting shot from dead player {}", sender);
            return Vec::new();
        }
        if !origin.is_finite()
            || !direction.is_finite()
            || !speed.is_finite()
            || speed <= 0.0
            || damage <= 0
        {
            warn!("Dropping malformed shot from player {}", sender);
            return Vec::new();
        }
        if direction.magnitude() < f32::EPSILON {
            warn!("Dropping shot with zero direction from player {}", sender);
            return Vec::new();
        }

        if let Some(last) = self.last_shot.get(&sender) {
            if now.duration_since(*last) < self.weapons.fire_interval(&weapon_type) {
                debug!("Rate-limited shot from player {}", sender);
                return Vec::new();
            }
        }
        self.last_shot.insert(sender, now);

        let damage = self.weapons.clamp_damage(&weapon_type, damage);
        let bullet = world.add_bullet(
            sender,
            origin,
            direction.normalized(),
            speed,
            damage,
            weapon_type,
        );

        vec![Outbound::all(ServerEvent::BulletCreated {
            bullet_id: bullet.id,
            bullet,
        })]
    }

    /// Hit reports are client-trusted: the reporting client decides that
    /// a bullet connected. The server still bounds the damage, consumes
    /// the bullet, and owns the resulting death.
    fn on_hit(
        &mut self,
        world: &mut World,
        sender: PlayerId,
        target: PlayerId,
        bullet_id: shared::BulletId,
        claimed: i32,
    ) -> Vec<Outbound> {
        if claimed <= 0 {
            warn!("Dropping hit with non-positive damage from player {}", sender);
            return Vec::new();
        }
        if !world.players.contains_key(&target) {
            debug!("Dropping hit on unknown player {}", target);
            return Vec::new();
        }

        // A known bullet bounds the damage and names the killer. A hit
        // without one is still honored, capped, and credited to the
        // reporter.
        let (damage, killer) = match world.bullet(bullet_id) {
            Some(bullet) => (claimed.min(bullet.damage), bullet.owner_id),
            None => (claimed.min(MAX_UNATTRIBUTED_DAMAGE), sender),
        };

        let mut out = Vec::new();
        if world.remove_bullet(bullet_id) {
            out.push(Outbound::all(ServerEvent::BulletRemoved { bullet_id }));
        }

        let Some(result) = world.apply_damage(target, damage) else {
            return out;
        };
        if result.health == 0 && !result.lethal {
            // Already dead; the report arrived late.
            return out;
        }

        debug!("Player {} hit player {} for {}", sender, target, damage);
        out.push(Outbound::all(ServerEvent::PlayerHit {
            player_id: target,
            health: result.health,
        }));

        if result.lethal {
            info!("Player {} was killed by player {}", target, killer);
            out.push(Outbound::all(ServerEvent::PlayerDied {
                player_id: target,
                killer_id: Some(killer),
            }));
            self.check_game_over(world, &mut out);
        }

        out
    }

    fn on_throw_grenade(
        &self,
        world: &mut World,
        sender: PlayerId,
        origin: Vec3,
        velocity: Vec3,
    ) -> Vec<Outbound> {
        if !world.is_alive(sender) {
            debug!("Rejecting grenade throw from dead player {}", sender);
            return Vec::new();
        }
        if !origin.is_finite() || !velocity.is_finite() {
            warn!("Dropping malformed grenade throw from player {}", sender);
            return Vec::new();
        }

        let grenade = world.add_grenade(sender, origin, velocity);
        vec![Outbound::all(ServerEvent::GrenadeThrown {
            grenade_id: grenade.id,
            grenade,
        })]
    }

    /// Detonation reports resolve against the thrower recorded at throw
    /// time, so the blast is attributed correctly even if the thrower
    /// has since died.
    fn on_explode_grenade(
        &mut self,
        world: &mut World,
        grenade_id: shared::GrenadeId,
        position: Vec3,
    ) -> Vec<Outbound> {
        if !position.is_finite() {
            warn!("Dropping grenade explosion with non-finite position");
            return Vec::new();
        }
        let Some(grenade) = world.grenade(grenade_id) else {
            debug!("Dropping explosion for unknown grenade {}", grenade_id);
            return Vec::new();
        };
        let thrower = grenade.owner_id;
        world.remove_grenade(grenade_id);

        let mut out = vec![Outbound::all(ServerEvent::GrenadeExploded {
            grenade_id,
            position,
        })];

        let mut any_lethal = false;
        for (victim, distance) in world.players_within(position, GRENADE_RADIUS) {
            let damage = falloff_damage(GRENADE_DAMAGE, distance, GRENADE_RADIUS);
            if damage == 0 {
                continue;
            }
            let Some(result) = world.apply_damage(victim, damage) else {
                continue;
            };
            if result.health == 0 && !result.lethal {
                continue;
            }

            out.push(Outbound::all(ServerEvent::PlayerHit {
                player_id: victim,
                health: result.health,
            }));
            if result.lethal {
                any_lethal = true;
                info!("Player {} was killed by player {}'s grenade", victim, thrower);
                out.push(Outbound::all(ServerEvent::PlayerDied {
                    player_id: victim,
                    killer_id: Some(thrower),
                }));
            }
        }

        if any_lethal {
            self.check_game_over(world, &mut out);
        }
        out
    }

    fn on_respawn(&self, world: &mut World, sender: PlayerId) -> Vec<Outbound> {
        if world.respawn(sender) {
            vec![Outbound::all(ServerEvent::PlayerRespawned { player_id: sender })]
        } else {
            debug!("Ignoring respawn from living player {}", sender);
            Vec::new()
        }
    }

    /// A round ends when deaths or disconnects leave exactly one player
    /// standing. Checked only when one of those two things just happened.
    fn check_game_over(&self, world: &World, out: &mut Vec<Outbound>) {
        if let [winner] = world.alive_ids()[..] {
            info!("Game over, player {} is the last one standing", winner);
            out.push(Outbound::all(ServerEvent::GameOver { winner_id: winner }));
        }
    }
}
