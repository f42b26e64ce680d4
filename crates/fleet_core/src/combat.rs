//! Combat resolution.
//!
//! Runs once per tick after the AI. Human ships fire first, then the
//! computer coalition; every exchange is simultaneous (the target hits back
//! in the same step). Ships killed earlier in the pass no longer act.

use serde::{Deserialize, Serialize};

use crate::math::{milli, Fixed, Vec2Fixed};
use crate::rng::SimRng;
use crate::ship::{ShipId, ShipType, TeamId};
use crate::visibility::Visibility;
use crate::world::ShipStorage;

/// Multiplier for a favourable matchup, per mille.
pub const STRONG_MILLI: i32 = 1_750;
/// Multiplier for an unfavourable matchup, per mille.
pub const WEAK_MILLI: i32 = 600;
/// Maximum number of live effect records.
pub const MAX_LIVE_EFFECTS: usize = 120;

/// Whether `attacker` counters `target`.
#[must_use]
pub const fn is_strong_against(attacker: ShipType, target: ShipType) -> bool {
    use ShipType::{
        Battlecruiser, Bomber, Carrier, Corvette, Destroyer, Frigate, Interceptor, Mothership,
    };
    matches!(
        (attacker, target),
        (Interceptor, Bomber)
            | (Corvette, Interceptor | Bomber)
            | (Frigate, Interceptor | Bomber | Corvette)
            | (Bomber, Destroyer | Battlecruiser | Carrier | Mothership)
            | (Destroyer, Frigate)
            | (Battlecruiser, Destroyer | Frigate)
    )
}

/// Type-vs-type damage multiplier.
#[must_use]
pub fn type_multiplier(attacker: ShipType, target: ShipType) -> Fixed {
    if is_strong_against(attacker, target) {
        milli(STRONG_MILLI)
    } else if is_strong_against(target, attacker) {
        milli(WEAK_MILLI)
    } else {
        Fixed::ONE
    }
}

/// Balance weights for the different kinds of exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatWeights {
    /// Fraction of the target's damage returned in an assigned exchange.
    pub retaliation: Fixed,
    /// Outgoing weight of a human opportunistic exchange.
    pub human_opportunistic: Fixed,
    /// Weight of the return fire in a human opportunistic exchange.
    pub human_opportunistic_return: Fixed,
    /// Outgoing weight of a computer opportunistic exchange.
    pub computer_opportunistic: Fixed,
}

impl Default for CombatWeights {
    fn default() -> Self {
        Self {
            retaliation: milli(500),
            human_opportunistic: milli(500),
            human_opportunistic_return: milli(300),
            computer_opportunistic: milli(400),
        }
    }
}

/// Visual style of an effect record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Interceptor missile.
    Missile,
    /// Bomber payload.
    Bomb,
    /// Human corvette laser.
    LaserGreen,
    /// Computer laser (corvettes and unclassified shooters).
    LaserRed,
    /// Frigate flak.
    FrigateShot,
    /// Destroyer and battlecruiser beam.
    IonCannon,
    /// Human capital plasma.
    PlasmaBlue,
}

impl EffectKind {
    /// Effect style for a shooter.
    #[must_use]
    pub const fn for_attacker(attacker: ShipType, human_side: bool) -> Self {
        match attacker {
            ShipType::Interceptor => Self::Missile,
            ShipType::Bomber => Self::Bomb,
            ShipType::Frigate => Self::FrigateShot,
            ShipType::Destroyer | ShipType::Battlecruiser => Self::IonCannon,
            _ if human_side && matches!(attacker, ShipType::Corvette) => Self::LaserGreen,
            _ if human_side => Self::PlasmaBlue,
            _ => Self::LaserRed,
        }
    }

    /// How long the record lives.
    #[must_use]
    pub const fn lifetime_ms(self) -> u32 {
        match self {
            Self::Missile => 240,
            Self::Bomb => 320,
            Self::FrigateShot => 220,
            Self::IonCannon => 260,
            Self::LaserGreen | Self::LaserRed | Self::PlasmaBlue => 180,
        }
    }

    /// Projectiles land exactly on target; beams get a little scatter.
    #[must_use]
    pub const fn is_jittered(self) -> bool {
        !matches!(self, Self::Missile | Self::Bomb | Self::FrigateShot)
    }
}

/// A short-lived record for renderers. No gameplay effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CombatEffect {
    /// Shooter position.
    pub from: Vec2Fixed,
    /// Impact position.
    pub to: Vec2Fixed,
    /// Visual style.
    pub kind: EffectKind,
    /// Time alive.
    pub age_ms: u32,
}

impl CombatEffect {
    /// Age in `0.0..=1.0` over the kind's lifetime.
    #[must_use]
    pub fn age(&self) -> f32 {
        (self.age_ms as f32 / self.kind.lifetime_ms() as f32).min(1.0)
    }

    /// Whether the record has faded out.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.age_ms >= self.kind.lifetime_ms()
    }
}

/// Advance all effects and drop expired ones.
pub fn tick_effects(effects: &mut Vec<CombatEffect>, delta_ms: u32) {
    for effect in effects.iter_mut() {
        effect.age_ms = effect.age_ms.saturating_add(delta_ms);
    }
    effects.retain(|e| !e.is_expired());
}

fn spawn_effect(
    effects: &mut Vec<CombatEffect>,
    from: Vec2Fixed,
    to: Vec2Fixed,
    attacker: ShipType,
    human_side: bool,
    rng: &mut SimRng,
) {
    if effects.len() >= MAX_LIVE_EFFECTS {
        return;
    }
    let kind = EffectKind::for_attacker(attacker, human_side);
    let to = if kind.is_jittered() {
        let spread = milli(2_500);
        Vec2Fixed::new(
            to.x + rng.range_fixed(-spread, spread),
            to.y + rng.range_fixed(-spread, spread),
        )
    } else {
        to
    };
    effects.push(CombatEffect {
        from,
        to,
        kind,
        age_ms: 0,
    });
}

/// A ship destroyed during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kill {
    /// Shooter that landed the killing blow (or whose return fire did).
    pub attacker: ShipId,
    /// Destroyed ship.
    pub victim: ShipId,
    /// Destroyed ship's type.
    pub victim_type: ShipType,
    /// Destroyed ship's team.
    pub victim_team: TeamId,
}

#[derive(Clone, Copy)]
struct Combatant {
    id: ShipId,
    ship_type: ShipType,
    team: TeamId,
    position: Vec2Fixed,
    damage: Fixed,
    alive: bool,
}

fn combatant(ships: &ShipStorage, id: ShipId) -> Option<Combatant> {
    ships.get(id).map(|s| Combatant {
        id: s.id,
        ship_type: s.ship_type,
        team: s.team,
        position: s.position,
        damage: s.damage,
        alive: s.is_alive(),
    })
}

/// Hit `victim` for `amount`; record a kill when this blow was fatal.
fn hit(
    ships: &mut ShipStorage,
    attacker: ShipId,
    victim: ShipId,
    amount: Fixed,
    kills: &mut Vec<Kill>,
) -> bool {
    let Some(ship) = ships.get_mut(victim) else {
        return false;
    };
    if ship.apply_damage(amount) {
        kills.push(Kill {
            attacker,
            victim,
            victim_type: ship.ship_type,
            victim_team: ship.team,
        });
        return true;
    }
    false
}

/// Clear every attack order whose target is dead, gone, or out of sight.
pub fn drop_lost_targets(ships: &mut ShipStorage, visibility: &Visibility) {
    let lost: Vec<ShipId> = ships
        .iter()
        .filter_map(|s| {
            let target = s.attack_target?;
            let keep = ships.get(target).is_some_and(|t| t.is_alive())
                && visibility.is_visible(target, s.team);
            (!keep).then_some(s.id)
        })
        .collect();
    for id in lost {
        if let Some(ship) = ships.get_mut(id) {
            ship.attack_target = None;
        }
    }
}

/// Resolve one tick of combat. Returns the ships destroyed.
pub fn resolve_combat(
    ships: &mut ShipStorage,
    visibility: &Visibility,
    weights: &CombatWeights,
    effects: &mut Vec<CombatEffect>,
    rng: &mut SimRng,
) -> Vec<Kill> {
    drop_lost_targets(ships, visibility);

    let mut kills = Vec::new();
    let ids = ships.sorted_ids();
    let (human, computer): (Vec<ShipId>, Vec<ShipId>) = ids
        .into_iter()
        .partition(|id| ships.get(*id).is_some_and(|s| s.team.is_human()));

    for (side, human_side) in [(human, true), (computer, false)] {
        let (out_weight, back_weight) = if human_side {
            (weights.human_opportunistic, weights.human_opportunistic_return)
        } else {
            (weights.computer_opportunistic, Fixed::ZERO)
        };

        for id in side {
            let Some(me) = combatant(ships, id) else {
                continue;
            };
            if !me.alive || !me.ship_type.is_armed() {
                continue;
            }
            let range_sq = me.ship_type.attack_range() * me.ship_type.attack_range();
            let target = ships.get(id).and_then(|s| s.attack_target);

            if let Some(target) = target.and_then(|t| combatant(ships, t)).filter(|t| t.alive) {
                // An assigned target in pursuit blocks opportunistic fire.
                if me.position.distance_squared(target.position) > range_sq {
                    continue;
                }
                let outgoing = me.damage * type_multiplier(me.ship_type, target.ship_type);
                let returned = target.damage
                    * type_multiplier(target.ship_type, me.ship_type)
                    * weights.retaliation;
                spawn_effect(effects, me.position, target.position, me.ship_type, human_side, rng);
                let killed = hit(ships, id, target.id, outgoing, &mut kills);
                hit(ships, target.id, id, returned, &mut kills);
                if killed {
                    if let Some(ship) = ships.get_mut(id) {
                        ship.attack_target = None;
                    }
                }
                continue;
            }

            for enemy_id in visibility.visible_to(me.team) {
                let Some(enemy) = combatant(ships, enemy_id) else {
                    continue;
                };
                if !enemy.alive
                    || !enemy.team.is_hostile_to(me.team)
                    || enemy.ship_type.is_economic()
                    || me.position.distance_squared(enemy.position) > range_sq
                {
                    continue;
                }
                let outgoing =
                    me.damage * type_multiplier(me.ship_type, enemy.ship_type) * out_weight;
                let returned =
                    enemy.damage * type_multiplier(enemy.ship_type, me.ship_type) * back_weight;
                spawn_effect(effects, me.position, enemy.position, me.ship_type, human_side, rng);
                hit(ships, id, enemy.id, outgoing, &mut kills);
                if hit(ships, enemy.id, id, returned, &mut kills) {
                    break;
                }
            }
        }
    }

    kills
}
