//! Scripted skirmish.
//!
//! Two teams with catalog loadouts fight until one side is wiped out or the
//! frame budget runs dry. Each frame every idle combatant tries its slots in
//! order and casts the first ability that is accepted.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use orb_combat::{
    AbilityAction, AbilityDefinition, BaseStats, CastError, Catalog, CombatEngine, CombatEvent,
    EngineConfig, EntityKind, EventHandler, FrameReport, HintResolver, LoadoutError, Rarity,
    TargetContext, TargetHint, TargetResolver, TargetType,
};
use orb_common::{EffectId, EntityId, LoadoutId};
use serde::Serialize;
use tracing::{debug, info};

/// Side of the skirmish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Team {
    /// Player party.
    Heroes,
    /// Hostile party.
    Monsters,
}

impl Team {
    const fn opponent(self) -> Self {
        match self {
            Self::Heroes => Self::Monsters,
            Self::Monsters => Self::Heroes,
        }
    }
}

/// One roster entry.
struct Recruit {
    name: &'static str,
    team: Team,
    kind: EntityKind,
    base: BaseStats,
    loadout: &'static str,
    rarity: Rarity,
    level: u32,
    opener: Option<&'static str>,
}

fn roster_spec() -> Vec<Recruit> {
    vec![
        Recruit {
            name: "Ragnar",
            team: Team::Heroes,
            kind: EntityKind::Player,
            base: BaseStats::new().with_hp(180.0),
            loadout: "warrior_melee_basic",
            rarity: Rarity::Rare,
            level: 3,
            opener: Some("battle_fury"),
        },
        Recruit {
            name: "Ember",
            team: Team::Heroes,
            kind: EntityKind::Friendly,
            base: BaseStats::new().with_mana(140.0),
            loadout: "mage_destruction_basic",
            rarity: Rarity::Uncommon,
            level: 2,
            opener: Some("arcane_power"),
        },
        Recruit {
            name: "Sister Ilsa",
            team: Team::Heroes,
            kind: EntityKind::Friendly,
            base: BaseStats::new().with_mana(160.0),
            loadout: "mage_healer_basic",
            rarity: Rarity::Uncommon,
            level: 2,
            opener: None,
        },
        Recruit {
            name: "Aldric the Fallen",
            team: Team::Monsters,
            kind: EntityKind::Enemy,
            base: BaseStats::new().with_hp(220.0),
            loadout: "knight_basic",
            rarity: Rarity::Uncommon,
            level: 2,
            opener: Some("iron_will"),
        },
        Recruit {
            name: "Gareth Ironwall",
            team: Team::Monsters,
            kind: EntityKind::Enemy,
            base: BaseStats::new().with_hp(260.0),
            loadout: "warden_advanced",
            rarity: Rarity::Rare,
            level: 1,
            opener: None,
        },
        Recruit {
            name: "Ogre Brute",
            team: Team::Monsters,
            kind: EntityKind::Creature,
            base: BaseStats::new().with_hp(320.0).with_attack(12.0),
            loadout: "warrior_melee_basic",
            rarity: Rarity::Common,
            level: 1,
            opener: None,
        },
    ]
}

/// A spawned fighter.
#[derive(Debug, Clone)]
pub struct Combatant {
    /// Engine id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Side.
    pub team: Team,
}

/// Resolves untargeted area casts against team membership.
///
/// Harmful area abilities hit the whole opposing team, supportive ones the
/// caster's own team. Everything else defers to the hint.
pub struct TeamResolver {
    teams: BTreeMap<EntityId, Team>,
}

impl TeamResolver {
    /// Create a resolver from a roster.
    pub fn new(roster: &[Combatant]) -> Self {
        Self {
            teams: roster.iter().map(|c| (c.id, c.team)).collect(),
        }
    }
}

impl TargetResolver for TeamResolver {
    fn resolve(&self, ctx: &TargetContext<'_>) -> Vec<EntityId> {
        let area = matches!(ctx.ability.target_type, TargetType::Area | TargetType::Ground);
        let Some(&team) = self.teams.get(&ctx.caster) else {
            return HintResolver.resolve(ctx);
        };
        if !area || *ctx.hint != TargetHint::None {
            return HintResolver.resolve(ctx);
        }

        let side = if is_supportive(ctx.ability) {
            team
        } else {
            team.opponent()
        };
        self.teams
            .iter()
            .filter(|(_, t)| **t == side)
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Whether an ability is aimed at allies: it deals no damage.
fn is_supportive(ability: &AbilityDefinition) -> bool {
    !ability
        .actions
        .iter()
        .any(|a| matches!(a, AbilityAction::Damage { .. }))
}

fn heals(ability: &AbilityDefinition) -> bool {
    ability
        .actions
        .iter()
        .any(|a| matches!(a, AbilityAction::Heal(_)))
}

/// Running totals collected from the event bus.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventTally {
    /// Damage removed from shields and health.
    pub damage: f32,
    /// Health restored.
    pub healing: f32,
    /// Shield granted.
    pub shielding: f32,
    /// Periodic ticks resolved.
    pub ticks: u32,
    /// Casts resolved.
    pub casts: u32,
    /// Casts cut short.
    pub interrupts: u32,
    /// Effects applied, refreshed or stacked.
    pub effects_applied: u32,
    /// Deaths.
    pub deaths: u32,
}

/// Logs combat events and tallies them.
pub struct SkirmishLog {
    names: BTreeMap<EntityId, String>,
    tally: RefCell<EventTally>,
}

impl SkirmishLog {
    /// Create a log for a roster.
    pub fn new(roster: &[Combatant]) -> Self {
        Self {
            names: roster.iter().map(|c| (c.id, c.name.clone())).collect(),
            tally: RefCell::new(EventTally::default()),
        }
    }

    fn name(&self, id: EntityId) -> &str {
        self.names.get(&id).map_or("unknown", String::as_str)
    }

    /// Totals so far.
    pub fn tally(&self) -> EventTally {
        self.tally.borrow().clone()
    }
}

impl EventHandler for SkirmishLog {
    fn handle(&self, event: &CombatEvent) {
        let mut tally = self.tally.borrow_mut();
        match event {
            CombatEvent::Damaged {
                absorbed, dealt, ..
            } => tally.damage += absorbed + dealt,
            CombatEvent::PeriodicDamage { .. } | CombatEvent::PeriodicRestore { .. } => {
                tally.ticks += 1;
            },
            CombatEvent::Healed { amount, .. } => tally.healing += amount,
            CombatEvent::Shielded { amount, .. } => tally.shielding += amount,
            CombatEvent::EffectApplied { .. } => tally.effects_applied += 1,
            CombatEvent::CastCompleted {
                caster,
                ability,
                targets,
            } => {
                tally.casts += 1;
                debug!(
                    "{} cast {} on {} targets",
                    self.name(*caster),
                    ability,
                    targets.len()
                );
            },
            CombatEvent::CastInterrupted { caster, ability } => {
                tally.interrupts += 1;
                debug!("{}'s {} was interrupted", self.name(*caster), ability);
            },
            CombatEvent::Died { entity, killer } => {
                tally.deaths += 1;
                match killer {
                    Some(killer) => {
                        info!("{} was slain by {}", self.name(*entity), self.name(*killer));
                    },
                    None => info!("{} died", self.name(*entity)),
                }
            },
            _ => {},
        }
    }
}

/// Final state of one combatant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurvivorReport {
    /// Display name.
    pub name: String,
    /// Side.
    pub team: Team,
    /// Health left.
    pub hp: f32,
    /// Maximum health.
    pub max_hp: f32,
    /// Effects still active.
    pub effects: Vec<String>,
}

/// Outcome of a skirmish.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkirmishSummary {
    /// Frames simulated.
    pub frames: u32,
    /// Seconds simulated.
    pub elapsed: f32,
    /// Last team standing; `None` on a draw.
    pub winner: Option<Team>,
    /// Entities halted by invariant faults, summed over frames.
    pub faults: usize,
    /// Event totals.
    pub tally: EventTally,
    /// Everyone still alive.
    pub survivors: Vec<SurvivorReport>,
}

/// A running skirmish.
pub struct Skirmish {
    engine: CombatEngine,
    roster: Vec<Combatant>,
    frames: u32,
    elapsed: f32,
    faults: usize,
}

impl Skirmish {
    /// Spawn the roster and equip every combatant.
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig) -> Result<Self, LoadoutError> {
        let mut engine = CombatEngine::new(catalog, config);
        let mut roster = Vec::new();

        for recruit in roster_spec() {
            let id = engine.spawn(recruit.kind, recruit.name, recruit.base);
            engine.equip_loadout(
                id,
                &LoadoutId::new(recruit.loadout),
                recruit.level,
                Some(recruit.rarity),
            )?;
            if let Some(opener) = recruit.opener {
                // Openers are flavor; a catalog without them still fights.
                if let Err(e) = engine.apply_effect(id, &EffectId::new(opener), Some(id)) {
                    debug!("{} skipped opener {}: {}", recruit.name, opener, e);
                }
            }
            roster.push(Combatant {
                id,
                name: recruit.name.to_string(),
                team: recruit.team,
            });
        }

        engine.set_resolver(TeamResolver::new(&roster));
        info!("Skirmish ready: {} combatants", roster.len());
        Ok(Self {
            engine,
            roster,
            frames: 0,
            elapsed: 0.0,
            faults: 0,
        })
    }

    /// The engine.
    pub fn engine(&self) -> &CombatEngine {
        &self.engine
    }

    /// Spawned fighters.
    pub fn roster(&self) -> &[Combatant] {
        &self.roster
    }

    fn is_alive(&self, id: EntityId) -> bool {
        self.engine.entity(id).is_some_and(|e| e.is_alive())
    }

    fn living(&self, team: Team) -> impl Iterator<Item = &Combatant> + '_ {
        self.roster
            .iter()
            .filter(move |c| c.team == team && self.is_alive(c.id))
    }

    /// Last team standing, if only one remains.
    pub fn winner(&self) -> Option<Team> {
        let heroes = self.living(Team::Heroes).count();
        let monsters = self.living(Team::Monsters).count();
        match (heroes, monsters) {
            (0, 0) => None,
            (_, 0) => Some(Team::Heroes),
            (0, _) => Some(Team::Monsters),
            _ => None,
        }
    }

    fn is_over(&self) -> bool {
        self.living(Team::Heroes).next().is_none() || self.living(Team::Monsters).next().is_none()
    }

    /// Ally most in need of healing, below 90% health.
    fn wounded_ally(&mut self, team: Team) -> Option<EntityId> {
        let allies: Vec<EntityId> = self.living(team).map(|c| c.id).collect();
        let mut best: Option<(EntityId, f32)> = None;
        for id in allies {
            let Some(hp) = self.engine.resources(id).map(|r| r.hp) else {
                continue;
            };
            let Some(max_hp) = self.engine.effective_stats(id).map(|s| s.max_hp()) else {
                continue;
            };
            let fraction = hp / max_hp;
            if fraction < 0.9 && best.map_or(true, |(_, f)| fraction < f) {
                best = Some((id, fraction));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Pick a target for one ability, or `None` to skip it.
    fn choose_target(
        &mut self,
        member: &Combatant,
        ability: &AbilityDefinition,
    ) -> Option<TargetHint> {
        let area = matches!(ability.target_type, TargetType::Area | TargetType::Ground);
        if is_supportive(ability) {
            // Heals wait for someone to need them; other support goes out at once.
            let ally = if heals(ability) {
                self.wounded_ally(member.team)?
            } else {
                member.id
            };
            return Some(if area {
                TargetHint::None
            } else {
                TargetHint::Entity(ally)
            });
        }
        match ability.target_type {
            _ if area => Some(TargetHint::None),
            TargetType::Passive => None,
            _ => self
                .living(member.team.opponent())
                .next()
                .map(|foe| TargetHint::Entity(foe.id)),
        }
    }

    /// Let one combatant try its slots in order.
    fn act(&mut self, member: &Combatant) {
        let Some(state) = self.engine.entity(member.id) else {
            return;
        };
        if !state.is_alive() || state.slots().iter().any(|s| s.is_casting()) {
            return;
        }
        let ready: Vec<_> = state
            .slots()
            .iter()
            .filter(|s| s.is_ready())
            .map(|s| s.ability().clone())
            .collect();

        for ability_id in ready {
            let Some(ability) = self.engine.catalog().ability(&ability_id).cloned() else {
                continue;
            };
            let Some(hint) = self.choose_target(member, &ability) else {
                continue;
            };
            match self.engine.cast_ability(member.id, &ability_id, hint) {
                Ok(_) => return,
                Err(CastError::InsufficientResource { .. } | CastError::OnCooldown { .. }) => {},
                Err(e) => {
                    debug!("{} cannot cast {}: {}", member.name, ability_id, e);
                    return;
                },
            }
        }
    }

    /// Run AI for every combatant, then advance the engine.
    pub fn step(&mut self, dt: f32, log: &SkirmishLog) -> FrameReport {
        let roster = self.roster.clone();
        for member in &roster {
            self.act(member);
        }
        let report = self.engine.advance(dt);
        self.engine.events().dispatch(log);

        self.frames += 1;
        self.elapsed += report.delta;
        self.faults += report.faults.len();
        report
    }

    /// Run until one team is wiped out or `max_frames` have passed.
    pub fn run(&mut self, dt: f32, max_frames: u32, log: &SkirmishLog) -> SkirmishSummary {
        while self.frames < max_frames && !self.is_over() {
            self.step(dt, log);
        }
        self.summary(log)
    }

    /// Snapshot the outcome.
    pub fn summary(&mut self, log: &SkirmishLog) -> SkirmishSummary {
        let mut survivors = Vec::new();
        for member in &self.roster {
            let Some(hp) = self
                .engine
                .entity(member.id)
                .filter(|e| e.is_alive())
                .map(|e| e.resources().hp)
            else {
                continue;
            };
            let max_hp = self
                .engine
                .effective_stats(member.id)
                .map_or(hp, |s| s.max_hp());
            let effects = self
                .engine
                .list_active(member.id)
                .map(|active| active.iter().map(|i| i.effect().to_string()).collect())
                .unwrap_or_default();
            survivors.push(SurvivorReport {
                name: member.name.clone(),
                team: member.team,
                hp,
                max_hp,
                effects,
            });
        }

        SkirmishSummary {
            frames: self.frames,
            elapsed: self.elapsed,
            winner: self.winner(),
            faults: self.faults,
            tally: log.tally(),
            survivors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orb_combat::builtin_catalog;

    fn skirmish() -> Skirmish {
        let catalog = Arc::new(builtin_catalog().expect("Built-in catalog should build"));
        let config = EngineConfig {
            max_frame_delta: Some(0.25),
            ..EngineConfig::default()
        };
        Skirmish::new(catalog, config).expect("Roster should equip")
    }

    #[test]
    fn test_roster_spawns_both_teams() {
        let sim = skirmish();
        assert_eq!(sim.roster().len(), 6);
        assert_eq!(sim.engine().entity_count(), 6);
        assert!(sim.winner().is_none());
        for member in sim.roster() {
            let state = sim.engine().entity(member.id).expect("Spawned");
            assert!(state.loadout().is_some(), "{} has no loadout", member.name);
            assert!(!state.slots().is_empty());
        }
    }

    #[test]
    fn test_team_resolver_expands_area_casts() {
        let sim = skirmish();
        let resolver = TeamResolver::new(sim.roster());
        let catalog = sim.engine().catalog();
        let hero = sim.roster()[0].id;

        let storm = catalog
            .ability(&orb_common::AbilityId::new("blade_storm"))
            .expect("blade_storm exists");
        let targets = resolver.resolve(&TargetContext {
            caster: hero,
            ability: storm,
            hint: &TargetHint::None,
        });
        let monsters: Vec<_> = sim
            .roster()
            .iter()
            .filter(|c| c.team == Team::Monsters)
            .map(|c| c.id)
            .collect();
        assert_eq!(targets, monsters);

        let slash = catalog
            .ability(&orb_common::AbilityId::new("slash"))
            .expect("slash exists");
        let targets = resolver.resolve(&TargetContext {
            caster: hero,
            ability: slash,
            hint: &TargetHint::Entity(monsters[1]),
        });
        assert_eq!(targets, vec![monsters[1]]);
    }

    #[test]
    fn test_skirmish_makes_progress() {
        let mut sim = skirmish();
        let log = SkirmishLog::new(sim.roster());
        let summary = sim.run(1.0 / 30.0, 30 * 20, &log);

        assert!(summary.frames > 0);
        assert!(summary.tally.casts > 0, "Someone should land a cast");
        assert!(summary.tally.damage > 0.0);
        assert_eq!(summary.faults, 0);
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let mut sim = skirmish();
        let log = SkirmishLog::new(sim.roster());
        sim.step(0.1, &log);
        let summary = sim.summary(&log);

        let json = serde_json::to_string(&summary).expect("Summary should serialize");
        assert!(json.contains("\"survivors\""));
        assert!(json.contains("Ragnar"));
    }
}
