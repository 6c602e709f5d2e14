//! Built-in content.
//!
//! A playable set of buffs, debuffs, damage-over-time effects, abilities
//! and loadouts. Percentages are fractions (`0.40` is +40%). Stats that are
//! themselves fractions (crit chance, cdr, lifesteal, damage taken, ...)
//! take flat modifiers; pools, attack, defense, speed and regen take
//! percentage modifiers unless the bonus is a flat amount.

use crate::catalog::{
    AbilityAction, AbilityDefinition, Catalog, CatalogBuilder, EffectDefinition, EquipSlot,
    EquipmentPiece, LoadoutDefinition, ResourceKind, Scaling, ScalingSource, TargetType, TickSpec,
};
use crate::damage::DamageType;
use crate::effects::CleanseFilter;
use crate::error::CatalogError;
use crate::loadout::Rarity;
use crate::stats::{ControlFlags, Modifier, Stat};

/// Build the built-in catalog.
pub fn builtin_catalog() -> Result<Catalog, CatalogError> {
    let mut builder = Catalog::builder();
    add_buffs(&mut builder)?;
    add_debuffs(&mut builder)?;
    add_damage_over_time(&mut builder)?;
    add_abilities(&mut builder)?;
    add_passives(&mut builder)?;
    add_loadouts(&mut builder)?;
    builder.build()
}

const fn pct(stat: Stat, value: f32) -> Modifier {
    Modifier::percent(stat, value)
}

const fn flat(stat: Stat, value: f32) -> Modifier {
    Modifier::flat(stat, value)
}

fn flags(set: impl FnOnce(&mut ControlFlags)) -> ControlFlags {
    let mut flags = ControlFlags::default();
    set(&mut flags);
    flags
}

// ============================================================================
// Effects
// ============================================================================

fn add_buffs(builder: &mut CatalogBuilder) -> Result<(), CatalogError> {
    builder
        .add_effect(
            EffectDefinition::buff("healing_empowerment", "Healing Empowerment")
                .with_duration(10.0)
                .with_modifiers([flat(Stat::HealingPower, 0.25)]),
        )?
        .add_effect(
            EffectDefinition::buff("blessed", "Blessed")
                .with_duration(8.0)
                .with_modifiers([Modifier::AllStats(0.10)]),
        )?
        .add_effect(
            EffectDefinition::buff("radiance", "Radiance")
                .with_duration(12.0)
                .with_modifiers([pct(Stat::Speed, 0.15), flat(Stat::CritChance, 0.10)]),
        )?
        .add_effect(
            EffectDefinition::buff("temporal_flux", "Temporal Flux")
                .with_duration(8.0)
                .with_modifiers([
                    flat(Stat::CooldownReduction, 0.30),
                    flat(Stat::CastSpeed, 0.20),
                ]),
        )?
        .add_effect(
            EffectDefinition::buff("berserker_rage", "Berserker Rage")
                .with_duration(6.0)
                .with_modifiers([pct(Stat::Attack, 0.40), pct(Stat::Defense, -0.20)]),
        )?
        .add_effect(
            EffectDefinition::buff("iron_will", "Iron Will")
                .with_duration(5.0)
                .with_modifiers([pct(Stat::Defense, 0.50)])
                .with_control(flags(|f| f.cc_immune = true)),
        )?
        .add_effect(
            EffectDefinition::buff("arcane_power", "Arcane Power")
                .with_duration(10.0)
                .with_modifiers([flat(Stat::MagicDamage, 0.30), pct(Stat::ManaRegen, 0.15)]),
        )?
        .add_effect(
            EffectDefinition::buff("battle_fury", "Battle Fury")
                .with_duration(7.0)
                .with_modifiers([flat(Stat::AllDamage, 0.20), flat(Stat::CritMultiplier, 0.10)]),
        )?
        .add_effect(
            EffectDefinition::buff("regeneration", "Regeneration")
                .with_duration(8.0)
                .with_tick(TickSpec::restore(ResourceKind::Hp, 5.0, 1.0)),
        )?
        .add_effect(
            EffectDefinition::buff("mana_surge", "Mana Surge")
                .with_duration(6.0)
                .with_tick(TickSpec::restore(ResourceKind::Mana, 8.0, 1.0)),
        )?
        .add_effect(
            EffectDefinition::buff("vigor", "Vigor")
                .with_duration(12.0)
                .with_modifiers([pct(Stat::MaxHp, 0.15), flat(Stat::HpRegen, 8.0)]),
        )?
        .add_effect(
            EffectDefinition::buff("fortified", "Fortified")
                .with_duration(8.0)
                .with_modifiers([flat(Stat::ShieldEfficiency, 0.20)])
                .with_shield(300.0),
        )?
        .add_effect(
            EffectDefinition::buff("lifesteal_boost", "Lifesteal Surge")
                .with_duration(10.0)
                .with_modifiers([flat(Stat::Lifesteal, 0.15)]),
        )?
        .add_effect(
            EffectDefinition::buff("haste", "Haste")
                .with_duration(5.0)
                .with_modifiers([pct(Stat::Speed, 0.30)]),
        )?
        .add_effect(
            EffectDefinition::buff("flight", "Flight")
                .with_duration(6.0)
                .with_modifiers([pct(Stat::Speed, 1.0)])
                .with_control(flags(|f| f.flying = true)),
        )?
        .add_effect(
            EffectDefinition::buff("focus", "Focus")
                .with_duration(8.0)
                .with_modifiers([
                    flat(Stat::CooldownReduction, 0.20),
                    flat(Stat::ManaCostReduction, 0.50),
                ]),
        )?
        .add_effect(
            EffectDefinition::buff("clarity", "Clarity")
                .with_duration(10.0)
                .with_modifiers([pct(Stat::ManaRegen, 0.25)])
                .with_control(flags(|f| f.silence_immune = true)),
        )?
        .add_effect(
            EffectDefinition::buff("divine_shield", "Divine Shield")
                .with_duration(3.0)
                .with_control(flags(|f| {
                    f.invulnerable = true;
                    f.cc_immune = true;
                })),
        )?
        .add_effect(
            EffectDefinition::buff("lucky", "Lucky")
                .with_duration(10.0)
                .with_modifiers([flat(Stat::CritChance, 0.25), flat(Stat::CritMultiplier, 0.50)]),
        )?
        .add_effect(
            EffectDefinition::buff("emperor_power", "Power of the Emperor")
                .with_modifiers([
                    pct(Stat::MaxHp, 2.0),
                    pct(Stat::MaxMana, 2.0),
                    pct(Stat::MaxStamina, 2.0),
                    flat(Stat::CooldownReduction, 0.50),
                ]),
        )?;
    Ok(())
}

fn add_debuffs(builder: &mut CatalogBuilder) -> Result<(), CatalogError> {
    builder
        .add_effect(
            EffectDefinition::debuff("slow", "Slow")
                .with_duration(6.0)
                .with_max_stacks(4)
                .with_modifiers([pct(Stat::Speed, -0.30)]),
        )?
        .add_effect(
            EffectDefinition::debuff("root", "Root")
                .with_duration(3.0)
                .with_max_stacks(2)
                .with_control(flags(|f| f.rooted = true)),
        )?
        .add_effect(
            EffectDefinition::debuff("silence", "Silence")
                .with_duration(4.0)
                .with_max_stacks(3)
                .with_control(flags(|f| f.silenced = true)),
        )?
        .add_effect(
            EffectDefinition::debuff("stun", "Stun")
                .with_duration(2.0)
                .with_max_stacks(2)
                .with_modifiers([pct(Stat::Speed, -1.0)])
                .with_control(flags(|f| f.stunned = true)),
        )?
        .add_effect(
            EffectDefinition::debuff("weakness", "Weakness")
                .with_duration(8.0)
                .with_max_stacks(3)
                .with_modifiers([pct(Stat::Attack, -0.40)]),
        )?
        .add_effect(
            EffectDefinition::debuff("vulnerability", "Vulnerability")
                .with_duration(6.0)
                .with_max_stacks(3)
                .with_modifiers([flat(Stat::DamageTaken, 0.50)]),
        )?
        .add_effect(
            EffectDefinition::debuff("frozen", "Frozen")
                .with_duration(2.2)
                .with_modifiers([pct(Stat::Speed, -1.0)])
                .with_control(flags(|f| {
                    f.rooted = true;
                    f.stunned = true;
                })),
        )?
        .add_effect(
            EffectDefinition::debuff("shocked", "Shocked")
                .with_duration(4.0)
                .with_modifiers([flat(Stat::DamageTaken, 0.15), pct(Stat::Speed, -0.10)]),
        )?;
    Ok(())
}

fn add_damage_over_time(builder: &mut CatalogBuilder) -> Result<(), CatalogError> {
    let dot = |id: &str,
               name: &str,
               amount: f32,
               interval: f32,
               duration: f32,
               stacks: u32,
               damage_type: DamageType| {
        EffectDefinition::debuff(id, name)
            .with_duration(duration)
            .with_max_stacks(stacks)
            .with_tick(TickSpec::damage(amount, interval, damage_type))
    };

    builder
        .add_effect(dot("bleed", "Bleed", 20.0, 1.0, 6.0, 5, DamageType::Physical))?
        .add_effect(dot("poison", "Poison", 15.0, 1.0, 10.0, 4, DamageType::Nature))?
        .add_effect(dot("burn", "Burn", 18.0, 1.0, 8.0, 5, DamageType::Fire))?
        .add_effect(dot("arcane_burn", "Arcane Burn", 25.0, 0.5, 3.0, 6, DamageType::Arcane))?
        .add_effect(
            dot("curse", "Curse", 10.0, 1.5, 12.0, 2, DamageType::Shadow)
                .with_modifiers([Modifier::AllStats(-0.30)]),
        )?
        .add_effect(
            dot("freeze", "Freeze", 12.0, 1.2, 5.0, 2, DamageType::Ice).with_companion("frozen"),
        )?
        .add_effect(
            dot("shock", "Shock", 10.0, 0.8, 6.0, 3, DamageType::Lightning)
                .with_companion("shocked"),
        )?;
    Ok(())
}

// ============================================================================
// Abilities
// ============================================================================

fn damage(damage_type: DamageType, source: ScalingSource, ratio: f32) -> AbilityAction {
    AbilityAction::Damage {
        damage_type,
        scaling: Scaling::new(source, ratio),
    }
}

fn add_abilities(builder: &mut CatalogBuilder) -> Result<(), CatalogError> {
    use ScalingSource::{AttackPower, Defense, HealingPower, MagicPower};

    builder
        .add_ability(
            AbilityDefinition::new("arc_bolt", "Arc Bolt", TargetType::Projectile)
                .with_costs(6.0, 1.1, 0.3)
                .with_reach(35.0, 0.0)
                .with_action(damage(DamageType::Lightning, MagicPower, 1.2)),
        )?
        .add_ability(
            AbilityDefinition::new("chain_light", "Chain Zap", TargetType::Projectile)
                .with_costs(16.0, 4.8, 0.4)
                .with_reach(30.0, 0.0)
                .with_action(damage(DamageType::Lightning, MagicPower, 1.4))
                .with_effect("shock")
                .with_effect("slow"),
        )?
        .add_ability(
            AbilityDefinition::new("piercing_lance", "Piercing Lance", TargetType::Projectile)
                .with_costs(18.0, 6.4, 0.5)
                .with_reach(40.0, 0.0)
                .with_action(damage(DamageType::Arcane, MagicPower, 1.8)),
        )?
        .add_ability(
            AbilityDefinition::new("heal_burst", "Heal Burst", TargetType::Area)
                .with_costs(18.0, 7.5, 0.3)
                .with_reach(0.0, 20.0)
                .with_action(AbilityAction::Heal(Scaling::new(HealingPower, 2.0))),
        )?
        .add_ability(
            AbilityDefinition::new("ward_barrier", "Ward Barrier", TargetType::Area)
                .with_costs(22.0, 10.0, 0.4)
                .with_reach(0.0, 18.0)
                .with_action(AbilityAction::Shield(Scaling::new(Defense, 1.6))),
        )?
        .add_ability(
            AbilityDefinition::new("cleanse_wave", "Cleanse Wave", TargetType::Area)
                .with_costs(14.0, 9.0, 0.25)
                .with_reach(0.0, 18.0)
                .with_action(AbilityAction::Cleanse(CleanseFilter::Debuffs))
                .with_action(AbilityAction::Heal(Scaling::new(HealingPower, 1.2))),
        )?
        .add_ability(
            AbilityDefinition::new("slash", "Slash", TargetType::Melee)
                .with_costs(2.0, 0.22, 0.1)
                .with_reach(12.0, 0.0)
                .with_action(damage(DamageType::Physical, AttackPower, 0.8)),
        )?
        .add_ability(
            AbilityDefinition::new("cleave", "Cleave", TargetType::Melee)
                .with_costs(10.0, 3.5, 0.25)
                .with_reach(14.0, 0.0)
                .with_action(damage(DamageType::Physical, AttackPower, 1.3)),
        )?
        .add_ability(
            AbilityDefinition::new("blade_storm", "Toxic Blade Storm", TargetType::Area)
                .with_costs(22.0, 9.5, 0.4)
                .with_reach(0.0, 18.0)
                .with_action(damage(DamageType::Physical, AttackPower, 1.5))
                .with_effect("poison"),
        )?
        .add_ability(
            AbilityDefinition::new("leap_strike", "Leap Strike", TargetType::Ground)
                .with_costs(14.0, 6.5, 0.3)
                .with_reach(26.0, 12.0)
                .with_action(damage(DamageType::Physical, AttackPower, 1.4))
                .with_effect("bleed")
                .with_effect("slow")
                .with_effect("stun"),
        )?
        .add_ability(
            AbilityDefinition::new("mage_divine_touch", "Divine Touch", TargetType::Target)
                .with_costs(16.0, 4.5, 0.4)
                .with_reach(40.0, 0.0)
                .with_action(AbilityAction::Heal(Scaling::new(HealingPower, 2.4)))
                .with_effect("healing_empowerment"),
        )?
        .add_ability(
            AbilityDefinition::new(
                "mage_arcane_missiles",
                "Arcane Missiles",
                TargetType::Projectile,
            )
                .with_costs(14.0, 5.5, 0.3)
                .with_reach(32.0, 0.0)
                .with_action(damage(DamageType::Arcane, MagicPower, 1.1))
                .with_effect("arcane_burn")
                .with_effect("silence"),
        )?
        .add_ability(
            AbilityDefinition::new("mage_time_warp", "Time Warp", TargetType::Area)
                .with_costs(20.0, 18.0, 0.6)
                .with_reach(0.0, 18.0)
                .with_effect("temporal_flux"),
        )?
        .add_ability(
            AbilityDefinition::new("knight_shield_wall", "Shield Wall", TargetType::Area)
                .with_costs(16.0, 9.0, 0.35)
                .with_reach(0.0, 18.0)
                .with_action(AbilityAction::Shield(Scaling::new(Defense, 1.8))),
        )?
        .add_ability(
            AbilityDefinition::new("knight_taunt", "Royal Taunt", TargetType::Area)
                .with_costs(10.0, 8.0, 0.25)
                .with_reach(0.0, 20.0)
                .with_action(damage(DamageType::Physical, AttackPower, 0.8))
                .with_effect("vulnerability"),
        )?
        .add_ability(
            AbilityDefinition::new("warrior_life_leech", "Life Leech", TargetType::Melee)
                .with_costs(8.0, 4.0, 0.2)
                .with_reach(12.0, 0.0)
                .with_action(damage(DamageType::Physical, AttackPower, 1.2))
                .with_effect("lifesteal_boost"),
        )?
        .add_ability(
            AbilityDefinition::new("warrior_fortitude", "Fortitude", TargetType::Area)
                .with_costs(15.0, 8.0, 0.5)
                .with_reach(0.0, 20.0)
                .with_action(AbilityAction::Shield(Scaling::new(Defense, 1.2)))
                .with_effect("iron_will"),
        )?
        .add_ability(
            AbilityDefinition::new("warrior_cleave", "Rending Cleave", TargetType::Melee)
                .with_costs(9.0, 4.2, 0.25)
                .with_reach(14.0, 0.0)
                .with_action(damage(DamageType::Physical, AttackPower, 1.45))
                .with_effect("bleed")
                .with_effect("weakness"),
        )?
        .add_ability(
            AbilityDefinition::new("tank_anchor", "Anchor Stance", TargetType::Area)
                .with_costs(10.0, 9.0, 0.25)
                .with_reach(0.0, 18.0)
                .with_action(damage(DamageType::Physical, Defense, 0.5))
                .with_effect("stun"),
        )?
        .add_ability(
            AbilityDefinition::new("tank_seismic_wave", "Seismic Wave", TargetType::Projectile)
                .with_costs(13.0, 7.5, 0.3)
                .with_reach(26.0, 0.0)
                .with_action(damage(DamageType::Lightning, AttackPower, 1.1))
                .with_effect("root"),
        )?;
    Ok(())
}

fn add_passives(builder: &mut CatalogBuilder) -> Result<(), CatalogError> {
    builder
        .add_ability(AbilityDefinition::passive(
            "arcane_mastery",
            "Arcane Mastery",
            [
                flat(Stat::ManaRegen, 1.2),
                flat(Stat::CooldownReduction, 0.06),
                flat(Stat::MaxMana, 10.0),
            ],
        ))?
        .add_ability(AbilityDefinition::passive(
            "elemental_focus",
            "Elemental Focus",
            [flat(Stat::CritChance, 0.08), flat(Stat::Attack, 0.5)],
        ))?
        .add_ability(AbilityDefinition::passive(
            "weapon_mastery",
            "Weapon Mastery",
            [flat(Stat::BlockEfficiency, 0.08), flat(Stat::StaminaRegen, 6.0)],
        ))?
        .add_ability(AbilityDefinition::passive(
            "battle_fury",
            "Battle Fury",
            [flat(Stat::Lifesteal, 0.06), flat(Stat::CritChance, 0.05)],
        ))?
        .add_ability(AbilityDefinition::passive(
            "arcane_intellect",
            "Arcane Intellect",
            [
                flat(Stat::MaxMana, 15.0),
                flat(Stat::ManaRegen, 1.5),
                flat(Stat::MagicDamage, 0.10),
            ],
        ))?
        .add_ability(AbilityDefinition::passive(
            "shield_wall",
            "Shield Wall",
            [
                pct(Stat::Defense, 0.12),
                flat(Stat::BlockEfficiency, 0.10),
                flat(Stat::MaxHp, 25.0),
            ],
        ))?
        .add_ability(AbilityDefinition::passive(
            "combat_veteran",
            "Combat Veteran",
            [
                flat(Stat::Attack, 1.5),
                flat(Stat::CritChance, 0.08),
                flat(Stat::MaxHp, 15.0),
            ],
        ))?
        .add_ability(AbilityDefinition::passive(
            "indomitable",
            "Indomitable",
            [
                flat(Stat::MaxHp, 40.0),
                flat(Stat::HpRegen, 1.2),
                pct(Stat::Defense, 0.15),
            ],
        ))?
        .add_ability(AbilityDefinition::passive(
            "arcane_versatility",
            "Versatility",
            [
                Modifier::AllStats(0.06),
                pct(Stat::Speed, 0.10),
                flat(Stat::CastSpeed, 0.05),
            ],
        ))?;
    Ok(())
}

// ============================================================================
// Loadouts
// ============================================================================

fn piece(slot: EquipSlot, name: &str, bonuses: &[(Stat, f32)]) -> EquipmentPiece {
    bonuses
        .iter()
        .fold(EquipmentPiece::new(slot, name), |p, &(stat, value)| {
            p.with_bonus(stat, value)
        })
}

fn add_loadouts(builder: &mut CatalogBuilder) -> Result<(), CatalogError> {
    use EquipSlot::{Accessory, Belt, Chest, Feet, Hands, Helmet, Legs, Neck, Shoulders, Weapon};

    builder
        .add_loadout(
            LoadoutDefinition::new("warrior_melee_basic", "Ragnar the Cleaver", Rarity::Common)
                .with_piece(piece(Weapon, "Great Sword", &[(Stat::Attack, 8.0)]))
                .with_piece(piece(Helmet, "Medium Helm", &[(Stat::Defense, 2.0)]))
                .with_piece(piece(
                    Chest,
                    "Heavy Chest",
                    &[(Stat::Defense, 4.0), (Stat::MaxHp, 20.0)],
                ))
                .with_piece(piece(Shoulders, "Medium Pauldrons", &[(Stat::Defense, 1.0)]))
                .with_piece(piece(Hands, "Light Gloves", &[(Stat::Attack, 1.0)]))
                .with_piece(piece(Belt, "Medium Belt", &[(Stat::Defense, 1.0)]))
                .with_piece(piece(Legs, "Heavy Greaves", &[(Stat::Defense, 3.0)]))
                .with_piece(piece(Neck, "Amulet", &[(Stat::MaxHp, 15.0)]))
                .with_piece(piece(Accessory, "Ring", &[(Stat::Attack, 2.0)]))
                .with_piece(piece(Accessory, "Charm", &[(Stat::CritChance, 0.03)]))
                .with_abilities([
                    "slash",
                    "warrior_cleave",
                    "cleave",
                    "warrior_life_leech",
                    "warrior_fortitude",
                ])
                .with_passives(["combat_veteran", "battle_fury"]),
        )?
        .add_loadout(
            LoadoutDefinition::new(
                "mage_destruction_basic",
                "Ember the Pyromancer",
                Rarity::Common,
            )
                .with_piece(piece(
                    Weapon,
                    "Destruction Staff",
                    &[(Stat::Attack, 6.0), (Stat::ManaRegen, 2.0)],
                ))
                .with_piece(piece(Chest, "Light Robe", &[(Stat::ManaRegen, 1.0)]))
                .with_piece(piece(Hands, "Light Gloves", &[(Stat::Attack, 1.0)]))
                .with_piece(piece(Belt, "Light Sash", &[(Stat::ManaRegen, 1.0)]))
                .with_piece(piece(Neck, "Amulet", &[(Stat::MaxMana, 20.0)]))
                .with_piece(piece(Accessory, "Ring", &[(Stat::Attack, 2.0)]))
                .with_piece(piece(Accessory, "Charm", &[(Stat::CritChance, 0.04)]))
                .with_abilities([
                    "arc_bolt",
                    "chain_light",
                    "piercing_lance",
                    "mage_arcane_missiles",
                    "mage_time_warp",
                ])
                .with_passives(["arcane_mastery", "arcane_intellect"]),
        )?
        .add_loadout(
            LoadoutDefinition::new("knight_basic", "Aldric the Stalwart", Rarity::Uncommon)
                .with_piece(piece(
                    Weapon,
                    "Sword",
                    &[(Stat::Attack, 5.0), (Stat::Defense, 3.0)],
                ))
                .with_piece(piece(Helmet, "Heavy Helm", &[(Stat::Defense, 4.0)]))
                .with_piece(piece(
                    Chest,
                    "Heavy Chest",
                    &[(Stat::Defense, 6.0), (Stat::MaxHp, 30.0)],
                ))
                .with_piece(piece(Shoulders, "Heavy Pauldrons", &[(Stat::Defense, 3.0)]))
                .with_piece(piece(Hands, "Heavy Gauntlets", &[(Stat::Defense, 2.0)]))
                .with_piece(piece(Belt, "Heavy Belt", &[(Stat::MaxHp, 20.0)]))
                .with_piece(piece(Legs, "Heavy Greaves", &[(Stat::Defense, 4.0)]))
                .with_piece(piece(Feet, "Heavy Sabatons", &[(Stat::Defense, 2.0)]))
                .with_piece(piece(Neck, "Amulet", &[(Stat::MaxHp, 25.0)]))
                .with_abilities(["knight_taunt", "knight_shield_wall", "slash"])
                .with_passives(["shield_wall"]),
        )?
        .add_loadout(
            LoadoutDefinition::new("warden_advanced", "Gareth Ironwall", Rarity::Rare)
                .with_piece(piece(
                    Weapon,
                    "Great Sword",
                    &[(Stat::Attack, 6.0), (Stat::Defense, 5.0)],
                ))
                .with_piece(piece(
                    Chest,
                    "Heavy Chest",
                    &[(Stat::Defense, 7.0), (Stat::MaxHp, 35.0)],
                ))
                .with_piece(piece(Legs, "Heavy Greaves", &[(Stat::Defense, 5.0)]))
                .with_piece(piece(Neck, "Amulet", &[(Stat::MaxHp, 30.0)]))
                .with_abilities(["tank_anchor", "slash", "tank_seismic_wave"])
                .with_passives(["indomitable"]),
        )?
        .add_loadout(
            LoadoutDefinition::new("mage_healer_basic", "Aria the Lightweaver", Rarity::Common)
                .with_piece(piece(Weapon, "Healing Staff", &[(Stat::ManaRegen, 3.0)]))
                .with_piece(piece(Chest, "Light Robe", &[(Stat::ManaRegen, 1.0)]))
                .with_piece(piece(Neck, "Amulet", &[(Stat::MaxMana, 20.0)]))
                .with_piece(piece(Accessory, "Ring", &[(Stat::ManaRegen, 2.0)]))
                .with_abilities([
                    "heal_burst",
                    "arc_bolt",
                    "mage_divine_touch",
                    "ward_barrier",
                    "cleanse_wave",
                ])
                .with_passives(["arcane_mastery"]),
        )?;
    Ok(())
}
