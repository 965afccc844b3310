use std::collections::HashSet;
use std::fmt;

use crate::*;

/// Tokens accepted at every prompt; content may not claim them for graph edges.
pub const RESERVED_TOKENS: &[&str] = &["stats", "inventory", "quit"];

/// Token that accepts the fight when an encounter also offers class edges.
pub const FIGHT_TOKEN: &str = "fight";

/// Validation error for malformed or missing references in a `ContentDef`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateId { kind: &'static str, id: String },
    MissingReference { kind: &'static str, id: String, context: String },
    InvalidValue { context: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateId { kind, id } => {
                write!(f, "duplicate {kind} key '{id}'")
            },
            ValidationError::MissingReference { kind, id, context } => {
                write!(f, "missing {kind} '{id}' ({context})")
            },
            ValidationError::InvalidValue { context } => {
                write!(f, "invalid value ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate cross-references and basic invariants in a `ContentDef`.
///
/// ```
/// use dustbowl_data::{ClassDef, ContentDef, GameDef, LoadoutDef, LocationDef, validate_content};
///
/// let ending = |key: &str| LocationDef {
///     key: key.into(),
///     desc: None,
///     encounter: None,
///     item: None,
///     options: Vec::new(),
///     ending: Some("The end.".into()),
/// };
/// let content = ContentDef {
///     game: GameDef {
///         title: "Demo".into(),
///         start: "start".into(),
///         game_over: "lose".into(),
///         ..GameDef::default()
///     },
///     classes: vec![ClassDef {
///         key: "scout".into(),
///         name: "Scout".into(),
///         max_hp: 125,
///         speed: 133,
///     }],
///     loadouts: vec![LoadoutDef {
///         class: "scout".into(),
///         granted: Vec::new(),
///         slots: Vec::new(),
///     }],
///     locations: vec![ending("start"), ending("lose")],
///     ..ContentDef::default()
/// };
/// assert!(validate_content(&content).is_empty());
/// ```
pub fn validate_content(content: &ContentDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut classes = HashSet::new();
    let mut weapons = HashSet::new();
    let mut enemies = HashSet::new();
    let mut locations = HashSet::new();

    track_ids(
        "class",
        content.classes.iter().map(|c| c.key.as_str()),
        &mut classes,
        &mut errors,
    );
    track_ids(
        "weapon",
        content.weapons.iter().map(|w| w.key.as_str()),
        &mut weapons,
        &mut errors,
    );
    track_ids(
        "enemy",
        content.enemies.iter().map(|e| e.key.as_str()),
        &mut enemies,
        &mut errors,
    );
    track_ids(
        "location",
        content.locations.iter().map(|l| l.key.as_str()),
        &mut locations,
        &mut errors,
    );

    let ids = KeySets {
        classes: &classes,
        weapons: &weapons,
        enemies: &enemies,
        locations: &locations,
    };

    check_ref("location", &content.game.start, ids.locations, "game start".into(), &mut errors);
    check_ref("location", &content.game.game_over, ids.locations, "game over".into(), &mut errors);
    if let Some(lose) = content.locations.iter().find(|l| l.key == content.game.game_over)
        && lose.ending.is_none()
    {
        errors.push(ValidationError::InvalidValue {
            context: format!("game over location '{}' has no ending", lose.key),
        });
    }

    if content.classes.is_empty() {
        errors.push(ValidationError::InvalidValue {
            context: "content defines no classes".into(),
        });
    }
    for class in &content.classes {
        if class.max_hp == 0 {
            errors.push(ValidationError::InvalidValue {
                context: format!("class '{}' max_hp is zero", class.key),
            });
        }
        if !content.loadouts.iter().any(|l| l.class == class.key) {
            errors.push(ValidationError::MissingReference {
                kind: "loadout",
                id: class.key.clone(),
                context: format!("class '{}'", class.key),
            });
        }
    }

    for weapon in &content.weapons {
        let context = format!("weapon '{}'", weapon.key);
        check_accuracy(weapon.accuracy, &context, &mut errors);
        check_range(weapon.damage, &context, &mut errors);
        if weapon.effect.is_some() && !weapon.utility {
            errors.push(ValidationError::InvalidValue {
                context: format!("{context} has a utility effect but is not a utility"),
            });
        }
    }

    for enemy in &content.enemies {
        let context = format!("enemy '{}'", enemy.key);
        check_accuracy(enemy.accuracy, &context, &mut errors);
        check_range(enemy.damage, &context, &mut errors);
        if enemy.max_hp == 0 {
            errors.push(ValidationError::InvalidValue {
                context: format!("{context} max_hp is zero"),
            });
        }
    }

    let mut loadout_classes = HashSet::new();
    track_ids(
        "loadout",
        content.loadouts.iter().map(|l| l.class.as_str()),
        &mut loadout_classes,
        &mut errors,
    );
    for loadout in &content.loadouts {
        let context = format!("loadout '{}'", loadout.class);
        check_ref("class", &loadout.class, ids.classes, context.clone(), &mut errors);
        for key in &loadout.granted {
            check_ref("weapon", key, ids.weapons, context.clone(), &mut errors);
        }
        for slot in &loadout.slots {
            if slot.choices.is_empty() {
                errors.push(ValidationError::InvalidValue {
                    context: format!("{context} slot '{}' has no choices", slot.slot.label()),
                });
            }
            for key in &slot.choices {
                check_ref(
                    "weapon",
                    key,
                    ids.weapons,
                    format!("{context} slot '{}'", slot.slot.label()),
                    &mut errors,
                );
            }
        }
    }

    for location in &content.locations {
        validate_location(location, &ids, &mut errors);
    }

    for edge in &content.class_edges {
        let context = format!("class edge '{}' at '{}'", edge.token, edge.location);
        check_ref("location", &edge.location, ids.locations, context.clone(), &mut errors);
        check_ref("location", &edge.to, ids.locations, context.clone(), &mut errors);
        for class in &edge.classes {
            check_ref("class", class, ids.classes, context.clone(), &mut errors);
        }
        check_token(&edge.token, &context, &mut errors);
        if edge.token == FIGHT_TOKEN {
            errors.push(ValidationError::InvalidValue {
                context: format!("{context} uses the fight token"),
            });
        }
        if let Some(location) = content.locations.iter().find(|l| l.key == edge.location) {
            if location.ending.is_some() {
                errors.push(ValidationError::InvalidValue {
                    context: format!("{context} is attached to an ending"),
                });
            }
            if location.options.iter().any(|o| o.token == edge.token) {
                errors.push(ValidationError::InvalidValue {
                    context: format!("{context} shadows a static option"),
                });
            }
        }
    }

    errors
}

struct KeySets<'a> {
    classes: &'a HashSet<String>,
    weapons: &'a HashSet<String>,
    enemies: &'a HashSet<String>,
    locations: &'a HashSet<String>,
}

fn validate_location(location: &LocationDef, ids: &KeySets<'_>, errors: &mut Vec<ValidationError>) {
    let context = format!("location '{}'", location.key);
    if location.ending.is_some() {
        return;
    }
    if location.encounter.is_none() && location.options.is_empty() {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context} is a dead end (no ending, encounter, or options)"),
        });
    }
    if location.desc.as_deref().is_none_or(|d| d.trim().is_empty()) {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context} has no description"),
        });
    }
    if let Some(encounter) = &location.encounter {
        check_ref("enemy", &encounter.enemy, ids.enemies, context.clone(), errors);
        check_ref("location", &encounter.on_win, ids.locations, format!("{context} on_win"), errors);
        check_ref("location", &encounter.on_flee, ids.locations, format!("{context} on_flee"), errors);
    }
    if let Some(item) = &location.item
        && item.amount == 0
    {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context} item amount is zero"),
        });
    }
    let mut tokens = HashSet::new();
    for option in &location.options {
        let option_context = format!("{context} option '{}'", option.token);
        if !tokens.insert(option.token.as_str()) {
            errors.push(ValidationError::DuplicateId {
                kind: "option token",
                id: format!("{}:{}", location.key, option.token),
            });
        }
        check_token(&option.token, &option_context, errors);
        check_ref("location", &option.to, ids.locations, option_context, errors);
    }
}

fn track_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
    set: &mut HashSet<String>,
    errors: &mut Vec<ValidationError>,
) {
    for id in ids {
        if !set.insert(id.to_string()) {
            errors.push(ValidationError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
}

fn check_ref(kind: &'static str, id: &str, set: &HashSet<String>, context: String, errors: &mut Vec<ValidationError>) {
    if !set.contains(id) {
        errors.push(ValidationError::MissingReference {
            kind,
            id: id.to_string(),
            context,
        });
    }
}

fn check_accuracy(accuracy: u32, context: &str, errors: &mut Vec<ValidationError>) {
    if accuracy > 100 {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context} accuracy {accuracy} exceeds 100"),
        });
    }
}

fn check_range(range: DamageRange, context: &str, errors: &mut Vec<ValidationError>) {
    if range.min > range.max {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context} damage range {}-{} is inverted", range.min, range.max),
        });
    }
}

fn check_token(token: &str, context: &str, errors: &mut Vec<ValidationError>) {
    if token.trim().is_empty() || token.chars().any(char::is_whitespace) {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context} token must be a single word"),
        });
    } else if token.chars().any(char::is_uppercase) {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context} token must be lowercase"),
        });
    } else if RESERVED_TOKENS.contains(&token) {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context} uses reserved token '{token}'"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ending(key: &str) -> LocationDef {
        LocationDef {
            key: key.to_string(),
            desc: None,
            encounter: None,
            item: None,
            options: Vec::new(),
            ending: Some(format!("{key} ending")),
        }
    }

    fn choice(key: &str, token: &str, to: &str) -> LocationDef {
        LocationDef {
            key: key.to_string(),
            desc: Some(format!("You are at {key}.")),
            encounter: None,
            item: None,
            options: vec![OptionDef {
                token: token.into(),
                label: format!("Go to {to}"),
                to: to.into(),
            }],
            ending: None,
        }
    }

    fn base_content() -> ContentDef {
        ContentDef {
            game: GameDef {
                title: "Demo".into(),
                start: "start".into(),
                game_over: "lose".into(),
                ..GameDef::default()
            },
            classes: vec![ClassDef {
                key: "scout".into(),
                name: "Scout".into(),
                max_hp: 125,
                speed: 133,
            }],
            weapons: vec![WeaponDef {
                key: "bat".into(),
                name: "Bat".into(),
                damage: DamageRange::new(30, 40),
                accuracy: 95,
                desc: "It's a bat.".into(),
                utility: false,
                effect: None,
            }],
            enemies: vec![EnemyDef {
                key: "scout_bot".into(),
                name: "BLU Scout Bot".into(),
                max_hp: 100,
                damage: DamageRange::new(10, 20),
                accuracy: 75,
                special: None,
            }],
            loadouts: vec![LoadoutDef {
                class: "scout".into(),
                granted: Vec::new(),
                slots: vec![SlotDef {
                    slot: LoadoutSlot::Melee,
                    choices: vec!["bat".into()],
                }],
            }],
            locations: vec![choice("start", "1", "win"), ending("win"), ending("lose")],
            class_edges: Vec::new(),
        }
    }

    #[test]
    fn base_content_is_valid() {
        assert!(validate_content(&base_content()).is_empty());
    }

    #[test]
    fn duplicate_keys_are_reported() {
        let mut content = base_content();
        content.locations.push(ending("win"));

        let errors = validate_content(&content);
        assert!(errors.iter().any(|err| matches!(
            err,
            ValidationError::DuplicateId { kind, id } if *kind == "location" && id == "win"
        )));
    }

    #[test]
    fn dangling_option_destination_is_reported() {
        let mut content = base_content();
        content.locations[0] = choice("start", "1", "nowhere");

        let errors = validate_content(&content);
        assert!(errors.iter().any(|err| matches!(
            err,
            ValidationError::MissingReference { kind, id, .. } if *kind == "location" && id == "nowhere"
        )));
    }

    #[test]
    fn encounter_references_are_checked() {
        let mut content = base_content();
        content.locations[0].encounter = Some(EncounterDef {
            enemy: "ghost".into(),
            on_win: "win".into(),
            on_flee: "gone".into(),
        });

        let errors = validate_content(&content);
        assert!(errors.iter().any(|err| matches!(err, ValidationError::MissingReference { id, .. } if id == "ghost")));
        assert!(errors.iter().any(|err| matches!(err, ValidationError::MissingReference { id, .. } if id == "gone")));
    }

    #[test]
    fn reserved_tokens_cannot_be_edges() {
        let mut content = base_content();
        content.locations[0] = choice("start", "stats", "win");

        let errors = validate_content(&content);
        assert!(errors.iter().any(|err| matches!(err, ValidationError::InvalidValue { .. })));
    }

    #[test]
    fn inverted_damage_and_accuracy_are_rejected() {
        let mut content = base_content();
        content.weapons[0].damage = DamageRange::new(50, 10);
        content.enemies[0].accuracy = 140;

        let errors = validate_content(&content);
        assert_eq!(
            errors
                .iter()
                .filter(|err| matches!(err, ValidationError::InvalidValue { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn dead_end_locations_are_rejected() {
        let mut content = base_content();
        content.locations[0].options.clear();

        let errors = validate_content(&content);
        assert!(errors.iter().any(|err| err.to_string().contains("dead end")));
    }

    #[test]
    fn class_edges_must_not_shadow_static_options() {
        let mut content = base_content();
        content.class_edges.push(ClassEdgeDef {
            location: "start".into(),
            classes: vec!["scout".into()],
            token: "1".into(),
            label: "({class}) Shortcut".into(),
            to: "win".into(),
        });

        let errors = validate_content(&content);
        assert!(errors.iter().any(|err| err.to_string().contains("shadows")));
    }

    #[test]
    fn classes_without_loadouts_are_reported() {
        let mut content = base_content();
        content.loadouts.clear();

        let errors = validate_content(&content);
        assert!(errors.iter().any(|err| matches!(
            err,
            ValidationError::MissingReference { kind, .. } if *kind == "loadout"
        )));
    }

    #[test]
    fn content_needs_at_least_one_class() {
        let mut content = base_content();
        content.classes.clear();
        content.loadouts.clear();

        let errors = validate_content(&content);
        assert!(errors.iter().any(|err| err.to_string().contains("no classes")));
    }
}
