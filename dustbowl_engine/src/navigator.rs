//! Story navigator.
//!
//! A state machine over location keys. Each call to [`Navigator::advance`] evaluates the
//! current node once: endings finish the run, encounters hand off to the combat resolver and
//! route on its outcome, and everything else waits for the player to pick an edge.
use std::collections::HashMap;

use dustbowl_data::{ClassEdgeDef, EncounterDef, FIGHT_TOKEN, ItemDropDef, LocationDef};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::combat::{Combat, Outcome};
use crate::content::Content;
use crate::dice::Dice;
use crate::error::{EngineError, EngineResult};
use crate::input::{InputSource, read_token};
use crate::player::Player;
use crate::view::{View, ViewItem};

/// A selectable edge out of a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub token: String,
    pub label: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationNode {
    pub key: String,
    pub desc: Option<String>,
    pub encounter: Option<EncounterDef>,
    /// Consumed by the first visit.
    pub item: Option<ItemDropDef>,
    pub options: Vec<Choice>,
    pub ending: Option<String>,
}
impl From<LocationDef> for LocationNode {
    fn from(def: LocationDef) -> Self {
        Self {
            key: def.key,
            desc: def.desc,
            encounter: def.encounter,
            item: def.item,
            options: def
                .options
                .into_iter()
                .map(|o| Choice {
                    token: o.token,
                    label: o.label,
                    to: o.to,
                })
                .collect(),
            ending: def.ending,
        }
    }
}
impl LocationNode {
    /// Every destination this node can lead to, with or without extra edges.
    fn destinations<'a>(&'a self, extra: &'a [Choice], game_over: &'a str) -> Vec<&'a str> {
        let mut keys: Vec<&str> = self.options.iter().chain(extra).map(|c| c.to.as_str()).collect();
        if let Some(enc) = &self.encounter {
            keys.extend([enc.on_win.as_str(), enc.on_flee.as_str(), game_over]);
        }
        keys
    }
}

/// The location table plus its entry points.
#[derive(Debug, Clone)]
pub struct StoryGraph {
    nodes: HashMap<String, LocationNode>,
    start: String,
    game_over: String,
}
impl StoryGraph {
    pub fn from_defs(locations: Vec<LocationDef>, start: &str, game_over: &str) -> Self {
        Self {
            nodes: locations
                .into_iter()
                .map(|def| (def.key.clone(), LocationNode::from(def)))
                .collect(),
            start: start.to_string(),
            game_over: game_over.to_string(),
        }
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn game_over(&self) -> &str {
        &self.game_over
    }

    pub fn get(&self, key: &str) -> Option<&LocationNode> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove and return the pickup at `key`, if one is still there.
    pub fn take_item(&mut self, key: &str) -> Option<ItemDropDef> {
        self.nodes.get_mut(key).and_then(|node| node.item.take())
    }

    /// Ensure every route out of `key` lands on a known location.
    ///
    /// # Errors
    /// `GraphIntegrity` naming the first dangling destination.
    pub fn check_routes(&self, key: &str, extra: &[Choice]) -> EngineResult<()> {
        let Some(node) = self.get(key) else {
            return Err(EngineError::UnknownContent {
                kind: "location",
                key: key.to_string(),
            });
        };
        if let Some(to) = node
            .destinations(extra, &self.game_over)
            .into_iter()
            .find(|to| !self.contains(to))
        {
            error!("graph integrity failure: '{key}' -> '{to}'");
            return Err(EngineError::GraphIntegrity {
                from: key.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}

/// Extra edges offered at `location` to a player of class `class_key`.
///
/// Computed fresh on every visit; the location table itself never changes.
pub fn class_edges(edges: &[ClassEdgeDef], location: &str, class_key: &str, class_name: &str) -> Vec<Choice> {
    edges
        .iter()
        .filter(|edge| edge.location == location && edge.classes.iter().any(|c| c == class_key))
        .map(|edge| Choice {
            token: edge.token.clone(),
            label: edge.label.replace("{class}", class_name),
            to: edge.to.clone(),
        })
        .collect()
}

/// What a single node asks of the game loop once its pickup (if any) has been granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    Ending { description: Option<String>, text: String },
    /// `bypass` holds class edges that let the player avoid the fight.
    Encounter { encounter: EncounterDef, bypass: Vec<Choice> },
    Choices(Vec<Choice>),
}
impl Visit {
    /// Classify a node. Ending wins over encounter, which wins over static options.
    pub fn of(node: &LocationNode, extra: Vec<Choice>) -> Visit {
        if let Some(text) = &node.ending {
            return Visit::Ending {
                description: node.desc.clone(),
                text: text.clone(),
            };
        }
        if let Some(encounter) = &node.encounter {
            return Visit::Encounter {
                encounter: encounter.clone(),
                bypass: extra,
            };
        }
        let mut choices = node.options.clone();
        choices.extend(extra);
        Visit::Choices(choices)
    }
}

/// Result of evaluating one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Moved on to this location.
    Continue(String),
    /// Reached the ending at this location.
    Finished(String),
}

#[derive(Debug, Clone)]
pub struct Navigator {
    graph: StoryGraph,
    current: String,
    /// Locations in the order they were entered.
    pub visited: Vec<String>,
}
impl Navigator {
    pub fn new(graph: StoryGraph) -> Self {
        let current = graph.start().to_string();
        Self {
            graph,
            visited: vec![current.clone()],
            current,
        }
    }

    /// Start somewhere other than the graph's start key.
    pub fn starting_at(graph: StoryGraph, key: &str) -> Self {
        Self {
            graph,
            current: key.to_string(),
            visited: vec![key.to_string()],
        }
    }

    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    pub fn current_key(&self) -> &str {
        &self.current
    }

    /// The node the player is standing on.
    ///
    /// A current key missing from the table is logged and replaced by the start key.
    ///
    /// # Errors
    /// `UnknownContent` if the start key is missing too.
    pub fn current_location(&mut self) -> EngineResult<&LocationNode> {
        if !self.graph.contains(&self.current) {
            warn!(
                "current location '{}' not found; resetting to start '{}'",
                self.current,
                self.graph.start()
            );
            self.current = self.graph.start().to_string();
        }
        self.graph.get(&self.current).ok_or_else(|| EngineError::UnknownContent {
            kind: "location",
            key: self.current.clone(),
        })
    }

    fn move_to(&mut self, to: &str) {
        info!("transition: '{}' -> '{to}'", self.current);
        self.current = to.to_string();
        self.visited.push(self.current.clone());
    }

    /// Follow the edge named by `token`.
    ///
    /// # Errors
    /// - `InvalidChoice` if no edge has this token (state unchanged)
    /// - `GraphIntegrity` if the edge leads nowhere
    pub fn step(&mut self, token: &str, edges: &[Choice]) -> EngineResult<&str> {
        let choice = edges
            .iter()
            .find(|c| c.token == token)
            .ok_or_else(|| EngineError::InvalidChoice {
                token: token.to_string(),
            })?;
        if !self.graph.contains(&choice.to) {
            error!("graph integrity failure: '{}' -> '{}'", self.current, choice.to);
            return Err(EngineError::GraphIntegrity {
                from: self.current.clone(),
                to: choice.to.clone(),
            });
        }
        let to = choice.to.clone();
        self.move_to(&to);
        Ok(&self.current)
    }

    /// Move on from an encounter according to how it ended.
    pub fn route_outcome(&mut self, encounter: &EncounterDef, outcome: Outcome) -> &str {
        let to = match outcome {
            Outcome::Won => encounter.on_win.clone(),
            Outcome::Fled => encounter.on_flee.clone(),
            Outcome::PlayerDead => self.graph.game_over().to_string(),
        };
        self.move_to(&to);
        &self.current
    }

    /// Evaluate the current node once.
    ///
    /// Routes are checked before anything else happens, so a broken graph never costs the
    /// player a pickup or a fight.
    ///
    /// # Errors
    /// Fatal content errors and `Quit` propagate; invalid choices are re-prompted here.
    pub fn advance(
        &mut self,
        player: &mut Player,
        content: &Content,
        input: &mut dyn InputSource,
        dice: &mut dyn Dice,
        view: &mut View,
    ) -> EngineResult<Progress> {
        let node = self.current_location()?.clone();
        let extra = class_edges(&content.class_edges, &node.key, &player.class_key, &player.class_name);
        self.graph.check_routes(&node.key, &extra)?;

        let visit = Visit::of(&node, extra);
        let enemy = match &visit {
            Visit::Ending { description, text } => {
                info!("reached ending '{}'", node.key);
                view.push(ViewItem::Ending {
                    description: description.clone(),
                    text: text.clone(),
                });
                return Ok(Progress::Finished(node.key));
            },
            Visit::Encounter { encounter, .. } => Some(content.spawn_enemy(&encounter.enemy)?),
            Visit::Choices(_) => None,
        };

        if let Some(desc) = &node.desc {
            view.push(ViewItem::LocationDescription(desc.clone()));
        }
        if let Some(item) = self.graph.take_item(&node.key) {
            player.find_item(item.kind, item.amount, view);
        }

        match (visit, enemy) {
            (Visit::Encounter { encounter, bypass }, Some(mut enemy)) => {
                if !bypass.is_empty() {
                    let mut edges = vec![Choice {
                        token: FIGHT_TOKEN.to_string(),
                        label: format!("Fight the {}.", enemy.name),
                        to: node.key.clone(),
                    }];
                    edges.extend(bypass);
                    let token = self.choose(&edges, player, input, view)?;
                    if token != FIGHT_TOKEN {
                        let to = self.step(&token, &edges)?.to_string();
                        return Ok(Progress::Continue(to));
                    }
                }
                let outcome = Combat::new(player, &mut enemy).resolve(input, dice, view)?;
                Ok(Progress::Continue(self.route_outcome(&encounter, outcome).to_string()))
            },
            (Visit::Choices(edges), _) => {
                let token = self.choose(&edges, player, input, view)?;
                Ok(Progress::Continue(self.step(&token, &edges)?.to_string()))
            },
            // ending returned above; an encounter always has an enemy
            _ => Err(EngineError::UnknownContent {
                kind: "encounter",
                key: node.key,
            }),
        }
    }

    /// Prompt until the player names one of `edges`.
    fn choose(
        &self,
        edges: &[Choice],
        player: &Player,
        input: &mut dyn InputSource,
        view: &mut View,
    ) -> EngineResult<String> {
        loop {
            view.push(ViewItem::Choices(edges.to_vec()));
            let token = read_token(input, view, player, "Enter your choice:")?;
            if edges.iter().any(|c| c.token == token) {
                return Ok(token);
            }
            view.push(ViewItem::Error(EngineError::InvalidChoice { token }.to_string()));
        }
    }
}
