//! Read-only template registry with pre-rotated variants
//!
//! The registry owns every template the generator may place, keeps all four
//! rotations of each one, and indexes every oriented connection point by the
//! direction it faces so that matching a neighbor is a slice lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::io::error::{DungeonError, Result, invalid_parameter};
use crate::rooms::template::{ConnectionPoint, RoomTemplate};
use crate::spatial::position::{Direction, Rotation};

/// Index of a template in its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(pub usize);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template#{}", self.0)
    }
}

/// An oriented template together with one of its connection points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionCandidate {
    /// Template to place
    pub template: TemplateId,
    /// Rotation of the template
    pub rotation: Rotation,
    /// Index into the rotated template's connections
    pub connection: usize,
}

/// Immutable collection of room templates
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<RoomTemplate>,
    /// All four rotations of each template, indexed by `Rotation::steps`
    variants: Vec<[RoomTemplate; 4]>,
    /// Candidates whose connection faces each direction, indexed by `Direction::index`
    facing: [Vec<ConnectionCandidate>; 4],
}

impl TemplateRegistry {
    /// Build a registry from templates in declaration order
    ///
    /// # Errors
    ///
    /// Returns an error if no templates are given or two share a name
    pub fn new(templates: Vec<RoomTemplate>) -> Result<Self> {
        if templates.is_empty() {
            return Err(invalid_parameter(
                "templates",
                &0,
                &"registry needs at least one template",
            ));
        }

        let mut names = HashSet::new();
        for template in &templates {
            if !names.insert(template.name()) {
                return Err(DungeonError::InvalidTemplate {
                    name: template.name().to_string(),
                    reason: "name is used by more than one template".to_string(),
                });
            }
        }

        let variants: Vec<[RoomTemplate; 4]> = templates
            .iter()
            .map(|t| [t.rotate(0), t.rotate(1), t.rotate(2), t.rotate(3)])
            .collect();

        let mut facing: [Vec<ConnectionCandidate>; 4] = Default::default();
        for (index, rotations) in variants.iter().enumerate() {
            for rotation in Rotation::ALL {
                let steps = rotation.steps() as usize;
                let Some(variant) = rotations.get(steps) else {
                    continue;
                };

                // Symmetric templates repeat themselves under rotation
                let duplicate = rotations
                    .iter()
                    .take(steps)
                    .any(|earlier| earlier.is_equivalent(variant));
                if duplicate {
                    continue;
                }

                for (connection, point) in variant.connections().iter().enumerate() {
                    if let Some(bucket) = facing.get_mut(point.direction.index()) {
                        bucket.push(ConnectionCandidate {
                            template: TemplateId(index),
                            rotation,
                            connection,
                        });
                    }
                }
            }
        }

        Ok(Self {
            templates,
            variants,
            facing,
        })
    }

    /// Parse a registry from a JSON array of templates
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or any template is invalid
    pub fn from_json_str(json: &str) -> Result<Self> {
        let templates: Vec<RoomTemplate> =
            serde_json::from_str(json).map_err(|source| DungeonError::Parse {
                path: "<inline>".into(),
                source,
            })?;
        Self::new(templates)
    }

    /// Load a registry from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| DungeonError::FileSystem {
            path: path.to_path_buf(),
            operation: "read template registry",
            source,
        })?;
        let templates: Vec<RoomTemplate> =
            serde_json::from_str(&json).map_err(|source| DungeonError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(templates)
    }

    /// Serialize all templates as a JSON array
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.templates).map_err(|source| DungeonError::Parse {
            path: "<inline>".into(),
            source,
        })
    }

    /// Registry with the built-in template set
    ///
    /// # Errors
    ///
    /// Returns an error only if a built-in template is malformed
    pub fn builtin() -> Result<Self> {
        use Direction::{East, North, South, West};

        let templates = vec![
            RoomTemplate::from_layout(
                "hall",
                &["#+#", "+.+", "#+#"],
                vec![
                    ConnectionPoint::new(1, 0, North, false),
                    ConnectionPoint::new(2, 1, East, false),
                    ConnectionPoint::new(1, 2, South, false),
                    ConnectionPoint::new(0, 1, West, false),
                ],
            )?,
            RoomTemplate::from_layout(
                "corridor",
                &["+", ".", "+"],
                vec![
                    ConnectionPoint::new(0, 0, North, false),
                    ConnectionPoint::new(0, 2, South, false),
                ],
            )?
            .with_weight(2.0)?,
            RoomTemplate::from_layout(
                "bend",
                &["+#", ".+"],
                vec![
                    ConnectionPoint::new(0, 0, North, false),
                    ConnectionPoint::new(1, 1, East, false),
                ],
            )?,
            RoomTemplate::from_layout(
                "chamber",
                &["....", "....", ".+.."],
                vec![ConnectionPoint::new(1, 2, South, false)],
            )?
            .with_weight(0.5)?,
            RoomTemplate::from_layout(
                "bridge",
                &["+", ".", "+"],
                vec![
                    ConnectionPoint::new(0, 0, North, true),
                    ConnectionPoint::new(0, 2, South, true),
                ],
            )?
            .with_weight(0.6)?,
            RoomTemplate::from_layout(
                "junction",
                &["#+#", "+.+", "###"],
                vec![
                    ConnectionPoint::new(1, 0, North, true),
                    ConnectionPoint::new(2, 1, East, true),
                    ConnectionPoint::new(0, 1, West, false),
                ],
            )?
            .with_weight(0.4)?,
        ];

        Self::new(templates)
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry holds no templates
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Unrotated template by id
    pub fn get(&self, id: TemplateId) -> Option<&RoomTemplate> {
        self.templates.get(id.0)
    }

    /// Template rotated by `rotation`
    pub fn variant(&self, id: TemplateId, rotation: Rotation) -> Option<&RoomTemplate> {
        self.variants
            .get(id.0)
            .and_then(|rotations| rotations.get(rotation.steps() as usize))
    }

    /// Template id by name
    pub fn id_of(&self, name: &str) -> Option<TemplateId> {
        self.templates
            .iter()
            .position(|template| template.name() == name)
            .map(TemplateId)
    }

    /// Template id by name, failing with `UnknownTemplate`
    ///
    /// # Errors
    ///
    /// Returns `UnknownTemplate` if no template has this name
    pub fn require(&self, name: &str) -> Result<TemplateId> {
        self.id_of(name).ok_or_else(|| DungeonError::UnknownTemplate {
            name: name.to_string(),
        })
    }

    /// All templates with their ids in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &RoomTemplate)> + '_ {
        self.templates
            .iter()
            .enumerate()
            .map(|(index, template)| (TemplateId(index), template))
    }

    /// Oriented connection points facing `direction`, in declaration order
    pub fn candidates_facing(&self, direction: Direction) -> &[ConnectionCandidate] {
        self.facing
            .get(direction.index())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Oriented template and connection point a candidate refers to
    pub fn resolve(
        &self,
        candidate: &ConnectionCandidate,
    ) -> Option<(&RoomTemplate, &ConnectionPoint)> {
        let variant = self.variant(candidate.template, candidate.rotation)?;
        let point = variant.connections().get(candidate.connection)?;
        Some((variant, point))
    }

    /// Templates that may open a dungeon on their own
    ///
    /// These are the templates without required connections; when every
    /// template has one, all templates are returned.
    pub fn start_candidates(&self) -> Vec<TemplateId> {
        let free: Vec<TemplateId> = self
            .iter()
            .filter(|(_, template)| !template.has_required_connections())
            .map(|(id, _)| id)
            .collect();
        if free.is_empty() {
            self.iter().map(|(id, _)| id).collect()
        } else {
            free
        }
    }
}
