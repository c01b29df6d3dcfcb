use crate::geometry::BoundingBox;
use chrono::{DateTime, Utc};
use nalgebra::{Point3, Vector3};
use uuid::Uuid;

pub const STATUS_OPEN: &str = "Open";

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Point3<f64>,
    /// Unit vector from the camera towards its target.
    pub direction: Vector3<f64>,
    pub up: Vector3<f64>,
    pub field_of_view: f64,
    pub aspect_ratio: f64,
}

impl PerspectiveCamera {
    /// Camera placed at the box's maximum corner scaled by `offset`,
    /// looking at the box centre with Z up.
    #[must_use]
    pub fn looking_at(bbox: &BoundingBox, offset: f64, field_of_view: f64) -> Self {
        let position = Point3::from(bbox.max.coords * offset);
        let to_center = bbox.center() - position;
        let direction = to_center
            .try_normalize(1e-9)
            .unwrap_or_else(|| Vector3::new(-1.0, -1.0, -1.0).normalize());

        Self {
            position,
            direction,
            up: Vector3::z(),
            field_of_view,
            aspect_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewpoint {
    pub guid: Uuid,
    /// IFC GlobalIds of the selected components.
    pub components: Vec<String>,
    pub camera: Option<PerspectiveCamera>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub guid: Uuid,
    pub date: DateTime<Utc>,
    pub author: String,
    pub text: String,
    pub viewpoint: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    pub guid: Uuid,
    pub topic_type: String,
    pub status: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub creation_date: DateTime<Utc>,
    pub comments: Vec<Comment>,
    pub viewpoint: Option<Viewpoint>,
}

impl Topic {
    /// Open topic with one comment repeating the description, linked to
    /// the viewpoint when there is one.
    #[must_use]
    pub fn new(
        title: String,
        description: String,
        author: &str,
        topic_type: &str,
        viewpoint: Option<Viewpoint>,
    ) -> Self {
        let now = Utc::now();
        let comment = Comment {
            guid: Uuid::new_v4(),
            date: now,
            author: author.to_string(),
            text: description.clone(),
            viewpoint: viewpoint.as_ref().map(|v| v.guid),
        };

        Self {
            guid: Uuid::new_v4(),
            topic_type: topic_type.to_string(),
            status: STATUS_OPEN.to_string(),
            title,
            description,
            author: author.to_string(),
            creation_date: now,
            comments: vec![comment],
            viewpoint,
        }
    }
}

/// Reference to the model file the topics were raised against.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFile {
    pub filename: String,
    /// IFC GlobalId of the `IfcProject`.
    pub ifc_project: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BcfProject {
    pub project_id: Uuid,
    pub name: String,
    pub file: Option<ModelFile>,
    pub topics: Vec<Topic>,
}

impl BcfProject {
    #[must_use]
    pub fn new(name: String) -> Self {
        Self {
            project_id: Uuid::new_v4(),
            name,
            file: None,
            topics: Vec::new(),
        }
    }

    /// Distinct topic types in first-use order.
    #[must_use]
    pub fn topic_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for topic in &self.topics {
            if !types.contains(&topic.topic_type.as_str()) {
                types.push(&topic.topic_type);
            }
        }
        types
    }

    /// Distinct authors in first-use order.
    #[must_use]
    pub fn authors(&self) -> Vec<&str> {
        let mut authors: Vec<&str> = Vec::new();
        for topic in &self.topics {
            if !authors.contains(&topic.author.as_str()) {
                authors.push(&topic.author);
            }
        }
        authors
    }
}
