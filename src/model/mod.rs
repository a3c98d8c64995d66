mod index;

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

pub use index::{GraphIndex, ResolvedEdge};

/// Envelope used by every dashboard endpoint.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<EntitySummary>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct EntitySummary {
    pub id: String,
    #[serde(default)]
    pub canonical_name: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub mention_count: u64,
    #[serde(default)]
    pub aspect_count: u64,
    #[serde(default)]
    pub avg_sentiment: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mention_delta: Option<i64>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sparkline: Vec<f32>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<f32>>::deserialize(deserializer)?.unwrap_or_default())
}

impl EntitySummary {
    pub fn new(id: impl Into<String>, entity_type: &str, mention_count: u64) -> Self {
        let id = id.into();
        Self {
            canonical_name: id.clone(),
            id,
            entity_type: entity_type.to_owned(),
            sub_type: None,
            mention_count,
            aspect_count: 0,
            avg_sentiment: 0.5,
            mention_delta: None,
            sparkline: Vec::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        EntityKind::from_tag(&self.entity_type)
    }

    pub fn display_name(&self) -> &str {
        if self.canonical_name.is_empty() {
            &self.id
        } else {
            &self.canonical_name
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GraphEdge {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub link_type: String,
}

impl GraphEdge {
    pub fn new(source_id: &str, target_id: &str, link_type: &str) -> Self {
        Self {
            source_id: source_id.to_owned(),
            target_id: target_id.to_owned(),
            link_type: link_type.to_owned(),
        }
    }

    pub fn kind(&self) -> LinkKind {
        LinkKind::from_tag(&self.link_type)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Brand,
    Product,
    Place,
    Person,
    Work,
    Event,
    Organization,
    ContentTopic,
    Scenario,
    Unknown,
}

impl EntityKind {
    /// Chip order used by the category filter.
    pub const FILTERABLE: [EntityKind; 9] = [
        Self::Brand,
        Self::Product,
        Self::Scenario,
        Self::Place,
        Self::Person,
        Self::Work,
        Self::Event,
        Self::Organization,
        Self::ContentTopic,
    ];

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "brand" => Self::Brand,
            "product" => Self::Product,
            "place" => Self::Place,
            "person" => Self::Person,
            "work" => Self::Work,
            "event" => Self::Event,
            "organization" => Self::Organization,
            "content_topic" => Self::ContentTopic,
            "scenario" => Self::Scenario,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Brand => "Brand",
            Self::Product => "Product",
            Self::Place => "Place",
            Self::Person => "Person",
            Self::Work => "Work",
            Self::Event => "Event",
            Self::Organization => "Organization",
            Self::ContentTopic => "Topic",
            Self::Scenario => "Scenario",
            Self::Unknown => "Other",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Produces,
    Competes,
    Location,
    Endorses,
    Founded,
    Discusses,
    Relevant,
    Needs,
    Involves,
    Other,
}

impl LinkKind {
    pub const LEGEND: [LinkKind; 6] = [
        Self::Produces,
        Self::Competes,
        Self::Location,
        Self::Endorses,
        Self::Founded,
        Self::Needs,
    ];

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "produces" | "produced_by" => Self::Produces,
            "competes_with" => Self::Competes,
            "located_at" => Self::Location,
            "endorses" | "endorsed_by" => Self::Endorses,
            "founded" | "founded_by" => Self::Founded,
            "discusses" | "discussed_by" => Self::Discusses,
            "relevant_to" | "has_relevant_topic" => Self::Relevant,
            "needs" | "needed_by" => Self::Needs,
            "involves" | "involved_in" => Self::Involves,
            _ => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Produces => "Produces",
            Self::Competes => "Competes",
            Self::Location => "Location",
            Self::Endorses => "Endorses",
            Self::Founded => "Founded",
            Self::Discusses => "Discusses",
            Self::Relevant => "Relevant",
            Self::Needs => "Needs",
            Self::Involves => "Involves",
            Self::Other => "Other",
        }
    }
}

impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Scenario and product nodes with the edges leaving a scenario or a
    /// product, which is what the bipartite scenario map lays out.
    pub fn scenario_subgraph(&self) -> GraphData {
        let bipartite = |kind: EntityKind| matches!(kind, EntityKind::Scenario | EntityKind::Product);
        let nodes = self
            .nodes
            .iter()
            .filter(|node| bipartite(node.kind()))
            .cloned()
            .collect::<Vec<_>>();
        let sources = nodes.iter().map(|node| node.id.as_str()).collect::<HashSet<_>>();
        let edges = self
            .edges
            .iter()
            .filter(|edge| sources.contains(edge.source_id.as_str()))
            .cloned()
            .collect();

        GraphData { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_api_envelope_with_optional_fields() {
        let raw = r#"{
            "data": {
                "nodes": [
                    {"id": "b1", "canonical_name": "Acme", "type": "brand", "mention_count": 42,
                     "aspect_count": 3, "avg_sentiment": 0.8, "mention_delta": -4, "sparkline": [1, 2, 3]},
                    {"id": "p1", "type": "product", "mention_count": 7, "mention_delta": null, "sparkline": null}
                ],
                "edges": [{"source_id": "b1", "target_id": "p1", "link_type": "produces"}]
            }
        }"#;

        let response: ApiResponse<Option<GraphData>> = serde_json::from_str(raw).unwrap();
        let graph = response.data.unwrap();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].kind(), EntityKind::Brand);
        assert_eq!(graph.nodes[0].mention_delta, Some(-4));
        assert_eq!(graph.nodes[0].sparkline, vec![1.0, 2.0, 3.0]);
        assert_eq!(graph.nodes[1].display_name(), "p1");
        assert_eq!(graph.edges[0].kind(), LinkKind::Produces);
    }

    #[test]
    fn null_data_decodes_as_missing_graph() {
        let response: ApiResponse<Option<GraphData>> = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(response.data.is_none());
    }

    #[test]
    fn classifies_link_tags_into_palette_buckets() {
        assert_eq!(LinkKind::from_tag("endorsed_by"), LinkKind::Endorses);
        assert_eq!(LinkKind::from_tag("has_relevant_topic"), LinkKind::Relevant);
        assert_eq!(LinkKind::from_tag("involved_in"), LinkKind::Involves);
        assert_eq!(LinkKind::from_tag("sponsors"), LinkKind::Other);
        assert_eq!(EntityKind::from_tag("galaxy"), EntityKind::Unknown);
    }

    #[test]
    fn scenario_subgraph_keeps_scenarios_and_products() {
        let graph = GraphData {
            nodes: vec![
                EntitySummary::new("s1", "scenario", 5),
                EntitySummary::new("p1", "product", 5),
                EntitySummary::new("b1", "brand", 5),
            ],
            edges: vec![
                GraphEdge::new("s1", "p1", "needs"),
                GraphEdge::new("b1", "p1", "produces"),
            ],
        };

        let sub = graph.scenario_subgraph();
        assert_eq!(sub.nodes.len(), 2);
        assert_eq!(sub.edges, vec![GraphEdge::new("s1", "p1", "needs")]);
    }
}
