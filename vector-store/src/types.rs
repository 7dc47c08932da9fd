//! Wire types for the vector-store API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chatlens_protocol::point::PointPayload;
use chatlens_protocol::Embedding;

/// Distance metric used when creating a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    Cosine,
    Dot,
    Euclid,
}

/// What to search near: a raw vector or an already-stored point.
#[derive(Debug, Clone)]
pub enum QueryTarget {
    /// An ad hoc query vector (e.g. an embedded search string).
    Vector(Embedding),

    /// A stored point id; the store looks up its vector server-side.
    Point(Uuid),
}

impl QueryTarget {
    /// Wire representation for the `query` field.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            QueryTarget::Vector(vector) => serde_json::json!(vector),
            QueryTarget::Point(id) => serde_json::json!(id.to_string()),
        }
    }
}

/// One nearest-neighbor hit.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredPoint {
    /// Point id of the hit.
    pub id: Uuid,

    /// Similarity score under the collection's metric.
    pub score: f32,

    /// Provenance payload, present only when requested.
    pub payload: Option<PointPayload>,
}

/// One record returned by a scroll pass.
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    /// Point id.
    pub id: Uuid,

    /// Provenance payload.
    pub payload: Option<PointPayload>,
}
