// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Stored annotation records.
//!
//! Records are the flat JSON shape the review server and the file store
//! speak. Decoding is lenient: it accepts the legacy field names (`type`,
//! `coordinates`, `endX`/`endY`, `_id`) and populated author objects, and a
//! record that cannot become a typed [`Annotation`] is reported, not fatal.

use crate::models::annotation::{
    Annotation, AnnotationKind, BoxGeometry, Geometry, LocalKey, Point, RemoteIdentity,
};
use crate::models::style::Style;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("unknown annotation kind {0:?}")]
    UnknownKind(String),
    #[error("{kind} annotation is missing `{field}`")]
    MissingField {
        kind: AnnotationKind,
        field: &'static str,
    },
    #[error("freehand annotation has no points")]
    EmptyPoints,
    #[error("text annotation has no content")]
    EmptyText,
}

/// Kind-specific coordinates, every field optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, rename = "endX", skip_serializing_if = "Option::is_none")]
    pub end_x: Option<f64>,
    #[serde(default, rename = "endY", skip_serializing_if = "Option::is_none")]
    pub end_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
}

/// Author as a bare id or as a populated user object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthorRecord {
    Id(String),
    User {
        #[serde(rename = "_id", alias = "id")]
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
    },
}

impl AuthorRecord {
    pub fn id(&self) -> &str {
        match self {
            AuthorRecord::Id(id) => id,
            AuthorRecord::User { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(alias = "coordinates", default)]
    pub geometry: GeometryRecord,
    #[serde(default)]
    pub style: Style,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl AnnotationRecord {
    pub fn from_annotation(annotation: &Annotation) -> Self {
        let mut geometry = GeometryRecord::default();
        let mut text = None;

        match &annotation.geometry {
            Geometry::Text { anchor, content } => {
                geometry.x = Some(anchor.x);
                geometry.y = Some(anchor.y);
                text = Some(content.clone());
            }
            Geometry::Arrow { start, end } => {
                geometry.x = Some(start.x);
                geometry.y = Some(start.y);
                geometry.end_x = Some(end.x);
                geometry.end_y = Some(end.y);
            }
            Geometry::Rectangle(b) | Geometry::Circle(b) | Geometry::Highlight(b) => {
                geometry.x = Some(b.origin.x);
                geometry.y = Some(b.origin.y);
                geometry.width = Some(b.width);
                geometry.height = Some(b.height);
            }
            Geometry::Freehand { points } => {
                // Stored schemas require an x/y; use the first point
                if let Some(first) = points.first() {
                    geometry.x = Some(first.x);
                    geometry.y = Some(first.y);
                }
                geometry.points = Some(points.clone());
            }
        }

        Self {
            id: annotation.id.clone(),
            kind: annotation.kind().as_str().to_string(),
            geometry,
            style: annotation.style.clone(),
            text,
            author: annotation.author.clone().map(AuthorRecord::Id),
            created_at: annotation.created_at,
        }
    }

    /// Build a typed annotation under the given local key.
    pub fn into_annotation(self, key: LocalKey) -> Result<Annotation, RecordError> {
        let kind = AnnotationKind::parse(&self.kind)
            .ok_or_else(|| RecordError::UnknownKind(self.kind.clone()))?;
        let g = &self.geometry;
        let field = |value: Option<f64>, field: &'static str| {
            value.ok_or(RecordError::MissingField { kind, field })
        };

        let geometry = match kind {
            AnnotationKind::Text => {
                let content = self
                    .text
                    .clone()
                    .ok_or(RecordError::MissingField { kind, field: "text" })?;
                // A blank label has nothing to show or select
                if content.trim().is_empty() {
                    return Err(RecordError::EmptyText);
                }
                Geometry::Text {
                    anchor: Point::new(field(g.x, "x")?, field(g.y, "y")?),
                    content,
                }
            }
            AnnotationKind::Arrow => Geometry::Arrow {
                start: Point::new(field(g.x, "x")?, field(g.y, "y")?),
                end: Point::new(field(g.end_x, "endX")?, field(g.end_y, "endY")?),
            },
            AnnotationKind::Rectangle | AnnotationKind::Circle | AnnotationKind::Highlight => {
                let b = BoxGeometry::new(
                    Point::new(field(g.x, "x")?, field(g.y, "y")?),
                    field(g.width, "width")?,
                    field(g.height, "height")?,
                );
                match kind {
                    AnnotationKind::Rectangle => Geometry::Rectangle(b),
                    AnnotationKind::Circle => Geometry::Circle(b),
                    _ => Geometry::Highlight(b),
                }
            }
            AnnotationKind::Freehand => {
                let points = g
                    .points
                    .clone()
                    .ok_or(RecordError::MissingField { kind, field: "points" })?;
                if points.is_empty() {
                    return Err(RecordError::EmptyPoints);
                }
                Geometry::Freehand { points }
            }
        };

        Ok(Annotation {
            key,
            id: self.id,
            geometry,
            style: self.style,
            author: self.author.map(|a| a.id().to_string()),
            created_at: self.created_at,
        })
    }

    /// Identity fields of a stored record, if it has an id.
    pub fn remote_identity(&self) -> Option<RemoteIdentity> {
        Some(RemoteIdentity {
            id: self.id.clone()?,
            author: self.author.as_ref().map(|a| a.id().to_string()),
            created_at: self.created_at,
        })
    }
}

/// `{ annotations: [...] }` or the older `{ file: { annotations: [...] } }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LoadResponse {
    Direct { annotations: Vec<serde_json::Value> },
    File { file: FileBody },
}

#[derive(Debug, Deserialize)]
struct FileBody {
    #[serde(default)]
    annotations: Vec<serde_json::Value>,
}

/// `{ annotation: {...} }` or the bare record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SaveResponse {
    Wrapped { annotation: AnnotationRecord },
    Bare(AnnotationRecord),
}

/// Decode a load response into records, skipping the ones that do not
/// parse. `None` when the response as a whole is unrecognisable.
pub fn decode_load_response(body: &str) -> Option<Vec<AnnotationRecord>> {
    let response: LoadResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            log::warn!("Unrecognised annotation list response: {}", e);
            return None;
        }
    };
    let values = match response {
        LoadResponse::Direct { annotations } => annotations,
        LoadResponse::File { file } => file.annotations,
    };

    let records = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<AnnotationRecord>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping unreadable annotation record: {}", e);
                None
            }
        })
        .collect();
    Some(records)
}

pub fn decode_save_response(body: &str) -> Result<AnnotationRecord, serde_json::Error> {
    let response: SaveResponse = serde_json::from_str(body)?;
    Ok(match response {
        SaveResponse::Wrapped { annotation } => annotation,
        SaveResponse::Bare(record) => record,
    })
}

/// Convert records to annotations, allocating keys with `next_key` and
/// skipping records that do not describe a valid annotation.
pub fn records_into_annotations(
    records: Vec<AnnotationRecord>,
    mut next_key: impl FnMut() -> LocalKey,
) -> Vec<Annotation> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.id.clone();
            match record.into_annotation(next_key()) {
                Ok(annotation) => Some(annotation),
                Err(e) => {
                    log::warn!("Skipping annotation {:?}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_legacy_response() {
        let body = r##"{
            "file": {
                "annotations": [
                    {
                        "_id": "a1",
                        "type": "rectangle",
                        "coordinates": { "x": 80, "y": 80, "width": 200, "height": 100 },
                        "style": { "color": "#00ff00" },
                        "author": { "_id": "u1", "username": "qa-lead" },
                        "createdAt": "2025-03-01T10:00:00Z"
                    },
                    {
                        "_id": "a2",
                        "type": "arrow",
                        "coordinates": { "x": 1, "y": 2, "endX": 30, "endY": 40 },
                        "author": "u2"
                    }
                ]
            }
        }"##;

        let records = decode_load_response(body).unwrap();
        let mut n = 0;
        let annotations = records_into_annotations(records, || {
            n += 1;
            LocalKey(n)
        });

        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].id.as_deref(), Some("a1"));
        assert_eq!(annotations[0].author.as_deref(), Some("u1"));
        assert_eq!(annotations[0].style.color, "#00ff00");
        assert!(annotations[0].created_at.is_some());
        assert_eq!(
            annotations[0].geometry,
            Geometry::Rectangle(BoxGeometry::new(Point::new(80.0, 80.0), 200.0, 100.0))
        );
        assert_eq!(
            annotations[1].geometry,
            Geometry::Arrow { start: Point::new(1.0, 2.0), end: Point::new(30.0, 40.0) }
        );
        assert_eq!(annotations[1].author.as_deref(), Some("u2"));
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let body = r#"{
            "annotations": [
                { "kind": "polygon", "geometry": { "x": 1, "y": 1 } },
                { "kind": "circle", "geometry": { "x": 1, "y": 1 } },
                { "kind": "freehand", "geometry": { "points": [] } },
                { "kind": 42 },
                { "kind": "text", "geometry": { "x": 5, "y": 6 }, "text": "z-fight" }
            ]
        }"#;
        let records = decode_load_response(body).unwrap();
        assert_eq!(records.len(), 4);
        let annotations = records_into_annotations(records, || LocalKey(1));
        assert_eq!(annotations.len(), 1);
        assert_eq!(
            annotations[0].geometry,
            Geometry::Text { anchor: Point::new(5.0, 6.0), content: "z-fight".to_string() }
        );
    }

    #[test]
    fn test_blank_text_records_are_skipped() {
        let body = r#"{
            "annotations": [
                { "_id": "t1", "type": "text", "coordinates": { "x": 5, "y": 6 }, "text": "" },
                { "_id": "t2", "type": "text", "coordinates": { "x": 7, "y": 8 }, "text": "  " },
                { "_id": "t3", "type": "text", "coordinates": { "x": 9, "y": 9 }, "text": "banding" }
            ]
        }"#;
        let records = decode_load_response(body).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].clone().into_annotation(LocalKey(1)).unwrap_err(), RecordError::EmptyText);

        let annotations = records_into_annotations(records, || LocalKey(1));
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].id.as_deref(), Some("t3"));
    }

    #[test]
    fn test_unrecognised_response_is_none() {
        assert!(decode_load_response("not json").is_none());
        assert!(decode_load_response(r#"{"error":"File not found"}"#).is_none());
    }

    #[test]
    fn test_missing_field_error() {
        let record: AnnotationRecord =
            serde_json::from_str(r#"{"kind":"circle","geometry":{"x":1,"y":2,"width":3}}"#).unwrap();
        assert_eq!(
            record.into_annotation(LocalKey(1)).unwrap_err(),
            RecordError::MissingField { kind: AnnotationKind::Circle, field: "height" }
        );
    }

    #[test]
    fn test_encode_uses_protocol_names() {
        let annotation = Annotation::new(
            LocalKey(3),
            Geometry::Text { anchor: Point::new(10.0, 20.0), content: "seam".to_string() },
            Style::default(),
        );
        let json = serde_json::to_value(AnnotationRecord::from_annotation(&annotation)).unwrap();
        assert_eq!(json["kind"], "text");
        assert_eq!(json["geometry"]["x"], 10.0);
        assert_eq!(json["text"], "seam");
        assert_eq!(json["style"]["strokeWidth"], 2.0);
        assert!(json.get("_id").is_none());
        assert!(json.get("author").is_none());
    }

    #[test]
    fn test_save_response_forms() {
        let wrapped = r#"{"message":"ok","annotation":{"_id":"x9","kind":"arrow","geometry":{"x":0,"y":0,"endX":1,"endY":1},"author":"u1"}}"#;
        let record = decode_save_response(wrapped).unwrap();
        let identity = record.remote_identity().unwrap();
        assert_eq!(identity.id, "x9");
        assert_eq!(identity.author.as_deref(), Some("u1"));

        let bare = r#"{"id":"x10","type":"arrow","coordinates":{"x":0,"y":0,"endX":1,"endY":1}}"#;
        assert_eq!(decode_save_response(bare).unwrap().id.as_deref(), Some("x10"));
    }
}
