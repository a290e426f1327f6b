use serde::Serialize;

use crate::shared::detected_face::{BoundingBox, DetectedFace};
use crate::shared::roll_id::RollId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

/// The classroom face a present student was matched to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MatchedFace {
    pub index: usize,
    pub bbox: Option<BoundingBox>,
    pub confidence: f32,
}

impl From<&DetectedFace> for MatchedFace {
    fn from(face: &DetectedFace) -> Self {
        Self {
            index: face.index,
            bbox: face.bbox,
            confidence: face.confidence,
        }
    }
}

/// Attendance outcome for one enrolled student in one request.
///
/// For absent students `score` still carries the best (sub-threshold)
/// similarity seen, or `None` if the student could not be scored at all.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub roll_id: RollId,
    pub status: AttendanceStatus,
    pub score: Option<f64>,
    pub matched_face: Option<MatchedFace>,
}

impl AttendanceRecord {
    pub fn present(roll_id: RollId, score: f64, face: &DetectedFace) -> Self {
        Self {
            roll_id,
            status: AttendanceStatus::Present,
            score: Some(score),
            matched_face: Some(face.into()),
        }
    }

    pub fn absent(roll_id: RollId, best_score: Option<f64>) -> Self {
        Self {
            roll_id,
            status: AttendanceStatus::Absent,
            score: best_score,
            matched_face: None,
        }
    }

    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::embedding::Embedding;

    #[test]
    fn test_present_record_serializes_flat() {
        let face = DetectedFace {
            bbox: Some(BoundingBox::from([1.0, 2.0, 3.0, 4.0])),
            confidence: 0.5,
            ..DetectedFace::new(3, Embedding::normalize(&[1.0]).unwrap())
        };
        let record = AttendanceRecord::present(RollId::new("s1").unwrap(), 0.75, &face);

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "roll_id": "s1",
                "status": "present",
                "score": 0.75,
                "matched_face": {"index": 3, "bbox": [1.0, 2.0, 3.0, 4.0], "confidence": 0.5}
            })
        );
    }

    #[test]
    fn test_absent_record_serializes_nulls() {
        let record = AttendanceRecord::absent(RollId::new("s2").unwrap(), None);

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "roll_id": "s2",
                "status": "absent",
                "score": null,
                "matched_face": null
            })
        );
        assert!(!record.is_present());
    }
}
