//! Attaches risk columns to a collected batch in place.

use clipscout_common::VideoRecord;

use crate::error::RiskResult;
use crate::scorer::RiskScorer;

/// Score caption, overlay text, and transcript for every record and fill in
/// the corresponding risk columns. Records are mutated in place so the batch
/// the raw store saw and the batch the snapshot sees stay the same rows.
pub async fn add_risk_columns(scorer: &RiskScorer, records: &mut [VideoRecord]) -> RiskResult<()> {
    if records.is_empty() {
        return Ok(());
    }

    let captions: Vec<&str> = records.iter().map(|r| r.caption_raw.as_str()).collect();
    let caption_scores = scorer.score_texts(&captions).await?;

    let overlays: Vec<&str> = records
        .iter()
        .map(|r| r.overlay_text_raw.as_str())
        .collect();
    let overlay_scores = scorer.score_texts(&overlays).await?;

    let transcripts: Vec<&str> = records.iter().map(|r| r.transcript_raw.as_str()).collect();
    let transcript_scores = scorer.score_texts(&transcripts).await?;

    for (i, record) in records.iter_mut().enumerate() {
        record.caption_risk = Some(caption_scores[i]);
        record.overlay_risk = Some(overlay_scores[i]);
        record.transcript_risk = Some(transcript_scores[i]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clipscout_common::SourceType;

    use super::*;
    use crate::error::RiskResult;
    use crate::model::RiskModel;

    struct FixedModel(f64);

    impl RiskModel for FixedModel {
        fn classify(&self, texts: &[&str]) -> RiskResult<Vec<f64>> {
            Ok(vec![self.0; texts.len()])
        }
    }

    fn record(caption: &str, transcript: &str) -> VideoRecord {
        VideoRecord {
            source_type: SourceType::Hashtag,
            source_value: "test".into(),
            video_url: "https://example.com/video/1".into(),
            caption_raw: caption.into(),
            transcript_raw: transcript.into(),
            overlay_text_raw: String::new(),
            face_detected: false,
            face_dominant_emotion: None,
            face_emotion_score: 0.0,
            visual_brightness: None,
            visual_blur: None,
            caption_risk: None,
            overlay_risk: None,
            transcript_risk: None,
        }
    }

    #[tokio::test]
    async fn every_text_field_gets_a_risk_column() {
        let scorer = RiskScorer::with_model(Arc::new(FixedModel(0.75)), 16);
        let mut records = vec![
            record("a real caption here", "spoken words in full"),
            record("", ""),
        ];

        add_risk_columns(&scorer, &mut records).await.unwrap();

        assert_eq!(records[0].caption_risk, Some(0.75));
        assert_eq!(records[0].transcript_risk, Some(0.75));
        // empty overlay gates out but still gets an explicit score
        assert_eq!(records[0].overlay_risk, Some(0.0));
        assert_eq!(records[1].caption_risk, Some(0.0));
        assert_eq!(records[1].transcript_risk, Some(0.0));
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let scorer = RiskScorer::with_model(Arc::new(FixedModel(1.0)), 16);
        let mut records: Vec<VideoRecord> = Vec::new();
        add_risk_columns(&scorer, &mut records).await.unwrap();
    }
}
