//! Reshaping merged records into graph and wide frames.
//!
//! Graph frames hold one series each: a time column and a single
//! measurement column labeled with the series' dimensions. The wide frame
//! holds every record with its dimensions as ordinary columns.
//!
//! Records whose timestamp, dimensions or measurement cannot be extracted
//! are logged and skipped; they never fail the build.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use monwatch_types::{Frame, FrameRecord, RecordError, StatusMap, Value, TIME_FIELD};
use tracing::warn;

use crate::config::WideTableLayout;

/// Builds frames from a merged, sorted record collection.
///
/// The builder holds no state between calls, so building the same records
/// twice yields identical frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameBuilder<'a> {
    statuses: &'a StatusMap,
    layout: WideTableLayout,
}

impl<'a> FrameBuilder<'a> {
    pub fn new(statuses: &'a StatusMap, layout: WideTableLayout) -> Self {
        Self { statuses, layout }
    }

    /// One frame per distinct grouping key, in order of first appearance.
    pub fn build_graph_frames<R: FrameRecord>(&self, records: &[R]) -> Vec<Frame> {
        self.build_grouped(records, |record| record.graph_table_layout(), |record, ts| {
            record.graph_row_values(ts, self.statuses)
        })
    }

    /// Exactly one frame carrying every record, in input order.
    pub fn build_wide_frame<R: FrameRecord>(&self, records: &[R]) -> Frame {
        let mut frame = R::wide_table_layout();
        for record in records {
            let Some(ts) = timestamp_of(record) else {
                continue;
            };
            match record.table_row_values(ts, self.statuses) {
                Ok(row) => append(&mut frame, row, R::KIND),
                Err(err) => warn!(kind = R::KIND, error = %err, "Dropping record"),
            }
        }
        frame
    }

    /// Wide frames for the configured layout.
    pub fn build_wide_frames<R: FrameRecord>(&self, records: &[R]) -> Vec<Frame> {
        match self.layout {
            WideTableLayout::Single => vec![self.build_wide_frame(records)],
            WideTableLayout::PerSeries => self.build_grouped(
                records,
                |_| Ok(R::wide_table_layout()),
                |record, ts| record.table_row_values(ts, self.statuses),
            ),
        }
    }

    fn build_grouped<R, L, V>(&self, records: &[R], layout: L, values: V) -> Vec<Frame>
    where
        R: FrameRecord,
        L: Fn(&R) -> Result<Frame, RecordError>,
        V: Fn(&R, DateTime<Utc>) -> Result<Vec<Value>, RecordError>,
    {
        let mut frames: Vec<Frame> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            let Some(ts) = timestamp_of(record) else {
                continue;
            };
            let prepared = record
                .grouping_key()
                .and_then(|key| values(record, ts).map(|row| (key, row)));
            let (key, row) = match prepared {
                Ok(prepared) => prepared,
                Err(err) => {
                    warn!(kind = R::KIND, error = %err, "Dropping record");
                    continue;
                }
            };

            let slot = match index.get(&key) {
                Some(&slot) => slot,
                None => match layout(record) {
                    Ok(frame) => {
                        frames.push(frame);
                        index.insert(key, frames.len() - 1);
                        frames.len() - 1
                    }
                    Err(err) => {
                        warn!(kind = R::KIND, error = %err, "Dropping record");
                        continue;
                    }
                },
            };
            append(&mut frames[slot], row, R::KIND);
        }

        frames
    }
}

fn timestamp_of<R: FrameRecord>(record: &R) -> Option<DateTime<Utc>> {
    match record.timestamp() {
        Ok(ts) => Some(ts),
        Err(err) => {
            warn!(kind = R::KIND, error = %err, "Dropping record with unusable timestamp");
            None
        }
    }
}

fn append(frame: &mut Frame, row: Vec<Value>, kind: &str) {
    if let Err(err) = frame.append_row(row) {
        warn!(kind, error = %err, "Dropping row that does not fit its frame");
    }
}

/// Attach the severity display mapping to every non-time field.
pub fn apply_status_mappings(frames: &mut [Frame], statuses: &StatusMap) {
    let config = statuses.field_config();
    for frame in frames {
        for field in frame.fields.iter_mut().filter(|f| f.name != TIME_FIELD) {
            field.set_config(config.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monwatch_types::{ErrorCount, StatusChange, Telemetry};

    fn records() -> Vec<ErrorCount> {
        vec![
            ErrorCount::new("2022-12-07T18:00:00Z", 1, "us-east-1", "ping", "aws"),
            ErrorCount::new("2022-12-07T18:01:00Z", 2, "us-west-2", "ping", "aws"),
            ErrorCount::new("2022-12-07T18:02:00Z", 3, "us-east-1", "ping", "aws"),
            ErrorCount::new("2022-12-07T18:03:00Z", 4, "us-east-1", "login", "aws"),
            ErrorCount::new("2022-12-07T18:04:00Z", 5, "us-west-2", "ping", "aws"),
        ]
    }

    #[test]
    fn test_one_graph_frame_per_key_in_first_appearance_order() {
        let statuses = StatusMap::default();
        let builder = FrameBuilder::new(&statuses, WideTableLayout::Single);

        let frames = builder.build_graph_frames(&records());

        assert_eq!(frames.len(), 3);
        let sizes: Vec<usize> = frames.iter().map(Frame::row_count).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(frames[0].fields[1].labels["instance"], "us-east-1");
        assert_eq!(frames[1].fields[1].labels["instance"], "us-west-2");
        assert_eq!(frames[2].fields[1].labels["check"], "login");
        assert!(frames.iter().all(Frame::is_graph));
        assert_eq!(frames[0].row(1).unwrap()[1], Value::Int64(3));
    }

    #[test]
    fn test_wide_frame_keeps_every_record_in_order() {
        let statuses = StatusMap::default();
        let builder = FrameBuilder::new(&statuses, WideTableLayout::Single);
        let mut input = records();
        input.push(input[0].clone());

        let frame = builder.build_wide_frame(&input);

        assert_eq!(frame.row_count(), 6);
        assert!(!frame.is_graph());
        let counts: Vec<Value> = (0..6).map(|i| frame.row(i).unwrap()[1].clone()).collect();
        assert_eq!(
            counts,
            vec![1i64, 2, 3, 4, 5, 1].into_iter().map(Value::Int64).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_bad_records_are_dropped_not_fatal() {
        let statuses = StatusMap::default();
        let builder = FrameBuilder::new(&statuses, WideTableLayout::Single);
        let mut input = records();
        input.push(ErrorCount::new("not a time", 9, "us-east-1", "ping", "aws"));
        input.push(ErrorCount {
            instance: None,
            ..ErrorCount::new("2022-12-07T18:05:00Z", 9, "x", "ping", "aws")
        });
        input.push(ErrorCount {
            count: None,
            ..ErrorCount::new("2022-12-07T18:05:00Z", 9, "brand-new", "ping", "aws")
        });

        assert_eq!(builder.build_wide_frame(&input).row_count(), 5);
        let graphs = builder.build_graph_frames(&input);
        assert_eq!(graphs.len(), 3);
        assert_eq!(graphs.iter().map(Frame::row_count).sum::<usize>(), 5);
    }

    #[test]
    fn test_build_is_idempotent() {
        let statuses = StatusMap::default();
        let builder = FrameBuilder::new(&statuses, WideTableLayout::Single);
        let input = records();

        assert_eq!(builder.build_graph_frames(&input), builder.build_graph_frames(&input));
        assert_eq!(builder.build_wide_frame(&input), builder.build_wide_frame(&input));
    }

    #[test]
    fn test_empty_input() {
        let statuses = StatusMap::default();
        let builder = FrameBuilder::new(&statuses, WideTableLayout::Single);
        let empty: Vec<Telemetry> = Vec::new();

        assert!(builder.build_graph_frames(&empty).is_empty());
        let wide = builder.build_wide_frame(&empty);
        assert_eq!(wide.row_count(), 0);
        assert_eq!(wide.fields.len(), 5);
    }

    #[test]
    fn test_per_series_wide_layout() {
        let statuses = StatusMap::default();
        let builder = FrameBuilder::new(&statuses, WideTableLayout::PerSeries);

        let frames = builder.build_wide_frames(&records());

        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| !f.is_graph()));
        assert_eq!(frames.iter().map(Frame::row_count).sum::<usize>(), 5);

        let single = FrameBuilder::new(&statuses, WideTableLayout::Single);
        assert_eq!(single.build_wide_frames(&records()).len(), 1);
    }

    #[test]
    fn test_status_mappings_skip_time_field() {
        let statuses = StatusMap::default();
        let builder = FrameBuilder::new(&statuses, WideTableLayout::Single);
        let input = vec![StatusChange::new("2022-12-07T18:00:00Z", "down", "api", "github")];

        let mut frames = builder.build_graph_frames(&input);
        frames.push(builder.build_wide_frame(&input));
        apply_status_mappings(&mut frames, &statuses);

        for frame in &frames {
            assert!(frame.fields[0].config.is_none());
            for field in &frame.fields[1..] {
                assert_eq!(field.config.as_ref().unwrap().mappings.len(), 5);
            }
        }
        assert_eq!(frames[0].row(0).unwrap()[1], Value::Int8(4));
    }
}
