pub mod types;

pub use types::*;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::date_util::validate_range;
use crate::error::Result;
use crate::rollup::DailyRollupRow;
use crate::source::DailyRollupSource;

/// Summarize a clinic's activity over `[from, to]`.
///
/// `today` only selects the row behind `appts_today`; it need not fall inside
/// the range. The two fetches are independent and run concurrently; if either
/// fails the whole call fails and nothing is reduced.
pub async fn summarize(
    source: &dyn DailyRollupSource,
    clinic_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
    today: NaiveDate,
) -> Result<PeriodSummary> {
    validate_range(from, to)?;

    let (today_row, rows) = tokio::try_join!(
        source.fetch_day(clinic_id, today),
        source.fetch_range(clinic_id, from, to),
    )?;

    log::debug!(
        "Summarizing {} rollup rows for clinic {clinic_id} ({from}..={to})",
        rows.len()
    );
    Ok(summarize_rows(today_row.as_ref(), &rows))
}

/// Project one metric over `[from, to]`, one point per stored day.
///
/// Days without a row produce no point; nothing is gap-filled.
pub async fn project(
    source: &dyn DailyRollupSource,
    clinic_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
    metric: Metric,
) -> Result<Vec<TimeseriesPoint>> {
    validate_range(from, to)?;

    let rows = source.fetch_range(clinic_id, from, to).await?;
    log::debug!(
        "Projecting {metric} over {} rollup rows for clinic {clinic_id}",
        rows.len()
    );
    Ok(rows.iter().map(|row| project_row(metric, row)).collect())
}

/// Reduce already-fetched rows into a summary.
pub fn summarize_rows(today_row: Option<&DailyRollupRow>, rows: &[DailyRollupRow]) -> PeriodSummary {
    let appts_today = today_row.and_then(|r| r.appts_total).unwrap_or(0);

    let mut summary = PeriodSummary {
        appts_today,
        ..PeriodSummary::default()
    };
    let mut total_conversations: i64 = 0;
    let mut total_responded: i64 = 0;
    let mut total_response_time = 0.0;
    let mut daily_p50s: Vec<f64> = Vec::new();

    for row in rows {
        let conversations = row.conversations_total.unwrap_or(0);
        summary.appts_in_period += row.appts_total.unwrap_or(0);
        summary.no_shows_in_period += row.no_shows.unwrap_or(0);
        summary.rescheduled_from_no_show_in_period += row.rescheduled_from_no_show.unwrap_or(0);
        total_conversations += conversations;
        total_responded += row.conversations_responded.unwrap_or(0);
        total_response_time += row.avg_response_sec.unwrap_or(0.0) * conversations as f64;
        // Absent p50s are skipped, not counted as zero
        if let Some(p50) = row.p50_response_sec {
            daily_p50s.push(p50);
        }
    }

    let weighted_avg = if total_conversations > 0 {
        total_response_time / total_conversations as f64
    } else {
        0.0
    };
    let response_rate = if total_conversations > 0 {
        total_responded as f64 / total_conversations as f64 * 100.0
    } else {
        0.0
    };

    summary.avg_response_sec_weighted = weighted_avg.round() as i64;
    summary.p50_response_sec_period = lower_median(&mut daily_p50s).unwrap_or(0.0).round() as i64;
    summary.response_rate_percent = round_to_hundredths(response_rate);
    summary
}

/// Derive one time-series point from a single row.
pub fn project_row(metric: Metric, row: &DailyRollupRow) -> TimeseriesPoint {
    let value = match metric {
        Metric::Appointments => MetricValue::Count(row.appts_total.unwrap_or(0)),
        Metric::MedianResponseTime => {
            MetricValue::Count(row.p50_response_sec.unwrap_or(0.0).round() as i64)
        }
        Metric::AverageResponseTime => {
            MetricValue::Count(row.avg_response_sec.unwrap_or(0.0).round() as i64)
        }
        Metric::NoShowRate => MetricValue::Count(row.no_shows.unwrap_or(0)),
        Metric::ResponseRate => {
            let total = row.conversations_total.unwrap_or(0);
            let responded = row.conversations_responded.unwrap_or(0);
            let rate = if total > 0 {
                (responded as f64 / total as f64 * 10000.0).round() / 100.0
            } else {
                0.0
            };
            MetricValue::Decimal(rate)
        }
    };
    TimeseriesPoint {
        day: row.day,
        value,
    }
}

/// Lower-median of the values: the element at index `len / 2` after sorting.
/// For an even count that index lands on the upper of the two middle values.
fn lower_median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    Some(values[values.len() / 2])
}

fn round_to_hundredths(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::StaticRollupSource;
    use async_trait::async_trait;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn clinic() -> Uuid {
        Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap()
    }

    #[allow(clippy::too_many_arguments)]
    fn row(
        d: u32,
        appts: i64,
        conv: i64,
        resp: i64,
        avg: f64,
        p50: f64,
        no_shows: i64,
        resched: i64,
    ) -> DailyRollupRow {
        DailyRollupRow {
            clinic_id: clinic(),
            day: day(d),
            appts_total: Some(appts),
            conversations_total: Some(conv),
            conversations_responded: Some(resp),
            avg_response_sec: Some(avg),
            p50_response_sec: Some(p50),
            no_shows: Some(no_shows),
            rescheduled_from_no_show: Some(resched),
        }
    }

    fn with_p50(d: u32, p50: Option<f64>) -> DailyRollupRow {
        DailyRollupRow {
            p50_response_sec: p50,
            ..DailyRollupRow::empty(clinic(), day(d))
        }
    }

    fn scenario_rows() -> Vec<DailyRollupRow> {
        vec![
            row(1, 10, 5, 4, 100.0, 90.0, 1, 0),
            row(2, 8, 3, 3, 80.0, 80.0, 0, 1),
            row(3, 12, 6, 4, 120.0, 110.0, 2, 0),
        ]
    }

    struct FailingSource;

    #[async_trait]
    impl DailyRollupSource for FailingSource {
        async fn fetch_range(
            &self,
            _clinic_id: Uuid,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> Result<Vec<DailyRollupRow>> {
            Err(Error::SourceUnavailable("connection refused".into()))
        }

        async fn fetch_day(
            &self,
            _clinic_id: Uuid,
            _day: NaiveDate,
        ) -> Result<Option<DailyRollupRow>> {
            Ok(None)
        }
    }

    /// Range fetch succeeds, the today fetch fails.
    struct TodayFailingSource;

    #[async_trait]
    impl DailyRollupSource for TodayFailingSource {
        async fn fetch_range(
            &self,
            _clinic_id: Uuid,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> Result<Vec<DailyRollupRow>> {
            Ok(scenario_rows())
        }

        async fn fetch_day(
            &self,
            _clinic_id: Uuid,
            _day: NaiveDate,
        ) -> Result<Option<DailyRollupRow>> {
            Err(Error::SourceUnavailable("timeout".into()))
        }
    }

    #[test]
    fn test_summarize_empty_period() {
        let s = summarize_rows(None, &[]);
        assert_eq!(s, PeriodSummary::default());
    }

    #[test]
    fn test_appointments_sum() {
        let rows = vec![
            row(1, 3, 0, 0, 0.0, 0.0, 0, 0),
            row(2, 0, 0, 0, 0.0, 0.0, 0, 0),
            DailyRollupRow::empty(clinic(), day(3)),
            row(4, 7, 0, 0, 0.0, 0.0, 0, 0),
        ];
        assert_eq!(summarize_rows(None, &rows).appts_in_period, 10);
    }

    #[test]
    fn test_zero_conversations_does_not_divide() {
        let rows = vec![row(1, 4, 0, 0, 300.0, 10.0, 0, 0), row(2, 2, 0, 0, 50.0, 20.0, 0, 0)];
        let s = summarize_rows(None, &rows);
        assert_eq!(s.avg_response_sec_weighted, 0);
        assert_eq!(s.response_rate_percent, 0.0);
    }

    #[test]
    fn test_weighted_average_weights_by_conversations() {
        // Simple mean of daily averages would be 55
        let rows = vec![row(1, 0, 9, 9, 100.0, 0.0, 0, 0), row(2, 0, 1, 1, 10.0, 0.0, 0, 0)];
        assert_eq!(summarize_rows(None, &rows).avg_response_sec_weighted, 91);
    }

    #[test]
    fn test_weighted_average_invariant_under_day_split() {
        let whole = vec![row(1, 0, 6, 6, 120.0, 0.0, 0, 0), row(2, 0, 4, 4, 45.0, 0.0, 0, 0)];
        let split = vec![
            row(1, 0, 2, 2, 120.0, 0.0, 0, 0),
            row(2, 0, 4, 4, 120.0, 0.0, 0, 0),
            row(3, 0, 4, 4, 45.0, 0.0, 0, 0),
        ];
        assert_eq!(
            summarize_rows(None, &whole).avg_response_sec_weighted,
            summarize_rows(None, &split).avg_response_sec_weighted
        );
    }

    #[test]
    fn test_median_odd_count() {
        let rows = vec![with_p50(1, Some(10.0)), with_p50(2, Some(20.0)), with_p50(3, Some(30.0))];
        assert_eq!(summarize_rows(None, &rows).p50_response_sec_period, 20);
    }

    #[test]
    fn test_median_even_count_takes_index_half() {
        let rows = vec![with_p50(1, Some(10.0)), with_p50(2, Some(30.0))];
        assert_eq!(summarize_rows(None, &rows).p50_response_sec_period, 30);
    }

    #[test]
    fn test_median_skips_absent_values() {
        let rows = vec![
            with_p50(1, None),
            with_p50(2, Some(40.0)),
            with_p50(3, None),
            with_p50(4, Some(20.0)),
            with_p50(5, Some(30.0)),
        ];
        assert_eq!(summarize_rows(None, &rows).p50_response_sec_period, 30);

        let none = vec![with_p50(1, None), with_p50(2, None)];
        assert_eq!(summarize_rows(None, &none).p50_response_sec_period, 0);
    }

    #[test]
    fn test_median_rounds_to_whole_seconds() {
        let rows = vec![with_p50(1, Some(12.5)), with_p50(2, Some(3.2))];
        assert_eq!(summarize_rows(None, &rows).p50_response_sec_period, 13);
    }

    #[test]
    fn test_today_row_missing_appts_is_zero() {
        let today = DailyRollupRow::empty(clinic(), day(2));
        assert_eq!(summarize_rows(Some(&today), &[]).appts_today, 0);
    }

    #[test]
    fn test_summarize_scenario() {
        let rows = scenario_rows();
        let s = summarize_rows(Some(&rows[1]), &rows);
        assert_eq!(s.appts_today, 8);
        assert_eq!(s.appts_in_period, 30);
        // (100*5 + 80*3 + 120*6) / 14 = 104.29
        assert_eq!(s.avg_response_sec_weighted, 104);
        assert_eq!(s.p50_response_sec_period, 90);
        assert_eq!(s.response_rate_percent, 78.57);
        assert_eq!(s.no_shows_in_period, 3);
        assert_eq!(s.rescheduled_from_no_show_in_period, 1);
    }

    #[tokio::test]
    async fn test_summarize_reads_today_outside_range() {
        let mut rows = scenario_rows();
        rows.push(row(20, 42, 0, 0, 0.0, 0.0, 0, 0));
        let source = StaticRollupSource::new(rows);

        let s = summarize(&source, clinic(), day(1), day(3), day(20)).await.unwrap();
        assert_eq!(s.appts_today, 42);
        assert_eq!(s.appts_in_period, 30);
    }

    #[tokio::test]
    async fn test_summarize_rejects_inverted_range() {
        let source = StaticRollupSource::new(scenario_rows());
        let err = summarize(&source, clinic(), day(3), day(1), day(2)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_summarize_propagates_source_failure() {
        let err = summarize(&FailingSource, clinic(), day(1), day(3), day(2))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_summarize_fails_when_today_fetch_fails() {
        let err = summarize(&TodayFailingSource, clinic(), day(1), day(3), day(2))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(ref m) if m == "timeout"), "{err}");
    }

    #[tokio::test]
    async fn test_project_propagates_source_failure() {
        let err = project(&FailingSource, clinic(), day(1), day(3), Metric::Appointments)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_project_preserves_order_and_gaps() {
        let rows = vec![
            row(5, 1, 0, 0, 0.0, 0.0, 0, 0),
            row(1, 2, 0, 0, 0.0, 0.0, 0, 0),
            row(3, 3, 0, 0, 0.0, 0.0, 0, 0),
        ];
        let source = StaticRollupSource::new(rows);

        let points = project(&source, clinic(), day(1), day(7), Metric::Appointments)
            .await
            .unwrap();
        assert_eq!(points.len(), 3);
        let days: Vec<NaiveDate> = points.iter().map(|p| p.day).collect();
        assert_eq!(days, vec![day(1), day(3), day(5)]);
        let values: Vec<MetricValue> = points.iter().map(|p| p.value).collect();
        assert_eq!(
            values,
            vec![MetricValue::Count(2), MetricValue::Count(3), MetricValue::Count(1)]
        );
    }

    #[test]
    fn test_project_row_per_metric() {
        let r = row(1, 10, 5, 4, 100.4, 89.6, 2, 1);
        assert_eq!(project_row(Metric::Appointments, &r).value, MetricValue::Count(10));
        assert_eq!(project_row(Metric::MedianResponseTime, &r).value, MetricValue::Count(90));
        assert_eq!(project_row(Metric::AverageResponseTime, &r).value, MetricValue::Count(100));
        assert_eq!(project_row(Metric::NoShowRate, &r).value, MetricValue::Count(2));
        assert_eq!(project_row(Metric::ResponseRate, &r).value, MetricValue::Decimal(80.0));
    }

    #[test]
    fn test_project_row_response_rate() {
        let r = row(1, 0, 4, 3, 0.0, 0.0, 0, 0);
        assert_eq!(project_row(Metric::ResponseRate, &r).value, MetricValue::Decimal(75.0));

        let r = row(1, 0, 0, 0, 0.0, 0.0, 0, 0);
        assert_eq!(project_row(Metric::ResponseRate, &r).value, MetricValue::Decimal(0.0));

        let r = row(1, 0, 3, 2, 0.0, 0.0, 0, 0);
        assert_eq!(project_row(Metric::ResponseRate, &r).value, MetricValue::Decimal(66.67));
    }

    #[test]
    fn test_project_row_absent_measures_are_zero() {
        let r = DailyRollupRow::empty(clinic(), day(1));
        for metric in Metric::ALL {
            let zero = match metric {
                Metric::ResponseRate => MetricValue::Decimal(0.0),
                _ => MetricValue::Count(0),
            };
            assert_eq!(project_row(metric, &r).value, zero, "{metric}");
        }
    }

    #[test]
    fn test_metric_parse() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert!("invalid".parse::<Metric>().is_err());
        assert!("Appointments".parse::<Metric>().is_err());
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let s = summarize_rows(None, &scenario_rows());
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["apptsInPeriod"], 30);
        assert_eq!(json["avgResponseSecWeighted"], 104);
        assert_eq!(json["p50ResponseSecPeriod"], 90);
        assert_eq!(json["responseRatePercent"], 78.57);
        assert_eq!(json["rescheduledFromNoShowInPeriod"], 1);
        assert_eq!(json.as_object().unwrap().len(), 7);
    }

    #[test]
    fn test_point_serializes_day_and_number() {
        let p = project_row(Metric::ResponseRate, &row(2, 0, 4, 3, 0.0, 0.0, 0, 0));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["day"], "2025-01-02");
        assert_eq!(json["value"], 75.0);
    }
}
