use crate::models::{
    AttendanceRecord, AttendanceStatus, DailyPoint, Dashboard, PersonRecap, StatusCount,
    SummaryStats,
};
use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use std::collections::HashMap;

/// Most day buckets kept by [`daily_series`].
pub const DAILY_WINDOW: usize = 7;

const MONTHS_ID: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

pub fn build_dashboard(records: &[AttendanceRecord], offset: FixedOffset) -> Dashboard {
    Dashboard {
        stats: summary_stats(records),
        distribution: status_distribution(records),
        daily: daily_series(records, offset),
        recap: person_recap(records),
    }
}

pub fn summary_stats(records: &[AttendanceRecord]) -> SummaryStats {
    let count = |pred: fn(AttendanceStatus) -> bool| {
        records.iter().filter(|r| pred(r.status)).count() as u64
    };

    let total = records.len() as u64;
    let present = count(|s| s == AttendanceStatus::Hadir);
    let excused_or_sick = count(|s| matches!(s, AttendanceStatus::Izin | AttendanceStatus::Sakit));
    let late = count(|s| s == AttendanceStatus::Terlambat);

    SummaryStats {
        total,
        present,
        excused_or_sick,
        late,
        discipline_rate: discipline_rate(present, total),
    }
}

fn discipline_rate(present: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (present as f64 / total as f64 * 100.0).round() as u8
}

/// Count per status, in the order each status first appears.
pub fn status_distribution(records: &[AttendanceRecord]) -> Vec<StatusCount> {
    let mut out: Vec<StatusCount> = Vec::new();
    for record in records {
        match out.iter_mut().find(|entry| entry.status == record.status) {
            Some(entry) => entry.count += 1,
            None => out.push(StatusCount {
                status: record.status,
                count: 1,
            }),
        }
    }
    out
}

/// Records per calendar day, keyed like `"05 Jan"`.
///
/// Keys keep first-seen order and only the last [`DAILY_WINDOW`] keys survive.
/// The store is newest-first, so callers get a meaningful trend only when the
/// input order is itself chronological.
pub fn daily_series(records: &[AttendanceRecord], offset: FixedOffset) -> Vec<DailyPoint> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut points: Vec<DailyPoint> = Vec::new();

    for record in records {
        let key = day_key(&record.timestamp, offset);
        match index.get(&key) {
            Some(&i) => points[i].total += 1,
            None => {
                index.insert(key.clone(), points.len());
                points.push(DailyPoint { date: key, total: 1 });
            }
        }
    }

    let skip = points.len().saturating_sub(DAILY_WINDOW);
    points.split_off(skip)
}

/// Per-person counts, highest `hadir` first. Ties keep encounter order.
pub fn person_recap(records: &[AttendanceRecord]) -> Vec<PersonRecap> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut recap: Vec<PersonRecap> = Vec::new();

    for record in records {
        let i = *index.entry(record.user_name.as_str()).or_insert_with(|| {
            recap.push(PersonRecap {
                name: record.user_name.clone(),
                ..PersonRecap::default()
            });
            recap.len() - 1
        });

        let row = &mut recap[i];
        row.total += 1;
        match record.status {
            AttendanceStatus::Hadir => row.hadir += 1,
            AttendanceStatus::Izin => row.izin += 1,
            AttendanceStatus::Sakit => row.sakit += 1,
            AttendanceStatus::Terlambat => row.terlambat += 1,
            AttendanceStatus::Alpa => row.alpa += 1,
        }
    }

    // sort_by is stable
    recap.sort_by(|a, b| b.hadir.cmp(&a.hadir));
    recap
}

pub fn day_key(timestamp: &DateTime<Utc>, offset: FixedOffset) -> String {
    let local = timestamp.with_timezone(&offset);
    format!("{:02} {}", local.day(), MONTHS_ID[local.month0() as usize])
}

/// `d/m/yyyy, HH.MM.SS` in the given offset.
pub fn display_timestamp(timestamp: &DateTime<Utc>, offset: FixedOffset) -> String {
    let local = timestamp.with_timezone(&offset);
    format!(
        "{}/{}/{}, {:02}.{:02}.{:02}",
        local.day(),
        local.month(),
        local.year(),
        local.hour(),
        local.minute(),
        local.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceType;
    use chrono::{Duration, TimeZone};

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn record(user: &str, status: AttendanceStatus, timestamp: DateTime<Utc>) -> AttendanceRecord {
        AttendanceRecord {
            id: timestamp.timestamp_millis().to_string(),
            user_id: user.to_lowercase(),
            user_name: user.to_string(),
            timestamp,
            kind: AttendanceType::In,
            status,
            location: None,
            photo: None,
            note: None,
            activity_category: None,
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, 1, 0, 0).unwrap()
    }

    fn example() -> Vec<AttendanceRecord> {
        vec![
            record("A", AttendanceStatus::Hadir, at(5)),
            record("A", AttendanceStatus::Terlambat, at(5)),
            record("B", AttendanceStatus::Izin, at(6)),
        ]
    }

    #[test]
    fn stats_for_mixed_records() {
        let stats = summary_stats(&example());
        assert_eq!(
            stats,
            SummaryStats {
                total: 3,
                present: 1,
                excused_or_sick: 1,
                late: 1,
                discipline_rate: 33,
            }
        );
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let dashboard = build_dashboard(&[], wib());
        assert_eq!(
            dashboard.stats,
            SummaryStats {
                total: 0,
                present: 0,
                excused_or_sick: 0,
                late: 0,
                discipline_rate: 0,
            }
        );
        assert!(dashboard.distribution.is_empty());
        assert!(dashboard.daily.is_empty());
        assert!(dashboard.recap.is_empty());
    }

    #[test]
    fn alpa_counts_toward_total_only() {
        let records = vec![
            record("A", AttendanceStatus::Hadir, at(5)),
            record("A", AttendanceStatus::Alpa, at(6)),
        ];
        let stats = summary_stats(&records);
        assert!(stats.present + stats.excused_or_sick + stats.late < stats.total);
        assert_eq!(stats.discipline_rate, 50);

        let recap = person_recap(&records);
        assert_eq!(recap[0].alpa, 1);
        assert_eq!(recap[0].total, 2);
    }

    #[test]
    fn rate_rounds_half_up() {
        let records = vec![
            record("A", AttendanceStatus::Hadir, at(5)),
            record("A", AttendanceStatus::Sakit, at(5)),
            record("A", AttendanceStatus::Sakit, at(5)),
            record("A", AttendanceStatus::Hadir, at(5)),
            record("A", AttendanceStatus::Hadir, at(5)),
            record("A", AttendanceStatus::Hadir, at(5)),
            record("A", AttendanceStatus::Hadir, at(5)),
            record("A", AttendanceStatus::Hadir, at(5)),
        ];
        // 6 / 8 = 75%
        assert_eq!(summary_stats(&records).discipline_rate, 75);
        assert_eq!(discipline_rate(1, 8), 13);
        assert_eq!(discipline_rate(8, 8), 100);
    }

    #[test]
    fn distribution_keeps_first_seen_order() {
        let records = vec![
            record("A", AttendanceStatus::Sakit, at(5)),
            record("A", AttendanceStatus::Hadir, at(5)),
            record("B", AttendanceStatus::Sakit, at(5)),
            record("B", AttendanceStatus::Alpa, at(5)),
        ];
        let dist = status_distribution(&records);
        let order: Vec<_> = dist.iter().map(|d| (d.status, d.count)).collect();
        assert_eq!(
            order,
            [
                (AttendanceStatus::Sakit, 2),
                (AttendanceStatus::Hadir, 1),
                (AttendanceStatus::Alpa, 1),
            ]
        );
        assert_eq!(dist, status_distribution(&records));
    }

    #[test]
    fn daily_series_keeps_last_seven_keys() {
        let records: Vec<_> = (1..=10)
            .map(|day| record("A", AttendanceStatus::Hadir, at(day)))
            .collect();
        let daily = daily_series(&records, wib());
        assert_eq!(daily.len(), DAILY_WINDOW);
        assert_eq!(daily.first().unwrap().date, "04 Jan");
        assert_eq!(daily.last().unwrap().date, "10 Jan");
    }

    #[test]
    fn daily_series_follows_input_order_not_calendar() {
        let records: Vec<_> = (1..=9)
            .rev()
            .map(|day| record("A", AttendanceStatus::Hadir, at(day)))
            .collect();
        let daily = daily_series(&records, wib());
        let dates: Vec<_> = daily.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(
            dates,
            ["07 Jan", "06 Jan", "05 Jan", "04 Jan", "03 Jan", "02 Jan", "01 Jan"]
        );
    }

    #[test]
    fn daily_series_groups_by_local_day() {
        // 18:00 UTC is already the next day in WIB.
        let late_evening = Utc.with_ymd_and_hms(2026, 8, 16, 18, 0, 0).unwrap();
        let records = vec![
            record("A", AttendanceStatus::Hadir, late_evening),
            record("B", AttendanceStatus::Hadir, late_evening + Duration::hours(2)),
        ];
        let daily = daily_series(&records, wib());
        assert_eq!(
            daily,
            [DailyPoint {
                date: "17 Agu".to_string(),
                total: 2
            }]
        );
    }

    #[test]
    fn recap_matches_worked_example() {
        let recap = person_recap(&example());
        assert_eq!(
            recap,
            [
                PersonRecap {
                    name: "A".to_string(),
                    hadir: 1,
                    terlambat: 1,
                    total: 2,
                    ..PersonRecap::default()
                },
                PersonRecap {
                    name: "B".to_string(),
                    izin: 1,
                    total: 1,
                    ..PersonRecap::default()
                },
            ]
        );
    }

    #[test]
    fn recap_sort_is_stable_on_ties() {
        let records = vec![
            record("C", AttendanceStatus::Izin, at(5)),
            record("A", AttendanceStatus::Hadir, at(5)),
            record("B", AttendanceStatus::Sakit, at(5)),
            record("D", AttendanceStatus::Hadir, at(5)),
            record("D", AttendanceStatus::Hadir, at(6)),
        ];
        let names: Vec<_> = person_recap(&records)
            .into_iter()
            .map(|row| row.name)
            .collect();
        assert_eq!(names, ["D", "A", "C", "B"]);
    }

    #[test]
    fn recap_counters_never_exceed_total() {
        let statuses = AttendanceStatus::ALL;
        let records: Vec<_> = (0..40)
            .map(|i| {
                let user = ["A", "B", "C"][i % 3];
                record(user, statuses[i % statuses.len()], at(1 + (i % 28) as u32))
            })
            .collect();

        for row in person_recap(&records) {
            assert!(row.hadir + row.izin + row.sakit + row.terlambat <= row.total);
            assert_eq!(
                row.hadir + row.izin + row.sakit + row.terlambat + row.alpa,
                row.total
            );
        }
        let stats = summary_stats(&records);
        assert!(stats.discipline_rate <= 100);
        assert!(daily_series(&records, wib()).len() <= DAILY_WINDOW);
    }

    #[test]
    fn display_timestamp_uses_local_offset() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 5, 1, 30, 5).unwrap();
        assert_eq!(display_timestamp(&ts, wib()), "5/1/2026, 08.30.05");
    }
}
