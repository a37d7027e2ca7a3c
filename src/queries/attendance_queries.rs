use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::auth::{self, Identity};
use crate::db::{attendance_repo, group_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::model::{AttendanceRecord, AttendanceType, Gender, Id, Period, User};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenderTotals {
    pub total: i64,
    pub male: i64,
    pub female: i64,
}

impl GenderTotals {
    fn add(&mut self, amount: i64, gender: Option<Gender>) {
        self.total += amount;
        match gender {
            Some(Gender::Male) => self.male += amount,
            Some(Gender::Female) => self.female += amount,
            None => {}
        }
    }

    fn merge(&mut self, other: &GenderTotals) {
        self.total += other.total;
        self.male += other.male;
        self.female += other.female;
    }
}

/// Aggregate of one attendance type over a period.
#[derive(Debug, Clone, Serialize)]
pub struct TypeSummary {
    pub attendance_type: AttendanceType,
    pub label: &'static str,
    pub records: usize,
    pub totals: GenderTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodReport {
    pub period: Period,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub summaries: Vec<TypeSummary>,
    pub grand_total: GenderTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscipleTotal {
    pub user_id: Id<User>,
    pub name: String,
    pub total: i64,
}

/// A leader's view: disciples aggregated, the leader's own numbers apart.
#[derive(Debug, Clone, Serialize)]
pub struct GroupAttendanceReport {
    pub period: Period,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub group: Vec<TypeSummary>,
    pub group_total: GenderTotals,
    pub my_total: i64,
    pub disciples_total: i64,
    pub per_disciple: Vec<DiscipleTotal>,
}

/// Buckets records by type (every type present, in `AttendanceType::ALL`
/// order) and splits each bucket by the record owner's gender.
pub fn summarize<F>(records: &[AttendanceRecord], gender_of: F) -> Vec<TypeSummary>
where
    F: Fn(Id<User>) -> Option<Gender>,
{
    AttendanceType::ALL
        .iter()
        .map(|t| {
            let mut totals = GenderTotals::default();
            let mut count = 0;
            for record in records.iter().filter(|r| r.attendance_type == *t) {
                totals.add(record.total(), gender_of(record.user_id));
                count += 1;
            }
            TypeSummary {
                attendance_type: *t,
                label: t.label(),
                records: count,
                totals,
            }
        })
        .collect()
}

fn grand_total(summaries: &[TypeSummary]) -> GenderTotals {
    let mut total = GenderTotals::default();
    for s in summaries {
        total.merge(&s.totals);
    }
    total
}

pub fn my_records(
    conn: &Connection,
    caller: Option<&Identity>,
    period: Period,
) -> AppResult<Vec<AttendanceRecord>> {
    let user = auth::current_user(conn, caller)?;
    let (from, to) = period.window()?;
    attendance_repo::find_by_user_in_range(conn, user.id, from, to)
}

pub fn my_monthly_report(
    conn: &Connection,
    caller: Option<&Identity>,
    period: Period,
) -> AppResult<PeriodReport> {
    let user = auth::current_user(conn, caller)?;
    let (from, to) = period.window()?;
    let records = attendance_repo::find_by_user_in_range(conn, user.id, from, to)?;

    let summaries = summarize(&records, |_| Some(user.gender));
    Ok(PeriodReport {
        period,
        from,
        to,
        grand_total: grand_total(&summaries),
        summaries,
    })
}

/// Only for callers who lead a group or have disciples.
pub fn group_attendance_report(
    conn: &Connection,
    caller: Option<&Identity>,
    period: Period,
) -> AppResult<GroupAttendanceReport> {
    let user = auth::current_user(conn, caller)?;
    let disciples = user_repo::find_by_leader(conn, user.id)?;
    if disciples.is_empty() && group_repo::find_by_leader(conn, user.id)?.is_empty() {
        return Err(AppError::forbidden("only group leaders can view group reports"));
    }

    let (from, to) = period.window()?;

    let my_records = attendance_repo::find_by_user_in_range(conn, user.id, from, to)?;
    let my_total = my_records.iter().map(AttendanceRecord::total).sum();

    let genders: HashMap<Id<User>, Gender> = disciples.iter().map(|d| (d.id, d.gender)).collect();
    let mut group_records = Vec::new();
    let mut per_disciple = Vec::with_capacity(disciples.len());
    for disciple in &disciples {
        let records = attendance_repo::find_by_user_in_range(conn, disciple.id, from, to)?;
        per_disciple.push(DiscipleTotal {
            user_id: disciple.id,
            name: disciple.name.clone(),
            total: records.iter().map(AttendanceRecord::total).sum(),
        });
        group_records.extend(records);
    }

    let group = summarize(&group_records, |id| genders.get(&id).copied());
    let group_total = grand_total(&group);
    debug!(leader_id = %user.id, disciples = disciples.len(), records = group_records.len(), "group report");

    Ok(GroupAttendanceReport {
        period,
        from,
        to,
        disciples_total: group_total.total,
        group_total,
        group,
        my_total,
        per_disciple,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sunday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()
    }

    fn record(user_id: Id<User>, t: AttendanceType, attended: Option<bool>, count: i64) -> AttendanceRecord {
        AttendanceRecord::create(user_id, sunday(), t, attended, count, sunday().and_hms_opt(9, 0, 0).unwrap())
    }

    #[test]
    fn summarize_splits_by_owner_gender() {
        let man = Id::<User>::generate();
        let woman = Id::<User>::generate();
        let records = vec![
            record(man, AttendanceType::NuevosAsistentes, Some(true), 2),
            record(woman, AttendanceType::NuevosAsistentes, Some(false), 5),
            record(woman, AttendanceType::Reset, None, 1),
        ];

        let summaries = summarize(&records, |id| {
            if id == man { Some(Gender::Male) } else { Some(Gender::Female) }
        });

        assert_eq!(summaries.len(), 3);
        let nuevos = &summaries[0];
        assert_eq!(nuevos.records, 2);
        assert_eq!(nuevos.totals, GenderTotals { total: 8, male: 3, female: 5 });
        assert_eq!(summaries[1].totals.total, 1);
        assert_eq!(summaries[2].records, 0);
    }

    #[test]
    fn unknown_owner_counts_only_in_total() {
        let records = vec![record(Id::generate(), AttendanceType::Conferencia, None, 4)];
        let summaries = summarize(&records, |_| None);
        assert_eq!(summaries[2].totals, GenderTotals { total: 4, male: 0, female: 0 });
    }
}
