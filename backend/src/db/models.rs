use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::*;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = workstations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Workstation {
    pub id: i32,
    pub code: String, // unique, key
    pub open_activity_period_id: Option<i32>,
    pub open_work_run_id: Option<i32>,
    pub open_work_id: Option<i32>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = workstations)]
pub struct NewWorkstation<'a> {
    pub code: &'a str,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = batches)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Batch {
    pub id: i32,
    pub code: Option<String>, // None once detached by a newer association
    pub name: String,
    pub created: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = batches)]
pub struct NewBatch<'a> {
    pub code: Option<&'a str>,
    pub name: &'a str,
    pub created: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = activity_periods)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ActivityPeriod {
    pub id: i32,
    pub workstation_id: i32,
    pub num_workers: i32,
    pub start: NaiveDateTime,
    pub stop: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = activity_periods)]
pub struct NewActivityPeriod {
    pub workstation_id: i32,
    pub num_workers: i32,
    pub start: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = work_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkRun {
    pub id: i32,
    pub workstation_id: i32,
    pub batch_id: Option<i32>,
    pub start: NaiveDateTime,
    pub stop: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = work_runs)]
pub struct NewWorkRun {
    pub workstation_id: i32,
    pub batch_id: Option<i32>,
    pub start: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = works)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Work {
    pub id: i32,
    pub workstation_id: i32,
    pub batch_id: i32,
    pub start: NaiveDateTime,
    pub stop: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = works)]
pub struct NewWork {
    pub workstation_id: i32,
    pub batch_id: i32,
    pub start: NaiveDateTime,
}
