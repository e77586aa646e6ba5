pub mod models;

use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use log::{debug, info};

use crate::error::{LedgerError, Result};
use crate::schema::*;
use crate::utils;
use models::*;

const CREATE_TABLES: &str = include_str!("../../migrations/2018-06-01-000000_create_ledger/up.sql");

/// The interval of each kind a workstation currently has open.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OpenIntervals {
    pub activity_period: Option<ActivityPeriod>,
    pub work_run: Option<WorkRun>,
    pub work: Option<Work>,
}

pub struct Db {
    conn: SqliteConnection,
    clock: Box<dyn Fn() -> NaiveDateTime + Send>,
}

impl Db {
    pub fn connect(database_url: &str) -> Result<Self> {
        let mut conn = SqliteConnection::establish(database_url)?;
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;

        Ok(Self {
            conn,
            clock: Box::new(utils::now),
        })
    }

    /// Private database with the ledger tables in place.
    pub fn in_memory() -> Result<Self> {
        let mut db = Self::connect(":memory:")?;
        db.create_tables()?;
        Ok(db)
    }

    pub fn create_tables(&mut self) -> Result<()> {
        self.conn.batch_execute(CREATE_TABLES)?;
        Ok(())
    }

    pub fn set_clock(&mut self, clock: impl Fn() -> NaiveDateTime + Send + 'static) {
        self.clock = Box::new(clock);
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub fn find_batch_by_code(&mut self, code: &str) -> Result<Option<Batch>> {
        Ok(find_batch(&mut self.conn, code)?)
    }

    /// Points `code` at a new batch row. A previous row with the same code
    /// keeps its history but loses the code.
    pub fn associate_batch(&mut self, code: &str, name: &str) -> Result<Batch> {
        let created = self.now();
        self.conn.immediate_transaction(|conn| {
            let detached = diesel::update(batches::table.filter(batches::code.eq(code)))
                .set(batches::code.eq(None::<String>))
                .execute(conn)?;
            if detached > 0 {
                debug!("Detached {detached} batch(es) from code {code}");
            }

            let batch = diesel::insert_into(batches::table)
                .values(&NewBatch {
                    code: Some(code),
                    name,
                    created,
                })
                .returning(Batch::as_returning())
                .get_result(conn)?;

            info!("Associated batch {} with code {code}: {name}", batch.id);
            Ok(batch)
        })
    }

    pub fn ensure_workstation(&mut self, code: &str) -> Result<Workstation> {
        self.conn
            .immediate_transaction(|conn| ensure_workstation(conn, code))
    }

    pub fn start_activity_period(&mut self, code: &str, num_workers: i32) -> Result<()> {
        let now = self.now();
        self.conn.immediate_transaction(|conn| {
            let ws = ensure_workstation(conn, code)?;
            close_activity_period(conn, &ws, now)?;
            if num_workers <= 0 {
                return Ok(());
            }

            info!("Starting activity period on {code} with {num_workers} workers");
            let id = diesel::insert_into(activity_periods::table)
                .values(&NewActivityPeriod {
                    workstation_id: ws.id,
                    num_workers,
                    start: now,
                })
                .returning(activity_periods::id)
                .get_result::<i32>(conn)?;
            diesel::update(workstations::table.find(ws.id))
                .set(workstations::open_activity_period_id.eq(Some(id)))
                .execute(conn)?;
            Ok(())
        })
    }

    pub fn stop_activity_period(&mut self, code: &str) -> Result<()> {
        let now = self.now();
        self.conn.immediate_transaction(|conn| {
            let ws = ensure_workstation(conn, code)?;
            close_activity_period(conn, &ws, now)?;
            Ok(())
        })
    }

    /// Opens a work run; it is attributed to the batch of the open work, if any.
    pub fn start_work_run(&mut self, code: &str) -> Result<()> {
        let now = self.now();
        self.conn.immediate_transaction(|conn| {
            let ws = ensure_workstation(conn, code)?;
            close_work_run(conn, &ws, now)?;

            let batch_id = match ws.open_work_id {
                Some(work_id) => works::table
                    .find(work_id)
                    .select(works::batch_id)
                    .first::<i32>(conn)
                    .optional()?,
                None => None,
            };

            info!("Starting work run on {code}");
            let id = diesel::insert_into(work_runs::table)
                .values(&NewWorkRun {
                    workstation_id: ws.id,
                    batch_id,
                    start: now,
                })
                .returning(work_runs::id)
                .get_result::<i32>(conn)?;
            diesel::update(workstations::table.find(ws.id))
                .set(workstations::open_work_run_id.eq(Some(id)))
                .execute(conn)?;
            Ok(())
        })
    }

    pub fn stop_work_run(&mut self, code: &str) -> Result<()> {
        let now = self.now();
        self.conn.immediate_transaction(|conn| {
            let ws = ensure_workstation(conn, code)?;
            close_work_run(conn, &ws, now)?;
            Ok(())
        })
    }

    /// Fails with [`LedgerError::BatchNotFound`] before touching any interval
    /// when `batch_code` is unknown.
    pub fn start_work(&mut self, code: &str, batch_code: &str) -> Result<()> {
        let now = self.now();
        self.conn.immediate_transaction(|conn| {
            // an unknown batch also rolls back a workstation created here
            let ws = ensure_workstation(conn, code)?;
            let batch = find_batch(conn, batch_code)?
                .ok_or_else(|| LedgerError::BatchNotFound(batch_code.to_string()))?;
            close_work(conn, &ws, now)?;

            info!("Starting work on {code} for {batch_code}");
            let id = diesel::insert_into(works::table)
                .values(&NewWork {
                    workstation_id: ws.id,
                    batch_id: batch.id,
                    start: now,
                })
                .returning(works::id)
                .get_result::<i32>(conn)?;
            diesel::update(workstations::table.find(ws.id))
                .set(workstations::open_work_id.eq(Some(id)))
                .execute(conn)?;
            Ok(())
        })
    }

    pub fn stop_work(&mut self, code: &str) -> Result<()> {
        let now = self.now();
        self.conn.immediate_transaction(|conn| {
            let ws = ensure_workstation(conn, code)?;
            close_work(conn, &ws, now)?;
            Ok(())
        })
    }

    // ===============================================
    // read-only queries
    // ===============================================

    pub fn workstation(&mut self, code: &str) -> Result<Option<Workstation>> {
        Ok(find_workstation(&mut self.conn, code)?)
    }

    pub fn open_intervals(&mut self, code: &str) -> Result<OpenIntervals> {
        let Some(ws) = find_workstation(&mut self.conn, code)? else {
            return Ok(OpenIntervals::default());
        };

        let mut open = OpenIntervals::default();
        if let Some(id) = ws.open_activity_period_id {
            open.activity_period = activity_periods::table
                .find(id)
                .select(ActivityPeriod::as_select())
                .first(&mut self.conn)
                .optional()?;
        }
        if let Some(id) = ws.open_work_run_id {
            open.work_run = work_runs::table
                .find(id)
                .select(WorkRun::as_select())
                .first(&mut self.conn)
                .optional()?;
        }
        if let Some(id) = ws.open_work_id {
            open.work = works::table
                .find(id)
                .select(Work::as_select())
                .first(&mut self.conn)
                .optional()?;
        }
        Ok(open)
    }

    pub fn activity_periods(&mut self, code: &str) -> Result<Vec<ActivityPeriod>> {
        Ok(activity_periods::table
            .inner_join(workstations::table)
            .filter(workstations::code.eq(code))
            .order((activity_periods::start.asc(), activity_periods::id.asc()))
            .select(ActivityPeriod::as_select())
            .load(&mut self.conn)?)
    }

    pub fn work_runs(&mut self, code: &str) -> Result<Vec<WorkRun>> {
        Ok(work_runs::table
            .inner_join(workstations::table)
            .filter(workstations::code.eq(code))
            .order((work_runs::start.asc(), work_runs::id.asc()))
            .select(WorkRun::as_select())
            .load(&mut self.conn)?)
    }

    pub fn works(&mut self, code: &str) -> Result<Vec<Work>> {
        Ok(works::table
            .inner_join(workstations::table)
            .filter(workstations::code.eq(code))
            .order((works::start.asc(), works::id.asc()))
            .select(Work::as_select())
            .load(&mut self.conn)?)
    }

    pub fn batches(&mut self) -> Result<Vec<Batch>> {
        Ok(batches::table
            .order(batches::id.asc())
            .select(Batch::as_select())
            .load(&mut self.conn)?)
    }
}

fn find_batch(conn: &mut SqliteConnection, code: &str) -> QueryResult<Option<Batch>> {
    batches::table
        .filter(batches::code.eq(code))
        .select(Batch::as_select())
        .first(conn)
        .optional()
}

fn find_workstation(conn: &mut SqliteConnection, code: &str) -> QueryResult<Option<Workstation>> {
    workstations::table
        .filter(workstations::code.eq(code))
        .select(Workstation::as_select())
        .first(conn)
        .optional()
}

fn ensure_workstation(conn: &mut SqliteConnection, code: &str) -> Result<Workstation> {
    if let Some(ws) = find_workstation(conn, code)? {
        return Ok(ws);
    }

    match diesel::insert_into(workstations::table)
        .values(&NewWorkstation { code })
        .execute(conn)
    {
        Ok(_) => info!("Registered workstation {code}"),
        // a concurrent writer got there first
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            debug!("Workstation {code} registered concurrently")
        }
        Err(e) => return Err(e.into()),
    }

    Ok(workstations::table
        .filter(workstations::code.eq(code))
        .select(Workstation::as_select())
        .first(conn)?)
}

fn close_activity_period(
    conn: &mut SqliteConnection,
    ws: &Workstation,
    now: NaiveDateTime,
) -> QueryResult<()> {
    let Some(id) = ws.open_activity_period_id else {
        return Ok(());
    };

    info!("Stopping activity period {id} on {}", ws.code);
    diesel::update(
        activity_periods::table
            .find(id)
            .filter(activity_periods::stop.is_null()),
    )
    .set(activity_periods::stop.eq(Some(now)))
    .execute(conn)?;
    diesel::update(workstations::table.find(ws.id))
        .set(workstations::open_activity_period_id.eq(None::<i32>))
        .execute(conn)?;
    Ok(())
}

fn close_work_run(conn: &mut SqliteConnection, ws: &Workstation, now: NaiveDateTime) -> QueryResult<()> {
    let Some(id) = ws.open_work_run_id else {
        return Ok(());
    };

    info!("Stopping work run {id} on {}", ws.code);
    diesel::update(work_runs::table.find(id).filter(work_runs::stop.is_null()))
        .set(work_runs::stop.eq(Some(now)))
        .execute(conn)?;
    diesel::update(workstations::table.find(ws.id))
        .set(workstations::open_work_run_id.eq(None::<i32>))
        .execute(conn)?;
    Ok(())
}

fn close_work(conn: &mut SqliteConnection, ws: &Workstation, now: NaiveDateTime) -> QueryResult<()> {
    let Some(id) = ws.open_work_id else {
        return Ok(());
    };

    info!("Stopping work {id} on {}", ws.code);
    diesel::update(works::table.find(id).filter(works::stop.is_null()))
        .set(works::stop.eq(Some(now)))
        .execute(conn)?;
    diesel::update(workstations::table.find(ws.id))
        .set(workstations::open_work_id.eq(None::<i32>))
        .execute(conn)?;
    Ok(())
}
