//! `PostgreSQL` store implementation.
//!
//! All availability checks are single conditional `UPDATE` statements whose
//! affected-row count reports whether the transition happened; there is no
//! read-then-write anywhere in this module. Enum columns are stored as text
//! via the `as_str`/`parse` pairs on the domain enums.

use crate::error::{DomainError, Result};
use crate::store::{
    BookingStore, KitStore, PackageStore, PlotStore, StaffStore, WaqafStore,
};
use crate::types::{
    Booking, BookingId, BookingStatus, Deceased, FuneralKit, Gender, KitId, KitReservation,
    KitType, KitUsageReason, KitUsageRecord, Money, Package, PackageId, Payment, PaymentStatus,
    Plot, PlotId, PlotStatus, Staff, StaffAssignment, StaffId, StaffRole, UserId, WaqafId,
    WaqafRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// sqlx-backed implementation of the full store surface.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] if the pool cannot be established.
    pub async fn connect(config: &crate::config::DatabaseConfig) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout))
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("migration failed: {e}")))?;
        Ok(())
    }
}

fn db_u32(value: i32, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| DomainError::storage(format!("negative {what} in database")))
}

fn to_db_u32(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| DomainError::storage("quantity out of range"))
}

fn db_money(value: i64) -> Result<Money> {
    u64::try_from(value)
        .map(Money::from_cents)
        .map_err(|_| DomainError::storage("negative amount in database"))
}

fn to_db_money(value: Money) -> Result<i64> {
    i64::try_from(value.cents()).map_err(|_| DomainError::storage("amount out of range"))
}

fn map_plot(row: &PgRow) -> Result<Plot> {
    Ok(Plot {
        id: PlotId::from_uuid(row.try_get("id")?),
        code: row.try_get("code")?,
        row: db_u32(row.try_get("grid_row")?, "grid row")?,
        column: db_u32(row.try_get("grid_column")?, "grid column")?,
        status: PlotStatus::parse(&row.try_get::<String, _>("status")?)?,
        booking_id: row
            .try_get::<Option<Uuid>, _>("booking_id")?
            .map(BookingId::from_uuid),
    })
}

fn map_staff(row: &PgRow) -> Result<Staff> {
    Ok(Staff {
        id: StaffId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        role: StaffRole::parse(&row.try_get::<String, _>("role")?)?,
        active: row.try_get("active")?,
    })
}

fn map_kit(row: &PgRow) -> Result<FuneralKit> {
    Ok(FuneralKit {
        id: KitId::from_uuid(row.try_get("id")?),
        kit_type: KitType::parse(&row.try_get::<String, _>("kit_type")?)?,
        available: db_u32(row.try_get("available")?, "available quantity")?,
        total_used: db_u32(row.try_get("total_used")?, "used quantity")?,
    })
}

fn map_booking(row: &PgRow) -> Result<Booking> {
    let Json(document_urls) = row.try_get::<Json<Vec<String>>, _>("document_urls")?;
    Ok(Booking {
        id: BookingId::from_uuid(row.try_get("id")?),
        requester: UserId::from_uuid(row.try_get("requester")?),
        plot_id: PlotId::from_uuid(row.try_get("plot_id")?),
        deceased: Deceased {
            name: row.try_get("deceased_name")?,
            ic_number: row.try_get("deceased_ic")?,
            gender: Gender::parse(&row.try_get::<String, _>("deceased_gender")?)?,
        },
        scheduled_at: row.try_get("scheduled_at")?,
        total: db_money(row.try_get("total")?)?,
        status: BookingStatus::parse(&row.try_get::<String, _>("status")?)?,
        payment: Payment {
            status: PaymentStatus::parse(&row.try_get::<String, _>("payment_status")?)?,
            receipt_url: row.try_get("receipt_url")?,
            deadline: row.try_get("payment_deadline")?,
            submitted_at: row.try_get("payment_submitted_at")?,
            verified_by: row
                .try_get::<Option<Uuid>, _>("payment_verified_by")?
                .map(UserId::from_uuid),
            verified_at: row.try_get("payment_verified_at")?,
        },
        document_urls,
        rejection_reason: row.try_get("rejection_reason")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_assignment(row: &PgRow) -> Result<StaffAssignment> {
    Ok(StaffAssignment {
        booking_id: BookingId::from_uuid(row.try_get("booking_id")?),
        role: StaffRole::parse(&row.try_get::<String, _>("role")?)?,
        staff_id: row
            .try_get::<Option<Uuid>, _>("staff_id")?
            .map(StaffId::from_uuid),
        assigned_by: UserId::from_uuid(row.try_get("assigned_by")?),
        assigned_at: row.try_get("assigned_at")?,
    })
}

fn map_package(row: &PgRow) -> Result<Package> {
    Ok(Package {
        id: PackageId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: db_money(row.try_get("price")?)?,
        active: row.try_get("active")?,
    })
}

#[async_trait]
impl PlotStore for PostgresStore {
    async fn insert_plot(&self, plot: &Plot) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO plots (id, code, grid_row, grid_column, status, booking_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(plot.id.as_uuid())
        .bind(&plot.code)
        .bind(to_db_u32(plot.row)?)
        .bind(to_db_u32(plot.column)?)
        .bind(plot.status.as_str())
        .bind(plot.booking_id.map(|b| *b.as_uuid()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn plot(&self, id: PlotId) -> Result<Option<Plot>> {
        let row = sqlx::query("SELECT * FROM plots WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_plot).transpose()
    }

    async fn plots(&self) -> Result<Vec<Plot>> {
        let rows = sqlx::query("SELECT * FROM plots ORDER BY grid_row, grid_column")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_plot).collect()
    }

    async fn try_reserve_plot(&self, id: PlotId, booking: BookingId) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE plots SET status = 'reserved', booking_id = $2
            WHERE id = $1 AND status = 'available'
            ",
        )
        .bind(id.as_uuid())
        .bind(booking.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn try_finalize_plot(&self, id: PlotId, booking: BookingId) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE plots SET status = 'occupied'
            WHERE id = $1 AND status = 'reserved' AND booking_id = $2
            ",
        )
        .bind(id.as_uuid())
        .bind(booking.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_plot(&self, id: PlotId) -> Result<()> {
        sqlx::query("UPDATE plots SET status = 'available', booking_id = NULL WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StaffStore for PostgresStore {
    async fn insert_staff(&self, staff: &Staff) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO staff (id, name, phone, role, active)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(staff.id.as_uuid())
        .bind(&staff.name)
        .bind(&staff.phone)
        .bind(staff.role.as_str())
        .bind(staff.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn staff(&self, id: StaffId) -> Result<Option<Staff>> {
        let row = sqlx::query("SELECT * FROM staff WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_staff).transpose()
    }

    async fn active_staff(&self, role: StaffRole) -> Result<Vec<Staff>> {
        let rows = sqlx::query("SELECT * FROM staff WHERE role = $1 AND active ORDER BY name")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_staff).collect()
    }

    async fn all_staff(&self) -> Result<Vec<Staff>> {
        let rows = sqlx::query("SELECT * FROM staff ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_staff).collect()
    }

    async fn update_staff(&self, staff: &Staff) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE staff SET name = $2, phone = $3, role = $4, active = $5
            WHERE id = $1
            ",
        )
        .bind(staff.id.as_uuid())
        .bind(&staff.name)
        .bind(&staff.phone)
        .bind(staff.role.as_str())
        .bind(staff.active)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("staff", staff.id));
        }
        Ok(())
    }

    async fn staff_is_referenced(&self, id: StaffId) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM staff_assignments WHERE staff_id = $1)",
        )
        .bind(id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn delete_staff(&self, id: StaffId) -> Result<()> {
        sqlx::query("DELETE FROM staff WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn busy_staff(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> Result<Vec<StaffId>> {
        let rows = sqlx::query(
            r"
            SELECT sa.staff_id
            FROM staff_assignments sa
            JOIN bookings b ON b.id = sa.booking_id
            WHERE sa.staff_id IS NOT NULL
              AND b.scheduled_at >= $1 AND b.scheduled_at < $2
              AND b.status IN ('pending', 'approved', 'confirmed')
              AND ($3::UUID IS NULL OR sa.booking_id <> $3)
            ",
        )
        .bind(start)
        .bind(end)
        .bind(exclude.map(|b| *b.as_uuid()))
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| Ok(StaffId::from_uuid(row.try_get("staff_id")?)))
            .collect()
    }

    async fn replace_assignments(
        &self,
        booking: BookingId,
        rows: &[StaffAssignment],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM staff_assignments WHERE booking_id = $1")
            .bind(booking.as_uuid())
            .execute(&mut *tx)
            .await?;
        for assignment in rows {
            sqlx::query(
                r"
                INSERT INTO staff_assignments (booking_id, role, staff_id, assigned_by, assigned_at)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(assignment.booking_id.as_uuid())
            .bind(assignment.role.as_str())
            .bind(assignment.staff_id.map(|s| *s.as_uuid()))
            .bind(assignment.assigned_by.as_uuid())
            .bind(assignment.assigned_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn assignments_for(&self, booking: BookingId) -> Result<Vec<StaffAssignment>> {
        let rows = sqlx::query("SELECT * FROM staff_assignments WHERE booking_id = $1")
            .bind(booking.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_assignment).collect()
    }

    async fn delete_assignments(&self, booking: BookingId) -> Result<()> {
        sqlx::query("DELETE FROM staff_assignments WHERE booking_id = $1")
            .bind(booking.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl KitStore for PostgresStore {
    async fn insert_kit(&self, kit: &FuneralKit) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO funeral_kits (id, kit_type, available, total_used)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(kit.id.as_uuid())
        .bind(kit.kit_type.as_str())
        .bind(to_db_u32(kit.available)?)
        .bind(to_db_u32(kit.total_used)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn kit(&self, id: KitId) -> Result<Option<FuneralKit>> {
        let row = sqlx::query("SELECT * FROM funeral_kits WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_kit).transpose()
    }

    async fn kit_by_type(&self, kit_type: KitType) -> Result<Option<FuneralKit>> {
        let row = sqlx::query("SELECT * FROM funeral_kits WHERE kit_type = $1")
            .bind(kit_type.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_kit).transpose()
    }

    async fn kits(&self) -> Result<Vec<FuneralKit>> {
        let rows = sqlx::query("SELECT * FROM funeral_kits ORDER BY kit_type")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_kit).collect()
    }

    async fn try_consume_kit(&self, id: KitId, quantity: u32) -> Result<bool> {
        let quantity = to_db_u32(quantity)?;
        let result = sqlx::query(
            r"
            UPDATE funeral_kits
            SET available = available - $2, total_used = total_used + $2
            WHERE id = $1 AND available >= $2
            ",
        )
        .bind(id.as_uuid())
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn restore_kit(&self, id: KitId, quantity: u32) -> Result<()> {
        sqlx::query(
            r"
            UPDATE funeral_kits
            SET available = available + $2, total_used = GREATEST(total_used - $2, 0)
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(to_db_u32(quantity)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn try_adjust_kit(&self, id: KitId, delta: i64) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE funeral_kits
            SET available = available + $2,
                total_used = total_used + GREATEST(-$2, 0)
            WHERE id = $1 AND available + $2 >= 0
            ",
        )
        .bind(id.as_uuid())
        .bind(delta)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_kit_reservation(&self, reservation: &KitReservation) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO booking_kit_reservations (booking_id, kit_id, quantity)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(reservation.booking_id.as_uuid())
        .bind(reservation.kit_id.as_uuid())
        .bind(to_db_u32(reservation.quantity)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn kit_reservation(
        &self,
        booking: BookingId,
        kit: KitId,
    ) -> Result<Option<KitReservation>> {
        let row = sqlx::query(
            "SELECT * FROM booking_kit_reservations WHERE booking_id = $1 AND kit_id = $2",
        )
        .bind(booking.as_uuid())
        .bind(kit.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| {
            Ok(KitReservation {
                booking_id: BookingId::from_uuid(row.try_get("booking_id")?),
                kit_id: KitId::from_uuid(row.try_get("kit_id")?),
                quantity: db_u32(row.try_get("quantity")?, "reserved quantity")?,
            })
        })
        .transpose()
    }

    async fn kit_reservations_for(&self, booking: BookingId) -> Result<Vec<KitReservation>> {
        let rows = sqlx::query("SELECT * FROM booking_kit_reservations WHERE booking_id = $1")
            .bind(booking.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(KitReservation {
                    booking_id: BookingId::from_uuid(row.try_get("booking_id")?),
                    kit_id: KitId::from_uuid(row.try_get("kit_id")?),
                    quantity: db_u32(row.try_get("quantity")?, "reserved quantity")?,
                })
            })
            .collect()
    }

    async fn delete_kit_reservation(&self, booking: BookingId, kit: KitId) -> Result<()> {
        sqlx::query(
            "DELETE FROM booking_kit_reservations WHERE booking_id = $1 AND kit_id = $2",
        )
        .bind(booking.as_uuid())
        .bind(kit.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_kit_reservations(&self, booking: BookingId) -> Result<()> {
        sqlx::query("DELETE FROM booking_kit_reservations WHERE booking_id = $1")
            .bind(booking.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_kit_usage(&self, record: &KitUsageRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO kit_usage_records (kit_id, booking_id, delta, reason, actor, note, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(record.kit_id.as_uuid())
        .bind(record.booking_id.map(|b| *b.as_uuid()))
        .bind(record.delta)
        .bind(record.reason.as_str())
        .bind(record.actor.as_uuid())
        .bind(&record.note)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn kit_usage_for(&self, kit: KitId) -> Result<Vec<KitUsageRecord>> {
        let rows = sqlx::query("SELECT * FROM kit_usage_records WHERE kit_id = $1 ORDER BY id")
            .bind(kit.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(KitUsageRecord {
                    kit_id: KitId::from_uuid(row.try_get("kit_id")?),
                    booking_id: row
                        .try_get::<Option<Uuid>, _>("booking_id")?
                        .map(BookingId::from_uuid),
                    delta: row.try_get("delta")?,
                    reason: KitUsageReason::parse(&row.try_get::<String, _>("reason")?)?,
                    actor: UserId::from_uuid(row.try_get("actor")?),
                    note: row.try_get("note")?,
                    recorded_at: row.try_get("recorded_at")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl BookingStore for PostgresStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO bookings (
                id, requester, plot_id, deceased_name, deceased_ic, deceased_gender,
                scheduled_at, total, status, payment_status, receipt_url,
                payment_deadline, payment_submitted_at, payment_verified_by,
                payment_verified_at, document_urls, rejection_reason, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19
            )
            ",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.requester.as_uuid())
        .bind(booking.plot_id.as_uuid())
        .bind(&booking.deceased.name)
        .bind(&booking.deceased.ic_number)
        .bind(booking.deceased.gender.as_str())
        .bind(booking.scheduled_at)
        .bind(to_db_money(booking.total)?)
        .bind(booking.status.as_str())
        .bind(booking.payment.status.as_str())
        .bind(&booking.payment.receipt_url)
        .bind(booking.payment.deadline)
        .bind(booking.payment.submitted_at)
        .bind(booking.payment.verified_by.map(|u| *u.as_uuid()))
        .bind(booking.payment.verified_at)
        .bind(Json(&booking.document_urls))
        .bind(&booking.rejection_reason)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn booking(&self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_booking).transpose()
    }

    async fn update_booking(&self, booking: &Booking) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE bookings SET
                status = $2, payment_status = $3, receipt_url = $4,
                payment_deadline = $5, payment_submitted_at = $6,
                payment_verified_by = $7, payment_verified_at = $8,
                rejection_reason = $9, updated_at = $10
            WHERE id = $1
            ",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.status.as_str())
        .bind(booking.payment.status.as_str())
        .bind(&booking.payment.receipt_url)
        .bind(booking.payment.deadline)
        .bind(booking.payment.submitted_at)
        .bind(booking.payment.verified_by.map(|u| *u.as_uuid()))
        .bind(booking.payment.verified_at)
        .bind(&booking.rejection_reason)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("booking", booking.id));
        }
        Ok(())
    }

    async fn delete_booking(&self, id: BookingId) -> Result<()> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn bookings_for(&self, user: UserId) -> Result<Vec<Booking>> {
        let rows = sqlx::query(
            "SELECT * FROM bookings WHERE requester = $1 ORDER BY created_at DESC",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_booking).collect()
    }

    async fn bookings(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM bookings
            WHERE $1::TEXT IS NULL OR status = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_booking).collect()
    }

    async fn insert_booking_packages(
        &self,
        booking: BookingId,
        packages: &[PackageId],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for package in packages {
            sqlx::query(
                "INSERT INTO booking_packages (booking_id, package_id) VALUES ($1, $2)",
            )
            .bind(booking.as_uuid())
            .bind(package.as_uuid())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn packages_for_booking(&self, booking: BookingId) -> Result<Vec<PackageId>> {
        let rows = sqlx::query("SELECT package_id FROM booking_packages WHERE booking_id = $1")
            .bind(booking.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| Ok(PackageId::from_uuid(row.try_get("package_id")?)))
            .collect()
    }
}

#[async_trait]
impl PackageStore for PostgresStore {
    async fn insert_package(&self, package: &Package) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO packages (id, name, description, price, active)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(package.id.as_uuid())
        .bind(&package.name)
        .bind(&package.description)
        .bind(to_db_money(package.price)?)
        .bind(package.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn package(&self, id: PackageId) -> Result<Option<Package>> {
        let row = sqlx::query("SELECT * FROM packages WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_package).transpose()
    }

    async fn packages(&self, only_active: bool) -> Result<Vec<Package>> {
        let rows = sqlx::query(
            "SELECT * FROM packages WHERE NOT $1 OR active ORDER BY name",
        )
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_package).collect()
    }

    async fn update_package(&self, package: &Package) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE packages SET name = $2, description = $3, price = $4, active = $5
            WHERE id = $1
            ",
        )
        .bind(package.id.as_uuid())
        .bind(&package.name)
        .bind(&package.description)
        .bind(to_db_money(package.price)?)
        .bind(package.active)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("package", package.id));
        }
        Ok(())
    }
}

#[async_trait]
impl WaqafStore for PostgresStore {
    async fn insert_waqaf(&self, record: &WaqafRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO waqaf_records (id, donor_name, amount, purpose, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(record.id.as_uuid())
        .bind(&record.donor_name)
        .bind(to_db_money(record.amount)?)
        .bind(&record.purpose)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn waqaf_records(&self) -> Result<Vec<WaqafRecord>> {
        let rows = sqlx::query("SELECT * FROM waqaf_records ORDER BY recorded_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(WaqafRecord {
                    id: WaqafId::from_uuid(row.try_get("id")?),
                    donor_name: row.try_get("donor_name")?,
                    amount: db_money(row.try_get("amount")?)?,
                    purpose: row.try_get("purpose")?,
                    recorded_at: row.try_get("recorded_at")?,
                })
            })
            .collect()
    }
}
