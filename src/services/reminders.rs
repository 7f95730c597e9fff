use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::reminder::PendingReminder;
use crate::services::notifications::NotificationService;
use crate::services::storage::Storage;

const PENDING_KEY: &str = "scheduled_reminders";

/// Les timers sont imprécis sur de longues durées : au-delà de 24 h le rappel
/// est persisté puis réévalué au prochain démarrage.
pub const TIMER_HORIZON_MS: i64 = 24 * 60 * 60 * 1000;

static TIME_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Échéance passée: à envoyer immédiatement.
    Overdue,
    /// Dans les 24 h: un timer est armé.
    Timer,
    /// Au-delà: persisté pour le prochain passage.
    Deferred,
}

pub fn classify(delay_ms: i64) -> Disposition {
    if delay_ms <= 0 {
        Disposition::Overdue
    } else if delay_ms <= TIMER_HORIZON_MS {
        Disposition::Timer
    } else {
        Disposition::Deferred
    }
}

/// "18:00" -> (18, 0).
pub fn parse_time(value: &str) -> Result<(u32, u32)> {
    let invalid = || AppError::Validation(format!("heure invalide: '{value}' (attendu HH:MM)"));
    let re = TIME_PATTERN.as_ref().ok_or_else(invalid)?;
    let caps = re.captures(value.trim()).ok_or_else(invalid)?;
    let hour: u32 = caps[1].parse().map_err(|_| invalid())?;
    let minute: u32 = caps[2].parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

/// Next occurrence of `weekday` (0 = dimanche .. 6 = samedi) at hour:minute,
/// strictly after `now`.
pub fn next_weekly_occurrence(
    now: NaiveDateTime,
    weekday: u8,
    hour: u32,
    minute: u32,
) -> NaiveDateTime {
    let today = now.weekday().num_days_from_sunday() as i64;
    let ahead = (i64::from(weekday) + 7 - today) % 7;
    let date = now.date() + Duration::days(ahead);
    let candidate = date
        .and_hms_opt(hour, minute, 0)
        .unwrap_or_else(|| now + Duration::days(ahead));
    if candidate <= now {
        candidate + Duration::days(7)
    } else {
        candidate
    }
}

/// Timer-based reminder scheduling capped at a 24-hour horizon; anything
/// further out lives in the persisted pending list until the next start.
pub struct ReminderScheduler {
    storage: Storage,
    notifier: Arc<NotificationService>,
    timers: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl ReminderScheduler {
    pub fn new(storage: Storage, notifier: Arc<NotificationService>) -> Self {
        Self {
            storage,
            notifier,
            timers: Mutex::new(HashMap::new()),
        }
    }

    pub fn schedule(&self, when: DateTime<Utc>, title: &str, body: &str) -> Result<Uuid> {
        let delay_ms = when.timestamp_millis() - Utc::now().timestamp_millis();
        let id = Uuid::new_v4();
        match classify(delay_ms) {
            Disposition::Overdue => Err(AppError::Validation(
                "la date du rappel est déjà passée".into(),
            )),
            Disposition::Timer => {
                self.arm_timer(id, delay_ms, title.to_string(), body.to_string());
                Ok(id)
            }
            Disposition::Deferred => {
                let mut pending = self.pending();
                pending.push(PendingReminder {
                    id,
                    timestamp: when.timestamp_millis(),
                    title: title.to_string(),
                    body: body.to_string(),
                });
                self.persist(&pending);
                Ok(id)
            }
        }
    }

    /// Rappel de préparation, `hours_in_advance` heures avant le repas.
    pub fn schedule_meal_preparation(
        &self,
        meal_date: DateTime<Utc>,
        meal_name: &str,
        hours_in_advance: i64,
    ) -> Result<Uuid> {
        let when = meal_date - Duration::hours(hours_in_advance);
        self.schedule(
            when,
            &format!("Préparation du repas : {meal_name}"),
            &format!(
                "N'oubliez pas de préparer {meal_name} pour {}.",
                meal_date.with_timezone(&Local).format("%H:%M")
            ),
        )
    }

    /// Rappel hebdomadaire de planification des menus.
    pub fn schedule_weekly_menu_reminder(&self, weekday: u8, time: &str) -> Result<Uuid> {
        let (hour, minute) = parse_time(time)?;
        let local_now = Local::now().naive_local();
        let naive = next_weekly_occurrence(local_now, weekday % 7, hour, minute);
        let when = Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc());
        self.schedule(
            when,
            "Planification des repas",
            "Avez-vous planifié vos repas pour la semaine prochaine?",
        )
    }

    /// Cancels a live timer immediately, or removes a not-yet-armed entry from
    /// the persisted list.
    pub fn cancel(&self, id: Uuid) -> bool {
        if let Some(handle) = self.lock_timers().remove(&id) {
            handle.abort();
            return true;
        }
        let mut pending = self.pending();
        let before = pending.len();
        pending.retain(|r| r.id != id);
        if pending.len() < before {
            self.persist(&pending);
            true
        } else {
            false
        }
    }

    /// Startup pass over the persisted list: overdue reminders fire now,
    /// those due within 24 h get a timer, the rest stay persisted.
    pub fn check_stored(&self) {
        let now = Utc::now().timestamp_millis();
        let mut kept = Vec::new();
        for reminder in self.pending() {
            match classify(reminder.timestamp - now) {
                Disposition::Overdue => {
                    let notifier = Arc::clone(&self.notifier);
                    tokio::spawn(async move {
                        if let Err(e) = notifier.send(&reminder.title, &reminder.body).await {
                            tracing::warn!("Envoi du rappel en retard impossible: {}", e);
                        }
                    });
                }
                Disposition::Timer => {
                    self.arm_timer(
                        reminder.id,
                        reminder.timestamp - now,
                        reminder.title,
                        reminder.body,
                    );
                }
                Disposition::Deferred => kept.push(reminder),
            }
        }
        self.persist(&kept);
    }

    pub fn pending(&self) -> Vec<PendingReminder> {
        self.storage.read(PENDING_KEY).unwrap_or_default()
    }

    pub fn armed_count(&self) -> usize {
        self.lock_timers().len()
    }

    fn arm_timer(&self, id: Uuid, delay_ms: i64, title: String, body: String) {
        let notifier = Arc::clone(&self.notifier);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms.max(0) as u64)).await;
            if let Err(e) = notifier.send(&title, &body).await {
                tracing::warn!("Envoi du rappel impossible: {}", e);
            }
        });
        self.lock_timers().insert(id, handle);
    }

    fn persist(&self, pending: &[PendingReminder]) {
        if let Err(e) = self.storage.write(PENDING_KEY, &pending) {
            tracing::warn!("Sauvegarde des rappels impossible: {}", e);
        }
    }

    fn lock_timers(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, JoinHandle<()>>> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }
}
