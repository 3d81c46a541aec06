//! Reads and writes against the `transacciones` table.

use chrono::{DateTime, Duration, Months, NaiveDate, TimeZone, Utc};
use lana_core::{NewTransaction, Transaction};
use tracing::instrument;
use uuid::Uuid;

use crate::client::{Query, StoreClient, StoreResult};

const TABLE: &str = "transacciones";

/// Matched by `neq` to hit every row (the service requires a filter on
/// bulk deletes).
pub(crate) const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Dashboard time window selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vista {
    /// Last 7 days.
    Diaria,
    /// Last 28 days.
    Semanal,
    /// Last 12 months.
    Mensual,
    /// Explicit `[fecha_inicio, fecha_fin]` range.
    Personalizada,
}

impl Vista {
    /// Parse the `vista` query parameter; anything unknown or absent is
    /// `mensual`.
    #[must_use]
    pub fn parse(param: Option<&str>) -> Self {
        match param {
            Some("diaria") => Self::Diaria,
            Some("semanal") => Self::Semanal,
            Some("personalizada") => Self::Personalizada,
            _ => Self::Mensual,
        }
    }

    /// Wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diaria => "diaria",
            Self::Semanal => "semanal",
            Self::Mensual => "mensual",
            Self::Personalizada => "personalizada",
        }
    }
}

/// An inclusive query window; `end` is open-ended when `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    /// Lower bound (`fecha >= start`).
    pub start: DateTime<Utc>,
    /// Upper bound (`fecha <= end`), custom ranges only.
    pub end: Option<DateTime<Utc>>,
}

/// Compute the window a vista covers, anchored at `now`.
///
/// `personalizada` spans `inicio` at midnight through `fin` at 23:59:59;
/// with no usable `inicio` it degrades to the 12-month default.
#[must_use]
pub fn window_for(
    vista: Vista,
    now: DateTime<Utc>,
    inicio: Option<NaiveDate>,
    fin: Option<NaiveDate>,
) -> DateWindow {
    let twelve_months_back = now
        .checked_sub_months(Months::new(12))
        .unwrap_or_else(|| now - Duration::days(365));

    match vista {
        Vista::Diaria => DateWindow {
            start: now - Duration::days(7),
            end: None,
        },
        Vista::Semanal => DateWindow {
            start: now - Duration::days(28),
            end: None,
        },
        Vista::Mensual => DateWindow {
            start: twelve_months_back,
            end: None,
        },
        Vista::Personalizada => {
            let start = inicio
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt));
            match start {
                Some(start) => DateWindow {
                    start,
                    end: fin
                        .and_then(|d| d.and_hms_opt(23, 59, 59))
                        .map(|dt| Utc.from_utc_datetime(&dt)),
                },
                None => DateWindow {
                    start: twelve_months_back,
                    end: None,
                },
            }
        }
    }
}

impl StoreClient {
    /// The user's transactions inside `window`, newest first, capped at
    /// 500 rows.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        window: DateWindow,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<Transaction>> {
        let mut query = Query::select_all()
            .eq("usuario_id", user_id)
            .gte("fecha", window.start.to_rfc3339());
        if let Some(end) = window.end {
            query = query.lte("fecha", end.to_rfc3339());
        }
        let query = query.order("fecha", true).limit(500);
        self.select(TABLE, &query, access_token).await
    }

    /// Every transaction the user owns, oldest first. Used by export.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn list_all_user_transactions(
        &self,
        user_id: Uuid,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<Transaction>> {
        let query = Query::select_all()
            .eq("usuario_id", user_id)
            .order("fecha", false);
        self.select(TABLE, &query, access_token).await
    }

    /// Insert transaction rows, returning the created rows.
    #[instrument(skip_all, fields(count = rows.len()))]
    pub async fn insert_transactions(
        &self,
        rows: &[NewTransaction],
        access_token: Option<&str>,
    ) -> StoreResult<Vec<Transaction>> {
        self.insert(TABLE, rows, access_token).await
    }

    /// The user's savings movements (category `Ahorro/inversión`), newest
    /// first, capped at 200 rows.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn list_savings_movements(
        &self,
        user_id: Uuid,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<Transaction>> {
        let query = Query::select_all()
            .eq("usuario_id", user_id)
            .eq("categoria", lana_core::categories::SAVINGS_CATEGORY)
            .order("fecha", true)
            .limit(200);
        self.select(TABLE, &query, access_token).await
    }

    /// Insert materialized recurring-charge rows. Each row carries
    /// `cargo_id` + `fecha_cargo`; the conflict clause makes a same-day
    /// re-run a no-op, and only newly created rows come back.
    #[instrument(skip_all, fields(count = rows.len()))]
    pub async fn insert_materialized_charges(
        &self,
        rows: &[NewTransaction],
        access_token: Option<&str>,
    ) -> StoreResult<Vec<Transaction>> {
        self.insert_ignore_duplicates(TABLE, rows, "cargo_id,fecha_cargo", access_token)
            .await
    }

    /// Delete the user's transactions, including ownerless rows written
    /// by sessionless inserts.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn delete_user_transactions(
        &self,
        user_id: Uuid,
        access_token: Option<&str>,
    ) -> StoreResult<()> {
        let query =
            Query::default().or(&format!("usuario_id.eq.{user_id},usuario_id.is.null"));
        self.delete(TABLE, &query, access_token).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StoreConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> StoreClient {
        StoreClient::new(StoreConfig {
            base_url: server.uri(),
            anon_key: "anon-key".into(),
        })
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    // ── Vista parsing / windows ──────────────────────────────────────────

    #[test]
    fn vista_parses_known_values_and_defaults_to_mensual() {
        assert_eq!(Vista::parse(Some("diaria")), Vista::Diaria);
        assert_eq!(Vista::parse(Some("semanal")), Vista::Semanal);
        assert_eq!(Vista::parse(Some("personalizada")), Vista::Personalizada);
        assert_eq!(Vista::parse(Some("mensual")), Vista::Mensual);
        assert_eq!(Vista::parse(Some("trimestral")), Vista::Mensual);
        assert_eq!(Vista::parse(None), Vista::Mensual);
    }

    #[test]
    fn diaria_covers_last_seven_days() {
        let now = at("2025-06-15T12:00:00Z");
        let window = window_for(Vista::Diaria, now, None, None);
        assert_eq!(window.start, at("2025-06-08T12:00:00Z"));
        assert!(window.end.is_none());
    }

    #[test]
    fn semanal_covers_last_twenty_eight_days() {
        let now = at("2025-06-15T12:00:00Z");
        let window = window_for(Vista::Semanal, now, None, None);
        assert_eq!(window.start, at("2025-05-18T12:00:00Z"));
    }

    #[test]
    fn mensual_covers_last_twelve_months() {
        let now = at("2025-06-15T12:00:00Z");
        let window = window_for(Vista::Mensual, now, None, None);
        assert_eq!(window.start, at("2024-06-15T12:00:00Z"));
    }

    #[test]
    fn personalizada_spans_full_days() {
        let now = at("2025-06-15T12:00:00Z");
        let window = window_for(
            Vista::Personalizada,
            now,
            Some(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
            Some(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()),
        );
        assert_eq!(window.start, at("2025-03-01T00:00:00Z"));
        assert_eq!(window.end, Some(at("2025-03-31T23:59:59Z")));
    }

    #[test]
    fn personalizada_without_start_degrades_to_mensual() {
        let now = at("2025-06-15T12:00:00Z");
        let window = window_for(Vista::Personalizada, now, None, None);
        assert_eq!(window.start, at("2024-06-15T12:00:00Z"));
        assert!(window.end.is_none());
    }

    // ── Query shapes ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn list_filters_scopes_and_orders() {
        let server = MockServer::start().await;
        let user_id: Uuid = "5a8d2f1e-3c4b-4a5d-9e6f-7a8b9c0d1e2f".parse().unwrap();
        Mock::given(method("GET"))
            .and(path("/rest/v1/transacciones"))
            .and(query_param("usuario_id", format!("eq.{user_id}")))
            .and(query_param("order", "fecha.desc"))
            .and(query_param("limit", "500"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let window = window_for(Vista::Diaria, Utc::now(), None, None);
        let rows = client_for(&server)
            .list_transactions(user_id, window, Some("tok"))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn savings_movements_filter_by_category() {
        let server = MockServer::start().await;
        let user_id = Uuid::nil();
        Mock::given(method("GET"))
            .and(path("/rest/v1/transacciones"))
            .and(query_param("categoria", "eq.Ahorro/inversión"))
            .and(query_param("limit", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let rows = client_for(&server)
            .list_savings_movements(user_id, Some("tok"))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn reset_delete_includes_ownerless_rows() {
        let server = MockServer::start().await;
        let user_id: Uuid = "5a8d2f1e-3c4b-4a5d-9e6f-7a8b9c0d1e2f".parse().unwrap();
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/transacciones"))
            .and(query_param(
                "or",
                format!("(usuario_id.eq.{user_id},usuario_id.is.null)"),
            ))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client_for(&server)
            .delete_user_transactions(user_id, Some("tok"))
            .await
            .unwrap();
    }
}
