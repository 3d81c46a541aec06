//! Transaction rows as stored in the hosted `transacciones` table.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a transaction is money going out or coming in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// An expense.
    Gasto,
    /// An income.
    Ingreso,
}

impl TransactionKind {
    /// Wire value (`"gasto"` / `"ingreso"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gasto => "gasto",
            Self::Ingreso => "ingreso",
        }
    }

    /// Capitalized label used in confirmation messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Gasto => "Gasto",
            Self::Ingreso => "Ingreso",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a transaction was paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash.
    Efectivo,
    /// Card.
    Tarjeta,
    /// Bank transfer.
    Transferencia,
}

impl PaymentMethod {
    /// Wire value (the capitalized Spanish name).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Efectivo => "Efectivo",
            Self::Tarjeta => "Tarjeta",
            Self::Transferencia => "Transferencia",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::Efectivo
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted transaction row.
///
/// The store assigns `id` and `created_at`; everything else is written by
/// this application. `usuario_id` is null for rows inserted without a
/// session (assistant chat, recurring materializer).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// Row id (store-assigned).
    pub id: Uuid,
    /// Transaction timestamp.
    pub fecha: DateTime<Utc>,
    /// Expense or income.
    pub tipo: TransactionKind,
    /// Positive amount in MXN.
    pub monto: f64,
    /// Category (constrained per kind, see [`crate::categories`]).
    pub categoria: String,
    /// Short concept line.
    #[serde(default)]
    pub concepto: Option<String>,
    /// Free-text note.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Payment method.
    #[serde(default)]
    pub metodo_pago: PaymentMethod,
    /// Label of whoever recorded the transaction.
    #[serde(default)]
    pub registrado_por: Option<String>,
    /// Receipt image URL, if a ticket was uploaded.
    #[serde(default)]
    pub foto_url: Option<String>,
    /// Linked savings goal, if this is an aporte/retiro.
    #[serde(default)]
    pub objetivo_id: Option<Uuid>,
    /// Owning user (null for session-less inserts).
    #[serde(default)]
    pub usuario_id: Option<Uuid>,
    /// Row creation time (store-assigned).
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A transaction row to insert.
///
/// Optional fields are omitted from the JSON body entirely so the store
/// fills its column defaults. `fecha_hora` exists only for the non-streaming
/// chat path, which historically wrote that column instead of `fecha`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Expense or income.
    pub tipo: TransactionKind,
    /// Positive amount in MXN.
    pub monto: f64,
    /// Category.
    pub categoria: String,
    /// Transaction timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha: Option<DateTime<Utc>>,
    /// Legacy timestamp column written by the non-streaming chat endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_hora: Option<DateTime<Utc>>,
    /// Short concept line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concepto: Option<String>,
    /// Free-text note.
    pub descripcion: Option<String>,
    /// Payment method.
    pub metodo_pago: PaymentMethod,
    /// Label of whoever recorded the transaction.
    pub registrado_por: String,
    /// Receipt image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foto_url: Option<String>,
    /// Linked savings goal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objetivo_id: Option<Uuid>,
    /// Owning user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usuario_id: Option<Uuid>,
    /// Source recurring charge, set only by the materializer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo_id: Option<Uuid>,
    /// Charge date, set only by the materializer (conflict target with
    /// `cargo_id` so a re-run the same day inserts nothing).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_cargo: Option<NaiveDate>,
}

impl Default for TransactionKind {
    fn default() -> Self {
        Self::Gasto
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
