//! Post-stream action executor.
//!
//! Once the upstream stream is drained, a captured tool call turns into
//! exactly one transaction insert plus user-facing confirmation text. All
//! outcomes (success, malformed arguments, store rejection) come back as
//! plain chunk text; the caller still terminates the stream normally.

use chrono::{DateTime, Utc};
use lana_core::money::format_mxn;
use lana_core::{NewTransaction, PaymentMethod, TransactionKind};
use lana_llm::ToolCallDraft;
use lana_store::{StoreClient, StoreError};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Progress chunk emitted before the insert.
pub const PROGRESS_CHUNK: &str = "\n\n⏳ Registrando en base de datos...";

/// Arguments accumulated for a `registrar_*` call.
#[derive(Clone, Debug, Deserialize)]
pub struct ToolArgs {
    /// Amount in MXN.
    pub monto: f64,
    /// Category name.
    pub categoria: String,
    /// Optional free-text description.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Payment method name.
    #[serde(default)]
    pub metodo_pago: Option<String>,
    /// Who registered the transaction.
    #[serde(default)]
    pub registrado_por: Option<String>,
}

impl ToolArgs {
    /// Payment method, defaulting to cash on unknown values.
    ///
    /// The row schema constrains `metodo_pago` to the three known methods,
    /// so free text from the model collapses to `Efectivo` rather than
    /// being written through.
    #[must_use]
    pub fn payment_method(&self) -> PaymentMethod {
        self.metodo_pago
            .as_deref()
            .and_then(|m| serde_json::from_value(serde_json::Value::String(m.into())).ok())
            .unwrap_or_default()
    }

    /// `registrado_por`, defaulting to `Usuario`.
    #[must_use]
    pub fn registered_by(&self) -> &str {
        self.registrado_por.as_deref().unwrap_or("Usuario")
    }
}

/// Map a tool name to the transaction kind it records. Only
/// `registrar_gasto` produces an expense; the server advertises exactly
/// two tools, so everything else is the income tool.
#[must_use]
pub fn kind_for_tool(name: &str) -> TransactionKind {
    if name == "registrar_gasto" {
        TransactionKind::Gasto
    } else {
        TransactionKind::Ingreso
    }
}

/// Parse accumulated argument JSON.
pub fn parse_args(arguments: &str) -> Result<ToolArgs, serde_json::Error> {
    serde_json::from_str(arguments)
}

/// The row the streaming pipeline inserts (`fecha` timestamp column).
#[must_use]
pub fn streamed_row(kind: TransactionKind, args: &ToolArgs, now: DateTime<Utc>) -> NewTransaction {
    NewTransaction {
        tipo: kind,
        monto: args.monto,
        categoria: args.categoria.clone(),
        fecha: Some(now),
        fecha_hora: None,
        concepto: Some(
            args.descripcion
                .clone()
                .unwrap_or_else(|| format!("{} - {}", kind.as_str(), args.categoria)),
        ),
        descripcion: args.descripcion.clone(),
        metodo_pago: args.payment_method(),
        registrado_por: args.registered_by().to_string(),
        foto_url: None,
        objetivo_id: None,
        usuario_id: None,
        cargo_id: None,
        fecha_cargo: None,
    }
}

/// The row the non-streaming chat endpoint inserts (legacy `fecha_hora`
/// timestamp column, no `concepto`).
#[must_use]
pub fn chat_row(kind: TransactionKind, args: &ToolArgs, now: DateTime<Utc>) -> NewTransaction {
    NewTransaction {
        tipo: kind,
        monto: args.monto,
        categoria: args.categoria.clone(),
        fecha: None,
        fecha_hora: Some(now),
        concepto: None,
        descripcion: args.descripcion.clone(),
        metodo_pago: args.payment_method(),
        registrado_por: args.registered_by().to_string(),
        foto_url: None,
        objetivo_id: None,
        usuario_id: None,
        cargo_id: None,
        fecha_cargo: None,
    }
}

/// Streaming confirmation chunk.
#[must_use]
pub fn streamed_confirmation(kind: TransactionKind, args: &ToolArgs) -> String {
    format!(
        "\n\n✅ **{} registrado exitosamente!**\n\n💰 **Monto:** ${} MXN\n📁 **Categoría:** {}\n💳 **Método:** {}\n👤 **Registrado por:** {}\n\n🎉 Puedes ver el resumen actualizado en el Dashboard.",
        kind.label(),
        format_mxn(args.monto),
        args.categoria,
        args.payment_method().as_str(),
        args.registered_by()
    )
}

/// Non-streaming confirmation message.
#[must_use]
pub fn chat_confirmation(kind: TransactionKind, args: &ToolArgs) -> String {
    format!(
        "✅ {} registrado exitosamente!\n\n💰 Monto: ${} MXN\n📁 Categoría: {}\n📝 Descripción: {}\n💳 Método: {}\n👤 Registrado por: {}\n\nPuedes ver el resumen actualizado en el Dashboard.",
        kind.label(),
        format_mxn(args.monto),
        args.categoria,
        args.descripcion.as_deref().unwrap_or("N/A"),
        args.payment_method().as_str(),
        args.registered_by()
    )
}

/// The message a store error surfaces to the user.
#[must_use]
pub fn store_error_message(err: &StoreError) -> String {
    match err {
        StoreError::Rejected { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Execute a captured tool call: parse the arguments, insert one row,
/// and return the confirmation (or error) chunk.
#[instrument(skip_all, fields(tool = %call.name))]
pub async fn execute_streamed_call(store: &StoreClient, call: &ToolCallDraft) -> String {
    let args = match parse_args(&call.arguments) {
        Ok(args) => args,
        Err(e) => {
            warn!("malformed tool arguments: {e}");
            return format!("\n\n❌ Error procesando función: {e}");
        }
    };

    let kind = kind_for_tool(&call.name);
    let row = streamed_row(kind, &args, Utc::now());

    match store.insert_transactions(&[row], None).await {
        Ok(_) => {
            info!(kind = kind.as_str(), monto = args.monto, "transaction recorded");
            streamed_confirmation(kind, &args)
        }
        Err(e) => {
            warn!("insert rejected: {e}");
            format!("\n\n❌ Error al registrar: {}", store_error_message(&e))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
