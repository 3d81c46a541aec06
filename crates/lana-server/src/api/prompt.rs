//! System prompts, tool definitions, and upstream message assembly.

use lana_core::categories::{GASTO_CATEGORIES, INGRESO_CATEGORIES};
use lana_llm::types::{ChatMessage, ToolDefinition};
use serde::Deserialize;
use serde_json::json;

/// System prompt for the streaming chat call.
pub const STREAM_SYSTEM_PROMPT: &str = "Eres un asistente financiero personal. Registras gastos e ingresos de forma conversacional.

📋 CATEGORÍAS VÁLIDAS:
**Gastos:** Alimentación, Transporte, Vivienda, Salud, Entretenimiento, Educación, Ahorro/inversión, Otros gastos
**Ingresos:** Salario, Ventas, Servicios, Inversiones, Otros ingresos

💳 MÉTODOS: Efectivo, Tarjeta, Transferencia

Sé amigable y confirma con resumen detallado.";

/// System prompt for the non-streaming chat call.
pub const CHAT_SYSTEM_PROMPT: &str = "Eres un asistente financiero personal. Tu trabajo es ayudar a registrar gastos e ingresos de forma conversacional.

🎯 HERRAMIENTAS DISPONIBLES:
1. registrar_gasto - Para registrar un gasto
2. registrar_ingreso - Para registrar un ingreso

📋 CATEGORÍAS VÁLIDAS:
**Gastos:** Alimentación, Transporte, Vivienda, Salud, Entretenimiento, Educación, Ahorro/inversión, Otros gastos
**Ingresos:** Salario, Ventas, Servicios, Inversiones, Otros ingresos

👥 El usuario puede especificar quién registra la transacción (opcional)

💳 MÉTODOS DE PAGO: Efectivo, Tarjeta, Transferencia

💡 INSTRUCCIONES:
- Sé amigable y conversacional
- Confirma los datos antes de registrar
- Si falta información (categoría, monto), pregunta
- Después de registrar, confirma con un resumen";

/// A prior conversation turn as sent by the frontend.
#[derive(Clone, Debug, Deserialize)]
pub struct HistoryMessage {
    /// `user` or `assistant`.
    pub role: String,
    /// Turn text.
    pub content: String,
}

/// The two `registrar_*` function tools offered on every chat call.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::function(
            "registrar_gasto",
            "Registra un gasto",
            json!({
                "type": "object",
                "properties": {
                    "monto": { "type": "number" },
                    "categoria": { "type": "string", "enum": GASTO_CATEGORIES },
                    "descripcion": { "type": "string" },
                    "metodo_pago": {
                        "type": "string",
                        "enum": ["Efectivo", "Tarjeta", "Transferencia"],
                        "default": "Efectivo"
                    },
                    "registrado_por": {
                        "type": "string",
                        "description": "Nombre de quien registra"
                    }
                },
                "required": ["monto", "categoria"]
            }),
        ),
        ToolDefinition::function(
            "registrar_ingreso",
            "Registra un ingreso",
            json!({
                "type": "object",
                "properties": {
                    "monto": { "type": "number" },
                    "categoria": { "type": "string", "enum": INGRESO_CATEGORIES },
                    "descripcion": { "type": "string" },
                    "metodo_pago": {
                        "type": "string",
                        "enum": ["Efectivo", "Tarjeta", "Transferencia"],
                        "default": "Efectivo"
                    },
                    "registrado_por": {
                        "type": "string",
                        "description": "Nombre de quien registra"
                    }
                },
                "required": ["monto", "categoria"]
            }),
        ),
    ]
}

/// Assemble the upstream message list: system prompt, the last
/// `history_turns` turns, then the current user message.
#[must_use]
pub fn build_messages(
    system_prompt: &str,
    history: &[HistoryMessage],
    history_turns: usize,
    user_content: String,
) -> Vec<ChatMessage> {
    let tail = history.len().saturating_sub(history_turns);
    let mut messages = Vec::with_capacity(history.len().min(history_turns) + 2);
    messages.push(ChatMessage::text("system", system_prompt));
    for turn in &history[tail..] {
        messages.push(ChatMessage::text(turn.role.clone(), turn.content.clone()));
    }
    messages.push(ChatMessage::text("user", user_content));
    messages
}

/// Prefix the user message with the image note the streaming prompt
/// expects when receipt images accompany it.
#[must_use]
pub fn with_image_note(message: &str, image_count: usize) -> String {
    if image_count == 0 {
        message.to_string()
    } else {
        format!("[El usuario subió {image_count} imagen(es) de tickets]\n\n{message}")
    }
}
