//! POST /api/upload-image — receipt upload plus OCR analysis.
//!
//! The image goes to the public storage bucket first; the vision call
//! then reads it back through its public URL. The model is forced into
//! `json_object` output, but an unparseable reply still degrades into a
//! usable payload with the raw text as the description.

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use lana_core::money::format_mxn;
use lana_llm::types::{
    ChatMessage, ChatRequest, ContentPart, ImageUrl, MessageContent, ResponseFormat,
};
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::error::ApiError;
use crate::server::AppState;

/// Vision prompt: validate the image is a receipt, then extract the
/// structured fields as bare JSON.
const OCR_PROMPT: &str = r#"Analiza esta imagen y determina si es un ticket/factura válido.

**PASO 1: VALIDAR SI ES UN TICKET**
- ¿La imagen muestra un ticket, factura, recibo o comprobante de compra?
- ¿Tiene información de comercio, monto, items comprados?
- Si es screenshot de chat, foto aleatoria, o documento que NO sea ticket → marca "es_ticket": false

**CATEGORÍAS VÁLIDAS DEL SISTEMA:**
- Gastos: Alimentación, Transporte, Vivienda, Salud, Entretenimiento, Educación, Ahorro/inversión, Otros gastos
- Ingresos: Salario, Ventas, Servicios, Inversiones, Otros ingresos

**INSTRUCCIONES SI ES TICKET:**
1. Extrae el MONTO TOTAL (solo número, sin símbolos)
2. Identifica el COMERCIO/ESTABLECIMIENTO
3. Sugiere UNA categoría de la lista válida (la más apropiada)
4. Lista los items principales si son visibles
5. Extrae fecha si está visible

**RESPONDE SOLO CON JSON (sin markdown, sin explicaciones):**

Ejemplo 1 - Ticket de gasolinera:
{
  "es_ticket": true,
  "monto": 450.50,
  "comercio": "Pemex",
  "categoria_sugerida": "Transporte",
  "items": ["Magna Premium 30L", "Total"],
  "fecha": "2025-10-06",
  "descripcion": "Llenado de combustible en Pemex"
}

Ejemplo 2 - Ticket de supermercado:
{
  "es_ticket": true,
  "monto": 350.00,
  "comercio": "Walmart",
  "categoria_sugerida": "Alimentación",
  "items": ["Leche", "Pan", "Huevos", "Verduras"],
  "fecha": "2025-10-09",
  "descripcion": "Compra de despensa en Walmart"
}

Ejemplo 3 - Ticket de restaurante:
{
  "es_ticket": true,
  "monto": 280.00,
  "comercio": "Restaurante La Casa",
  "categoria_sugerida": "Alimentación",
  "items": ["2x Tacos", "1x Refresco", "Propina"],
  "fecha": "2025-10-09",
  "descripcion": "Comida en restaurante"
}

Si NO ES ticket (screenshot, foto aleatoria, etc):
{
  "es_ticket": false,
  "razon": "Esta es una captura de pantalla de una conversación de texto, no un ticket o factura",
  "sugerencia": "Por favor sube una foto de un ticket, factura o recibo de compra"
}"#;

/// Parse the model's reply; non-JSON replies degrade to a stub carrying
/// the raw text as the description.
pub(crate) fn parse_ocr(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|e| {
        warn!("vision reply was not JSON: {e}");
        json!({
            "monto": null,
            "comercio": "Desconocido",
            "categoria_sugerida": "Otros gastos",
            "items": [],
            "descripcion": text
        })
    })
}

/// The user-facing analysis block, ticket and non-ticket branches.
pub(crate) fn format_analysis(ocr: &Value) -> String {
    if ocr.get("es_ticket").and_then(Value::as_bool) == Some(false) {
        let razon = ocr
            .get("razon")
            .and_then(Value::as_str)
            .unwrap_or("Esta imagen no parece ser un ticket, factura o recibo de compra.");
        let sugerencia = ocr.get("sugerencia").and_then(Value::as_str).unwrap_or(
            "Sube una foto de un ticket o factura de compra para que pueda analizarlo.",
        );
        return format!(
            "⚠️ **IMAGEN NO RECONOCIDA COMO TICKET**\n\n{razon}\n\n💡 **Sugerencia:** {sugerencia}\n\nSi quieres registrar algo manualmente, dime:\n- ¿Es gasto o ingreso?\n- Monto\n- Comercio/Proveedor\n- Categoría"
        );
    }

    let monto = ocr
        .get("monto")
        .and_then(Value::as_f64)
        .map_or_else(|| "No detectado".to_string(), format_mxn);
    let comercio = ocr
        .get("comercio")
        .and_then(Value::as_str)
        .unwrap_or("No detectado");
    let categoria = ocr
        .get("categoria_sugerida")
        .and_then(Value::as_str)
        .unwrap_or("Otros gastos");

    let mut analysis = format!(
        "📸 **TICKET ANALIZADO:**\n\n💰 **Monto:** ${monto}\n🏪 **Comercio:** {comercio}\n📁 **Categoría sugerida:** {categoria}"
    );
    if let Some(items) = ocr.get("items").and_then(Value::as_array) {
        if !items.is_empty() {
            let names: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            analysis.push_str(&format!("\n📋 **Items:** {}", names.join(", ")));
        }
    }
    if let Some(fecha) = ocr.get("fecha").and_then(Value::as_str) {
        analysis.push_str(&format!("\n📅 **Fecha:** {fecha}"));
    }
    let descripcion = ocr
        .get("descripcion")
        .and_then(Value::as_str)
        .or_else(|| ocr.get("comercio").and_then(Value::as_str))
        .unwrap_or("Ticket analizado");
    analysis.push_str(&format!("\n\n📝 **Descripción:** {descripcion}"));
    analysis
}

/// POST /api/upload-image
#[instrument(skip_all)]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut image: Option<(String, String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() == Some("image") {
            let file_name = field.file_name().unwrap_or("imagen").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
            image = Some((file_name, content_type, bytes.to_vec()));
            break;
        }
    }
    let Some((file_name, content_type, bytes)) = image else {
        return Err(ApiError::bad_request("No image provided"));
    };

    let name = format!("ticket_{}_{}", Utc::now().timestamp_millis(), file_name);
    let url = state
        .store
        .upload_object(
            &state.settings.upload.bucket,
            &name,
            bytes,
            &content_type,
            None,
        )
        .await?;

    let llm = &state.settings.llm;
    let request = ChatRequest {
        model: llm.model.clone(),
        messages: vec![ChatMessage {
            role: "user".into(),
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: OCR_PROMPT.into(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: url.clone() },
                },
            ]),
        }],
        max_tokens: llm.vision_max_tokens,
        temperature: llm.vision_temperature,
        stream: None,
        thinking_config: None,
        tools: None,
        tool_choice: None,
        response_format: Some(ResponseFormat::json_object()),
    };

    let completion = state
        .provider
        .complete(request)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let analysis_text = completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Internal("No se recibió respuesta del Vision API".into()))?;

    let ocr = parse_ocr(&analysis_text);
    Ok(Json(json!({
        "success": true,
        "url": url,
        "analysis": format_analysis(&ocr),
        "data": ocr
    })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
