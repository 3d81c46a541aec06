//! Stream accumulation state machine.
//!
//! Converts decoded [`ChatChunk`]s into typed [`ChatStreamEvent`]s while
//! accumulating the pieces the post-stream executor needs: the assistant
//! text, the fragmented tool call, and usage. When the payload stream ends
//! the provider synthesizes a final [`ChatStreamEvent::Done`] from this
//! state (OpenRouter terminates with a bare `[DONE]`, not a summary event).

use crate::types::{ChatChunk, Usage};

/// Events emitted while a chat stream is in flight.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatStreamEvent {
    /// Stream opened.
    Start,
    /// Incremental assistant text.
    ContentDelta {
        /// The text fragment.
        delta: String,
    },
    /// First non-empty tool name seen.
    ToolCallStart {
        /// The function name.
        name: String,
    },
    /// An argument JSON fragment arrived.
    ToolCallDelta {
        /// The verbatim fragment.
        arguments_delta: String,
    },
    /// Stream ended; carries the assembled reply.
    Done {
        /// Everything accumulated over the stream.
        reply: AssembledReply,
        /// Last finish reason the provider sent, if any.
        finish_reason: Option<String>,
    },
}

/// The fully assembled result of one stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssembledReply {
    /// Concatenated assistant text.
    pub content: String,
    /// The captured tool call, present only when the provider signaled
    /// `finish_reason: "tool_calls"`.
    pub tool_call: Option<ToolCallDraft>,
    /// Usage if the provider reported it.
    pub usage: Option<Usage>,
}

/// A tool call accumulated across chunks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolCallDraft {
    /// Function name (first non-empty fragment wins).
    pub name: String,
    /// Argument JSON, concatenated verbatim in arrival order.
    pub arguments: String,
}

impl ToolCallDraft {
    /// Whether both name and arguments were captured.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.arguments.is_empty()
    }
}

/// Accumulation state for one stream. Created per request, never reused.
#[derive(Clone, Debug, Default)]
pub struct StreamState {
    content: String,
    tool_name: String,
    tool_arguments: String,
    tool_call_finished: bool,
    finish_reason: Option<String>,
    usage: Option<Usage>,
}

impl StreamState {
    /// Fresh state for a new stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Process one decoded chunk, mutating `state` and returning the events
/// it produces.
#[must_use]
pub fn process_chunk(chunk: &ChatChunk, state: &mut StreamState) -> Vec<ChatStreamEvent> {
    let mut events = Vec::new();

    let Some(choice) = chunk.choices.first() else {
        if let Some(usage) = chunk.usage {
            state.usage = Some(usage);
        }
        return events;
    };

    if let Some(tool_calls) = &choice.delta.tool_calls {
        // Fragments are trusted to arrive strictly in order with no gaps
        // and no interleaving of multiple calls; the upstream contract is
        // not verified here.
        if let Some(function) = tool_calls.first().and_then(|tc| tc.function.as_ref()) {
            if let Some(name) = function.name.as_deref() {
                if !name.is_empty() && state.tool_name.is_empty() {
                    state.tool_name.push_str(name);
                    events.push(ChatStreamEvent::ToolCallStart { name: name.into() });
                }
            }
            if let Some(fragment) = function.arguments.as_deref() {
                if !fragment.is_empty() {
                    state.tool_arguments.push_str(fragment);
                    events.push(ChatStreamEvent::ToolCallDelta {
                        arguments_delta: fragment.into(),
                    });
                }
            }
        }
    }

    if let Some(delta) = choice.delta.content.as_deref() {
        if !delta.is_empty() {
            state.content.push_str(delta);
            events.push(ChatStreamEvent::ContentDelta {
                delta: delta.into(),
            });
        }
    }

    if let Some(reason) = choice.finish_reason.as_deref() {
        if reason == "tool_calls" {
            state.tool_call_finished = true;
        }
        state.finish_reason = Some(reason.into());
    }

    if let Some(usage) = chunk.usage {
        state.usage = Some(usage);
    }

    events
}

/// Build the terminal [`ChatStreamEvent::Done`] once the payload stream
/// is exhausted.
#[must_use]
pub fn build_done_event(state: StreamState) -> ChatStreamEvent {
    let tool_call = if state.tool_call_finished {
        Some(ToolCallDraft {
            name: state.tool_name,
            arguments: state.tool_arguments,
        })
    } else {
        None
    };

    ChatStreamEvent::Done {
        reply: AssembledReply {
            content: state.content,
            tool_call,
            usage: state.usage,
        },
        finish_reason: state.finish_reason,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkChoice, ChunkDelta, FunctionChunk, ToolCallChunk};

    fn content_chunk(text: &str) -> ChatChunk {
        ChatChunk {
            choices: vec![ChunkChoice {
                delta: ChunkDelta {
                    content: Some(text.into()),
                    tool_calls: None,
                },
                finish_reason: None,
            }],
            usage: None,
        }
    }

    fn tool_chunk(name: Option<&str>, arguments: Option<&str>) -> ChatChunk {
        ChatChunk {
            choices: vec![ChunkChoice {
                delta: ChunkDelta {
                    content: None,
                    tool_calls: Some(vec![ToolCallChunk {
                        function: Some(FunctionChunk {
                            name: name.map(Into::into),
                            arguments: arguments.map(Into::into),
                        }),
                    }]),
                },
                finish_reason: None,
            }],
            usage: None,
        }
    }

    fn finish_chunk(reason: &str) -> ChatChunk {
        ChatChunk {
            choices: vec![ChunkChoice {
                delta: ChunkDelta::default(),
                finish_reason: Some(reason.into()),
            }],
            usage: None,
        }
    }

    fn assembled(chunks: &[ChatChunk]) -> (Vec<ChatStreamEvent>, AssembledReply) {
        let mut state = StreamState::new();
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(process_chunk(chunk, &mut state));
        }
        match build_done_event(state) {
            ChatStreamEvent::Done { reply, .. } => (events, reply),
            other => panic!("expected Done, got {other:?}"),
        }
    }

    // ── Content accumulation ─────────────────────────────────────────────

    #[test]
    fn content_deltas_forwarded_and_accumulated() {
        let (events, reply) = assembled(&[
            content_chunk("Hola"),
            content_chunk(", ¿en qué"),
            content_chunk(" te ayudo?"),
            finish_chunk("stop"),
        ]);
        assert_eq!(
            events,
            vec![
                ChatStreamEvent::ContentDelta {
                    delta: "Hola".into()
                },
                ChatStreamEvent::ContentDelta {
                    delta: ", ¿en qué".into()
                },
                ChatStreamEvent::ContentDelta {
                    delta: " te ayudo?".into()
                },
            ]
        );
        assert_eq!(reply.content, "Hola, ¿en qué te ayudo?");
        assert!(reply.tool_call.is_none());
    }

    #[test]
    fn empty_content_delta_produces_no_event() {
        let mut state = StreamState::new();
        let events = process_chunk(&content_chunk(""), &mut state);
        assert!(events.is_empty());
    }

    // ── Tool call accumulation ───────────────────────────────────────────

    #[test]
    fn first_nonempty_name_wins() {
        let (events, reply) = assembled(&[
            tool_chunk(Some(""), None),
            tool_chunk(Some("registrar_gasto"), None),
            tool_chunk(Some("registrar_ingreso"), Some("{}")),
            finish_chunk("tool_calls"),
        ]);
        assert_eq!(
            events[0],
            ChatStreamEvent::ToolCallStart {
                name: "registrar_gasto".into()
            }
        );
        assert_eq!(reply.tool_call.unwrap().name, "registrar_gasto");
    }

    #[test]
    fn argument_fragments_concatenate_in_arrival_order() {
        let (_, reply) = assembled(&[
            tool_chunk(Some("registrar_gasto"), None),
            tool_chunk(None, Some("{\"monto\":")),
            tool_chunk(None, Some("150,\"categoria\":")),
            tool_chunk(None, Some("\"Transporte\"}")),
            finish_chunk("tool_calls"),
        ]);
        let call = reply.tool_call.unwrap();
        assert_eq!(call.arguments, "{\"monto\":150,\"categoria\":\"Transporte\"}");
        let parsed: serde_json::Value = serde_json::from_str(&call.arguments).unwrap();
        assert_eq!(parsed["monto"], 150);
        assert_eq!(parsed["categoria"], "Transporte");
    }

    #[test]
    fn tool_call_dropped_without_finish_reason_latch() {
        // Arguments accumulated but the provider never said "tool_calls":
        // the call is not surfaced.
        let (_, reply) = assembled(&[
            tool_chunk(Some("registrar_gasto"), Some("{\"monto\":1}")),
            finish_chunk("stop"),
        ]);
        assert!(reply.tool_call.is_none());
    }

    #[test]
    fn mixed_content_and_tool_stream() {
        let (_, reply) = assembled(&[
            content_chunk("Registrando..."),
            tool_chunk(Some("registrar_ingreso"), None),
            tool_chunk(None, Some("{\"monto\":2500}")),
            finish_chunk("tool_calls"),
        ]);
        assert_eq!(reply.content, "Registrando...");
        let call = reply.tool_call.unwrap();
        assert_eq!(call.name, "registrar_ingreso");
        assert!(call.is_complete());
    }

    // ── Done / usage ─────────────────────────────────────────────────────

    #[test]
    fn usage_carried_into_done() {
        let mut chunks = vec![content_chunk("ok"), finish_chunk("stop")];
        chunks.push(ChatChunk {
            choices: vec![],
            usage: Some(Usage {
                prompt_tokens: 20,
                completion_tokens: 7,
                total_tokens: 27,
            }),
        });
        let (_, reply) = assembled(&chunks);
        assert_eq!(reply.usage.unwrap().total_tokens, 27);
    }

    #[test]
    fn finish_reason_carried_into_done() {
        let mut state = StreamState::new();
        let _ = process_chunk(&finish_chunk("tool_calls"), &mut state);
        match build_done_event(state) {
            ChatStreamEvent::Done { finish_reason, .. } => {
                assert_eq!(finish_reason.as_deref(), Some("tool_calls"));
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[test]
    fn empty_stream_done_is_empty() {
        let (events, reply) = assembled(&[]);
        assert!(events.is_empty());
        assert!(reply.content.is_empty());
        assert!(reply.tool_call.is_none());
        assert!(reply.usage.is_none());
    }

    #[test]
    fn draft_completeness() {
        assert!(!ToolCallDraft::default().is_complete());
        assert!(
            !ToolCallDraft {
                name: "registrar_gasto".into(),
                arguments: String::new(),
            }
            .is_complete()
        );
        assert!(
            ToolCallDraft {
                name: "registrar_gasto".into(),
                arguments: "{}".into(),
            }
            .is_complete()
        );
    }
}
