//! Conversions between rmcp protocol types and this crate's own types.

use rmcp::model::{
    CallToolResult, CreateMessageRequestParams, CreateMessageResult, LoggingLevel,
    LoggingMessageNotificationParam, Meta, ModelHint, ModelPreferences, NumberOrString,
    ProgressNotificationParam, ProgressToken as RmcpProgressToken, Role, SamplingMessage,
    SamplingMessageContent,
};
use serde_json::Value;

use crate::callbacks::{IncomingMessage, IncomingSamplingRequest};
use crate::notify::{LogEvent, LogSeverity, NotifyError, ProgressEvent, ProgressToken, PROGRESS_TOTAL};
use crate::sampling::{SampledContent, SamplingError, SamplingRequest, SamplingResponse};

/// Progress token attached to an inbound request, if the invoker sent one.
pub fn progress_token(meta: &Meta) -> Option<ProgressToken> {
    meta.get_progress_token()
        .map(|token| ProgressToken(token.0.into_json_value()))
}

/// Protocol form of a token. Only strings and integers are valid on the wire.
pub fn rmcp_progress_token(token: &ProgressToken) -> Result<RmcpProgressToken, NotifyError> {
    let id = match &token.0 {
        Value::String(s) => NumberOrString::String(s.as_str().into()),
        Value::Number(n) => n
            .as_i64()
            .map(NumberOrString::Number)
            .ok_or_else(|| NotifyError::InvalidToken(token.to_string()))?,
        _ => return Err(NotifyError::InvalidToken(token.to_string())),
    };
    Ok(RmcpProgressToken(id))
}

/// Outbound progress notification. `None` when the event has no token, since
/// the protocol cannot correlate a progress notification without one.
pub fn progress_param(
    event: &ProgressEvent,
) -> Result<Option<ProgressNotificationParam>, NotifyError> {
    let Some(token) = &event.token else {
        return Ok(None);
    };
    Ok(Some(ProgressNotificationParam {
        progress_token: rmcp_progress_token(token)?,
        progress: event.completed,
        total: Some(event.total),
        message: Some(event.label.clone()),
    }))
}

/// Inbound progress notification. A missing total is read as the unit total.
pub fn progress_event(param: &ProgressNotificationParam) -> ProgressEvent {
    ProgressEvent {
        token: Some(ProgressToken(param.progress_token.0.clone().into_json_value())),
        completed: param.progress,
        total: param.total.unwrap_or(PROGRESS_TOTAL),
        label: param.message.clone().unwrap_or_default(),
    }
}

pub fn logging_level(severity: LogSeverity) -> LoggingLevel {
    match severity {
        LogSeverity::Debug => LoggingLevel::Debug,
        LogSeverity::Info => LoggingLevel::Info,
        LogSeverity::Warning => LoggingLevel::Warning,
        LogSeverity::Error => LoggingLevel::Error,
    }
}

/// Fold the protocol's syslog-style levels onto the four severities we model:
/// `notice` reads as info, anything above `error` as error.
pub fn log_severity(level: LoggingLevel) -> LogSeverity {
    match level {
        LoggingLevel::Debug => LogSeverity::Debug,
        LoggingLevel::Info | LoggingLevel::Notice => LogSeverity::Info,
        LoggingLevel::Warning => LogSeverity::Warning,
        LoggingLevel::Error
        | LoggingLevel::Critical
        | LoggingLevel::Alert
        | LoggingLevel::Emergency => LogSeverity::Error,
    }
}

pub fn logging_param(event: &LogEvent, logger: &str) -> LoggingMessageNotificationParam {
    LoggingMessageNotificationParam {
        level: logging_level(event.severity),
        logger: Some(logger.to_string()),
        data: Value::String(event.message.clone()),
    }
}

/// Inbound log notification. Non-string `data` is rendered as JSON text.
pub fn log_event(param: &LoggingMessageNotificationParam) -> LogEvent {
    let message = match &param.data {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    LogEvent {
        severity: log_severity(param.level),
        message,
    }
}

pub fn create_message_param(request: &SamplingRequest) -> CreateMessageRequestParams {
    let hints = request
        .model_hints
        .iter()
        .map(|name| ModelHint {
            name: Some(name.clone()),
        })
        .collect();
    CreateMessageRequestParams {
        meta: None,
        task: None,
        messages: vec![SamplingMessage::user_text(request.user_message.clone())],
        model_preferences: Some(ModelPreferences {
            hints: Some(hints),
            cost_priority: None,
            speed_priority: None,
            intelligence_priority: None,
        }),
        system_prompt: Some(request.system_prompt.clone()),
        include_context: None,
        temperature: None,
        max_tokens: request.max_tokens,
        stop_sequences: None,
        metadata: None,
        tools: None,
        tool_choice: None,
    }
}

fn content_kind(content: &SamplingMessageContent) -> &'static str {
    match content {
        SamplingMessageContent::Text(_) => "text",
        SamplingMessageContent::Image(_) => "image",
        SamplingMessageContent::Audio(_) => "audio",
        SamplingMessageContent::ToolUse(_) => "tool_use",
        SamplingMessageContent::ToolResult(_) => "tool_result",
    }
}

/// Content of a sampling result. With several blocks the first text block wins.
pub fn sampled_content(result: &CreateMessageResult) -> Result<SampledContent, SamplingError> {
    let content = &result.message.content;
    if let Some(text) = content.iter().find_map(SamplingMessageContent::as_text) {
        return Ok(SampledContent::Text(text.text.clone()));
    }
    content
        .first()
        .map(|block| SampledContent::Other(content_kind(block).to_string()))
        .ok_or_else(|| SamplingError::Malformed("result has no content".into()))
}

/// Inbound sampling request, with missing or non-text content left as `None`.
pub fn incoming_sampling_request(param: &CreateMessageRequestParams) -> IncomingSamplingRequest {
    let messages = param
        .messages
        .iter()
        .map(|message| IncomingMessage {
            role: Some(
                match message.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                }
                .to_string(),
            ),
            text: message
                .content
                .first()
                .and_then(SamplingMessageContent::as_text)
                .map(|t| t.text.clone()),
        })
        .collect();
    IncomingSamplingRequest {
        system_prompt: param.system_prompt.clone(),
        messages,
    }
}

pub fn create_message_result(response: &SamplingResponse, model: &str) -> CreateMessageResult {
    CreateMessageResult {
        model: model.to_string(),
        stop_reason: Some(CreateMessageResult::STOP_REASON_END_TURN.to_string()),
        message: SamplingMessage::assistant_text(response.text.clone()),
    }
}

/// All text blocks of a tool result, newline-joined. `None` if there are none.
pub fn tool_result_text(result: &CallToolResult) -> Option<String> {
    let texts: Vec<&str> = result
        .content
        .iter()
        .filter_map(|block| block.as_text())
        .map(|t| t.text.as_str())
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}
